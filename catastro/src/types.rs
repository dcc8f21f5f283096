//! Types de données pour le crate catastro

use std::collections::HashSet;

use geo::{EuclideanDistance, HaversineDistance, LineString, Point};
use serde::Serialize;
use tracing::warn;

use crate::srs::ReferenceSystem;

/// Classification d'usage du sol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LandUse {
    Urban,
    Rustic,
}

impl LandUse {
    /// Classification depuis le code `cn` du service: `RU` est rustique, le reste urbain
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("RU") => LandUse::Rustic,
            _ => LandUse::Urban,
        }
    }
}

/// Champs propres aux biens urbains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrbanDetails {
    /// Sigle et nom de la voie, séparés par un espace (ex: "CL MAYOR")
    pub street: String,
    pub number: Option<String>,
    pub construction_year: Option<String>,
    pub use_category: Option<String>,
}

/// Champs propres aux biens rustiques
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RusticDetails {
    pub polygon: String,
    pub parcel: String,
    pub place_name: Option<String>,
}

/// Exactement un des deux groupes de champs, selon l'usage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "land_use")]
pub enum LandUseDetails {
    Urban(UrbanDetails),
    Rustic(RusticDetails),
}

impl LandUseDetails {
    pub fn land_use(&self) -> LandUse {
        match self {
            LandUseDetails::Urban(_) => LandUse::Urban,
            LandUseDetails::Rustic(_) => LandUse::Rustic,
        }
    }
}

/// Sous-surface d'une parcelle (construction ou culture)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub description: String,
    /// Surface en m²
    pub surface: f64,
}

/// Géométrie renvoyée par le WFS des parcelles.
///
/// Les points sont toujours stockés avec `x` = longitude/easting et
/// `y` = latitude/northing, quel que soit l'ordre des axes du service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelGeometry {
    pub centroid: Point<f64>,

    /// Anneau extérieur (au moins 3 points)
    pub boundary: Option<LineString<f64>>,

    /// Surface géométrique en m²
    pub area: f64,
}

/// Une parcelle cadastrale résolue, immuable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parcel {
    reference: String,
    province: String,
    municipality: String,
    #[serde(flatten)]
    details: LandUseDetails,
    regions: Vec<Region>,
    #[serde(rename = "superficie_construida")]
    built_surface: f64,
    #[serde(rename = "superficie")]
    surface: f64,
    centroid: Point<f64>,
    boundary: Option<LineString<f64>>,
    total_area: f64,
    sketch_url: Option<String>,
    reference_system: ReferenceSystem,
}

/// Données descriptives projetées depuis la réponse du callejero
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveRecord {
    pub reference: String,
    pub province: String,
    pub municipality: String,
    pub details: LandUseDetails,
    pub regions: Vec<Region>,
}

impl Parcel {
    /// Assemble une parcelle complète. La surface est la somme des régions.
    pub fn assemble(
        record: DescriptiveRecord,
        geometry: ParcelGeometry,
        sketch_url: Option<String>,
        reference_system: ReferenceSystem,
    ) -> Self {
        let surface: f64 = record.regions.iter().map(|r| r.surface).sum();

        Self {
            reference: record.reference,
            province: record.province,
            municipality: record.municipality,
            details: record.details,
            regions: record.regions,
            built_surface: surface,
            surface,
            centroid: geometry.centroid,
            boundary: geometry.boundary,
            total_area: geometry.area,
            sketch_url,
            reference_system,
        }
    }

    /// Référence cadastrale canonique (telle que renvoyée par le service)
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn land_use(&self) -> LandUse {
        self.details.land_use()
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    pub fn details(&self) -> &LandUseDetails {
        &self.details
    }

    pub fn urban(&self) -> Option<&UrbanDetails> {
        match &self.details {
            LandUseDetails::Urban(urban) => Some(urban),
            LandUseDetails::Rustic(_) => None,
        }
    }

    pub fn rustic(&self) -> Option<&RusticDetails> {
        match &self.details {
            LandUseDetails::Rustic(rustic) => Some(rustic),
            LandUseDetails::Urban(_) => None,
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Surface construite/déclarée (somme des régions), en m²
    pub fn built_surface(&self) -> f64 {
        self.built_surface
    }

    /// Alias de `built_surface`
    pub fn surface(&self) -> f64 {
        self.surface
    }

    pub fn centroid(&self) -> Point<f64> {
        self.centroid
    }

    pub fn boundary(&self) -> Option<&LineString<f64>> {
        self.boundary.as_ref()
    }

    /// Surface géométrique rapportée par le WFS, en m²
    pub fn total_area(&self) -> f64 {
        self.total_area
    }

    pub fn sketch_url(&self) -> Option<&str> {
        self.sketch_url.as_deref()
    }

    pub fn reference_system(&self) -> ReferenceSystem {
        self.reference_system
    }

    /// Longueur de chaque arête de l'anneau, le dernier point rejoignant le premier.
    ///
    /// Distance haversine pour les systèmes géographiques, euclidienne sinon (mètres).
    pub fn edge_distances(&self) -> Option<Vec<f64>> {
        let ring = self.boundary.as_ref()?;
        let points: Vec<Point<f64>> = ring.points().collect();
        if points.is_empty() {
            return None;
        }

        let n = points.len();
        Some(
            (0..n)
                .map(|i| {
                    let previous = if i == 0 { n - 1 } else { i - 1 };
                    self.distance(points[previous], points[i])
                })
                .collect(),
        )
    }

    /// Somme des arêtes
    pub fn perimeter(&self) -> Option<f64> {
        self.edge_distances().map(|distances| distances.iter().sum())
    }

    fn distance(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        if self.reference_system.is_geographic() {
            a.haversine_distance(&b)
        } else {
            a.euclidean_distance(&b)
        }
    }
}

/// Groupe de parcelles partageant une référence parapluie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParcelCollection {
    reference: String,
    parcels: Vec<Parcel>,
}

impl ParcelCollection {
    /// `None` si aucune parcelle: une collection n'est jamais vide.
    ///
    /// Les références sont uniques: une parcelle déjà présente est ignorée,
    /// la première occurrence est conservée.
    pub fn new(reference: impl Into<String>, parcels: Vec<Parcel>) -> Option<Self> {
        let reference = reference.into();
        let mut seen = HashSet::new();
        let parcels: Vec<Parcel> = parcels
            .into_iter()
            .filter(|parcel| {
                let fresh = seen.insert(parcel.reference().to_string());
                if !fresh {
                    warn!(
                        reference = parcel.reference(),
                        umbrella = %reference,
                        "Duplicate parcel skipped"
                    );
                }
                fresh
            })
            .collect();

        if parcels.is_empty() {
            return None;
        }
        Some(Self { reference, parcels })
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn parcels(&self) -> &[Parcel] {
        &self.parcels
    }

    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parcel> {
        self.parcels.iter()
    }
}

impl<'a> IntoIterator for &'a ParcelCollection {
    type Item = &'a Parcel;
    type IntoIter = std::slice::Iter<'a, Parcel>;

    fn into_iter(self) -> Self::IntoIter {
        self.parcels.iter()
    }
}

/// Une partie de bâtiment et ses niveaux
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingPart {
    pub id: Option<String>,
    pub floors_above_ground: Option<u32>,
    pub floors_below_ground: u32,
}

/// Nombre de niveaux d'un bâtiment, agrégé sur ses parties
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorCount {
    /// Maximum des niveaux hors sol
    pub above_ground: Option<u32>,
    /// Maximum des niveaux en sous-sol (0 si aucun)
    pub below_ground: u32,
    pub total: Option<u32>,
    pub parts: Vec<BuildingPart>,
}

impl FloorCount {
    pub fn from_parts(parts: Vec<BuildingPart>) -> Self {
        let above_ground = parts.iter().filter_map(|p| p.floors_above_ground).max();
        let below_ground = parts
            .iter()
            .map(|p| p.floors_below_ground)
            .max()
            .unwrap_or(0);

        Self {
            above_ground,
            below_ground,
            total: above_ground.map(|above| above + below_ground),
            parts,
        }
    }
}

/// Modules de valeur €/ha d'une région agricole
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropModules {
    pub region: Option<String>,
    pub region_name: Option<String>,
    /// (description de culture, €/ha)
    pub modules_eur_ha: Vec<(String, f64)>,
}
