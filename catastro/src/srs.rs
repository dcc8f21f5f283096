//! Systèmes de référence acceptés par les services du Catastro

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::CatastroError;

/// Ordre des axes dans les coordonnées renvoyées par le WFS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// Géographique: latitude puis longitude
    LatLon,
    /// Projeté: easting puis northing
    EastNorth,
}

/// Table des systèmes supportés: (EPSG, nom, ordre des axes)
const REFERENCE_SYSTEMS: &[(u32, &str, AxisOrder)] = &[
    (4326, "WGS 84", AxisOrder::LatLon),
    (4258, "ETRS89", AxisOrder::LatLon),
    (4230, "ED50", AxisOrder::LatLon),
    (4081, "REGCAN95", AxisOrder::LatLon),
    (25829, "ETRS89 / UTM zone 29N", AxisOrder::EastNorth),
    (25830, "ETRS89 / UTM zone 30N", AxisOrder::EastNorth),
    (25831, "ETRS89 / UTM zone 31N", AxisOrder::EastNorth),
    (23029, "ED50 / UTM zone 29N", AxisOrder::EastNorth),
    (23030, "ED50 / UTM zone 30N", AxisOrder::EastNorth),
    (23031, "ED50 / UTM zone 31N", AxisOrder::EastNorth),
    (32627, "WGS 84 / UTM zone 27N", AxisOrder::EastNorth),
    (32628, "WGS 84 / UTM zone 28N", AxisOrder::EastNorth),
    (32629, "WGS 84 / UTM zone 29N", AxisOrder::EastNorth),
    (32630, "WGS 84 / UTM zone 30N", AxisOrder::EastNorth),
    (32631, "WGS 84 / UTM zone 31N", AxisOrder::EastNorth),
    (4082, "REGCAN95 / UTM zone 27N", AxisOrder::EastNorth),
    (4083, "REGCAN95 / UTM zone 28N", AxisOrder::EastNorth),
    (3857, "WGS 84 / Pseudo-Mercator", AxisOrder::EastNorth),
];

/// Système de référence validé contre la table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSystem {
    /// Code EPSG
    pub epsg: u32,

    /// Nom usuel
    pub name: &'static str,

    axis_order: AxisOrder,
}

impl ReferenceSystem {
    /// WGS84 géographique (EPSG:4326), système par défaut
    pub const WGS84: ReferenceSystem = ReferenceSystem {
        epsg: 4326,
        name: "WGS 84",
        axis_order: AxisOrder::LatLon,
    };

    /// Recherche un code EPSG dans la table
    pub fn from_epsg(epsg: u32) -> Result<Self, CatastroError> {
        REFERENCE_SYSTEMS
            .iter()
            .find(|(code, _, _)| *code == epsg)
            .map(|&(epsg, name, axis_order)| Self {
                epsg,
                name,
                axis_order,
            })
            .ok_or_else(|| CatastroError::unsupported_srs(format!("EPSG:{}", epsg)))
    }

    /// Itère sur tous les systèmes supportés
    pub fn supported() -> impl Iterator<Item = ReferenceSystem> {
        REFERENCE_SYSTEMS
            .iter()
            .map(|&(epsg, name, axis_order)| ReferenceSystem {
                epsg,
                name,
                axis_order,
            })
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    /// Coordonnées en degrés (distances géodésiques) ou en mètres (distances planes)
    pub fn is_geographic(&self) -> bool {
        self.axis_order == AxisOrder::LatLon
    }
}

impl Default for ReferenceSystem {
    fn default() -> Self {
        Self::WGS84
    }
}

impl FromStr for ReferenceSystem {
    type Err = CatastroError;

    /// Accepte `EPSG:25830`, `epsg:25830` ou `25830`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = match trimmed.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("EPSG:") => &trimmed[5..],
            _ => trimmed,
        };

        let epsg = code
            .parse::<u32>()
            .map_err(|_| CatastroError::unsupported_srs(trimmed))?;
        Self::from_epsg(epsg).map_err(|_| CatastroError::unsupported_srs(trimmed))
    }
}

impl fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

impl Serialize for ReferenceSystem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg_prefix() {
        let srs: ReferenceSystem = "EPSG:25830".parse().unwrap();
        assert_eq!(srs.epsg, 25830);
        assert_eq!(srs.axis_order(), AxisOrder::EastNorth);
        assert!(!srs.is_geographic());
    }

    #[test]
    fn test_parse_lowercase_and_bare_code() {
        assert_eq!("epsg:4258".parse::<ReferenceSystem>().unwrap().epsg, 4258);
        assert_eq!("4326".parse::<ReferenceSystem>().unwrap(), ReferenceSystem::WGS84);
    }

    #[test]
    fn test_default_is_wgs84() {
        let srs = ReferenceSystem::default();
        assert_eq!(srs.to_string(), "EPSG:4326");
        assert!(srs.is_geographic());
    }

    #[test]
    fn test_unsupported_reference_system() {
        match "EPSG:2154".parse::<ReferenceSystem>() {
            Err(CatastroError::UnsupportedReferenceSystem { requested, .. }) => {
                assert_eq!(requested, "EPSG:2154");
            }
            other => panic!("Expected UnsupportedReferenceSystem, got {:?}", other),
        }
        assert!("lambert".parse::<ReferenceSystem>().is_err());
    }
}
