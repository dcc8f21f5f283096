//! Valeurs cadastrales: carte des valeurs urbaines et modules rustiques (IAMIR)

use geo::{BoundingRect, Intersects};
use serde_json::Value;
use tracing::debug;

use super::Catastro;
use crate::catalog::crop_codes;
use crate::mercator;
use crate::parser::envelope::scalar_text;
use crate::transport::HttpResponse;
use crate::types::{CropModules, LandUse, Parcel};
use crate::CatastroError;

const URBAN_VALUES: &str = "GeneraMapaValores";
const RUSTIC_VALUES: &str = "GetFeatureInfo";

impl Catastro {
    /// Valeur de la zone (€/m²) couvrant le centroïde d'une parcelle urbaine.
    ///
    /// Le centroïde doit être en EPSG:4326. `None` pour une parcelle rustique ou
    /// si aucune zone ne couvre le centroïde.
    pub fn urban_value_per_m2(
        &self,
        parcel: &Parcel,
        year: u16,
    ) -> Result<Option<f64>, CatastroError> {
        if parcel.land_use() == LandUse::Rustic {
            return Ok(None);
        }
        if parcel.reference_system().epsg != 4326 {
            return Err(CatastroError::InvalidArgument(format!(
                "urban values need EPSG:4326 coordinates, parcel {} is in {}",
                parcel.reference(),
                parcel.reference_system()
            )));
        }

        let centroid = parcel.centroid();
        let (x, y, year) = (
            centroid.x().to_string(),
            centroid.y().to_string(),
            year.to_string(),
        );
        let response = self.transport.get(
            &self.endpoints.valores_urbanos,
            &[
                ("huso", "4326"),
                ("x", x.as_str()),
                ("y", y.as_str()),
                ("anyoZV", year.as_str()),
                ("suelo", "N"),
                ("tipo_mapa", "vivienda"),
            ],
        )?;
        let body = success_body(URBAN_VALUES, &response)?;

        let zones: geojson::FeatureCollection = serde_json::from_slice(body)
            .map_err(|e| CatastroError::malformed(URBAN_VALUES, e.to_string()))?;

        for zone in zones.features {
            let Some(geometry) = zone.geometry.clone() else {
                continue;
            };
            let geometry = geo::Geometry::<f64>::try_from(geometry)
                .map_err(|e| CatastroError::malformed(URBAN_VALUES, e.to_string()))?;
            if geometry.intersects(&centroid) {
                let value = zone_value(zone.property("Ptipo1"));
                debug!(reference = parcel.reference(), value = ?value, "Urban value zone");
                return Ok(value);
            }
        }

        Ok(None)
    }

    /// Modules €/ha de la région agricole d'une parcelle rustique.
    ///
    /// L'anneau est projeté en Web Mercator pour la BBOX; la couche interrogée
    /// est celle de l'année précédente (`IAMIR{yy-1}`). `None` pour une parcelle
    /// urbaine ou si le WMS ne renvoie aucune région.
    pub fn rustic_crop_modules(
        &self,
        parcel: &Parcel,
        year: u16,
    ) -> Result<Option<CropModules>, CatastroError> {
        if parcel.land_use() == LandUse::Urban {
            return Ok(None);
        }

        let layer = iamir_layer(year)?;
        let bbox = web_mercator_bbox(parcel)?;

        let response = self.transport.get(
            &self.endpoints.valores_rusticos,
            &[
                ("SERVICE", "WMS"),
                ("VERSION", "1.3.0"),
                ("REQUEST", "GetFeatureInfo"),
                ("LAYERS", layer.as_str()),
                ("QUERY_LAYERS", layer.as_str()),
                ("STYLES", ""),
                ("CRS", "EPSG:3857"),
                ("SRS", "EPSG:3857"),
                ("BBOX", bbox.as_str()),
                ("WIDTH", "101"),
                ("HEIGHT", "101"),
                ("FORMAT", "image/png"),
                ("TRANSPARENT", "true"),
                ("I", "55"),
                ("J", "55"),
                ("INFO_FORMAT", "application/json"),
            ],
        )?;
        let body = success_body(RUSTIC_VALUES, &response)?;

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| CatastroError::malformed(RUSTIC_VALUES, e.to_string()))?;

        Ok(crop_modules(&value))
    }
}

fn success_body<'a>(
    operation: &str,
    response: &'a HttpResponse,
) -> Result<&'a [u8], CatastroError> {
    if !response.is_success() {
        return Err(CatastroError::HttpStatus {
            status: response.status,
            url: response.url.clone(),
        });
    }
    if response.body.is_empty() {
        return Err(CatastroError::empty(operation));
    }
    Ok(&response.body)
}

/// `Ptipo1.val_tipo_m2`, l'objet pouvant être encodé en chaîne JSON
fn zone_value(ptipo: Option<&Value>) -> Option<f64> {
    let value = match ptipo? {
        Value::String(encoded) => serde_json::from_str::<Value>(encoded).ok()?,
        other => other.clone(),
    };

    match value.get("val_tipo_m2")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => fast_float::parse(s.trim().replace(',', ".")).ok(),
        _ => None,
    }
}

/// Couche IAMIR de l'année précédant `year` (`2025` → `IAMIR24:athiamir24`)
fn iamir_layer(year: u16) -> Result<String, CatastroError> {
    match year % 100 {
        0 => Err(CatastroError::InvalidArgument(format!(
            "no IAMIR layer precedes year {}",
            year
        ))),
        yy => Ok(format!("IAMIR{0}:athiamir{0}", yy - 1)),
    }
}

/// BBOX `minx,miny,maxx,maxy` de l'anneau en EPSG:3857
fn web_mercator_bbox(parcel: &Parcel) -> Result<String, CatastroError> {
    let boundary = parcel.boundary().ok_or_else(|| {
        CatastroError::InvalidArgument(format!("parcel {} has no boundary", parcel.reference()))
    })?;

    let srs = parcel.reference_system();
    let projected = if srs.epsg == 3857 {
        boundary.clone()
    } else if srs.is_geographic() {
        mercator::project_line(boundary)
    } else {
        return Err(CatastroError::InvalidArgument(format!(
            "rustic values need geographic or EPSG:3857 coordinates, parcel {} is in {}",
            parcel.reference(),
            srs
        )));
    };

    let rect = projected.bounding_rect().ok_or_else(|| {
        CatastroError::InvalidArgument(format!("parcel {} has an empty boundary", parcel.reference()))
    })?;

    Ok(format!(
        "{},{},{},{}",
        rect.min().x,
        rect.min().y,
        rect.max().x,
        rect.max().y
    ))
}

/// Région et modules strictement positifs de la première feature
fn crop_modules(response: &Value) -> Option<CropModules> {
    let properties = response.get("features")?.as_array()?.first()?.get("properties")?;

    let modules_eur_ha = crop_codes()
        .filter_map(|(code, description)| {
            let value = properties.get(code)?.as_f64()?;
            (value > 0.0).then(|| (description.to_string(), value))
        })
        .collect();

    Some(CropModules {
        region: properties.get("REGIONAL").and_then(scalar_text),
        region_name: properties.get("NOMBRE").and_then(scalar_text),
        modules_eur_ha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_iamir_layer() {
        assert_eq!(iamir_layer(2025).unwrap(), "IAMIR24:athiamir24");
        assert_eq!(iamir_layer(2010).unwrap(), "IAMIR9:athiamir9");
        assert!(matches!(
            iamir_layer(2000),
            Err(CatastroError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_zone_value_shapes() {
        assert_eq!(zone_value(Some(&json!({"val_tipo_m2": 1250.5}))), Some(1250.5));
        assert_eq!(zone_value(Some(&json!({"val_tipo_m2": "980,25"}))), Some(980.25));
        assert_eq!(
            zone_value(Some(&json!(r#"{"val_tipo_m2": 700}"#))),
            Some(700.0)
        );
        assert_eq!(zone_value(Some(&json!({"otro": 1}))), None);
        assert_eq!(zone_value(None), None);
    }

    #[test]
    fn test_crop_modules_keeps_positive_values() {
        let response = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"REGIONAL": 5, "NOMBRE": "SIERRA", "E-": 120.5, "C-": 0, "MT": -1, "I-": "x"}
            }]
        });
        let modules = crop_modules(&response).unwrap();
        assert_eq!(modules.region.as_deref(), Some("5"));
        assert_eq!(modules.region_name.as_deref(), Some("SIERRA"));
        assert_eq!(modules.modules_eur_ha, vec![("Pastos".to_string(), 120.5)]);
    }

    #[test]
    fn test_crop_modules_without_features() {
        assert!(crop_modules(&json!({"features": []})).is_none());
        assert!(crop_modules(&json!({})).is_none());
    }
}
