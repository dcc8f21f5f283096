//! Export GeoJSON avec geozero
//!
//! Une feature par parcelle: l'anneau extérieur en polygone, ou le centroïde
//! en point si le WFS n'a pas fourni de contour. Les propriétés sont la
//! sérialisation serde de la parcelle, sans les champs géométriques.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use geo::{Geometry, Polygon};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use serde_json::Value;

use crate::types::Parcel;
use crate::CatastroError;

/// Champs déjà portés par la géométrie de la feature
const GEOMETRY_KEYS: &[&str] = &["centroid", "boundary"];

/// Écrit un fichier GeoJSON
pub fn export_to_geojson(parcels: &[Parcel], output_path: &Path) -> Result<(), CatastroError> {
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    write_geojson(parcels, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Écrit une FeatureCollection, le CRS étant celui de la première parcelle
pub fn write_geojson<W: Write>(parcels: &[Parcel], mut writer: W) -> Result<(), CatastroError> {
    let epsg = parcels
        .first()
        .map(Parcel::reference_system)
        .unwrap_or_default()
        .epsg;

    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        epsg
    )?;

    for (i, parcel) in parcels.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, parcel)?;
    }

    write!(writer, "]}}")?;
    Ok(())
}

fn write_feature<W: Write>(writer: &mut W, parcel: &Parcel) -> Result<(), CatastroError> {
    write!(writer, r#"{{"type":"Feature","id":"#)?;
    serde_json::to_writer(&mut *writer, parcel.reference()).map_err(export_error)?;

    write!(writer, r#","geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    feature_geometry(parcel)
        .process_geom(&mut geom_writer)
        .map_err(|e| CatastroError::Export(e.to_string()))?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":"#)?;
    let mut properties = serde_json::to_value(parcel).map_err(export_error)?;
    if let Value::Object(map) = &mut properties {
        for key in GEOMETRY_KEYS {
            map.remove(*key);
        }
    }
    serde_json::to_writer(&mut *writer, &properties).map_err(export_error)?;

    write!(writer, "}}")?;
    Ok(())
}

fn feature_geometry(parcel: &Parcel) -> Geometry<f64> {
    match parcel.boundary() {
        Some(ring) => Geometry::Polygon(Polygon::new(ring.clone(), Vec::new())),
        None => Geometry::Point(parcel.centroid()),
    }
}

fn export_error(e: serde_json::Error) -> CatastroError {
    CatastroError::Export(e.to_string())
}
