//! Définition et implémentation des commandes CLI
//!
//! - `parcela`: une parcelle (JSON ou GeoJSON)
//! - `meta`: tous les biens d'une référence parapluie
//! - `plantas`: nombre de niveaux
//! - `valor`: valeur urbaine €/m² ou modules rustiques €/ha
//! - `tipos-via`: sigles des types de voie

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use catastro::catalog::street_types;
use catastro::{write_geojson, Catastro, LandUse, Parcel, ParcelQuery};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use tracing::info;

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a single parcel (fails if the lookup matches several properties)
    Parcela {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve every property under an umbrella reference
    Meta {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Number of floors of an urban parcel
    Plantas {
        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Urban value per m² or rustic crop modules per hectare
    Valor {
        #[command(flatten)]
        lookup: LookupArgs,

        /// Valuation year (e.g. 2025)
        #[arg(long)]
        anio: u16,
    },

    /// List street type codes
    TiposVia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Geojson,
}

/// Un des trois groupes: `--rc`, polygone/parcelle, ou adresse
#[derive(Args, Debug, Clone, Default)]
pub struct LookupArgs {
    /// Cadastral reference (14 or 20 characters)
    #[arg(long)]
    pub rc: Option<String>,

    /// Province name
    #[arg(long)]
    pub provincia: Option<String>,

    /// Municipality name
    #[arg(long)]
    pub municipio: Option<String>,

    /// Rustic polygon number
    #[arg(long)]
    pub poligono: Option<String>,

    /// Rustic parcel number
    #[arg(long)]
    pub parcela: Option<String>,

    /// Street type code (CL, AV, PZ, ...)
    #[arg(long)]
    pub tipo_via: Option<String>,

    /// Street name
    #[arg(long)]
    pub calle: Option<String>,

    /// House number
    #[arg(long)]
    pub numero: Option<String>,

    /// Target reference system (default: EPSG:4326)
    #[arg(long)]
    pub srs: Option<String>,
}

impl LookupArgs {
    pub fn query(&self) -> ParcelQuery {
        ParcelQuery {
            reference: self.rc.clone(),
            province: self.provincia.clone(),
            municipality: self.municipio.clone(),
            polygon: self.poligono.clone(),
            parcel: self.parcela.clone(),
            street_type: self.tipo_via.clone(),
            street: self.calle.clone(),
            number: self.numero.clone(),
            reference_system: self.srs.clone(),
        }
    }
}

pub fn cmd_parcel(
    catastro: &Catastro,
    lookup: &LookupArgs,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let parcel = catastro.parcel(&lookup.query())?;
    info!(reference = parcel.reference(), "Parcelle résolue");

    let parcels = std::slice::from_ref(&parcel);
    write_output(output, |writer| match format {
        OutputFormat::Json => write_json(writer, &parcel),
        OutputFormat::Geojson => Ok(write_geojson(parcels, writer)?),
    })
}

pub fn cmd_collection(
    catastro: &Catastro,
    lookup: &LookupArgs,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let collection = catastro.parcel_collection(&lookup.query())?;
    info!(
        reference = collection.reference(),
        parcels = collection.len(),
        "Collection résolue"
    );

    write_output(output, |writer| match format {
        OutputFormat::Json => write_json(writer, &collection),
        OutputFormat::Geojson => Ok(write_geojson(collection.parcels(), writer)?),
    })
}

pub fn cmd_floors(catastro: &Catastro, lookup: &LookupArgs) -> Result<()> {
    let parcel = catastro.parcel(&lookup.query())?;
    let floors = catastro.floor_count(&parcel)?;

    write_output(None, |writer| {
        write_json(
            writer,
            &json!({
                "reference": parcel.reference(),
                "floors": floors,
            }),
        )
    })
}

pub fn cmd_value(catastro: &Catastro, lookup: &LookupArgs, year: u16) -> Result<()> {
    let parcel = catastro.parcel(&lookup.query())?;
    let report = value_report(catastro, &parcel, year)?;

    write_output(None, |writer| write_json(writer, &report))
}

fn value_report(catastro: &Catastro, parcel: &Parcel, year: u16) -> Result<serde_json::Value> {
    Ok(match parcel.land_use() {
        LandUse::Urban => json!({
            "reference": parcel.reference(),
            "year": year,
            "value_eur_m2": catastro.urban_value_per_m2(parcel, year)?,
        }),
        LandUse::Rustic => json!({
            "reference": parcel.reference(),
            "year": year,
            "crop_modules": catastro.rustic_crop_modules(parcel, year)?,
        }),
    })
}

pub fn cmd_street_types() -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for (code, name) in street_types() {
        writeln!(out, "{:<4}{}", code, name)?;
    }
    Ok(())
}

/// Écrit dans `output` ou sur stdout
fn write_output<F>(output: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()?;
            info!(path = %path.display(), "Fichier écrit");
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            write(&mut writer)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(writer: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(writer, value).context("Failed to serialize JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    fn parse(args: &[&str]) -> Commands {
        TestCli::try_parse_from(std::iter::once("catastro").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_parcela_by_reference() {
        match parse(&["parcela", "--rc", "1541506VK4714B0002PK", "--srs", "EPSG:25830"]) {
            Commands::Parcela {
                lookup,
                format,
                output,
            } => {
                let query = lookup.query();
                assert_eq!(query.reference.as_deref(), Some("1541506VK4714B0002PK"));
                assert_eq!(query.reference_system.as_deref(), Some("EPSG:25830"));
                assert_eq!(format, OutputFormat::Json);
                assert!(output.is_none());
            }
            _ => panic!("Expected parcela"),
        }
    }

    #[test]
    fn test_meta_by_polygon_to_geojson() {
        match parse(&[
            "meta",
            "--provincia",
            "MADRID",
            "--municipio",
            "GUADALIX DE LA SIERRA",
            "--poligono",
            "23",
            "--parcela",
            "149",
            "--format",
            "geojson",
            "-o",
            "out.geojson",
        ]) {
            Commands::Meta {
                lookup,
                format,
                output,
            } => {
                let query = lookup.query();
                assert_eq!(query.polygon.as_deref(), Some("23"));
                assert_eq!(query.parcel.as_deref(), Some("149"));
                assert!(query.reference.is_none());
                assert_eq!(format, OutputFormat::Geojson);
                assert_eq!(output, Some(PathBuf::from("out.geojson")));
            }
            _ => panic!("Expected meta"),
        }
    }

    #[test]
    fn test_address_arguments() {
        match parse(&[
            "plantas",
            "--provincia",
            "Alicante",
            "--municipio",
            "Alicante",
            "--tipo-via",
            "CL",
            "--calle",
            "Mayor",
            "--numero",
            "4",
        ]) {
            Commands::Plantas { lookup } => {
                let query = lookup.query();
                assert_eq!(query.street_type.as_deref(), Some("CL"));
                assert_eq!(query.street.as_deref(), Some("Mayor"));
                assert_eq!(query.number.as_deref(), Some("4"));
                assert!(query.lookup().is_ok());
            }
            _ => panic!("Expected plantas"),
        }
    }

    #[test]
    fn test_valor_requires_year() {
        assert!(TestCli::try_parse_from(["catastro", "valor", "--rc", "28067A023001490000FJ"]).is_err());
        assert!(matches!(
            parse(&["valor", "--rc", "28067A023001490000FJ", "--anio", "2025"]),
            Commands::Valor { anio: 2025, .. }
        ));
    }

    #[test]
    fn test_invalid_format() {
        assert!(TestCli::try_parse_from(["catastro", "parcela", "--rc", "X", "--format", "csv"]).is_err());
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        write_output(Some(path.as_path()), |writer| write_json(writer, &json!({"superficie": 39.0}))).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["superficie"], 39.0);
    }
}
