//! Point d'entrée CLI pour catastro

use std::path::PathBuf;

use anyhow::{Context, Result};
use catastro::{Catastro, CatastroConfig};
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Consulter le Catastro espagnol (parcelles, bâtiments, valeurs)
#[derive(Parser)]
#[command(name = "catastro")]
#[command(author, version)]
#[command(about = "Query the Spanish Catastro: parcels by reference, polygon/parcel or address")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// JSON configuration file (endpoints, timeout). Default: CATASTRO_* environment variables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    // Pas de requête pour les tables statiques
    if let Commands::TiposVia = cli.command {
        return cli::cmd_street_types();
    }

    let config = match &cli.config {
        Some(path) => CatastroConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CatastroConfig::from_env(),
    };
    debug!(callejero = %config.endpoints.callejero, timeout = config.timeout_secs, "Configuration");

    let catastro = Catastro::new(config).context("Failed to build Catastro client")?;

    match cli.command {
        Commands::Parcela {
            lookup,
            format,
            output,
        } => cli::cmd_parcel(&catastro, &lookup, format, output.as_deref())?,
        Commands::Meta {
            lookup,
            format,
            output,
        } => cli::cmd_collection(&catastro, &lookup, format, output.as_deref())?,
        Commands::Plantas { lookup } => cli::cmd_floors(&catastro, &lookup)?,
        Commands::Valor { lookup, anio } => cli::cmd_value(&catastro, &lookup, anio)?,
        Commands::TiposVia => {}
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout reste réservé au JSON
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
