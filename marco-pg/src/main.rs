//! Point d'entrée CLI pour marco-pg

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use marco_pg::cli::{self, Commands};

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

/// Importer le Marco Geoestadístico INEGI (entidades, municipios, localidades) vers PostGIS
#[derive(Parser)]
#[command(name = "marco-pg")]
#[command(author, version)]
#[command(about = "Importer le Marco Geoestadístico INEGI 2018 vers PostGIS")]
#[command(long_about = "Migration unique des limites géostatistiques (entité > municipio > localité) depuis les shapefiles zippés de l'INEGI vers PostGIS, avec la hiérarchie is_part_of.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Import(args) => {
            info!(data_dir = %args.data_dir.display(), "Import vers PostGIS");
            cli::cmd_import(args, !cli.quiet).await?;
        }
        Commands::Unpack {
            data_dir,
            extract_dir,
        } => {
            cli::cmd_unpack(&data_dir, extract_dir)?;
        }
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

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
