//! Définition et implémentation des commandes CLI
//!
//! - `import`: archives INEGI → PostGIS (ou en mémoire avec `--dry-run`)
//! - `unpack`: extraction seule des archives

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tracing::info;

use crate::config::Config;
use crate::export::pool::{create_pool, test_connection, DatabaseConfig, SslMode};
use crate::export::transaction::MigrationTransaction;
use crate::export::{reproject, MemoryStore, PgStore, SpatialRef};
use crate::migrate;
use crate::report::{MigrationReport, MigrationStatus};

#[derive(Subcommand)]
pub enum Commands {
    /// Import the geostatistical framework (entities, municipalities, localities)
    Import(ImportArgs),

    /// Only extract the zip archives (no database access)
    Unpack {
        /// Directory containing ent.zip, mun.zip and l.zip
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Extraction directory (default: <data-dir>/../extracted_data)
        #[arg(short, long)]
        extract_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Directory containing ent.zip, mun.zip and l.zip
    #[arg(short, long)]
    pub data_dir: PathBuf,

    /// Extraction directory (default: <data-dir>/../extracted_data)
    #[arg(short, long)]
    pub extract_dir: Option<PathBuf>,

    /// Target tables: preset name (irekua) or path to a JSON config
    #[arg(long, default_value = "irekua")]
    pub config: String,

    /// Run the whole migration in memory, without database
    #[arg(long)]
    pub dry_run: bool,

    /// Target SRID for --dry-run (the database column SRID is used otherwise)
    #[arg(long, default_value_t = 4326)]
    pub srid: i32,

    /// Write the migration report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long)]
    pub host: Option<String>,

    /// PostgreSQL database name (défaut : env PGDATABASE / irekua)
    #[arg(long)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long)]
    pub password: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long)]
    pub port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long)]
    pub ssl: Option<SslMode>,
}

/// Répertoire d'extraction par défaut, voisin du répertoire des archives
pub fn default_extract_dir(data_dir: &Path) -> PathBuf {
    data_dir
        .parent()
        .unwrap_or(data_dir)
        .join("extracted_data")
}

/// Exécute la commande unpack
pub fn cmd_unpack(data_dir: &Path, extract_dir: Option<PathBuf>) -> Result<()> {
    let extract_dir = extract_dir.unwrap_or_else(|| default_extract_dir(data_dir));
    let extracted = geoestadistico::archive::ensure_unpacked(data_dir, &extract_dir)
        .context("Failed to unpack geostatistical framework archives")?;

    if extracted {
        println!("Extracted to {}", extract_dir.display());
    } else {
        println!("Already unpacked: {}", extract_dir.display());
    }
    Ok(())
}

/// Exécute la commande import
pub async fn cmd_import(args: ImportArgs, show_progress: bool) -> Result<()> {
    let started_at = Instant::now();
    let extract_dir = args
        .extract_dir
        .clone()
        .unwrap_or_else(|| default_extract_dir(&args.data_dir));

    info!(
        data_dir = %args.data_dir.display(),
        extract_dir = %extract_dir.display(),
        dry_run = args.dry_run,
        "Starting migration"
    );

    println!("=== Marco Geoestadístico 2018 ===");
    println!("Data: {}", args.data_dir.display());
    println!("Extract dir: {}", extract_dir.display());
    println!("Config: {}", args.config);
    println!(
        "Reprojection: {}",
        if reproject::is_available() {
            "PROJ"
        } else {
            "identity only"
        }
    );

    let mut report = MigrationReport::new();
    let result = if args.dry_run {
        println!("Mode: dry-run (EPSG:{})", args.srid);
        run_in_memory(&args, &extract_dir, &mut report, show_progress).await
    } else {
        run_postgis(&args, &extract_dir, &mut report, show_progress).await
    };
    report.set_duration(started_at.elapsed());

    report.display();
    if let Some(path) = &args.report {
        report
            .save_to_file(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    info!("{}", report.summary());
    result
}

async fn run_in_memory(
    args: &ImportArgs,
    extract_dir: &Path,
    report: &mut MigrationReport,
    show_progress: bool,
) -> Result<()> {
    let mut store = MemoryStore::new(SpatialRef::epsg(args.srid));
    let result = migrate::run(&mut store, &args.data_dir, extract_dir, report, show_progress).await;
    match result {
        Ok(()) => {
            report.status = MigrationStatus::DryRun;
            Ok(())
        }
        Err(e) => {
            report.mark_failed(&format!("{:#}", e));
            Err(e)
        }
    }
}

async fn run_postgis(
    args: &ImportArgs,
    extract_dir: &Path,
    report: &mut MigrationReport,
    show_progress: bool,
) -> Result<()> {
    let config = Config::resolve(&args.config)?;

    let mut db_config = DatabaseConfig::from_env();
    db_config.apply_overrides(
        args.host.clone(),
        args.database.clone(),
        args.user.clone(),
        args.password.clone(),
        args.port,
        args.ssl,
    );
    println!(
        "Database: {}@{}:{}/{} (SSL: {:?})",
        db_config.user, db_config.host, db_config.port, db_config.dbname, db_config.ssl_mode
    );

    let pool = create_pool(&db_config).await?;
    test_connection(&pool).await?;
    println!("Connected to PostgreSQL");

    let mut client = pool
        .get()
        .await
        .context("Failed to get connection from pool")?;
    let tx = MigrationTransaction::begin(&mut client).await?;

    let result = {
        let mut store = PgStore::new(tx.transaction(), &config);
        migrate::run(&mut store, &args.data_dir, extract_dir, report, show_progress).await
    };

    match result {
        Ok(()) => tx.commit(report).await,
        Err(e) => {
            tx.rollback(report, &format!("{:#}", e)).await;
            Err(e)
        }
    }
}
