//! # marco-pg
//!
//! Import unique du Marco Geoestadístico Integrado INEGI (décembre 2018) vers PostGIS.
//!
//! ## Features
//!
//! - Extraction des archives zippées (une seule fois)
//! - Un LocalityType par niveau, avec son JSON Schema de métadonnées
//! - Une Locality par feature, reprojetée dans le SRS de la colonne cible
//! - Hiérarchie `is_part_of` : localité ⊂ municipio ⊂ entité
//! - Transaction unique : tout ou rien
//!
//! ## Usage CLI
//!
//! ```bash
//! # Import vers PostGIS
//! marco-pg import --data-dir ./data
//!
//! # Exécution à blanc en mémoire
//! marco-pg import --data-dir ./data --dry-run --report report.json
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod level;
pub mod migrate;
pub mod report;
pub mod schema;

pub use config::Config;
pub use error::MigrationError;
pub use export::{LocalityStore, MemoryStore, PgStore};
pub use level::Level;
pub use report::{MigrationReport, MigrationStatus};
