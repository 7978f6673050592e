//! Erreurs de migration

use thiserror::Error;

use crate::level::Level;

/// Erreurs fatales de la migration (toutes interrompent l'import)
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Code parent absent de l'index du niveau parent
    #[error("{level} feature #{feature_index}: no {parent} with key {key}")]
    MissingParent {
        level: Level,
        parent: Level,
        key: String,
        feature_index: usize,
    },

    /// Attribut de code absent ou nul
    #[error("{level} feature #{feature_index}: missing attribute {field}")]
    MissingCode {
        level: Level,
        field: &'static str,
        feature_index: usize,
    },

    /// Index d'un niveau parent non fourni (ordre d'import non respecté)
    #[error("{level}: {parent} must be migrated first")]
    MissingLookup { level: Level, parent: Level },

    /// SRID inconnu de spatial_ref_sys
    #[error("Unknown SRID {0} in spatial_ref_sys")]
    UnknownSrid(i32),
}
