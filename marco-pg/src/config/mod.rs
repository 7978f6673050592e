//! Configuration des tables cibles

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tables cibles de la migration
///
/// Les colonnes des LocalityType et Locality sont fixes ; seuls les noms de
/// tables (et la table d'association `is_part_of`) varient selon l'application.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Schéma PostgreSQL
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Table des LocalityType
    pub locality_type_table: String,

    /// Table des Locality
    pub locality_table: String,

    /// Colonne géométrie de la table des Locality (son SRID est la cible)
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,

    /// Table d'association Locality -> parents
    pub is_part_of: IsPartOfConfig,
}

/// Table d'association `is_part_of`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IsPartOfConfig {
    pub table: String,

    /// Colonne référençant l'enfant
    pub from_column: String,

    /// Colonne référençant le parent
    pub to_column: String,
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_geometry_column() -> String {
    "geometry".to_string()
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "irekua" => Self::load_embedded(include_str!("presets/irekua.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: irekua", preset),
        }
    }

    /// Preset embarqué ou chemin vers un fichier JSON
    pub fn resolve(name: &str) -> Result<Self> {
        match name {
            "irekua" => Self::from_preset(name),
            _ => Self::load(Path::new(name)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Les noms sont interpolés dans le SQL : seuls les identifiants simples sont acceptés
    fn validate(&self) -> Result<()> {
        let identifiers = [
            &self.schema,
            &self.locality_type_table,
            &self.locality_table,
            &self.geometry_column,
            &self.is_part_of.table,
            &self.is_part_of.from_column,
            &self.is_part_of.to_column,
        ];

        for ident in identifiers {
            if !is_plain_identifier(ident) {
                anyhow::bail!("Invalid SQL identifier in config: {:?}", ident);
            }
        }
        Ok(())
    }

    /// Nom qualifié `schema.table`
    pub fn qualified(&self, table: &str) -> String {
        format!("{}.{}", self.schema, table)
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
