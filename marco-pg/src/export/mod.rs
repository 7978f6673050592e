//! Persistance des LocalityType / Locality (PostGIS ou mémoire)

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod reproject;
pub mod transaction;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use reproject::Reprojector;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Map, Value};

/// Identifiant d'un LocalityType créé
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalityTypeId(pub i64);

/// Identifiant d'une Locality créée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LocalityId(pub i64);

/// Système de référence de la colonne géométrie cible
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRef {
    /// SRID PostGIS
    pub srid: i32,
    /// Définition passée à PROJ (`EPSG:4326` ou WKT)
    pub definition: String,
}

impl SpatialRef {
    /// SRS identifié par un code EPSG
    pub fn epsg(srid: i32) -> Self {
        Self {
            srid,
            definition: format!("EPSG:{}", srid),
        }
    }
}

/// LocalityType à insérer (un par niveau)
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocalityType {
    pub name: String,
    pub metadata_schema: Value,
    /// Date au format YYYY-MM-DD
    pub publication_date: String,
    pub source: String,
    pub description: String,
    /// SRS source de la couche (WKT), conservé pour la provenance
    pub original_datum: String,
}

/// Locality à insérer (une par feature)
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocality {
    pub name: String,
    /// MultiPolygon en WKT, dans le SRS cible
    pub geometry_wkt: String,
    pub srid: i32,
    pub locality_type: LocalityTypeId,
    /// Attributs du niveau (code -> valeur)
    pub metadata: Map<String, Value>,
}

/// Opérations de persistance utilisées par la migration
///
/// Les appels sont strictement séquentiels : une insertion par feature.
#[allow(async_fn_in_trait)]
pub trait LocalityStore {
    /// SRS déclaré par la colonne géométrie des Locality
    async fn target_srs(&mut self) -> Result<SpatialRef>;

    /// Crée un LocalityType
    async fn create_locality_type(&mut self, locality_type: &NewLocalityType)
        -> Result<LocalityTypeId>;

    /// Crée une Locality
    async fn create_locality(&mut self, locality: &NewLocality) -> Result<LocalityId>;

    /// Ajoute des parents à l'ensemble `is_part_of` d'une Locality
    async fn add_parents(&mut self, child: LocalityId, parents: &[LocalityId]) -> Result<()>;
}
