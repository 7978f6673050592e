//! Migration des trois niveaux du Marco Geoestadístico
//!
//! Chaque niveau est importé en une passe séquentielle : création du
//! LocalityType, puis une Locality par feature, rattachée à ses parents via
//! les index (clé géographique -> Locality) retournés par les passes
//! précédentes.

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use geo::{Geometry, MultiPolygon};
use geoestadistico::{Feature, Layer, MarcoError};
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::MigrationError;
use crate::export::{LocalityId, LocalityStore, LocalityTypeId, NewLocality, Reprojector};
use crate::level::{Level, NAME_ATTRIBUTE};
use crate::report::{LevelReport, MigrationReport};
use crate::schema;

/// Index d'un niveau : clé géographique -> Locality créée
pub type CodeIndex = HashMap<String, LocalityId>;

/// Index des niveaux déjà migrés, transmis aux passes suivantes
#[derive(Debug, Default)]
pub struct Lookups {
    tables: HashMap<Level, CodeIndex>,
}

impl Lookups {
    /// Ajoute l'index complet d'un niveau
    pub fn insert(&mut self, level: Level, index: CodeIndex) {
        self.tables.insert(level, index);
    }

    pub fn get(&self, level: Level) -> Option<&CodeIndex> {
        self.tables.get(&level)
    }
}

/// Résultat de la passe d'un niveau
#[derive(Debug)]
pub struct LevelOutcome {
    pub level: Level,
    pub locality_type: LocalityTypeId,
    /// Nombre de Locality créées
    pub created: usize,
    /// Nombre de liens `is_part_of` créés
    pub links: usize,
    /// Index du niveau (vide pour les niveaux sans enfants)
    pub index: CodeIndex,
}

/// Clé d'une feature pour un niveau donné (`01`, `01/001`, ...)
pub fn feature_key(level: Level, key_level: Level, feature: &Feature) -> Result<String, MigrationError> {
    let mut parts = Vec::with_capacity(key_level.key_fields().len());
    for field in key_level.key_fields() {
        let code = feature.code(field).ok_or(MigrationError::MissingCode {
            level,
            field,
            feature_index: feature.index,
        })?;
        parts.push(code);
    }
    Ok(parts.join("/"))
}

/// Résout les parents d'une feature dans les index des niveaux précédents
pub fn resolve_parents(
    level: Level,
    feature: &Feature,
    lookups: &Lookups,
) -> Result<Vec<LocalityId>, MigrationError> {
    level
        .parents()
        .iter()
        .map(|&parent| {
            let index = lookups
                .get(parent)
                .ok_or(MigrationError::MissingLookup { level, parent })?;
            let key = feature_key(level, parent, feature)?;
            index
                .get(&key)
                .copied()
                .ok_or(MigrationError::MissingParent {
                    level,
                    parent,
                    key,
                    feature_index: feature.index,
                })
        })
        .collect()
}

/// Métadonnées d'une feature : exactement les attributs du niveau
pub fn feature_metadata(level: Level, feature: &Feature) -> Map<String, Value> {
    level
        .attributes()
        .iter()
        .map(|(code, _)| {
            let value = feature.property(code).cloned().unwrap_or(Value::Null);
            ((*code).to_string(), value)
        })
        .collect()
}

/// Nom de la feature (`NOMGEO`) tel quel, vide si absent
pub fn feature_name(feature: &Feature) -> String {
    match feature.property(NAME_ATTRIBUTE) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Sérialise un MultiPolygon en WKT
pub fn to_wkt(geometry: MultiPolygon) -> Result<String> {
    let mut wkt_buf = Vec::new();
    {
        let mut writer = WktWriter::new(&mut wkt_buf);
        Geometry::MultiPolygon(geometry)
            .process_geom(&mut writer)
            .context("Failed to write geometry as WKT")?;
    }
    Ok(String::from_utf8(wkt_buf)?)
}

/// Barre de progression d'une couche
pub fn level_progress(level: Level, len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg:<10} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(level.name());
    pb
}

/// Migre les features d'un niveau
///
/// Les parents sont résolus avant l'insertion : une clé parente inconnue
/// interrompt la passe sans créer de Locality orpheline.
pub async fn migrate_features<S, I>(
    store: &mut S,
    level: Level,
    source_srs: &str,
    features: I,
    lookups: &Lookups,
    progress: &ProgressBar,
) -> Result<LevelOutcome>
where
    S: LocalityStore,
    I: IntoIterator<Item = Result<Feature, MarcoError>>,
{
    info!(level = %level, "Migrating {}", level);

    let locality_type = store
        .create_locality_type(&schema::locality_type(level, source_srs))
        .await?;

    let target = store.target_srs().await?;
    let reprojector = Reprojector::new(source_srs, &target.definition)
        .with_context(|| format!("Failed to build transform for {}", level))?;

    let mut outcome = LevelOutcome {
        level,
        locality_type,
        created: 0,
        links: 0,
        index: CodeIndex::new(),
    };

    for feature in features {
        let feature = feature.with_context(|| format!("Failed to read {} feature", level))?;

        let parents = resolve_parents(level, &feature, lookups)?;
        let key = if level.is_parent_level() {
            Some(feature_key(level, level, &feature)?)
        } else {
            None
        };

        let name = feature_name(&feature);
        let metadata = feature_metadata(level, &feature);
        let index = feature.index;

        let mut geometry = geoestadistico::to_multipolygon(feature.geometry, index)?;
        reprojector
            .transform_in_place(&mut geometry)
            .with_context(|| format!("Failed to reproject {} feature #{}", level, index))?;

        let locality = NewLocality {
            name,
            geometry_wkt: to_wkt(geometry)?,
            srid: target.srid,
            locality_type,
            metadata,
        };
        let id = store.create_locality(&locality).await?;
        outcome.created += 1;

        if !parents.is_empty() {
            store.add_parents(id, &parents).await?;
            outcome.links += parents.len();
        }

        if let Some(key) = key {
            if outcome.index.insert(key.clone(), id).is_some() {
                debug!(level = %level, key = %key, "Duplicate key, keeping the last feature");
            }
        }

        progress.inc(1);
    }

    progress.finish_and_clear();
    info!(
        level = %level,
        created = outcome.created,
        links = outcome.links,
        "Done migrating {}",
        level
    );

    Ok(outcome)
}

/// Ouvre la couche d'un niveau et la migre
pub async fn migrate_layer<S: LocalityStore>(
    store: &mut S,
    level: Level,
    extract_dir: &Path,
    lookups: &Lookups,
    show_progress: bool,
) -> Result<LevelOutcome> {
    let path = extract_dir.join(level.file_name());
    let mut layer =
        Layer::open(&path).with_context(|| format!("Failed to open layer {}", path.display()))?;

    let progress = if show_progress {
        level_progress(level, layer.feature_count() as u64)
    } else {
        ProgressBar::hidden()
    };

    let source_srs = layer.srs_wkt().to_string();
    migrate_features(store, level, &source_srs, layer.features(), lookups, &progress).await
}

/// Migre les trois niveaux dans l'ordre entité -> municipio -> localité
///
/// L'index de chaque niveau parent est complet avant le début de la passe suivante.
pub async fn migrate_all<S: LocalityStore>(
    store: &mut S,
    extract_dir: &Path,
    report: &mut MigrationReport,
    show_progress: bool,
) -> Result<()> {
    let mut lookups = Lookups::default();

    for level in Level::ALL {
        let started_at = Instant::now();
        let outcome = migrate_layer(store, level, extract_dir, &lookups, show_progress).await?;

        report.record_level(LevelReport {
            level,
            locality_type_id: outcome.locality_type.0,
            created: outcome.created,
            links: outcome.links,
            duration_secs: started_at.elapsed().as_secs_f64(),
        });

        if level.is_parent_level() {
            lookups.insert(level, outcome.index);
        }
    }

    Ok(())
}

/// Extrait les archives si besoin puis migre les trois niveaux
pub async fn run<S: LocalityStore>(
    store: &mut S,
    data_dir: &Path,
    extract_dir: &Path,
    report: &mut MigrationReport,
    show_progress: bool,
) -> Result<()> {
    report.extracted = geoestadistico::archive::ensure_unpacked(data_dir, extract_dir)
        .context("Failed to unpack geostatistical framework archives")?;

    migrate_all(store, extract_dir, report, show_progress).await
}
