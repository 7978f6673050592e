//! Extraction des archives zip du Marco Geoestadístico

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::MarcoError;

/// Archives publiées par l'INEGI, dans l'ordre d'extraction
pub const ARCHIVES: [&str; 3] = ["l.zip", "mun.zip", "ent.zip"];

/// Le répertoire d'extraction existe-t-il déjà ?
///
/// Seule l'existence du répertoire est vérifiée : une extraction partielle
/// ou corrompue n'est pas détectée.
pub fn is_unpacked(target_dir: &Path) -> bool {
    target_dir.exists()
}

/// Chemins des trois archives attendues dans `data_dir`
pub fn archive_paths(data_dir: &Path) -> Vec<PathBuf> {
    ARCHIVES.iter().map(|name| data_dir.join(name)).collect()
}

/// Extrait toutes les archives dans `target_dir`
pub fn unpack(archives: &[PathBuf], target_dir: &Path) -> Result<(), MarcoError> {
    info!(target = %target_dir.display(), "Extracting zip files with geostatistical framework");

    for archive_path in archives {
        if !archive_path.is_file() {
            return Err(MarcoError::MissingFile(archive_path.clone()));
        }

        let file = File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|source| MarcoError::Zip {
            archive: archive_path.clone(),
            source,
        })?;

        archive
            .extract(target_dir)
            .map_err(|source| MarcoError::Zip {
                archive: archive_path.clone(),
                source,
            })?;

        info!(archive = %archive_path.display(), entries = archive.len(), "Archive extracted");
    }

    info!("Extraction done");
    Ok(())
}

/// Extrait les archives de `data_dir` si `target_dir` n'existe pas encore
///
/// Retourne `true` si une extraction a eu lieu.
pub fn ensure_unpacked(data_dir: &Path, target_dir: &Path) -> Result<bool, MarcoError> {
    if is_unpacked(target_dir) {
        info!(target = %target_dir.display(), "Data already unpacked, skipping extraction");
        return Ok(false);
    }

    unpack(&archive_paths(data_dir), target_dir)?;
    Ok(true)
}
