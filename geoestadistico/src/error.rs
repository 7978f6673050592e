//! Types d'erreurs pour le crate geoestadistico

use std::path::PathBuf;

use thiserror::Error;

/// Erreurs pouvant survenir lors de la lecture du Marco Geoestadístico
#[derive(Debug, Error)]
pub enum MarcoError {
    /// Erreur d'I/O lors de la lecture ou de l'extraction
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Archive zip corrompue ou illisible
    #[error("Invalid zip archive {archive}: {source}")]
    Zip {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// Erreur de lecture du shapefile (.shp/.shx/.dbf)
    #[error("Shapefile error: {0}")]
    Shapefile(#[from] shapefile::Error),

    /// Fichier attendu absent
    #[error("Missing required file: {}", .0.display())]
    MissingFile(PathBuf),

    /// Pas de fichier .prj à côté du shapefile
    #[error("Missing projection (.prj) for layer {}", .0.display())]
    MissingProjection(PathBuf),

    /// Géométrie autre que Polygon/MultiPolygon
    #[error("Unsupported geometry for feature #{feature_index}: {shape_type}")]
    UnsupportedGeometry {
        feature_index: usize,
        shape_type: String,
    },
}

impl MarcoError {
    /// Crée une erreur de géométrie non supportée
    pub fn unsupported_geometry(feature_index: usize, shape_type: impl Into<String>) -> Self {
        Self::UnsupportedGeometry {
            feature_index,
            shape_type: shape_type.into(),
        }
    }
}
