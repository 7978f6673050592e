//! # geoestadistico
//!
//! Lecture du Marco Geoestadístico Integrado de l'INEGI (décembre 2018) :
//! entités, municipios et localités livrés en shapefiles zippés.
//!
//! ## Features
//!
//! - Extraction unique des archives `ent.zip`, `mun.zip`, `l.zip`
//! - Lecture des couches avec le crate `shapefile`, SRS lu dans le `.prj`
//! - Géométries `geo`, normalisées en `MultiPolygon`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoestadistico::{archive, Layer};
//! use std::path::Path;
//!
//! archive::ensure_unpacked(Path::new("data"), Path::new("extracted_data"))?;
//! let mut layer = Layer::open(Path::new("extracted_data/01_32_ent.shp"))?;
//! println!("SRS: {}", layer.srs_wkt());
//!
//! for feature in layer.features() {
//!     let feature = feature?;
//!     println!("{:?}", feature.code("CVE_ENT"));
//! }
//! ```

pub mod archive;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod types;

pub use error::MarcoError;
pub use geometry::to_multipolygon;
pub use layer::Layer;
pub use types::Feature;
