//! Lecture d'une couche shapefile (.shp + .dbf + .prj)

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::{Number, Value};
use shapefile::dbase::{FieldValue, Record};
use tracing::debug;

use crate::geometry::shape_to_geometry;
use crate::{Feature, MarcoError};

type ShpReader = shapefile::Reader<BufReader<File>, BufReader<File>>;

/// Couche shapefile ouverte en lecture
pub struct Layer {
    path: PathBuf,
    srs_wkt: String,
    reader: ShpReader,
}

impl Layer {
    /// Ouvre un shapefile et lit son système de référence dans le `.prj`
    pub fn open(path: &Path) -> Result<Self, MarcoError> {
        if !path.is_file() {
            return Err(MarcoError::MissingFile(path.to_path_buf()));
        }

        let prj = path.with_extension("prj");
        if !prj.is_file() {
            return Err(MarcoError::MissingProjection(path.to_path_buf()));
        }
        let srs_wkt = std::fs::read_to_string(&prj)?.trim().to_string();

        let reader = shapefile::Reader::from_path(path)?;
        debug!(layer = %path.display(), "Opened shapefile layer");

        Ok(Self {
            path: path.to_path_buf(),
            srs_wkt,
            reader,
        })
    }

    /// Chemin du `.shp`
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SRS source en WKT, tel que déclaré par le `.prj`
    pub fn srs_wkt(&self) -> &str {
        &self.srs_wkt
    }

    /// Nombre de features déclaré par l'index `.shx`
    pub fn feature_count(&self) -> usize {
        self.reader.shape_count().unwrap_or(0)
    }

    /// Itère les features dans l'ordre du fichier
    pub fn features(&mut self) -> impl Iterator<Item = Result<Feature, MarcoError>> + '_ {
        self.reader
            .iter_shapes_and_records()
            .enumerate()
            .map(|(index, item)| {
                let (shape, record) = item?;
                Ok(Feature {
                    index,
                    geometry: shape_to_geometry(shape, index)?,
                    properties: record_to_properties(record),
                })
            })
    }
}

/// Convertit un enregistrement dBase en attributs JSON
pub fn record_to_properties(record: Record) -> HashMap<String, Value> {
    let fields: HashMap<String, FieldValue> = record.into();
    fields
        .into_iter()
        .map(|(name, value)| (name, field_to_json(value)))
        .collect()
}

/// Convertit une valeur dBase en valeur JSON
pub fn field_to_json(value: FieldValue) -> Value {
    match value {
        FieldValue::Character(Some(s)) => Value::String(s),
        FieldValue::Memo(s) => Value::String(s),
        FieldValue::Integer(i) => Value::from(i),
        FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
            float_to_json(n)
        }
        FieldValue::Float(Some(f)) => float_to_json(f64::from(f)),
        FieldValue::Logical(Some(b)) => Value::Bool(b),
        FieldValue::Character(None)
        | FieldValue::Numeric(None)
        | FieldValue::Float(None)
        | FieldValue::Logical(None)
        | FieldValue::Date(None) => Value::Null,
        other => Value::String(format!("{:?}", other)),
    }
}

fn float_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}
