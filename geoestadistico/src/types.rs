//! Types de données pour le crate geoestadistico

use std::collections::HashMap;

use geo::Geometry;
use serde_json::Value;

/// Une feature du Marco Geoestadístico avec sa géométrie et ses attributs
#[derive(Debug, Clone)]
pub struct Feature {
    /// Position de la feature dans le shapefile (0-based)
    pub index: usize,

    /// Géométrie source (Polygon ou MultiPolygon, dans le SRS de la couche)
    pub geometry: Geometry,

    /// Attributs de la table .dbf (nom de champ -> valeur)
    pub properties: HashMap<String, Value>,
}

impl Feature {
    /// Valeur brute d'un attribut
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Valeur d'un attribut sous forme de code texte ("01", "001", ...)
    ///
    /// Les champs numériques sont rendus sans partie décimale quand ils sont entiers.
    pub fn code(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Some(i.to_string()),
                (None, Some(f)) if f.fract() == 0.0 => Some(format!("{}", f as i64)),
                _ => Some(n.to_string()),
            },
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
