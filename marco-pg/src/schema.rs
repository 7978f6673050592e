//! Schéma de métadonnées et description d'un LocalityType

use serde_json::{json, Map, Value};

use crate::export::NewLocalityType;
use crate::level::Level;

/// Date de publication du Marco Geoestadístico Integrado
pub const PUBLICATION_DATE: &str = "2018-12-01";

/// Page de référence INEGI
pub const SOURCE_URL: &str = "https://www.inegi.org.mx/temas/mg/default.html";

const SCHEMA_TITLE: &str = "INEGI Marco Geoestadístico 2018";

const INEGI_DESCRIPTION: &str = "El Marco Geoestadístico (MG) Integrado se conforma por información vectorial, tablas de atributos y catálogos.
Muestra la división geoestadística del territorio nacional en sucesivos niveles de desagregación. Esta división está dada por los llamados LÍMITES GEOESTADÍSTICOS, que pueden coincidir con los límites político-administrativos oficiales, los cuales tienen sustento legal; sin embargo, los que no cuentan con dicho sustento deben entenderse como límites provisionales, trazados sólo para realizar los operativos censales. Estos límites provisionales no tienen pretensión de oficialidad, dado que el Instituto Nacional de Estadística y Geografía no es el órgano facultado para definir límites político-administrativos.
El MG contiene además la cobertura de todas las localidades del territorio nacional, de manera que a cada una de las viviendas le corresponde una secuencia de claves de identificación geográfica que está dada por los sucesivos niveles de desagregación en los que se divide el territorio nacional.
";

/// Construit le JSON Schema des métadonnées d'un niveau
///
/// Chaque attribut du niveau est une propriété `integer` obligatoire.
pub fn metadata_schema(level: Level) -> Value {
    let mut required = Vec::with_capacity(level.attributes().len());
    let mut properties = Map::new();

    for (code, title) in level.attributes() {
        required.push(Value::String((*code).to_string()));
        properties.insert(
            (*code).to_string(),
            json!({
                "type": "integer",
                "title": title,
            }),
        );
    }

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "title": format!("{} {}", level.name(), SCHEMA_TITLE),
        "required": required,
        "properties": properties,
    })
}

/// Nom du LocalityType d'un niveau
pub fn locality_type_name(level: Level) -> String {
    format!(
        "MARCO GEOESTADÍSTICO INTEGRADO, DICIEMBRE  2018 ({})",
        level.name()
    )
}

/// LocalityType à créer pour un niveau dont la couche est en `original_datum`
pub fn locality_type(level: Level, original_datum: &str) -> NewLocalityType {
    NewLocalityType {
        name: locality_type_name(level),
        metadata_schema: metadata_schema(level),
        publication_date: PUBLICATION_DATE.to_string(),
        source: SOURCE_URL.to_string(),
        description: INEGI_DESCRIPTION.to_string(),
        original_datum: original_datum.to_string(),
    }
}
