//! Niveaux du Marco Geoestadístico et leurs attributs

use std::fmt;

use serde::Serialize;

/// Niveau géographique importé
///
/// L'ordre de `Level::ALL` est l'ordre d'import : un niveau ne peut être
/// rattaché qu'à des niveaux déjà importés.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Level {
    /// Entidad federativa
    Entity,
    /// Municipio
    Municipality,
    /// Localidad
    Locality,
}

const ENTITY_ATTRIBUTES: &[(&str, &str)] = &[
    ("CVEGEO", "Clave de geometria"),
    ("CVE_ENT", "Clave de entidad"),
];

const MUNICIPALITY_ATTRIBUTES: &[(&str, &str)] = &[
    ("CVEGEO", "Clave de geometria"),
    ("CVE_ENT", "Clave de entidad"),
    ("CVE_MUN", "Clave de municipio"),
];

const LOCALITY_ATTRIBUTES: &[(&str, &str)] = &[
    ("CVEGEO", "Clave de geometria"),
    ("CVE_ENT", "Clave de entidad"),
    ("CVE_MUN", "Clave de municipio"),
    ("CVE_LOC", "Clave de localidad"),
];

/// Attribut portant le nom de la feature
pub const NAME_ATTRIBUTE: &str = "NOMGEO";

impl Level {
    pub const ALL: [Level; 3] = [Level::Entity, Level::Municipality, Level::Locality];

    /// Nom du niveau dans le jeu de données INEGI
    pub fn name(self) -> &'static str {
        match self {
            Level::Entity => "Entidad",
            Level::Municipality => "Municipio",
            Level::Locality => "Localidad",
        }
    }

    /// Shapefile de la couche après extraction
    pub fn file_name(self) -> &'static str {
        match self {
            Level::Entity => "01_32_ent.shp",
            Level::Municipality => "01_32_mun.shp",
            Level::Locality => "01_32_l.shp",
        }
    }

    /// Attributs (code, libellé) conservés en métadonnées
    pub fn attributes(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Level::Entity => ENTITY_ATTRIBUTES,
            Level::Municipality => MUNICIPALITY_ATTRIBUTES,
            Level::Locality => LOCALITY_ATTRIBUTES,
        }
    }

    /// Champs formant la clé d'une feature de ce niveau
    ///
    /// Une clé de municipio n'est unique qu'à l'intérieur de son entité,
    /// d'où la clé composée `CVE_ENT` + `CVE_MUN`.
    pub fn key_fields(self) -> &'static [&'static str] {
        match self {
            Level::Entity => &["CVE_ENT"],
            Level::Municipality => &["CVE_ENT", "CVE_MUN"],
            Level::Locality => &["CVE_ENT", "CVE_MUN", "CVE_LOC"],
        }
    }

    /// Niveaux parents auxquels une feature est rattachée
    pub fn parents(self) -> &'static [Level] {
        match self {
            Level::Entity => &[],
            Level::Municipality => &[Level::Entity],
            Level::Locality => &[Level::Entity, Level::Municipality],
        }
    }

    /// Les niveaux suivants ont-ils besoin de l'index de ce niveau ?
    pub fn is_parent_level(self) -> bool {
        Level::ALL.iter().any(|l| l.parents().contains(&self))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
