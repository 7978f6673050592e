//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.

#[cfg(feature = "reproject")]
use anyhow::{Context, Result};
#[cfg(feature = "reproject")]
use geo::{Coord, LineString, MultiPolygon, Polygon};
#[cfg(feature = "reproject")]
use proj::Proj;

/// Reprojection de géométries entre deux systèmes de coordonnées
///
/// Les SRS sont donnés sous toute forme acceptée par PROJ (`EPSG:xxxx`,
/// WKT d'un `.prj`, chaîne PROJ).
#[cfg(feature = "reproject")]
pub struct Reprojector {
    proj: Option<Proj>,
}

#[cfg(feature = "reproject")]
impl Reprojector {
    /// Crée un nouveau reprojector (identité si les deux définitions sont égales)
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let proj = if source.trim() == target.trim() {
            None
        } else {
            Some(Proj::new_known_crs(source, target, None).context(format!(
                "Failed to create projection from {} to {}",
                abbreviate(source),
                abbreviate(target)
            ))?)
        };

        Ok(Self { proj })
    }

    /// La transformation est-elle l'identité ?
    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    /// Transforme un MultiPolygon en place
    pub fn transform_in_place(&self, geom: &mut MultiPolygon) -> Result<()> {
        let Some(proj) = &self.proj else {
            return Ok(());
        };

        let polys: Result<Vec<Polygon>> = geom
            .0
            .iter()
            .map(|p| transform_polygon(proj, p))
            .collect();
        *geom = MultiPolygon::new(polys?);
        Ok(())
    }
}

/// Transforme une LineString (batch conversion)
#[cfg(feature = "reproject")]
fn transform_linestring(proj: &Proj, ls: &LineString) -> Result<LineString> {
    let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

    proj.convert_array(&mut coords)
        .context("Batch coordinate transformation failed")?;

    let result: Vec<Coord> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
    Ok(LineString::new(result))
}

#[cfg(feature = "reproject")]
fn transform_polygon(proj: &Proj, p: &Polygon) -> Result<Polygon> {
    let exterior = transform_linestring(proj, p.exterior())?;
    let interiors: Result<Vec<LineString>> = p
        .interiors()
        .iter()
        .map(|ls| transform_linestring(proj, ls))
        .collect();
    Ok(Polygon::new(exterior, interiors?))
}

/// Les WKT de `.prj` sont longs : seul le début apparaît dans les erreurs
#[cfg(feature = "reproject")]
fn abbreviate(definition: &str) -> String {
    const MAX: usize = 60;
    match definition.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &definition[..idx]),
        None => definition.to_string(),
    }
}


// Fonction publique sans feature pour permettre l'utilisation conditionnelle
/// Vérifie si la reprojection est disponible
pub fn is_available() -> bool {
    cfg!(feature = "reproject")
}

// Implémentation factice quand le feature reproject est désactivé
#[cfg(not(feature = "reproject"))]
use anyhow::{bail, Result};
#[cfg(not(feature = "reproject"))]
use geo::MultiPolygon;

/// Reprojector factice - seule l'identité est disponible
#[cfg(not(feature = "reproject"))]
pub struct Reprojector;

#[cfg(not(feature = "reproject"))]
impl Reprojector {
    /// Tente de créer un reprojector - échoue sauf si source et cible sont identiques
    pub fn new(source: &str, target: &str) -> Result<Self> {
        if source.trim() == target.trim() {
            Ok(Self)
        } else {
            bail!(
                "Reprojection to {} requires the 'reproject' feature. \
                 Build with: cargo build --features reproject",
                target
            )
        }
    }

    pub fn is_identity(&self) -> bool {
        true
    }

    /// Laisse la géométrie inchangée
    pub fn transform_in_place(&self, _geom: &mut MultiPolygon) -> Result<()> {
        Ok(())
    }
}
