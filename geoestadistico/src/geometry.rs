//! Conversion des shapes vers `geo` et normalisation en MultiPolygon

use geo::{Geometry, MultiPolygon};
use shapefile::Shape;

use crate::MarcoError;

/// Convertit une shape polygonale en géométrie `geo`
///
/// Comme OGR, un polygone à un seul anneau extérieur donne un `Polygon`,
/// plusieurs anneaux extérieurs donnent un `MultiPolygon`.
pub fn shape_to_geometry(shape: Shape, feature_index: usize) -> Result<Geometry, MarcoError> {
    let multi: MultiPolygon = match shape {
        Shape::Polygon(p) => p.into(),
        Shape::PolygonM(p) => p.into(),
        Shape::PolygonZ(p) => p.into(),
        other => {
            return Err(MarcoError::unsupported_geometry(
                feature_index,
                format!("{:?}", other.shapetype()),
            ))
        }
    };

    Ok(collapse_single(multi))
}

fn collapse_single(mut multi: MultiPolygon) -> Geometry {
    if multi.0.len() == 1 {
        if let Some(polygon) = multi.0.pop() {
            return Geometry::Polygon(polygon);
        }
    }
    Geometry::MultiPolygon(multi)
}

/// Normalise une géométrie en MultiPolygon
///
/// Un `Polygon` est enveloppé dans un `MultiPolygon` à un élément ;
/// un `MultiPolygon` est retourné tel quel. Tout autre type est refusé.
pub fn to_multipolygon(geometry: Geometry, feature_index: usize) -> Result<MultiPolygon, MarcoError> {
    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon::new(vec![polygon])),
        Geometry::MultiPolygon(multi) => Ok(multi),
        other => Err(MarcoError::unsupported_geometry(
            feature_index,
            geometry_type_name(&other),
        )),
    }
}

fn geometry_type_name(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
