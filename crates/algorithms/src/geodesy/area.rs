//! Polygon areas in square metres

use super::projection::AzimuthalEquidistant;
use geo::{Area, Centroid, MapCoords, MultiPolygon, Polygon};

/// Area of a lon/lat polygon, projected around its centroid.
pub fn geodesic_polygon_area(polygon: &Polygon<f64>) -> f64 {
    match polygon.centroid() {
        Some(c) => {
            let proj = AzimuthalEquidistant::new(c.0);
            polygon.map_coords(|coord| proj.forward(coord)).unsigned_area()
        }
        None => 0.0,
    }
}

/// Area of a lon/lat multipolygon, projected around its centroid.
pub fn geodesic_area(geometry: &MultiPolygon<f64>) -> f64 {
    match geometry.centroid() {
        Some(c) => {
            let proj = AzimuthalEquidistant::new(c.0);
            geometry.map_coords(|coord| proj.forward(coord)).unsigned_area()
        }
        None => 0.0,
    }
}
