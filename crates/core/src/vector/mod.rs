//! Vector data: country boundaries and aggregation zones

use geo::{BoundingRect, InteriorPoint, MultiPolygon, Point, Polygon, Rect};

/// Country outline used to clip the Voronoi tessellation.
#[derive(Debug, Clone)]
pub struct Boundary {
    geometry: MultiPolygon<f64>,
    bounds: Rect<f64>,
}

impl Boundary {
    /// Build from a multipolygon; `None` when it has no extent.
    pub fn new(geometry: MultiPolygon<f64>) -> Option<Self> {
        let bounds = geometry.bounding_rect()?;
        Some(Self { geometry, bounds })
    }

    pub fn from_polygon(polygon: Polygon<f64>) -> Option<Self> {
        Self::new(MultiPolygon::new(vec![polygon]))
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Bounding rectangle of the whole boundary
    pub fn bounds(&self) -> Rect<f64> {
        self.bounds
    }
}

/// A settlement or administrative polygon over which estimates are aggregated.
#[derive(Debug, Clone)]
pub struct Zone {
    /// Stable identifier taken from the source file
    pub id: String,
    pub geometry: MultiPolygon<f64>,
    /// A point guaranteed to lie inside the zone
    pub representative_point: Point<f64>,
}

impl Zone {
    /// Create a zone; `None` for an empty geometry.
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Option<Self> {
        let representative_point = geometry.interior_point()?;
        Some(Self {
            id: id.into(),
            geometry,
            representative_point,
        })
    }

    pub fn from_polygon(id: impl Into<String>, polygon: Polygon<f64>) -> Option<Self> {
        Self::new(id, MultiPolygon::new(vec![polygon]))
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }
}
