//! R-tree lookup of the region covering a point

use crate::tessellation::{point_gap, VoronoiRegion};
use geo::{BoundingRect, Coord, Intersects, Point};
use rstar::{RTree, RTreeObject, AABB};

/// Distance (degrees) within which a region counts as covering a point.
///
/// Independently clipped cells leave seams of a few nanodegrees, so this is
/// wider than the adjacency snap.
pub const COVER_TOLERANCE: f64 = 1e-7;

/// Relative slack under which two generator distances are equal.
const TIE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone)]
struct RegionEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatial index over region bounding boxes.
///
/// Among the regions covering a point, the one with the nearest generator
/// wins; equidistant generators resolve to the lowest index.
pub struct RegionIndex<'a> {
    regions: &'a [VoronoiRegion],
    tree: RTree<RegionEnvelope>,
}

impl<'a> RegionIndex<'a> {
    pub fn new(regions: &'a [VoronoiRegion]) -> Self {
        let entries = regions
            .iter()
            .enumerate()
            .filter_map(|(index, region)| {
                let b = region.polygon.bounding_rect()?;
                Some(RegionEnvelope {
                    index,
                    envelope: AABB::from_corners(
                        [b.min().x - COVER_TOLERANCE, b.min().y - COVER_TOLERANCE],
                        [b.max().x + COVER_TOLERANCE, b.max().y + COVER_TOLERANCE],
                    ),
                })
            })
            .collect();
        Self {
            regions,
            tree: RTree::bulk_load(entries),
        }
    }

    pub fn regions(&self) -> &'a [VoronoiRegion] {
        self.regions
    }

    /// Index of the region covering `p`, if any.
    pub fn locate(&self, p: Coord<f64>) -> Option<usize> {
        let point = Point::from(p);
        let mut best: Option<(usize, f64)> = None;
        for entry in self.tree.locate_in_envelope_intersecting(&AABB::from_point([p.x, p.y])) {
            let region = &self.regions[entry.index];
            let covers = region.polygon.intersects(&point) || point_gap(p, &region.polygon) <= COVER_TOLERANCE;
            if !covers {
                continue;
            }
            let g = region.generator;
            let d2 = (g.x - p.x).powi(2) + (g.y - p.y).powi(2);
            best = match best {
                Some((k, bd)) if nearer_or_lower(bd, k, d2, entry.index) => Some((k, bd)),
                _ => Some((entry.index, d2)),
            };
        }
        best.map(|(k, _)| k)
    }
}

/// Whether the incumbent (`d_a`, `a`) beats the challenger (`d_b`, `b`).
fn nearer_or_lower(d_a: f64, a: usize, d_b: f64, b: usize) -> bool {
    let slack = TIE_EPSILON * d_a.max(d_b);
    if (d_a - d_b).abs() <= slack {
        a < b
    } else {
        d_a < d_b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon, MultiPolygon};

    fn square(index: usize, x0: f64) -> VoronoiRegion {
        VoronoiRegion {
            polygon: MultiPolygon::new(vec![polygon![
                (x: x0, y: 0.0), (x: x0 + 1.0, y: 0.0), (x: x0 + 1.0, y: 1.0), (x: x0, y: 1.0),
            ]]),
            generator: coord! { x: x0 + 0.5, y: 0.5 },
            source_index: index,
        }
    }

    #[test]
    fn test_locate_interior() {
        let regions = vec![square(0, 0.0), square(1, 1.0), square(2, 2.0)];
        let index = RegionIndex::new(&regions);
        assert_eq!(index.locate(coord! { x: 1.5, y: 0.5 }), Some(1));
        assert_eq!(index.locate(coord! { x: 2.9, y: 0.1 }), Some(2));
        assert_eq!(index.locate(coord! { x: 3.5, y: 0.5 }), None);
    }

    #[test]
    fn test_shared_edge_goes_to_lowest_index() {
        // Listed out of order on purpose
        let regions = vec![square(0, 1.0), square(1, 0.0)];
        let index = RegionIndex::new(&regions);
        assert_eq!(index.locate(coord! { x: 1.0, y: 0.5 }), Some(0));
    }

    #[test]
    fn test_tiny_gap_is_bridged() {
        let regions = vec![square(0, 0.0), square(1, 1.0 + 1e-12)];
        let index = RegionIndex::new(&regions);
        assert_eq!(index.locate(coord! { x: 1.0 + 5e-13, y: 0.5 }), Some(0));
    }

    #[test]
    fn test_locate_agrees_with_nearest_location() {
        use crate::tessellation::{build_voronoi_regions, fence_points, require_complete};
        use covmap_core::Boundary;

        let country = Boundary::from_polygon(polygon![
            (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0),
        ])
        .unwrap();
        let locs = vec![
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 7.5, y: 3.0 },
            coord! { x: 5.0, y: 8.0 },
            coord! { x: 1.5, y: 6.5 },
            coord! { x: 8.0, y: 8.5 },
        ];
        let regions = require_complete(build_voronoi_regions(&locs, &country)).unwrap();
        let index = RegionIndex::new(&regions);

        // Exactly equidistant from locations 0 and 3
        assert_eq!(index.locate(coord! { x: 1.75, y: 4.25 }), Some(0));

        let mut sites = locs.clone();
        sites.extend_from_slice(&fence_points(country.bounds()));
        for r in 0..100 {
            for c in 0..100 {
                let p = coord! { x: c as f64 * 0.1 + 0.05, y: r as f64 * 0.1 + 0.05 };
                let d2: Vec<f64> = sites.iter().map(|s| (s.x - p.x).powi(2) + (s.y - p.y).powi(2)).collect();
                let min = d2.iter().cloned().fold(f64::INFINITY, f64::min);
                let nearest = d2.iter().position(|&d| d - min <= 1e-12 * min).unwrap();
                let expected = (nearest < locs.len()).then_some(nearest);
                assert_eq!(index.locate(p), expected, "at {:?}", p);
            }
        }
    }
}
