//! Voronoi regions of survey locations

use super::voronoi::{voronoi_cells, voronoi_envelope};
use crate::maybe_rayon::*;
use covmap_core::{Boundary, Error, Result};
use geo::{BooleanOps, BoundingRect, Coord, Intersects, MultiPolygon, Polygon, Rect};

/// The Voronoi region of one survey location.
#[derive(Debug, Clone)]
pub struct VoronoiRegion {
    /// Cell geometry, clipped to the country unless built raw
    pub polygon: MultiPolygon<f64>,
    /// Location that generated the cell
    pub generator: Coord<f64>,
    /// Index of the generator in the caller's location list
    pub source_index: usize,
}

impl VoronoiRegion {
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.polygon.bounding_rect()
    }

    pub fn is_empty(&self) -> bool {
        self.polygon.0.is_empty()
    }
}

/// Four fence points one degree beyond each corner of `bounds`.
///
/// Order: (max, max), (min, max), (max, min), (min, min).
pub fn fence_points(bounds: Rect<f64>) -> [Coord<f64>; 4] {
    let (min, max) = (bounds.min(), bounds.max());
    [
        Coord { x: max.x + 1.0, y: max.y + 1.0 },
        Coord { x: min.x - 1.0, y: max.y + 1.0 },
        Coord { x: max.x + 1.0, y: min.y - 1.0 },
        Coord { x: min.x - 1.0, y: min.y - 1.0 },
    ]
}

/// Unclipped cells of `locations` computed together with `fences`.
fn location_cells(locations: &[Coord<f64>], fences: &[Coord<f64>; 4]) -> Vec<Option<Polygon<f64>>> {
    let mut sites = Vec::with_capacity(locations.len() + fences.len());
    sites.extend_from_slice(locations);
    sites.extend_from_slice(fences);

    let Some(envelope) = voronoi_envelope(&sites) else {
        return Vec::new();
    };
    let mut cells = voronoi_cells(&sites, envelope);
    cells.truncate(locations.len());
    cells
}

fn log_unassigned(regions: &[Option<VoronoiRegion>]) {
    let unassigned = regions.iter().filter(|r| r.is_none()).count();
    if unassigned > 0 {
        tracing::warn!("{} of {} locations have no Voronoi region", unassigned, regions.len());
    }
}

/// Voronoi regions of `locations`, clipped to the country outline.
///
/// One slot per location. A location that shares its coordinates with an
/// earlier one gets `None`; use [`require_complete`] to turn that into an
/// error. A single location owns the whole country. Otherwise the fence
/// cells keep the country corners nearest them, so the regions may not
/// cover the whole outline.
pub fn build_voronoi_regions(locations: &[Coord<f64>], country: &Boundary) -> Vec<Option<VoronoiRegion>> {
    if locations.len() == 1 {
        return vec![Some(VoronoiRegion {
            polygon: country.geometry().clone(),
            generator: locations[0],
            source_index: 0,
        })];
    }

    let fences = fence_points(country.bounds());
    let cells = location_cells(locations, &fences);
    let country_bounds = country.bounds();

    let regions: Vec<Option<VoronoiRegion>> = (0..cells.len())
        .into_par_iter()
        .map(|i| {
            let cell = cells[i].as_ref()?;
            let overlaps = cell
                .bounding_rect()
                .map_or(false, |b| b.intersects(&country_bounds));
            let polygon = if overlaps {
                country.geometry().intersection(cell)
            } else {
                MultiPolygon::new(vec![])
            };
            if polygon.0.is_empty() {
                tracing::debug!("Voronoi cell of location {} lies outside the country", i);
            }
            Some(VoronoiRegion {
                polygon,
                generator: locations[i],
                source_index: i,
            })
        })
        .collect();

    log_unassigned(&regions);
    regions
}

/// Unclipped Voronoi regions of `locations` bounded by `fences`.
pub fn build_raw_regions(locations: &[Coord<f64>], fences: &[Coord<f64>; 4]) -> Vec<Option<VoronoiRegion>> {
    let regions: Vec<Option<VoronoiRegion>> = location_cells(locations, fences)
        .into_iter()
        .enumerate()
        .map(|(i, cell)| {
            cell.map(|cell| VoronoiRegion {
                polygon: MultiPolygon::new(vec![cell]),
                generator: locations[i],
                source_index: i,
            })
        })
        .collect();

    log_unassigned(&regions);
    regions
}

/// Fail on the first location without a region.
pub fn require_complete(regions: Vec<Option<VoronoiRegion>>) -> Result<Vec<VoronoiRegion>> {
    regions
        .into_iter()
        .enumerate()
        .map(|(index, region)| region.ok_or(Error::UnassignedLocation { index }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon, Area, Contains, Intersects, Point};

    fn country() -> Boundary {
        Boundary::from_polygon(polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ])
        .unwrap()
    }

    fn locations() -> Vec<Coord<f64>> {
        vec![
            coord! { x: 2.0, y: 2.0 },
            coord! { x: 7.5, y: 3.0 },
            coord! { x: 5.0, y: 8.0 },
            coord! { x: 1.5, y: 6.5 },
            coord! { x: 8.0, y: 8.5 },
        ]
    }

    fn ring_is_simple(polygon: &Polygon<f64>) -> bool {
        let lines: Vec<_> = polygon.exterior().lines().collect();
        let n = lines.len();
        for a in 0..n {
            for b in (a + 2)..n {
                if a == 0 && b == n - 1 {
                    continue;
                }
                if lines[a].intersects(&lines[b]) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_fence_points_order() {
        let bounds = Rect::new(coord! { x: -2.0, y: 4.0 }, coord! { x: 3.0, y: 9.0 });
        let f = fence_points(bounds);
        assert_eq!(f[0], coord! { x: 4.0, y: 10.0 });
        assert_eq!(f[1], coord! { x: -3.0, y: 10.0 });
        assert_eq!(f[2], coord! { x: 4.0, y: 3.0 });
        assert_eq!(f[3], coord! { x: -3.0, y: 3.0 });
    }

    #[test]
    fn test_regions_match_nearest_location_areas() {
        let locs = locations();
        let regions = require_complete(build_voronoi_regions(&locs, &country())).unwrap();
        assert_eq!(regions.len(), locs.len());

        // Nearest-site areas on a fine grid; fence sites claim the corners
        let mut sites = locs.clone();
        sites.extend_from_slice(&fence_points(country().bounds()));
        let n = 400;
        let step = 10.0 / n as f64;
        let mut owned = vec![0usize; sites.len()];
        for r in 0..n {
            for c in 0..n {
                let p = coord! { x: (c as f64 + 0.5) * step, y: (r as f64 + 0.5) * step };
                let nearest = (0..sites.len())
                    .min_by(|&a, &b| {
                        let da = (sites[a].x - p.x).powi(2) + (sites[a].y - p.y).powi(2);
                        let db = (sites[b].x - p.x).powi(2) + (sites[b].y - p.y).powi(2);
                        da.total_cmp(&db)
                    })
                    .unwrap();
                owned[nearest] += 1;
            }
        }
        let cell_area = step * step;
        for (i, region) in regions.iter().enumerate() {
            let expected = owned[i] as f64 * cell_area;
            let area = region.polygon.unsigned_area();
            assert!((area - expected).abs() < 0.05, "region {}: {} vs {}", i, area, expected);
        }

        let total: f64 = regions.iter().map(|r| r.polygon.unsigned_area()).sum();
        let fenced = owned[locs.len()..].iter().sum::<usize>() as f64 * cell_area;
        assert!(fenced > 1.0);
        assert!((total + fenced - 100.0).abs() < 0.05, "areas sum to {}", total);

        for (i, loc) in locs.iter().enumerate() {
            let holders: Vec<usize> = regions
                .iter()
                .enumerate()
                .filter(|(_, r)| r.polygon.contains(&Point::from(*loc)))
                .map(|(k, _)| k)
                .collect();
            assert_eq!(holders, vec![i]);
            assert_eq!(regions[i].source_index, i);
            assert_eq!(regions[i].generator, *loc);
        }
        for r in &regions {
            for p in &r.polygon {
                assert!(ring_is_simple(p));
            }
        }
    }

    #[test]
    fn test_single_location_owns_country() {
        let regions = build_voronoi_regions(&[coord! { x: 4.0, y: 4.0 }], &country());
        let region = regions[0].as_ref().unwrap();
        assert!((region.polygon.unsigned_area() - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_location_is_unassigned() {
        let mut locs = locations();
        locs.push(locs[1]);
        let regions = build_voronoi_regions(&locs, &country());
        assert!(regions[1].is_some());
        assert!(regions[5].is_none());
        match require_complete(regions) {
            Err(Error::UnassignedLocation { index }) => assert_eq!(index, 5),
            other => panic!("expected unassigned location, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_raw_regions_are_not_clipped() {
        let locs = locations();
        let fences = fence_points(country().bounds());
        let regions = require_complete(build_raw_regions(&locs, &fences)).unwrap();
        let total: f64 = regions.iter().map(|r| r.polygon.unsigned_area()).sum();
        assert!(total > 100.0);
    }
}
