//! Planar Voronoi cells by half-plane clipping
//!
//! Each cell starts as the envelope rectangle and is cut by the
//! perpendicular bisector towards every other site, nearest first. Once
//! the next site is farther than twice the distance from the generator to
//! the cell's farthest vertex, no bisector can cut the cell any more and it
//! is exact.

use crate::maybe_rayon::*;
use geo::{Coord, LineString, Polygon, Rect};
use rstar::primitives::GeomWithData;
use rstar::RTree;

type SitePoint = GeomWithData<[f64; 2], usize>;

/// Site bounding box grown by max(width, height) on every side.
pub fn voronoi_envelope(sites: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = sites.first()?;
    let (mut min, mut max) = (*first, *first);
    for s in &sites[1..] {
        min.x = min.x.min(s.x);
        min.y = min.y.min(s.y);
        max.x = max.x.max(s.x);
        max.y = max.y.max(s.y);
    }
    let mut margin = (max.x - min.x).max(max.y - min.y);
    if margin <= 0.0 {
        margin = 1.0;
    }
    Some(Rect::new(
        Coord {
            x: min.x - margin,
            y: min.y - margin,
        },
        Coord {
            x: max.x + margin,
            y: max.y + margin,
        },
    ))
}

/// Voronoi cell of every site, clipped to `envelope`.
///
/// One slot per site. Coincident sites share a single cell owned by the
/// first of them; the others get `None`, as do cells that collapse.
pub fn voronoi_cells(sites: &[Coord<f64>], envelope: Rect<f64>) -> Vec<Option<Polygon<f64>>> {
    let tree = RTree::bulk_load(
        sites
            .iter()
            .enumerate()
            .map(|(i, s)| SitePoint::new([s.x, s.y], i))
            .collect(),
    );

    (0..sites.len())
        .into_par_iter()
        .map(|i| site_cell(&tree, sites, i, envelope))
        .collect()
}

fn site_cell(tree: &RTree<SitePoint>, sites: &[Coord<f64>], i: usize, envelope: Rect<f64>) -> Option<Polygon<f64>> {
    let site = sites[i];
    let (lo, hi) = (envelope.min(), envelope.max());
    let mut cell = vec![
        lo,
        Coord { x: hi.x, y: lo.y },
        hi,
        Coord { x: lo.x, y: hi.y },
    ];
    let mut radius_sq = max_radius_sq(&cell, site);

    for neighbor in tree.nearest_neighbor_iter(&[site.x, site.y]) {
        let j = neighbor.data;
        if j == i {
            continue;
        }
        let other = sites[j];
        let dx = other.x - site.x;
        let dy = other.y - site.y;
        let dist_sq = dx * dx + dy * dy;

        if dist_sq == 0.0 {
            if j < i {
                return None;
            }
            continue;
        }
        if dist_sq > 4.0 * radius_sq {
            break;
        }

        cell = clip_half_plane(&cell, site, other);
        if cell.len() < 3 {
            return None;
        }
        radius_sq = max_radius_sq(&cell, site);
    }

    let mut ring = cell;
    ring.push(ring[0]);
    Some(Polygon::new(LineString::from(ring), vec![]))
}

fn max_radius_sq(cell: &[Coord<f64>], site: Coord<f64>) -> f64 {
    cell.iter()
        .map(|v| {
            let dx = v.x - site.x;
            let dy = v.y - site.y;
            dx * dx + dy * dy
        })
        .fold(0.0, f64::max)
}

/// Keep the part of a convex polygon on `site`'s side of the bisector
/// between `site` and `other`.
fn clip_half_plane(cell: &[Coord<f64>], site: Coord<f64>, other: Coord<f64>) -> Vec<Coord<f64>> {
    let normal = Coord {
        x: other.x - site.x,
        y: other.y - site.y,
    };
    let mid = Coord {
        x: (site.x + other.x) / 2.0,
        y: (site.y + other.y) / 2.0,
    };
    let side = |p: Coord<f64>| (p.x - mid.x) * normal.x + (p.y - mid.y) * normal.y;

    let mut out = Vec::with_capacity(cell.len() + 1);
    for (k, &cur) in cell.iter().enumerate() {
        let next = cell[(k + 1) % cell.len()];
        let (dc, dn) = (side(cur), side(next));
        if dc <= 0.0 {
            out.push(cur);
        }
        if (dc < 0.0 && dn > 0.0) || (dc > 0.0 && dn < 0.0) {
            let t = dc / (dc - dn);
            out.push(Coord {
                x: cur.x + t * (next.x - cur.x),
                y: cur.y + t * (next.y - cur.y),
            });
        }
    }
    out
}
