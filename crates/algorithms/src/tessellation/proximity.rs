//! Boundary distances used to absorb floating-point gaps between cells
//!
//! Neighbouring cells are clipped independently, so a shared edge can be
//! represented by two segments a few ulps apart. Two geometries closer than
//! [`SNAP_TOLERANCE`] are treated as touching.

use geo::{BoundingRect, Coord, Intersects, Line, MultiPolygon, Rect};

/// Distance (degrees) below which two boundaries are considered touching.
pub const SNAP_TOLERANCE: f64 = 1e-9;

fn point_segment_distance(p: Coord<f64>, line: &Line<f64>) -> f64 {
    let d = line.delta();
    let len_sq = d.x * d.x + d.y * d.y;
    if len_sq == 0.0 {
        let v = p - line.start;
        return v.x.hypot(v.y);
    }
    let t = (((p.x - line.start.x) * d.x + (p.y - line.start.y) * d.y) / len_sq).clamp(0.0, 1.0);
    let proj = Coord {
        x: line.start.x + t * d.x,
        y: line.start.y + t * d.y,
    };
    (p.x - proj.x).hypot(p.y - proj.y)
}

fn segment_distance(a: &Line<f64>, b: &Line<f64>) -> f64 {
    if a.intersects(b) {
        return 0.0;
    }
    point_segment_distance(a.start, b)
        .min(point_segment_distance(a.end, b))
        .min(point_segment_distance(b.start, a))
        .min(point_segment_distance(b.end, a))
}

fn boundary_lines(geometry: &MultiPolygon<f64>) -> impl Iterator<Item = Line<f64>> + '_ {
    geometry
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.lines())
}

fn expand(rect: Rect<f64>, by: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: rect.min().x - by,
            y: rect.min().y - by,
        },
        Coord {
            x: rect.max().x + by,
            y: rect.max().y + by,
        },
    )
}

/// Distance from `p` to the boundary of `geometry` (infinite when empty).
pub fn point_gap(p: Coord<f64>, geometry: &MultiPolygon<f64>) -> f64 {
    boundary_lines(geometry)
        .map(|line| point_segment_distance(p, &line))
        .fold(f64::INFINITY, f64::min)
}

/// Smallest distance between the boundaries of two geometries.
///
/// Only segments near the other geometry's bounding box are compared, so
/// the result is exact up to `search` and infinite beyond it.
pub fn geometry_gap(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, search: f64) -> f64 {
    let (Some(box_a), Some(box_b)) = (a.bounding_rect(), b.bounding_rect()) else {
        return f64::INFINITY;
    };
    let near_b = expand(box_b, search);
    let near_a = expand(box_a, search);

    let lines_a: Vec<Line<f64>> = boundary_lines(a)
        .filter(|l| l.bounding_rect().intersects(&near_b))
        .collect();
    if lines_a.is_empty() {
        return f64::INFINITY;
    }
    let lines_b: Vec<Line<f64>> = boundary_lines(b)
        .filter(|l| l.bounding_rect().intersects(&near_a))
        .collect();

    let mut best = f64::INFINITY;
    for la in &lines_a {
        for lb in &lines_b {
            best = best.min(segment_distance(la, lb));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, polygon};

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]])
    }

    #[test]
    fn test_point_gap() {
        let sq = square(0.0, 0.0, 1.0);
        assert_eq!(point_gap(coord! { x: 0.5, y: 0.0 }, &sq), 0.0);
        assert!((point_gap(coord! { x: 0.5, y: 0.25 }, &sq) - 0.25).abs() < 1e-12);
        assert!((point_gap(coord! { x: 2.0, y: 0.5 }, &sq) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_geometry_gap_nearly_touching() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0 + 1e-13, 0.0, 1.0);
        assert!(geometry_gap(&a, &b, SNAP_TOLERANCE) <= SNAP_TOLERANCE);
    }

    #[test]
    fn test_geometry_gap_far_apart() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(3.0, 0.0, 1.0);
        assert_eq!(geometry_gap(&a, &b, SNAP_TOLERANCE), f64::INFINITY);
        assert!((geometry_gap(&a, &b, 5.0) - 2.0).abs() < 1e-12);
    }
}
