//! Metric buffers around survey clusters

use super::projection::AzimuthalEquidistant;
use geo::{Coord, LineString, Polygon};
use std::f64::consts::PI;

/// Vertices used to approximate a buffer circle.
pub const BUFFER_SEGMENTS: usize = 64;

/// Circle of `radius_m` metres around `center`, in geographic degrees.
pub fn geodesic_buffer(center: Coord<f64>, radius_m: f64) -> Polygon<f64> {
    geodesic_buffer_with_segments(center, radius_m, BUFFER_SEGMENTS)
}

/// Same as [`geodesic_buffer`] with an explicit vertex count (minimum 4).
pub fn geodesic_buffer_with_segments(center: Coord<f64>, radius_m: f64, segments: usize) -> Polygon<f64> {
    let n = segments.max(4);
    let r = radius_m.abs();
    let proj = AzimuthalEquidistant::new(center);

    let mut coords: Vec<Coord<f64>> = (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            proj.inverse(Coord {
                x: r * angle.cos(),
                y: r * angle.sin(),
            })
        })
        .collect();
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::great_circle_distance;
    use approx::assert_relative_eq;
    use geo::{coord, Contains, Point};

    #[test]
    fn test_buffer_contains_center() {
        let center = coord! { x: 29.87, y: -1.94 };
        let buf = geodesic_buffer(center, 2000.0);
        assert!(buf.contains(&Point::from(center)));
        assert_eq!(buf.exterior().0.len(), BUFFER_SEGMENTS + 1);
    }

    #[test]
    fn test_buffer_vertices_at_radius() {
        let center = coord! { x: 2.35, y: 48.85 };
        let buf = geodesic_buffer(center, 5000.0);
        for v in buf.exterior().coords() {
            // km on a 6373 km sphere vs metres on a 6371 km sphere
            let d = great_circle_distance(center, *v);
            assert_relative_eq!(d, 5.0 * 6373.0 / 6371.0, max_relative = 1e-6);
        }
    }
}
