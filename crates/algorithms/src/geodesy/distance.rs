//! Great-circle distance (haversine)

use geo::Coord;

/// Sphere radius used for cluster-to-pixel distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// Haversine distance in kilometres between two (lon, lat) points in degrees.
#[inline]
pub fn great_circle_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat1 = a.y.to_radians();
    let lat2 = b.y.to_radians();
    // Differences taken in degrees so mirrored pairs give identical results
    let dlon = (b.x - a.x).to_radians();
    let dlat = (b.y - a.y).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    EARTH_RADIUS_KM * c
}
