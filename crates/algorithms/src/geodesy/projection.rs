//! Spherical azimuthal equidistant projection
//!
//! Distances and azimuths from the projection centre are preserved, which
//! makes it the local metric frame for buffers and areas.

use geo::Coord;

/// Sphere radius of the local metric projection, in metres.
pub const PROJECTION_RADIUS_M: f64 = 6_371_000.0;

/// Azimuthal equidistant projection centred on a (lon, lat) point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzimuthalEquidistant {
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
    radius: f64,
}

impl AzimuthalEquidistant {
    /// Projection centred on `center` (degrees) on the default sphere.
    pub fn new(center: Coord<f64>) -> Self {
        Self::with_radius(center, PROJECTION_RADIUS_M)
    }

    pub fn with_radius(center: Coord<f64>, radius: f64) -> Self {
        let lat0 = center.y.to_radians();
        Self {
            lon0: center.x.to_radians(),
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
            radius,
        }
    }

    /// Geographic degrees to projected metres.
    pub fn forward(&self, c: Coord<f64>) -> Coord<f64> {
        let lat = c.y.to_radians();
        let dlon = c.x.to_radians() - self.lon0;
        let (sin_lat, cos_lat) = lat.sin_cos();

        let cos_c = (self.sin_lat0 * sin_lat + self.cos_lat0 * cos_lat * dlon.cos()).clamp(-1.0, 1.0);
        let angle = cos_c.acos();
        let k = if angle.abs() < 1e-15 { 1.0 } else { angle / angle.sin() };

        Coord {
            x: self.radius * k * cos_lat * dlon.sin(),
            y: self.radius * k * (self.cos_lat0 * sin_lat - self.sin_lat0 * cos_lat * dlon.cos()),
        }
    }

    /// Projected metres back to geographic degrees.
    pub fn inverse(&self, p: Coord<f64>) -> Coord<f64> {
        let rho = p.x.hypot(p.y);
        if rho < 1e-9 {
            return Coord {
                x: self.lon0.to_degrees(),
                y: self.sin_lat0.atan2(self.cos_lat0).to_degrees(),
            };
        }
        let angle = rho / self.radius;
        let (sin_c, cos_c) = angle.sin_cos();

        let lat = (cos_c * self.sin_lat0 + p.y * sin_c * self.cos_lat0 / rho)
            .clamp(-1.0, 1.0)
            .asin();
        let lon = self.lon0
            + (p.x * sin_c).atan2(rho * self.cos_lat0 * cos_c - p.y * self.sin_lat0 * sin_c);

        Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
        }
    }
}
