//! Spherical geodesy helpers
//!
//! Distances between survey clusters and pixels, metric buffers around
//! clusters and polygon areas, all on a spherical Earth with coordinates
//! given as (longitude, latitude) degrees.

mod area;
mod buffer;
mod distance;
mod projection;

pub use area::{geodesic_area, geodesic_polygon_area};
pub use buffer::{geodesic_buffer, geodesic_buffer_with_segments, BUFFER_SEGMENTS};
pub use distance::{great_circle_distance, EARTH_RADIUS_KM};
pub use projection::{AzimuthalEquidistant, PROJECTION_RADIUS_M};
