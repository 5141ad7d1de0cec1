//! Local inverse-distance interpolation over the Voronoi network
//!
//! - `RegionIndex`: R-tree lookup of the region containing a point
//! - `lidw_interpolate`: population-masked LIDW raster
//! - `interpolate_indicator`: regions + network + raster in one call

mod lidw;
mod region_index;

pub use lidw::{
    interpolate_indicator, inverse_distance_weights, lidw_interpolate, LidwInput, LidwInterpolator,
    LidwParams,
};
pub(crate) use lidw::neighbour_estimate;
pub use region_index::RegionIndex;
