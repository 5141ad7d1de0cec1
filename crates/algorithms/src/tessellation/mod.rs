//! Bounded Voronoi tessellation of survey cluster locations
//!
//! Cells are built per site by half-plane clipping, then clipped to the
//! country outline (or left raw for leave-one-out validation). Fence
//! points placed outside the country bounding box keep every real cell
//! bounded.

mod proximity;
mod regions;
mod voronoi;

pub use proximity::{geometry_gap, point_gap, SNAP_TOLERANCE};
pub use regions::{
    build_raw_regions, build_voronoi_regions, fence_points, require_complete, VoronoiRegion,
};
pub use voronoi::{voronoi_cells, voronoi_envelope};
