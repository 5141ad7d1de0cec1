//! # covmap algorithms
//!
//! Coverage estimation on a Voronoi adjacency network.
//!
//! ## Modules
//!
//! - **geodesy**: great-circle distance, geodesic buffers and areas
//! - **tessellation**: bounded Voronoi regions, clipped or fenced
//! - **network**: region adjacency lists
//! - **interpolation**: LIDW raster over the network
//! - **validation**: leave-one-out at cluster and zone level, error metrics
//! - **aggregation**: zonal means, direct estimates, cluster/zone membership

pub mod aggregation;
pub mod geodesy;
pub mod interpolation;
pub mod network;
pub mod tessellation;
pub mod validation;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregation::{
        aggregate_over_zones, assign_clusters_to_zones, average_raster_within_shape, direct_estimate,
        zone_estimates, ZonalValue, ZoneEstimate, ZoneMembership,
    };
    pub use crate::geodesy::{geodesic_area, geodesic_buffer, great_circle_distance};
    pub use crate::interpolation::{
        interpolate_indicator, lidw_interpolate, LidwInput, LidwInterpolator, LidwParams, RegionIndex,
    };
    pub use crate::network::{build_network, settlement_network, AdjacencyNetwork};
    pub use crate::tessellation::{build_raw_regions, build_voronoi_regions, fence_points, VoronoiRegion};
    pub use crate::validation::{
        check_indicator, validate_leave_one_out, validate_leave_zone_out, DifferenceSummary, ErrorSummary,
        LeaveOneOutInput, LeaveOneOutValidator, RecordStatus, ValidationRecord, ZoneValidation,
    };
    pub use covmap_core::prelude::*;
}
