//! Settlement and subnational aggregation
//!
//! Zonal means and sums of indicator/population rasters, survey-based
//! direct estimates, and the buffer-based assignment of clusters to zones.

mod direct;
mod membership;
mod zonal;

pub use direct::{direct_estimate, zone_estimates, ZoneEstimate};
pub use membership::{assign_clusters_to_zones, overlap_fraction, ZoneMembership};
pub use zonal::{
    aggregate_over_zones, aggregate_raster_within_shape, average_raster_within_shape, polygon_mask,
    valid_pixels_within_shape, ZonalValue,
};
