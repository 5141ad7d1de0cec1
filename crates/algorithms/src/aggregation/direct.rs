//! Survey-based direct estimates and per-zone report rows

use covmap_core::raster::{Raster, RasterElement};
use covmap_core::Zone;
use serde::Serialize;

use super::{average_raster_within_shape, ZoneMembership};

/// Ratio of summed counts over the member clusters.
///
/// Missing counts are skipped; NaN when the denominator sum is not positive.
pub fn direct_estimate(numerator: &[f64], denominator: &[f64], members: &[usize]) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for &m in members {
        if let Some(&n) = numerator.get(m) {
            if n.is_finite() {
                num += n;
            }
        }
        if let Some(&d) = denominator.get(m) {
            if d.is_finite() {
                den += d;
            }
        }
    }
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}

/// One row of the zone table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneEstimate {
    pub zone_id: String,
    /// Mean of the interpolated raster over the zone
    pub lidw: f64,
    /// Direct survey estimate from the zone's clusters
    pub direct: f64,
    /// Number of clusters assigned to the zone
    pub clusters: usize,
}

/// LIDW zonal mean and direct estimate for every zone.
///
/// `numerator` and `denominator` are indexed like the samples `membership`
/// was built from.
pub fn zone_estimates<T: RasterElement>(
    zones: &[Zone],
    membership: &ZoneMembership,
    indicator: &Raster<T>,
    numerator: &[f64],
    denominator: &[f64],
    all_touched: bool,
) -> Vec<ZoneEstimate> {
    zones
        .iter()
        .enumerate()
        .map(|(z, zone)| {
            let members = membership.clusters_of(z);
            let lidw = average_raster_within_shape(indicator, &zone.geometry, all_touched);
            ZoneEstimate {
                zone_id: zone.id.clone(),
                lidw: lidw.value,
                direct: direct_estimate(numerator, denominator, members),
                clusters: members.len(),
            }
        })
        .collect()
}
