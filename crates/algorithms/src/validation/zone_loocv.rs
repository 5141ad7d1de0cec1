//! Settlement-level leave-out validation
//!
//! Every cluster assigned to a zone is withheld at once; the country is
//! re-tessellated from the remaining clusters and the zone's pixels are
//! predicted from their Voronoi neighbours.

use crate::aggregation::{average_raster_within_shape, polygon_mask};
use crate::interpolation::{neighbour_estimate, RegionIndex};
use crate::maybe_rayon::*;
use crate::network::build_network;
use crate::tessellation::{build_voronoi_regions, VoronoiRegion};
use covmap_core::raster::{Raster, RasterElement};
use covmap_core::{Boundary, Error, Result, SampleLocation, Zone};
use geo::Coord;
use serde::Serialize;

/// Zone estimate with and without the zone's own clusters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneValidation {
    pub zone_id: String,
    /// Clusters withheld
    pub clusters: usize,
    /// Inhabited pixels under the zone
    pub pixels: usize,
    /// Pixels that received a prediction
    pub predicted_pixels: usize,
    /// Zonal mean of the full interpolation
    pub lidw: f64,
    /// Mean prediction with the zone's clusters withheld
    pub loocv: f64,
}

/// Re-estimate `zone` without the samples listed in `members`.
///
/// Pixels are the all-touched mask of the zone over `indicator`, minus
/// nodata. `loocv` is NaN when no pixel could be predicted.
pub fn validate_leave_zone_out<T: RasterElement>(
    samples: &[SampleLocation],
    country: &Boundary,
    zone: &Zone,
    members: &[usize],
    indicator: &Raster<T>,
    all_touched: bool,
) -> Result<ZoneValidation> {
    if let Some(&m) = members.iter().find(|&&m| m >= samples.len()) {
        return Err(Error::InvalidParameter {
            name: "members",
            value: m.to_string(),
            reason: format!("beyond {} samples", samples.len()),
        });
    }

    let kept: Vec<usize> = (0..samples.len()).filter(|i| !members.contains(i)).collect();
    if kept.is_empty() {
        return Err(Error::EmptyInput(format!("zone {} holds every sample", zone.id)));
    }

    let pixels: Vec<(usize, usize)> = polygon_mask(indicator, &zone.geometry, true)
        .into_iter()
        .filter(|&(row, col)| indicator.get(row, col).map_or(false, |v| !indicator.is_nodata(v)))
        .collect();

    let locations: Vec<Coord<f64>> = kept.iter().map(|&i| samples[i].coord).collect();
    let regions: Vec<VoronoiRegion> = build_voronoi_regions(&locations, country)
        .into_iter()
        .flatten()
        .map(|mut region| {
            region.source_index = kept[region.source_index];
            region
        })
        .collect();
    let network = build_network(&regions, true);
    let index = RegionIndex::new(&regions);
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();

    let predictions: Vec<f64> = pixels
        .clone()
        .into_par_iter()
        .filter_map(|(row, col)| {
            let (x, y) = indicator.xy(row, col);
            let target = Coord { x, y };
            let k = index.locate(target)?;
            neighbour_estimate(target, network.neighbors(k), &regions, &values).map(|(mean, _)| mean)
        })
        .collect();

    let loocv = if predictions.is_empty() {
        tracing::warn!("zone {}: no pixel could be re-estimated", zone.id);
        f64::NAN
    } else {
        // Unpredicted pixels are left out of the mean rather than counted as zero
        predictions.iter().sum::<f64>() / predictions.len() as f64
    };

    Ok(ZoneValidation {
        zone_id: zone.id.clone(),
        clusters: members.len(),
        pixels: pixels.len(),
        predicted_pixels: predictions.len(),
        lidw: average_raster_within_shape(indicator, &zone.geometry, all_touched).value,
        loocv,
    })
}
