//! Point-level leave-one-out cross-validation
//!
//! For each cluster q the others are re-tessellated without clipping,
//! bounded by fence points around the full country extent, and q is
//! predicted from the neighbours of the region it falls in:
//!
//! ```text
//! mean = Σ wₐ·vₐ      var = Σ wₐ·vₐ² − mean²      std = √max(var, 0)
//! ```

use crate::interpolation::{neighbour_estimate, RegionIndex};
use crate::maybe_rayon::*;
use crate::network::{build_network, AdjacencyNetwork};
use crate::tessellation::{build_raw_regions, fence_points, VoronoiRegion};
use covmap_core::{Algorithm, Error, Result, SampleLocation};
use geo::{Coord, Rect};
use serde::Serialize;

/// Outcome of validating one cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Predicted,
    /// No region of the remaining clusters covers the withheld location
    Unlocated,
}

/// One row of the validation table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRecord {
    pub cluster: i64,
    pub observed: f64,
    pub predicted_mean: f64,
    pub predicted_std: f64,
    pub status: RecordStatus,
}

impl ValidationRecord {
    pub fn is_predicted(&self) -> bool {
        self.status == RecordStatus::Predicted
    }
}

/// Parameters for leave-one-out validation
#[derive(Debug, Clone)]
pub struct ValidationParams {
    /// Include the region's own cluster among its neighbours (default: true)
    pub self_loop: bool,
}

impl Default for ValidationParams {
    fn default() -> Self {
        Self { self_loop: true }
    }
}

/// Inputs of one validation run
#[derive(Debug, Clone)]
pub struct LeaveOneOutInput {
    pub samples: Vec<SampleLocation>,
    /// Bounding box of the whole country, used for the fence points
    pub country_bounds: Rect<f64>,
}

/// Leave-one-out validation algorithm
#[derive(Debug, Clone, Default)]
pub struct LeaveOneOutValidator;

impl Algorithm for LeaveOneOutValidator {
    type Input = LeaveOneOutInput;
    type Output = Vec<ValidationRecord>;
    type Params = ValidationParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "LeaveOneOut"
    }

    fn description(&self) -> &'static str {
        "Predict each cluster from the Voronoi neighbours of the remaining clusters"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        validate(&input.samples, input.country_bounds, params.self_loop)
    }
}

/// Tessellation and network built with one cluster withheld.
///
/// `source_index` of every region refers to the full sample list, so the
/// withheld index never appears.
#[derive(Debug, Clone)]
pub struct LeaveOneOutNetwork {
    pub regions: Vec<VoronoiRegion>,
    pub network: AdjacencyNetwork,
}

fn withheld_network(samples: &[SampleLocation], fences: &[Coord<f64>; 4], q: usize, self_loop: bool) -> LeaveOneOutNetwork {
    let remaining: Vec<Coord<f64>> = samples
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != q)
        .map(|(_, s)| s.coord)
        .collect();

    let regions: Vec<VoronoiRegion> = build_raw_regions(&remaining, fences)
        .into_iter()
        .flatten()
        .map(|mut region| {
            if region.source_index >= q {
                region.source_index += 1;
            }
            region
        })
        .collect();
    let network = build_network(&regions, self_loop);

    LeaveOneOutNetwork { regions, network }
}

/// Network used to predict sample `q`.
pub fn leave_one_out_network(samples: &[SampleLocation], country_bounds: Rect<f64>, q: usize) -> Result<LeaveOneOutNetwork> {
    if q >= samples.len() {
        return Err(Error::IndexOutOfBounds {
            row: q,
            col: 0,
            rows: samples.len(),
            cols: 1,
        });
    }
    Ok(withheld_network(samples, &fence_points(country_bounds), q, true))
}

fn predict(samples: &[SampleLocation], values: &[f64], fences: &[Coord<f64>; 4], q: usize, self_loop: bool) -> ValidationRecord {
    let target = samples[q];
    let LeaveOneOutNetwork { regions, network } = withheld_network(samples, fences, q, self_loop);
    let index = RegionIndex::new(&regions);

    let estimate = index
        .locate(target.coord)
        .and_then(|k| neighbour_estimate(target.coord, network.neighbors(k), &regions, values));

    match estimate {
        Some((mean, second)) => ValidationRecord {
            cluster: target.cluster,
            observed: target.value,
            predicted_mean: mean,
            predicted_std: (second - mean * mean).max(0.0).sqrt(),
            status: RecordStatus::Predicted,
        },
        None => {
            tracing::warn!("cluster {} is not covered by any remaining region", target.cluster);
            ValidationRecord {
                cluster: target.cluster,
                observed: target.value,
                predicted_mean: f64::NAN,
                predicted_std: f64::NAN,
                status: RecordStatus::Unlocated,
            }
        }
    }
}

fn validate(samples: &[SampleLocation], country_bounds: Rect<f64>, self_loop: bool) -> Result<Vec<ValidationRecord>> {
    if samples.len() < 2 {
        return Err(Error::InvalidParameter {
            name: "samples",
            value: samples.len().to_string(),
            reason: "leave-one-out needs at least 2 samples".into(),
        });
    }
    let fences = fence_points(country_bounds);
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();

    let records: Vec<ValidationRecord> = (0..samples.len())
        .into_par_iter()
        .map(|q| predict(samples, &values, &fences, q, self_loop))
        .collect();

    let unlocated = records.iter().filter(|r| !r.is_predicted()).count();
    tracing::debug!("validated {} clusters ({} unlocated)", records.len(), unlocated);
    Ok(records)
}

/// Leave-one-out validation of every sample, in input order.
pub fn validate_leave_one_out(samples: &[SampleLocation], country_bounds: Rect<f64>) -> Result<Vec<ValidationRecord>> {
    validate(samples, country_bounds, true)
}
