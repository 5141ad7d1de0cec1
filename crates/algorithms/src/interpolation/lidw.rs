//! Local Inverse Distance Weighting (LIDW) on a Voronoi network
//!
//! Each inhabited pixel is estimated from the samples whose Voronoi
//! regions neighbour the region containing the pixel centre, weighted by
//! the inverse great-circle distance (power 1) to each sample.
//!
//! ```text
//! z(p) = Σ wₐ·zₐ     wₐ = (1/d(p, sₐ)) / Σ_b (1/d(p, s_b))     a ∈ net[region(p)]
//! ```

use std::collections::HashMap;

use crate::geodesy::great_circle_distance;
use crate::maybe_rayon::*;
use crate::network::{build_network, AdjacencyNetwork};
use crate::tessellation::{build_voronoi_regions, require_complete, VoronoiRegion};
use covmap_core::raster::{Raster, RasterElement};
use covmap_core::{Algorithm, Boundary, Error, Result, SampleLocation, CRS, INDICATOR_NODATA};
use geo::Coord;

use super::RegionIndex;

/// Parameters for the LIDW pipeline
#[derive(Debug, Clone)]
pub struct LidwParams {
    /// Let a pixel use the sample of its own region (default: true)
    pub self_loop: bool,
}

impl Default for LidwParams {
    fn default() -> Self {
        Self { self_loop: true }
    }
}

/// Inputs of one interpolation run
#[derive(Debug, Clone)]
pub struct LidwInput {
    /// Samples with a finite indicator value
    pub samples: Vec<SampleLocation>,
    pub country: Boundary,
    /// Population raster; cells > 0 are inhabited
    pub population: Raster<f64>,
}

/// LIDW interpolation algorithm
#[derive(Debug, Clone, Default)]
pub struct LidwInterpolator;

impl Algorithm for LidwInterpolator {
    type Input = LidwInput;
    type Output = Raster<f64>;
    type Params = LidwParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "LIDW"
    }

    fn description(&self) -> &'static str {
        "Inverse-distance interpolation restricted to Voronoi neighbours, masked by population"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        interpolate_indicator(&input.samples, &input.country, &input.population, params)
    }
}

/// Normalised inverse-distance weights of `generators` seen from `target`.
///
/// Weights sum to 1. A generator at zero distance takes the whole weight
/// (shared equally if several coincide with `target`).
pub fn inverse_distance_weights(target: Coord<f64>, generators: &[Coord<f64>]) -> Vec<f64> {
    let distances: Vec<f64> = generators
        .iter()
        .map(|g| great_circle_distance(target, *g))
        .collect();

    let coincident = distances.iter().filter(|&&d| d == 0.0).count();
    if coincident > 0 {
        let share = 1.0 / coincident as f64;
        return distances
            .iter()
            .map(|&d| if d == 0.0 { share } else { 0.0 })
            .collect();
    }

    let inverse: Vec<f64> = distances.iter().map(|d| 1.0 / d).collect();
    let total: f64 = inverse.iter().sum();
    inverse.into_iter().map(|w| w / total).collect()
}

/// Weighted estimate at `target` from the neighbours of `region`.
///
/// Returns `None` when the region has no neighbours.
pub(crate) fn neighbour_estimate(
    target: Coord<f64>,
    neighbours: &[usize],
    regions: &[VoronoiRegion],
    values: &[f64],
) -> Option<(f64, f64)> {
    if neighbours.is_empty() {
        return None;
    }
    let generators: Vec<Coord<f64>> = neighbours.iter().map(|&a| regions[a].generator).collect();
    let weights = inverse_distance_weights(target, &generators);

    let mut first = 0.0;
    let mut second = 0.0;
    for (&a, w) in neighbours.iter().zip(weights) {
        let v = values[regions[a].source_index];
        first += w * v;
        second += w * v * v;
    }
    Some((first, second))
}

fn check_inputs(samples: &[SampleLocation], regions: &[VoronoiRegion], network: &AdjacencyNetwork) -> Result<()> {
    if regions.len() != network.len() {
        return Err(Error::InvalidParameter {
            name: "network",
            value: network.len().to_string(),
            reason: format!("expected one node per region ({})", regions.len()),
        });
    }
    if let Some(r) = regions.iter().find(|r| r.source_index >= samples.len()) {
        return Err(Error::InvalidParameter {
            name: "regions",
            value: r.source_index.to_string(),
            reason: format!("source index beyond {} samples", samples.len()),
        });
    }
    Ok(())
}

/// Interpolate sample values onto the population grid.
///
/// Pixels holding a sample take its value exactly. Every other inhabited
/// pixel is estimated from the network neighbours of the region containing
/// its centre. All remaining pixels are [`INDICATOR_NODATA`]. The output
/// shares the population grid and is tagged EPSG:4326.
pub fn lidw_interpolate<T: RasterElement>(
    samples: &[SampleLocation],
    regions: &[VoronoiRegion],
    network: &AdjacencyNetwork,
    population: &Raster<T>,
) -> Result<Raster<f64>> {
    check_inputs(samples, regions, network)?;

    let (rows, cols) = population.shape();
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();

    let mut known: HashMap<(usize, usize), f64> = HashMap::with_capacity(samples.len());
    for s in samples {
        match population.index(s.coord.x, s.coord.y) {
            Some(cell) => {
                known.insert(cell, s.value);
            }
            None => tracing::warn!(
                "cluster {} at ({}, {}) lies outside the population grid, skipped",
                s.cluster,
                s.coord.x,
                s.coord.y
            ),
        }
    }

    let index = RegionIndex::new(regions);

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![INDICATOR_NODATA; cols];

            for col in 0..cols {
                if let Some(&v) = known.get(&(row, col)) {
                    row_data[col] = v;
                    continue;
                }
                if !population.is_positive_at(row, col) {
                    continue;
                }

                let (x, y) = population.xy(row, col);
                let target = Coord { x, y };
                let Some(k) = index.locate(target) else {
                    continue;
                };
                if let Some((estimate, _)) = neighbour_estimate(target, network.neighbors(k), regions, &values) {
                    row_data[col] = estimate;
                }
            }

            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(*population.transform());
    output.set_nodata(Some(INDICATOR_NODATA));
    output.set_crs(Some(CRS::wgs84()));

    Ok(output)
}

/// Full pipeline: clipped regions, self-looped network, interpolation.
pub fn interpolate_indicator(
    samples: &[SampleLocation],
    country: &Boundary,
    population: &Raster<f64>,
    params: LidwParams,
) -> Result<Raster<f64>> {
    if samples.is_empty() {
        return Err(Error::EmptyInput("no samples to interpolate".into()));
    }
    let locations: Vec<Coord<f64>> = samples.iter().map(|s| s.coord).collect();
    let regions = require_complete(build_voronoi_regions(&locations, country))?;
    let network = build_network(&regions, params.self_loop);
    lidw_interpolate(samples, &regions, &network, population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use covmap_core::{AreaType, GeoTransform};
    use geo::{coord, polygon};

    fn sample(cluster: i64, lon: f64, lat: f64, value: f64) -> SampleLocation {
        SampleLocation::new(cluster, lon, lat, value, AreaType::Rural)
    }

    /// 10x10 grid over [0, 1] x [0, 1], every cell inhabited
    fn population(fill: f64) -> Raster<f64> {
        let mut r = Raster::filled(10, 10, fill);
        r.set_transform(GeoTransform::new(0.0, 1.0, 0.1, -0.1));
        r
    }

    fn unit_country() -> Boundary {
        Boundary::from_polygon(polygon![
            (x: -0.5, y: -0.5), (x: 1.5, y: -0.5), (x: 1.5, y: 1.5), (x: -0.5, y: 1.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_weights_sum_to_one() {
        let target = coord! { x: 30.1, y: -1.9 };
        let gens = [
            coord! { x: 30.0, y: -2.0 },
            coord! { x: 30.4, y: -1.7 },
            coord! { x: 29.8, y: -1.95 },
            coord! { x: 30.15, y: -1.85 },
        ];
        let w = inverse_distance_weights(target, &gens);
        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert!(w[3] > w[1], "closer generator must weigh more");
    }

    #[test]
    fn test_weights_inverse_not_squared() {
        let target = coord! { x: 0.0, y: 0.0 };
        let gens = [coord! { x: 0.0, y: 1.0 }, coord! { x: 0.0, y: 2.0 }];
        let w = inverse_distance_weights(target, &gens);
        assert_abs_diff_eq!(w[0] / w[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_weights_at_generator() {
        let target = coord! { x: 1.0, y: 1.0 };
        let w = inverse_distance_weights(target, &[coord! { x: 1.0, y: 1.0 }, coord! { x: 2.0, y: 1.0 }]);
        assert_eq!(w, vec![1.0, 0.0]);
    }

    #[test]
    fn test_exact_recovery_at_samples() {
        let samples = vec![
            sample(1, 0.12, 0.17, 0.31),
            sample(2, 0.81, 0.22, 0.77),
            sample(3, 0.44, 0.86, 0.05),
        ];
        let result = interpolate_indicator(&samples, &unit_country(), &population(50.0), LidwParams::default()).unwrap();
        for s in &samples {
            let (row, col) = result.index(s.coord.x, s.coord.y).unwrap();
            assert_eq!(result.get(row, col).unwrap(), s.value);
        }
    }

    #[test]
    fn test_single_sample_fills_inhabited_pixels() {
        let samples = vec![sample(1, 0.55, 0.45, 0.7)];
        let mut pop = population(3.0);
        pop.set(0, 0, 0.0).unwrap();
        pop.set(9, 9, -1.0).unwrap();

        let result = interpolate_indicator(&samples, &unit_country(), &pop, LidwParams::default()).unwrap();
        for row in 0..10 {
            for col in 0..10 {
                let v = result.get(row, col).unwrap();
                if (row, col) == (0, 0) || (row, col) == (9, 9) {
                    assert_eq!(v, INDICATOR_NODATA);
                } else {
                    assert_abs_diff_eq!(v, 0.7, epsilon = 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_square_corners_centroid_is_half() {
        // Pixel (1, 1) of a 3x3 grid over [-0.5, 1.5]^2 is centred on (0.5, 0.5)
        let mut pop = Raster::filled(3, 3, 1.0);
        pop.set_transform(GeoTransform::new(-0.5, 1.5, 2.0 / 3.0, -2.0 / 3.0));
        let samples = vec![
            sample(1, 0.0, 0.0, 0.0),
            sample(2, 1.0, 0.0, 1.0),
            sample(3, 1.0, 1.0, 1.0),
            sample(4, 0.0, 1.0, 0.0),
        ];
        let result = interpolate_indicator(&samples, &unit_country(), &pop, LidwParams::default()).unwrap();
        assert_abs_diff_eq!(result.get(1, 1).unwrap(), 0.5, epsilon = 1e-4);
    }

    #[test]
    fn test_outside_country_stays_nodata() {
        let country = Boundary::from_polygon(polygon![
            (x: 0.0, y: 0.0), (x: 0.5, y: 0.0), (x: 0.5, y: 1.0), (x: 0.0, y: 1.0),
        ])
        .unwrap();
        let samples = vec![sample(1, 0.2, 0.3, 0.4), sample(2, 0.3, 0.8, 0.6)];
        let result = interpolate_indicator(&samples, &country, &population(1.0), LidwParams::default()).unwrap();
        // column 8 centre x = 0.85, east of the country
        assert_eq!(result.get(5, 8).unwrap(), INDICATOR_NODATA);
        assert_ne!(result.get(5, 2).unwrap(), INDICATOR_NODATA);
        assert_eq!(result.nodata(), Some(INDICATOR_NODATA));
        assert_eq!(result.crs().and_then(|c| c.epsg()), Some(4326));
    }

    #[test]
    fn test_isolated_region_stays_nodata() {
        let samples = vec![sample(1, 0.25, 0.5, 0.2), sample(2, 0.75, 0.5, 0.9)];
        let locations: Vec<_> = samples.iter().map(|s| s.coord).collect();
        let regions = require_complete(build_voronoi_regions(&locations, &unit_country())).unwrap();
        let empty = AdjacencyNetwork::from_lists(vec![vec![], vec![]], false);
        let result = lidw_interpolate(&samples, &regions, &empty, &population(1.0)).unwrap();
        assert_eq!(result.get(0, 0).unwrap(), INDICATOR_NODATA);
        let (r, c) = result.index(0.25, 0.5).unwrap();
        assert_eq!(result.get(r, c).unwrap(), 0.2);
    }

    #[test]
    fn test_mismatched_network_is_error() {
        let samples = vec![sample(1, 0.25, 0.5, 0.2)];
        let regions = require_complete(build_voronoi_regions(&[samples[0].coord], &unit_country())).unwrap();
        let net = AdjacencyNetwork::from_lists(vec![], true);
        assert!(lidw_interpolate(&samples, &regions, &net, &population(1.0)).is_err());
    }
}
