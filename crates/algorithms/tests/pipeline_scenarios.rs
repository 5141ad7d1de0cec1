//! End-to-end scenarios through the public API: tessellation, network,
//! interpolation, validation and zone aggregation on small synthetic
//! countries.

use approx::assert_abs_diff_eq;
use covmap_algorithms::aggregation::{aggregate_over_zones, assign_clusters_to_zones, zone_estimates};
use covmap_algorithms::geodesy::great_circle_distance;
use covmap_algorithms::interpolation::{inverse_distance_weights, LidwInput, LidwInterpolator, RegionIndex};
use covmap_algorithms::network::build_network;
use covmap_algorithms::tessellation::{build_voronoi_regions, require_complete};
use covmap_algorithms::validation::{
    leave_one_out_network, validate_leave_one_out, validate_leave_zone_out, ErrorSummary, LeaveOneOutInput,
    LeaveOneOutValidator, RecordStatus,
};
use covmap_core::{Algorithm, AreaType, Boundary, GeoTransform, Raster, SampleLocation, Zone, INDICATOR_NODATA};
use geo::{coord, polygon, Contains, Coord, Point, Rect};

fn sample(cluster: i64, lon: f64, lat: f64, value: f64) -> SampleLocation {
    SampleLocation::new(cluster, lon, lat, value, AreaType::Rural)
}

fn square_country(min: f64, max: f64) -> Boundary {
    Boundary::from_polygon(polygon![
        (x: min, y: min), (x: max, y: min), (x: max, y: max), (x: min, y: max),
    ])
    .unwrap()
}

/// `n` x `n` inhabited grid covering [min, max]^2
fn population(n: usize, min: f64, max: f64) -> Raster<f64> {
    let size = (max - min) / n as f64;
    let mut r = Raster::filled(n, n, 10.0);
    r.set_transform(GeoTransform::new(min, max, size, -size));
    r
}

fn scattered_samples() -> Vec<SampleLocation> {
    [(0.12, 0.18), (0.83, 0.11), (0.47, 0.52), (0.21, 0.79), (0.76, 0.88), (0.55, 0.31)]
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| sample(i as i64 + 1, x, y, (i as f64 + 1.0) / 10.0))
        .collect()
}

#[test]
fn distance_is_symmetric_with_reference_pair() {
    let a = coord! { x: 0.0, y: 0.0 };
    let b = coord! { x: 0.0, y: 1.0 };
    assert_eq!(great_circle_distance(a, a), 0.0);
    assert_eq!(great_circle_distance(a, b), great_circle_distance(b, a));
    assert_abs_diff_eq!(great_circle_distance(a, b), 111.19, epsilon = 111.19e-3);
}

#[test]
fn regions_partition_the_locations() {
    let samples = scattered_samples();
    let locations: Vec<Coord<f64>> = samples.iter().map(|s| s.coord).collect();
    let regions = require_complete(build_voronoi_regions(&locations, &square_country(0.0, 1.0))).unwrap();

    for (i, loc) in locations.iter().enumerate() {
        let owners: Vec<usize> = regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.polygon.contains(&Point::from(*loc)))
            .map(|(k, _)| k)
            .collect();
        assert_eq!(owners, vec![i]);
    }

    let index = RegionIndex::new(&regions);
    for (i, loc) in locations.iter().enumerate() {
        assert_eq!(index.locate(*loc), Some(i));
    }
}

#[test]
fn network_is_symmetric() {
    let locations: Vec<Coord<f64>> = scattered_samples().iter().map(|s| s.coord).collect();
    let regions = require_complete(build_voronoi_regions(&locations, &square_country(0.0, 1.0))).unwrap();
    for self_loop in [true, false] {
        let network = build_network(&regions, self_loop);
        assert!(network.is_symmetric());
        for (i, neighbours) in network.iter() {
            assert_eq!(neighbours.first() == Some(&i), self_loop);
        }
    }
}

#[test]
fn weights_are_normalised() {
    let samples = scattered_samples();
    let generators: Vec<Coord<f64>> = samples.iter().map(|s| s.coord).collect();
    for target in [coord! { x: 0.3, y: 0.3 }, coord! { x: 0.9, y: 0.05 }, coord! { x: 0.5, y: 0.99 }] {
        let w = inverse_distance_weights(target, &generators);
        assert_abs_diff_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn samples_are_recovered_exactly() {
    let samples = scattered_samples();
    let input = LidwInput {
        samples: samples.clone(),
        country: square_country(0.0, 1.0),
        population: population(20, 0.0, 1.0),
    };
    let raster = LidwInterpolator.execute_default(input).unwrap();
    for s in &samples {
        let (row, col) = raster.index(s.coord.x, s.coord.y).unwrap();
        assert_eq!(raster.get(row, col).unwrap(), s.value);
    }
    let summary = raster.summary();
    assert_eq!(summary.valid_count, 400);
}

#[test]
fn square_corners_give_half_at_centre() {
    let samples = vec![
        sample(1, 0.0, 0.0, 0.0),
        sample(2, 1.0, 0.0, 1.0),
        sample(3, 1.0, 1.0, 1.0),
        sample(4, 0.0, 1.0, 0.0),
    ];
    let input = LidwInput {
        samples,
        country: square_country(-0.5, 1.5),
        population: population(3, -0.5, 1.5),
    };
    let raster = LidwInterpolator.execute_default(input).unwrap();
    assert_abs_diff_eq!(raster.get(1, 1).unwrap(), 0.5, epsilon = 1e-4);
}

#[test]
fn single_sample_fills_every_inhabited_pixel() {
    let mut pop = population(8, 0.0, 1.0);
    pop.set(3, 3, 0.0).unwrap();
    let input = LidwInput {
        samples: vec![sample(1, 0.7, 0.6, 0.7)],
        country: square_country(0.0, 1.0),
        population: pop,
    };
    let raster = LidwInterpolator.execute_default(input).unwrap();
    for row in 0..8 {
        for col in 0..8 {
            let expected = if (row, col) == (3, 3) { INDICATOR_NODATA } else { 0.7 };
            assert_abs_diff_eq!(raster.get(row, col).unwrap(), expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn zone_outside_raster_is_flagged_not_fatal() {
    let raster = population(4, 0.0, 1.0);
    let zones = vec![
        Zone::from_polygon("inside", Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 0.5, y: 0.5 }).to_polygon()).unwrap(),
        Zone::from_polygon("away", Rect::new(coord! { x: 5.0, y: 5.0 }, coord! { x: 6.0, y: 6.0 }).to_polygon()).unwrap(),
    ];
    let values = aggregate_over_zones(&zones, &raster, false);
    assert_abs_diff_eq!(values["inside"].value, 10.0);
    assert!(!values["inside"].empty_mask);
    assert!(values["away"].value.is_nan());
    assert!(values["away"].empty_mask);
}

#[test]
fn collinear_middle_sample_is_predicted_exactly() {
    let samples = vec![sample(1, 0.0, 0.0, 10.0), sample(2, 1.0, 0.0, 20.0), sample(3, 2.0, 0.0, 30.0)];
    let input = LeaveOneOutInput {
        samples,
        country_bounds: Rect::new(coord! { x: -0.5, y: -0.5 }, coord! { x: 2.5, y: 0.5 }),
    };
    let records = LeaveOneOutValidator.execute_default(input).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].predicted_mean, 20.0);
    assert_abs_diff_eq!(records[1].predicted_std, 10.0, epsilon = 1e-9);

    let summary = ErrorSummary::from_records(&records);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.predicted + summary.unlocated, 3);
}

#[test]
fn leave_one_out_network_never_holds_withheld_sample() {
    let samples = scattered_samples();
    let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
    for q in 0..samples.len() {
        let loo = leave_one_out_network(&samples, bounds, q).unwrap();
        for (_, neighbours) in loo.network.iter() {
            assert!(neighbours.iter().all(|&a| loo.regions[a].source_index != q));
        }
    }
    let records = validate_leave_one_out(&samples, bounds).unwrap();
    assert!(records.iter().all(|r| r.status == RecordStatus::Predicted));
}

#[test]
fn zone_pipeline_end_to_end() {
    let samples = scattered_samples();
    let country = square_country(0.0, 1.0);
    let input = LidwInput {
        samples: samples.clone(),
        country: country.clone(),
        population: population(20, 0.0, 1.0),
    };
    let raster = LidwInterpolator.execute_default(input).unwrap();

    let zones = vec![
        Zone::from_polygon("south", Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.5 }).to_polygon()).unwrap(),
        Zone::from_polygon("north", Rect::new(coord! { x: 0.0, y: 0.5 }, coord! { x: 1.0, y: 1.0 }).to_polygon()).unwrap(),
    ];
    let membership = assign_clusters_to_zones(&samples, &zones);
    // sample 3 at y = 0.52 is 2.2 km from the split, inside its 5 km buffer
    assert_eq!(membership.zones_of(2), &[0, 1]);
    assert_eq!(membership.clusters_of(0), &[0, 1, 2, 5]);
    assert_eq!(membership.clusters_of(1), &[2, 3, 4]);

    let numerator = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let denominator = vec![10.0; 6];
    let rows = zone_estimates(&zones, &membership, &raster, &numerator, &denominator, false);
    assert_abs_diff_eq!(rows[0].direct, 12.0 / 40.0, epsilon = 1e-12);
    assert_abs_diff_eq!(rows[1].direct, 12.0 / 30.0, epsilon = 1e-12);
    assert!(rows.iter().all(|r| r.lidw > 0.0 && r.lidw <= 0.6));

    let v = validate_leave_zone_out(&samples, &country, &zones[1], membership.clusters_of(1), &raster, false).unwrap();
    assert_eq!(v.clusters, 3);
    assert_eq!(v.pixels, v.predicted_pixels);
    assert!(v.loocv.is_finite());
    assert_abs_diff_eq!(v.lidw, rows[1].lidw, epsilon = 1e-12);
}
