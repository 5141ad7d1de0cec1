//! Zonal statistics over polygon masks
//!
//! A pixel belongs to a polygon when its centre is covered by it, or with
//! `all_touched` when any part of its footprint intersects it.

use std::collections::BTreeMap;

use crate::maybe_rayon::*;
use covmap_core::raster::{Raster, RasterElement};
use covmap_core::Zone;
use geo::{BoundingRect, Intersects, MultiPolygon, Point};
use serde::Serialize;

/// Result of aggregating a raster over one polygon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZonalValue {
    /// Mean or sum; NaN when the mask is empty
    pub value: f64,
    /// Pixels selected by the polygon mask
    pub mask_pixels: usize,
    /// Masked pixels that contributed to `value`
    pub valid_pixels: usize,
    /// The polygon did not overlap the raster grid at all
    pub empty_mask: bool,
}

impl ZonalValue {
    fn empty() -> Self {
        Self {
            value: f64::NAN,
            mask_pixels: 0,
            valid_pixels: 0,
            empty_mask: true,
        }
    }
}

/// Pixels `(row, col)` selected by `geometry`, in row-major order.
pub fn polygon_mask<T: RasterElement>(raster: &Raster<T>, geometry: &MultiPolygon<f64>, all_touched: bool) -> Vec<(usize, usize)> {
    let Some(bbox) = geometry.bounding_rect() else {
        return Vec::new();
    };
    let (rows, cols) = raster.shape();
    let transform = raster.transform();
    let Some((r0, r1, c0, c1)) = transform.window(&bbox, rows, cols) else {
        return Vec::new();
    };

    let mut cells = Vec::new();
    for row in r0..=r1 {
        for col in c0..=c1 {
            let inside = if all_touched {
                geometry.intersects(&transform.pixel_rect(col, row))
            } else {
                let (x, y) = raster.xy(row, col);
                geometry.intersects(&Point::new(x, y))
            };
            if inside {
                cells.push((row, col));
            }
        }
    }
    cells
}

/// Values of masked pixels that are not nodata and strictly positive.
pub fn valid_pixels_within_shape<T: RasterElement>(raster: &Raster<T>, geometry: &MultiPolygon<f64>, all_touched: bool) -> Vec<f64> {
    polygon_mask(raster, geometry, all_touched)
        .into_iter()
        .filter(|&(row, col)| raster.is_positive_at(row, col))
        .filter_map(|(row, col)| raster.get(row, col).ok()?.to_f64())
        .collect()
}

/// Mean of the positive, valid pixels under `geometry`.
///
/// `0.0` when none of the masked pixels is valid; NaN with `empty_mask`
/// when the polygon misses the grid.
pub fn average_raster_within_shape<T: RasterElement>(raster: &Raster<T>, geometry: &MultiPolygon<f64>, all_touched: bool) -> ZonalValue {
    let mask = polygon_mask(raster, geometry, all_touched);
    if mask.is_empty() {
        tracing::warn!("polygon does not overlap the raster grid");
        return ZonalValue::empty();
    }

    let valid: Vec<f64> = mask
        .iter()
        .filter(|&&(row, col)| raster.is_positive_at(row, col))
        .filter_map(|&(row, col)| raster.get(row, col).ok()?.to_f64())
        .collect();

    let value = if valid.is_empty() {
        0.0
    } else {
        valid.iter().sum::<f64>() / valid.len() as f64
    };
    ZonalValue {
        value,
        mask_pixels: mask.len(),
        valid_pixels: valid.len(),
        empty_mask: false,
    }
}

/// Sum of the pixels under `geometry`, negative and nodata pixels as 0.
pub fn aggregate_raster_within_shape<T: RasterElement>(raster: &Raster<T>, geometry: &MultiPolygon<f64>, all_touched: bool) -> ZonalValue {
    let mask = polygon_mask(raster, geometry, all_touched);
    if mask.is_empty() {
        tracing::warn!("polygon does not overlap the raster grid");
        return ZonalValue::empty();
    }

    let mut sum = 0.0;
    let mut valid = 0usize;
    for &(row, col) in &mask {
        if raster.is_positive_at(row, col) {
            if let Some(v) = raster.get(row, col).ok().and_then(RasterElement::to_f64) {
                sum += v;
                valid += 1;
            }
        }
    }
    ZonalValue {
        value: sum,
        mask_pixels: mask.len(),
        valid_pixels: valid,
        empty_mask: false,
    }
}

/// Zonal mean of `raster` for every zone, keyed by zone id.
pub fn aggregate_over_zones<T: RasterElement>(zones: &[Zone], raster: &Raster<T>, all_touched: bool) -> BTreeMap<String, ZonalValue> {
    let values: Vec<(String, ZonalValue)> = (0..zones.len())
        .into_par_iter()
        .map(|i| {
            let zone = &zones[i];
            let value = average_raster_within_shape(raster, &zone.geometry, all_touched);
            if value.empty_mask {
                tracing::warn!("zone {} has an empty raster mask", zone.id);
            }
            (zone.id.clone(), value)
        })
        .collect();
    values.into_iter().collect()
}
