//! Rows of the CSV reports

use covmap_algorithms::aggregation::ZoneEstimate;
use covmap_algorithms::validation::{rmsd, DifferenceSummary, ErrorSummary, ZoneValidation};
use covmap_core::IndicatorDescriptor;
use serde::Serialize;

use crate::config::CountryYear;

pub const STATUS_OK: &str = "ok";
pub const STATUS_NO_RESULT: &str = "no result";

/// One row of the validation summary: a (country, year, indicator) unit
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub country: String,
    pub year: String,
    pub indicator: String,
    pub name: String,
    pub status: &'static str,
    pub reason: String,
    pub total: usize,
    pub predicted: usize,
    pub unlocated: usize,
    pub bias: f64,
    pub mae: f64,
    pub rmse: f64,
    pub p95_coverage: f64,
    pub ratio: f64,
}

impl SummaryRow {
    pub fn from_summary(unit: &CountryYear, indicator: &IndicatorDescriptor, summary: &ErrorSummary) -> Self {
        Self {
            country: unit.country.clone(),
            year: unit.year.clone(),
            indicator: indicator.code.clone(),
            name: indicator.display_name.clone(),
            status: STATUS_OK,
            reason: String::new(),
            total: summary.total,
            predicted: summary.predicted,
            unlocated: summary.unlocated,
            bias: summary.bias,
            mae: summary.mae,
            rmse: summary.rmse,
            p95_coverage: summary.p95_coverage,
            ratio: summary.ratio,
        }
    }

    /// Row for a unit that produced nothing, every metric NaN
    pub fn no_result(unit: &CountryYear, indicator: &IndicatorDescriptor, reason: impl Into<String>) -> Self {
        Self {
            status: STATUS_NO_RESULT,
            reason: reason.into(),
            ..Self::from_summary(unit, indicator, &ErrorSummary::empty())
        }
    }
}

/// One zone of one layer
#[derive(Debug, Clone, Serialize)]
pub struct ZoneRow {
    pub zone_id: String,
    pub clusters: usize,
    pub lidw: f64,
    pub direct: f64,
    /// Estimate with the zone's clusters withheld, NaN when not validated
    pub loocv: f64,
}

pub fn zone_rows(estimates: &[ZoneEstimate], validations: &[ZoneValidation]) -> Vec<ZoneRow> {
    estimates
        .iter()
        .map(|e| ZoneRow {
            zone_id: e.zone_id.clone(),
            clusters: e.clusters,
            lidw: e.lidw,
            direct: e.direct,
            loocv: validations
                .iter()
                .find(|v| v.zone_id == e.zone_id)
                .map_or(f64::NAN, |v| v.loocv),
        })
        .collect()
}

/// Direct survey estimate against the leave-zone-out estimate for a layer
#[derive(Debug, Clone, Serialize)]
pub struct ZoneSummaryRow {
    pub country: String,
    pub year: String,
    pub indicator: String,
    pub layer: String,
    pub zones: usize,
    pub mean_difference: f64,
    pub std_difference: f64,
    pub mean_abs_difference: f64,
    pub rmsd: f64,
}

impl ZoneSummaryRow {
    pub fn new(unit: &CountryYear, indicator: &IndicatorDescriptor, layer: &str, rows: &[ZoneRow]) -> Self {
        let validated: Vec<&ZoneRow> = rows.iter().filter(|r| r.clusters > 0).collect();
        let direct: Vec<f64> = validated.iter().map(|r| r.direct).collect();
        let loocv: Vec<f64> = validated.iter().map(|r| r.loocv).collect();
        let diff = DifferenceSummary::between(&direct, &loocv);
        Self {
            country: unit.country.clone(),
            year: unit.year.clone(),
            indicator: indicator.code.clone(),
            layer: layer.to_string(),
            zones: diff.count,
            mean_difference: diff.mean,
            std_difference: diff.std,
            mean_abs_difference: diff.mean_abs,
            rmsd: rmsd(&direct, &loocv),
        }
    }
}
