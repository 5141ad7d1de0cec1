//! Per-unit work shared by the subcommands and batch runs

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use covmap_algorithms::aggregation::{assign_clusters_to_zones, zone_estimates};
use covmap_algorithms::interpolation::{interpolate_indicator, LidwParams};
use covmap_algorithms::validation::{
    check_indicator, validate_leave_one_out, validate_leave_zone_out, ErrorSummary, ValidationRecord, ZoneValidation,
};
use covmap_core::io::{read_boundary, read_geotiff, read_survey_csv, read_zones, write_csv, write_geotiff, GeoTiffOptions};
use covmap_core::{Boundary, IndicatorDescriptor, Raster, SurveyTable, Zone};

use crate::config::{BatchConfig, CountryYear, ZoneLayer};
use crate::report::{zone_rows, SummaryRow, ZoneRow, ZoneSummaryRow};

/// Everything written for one (country, year)
#[derive(Debug, Default)]
pub struct UnitReport {
    pub summaries: Vec<SummaryRow>,
    pub zone_summaries: Vec<ZoneSummaryRow>,
}

pub fn indicator_raster_path(dir: &Path, unit: &CountryYear, indicator: &IndicatorDescriptor) -> PathBuf {
    dir.join("tiff")
        .join(format!("{}_{}_idw_{}.tif", unit.country, unit.year, indicator.short_name()))
}

pub fn validation_path(dir: &Path, unit: &CountryYear, indicator: &IndicatorDescriptor) -> PathBuf {
    dir.join(format!("{}_VAL2_{}_{}.csv", unit.country, indicator.short_name(), unit.year))
}

pub fn zone_path(dir: &Path, unit: &CountryYear, layer: &str, indicator: &IndicatorDescriptor) -> PathBuf {
    dir.join(format!("{}_{}_{}_{}.csv", unit.country, unit.year, layer, indicator.short_name()))
}

/// Interpolate one indicator and write it as a GeoTIFF.
pub fn interpolate_to_file(
    table: &SurveyTable,
    indicator: &IndicatorDescriptor,
    country: &Boundary,
    population: &Raster<f64>,
    output: &Path,
) -> Result<Raster<f64>> {
    let samples = table.samples(indicator)?;
    check_indicator(&indicator.code, &samples)?;

    let raster = interpolate_indicator(&samples, country, population, LidwParams::default())
        .with_context(|| format!("Failed to interpolate {}", indicator.code))?;
    ensure_parent(output)?;
    write_geotiff(&raster, output, Some(GeoTiffOptions { force_geographic: true }))
        .with_context(|| format!("Failed to write {}", output.display()))?;
    debug!("{} written to {}", indicator.code, output.display());
    Ok(raster)
}

/// Leave-one-out validation of one indicator, records written as CSV.
pub fn validate_to_file(
    table: &SurveyTable,
    indicator: &IndicatorDescriptor,
    country: &Boundary,
    output: &Path,
) -> Result<ErrorSummary> {
    let samples = table.samples(indicator)?;
    check_indicator(&indicator.code, &samples)?;

    let records: Vec<ValidationRecord> = validate_leave_one_out(&samples, country.bounds())
        .with_context(|| format!("Failed to validate {}", indicator.code))?;
    ensure_parent(output)?;
    write_csv(&records, output).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(ErrorSummary::from_records(&records))
}

/// Zone estimates for one layer.
///
/// With a country boundary every occupied zone is also re-estimated with
/// its clusters withheld.
pub fn zones_to_file(
    table: &SurveyTable,
    indicator: &IndicatorDescriptor,
    zones: &[Zone],
    indicator_raster: &Raster<f64>,
    all_touched: bool,
    validate_within: Option<&Boundary>,
    output: &Path,
) -> Result<Vec<ZoneRow>> {
    let samples = table.samples(indicator)?;
    let (numerator, denominator) = table.counts(indicator)?;
    let membership = assign_clusters_to_zones(&samples, zones);
    let estimates = zone_estimates(zones, &membership, indicator_raster, &numerator, &denominator, all_touched);

    let validations: Vec<ZoneValidation> = match validate_within {
        Some(country) => membership
            .occupied_zones()
            .into_iter()
            .filter_map(|z| {
                let zone = &zones[z];
                match validate_leave_zone_out(
                    &samples,
                    country,
                    zone,
                    membership.clusters_of(z),
                    indicator_raster,
                    all_touched,
                ) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        warn!("zone {}: {}", zone.id, e);
                        None
                    }
                }
            })
            .collect(),
        None => Vec::new(),
    };

    let rows = zone_rows(&estimates, &validations);
    ensure_parent(output)?;
    write_csv(&rows, output).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(rows)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Run every indicator of one (country, year).
///
/// Missing inputs fail the unit; a failing indicator only yields a
/// "no result" row.
pub fn run_unit(config: &BatchConfig, indicators: &[IndicatorDescriptor], unit: &CountryYear) -> Result<UnitReport> {
    let survey_path = config.input_file(unit, &config.files.survey);
    let table = read_survey_csv(&survey_path).with_context(|| format!("Failed to read {}", survey_path.display()))?;
    let boundary_path = config.input_file(unit, &config.files.boundary);
    let country = read_boundary(&boundary_path).with_context(|| format!("Failed to read {}", boundary_path.display()))?;
    let population_path = config.input_file(unit, &config.files.population);
    let population: Raster<f64> =
        read_geotiff(&population_path).with_context(|| format!("Failed to read {}", population_path.display()))?;

    let layers = load_layers(config, unit);
    let out_dir = config.output_dir(unit);
    info!("{}: {} clusters, {} zone layers", unit, table.len(), layers.len());

    let mut report = UnitReport::default();
    for indicator in indicators {
        match run_indicator(config, unit, indicator, &table, &country, &population, &layers, &out_dir) {
            Ok((summary, zone_summaries)) => {
                report.summaries.push(summary);
                report.zone_summaries.extend(zone_summaries);
            }
            Err(e) => {
                warn!("{} {}: {:#}", unit, indicator.code, e);
                report.summaries.push(SummaryRow::no_result(unit, indicator, format!("{:#}", e)));
            }
        }
    }
    Ok(report)
}

fn load_layers<'a>(config: &'a BatchConfig, unit: &CountryYear) -> Vec<(&'a ZoneLayer, Vec<Zone>)> {
    config
        .zones
        .iter()
        .filter_map(|layer| {
            let path = config.input_file(unit, &layer.file);
            match read_zones(&path, &layer.id_property) {
                Ok(zones) => Some((layer, zones)),
                Err(e) => {
                    warn!("{}: zone layer {} skipped: {}", unit, layer.name, e);
                    None
                }
            }
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn run_indicator(
    config: &BatchConfig,
    unit: &CountryYear,
    indicator: &IndicatorDescriptor,
    table: &SurveyTable,
    country: &Boundary,
    population: &Raster<f64>,
    layers: &[(&ZoneLayer, Vec<Zone>)],
    out_dir: &Path,
) -> Result<(SummaryRow, Vec<ZoneSummaryRow>)> {
    let raster = interpolate_to_file(
        table,
        indicator,
        country,
        population,
        &indicator_raster_path(out_dir, unit, indicator),
    )?;
    let summary = validate_to_file(table, indicator, country, &validation_path(out_dir, unit, indicator))?;

    let mut zone_summaries = Vec::new();
    for (layer, zones) in layers {
        let rows = zones_to_file(
            table,
            indicator,
            zones,
            &raster,
            config.all_touched,
            layer.validate.then_some(country),
            &zone_path(out_dir, unit, &layer.name, indicator),
        )?;
        if layer.validate {
            zone_summaries.push(ZoneSummaryRow::new(unit, indicator, &layer.name, &rows));
        }
    }

    Ok((SummaryRow::from_summary(unit, indicator, &summary), zone_summaries))
}
