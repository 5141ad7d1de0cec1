//! covmap CLI - survey coverage mapping on Voronoi neighbourhoods

mod config;
mod report;
mod tasks;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use covmap_core::io::{read_boundary, read_geotiff, read_indicator_list, read_survey_csv, read_zones, write_csv};
use covmap_core::{IndicatorDescriptor, Raster};
use covmap_parallel::{run_isolated, ProcessingMode, TaskOutcome};

use config::BatchConfig;
use report::{SummaryRow, ZoneSummaryRow};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "covmap")]
#[command(author, version, about = "Survey coverage mapping with local inverse-distance weighting", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Interpolate one indicator onto the population grid
    Interpolate {
        /// Survey cluster CSV
        survey: PathBuf,
        /// Country boundary GeoJSON
        country: PathBuf,
        /// Population GeoTIFF
        population: PathBuf,
        /// Output GeoTIFF
        output: PathBuf,
        /// Indicator column, e.g. cov_measles
        #[arg(short, long)]
        indicator: String,
    },
    /// Leave-one-out validation of one or more indicators
    Validate {
        /// Survey cluster CSV
        survey: PathBuf,
        /// Country boundary GeoJSON
        country: PathBuf,
        /// Output directory for per-indicator records and the summary
        output: PathBuf,
        /// Indicator column; repeat for several
        #[arg(short, long)]
        indicator: Vec<String>,
        /// Indicator list CSV (indicator,name)
        #[arg(long)]
        indicators: Option<PathBuf>,
        /// Country code written into the summary
        #[arg(long, default_value = "")]
        code: String,
        /// Survey year written into the summary
        #[arg(long, default_value = "")]
        year: String,
    },
    /// Zone estimates from an interpolated raster and the survey
    Aggregate {
        /// Survey cluster CSV
        survey: PathBuf,
        /// Interpolated indicator GeoTIFF
        raster: PathBuf,
        /// Zone GeoJSON
        zones: PathBuf,
        /// Output CSV
        output: PathBuf,
        /// Indicator column
        #[arg(short, long)]
        indicator: String,
        /// Zone id property
        #[arg(long, default_value = "id")]
        id_property: String,
        /// Mask every pixel the zone touches
        #[arg(long)]
        all_touched: bool,
        /// Country boundary GeoJSON; enables leave-zone-out validation
        #[arg(long)]
        country: Option<PathBuf>,
    },
    /// Run every unit of a TOML batch configuration
    Batch {
        /// Configuration file
        config: PathBuf,
        /// Override the configured worker count
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn indicator_list(codes: &[String], list: Option<&Path>) -> Result<Vec<IndicatorDescriptor>> {
    let mut indicators = match list {
        Some(path) => read_indicator_list(path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => Vec::new(),
    };
    indicators.extend(codes.iter().map(|c| IndicatorDescriptor::from_code(c.as_str(), None)));
    if indicators.is_empty() {
        anyhow::bail!("No indicator given. Use --indicator or --indicators.");
    }
    Ok(indicators)
}

fn run_batch(config: &BatchConfig, workers: Option<usize>) -> Result<()> {
    let indicators = read_indicator_list(&config.indicators)
        .with_context(|| format!("Failed to read {}", config.indicators.display()))?;
    let mode = ProcessingMode::from_workers(workers.unwrap_or(config.workers));

    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Processing {} units...", config.units.len()));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    let outcomes = run_isolated(mode, &config.units, |unit| tasks::run_unit(config, &indicators, unit))
        .context("Failed to start workers")?;
    pb.finish_and_clear();

    let mut summaries: Vec<SummaryRow> = Vec::new();
    let mut zone_summaries: Vec<ZoneSummaryRow> = Vec::new();
    let mut failed = 0usize;
    for (unit, outcome) in config.units.iter().zip(outcomes) {
        match outcome {
            TaskOutcome::Completed(report) => {
                summaries.extend(report.summaries);
                zone_summaries.extend(report.zone_summaries);
            }
            other => {
                failed += 1;
                let reason = other.reason().unwrap_or_default().to_string();
                summaries.extend(indicators.iter().map(|ind| SummaryRow::no_result(unit, ind, reason.clone())));
            }
        }
    }

    std::fs::create_dir_all(&config.result_root)
        .with_context(|| format!("Failed to create {}", config.result_root.display()))?;
    let summary_path = config.result_root.join("validation_summary.csv");
    write_csv(&summaries, &summary_path).context("Failed to write validation summary")?;
    if !zone_summaries.is_empty() {
        write_csv(&zone_summaries, config.result_root.join("zone_validation_summary.csv"))
            .context("Failed to write zone validation summary")?;
    }

    println!(
        "{} units processed, {} failed; summary saved to: {}",
        config.units.len() - failed,
        failed,
        summary_path.display()
    );
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let (min_x, min_y, max_x, max_y) = raster.bounds();
            let stats = raster.summary();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, rows * cols);
            println!("Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})", min_x, min_y, max_x, max_y);
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean() {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / (rows * cols).max(1) as f64
            );
        }

        // ── Interpolate ──────────────────────────────────────────────
        Commands::Interpolate {
            survey,
            country,
            population,
            output,
            indicator,
        } => {
            let table = read_survey_csv(&survey).with_context(|| format!("Failed to read {}", survey.display()))?;
            let boundary = read_boundary(&country).with_context(|| format!("Failed to read {}", country.display()))?;
            let population = read_raster(&population)?;
            let indicator = IndicatorDescriptor::from_code(indicator, None);

            let start = Instant::now();
            let pb = spinner("Interpolating...");
            tasks::interpolate_to_file(&table, &indicator, &boundary, &population, &output)?;
            pb.finish_and_clear();
            done("LIDW raster", &output, start.elapsed());
        }

        // ── Validate ─────────────────────────────────────────────────
        Commands::Validate {
            survey,
            country,
            output,
            indicator,
            indicators,
            code,
            year,
        } => {
            let table = read_survey_csv(&survey).with_context(|| format!("Failed to read {}", survey.display()))?;
            let boundary = read_boundary(&country).with_context(|| format!("Failed to read {}", country.display()))?;
            let indicators = indicator_list(&indicator, indicators.as_deref())?;
            let unit = config::CountryYear { country: code, year };

            std::fs::create_dir_all(&output).with_context(|| format!("Failed to create {}", output.display()))?;

            let start = Instant::now();
            let mut rows = Vec::with_capacity(indicators.len());
            for ind in &indicators {
                let pb = spinner(&format!("Validating {}...", ind.code));
                let path = output.join(format!("{}_VAL2.csv", ind.short_name()));
                let row = match tasks::validate_to_file(&table, ind, &boundary, &path) {
                    Ok(summary) => SummaryRow::from_summary(&unit, ind, &summary),
                    Err(e) => {
                        tracing::warn!("{}: {:#}", ind.code, e);
                        SummaryRow::no_result(&unit, ind, format!("{:#}", e))
                    }
                };
                pb.finish_and_clear();
                println!(
                    "{:<24} n={:<5} bias={:>8.4} mae={:>8.4} rmse={:>8.4} p95={:>6.3}",
                    ind.code, row.total, row.bias, row.mae, row.rmse, row.p95_coverage
                );
                rows.push(row);
            }
            let summary_path = output.join("validation_summary.csv");
            write_csv(&rows, &summary_path).context("Failed to write validation summary")?;
            done("Validation summary", &summary_path, start.elapsed());
        }

        // ── Aggregate ────────────────────────────────────────────────
        Commands::Aggregate {
            survey,
            raster,
            zones,
            output,
            indicator,
            id_property,
            all_touched,
            country,
        } => {
            let table = read_survey_csv(&survey).with_context(|| format!("Failed to read {}", survey.display()))?;
            let raster = read_raster(&raster)?;
            let zones = read_zones(&zones, &id_property).with_context(|| format!("Failed to read {}", zones.display()))?;
            let indicator = IndicatorDescriptor::from_code(indicator, None);
            let boundary = match &country {
                Some(path) => Some(read_boundary(path).with_context(|| format!("Failed to read {}", path.display()))?),
                None => None,
            };
            info!("{} zones", zones.len());

            let start = Instant::now();
            let pb = spinner("Aggregating...");
            let rows = tasks::zones_to_file(&table, &indicator, &zones, &raster, all_touched, boundary.as_ref(), &output)?;
            pb.finish_and_clear();
            let with_clusters = rows.iter().filter(|r| r.clusters > 0).count();
            println!("{} zones, {} with survey clusters", rows.len(), with_clusters);
            done("Zone table", &output, start.elapsed());
        }

        // ── Batch ────────────────────────────────────────────────────
        Commands::Batch { config, workers } => {
            let start = Instant::now();
            let config = BatchConfig::from_path(&config)?;
            run_batch(&config, workers)?;
            println!("  Processing time: {:.2?}", start.elapsed());
        }
    }

    Ok(())
}
