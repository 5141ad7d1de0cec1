//! Survey cluster data model
//!
//! One survey table holds every cluster of a country-year. Indicator
//! columns are ratios in [0, 1] (or NaN); `num_*` / `den_*` columns carry
//! the counts behind each ratio.

use crate::error::{Error, Result};
use geo::Coord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Column holding the cluster identifier
pub const CLUSTER_COLUMN: &str = "cluster";
/// Column holding the cluster longitude
pub const LONGITUDE_COLUMN: &str = "LNG";
/// Column holding the cluster latitude
pub const LATITUDE_COLUMN: &str = "LAT";
/// Column holding the urban/rural flag
pub const AREA_TYPE_COLUMN: &str = "URBAN_RURA";

/// Clusters geocoded this close to (0, 0) are treated as missing coordinates.
const SPURIOUS_COORDINATE_DEG: f64 = 1e-2;

/// Urban/rural classification of a survey cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AreaType {
    Urban,
    Rural,
}

impl AreaType {
    /// Displacement buffer radius in metres used to associate a cluster
    /// with settlements and administrative zones.
    pub fn buffer_radius_m(self) -> f64 {
        match self {
            AreaType::Urban => 2000.0,
            AreaType::Rural => 5000.0,
        }
    }

    /// Canonical one-letter code
    pub fn code(self) -> &'static str {
        match self {
            AreaType::Urban => "U",
            AreaType::Rural => "R",
        }
    }
}

impl FromStr for AreaType {
    type Err = String;

    /// Accepts `U`/`R`, `1`/`0` and `urban`/`rural`, case-insensitive.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "1" | "1.0" | "urban" => Ok(AreaType::Urban),
            "r" | "0" | "0.0" | "rural" => Ok(AreaType::Rural),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for AreaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A survey cluster with the observed value of one indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleLocation {
    /// Cluster identifier, unique within a survey
    pub cluster: i64,
    /// (longitude, latitude) in degrees
    pub coord: Coord<f64>,
    /// Observed indicator ratio, NaN when unknown
    pub value: f64,
    pub area_type: AreaType,
}

impl SampleLocation {
    pub fn new(cluster: i64, lon: f64, lat: f64, value: f64, area_type: AreaType) -> Self {
        Self {
            cluster,
            coord: Coord { x: lon, y: lat },
            value,
            area_type,
        }
    }
}

/// Names the columns belonging to one indicator.
///
/// Built once when the indicator list is loaded so call sites never derive
/// column names from the indicator code themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorDescriptor {
    /// Ratio column, e.g. `cov_measles`
    pub code: String,
    /// Count of positive responses, e.g. `num_measles`
    pub numerator_column: String,
    /// Count of eligible respondents, e.g. `den_measles`
    pub denominator_column: String,
    /// Human-readable name used in reports
    pub display_name: String,
}

impl IndicatorDescriptor {
    /// Derive the numerator/denominator columns from a `<prefix>_<name>` code.
    pub fn from_code(code: impl Into<String>, display_name: Option<String>) -> Self {
        let code = code.into();
        let suffix = code
            .split_once('_')
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_else(|| code.clone());
        Self {
            numerator_column: format!("num_{}", suffix),
            denominator_column: format!("den_{}", suffix),
            display_name: display_name.unwrap_or_else(|| code.clone()),
            code,
        }
    }

    /// Indicator name without its prefix, used in output file names
    pub fn short_name(&self) -> &str {
        self.code
            .split_once('_')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.code)
    }
}

/// All clusters of one survey, with every numeric column.
///
/// Rows are kept in file order after spurious coordinates are dropped; row
/// indices are stable for the lifetime of the table.
#[derive(Debug, Clone, Default)]
pub struct SurveyTable {
    clusters: Vec<i64>,
    coords: Vec<Coord<f64>>,
    area_types: Vec<AreaType>,
    columns: HashMap<String, Vec<f64>>,
}

impl SurveyTable {
    /// Parse a survey table from CSV text.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };
        let cluster_idx = position(CLUSTER_COLUMN)?;
        let lng_idx = position(LONGITUDE_COLUMN)?;
        let lat_idx = position(LATITUDE_COLUMN)?;
        let area_idx = position(AREA_TYPE_COLUMN)?;

        let value_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| ![cluster_idx, lng_idx, lat_idx, area_idx].contains(i))
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        let mut table = SurveyTable::default();
        for (_, name) in &value_columns {
            table.columns.insert(name.clone(), Vec::new());
        }

        let mut dropped = 0usize;
        for result in rdr.records() {
            let record = result?;
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let cluster: i64 = parse_number(field(cluster_idx))
                .filter(|v| v.is_finite())
                .map(|v| v as i64)
                .ok_or_else(|| Error::InvalidParameter {
                    name: CLUSTER_COLUMN,
                    value: field(cluster_idx).to_string(),
                    reason: "cluster id must be numeric".into(),
                })?;
            let lng = parse_number(field(lng_idx)).unwrap_or(f64::NAN);
            let lat = parse_number(field(lat_idx)).unwrap_or(f64::NAN);

            if !lng.is_finite() || !lat.is_finite() || is_spurious(lng, lat) {
                dropped += 1;
                continue;
            }

            let area_type = field(area_idx)
                .parse::<AreaType>()
                .map_err(|value| Error::InvalidAreaType { cluster, value })?;

            table.clusters.push(cluster);
            table.coords.push(Coord { x: lng, y: lat });
            table.area_types.push(area_type);
            for (i, name) in &value_columns {
                let v = parse_number(field(*i)).unwrap_or(f64::NAN);
                if let Some(col) = table.columns.get_mut(name) {
                    col.push(v);
                }
            }
        }

        if dropped > 0 {
            tracing::debug!("dropped {} clusters with missing or spurious coordinates", dropped);
        }

        Ok(table)
    }

    /// Number of clusters
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Cluster identifiers in row order
    pub fn clusters(&self) -> &[i64] {
        &self.clusters
    }

    /// Cluster coordinates in row order
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    /// Urban/rural flags in row order
    pub fn area_types(&self) -> &[AreaType] {
        &self.area_types
    }

    /// Whether a numeric column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Values of a numeric column in row order (NaN where empty)
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Every cluster as a sample of `column`, NaN values included.
    pub fn locations(&self, column: &str) -> Result<Vec<SampleLocation>> {
        let values = self.column(column)?;
        Ok(self
            .clusters
            .iter()
            .zip(&self.coords)
            .zip(&self.area_types)
            .zip(values)
            .map(|(((&cluster, &coord), &area_type), &value)| SampleLocation {
                cluster,
                coord,
                value,
                area_type,
            })
            .collect())
    }

    /// Clusters with a known value of `indicator`, in row order.
    pub fn samples(&self, indicator: &IndicatorDescriptor) -> Result<Vec<SampleLocation>> {
        Ok(self
            .locations(&indicator.code)?
            .into_iter()
            .filter(|s| s.value.is_finite())
            .collect())
    }

    /// Numerator and denominator counts on the rows kept by [`samples`],
    /// so that both vectors index like the samples.
    ///
    /// [`samples`]: SurveyTable::samples
    pub fn counts(&self, indicator: &IndicatorDescriptor) -> Result<(Vec<f64>, Vec<f64>)> {
        let ratio = self.column(&indicator.code)?;
        let numerator = self.column(&indicator.numerator_column)?;
        let denominator = self.column(&indicator.denominator_column)?;
        Ok(ratio
            .iter()
            .zip(numerator.iter().zip(denominator))
            .filter(|(r, _)| r.is_finite())
            .map(|(_, (&n, &d))| (n, d))
            .unzip())
    }
}

fn parse_number(s: &str) -> Option<f64> {
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    s.parse::<f64>().ok()
}

fn is_spurious(lng: f64, lat: f64) -> bool {
    lng.abs() < SPURIOUS_COORDINATE_DEG && lat.abs() < SPURIOUS_COORDINATE_DEG
}
