//! Batch configuration
//!
//! A TOML file names the data and result roots, the (country, year) units
//! and the zone layers to aggregate over. File names are templates in
//! which `{country}` and `{year}` are substituted per unit.
//!
//! ```toml
//! data_root = "data"
//! result_root = "results"
//! indicators = "data/indicators.csv"
//! workers = 4
//!
//! [[units]]
//! country = "GH"
//! year = "2014"
//!
//! [[zones]]
//! name = "settlement"
//! file = "{country}_settlements.geojson"
//! id_property = "settl_id"
//! validate = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub data_root: PathBuf,
    pub result_root: PathBuf,
    /// Indicator list CSV (`indicator,name`)
    pub indicators: PathBuf,
    /// Concurrent units; 0 uses every core
    #[serde(default)]
    pub workers: usize,
    /// Zone masks include every pixel the polygon touches
    #[serde(default)]
    pub all_touched: bool,
    #[serde(default)]
    pub files: InputFiles,
    #[serde(default)]
    pub zones: Vec<ZoneLayer>,
    pub units: Vec<CountryYear>,
}

/// File name templates inside `<data_root>/<country>/<year>/`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputFiles {
    pub survey: String,
    pub boundary: String,
    pub population: String,
}

impl Default for InputFiles {
    fn default() -> Self {
        Self {
            survey: "{country}_DHS_{year}.csv".into(),
            boundary: "{country}_boundary.geojson".into(),
            population: "{country}_population_{year}.tif".into(),
        }
    }
}

/// Zone layer aggregated for every unit
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneLayer {
    pub name: String,
    pub file: String,
    #[serde(default = "default_id_property")]
    pub id_property: String,
    /// Also withhold each zone's clusters and re-estimate it
    #[serde(default)]
    pub validate: bool,
}

fn default_id_property() -> String {
    "id".into()
}

/// One survey: a country and the year it was run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryYear {
    pub country: String,
    pub year: String,
}

impl fmt::Display for CountryYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.country, self.year)
    }
}

impl CountryYear {
    /// Substitute `{country}` and `{year}` in a file name template.
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{country}", &self.country)
            .replace("{year}", &self.year)
    }
}

impl BatchConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: BatchConfig = toml::from_str(text)?;
        if config.units.is_empty() {
            anyhow::bail!("no units listed");
        }
        if let Some(layer) = config.zones.iter().find(|z| z.name.is_empty()) {
            anyhow::bail!("zone layer {} has no name", layer.file);
        }
        Ok(config)
    }

    pub fn input_dir(&self, unit: &CountryYear) -> PathBuf {
        self.data_root.join(&unit.country).join(&unit.year)
    }

    pub fn output_dir(&self, unit: &CountryYear) -> PathBuf {
        self.result_root.join(&unit.country).join(&unit.year)
    }

    pub fn input_file(&self, unit: &CountryYear, template: &str) -> PathBuf {
        self.input_dir(unit).join(unit.expand(template))
    }
}
