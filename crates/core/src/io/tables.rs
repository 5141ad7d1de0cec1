//! CSV tables: survey input, indicator lists and report output

use crate::error::{Error, Result};
use crate::survey::{IndicatorDescriptor, SurveyTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read a survey CSV file (one row per cluster).
pub fn read_survey_csv<P: AsRef<Path>>(path: P) -> Result<SurveyTable> {
    let file = File::open(path.as_ref())?;
    SurveyTable::from_reader(BufReader::new(file))
}

#[derive(Debug, Deserialize)]
struct IndicatorRow {
    indicator: String,
    #[serde(default)]
    name: Option<String>,
}

/// Read an indicator list with columns `indicator,name`.
///
/// Blank names fall back to the indicator code.
pub fn read_indicator_list<P: AsRef<Path>>(path: P) -> Result<Vec<IndicatorDescriptor>> {
    let mut rdr = csv::Reader::from_path(path.as_ref())?;
    let mut indicators = Vec::new();
    for row in rdr.deserialize() {
        let row: IndicatorRow = row?;
        let code = row.indicator.trim();
        if code.is_empty() {
            continue;
        }
        let name = row
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        indicators.push(IndicatorDescriptor::from_code(code, name));
    }
    if indicators.is_empty() {
        return Err(Error::EmptyInput(format!(
            "no indicators listed in {}",
            path.as_ref().display()
        )));
    }
    Ok(indicators)
}

/// Write serialisable rows as a headed CSV file.
pub fn write_csv<S, P>(rows: &[S], path: P) -> Result<()>
where
    S: Serialize,
    P: AsRef<Path>,
{
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
