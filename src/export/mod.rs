use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::info;

use crate::config::CountryConfig;
use crate::error::{PipelineError, WriteError};
use crate::fetch;
use crate::process::{self, Frame, METRIC_STAGES};

/// One published row. Field order is the published column order; the serde
/// renames are the published header names.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRecord {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Daily change in cumulative total")]
    pub daily_change: i64,
    #[serde(rename = "Positive rate")]
    pub positive_rate: Option<f64>,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Units")]
    pub units: String,
    #[serde(rename = "Notes")]
    pub notes: Option<String>,
    #[serde(rename = "Source URL")]
    pub source_url: String,
    #[serde(rename = "Source label")]
    pub source_label: String,
}

/// Attach the constant metadata columns. The working `positive` counter is
/// dropped here; it only existed to feed the rolling rate.
pub fn annotate(frame: Frame, config: &CountryConfig) -> Vec<OutputRecord> {
    frame
        .into_iter()
        .map(|row| OutputRecord {
            date: row.date,
            daily_change: row.daily_change,
            positive_rate: row.positive_rate,
            country: config.location.to_string(),
            units: config.units.to_string(),
            notes: config.notes.map(str::to_string),
            source_url: config.source_url_ref.to_string(),
            source_label: config.source_label.to_string(),
        })
        .collect()
}

/// Output file for a country: `<out_dir>/<location>.csv`.
pub fn output_path(out_dir: &Path, config: &CountryConfig) -> PathBuf {
    out_dir.join(format!("{}.csv", config.location))
}

/// Serialize the table, overwriting any previous file at `path`.
pub fn write_csv(records: &[OutputRecord], path: &Path) -> Result<(), WriteError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(|source| WriteError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    for record in records {
        writer.serialize(record).map_err(|source| WriteError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer.flush().map_err(|source| WriteError::Flush {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// One full run: fetch the feed, normalize, run the metric stages, annotate
/// and write the country sheet. Returns the path written.
pub fn export(
    client: &Client,
    config: &CountryConfig,
    out_dir: &Path,
) -> Result<PathBuf, PipelineError> {
    let raw = fetch::read(client, config)?;
    let frame = process::run_stages(process::normalize(raw), METRIC_STAGES);
    let records = annotate(frame, config);

    let path = output_path(out_dir, config);
    write_csv(&records, &path)?;
    info!(rows = records.len(), path = %path.display(), "wrote country sheet");
    Ok(path)
}
