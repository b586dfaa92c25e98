//! JSON hand-off file for the downstream ranking step.
//!
//! One file per run, grouped by local date and named after the edition:
//! `{json_output_dir}/{local_date}/{time_of_day}.json`. A later run in the
//! same edition overwrites the earlier file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::CrawlError;
use crate::models::CrawlReport;

/// Where [`write_report`] puts `report` under `json_output_dir`.
pub fn report_path(report: &CrawlReport, json_output_dir: &Path) -> PathBuf {
    json_output_dir
        .join(&report.local_date)
        .join(format!("{}.json", report.time_of_day))
}

/// Serialize `report` to its dated file, creating directories as needed.
///
/// # Errors
///
/// [`CrawlError::Json`] if serialization fails and [`CrawlError::Io`] if the
/// directory or file cannot be written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir.display()))]
pub async fn write_report(
    report: &CrawlReport,
    json_output_dir: &Path,
) -> Result<PathBuf, CrawlError> {
    let json = serde_json::to_string_pretty(report)?;
    let path = report_path(report, json_output_dir);

    if let Some(dir) = path.parent() {
        info!(dir = %dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), articles = report.articles.len(), "Wrote crawl report");
    Ok(path)
}
