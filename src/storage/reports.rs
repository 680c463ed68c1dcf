//! Report Persistence
//!
//! The finished report crosses a persistence boundary the core does not
//! own. A JSON-file sink ships for local runs and tests; a relational
//! store would implement the same trait behind an API service.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::models::report::AssessmentReport;
use crate::utils::error::AppResult;
use crate::utils::paths::ensure_dir;

/// Destination for finished assessment reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist one report, returning a locator (path, URI, row id) for it
    async fn persist(&self, report: &AssessmentReport) -> AppResult<String>;
}

/// Writes one pretty-printed JSON file per run under a directory
#[derive(Debug)]
pub struct JsonFileSink {
    dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

/// Keep subject ids filesystem-safe without losing readability
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    async fn persist(&self, report: &AssessmentReport) -> AppResult<String> {
        ensure_dir(&self.dir)?;
        let filename = format!("{}_{}.json", sanitize(&report.subject_id), report.run_id);
        let path = self.dir.join(filename);
        let content = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&path, content).await?;
        info!(path = %path.display(), "Report persisted");
        Ok(path.display().to_string())
    }
}
