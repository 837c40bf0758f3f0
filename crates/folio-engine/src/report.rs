//! Run outcome summary and its persistence next to the run log.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use folio_types::Result;

use crate::session::FolderFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    CompletedWithErrors,
    Aborted,
}

/// Outcome of one traversal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub top_folder: String,
    /// Folders whose manifest was executed, in order.
    pub visited: Vec<String>,
    pub failures: Vec<FolderFailure>,
    /// The error that aborted the run, if any.
    pub error: Option<String>,
    /// Folder where the aborting error was raised.
    #[serde(default)]
    pub failed_folder: Option<String>,
    pub log_requests: Vec<String>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.status != RunStatus::Aborted
    }

    /// Write the report as `run-<id>.json` in `dir`, creating `dir` if needed.
    pub async fn save(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("run-{}.json", self.run_id));
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!(path = %path.display(), "run report saved");
        Ok(path)
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let status = match self.status {
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed with errors",
            RunStatus::Aborted => "aborted",
        };
        let elapsed = self.finished_at - self.started_at;
        format!(
            "Run {status}: {} folder(s) processed, {} failure(s) in {}.{:03}s",
            self.visited.len(),
            self.failures.len(),
            elapsed.num_seconds(),
            elapsed.num_milliseconds().rem_euclid(1000)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(status: RunStatus) -> RunReport {
        let now = Utc::now();
        RunReport {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            status,
            top_folder: "top".into(),
            visited: vec!["top".into(), "top/Content".into()],
            failures: vec![FolderFailure {
                folder: "top/Content/B".into(),
                error: "boom".into(),
            }],
            error: None,
            failed_folder: None,
            log_requests: vec!["don".into()],
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_value(report(RunStatus::CompletedWithErrors)).unwrap();
        assert_eq!(json["status"], "completed_with_errors");
        assert_eq!(json["failures"][0]["folder"], "top/Content/B");
    }

    #[test]
    fn summary_counts_folders_and_failures() {
        let summary = report(RunStatus::CompletedWithErrors).summary();
        assert!(summary.starts_with("Run completed with errors: 2 folder(s) processed, 1 failure(s)"));
    }

    #[test]
    fn aborted_is_not_success() {
        assert!(!report(RunStatus::Aborted).is_success());
        assert!(report(RunStatus::Completed).is_success());
    }

    #[tokio::test]
    async fn save_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let original = report(RunStatus::Completed);
        let path = original.save(&dir.path().join("logs")).await.unwrap();
        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(loaded.run_id, original.run_id);
        assert_eq!(loaded.status, RunStatus::Completed);
    }
}
