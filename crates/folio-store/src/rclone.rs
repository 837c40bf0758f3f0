use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use folio_types::{RemotePath, Result};

use crate::remote::{remote_error, RemoteStore};

/// Default rclone remote name for the content store.
pub const DEFAULT_REMOTE: &str = "sst_store";

/// A remote store reached through the `rclone` command-line tool.
#[derive(Debug, Clone)]
pub struct RcloneStore {
    binary: PathBuf,
    remote_name: String,
}

impl RcloneStore {
    pub fn new(remote_name: impl Into<String>) -> Self {
        Self {
            binary: PathBuf::from("rclone"),
            remote_name: remote_name.into(),
        }
    }

    /// Use a specific rclone executable instead of the one on `PATH`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// `remote:path` spelling of a remote path.
    pub fn remote_spec(&self, path: &RemotePath) -> String {
        format!("{}:{}", self.remote_name, path)
    }

    pub(crate) fn list_args(&self, dir: &RemotePath, dirs_only: bool) -> Vec<String> {
        let filter = if dirs_only {
            "--dirs-only"
        } else {
            "--files-only"
        };
        vec![
            "lsf".to_string(),
            "--max-depth".to_string(),
            "1".to_string(),
            filter.to_string(),
            self.remote_spec(dir),
        ]
    }

    pub(crate) fn copy_args(&self, source: &RemotePath, local_dir: &Path) -> Vec<String> {
        vec![
            "copy".to_string(),
            "--max-depth".to_string(),
            "1".to_string(),
            self.remote_spec(source),
            local_dir.display().to_string(),
        ]
    }

    async fn run(&self, operation: &str, path: &RemotePath, args: Vec<String>) -> Result<String> {
        tracing::debug!(operation, %path, ?args, "rclone");
        let output = tokio::process::Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| remote_error(operation, path, format!("failed to run rclone: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(remote_error(
                operation,
                path,
                format!(
                    "rclone exited with {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse `rclone lsf` output into bare names.
pub(crate) fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim().trim_end_matches('/'))
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

#[async_trait]
impl RemoteStore for RcloneStore {
    async fn list_files(&self, dir: &RemotePath) -> Result<Vec<String>> {
        let stdout = self.run("list", dir, self.list_args(dir, false)).await?;
        Ok(parse_listing(&stdout))
    }

    async fn list_directories(&self, dir: &RemotePath) -> Result<Vec<String>> {
        let stdout = self.run("list", dir, self.list_args(dir, true)).await?;
        Ok(parse_listing(&stdout))
    }

    async fn download_file(
        &self,
        dir: &RemotePath,
        name: &str,
        local_dir: &Path,
    ) -> Result<PathBuf> {
        let source = dir.join(name);
        tokio::fs::create_dir_all(local_dir).await?;
        self.run("download", &source, self.copy_args(&source, local_dir))
            .await?;
        let target = local_dir.join(name);
        // rclone copy of a missing file exits cleanly without producing it
        if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(remote_error("download", &source, "file not found"));
        }
        Ok(target)
    }

    async fn download_directory(&self, dir: &RemotePath, local_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(local_dir).await?;
        self.run("download", dir, self.copy_args(dir, local_dir))
            .await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("rclone:{}", self.remote_name)
    }
}
