use std::path::{Path, PathBuf};

use async_trait::async_trait;

use folio_types::{FolioError, RemotePath, Result};

/// Abstraction over the remote content store the interpreter walks.
///
/// Every call blocks the traversal until it completes; implementations do
/// not retry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Names of the files directly inside `dir`.
    async fn list_files(&self, dir: &RemotePath) -> Result<Vec<String>>;

    /// Names of the directories directly inside `dir`, in store order.
    async fn list_directories(&self, dir: &RemotePath) -> Result<Vec<String>>;

    /// Copy `dir/name` into `local_dir`, returning the local file path.
    async fn download_file(&self, dir: &RemotePath, name: &str, local_dir: &Path)
        -> Result<PathBuf>;

    /// Copy the files directly inside `dir` into `local_dir`.
    async fn download_directory(&self, dir: &RemotePath, local_dir: &Path) -> Result<()>;

    /// Short human-readable description used in log lines.
    fn describe(&self) -> String;
}

pub(crate) fn remote_error(
    operation: &str,
    path: impl std::fmt::Display,
    message: impl std::fmt::Display,
) -> FolioError {
    FolioError::Remote {
        operation: operation.to_string(),
        path: path.to_string(),
        message: message.to_string(),
    }
}
