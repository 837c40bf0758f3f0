//! The content collaborator that turns folders into published site content.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use folio_types::{RemotePath, Result};

/// Local output directories handed to the content collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    pub docx: PathBuf,
    pub site: PathBuf,
    pub image: PathBuf,
    pub gallery: PathBuf,
}

/// Everything needed to process one story folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRequest {
    pub folder: RemotePath,
    pub scratch_root: PathBuf,
    pub outputs: OutputPaths,
}

/// External collaborator invoked by the content-producing commands.
///
/// Any error returned here is treated as a content failure of the folder.
#[async_trait]
pub trait ContentDelegate: Send + Sync {
    /// Build site content from a story folder.
    async fn process_story(&self, request: &ContentRequest) -> Result<()>;

    /// Move the page files of `folder` into the site's `target_directory`.
    async fn move_page_files(&self, folder: &RemotePath, target_directory: &str) -> Result<()>;

    /// Apply the page-file actions for one file of `folder`.
    async fn update_page(&self, folder: &RemotePath, file: &str) -> Result<()>;
}

/// A delegate that only logs what it was asked to do.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDelegate;

#[async_trait]
impl ContentDelegate for LoggingDelegate {
    async fn process_story(&self, request: &ContentRequest) -> Result<()> {
        tracing::info!(
            folder = %request.folder,
            site = %request.outputs.site.display(),
            "would process story"
        );
        Ok(())
    }

    async fn move_page_files(&self, folder: &RemotePath, target_directory: &str) -> Result<()> {
        tracing::info!(folder = %folder, target_directory, "would move page files");
        Ok(())
    }

    async fn update_page(&self, folder: &RemotePath, file: &str) -> Result<()> {
        tracing::info!(folder = %folder, file, "would update page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_delegate_accepts_everything() {
        let delegate = LoggingDelegate;
        let folder = RemotePath::new("top/Content/A");
        let request = ContentRequest {
            folder: folder.clone(),
            scratch_root: PathBuf::from("/tmp"),
            outputs: OutputPaths::default(),
        };
        delegate.process_story(&request).await.unwrap();
        delegate.move_page_files(&folder, "pages/").await.unwrap();
        delegate.update_page(&folder, "index.md").await.unwrap();
    }

    #[test]
    fn request_serializes_folder_as_path() {
        let request = ContentRequest {
            folder: RemotePath::new("top/Content/A"),
            scratch_root: PathBuf::from("/tmp"),
            outputs: OutputPaths::default(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["folder"], "top/Content/A");
    }
}
