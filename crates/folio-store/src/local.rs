use std::path::{Path, PathBuf};

use async_trait::async_trait;

use folio_types::{RemotePath, Result};

use crate::remote::{remote_error, RemoteStore};

/// A remote store backed by a local directory tree.
///
/// Remote paths are resolved beneath `root`. Listings are sorted by name so
/// traversal order is stable.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a remote path beneath the root.
    fn resolve(&self, path: &RemotePath) -> PathBuf {
        path.segments()
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    async fn list(&self, dir: &RemotePath, want_dirs: bool) -> Result<Vec<String>> {
        let resolved = self.resolve(dir);
        let mut read_dir = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|e| remote_error("list", dir, e))?;
        let mut names = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| remote_error("list", dir, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| remote_error("list", dir, e))?;
            if file_type.is_dir() == want_dirs {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn list_files(&self, dir: &RemotePath) -> Result<Vec<String>> {
        self.list(dir, false).await
    }

    async fn list_directories(&self, dir: &RemotePath) -> Result<Vec<String>> {
        self.list(dir, true).await
    }

    async fn download_file(
        &self,
        dir: &RemotePath,
        name: &str,
        local_dir: &Path,
    ) -> Result<PathBuf> {
        let source = self.resolve(dir).join(name);
        tokio::fs::create_dir_all(local_dir).await?;
        let target = local_dir.join(name);
        tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| remote_error("download", dir.join(name), e))?;
        Ok(target)
    }

    async fn download_directory(&self, dir: &RemotePath, local_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(local_dir).await?;
        let source = self.resolve(dir);
        for name in self.list_files(dir).await? {
            tokio::fs::copy(source.join(&name), local_dir.join(&name))
                .await
                .map_err(|e| remote_error("download", dir.join(&name), e))?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::FolioError;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("top/Content");
        std::fs::create_dir_all(content.join("B")).unwrap();
        std::fs::create_dir_all(content.join("A")).unwrap();
        std::fs::write(content.join("commands.txt"), "command_set: content\n").unwrap();
        std::fs::write(content.join("meta.txt"), "title: x\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn lists_directories_sorted() {
        let dir = fixture();
        let store = LocalStore::new(dir.path());
        let dirs = store
            .list_directories(&RemotePath::new("top/Content"))
            .await
            .unwrap();
        assert_eq!(dirs, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn lists_files_only() {
        let dir = fixture();
        let store = LocalStore::new(dir.path());
        let files = store.list_files(&RemotePath::new("top/Content/")).await.unwrap();
        assert_eq!(files, vec!["commands.txt", "meta.txt"]);
    }

    #[tokio::test]
    async fn listing_missing_directory_is_remote_error() {
        let dir = fixture();
        let store = LocalStore::new(dir.path());
        let err = store
            .list_directories(&RemotePath::new("top/Nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Remote { ref operation, .. } if operation == "list"));
    }

    #[tokio::test]
    async fn downloads_file_into_local_dir() {
        let dir = fixture();
        let scratch = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let path = store
            .download_file(&RemotePath::new("top/Content"), "commands.txt", scratch.path())
            .await
            .unwrap();
        assert_eq!(path, scratch.path().join("commands.txt"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "command_set: content\n"
        );
    }

    #[tokio::test]
    async fn download_missing_file_fails() {
        let dir = fixture();
        let scratch = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store
            .download_file(&RemotePath::new("top/Content/A"), "commands.txt", scratch.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Remote { .. }));
    }

    #[tokio::test]
    async fn download_directory_copies_files_at_depth_one() {
        let dir = fixture();
        let scratch = tempfile::tempdir().unwrap();
        let target = scratch.path().join("copy");
        let store = LocalStore::new(dir.path());
        store
            .download_directory(&RemotePath::new("top/Content"), &target)
            .await
            .unwrap();
        let mut names: Vec<_> = std::fs::read_dir(&target)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["commands.txt", "meta.txt"]);
    }
}
