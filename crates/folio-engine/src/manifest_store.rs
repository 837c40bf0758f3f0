//! Fetching and parsing the manifest of one folder.

use std::path::Path;
use std::sync::Arc;

use folio_manifest::{manifest_file_name, Manifest};
use folio_store::RemoteStore;
use folio_types::{FolioError, RemotePath, Result};

/// Loads manifests from the remote store through one reusable scratch
/// directory. The directory is emptied before every fetch.
pub struct ManifestStore {
    store: Arc<dyn RemoteStore>,
    scratch: tempfile::TempDir,
}

impl ManifestStore {
    /// Create a store whose scratch directory lives under `temp_root`.
    pub fn new(store: Arc<dyn RemoteStore>, temp_root: &Path) -> Result<Self> {
        std::fs::create_dir_all(temp_root)?;
        let scratch = tempfile::Builder::new()
            .prefix("cmd")
            .tempdir_in(temp_root)?;
        Ok(Self { store, scratch })
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    async fn clear_scratch(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(self.scratch.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(entry.path()).await?;
            } else {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    /// Fetch the raw text of `<prefix>commands.txt` in `folder`.
    ///
    /// A missing or blank manifest is `ManifestMissing`.
    pub async fn fetch_text(&self, folder: &RemotePath, prefix: &str) -> Result<String> {
        let name = manifest_file_name(prefix);
        let missing = || FolioError::ManifestMissing {
            folder: folder.to_string(),
        };

        self.clear_scratch().await?;
        let files = self.store.list_files(folder).await?;
        if !files.iter().any(|f| *f == name) {
            return Err(missing());
        }
        let local = self
            .store
            .download_file(folder, &name, self.scratch.path())
            .await?;
        let text = tokio::fs::read_to_string(&local).await?;
        if text.trim().is_empty() {
            return Err(missing());
        }
        Ok(text)
    }

    /// Fetch, validate and parse the manifest of `folder`.
    pub async fn load(&self, folder: &RemotePath, prefix: &str) -> Result<Manifest> {
        let text = self.fetch_text(folder, prefix).await?;
        let manifest = folio_manifest::parse(&text, &folder.to_string())?;
        tracing::debug!(
            folder = %folder,
            command_set = %manifest.command_set,
            commands = manifest.commands.len(),
            "loaded manifest"
        );
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_manifest::CommandSet;
    use folio_store::LocalStore;

    struct Fixture {
        remote: tempfile::TempDir,
        temp: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                remote: tempfile::tempdir().unwrap(),
                temp: tempfile::tempdir().unwrap(),
            }
        }

        fn write(&self, path: &str, text: &str) {
            let full = self.remote.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, text).unwrap();
        }

        fn store(&self) -> ManifestStore {
            ManifestStore::new(
                Arc::new(LocalStore::new(self.remote.path())),
                self.temp.path(),
            )
            .unwrap()
        }
    }

    #[tokio::test]
    async fn loads_and_parses_manifest() {
        let fx = Fixture::new();
        fx.write("top/commands.txt", "command_set: top\n---\ncommand: change_folder\nfolder: Test\n");
        let manifest = fx.store().load(&RemotePath::new("top"), "").await.unwrap();
        assert_eq!(manifest.command_set, CommandSet::Top);
        assert_eq!(manifest.command_names(), vec!["change_folder"]);
    }

    #[tokio::test]
    async fn applies_prefix_to_manifest_name() {
        let fx = Fixture::new();
        fx.write("top/commands.txt", "command_set: content\n---\ncommand: all\n");
        fx.write("top/don_commands.txt", "command_set: top\n---\ncommand: identity\n");
        let manifest = fx.store().load(&RemotePath::new("top"), "don_").await.unwrap();
        assert_eq!(manifest.command_set, CommandSet::Top);
    }

    #[tokio::test]
    async fn missing_manifest_is_reported() {
        let fx = Fixture::new();
        fx.write("top/meta.txt", "title: x\n");
        let err = fx.store().load(&RemotePath::new("top"), "").await.unwrap_err();
        assert!(matches!(err, FolioError::ManifestMissing { ref folder } if folder == "top"));
    }

    #[tokio::test]
    async fn blank_manifest_is_missing() {
        let fx = Fixture::new();
        fx.write("top/commands.txt", "\n  \n");
        let err = fx.store().load(&RemotePath::new("top"), "").await.unwrap_err();
        assert!(matches!(err, FolioError::ManifestMissing { .. }));
    }

    #[tokio::test]
    async fn invalid_manifest_carries_diagnostics() {
        let fx = Fixture::new();
        fx.write("top/commands.txt", "command: all\n");
        let err = fx.store().load(&RemotePath::new("top"), "").await.unwrap_err();
        match err {
            FolioError::ManifestInvalid { folder, diagnostics } => {
                assert_eq!(folder, "top");
                assert!(!diagnostics.is_empty());
            }
            other => panic!("expected ManifestInvalid, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scratch_is_cleared_between_loads() {
        let fx = Fixture::new();
        fx.write("a/commands.txt", "command_set: story\n---\ncommand: story\n");
        fx.write("b/don_commands.txt", "command_set: story\n---\ncommand: story\n");
        let store = fx.store();
        store.load(&RemotePath::new("a"), "").await.unwrap();
        store.load(&RemotePath::new("b"), "don_").await.unwrap();
        let names: Vec<_> = std::fs::read_dir(store.scratch_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["don_commands.txt"]);
    }
}
