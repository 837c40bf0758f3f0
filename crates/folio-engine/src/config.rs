//! `folio.toml` configuration.
//!
//! ```toml
//! [remote]
//! name = "sst_store"
//! top_folder = "SST Management"
//! users_folder = "SST Management/admin"
//!
//! [run]
//! command_prefix = ""
//! dry_run = false
//!
//! [profiles.don]
//! temp_directory = "/tmp/folio"
//! logs_directory = "/var/log/folio"
//! site_directory = "/srv/site"
//! support_directory = "/srv/support"
//! docx_directory = "/srv/docx"
//! image_directory = "/srv/site/images"
//! gallery_directory = "/srv/site/galleries"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use folio_types::{FolioError, RemotePath, Result};

use crate::delegate::OutputPaths;

fn default_remote_name() -> String {
    folio_store::DEFAULT_REMOTE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// rclone remote name.
    #[serde(default = "default_remote_name")]
    pub name: String,
    pub top_folder: String,
    pub users_folder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub command_prefix: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

/// Local directories of one operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub temp_directory: PathBuf,
    pub logs_directory: PathBuf,
    pub site_directory: PathBuf,
    pub support_directory: PathBuf,
    pub docx_directory: PathBuf,
    pub image_directory: PathBuf,
    pub gallery_directory: PathBuf,
}

impl Profile {
    pub fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            docx: self.docx_directory.clone(),
            site: self.site_directory.clone(),
            image: self.image_directory.clone(),
            gallery: self.gallery_directory.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolioConfig {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl FolioConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| FolioError::Config(format!("TOML parse error: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            FolioError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| FolioError::Config(format!("no profile named '{name}'")))
    }

    pub fn top_folder(&self) -> RemotePath {
        RemotePath::new(&self.remote.top_folder)
    }

    pub fn users_folder(&self) -> RemotePath {
        RemotePath::new(&self.remote.users_folder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[remote]
top_folder = "SST Management"
users_folder = "SST Management/admin"

[run]
command_prefix = "don_"

[profiles.don]
temp_directory = "/tmp/folio"
logs_directory = "/var/log/folio"
site_directory = "/srv/site"
support_directory = "/srv/support"
docx_directory = "/srv/docx"
image_directory = "/srv/site/images"
gallery_directory = "/srv/site/galleries"
"#;

    #[test]
    fn parses_sample_with_defaults() {
        let config = FolioConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.remote.name, "sst_store");
        assert_eq!(config.run.command_prefix.as_deref(), Some("don_"));
        assert!(!config.run.dry_run);
        assert_eq!(config.top_folder().segments(), ["SST Management"]);
        let outputs = config.profile("don").unwrap().output_paths();
        assert_eq!(outputs.site, PathBuf::from("/srv/site"));
    }

    #[test]
    fn unknown_profile_is_config_error() {
        let config = FolioConfig::from_toml_str(SAMPLE).unwrap();
        let err = config.profile("sam").unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: no profile named 'sam'");
    }

    #[test]
    fn missing_remote_table_is_rejected() {
        let err = FolioConfig::from_toml_str("[run]\ndry_run = true\n").unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        assert!(FolioConfig::load(&path).unwrap().profiles.contains_key("don"));
        assert!(FolioConfig::load(&dir.path().join("nope.toml")).is_err());
    }
}
