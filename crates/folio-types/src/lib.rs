//! Shared types, errors, and remote paths for the Folio interpreter.
//!
//! This crate provides the foundational types used across all other Folio crates:
//! - `FolioError` - unified error taxonomy (structural vs. content failures)
//! - `RemotePath` - normalized `/`-separated path into the remote content store
//! - `UserRecord` - one known operator of the system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error type for all Folio subsystems.
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    // === Manifest Errors ===
    #[error("No command manifest found in folder '{folder}'")]
    ManifestMissing { folder: String },

    #[error("Invalid command manifest in folder '{}': {}", .folder, .diagnostics.join("; "))]
    ManifestInvalid {
        folder: String,
        diagnostics: Vec<String>,
    },

    #[error("Unknown command_set '{0}'")]
    UnknownCommandSet(String),

    #[error("Command '{command}' is not allowed in command_set '{command_set}'")]
    UnknownCommand {
        command_set: String,
        command: String,
    },

    #[error("Command '{command}' has no handler in command_set '{command_set}'")]
    UnsupportedCommand {
        command_set: String,
        command: String,
    },

    #[error("Command '{command}' requires attribute '{attribute}'")]
    MissingAttribute { command: String, attribute: String },

    #[error("Folder '{folder}' is not a plain child path: {reason}")]
    InvalidFolder { folder: String, reason: String },

    #[error("Unrecognized folder_type '{folder_type}' for folder '{folder}'")]
    InvalidFolderType { folder: String, folder_type: String },

    // === Content Errors ===
    #[error("Content processing failed in '{folder}': {message}")]
    Content { folder: String, message: String },

    // === Remote Store Errors ===
    #[error("Remote {operation} failed for '{path}': {message}")]
    Remote {
        operation: String,
        path: String,
        message: String,
    },

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl FolioError {
    /// Returns `true` for failures confined to one folder's content. These are
    /// isolated at an `all` boundary; everything else aborts the subtree.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FolioError::Content { .. })
    }

    /// Returns `true` if the error aborts processing of the enclosing subtree.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Wrap any error raised while materializing or transforming `folder`.
    pub fn content(folder: &RemotePath, message: impl fmt::Display) -> Self {
        FolioError::Content {
            folder: folder.to_string(),
            message: message.to_string(),
        }
    }
}

/// A convenience alias for `Result<T, FolioError>`.
pub type Result<T> = std::result::Result<T, FolioError>;

// ---------------------------------------------------------------------------
// RemotePath - a location inside the remote content store
// ---------------------------------------------------------------------------

/// A `/`-separated path into the remote store.
///
/// Empty segments are dropped on construction, so `"a//b/"` and `"a/b"` are
/// the same path. A leading `/` is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RemotePath {
    rooted: bool,
    segments: Vec<String>,
}

impl RemotePath {
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref().trim();
        Self {
            rooted: path.starts_with('/'),
            segments: path
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// Append one or more segments (`child` may itself contain `/`).
    pub fn join(&self, child: impl AsRef<str>) -> Self {
        let mut joined = self.clone();
        joined.segments.extend(
            child
                .as_ref()
                .split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        );
        joined
    }

    /// The last segment, or `""` for the root.
    pub fn leaf(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or("")
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// `true` when no segment is `.` or `..`.
    pub fn is_normal(&self) -> bool {
        self.segments.iter().all(|s| s != "." && s != "..")
    }

    /// `true` when `self` equals `ancestor` or lies beneath it. Paths with
    /// `.` or `..` segments are never descendants.
    pub fn is_descendant_of(&self, ancestor: &RemotePath) -> bool {
        self.is_normal()
            && ancestor.is_normal()
            && self.rooted == ancestor.rooted
            && self.segments.len() >= ancestor.segments.len()
            && self.segments.starts_with(&ancestor.segments)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rooted {
            f.write_str("/")?;
        }
        f.write_str(&self.segments.join("/"))
    }
}

impl From<String> for RemotePath {
    fn from(value: String) -> Self {
        RemotePath::new(value)
    }
}

impl From<&str> for RemotePath {
    fn from(value: &str) -> Self {
        RemotePath::new(value)
    }
}

impl From<RemotePath> for String {
    fn from(value: RemotePath) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// UserRecord - a known operator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: String,
    #[serde(default)]
    pub email_address: String,
    #[serde(default)]
    pub mail_logs: bool,
    #[serde(default)]
    pub is_admin: bool,
}
