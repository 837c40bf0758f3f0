//! Per-run mutable state threaded through the traversal.

use serde::{Deserialize, Serialize};

use folio_types::{RemotePath, UserRecord};

/// Where the traversal is. `current_folder` always lies beneath
/// `top_folder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalState {
    pub top_folder: RemotePath,
    pub current_folder: RemotePath,
}

impl TraversalState {
    pub fn new(top_folder: RemotePath) -> Self {
        Self {
            current_folder: top_folder.clone(),
            top_folder,
        }
    }

    /// Narrow the traversal root for the rest of the run.
    pub fn change_folder(&mut self, folder: &str) {
        self.top_folder = self.top_folder.join(folder);
        self.current_folder = self.top_folder.clone();
    }
}

/// One `identity` command as executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEntry {
    pub folder: RemotePath,
    pub person: Option<String>,
    pub send_log: bool,
    pub users: Vec<UserRecord>,
}

/// Identity entries in execution order. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct IdentityLog {
    entries: Vec<IdentityEntry>,
}

impl IdentityLog {
    pub fn push(&mut self, entry: IdentityEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[IdentityEntry] {
        &self.entries
    }

    /// The `person` value of every entry that asked for the log.
    pub fn log_requests(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.send_log)
            .filter_map(|e| e.person.clone())
            .collect()
    }

    /// Resolved operators that should receive the run log, without repeats.
    pub fn log_recipients(&self) -> Vec<UserRecord> {
        let mut recipients: Vec<UserRecord> = Vec::new();
        for user in self
            .entries
            .iter()
            .filter(|e| e.send_log)
            .flat_map(|e| e.users.iter())
        {
            if !recipients.iter().any(|r| r.name == user.name) {
                recipients.push(user.clone());
            }
        }
        recipients
    }
}

/// A content failure isolated at an `all` boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderFailure {
    pub folder: String,
    pub error: String,
}

/// Mutable state of one run.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub traversal: TraversalState,
    pub identity: IdentityLog,
    /// Folders whose manifest was executed, in order.
    pub visited: Vec<RemotePath>,
    pub failures: Vec<FolderFailure>,
    /// Deepest folder whose processing raised the error still propagating.
    pub failed_folder: Option<RemotePath>,
}

impl RunSession {
    pub fn new(top_folder: RemotePath) -> Self {
        Self {
            traversal: TraversalState::new(top_folder),
            identity: IdentityLog::default(),
            visited: Vec::new(),
            failures: Vec::new(),
            failed_folder: None,
        }
    }

    pub fn get_log_requests(&self) -> Vec<String> {
        self.identity.log_requests()
    }
}
