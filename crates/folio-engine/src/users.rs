//! Registry of known operators, loaded once per run.

use std::path::Path;

use serde_yaml::Value;

use folio_types::{FolioError, RemotePath, Result, UserRecord};
use folio_store::RemoteStore;

/// Name of the users document in the configured remote folder.
pub const USERS_DOCUMENT: &str = "config_users.yaml";

/// Read-only set of operators, in document order.
#[derive(Debug, Clone, Default)]
pub struct UserRegistry {
    users: Vec<UserRecord>,
}

fn config_error(message: impl Into<String>) -> FolioError {
    FolioError::Config(message.into())
}

fn record_from(value: Value, position: usize) -> Result<UserRecord> {
    if !value.is_mapping() {
        return Err(config_error(format!(
            "user entry {position} is not a mapping"
        )));
    }
    serde_yaml::from_value(value)
        .map_err(|e| config_error(format!("user entry {position}: {e}")))
}

/// Add `user`, replacing an earlier entry with the same name in place.
fn insert(users: &mut Vec<UserRecord>, user: UserRecord) {
    match users.iter_mut().find(|u| u.name == user.name) {
        Some(existing) => {
            tracing::warn!(name = %user.name, "duplicate user entry, keeping the later one");
            *existing = user;
        }
        None => users.push(user),
    }
}

impl UserRegistry {
    /// Build a registry; a repeated name keeps the later record.
    pub fn new(records: Vec<UserRecord>) -> Self {
        let mut users = Vec::with_capacity(records.len());
        for user in records {
            insert(&mut users, user);
        }
        Self { users }
    }

    /// Parse the users document.
    ///
    /// Accepts a multi-document stream with one mapping per document, or a
    /// single document holding a sequence of mappings. Empty documents are
    /// skipped. Names are unique; a repeated name keeps the later record.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let docs = folio_manifest::parse_documents(text)
            .map_err(|e| config_error(format!("{USERS_DOCUMENT}: {e}")))?;
        let mut records = Vec::new();
        for doc in docs {
            match doc {
                Value::Null => {}
                Value::Sequence(entries) => {
                    for entry in entries {
                        let position = records.len();
                        records.push(record_from(entry, position)?);
                    }
                }
                other => {
                    let position = records.len();
                    records.push(record_from(other, position)?);
                }
            }
        }
        let registry = Self::new(records);
        tracing::debug!(count = registry.users.len(), "loaded user registry");
        Ok(registry)
    }

    /// Fetch `config_users.yaml` from `folder` into `scratch` and parse it.
    pub async fn load(
        store: &dyn RemoteStore,
        folder: &RemotePath,
        scratch: &Path,
    ) -> Result<Self> {
        let local = store
            .download_file(folder, USERS_DOCUMENT, scratch)
            .await
            .map_err(|e| config_error(format!("cannot fetch users document: {e}")))?;
        let text = tokio::fs::read_to_string(&local)
            .await
            .map_err(|e| config_error(format!("cannot read {}: {e}", local.display())))?;
        Self::from_yaml(&text)
    }

    pub fn get(&self, name: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.name == name)
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn admins(&self) -> Vec<UserRecord> {
        self.users.iter().filter(|u| u.is_admin).cloned().collect()
    }

    /// Resolve a comma-separated list of names.
    ///
    /// Unknown names are dropped. When nothing matches, every admin is
    /// returned instead.
    pub fn resolve(&self, names: &str) -> Vec<UserRecord> {
        let mut resolved: Vec<UserRecord> = Vec::new();
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match self.get(name) {
                Some(user) if !resolved.iter().any(|r| r.name == user.name) => {
                    resolved.push(user.clone())
                }
                Some(_) => {}
                None => tracing::warn!(person = name, "unknown person in identity"),
            }
        }
        if resolved.is_empty() {
            return self.admins();
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USERS: &str = "\
name: don
emailAddress: don@example.org
mailLogs: true
isAdmin: true
---
name: sam
emailAddress: sam@example.org
---
name: ada
isAdmin: true
";

    fn names(users: &[UserRecord]) -> Vec<&str> {
        users.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn parses_multi_document_stream() {
        let registry = UserRegistry::from_yaml(USERS).unwrap();
        assert_eq!(names(registry.users()), vec!["don", "sam", "ada"]);
        let sam = registry.get("sam").unwrap();
        assert!(!sam.is_admin);
        assert!(!sam.mail_logs);
        assert_eq!(registry.get("ada").unwrap().email_address, "");
    }

    #[test]
    fn parses_single_sequence_document() {
        let registry =
            UserRegistry::from_yaml("- name: don\n  isAdmin: true\n- name: sam\n").unwrap();
        assert_eq!(names(registry.users()), vec!["don", "sam"]);
    }

    #[test]
    fn repeated_name_keeps_the_later_record() {
        let registry = UserRegistry::from_yaml(
            "name: don\nemailAddress: old@example.org\nisAdmin: true\n---\nname: sam\n---\nname: don\nemailAddress: new@example.org\nisAdmin: true\n",
        )
        .unwrap();
        assert_eq!(names(registry.users()), vec!["don", "sam"]);
        assert_eq!(registry.get("don").unwrap().email_address, "new@example.org");
        assert_eq!(names(&registry.admins()), vec!["don"]);
        assert_eq!(names(&registry.resolve("")), vec!["don"]);
    }

    #[test]
    fn rejects_entry_without_name() {
        let err = UserRegistry::from_yaml("emailAddress: x@example.org\n").unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn rejects_scalar_entry() {
        let err = UserRegistry::from_yaml("name: don\n---\njust text\n").unwrap_err();
        assert!(err.to_string().contains("not a mapping"));
    }

    #[test]
    fn resolve_keeps_order_and_drops_duplicates() {
        let registry = UserRegistry::from_yaml(USERS).unwrap();
        let resolved = registry.resolve(" sam , don,sam");
        assert_eq!(names(&resolved), vec!["sam", "don"]);
    }

    #[test]
    fn resolve_drops_unknown_names() {
        let registry = UserRegistry::from_yaml(USERS).unwrap();
        assert_eq!(names(&registry.resolve("sam,nobody")), vec!["sam"]);
    }

    #[test]
    fn resolve_falls_back_to_admins() {
        let registry = UserRegistry::from_yaml(USERS).unwrap();
        assert_eq!(names(&registry.resolve("")), vec!["don", "ada"]);
        assert_eq!(names(&registry.resolve("unknown")), vec!["don", "ada"]);
        assert_eq!(names(&registry.resolve(" , ")), vec!["don", "ada"]);
    }

    #[tokio::test]
    async fn load_fetches_from_store() {
        let remote = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(remote.path().join("admin")).unwrap();
        std::fs::write(remote.path().join("admin").join(USERS_DOCUMENT), USERS).unwrap();
        let store = folio_store::LocalStore::new(remote.path());
        let registry = UserRegistry::load(&store, &RemotePath::new("admin"), scratch.path())
            .await
            .unwrap();
        assert_eq!(registry.users().len(), 3);
    }

    #[tokio::test]
    async fn load_reports_missing_document_as_config_error() {
        let remote = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let store = folio_store::LocalStore::new(remote.path());
        let err = UserRegistry::load(&store, &RemotePath::new("admin"), scratch.path())
            .await
            .unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }
}
