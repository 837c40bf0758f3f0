//! The traversal engine: recursive folder descent and command execution.
//!
//! A run starts at the top folder, loads its manifest, plans every command
//! against the folder's command-set, then executes them in order. Descent
//! commands recurse into child folders and always restore the current
//! folder afterwards. Content failures are isolated per child at an `all`
//! boundary; every other failure aborts the run.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use folio_manifest::{Command, MANIFEST_NAME};
use folio_store::RemoteStore;
use folio_types::{FolioError, RemotePath, Result};

use crate::delegate::{ContentDelegate, ContentRequest, OutputPaths};
use crate::dispatch::Dispatcher;
use crate::manifest_store::ManifestStore;
use crate::report::{RunReport, RunStatus};
use crate::session::{FolderFailure, IdentityEntry, RunSession};
use crate::users::UserRegistry;

/// Child folder skipped by `all`.
pub const IGNORED_FOLDER: &str = "ignore";

/// Files left alone by `process_pages`.
const PAGE_SKIP: [&str; 2] = ["meta.txt", MANIFEST_NAME];

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Local settings for a run.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Prefix of the top folder's manifest name (`""` for none).
    pub command_prefix: String,
    /// Parent of every scratch directory the engine creates.
    pub scratch_root: PathBuf,
    pub support_directory: PathBuf,
    pub outputs: OutputPaths,
    /// Skip local writes that bypass the content delegate.
    pub dry_run: bool,
}

/// Drives one traversal over the remote store.
pub struct TraversalEngine {
    manifests: ManifestStore,
    store: Arc<dyn RemoteStore>,
    users: UserRegistry,
    delegate: Arc<dyn ContentDelegate>,
    options: EngineOptions,
}

/// Keep content failures as they are and fold anything else raised while
/// handling a folder's content into one.
fn content_error(folder: &RemotePath, error: FolioError) -> FolioError {
    if error.is_recoverable() {
        error
    } else {
        FolioError::content(folder, error)
    }
}

fn escape_error(folder: &RemotePath, child: &str) -> FolioError {
    FolioError::InvalidFolder {
        folder: child.to_string(),
        reason: format!("leaves the traversal root from '{folder}'"),
    }
}

// ---------------------------------------------------------------------------
// TraversalEngine
// ---------------------------------------------------------------------------

impl TraversalEngine {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        users: UserRegistry,
        delegate: Arc<dyn ContentDelegate>,
        options: EngineOptions,
    ) -> Result<Self> {
        let manifests = ManifestStore::new(store.clone(), &options.scratch_root)?;
        Ok(Self {
            manifests,
            store,
            users,
            delegate,
            options,
        })
    }

    /// Run a full traversal from the session's top folder.
    pub async fn run(&self, session: &mut RunSession) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let top_folder = session.traversal.top_folder.to_string();
        tracing::info!(
            %run_id,
            top_folder = %top_folder,
            store = %self.store.describe(),
            dry_run = self.options.dry_run,
            "run started"
        );

        let (status, error) = match self.process_top(session).await {
            Ok(()) if session.failures.is_empty() => (RunStatus::Completed, None),
            Ok(()) => (RunStatus::CompletedWithErrors, None),
            Err(e) => {
                let failed = session
                    .failed_folder
                    .as_ref()
                    .unwrap_or(&session.traversal.current_folder);
                tracing::error!(folder = %failed, error = %e, "run aborted");
                (RunStatus::Aborted, Some(e.to_string()))
            }
        };

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            status,
            top_folder,
            visited: session.visited.iter().map(ToString::to_string).collect(),
            failures: session.failures.clone(),
            error,
            failed_folder: session.failed_folder.as_ref().map(ToString::to_string),
            log_requests: session.get_log_requests(),
        };
        tracing::info!(%run_id, status = ?report.status, "{}", report.summary());
        report
    }

    /// Process the top folder, reading its manifest under the command prefix.
    pub async fn process_top(&self, session: &mut RunSession) -> Result<()> {
        session.traversal.current_folder = session.traversal.top_folder.clone();
        session.failed_folder = None;
        self.process_folder(session, &self.options.command_prefix)
            .await
    }

    /// Process the session's current folder.
    pub async fn process(&self, session: &mut RunSession) -> Result<()> {
        self.process_folder(session, "").await
    }

    /// Runs one folder and remembers it as the failing folder when the
    /// error was raised here rather than in a descendant.
    async fn process_folder(&self, session: &mut RunSession, prefix: &str) -> Result<()> {
        let folder = session.traversal.current_folder.clone();
        let result = self.execute_manifest(session, prefix).await;
        if result.is_err() && session.failed_folder.is_none() {
            session.failed_folder = Some(folder);
        }
        result
    }

    async fn execute_manifest(&self, session: &mut RunSession, prefix: &str) -> Result<()> {
        let folder = session.traversal.current_folder.clone();
        let manifest = self
            .manifests
            .load(&folder, prefix)
            .await
            .inspect_err(|e| {
                tracing::error!(folder = %folder, error = %e, "cannot load manifest")
            })?;
        let plan = Dispatcher::plan(&manifest.commands, manifest.command_set).inspect_err(
            |e| tracing::error!(folder = %folder, error = %e, "invalid command"),
        )?;

        tracing::info!(
            folder = %folder,
            command_set = %manifest.command_set,
            commands = plan.len(),
            "processing folder"
        );
        session.visited.push(folder);
        for command in &plan {
            self.execute(command, session).await?;
        }
        Ok(())
    }

    async fn execute(&self, command: &Command, session: &mut RunSession) -> Result<()> {
        let folder = session.traversal.current_folder.clone();
        tracing::debug!(folder = %folder, command = %command, "executing");

        match command {
            Command::Identity { person, send_log } => {
                let users = person
                    .as_deref()
                    .map(|p| self.users.resolve(p))
                    .unwrap_or_default();
                tracing::info!(
                    folder = %folder,
                    person = person.as_deref().unwrap_or("-"),
                    send_log,
                    "identity"
                );
                session.identity.push(IdentityEntry {
                    folder,
                    person: person.clone(),
                    send_log: *send_log,
                    users,
                });
                Ok(())
            }
            Command::ChangeFolder { folder: child } => {
                let top = session.traversal.top_folder.clone();
                if !top.join(child).is_descendant_of(&top) {
                    return Err(escape_error(&top, child));
                }
                session.traversal.change_folder(child);
                tracing::info!(top_folder = %session.traversal.top_folder, "top folder changed");
                Ok(())
            }
            Command::SingleFolder {
                folder: child,
                folder_type,
            } => {
                tracing::debug!(folder = %folder, child = %child, ?folder_type, "descending");
                self.descend(session, child).await
            }
            Command::All => self.process_all(session).await,
            Command::ProcessStory => {
                let request = ContentRequest {
                    folder: folder.clone(),
                    scratch_root: self.options.scratch_root.clone(),
                    outputs: self.options.outputs.clone(),
                };
                self.delegate
                    .process_story(&request)
                    .await
                    .map_err(|e| content_error(&folder, e))
            }
            Command::MoveFiles { target_directory } => self
                .delegate
                .move_page_files(&folder, target_directory)
                .await
                .map_err(|e| content_error(&folder, e)),
            Command::MoveSupportFiles { target_directory } => self
                .transfer_to_support(&folder, target_directory)
                .await
                .map_err(|e| content_error(&folder, e)),
            Command::UpdatePages => self
                .update_pages(&folder)
                .await
                .map_err(|e| content_error(&folder, e)),
        }
    }

    /// Process `child` beneath the current folder, restoring the current
    /// folder on every exit path.
    async fn descend(&self, session: &mut RunSession, child: &str) -> Result<()> {
        let child_folder = session.traversal.current_folder.join(child);
        if !child_folder.is_descendant_of(&session.traversal.top_folder) {
            return Err(escape_error(&session.traversal.current_folder, child));
        }
        let saved = std::mem::replace(&mut session.traversal.current_folder, child_folder);
        let result = Box::pin(self.process(session)).await;
        session.traversal.current_folder = saved;
        result
    }

    async fn process_all(&self, session: &mut RunSession) -> Result<()> {
        let parent = session.traversal.current_folder.clone();
        let children = self
            .store
            .list_directories(&parent)
            .await
            .inspect_err(|e| tracing::error!(folder = %parent, error = %e, "cannot list folders"))?;

        for child in children {
            if child == IGNORED_FOLDER {
                tracing::debug!(folder = %parent, "skipping '{IGNORED_FOLDER}' folder");
                continue;
            }
            match self.descend(session, &child).await {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    session.failed_folder = None;
                    let failed = parent.join(&child);
                    tracing::error!(
                        folder = %failed,
                        error = %e,
                        "folder failed, continuing with next folder"
                    );
                    session.failures.push(FolderFailure {
                        folder: failed.to_string(),
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn transfer_to_support(&self, folder: &RemotePath, target_directory: &str) -> Result<()> {
        let target = self
            .options
            .support_directory
            .join(target_directory.trim_start_matches('/'));
        if self.options.dry_run {
            tracing::info!(folder = %folder, target = %target.display(), "dry run, support transfer skipped");
            return Ok(());
        }

        let staging = tempfile::Builder::new()
            .prefix("support")
            .tempdir_in(&self.options.scratch_root)?;
        self.store.download_directory(folder, staging.path()).await?;
        tokio::fs::create_dir_all(&target).await?;

        let mut copied = 0usize;
        let mut entries = tokio::fs::read_dir(staging.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if name.to_str() == Some(MANIFEST_NAME) || !entry.file_type().await?.is_file() {
                continue;
            }
            tokio::fs::copy(entry.path(), target.join(&name)).await?;
            copied += 1;
        }
        tracing::info!(
            folder = %folder,
            target = %target.display(),
            files = copied,
            "support files transferred"
        );
        Ok(())
    }

    async fn update_pages(&self, folder: &RemotePath) -> Result<()> {
        let files = self.store.list_files(folder).await?;
        for file in files.iter().filter(|f| !PAGE_SKIP.contains(&f.as_str())) {
            self.delegate.update_page(folder, file).await?;
        }
        Ok(())
    }
}
