//! Traversal engine for the Folio folder-command interpreter.
//!
//! This crate walks the remote content tree: it loads each folder's manifest,
//! turns its records into typed commands, and executes them, descending into
//! child folders and handing content work to a [`ContentDelegate`].

pub mod config;
pub mod delegate;
pub mod dispatch;
pub mod engine;
pub mod manifest_store;
pub mod report;
pub mod session;
pub mod users;

pub use config::{FolioConfig, Profile, RemoteConfig, RunConfig};
pub use delegate::{ContentDelegate, ContentRequest, LoggingDelegate, OutputPaths};
pub use dispatch::Dispatcher;
pub use engine::{EngineOptions, TraversalEngine, IGNORED_FOLDER};
pub use manifest_store::ManifestStore;
pub use report::{RunReport, RunStatus};
pub use session::{FolderFailure, IdentityEntry, IdentityLog, RunSession, TraversalState};
pub use users::{UserRegistry, USERS_DOCUMENT};
