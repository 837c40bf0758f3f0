//! Remote content store access for Folio.
//!
//! Provides the [`RemoteStore`] trait the interpreter talks to, an
//! [`RcloneStore`] that shells out to `rclone`, and a [`LocalStore`] over a
//! directory tree for tests and offline runs.

pub mod local;
pub mod rclone;
pub mod remote;

pub use local::LocalStore;
pub use rclone::{RcloneStore, DEFAULT_REMOTE};
pub use remote::RemoteStore;
