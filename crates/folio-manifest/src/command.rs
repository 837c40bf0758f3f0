//! Typed commands built from validated command records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use folio_types::{FolioError, Result};

use crate::catalog::Handler;
use crate::manifest::CommandRecord;

/// How a child folder named by `process_single_folder` is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderType {
    SiteContent,
    Story,
}

impl FromStr for FolderType {
    type Err = String;

    /// Accepts `site_content`, `site-content`, and `story`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "site_content" | "site-content" => Ok(FolderType::SiteContent),
            "story" => Ok(FolderType::Story),
            other => Err(other.to_string()),
        }
    }
}

/// A command ready for execution. Every catalog [`Handler`] has exactly one
/// variant here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Identity {
        person: Option<String>,
        send_log: bool,
    },
    ChangeFolder {
        folder: String,
    },
    SingleFolder {
        folder: String,
        folder_type: FolderType,
    },
    All,
    ProcessStory,
    MoveFiles {
        target_directory: String,
    },
    MoveSupportFiles {
        target_directory: String,
    },
    UpdatePages,
}

fn required(record: &CommandRecord, command: &str, attribute: &str) -> Result<String> {
    record
        .get_str(attribute)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| FolioError::MissingAttribute {
            command: command.to_string(),
            attribute: attribute.to_string(),
        })
}

/// A `folder` attribute naming a path below the current folder.
fn child_folder(record: &CommandRecord, command: &str) -> Result<String> {
    let folder = required(record, command, "folder")?;
    if let Some(bad) = folder
        .split('/')
        .map(str::trim)
        .find(|segment| *segment == "." || *segment == "..")
    {
        let reason = format!("'{bad}' segments are not allowed");
        return Err(FolioError::InvalidFolder { folder, reason });
    }
    Ok(folder)
}

impl Command {
    /// Build the typed command for `handler` from the record's attributes.
    pub fn from_record(handler: Handler, record: &CommandRecord) -> Result<Command> {
        let name = record.command().unwrap_or_default();
        let command = match handler {
            Handler::Identity => Command::Identity {
                person: record.get_str("person").filter(|p| !p.trim().is_empty()),
                send_log: record.get_bool("send_log").unwrap_or(false),
            },
            Handler::ChangeFolder => Command::ChangeFolder {
                folder: child_folder(record, &name)?,
            },
            Handler::SingleFolder => {
                let folder = child_folder(record, &name)?;
                let folder_type = required(record, &name, "folder_type")?;
                let folder_type = folder_type.parse::<FolderType>().map_err(|bad| {
                    FolioError::InvalidFolderType {
                        folder: folder.clone(),
                        folder_type: bad,
                    }
                })?;
                Command::SingleFolder {
                    folder,
                    folder_type,
                }
            }
            Handler::All => Command::All,
            Handler::ProcessStory => Command::ProcessStory,
            Handler::MoveFiles => Command::MoveFiles {
                target_directory: required(record, &name, "target_directory")?,
            },
            Handler::MoveSupportFiles => Command::MoveSupportFiles {
                target_directory: required(record, &name, "target_directory")?,
            },
            Handler::UpdatePages => Command::UpdatePages,
        };
        Ok(command)
    }

    /// The manifest name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Identity { .. } => "identity",
            Command::ChangeFolder { .. } => "change_folder",
            Command::SingleFolder { .. } => "process_single_folder",
            Command::All => "all",
            Command::ProcessStory => "story",
            Command::MoveFiles { .. } | Command::MoveSupportFiles { .. } => "move_files",
            Command::UpdatePages => "process_pages",
        }
    }

    pub fn handler(&self) -> Handler {
        match self {
            Command::Identity { .. } => Handler::Identity,
            Command::ChangeFolder { .. } => Handler::ChangeFolder,
            Command::SingleFolder { .. } => Handler::SingleFolder,
            Command::All => Handler::All,
            Command::ProcessStory => Handler::ProcessStory,
            Command::MoveFiles { .. } => Handler::MoveFiles,
            Command::MoveSupportFiles { .. } => Handler::MoveSupportFiles,
            Command::UpdatePages => Handler::UpdatePages,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identity { person, send_log } => write!(
                f,
                "identity (person={}, send_log={send_log})",
                person.as_deref().unwrap_or("-")
            ),
            Command::ChangeFolder { folder } => write!(f, "change_folder {folder}"),
            Command::SingleFolder {
                folder,
                folder_type,
            } => write!(f, "process_single_folder {folder} ({folder_type:?})"),
            Command::MoveFiles { target_directory }
            | Command::MoveSupportFiles { target_directory } => {
                write!(f, "move_files -> {target_directory}")
            }
            other => f.write_str(other.name()),
        }
    }
}
