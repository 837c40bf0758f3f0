//! The command-set catalog.
//!
//! Each command-set is one declarative table: the commands it allows, the
//! attribute keys each command accepts, and the handler that runs it. The
//! grammar validator and the dispatcher both read this table, so a command
//! that validates always has a handler.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use folio_types::FolioError;

/// Handler tag attached to every catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handler {
    Identity,
    ChangeFolder,
    SingleFolder,
    All,
    ProcessStory,
    MoveFiles,
    MoveSupportFiles,
    UpdatePages,
}

/// One command of a command-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub attributes: &'static [&'static str],
    pub handler: Handler,
}

impl CommandSpec {
    pub fn allows_attribute(&self, key: &str) -> bool {
        self.attributes.contains(&key)
    }
}

const IDENTITY: CommandSpec = CommandSpec {
    name: "identity",
    attributes: &["person", "send_log"],
    handler: Handler::Identity,
};

const SINGLE_FOLDER: CommandSpec = CommandSpec {
    name: "process_single_folder",
    attributes: &["folder", "folder_type"],
    handler: Handler::SingleFolder,
};

const TOP: &[CommandSpec] = &[
    IDENTITY,
    CommandSpec {
        name: "change_folder",
        attributes: &["folder"],
        handler: Handler::ChangeFolder,
    },
    SINGLE_FOLDER,
];

const CONTENT: &[CommandSpec] = &[
    IDENTITY,
    SINGLE_FOLDER,
    CommandSpec {
        name: "all",
        attributes: &[],
        handler: Handler::All,
    },
];

const STORY: &[CommandSpec] = &[
    IDENTITY,
    CommandSpec {
        name: "story",
        attributes: &[],
        handler: Handler::ProcessStory,
    },
];

const TRANSFER_FILES: &[CommandSpec] = &[
    IDENTITY,
    CommandSpec {
        name: "move_files",
        attributes: &["target_directory"],
        handler: Handler::MoveFiles,
    },
];

const TRANSFER_TO_SUPPORT: &[CommandSpec] = &[
    IDENTITY,
    CommandSpec {
        name: "move_files",
        attributes: &["target_directory"],
        handler: Handler::MoveSupportFiles,
    },
];

const UPDATE_PAGES: &[CommandSpec] = &[
    IDENTITY,
    CommandSpec {
        name: "process_pages",
        attributes: &[],
        handler: Handler::UpdatePages,
    },
];

/// The role of a folder, declared by the `command_set` header of its manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSet {
    Top,
    Content,
    Story,
    TransferFiles,
    TransferToSupport,
    UpdatePages,
}

impl CommandSet {
    pub const ALL: [CommandSet; 6] = [
        CommandSet::Top,
        CommandSet::Content,
        CommandSet::Story,
        CommandSet::TransferFiles,
        CommandSet::TransferToSupport,
        CommandSet::UpdatePages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandSet::Top => "top",
            CommandSet::Content => "content",
            CommandSet::Story => "story",
            CommandSet::TransferFiles => "transfer_files",
            CommandSet::TransferToSupport => "transfer_to_support",
            CommandSet::UpdatePages => "update_pages",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn lookup(name: &str) -> Option<CommandSet> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|set| set.name() == name)
    }

    pub fn commands(self) -> &'static [CommandSpec] {
        match self {
            CommandSet::Top => TOP,
            CommandSet::Content => CONTENT,
            CommandSet::Story => STORY,
            CommandSet::TransferFiles => TRANSFER_FILES,
            CommandSet::TransferToSupport => TRANSFER_TO_SUPPORT,
            CommandSet::UpdatePages => UPDATE_PAGES,
        }
    }

    /// Case-insensitive lookup of a command allowed in this set.
    pub fn command(self, name: &str) -> Option<&'static CommandSpec> {
        let name = name.trim().to_lowercase();
        self.commands().iter().find(|spec| spec.name == name)
    }

    pub fn command_names(self) -> Vec<&'static str> {
        self.commands().iter().map(|spec| spec.name).collect()
    }
}

impl fmt::Display for CommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CommandSet {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandSet::lookup(s).ok_or_else(|| FolioError::UnknownCommandSet(s.trim().to_string()))
    }
}
