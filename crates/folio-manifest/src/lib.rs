//! Command manifests for the Folio folder-command interpreter.
//!
//! A manifest (`commands.txt`) is a stream of `---`-separated YAML documents:
//! a header declaring the folder's `command_set`, then one document per
//! command. This crate owns the command-set catalog, the line-oriented
//! grammar validator that runs before YAML parsing, and the typed
//! [`Command`] values the engine executes.
//!
//! # Example
//! ```
//! let text = "command_set: content\n---\ncommand: all\n";
//! let manifest = folio_manifest::parse(text, "Content").unwrap();
//! assert_eq!(manifest.command_set, folio_manifest::CommandSet::Content);
//! assert_eq!(manifest.command_names(), vec!["all"]);
//! ```

pub mod catalog;
pub mod command;
pub mod grammar;
pub mod manifest;
mod parser;

pub use catalog::{CommandSet, CommandSpec, Handler};
pub use command::{Command, FolderType};
pub use grammar::{validate_text, Diagnostic, Severity, Validation};
pub use manifest::{CommandRecord, Manifest};
pub use parser::{parse, parse_documents};

/// Base name of the manifest resource in every folder.
pub const MANIFEST_NAME: &str = "commands.txt";

/// Manifest resource name for an operator prefix (`""` for none).
pub fn manifest_file_name(prefix: &str) -> String {
    format!("{prefix}{MANIFEST_NAME}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_file_name_applies_prefix() {
        assert_eq!(manifest_file_name(""), "commands.txt");
        assert_eq!(manifest_file_name("don_"), "don_commands.txt");
    }

    #[test]
    fn every_validated_command_converts_to_its_handler() {
        let text = "\
command_set: content
---
command: identity
person: don
---
command: process_single_folder
folder: News
folder_type: site-content
---
command: all
";
        let manifest = parse(text, "Content").unwrap();
        let commands: Vec<Command> = manifest
            .commands
            .iter()
            .map(|record| {
                let spec = manifest
                    .command_set
                    .command(&record.command().unwrap())
                    .unwrap();
                Command::from_record(spec.handler, record).unwrap()
            })
            .collect();
        assert_eq!(
            commands,
            vec![
                Command::Identity {
                    person: Some("don".into()),
                    send_log: false,
                },
                Command::SingleFolder {
                    folder: "News".into(),
                    folder_type: FolderType::SiteContent,
                },
                Command::All,
            ]
        );
    }
}
