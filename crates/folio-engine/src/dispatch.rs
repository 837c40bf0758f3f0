//! Turning command records into typed commands for one command-set.

use folio_manifest::{Command, CommandRecord, CommandSet, Handler};
use folio_types::{FolioError, Result};

/// Stateless checker between parsed manifests and the engine.
pub struct Dispatcher;

impl Dispatcher {
    /// Lazily check and convert each record as it is consumed.
    ///
    /// A record fails when it has no `command` key, when its command is not
    /// allowed in `command_set`, or when its attributes do not form a valid
    /// command.
    pub fn validate_and_iterate<'a>(
        records: &'a [CommandRecord],
        command_set: CommandSet,
    ) -> impl Iterator<Item = Result<Command>> + 'a {
        records
            .iter()
            .map(move |record| Self::convert(record, command_set))
    }

    /// Convert every record, failing on the first invalid one.
    pub fn plan(records: &[CommandRecord], command_set: CommandSet) -> Result<Vec<Command>> {
        Self::validate_and_iterate(records, command_set).collect()
    }

    /// The handler registered for `command_name` in `command_set`.
    pub fn lookup(command_set: CommandSet, command_name: &str) -> Result<Handler> {
        command_set
            .command(command_name)
            .map(|spec| spec.handler)
            .ok_or_else(|| FolioError::UnsupportedCommand {
                command_set: command_set.to_string(),
                command: command_name.to_string(),
            })
    }

    fn convert(record: &CommandRecord, command_set: CommandSet) -> Result<Command> {
        let name = record.command().ok_or_else(|| FolioError::MissingAttribute {
            command: "<unnamed>".to_string(),
            attribute: "command".to_string(),
        })?;
        let spec = command_set
            .command(&name)
            .ok_or_else(|| FolioError::UnknownCommand {
                command_set: command_set.to_string(),
                command: name.clone(),
            })?;
        Command::from_record(spec.handler, record)
    }
}
