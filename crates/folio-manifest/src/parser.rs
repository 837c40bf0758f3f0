use serde::Deserialize;
use serde_yaml::Value;

use folio_types::{FolioError, Result};

use crate::catalog::CommandSet;
use crate::grammar::validate_text;
use crate::manifest::{CommandRecord, Manifest};

/// Split YAML text into its documents, dropping a trailing empty document.
pub fn parse_documents(text: &str) -> std::result::Result<Vec<Value>, serde_yaml::Error> {
    let mut docs = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        docs.push(Value::deserialize(document)?);
    }
    if matches!(docs.last(), Some(Value::Null)) {
        docs.pop();
    }
    Ok(docs)
}

fn invalid(folder: &str, message: impl Into<String>) -> FolioError {
    FolioError::ManifestInvalid {
        folder: folder.to_string(),
        diagnostics: vec![message.into()],
    }
}

/// Validate and parse manifest text read from `folder`.
///
/// Grammar errors are reported together; the YAML parse only sees the
/// meaningful prefix accepted by the grammar.
pub fn parse(source: &str, folder: &str) -> Result<Manifest> {
    let validation = validate_text(source);
    if validation.has_errors() {
        return Err(FolioError::ManifestInvalid {
            folder: folder.to_string(),
            diagnostics: validation.errors().map(ToString::to_string).collect(),
        });
    }

    let docs = parse_documents(validation.meaningful(source))
        .map_err(|e| invalid(folder, format!("YAML error: {e}")))?;
    tracing::debug!(folder, documents = docs.len(), "parsed manifest");

    let mut docs = docs.into_iter();
    let header = docs
        .next()
        .ok_or_else(|| invalid(folder, "manifest is empty"))?;
    let command_set = header
        .get("command_set")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(folder, "document 0 has no command_set"))?
        .parse::<CommandSet>()?;

    let commands = docs
        .enumerate()
        .map(|(idx, doc)| match doc {
            Value::Mapping(map) => Ok(CommandRecord::new(map)),
            _ => Err(invalid(
                folder,
                format!("document {} is not a mapping", idx + 1),
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    // The parsed records must agree with the grammar's whitelist.
    for (idx, record) in commands.iter().enumerate() {
        let Some(spec) = record
            .command()
            .and_then(|name| command_set.command(&name))
        else {
            continue;
        };
        if let Some(key) = record
            .attribute_keys()
            .into_iter()
            .find(|key| !spec.allows_attribute(key))
        {
            return Err(invalid(
                folder,
                format!(
                    "document {}: '{key}' is not valid in command '{}'",
                    idx + 1,
                    spec.name
                ),
            ));
        }
    }

    Ok(Manifest {
        command_set,
        commands,
    })
}
