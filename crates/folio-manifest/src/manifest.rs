use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::catalog::CommandSet;

/// One command document of a manifest: the `command` key plus attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandRecord {
    attrs: Mapping,
}

impl CommandRecord {
    pub fn new(attrs: Mapping) -> Self {
        Self { attrs }
    }

    /// The command name, case-folded.
    pub fn command(&self) -> Option<String> {
        self.get_str("command").map(|c| c.trim().to_lowercase())
    }

    /// Scalar attribute rendered as text. A sequence of scalars is joined
    /// with commas so `person: [don, sam]` reads like `person: don,sam`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.attrs.get(key)? {
            Value::Sequence(items) => {
                let parts: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
                Some(parts.join(","))
            }
            other => scalar_to_string(other),
        }
    }

    /// Boolean attribute; also accepts the strings `true`/`yes`/`1`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.attrs.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_i64() == Some(1)),
            Value::String(s) => Some(matches!(
                s.trim().to_lowercase().as_str(),
                "true" | "yes" | "1"
            )),
            _ => None,
        }
    }

    /// Attribute keys other than `command`, in document order.
    pub fn attribute_keys(&self) -> Vec<String> {
        self.attrs
            .keys()
            .filter_map(|k| k.as_str())
            .filter(|k| *k != "command")
            .map(String::from)
            .collect()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A parsed manifest: the header's command-set and the ordered command records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub command_set: CommandSet,
    pub commands: Vec<CommandRecord>,
}

impl Manifest {
    pub fn command_names(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|c| c.command().unwrap_or_default())
            .collect()
    }
}
