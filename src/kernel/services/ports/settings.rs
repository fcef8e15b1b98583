use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CHORD_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keybindings_file: Option<PathBuf>,
    #[serde(default = "default_chord_timeout_ms")]
    pub chord_timeout_ms: u64,
    #[serde(default)]
    pub keybindings: Vec<KeybindingRule>,
}

impl Settings {
    pub fn chord_timeout(&self) -> Duration {
        Duration::from_millis(self.chord_timeout_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            keybindings_file: None,
            chord_timeout_ms: DEFAULT_CHORD_TIMEOUT_MS,
            keybindings: Vec::new(),
        }
    }
}

fn default_chord_timeout_ms() -> u64 {
    DEFAULT_CHORD_TIMEOUT_MS
}

/// One record of the keybindings resource: `{ key, command, when?, args? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeybindingRule {
    pub key: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub args: Value,
}

impl KeybindingRule {
    pub fn new(key: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            command: command.into(),
            when: None,
            args: Value::Null,
        }
    }

    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = Value::Array(args);
        self
    }

    /// A list is used as-is, `null` means no arguments, anything else is a single argument.
    pub fn arg_list(&self) -> Vec<Value> {
        match &self.args {
            Value::Null => Vec::new(),
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        }
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/settings.rs"]
mod tests;
