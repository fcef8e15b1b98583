//! Keybindings resource: a JSON list of `{ key, command, when?, args? }` records.
//!
//! Loading is lenient by contract: a missing file or a document that is not a list
//! yields no bindings, and individual malformed records are skipped.

use crate::kernel::services::ports::KeybindingRule;
use serde_json::Value;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub const KEYBINDINGS_RESOURCE: &str = "assets/data/keybindings.json";
pub const RESOURCES_ENV: &str = "ZDESK_RESOURCES";

#[derive(Debug)]
pub enum KeybindingLoadError {
    Io(io::Error),
    Json(serde_json::Error),
    NotAList,
}

impl fmt::Display for KeybindingLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeybindingLoadError::Io(e) => write!(f, "IO error: {}", e),
            KeybindingLoadError::Json(e) => write!(f, "invalid JSON: {}", e),
            KeybindingLoadError::NotAList => write!(f, "keybindings data is not a list"),
        }
    }
}

impl std::error::Error for KeybindingLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            KeybindingLoadError::Io(e) => Some(e),
            KeybindingLoadError::Json(e) => Some(e),
            KeybindingLoadError::NotAList => None,
        }
    }
}

impl From<io::Error> for KeybindingLoadError {
    fn from(e: io::Error) -> Self {
        KeybindingLoadError::Io(e)
    }
}

impl From<serde_json::Error> for KeybindingLoadError {
    fn from(e: serde_json::Error) -> Self {
        KeybindingLoadError::Json(e)
    }
}

pub fn parse_keybindings(data: &str) -> Result<Vec<KeybindingRule>, KeybindingLoadError> {
    let Value::Array(entries) = serde_json::from_str::<Value>(data)? else {
        return Err(KeybindingLoadError::NotAList);
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<KeybindingRule>(entry) {
            Ok(rule) => rules.push(rule),
            Err(e) => tracing::warn!(index, error = %e, "skipping malformed keybinding record"),
        }
    }
    Ok(rules)
}

pub fn read_keybindings(path: &Path) -> Result<Vec<KeybindingRule>, KeybindingLoadError> {
    let data = std::fs::read_to_string(path)?;
    parse_keybindings(&data)
}

pub fn load_keybindings(path: &Path) -> Vec<KeybindingRule> {
    match read_keybindings(path) {
        Ok(rules) => {
            tracing::info!(path = %path.display(), count = rules.len(), "keybindings loaded");
            rules
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load keybindings");
            Vec::new()
        }
    }
}

/// Looks for a bundled resource under `$ZDESK_RESOURCES`, next to the executable,
/// then in the working directory.
pub fn resolve_resource(relative: &str) -> Option<PathBuf> {
    let env_root = std::env::var_os(RESOURCES_ENV).map(PathBuf::from);
    let exe_root = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let cwd_root = std::env::current_dir().ok();

    [env_root, exe_root, cwd_root]
        .into_iter()
        .flatten()
        .map(|root| root.join(relative))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/keybindings.rs"]
mod tests;
