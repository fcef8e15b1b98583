//! Service ports: traits + data contracts.

pub mod file;
pub mod settings;

pub use file::{DirEntry, FileError, FileProvider, Result as FileResult};
pub use settings::{KeybindingRule, Settings, DEFAULT_CHORD_TIMEOUT_MS};
