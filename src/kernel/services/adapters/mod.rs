//! Service adapters: OS specific implementations (filesystem, resources, settings).

pub mod file;
pub mod keybindings;
pub mod paths;
pub mod settings;

pub use file::LocalFileProvider;
pub use keybindings::{
    load_keybindings, parse_keybindings, read_keybindings, resolve_resource, KeybindingLoadError,
    KEYBINDINGS_RESOURCE, RESOURCES_ENV,
};
pub use paths::{ensure_log_dir, get_cache_dir, get_log_dir};
pub use settings::{ensure_settings_file, get_settings_path, load_settings, load_settings_from};
