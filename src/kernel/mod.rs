//! Headless workbench core: keybinding resolution, editor layout, services.

pub mod keybinding;
pub mod layout;
pub mod services;

pub use keybinding::{ChordState, KeyOutcome, Keybinding, KeybindingResolver, DEFAULT_CHORD_TIMEOUT};
pub use layout::{EditorLayoutStore, EditorPane, EditorTab, PaneId, SplitDirection, TabId};
