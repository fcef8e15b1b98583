//! 应用层：工作台宿主与终端渲染

#[cfg(feature = "tui")]
pub mod render;
pub mod workbench;

pub use workbench::{ids, UiState, Workbench};
