//! zdesk - 编辑器工作台协调核心
//!
//! 模块结构：
//! - core: 核心框架（Command, Context, Event）
//! - kernel: 快捷键解析、编辑器布局、服务层（ports + adapters）
//! - app: 应用层（Workbench 与终端渲染）

pub mod app;
pub mod core;
pub mod kernel;
