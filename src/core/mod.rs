//! 核心框架模块
//!
//! 提供工作台的核心抽象：
//! - Context: 上下文键与 when 表达式
//! - Command: 命令注册与执行
//! - Event: 按键事件与组合键

pub mod command;
pub mod context;
pub mod event;

pub use command::{
    CommandArg, CommandArgs, CommandBinding, CommandError, CommandHandler, CommandRegistry,
    CommandResult, LocalBoxFuture,
};
pub use context::{ContextKeys, When, WhenClause};
pub use event::{KeyCombo, KeyPress, KeySequence, Modifiers};
