//! 命令系统：命令 id → 异步处理函数
//!
//! 约定：
//! - 重复注册直接覆盖，后注册者生效
//! - 注销不存在的命令不是错误
//! - 执行未注册的命令只记日志并正常返回；处理函数自身的错误原样返回给调用方
//! - CommandBinding 在离开作用域时注销自己注册的那一份

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::rc::{Rc, Weak};

use crate::kernel::services::ports::FileError;

pub type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;
pub type CommandResult = std::result::Result<(), CommandError>;
pub type CommandHandler = Rc<dyn Fn(CommandArgs) -> LocalBoxFuture<CommandResult>>;

#[derive(Debug)]
pub enum CommandError {
    Failed {
        command: CompactString,
        message: String,
    },
    MissingArgument {
        command: CompactString,
        index: usize,
    },
    InvalidArgument {
        command: CompactString,
        index: usize,
        expected: &'static str,
    },
    File(FileError),
}

impl CommandError {
    pub fn failed(command: &str, message: impl Into<String>) -> Self {
        CommandError::Failed {
            command: command.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Failed { command, message } => {
                write!(f, "command {} failed: {}", command, message)
            }
            CommandError::MissingArgument { command, index } => {
                write!(f, "command {} is missing argument {}", command, index)
            }
            CommandError::InvalidArgument {
                command,
                index,
                expected,
            } => write!(
                f,
                "command {} argument {} is not a valid {}",
                command, index, expected
            ),
            CommandError::File(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::File(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FileError> for CommandError {
    fn from(e: FileError) -> Self {
        CommandError::File(e)
    }
}

/// 从 JSON 命令参数转换
pub trait CommandArg: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl CommandArg for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl CommandArg for PathBuf {
    const EXPECTED: &'static str = "path";

    fn from_value(value: &Value) -> Option<Self> {
        value
            .as_str()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }
}

impl CommandArg for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl CommandArg for u64 {
    const EXPECTED: &'static str = "unsigned integer";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_u64()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandArgs(Vec<Value>);

impl CommandArgs {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    pub fn parse<T: CommandArg>(&self, index: usize) -> Option<T> {
        self.get(index).and_then(T::from_value)
    }

    /// 缺失或 `null` 返回 `Ok(None)`；存在但类型不符则报错
    pub fn optional<T: CommandArg>(
        &self,
        command: &str,
        index: usize,
    ) -> Result<Option<T>, CommandError> {
        match self.get(index) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::from_value(value).map(Some).ok_or_else(|| {
                CommandError::InvalidArgument {
                    command: command.into(),
                    index,
                    expected: T::EXPECTED,
                }
            }),
        }
    }

    pub fn require<T: CommandArg>(&self, command: &str, index: usize) -> Result<T, CommandError> {
        self.optional(command, index)?
            .ok_or_else(|| CommandError::MissingArgument {
                command: command.into(),
                index,
            })
    }
}

impl From<Vec<Value>> for CommandArgs {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

struct Entry {
    handler: CommandHandler,
    generation: u64,
}

#[derive(Default)]
pub struct CommandRegistry {
    commands: RefCell<FxHashMap<CompactString, Entry>>,
    next_generation: Cell<u64>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&self, id: &str, handler: F)
    where
        F: Fn(CommandArgs) -> Fut + 'static,
        Fut: Future<Output = CommandResult> + 'static,
    {
        self.insert(id, boxed(handler));
    }

    pub fn register_handler(&self, id: &str, handler: CommandHandler) {
        self.insert(id, handler);
    }

    /// 注册 `handler`，返回的守卫在 drop 时注销它
    pub fn bind<F, Fut>(self: &Rc<Self>, id: &str, handler: F) -> CommandBinding
    where
        F: Fn(CommandArgs) -> Fut + 'static,
        Fut: Future<Output = CommandResult> + 'static,
    {
        let generation = self.insert(id, boxed(handler));
        CommandBinding {
            registry: Rc::downgrade(self),
            id: id.into(),
            generation,
        }
    }

    pub fn unregister(&self, id: &str) -> bool {
        self.commands.borrow_mut().remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    pub fn command_ids(&self) -> Vec<CompactString> {
        let mut ids: Vec<CompactString> = self.commands.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn execute(&self, id: &str, args: CommandArgs) -> CommandResult {
        let handler = self
            .commands
            .borrow()
            .get(id)
            .map(|entry| Rc::clone(&entry.handler));

        let Some(handler) = handler else {
            tracing::warn!(command = %id, "command not found");
            return Ok(());
        };

        tracing::debug!(command = %id, args = args.len(), "execute command");
        handler(args).await
    }

    fn insert(&self, id: &str, handler: CommandHandler) -> u64 {
        let generation = self.next_generation.get().wrapping_add(1);
        self.next_generation.set(generation);
        let replaced = self
            .commands
            .borrow_mut()
            .insert(id.into(), Entry { handler, generation })
            .is_some();
        if replaced {
            tracing::trace!(command = %id, "command handler replaced");
        }
        generation
    }

    fn unregister_generation(&self, id: &str, generation: u64) {
        let mut commands = self.commands.borrow_mut();
        if commands
            .get(id)
            .is_some_and(|entry| entry.generation == generation)
        {
            commands.remove(id);
        }
    }
}

fn boxed<F, Fut>(handler: F) -> CommandHandler
where
    F: Fn(CommandArgs) -> Fut + 'static,
    Fut: Future<Output = CommandResult> + 'static,
{
    Rc::new(move |args| Box::pin(handler(args)) as LocalBoxFuture<CommandResult>)
}

pub struct CommandBinding {
    registry: Weak<CommandRegistry>,
    id: CompactString,
    generation: u64,
}

impl CommandBinding {
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for CommandBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBinding")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Drop for CommandBinding {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister_generation(&self.id, self.generation);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/command.rs"]
mod tests;
