//! 上下文键：布尔标志存储 + when 表达式求值
//!
//! when 语法只有 `&&` 连接的、可用 `!` 取反的标志名，不支持 `||`、括号或比较。

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;

pub const SIDEBAR_VISIBLE: &str = "sidebarVisible";
pub const CHAT_VISIBLE: &str = "chatVisible";
pub const TERMINAL_VISIBLE: &str = "terminalVisible";
pub const TERMINAL_FOCUSED: &str = "terminalFocused";
pub const EDITOR_HAS_OPEN_TABS: &str = "editorHasOpenTabs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenClause {
    pub key: CompactString,
    pub negated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct When {
    clauses: Vec<WhenClause>,
}

impl When {
    /// 空白输入表示没有条件，返回 `None`
    pub fn parse(expression: &str) -> Option<Self> {
        if expression.trim().is_empty() {
            return None;
        }

        let clauses = expression
            .split("&&")
            .map(|clause| {
                let clause = clause.trim();
                match clause.strip_prefix('!') {
                    Some(key) => WhenClause {
                        key: key.trim().into(),
                        negated: true,
                    },
                    None => WhenClause {
                        key: clause.into(),
                        negated: false,
                    },
                }
            })
            .collect();

        Some(Self { clauses })
    }

    pub fn clauses(&self) -> &[WhenClause] {
        &self.clauses
    }
}

impl fmt::Display for When {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" && ")?;
            }
            if clause.negated {
                f.write_str("!")?;
            }
            f.write_str(&clause.key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ContextKeys {
    values: RefCell<FxHashMap<CompactString, bool>>,
}

impl ContextKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: bool) {
        let previous = self.values.borrow_mut().insert(key.into(), value);
        if previous != Some(value) {
            tracing::trace!(key, value, "context key changed");
        }
    }

    /// 从未设置过的键读作 `false`
    pub fn get(&self, key: &str) -> bool {
        self.values.borrow().get(key).copied().unwrap_or(false)
    }

    pub fn evaluate(&self, when: &When) -> bool {
        let values = self.values.borrow();
        when.clauses.iter().all(|clause| {
            let value = values.get(clause.key.as_str()).copied().unwrap_or(false);
            value != clause.negated
        })
    }

    pub fn evaluate_when(&self, expression: &str) -> bool {
        When::parse(expression).map_or(true, |when| self.evaluate(&when))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/core/context.rs"]
mod tests;
