//! 编辑器布局：窗格与标签
//!
//! - 窗格按 `order` 排列，`sizes` 与之一一对应，始终至少保留一个窗格
//! - 打开已存在的路径只激活原标签，不重新读取内容
//! - 标签 id 单调递增，关闭后不会复用

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::fmt;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::CommandArg;

const INITIAL_PANE_SIZE: f32 = 100.0;

macro_rules! layout_id {
    ($name:ident, $prefix:literal, $expected:literal) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn raw(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                s.strip_prefix($prefix).unwrap_or(s).parse().map(Self)
            }
        }

        impl CommandArg for $name {
            const EXPECTED: &'static str = $expected;

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::Number(n) => n.as_u64().map(Self),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                }
            }
        }
    };
}

layout_id!(PaneId, "pane-", "pane id");
layout_id!(TabId, "tab-", "tab id");

impl PaneId {
    pub const DEFAULT: PaneId = PaneId(0);
}

/// 整个布局共用的方向：`Vertical` 左右并排（竖直分隔线），`Horizontal` 上下堆叠
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitDirection {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorTab {
    pub id: TabId,
    pub path: PathBuf,
    pub content: String,
}

impl EditorTab {
    pub fn title(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorPane {
    pub id: PaneId,
    pub tabs: Vec<EditorTab>,
    pub active_tab: Option<TabId>,
}

impl EditorPane {
    fn new(id: PaneId) -> Self {
        Self {
            id,
            tabs: Vec::new(),
            active_tab: None,
        }
    }

    pub fn active_tab(&self) -> Option<&EditorTab> {
        let id = self.active_tab?;
        self.tab(id)
    }

    pub fn tab(&self, id: TabId) -> Option<&EditorTab> {
        self.tabs.iter().find(|tab| tab.id == id)
    }

    pub fn tab_by_path(&self, path: &Path) -> Option<&EditorTab> {
        self.tabs.iter().find(|tab| tab.path == path)
    }

    fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id == id)
    }

    fn clear(&mut self) {
        self.tabs.clear();
        self.active_tab = None;
    }

    fn cycle(&mut self, forward: bool) -> bool {
        let len = self.tabs.len();
        if len <= 1 {
            return false;
        }
        let current = self
            .active_tab
            .and_then(|id| self.index_of(id))
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % len
        } else if current == 0 {
            len - 1
        } else {
            current - 1
        };
        self.active_tab = Some(self.tabs[next].id);
        next != current
    }
}

/// 窗格存放在扁平的 id → 记录表中；`order` 与 `sizes` 一一对应，给出显示顺序和相对权重
#[derive(Debug, Clone)]
pub struct EditorLayoutStore {
    direction: SplitDirection,
    panes: FxHashMap<PaneId, EditorPane>,
    order: Vec<PaneId>,
    sizes: Vec<f32>,
    active_pane: PaneId,
    next_pane_id: u64,
    next_tab_id: u64,
}

impl Default for EditorLayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorLayoutStore {
    pub fn new() -> Self {
        let mut panes = FxHashMap::default();
        panes.insert(PaneId::DEFAULT, EditorPane::new(PaneId::DEFAULT));
        Self {
            direction: SplitDirection::default(),
            panes,
            order: vec![PaneId::DEFAULT],
            sizes: vec![INITIAL_PANE_SIZE],
            active_pane: PaneId::DEFAULT,
            next_pane_id: 1,
            next_tab_id: 1,
        }
    }

    fn alloc_pane_id(&mut self) -> PaneId {
        let id = PaneId::new(self.next_pane_id);
        self.next_pane_id = self.next_pane_id.saturating_add(1);
        id
    }

    fn alloc_tab_id(&mut self) -> TabId {
        let id = TabId::new(self.next_tab_id);
        self.next_tab_id = self.next_tab_id.saturating_add(1);
        id
    }

    pub fn direction(&self) -> SplitDirection {
        self.direction
    }

    pub fn pane_ids(&self) -> &[PaneId] {
        &self.order
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn pane_count(&self) -> usize {
        self.order.len()
    }

    pub fn pane(&self, id: PaneId) -> Option<&EditorPane> {
        self.panes.get(&id)
    }

    /// 按显示顺序返回窗格
    pub fn panes(&self) -> impl Iterator<Item = &EditorPane> + '_ {
        self.order.iter().filter_map(|id| self.panes.get(id))
    }

    pub fn pane_index(&self, id: PaneId) -> Option<usize> {
        self.order.iter().position(|p| *p == id)
    }

    pub fn active_pane_id(&self) -> PaneId {
        self.active_pane
    }

    pub fn active_pane(&self) -> Option<&EditorPane> {
        self.panes.get(&self.active_pane)
    }

    pub fn active_tab(&self) -> Option<&EditorTab> {
        self.active_pane()?.active_tab()
    }

    pub fn find_tab(&self, pane: PaneId, tab: TabId) -> Option<&EditorTab> {
        self.panes.get(&pane)?.tab(tab)
    }

    pub fn has_open_tabs(&self) -> bool {
        self.panes.values().any(|pane| !pane.tabs.is_empty())
    }

    /// `open_file` 的目标窗格：活动窗格；指针失效时取第一个窗格
    pub fn target_pane_id(&self) -> PaneId {
        if self.panes.contains_key(&self.active_pane) {
            self.active_pane
        } else {
            self.order[0]
        }
    }

    /// 在目标窗格打开 `path`；同路径的已有标签只会被激活，保留内存中的内容
    pub fn open_file(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> TabId {
        let pane = self.target_pane_id();
        self.active_pane = pane;
        self.open_in(pane, path.into(), content.into())
    }

    pub fn open_file_in(
        &mut self,
        pane: PaneId,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Option<TabId> {
        if !self.panes.contains_key(&pane) {
            return None;
        }
        self.active_pane = pane;
        Some(self.open_in(pane, path.into(), content.into()))
    }

    fn open_in(&mut self, pane_id: PaneId, path: PathBuf, content: String) -> TabId {
        let existing = self
            .panes
            .get(&pane_id)
            .and_then(|pane| pane.tab_by_path(&path))
            .map(|tab| tab.id);
        if let Some(id) = existing {
            if let Some(pane) = self.panes.get_mut(&pane_id) {
                pane.active_tab = Some(id);
            }
            return id;
        }

        let id = self.alloc_tab_id();
        if let Some(pane) = self.panes.get_mut(&pane_id) {
            pane.tabs.push(EditorTab { id, path, content });
            pane.active_tab = Some(id);
        }
        id
    }

    /// 聚焦 `pane_id`；只有当 `tab` 属于该窗格时才切换它的活动标签。返回标签是否切换。
    pub fn set_active_tab(&mut self, pane_id: PaneId, tab: TabId) -> bool {
        let Some(pane) = self.panes.get_mut(&pane_id) else {
            return false;
        };
        self.active_pane = pane_id;
        if pane.index_of(tab).is_none() {
            tracing::debug!(pane = %pane_id, tab = %tab, "set_active_tab: tab not in pane");
            return false;
        }
        pane.active_tab = Some(tab);
        true
    }

    pub fn focus_pane(&mut self, pane: PaneId) -> bool {
        if !self.panes.contains_key(&pane) {
            return false;
        }
        self.active_pane = pane;
        true
    }

    pub fn close_tab(&mut self, pane_id: PaneId, tab: TabId) -> bool {
        let Some(pane) = self.panes.get_mut(&pane_id) else {
            return false;
        };
        let Some(index) = pane.index_of(tab) else {
            return false;
        };

        pane.tabs.remove(index);
        if pane.active_tab == Some(tab) {
            pane.active_tab = if index > 0 {
                pane.tabs.get(index - 1).map(|t| t.id)
            } else {
                pane.tabs.first().map(|t| t.id)
            };
        }
        true
    }

    pub fn close_active_tab(&mut self) -> bool {
        let pane = self.target_pane_id();
        match self.panes.get(&pane).and_then(|p| p.active_tab) {
            Some(tab) => self.close_tab(pane, tab),
            None => false,
        }
    }

    pub fn close_all_tabs(&mut self) {
        for pane in self.panes.values_mut() {
            pane.clear();
        }
    }

    pub fn close_tabs_in_pane(&mut self, pane: PaneId) -> bool {
        match self.panes.get_mut(&pane) {
            Some(pane) => {
                pane.clear();
                true
            }
            None => false,
        }
    }

    /// 在 `pane` 之后插入空窗格并平分其权重；方向是全局的，会影响所有窗格
    pub fn split_pane(&mut self, pane: PaneId, direction: SplitDirection) -> Option<PaneId> {
        let index = self.pane_index(pane)?;
        let id = self.alloc_pane_id();

        let half = self.sizes[index] / 2.0;
        self.sizes[index] = half;
        self.sizes.insert(index + 1, half);
        self.order.insert(index + 1, id);
        self.panes.insert(id, EditorPane::new(id));

        self.direction = direction;
        self.active_pane = id;
        debug_assert_eq!(self.order.len(), self.sizes.len());
        Some(id)
    }

    /// 拒绝关闭最后一个窗格；被移除的权重平均分给剩余窗格，焦点移到前一个窗格
    pub fn close_pane(&mut self, pane: PaneId) -> bool {
        if self.order.len() <= 1 {
            return false;
        }
        let Some(index) = self.pane_index(pane) else {
            return false;
        };

        self.order.remove(index);
        self.panes.remove(&pane);
        let removed = self.sizes.remove(index);
        let share = removed / self.sizes.len() as f32;
        for size in &mut self.sizes {
            *size += share;
        }

        self.active_pane = self.order[index.saturating_sub(1)];
        debug_assert_eq!(self.order.len(), self.sizes.len());
        true
    }

    /// 恢复为单个空窗格；标签 id 继续递增，旧 id 不会与新 id 重合
    pub fn close_all_panes(&mut self) {
        let next_tab_id = self.next_tab_id;
        let next_pane_id = self.next_pane_id;
        *self = Self::new();
        self.next_tab_id = next_tab_id;
        self.next_pane_id = next_pane_id;
    }

    pub fn update_content(&mut self, pane: PaneId, tab: TabId, content: impl Into<String>) -> bool {
        let content = content.into();
        self.edit_content(pane, tab, |buffer| *buffer = content)
    }

    /// 原地修改标签内容，不复制缓冲区
    pub fn edit_content(&mut self, pane: PaneId, tab: TabId, edit: impl FnOnce(&mut String)) -> bool {
        let Some(tab) = self
            .panes
            .get_mut(&pane)
            .and_then(|p| p.tabs.iter_mut().find(|t| t.id == tab))
        else {
            return false;
        };
        edit(&mut tab.content);
        true
    }

    pub fn next_tab(&mut self, pane: PaneId) -> bool {
        self.panes.get_mut(&pane).is_some_and(|p| p.cycle(true))
    }

    pub fn prev_tab(&mut self, pane: PaneId) -> bool {
        self.panes.get_mut(&pane).is_some_and(|p| p.cycle(false))
    }

    /// 只有每个窗格都对应一个有限的正权重时才接受新的尺寸
    pub fn set_sizes(&mut self, sizes: Vec<f32>) -> bool {
        if sizes.len() != self.order.len() || sizes.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return false;
        }
        self.sizes = sizes;
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/layout.rs"]
mod tests;
