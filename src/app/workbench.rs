//! 工作台：组装上下文键、命令注册表、快捷键解析器与编辑器布局
//!
//! 职责：
//! - 持有各个服务（显式构造、注入，测试时每个用例一份）
//! - 注册内置命令，命令句柄随工作台一起释放
//! - 把按键交给解析器，把界面开关同步到上下文键

use rustc_hash::FxHashSet;
use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::context::{
    CHAT_VISIBLE, EDITOR_HAS_OPEN_TABS, SIDEBAR_VISIBLE, TERMINAL_FOCUSED, TERMINAL_VISIBLE,
};
use crate::core::{
    CommandArgs, CommandBinding, CommandError, CommandRegistry, CommandResult, ContextKeys,
    KeyCombo, KeyPress,
};
use crate::kernel::services::ports::{FileProvider, KeybindingRule, Settings};
use crate::kernel::{EditorLayoutStore, KeyOutcome, KeybindingResolver, PaneId, SplitDirection, TabId};

pub mod ids {
    pub const OPEN_FILE: &str = "workbench.action.files.openFile";
    pub const NEW_UNTITLED_FILE: &str = "workbench.action.files.newUntitledFile";
    pub const NEW_FOLDER: &str = "workbench.action.files.newFolder";
    pub const SAVE: &str = "workbench.action.files.save";
    pub const SAVE_AS: &str = "workbench.action.files.saveAs";
    pub const CLOSE_ACTIVE_EDITOR: &str = "workbench.action.closeActiveEditor";
    pub const QUIT: &str = "workbench.action.quit";
    pub const TOGGLE_SIDEBAR: &str = "workbench.action.toggleSidebarVisibility";
    pub const TOGGLE_CHAT: &str = "workbench.action.toggleChat";
    pub const TOGGLE_TERMINAL: &str = "workbench.action.terminal.toggleTerminal";
    pub const TOGGLE_PANEL: &str = "workbench.action.togglePanel";
    pub const SPLIT_EDITOR: &str = "workbench.action.splitEditor";
    pub const SPLIT_EDITOR_DOWN: &str = "workbench.action.splitEditorDown";
    pub const CLOSE_ALL_EDITORS: &str = "workbench.action.closeAllEditors";
    pub const CLOSE_EDITORS_IN_GROUP: &str = "workbench.action.closeEditorsInGroup";
    pub const CLOSE_GROUP: &str = "workbench.action.closeGroup";
    pub const CLOSE_ALL_GROUPS: &str = "workbench.action.closeAllGroups";
    pub const NEXT_EDITOR: &str = "workbench.action.nextEditor";
    pub const PREVIOUS_EDITOR: &str = "workbench.action.previousEditor";
}

/// 外围 UI 的可见性标志，同步写入上下文键
pub struct UiState {
    contexts: Rc<ContextKeys>,
    sidebar_visible: Cell<bool>,
    chat_visible: Cell<bool>,
    terminal_visible: Cell<bool>,
    terminal_focused: Cell<bool>,
    quit_requested: Cell<bool>,
}

impl UiState {
    fn new(contexts: Rc<ContextKeys>) -> Self {
        let ui = Self {
            contexts,
            sidebar_visible: Cell::new(true),
            chat_visible: Cell::new(false),
            terminal_visible: Cell::new(false),
            terminal_focused: Cell::new(false),
            quit_requested: Cell::new(false),
        };
        ui.contexts.set(SIDEBAR_VISIBLE, true);
        ui.contexts.set(CHAT_VISIBLE, false);
        ui.contexts.set(TERMINAL_VISIBLE, false);
        ui.contexts.set(TERMINAL_FOCUSED, false);
        ui
    }

    pub fn sidebar_visible(&self) -> bool {
        self.sidebar_visible.get()
    }

    pub fn chat_visible(&self) -> bool {
        self.chat_visible.get()
    }

    pub fn terminal_visible(&self) -> bool {
        self.terminal_visible.get()
    }

    pub fn terminal_focused(&self) -> bool {
        self.terminal_focused.get()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested.get()
    }

    fn flip(&self, flag: &Cell<bool>, key: &str) -> bool {
        let value = !flag.get();
        flag.set(value);
        self.contexts.set(key, value);
        value
    }

    pub fn toggle_sidebar(&self) -> bool {
        self.flip(&self.sidebar_visible, SIDEBAR_VISIBLE)
    }

    pub fn toggle_chat(&self) -> bool {
        self.flip(&self.chat_visible, CHAT_VISIBLE)
    }

    /// 隐藏终端时同时取消其焦点
    pub fn toggle_terminal(&self) -> bool {
        let visible = self.flip(&self.terminal_visible, TERMINAL_VISIBLE);
        if !visible {
            self.set_terminal_focused(false);
        }
        visible
    }

    pub fn set_terminal_focused(&self, focused: bool) {
        let focused = focused && self.terminal_visible.get();
        self.terminal_focused.set(focused);
        self.contexts.set(TERMINAL_FOCUSED, focused);
    }

    pub fn request_quit(&self) {
        self.quit_requested.set(true);
    }
}

#[derive(Default)]
struct UntitledFiles {
    next: Cell<u32>,
    tabs: RefCell<FxHashSet<TabId>>,
}

/// 内置命令处理函数共享的句柄
#[derive(Clone)]
struct Shared {
    contexts: Rc<ContextKeys>,
    store: Rc<RefCell<EditorLayoutStore>>,
    ui: Rc<UiState>,
    files: Rc<dyn FileProvider>,
    untitled: Rc<UntitledFiles>,
}

impl Shared {
    fn with_store<R>(&self, f: impl FnOnce(&mut EditorLayoutStore) -> R) -> R {
        let result = f(&mut self.store.borrow_mut());
        let has_tabs = self.store.borrow().has_open_tabs();
        self.contexts.set(EDITOR_HAS_OPEN_TABS, has_tabs);
        result
    }

    fn pane_arg(&self, args: &CommandArgs, command: &str, index: usize) -> Result<PaneId, CommandError> {
        Ok(args
            .optional::<PaneId>(command, index)?
            .unwrap_or_else(|| self.store.borrow().target_pane_id()))
    }

    fn active_document(&self) -> Option<(PaneId, TabId, PathBuf, String)> {
        let store = self.store.borrow();
        let pane = store.active_pane()?;
        let tab = pane.active_tab()?;
        Some((pane.id, tab.id, tab.path.clone(), tab.content.clone()))
    }
}

pub struct Workbench {
    contexts: Rc<ContextKeys>,
    commands: Rc<CommandRegistry>,
    resolver: KeybindingResolver,
    shared: Shared,
    _builtin: Vec<CommandBinding>,
}

impl Workbench {
    pub fn new(
        files: Rc<dyn FileProvider>,
        rules: &[KeybindingRule],
        chord_timeout: Duration,
    ) -> Self {
        let contexts = Rc::new(ContextKeys::new());
        let commands = Rc::new(CommandRegistry::new());
        let resolver =
            KeybindingResolver::from_rules(Rc::clone(&contexts), Rc::clone(&commands), rules)
                .with_chord_timeout(chord_timeout);

        let shared = Shared {
            contexts: Rc::clone(&contexts),
            store: Rc::new(RefCell::new(EditorLayoutStore::new())),
            ui: Rc::new(UiState::new(Rc::clone(&contexts))),
            files,
            untitled: Rc::new(UntitledFiles::default()),
        };
        contexts.set(EDITOR_HAS_OPEN_TABS, false);

        let builtin = register_builtin_commands(&commands, &shared);
        tracing::info!(
            commands = builtin.len(),
            bindings = resolver.binding_count(),
            "workbench ready"
        );

        Self {
            contexts,
            commands,
            resolver,
            shared,
            _builtin: builtin,
        }
    }

    /// 设置中的用户规则排在前面，优先于内置资源
    pub fn from_settings(
        files: Rc<dyn FileProvider>,
        settings: &Settings,
        resource_rules: &[KeybindingRule],
    ) -> Self {
        let rules: Vec<KeybindingRule> = settings
            .keybindings
            .iter()
            .chain(resource_rules)
            .cloned()
            .collect();
        Self::new(files, &rules, settings.chord_timeout())
    }

    pub fn contexts(&self) -> &Rc<ContextKeys> {
        &self.contexts
    }

    pub fn commands(&self) -> &Rc<CommandRegistry> {
        &self.commands
    }

    pub fn resolver(&self) -> &KeybindingResolver {
        &self.resolver
    }

    pub fn ui(&self) -> &UiState {
        &self.shared.ui
    }

    pub fn should_quit(&self) -> bool {
        self.shared.ui.quit_requested()
    }

    pub fn store(&self) -> Ref<'_, EditorLayoutStore> {
        self.shared.store.borrow()
    }

    /// 绕过命令注册表的直接 UI 操作（点击、拖拽）
    pub fn with_store<R>(&self, f: impl FnOnce(&mut EditorLayoutStore) -> R) -> R {
        self.shared.with_store(f)
    }

    pub fn pending_chord(&self) -> Option<&KeyCombo> {
        self.resolver.pending_chord()
    }

    pub async fn handle_key(&mut self, press: &KeyPress) -> KeyOutcome {
        self.resolver.handle_key(press).await
    }

    pub async fn handle_key_at(&mut self, press: &KeyPress, now: Instant) -> KeyOutcome {
        self.resolver.handle_key_at(press, now).await
    }

    pub fn tick(&mut self, now: Instant) {
        self.resolver.expire_at(now);
    }

    pub async fn execute(&self, id: &str, args: CommandArgs) -> CommandResult {
        self.commands.execute(id, args).await
    }

    pub fn insert_text(&self, text: &str) -> bool {
        self.edit_active(|content| content.push_str(text))
    }

    pub fn delete_backward(&self) -> bool {
        self.edit_active(|content| {
            content.pop();
        })
    }

    fn edit_active(&self, edit: impl FnOnce(&mut String)) -> bool {
        self.with_store(|store| {
            let Some((pane, tab)) = store
                .active_pane()
                .and_then(|pane| pane.active_tab().map(|tab| (pane.id, tab.id)))
            else {
                return false;
            };
            store.edit_content(pane, tab, edit)
        })
    }
}

fn register_builtin_commands(commands: &Rc<CommandRegistry>, shared: &Shared) -> Vec<CommandBinding> {
    vec![
        bind(commands, shared, ids::OPEN_FILE, open_file),
        bind(commands, shared, ids::NEW_UNTITLED_FILE, new_untitled_file),
        bind(commands, shared, ids::NEW_FOLDER, new_folder),
        bind(commands, shared, ids::SAVE, save),
        bind(commands, shared, ids::SAVE_AS, save_as),
        bind(commands, shared, ids::CLOSE_ACTIVE_EDITOR, close_active_editor),
        bind(commands, shared, ids::QUIT, |s, _| async move {
            tracing::info!("quit requested");
            s.ui.request_quit();
            Ok(())
        }),
        bind(commands, shared, ids::TOGGLE_SIDEBAR, |s, _| async move {
            s.ui.toggle_sidebar();
            Ok(())
        }),
        bind(commands, shared, ids::TOGGLE_CHAT, |s, _| async move {
            s.ui.toggle_chat();
            Ok(())
        }),
        bind(commands, shared, ids::TOGGLE_TERMINAL, |s, _| async move {
            s.ui.toggle_terminal();
            Ok(())
        }),
        bind(commands, shared, ids::TOGGLE_PANEL, |s, _| async move {
            s.ui.toggle_terminal();
            Ok(())
        }),
        bind(commands, shared, ids::SPLIT_EDITOR, |s, args| async move {
            split(&s, &args, ids::SPLIT_EDITOR, SplitDirection::Vertical)
        }),
        bind(commands, shared, ids::SPLIT_EDITOR_DOWN, |s, args| async move {
            split(&s, &args, ids::SPLIT_EDITOR_DOWN, SplitDirection::Horizontal)
        }),
        bind(commands, shared, ids::CLOSE_ALL_EDITORS, |s, _| async move {
            s.with_store(EditorLayoutStore::close_all_tabs);
            Ok(())
        }),
        bind(commands, shared, ids::CLOSE_EDITORS_IN_GROUP, |s, args| async move {
            let pane = s.pane_arg(&args, ids::CLOSE_EDITORS_IN_GROUP, 0)?;
            s.with_store(|store| store.close_tabs_in_pane(pane));
            Ok(())
        }),
        bind(commands, shared, ids::CLOSE_GROUP, |s, args| async move {
            let pane = s.pane_arg(&args, ids::CLOSE_GROUP, 0)?;
            if !s.with_store(|store| store.close_pane(pane)) {
                tracing::debug!(pane = %pane, "close group refused");
            }
            Ok(())
        }),
        bind(commands, shared, ids::CLOSE_ALL_GROUPS, |s, _| async move {
            s.with_store(EditorLayoutStore::close_all_panes);
            Ok(())
        }),
        bind(commands, shared, ids::NEXT_EDITOR, |s, args| async move {
            let pane = s.pane_arg(&args, ids::NEXT_EDITOR, 0)?;
            s.with_store(|store| store.next_tab(pane));
            Ok(())
        }),
        bind(commands, shared, ids::PREVIOUS_EDITOR, |s, args| async move {
            let pane = s.pane_arg(&args, ids::PREVIOUS_EDITOR, 0)?;
            s.with_store(|store| store.prev_tab(pane));
            Ok(())
        }),
    ]
}

fn bind<F, Fut>(
    commands: &Rc<CommandRegistry>,
    shared: &Shared,
    id: &'static str,
    handler: F,
) -> CommandBinding
where
    F: Fn(Shared, CommandArgs) -> Fut + 'static,
    Fut: Future<Output = CommandResult> + 'static,
{
    let shared = shared.clone();
    commands.bind(id, move |args| handler(shared.clone(), args))
}

fn split(s: &Shared, args: &CommandArgs, command: &str, direction: SplitDirection) -> CommandResult {
    let pane = s.pane_arg(args, command, 0)?;
    if s.with_store(|store| store.split_pane(pane, direction)).is_none() {
        tracing::debug!(pane = %pane, "split target not found");
    }
    Ok(())
}

async fn open_file(s: Shared, args: CommandArgs) -> CommandResult {
    let path: PathBuf = args.require(ids::OPEN_FILE, 0)?;
    let already_open = s
        .store
        .borrow()
        .active_pane()
        .is_some_and(|pane| pane.tab_by_path(&path).is_some());
    let content = if already_open {
        String::new()
    } else {
        s.files.read_file(&path)?
    };
    let tab = s.with_store(|store| store.open_file(path, content));
    tracing::debug!(tab = %tab, "file opened");
    Ok(())
}

async fn new_untitled_file(s: Shared, _args: CommandArgs) -> CommandResult {
    let n = s.untitled.next.get() + 1;
    s.untitled.next.set(n);
    let tab = s.with_store(|store| store.open_file(format!("Untitled-{}", n), String::new()));
    s.untitled.tabs.borrow_mut().insert(tab);
    Ok(())
}

async fn new_folder(s: Shared, args: CommandArgs) -> CommandResult {
    let path: PathBuf = args.require(ids::NEW_FOLDER, 0)?;
    s.files.create_dir_all(&path)?;
    Ok(())
}

async fn save(s: Shared, args: CommandArgs) -> CommandResult {
    let Some((_, tab, path, content)) = s.active_document() else {
        tracing::debug!("save: no active editor");
        return Ok(());
    };
    if s.untitled.tabs.borrow().contains(&tab) {
        return save_as(s, args).await;
    }
    s.files.write_file(&path, &content)?;
    tracing::info!(path = %path.display(), "saved");
    Ok(())
}

/// 把活动缓冲区写到新路径，并用该路径的标签替换原标签
async fn save_as(s: Shared, args: CommandArgs) -> CommandResult {
    let path: PathBuf = args.require(ids::SAVE_AS, 0)?;
    let Some((pane, old_tab, _, content)) = s.active_document() else {
        tracing::debug!("save as: no active editor");
        return Ok(());
    };
    s.files.write_file(&path, &content)?;

    s.with_store(|store| {
        if let Some(new_tab) = store.open_file_in(pane, path.clone(), content.clone()) {
            store.update_content(pane, new_tab, content);
            if new_tab != old_tab {
                store.close_tab(pane, old_tab);
                store.set_active_tab(pane, new_tab);
            }
        }
    });
    s.untitled.tabs.borrow_mut().remove(&old_tab);
    tracing::info!(path = %path.display(), "saved as");
    Ok(())
}

async fn close_active_editor(s: Shared, args: CommandArgs) -> CommandResult {
    let pane = args.optional::<PaneId>(ids::CLOSE_ACTIVE_EDITOR, 0)?;
    let tab = args.optional::<TabId>(ids::CLOSE_ACTIVE_EDITOR, 1)?;
    s.with_store(|store| match (pane, tab) {
        (Some(pane), Some(tab)) => store.close_tab(pane, tab),
        (Some(pane), None) => match store.pane(pane).and_then(|p| p.active_tab) {
            Some(tab) => store.close_tab(pane, tab),
            None => false,
        },
        _ => store.close_active_tab(),
    });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/app/workbench.rs"]
mod tests;
