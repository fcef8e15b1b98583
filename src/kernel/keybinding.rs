//! 快捷键解析：按键 → 命令（支持两段式和弦与 when 条件）
//!
//! 状态只有两种：Idle 与 AwaitingChord（记录第一段组合键和截止时间）。
//! 超时通过比较下一次按键的时间与截止时间判断，也可以由宿主调用 `expire_at` 主动清理。

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::core::context::TERMINAL_FOCUSED;
use crate::core::{CommandArgs, CommandRegistry, ContextKeys, KeyCombo, KeyPress, KeySequence, When};
use crate::kernel::services::ports::{KeybindingRule, DEFAULT_CHORD_TIMEOUT_MS};

pub const DEFAULT_CHORD_TIMEOUT: Duration = Duration::from_millis(DEFAULT_CHORD_TIMEOUT_MS);

#[derive(Debug, Clone, PartialEq)]
pub struct Keybinding {
    pub sequence: KeySequence,
    pub command: CompactString,
    pub when: Option<When>,
    pub args: Vec<Value>,
}

impl Keybinding {
    pub fn new(sequence: KeySequence, command: impl Into<CompactString>) -> Self {
        Self {
            sequence,
            command: command.into(),
            when: None,
            args: Vec::new(),
        }
    }

    pub fn from_rule(rule: &KeybindingRule) -> Option<Self> {
        let command = rule.command.trim();
        if command.is_empty() {
            tracing::warn!(key = %rule.key, "skipping keybinding without a command");
            return None;
        }
        let Some(sequence) = KeySequence::parse(&rule.key) else {
            tracing::warn!(key = %rule.key, command, "skipping keybinding with invalid key");
            return None;
        };

        Some(Self {
            sequence,
            command: command.into(),
            when: rule.when.as_deref().and_then(When::parse),
            args: rule.arg_list(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordState {
    Idle,
    AwaitingChord { first: KeyCombo, deadline: Instant },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// 拦截被抑制（文本输入框或终端获得焦点）
    Ignored,
    /// 无绑定，宿主保留默认处理
    PassThrough,
    ChordStarted,
    /// 和弦第二段未匹配任何绑定，按键被吞掉
    ChordCancelled,
    Dispatched { command: CompactString },
    Failed { command: CompactString },
}

impl KeyOutcome {
    pub fn prevents_default(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored | KeyOutcome::PassThrough)
    }
}

enum Step {
    Done(KeyOutcome),
    Execute(Keybinding),
}

pub struct KeybindingResolver {
    contexts: Rc<ContextKeys>,
    commands: Rc<CommandRegistry>,
    single: FxHashMap<KeyCombo, Vec<Keybinding>>,
    chords: FxHashMap<KeyCombo, Vec<Keybinding>>,
    timeout: Duration,
    state: ChordState,
}

impl KeybindingResolver {
    pub fn new(
        contexts: Rc<ContextKeys>,
        commands: Rc<CommandRegistry>,
        bindings: impl IntoIterator<Item = Keybinding>,
    ) -> Self {
        let mut single: FxHashMap<KeyCombo, Vec<Keybinding>> = FxHashMap::default();
        let mut chords: FxHashMap<KeyCombo, Vec<Keybinding>> = FxHashMap::default();
        for binding in bindings {
            let table = if binding.sequence.is_chord() {
                &mut chords
            } else {
                &mut single
            };
            table
                .entry(binding.sequence.first().clone())
                .or_default()
                .push(binding);
        }

        Self {
            contexts,
            commands,
            single,
            chords,
            timeout: DEFAULT_CHORD_TIMEOUT,
            state: ChordState::Idle,
        }
    }

    /// 跳过无效规则，其余规则保持原顺序
    pub fn from_rules(
        contexts: Rc<ContextKeys>,
        commands: Rc<CommandRegistry>,
        rules: &[KeybindingRule],
    ) -> Self {
        Self::new(
            contexts,
            commands,
            rules.iter().filter_map(Keybinding::from_rule),
        )
    }

    pub fn with_chord_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn chord_timeout(&self) -> Duration {
        self.timeout
    }

    pub fn state(&self) -> &ChordState {
        &self.state
    }

    pub fn pending_chord(&self) -> Option<&KeyCombo> {
        match &self.state {
            ChordState::Idle => None,
            ChordState::AwaitingChord { first, .. } => Some(first),
        }
    }

    pub fn binding_count(&self) -> usize {
        self.single.values().chain(self.chords.values()).map(Vec::len).sum()
    }

    /// 丢弃已超过截止时间的待定和弦
    pub fn expire_at(&mut self, now: Instant) -> bool {
        match &self.state {
            ChordState::AwaitingChord { first, deadline } if now >= *deadline => {
                tracing::debug!(key = %first, "chord timed out");
                self.state = ChordState::Idle;
                true
            }
            _ => false,
        }
    }

    pub async fn handle_key(&mut self, press: &KeyPress) -> KeyOutcome {
        self.handle_key_at(press, Instant::now()).await
    }

    pub async fn handle_key_at(&mut self, press: &KeyPress, now: Instant) -> KeyOutcome {
        match self.step(press, now) {
            Step::Done(outcome) => outcome,
            Step::Execute(binding) => self.dispatch(binding).await,
        }
    }

    fn step(&mut self, press: &KeyPress, now: Instant) -> Step {
        if press.from_text_input || self.contexts.get(TERMINAL_FOCUSED) {
            return Step::Done(KeyOutcome::Ignored);
        }
        let Some(combo) = press.combo() else {
            return Step::Done(KeyOutcome::PassThrough);
        };

        self.expire_at(now);

        if let ChordState::AwaitingChord { first, .. } =
            std::mem::replace(&mut self.state, ChordState::Idle)
        {
            let matched = self.chords.get(&first).and_then(|candidates| {
                candidates
                    .iter()
                    .find(|b| b.sequence.second() == Some(&combo) && self.is_enabled(b))
            });
            return match matched {
                Some(binding) => Step::Execute(binding.clone()),
                None => {
                    tracing::debug!(first = %first, key = %combo, "chord cancelled");
                    Step::Done(KeyOutcome::ChordCancelled)
                }
            };
        }

        if self.chords.contains_key(&combo) {
            tracing::trace!(key = %combo, "chord started");
            self.state = ChordState::AwaitingChord {
                first: combo,
                deadline: now + self.timeout,
            };
            return Step::Done(KeyOutcome::ChordStarted);
        }

        let matched = self
            .single
            .get(&combo)
            .and_then(|candidates| candidates.iter().find(|b| self.is_enabled(b)));
        match matched {
            Some(binding) => Step::Execute(binding.clone()),
            None => Step::Done(KeyOutcome::PassThrough),
        }
    }

    fn is_enabled(&self, binding: &Keybinding) -> bool {
        binding
            .when
            .as_ref()
            .map_or(true, |when| self.contexts.evaluate(when))
    }

    async fn dispatch(&self, binding: Keybinding) -> KeyOutcome {
        let Keybinding {
            sequence,
            command,
            args,
            ..
        } = binding;
        tracing::debug!(key = %sequence, command = %command, "keybinding matched");

        match self.commands.execute(&command, CommandArgs::new(args)).await {
            Ok(()) => KeyOutcome::Dispatched { command },
            Err(e) => {
                tracing::error!(command = %command, error = %e, "command failed");
                KeyOutcome::Failed { command }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/keybinding.rs"]
mod tests;
