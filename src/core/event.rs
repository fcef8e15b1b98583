//! 按键事件与规范化的组合键
//!
//! - KeyPress: 宿主上报的一次按下（原始键名 + 修饰键 + 是否来自文本输入框）
//! - KeyCombo: 规范化字符串，修饰键固定顺序 ctrl,shift,alt,cmd，键名小写，`+` 连接
//! - KeySequence: 单个组合键，或两段式和弦（`ctrl+k ctrl+c`）

use compact_str::CompactString;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub cmd: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        cmd: false,
    };
    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };
    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };
    pub const CMD: Self = Self {
        cmd: true,
        ..Self::NONE
    };
    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }

    /// shift 以外的修饰键，用于区分输入文本和快捷键
    pub fn has_command_modifier(self) -> bool {
        self.ctrl || self.alt || self.cmd
    }

    fn names(self) -> impl Iterator<Item = &'static str> {
        [
            (self.ctrl, "ctrl"),
            (self.shift, "shift"),
            (self.alt, "alt"),
            (self.cmd, "cmd"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
    }

    fn apply(&mut self, name: &str) -> bool {
        match name {
            "ctrl" | "control" => self.ctrl = true,
            "shift" => self.shift = true,
            "alt" | "option" => self.alt = true,
            "cmd" | "command" | "meta" | "super" | "win" => self.cmd = true,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: CompactString,
    pub modifiers: Modifiers,
    pub from_text_input: bool,
}

impl KeyPress {
    pub fn new(key: impl Into<CompactString>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
            from_text_input: false,
        }
    }

    pub fn simple(key: impl Into<CompactString>) -> Self {
        Self::new(key, Modifiers::NONE)
    }

    pub fn ctrl(key: impl Into<CompactString>) -> Self {
        Self::new(key, Modifiers::CTRL)
    }

    pub fn ctrl_shift(key: impl Into<CompactString>) -> Self {
        Self::new(key, Modifiers::CTRL_SHIFT)
    }

    pub fn in_text_input(mut self) -> Self {
        self.from_text_input = true;
        self
    }

    /// 单独按下修饰键时返回 `None`，它不会开始或完成任何绑定
    pub fn combo(&self) -> Option<KeyCombo> {
        let key = normalize_key(&self.key)?;
        if is_modifier_name(&key) {
            return None;
        }
        Some(KeyCombo::build(self.modifiers, &key))
    }

    /// 普通输入时这次按键要插入缓冲区的文本
    pub fn text(&self) -> Option<CompactString> {
        if self.modifiers.has_command_modifier() {
            return None;
        }
        match self.key.as_str() {
            " " => Some(CompactString::const_new(" ")),
            k if k.eq_ignore_ascii_case("enter") => Some(CompactString::const_new("\n")),
            k if k.eq_ignore_ascii_case("tab") => Some(CompactString::const_new("\t")),
            k if k.chars().count() == 1 => Some(CompactString::from(k)),
            _ => None,
        }
    }
}

#[cfg(feature = "tui")]
impl KeyPress {
    pub fn from_key_event(event: &crossterm::event::KeyEvent) -> Option<Self> {
        use crossterm::event::{KeyCode, KeyModifiers};

        let mut modifiers = Modifiers {
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            shift: event.modifiers.contains(KeyModifiers::SHIFT),
            alt: event.modifiers.contains(KeyModifiers::ALT),
            cmd: event
                .modifiers
                .intersects(KeyModifiers::SUPER | KeyModifiers::META),
        };

        let key: CompactString = match event.code {
            KeyCode::Char(ch) => {
                if ch.is_ascii_uppercase() {
                    modifiers.shift = true;
                }
                let mut buf = [0u8; 4];
                CompactString::from(&*ch.encode_utf8(&mut buf))
            }
            KeyCode::BackTab => {
                modifiers.shift = true;
                "tab".into()
            }
            KeyCode::Enter => "enter".into(),
            KeyCode::Tab => "tab".into(),
            KeyCode::Backspace => "backspace".into(),
            KeyCode::Delete => "delete".into(),
            KeyCode::Insert => "insert".into(),
            KeyCode::Esc => "esc".into(),
            KeyCode::Up => "up".into(),
            KeyCode::Down => "down".into(),
            KeyCode::Left => "left".into(),
            KeyCode::Right => "right".into(),
            KeyCode::Home => "home".into(),
            KeyCode::End => "end".into(),
            KeyCode::PageUp => "pageup".into(),
            KeyCode::PageDown => "pagedown".into(),
            KeyCode::F(n) => compact_str::format_compact!("f{}", n),
            _ => return None,
        };

        Some(Self::new(key, modifiers))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCombo(CompactString);

impl KeyCombo {
    fn build(modifiers: Modifiers, key: &str) -> Self {
        let mut out = CompactString::default();
        for name in modifiers.names() {
            out.push_str(name);
            out.push('+');
        }
        out.push_str(key);
        Self(out)
    }

    /// 解析 `ctrl+shift+p` 形式的文本；修饰键名不区分大小写并接受常见别名，必须恰好有一个非修饰键
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let (head, plus_key) = if value == "+" {
            ("", true)
        } else if let Some(head) = value.strip_suffix("++") {
            (head, true)
        } else {
            (value, false)
        };

        let mut modifiers = Modifiers::NONE;
        let mut key: Option<CompactString> = plus_key.then(|| CompactString::const_new("+"));
        for part in head.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            let lower = part.to_lowercase();
            if modifiers.apply(&lower) {
                continue;
            }
            if key.is_some() {
                return None;
            }
            key = Some(normalize_key(part)?);
        }

        Some(Self::build(modifiers, &key?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeySequence {
    Single(KeyCombo),
    Chord(KeyCombo, KeyCombo),
}

impl KeySequence {
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace();
        let first = KeyCombo::parse(parts.next()?)?;
        let Some(second) = parts.next() else {
            return Some(Self::Single(first));
        };
        let second = KeyCombo::parse(second)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::Chord(first, second))
    }

    pub fn first(&self) -> &KeyCombo {
        match self {
            Self::Single(first) | Self::Chord(first, _) => first,
        }
    }

    pub fn second(&self) -> Option<&KeyCombo> {
        match self {
            Self::Single(_) => None,
            Self::Chord(_, second) => Some(second),
        }
    }

    pub fn is_chord(&self) -> bool {
        matches!(self, Self::Chord(..))
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(first) => write!(f, "{}", first),
            Self::Chord(first, second) => write!(f, "{} {}", first, second),
        }
    }
}

fn normalize_key(key: &str) -> Option<CompactString> {
    if key == " " {
        return Some(CompactString::const_new("space"));
    }
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let lower = key.to_lowercase();
    let name = match lower.as_str() {
        "spacebar" => "space",
        "escape" => "esc",
        "del" => "delete",
        "return" => "enter",
        "arrowup" => "up",
        "arrowdown" => "down",
        "arrowleft" => "left",
        "arrowright" => "right",
        other => other,
    };
    Some(CompactString::from(name))
}

fn is_modifier_name(key: &str) -> bool {
    let mut scratch = Modifiers::NONE;
    scratch.apply(key)
}

#[cfg(test)]
#[path = "../../tests/unit/core/event.rs"]
mod tests;
