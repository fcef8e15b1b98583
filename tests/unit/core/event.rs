use super::*;

#[test]
fn test_combo_parse_orders_modifiers() {
    let combo = KeyCombo::parse("Shift+Ctrl+P").unwrap();
    assert_eq!(combo.as_str(), "ctrl+shift+p");

    let combo = KeyCombo::parse("cmd+alt+shift+ctrl+x").unwrap();
    assert_eq!(combo.as_str(), "ctrl+shift+alt+cmd+x");
}

#[test]
fn test_combo_parse_aliases() {
    assert_eq!(KeyCombo::parse("control+s").unwrap().as_str(), "ctrl+s");
    assert_eq!(KeyCombo::parse("option+up").unwrap().as_str(), "alt+up");
    assert_eq!(KeyCombo::parse("meta+k").unwrap().as_str(), "cmd+k");
    assert_eq!(KeyCombo::parse("ctrl+Escape").unwrap().as_str(), "ctrl+esc");
    assert_eq!(KeyCombo::parse("ArrowLeft").unwrap().as_str(), "left");
    assert_eq!(KeyCombo::parse("Return").unwrap().as_str(), "enter");
}

#[test]
fn test_combo_parse_plus_key() {
    assert_eq!(KeyCombo::parse("+").unwrap().as_str(), "+");
    assert_eq!(KeyCombo::parse("ctrl++").unwrap().as_str(), "ctrl++");
}

#[test]
fn test_combo_parse_rejects_invalid() {
    assert!(KeyCombo::parse("").is_none());
    assert!(KeyCombo::parse("ctrl+").is_none());
    assert!(KeyCombo::parse("ctrl+a+b").is_none());
}

#[test]
fn test_sequence_parse() {
    let single = KeySequence::parse("ctrl+s").unwrap();
    assert!(!single.is_chord());
    assert_eq!(single.first().as_str(), "ctrl+s");
    assert!(single.second().is_none());

    let chord = KeySequence::parse("  ctrl+k   ctrl+w ").unwrap();
    assert!(chord.is_chord());
    assert_eq!(chord.first().as_str(), "ctrl+k");
    assert_eq!(chord.second().unwrap().as_str(), "ctrl+w");
    assert_eq!(chord.to_string(), "ctrl+k ctrl+w");

    assert!(KeySequence::parse("ctrl+k ctrl+w ctrl+x").is_none());
    assert!(KeySequence::parse("   ").is_none());
}

#[test]
fn test_keypress_combo_matches_parsed_binding() {
    let press = KeyPress::ctrl("K");
    assert_eq!(press.combo(), KeyCombo::parse("ctrl+k"));

    let press = KeyPress::new(" ", Modifiers::CTRL);
    assert_eq!(press.combo().unwrap().as_str(), "ctrl+space");

    let press = KeyPress::ctrl_shift("p");
    assert_eq!(press.combo().unwrap().as_str(), "ctrl+shift+p");
}

#[test]
fn test_bare_modifier_has_no_combo() {
    assert!(KeyPress::simple("Control").combo().is_none());
    assert!(KeyPress::new("Shift", Modifiers::SHIFT).combo().is_none());
    assert!(KeyPress::simple("Meta").combo().is_none());
}

#[test]
fn test_keypress_text() {
    assert_eq!(KeyPress::simple("a").text().as_deref(), Some("a"));
    assert_eq!(KeyPress::new("A", Modifiers::SHIFT).text().as_deref(), Some("A"));
    assert_eq!(KeyPress::simple("enter").text().as_deref(), Some("\n"));
    assert_eq!(KeyPress::simple("tab").text().as_deref(), Some("\t"));
    assert_eq!(KeyPress::simple(" ").text().as_deref(), Some(" "));
    assert!(KeyPress::ctrl("a").text().is_none());
    assert!(KeyPress::simple("esc").text().is_none());
}

#[test]
fn test_modifiers() {
    assert!(Modifiers::NONE.is_empty());
    assert!(!Modifiers::SHIFT.has_command_modifier());
    assert!(Modifiers::ALT.has_command_modifier());
    assert!(Modifiers::CMD.has_command_modifier());
}

#[cfg(feature = "tui")]
mod crossterm_keys {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_from_key_event() {
        let event = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);
        let press = KeyPress::from_key_event(&event).unwrap();
        assert_eq!(press.combo().unwrap().as_str(), "ctrl+k");

        let event = KeyEvent::new(KeyCode::Char('P'), KeyModifiers::CONTROL);
        let press = KeyPress::from_key_event(&event).unwrap();
        assert_eq!(press.combo().unwrap().as_str(), "ctrl+shift+p");

        let event = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        let press = KeyPress::from_key_event(&event).unwrap();
        assert_eq!(press.combo().unwrap().as_str(), "shift+tab");

        let event = KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE);
        let press = KeyPress::from_key_event(&event).unwrap();
        assert_eq!(press.combo().unwrap().as_str(), "f5");
    }
}
