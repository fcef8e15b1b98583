use super::*;
use serde_json::json;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert!(settings.keybindings_file.is_none());
    assert_eq!(settings.chord_timeout_ms, DEFAULT_CHORD_TIMEOUT_MS);
    assert_eq!(settings.chord_timeout(), Duration::from_millis(1000));
    assert!(settings.keybindings.is_empty());
}

#[test]
fn test_partial_settings_fill_defaults() {
    let settings: Settings = serde_json::from_str(r#"{ "keybindings": [] }"#).unwrap();
    assert_eq!(settings.chord_timeout_ms, 1000);

    let settings: Settings = serde_json::from_str(r#"{ "chord_timeout_ms": 250 }"#).unwrap();
    assert_eq!(settings.chord_timeout(), Duration::from_millis(250));
}

#[test]
fn test_rule_deserialize() {
    let rule: KeybindingRule = serde_json::from_value(json!({
        "key": "ctrl+k ctrl+c",
        "command": "copyPath",
        "when": "editorHasOpenTabs"
    }))
    .unwrap();
    assert_eq!(rule.key, "ctrl+k ctrl+c");
    assert_eq!(rule.when.as_deref(), Some("editorHasOpenTabs"));
    assert!(rule.arg_list().is_empty());
}

#[test]
fn test_rule_arg_list_shapes() {
    let list = KeybindingRule::new("a", "b").with_args(vec![json!(1), json!("x")]);
    assert_eq!(list.arg_list(), vec![json!(1), json!("x")]);

    let mut single = KeybindingRule::new("a", "b");
    single.args = json!({ "path": "/tmp" });
    assert_eq!(single.arg_list(), vec![json!({ "path": "/tmp" })]);
}

#[test]
fn test_rule_serialize_skips_empty_fields() {
    let value = serde_json::to_value(KeybindingRule::new("ctrl+s", "save")).unwrap();
    assert_eq!(value, json!({ "key": "ctrl+s", "command": "save" }));
}
