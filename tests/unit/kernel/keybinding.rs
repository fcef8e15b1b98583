use super::*;
use crate::core::{CommandError, Modifiers};
use serde_json::json;
use std::cell::RefCell;

struct Harness {
    contexts: Rc<ContextKeys>,
    commands: Rc<CommandRegistry>,
    log: Rc<RefCell<Vec<String>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            contexts: Rc::new(ContextKeys::new()),
            commands: Rc::new(CommandRegistry::new()),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn record(&self, id: &str) {
        let log = Rc::clone(&self.log);
        let name = id.to_string();
        self.commands.register(id, move |args: CommandArgs| {
            let log = Rc::clone(&log);
            let entry = match args.str(0) {
                Some(arg) => format!("{name}({arg})"),
                None => name.clone(),
            };
            async move {
                log.borrow_mut().push(entry);
                Ok(())
            }
        });
    }

    fn resolver(&self, rules: &[KeybindingRule]) -> KeybindingResolver {
        KeybindingResolver::from_rules(Rc::clone(&self.contexts), Rc::clone(&self.commands), rules)
    }

    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

fn dispatched(command: &str) -> KeyOutcome {
    KeyOutcome::Dispatched {
        command: command.into(),
    }
}

#[tokio::test]
async fn test_single_key_dispatch() {
    let h = Harness::new();
    let log = Rc::clone(&h.log);
    h.commands.register("file.new", move |_args| {
        let log = Rc::clone(&log);
        async move {
            log.borrow_mut().push("created".to_string());
            Ok(())
        }
    });
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+n", "file.new")]);

    let outcome = resolver.handle_key(&KeyPress::ctrl("n")).await;
    assert_eq!(outcome, dispatched("file.new"));
    assert!(outcome.prevents_default());
    assert_eq!(h.log(), vec!["created"]);
}

#[tokio::test]
async fn test_unbound_key_passes_through() {
    let h = Harness::new();
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+n", "file.new")]);

    let outcome = resolver.handle_key(&KeyPress::simple("a")).await;
    assert_eq!(outcome, KeyOutcome::PassThrough);
    assert!(!outcome.prevents_default());
}

#[tokio::test]
async fn test_chord_within_timeout() {
    let h = Harness::new();
    h.record("copyPath");
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+k ctrl+c", "copyPath")]);
    let t0 = Instant::now();

    let first = resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await;
    assert_eq!(first, KeyOutcome::ChordStarted);
    assert!(first.prevents_default());
    assert_eq!(resolver.pending_chord().unwrap().as_str(), "ctrl+k");

    let second = resolver
        .handle_key_at(&KeyPress::ctrl("c"), t0 + Duration::from_millis(500))
        .await;
    assert_eq!(second, dispatched("copyPath"));
    assert_eq!(resolver.state(), &ChordState::Idle);
    assert_eq!(h.log(), vec!["copyPath"]);
}

#[tokio::test]
async fn test_chord_after_timeout_invokes_nothing() {
    let h = Harness::new();
    h.record("copyPath");
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+k ctrl+c", "copyPath")]);
    let t0 = Instant::now();

    resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await;
    let late = resolver
        .handle_key_at(&KeyPress::ctrl("c"), t0 + Duration::from_millis(1500))
        .await;

    assert_eq!(late, KeyOutcome::PassThrough);
    assert_eq!(resolver.state(), &ChordState::Idle);
    assert!(h.log().is_empty());
}

#[tokio::test]
async fn test_expire_at_clears_pending_chord() {
    let h = Harness::new();
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+k ctrl+c", "copyPath")]);
    let t0 = Instant::now();

    resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await;
    assert!(!resolver.expire_at(t0 + Duration::from_millis(999)));
    assert!(resolver.pending_chord().is_some());
    assert!(resolver.expire_at(t0 + DEFAULT_CHORD_TIMEOUT));
    assert!(resolver.pending_chord().is_none());
    assert!(!resolver.expire_at(t0 + DEFAULT_CHORD_TIMEOUT));
}

#[tokio::test]
async fn test_custom_chord_timeout() {
    let h = Harness::new();
    h.record("copyPath");
    let mut resolver = h
        .resolver(&[KeybindingRule::new("ctrl+k ctrl+c", "copyPath")])
        .with_chord_timeout(Duration::from_millis(100));
    assert_eq!(resolver.chord_timeout(), Duration::from_millis(100));
    let t0 = Instant::now();

    resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await;
    let outcome = resolver
        .handle_key_at(&KeyPress::ctrl("c"), t0 + Duration::from_millis(200))
        .await;
    assert_eq!(outcome, KeyOutcome::PassThrough);
}

#[tokio::test]
async fn test_unmatched_second_key_cancels_chord() {
    let h = Harness::new();
    h.record("copyPath");
    h.record("file.new");
    let mut resolver = h.resolver(&[
        KeybindingRule::new("ctrl+k ctrl+c", "copyPath"),
        KeybindingRule::new("ctrl+n", "file.new"),
    ]);
    let t0 = Instant::now();

    resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await;
    let outcome = resolver
        .handle_key_at(&KeyPress::ctrl("n"), t0 + Duration::from_millis(10))
        .await;
    assert_eq!(outcome, KeyOutcome::ChordCancelled);
    assert!(outcome.prevents_default());
    assert_eq!(resolver.state(), &ChordState::Idle);
    assert!(h.log().is_empty());

    let outcome = resolver
        .handle_key_at(&KeyPress::ctrl("n"), t0 + Duration::from_millis(20))
        .await;
    assert_eq!(outcome, dispatched("file.new"));
}

#[tokio::test]
async fn test_modifier_press_keeps_chord_pending() {
    let h = Harness::new();
    h.record("copyPath");
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+k ctrl+c", "copyPath")]);
    let t0 = Instant::now();

    resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await;
    let outcome = resolver
        .handle_key_at(&KeyPress::new("Control", Modifiers::CTRL), t0)
        .await;
    assert_eq!(outcome, KeyOutcome::PassThrough);
    assert!(resolver.pending_chord().is_some());

    let outcome = resolver
        .handle_key_at(&KeyPress::ctrl("c"), t0 + Duration::from_millis(50))
        .await;
    assert_eq!(outcome, dispatched("copyPath"));
}

#[tokio::test]
async fn test_when_guard_selects_unguarded_binding() {
    let h = Harness::new();
    h.record("sidebar.only");
    h.record("always");
    h.contexts.set("sidebarVisible", false);
    let mut resolver = h.resolver(&[
        KeybindingRule::new("ctrl+e", "sidebar.only").with_when("sidebarVisible"),
        KeybindingRule::new("ctrl+e", "always"),
    ]);

    let outcome = resolver.handle_key(&KeyPress::ctrl("e")).await;
    assert_eq!(outcome, dispatched("always"));
    assert_eq!(h.log(), vec!["always"]);

    h.contexts.set("sidebarVisible", true);
    let outcome = resolver.handle_key(&KeyPress::ctrl("e")).await;
    assert_eq!(outcome, dispatched("sidebar.only"));
}

#[tokio::test]
async fn test_first_matching_binding_wins() {
    let h = Harness::new();
    h.record("first");
    h.record("second");
    let mut resolver = h.resolver(&[
        KeybindingRule::new("ctrl+e", "first"),
        KeybindingRule::new("ctrl+e", "second"),
    ]);

    resolver.handle_key(&KeyPress::ctrl("e")).await;
    assert_eq!(h.log(), vec!["first"]);
}

#[tokio::test]
async fn test_guarded_out_key_passes_through() {
    let h = Harness::new();
    h.record("save");
    let mut resolver =
        h.resolver(&[KeybindingRule::new("ctrl+s", "save").with_when("editorHasOpenTabs")]);

    let outcome = resolver.handle_key(&KeyPress::ctrl("s")).await;
    assert_eq!(outcome, KeyOutcome::PassThrough);
    assert!(h.log().is_empty());
}

#[tokio::test]
async fn test_chord_second_key_respects_when() {
    let h = Harness::new();
    h.record("guarded");
    let mut resolver =
        h.resolver(&[KeybindingRule::new("ctrl+k ctrl+w", "guarded").with_when("editorHasOpenTabs")]);
    let t0 = Instant::now();

    assert_eq!(
        resolver.handle_key_at(&KeyPress::ctrl("k"), t0).await,
        KeyOutcome::ChordStarted
    );
    assert_eq!(
        resolver.handle_key_at(&KeyPress::ctrl("w"), t0).await,
        KeyOutcome::ChordCancelled
    );
}

#[tokio::test]
async fn test_text_input_is_ignored() {
    let h = Harness::new();
    h.record("file.new");
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+n", "file.new")]);

    let outcome = resolver.handle_key(&KeyPress::ctrl("n").in_text_input()).await;
    assert_eq!(outcome, KeyOutcome::Ignored);
    assert!(!outcome.prevents_default());
    assert!(h.log().is_empty());
}

#[tokio::test]
async fn test_focused_terminal_suppresses_bindings() {
    let h = Harness::new();
    h.record("file.new");
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+n", "file.new")]);
    h.contexts.set(TERMINAL_FOCUSED, true);

    assert_eq!(
        resolver.handle_key(&KeyPress::ctrl("n")).await,
        KeyOutcome::Ignored
    );
    h.contexts.set(TERMINAL_FOCUSED, false);
    assert_eq!(
        resolver.handle_key(&KeyPress::ctrl("n")).await,
        dispatched("file.new")
    );
}

#[tokio::test]
async fn test_binding_args_are_forwarded() {
    let h = Harness::new();
    h.record("open");
    let mut resolver =
        h.resolver(&[KeybindingRule::new("ctrl+o", "open").with_args(vec![json!("/a.txt")])]);

    resolver.handle_key(&KeyPress::ctrl("o")).await;
    assert_eq!(h.log(), vec!["open(/a.txt)"]);
}

#[tokio::test]
async fn test_failing_command_reports_failed() {
    let h = Harness::new();
    h.commands.register("broken", |_args| async {
        Err(CommandError::failed("broken", "nope"))
    });
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+x", "broken")]);

    let outcome = resolver.handle_key(&KeyPress::ctrl("x")).await;
    assert_eq!(
        outcome,
        KeyOutcome::Failed {
            command: "broken".into()
        }
    );
    assert!(outcome.prevents_default());
}

#[tokio::test]
async fn test_unregistered_command_still_dispatches() {
    let h = Harness::new();
    let mut resolver = h.resolver(&[KeybindingRule::new("ctrl+x", "nobody.home")]);
    assert_eq!(
        resolver.handle_key(&KeyPress::ctrl("x")).await,
        dispatched("nobody.home")
    );
}

#[test]
fn test_invalid_rules_are_skipped() {
    let h = Harness::new();
    let resolver = h.resolver(&[
        KeybindingRule::new("", "empty.key"),
        KeybindingRule::new("ctrl+a+b", "two.keys"),
        KeybindingRule::new("ctrl+s", "   "),
        KeybindingRule::new("ctrl+s", "save"),
        KeybindingRule::new("ctrl+k ctrl+s", "saveAll"),
    ]);
    assert_eq!(resolver.binding_count(), 2);
}

#[test]
fn test_from_rule_blank_when_is_unguarded() {
    let rule = KeybindingRule::new("ctrl+s", "save").with_when("  ");
    let binding = Keybinding::from_rule(&rule).unwrap();
    assert!(binding.when.is_none());
    assert_eq!(binding.sequence.to_string(), "ctrl+s");
}

#[tokio::test]
async fn test_resolver_from_prebuilt_bindings() {
    let h = Harness::new();
    h.record("palette");
    let mut binding = Keybinding::new(KeySequence::parse("ctrl+shift+p").unwrap(), "palette");
    binding.when = When::parse("!terminalVisible");
    let mut resolver = KeybindingResolver::new(
        Rc::clone(&h.contexts),
        Rc::clone(&h.commands),
        vec![binding],
    );
    assert_eq!(resolver.binding_count(), 1);

    let outcome = resolver.handle_key(&KeyPress::ctrl_shift("P")).await;
    assert_eq!(outcome, dispatched("palette"));
}
