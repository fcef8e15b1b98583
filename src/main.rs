use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde_json::Value;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use zdesk::app::render::render;
use zdesk::app::{ids, Workbench};
use zdesk::core::{CommandArgs, KeyPress};
use zdesk::kernel::services::adapters::{
    ensure_settings_file, load_keybindings, load_settings, resolve_resource, LocalFileProvider,
    KEYBINDINGS_RESOURCE,
};
use zdesk::kernel::services::ports::FileProvider;

mod logging;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

type Backend = CrosstermBackend<io::Stdout>;

fn main() -> io::Result<()> {
    let _logging = logging::init();

    if let Err(e) = ensure_settings_file() {
        tracing::warn!(error = %e, "failed to create settings file");
    }
    let settings = load_settings();
    let resource_rules = settings
        .keybindings_file
        .clone()
        .or_else(|| resolve_resource(KEYBINDINGS_RESOURCE))
        .map(|path| load_keybindings(&path))
        .unwrap_or_default();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let files: Rc<dyn FileProvider> = Rc::new(LocalFileProvider::new());
    let mut workbench = Workbench::from_settings(files, &settings, &resource_rules);

    runtime.block_on(async {
        for path in std::env::args_os().skip(1) {
            let path = path.to_string_lossy().into_owned();
            let args = CommandArgs::new(vec![Value::String(path.clone())]);
            if let Err(e) = workbench.execute(ids::OPEN_FILE, args).await {
                tracing::warn!(path = %path, error = %e, "failed to open file from command line");
            }
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = runtime.block_on(run(&mut terminal, &mut workbench));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn run(terminal: &mut Terminal<Backend>, workbench: &mut Workbench) -> io::Result<()> {
    while !workbench.should_quit() {
        terminal.draw(|frame| render(frame, workbench))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(workbench, &key).await;
                }
            }
        }
        workbench.tick(Instant::now());
    }
    tracing::info!("exiting");
    Ok(())
}

/// Keys the resolver leaves alone are typed into the active editor.
async fn handle_key(workbench: &mut Workbench, event: &KeyEvent) {
    let Some(press) = KeyPress::from_key_event(event) else {
        return;
    };
    let outcome = workbench.handle_key(&press).await;
    if outcome.prevents_default() || workbench.ui().terminal_focused() {
        return;
    }

    if press.key == "backspace" && press.modifiers.is_empty() {
        workbench.delete_backward();
    } else if let Some(text) = press.text() {
        workbench.insert_text(&text);
    }
}
