use std::cell::RefCell;
use std::fs;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use nav_guard::config::{DEFAULT_MAX_SAVE_ATTEMPTS, GuardConfig, SaveFailurePolicy};
use nav_guard::desk::Desk;
use nav_guard::drivers::{ConsoleInputDriver, InputDriver};
use nav_guard::event_loop::{ControlFlow, EventLoop};
use nav_guard::guard::NavigationGuard;
use nav_guard::log_buffer::{DEFAULT_MAX_LINES, LogBufferHandle, set_global_log_buffer};
use nav_guard::panels::{EditorPanel, FocusHandle, InfoPanel, PanelId};
use nav_guard::terminal_prompt::TerminalPrompt;
use nav_guard::tracing_sub;

#[derive(Parser, Debug)]
#[command(
    name = "nav-guard",
    version = env!("CARGO_PKG_VERSION"),
    about = "Switch between editor panels; leaving one with unsaved changes asks first"
)]
struct Cli {
    /// Titles of the editor panels to open, comma separated.
    #[arg(
        short = 'p',
        long = "panels",
        value_name = "TITLES",
        value_delimiter = ',',
        default_value = "Report,Notes"
    )]
    panels: Vec<String>,

    /// Directory editors load from and save to. Without it, saves stay in memory.
    #[arg(short = 'd', long = "save-dir", value_name = "DIR")]
    save_dir: Option<PathBuf>,

    /// Add a read-only help panel that has nothing to save.
    #[arg(long = "plain-panel", value_name = "BOOL", default_value_t = true, action = clap::ArgAction::Set)]
    plain_panel: bool,

    /// How many log lines to keep in memory.
    #[arg(long = "log-lines", value_name = "N", default_value_t = DEFAULT_MAX_LINES)]
    log_lines: usize,

    /// Log level written to the in-memory log.
    #[arg(long = "log-level", value_name = "LEVEL", default_value_t = tracing::Level::DEBUG)]
    log_level: tracing::Level,

    /// What to do when saving fails after choosing Save.
    #[arg(long = "on-save-failure", value_enum, default_value_t = SaveFailurePolicy::Reprompt)]
    on_save_failure: SaveFailurePolicy,

    /// Prompts allowed for one switch when saves keep failing.
    #[arg(long = "max-save-attempts", value_name = "N", default_value_t = DEFAULT_MAX_SAVE_ATTEMPTS)]
    max_save_attempts: usize,

    /// Do not ask about a dirty panel that was hidden before the switch.
    #[arg(long = "skip-unwatched-previous")]
    skip_unwatched_previous: bool,
}

impl Cli {
    fn validate(&self) -> Result<(), String> {
        if self.panels.iter().all(|title| title.trim().is_empty()) {
            return Err("at least one panel title is required".to_string());
        }
        if self.log_lines == 0 {
            return Err("log-lines must be at least 1".to_string());
        }
        if self.max_save_attempts == 0 {
            return Err("max-save-attempts must be at least 1".to_string());
        }
        Ok(())
    }

    fn guard_config(&self) -> GuardConfig {
        GuardConfig::new()
            .with_skip_unwatched_previous(self.skip_unwatched_previous)
            .with_save_failure_policy(self.on_save_failure)
            .with_max_save_attempts(self.max_save_attempts)
    }
}

type DemoTerminal = Terminal<CrosstermBackend<Stdout>>;

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    cli.validate()
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let log = LogBufferHandle::new(cli.log_lines);
    set_global_log_buffer(log.clone());
    tracing_sub::init(cli.log_level);

    if let Some(dir) = &cli.save_dir {
        fs::create_dir_all(dir)?;
    }

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Rc::new(RefCell::new(Terminal::new(CrosstermBackend::new(stdout))?));
    let driver = Rc::new(RefCell::new(ConsoleInputDriver::new()));
    driver.borrow_mut().set_mouse_capture(true)?;

    let result = run(&cli, terminal.clone(), driver.clone(), log);

    let _ = driver.borrow_mut().set_mouse_capture(false);
    terminal::disable_raw_mode()?;
    let mut terminal = terminal.borrow_mut();
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(
    cli: &Cli,
    terminal: Rc<RefCell<DemoTerminal>>,
    driver: Rc<RefCell<ConsoleInputDriver>>,
    log: LogBufferHandle,
) -> io::Result<()> {
    let prompt = TerminalPrompt::new(terminal.clone(), driver.clone());
    let guard = NavigationGuard::with_config(prompt.clone(), cli.guard_config());
    let focus = FocusHandle::new();
    let desk = Rc::new(Desk::new(guard, focus.clone()).with_log(log.clone()));
    open_panels(cli, &desk, &focus, log)?;

    // Weak: the prompt is owned by the guard, which the desk owns.
    let backdrop = Rc::downgrade(&desk);
    prompt.set_backdrop(move |frame| {
        if let Some(desk) = backdrop.upgrade() {
            desk.render(frame);
        }
    });

    if let Some(first) = desk.panel_ids().first().copied() {
        desk.focus(first);
    }
    tracing::info!(panels = desk.panel_ids().len(), "nav-guard started");

    let mut event_loop = EventLoop::new(driver, Duration::from_millis(50));
    event_loop.run(|event| match event {
        None => {
            terminal.borrow_mut().draw(|frame| desk.render(frame))?;
            Ok(ControlFlow::Continue)
        }
        Some(event) => Ok(desk.handle_event(&event)),
    })
}

fn open_panels(
    cli: &Cli,
    desk: &Desk,
    focus: &FocusHandle,
    log: LogBufferHandle,
) -> io::Result<()> {
    let titles = cli.panels.iter().map(|t| t.trim()).filter(|t| !t.is_empty());
    let mut next_id = 0;
    for title in titles {
        let id = PanelId(next_id);
        next_id += 1;
        let editor = match &cli.save_dir {
            Some(dir) => EditorPanel::open(id, title, save_path(dir, title), focus.clone())?,
            None => EditorPanel::new(id, title, focus.clone()),
        };
        desk.add(editor);
    }
    if cli.plain_panel {
        desk.add(InfoPanel::new(
            PanelId(next_id),
            "Help",
            focus.clone(),
            Some(log),
        ));
    }
    Ok(())
}

fn save_path(dir: &Path, title: &str) -> PathBuf {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    dir.join(format!("{stem}.txt"))
}
