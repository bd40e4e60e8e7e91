mod app;
mod branch;
mod commands;
mod config;
mod data;
mod dispatch;
mod error;
mod event;
mod filter;
mod logging;
mod model;
mod navigation;
mod providers;
mod text;
mod tree;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self as ct_event, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{error, info, warn};

use crate::app::{App, ResultMessage};
use crate::config::ProjectConfig;
use crate::data::git::{self, GitWorkspaces};
use crate::data::linear::LinearClient;
use crate::dispatch::Dispatcher;
use crate::event::AppEvent;
use crate::providers::{NoTickets, TicketProvider};

#[derive(Parser)]
#[command(
    name = "sprout",
    version,
    about = "Sprout - git workspaces for your Linear tickets",
    override_help = HELP_TEXT,
    disable_help_subcommand = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Option<CliCommand>,

    /// Directory inside the repository (defaults to current directory)
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Create a workspace for a branch, optionally running a command in it
    Create {
        branch: String,

        /// Command run inside the new workspace
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// List workspaces
    List {
        /// Include the main working directory
        #[arg(long)]
        include_main: bool,
    },
    /// Remove one workspace, or every merged one
    Prune { branch: Option<String> },
    /// Check git, configuration and Linear connectivity
    Doctor,
    /// Print this help
    Help,
}

const HELP_TEXT: &str = "\
Sprout - git workspaces for your Linear tickets

USAGE:
  sprout [OPTIONS]                        Pick a ticket or type a branch name
  sprout create <BRANCH> [COMMAND...]     Create a workspace (and run COMMAND in it)
  sprout list [--include-main]            List workspaces
  sprout prune [BRANCH]                   Remove a workspace, or all merged ones
  sprout doctor                           Check the environment
  sprout help                             Print this help

MODES:
  (default)   Interactive picker. Your assigned Linear tickets are shown as
              a tree; pick one to create a workspace on a branch named after
              it, or type any branch name.

GLOBAL OPTIONS:
  --cwd <DIR>       Directory inside the repository [default: current dir]
  -h, --help        Print this help
  -V, --version     Print version

CONFIGURATION:
  .sprout.toml at the repository root:
    [linear]     api_key, team
    [workspace]  base_dir, main_branch, post_create = [\"cmd\", \"arg\"]
    [display]    tick_rate
  LINEAR_API_KEY overrides linear.api_key. SPROUT_LOG sets the log filter
  (log file: ~/.sprout/sprout.log).

TUI KEYBINDINGS:
  Up/Down            Move through tickets (wraps to the input line)
  Right / Left       Expand (loads subtasks) / collapse or go to parent
  Enter              Create workspace for ticket or typed branch
  Enter on + row     Add a subtask under the ticket
  /                  Fuzzy search tickets
  r                  Refresh tickets
  ?                  Toggle help overlay
  Esc / Ctrl+C       Quit

EXIT CODES:
  0 success, 1 failure or conflict, 2 invalid input, 3 not found,
  4 configuration error, 5 git or Linear failure

EXAMPLES:
  sprout
  sprout create spr-123-add-login
  sprout create feature/login -- code .
  sprout prune";

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(&config::sprout_home()) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "exiting with error");
            eprintln!("Error: {}", e);
            ExitCode::from(error::exit_code_for(&e))
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let cwd = resolve_cwd(cli.cwd)?;

    match cli.command {
        Some(CliCommand::Help) => {
            println!("{}", HELP_TEXT);
            Ok(0)
        }
        Some(CliCommand::Create { branch, command }) => {
            // Reject bad names before looking for a repository.
            branch::validate_branch_name(&branch)?;
            let (workspaces, config) = open_repo(&cwd)?;
            let path = commands::create(&workspaces, &branch, config.post_create(), &mut io::stdout())?;
            if command.is_empty() {
                return Ok(0);
            }
            let code = commands::run_in(&path, &command)?;
            Ok(u8::try_from(code).unwrap_or(1))
        }
        Some(CliCommand::List { include_main }) => {
            let (workspaces, _) = open_repo(&cwd)?;
            commands::list(&workspaces, include_main, &mut io::stdout())?;
            Ok(0)
        }
        Some(CliCommand::Prune { branch }) => {
            let (workspaces, _) = open_repo(&cwd)?;
            commands::prune(&workspaces, branch.as_deref(), &mut io::stdout())?;
            Ok(0)
        }
        Some(CliCommand::Doctor) => {
            commands::report(commands::doctor_checks(&cwd), &mut io::stdout())?;
            Ok(0)
        }
        None => run_tui(&cwd),
    }
}

fn resolve_cwd(cwd: Option<PathBuf>) -> Result<PathBuf> {
    match cwd {
        Some(p) => Ok(std::fs::canonicalize(p)?),
        None => Ok(std::env::current_dir()?),
    }
}

fn open_repo(cwd: &Path) -> Result<(GitWorkspaces, ProjectConfig)> {
    let root = git::discover_repo_root(cwd)?;
    let config = config::load_project_config(&root)?;
    info!(root = %root.display(), "repository");
    Ok((GitWorkspaces::from_config(root, &config), config))
}

fn run_tui(cwd: &Path) -> Result<u8> {
    let (workspaces, config) = open_repo(cwd)?;

    let tickets: Arc<dyn TicketProvider> = match LinearClient::from_config(&config) {
        Some(client) => Arc::new(client),
        None => {
            info!("no Linear API key; ticket list disabled");
            Arc::new(NoTickets)
        }
    };
    let tickets_enabled = config.linear_api_key().is_some();

    let (tx, rx) = mpsc::channel::<AppEvent>();
    let dispatcher = Dispatcher::new(
        tickets,
        Arc::new(workspaces),
        config.post_create().map(|argv| argv.to_vec()),
        tx.clone(),
    );
    let mut app = App::new(tickets_enabled);
    let tick_rate = Duration::from_millis(config.tick_rate());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    spawn_input_reader(tx);

    // Run app
    let result = run_app(&mut terminal, &mut app, &dispatcher, &rx, tick_rate);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;
    match app.result {
        Some(ResultMessage::Success(ref msg)) => println!("{}", msg),
        Some(ResultMessage::Error(ref msg)) => eprintln!("{}", msg),
        None => {}
    }
    Ok(app.exit_code())
}

/// Forward terminal input into the app channel.
fn spawn_input_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        let evt = match ct_event::read() {
            Ok(Event::Key(key)) => AppEvent::Key(key),
            Ok(Event::Resize(w, h)) => AppEvent::Resize(w, h),
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "terminal input closed");
                break;
            }
        };
        if tx.send(evt).is_err() {
            break;
        }
    });
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    dispatcher: &Dispatcher,
    rx: &mpsc::Receiver<AppEvent>,
    tick_rate: Duration,
) -> Result<()> {
    if let Some(command) = app.startup() {
        dispatcher.dispatch(command);
    }

    let mut last_tick = Instant::now();

    loop {
        // Draw only when dirty
        if app.dirty {
            terminal.draw(|f| ui::draw(f, app))?;
            app.dirty = false;
        }

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        match rx.recv_timeout(timeout) {
            Ok(evt) => step(app, dispatcher, evt),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => anyhow::bail!("event channel closed"),
        }

        if last_tick.elapsed() >= tick_rate {
            step(app, dispatcher, AppEvent::Tick);
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// One state transition; any resulting command goes to the dispatcher.
fn step(app: &mut App, dispatcher: &Dispatcher, evt: AppEvent) {
    if let Some(command) = app.update(evt) {
        dispatcher.dispatch(command);
    }
}
