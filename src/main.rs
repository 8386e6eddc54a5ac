mod app;
mod catalog;
mod cli;
mod config;
mod cursor;
mod diff;
mod domain;
mod handlers;
mod infra;
mod pages;
mod selection;
mod terminal;
mod ui;

use crate::app::App;
use crate::cli::{Cli, Command, run_diff};
use crate::config::{AppConfig, ensure_parent_dir, log_path};
use crate::handlers::{handle_key_event, handle_mouse_event};
use crate::infra::{SecretStore, VaultClient};
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.global.config.as_deref())?.apply(cli.global.overrides());
    let interactive = matches!(cli.command, Command::Ui);
    init_tracing(config.debug, interactive)?;
    debug!(url = %config.url, mount = %config.mount_path, "configuration resolved");

    match cli.command {
        Command::Diff { left, right } => {
            let color = io::stdout().is_terminal();
            run_diff(&left, &right, || connect(&config), color, &mut io::stdout().lock())
        }
        Command::Ui => run_ui(connect(&config)?),
    }
}

fn connect(config: &AppConfig) -> Result<Box<dyn SecretStore>> {
    let client = VaultClient::new(&config.url, &config.token, &config.mount_path)
        .context("failed to create Vault client")?;
    Ok(Box::new(client))
}

/// Logs go to stderr for one-shot commands and to a file while the TUI owns
/// the terminal.
fn init_tracing(debug: bool, interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env("VD_LOG").unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("vault_diff=debug")
        } else {
            EnvFilter::new("vault_diff=warn")
        }
    });

    if interactive {
        let path = log_path()?;
        ensure_parent_dir(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn run_ui(store: Box<dyn SecretStore>) -> Result<()> {
    // The catalog is loaded before touching the terminal so that a store
    // failure prints like any other error.
    let mut app = App::start(store)?;

    let mut terminal = terminal::enter()?;
    let run_result = event_loop(&mut terminal, &mut app);
    terminal::leave(&mut terminal)?;
    info!("session ended");
    run_result
}

fn event_loop(terminal: &mut terminal::Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::draw(frame, app))?;

        match event::read().context("event read failed")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                handle_key_event(app, key)?;
            }
            Event::Mouse(mouse) => handle_mouse_event(app, mouse),
            _ => {}
        }
    }
    Ok(())
}
