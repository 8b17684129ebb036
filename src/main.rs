mod cli;
mod config;
mod constants;
mod error;
mod fsops;
mod launcher;
mod logging;
mod model;
mod registry;
mod ui;
mod workspace;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Settings;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use launcher::Launcher;
use launcher::spawn::SystemSpawner;
use ratatui::prelude::*;
use registry::Registry;
use std::io;
use ui::app::App;
use workspace::Workspace;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load();
    if let Some(root) = cli.workspace {
        settings.workspace = Some(root);
    }

    let target = if cli.command.is_some() {
        logging::Target::Stderr
    } else {
        logging::Target::File
    };
    let level = if cli.verbose {
        "debug"
    } else {
        settings.log_level.as_str()
    };
    if let Some(path) = logging::init(&target, level)? {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    let workspace = Workspace::new(
        settings
            .workspace
            .clone()
            .unwrap_or_else(Workspace::default_root),
    );
    workspace.init()?;
    tracing::debug!(root = %workspace.root().display(), "workspace ready");
    let registry = Registry::new(workspace);

    if let Some(command) = cli.command {
        return cli::execute(command, registry, settings);
    }

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let launcher = Launcher::new(settings, SystemSpawner { quiet: true });
    let mut app = App::new(registry, launcher);

    let res = ui::run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
