pub mod app;
pub mod components;

use crate::ui::app::{App, AppState, InputKind};
use crate::ui::components::{
    render_details, render_footer, render_header, render_popup, render_projects_list, render_tabs,
};
use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

const DISK_REFRESH: Duration = Duration::from_secs(5);

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_tabs(f, app, chunks[1]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);

    render_projects_list(f, app, main_chunks[0]);
    render_details(f, app, main_chunks[1]);

    render_footer(f, app, chunks[3]);
    render_popup(f, app);
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    let mut disks_refreshed = Instant::now();
    loop {
        terminal.draw(|f| ui(f, app))?;

        app.check_stats_status();
        if disks_refreshed.elapsed() >= DISK_REFRESH {
            app.disks.refresh(true);
            disks_refreshed = Instant::now();
        }

        if let Some(path) = app.edit_request.take() {
            let editor = app.launcher.settings().editor_command();
            match suspend(terminal, || open_in_editor(&editor, &path)) {
                Ok(()) => app.status = Some(format!("Edited {}", path.display())),
                Err(e) => app.state = AppState::Done(format!("Editor failed: {e:#}")),
            }
            app.update_preview();
            continue;
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match app.state {
                AppState::Browsing => match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Down | KeyCode::Char('j') => app.next(),
                    KeyCode::Up | KeyCode::Char('k') => app.previous(),
                    KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => app.next_tab(),
                    KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => app.previous_tab(),
                    KeyCode::Enter => app.run_selected(),
                    KeyCode::Char('a') => app.start_input(InputKind::AddExternal),
                    KeyCode::Char('n') => app.start_input(InputKind::NewProject),
                    KeyCode::Char('m') => app.request_move_all(),
                    KeyCode::Char('e') => app.request_edit(),
                    KeyCode::Char('d') => app.request_trash(),
                    KeyCode::Char('r') => {
                        app.stats.clear();
                        app.status = None;
                        app.refresh();
                    }
                    _ => {}
                },
                AppState::Input(_) => match key.code {
                    KeyCode::Enter => app.submit_input(),
                    KeyCode::Esc => {
                        app.input.clear();
                        app.state = AppState::Browsing;
                    }
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Char(c) => app.input.push(c),
                    _ => {}
                },
                AppState::ConfirmMoveAll(_) => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => app.confirm_move_all(),
                    KeyCode::Char('n' | 'q') | KeyCode::Esc => {
                        app.state = AppState::Browsing;
                    }
                    _ => {}
                },
                AppState::ConfirmOverwrite(_) => match key.code {
                    KeyCode::Char('y') => app.resolve_overwrite(true),
                    KeyCode::Char('n') | KeyCode::Esc => app.resolve_overwrite(false),
                    _ => {}
                },
                AppState::ConfirmTrash(_) => match key.code {
                    KeyCode::Char('y') => app.confirm_trash(),
                    KeyCode::Char('n' | 'q') | KeyCode::Esc => {
                        app.state = AppState::Browsing;
                    }
                    _ => {}
                },
                AppState::Done(_) => match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ' | 'q') => {
                        app.state = AppState::Browsing;
                    }
                    _ => {}
                },
            }
        }
    }
}

/// Hands the terminal back to the shell while `f` runs.
fn suspend(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    f: impl FnOnce() -> Result<()>,
) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    let result = f();

    enable_raw_mode()?;
    execute!(terminal.backend_mut(), EnterAlternateScreen)?;
    terminal.clear()?;
    result
}

fn open_in_editor(editor: &str, path: &Path) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("no editor configured");
    };

    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .with_context(|| format!("failed to start {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}
