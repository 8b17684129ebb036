use crate::fsops;
use crate::launcher::{LaunchResult, Launcher};
use crate::model::{Category, Project, ProjectStats};
use crate::registry::{self, MoveOutcome, MoveReport, Overwrite, Registry};
use ratatui::widgets::ListState;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use sysinfo::Disks;

const PREVIEW_LINES: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    AddExternal,
    NewProject,
}

pub enum AppState {
    Browsing,
    Input(InputKind),
    ConfirmMoveAll(usize),
    ConfirmOverwrite(Project),
    ConfirmTrash(Project),
    Done(String),
}

pub struct App {
    pub registry: Registry,
    pub launcher: Launcher,
    pub tab: usize,
    pub projects: Vec<Project>,
    pub list_state: ListState,
    pub state: AppState,
    pub disks: Disks,
    pub input: String,
    pub status: Option<String>,
    pub preview: String,
    pub stats: HashMap<PathBuf, ProjectStats>,
    pub stats_rx: Option<mpsc::Receiver<Vec<(PathBuf, ProjectStats)>>>,
    /// File the run loop should open in the editor on its next tick.
    pub edit_request: Option<PathBuf>,
    pending_moves: VecDeque<Project>,
    move_report: MoveReport,
}

impl App {
    pub fn new(registry: Registry, launcher: Launcher) -> Self {
        let mut app = Self {
            registry,
            launcher,
            tab: 0,
            projects: Vec::new(),
            list_state: ListState::default(),
            state: AppState::Browsing,
            disks: Disks::new_with_refreshed_list(),
            input: String::new(),
            status: None,
            preview: String::new(),
            stats: HashMap::new(),
            stats_rx: None,
            edit_request: None,
            pending_moves: VecDeque::new(),
            move_report: MoveReport::default(),
        };
        app.refresh();
        app
    }

    pub fn category(&self) -> Category {
        Category::ALL[self.tab]
    }

    pub fn selected(&self) -> Option<&Project> {
        self.list_state.selected().and_then(|i| self.projects.get(i))
    }

    pub fn next_tab(&mut self) {
        self.tab = (self.tab + 1) % Category::ALL.len();
        self.list_state.select(None);
        self.refresh();
    }

    pub fn previous_tab(&mut self) {
        self.tab = (self.tab + Category::ALL.len() - 1) % Category::ALL.len();
        self.list_state.select(None);
        self.refresh();
    }

    pub fn next(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i >= self.projects.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
        self.update_preview();
    }

    pub fn previous(&mut self) {
        if self.projects.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.projects.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.list_state.select(Some(i));
        self.update_preview();
    }

    /// Re-reads the current tab from disk and kicks off stats for anything new.
    pub fn refresh(&mut self) {
        match self.registry.list(self.category()) {
            Ok(projects) => self.projects = projects,
            Err(e) => {
                self.projects.clear();
                self.state = AppState::Done(format!("Error loading projects: {e}"));
            }
        }

        let selected = match self.list_state.selected() {
            _ if self.projects.is_empty() => None,
            Some(i) => Some(i.min(self.projects.len() - 1)),
            None => Some(0),
        };
        self.list_state.select(selected);

        self.start_stats();
        self.update_preview();
    }

    fn start_stats(&mut self) {
        let paths: Vec<PathBuf> = self
            .projects
            .iter()
            .filter(|p| !self.stats.contains_key(&p.path))
            .map(|p| p.path.clone())
            .collect();
        if paths.is_empty() {
            return;
        }

        let (tx, rx) = mpsc::channel();
        self.stats_rx = Some(rx);
        thread::spawn(move || {
            let _ = tx.send(fsops::stats_for(&paths));
        });
    }

    pub fn check_stats_status(&mut self) {
        if let Some(rx) = &self.stats_rx
            && let Ok(results) = rx.try_recv()
        {
            self.stats.extend(results);
            self.stats_rx = None;
        }
    }

    pub fn update_preview(&mut self) {
        let category = self.category();
        let Some(project) = self.selected() else {
            self.preview.clear();
            return;
        };

        self.preview = if project.is_dir {
            match self.launcher.plan(category, project) {
                Ok(plan) => {
                    let name = plan
                        .entry
                        .file_name()
                        .unwrap_or_default()
                        .to_string_lossy()
                        .into_owned();
                    format!("Entry: {name}\n\n{}", head(&plan.entry))
                }
                Err(e) => e.to_string(),
            }
        } else {
            head(&project.path)
        };
    }

    pub fn run_selected(&mut self) {
        let category = self.category();
        let Some(project) = self.selected().cloned() else {
            return;
        };

        match self.launcher.run(category, &project) {
            Ok(LaunchResult::Opened(entry)) => {
                self.status = Some(format!("Opened {}", file_name(&entry)));
            }
            Ok(LaunchResult::Spawned { entry, pid, .. }) => {
                let console = !self.launcher.settings().terminal.is_empty();
                self.status = Some(spawn_status(&entry, pid, console));
            }
            Err(e) => self.state = AppState::Done(format!("Failed to run {}: {e}", project.name)),
        }
    }

    pub fn start_input(&mut self, kind: InputKind) {
        self.input.clear();
        self.state = AppState::Input(kind);
    }

    pub fn submit_input(&mut self) {
        let AppState::Input(kind) = self.state else {
            return;
        };
        let category = self.category();
        let text = std::mem::take(&mut self.input);
        let text = text.trim();
        self.state = AppState::Browsing;
        if text.is_empty() {
            return;
        }

        match kind {
            InputKind::AddExternal => {
                let path = expand_home(text);
                match self.registry.add_external(category, &path) {
                    Ok(true) => self.status = Some(format!("Added {}", path.display())),
                    Ok(false) => self.status = Some(format!("{} is already listed", path.display())),
                    Err(e) => self.state = AppState::Done(e.to_string()),
                }
            }
            InputKind::NewProject => match self.registry.create_project(category, text) {
                Ok(project) => self.status = Some(format!("Created {}", project.name)),
                Err(e) => self.state = AppState::Done(e.to_string()),
            },
        }
        self.refresh();
    }

    pub fn request_move_all(&mut self) {
        let count = self.registry.pending_moves(self.category()).len();
        self.state = if count == 0 {
            AppState::Done("No external items to move".to_string())
        } else {
            AppState::ConfirmMoveAll(count)
        };
    }

    pub fn confirm_move_all(&mut self) {
        self.pending_moves = self.registry.pending_moves(self.category()).into();
        self.move_report = MoveReport::default();
        self.state = AppState::Browsing;
        self.process_moves();
    }

    /// Works through the queue until it is empty or a conflict needs an answer.
    fn process_moves(&mut self) {
        let category = self.category();
        while let Some(project) = self.pending_moves.pop_front() {
            match self
                .registry
                .move_project(category, &project, Overwrite::Skip)
            {
                Ok(MoveOutcome::Conflict(_)) => {
                    self.state = AppState::ConfirmOverwrite(project);
                    return;
                }
                result => self.move_report.record(&project.name, result),
            }
        }

        self.registry.prune(category);
        let report = std::mem::take(&mut self.move_report);
        self.refresh();
        self.state = AppState::Done(report.to_string());
    }

    pub fn resolve_overwrite(&mut self, replace: bool) {
        let AppState::ConfirmOverwrite(project) =
            std::mem::replace(&mut self.state, AppState::Browsing)
        else {
            return;
        };

        if replace {
            let result = self
                .registry
                .move_project(self.category(), &project, Overwrite::Replace);
            self.move_report.record(&project.name, result);
        } else {
            self.move_report.skipped += 1;
        }
        self.process_moves();
    }

    pub fn request_trash(&mut self) {
        if let Some(project) = self.selected().cloned() {
            self.state = AppState::ConfirmTrash(project);
        }
    }

    pub fn confirm_trash(&mut self) {
        let AppState::ConfirmTrash(project) =
            std::mem::replace(&mut self.state, AppState::Browsing)
        else {
            return;
        };

        let category = self.category();
        match self.registry.trash_project(category, &project) {
            Ok(()) if project.is_external() => {
                self.status = Some(format!("Removed {} from the list", project.name));
            }
            Ok(()) => self.status = Some(format!("Moved {} to trash", project.name)),
            Err(e) => self.state = AppState::Done(e.to_string()),
        }
        self.stats.remove(&project.path);
        self.refresh();
    }

    /// Queues the selected file, or the entry file of the selected folder, for editing.
    pub fn request_edit(&mut self) {
        let category = self.category();
        let Some(project) = self.selected() else {
            return;
        };

        if !project.is_dir {
            self.edit_request = Some(project.path.clone());
            return;
        }
        match self.launcher.plan(category, project) {
            Ok(plan) => self.edit_request = Some(plan.entry),
            Err(e) => self.state = AppState::Done(format!("Nothing to edit: {e}")),
        }
    }
}

fn head(path: &Path) -> String {
    match registry::read_file(path) {
        Ok(text) => text.lines().take(PREVIEW_LINES).collect::<Vec<_>>().join("\n"),
        Err(e) => format!("(no preview: {e})"),
    }
}

/// The TUI detaches stdio, so without a `terminal` prefix a spawned program has nowhere to
/// print and its pause prompt returns at once.
fn spawn_status(entry: &Path, pid: Option<u32>, console: bool) -> String {
    let pid = pid.map(|p| format!(" (pid {p})")).unwrap_or_default();
    let mut status = format!("Started {}{pid}", file_name(entry));
    if !console {
        status.push_str("; output hidden, set `terminal` in the settings file to see it");
    }
    status
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

fn expand_home(text: &str) -> PathBuf {
    if let Some(rest) = text.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(text)
}
