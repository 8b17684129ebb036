use crate::constants::{
    APP_DIR, CONFIG_FILE, DEFAULT_CLEANUP_DELAY_SECS, DEFAULT_EDITOR, DEFAULT_POWERSHELL,
    DEFAULT_PYTHON, DEFAULT_SHELL, WORKSPACE_ENV,
};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub workspace: Option<PathBuf>,
    pub python: String,
    pub powershell: String,
    pub shell: String,
    /// Command prefix that gives spawned programs their own console window.
    pub terminal: Vec<String>,
    pub editor: Option<String>,
    pub cleanup_delay: Duration,
    pub app_packages: Vec<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: None,
            python: DEFAULT_PYTHON.to_string(),
            powershell: DEFAULT_POWERSHELL.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            terminal: Vec::new(),
            editor: None,
            cleanup_delay: Duration::from_secs(DEFAULT_CLEANUP_DELAY_SECS),
            app_packages: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Loads settings from the default configuration path, then applies environment overrides.
    /// Falls back to defaults if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let mut settings = match Self::path() {
            Some(path) if path.exists() => match fs::read_to_string(&path) {
                Ok(text) => Self::parse(&text),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read settings");
                    Self::default()
                }
            },
            _ => Self::default(),
        };

        if let Ok(root) = std::env::var(WORKSPACE_ENV)
            && !root.trim().is_empty()
        {
            settings.workspace = Some(PathBuf::from(root.trim()));
        }

        settings
    }

    pub fn parse(text: &str) -> Self {
        let mut settings = Self::default();

        for (lineno, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                tracing::warn!(line = lineno + 1, "settings line has no '=', ignored");
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "workspace" => settings.workspace = Some(PathBuf::from(value)),
                "python" => settings.python = value.to_string(),
                "powershell" => settings.powershell = value.to_string(),
                "shell" => settings.shell = value.to_string(),
                "terminal" => {
                    settings.terminal = value.split_whitespace().map(str::to_string).collect();
                }
                "editor" => settings.editor = Some(value.to_string()),
                "cleanup_delay_secs" => match value.parse::<u64>() {
                    Ok(secs) => settings.cleanup_delay = Duration::from_secs(secs),
                    Err(_) => {
                        tracing::warn!(line = lineno + 1, value, "cleanup_delay_secs is not a number");
                    }
                },
                "app_packages" => {
                    settings.app_packages = value
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|p| !p.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                "log_level" => settings.log_level = value.to_string(),
                other => tracing::warn!(key = other, "unknown settings key, ignored"),
            }
        }

        settings
    }

    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
    }
}
