pub const WORKSPACE_DIR: &str = "DeveloperWorkspace";
pub const APP_DIR: &str = "devspace";
pub const CONFIG_FILE: &str = "config";
pub const LOG_FILE: &str = "devspace.log";

pub const UBIF_DIR: &str = "UBIF_Projects";
pub const WEB_DIR: &str = "HTML_Projects";
pub const EXTENSION_DIR: &str = "Chrome_Extensions";
pub const SCRIPT_DIR: &str = "Python_Scripts";
pub const APP_PROJECTS_DIR: &str = "Python_Apps";
pub const BATCH_DIR: &str = "Batch_Scripts";
pub const SHELL_DIR: &str = "PowerShell_Apps";

pub const WEB_INDEX_STEM: &str = "index";
pub const MARKUP_EXTENSIONS: &[&str] = &["html", "htm", "xhtml"];
pub const PYTHON_EXTENSIONS: &[&str] = &["py"];
pub const SHELL_SCRIPT_EXTENSIONS: &[&str] = &["bat", "cmd", "sh"];
pub const POWERSHELL_EXTENSIONS: &[&str] = &["ps1"];

pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Files written by the launcher start with this prefix and are never picked as entries.
pub const TEMP_PREFIX: &str = "_devspace_";
pub const RUNNER_STEM: &str = "_devspace_run";

pub const WORKSPACE_ENV: &str = "DEVSPACE_WORKSPACE";
pub const LOG_ENV: &str = "DEVSPACE_LOG";

pub const DEFAULT_CLEANUP_DELAY_SECS: u64 = 5;
pub const DEFAULT_SHELL: &str = "sh";

#[cfg(windows)]
pub const DEFAULT_PYTHON: &str = "python";
#[cfg(not(windows))]
pub const DEFAULT_PYTHON: &str = "python3";

#[cfg(windows)]
pub const DEFAULT_POWERSHELL: &str = "powershell";
#[cfg(not(windows))]
pub const DEFAULT_POWERSHELL: &str = "pwsh";

#[cfg(windows)]
pub const DEFAULT_EDITOR: &str = "notepad";
#[cfg(not(windows))]
pub const DEFAULT_EDITOR: &str = "vi";
