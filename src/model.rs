use crate::constants::{
    APP_PROJECTS_DIR, BATCH_DIR, EXTENSION_DIR, SCRIPT_DIR, SHELL_DIR, UBIF_DIR, WEB_DIR,
};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Category {
    Ubif,
    Web,
    Extension,
    Script,
    App,
    Batch,
    Shell,
}

impl Category {
    /// Tab order.
    pub const ALL: [Self; 7] = [
        Self::Ubif,
        Self::Web,
        Self::Extension,
        Self::Script,
        Self::App,
        Self::Batch,
        Self::Shell,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ubif => "UBIF",
            Self::Web => "HTML",
            Self::Extension => "Chrome Extensions",
            Self::Script => "Python Scripts",
            Self::App => "Python Apps",
            Self::Batch => "Batch Scripts",
            Self::Shell => "PowerShell Apps",
        }
    }

    /// Directory under the workspace root that owns this category's projects.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Ubif => UBIF_DIR,
            Self::Web => WEB_DIR,
            Self::Extension => EXTENSION_DIR,
            Self::Script => SCRIPT_DIR,
            Self::App => APP_PROJECTS_DIR,
            Self::Batch => BATCH_DIR,
            Self::Shell => SHELL_DIR,
        }
    }

    /// Starter entry file written by "new project".
    pub fn starter_file(&self) -> (&'static str, &'static str) {
        match self {
            Self::Web => (
                "index.html",
                "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>New Project</title>\n</head>\n<body>\n</body>\n</html>\n",
            ),
            Self::Extension => (
                "manifest.json",
                "{\n  \"manifest_version\": 3,\n  \"name\": \"New Extension\",\n  \"version\": \"0.1.0\"\n}\n",
            ),
            Self::Ubif | Self::Script | Self::App => (
                "main.py",
                "def main():\n    print(\"Hello from devspace\")\n\n\nif __name__ == \"__main__\":\n    main()\n",
            ),
            #[cfg(windows)]
            Self::Batch => ("run.bat", "@echo off\necho Hello from devspace\npause\n"),
            #[cfg(not(windows))]
            Self::Batch => ("run.sh", "#!/bin/sh\necho \"Hello from devspace\"\n"),
            Self::Shell => ("main.ps1", "Write-Host \"Hello from devspace\"\n"),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Workspace,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    pub source: Source,
}

impl Project {
    pub fn is_external(&self) -> bool {
        self.source == Source::External
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectStats {
    pub size: u64,
    pub files: u64,
}
