use crate::constants::{REQUIREMENTS_FILE, RUNNER_STEM};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static RUNNER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Script language of the generated runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sh,
    Cmd,
}

impl Dialect {
    #[cfg(windows)]
    pub const NATIVE: Self = Self::Cmd;
    #[cfg(not(windows))]
    pub const NATIVE: Self = Self::Sh;

    pub fn extension(self) -> &'static str {
        match self {
            Self::Sh => "sh",
            Self::Cmd => "cmd",
        }
    }

    fn quote(self, value: &str) -> String {
        match self {
            Self::Sh => format!("'{}'", value.replace('\'', r"'\''")),
            Self::Cmd => format!("\"{}\"", value.replace('"', "\"\"")),
        }
    }

    fn echo(self, text: &str) -> String {
        match self {
            Self::Sh if text.is_empty() => "echo".to_string(),
            Self::Sh => format!("echo {}", self.quote(text)),
            Self::Cmd if text.is_empty() => "echo.".to_string(),
            Self::Cmd => format!("echo {text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependencies {
    /// `pip install -r <file>`
    Requirements(PathBuf),
    Packages(Vec<String>),
    None,
}

impl Dependencies {
    /// A `requirements.txt` in the project wins over the configured package list.
    pub fn declared(dir: &Path, fallback: &[String]) -> Self {
        let requirements = dir.join(REQUIREMENTS_FILE);
        if requirements.is_file() {
            Self::Requirements(requirements)
        } else if fallback.is_empty() {
            Self::None
        } else {
            Self::Packages(fallback.to_vec())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    Always,
    OnError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempScript {
    pub path: PathBuf,
    pub contents: String,
}

pub struct Runner<'a> {
    pub interpreter: &'a str,
    pub entry: &'a Path,
    pub dir: &'a Path,
    pub dependencies: &'a Dependencies,
    pub pause: Pause,
}

impl Runner<'_> {
    pub fn render(&self, dialect: Dialect) -> TempScript {
        let q = |s: &str| dialect.quote(s);
        let interpreter = q(self.interpreter);
        let entry = q(&self.entry.to_string_lossy());
        let dir = q(&self.dir.to_string_lossy());
        let name = self
            .entry
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();

        let mut out = String::new();
        match dialect {
            Dialect::Sh => {
                let _ = writeln!(out, "#!/bin/sh");
                let _ = writeln!(out, "cd {dir} || exit 1");
            }
            Dialect::Cmd => {
                let _ = writeln!(out, "@echo off");
                let _ = writeln!(out, "title {name}");
                let _ = writeln!(out, "cd /d {dir}");
            }
        }

        let install = match self.dependencies {
            Dependencies::Requirements(file) => Some(format!("-r {}", q(&file.to_string_lossy()))),
            Dependencies::Packages(packages) => Some(
                packages
                    .iter()
                    .map(|p| q(p))
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            Dependencies::None => None,
        };
        if let Some(args) = install {
            let _ = writeln!(out, "{}", dialect.echo("Installing required packages..."));
            let _ = writeln!(out, "{interpreter} -m pip install {args}");
            let _ = writeln!(out, "{}", dialect.echo(""));
        }

        let _ = writeln!(out, "{interpreter} {entry}");

        let failed = "Application encountered an error.";
        match (dialect, self.pause) {
            (Dialect::Sh, pause) => {
                let _ = writeln!(out, "status=$?");
                let _ = writeln!(out, "if [ \"$status\" -ne 0 ]; then");
                let _ = writeln!(out, "    {}", dialect.echo(""));
                let _ = writeln!(out, "    {}", dialect.echo(failed));
                if pause == Pause::OnError {
                    let _ = writeln!(out, "    printf 'Press Enter to close...'; read _");
                }
                let _ = writeln!(out, "fi");
                if pause == Pause::Always {
                    let _ = writeln!(out, "printf 'Press Enter to close...'; read _");
                }
                let _ = writeln!(out, "exit \"$status\"");
            }
            (Dialect::Cmd, Pause::Always) => {
                let _ = writeln!(out, "pause");
            }
            (Dialect::Cmd, Pause::OnError) => {
                let _ = writeln!(out, "if %ERRORLEVEL% NEQ 0 (");
                let _ = writeln!(out, "    {}", dialect.echo(""));
                let _ = writeln!(out, "    {}", dialect.echo(failed));
                let _ = writeln!(out, "    pause");
                let _ = writeln!(out, ")");
            }
        }

        // Unique per launch, so a pending cleanup never removes a newer wrapper.
        let seq = RUNNER_SEQ.fetch_add(1, Ordering::Relaxed);
        TempScript {
            path: self.dir.join(format!(
                "{RUNNER_STEM}_{}_{seq}.{}",
                std::process::id(),
                dialect.extension()
            )),
            contents: out,
        }
    }
}
