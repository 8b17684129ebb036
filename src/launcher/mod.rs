pub mod cleanup;
pub mod resolve;
pub mod spawn;
pub mod wrapper;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::model::{Category, Project};
use resolve::{POWERSHELL, PYTHON, SHELL_SCRIPT, WEB_INDEX, require_folder, resolve};
use spawn::{SpawnCommand, Spawner, SystemSpawner};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Child;
use std::thread::JoinHandle;
use wrapper::{Dependencies, Dialect, Pause, Runner, TempScript};

#[derive(Debug)]
pub enum LaunchResult {
    Opened(PathBuf),
    Spawned {
        entry: PathBuf,
        pid: Option<u32>,
        /// Reaps the process and removes generated files.
        cleanup: Option<JoinHandle<()>>,
    },
}

impl LaunchResult {
    pub fn entry(&self) -> &Path {
        match self {
            Self::Opened(entry) | Self::Spawned { entry, .. } => entry,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Hand the entry to the system default handler.
    Open(PathBuf),
    Spawn {
        command: SpawnCommand,
        script: Option<TempScript>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub entry: PathBuf,
    pub invocation: Invocation,
}

pub struct Launcher<S = SystemSpawner> {
    settings: Settings,
    spawner: S,
    dialect: Dialect,
}

impl<S: Spawner> Launcher<S> {
    pub fn new(settings: Settings, spawner: S) -> Self {
        Self {
            settings,
            spawner,
            dialect: Dialect::NATIVE,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Works out what `run` would do without touching anything.
    pub fn plan(&self, category: Category, project: &Project) -> Result<LaunchPlan> {
        let dir = project.path.as_path();
        require_folder(dir)?;

        let (entry, invocation) = match category {
            Category::Web => {
                let entry = resolve(dir, &[WEB_INDEX])?;
                (entry.clone(), Invocation::Open(entry))
            }
            Category::Extension => return Err(Error::Unimplemented(category)),
            Category::Script | Category::Ubif => {
                let entry = resolve(dir, &[PYTHON])?;
                let invocation = self.runner(dir, &entry, &Dependencies::None, Pause::Always);
                (entry, invocation)
            }
            Category::App => {
                let entry = resolve(dir, &[PYTHON])?;
                let dependencies = Dependencies::declared(dir, &self.settings.app_packages);
                let invocation = self.runner(dir, &entry, &dependencies, Pause::OnError);
                (entry, invocation)
            }
            Category::Batch => {
                let entry = resolve(dir, &[SHELL_SCRIPT])?;
                (entry.clone(), Invocation::Open(entry))
            }
            Category::Shell => {
                let entry = resolve(dir, &[SHELL_SCRIPT, POWERSHELL])?;
                if POWERSHELL.matches(&entry) {
                    let command = SpawnCommand::new(&self.settings.powershell, dir)
                        .arg("-ExecutionPolicy")
                        .arg("Bypass")
                        .arg("-File")
                        .arg(&entry)
                        .wrapped_in(&self.settings.terminal);
                    (
                        entry,
                        Invocation::Spawn {
                            command,
                            script: None,
                        },
                    )
                } else {
                    (entry.clone(), Invocation::Open(entry))
                }
            }
        };

        Ok(LaunchPlan { entry, invocation })
    }

    fn runner(
        &self,
        dir: &Path,
        entry: &Path,
        dependencies: &Dependencies,
        pause: Pause,
    ) -> Invocation {
        let script = Runner {
            interpreter: &self.settings.python,
            entry,
            dir,
            dependencies,
            pause,
        }
        .render(self.dialect);

        let command = match self.dialect {
            Dialect::Sh => SpawnCommand::new(&self.settings.shell, dir).arg(&script.path),
            Dialect::Cmd => SpawnCommand::new("cmd", dir).arg("/C").arg(&script.path),
        }
        .wrapped_in(&self.settings.terminal);

        Invocation::Spawn {
            command,
            script: Some(script),
        }
    }

    pub fn run(&self, category: Category, project: &Project) -> Result<LaunchResult> {
        let LaunchPlan { entry, invocation } = self.plan(category, project)?;

        match invocation {
            Invocation::Open(path) => {
                self.spawner
                    .open(&path)
                    .map_err(Error::io(format!("failed to open {}", path.display())))?;
                tracing::info!(%category, entry = %path.display(), "opened with default handler");
                Ok(LaunchResult::Opened(path))
            }
            Invocation::Spawn { command, script } => {
                let mut files = Vec::new();
                if let Some(script) = script {
                    fs::write(&script.path, &script.contents).map_err(Error::io(format!(
                        "failed to write {}",
                        script.path.display()
                    )))?;
                    files.push(script.path);
                }

                let child = match self.spawner.spawn(&command) {
                    Ok(child) => child,
                    Err(e) => {
                        for file in &files {
                            let _ = fs::remove_file(file);
                        }
                        return Err(Error::io(format!("failed to start {}", command.program))(e));
                    }
                };

                let pid = child.as_ref().map(Child::id);
                tracing::info!(
                    %category,
                    entry = %entry.display(),
                    program = %command.program,
                    ?pid,
                    "launched"
                );
                let cleanup = cleanup::schedule(child, files, self.settings.cleanup_delay);
                Ok(LaunchResult::Spawned {
                    entry,
                    pid,
                    cleanup,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Source;
    use anyhow::Result;
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::io;
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    #[derive(Default)]
    struct Recorder {
        opened: RefCell<Vec<PathBuf>>,
        spawned: RefCell<Vec<SpawnCommand>>,
        /// Whether every path argument existed when the command was spawned.
        args_existed: RefCell<Vec<bool>>,
    }

    impl Recorder {
        fn touched(&self) -> bool {
            !self.opened.borrow().is_empty() || !self.spawned.borrow().is_empty()
        }
    }

    impl Spawner for Recorder {
        fn open(&self, path: &Path) -> io::Result<()> {
            self.opened.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn spawn(&self, command: &SpawnCommand) -> io::Result<Option<Child>> {
            let existed = command
                .args
                .iter()
                .map(Path::new)
                .filter(|p| p.is_absolute())
                .all(Path::exists);
            self.args_existed.borrow_mut().push(existed);
            self.spawned.borrow_mut().push(command.clone());
            Ok(None)
        }
    }

    fn settings() -> Settings {
        Settings {
            python: "python3".to_string(),
            powershell: "pwsh".to_string(),
            cleanup_delay: Duration::ZERO,
            ..Settings::default()
        }
    }

    fn project(dir: &TempDir, name: &str, files: &[&str]) -> Result<Project> {
        let path = dir.path().join(name);
        fs::create_dir_all(&path)?;
        for file in files {
            fs::write(path.join(file), "")?;
        }
        Ok(Project {
            name: name.to_string(),
            path,
            is_dir: true,
            source: Source::Workspace,
        })
    }

    #[test]
    fn web_opens_index_with_default_handler() -> Result<()> {
        let dir = tempdir()?;
        let site = project(&dir, "site", &["about.html", "index.html", "style.css"])?;
        let recorder = Recorder::default();
        let launcher = Launcher::new(settings(), &recorder);

        let result = launcher.run(Category::Web, &site)?;

        assert!(matches!(result, LaunchResult::Opened(_)));
        assert_eq!(result.entry(), site.path.join("index.html"));
        assert_eq!(*recorder.opened.borrow(), vec![site.path.join("index.html")]);
        assert!(recorder.spawned.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn missing_entry_spawns_nothing() -> Result<()> {
        let dir = tempdir()?;
        let recorder = Recorder::default();
        let launcher = Launcher::new(settings(), &recorder);

        for (category, files) in [
            (Category::Web, &["about.html"][..]),
            (Category::Script, &["notes.txt"][..]),
            (Category::App, &["requirements.txt"][..]),
            (Category::Batch, &["main.py"][..]),
            (Category::Shell, &["readme.md"][..]),
        ] {
            let p = project(&dir, &format!("{category:?}"), files)?;
            let result = launcher.run(category, &p);
            assert!(
                matches!(result, Err(Error::NoRunnableFound { .. })),
                "{category} should have no entry"
            );
        }

        assert!(!recorder.touched());
        Ok(())
    }

    #[test]
    fn file_project_is_not_a_folder() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("tool.py");
        fs::write(&path, "print('x')\n")?;
        let file = Project {
            name: "tool.py".to_string(),
            path,
            is_dir: false,
            source: Source::Workspace,
        };
        let recorder = Recorder::default();
        let launcher = Launcher::new(settings(), &recorder);

        for category in Category::ALL {
            assert!(matches!(
                launcher.run(category, &file),
                Err(Error::NotAFolder(_))
            ));
        }
        assert!(!recorder.touched());
        Ok(())
    }

    #[test]
    fn extension_is_unimplemented() -> Result<()> {
        let dir = tempdir()?;
        let ext = project(&dir, "ext", &["manifest.json"])?;
        let recorder = Recorder::default();
        let launcher = Launcher::new(settings(), &recorder);

        assert!(matches!(
            launcher.run(Category::Extension, &ext),
            Err(Error::Unimplemented(Category::Extension))
        ));
        assert!(!recorder.touched());
        Ok(())
    }

    #[test]
    fn script_runs_through_wrapper_then_cleans_up() -> Result<()> {
        let dir = tempdir()?;
        let script = project(&dir, "hello", &["main.py", "zz_helper.py"])?;
        let recorder = Recorder::default();
        let launcher = Launcher::new(settings(), &recorder);

        let result = launcher.run(Category::Script, &script)?;
        let LaunchResult::Spawned {
            entry,
            pid,
            cleanup,
        } = result
        else {
            panic!("expected a spawned process");
        };
        assert_eq!(entry, script.path.join("main.py"));
        assert_eq!(pid, None);

        let spawned = recorder.spawned.borrow();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].cwd, script.path);
        let wrapper = spawned[0]
            .args
            .iter()
            .map(PathBuf::from)
            .find(|arg| arg.starts_with(&script.path))
            .expect("wrapper argument");
        let wrapper_name = wrapper.file_name().unwrap_or_default().to_string_lossy();
        assert!(wrapper_name.starts_with("_devspace_run_"));
        assert!(wrapper_name.ends_with(Dialect::NATIVE.extension()));
        assert_eq!(*recorder.args_existed.borrow(), vec![true]);

        cleanup.expect("cleanup task").join().expect("cleanup panicked");
        assert!(!wrapper.exists());
        assert!(entry.exists());
        Ok(())
    }

    #[test]
    fn app_wrapper_installs_requirements() -> Result<()> {
        let dir = tempdir()?;
        let app = project(&dir, "app", &["app.py", "requirements.txt"])?;
        let launcher = Launcher::new(settings(), Recorder::default());

        let plan = launcher.plan(Category::App, &app)?;
        let Invocation::Spawn {
            script: Some(script),
            ..
        } = plan.invocation
        else {
            panic!("expected a wrapper script");
        };
        assert!(script.contents.contains("-m pip install -r"));
        assert!(script.contents.contains("requirements.txt"));
        assert!(script.path.starts_with(&app.path));
        assert!(!script.path.exists());
        Ok(())
    }

    #[test]
    fn batch_opens_first_shell_script() -> Result<()> {
        let dir = tempdir()?;
        let batch = project(&dir, "jobs", &["b.bat", "a.sh", "c.ps1"])?;
        let launcher = Launcher::new(settings(), Recorder::default());

        let plan = launcher.plan(Category::Batch, &batch)?;
        assert_eq!(plan.invocation, Invocation::Open(batch.path.join("a.sh")));
        Ok(())
    }

    #[test]
    fn shell_prefers_scripts_then_powershell() -> Result<()> {
        let dir = tempdir()?;
        let ps = project(&dir, "ps", &["setup.ps1"])?;
        let mixed = project(&dir, "mixed", &["setup.ps1", "start.bat"])?;
        let launcher = Launcher::new(settings(), Recorder::default());

        let plan = launcher.plan(Category::Shell, &ps)?;
        let entry = ps.path.join("setup.ps1");
        let expected = SpawnCommand::new("pwsh", &ps.path)
            .arg("-ExecutionPolicy")
            .arg("Bypass")
            .arg("-File")
            .arg(&entry);
        assert_eq!(
            plan.invocation,
            Invocation::Spawn {
                command: expected,
                script: None
            }
        );

        let plan = launcher.plan(Category::Shell, &mixed)?;
        assert_eq!(
            plan.invocation,
            Invocation::Open(mixed.path.join("start.bat"))
        );
        Ok(())
    }

    #[test]
    fn terminal_prefix_wraps_spawned_commands() -> Result<()> {
        let dir = tempdir()?;
        let ubif = project(&dir, "board", &["main.py"])?;
        let launcher = Launcher::new(
            Settings {
                terminal: vec!["x-terminal-emulator".to_string(), "-e".to_string()],
                ..settings()
            },
            Recorder::default(),
        );

        let plan = launcher.plan(Category::Ubif, &ubif)?;
        let Invocation::Spawn { command, .. } = plan.invocation else {
            panic!("expected a spawned command");
        };
        assert_eq!(command.program, "x-terminal-emulator");
        assert_eq!(command.args[0], OsString::from("-e"));
        Ok(())
    }
}
