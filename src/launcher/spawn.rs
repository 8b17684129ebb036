use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCommand {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
}

impl SpawnCommand {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Runs this command through `prefix`, e.g. `x-terminal-emulator -e`.
    #[must_use]
    pub fn wrapped_in(self, prefix: &[String]) -> Self {
        let Some((program, rest)) = prefix.split_first() else {
            return self;
        };

        let mut args: Vec<OsString> = rest.iter().map(OsString::from).collect();
        args.push(self.program.into());
        args.extend(self.args);
        Self {
            program: program.clone(),
            args,
            cwd: self.cwd,
        }
    }
}

/// Side-effecting half of a launch. Swapped out in tests.
pub trait Spawner {
    /// Opens `path` with the system default handler.
    fn open(&self, path: &Path) -> io::Result<()>;

    /// Starts `command` without waiting. Returns the child when the caller can wait on it.
    fn spawn(&self, command: &SpawnCommand) -> io::Result<Option<Child>>;
}

impl<T: Spawner + ?Sized> Spawner for &T {
    fn open(&self, path: &Path) -> io::Result<()> {
        (**self).open(path)
    }

    fn spawn(&self, command: &SpawnCommand) -> io::Result<Option<Child>> {
        (**self).spawn(command)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner {
    /// Detach stdio from our terminal; the TUI owns it.
    pub quiet: bool,
}

impl Spawner for SystemSpawner {
    fn open(&self, path: &Path) -> io::Result<()> {
        open::that_detached(path)
    }

    fn spawn(&self, command: &SpawnCommand) -> io::Result<Option<Child>> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).current_dir(&command.cwd);
        if self.quiet {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }
        detach(&mut cmd);
        cmd.spawn().map(Some)
    }
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    cmd.creation_flags(CREATE_NEW_CONSOLE);
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    // Own process group, so Ctrl-C in our terminal doesn't reach it.
    cmd.process_group(0);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}
