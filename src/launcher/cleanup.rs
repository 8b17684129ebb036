use std::fs;
use std::path::PathBuf;
use std::process::Child;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Deletes `files` once `child` has exited and at least `min_delay` has passed since now.
///
/// The delay still applies after exit because terminal launchers often return before the
/// shell they start has read the script. Without a child it is a plain delayed delete.
/// The child is always reaped, even with no files to delete.
pub fn schedule(
    child: Option<Child>,
    files: Vec<PathBuf>,
    min_delay: Duration,
) -> Option<JoinHandle<()>> {
    if child.is_none() && files.is_empty() {
        return None;
    }

    let started = Instant::now();
    let spawned = thread::Builder::new()
        .name("devspace-cleanup".to_string())
        .spawn(move || {
            if let Some(mut child) = child {
                match child.wait() {
                    Ok(status) => tracing::debug!(pid = child.id(), %status, "launched process exited"),
                    Err(e) => tracing::debug!(pid = child.id(), error = %e, "wait failed"),
                }
            }

            if files.is_empty() {
                return;
            }
            if let Some(remaining) = min_delay.checked_sub(started.elapsed()) {
                thread::sleep(remaining);
            }

            for file in &files {
                match fs::remove_file(file) {
                    Ok(()) => tracing::debug!(path = %file.display(), "temp file removed"),
                    Err(e) => {
                        tracing::debug!(path = %file.display(), error = %e, "temp file not removed");
                    }
                }
            }
        });

    match spawned {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "could not start cleanup thread; temp files left behind");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn nothing_to_do_spawns_nothing() {
        assert!(schedule(None, vec![], Duration::ZERO).is_none());
    }

    #[test]
    fn deletes_after_delay() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("_devspace_run.sh");
        fs::write(&file, "echo hi\n")?;

        let started = Instant::now();
        let handle = schedule(None, vec![file.clone()], Duration::from_millis(50))
            .expect("cleanup thread");
        handle.join().expect("cleanup thread panicked");

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(!file.exists());
        Ok(())
    }

    #[test]
    fn missing_files_are_ignored() -> Result<()> {
        let dir = tempdir()?;
        let handle = schedule(None, vec![dir.path().join("never-written")], Duration::ZERO)
            .expect("cleanup thread");
        handle.join().expect("cleanup thread panicked");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn waits_for_child_exit() -> Result<()> {
        use std::process::Command;

        let dir = tempdir()?;
        let file = dir.path().join("_devspace_run.sh");
        fs::write(&file, "sleep 0\n")?;

        let child = Command::new("sh").arg(&file).spawn()?;
        let handle = schedule(Some(child), vec![file.clone()], Duration::ZERO)
            .expect("cleanup thread");
        handle.join().expect("cleanup thread panicked");

        assert!(!file.exists());
        Ok(())
    }
}
