use crate::error::{Error, Result};
use crate::fsops;
use crate::model::{Category, Project, Source};
use crate::workspace::Workspace;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    Skip,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(PathBuf),
    /// Destination already exists and the move was skipped; nothing on disk changed.
    Conflict(PathBuf),
    AlreadyInWorkspace,
}

#[derive(Debug, Default)]
pub struct MoveReport {
    pub moved: usize,
    pub skipped: usize,
    pub failed: Vec<(String, Error)>,
}

impl MoveReport {
    pub fn record(&mut self, name: &str, result: Result<MoveOutcome>) {
        match result {
            Ok(MoveOutcome::Moved(_)) => self.moved += 1,
            Ok(MoveOutcome::Conflict(_) | MoveOutcome::AlreadyInWorkspace) => self.skipped += 1,
            Err(e) => {
                tracing::warn!(name, error = %e, "move failed");
                self.failed.push((name.to_string(), e));
            }
        }
    }
}

impl fmt::Display for MoveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.moved == 1 { "" } else { "s" };
        write!(f, "Moved {} item{plural}", self.moved)?;
        if self.skipped > 0 {
            write!(f, ", skipped {}", self.skipped)?;
        }
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
            for (name, err) in &self.failed {
                write!(f, "\n - {name}: {err}")?;
            }
        }
        Ok(())
    }
}

/// Projects per category: workspace folders plus an in-memory overlay of browsed paths.
pub struct Registry {
    workspace: Workspace,
    overlay: HashMap<Category, Vec<PathBuf>>,
}

impl Registry {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            overlay: HashMap::new(),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn external(&self, category: Category) -> &[PathBuf] {
        self.overlay
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Workspace entries first (sorted by name), then overlay entries whose name isn't taken.
    pub fn list(&self, category: Category) -> Result<Vec<Project>> {
        let dir = self.workspace.dir(category);
        let entries = match fsops::list_entries(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::io(format!("failed to list {}", dir.display()))(e)),
        };

        let mut seen = HashSet::new();
        let mut projects = Vec::with_capacity(entries.len());

        for path in entries {
            let name = display_name(&path);
            seen.insert(name.clone());
            projects.push(Project {
                name,
                is_dir: path.is_dir(),
                path,
                source: Source::Workspace,
            });
        }

        for path in self.external(category) {
            if !path.exists() {
                continue;
            }
            let name = display_name(path);
            if seen.insert(name) {
                projects.push(external_project(path));
            }
        }

        Ok(projects)
    }

    pub fn find(&self, category: Category, name: &str) -> Result<Option<Project>> {
        Ok(self.list(category)?.into_iter().find(|p| p.name == name))
    }

    /// Records `path` in the overlay. Returns `false` if it was already recorded or already
    /// lives in the category directory.
    pub fn add_external(&mut self, category: Category, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        if self.workspace.owns(category, path) {
            return Ok(false);
        }
        self.movable_name(category, path)?;

        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let entries = self.overlay.entry(category).or_default();
        if entries.contains(&path) {
            return Ok(false);
        }

        tracing::info!(%category, path = %path.display(), "external path added");
        entries.push(path);
        Ok(true)
    }

    pub fn remove_external(&mut self, category: Category, path: &Path) -> bool {
        let Some(entries) = self.overlay.get_mut(&category) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|p| p != path);
        before != entries.len()
    }

    /// Every overlay entry that still exists, including ones shadowed in `list` by a
    /// workspace entry of the same name.
    pub fn pending_moves(&self, category: Category) -> Vec<Project> {
        self.external(category)
            .iter()
            .filter(|path| path.exists())
            .map(|path| external_project(path))
            .collect()
    }

    /// Drops overlay entries whose paths no longer exist.
    pub fn prune(&mut self, category: Category) {
        if let Some(entries) = self.overlay.get_mut(&category) {
            entries.retain(|p| p.exists());
        }
    }

    pub fn move_project(
        &mut self,
        category: Category,
        project: &Project,
        overwrite: Overwrite,
    ) -> Result<MoveOutcome> {
        if !project.is_external() {
            return Ok(MoveOutcome::AlreadyInWorkspace);
        }
        self.relocate(category, &project.path, overwrite)
    }

    /// Moves every external entry into the workspace. `confirm` decides whether to replace an
    /// existing entry of the same name. Individual failures don't stop the batch.
    pub fn move_all(
        &mut self,
        category: Category,
        mut confirm: impl FnMut(&Project) -> bool,
        mut progress: impl FnMut(&Project),
    ) -> MoveReport {
        let externals = self.pending_moves(category);
        let mut report = MoveReport::default();
        for project in &externals {
            progress(project);
            let result = match self.move_project(category, project, Overwrite::Skip) {
                Ok(MoveOutcome::Conflict(_)) if confirm(project) => {
                    self.move_project(category, project, Overwrite::Replace)
                }
                other => other,
            };

            report.record(&project.name, result);
        }

        self.prune(category);
        report
    }

    /// Moves an arbitrary path straight into the category directory.
    pub fn import(
        &mut self,
        category: Category,
        path: &Path,
        overwrite: Overwrite,
    ) -> Result<MoveOutcome> {
        if self.workspace.owns(category, path) {
            return Ok(MoveOutcome::AlreadyInWorkspace);
        }
        self.relocate(category, path, overwrite)
    }

    fn relocate(
        &mut self,
        category: Category,
        source: &Path,
        overwrite: Overwrite,
    ) -> Result<MoveOutcome> {
        if fs::symlink_metadata(source).is_err() {
            return Err(Error::NotFound(source.to_path_buf()));
        }

        let name = self.movable_name(category, source)?;

        let dir = self.workspace.dir(category);
        fs::create_dir_all(&dir)
            .map_err(Error::io(format!("failed to create {}", dir.display())))?;
        let destination = dir.join(name);

        if fs::symlink_metadata(&destination).is_ok() {
            if overwrite == Overwrite::Skip {
                return Ok(MoveOutcome::Conflict(destination));
            }
            fsops::remove_path(&destination).map_err(Error::io(format!(
                "failed to remove existing {}",
                destination.display()
            )))?;
        }

        fsops::move_path(source, &destination).map_err(Error::io(format!(
            "failed to move {} to {}",
            source.display(),
            destination.display()
        )))?;

        self.remove_external(category, source);
        tracing::info!(
            %category,
            from = %source.display(),
            to = %destination.display(),
            "project moved into workspace"
        );
        Ok(MoveOutcome::Moved(destination))
    }

    /// The name `source` takes inside the category directory. Paths without a final component,
    /// paths that hold the workspace, and the workspace's own folders can't be moved.
    fn movable_name<'a>(&self, category: Category, source: &'a Path) -> Result<&'a OsStr> {
        let unmovable = |reason: &'static str| Error::Unmovable {
            path: source.to_path_buf(),
            reason,
        };
        let Some(name) = source.file_name() else {
            return Err(unmovable("it has no file name"));
        };

        let resolve = |path: &Path| path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let source = resolve(source);
        let root = resolve(self.workspace.root());
        if root.starts_with(&source) || resolve(&self.workspace.dir(category)).starts_with(&source)
        {
            return Err(unmovable("it contains the workspace"));
        }
        if source.parent() == Some(root.as_path()) {
            return Err(unmovable("it is a workspace folder"));
        }
        Ok(name)
    }

    pub fn create_project(&self, category: Category, name: &str) -> Result<Project> {
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidName(name.to_string()));
        }

        let path = self.workspace.dir(category).join(name);
        if path.exists() {
            return Err(Error::AlreadyExists(path));
        }

        fs::create_dir_all(&path)
            .map_err(Error::io(format!("failed to create {}", path.display())))?;
        let (file_name, contents) = category.starter_file();
        let entry = path.join(file_name);
        fs::write(&entry, contents)
            .map_err(Error::io(format!("failed to write {}", entry.display())))?;

        tracing::info!(%category, path = %path.display(), "project created");
        Ok(Project {
            name: name.to_string(),
            path,
            is_dir: true,
            source: Source::Workspace,
        })
    }

    /// Sends a workspace project to the OS trash. External entries are only forgotten.
    pub fn trash_project(&mut self, category: Category, project: &Project) -> Result<()> {
        if project.is_external() {
            self.remove_external(category, &project.path);
            return Ok(());
        }
        if !project.path.exists() {
            return Err(Error::NotFound(project.path.clone()));
        }

        trash::delete(&project.path).map_err(|source| Error::Trash {
            path: project.path.clone(),
            source,
        })?;
        tracing::info!(%category, path = %project.path.display(), "project moved to trash");
        Ok(())
    }
}

pub fn read_file(path: &Path) -> Result<String> {
    check_file(path)?;
    fs::read_to_string(path).map_err(Error::io(format!("failed to read {}", path.display())))
}

pub fn save_file(path: &Path, contents: &str) -> Result<()> {
    check_file(path)?;
    fs::write(path, contents).map_err(Error::io(format!("failed to write {}", path.display())))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "file saved");
    Ok(())
}

fn check_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        return Err(Error::NotAFile(path.to_path_buf()));
    }
    Ok(())
}

fn external_project(path: &Path) -> Project {
    Project {
        name: display_name(path),
        path: path.to_path_buf(),
        is_dir: path.is_dir(),
        source: Source::External,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs::File;
    use tempfile::{TempDir, tempdir};

    fn setup() -> Result<(TempDir, Registry)> {
        let dir = tempdir()?;
        let workspace = Workspace::new(dir.path().join("workspace"));
        workspace.init()?;
        Ok((dir, Registry::new(workspace)))
    }

    fn external_dir(root: &Path, name: &str) -> Result<PathBuf> {
        let path = root.join("outside").join(name);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    #[test]
    fn empty_workspace_lists_nothing() -> Result<()> {
        let (_dir, registry) = setup()?;
        for category in Category::ALL {
            assert!(registry.list(category)?.is_empty());
        }
        Ok(())
    }

    #[test]
    fn workspace_entries_come_before_externals_without_duplicates() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let web = registry.workspace().dir(Category::Web);
        fs::create_dir(web.join("zoo"))?;
        fs::create_dir(web.join("blog"))?;
        File::create(web.join("notes.html"))?;

        let shadowed = external_dir(dir.path(), "blog")?;
        let fresh = external_dir(dir.path(), "site")?;
        let twin = dir.path().join("other/site");
        fs::create_dir_all(&twin)?;

        assert!(registry.add_external(Category::Web, &shadowed)?);
        assert!(registry.add_external(Category::Web, &fresh)?);
        assert!(registry.add_external(Category::Web, &twin)?);

        let projects = registry.list(Category::Web)?;
        let names: Vec<&str> = projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["blog", "notes.html", "zoo", "site"]);
        assert!(projects[..3].iter().all(|p| !p.is_external()));
        assert!(projects[3].is_external());
        assert!(!projects[1].is_dir);
        Ok(())
    }

    #[test]
    fn add_external_rejects_duplicates_and_owned_paths() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let site = external_dir(dir.path(), "site")?;
        let owned = registry.workspace().dir(Category::Web).join("owned");
        fs::create_dir(&owned)?;

        assert!(registry.add_external(Category::Web, &site)?);
        assert!(!registry.add_external(Category::Web, &site)?);
        assert!(!registry.add_external(Category::Web, &owned)?);
        assert_eq!(registry.external(Category::Web).len(), 1);

        let missing = dir.path().join("nope");
        assert!(matches!(
            registry.add_external(Category::Web, &missing),
            Err(Error::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn move_missing_source_is_not_found_and_keeps_overlay() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let site = external_dir(dir.path(), "site")?;
        registry.add_external(Category::Web, &site)?;
        let project = registry.list(Category::Web)?.remove(0);

        fs::remove_dir_all(&site)?;

        let result = registry.move_project(Category::Web, &project, Overwrite::Replace);
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(registry.external(Category::Web), &[project.path.clone()]);
        Ok(())
    }

    #[test]
    fn move_conflict_without_overwrite_touches_nothing() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let existing = registry.workspace().dir(Category::Script).join("tool");
        fs::create_dir(&existing)?;
        fs::write(existing.join("main.py"), "old\n")?;

        let incoming = external_dir(dir.path(), "tool")?;
        fs::write(incoming.join("main.py"), "new\n")?;
        registry.add_external(Category::Script, &incoming)?;
        let project = Project {
            name: "tool".to_string(),
            path: registry.external(Category::Script)[0].clone(),
            is_dir: true,
            source: Source::External,
        };

        let outcome = registry.move_project(Category::Script, &project, Overwrite::Skip)?;
        assert_eq!(outcome, MoveOutcome::Conflict(existing.clone()));
        assert_eq!(fs::read_to_string(existing.join("main.py"))?, "old\n");
        assert_eq!(fs::read_to_string(incoming.join("main.py"))?, "new\n");

        let outcome = registry.move_project(Category::Script, &project, Overwrite::Replace)?;
        assert_eq!(outcome, MoveOutcome::Moved(existing.clone()));
        assert_eq!(fs::read_to_string(existing.join("main.py"))?, "new\n");
        assert!(!incoming.exists());
        Ok(())
    }

    #[test]
    fn add_move_list_round_trip() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let app = external_dir(dir.path(), "app")?;
        fs::write(app.join("main.py"), "print('x')\n")?;

        registry.add_external(Category::App, &app)?;
        let project = registry.list(Category::App)?.remove(0);
        assert!(project.is_external());

        let outcome = registry.move_project(Category::App, &project, Overwrite::Skip)?;
        let dest = registry.workspace().dir(Category::App).join("app");
        assert_eq!(outcome, MoveOutcome::Moved(dest.clone()));

        let projects = registry.list(Category::App)?;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "app");
        assert_eq!(projects[0].source, Source::Workspace);
        assert_eq!(projects[0].path, dest);
        assert!(registry.external(Category::App).is_empty());
        assert!(!app.exists());

        // Moving an owned project is a no-op.
        let again = registry.move_project(Category::App, &projects[0], Overwrite::Skip)?;
        assert_eq!(again, MoveOutcome::AlreadyInWorkspace);
        Ok(())
    }

    #[test]
    fn move_all_reports_and_continues() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let batch = registry.workspace().dir(Category::Batch);
        fs::create_dir(batch.join("clash"))?;

        let clash = external_dir(dir.path(), "clash")?;
        let kept = external_dir(dir.path(), "kept")?;
        let single = dir.path().join("outside/single.bat");
        fs::write(&single, "@echo off\n")?;
        registry.add_external(Category::Batch, &clash)?;
        registry.add_external(Category::Batch, &kept)?;
        registry.add_external(Category::Batch, &single)?;

        let mut asked = Vec::new();
        let mut seen = 0;
        let report = registry.move_all(
            Category::Batch,
            |p| {
                asked.push(p.name.clone());
                false
            },
            |_| seen += 1,
        );

        assert_eq!(report.moved, 2);
        assert_eq!(report.skipped, 1);
        assert!(report.failed.is_empty());
        assert_eq!(asked, vec!["clash"]);
        assert_eq!(seen, 3);
        assert!(clash.exists());
        assert!(batch.join("kept").is_dir());
        assert!(batch.join("single.bat").is_file());
        assert_eq!(registry.external(Category::Batch).len(), 1);
        assert_eq!(report.to_string(), "Moved 2 items, skipped 1");
        Ok(())
    }

    #[test]
    fn web_scenario() -> Result<()> {
        let (dir, mut registry) = setup()?;
        assert!(registry.list(Category::Web)?.is_empty());

        let site = external_dir(dir.path(), "site")?;
        fs::write(site.join("index.html"), "<html></html>\n")?;
        registry.add_external(Category::Web, &site)?;

        let projects = registry.list(Category::Web)?;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "site");
        assert!(projects[0].is_external());

        registry.move_project(Category::Web, &projects[0], Overwrite::Skip)?;
        let projects = registry.list(Category::Web)?;
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "site");
        assert!(!projects[0].is_external());
        assert!(projects[0].path.join("index.html").is_file());
        assert!(!site.exists());
        Ok(())
    }

    #[test]
    fn import_moves_dropped_path() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let script = dir.path().join("loose.ps1");
        fs::write(&script, "Write-Host hi\n")?;

        let outcome = registry.import(Category::Shell, &script, Overwrite::Skip)?;
        let dest = registry.workspace().dir(Category::Shell).join("loose.ps1");
        assert_eq!(outcome, MoveOutcome::Moved(dest.clone()));
        assert!(dest.is_file());
        assert!(!script.exists());

        assert_eq!(
            registry.import(Category::Shell, &dest, Overwrite::Skip)?,
            MoveOutcome::AlreadyInWorkspace
        );
        assert!(matches!(
            registry.import(Category::Shell, &script, Overwrite::Skip),
            Err(Error::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn folder_holding_the_workspace_is_never_moved() -> Result<()> {
        let dir = tempdir()?;
        let outer = dir.path().join("outer");
        let workspace = Workspace::new(outer.join("ws"));
        workspace.init()?;
        let mut registry = Registry::new(workspace);

        assert!(matches!(
            registry.add_external(Category::Web, &outer),
            Err(Error::Unmovable { .. })
        ));
        assert!(registry.external(Category::Web).is_empty());

        for source in [&outer, &outer.join("ws")] {
            assert!(matches!(
                registry.import(Category::Web, source, Overwrite::Replace),
                Err(Error::Unmovable { .. })
            ));
        }
        let scripts = registry.workspace().dir(Category::Script);
        assert!(matches!(
            registry.import(Category::Web, &scripts, Overwrite::Replace),
            Err(Error::Unmovable { .. })
        ));

        assert!(registry.workspace().root().is_dir());
        for category in Category::ALL {
            assert!(registry.workspace().dir(category).is_dir());
        }
        Ok(())
    }

    #[test]
    fn source_without_file_name_is_refused() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let dotdot = external_dir(dir.path(), "site")?.join("..");

        for source in [Path::new("/"), dotdot.as_path()] {
            assert!(matches!(
                registry.add_external(Category::Web, source),
                Err(Error::Unmovable { .. })
            ));
            assert!(matches!(
                registry.import(Category::Web, source, Overwrite::Skip),
                Err(Error::Unmovable { .. })
            ));
        }
        assert!(dir.path().join("outside/site").is_dir());
        assert!(registry.list(Category::Web)?.is_empty());
        Ok(())
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn move_keeps_non_utf8_names() -> Result<()> {
        use std::os::unix::ffi::OsStrExt;

        let (dir, mut registry) = setup()?;
        let name = OsStr::from_bytes(b"caf\xff");
        let source = dir.path().join(name);
        fs::create_dir(&source)?;
        fs::write(source.join("index.html"), "hi")?;

        let outcome = registry.import(Category::Web, &source, Overwrite::Skip)?;
        let dest = registry.workspace().dir(Category::Web).join(name);
        assert_eq!(outcome, MoveOutcome::Moved(dest.clone()));
        assert!(dest.join("index.html").is_file());
        Ok(())
    }

    #[test]
    fn create_project_writes_starter_file() -> Result<()> {
        let (_dir, registry) = setup()?;

        let project = registry.create_project(Category::Web, "landing")?;
        assert!(project.path.join("index.html").is_file());
        assert_eq!(registry.find(Category::Web, "landing")?, Some(project));

        assert!(matches!(
            registry.create_project(Category::Web, "landing"),
            Err(Error::AlreadyExists(_))
        ));
        assert!(matches!(
            registry.create_project(Category::Web, "../escape"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            registry.create_project(Category::Web, "  "),
            Err(Error::InvalidName(_))
        ));
        Ok(())
    }

    #[test]
    fn read_and_save_files_only() -> Result<()> {
        let (_dir, registry) = setup()?;
        let project = registry.create_project(Category::Script, "hello")?;
        let entry = project.path.join("main.py");

        save_file(&entry, "print('edited')\n")?;
        assert_eq!(read_file(&entry)?, "print('edited')\n");

        assert!(matches!(read_file(&project.path), Err(Error::NotAFile(_))));
        assert!(matches!(
            save_file(&project.path.join("gone.py"), ""),
            Err(Error::NotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn trash_external_only_forgets_it() -> Result<()> {
        let (dir, mut registry) = setup()?;
        let site = external_dir(dir.path(), "site")?;
        registry.add_external(Category::Web, &site)?;
        let project = registry.list(Category::Web)?.remove(0);

        registry.trash_project(Category::Web, &project)?;

        assert!(site.exists());
        assert!(registry.list(Category::Web)?.is_empty());
        Ok(())
    }

    #[test]
    fn trash_workspace_project() -> Result<()> {
        let (_dir, mut registry) = setup()?;
        let project = registry.create_project(Category::Batch, "old")?;

        registry.trash_project(Category::Batch, &project)?;

        assert!(!project.path.exists());
        Ok(())
    }
}
