use crate::constants::WORKSPACE_DIR;
use crate::error::{Error, Result};
use crate::model::Category;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/Documents/DeveloperWorkspace`, or the home directory when there is no documents folder.
    pub fn default_root() -> PathBuf {
        dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(WORKSPACE_DIR)
    }

    /// Creates the root and every category directory. Existing directories are left alone.
    pub fn init(&self) -> Result<()> {
        for category in Category::ALL {
            let dir = self.dir(category);
            fs::create_dir_all(&dir)
                .map_err(Error::io(format!("failed to create {}", dir.display())))?;
            tracing::debug!(%category, dir = %dir.display(), "category directory ready");
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, category: Category) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Whether `path` resolves to somewhere inside the category directory.
    pub fn owns(&self, category: Category, path: &Path) -> bool {
        let dir = self.dir(category);
        let dir = dir.canonicalize().unwrap_or(dir);
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        path.starts_with(&dir)
    }
}
