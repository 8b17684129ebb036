use crate::model::Category;
use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{} no longer exists", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a folder", .0.display())]
    NotAFolder(PathBuf),

    #[error("{} is a folder, not a file", .0.display())]
    NotAFile(PathBuf),

    #[error("no suitable files found in {}\nSearched for: {searched}", .dir.display())]
    NoRunnableFound { dir: PathBuf, searched: String },

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid project name: {0:?}")]
    InvalidName(String),

    #[error("{} cannot be moved into the workspace: {reason}", .path.display())]
    Unmovable { path: PathBuf, reason: &'static str },

    #[error("running {0} projects is not implemented yet")]
    Unimplemented(Category),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to move {} to trash: {source}", .path.display())]
    Trash {
        path: PathBuf,
        #[source]
        source: trash::Error,
    },
}

impl Error {
    /// Builds a `map_err` adapter that wraps an `io::Error` with context.
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
