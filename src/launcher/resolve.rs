use crate::constants::{
    MARKUP_EXTENSIONS, POWERSHELL_EXTENSIONS, PYTHON_EXTENSIONS, SHELL_SCRIPT_EXTENSIONS,
    TEMP_PREFIX, WEB_INDEX_STEM,
};
use crate::error::{Error, Result};
use crate::fsops::list_entries;
use std::path::{Path, PathBuf};

/// How an entry file is recognised inside a project folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRule {
    /// `<stem>.<ext>` for one of the extensions.
    Named {
        stem: &'static str,
        extensions: &'static [&'static str],
    },
    /// Any file with one of the extensions.
    Extension(&'static [&'static str]),
}

pub const WEB_INDEX: EntryRule = EntryRule::Named {
    stem: WEB_INDEX_STEM,
    extensions: MARKUP_EXTENSIONS,
};
pub const PYTHON: EntryRule = EntryRule::Extension(PYTHON_EXTENSIONS);
pub const SHELL_SCRIPT: EntryRule = EntryRule::Extension(SHELL_SCRIPT_EXTENSIONS);
pub const POWERSHELL: EntryRule = EntryRule::Extension(POWERSHELL_EXTENSIONS);

impl EntryRule {
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let has_ext = |exts: &[&str]| exts.iter().any(|e| e.eq_ignore_ascii_case(ext));

        match *self {
            Self::Named { stem, extensions } => {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|s| s.eq_ignore_ascii_case(stem))
                    && has_ext(extensions)
            }
            Self::Extension(extensions) => has_ext(extensions),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Named { stem, extensions } => extensions
                .iter()
                .map(|e| format!("{stem}.{e}"))
                .collect::<Vec<_>>()
                .join(", "),
            Self::Extension(extensions) => extensions
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub fn require_folder(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(Error::NotAFolder(path.to_path_buf()));
    }
    Ok(())
}

/// First file in `dir`, by name, that satisfies `rule`. Launcher temp files never match.
pub fn find_entry(dir: &Path, rule: EntryRule) -> Result<Option<PathBuf>> {
    let entries =
        list_entries(dir).map_err(Error::io(format!("failed to read {}", dir.display())))?;

    Ok(entries.into_iter().find(|path| {
        path.is_file()
            && !path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with(TEMP_PREFIX))
            && rule.matches(path)
    }))
}

/// Tries each rule in order and returns the first entry found.
pub fn resolve(dir: &Path, rules: &[EntryRule]) -> Result<PathBuf> {
    for rule in rules {
        if let Some(entry) = find_entry(dir, *rule)? {
            return Ok(entry);
        }
    }

    Err(Error::NoRunnableFound {
        dir: dir.to_path_buf(),
        searched: rules
            .iter()
            .map(EntryRule::describe)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
