use crate::model::ProjectStats;
use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Immediate children of `dir`, sorted by file name.
pub fn list_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(entries)
}

pub fn calculate_stats(path: &Path) -> ProjectStats {
    let mut stats = ProjectStats::default();

    // Serial per item; callers fan out across items.
    for entry in WalkDir::new(path)
        .skip_hidden(false)
        .parallelism(jwalk::Parallelism::Serial)
        .into_iter()
        .flatten()
    {
        if let Ok(metadata) = entry.metadata()
            && metadata.is_file()
        {
            stats.size += metadata.len();
            stats.files += 1;
        }
    }

    stats
}

pub fn stats_for(paths: &[PathBuf]) -> Vec<(PathBuf, ProjectStats)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), calculate_stats(path)))
        .collect()
}

/// Recursively copies `src` into `dst`, returning the number of bytes copied.
pub fn copy_dir(src: &Path, dst: &Path) -> io::Result<u64> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src).skip_hidden(false).sort(true).min_depth(1) {
        let entry = entry.map_err(io::Error::other)?;
        let path = entry.path();
        let target = dst.join(path.strip_prefix(src).map_err(io::Error::other)?);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() && fs::metadata(&path)?.is_dir() {
            copied += copy_dir(&path, &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            copied += fs::copy(&path, &target)?;
        }
    }

    Ok(copied)
}

/// Directories are copied then deleted; files are renamed, falling back to copy+delete across devices.
/// Not atomic: a failure after the copy leaves data in both places.
pub fn move_path(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::symlink_metadata(src)?.is_dir() {
        copy_dir(src, dst)?;
        fs::remove_dir_all(src)
    } else if fs::rename(src, dst).is_err() {
        fs::copy(src, dst)?;
        fs::remove_file(src)
    } else {
        Ok(())
    }
}

pub fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
