//! # Keep-List Cleaner
//!
//! Regenerating a library means deleting everything the generator produced
//! last time while preserving a small set of hand-maintained files. The keep
//! list names those files (or directories) relative to the directory being
//! cleaned.
//!
//! [`check_and_clean`] validates the keep list before touching anything, so a
//! typo in the configuration never results in a partially cleaned tree.
//! Cleaning then happens in two passes:
//!
//! 1. Every regular file that is not covered by the keep list is removed.
//! 2. Directories are visited deepest-first and removed when they are not
//!    covered by the keep list. Directories that still hold kept files are
//!    not empty and survive.
//!
//! A path is covered when it, or one of its ancestors, is in the keep list,
//! so keeping a directory keeps its whole subtree. Version-control and CI
//! metadata directories are never entered. A keep entry of `.` keeps the whole
//! directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::config::CONFIG_FILE_NAME;
use crate::error::{Error, Result};
use crate::path::{is_covered, normalize_relative};

/// Directories that are never descended into or removed.
pub const CONTROL_DIRS: &[&str] = &[".git", ".github", ".gemini"];

/// Remove everything in `dir` except the entries in `keep`.
///
/// A missing `dir` is not an error. Every entry of `keep` must exist inside
/// `dir`, otherwise nothing is deleted.
pub fn check_and_clean(dir: &Path, keep: &[String]) -> Result<()> {
    match check(dir, keep)? {
        Some(keep_set) => clean(dir, &keep_set),
        None => {
            debug!("Nothing to clean, {} does not exist", dir.display());
            Ok(())
        }
    }
}

/// Validate `dir` and build the normalized keep set.
///
/// Returns `None` when `dir` does not exist.
pub fn check(dir: &Path, keep: &[String]) -> Result<Option<HashSet<PathBuf>>> {
    let metadata = match fs::metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_dir() {
        return Err(Error::NotADirectory {
            path: dir.display().to_string(),
        });
    }

    let mut keep_set = HashSet::new();
    for entry in keep {
        if !dir.join(entry).exists() {
            return Err(Error::KeepFileMissing {
                entry: entry.clone(),
            });
        }
        keep_set.insert(normalize_relative(Path::new(entry)));
    }
    Ok(Some(keep_set))
}

/// The entries of `keep` that lie inside `dir`, relative to `dir`.
///
/// An entry naming `dir` itself becomes `.` and keeps all of it.
pub fn keep_within(keep: &[String], dir: &str) -> Vec<String> {
    let dir = normalize_relative(Path::new(dir));
    keep.iter()
        .filter_map(|entry| {
            let entry = normalize_relative(Path::new(entry));
            let rel = entry.strip_prefix(&dir).ok()?;
            if rel.as_os_str().is_empty() {
                Some(".".to_string())
            } else {
                Some(rel.to_string_lossy().into_owned())
            }
        })
        .collect()
}

fn is_control_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| CONTROL_DIRS.contains(&name))
            .unwrap_or(false)
}

fn relative(dir: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(dir).unwrap_or(path).to_path_buf()
}

/// Remove files and directories of `dir` not covered by `keep_set`.
pub fn clean(dir: &Path, keep_set: &HashSet<PathBuf>) -> Result<()> {
    let config_file = Path::new(CONFIG_FILE_NAME);

    for entry in WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !is_control_dir(e))
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        let rel = relative(dir, entry.path());
        if rel == config_file || is_covered(&rel, keep_set) {
            continue;
        }
        trace!("Removing {}", entry.path().display());
        fs::remove_file(entry.path())?;
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_control_dir(e))
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            dirs.push(entry.into_path());
        }
    }

    // Pre-order walk, so reversing visits children before their parents.
    for path in dirs.iter().rev() {
        let rel = relative(dir, path);
        if is_covered(&rel, keep_set) {
            continue;
        }
        // Only empty directories can be removed; the rest hold kept files.
        if fs::remove_dir(path).is_ok() {
            trace!("Removed directory {}", path.display());
        }
    }
    Ok(())
}
