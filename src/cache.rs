//! On-disk cache of downloaded source archives

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::TempDir;

use crate::error::{Error, Result};
use crate::path::encode_url_path;

/// Cache key combining repository name and commit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub repo: String,
    pub commit: String,
}

impl CacheKey {
    pub fn new(repo: &str, commit: &str) -> Self {
        Self {
            repo: repo.to_string(),
            commit: commit.to_string(),
        }
    }
}

/// Extracted source trees, one directory per `(repo, commit)`.
///
/// Entries are only ever created by moving a fully extracted tree into
/// place, so an existing entry is always complete.
#[derive(Debug, Clone)]
pub struct SourceCache {
    root: PathBuf,
}

impl SourceCache {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory of the cache entry for `key`, whether or not it exists
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(encode_url_path(&key.repo))
            .join(encode_url_path(&key.commit))
    }

    /// Return the entry for `key` if it has been populated
    pub fn get(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.path_for(key);
        path.is_dir().then_some(path)
    }

    /// Create a scratch directory on the same filesystem as the cache, so
    /// staged trees can be renamed into place.
    pub fn staging_dir(&self) -> Result<TempDir> {
        let staging = self.root.join(".staging");
        fs::create_dir_all(&staging)?;
        Ok(tempfile::Builder::new()
            .prefix("download-")
            .tempdir_in(&staging)?)
    }

    /// Move a fully extracted tree into the entry for `key`.
    ///
    /// If another process populated the entry in the meantime, the existing
    /// entry wins and `tree` is left for the caller to drop.
    pub fn insert(&self, key: &CacheKey, tree: &Path) -> Result<PathBuf> {
        let target = self.path_for(key);
        if target.is_dir() {
            debug!("Cache entry {} already present", target.display());
            return Ok(target);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(tree, &target).map_err(|e| Error::Cache {
            message: format!(
                "cannot move {} into {}: {}",
                tree.display(),
                target.display(),
                e
            ),
        })?;
        Ok(target)
    }
}
