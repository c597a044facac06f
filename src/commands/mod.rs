//! # CLI Command Implementations
//!
//! Each subcommand of `clientgen` lives in its own file with:
//! - An `Args` struct defining its arguments, derived using `clap`.
//! - An `execute` function that turns the arguments into an immutable
//!   request and hands it to the `clientgen` library.

use std::path::{Path, PathBuf};

use anyhow::Result;

pub mod generate;
pub mod update;
pub mod validate;

/// Directory relative library outputs are resolved against: the directory
/// holding the configuration file.
pub(crate) fn workspace_root(config_path: &Path) -> Result<PathBuf> {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}
