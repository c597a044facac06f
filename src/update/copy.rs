//! Copying a generated tree over the language repository.

use std::fs;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Copy every file under `source` to the same relative path under `target`.
///
/// Parent directories are created as needed and existing files are
/// overwritten. `fs::copy` carries the permission bits along, so generated
/// scripts stay executable. A missing `source` copies nothing.
pub fn copy_tree(source: &Path, target: &Path) -> Result<usize> {
    if !source.exists() {
        return Ok(0);
    }
    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Config {
                message: format!("{}: {}", entry.path().display(), e),
            })?;
        let destination = target.join(relative);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &destination)?;
        copied += 1;
    }
    debug!(
        "Copied {} files from {} to {}",
        copied,
        source.display(),
        target.display()
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_overwrites_and_keeps_others() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("out");
        let target = temp.path().join("repo");
        fs::create_dir_all(source.join("src/generated")).unwrap();
        fs::write(source.join("src/generated/lib.rs"), "new").unwrap();
        fs::write(source.join("Cargo.toml"), "[package]").unwrap();
        fs::create_dir_all(target.join("src/generated")).unwrap();
        fs::write(target.join("src/generated/lib.rs"), "old").unwrap();
        fs::write(target.join("LICENSE"), "license").unwrap();

        assert_eq!(copy_tree(&source, &target).unwrap(), 2);
        assert_eq!(
            fs::read_to_string(target.join("src/generated/lib.rs")).unwrap(),
            "new"
        );
        assert_eq!(fs::read_to_string(target.join("Cargo.toml")).unwrap(), "[package]");
        assert_eq!(fs::read_to_string(target.join("LICENSE")).unwrap(), "license");
    }

    #[test]
    fn test_copy_tree_missing_source() {
        let temp = TempDir::new().unwrap();
        assert_eq!(
            copy_tree(&temp.path().join("none"), temp.path()).unwrap(),
            0
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_keeps_executable_bit() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("out");
        fs::create_dir_all(&source).unwrap();
        let script = source.join("generate.sh");
        fs::write(&script, "#!/bin/sh").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let target = temp.path().join("repo");
        copy_tree(&source, &target).unwrap();
        let mode = fs::metadata(target.join("generate.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
