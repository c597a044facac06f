//! Helpers shared by the `protoc`-based backends.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The `.proto` files directly inside `api_path`, sorted by name.
pub fn api_protos(googleapis: &Path, api_path: &str) -> Result<Vec<PathBuf>> {
    let dir = googleapis.join(api_path);
    let mut protos = Vec::new();
    if dir.is_dir() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "proto") {
                protos.push(path);
            }
        }
    }
    if protos.is_empty() {
        return Err(Error::Tool {
            tool: "protoc".to_string(),
            message: format!("no protos found in api {:?}", api_path),
        });
    }
    protos.sort();
    Ok(protos)
}

/// The last `v`-prefixed component of an API path, e.g. `v1` in
/// `google/cloud/secretmanager/v1`.
pub fn extract_version(api_path: &str) -> Option<&str> {
    api_path.rsplit('/').find(|part| part.starts_with('v'))
}

/// Extract a zip archive (such as a `.srcjar`) into `dest`.
pub fn unzip(archive: &Path, dest: &Path) -> Result<()> {
    let file = fs::File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| Error::Tool {
        tool: "unzip".to_string(),
        message: format!("{}: {}", archive.display(), e),
    })?;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| Error::Tool {
            tool: "unzip".to_string(),
            message: e.to_string(),
        })?;
        // Entries escaping `dest` are rejected.
        let relative = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Tool {
                tool: "unzip".to_string(),
                message: format!("illegal file path: {}", entry.name()),
            })?;
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
    }
    Ok(())
}
