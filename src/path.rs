//! Path manipulation utilities for clientgen

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Encode a repository name or URL to be filesystem-safe
///
/// This converts URL characters that are problematic for filesystems
/// into safe alternatives.
pub fn encode_url_path(url: &str) -> String {
    url.chars()
        .map(|c| match c {
            '/' => '-',
            '\\' => '-',
            ':' => '_',
            '*' => '_',
            '?' => '_',
            '"' => '_',
            '<' => '_',
            '>' => '_',
            '|' => '_',
            // Keep alphanumeric, dots, dashes, underscores as-is
            c if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' => c,
            // Replace other characters with underscores
            _ => '_',
        })
        .collect()
}

/// Normalize a relative path lexically.
///
/// `.` components are dropped and `..` pops the previous component, so
/// `./a/b`, `a/./b` and `a/c/../b` all become `a/b`. The filesystem is not
/// consulted.
pub fn normalize_relative(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
            Component::RootDir | Component::Prefix(_) => {}
        }
    }
    normalized
}

/// Whether `rel` or one of its ancestors is in `keep`.
///
/// An empty entry (`.` once normalized) covers every path.
pub fn is_covered(rel: &Path, keep: &HashSet<PathBuf>) -> bool {
    rel.ancestors().any(|ancestor| keep.contains(ancestor))
}

/// Join a repository-relative path onto a root, unless it is already absolute.
pub fn resolve_under(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}
