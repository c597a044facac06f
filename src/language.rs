//! Per-language naming conventions.
//!
//! Each target language lays out its libraries differently inside the
//! workspace and spells API paths differently in library names. The two
//! functions here are the only place those conventions live.

use std::path::Path;

pub const FAKE: &str = "fake";
pub const RUST: &str = "rust";
pub const DART: &str = "dart";
pub const PYTHON: &str = "python";
pub const JAVA: &str = "java";

/// Every language with a registered backend.
pub const SUPPORTED: &[&str] = &[FAKE, RUST, DART, PYTHON, JAVA];

/// Derive the corpus API path from a library name.
///
/// Dart package names use underscores as separators
/// (`google_cloud_secretmanager_v1`); every other language uses dashes
/// (`google-cloud-secretmanager-v1`). Both map to
/// `google/cloud/secretmanager/v1`.
pub fn derive_api_path(language: &str, name: &str) -> String {
    match language {
        DART => name.replace('_', "/"),
        _ => name.replace('-', "/"),
    }
}

/// Compute the output directory for a library that does not declare one.
pub fn default_output(language: &str, name: &str, api_path: &str, default_output: &str) -> String {
    let base = Path::new(default_output);
    let path = match language {
        RUST => base.join(api_path.strip_prefix("google/").unwrap_or(api_path)),
        DART | PYTHON | FAKE => base.join(name),
        JAVA => base.join(format!("java-{}", name)),
        _ => base.to_path_buf(),
    };
    path.to_string_lossy().into_owned()
}
