//! Default values for clientgen configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Default configuration file looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "clientgen.yaml";

/// Name of the primary API definition repository.
pub const GOOGLEAPIS_REPO: &str = "googleapis/googleapis";

/// Remote URL of the primary API definition repository.
pub const GOOGLEAPIS_URL: &str = "https://github.com/googleapis/googleapis";

/// Branch name prefix for regeneration pushes.
pub const BRANCH_PREFIX: &str = "clientgen";

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/clientgen` (XDG Base Directory)
/// - macOS: `~/Library/Caches/clientgen`
/// - Windows: `{FOLDERID_LocalAppData}\clientgen`
///
/// Falls back to `.clientgen-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `CLIENTGEN_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".clientgen-cache"))
        .join("clientgen")
}
