//! Phase 4: Post-generate
//!
//! Repository-level actions, such as refreshing a lock file, that only make
//! sense once every library has been generated.

use super::Phase;
use crate::backends::BackendRegistry;
use crate::error::Result;

/// Execute Phase 4: Run the backend's post-generate step once
pub fn execute(registry: &BackendRegistry, language: &str) -> Result<()> {
    registry
        .get(language, Phase::PostGenerate.capability())?
        .post_generate()
}
