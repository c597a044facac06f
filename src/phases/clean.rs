//! Phase 1: Clean
//!
//! Removes stale generated files from every selected library.

use log::debug;

use super::Phase;
use crate::backends::BackendRegistry;
use crate::error::Result;
use crate::resolve::ResolvedLibrary;

/// Execute Phase 1: Clean every library sequentially
pub fn execute(
    registry: &BackendRegistry,
    language: &str,
    libraries: &[ResolvedLibrary],
) -> Result<()> {
    let backend = registry.get(language, Phase::Clean.capability())?;
    for library in libraries {
        debug!("Cleaning {}", library.output);
        backend.clean(library)?;
    }
    Ok(())
}
