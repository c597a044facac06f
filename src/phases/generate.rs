//! Phase 2: Generate
//!
//! Hands the whole selection to the language backend, which may generate
//! libraries in parallel.

use log::info;

use super::Phase;
use crate::backends::BackendRegistry;
use crate::error::Result;
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

/// Execute Phase 2: Generate all libraries
pub fn execute(
    registry: &BackendRegistry,
    language: &str,
    libraries: &[ResolvedLibrary],
    sources: &SourceBundle,
) -> Result<()> {
    let backend = registry.get(language, Phase::Generate.capability())?;
    info!("Generating {} libraries", libraries.len());
    backend.generate(libraries, sources)
}
