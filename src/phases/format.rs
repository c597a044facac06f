//! Phase 3: Format

use super::Phase;
use crate::backends::BackendRegistry;
use crate::error::Result;
use crate::resolve::ResolvedLibrary;

/// Execute Phase 3: Format every library sequentially
pub fn execute(
    registry: &BackendRegistry,
    language: &str,
    libraries: &[ResolvedLibrary],
) -> Result<()> {
    let backend = registry.get(language, Phase::Format.capability())?;
    libraries.iter().try_for_each(|library| backend.format(library))
}
