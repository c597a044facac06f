//! Orchestrator for the complete generate operation
//!
//! This module coordinates all phases to provide a clean API for a one-shot
//! `generate` run.

use std::path::PathBuf;

use log::info;

use super::selection::{select_libraries, Selection};
use super::{phase1, phase2, phase3, phase4};
use crate::backends::BackendRegistry;
use crate::cancel::CancelToken;
use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceProvider;

/// Everything a generate run needs, fixed before any work starts.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub config: WorkspaceConfig,
    /// Directory holding `clientgen.yaml`; relative outputs are resolved
    /// against it.
    pub workspace_root: PathBuf,
    pub selection: Selection,
}

/// Outcome of a generate run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateReport {
    /// Generated library names in declaration order
    pub libraries: Vec<String>,
}

/// Execute the complete generate operation
///
/// This orchestrates the pipeline:
/// 1. Select and resolve libraries
/// 2. Load the source bundle (downloading pinned sources if needed)
/// 3. Clean, generate, format and post-generate, each as a barrier
pub fn execute_generate(
    request: &GenerateRequest,
    provider: &SourceProvider,
    registry: &BackendRegistry,
    cancel: &CancelToken,
) -> Result<GenerateReport> {
    let config = &request.config;
    let sources = config.sources.as_ref().ok_or_else(|| Error::Config {
        message: "sources required in clientgen.yaml".to_string(),
    })?;

    let libraries: Vec<ResolvedLibrary> = select_libraries(config, &request.selection)?
        .iter()
        .map(|library| library.relocate(&request.workspace_root))
        .collect();

    cancel.check()?;
    let bundle = provider.load_bundle(&config.language, sources)?;

    // Phase 1: Clean
    cancel.check()?;
    phase1::execute(registry, &config.language, &libraries)?;

    // Phase 2: Generate
    cancel.check()?;
    phase2::execute(registry, &config.language, &libraries, &bundle)?;

    // Phase 3: Format
    cancel.check()?;
    phase3::execute(registry, &config.language, &libraries)?;

    // Phase 4: Post-generate
    cancel.check()?;
    phase4::execute(registry, &config.language)?;

    let names: Vec<String> = libraries.iter().map(|l| l.name.clone()).collect();
    info!("Generated {} libraries", names.len());
    Ok(GenerateReport { libraries: names })
}
