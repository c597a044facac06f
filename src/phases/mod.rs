//! Implementation of the phases of a `generate` run.
//!
//! ## Overview
//!
//! A run selects libraries and then executes four phases, each one a strict
//! barrier over the whole selection:
//! 1. Clean - Remove stale generated files, honouring keep lists
//! 2. Generate - Invoke the language backend for every library
//! 3. Format - Format each library's generated code
//! 4. Post-generate - Repository-level actions once everything is generated
//!
//! Each phase looks up the language backend in the
//! [`BackendRegistry`](crate::backends::BackendRegistry); a language without
//! a backend fails with an error naming the phase. The first error aborts
//! the run and completed phases are not rolled back.

use std::fmt;

// Phase modules
pub mod clean;
pub mod format;
pub mod generate;
pub mod orchestrator;
pub mod post_generate;
pub mod selection;

// Re-export phase modules in execution order
pub use clean as phase1;
pub use format as phase3;
pub use generate as phase2;
pub use post_generate as phase4;

/// A pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Clean,
    Generate,
    Format,
    PostGenerate,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 4] = [
        Phase::Clean,
        Phase::Generate,
        Phase::Format,
        Phase::PostGenerate,
    ];

    /// Noun used in "language ... does not support <phase>" errors
    pub fn capability(&self) -> &'static str {
        match self {
            Phase::Clean => "cleaning",
            Phase::Generate => "generation",
            Phase::Format => "formatting",
            Phase::PostGenerate => "post-generation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Clean => "clean",
            Phase::Generate => "generate",
            Phase::Format => "format",
            Phase::PostGenerate => "post-generate",
        };
        f.write_str(name)
    }
}
