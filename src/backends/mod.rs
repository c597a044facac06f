//! # Language Backends
//!
//! A backend adapts the generation pipeline to one target language. It is
//! the only place that knows which external tools a language uses and how
//! their output is laid out.
//!
//! The [`Backend`] trait mirrors the pipeline phases. Only `generate` is
//! required; cleaning defaults to the keep-list cleaner and every other phase
//! defaults to doing nothing.
//!
//! Backends are looked up by language key in a [`BackendRegistry`]. An
//! unregistered language fails with [`Error::UnsupportedLanguage`] naming the
//! phase that was attempted.

pub mod dart;
pub mod fake;
pub mod java;
pub mod process;
pub mod protoc;
pub mod python;
pub mod rust;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::clean::{check_and_clean, keep_within};
use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};
use crate::language;
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

/// Per-language implementation of the pipeline phases.
///
/// Libraries passed to a backend have absolute output paths.
pub trait Backend: Send + Sync {
    /// Remove stale generated files from the library output.
    fn clean(&self, library: &ResolvedLibrary) -> Result<()> {
        check_and_clean(Path::new(&library.output), &library.keep)
    }

    /// Directories under the library output that hold the generated files
    /// of `api_path` and nothing else, relative to the output.
    ///
    /// The default assumes the output mirrors the corpus layout.
    fn api_dirs(&self, _library: &ResolvedLibrary, api_path: &str) -> Vec<String> {
        vec![api_path.to_string()]
    }

    /// Remove the stale generated files of one API of `library`.
    ///
    /// A library generating a single API is cleaned as a whole. Otherwise
    /// only [`Backend::api_dirs`] are cleaned and the output of the other
    /// APIs stays untouched.
    fn clean_api(&self, library: &ResolvedLibrary, api_path: &str) -> Result<()> {
        if library.apis.len() <= 1 {
            return self.clean(library);
        }
        clean_dirs(library, &self.api_dirs(library, api_path))
    }

    /// Generate all the given libraries.
    fn generate(&self, libraries: &[ResolvedLibrary], sources: &SourceBundle) -> Result<()>;

    /// Format the generated code of one library.
    fn format(&self, _library: &ResolvedLibrary) -> Result<()> {
        Ok(())
    }

    /// Repository-level actions after every library was generated.
    fn post_generate(&self) -> Result<()> {
        Ok(())
    }

    /// Build and test a library inside `repo_root`.
    fn build(&self, _repo_root: &Path, _library: &ResolvedLibrary) -> Result<()> {
        Ok(())
    }
}

/// Clean `dirs` of the library output, each with the keep entries inside it.
pub fn clean_dirs(library: &ResolvedLibrary, dirs: &[String]) -> Result<()> {
    let output = Path::new(&library.output);
    for dir in dirs {
        check_and_clean(&output.join(dir), &keep_within(&library.keep, dir))?;
    }
    Ok(())
}

/// Locates external tools through `release.preinstalled`.
///
/// Tools that are not listed resolve to their bare name and are looked up on
/// `PATH`.
#[derive(Debug, Clone, Default)]
pub struct Tools {
    preinstalled: BTreeMap<String, String>,
}

impl Tools {
    pub fn new(preinstalled: BTreeMap<String, String>) -> Self {
        Self { preinstalled }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(
            config
                .release
                .as_ref()
                .map(|release| release.preinstalled.clone())
                .unwrap_or_default(),
        )
    }

    /// Configured location of `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.preinstalled.get(name).map(String::as_str)
    }

    /// Executable to run for the well-known tool `name`.
    pub fn path(&self, name: &str) -> String {
        self.preinstalled
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Maps language keys to backends.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Box<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every built-in backend for a workspace rooted at `root`.
    pub fn for_workspace(config: &WorkspaceConfig, root: &Path) -> Self {
        let tools = Tools::from_config(config);
        let root: PathBuf = root.to_path_buf();
        let mut registry = Self::new();
        registry.register(language::FAKE, Box::new(fake::FakeBackend::new(root.clone())));
        registry.register(
            language::RUST,
            Box::new(rust::RustBackend::new(tools.clone(), root.clone())),
        );
        registry.register(language::DART, Box::new(dart::DartBackend::new(tools.clone())));
        registry.register(
            language::PYTHON,
            Box::new(python::PythonBackend::new(tools.clone())),
        );
        registry.register(
            language::JAVA,
            Box::new(java::JavaBackend::new(
                tools,
                config
                    .default
                    .as_ref()
                    .and_then(|d| d.java.clone())
                    .unwrap_or_default(),
            )),
        );
        registry
    }

    pub fn register(&mut self, language: &str, backend: Box<dyn Backend>) {
        self.backends.insert(language.to_string(), backend);
    }

    /// Look up the backend for `language`, naming `phase` on failure.
    pub fn get(&self, language: &str, phase: &str) -> Result<&dyn Backend> {
        self.backends
            .get(language)
            .map(|backend| backend.as_ref())
            .ok_or_else(|| Error::UnsupportedLanguage {
                language: language.to_string(),
                phase: phase.to_string(),
            })
    }

    pub fn contains(&self, language: &str) -> bool {
        self.backends.contains_key(language)
    }
}
