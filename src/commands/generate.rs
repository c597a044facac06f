//! Generate command implementation
//!
//! Runs the one-shot pipeline for one library or for every library:
//! 1. Clean stale generated files, honouring keep lists
//! 2. Generate with the language backend
//! 3. Format the generated code
//! 4. Post-generate repository-level actions

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use clientgen::backends::BackendRegistry;
use clientgen::cancel::CancelToken;
use clientgen::config;
use clientgen::defaults::{default_cache_root, DEFAULT_CONFIG_FILE};
use clientgen::error::Error;
use clientgen::output::{marker, Marker, OutputConfig};
use clientgen::phases::orchestrator::{execute_generate, GenerateRequest};
use clientgen::phases::selection::Selection;
use clientgen::sources::SourceProvider;
use clientgen::suggestions;

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Name of the library to generate
    #[arg(value_name = "LIBRARY")]
    pub library: Option<String>,

    /// Generate every library that does not set skip_generate
    #[arg(long)]
    pub all: bool,

    /// Path to config file
    #[arg(short, long, value_name = "FILE", env = "CLIENTGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache root directory for downloaded sources
    #[arg(long, value_name = "DIR", env = "CLIENTGEN_CACHE")]
    pub cache_root: Option<PathBuf>,
}

/// Execute the generate command
pub fn execute(args: GenerateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let start_time = Instant::now();

    // Usage errors are reported before touching the filesystem.
    let selection = Selection::from_args(args.library.as_deref(), args.all)?;

    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if !config_path.exists() {
        return Err(suggestions::config_not_found(&config_path));
    }
    let config = config::from_file(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let workspace_root = super::workspace_root(&config_path)?;

    let registry = BackendRegistry::for_workspace(&config, &workspace_root);
    if !registry.contains(&config.language) {
        return Err(suggestions::unsupported_language(&config.language));
    }
    let provider = SourceProvider::new(args.cache_root.unwrap_or_else(default_cache_root))?;

    let target = match &selection {
        Selection::All => "all libraries".to_string(),
        Selection::Named(name) => name.clone(),
    };
    println!(
        "{} Generating {} ({})",
        marker(&out, Marker::Scan),
        target,
        config.language
    );

    let request = GenerateRequest {
        config,
        workspace_root,
        selection,
    };
    match execute_generate(&request, &provider, &registry, &CancelToken::new()) {
        Ok(report) => {
            println!(
                "{} Generated {} libraries in {:.2}s",
                marker(&out, Marker::Ok),
                report.libraries.len(),
                start_time.elapsed().as_secs_f64()
            );
            for name in &report.libraries {
                println!("   {}", name);
            }
            Ok(())
        }
        Err(Error::LibraryNotFound { name }) => {
            Err(suggestions::library_not_found(&name, &request.config))
        }
        Err(e) => {
            println!("{} Generation failed", marker(&out, Marker::Error));
            Err(e.into())
        }
    }
}
