//! # Validate Command Implementation
//!
//! Checks a `clientgen.yaml` without generating anything:
//!
//! - **Parsing**: the file is well-formed and every library has a unique name.
//! - **Language**: a backend exists for the configured language.
//! - **Resolution**: every library resolves against the workspace defaults
//!   (veneers declare an output, API paths and outputs can be derived).
//! - **Sources**: the API corpus is configured, and pinned sources carry a
//!   checksum.
//!
//! This command is a safe, read-only operation that does not modify any files.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use clientgen::config::{self, Source, WorkspaceConfig};
use clientgen::defaults::DEFAULT_CONFIG_FILE;
use clientgen::language;
use clientgen::output::{marker, Marker, OutputConfig};
use clientgen::resolve::resolve;
use clientgen::suggestions;

/// Validate a clientgen.yaml configuration file
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the clientgen.yaml configuration file to validate.
    #[arg(short, long, value_name = "FILE", env = "CLIENTGEN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    println!(
        "{} Validating configuration: {}",
        marker(&out, Marker::Scan),
        config_path.display()
    );
    if !config_path.exists() {
        return Err(suggestions::config_not_found(&config_path));
    }

    let workspace = match config::from_file(&config_path) {
        Ok(workspace) => {
            println!(
                "{} Configuration file parsed successfully",
                marker(&out, Marker::Ok)
            );
            workspace
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {}",
                marker(&out, Marker::Error),
                e
            );
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    let problems = report(&out, &workspace);
    let warnings = source_warnings(&workspace);
    for warning in &warnings {
        println!("{} {}", marker(&out, Marker::Warning), warning);
    }

    if problems > 0 {
        println!(
            "\n{} Validation failed with {} problem(s)",
            marker(&out, Marker::Error),
            problems
        );
        anyhow::bail!("{} library configuration problem(s) found", problems);
    }
    println!("\n{} Configuration is valid", marker(&out, Marker::Ok));
    Ok(())
}

/// Print a summary and every resolved library, returning the number of
/// problems found.
fn report(out: &OutputConfig, workspace: &WorkspaceConfig) -> usize {
    let mut problems = 0;

    println!("\n{} Configuration Summary:", marker(out, Marker::Info));
    println!("   Language: {}", workspace.language);
    println!("   Libraries: {}", workspace.libraries.len());
    let skipped = workspace
        .libraries
        .iter()
        .filter(|l| l.skip_generate)
        .count();
    if skipped > 0 {
        println!("   Skipping generation: {}", skipped);
    }

    if !language::SUPPORTED.contains(&workspace.language.as_str()) {
        println!(
            "{} {}",
            marker(out, Marker::Error),
            suggestions::unsupported_language(&workspace.language)
        );
        problems += 1;
    }

    println!();
    for library in &workspace.libraries {
        match resolve(&workspace.language, library, workspace.default.as_ref()) {
            Ok(resolved) => {
                let apis: Vec<&str> = resolved.apis.iter().map(|a| a.path.as_str()).collect();
                let status = if resolved.skip_generate {
                    marker(out, Marker::Skip)
                } else {
                    marker(out, Marker::Ok)
                };
                println!(
                    "{} {} -> {} [{}]",
                    status,
                    resolved.name,
                    resolved.output,
                    apis.join(", ")
                );
            }
            Err(e) => {
                println!("{} {}: {}", marker(out, Marker::Error), library.name, e);
                problems += 1;
            }
        }
    }
    problems
}

fn source_warnings(workspace: &WorkspaceConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let Some(sources) = &workspace.sources else {
        warnings.push("no sources configured; generate requires sources.googleapis".to_string());
        return warnings;
    };
    if sources.googleapis.is_none() {
        warnings.push("sources.googleapis is not configured".to_string());
    }
    let pinned = [
        ("googleapis", &sources.googleapis),
        ("discovery", &sources.discovery),
        ("showcase", &sources.showcase),
        ("protobuf", &sources.protobuf),
        ("conformance", &sources.conformance),
    ];
    for (name, source) in pinned {
        if let Some(source) = source {
            if let Some(warning) = source_warning(name, source) {
                warnings.push(warning);
            }
        }
    }
    warnings
}

fn source_warning(name: &str, source: &Source) -> Option<String> {
    if !source.dir.is_empty() {
        return None;
    }
    if source.commit.is_empty() {
        return Some(format!("sources.{} sets neither dir nor commit", name));
    }
    if source.sha256.is_empty() {
        return Some(format!(
            "sources.{} pins commit {} without a sha256",
            name, source.commit
        ));
    }
    None
}
