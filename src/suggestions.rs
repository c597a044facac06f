//! # Error Suggestions
//!
//! Helpers that turn common CLI mistakes into errors saying what went wrong
//! and how to fix it.
//!
//! ```rust,ignore
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::config::WorkspaceConfig;
use crate::language::SUPPORTED;

/// Generate an error for when the configuration file is not found.
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Run clientgen from the directory holding clientgen.yaml\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set CLIENTGEN_CONFIG environment variable",
        path = path.display()
    )
}

/// Generate an error for a library name that is not in the workspace.
///
/// Suggests the closest declared name when there is one.
pub fn library_not_found(name: &str, config: &WorkspaceConfig) -> anyhow::Error {
    let names: Vec<&str> = config.libraries.iter().map(|l| l.name.as_str()).collect();
    let did_you_mean = find_similar(name, &names)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    anyhow::anyhow!(
        "library not found: {name:?}{did_you_mean}\n\n\
         hint: Run 'clientgen validate' to list the configured libraries\n\
         hint: Use --all to generate every library"
    )
}

/// Generate an error for a language without a backend.
pub fn unsupported_language(language: &str) -> anyhow::Error {
    let did_you_mean = find_similar(language, SUPPORTED)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    anyhow::anyhow!(
        "language {language:?} is not supported{did_you_mean}\n\n\
         Supported languages are: {languages}",
        languages = SUPPORTED.join(", ")
    )
}

/// Generate an error for `--push` without a token.
pub fn missing_token() -> anyhow::Error {
    anyhow::anyhow!(
        "a GitHub token must be provided when push is requested\n\n\
         hint: Pass --github-token <TOKEN>\n\
         hint: Set GITHUB_TOKEN environment variable"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
