//! # clientgen
//!
//! A control plane for repositories of generated client libraries. It
//! decides *what* gets generated and *where*, and delegates the actual code
//! generation to per-language tools.
//!
//! ## Quick Example
//!
//! ```
//! use clientgen::config;
//! use clientgen::resolve::resolve_all;
//!
//! let workspace = config::parse(r#"
//! language: rust
//! default:
//!   output: src/generated
//! libraries:
//!   - name: google-cloud-secretmanager-v1
//! "#).unwrap();
//!
//! let libraries = resolve_all(&workspace).unwrap();
//! assert_eq!(libraries[0].apis[0].path, "google/cloud/secretmanager/v1");
//! assert_eq!(libraries[0].output, "src/generated/cloud/secretmanager/v1");
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`, `resolve`)**: the `clientgen.yaml` workspace
//!   file and the merge of workspace defaults into each library.
//! - **Cleaning (`clean`)**: removing stale generated files while honouring a
//!   library's keep list.
//! - **Sources (`sources`, `cache`)**: pinned API definition corpora, fetched
//!   as archives, verified and cached by commit.
//! - **Backends (`backends`)**: per-language adapters invoking the external
//!   generators, formatters and build tools.
//! - **Phases (`phases`)**: the one-shot `generate` pipeline of clean,
//!   generate, format and post-generate.
//! - **Incremental update (`update`, `state`, `repository`)**: regenerating
//!   only the APIs whose upstream definitions changed, committing the result
//!   and optionally opening a pull request.

pub mod backends;
pub mod cache;
pub mod cancel;
pub mod clean;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod github;
pub mod language;
pub mod output;
pub mod path;
pub mod phases;
pub mod repository;
pub mod resolve;
pub mod sources;
pub mod state;
pub mod suggestions;
pub mod update;

#[cfg(test)]
mod clean_proptest;

pub use error::{Error, Result};
