//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `clientgen` library. It uses the `thiserror` library to create a
//! comprehensive `Error` enum that covers all anticipated failure modes,
//! providing clear and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur within the library. Each variant corresponds to a specific
//!   type of error and includes contextual information to aid in debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the library to simplify function signatures.
//!
//! The variants fall into a handful of families:
//!
//! - Configuration errors (invalid workspace configuration, bad library
//!   selection, unsupported languages). These are detected before or at the
//!   start of work and are never retried.
//! - Cleaning errors (missing keep-list entries, invalid output directories).
//! - Integrity errors (a fetched corpus archive does not match its pinned
//!   SHA-256).
//! - Generation and build errors (an external tool failed), wrapped with the
//!   API and stage when they happen during an incremental update.
//! - Consistency violations (a build step modified already-committed source).
//! - Git and publish errors.
//!
//! "Library not found" and "library has skip_generate set" are deliberately
//! separate variants so callers can tell a typo from an intentional exclusion.

use thiserror::Error;

use crate::update::Stage;

/// Main error type for clientgen operations
#[derive(Error, Debug)]
pub enum Error {
    /// An error occurred while parsing the `clientgen.yaml` configuration file.
    ///
    /// This error includes the specific parsing issue and optionally a hint
    /// about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The configuration is well-formed but semantically invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Neither a library name nor `--all` was given.
    #[error("must specify library name or use --all flag")]
    MissingLibraryOrAll,

    /// Both a library name and `--all` were given.
    #[error("cannot specify both library name and --all flag")]
    BothLibraryAndAll,

    /// `--all` selected nothing because every library skips generation.
    #[error("no libraries to generate: all libraries have skip_generate set")]
    NoLibrariesToGenerate,

    /// The named library is not declared in the workspace.
    #[error("library not found: {name:?}")]
    LibraryNotFound { name: String },

    /// The named library exists but is excluded from generation.
    #[error("library has skip_generate set: {name:?}")]
    SkipGenerate { name: String },

    /// A veneer library did not declare where its code lives.
    #[error("veneer {name:?} requires an explicit output path")]
    VeneerOutput { name: String },

    /// No backend is registered for the language in the given phase.
    #[error("language {language:?} does not support {phase}")]
    UnsupportedLanguage { language: String, phase: String },

    /// No library in the workspace generates the given API.
    #[error("no library in the workspace configuration generates API {api:?}")]
    ApiNotConfigured { api: String },

    /// The directory to clean exists but is not a directory.
    #[error("{path:?} is not a directory")]
    NotADirectory { path: String },

    /// A keep-list entry does not exist inside the directory being cleaned.
    #[error("keep file {entry:?} does not exist")]
    KeepFileMissing { entry: String },

    /// A downloaded source archive does not match its pinned hash.
    #[error("Integrity error for {repo}: expected sha256 {expected}, got {actual}")]
    Integrity {
        repo: String,
        expected: String,
        actual: String,
    },

    /// An external tool (generator, formatter, build system) failed.
    #[error("Tool execution error: {tool} - {message}")]
    Tool { tool: String, message: String },

    /// A step of the incremental update failed for a specific API.
    #[error("updating API {api:?} failed while {stage}: {source}")]
    Stage {
        api: String,
        stage: Stage,
        #[source]
        source: Box<Error>,
    },

    /// Building after a commit left the working tree dirty.
    #[error("building {api:?} created changes in the repo")]
    BuildCreatedChanges { api: String },

    /// A repository that must be clean has local modifications.
    #[error("repository {path} must be clean before update")]
    DirtyRepository { path: String },

    /// Pushing was requested without an authentication token.
    #[error("a GitHub token must be provided when push is requested")]
    MissingToken,

    /// An error occurred while executing a Git command.
    #[error("Git command failed in {repo}: {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// An error occurred with a cache operation.
    #[error("Cache operation error: {message}")]
    Cache { message: String },

    /// An error occurred during a network operation.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// The run was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Attach the API id and stage to an error raised during an update.
    pub fn at_stage(self, api: &str, stage: Stage) -> Self {
        Error::Stage {
            api: api.to_string(),
            stage,
            source: Box::new(self),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
