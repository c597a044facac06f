//! Shared test utilities for the CLI end-to-end tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_config(configs::SECRETMANAGER);
//! fixture.command().args(["generate", "secretmanager"]).assert().success();
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Workspace configurations for the `fake` language, whose backend writes
/// placeholder files instead of invoking generators.
#[allow(dead_code)]
pub mod configs {
    /// One library with a declared API, reading a local corpus.
    pub const SECRETMANAGER: &str = r#"
language: fake
sources:
  googleapis:
    dir: googleapis
libraries:
  - name: secretmanager
    apis:
      - path: google/cloud/secretmanager/v1
"#;

    /// Same as [`SECRETMANAGER`] with generation disabled.
    pub const SECRETMANAGER_SKIPPED: &str = r#"
language: fake
sources:
  googleapis:
    dir: googleapis
libraries:
  - name: secretmanager
    skip_generate: true
    apis:
      - path: google/cloud/secretmanager/v1
"#;

    /// Two libraries, one excluded from generation.
    pub const TWO_LIBRARIES: &str = r#"
language: fake
sources:
  googleapis:
    dir: googleapis
libraries:
  - name: secretmanager
    apis:
      - path: google/cloud/secretmanager/v1
  - name: kms
    skip_generate: true
"#;

    /// A veneer without an output path, which cannot be resolved.
    pub const VENEER_WITHOUT_OUTPUT: &str = r#"
language: fake
libraries:
  - name: storage
    veneer: true
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "language: [unclosed";
}

/// A temporary workspace holding a `clientgen.yaml` and an empty local
/// API corpus under `googleapis/`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("googleapis/google/cloud/secretmanager/v1/service.proto")
            .write_str("syntax = \"proto3\";\n")
            .expect("Failed to write corpus");
        Self { temp_dir }
    }

    /// Add a `clientgen.yaml` configuration file with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("clientgen.yaml", content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("clientgen.yaml")
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// A command running in this fixture's directory with a private cache.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("clientgen");
        cmd.current_dir(self.path())
            .env("CLIENTGEN_CACHE", self.path().join(".cache"))
            .env_remove("CLIENTGEN_CONFIG")
            .env_remove("GITHUB_TOKEN")
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
