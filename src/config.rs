//! # Workspace Configuration Schema and Parsing
//!
//! This module defines the data structures that represent the `clientgen.yaml`
//! workspace configuration file and the logic for loading it.
//!
//! ## Key Components
//!
//! - **`WorkspaceConfig`**: The whole file. It names the target language,
//!   the external corpora to generate from, release parameters, workspace
//!   defaults, and the ordered list of libraries.
//!
//! - **`Defaults`**: Settings applied to every library unless the library
//!   overrides them, including one optional default sub-record per language.
//!
//! - **`Library`**: A single client library. Libraries are resolved against
//!   the defaults by [`crate::resolve`] before any generation happens.
//!
//! - **Language sub-configurations**: `RustCrate`, `DartPackage`,
//!   `PythonPackage` and `JavaPackage` (and their default counterparts) hold
//!   the settings only one backend understands.
//!
//! The configuration is loaded once per invocation and treated as immutable;
//! resolution works on clones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// File name of the workspace configuration, relative to the workspace root.
pub const CONFIG_FILE_NAME: &str = "clientgen.yaml";

/// A `clientgen.yaml` workspace configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Target language of this workspace, e.g. `rust` or `java`.
    pub language: String,

    /// Version of the tool the workspace was last generated with.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Repository name, such as `googleapis/google-cloud-rust`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo: String,

    /// External source repositories used for generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Sources>,

    /// Release and tooling parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<Release>,

    /// Settings applied to every library unless overridden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Defaults>,

    /// Libraries in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<Library>,
}

/// External source repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sources {
    /// The API definition corpus. Required for generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub googleapis: Option<Source>,

    /// Discovery documents corpus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<Source>,

    /// Showcase API corpus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub showcase: Option<Source>,

    /// Protocol buffer sources, used as an include root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protobuf: Option<Source>,

    /// Conformance tests corpus, used as an include root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conformance: Option<Source>,
}

/// A pinned or local source repository.
///
/// If `dir` is set, `commit` and `sha256` are ignored entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Branch to pull updates from. Unset means the default branch.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    /// Commit hash or tag to fetch.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub commit: String,

    /// Local directory to use instead of fetching.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,

    /// Expected SHA-256 of the archive for `commit`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sha256: String,

    /// Directory inside the fetched archive treated as the root.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subpath: String,
}

/// Release and tooling parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Release branch, typically `main`. Review requests target it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    /// Globs ignored in change analysis.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_changes: Vec<String>,

    /// Tools that must be preinstalled, indexed by well-known name.
    ///
    /// ```yaml
    /// preinstalled:
    ///   cargo: /usr/bin/cargo
    /// ```
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preinstalled: BTreeMap<String, String>,

    /// Name of the source-of-truth remote, typically `upstream`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote: String,

    /// Tools to install, indexed by installer.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, Vec<Tool>>,
}

/// A helper tool to install.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name, e.g. `nox`.
    pub name: String,
    /// Tool version, e.g. `1.2.4`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Settings applied to all libraries unless overridden.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Files and directories preserved during regeneration. Appended to every
    /// library's own keep list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keep: Vec<String>,

    /// Root directory for generated code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    /// Either `stable` or `preview`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_level: String,

    /// Template for git tags, such as `{name}/v{version}`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag_format: String,

    /// Transport protocol, such as `grpc+rest` or `grpc`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transport: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dart: Option<DartPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<JavaDefault>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rust: Option<RustDefault>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<PythonDefault>,
}

/// A client library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    /// Library name, unique within the workspace, e.g. `secretmanager`.
    pub name: String,

    /// Declared library version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// APIs generated into this library.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub apis: Vec<Api>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub copyright_year: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description_override: String,

    /// Files and directories preserved during regeneration, relative to
    /// `output`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keep: Vec<String>,

    /// Directory the library is generated into.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_level: String,

    /// Names of the source roots used for generation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_generate: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_release: bool,

    /// `protobuf` (default) or `discovery`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub specification_format: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transport: String,

    /// The library is a hand-written wrapper that may embed generated code.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub veneer: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dart: Option<DartPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub java: Option<JavaPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub python: Option<PythonPackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rust: Option<RustCrate>,
}

impl Library {
    /// Whether any API of this library has the given corpus path.
    pub fn generates_api(&self, api_path: &str) -> bool {
        self.apis.iter().any(|api| api.path == api_path)
    }
}

/// An API included in a library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Api {
    /// Corpus path of the API, e.g. `google/cloud/secretmanager/v1`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
}

impl Api {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

/// Rust defaults inherited by every crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RustDefault {
    /// Default package dependencies. A crate's own entries win on name
    /// collision.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_dependencies: Vec<RustPackageDependency>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_rustdoc_warnings: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_setter_samples: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_rpc_samples: String,
}

/// Rust crate configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RustCrate {
    #[serde(flatten)]
    pub defaults: RustDefault,

    /// Generation targets inside a veneer crate.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<RustModule>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub per_service_features: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_override: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_name_override: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_features: Vec<String>,
}

/// A generation target within a veneer crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RustModule {
    /// Corpus path to generate from, e.g. `google/storage/v2`.
    pub api_path: String,

    /// Output directory, e.g. `src/storage/src/generated/gapic`.
    pub output: String,

    /// Generator template, e.g. `grpc-client` or `prost`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_setter_samples: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generate_rpc_samples: String,
}

/// A Rust package dependency mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RustPackageDependency {
    pub name: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,

    pub package: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub feature: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub force_used: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub used_if: String,
}

/// Dart package configuration. The same record is used for defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DartPackage {
    /// Comma-separated environment variables that may hold API keys.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_keys_environment_variables: String,

    /// Comma-separated dependencies.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dependencies: String,

    /// Comma-separated development dependencies.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dev_dependencies: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub issue_tracker_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name_override: String,

    /// Package name to version constraint, e.g.
    /// `package:googleapis_auth: ^2.0.0`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub packages: BTreeMap<String, String>,

    /// Protobuf package to Dart import prefix.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prefixes: BTreeMap<String, String>,

    /// Protobuf package to Dart import path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub protos: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repository_url: String,

    /// Package version. On the default record this is inherited by libraries
    /// without a version.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

/// Python defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PythonDefault {
    /// Paths generated for every package with a GAPIC API, relative to the
    /// package output. Library entries are appended to the defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub common_gapic_paths: Vec<String>,
}

/// Python package configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PythonPackage {
    #[serde(flatten)]
    pub defaults: PythonDefault,

    /// Generator options common to all APIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opt_args: Vec<String>,

    /// Generator options keyed by API path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub opt_args_by_api: BTreeMap<String, Vec<String>>,

    /// APIs generated with plain protoc instead of GAPIC.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proto_only_apis: Vec<String>,
}

/// Java defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JavaDefault {
    /// Path to the google-java-format jar.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub formatter_jar: String,

    /// Path to the GAPIC generator jar.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub generator_jar: String,

    /// Path to the `protoc-gen-java_grpc` plugin.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub grpc_plugin: String,
}

/// Java library configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JavaPackage {
    #[serde(flatten)]
    pub defaults: JavaDefault,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skip_format: bool,
}

/// Parse a workspace configuration from a YAML string.
pub fn parse(yaml: &str) -> Result<WorkspaceConfig> {
    let config: WorkspaceConfig = serde_yaml::from_str(yaml).map_err(|e| {
        let message = e.to_string();
        let hint = if message.contains("missing field `language`") {
            Some("Add 'language: <rust|dart|python|java|fake>' at the top level".to_string())
        } else if message.contains("missing field `name`") {
            Some("Every entry under 'libraries:' needs a 'name:'".to_string())
        } else {
            None
        };
        Error::ConfigParse { message, hint }
    })?;
    validate(&config)?;
    Ok(config)
}

/// Load a workspace configuration from a file.
pub fn from_file(path: &Path) -> Result<WorkspaceConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

fn validate(config: &WorkspaceConfig) -> Result<()> {
    if config.language.trim().is_empty() {
        return Err(Error::ConfigParse {
            message: "language must not be empty".to_string(),
            hint: None,
        });
    }
    let mut seen = std::collections::HashSet::new();
    for library in &config.libraries {
        if library.name.is_empty() {
            return Err(Error::ConfigParse {
                message: "library name must not be empty".to_string(),
                hint: None,
            });
        }
        if !seen.insert(library.name.as_str()) {
            return Err(Error::ConfigParse {
                message: format!("duplicate library name {:?}", library.name),
                hint: Some("Library names must be unique within a workspace".to_string()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
language: rust
version: v0.3.0
repo: googleapis/google-cloud-rust
sources:
  googleapis:
    commit: 9fcfbea0aa5b50fa22e190faceb073d74504172b
    sha256: 81e6057ffd85154af5268c2c3c8f2408745ca0f7fa03d43c68f4847f31eb5f98
  discovery:
    dir: /tmp/discovery
release:
  branch: main
  preinstalled:
    cargo: /usr/local/bin/cargo
default:
  output: src/generated
  release_level: stable
  keep:
    - CHANGELOG.md
  rust:
    package_dependencies:
      - name: wkt
        package: google-cloud-wkt
        source: google.protobuf
    disabled_rustdoc_warnings:
      - redundant_explicit_links
libraries:
  - name: google-cloud-secretmanager-v1
    version: 1.2.0
    apis:
      - path: google/cloud/secretmanager/v1
    rust:
      per_service_features: true
      package_dependencies:
        - name: iam
          package: google-cloud-iam-v1
  - name: google-cloud-storage
    veneer: true
    output: src/storage
    skip_release: true
    rust:
      modules:
        - api_path: google/storage/v2
          output: src/storage/src/generated/gapic
          template: grpc-client
"#;

    #[test]
    fn test_parse_full_config() {
        let config = parse(FULL).unwrap();
        assert_eq!(config.language, "rust");
        assert_eq!(config.repo, "googleapis/google-cloud-rust");

        let sources = config.sources.as_ref().unwrap();
        let googleapis = sources.googleapis.as_ref().unwrap();
        assert_eq!(googleapis.commit, "9fcfbea0aa5b50fa22e190faceb073d74504172b");
        assert_eq!(sources.discovery.as_ref().unwrap().dir, "/tmp/discovery");
        assert!(sources.showcase.is_none());

        let release = config.release.as_ref().unwrap();
        assert_eq!(release.preinstalled["cargo"], "/usr/local/bin/cargo");

        let defaults = config.default.as_ref().unwrap();
        assert_eq!(defaults.keep, vec!["CHANGELOG.md"]);
        let rust = defaults.rust.as_ref().unwrap();
        assert_eq!(rust.package_dependencies[0].package, "google-cloud-wkt");

        assert_eq!(config.libraries.len(), 2);
        let secretmanager = &config.libraries[0];
        assert!(secretmanager.generates_api("google/cloud/secretmanager/v1"));
        let crate_config = secretmanager.rust.as_ref().unwrap();
        assert!(crate_config.per_service_features);
        // Flattened defaults are read from the same mapping.
        assert_eq!(crate_config.defaults.package_dependencies[0].name, "iam");

        let storage = &config.libraries[1];
        assert!(storage.veneer);
        assert!(storage.skip_release);
        assert_eq!(
            storage.rust.as_ref().unwrap().modules[0].template,
            "grpc-client"
        );
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("language: fake\n").unwrap();
        assert_eq!(config.language, "fake");
        assert!(config.sources.is_none());
        assert!(config.default.is_none());
        assert!(config.libraries.is_empty());
    }

    #[test]
    fn test_parse_missing_language_has_hint() {
        let err = parse("libraries: []\n").unwrap_err();
        let display = err.to_string();
        assert!(display.contains("language"), "got: {}", display);
        assert!(display.contains("hint:"), "got: {}", display);
    }

    #[test]
    fn test_parse_rejects_duplicate_library_names() {
        let yaml = r#"
language: fake
libraries:
  - name: secretmanager
  - name: secretmanager
"#;
        let err = parse(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate library name"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        assert!(matches!(
            parse("language: [unclosed").unwrap_err(),
            Error::ConfigParse { .. }
        ));
    }

    #[test]
    fn test_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, FULL).unwrap();

        assert_eq!(from_file(&path).unwrap(), parse(FULL).unwrap());
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file(Path::new("/nonexistent/clientgen.yaml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
