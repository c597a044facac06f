//! Per-API generation used by the update engine.

use std::path::{Path, PathBuf};

use log::info;

use crate::backends::BackendRegistry;
use crate::config::{self, WorkspaceConfig, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use crate::phases::Phase;
use crate::resolve::{find_library_for_api, resolve, ResolvedLibrary};
use crate::sources::SourceBundle;

/// Generates, cleans and builds a single API of a language repository.
pub trait ApiGenerator {
    /// Generate `api_id` from the corpus at `api_root` into `output`, laid
    /// out the same way as the language repository.
    fn generate(&self, api_root: &Path, api_id: &str, output: &Path) -> Result<()>;

    /// Remove the stale generated files of `api_id` from the repository,
    /// leaving the output of every other API alone.
    fn clean(&self, repo_root: &Path, api_id: &str) -> Result<()>;

    /// Build the library holding `api_id` inside the repository.
    fn build(&self, repo_root: &Path, api_id: &str) -> Result<()>;
}

/// Drives the language backends configured by the repository's own
/// `clientgen.yaml`.
pub struct WorkspaceApiGenerator {
    config: WorkspaceConfig,
    registry: BackendRegistry,
}

impl WorkspaceApiGenerator {
    pub fn new(config: WorkspaceConfig, registry: BackendRegistry) -> Self {
        Self { config, registry }
    }

    /// Load the workspace configuration of the repository at `repo_root`.
    pub fn for_repo(repo_root: &Path) -> Result<Self> {
        let config = config::from_file(&repo_root.join(CONFIG_FILE_NAME))?;
        let registry = BackendRegistry::for_workspace(&config, repo_root);
        Ok(Self::new(config, registry))
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// The resolved library generating `api_id`, restricted to that API.
    pub fn library_for(&self, api_id: &str) -> Result<ResolvedLibrary> {
        Ok(self.owning_library(api_id)?.with_only_api(api_id))
    }

    /// The resolved library generating `api_id`, with all of its APIs.
    fn owning_library(&self, api_id: &str) -> Result<ResolvedLibrary> {
        let library =
            find_library_for_api(&self.config, api_id).ok_or_else(|| Error::ApiNotConfigured {
                api: api_id.to_string(),
            })?;
        resolve(&self.config.language, library, self.config.default.as_ref())
    }

    fn language(&self) -> &str {
        &self.config.language
    }
}

impl ApiGenerator for WorkspaceApiGenerator {
    fn generate(&self, api_root: &Path, api_id: &str, output: &Path) -> Result<()> {
        let library = self.library_for(api_id)?.relocate(output);
        info!("Generating {} ({}) into {}", api_id, library.name, output.display());
        let sources = SourceBundle::with_googleapis(PathBuf::from(api_root));
        self.registry
            .get(self.language(), Phase::Generate.capability())?
            .generate(std::slice::from_ref(&library), &sources)?;
        self.registry
            .get(self.language(), Phase::Format.capability())?
            .format(&library)
    }

    fn clean(&self, repo_root: &Path, api_id: &str) -> Result<()> {
        let library = self.owning_library(api_id)?.relocate(repo_root);
        self.registry
            .get(self.language(), Phase::Clean.capability())?
            .clean_api(&library, api_id)
    }

    fn build(&self, repo_root: &Path, api_id: &str) -> Result<()> {
        let library = self.library_for(api_id)?.relocate(repo_root);
        info!("Building {} in {}", library.name, repo_root.display());
        self.registry
            .get(self.language(), "building")?
            .build(repo_root, &library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Api, Library};
    use crate::language;
    use std::fs;
    use tempfile::TempDir;

    fn workspace(root: &Path) -> WorkspaceApiGenerator {
        let config = WorkspaceConfig {
            language: language::FAKE.to_string(),
            libraries: vec![
                Library {
                    name: "secretmanager".to_string(),
                    apis: vec![Api::new("google/cloud/secretmanager/v1")],
                    output: "packages/secretmanager".to_string(),
                    ..Default::default()
                },
                Library {
                    name: "google-cloud-kms".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let registry = BackendRegistry::for_workspace(&config, root);
        WorkspaceApiGenerator::new(config, registry)
    }

    #[test]
    fn test_library_for_declared_and_derived_api() {
        let temp = TempDir::new().unwrap();
        let generator = workspace(temp.path());
        let library = generator
            .library_for("google/cloud/secretmanager/v1")
            .unwrap();
        assert_eq!(library.name, "secretmanager");
        assert_eq!(library.apis, vec![Api::new("google/cloud/secretmanager/v1")]);

        let derived = generator.library_for("google/cloud/kms").unwrap();
        assert_eq!(derived.name, "google-cloud-kms");
    }

    #[test]
    fn test_unconfigured_api() {
        let temp = TempDir::new().unwrap();
        let err = workspace(temp.path())
            .library_for("google/cloud/none/v1")
            .unwrap_err();
        assert!(matches!(err, Error::ApiNotConfigured { ref api } if api == "google/cloud/none/v1"));
    }

    #[test]
    fn test_generate_uses_repository_layout() {
        let temp = TempDir::new().unwrap();
        let generator = workspace(temp.path());
        let output = temp.path().join("output/google/cloud/secretmanager/v1");
        generator
            .generate(temp.path(), "google/cloud/secretmanager/v1", &output)
            .unwrap();
        let readme =
            fs::read_to_string(output.join("packages/secretmanager/README.md")).unwrap();
        assert!(readme.starts_with("# secretmanager\n\nGenerated library\n"));
        assert!(readme.ends_with("\n---\nFormatted\n"));
    }

    #[test]
    fn test_clean_is_scoped_to_one_api_of_a_library() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let config = WorkspaceConfig {
            language: language::PYTHON.to_string(),
            libraries: vec![Library {
                name: "google-cloud-language".to_string(),
                output: "packages/google-cloud-language".to_string(),
                apis: vec![
                    Api::new("google/cloud/language/v1"),
                    Api::new("google/cloud/language/v2"),
                ],
                ..Default::default()
            }],
            ..Default::default()
        };
        let registry = BackendRegistry::for_workspace(&config, root);
        let generator = WorkspaceApiGenerator::new(config, registry);

        let package = root.join("packages/google-cloud-language");
        for file in [
            "google/cloud/language_v1/client.py",
            "google/cloud/language_v2/client.py",
        ] {
            let path = package.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        generator.clean(root, "google/cloud/language/v2").unwrap();

        assert!(package.join("google/cloud/language_v1/client.py").exists());
        assert!(!package.join("google/cloud/language_v2/client.py").exists());
    }

    #[test]
    fn test_for_repo_reads_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "language: fake\nlibraries:\n  - name: secretmanager\n",
        )
        .unwrap();
        let generator = WorkspaceApiGenerator::for_repo(temp.path()).unwrap();
        assert_eq!(generator.config().libraries.len(), 1);
    }
}
