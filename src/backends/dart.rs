//! Dart backend: drives the `sidekick` generator and the `dart` tool.

use std::path::Path;

use log::info;

use super::process;
use super::{Backend, Tools};
use crate::config::DartPackage;
use crate::error::Result;
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

pub struct DartBackend {
    tools: Tools,
}

impl DartBackend {
    pub fn new(tools: Tools) -> Self {
        Self { tools }
    }
}

/// Arguments generating one API of a Dart package.
pub fn generate_args(library: &ResolvedLibrary, api_path: &str, sources: &SourceBundle) -> Vec<String> {
    let mut args = vec![
        "generate".to_string(),
        "--language".to_string(),
        "dart".to_string(),
        "--specification-source".to_string(),
        api_path.to_string(),
        "--output".to_string(),
        library.output.clone(),
        "--source-option".to_string(),
        format!("googleapis-root={}", sources.googleapis.display()),
    ];
    if let Some(protobuf) = &sources.protobuf {
        args.push("--source-option".to_string());
        args.push(format!("protobuf-src-root={}", protobuf.display()));
    }

    let default_package = DartPackage::default();
    let package = library.dart.as_ref().unwrap_or(&default_package);
    let mut option = |key: &str, value: &str| {
        if !value.is_empty() {
            args.push("--codec-option".to_string());
            args.push(format!("{}={}", key, value));
        }
    };
    option("version", &library.version);
    option("copyright-year", &library.copyright_year);
    option("name-override", &package.name_override);
    option("api-keys-environment-variables", &package.api_keys_environment_variables);
    option("issue-tracker-url", &package.issue_tracker_url);
    option("repository-url", &package.repository_url);
    option("dependencies", &package.dependencies);
    option("dev-dependencies", &package.dev_dependencies);
    for (name, constraint) in &package.packages {
        option(name, constraint);
    }
    for (proto, prefix) in &package.prefixes {
        option(&format!("prefix:{}", proto), prefix);
    }
    for (proto, import) in &package.protos {
        option(&format!("proto:{}", proto), import);
    }
    args
}

impl Backend for DartBackend {
    fn generate(&self, libraries: &[ResolvedLibrary], sources: &SourceBundle) -> Result<()> {
        for library in libraries {
            for api in &library.apis {
                let args = generate_args(library, &api.path, sources);
                process::run(&self.tools.path("sidekick"), &args, &sources.googleapis)?;
            }
            info!("Generated {}", library.name);
        }
        Ok(())
    }

    fn format(&self, library: &ResolvedLibrary) -> Result<()> {
        process::run(
            &self.tools.path("dart"),
            ["format", "."],
            Path::new(&library.output),
        )?;
        Ok(())
    }

    fn build(&self, _repo_root: &Path, library: &ResolvedLibrary) -> Result<()> {
        process::run(
            &self.tools.path("dart"),
            ["analyze"],
            Path::new(&library.output),
        )?;
        Ok(())
    }
}
