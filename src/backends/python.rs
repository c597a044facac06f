//! Python backend: runs `protoc` with the GAPIC Python plugin.

use std::path::{Path, PathBuf};

use log::{info, warn};

use super::process;
use super::protoc::{api_protos, extract_version};
use super::{Backend, Tools};
use crate::config::PythonPackage;
use crate::error::Result;
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

const GAPIC_PLUGIN: &str = "protoc-gen-python_gapic";

pub struct PythonBackend {
    tools: Tools,
}

impl PythonBackend {
    pub fn new(tools: Tools) -> Self {
        Self { tools }
    }
}

/// Arguments to `protoc` for one API of a Python package.
pub fn protoc_args(
    tools: &Tools,
    library: &ResolvedLibrary,
    api_path: &str,
    googleapis: &Path,
    protos: &[PathBuf],
) -> Vec<String> {
    let default_package = PythonPackage::default();
    let package = library.python.as_ref().unwrap_or(&default_package);
    let output = &library.output;

    let mut args = vec![format!("--proto_path={}", googleapis.display())];
    if package.proto_only_apis.iter().any(|api| api == api_path) {
        args.push(format!("--python_out={}", output));
        args.push(format!("--pyi_out={}", output));
    } else {
        if let Some(plugin) = tools.get(GAPIC_PLUGIN) {
            args.push(format!("--plugin={}={}", GAPIC_PLUGIN, plugin));
        }
        args.push(format!("--python_gapic_out={}", output));
        let mut opts: Vec<String> = package.opt_args.clone();
        if let Some(by_api) = package.opt_args_by_api.get(api_path) {
            opts.extend(by_api.iter().cloned());
        }
        if !library.transport.is_empty() {
            opts.push(format!("transport={}", library.transport));
        }
        if !opts.is_empty() {
            args.push(format!("--python_gapic_opt={}", opts.join(",")));
        }
    }
    args.extend(protos.iter().map(|p| p.display().to_string()));
    args
}

/// Directories of a Python package holding the output of one API.
///
/// For `google/cloud/language/v2` these are the proto modules under the API
/// path itself plus the `google/cloud/language_v2` GAPIC package with its
/// unit tests and docs.
pub fn api_output_dirs(api_path: &str) -> Vec<String> {
    let mut dirs = vec![api_path.to_string()];
    let (parent, version) = match api_path.rsplit_once('/') {
        Some(split) => split,
        None => return dirs,
    };
    if extract_version(version) != Some(version) {
        return dirs;
    }
    let (prefix, name) = match parent.rsplit_once('/') {
        Some((prefix, name)) => (format!("{}/", prefix), name),
        None => (String::new(), parent),
    };
    let package = format!("{}_{}", name, version);
    dirs.push(format!("{}{}", prefix, package));
    dirs.push(format!("tests/unit/gapic/{}", package));
    dirs.push(format!("docs/{}", package));
    dirs
}

impl Backend for PythonBackend {
    fn api_dirs(&self, _library: &ResolvedLibrary, api_path: &str) -> Vec<String> {
        api_output_dirs(api_path)
    }

    fn generate(&self, libraries: &[ResolvedLibrary], sources: &SourceBundle) -> Result<()> {
        for library in libraries {
            std::fs::create_dir_all(&library.output)?;
            for api in &library.apis {
                let protos = api_protos(&sources.googleapis, &api.path)?;
                let args = protoc_args(&self.tools, library, &api.path, &sources.googleapis, &protos);
                process::run(&self.tools.path("protoc"), &args, &sources.googleapis)?;
            }
            if let Some(package) = &library.python {
                for common in &package.defaults.common_gapic_paths {
                    if !Path::new(&library.output).join(common).exists() {
                        warn!("{}: expected generated path {} is missing", library.name, common);
                    }
                }
            }
            info!("Generated {}", library.name);
        }
        Ok(())
    }
}
