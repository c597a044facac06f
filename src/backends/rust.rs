//! Rust backend: drives the `sidekick` generator and `cargo`.

use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;

use super::process;
use super::{clean_dirs, Backend, Tools};
use crate::clean::check_and_clean;
use crate::config::{RustCrate, RustModule};
use crate::error::Result;
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

pub struct RustBackend {
    tools: Tools,
    root: PathBuf,
}

impl RustBackend {
    pub fn new(tools: Tools, root: PathBuf) -> Self {
        Self { tools, root }
    }

    fn generate_library(&self, library: &ResolvedLibrary, sources: &SourceBundle) -> Result<()> {
        let default_crate = RustCrate::default();
        let krate = library.rust.as_ref().unwrap_or(&default_crate);
        if library.veneer {
            for module in &krate.modules {
                let args = module_args(library, module, sources);
                process::run(&self.tools.path("sidekick"), &args, &self.root)?;
            }
        } else {
            for api in &library.apis {
                let args = crate_args(library, krate, &api.path, sources);
                process::run(&self.tools.path("sidekick"), &args, &self.root)?;
            }
        }
        info!("Generated {}", library.name);
        Ok(())
    }
}

fn source_args(library: &ResolvedLibrary, sources: &SourceBundle) -> Vec<String> {
    let format = if library.specification_format.is_empty() {
        "protobuf"
    } else {
        library.specification_format.as_str()
    };
    let mut args = vec![
        "generate".to_string(),
        "--language".to_string(),
        "rust".to_string(),
        "--specification-format".to_string(),
        format.to_string(),
        "--source-option".to_string(),
        format!("googleapis-root={}", sources.googleapis.display()),
    ];
    for (key, path) in [
        ("discovery-root", &sources.discovery),
        ("showcase-root", &sources.showcase),
        ("protobuf-src-root", &sources.protobuf),
        ("conformance-root", &sources.conformance),
    ] {
        if let Some(path) = path {
            args.push("--source-option".to_string());
            args.push(format!("{}={}", key, path.display()));
        }
    }
    for root in &library.roots {
        args.push("--source-option".to_string());
        args.push(format!("roots={}", root));
    }
    args
}

fn codec_option(args: &mut Vec<String>, key: &str, value: &str) {
    if !value.is_empty() {
        args.push("--codec-option".to_string());
        args.push(format!("{}={}", key, value));
    }
}

/// Arguments generating one API of a regular crate.
pub fn crate_args(
    library: &ResolvedLibrary,
    krate: &RustCrate,
    api_path: &str,
    sources: &SourceBundle,
) -> Vec<String> {
    let mut args = source_args(library, sources);
    args.extend([
        "--specification-source".to_string(),
        api_path.to_string(),
        "--output".to_string(),
        library.output.clone(),
    ]);
    codec_option(&mut args, "package-name-override", &krate.package_name_override);
    codec_option(&mut args, "version", &library.version);
    codec_option(&mut args, "copyright-year", &library.copyright_year);
    codec_option(&mut args, "release-level", &library.release_level);
    codec_option(&mut args, "template-override", &krate.template_override);
    codec_option(
        &mut args,
        "generate-setter-samples",
        &krate.defaults.generate_setter_samples,
    );
    codec_option(
        &mut args,
        "generate-rpc-samples",
        &krate.defaults.generate_rpc_samples,
    );
    if krate.per_service_features {
        codec_option(&mut args, "per-service-features", "true");
    }
    codec_option(
        &mut args,
        "disabled-rustdoc-warnings",
        &krate.defaults.disabled_rustdoc_warnings.join(","),
    );
    codec_option(&mut args, "default-features", &krate.default_features.join(","));
    for dep in krate.defaults.package_dependencies.iter().filter(|d| !d.ignore) {
        let mut spec = format!("package={}", dep.package);
        for (key, value) in [
            ("source", &dep.source),
            ("feature", &dep.feature),
            ("used-if", &dep.used_if),
        ] {
            if !value.is_empty() {
                spec.push_str(&format!(",{}={}", key, value));
            }
        }
        if dep.force_used {
            spec.push_str(",force-used=true");
        }
        codec_option(&mut args, &format!("package:{}", dep.name), &spec);
    }
    args
}

/// Arguments generating one module of a veneer.
pub fn module_args(library: &ResolvedLibrary, module: &RustModule, sources: &SourceBundle) -> Vec<String> {
    let mut args = source_args(library, sources);
    args.extend([
        "--specification-source".to_string(),
        module.api_path.clone(),
        "--output".to_string(),
        module.output.clone(),
    ]);
    codec_option(&mut args, "template-override", &module.template);
    codec_option(&mut args, "generate-setter-samples", &module.generate_setter_samples);
    codec_option(&mut args, "generate-rpc-samples", &module.generate_rpc_samples);
    args
}

impl Backend for RustBackend {
    fn clean(&self, library: &ResolvedLibrary) -> Result<()> {
        if library.veneer {
            // Veneer crates are hand-written; only module outputs are generated.
            if let Some(krate) = &library.rust {
                for module in &krate.modules {
                    check_and_clean(Path::new(&module.output), &[])?;
                }
            }
            return Ok(());
        }
        let output = Path::new(&library.output);
        let mut keep = library.keep.clone();
        if output.join("Cargo.toml").exists() && !keep.iter().any(|k| k == "Cargo.toml") {
            keep.push("Cargo.toml".to_string());
        }
        check_and_clean(output, &keep)
    }

    fn clean_api(&self, library: &ResolvedLibrary, api_path: &str) -> Result<()> {
        if library.veneer {
            if let Some(krate) = &library.rust {
                for module in krate.modules.iter().filter(|m| m.api_path == api_path) {
                    check_and_clean(Path::new(&module.output), &[])?;
                }
            }
            return Ok(());
        }
        if library.apis.len() <= 1 {
            return self.clean(library);
        }
        clean_dirs(library, &self.api_dirs(library, api_path))
    }

    fn generate(&self, libraries: &[ResolvedLibrary], sources: &SourceBundle) -> Result<()> {
        libraries
            .par_iter()
            .try_for_each(|library| self.generate_library(library, sources))
    }

    fn format(&self, library: &ResolvedLibrary) -> Result<()> {
        let manifest = Path::new(&library.output).join("Cargo.toml");
        if !manifest.exists() {
            debug!("Skipping format for {}, no Cargo.toml", library.name);
            return Ok(());
        }
        let manifest = manifest.to_string_lossy();
        process::run(
            &self.tools.path("cargo"),
            ["fmt", "--manifest-path", &*manifest],
            &self.root,
        )?;
        Ok(())
    }

    fn post_generate(&self) -> Result<()> {
        process::run(
            &self.tools.path("cargo"),
            ["update", "--workspace"],
            &self.root,
        )?;
        Ok(())
    }

    fn build(&self, repo_root: &Path, library: &ResolvedLibrary) -> Result<()> {
        let manifest = Path::new(&library.output).join("Cargo.toml");
        let manifest = manifest.to_string_lossy();
        process::run(
            &self.tools.path("cargo"),
            ["build", "--manifest-path", &*manifest],
            repo_root,
        )?;
        Ok(())
    }
}
