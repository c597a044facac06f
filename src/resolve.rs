//! # Configuration Resolution
//!
//! Turns a declared [`Library`] into a [`ResolvedLibrary`] by applying the
//! workspace [`Defaults`] and the per-language naming conventions from
//! [`crate::language`].
//!
//! Resolution never mutates the loaded configuration. It works on a clone and
//! every merge below is a pure function of `(defaults, library)`:
//!
//! | Field                            | Rule                                   |
//! |----------------------------------|----------------------------------------|
//! | `keep`                           | library entries, then default entries  |
//! | `output`, `release_level`, `transport` | library value, else default      |
//! | Rust `package_dependencies`      | library wins by `name`, defaults after |
//! | Rust sample flags                | inherited when empty, then pushed down to modules |
//! | Dart `packages`/`prefixes`/`protos` | key union, library wins             |
//! | Dart `dependencies`              | comma-list dedupe union, library first |
//! | Python `common_gapic_paths`      | defaults, then library entries         |
//! | Java jar and plugin paths        | library value, else default            |

use std::collections::{BTreeMap, HashSet};
use std::ops::Deref;
use std::path::Path;

use crate::config::{
    Api, DartPackage, Defaults, JavaDefault, JavaPackage, Library, PythonDefault, PythonPackage,
    RustCrate, RustDefault, RustPackageDependency, WorkspaceConfig,
};
use crate::error::{Error, Result};
use crate::language;
use crate::path::resolve_under;

/// A library with all defaults applied and derived fields filled in.
///
/// Backends only accept this type, so they never see a half-configured
/// library.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLibrary(Library);

impl ResolvedLibrary {
    /// Return a copy whose output paths are rooted at `root`.
    ///
    /// Relative outputs are joined onto `root`; absolute outputs are kept.
    /// Rust module outputs are relocated the same way.
    pub fn relocate(&self, root: &Path) -> ResolvedLibrary {
        let mut library = self.0.clone();
        library.output = join_root(root, &library.output);
        if let Some(rust) = library.rust.as_mut() {
            for module in &mut rust.modules {
                module.output = join_root(root, &module.output);
            }
        }
        ResolvedLibrary(library)
    }

    /// Return a copy generating only the given API path.
    pub fn with_only_api(&self, api_path: &str) -> ResolvedLibrary {
        let mut library = self.0.clone();
        library.apis = vec![Api::new(api_path)];
        ResolvedLibrary(library)
    }
}

impl Deref for ResolvedLibrary {
    type Target = Library;

    fn deref(&self) -> &Library {
        &self.0
    }
}

fn join_root(root: &Path, path: &str) -> String {
    resolve_under(root, path).to_string_lossy().into_owned()
}

/// Resolve `library` against the workspace `defaults` for `language`.
pub fn resolve(
    language: &str,
    library: &Library,
    defaults: Option<&Defaults>,
) -> Result<ResolvedLibrary> {
    let mut lib = library.clone();

    if lib.apis.is_empty() {
        lib.apis.push(Api::default());
    }
    if !lib.veneer {
        for api in lib.apis.iter_mut().filter(|api| api.path.is_empty()) {
            api.path = language::derive_api_path(language, &lib.name);
        }
    }
    if lib.output.is_empty() {
        if lib.veneer {
            return Err(Error::VeneerOutput { name: lib.name });
        }
        let default_output = defaults.map(|d| d.output.as_str()).unwrap_or_default();
        lib.output =
            language::default_output(language, &lib.name, &lib.apis[0].path, default_output);
    }

    if let Some(defaults) = defaults {
        apply_defaults(&mut lib, defaults);
    }

    if lib.veneer && lib.output.is_empty() {
        return Err(Error::VeneerOutput { name: lib.name });
    }
    Ok(ResolvedLibrary(lib))
}

/// Resolve every library in the workspace, in declaration order.
pub fn resolve_all(config: &WorkspaceConfig) -> Result<Vec<ResolvedLibrary>> {
    config
        .libraries
        .iter()
        .map(|library| resolve(&config.language, library, config.default.as_ref()))
        .collect()
}

/// Find a library by name.
pub fn find_library<'a>(config: &'a WorkspaceConfig, name: &str) -> Result<&'a Library> {
    config
        .libraries
        .iter()
        .find(|library| library.name == name)
        .ok_or_else(|| Error::LibraryNotFound {
            name: name.to_string(),
        })
}

/// Find the library that generates the given API path.
pub fn find_library_for_api<'a>(config: &'a WorkspaceConfig, api_path: &str) -> Option<&'a Library> {
    let by_declared_api = config
        .libraries
        .iter()
        .find(|library| library.generates_api(api_path));
    by_declared_api.or_else(|| {
        // Libraries without declared APIs generate the path derived from their name.
        config.libraries.iter().find(|library| {
            library.apis.is_empty()
                && !library.veneer
                && language::derive_api_path(&config.language, &library.name) == api_path
        })
    })
}

fn apply_defaults(lib: &mut Library, defaults: &Defaults) {
    lib.keep.extend(defaults.keep.iter().cloned());
    if lib.output.is_empty() {
        lib.output = defaults.output.clone();
    }
    if lib.release_level.is_empty() {
        lib.release_level = defaults.release_level.clone();
    }
    if lib.transport.is_empty() {
        lib.transport = defaults.transport.clone();
    }

    if let Some(rust) = &defaults.rust {
        let merged = merge_rust(rust, lib.rust.take().unwrap_or_default());
        lib.rust = Some(merged);
    } else if let Some(dart) = &defaults.dart {
        if lib.version.is_empty() {
            lib.version = dart.version.clone();
        }
        let merged = merge_dart(dart, lib.dart.take().unwrap_or_default());
        lib.dart = Some(merged);
    } else if let Some(python) = &defaults.python {
        let merged = merge_python(python, lib.python.take().unwrap_or_default());
        lib.python = Some(merged);
    } else if let Some(java) = &defaults.java {
        let merged = merge_java(java, lib.java.take().unwrap_or_default());
        lib.java = Some(merged);
    }
}

fn inherit(value: &mut String, default: &str) {
    if value.is_empty() {
        *value = default.to_string();
    }
}

/// Merge the Rust defaults into a crate configuration.
pub fn merge_rust(defaults: &RustDefault, mut krate: RustCrate) -> RustCrate {
    krate.defaults.package_dependencies = merge_package_dependencies(
        &defaults.package_dependencies,
        std::mem::take(&mut krate.defaults.package_dependencies),
    );
    if krate.defaults.disabled_rustdoc_warnings.is_empty() {
        krate.defaults.disabled_rustdoc_warnings = defaults.disabled_rustdoc_warnings.clone();
    }
    inherit(
        &mut krate.defaults.generate_setter_samples,
        &defaults.generate_setter_samples,
    );
    inherit(
        &mut krate.defaults.generate_rpc_samples,
        &defaults.generate_rpc_samples,
    );
    let setter = krate.defaults.generate_setter_samples.clone();
    let rpc = krate.defaults.generate_rpc_samples.clone();
    for module in &mut krate.modules {
        inherit(&mut module.generate_setter_samples, &setter);
        inherit(&mut module.generate_rpc_samples, &rpc);
    }
    krate
}

/// Library dependencies first; default dependencies whose name is not
/// already present are appended in their declared order.
pub fn merge_package_dependencies(
    defaults: &[RustPackageDependency],
    library: Vec<RustPackageDependency>,
) -> Vec<RustPackageDependency> {
    let seen: HashSet<String> = library.iter().map(|dep| dep.name.clone()).collect();
    let mut merged = library;
    merged.extend(
        defaults
            .iter()
            .filter(|dep| !seen.contains(&dep.name))
            .cloned(),
    );
    merged
}

/// Merge the Dart defaults into a package configuration.
pub fn merge_dart(defaults: &DartPackage, mut package: DartPackage) -> DartPackage {
    inherit(
        &mut package.api_keys_environment_variables,
        &defaults.api_keys_environment_variables,
    );
    inherit(&mut package.issue_tracker_url, &defaults.issue_tracker_url);
    inherit(&mut package.repository_url, &defaults.repository_url);
    package.packages = merge_maps(package.packages, &defaults.packages);
    package.prefixes = merge_maps(package.prefixes, &defaults.prefixes);
    package.protos = merge_maps(package.protos, &defaults.protos);
    package.dependencies = merge_dart_dependencies(&package.dependencies, &defaults.dependencies);
    package
}

/// Union of two maps where entries already in `library` are never
/// overwritten.
pub fn merge_maps(
    library: BTreeMap<String, String>,
    defaults: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = defaults.clone();
    merged.extend(library);
    merged
}

/// Merge two comma-separated dependency lists.
///
/// Elements are trimmed and empty elements dropped. Library elements keep
/// their order; default elements not already present follow.
pub fn merge_dart_dependencies(library: &str, defaults: &str) -> String {
    let mut seen = HashSet::new();
    let mut deps = Vec::new();
    for dep in library.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        seen.insert(dep);
        deps.push(dep);
    }
    for dep in defaults.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        if seen.insert(dep) {
            deps.push(dep);
        }
    }
    deps.join(",")
}

pub fn merge_python(defaults: &PythonDefault, mut package: PythonPackage) -> PythonPackage {
    let mut paths = defaults.common_gapic_paths.clone();
    paths.append(&mut package.defaults.common_gapic_paths);
    package.defaults.common_gapic_paths = paths;
    package
}

pub fn merge_java(defaults: &JavaDefault, mut package: JavaPackage) -> JavaPackage {
    inherit(&mut package.defaults.formatter_jar, &defaults.formatter_jar);
    inherit(&mut package.defaults.generator_jar, &defaults.generator_jar);
    inherit(&mut package.defaults.grpc_plugin, &defaults.grpc_plugin);
    package
}
