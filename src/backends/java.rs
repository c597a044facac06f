//! Java backend: runs `protoc` with the Java, gRPC and GAPIC plugins and
//! rearranges the output into Maven modules.
//!
//! For a library named `secretmanager` and API version `v1` the output
//! directory ends up with:
//!
//! ```text
//! google-cloud-secretmanager/src/{main,test}
//! proto-google-cloud-secretmanager-v1/src/main/{java,proto}
//! grpc-google-cloud-secretmanager-v1/src/main/java
//! samples/snippets/generated
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use tempfile::TempDir;

use super::process;
use super::protoc::{api_protos, extract_version, unzip};
use super::{Backend, Tools};
use crate::config::{JavaDefault, JavaPackage};
use crate::error::{Error, Result};
use crate::resolve::ResolvedLibrary;
use crate::sources::SourceBundle;

pub struct JavaBackend {
    tools: Tools,
    defaults: JavaDefault,
}

impl JavaBackend {
    pub fn new(tools: Tools, defaults: JavaDefault) -> Self {
        Self { tools, defaults }
    }

    fn generate_api(&self, library: &ResolvedLibrary, api_path: &str, googleapis: &Path) -> Result<()> {
        let output = PathBuf::from(&library.output);
        let version = extract_version(api_path).ok_or_else(|| Error::Config {
            message: format!("failed to extract version from api path {:?}", api_path),
        })?;
        let staging = output.join(version);
        let dirs = ProtocDirs {
            proto: staging.join("proto"),
            grpc: staging.join("grpc"),
            gapic: staging.join("gapic"),
        };
        for dir in [&dirs.proto, &dirs.grpc, &dirs.gapic] {
            fs::create_dir_all(dir)?;
        }

        let mut protos = api_protos(googleapis, api_path)?;
        let common = googleapis.join("google/cloud/common_resources.proto");
        if common.exists() {
            protos.push(common);
        }

        let wrappers = self.plugin_wrappers(library)?;
        let mut command = Command::new(self.tools.path("protoc"));
        command
            .arg("--experimental_allow_proto3_optional")
            .arg(format!("-I={}", googleapis.display()))
            .args(&protos)
            .args(protoc_options(&library.transport, &dirs))
            .current_dir(googleapis);
        if let Some(wrappers) = &wrappers {
            let path = std::env::var_os("PATH").unwrap_or_default();
            let mut paths = vec![wrappers.path().to_path_buf()];
            paths.extend(std::env::split_paths(&path));
            let joined = std::env::join_paths(paths).map_err(|e| Error::Tool {
                tool: "protoc".to_string(),
                message: e.to_string(),
            })?;
            command.env("PATH", joined);
        }
        process::run_command("protoc", &mut command)?;

        let srcjar = dirs.gapic.join("temp-codegen.srcjar");
        if srcjar.exists() {
            unzip(&srcjar, &dirs.gapic)?;
        }
        restructure(&output, &library.name, version, &dirs)?;
        copy_protos(googleapis, &protos, &module_dirs(&output, &library.name, version).proto_files)?;
        fs::remove_dir_all(&staging)?;
        Ok(())
    }

    /// Write wrapper scripts exposing the configured plugin jars to `protoc`.
    fn plugin_wrappers(&self, library: &ResolvedLibrary) -> Result<Option<TempDir>> {
        let default_package = JavaPackage::default();
        let package = library.java.as_ref().unwrap_or(&default_package);
        let generator_jar = first_non_empty(&package.defaults.generator_jar, &self.defaults.generator_jar);
        let grpc_plugin = first_non_empty(&package.defaults.grpc_plugin, &self.defaults.grpc_plugin);
        if generator_jar.is_empty() && grpc_plugin.is_empty() {
            return Ok(None);
        }

        let dir = tempfile::Builder::new()
            .prefix("clientgen-java-plugin-")
            .tempdir()?;
        if !generator_jar.is_empty() {
            write_script(
                &dir.path().join("protoc-gen-java_gapic"),
                &format!(
                    "#!/bin/bash\nset -e\nexec java -cp {:?} com.google.api.generator.Main \"$@\"\n",
                    absolute(generator_jar)?
                ),
            )?;
        }
        if !grpc_plugin.is_empty() {
            write_script(
                &dir.path().join("protoc-gen-java_grpc"),
                &format!("#!/bin/bash\nset -e\nexec {:?} \"$@\"\n", absolute(grpc_plugin)?),
            )?;
        }
        Ok(Some(dir))
    }

    fn formatter_jar<'a>(&'a self, package: &'a JavaPackage) -> &'a str {
        first_non_empty(&package.defaults.formatter_jar, &self.defaults.formatter_jar)
    }
}

fn first_non_empty<'a>(preferred: &'a str, fallback: &'a str) -> &'a str {
    if preferred.is_empty() {
        fallback
    } else {
        preferred
    }
}

fn absolute(path: &str) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

fn write_script(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Intermediate `protoc` output directories.
pub struct ProtocDirs {
    pub proto: PathBuf,
    pub grpc: PathBuf,
    pub gapic: PathBuf,
}

/// Options selecting the Java, gRPC and GAPIC outputs.
///
/// gRPC stubs are skipped for REST-only transports.
pub fn protoc_options(transport: &str, dirs: &ProtocDirs) -> Vec<String> {
    let transport = if transport.is_empty() {
        "grpc+rest"
    } else {
        transport
    };
    let mut args = vec![format!("--java_out={}", dirs.proto.display())];
    if transport != "rest" {
        args.push(format!("--java_grpc_out={}", dirs.grpc.display()));
    }
    let gapic_opts = ["metadata".to_string(), format!("transport={}", transport), "rest-numeric-enums".to_string()];
    args.push(format!("--java_gapic_out=metadata:{}", dirs.gapic.display()));
    args.push(format!("--java_gapic_opt={}", gapic_opts.join(",")));
    args
}

/// Final Maven module directories of one API version.
pub struct ModuleDirs {
    pub gapic_main: PathBuf,
    pub gapic_test: PathBuf,
    pub proto_java: PathBuf,
    pub proto_files: PathBuf,
    pub grpc_java: PathBuf,
    pub samples: PathBuf,
}

/// Maven artifact id of a library, e.g. `google-cloud-secretmanager`.
pub fn artifact_id(library_name: &str) -> String {
    if library_name.starts_with("google-cloud-") {
        library_name.to_string()
    } else {
        format!("google-cloud-{}", library_name)
    }
}

pub fn module_dirs(output: &Path, library_name: &str, version: &str) -> ModuleDirs {
    let artifact = artifact_id(library_name);
    let proto_module = output.join(format!("proto-{}-{}", artifact, version));
    ModuleDirs {
        gapic_main: output.join(&artifact).join("src/main"),
        gapic_test: output.join(&artifact).join("src/test"),
        proto_java: proto_module.join("src/main/java"),
        proto_files: proto_module.join("src/main/proto"),
        grpc_java: output
            .join(format!("grpc-{}-{}", artifact, version))
            .join("src/main/java"),
        samples: output.join("samples/snippets/generated"),
    }
}

fn restructure(output: &Path, library_name: &str, version: &str, dirs: &ProtocDirs) -> Result<()> {
    let modules = module_dirs(output, library_name, version);
    let moves = [
        (dirs.proto.clone(), &modules.proto_java),
        (dirs.grpc.clone(), &modules.grpc_java),
        (dirs.gapic.join("src/main"), &modules.gapic_main),
        (dirs.gapic.join("src/test"), &modules.gapic_test),
        (
            dirs.gapic.join("samples/snippets/generated/src/main/java"),
            &modules.samples,
        ),
        (dirs.gapic.join("proto/src/main/java"), &modules.proto_java),
    ];
    // Location classes and CommonResources come from shared artifacts.
    let location = dirs.proto.join("com/google/cloud/location");
    if location.exists() {
        fs::remove_dir_all(location)?;
    }
    let common = dirs.proto.join("google/cloud/CommonResources.java");
    if common.exists() {
        fs::remove_file(common)?;
    }
    for (source, target) in moves {
        if source.exists() {
            fs::create_dir_all(target)?;
            move_and_merge(&source, target)?;
        }
    }
    Ok(())
}

/// Move every file below `source` to the same relative path below `target`.
pub fn move_and_merge(source: &Path, target: &Path) -> Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let to = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            fs::create_dir_all(&to)?;
            move_and_merge(&entry.path(), &to)?;
        } else {
            fs::rename(entry.path(), to)?;
        }
    }
    Ok(())
}

fn copy_protos(googleapis: &Path, protos: &[PathBuf], dest: &Path) -> Result<()> {
    for proto in protos {
        if proto.ends_with("google/cloud/common_resources.proto") {
            continue;
        }
        let rel = proto.strip_prefix(googleapis).unwrap_or(proto);
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(proto, target)?;
    }
    Ok(())
}

fn java_files(dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "java")
        })
        .map(|entry| entry.into_path())
        .collect()
}

impl Backend for JavaBackend {
    /// The proto and gRPC modules of the API's version. The GAPIC module is
    /// shared by every version and is left alone.
    fn api_dirs(&self, library: &ResolvedLibrary, api_path: &str) -> Vec<String> {
        let version = match extract_version(api_path) {
            Some(version) => version,
            None => return Vec::new(),
        };
        let artifact = artifact_id(&library.name);
        vec![
            format!("proto-{}-{}", artifact, version),
            format!("grpc-{}-{}", artifact, version),
        ]
    }

    fn generate(&self, libraries: &[ResolvedLibrary], sources: &SourceBundle) -> Result<()> {
        let googleapis = std::path::absolute(&sources.googleapis)?;
        for library in libraries {
            fs::create_dir_all(&library.output)?;
            for api in &library.apis {
                self.generate_api(library, &api.path, &googleapis)
                    .map_err(|e| Error::Tool {
                        tool: "protoc".to_string(),
                        message: format!("failed to generate api {:?}: {}", api.path, e),
                    })?;
            }
            info!("Generated {}", library.name);
        }
        Ok(())
    }

    fn format(&self, library: &ResolvedLibrary) -> Result<()> {
        let default_package = JavaPackage::default();
        let package = library.java.as_ref().unwrap_or(&default_package);
        if package.skip_format {
            debug!("Skipping format for {}", library.name);
            return Ok(());
        }
        let files = java_files(Path::new(&library.output));
        if files.is_empty() {
            return Ok(());
        }
        let jar = self.formatter_jar(package);
        let mut command = if jar.is_empty() {
            Command::new(self.tools.path("google-java-format"))
        } else {
            let mut java = Command::new(self.tools.path("java"));
            java.arg("-jar").arg(jar);
            java
        };
        command
            .arg("--replace")
            .args(&files)
            .current_dir(&library.output);
        process::run_command("google-java-format", &mut command)?;
        Ok(())
    }

    fn build(&self, _repo_root: &Path, library: &ResolvedLibrary) -> Result<()> {
        let output = Path::new(&library.output);
        if !output.join("pom.xml").exists() {
            debug!("Skipping build for {}, no pom.xml", library.name);
            return Ok(());
        }
        process::run(&self.tools.path("mvn"), ["-B", "-q", "compile"], output)?;
        Ok(())
    }
}
