//! Building a case's sources into an artifact.

use std::path::{Path, PathBuf};
use std::process::Command;

use linkcheck_exec::ArtifactKind;
use linkcheck_targets::{Os, PlatformDescriptor};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::case::AuxSource;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to invoke compiler ({program}): {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{step} failed with status {status}: {stderr}")]
    CompilerFailed {
        step: String,
        status: i32,
        stderr: String,
    },

    #[error("nothing to build")]
    NoSources,
}

/// Everything a builder needs for one case.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub name: &'a str,
    pub target: &'a PlatformDescriptor,
    pub host: &'a PlatformDescriptor,
    pub kind: ArtifactKind,
    pub source: Option<&'a str>,
    pub aux: &'a [AuxSource],
    pub link_flags: &'a [String],
    /// Per-case scratch directory; the artifact goes here too.
    pub staging: &'a Path,
}

/// Turns sources into a single artifact for a target.
pub trait Builder: Send + Sync {
    fn build(&self, request: &BuildRequest<'_>) -> Result<PathBuf, BuildError>;
}

/// The `[toolchain]` table of `linkcheck.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Compiler driver program.
    pub compiler: String,
    /// Leading arguments, e.g. `["cc"]` for `zig cc`.
    pub compiler_args: Vec<String>,
    /// Flag that precedes the target triple.
    pub target_flag: String,
    /// Extension for the primary source file.
    pub native_extension: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "cc".into(),
            compiler_args: Vec::new(),
            target_flag: "-target".into(),
            native_extension: "c".into(),
        }
    }
}

/// Builds with a C-compatible compiler driver.
///
/// Aux units are compiled to objects with their own flags, then linked
/// together with the primary source. `-shared` is added for libraries and the
/// target flag is passed only when the target differs from the host.
#[derive(Debug, Clone, Default)]
pub struct CcBuilder {
    pub toolchain: ToolchainConfig,
}

impl CcBuilder {
    pub fn new(toolchain: ToolchainConfig) -> Self {
        Self { toolchain }
    }

    fn command(&self, request: &BuildRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.toolchain.compiler);
        cmd.args(&self.toolchain.compiler_args);
        if request.target != request.host {
            cmd.arg(&self.toolchain.target_flag)
                .arg(request.target.to_string());
        }
        cmd
    }

    fn run(&self, mut cmd: Command, step: String) -> Result<(), BuildError> {
        debug!(?cmd, "compiler invocation");
        let output = cmd.output().map_err(|source| BuildError::Spawn {
            program: self.toolchain.compiler.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(BuildError::CompilerFailed {
                step,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(())
    }
}

/// File name for the artifact a request produces.
pub fn artifact_name(name: &str, target: &PlatformDescriptor, kind: ArtifactKind) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    match (kind, target.os) {
        (ArtifactKind::Executable, Os::Windows) => format!("{stem}.exe"),
        (ArtifactKind::Executable, Os::Wasi) => format!("{stem}.wasm"),
        (ArtifactKind::Executable, _) => stem,
        (ArtifactKind::Library, Os::Macos) => format!("lib{stem}.dylib"),
        (ArtifactKind::Library, Os::Windows) => format!("{stem}.dll"),
        (ArtifactKind::Library, _) => format!("lib{stem}.so"),
    }
}

fn write(path: &Path, contents: &str) -> Result<(), BuildError> {
    std::fs::write(path, contents).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })
}

impl Builder for CcBuilder {
    fn build(&self, request: &BuildRequest<'_>) -> Result<PathBuf, BuildError> {
        if request.source.is_none() && request.aux.is_empty() {
            return Err(BuildError::NoSources);
        }

        let mut objects = Vec::with_capacity(request.aux.len());
        for unit in request.aux {
            let src = request.staging.join(&unit.name);
            write(&src, &unit.contents)?;
            let obj = src.with_extension("o");
            let mut cmd = self.command(request);
            cmd.arg("-c").arg(&src).arg("-o").arg(&obj).args(&unit.flags);
            self.run(cmd, format!("compiling {}", unit.name))?;
            objects.push(obj);
        }

        let output = request
            .staging
            .join(artifact_name(request.name, request.target, request.kind));
        let mut cmd = self.command(request);
        if request.kind == ArtifactKind::Library {
            cmd.arg("-shared");
        }
        cmd.arg("-o").arg(&output);
        if let Some(source) = request.source {
            let src = request
                .staging
                .join(format!("main.{}", self.toolchain.native_extension));
            write(&src, source)?;
            cmd.arg(src);
        }
        cmd.args(&objects).args(request.link_flags);
        self.run(cmd, "linking".to_string())?;

        debug!(artifact = %output.display(), "built");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_targets::{Abi, Arch};

    #[test]
    fn artifact_names_follow_platform() {
        let mac = PlatformDescriptor::new(Arch::Aarch64, Os::Macos, Abi::None);
        let win = PlatformDescriptor::new(Arch::X86_64, Os::Windows, Abi::Gnu);
        let linux = PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Gnu);
        assert_eq!(artifact_name("hello", &mac, ArtifactKind::Executable), "hello");
        assert_eq!(artifact_name("foo", &mac, ArtifactKind::Library), "libfoo.dylib");
        assert_eq!(artifact_name("hello world", &win, ArtifactKind::Executable), "hello_world.exe");
        assert_eq!(artifact_name("foo", &linux, ArtifactKind::Library), "libfoo.so");
    }

    #[test]
    fn toolchain_defaults() {
        let t: ToolchainConfig = toml::from_str("compiler = \"zig\"\ncompiler-args = [\"cc\"]\n").unwrap();
        assert_eq!(t.compiler, "zig");
        assert_eq!(t.compiler_args, vec!["cc"]);
        assert_eq!(t.target_flag, "-target");
        assert_eq!(t.native_extension, "c");
    }

    #[test]
    fn empty_request_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let host = PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Gnu);
        let req = BuildRequest {
            name: "empty",
            target: &host,
            host: &host,
            kind: ArtifactKind::Executable,
            source: None,
            aux: &[],
            link_flags: &[],
            staging: dir.path(),
        };
        assert!(matches!(CcBuilder::default().build(&req), Err(BuildError::NoSources)));
    }

    #[test]
    fn missing_compiler_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let host = PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Gnu);
        let builder = CcBuilder::new(ToolchainConfig {
            compiler: "linkcheck-no-such-cc".into(),
            ..ToolchainConfig::default()
        });
        let req = BuildRequest {
            name: "hello",
            target: &host,
            host: &host,
            kind: ArtifactKind::Executable,
            source: Some("int main(void) { return 0; }\n"),
            aux: &[],
            link_flags: &[],
            staging: dir.path(),
        };
        let err = builder.build(&req).unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
        assert!(dir.path().join("main.c").exists());
    }

    #[cfg(unix)]
    #[test]
    fn failing_compiler_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let host = PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Gnu);
        // `sh -c 'echo boom >&2; exit 1' <args>` stands in for a compiler.
        let builder = CcBuilder::new(ToolchainConfig {
            compiler: "sh".into(),
            compiler_args: vec!["-c".into(), "echo boom >&2; exit 1".into()],
            ..ToolchainConfig::default()
        });
        let req = BuildRequest {
            name: "hello",
            target: &host,
            host: &host,
            kind: ArtifactKind::Executable,
            source: Some("int main(void) { return 0; }\n"),
            aux: &[],
            link_flags: &[],
            staging: dir.path(),
        };
        match builder.build(&req).unwrap_err() {
            BuildError::CompilerFailed { step, status, stderr } => {
                assert_eq!(step, "linking");
                assert_eq!(status, 1);
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
