//! Execution plan resolution.
//!
//! The decision is a pure function of its inputs; nothing here touches the
//! filesystem or probes for installed programs. Absence of a way to run an
//! artifact is a [`SkipReason`], not an error.

use std::fmt;
use std::path::PathBuf;

use linkcheck_targets::{Arch, Os, PlatformDescriptor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{Backend, BackendConfig};
use crate::runtime::CrossRuntime;

/// What the builder produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Executable,
    Library,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArtifactKind::Executable => "executable",
            ArtifactKind::Library => "library",
        })
    }
}

/// The facts about a built artifact that affect how it can be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArtifactProfile {
    pub kind: ArtifactKind,
    /// At least one auxiliary source unit in a non-native language was
    /// compiled in, pulling in the target's dynamic C library.
    pub links_aux_sources: bool,
}

impl ArtifactProfile {
    pub const fn executable() -> Self {
        Self {
            kind: ArtifactKind::Executable,
            links_aux_sources: false,
        }
    }

    pub const fn library() -> Self {
        Self {
            kind: ArtifactKind::Library,
            links_aux_sources: false,
        }
    }

    pub const fn with_aux_sources(mut self, links_aux_sources: bool) -> Self {
        self.links_aux_sources = links_aux_sources;
        self
    }
}

/// Why an artifact will not be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "reason", content = "backend", rename_all = "kebab-case")]
pub enum SkipReason {
    /// No known translator runs this target on this host.
    UnsupportedCombination,
    /// A translator exists but is switched off.
    BackendDisabled(Backend),
    /// The translator needs target system libraries and none are configured.
    MissingCrossRuntime(Backend),
    /// Libraries are built and inspected, never run.
    NotExecutable,
}

impl SkipReason {
    /// The backend the decision was about, if one was identified.
    pub const fn backend(&self) -> Option<Backend> {
        match self {
            SkipReason::BackendDisabled(b) | SkipReason::MissingCrossRuntime(b) => Some(*b),
            SkipReason::UnsupportedCombination | SkipReason::NotExecutable => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::UnsupportedCombination => "unsupported combination",
            SkipReason::BackendDisabled(_) => "backend disabled",
            SkipReason::MissingCrossRuntime(_) => "missing cross runtime",
            SkipReason::NotExecutable => "not executable",
        })
    }
}

/// How to run an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum ExecutionPlan {
    /// Run the artifact directly.
    Native,
    /// Run under a translator. `args[0]` is the translator's own invocation
    /// name; the artifact path is appended after `args`.
    Emulated {
        backend: Backend,
        program: String,
        args: Vec<String>,
    },
    Skip(SkipReason),
}

impl ExecutionPlan {
    pub const fn is_skip(&self) -> bool {
        matches!(self, ExecutionPlan::Skip(_))
    }

    pub const fn backend(&self) -> Option<Backend> {
        match self {
            ExecutionPlan::Emulated { backend, .. } => Some(*backend),
            ExecutionPlan::Skip(reason) => reason.backend(),
            ExecutionPlan::Native => None,
        }
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPlan::Native => f.write_str("native"),
            ExecutionPlan::Emulated { backend, args, .. } => {
                write!(f, "{backend}: {}", args.join(" "))
            }
            ExecutionPlan::Skip(reason) => match reason.backend() {
                Some(backend) => write!(f, "skip ({reason}: {backend})"),
                None => write!(f, "skip ({reason})"),
            },
        }
    }
}

/// The translator that can run `target` binaries on `host`, if any.
pub fn translator_for(host: &PlatformDescriptor, target: &PlatformDescriptor) -> Option<Backend> {
    if target.arch == Arch::Wasm32 && target.os == Os::Wasi {
        return Some(Backend::Wasmtime);
    }
    match (host.os, target.os) {
        (Os::Linux, Os::Linux) => {
            if (host.arch != target.arch || host.abi != target.abi)
                && target.arch.qemu_suffix().is_some()
            {
                return Some(Backend::Qemu);
            }
            None
        }
        (Os::Linux, Os::Windows) => {
            if host.arch.is_x86() && target.arch.is_x86() {
                return Some(Backend::Wine);
            }
            None
        }
        (Os::Linux, Os::Macos) => {
            if host.arch == target.arch {
                return Some(Backend::Darling);
            }
            None
        }
        (Os::Macos, Os::Macos) => {
            if host.arch == Arch::Aarch64 && target.arch == Arch::X86_64 {
                return Some(Backend::Rosetta);
            }
            None
        }
        _ => None,
    }
}

/// Decide how to run an artifact built for `target` on `host`.
pub fn resolve(
    host: &PlatformDescriptor,
    target: &PlatformDescriptor,
    artifact: ArtifactProfile,
    backends: &BackendConfig,
    runtime: &CrossRuntime,
) -> ExecutionPlan {
    let plan = decide(host, target, artifact, backends, runtime);
    debug!(%host, %target, kind = %artifact.kind, %plan, "resolved execution plan");
    plan
}

fn decide(
    host: &PlatformDescriptor,
    target: &PlatformDescriptor,
    artifact: ArtifactProfile,
    backends: &BackendConfig,
    runtime: &CrossRuntime,
) -> ExecutionPlan {
    if artifact.kind == ArtifactKind::Library {
        return ExecutionPlan::Skip(SkipReason::NotExecutable);
    }
    if host == target {
        return ExecutionPlan::Native;
    }

    let Some(backend) = translator_for(host, target) else {
        return ExecutionPlan::Skip(SkipReason::UnsupportedCombination);
    };
    if !backends.is_enabled(backend) {
        return ExecutionPlan::Skip(SkipReason::BackendDisabled(backend));
    }

    let runtime_dir = if needs_cross_runtime(backend, target, artifact) {
        match runtime.dir_for(target) {
            Some(dir) => Some(dir),
            None => return ExecutionPlan::Skip(SkipReason::MissingCrossRuntime(backend)),
        }
    } else {
        None
    };

    invocation(backend, target, runtime_dir)
}

fn needs_cross_runtime(backend: Backend, target: &PlatformDescriptor, artifact: ArtifactProfile) -> bool {
    backend == Backend::Qemu && target.abi.links_dynamic_libc() && artifact.links_aux_sources
}

fn invocation(backend: Backend, target: &PlatformDescriptor, runtime_dir: Option<PathBuf>) -> ExecutionPlan {
    let (program, mut args) = match backend {
        Backend::Qemu => {
            let suffix = target.arch.qemu_suffix().unwrap_or(target.arch.name());
            let program = format!("qemu-{suffix}");
            (program.clone(), vec![program])
        }
        Backend::Wine => {
            let program = if target.arch.word_size() == 64 { "wine64" } else { "wine" };
            (program.to_string(), vec![program.to_string()])
        }
        Backend::Wasmtime => ("wasmtime".to_string(), vec!["wasmtime".to_string()]),
        Backend::Darling => ("darling".to_string(), vec!["darling".to_string()]),
        Backend::Rosetta => (
            "arch".to_string(),
            vec!["arch".to_string(), "-x86_64".to_string()],
        ),
    };
    if let Some(dir) = runtime_dir {
        args.push("-L".to_string());
        args.push(dir.display().to_string());
    }
    ExecutionPlan::Emulated {
        backend,
        program,
        args,
    }
}
