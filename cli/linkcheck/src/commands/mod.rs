//! CLI command implementations.

pub mod doctor;
pub mod inspect;
pub mod resolve;
pub mod run;
pub mod target;

use std::path::Path;

use anyhow::{Context, Result};
use linkcheck_exec::{Backend, BackendConfig, CrossRuntime};
use linkcheck_targets::parse::parse_triple;
use linkcheck_targets::PlatformDescriptor;

use crate::manifest::LinkcheckManifest;
use crate::BackendFlags;

/// Manifest toggles plus any `--enable-*` flags.
fn backend_config(manifest: &LinkcheckManifest, flags: &BackendFlags) -> BackendConfig {
    let mut config = manifest.backends;
    for (on, backend) in [
        (flags.enable_qemu, Backend::Qemu),
        (flags.enable_wine, Backend::Wine),
        (flags.enable_wasmtime, Backend::Wasmtime),
        (flags.enable_darling, Backend::Darling),
        (flags.enable_rosetta, Backend::Rosetta),
    ] {
        if on {
            config.enable(backend);
        }
    }
    config
}

/// Manifest runtime, with `--glibc-dir` taking precedence.
fn cross_runtime(
    manifest: &LinkcheckManifest,
    project_dir: &Path,
    flags: &BackendFlags,
) -> Result<CrossRuntime> {
    let mut runtime = manifest.cross_runtime(project_dir)?;
    if let Some(dir) = &flags.glibc_dir {
        runtime.root = Some(dir.clone());
    }
    Ok(runtime)
}

/// `--host`, or the detected host.
fn host(flags: &BackendFlags) -> Result<PlatformDescriptor> {
    match &flags.host {
        Some(triple) => parse_triple(triple).with_context(|| format!("--host '{triple}'")),
        None => PlatformDescriptor::host().context("detecting host platform"),
    }
}
