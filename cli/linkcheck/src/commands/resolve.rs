//! `linkcheck resolve`: explain the execution plan for a target.

use std::path::Path;

use anyhow::{Context, Result};
use linkcheck_exec::{resolve, translator_for, ArtifactKind, ArtifactProfile, ExecutionPlan};
use linkcheck_targets::parse::parse_triple;

use crate::manifest::LinkcheckManifest;
use crate::BackendFlags;

pub fn run(
    project_dir: &Path,
    manifest: &LinkcheckManifest,
    target: &str,
    flags: &BackendFlags,
    library: bool,
    aux: bool,
) -> Result<()> {
    let target = parse_triple(target).with_context(|| format!("target '{target}'"))?;
    let host = super::host(flags)?;
    let backends = super::backend_config(manifest, flags);
    let runtime = super::cross_runtime(manifest, project_dir, flags)?;
    let kind = if library {
        ArtifactKind::Library
    } else {
        ArtifactKind::Executable
    };
    let profile = ArtifactProfile {
        kind,
        links_aux_sources: aux,
    };

    let plan = resolve(&host, &target, profile, &backends, &runtime);

    println!("Host:       {host}");
    println!("Target:     {target}");
    println!("Artifact:   {kind}{}", if aux { " (with aux sources)" } else { "" });
    match translator_for(&host, &target) {
        Some(backend) => println!(
            "Translator: {backend} ({})",
            if backends.is_enabled(backend) { "enabled" } else { "disabled" }
        ),
        None if host == target => println!("Translator: none needed"),
        None => println!("Translator: none known"),
    }
    match &plan {
        ExecutionPlan::Native => println!("Plan:       run natively"),
        ExecutionPlan::Emulated { args, .. } => {
            println!("Plan:       {} <artifact>", args.join(" "))
        }
        ExecutionPlan::Skip(reason) => println!("Plan:       skip ({reason}); build only"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_with_explicit_host() {
        let flags = BackendFlags {
            host: Some("x86_64-linux-gnu".into()),
            enable_qemu: true,
            ..BackendFlags::default()
        };
        run(
            Path::new("."),
            &LinkcheckManifest::default(),
            "aarch64-linux",
            &flags,
            false,
            true,
        )
        .unwrap();
    }

    #[test]
    fn bad_target_is_an_error() {
        let err = run(
            Path::new("."),
            &LinkcheckManifest::default(),
            "aarch64",
            &BackendFlags::default(),
            false,
            false,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("target 'aarch64'"));
    }
}
