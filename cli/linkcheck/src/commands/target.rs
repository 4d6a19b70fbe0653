//! `linkcheck target`: platform listing and description.

use std::path::Path;

use anyhow::{bail, Context, Result};
use linkcheck_exec::{translator_for, Backend};
use linkcheck_targets::parse::{load_target_matrix, parse_triple, validate_platform};
use linkcheck_targets::PlatformDescriptor;

/// List the built-in targets, or the targets of a matrix file.
pub fn list(file: Option<&Path>) -> Result<()> {
    let (targets, source) = match file {
        Some(path) => (
            load_target_matrix(path).with_context(|| format!("loading {}", path.display()))?,
            path.display().to_string(),
        ),
        None => (PlatformDescriptor::builtin(), "built-in".to_string()),
    };
    let host = PlatformDescriptor::host().ok();

    println!("Targets ({source}):");
    println!();
    let mut invalid = 0;
    for target in &targets {
        let marker = if Some(*target) == host { " (host)" } else { "" };
        println!("  {:<25} {:?}{marker}", target.to_string(), target.object_format());
        if let Err(issues) = validate_platform(target) {
            for issue in issues {
                println!("      {}: {}", issue.severity, issue.message);
                if issue.severity == "error" {
                    invalid += 1;
                }
            }
        }
    }
    println!();
    println!("Use 'linkcheck target describe <triple>' for details.");
    if invalid > 0 {
        bail!("{invalid} target error(s)");
    }
    Ok(())
}

/// Describe one target and how this host would run its binaries.
pub fn describe(name: &str) -> Result<()> {
    let target = parse_triple(name).with_context(|| format!("target '{name}'"))?;

    println!("=== Target: {target} ===");
    println!("  Architecture:  {} ({}-bit)", target.arch, target.word_size());
    println!("  OS:            {}", target.os);
    println!("  ABI:           {}", target.abi);
    println!("  Object format: {:?}", target.object_format());
    if let Some(cpu) = target.arch.macho_cpu_type() {
        println!("  Mach-O cputype: 0x{cpu:08x}");
    }
    println!(
        "  Dynamic libc:  {}",
        if target.abi.links_dynamic_libc() { "yes" } else { "no" }
    );
    println!();

    match PlatformDescriptor::host() {
        Ok(host) if host == target => println!("  Runs natively on this host ({host})."),
        Ok(host) => match translator_for(&host, &target) {
            Some(backend) => println!("  Runs on this host ({host}) under {}.", program(backend)),
            None => println!("  No known way to run it on this host ({host})."),
        },
        Err(e) => println!("  Host detection failed: {e}"),
    }

    if let Err(issues) = validate_platform(&target) {
        println!();
        for issue in issues {
            println!("  {}: {}", issue.severity, issue.message);
        }
    }
    Ok(())
}

fn program(backend: Backend) -> &'static str {
    match backend {
        Backend::Qemu => "qemu user mode",
        Backend::Wine => "wine",
        Backend::Wasmtime => "wasmtime",
        Backend::Darling => "darling",
        Backend::Rosetta => "Rosetta",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_builtin() {
        list(None).unwrap();
    }

    #[test]
    fn list_matrix_with_invalid_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.targets.toml");
        std::fs::write(&path, "targets = [\"x86_64-linux-gnu\", \"x86_64-linux-msvc\"]\n").unwrap();
        assert!(list(Some(&path)).is_err());
    }

    #[test]
    fn describe_known_and_unknown() {
        describe("aarch64-macos").unwrap();
        assert!(describe("vax-vms").is_err());
    }
}
