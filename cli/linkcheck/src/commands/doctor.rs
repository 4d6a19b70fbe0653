//! `linkcheck doctor`: toolchain and backend diagnostics.

use std::path::Path;
use std::process::Command;

use anyhow::Result;
use linkcheck_exec::{Backend, BackendConfig, CrossRuntime};
use linkcheck_targets::PlatformDescriptor;

use crate::manifest::{LinkcheckManifest, MANIFEST_NAME};

/// Print toolchain diagnostic information.
pub fn run(manifest: &LinkcheckManifest, manifest_dir: Option<&Path>) -> Result<()> {
    println!("=== linkcheck doctor ===");
    println!();
    println!("linkcheck version: {}", env!("CARGO_PKG_VERSION"));
    match PlatformDescriptor::host() {
        Ok(host) => println!("Host: {host}"),
        Err(e) => println!("Host: {e}"),
    }
    println!();

    println!("--- Configuration ---");
    match manifest_dir {
        Some(dir) => println!("  {MANIFEST_NAME}: found at {}", dir.display()),
        None => println!("  {MANIFEST_NAME}: not found (using defaults)"),
    }
    println!("  Timeout: {}s, jobs: {}", manifest.run.timeout_secs, manifest.run.jobs);
    let runtime = manifest.cross_runtime(manifest_dir.unwrap_or(Path::new(".")))?;
    for line in runtime_lines(&runtime) {
        println!("  {line}");
    }
    println!();

    println!("--- Toolchain ---");
    print_tool_status(&manifest.toolchain.compiler, &["--version"]);
    println!();

    println!("--- Execution Backends ---");
    for backend in Backend::ALL {
        let state = if manifest.backends.is_enabled(*backend) {
            "enabled"
        } else {
            "disabled"
        };
        print!("  [{state:<8}] ");
        let (program, args) = probe(*backend);
        print_tool_status(program, args);
    }
    println!("  Enabled: {}", enabled_summary(&manifest.backends));

    Ok(())
}

/// Cross runtime root and the architecture directory aliases in effect.
fn runtime_lines(runtime: &CrossRuntime) -> Vec<String> {
    let mut lines = vec![match &runtime.root {
        Some(dir) => format!("Cross runtime root: {}", dir.display()),
        None => "Cross runtime root: not configured".to_string(),
    }];
    for (arch, component) in runtime.aliases() {
        lines.push(format!("  {arch} -> {component}"));
    }
    lines
}

fn enabled_summary(backends: &BackendConfig) -> String {
    let names: Vec<String> = backends.enabled().map(|b| b.to_string()).collect();
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Program and arguments that report whether a backend is installed.
fn probe(backend: Backend) -> (&'static str, &'static [&'static str]) {
    match backend {
        Backend::Qemu => ("qemu-aarch64", &["--version"]),
        Backend::Wine => ("wine64", &["--version"]),
        Backend::Wasmtime => ("wasmtime", &["--version"]),
        Backend::Darling => ("darling", &["--version"]),
        Backend::Rosetta => ("arch", &["-x86_64", "/usr/bin/true"]),
    }
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let version = String::from_utf8_lossy(&output.stdout);
            let first_line = version.lines().next().unwrap_or("(unknown version)");
            println!("{name}: {first_line}");
        }
        Err(_) => {
            println!("{name}: not found");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_targets::Arch;
    use std::path::PathBuf;

    #[test]
    fn doctor_runs_without_error() {
        run(&LinkcheckManifest::default(), None).unwrap();
    }

    #[test]
    fn runtime_lines_list_aliases() {
        let runtime = CrossRuntime::new(Some(PathBuf::from("/opt/glibc")))
            .with_alias(Arch::Aarch64, "arm64");
        let lines = runtime_lines(&runtime);
        assert_eq!(lines[0], "Cross runtime root: /opt/glibc");
        assert!(lines.contains(&"  x86 -> i686".to_string()));
        assert!(lines.contains(&"  aarch64 -> arm64".to_string()));
    }

    #[test]
    fn enabled_summary_names_backends() {
        let mut backends = BackendConfig::default();
        assert_eq!(enabled_summary(&backends), "none");
        backends.enable(Backend::Qemu);
        backends.enable(Backend::Wine);
        assert_eq!(enabled_summary(&backends), "qemu, wine");
    }
}
