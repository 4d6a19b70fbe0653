//! linkcheck CLI: build test cases per target, inspect the artifacts, and run
//! them natively or under a translator.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use manifest::LinkcheckManifest;

#[derive(Parser)]
#[command(name = "linkcheck", version, about = "Cross-target toolchain test harness")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug); LINKCHECK_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

/// Backend toggles that add to the ones enabled in linkcheck.toml.
#[derive(Args, Debug, Default)]
pub struct BackendFlags {
    /// Run foreign Linux binaries under qemu user mode
    #[arg(long)]
    enable_qemu: bool,
    /// Run Windows binaries under wine
    #[arg(long)]
    enable_wine: bool,
    /// Run WASI modules under wasmtime
    #[arg(long)]
    enable_wasmtime: bool,
    /// Run macOS binaries under darling
    #[arg(long)]
    enable_darling: bool,
    /// Run x86_64 macOS binaries under Rosetta
    #[arg(long)]
    enable_rosetta: bool,
    /// Root of per-target cross runtime directories
    #[arg(long)]
    glibc_dir: Option<PathBuf>,
    /// Pretend to be this host (e.g. x86_64-linux-gnu)
    #[arg(long)]
    host: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, inspect, and run the cases of one or more suites
    Run {
        /// Suite files (*.suite.toml)
        #[arg(required = true)]
        suites: Vec<PathBuf>,
        #[command(flatten)]
        backends: BackendFlags,
        /// Per-case execution timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Stop after the first failing case
        #[arg(long)]
        fail_fast: bool,
        /// Number of cases run at once
        #[arg(long)]
        jobs: Option<usize>,
        /// Only run cases whose name contains this string
        #[arg(long)]
        filter: Option<String>,
        /// Report format (human, json)
        #[arg(long)]
        report: Option<String>,
    },
    /// Print the header and load commands of a Mach-O binary
    Inspect {
        /// Path to the binary
        path: PathBuf,
        /// Output format (text, json)
        #[arg(long)]
        export: Option<String>,
    },
    /// Show how an artifact built for a target would be run on this host
    Resolve {
        /// Target triple (e.g. aarch64-macos)
        target: String,
        #[command(flatten)]
        backends: BackendFlags,
        /// Resolve for a dynamic library instead of an executable
        #[arg(long)]
        library: bool,
        /// The artifact links auxiliary non-native sources
        #[arg(long)]
        aux: bool,
    },
    /// Inspect target platforms
    Target {
        #[command(subcommand)]
        action: TargetAction,
    },
    /// Check the toolchain and execution backends
    Doctor,
}

#[derive(Subcommand)]
enum TargetAction {
    /// List built-in targets, or the targets of a .targets.toml file
    List {
        /// Target matrix file to list and validate
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Show details of a target
    Describe {
        /// Target triple
        name: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LINKCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Run {
            suites,
            backends,
            timeout,
            fail_fast,
            jobs,
            filter,
            report,
        } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::run::run(
                &project_dir,
                &manifest,
                &suites,
                &backends,
                commands::run::Overrides {
                    timeout,
                    fail_fast,
                    jobs,
                },
                filter.as_deref(),
                report.as_deref(),
            )
        }

        Commands::Inspect { path, export } => commands::inspect::run(&path, export.as_deref()),

        Commands::Resolve {
            target,
            backends,
            library,
            aux,
        } => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            let project_dir = project_dir.unwrap_or(cwd);
            commands::resolve::run(&project_dir, &manifest, &target, &backends, library, aux)
        }

        Commands::Target { action } => match action {
            TargetAction::List { file } => commands::target::list(file.as_deref()),
            TargetAction::Describe { name } => commands::target::describe(&name),
        },

        Commands::Doctor => {
            let (manifest, project_dir) = load_manifest_optional(&cwd)?;
            commands::doctor::run(&manifest, project_dir.as_deref())
        }
    }
}

/// The manifest found above `cwd`, or defaults when there is none.
fn load_manifest_optional(cwd: &Path) -> anyhow::Result<(LinkcheckManifest, Option<PathBuf>)> {
    match LinkcheckManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, Some(dir))),
        None => Ok((LinkcheckManifest::default(), None)),
    }
}
