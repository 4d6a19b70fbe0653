//! `linkcheck run`: run suites and report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use linkcheck_harness::{load_suite, run_suite, CcBuilder, RunContext, RunPolicy, SuiteReport, TestCase};
use tracing::info;

use crate::manifest::LinkcheckManifest;
use crate::BackendFlags;

/// Command-line values that replace the `[run]` section.
#[derive(Debug, Default)]
pub struct Overrides {
    pub timeout: Option<u64>,
    pub fail_fast: bool,
    pub jobs: Option<usize>,
}

pub fn run(
    project_dir: &Path,
    manifest: &LinkcheckManifest,
    suites: &[PathBuf],
    flags: &BackendFlags,
    overrides: Overrides,
    filter: Option<&str>,
    report: Option<&str>,
) -> Result<()> {
    let json = match report.unwrap_or("human") {
        "human" => false,
        "json" => true,
        other => bail!("unknown report format '{other}' (expected human or json)"),
    };

    let cases = collect_cases(suites, filter)?;
    let ctx = context(project_dir, manifest, flags, overrides.timeout)?;
    let policy = RunPolicy {
        jobs: overrides.jobs.unwrap_or(manifest.run.jobs),
        fail_fast: overrides.fail_fast || manifest.run.fail_fast,
    };
    info!(host = %ctx.host, cases = cases.len(), "starting run");

    let report = run_suite(&cases, &ctx, policy);
    print_report(&report, json)?;

    if report.has_failures() {
        let n = report.failed();
        bail!("{n} case{} failed", if n == 1 { "" } else { "s" });
    }
    if report.interrupted {
        bail!("run interrupted");
    }
    Ok(())
}

fn collect_cases(suites: &[PathBuf], filter: Option<&str>) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    for suite in suites {
        let loaded = load_suite(suite).with_context(|| format!("loading suite {}", suite.display()))?;
        cases.extend(loaded);
    }
    if let Some(pattern) = filter {
        cases.retain(|c| c.name.contains(pattern));
    }
    Ok(cases)
}

fn context(
    project_dir: &Path,
    manifest: &LinkcheckManifest,
    flags: &BackendFlags,
    timeout: Option<u64>,
) -> Result<RunContext> {
    let host = super::host(flags)?;
    let builder = CcBuilder::new(manifest.toolchain.clone());
    let mut ctx = RunContext::new(host, Box::new(builder));
    ctx.backends = super::backend_config(manifest, flags);
    ctx.runtime = super::cross_runtime(manifest, project_dir, flags)?;
    ctx.timeout = Duration::from_secs(timeout.unwrap_or(manifest.run.timeout_secs));
    Ok(ctx)
}

fn print_report(report: &SuiteReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json().context("serializing report")?);
    } else {
        println!("{report}");
    }
    Ok(())
}
