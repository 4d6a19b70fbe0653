//! `linkcheck.toml` parsing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use linkcheck_exec::{BackendConfig, CrossRuntime};
use linkcheck_harness::ToolchainConfig;
use linkcheck_targets::Arch;
use serde::{Deserialize, Serialize};

pub const MANIFEST_NAME: &str = "linkcheck.toml";

/// The top-level harness configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkcheckManifest {
    pub toolchain: ToolchainConfig,
    pub backends: BackendConfig,
    pub runtime: RuntimeConfig,
    pub run: RunConfig,
}

/// Cross runtime section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Root of per-target system library directories. Relative paths are
    /// taken from the manifest's directory.
    pub glibc_dir: Option<PathBuf>,
    /// Extra architecture to directory-component entries (`x86 = "i686"`).
    pub arch_aliases: BTreeMap<String, String>,
}

/// Scheduling section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunConfig {
    pub timeout_secs: u64,
    pub fail_fast: bool,
    pub jobs: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            fail_fast: false,
            jobs: 1,
        }
    }
}

impl LinkcheckManifest {
    /// Search upward from `start_dir` for a `linkcheck.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_NAME);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: LinkcheckManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing linkcheck.toml")
    }

    /// Cross runtime with `glibc-dir` resolved against `base_dir` and the
    /// configured aliases applied.
    pub fn cross_runtime(&self, base_dir: &Path) -> Result<CrossRuntime> {
        let root = self.runtime.glibc_dir.as_ref().map(|dir| base_dir.join(dir));
        let mut runtime = CrossRuntime::new(root);
        for (arch, component) in &self.runtime.arch_aliases {
            let arch: Arch = arch
                .parse()
                .with_context(|| format!("[runtime.arch-aliases] key '{arch}'"))?;
            runtime = runtime.with_alias(arch, component.clone());
        }
        Ok(runtime)
    }
}
