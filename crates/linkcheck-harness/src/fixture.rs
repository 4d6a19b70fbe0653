//! Suite files.
//!
//! A suite is a TOML file (`*.suite.toml`) of `[[case]]` tables:
//!
//! ```toml
//! [[case]]
//! name = "rpath"
//! target = "aarch64-macos"
//! source = 'pub fn main() void {}'
//! link-flags = ["-rpath", "foo"]
//!
//! [[case.load-commands]]
//! kind = "rpath"
//! path = "foo"
//! ```
//!
//! `targets = [..]` in place of `target` expands one table into a case per
//! target. `source-file` names a file relative to the suite instead of
//! inlining `source`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use linkcheck_exec::ArtifactKind;
use linkcheck_macho::LoadCommand;
use linkcheck_targets::parse::{parse_triple, validate_platform};
use linkcheck_targets::PlatformDescriptor;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::case::{AuxSource, ExpectedOutcome, TestCase};
use crate::error::{HarnessError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    #[serde(default)]
    case: Vec<CaseSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct CaseSpec {
    name: String,
    target: Option<String>,
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default = "default_kind")]
    kind: ArtifactKind,
    source: Option<String>,
    source_file: Option<PathBuf>,
    #[serde(default)]
    aux: Vec<AuxSource>,
    #[serde(default)]
    link_flags: Vec<String>,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    load_commands: Vec<LoadCommand>,
}

fn default_kind() -> ArtifactKind {
    ArtifactKind::Executable
}

/// Load the suite at `path`. Relative `source-file` entries resolve against
/// the suite's directory.
pub fn load_suite(path: &Path) -> Result<Vec<TestCase>> {
    let text = std::fs::read_to_string(path).map_err(|source| HarnessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    parse_suite(&text, &path.display().to_string(), base)
}

/// Parse suite text. `origin` names the suite in errors.
pub fn parse_suite(text: &str, origin: &str, base: &Path) -> Result<Vec<TestCase>> {
    let file: SuiteFile = toml::from_str(text).map_err(|source| HarnessError::Toml {
        origin: origin.to_string(),
        source,
    })?;

    let mut cases = Vec::new();
    let mut seen = BTreeSet::new();
    for spec in file.case {
        for case in expand(spec, origin, base)? {
            if !seen.insert((case.name.clone(), case.target)) {
                return Err(HarnessError::DuplicateCase {
                    origin: origin.to_string(),
                    case: case.label(),
                });
            }
            cases.push(case);
        }
    }
    debug!(origin, cases = cases.len(), "loaded suite");
    Ok(cases)
}

fn expand(spec: CaseSpec, origin: &str, base: &Path) -> Result<Vec<TestCase>> {
    let invalid = |message: String| HarnessError::InvalidCase {
        origin: origin.to_string(),
        case: spec.name.clone(),
        message,
    };

    let triples: Vec<&str> = match (&spec.target, spec.targets.is_empty()) {
        (Some(t), true) => vec![t.as_str()],
        (None, false) => spec.targets.iter().map(String::as_str).collect(),
        (Some(_), false) => return Err(invalid("set either `target` or `targets`, not both".into())),
        (None, true) => return Err(invalid("missing `target`".into())),
    };

    let source = match (&spec.source, &spec.source_file) {
        (Some(s), None) => Some(s.clone()),
        (None, Some(file)) => {
            let path = base.join(file);
            Some(std::fs::read_to_string(&path).map_err(|source| HarnessError::Io { path, source })?)
        }
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err(invalid("set either `source` or `source-file`, not both".into()))
        }
    };
    if source.is_none() && spec.aux.is_empty() {
        return Err(invalid("no source and no aux units to build".into()));
    }

    let expected = ExpectedOutcome {
        stdout: spec.stdout.clone().into_bytes(),
        stderr: spec.stderr.clone().into_bytes(),
        load_commands: spec.load_commands.clone(),
    };

    let mut cases = Vec::with_capacity(triples.len());
    for triple in triples {
        let target = parse_target(triple).map_err(&invalid)?;
        cases.push(TestCase {
            name: spec.name.clone(),
            target,
            kind: spec.kind,
            source: source.clone(),
            aux: spec.aux.clone(),
            link_flags: spec.link_flags.clone(),
            expected: expected.clone(),
        });
    }
    Ok(cases)
}

fn parse_target(triple: &str) -> std::result::Result<PlatformDescriptor, String> {
    let target = parse_triple(triple).map_err(|e| e.to_string())?;
    if let Err(issues) = validate_platform(&target) {
        let mut errors = Vec::new();
        for issue in issues {
            if issue.severity == "error" {
                errors.push(issue.message);
            } else {
                warn!(%target, "{}", issue.message);
            }
        }
        if !errors.is_empty() {
            return Err(errors.join("; "));
        }
    }
    Ok(target)
}
