//! Case outcomes and suite reports.
//!
//! Each outcome prints as one line:
//!
//! ```text
//! PASS hello (x86_64-linux-gnu)
//! PASS (build only) hello (aarch64-macos-none)
//! FAIL rpath (aarch64-macos-none): missing expected load command: LC_RPATH path=bar
//! ```

use std::fmt;

use linkcheck_exec::Backend;
use linkcheck_targets::PlatformDescriptor;
use serde::{Deserialize, Serialize};

use crate::digest::ArtifactDigest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaseStatus {
    Pass,
    /// Built and inspected; not run.
    PassBuildOnly,
    Fail,
}

/// Why a case failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CaseFailure {
    Build {
        message: String,
    },
    MalformedContainer {
        field: String,
        message: String,
    },
    MissingExpectedLoadCommand {
        dump: String,
    },
    /// Load-command expectations on a target whose artifacts are not Mach-O.
    UnsupportedInspection {
        format: String,
    },
    OutputMismatch {
        stream: String,
        expected: String,
        actual: String,
        status: i32,
    },
    Timeout {
        secs: f64,
    },
    Execution {
        message: String,
    },
    /// The run was cancelled while this case was in flight.
    Cancelled,
}

impl fmt::Display for CaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseFailure::Build { message } => write!(f, "build failed: {message}"),
            CaseFailure::MalformedContainer { field, message } => {
                write!(f, "malformed container ({field}): {message}")
            }
            CaseFailure::MissingExpectedLoadCommand { dump } => {
                write!(f, "missing expected load command: {dump}")
            }
            CaseFailure::UnsupportedInspection { format } => {
                write!(f, "load commands expected but {format} artifacts cannot be inspected")
            }
            CaseFailure::OutputMismatch {
                stream,
                expected,
                actual,
                status,
            } => write!(
                f,
                "{stream} mismatch (exit status {status}): expected \"{}\", got \"{}\"",
                expected.escape_debug(),
                actual.escape_debug()
            ),
            CaseFailure::Timeout { secs } => write!(f, "timed out after {secs}s"),
            CaseFailure::Execution { message } => write!(f, "execution failed: {message}"),
            CaseFailure::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub name: String,
    pub target: PlatformDescriptor,
    pub status: CaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<CaseFailure>,
    /// Translator involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    /// Why execution was skipped, for build-only passes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_sha256: Option<ArtifactDigest>,
}

impl CaseOutcome {
    pub fn new(name: impl Into<String>, target: PlatformDescriptor, status: CaseStatus) -> Self {
        Self {
            name: name.into(),
            target,
            status,
            failure: None,
            backend: None,
            skip_reason: None,
            artifact_sha256: None,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.target)
    }

    pub fn is_failure(&self) -> bool {
        self.status == CaseStatus::Fail
    }
}

impl fmt::Display for CaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.failure) {
            (CaseStatus::Pass, _) => write!(f, "PASS {}", self.label()),
            (CaseStatus::PassBuildOnly, _) => write!(f, "PASS (build only) {}", self.label()),
            (CaseStatus::Fail, failure) => {
                write!(f, "FAIL {}", self.label())?;
                if let Some(failure) = failure {
                    write!(f, ": {failure}")?;
                }
                if let Some(backend) = self.backend {
                    write!(f, " [backend: {backend}]")?;
                }
                Ok(())
            }
        }
    }
}

/// Outcomes of a suite run, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
    /// Set when cancellation abandoned part of the run.
    pub interrupted: bool,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.count(CaseStatus::Pass)
    }

    pub fn build_only(&self) -> usize {
        self.count(CaseStatus::PassBuildOnly)
    }

    pub fn failed(&self) -> usize {
        self.count(CaseStatus::Fail)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, status: CaseStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// `N passed, N build only, N failed`, plus a note when interrupted.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} passed, {} build only, {} failed",
            self.passed(),
            self.build_only(),
            self.failed()
        );
        if self.interrupted {
            line.push_str(" (interrupted)");
        }
        line
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for outcome in &self.outcomes {
            writeln!(f, "{outcome}")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.summary())
    }
}
