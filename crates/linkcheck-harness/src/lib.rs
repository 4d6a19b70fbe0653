//! Cross-target test harness.
//!
//! A [`TestCase`] names a target, the sources to build, and what the result
//! must look like. [`run_case`] drives one case through the state machine
//!
//! ```text
//! Built -> Inspected -> { Skipped (build only) | Executed } -> { Pass | Fail }
//! ```
//!
//! where any failure short-circuits to `Fail`. [`run_suite`] runs many cases,
//! optionally in parallel, and reports outcomes in declaration order.

pub mod builder;
pub mod case;
pub mod digest;
pub mod error;
pub mod fixture;
pub mod report;
pub mod runner;
pub mod suite;

pub use builder::{BuildError, BuildRequest, Builder, CcBuilder, ToolchainConfig};
pub use case::{AuxSource, ExpectedOutcome, TestCase};
pub use digest::ArtifactDigest;
pub use error::{HarnessError, Result};
pub use fixture::{load_suite, parse_suite};
pub use report::{CaseFailure, CaseOutcome, CaseStatus, SuiteReport};
pub use runner::{run_case, Executor, ProcessExecutor, RunContext};
pub use suite::{run_suite, RunPolicy};

pub use linkcheck_exec::CancelToken;
