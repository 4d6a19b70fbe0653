//! Deciding how a built artifact runs, and running it.
//!
//! [`resolve`] is a pure function from (host, target, artifact, backend
//! toggles, cross runtime) to an [`ExecutionPlan`]: run natively, run under a
//! translator, or skip. [`execute`] carries out a non-skip plan as a child
//! process with a wall-clock deadline and cooperative cancellation.

pub mod backend;
pub mod error;
pub mod process;
pub mod resolve;
pub mod runtime;

pub use backend::{Backend, BackendConfig};
pub use error::{ExecError, Result};
pub use process::{execute, CancelToken, ProcessOutcome};
pub use resolve::{resolve, translator_for, ArtifactKind, ArtifactProfile, ExecutionPlan, SkipReason};
pub use runtime::CrossRuntime;
