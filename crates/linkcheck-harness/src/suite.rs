//! Running a list of cases.
//!
//! Workers pull the next case index from a shared counter, so with `jobs > 1`
//! cases finish in any order; outcomes are slotted back by index and the
//! report lists them in declaration order. Cancelling the context's token
//! kills in-flight children and stops workers from taking new cases. A case
//! abandoned that way is not recorded.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use tracing::{debug, info};

use crate::case::TestCase;
use crate::report::{CaseFailure, CaseOutcome, SuiteReport};
use crate::runner::{run_case, RunContext};

/// How a suite is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPolicy {
    /// Cases run at once; 0 is treated as 1.
    pub jobs: usize,
    /// Cancel the rest of the run after the first failure.
    pub fail_fast: bool,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: false,
        }
    }
}

/// Run `cases` and collect their outcomes.
pub fn run_suite(cases: &[TestCase], ctx: &RunContext, policy: RunPolicy) -> SuiteReport {
    let jobs = policy.jobs.clamp(1, cases.len().max(1));
    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<CaseOutcome>>> = Mutex::new(vec![None; cases.len()]);

    info!(cases = cases.len(), jobs, fail_fast = policy.fail_fast, "running suite");

    let worker = || loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let index = next.fetch_add(1, Ordering::SeqCst);
        let Some(case) = cases.get(index) else {
            break;
        };

        let outcome = run_case(case, ctx);
        if outcome.failure == Some(CaseFailure::Cancelled) && ctx.cancel.is_cancelled() {
            debug!(case = %case.label(), "abandoned");
            break;
        }
        if policy.fail_fast && outcome.is_failure() {
            info!(case = %case.label(), "fail-fast: cancelling remaining cases");
            ctx.cancel.cancel();
        }
        if let Ok(mut slots) = slots.lock() {
            slots[index] = Some(outcome);
        }
    };

    if jobs == 1 {
        worker();
    } else {
        thread::scope(|scope| {
            for _ in 0..jobs {
                scope.spawn(worker);
            }
        });
    }

    let slots = slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    let outcomes: Vec<CaseOutcome> = slots.into_iter().flatten().collect();
    let interrupted = outcomes.len() < cases.len();
    SuiteReport {
        outcomes,
        interrupted,
    }
}
