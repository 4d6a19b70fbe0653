//! Running an artifact as a child process.
//!
//! The child gets a null stdin and piped stdout/stderr, drained on reader
//! threads that hand their buffers back over a channel. On Unix the child
//! leads its own process group. The parent polls `try_wait` until the child
//! exits, the deadline passes, or the run is cancelled, then waits for both
//! pipes to close under the same deadline. A descendant that keeps a pipe open
//! past the deadline times the run out like the child itself would; on expiry
//! or cancel the whole group is killed.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ExecError, Result};
use crate::resolve::ExecutionPlan;

const POLL_INTERVAL: Duration = Duration::from_millis(5);
/// Longest stretch spent waiting on the pipes between cancel checks.
const DRAIN_TICK: Duration = Duration::from_millis(50);

/// Shared flag that asks in-flight work to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum ProcessOutcome {
    /// The child exited on its own. `status` is the exit code, or 128 plus
    /// the signal number when it was killed by a signal.
    Exited {
        status: i32,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },
    /// The deadline passed and the child was killed.
    TimedOut,
    /// The run was cancelled and the child was killed.
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

type Chunk = (Stream, std::io::Result<Vec<u8>>);

enum Wait {
    Exited(std::process::ExitStatus),
    TimedOut,
    Cancelled,
}

enum Drained {
    Output { stdout: Vec<u8>, stderr: Vec<u8> },
    TimedOut,
    Cancelled,
}

/// Run `artifact` according to `plan`.
///
/// `Native` runs the artifact directly; `Emulated` runs the translator with
/// `args[1..]` followed by the artifact path. A `Skip` plan is an error.
pub fn execute(
    plan: &ExecutionPlan,
    artifact: &Path,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ProcessOutcome> {
    let mut cmd = match plan {
        ExecutionPlan::Native => Command::new(artifact),
        ExecutionPlan::Emulated { program, args, .. } => {
            let mut cmd = Command::new(program);
            cmd.args(args.iter().skip(1)).arg(artifact);
            cmd
        }
        ExecutionPlan::Skip(_) => return Err(ExecError::NothingToRun),
    };
    let program = cmd.get_program().to_string_lossy().into_owned();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        cmd.process_group(0);
    }
    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;
    debug!(%program, pid = child.id(), "spawned child");
    let deadline = Instant::now().checked_add(timeout);

    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(out) = child.stdout.take() {
        drain(out, Stream::Stdout, tx.clone());
        pending += 1;
    }
    if let Some(err) = child.stderr.take() {
        drain(err, Stream::Stderr, tx.clone());
        pending += 1;
    }
    drop(tx);

    let wait = |source| ExecError::Wait {
        program: program.clone(),
        source,
    };
    let status = match wait_with_deadline(&mut child, deadline, cancel).map_err(wait)? {
        Wait::Exited(status) => status,
        Wait::TimedOut => return Ok(timed_out(&program, timeout)),
        Wait::Cancelled => return Ok(cancelled(&program)),
    };

    match drain_until(&rx, pending, deadline, cancel, &program)? {
        Drained::Output { stdout, stderr } => {
            let status = exit_code(status);
            debug!(%program, status, stdout_len = stdout.len(), "child exited");
            Ok(ProcessOutcome::Exited {
                status,
                stdout,
                stderr,
            })
        }
        // The child is gone but something it started still holds a pipe.
        Drained::TimedOut => {
            kill_group(&mut child);
            Ok(timed_out(&program, timeout))
        }
        Drained::Cancelled => {
            kill_group(&mut child);
            Ok(cancelled(&program))
        }
    }
}

fn timed_out(program: &str, timeout: Duration) -> ProcessOutcome {
    warn!(%program, timeout_secs = timeout.as_secs_f64(), "child timed out");
    ProcessOutcome::TimedOut
}

fn cancelled(program: &str) -> ProcessOutcome {
    debug!(%program, "child cancelled");
    ProcessOutcome::Cancelled
}

fn drain<R: Read + Send + 'static>(mut reader: R, stream: Stream, tx: Sender<Chunk>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let read = reader.read_to_end(&mut buf).map(|_| buf);
        let _ = tx.send((stream, read));
    });
}

/// Collect both streams, giving up at the deadline or on cancel.
fn drain_until(
    rx: &Receiver<Chunk>,
    mut pending: usize,
    deadline: Option<Instant>,
    cancel: &CancelToken,
    program: &str,
) -> Result<Drained> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    while pending > 0 {
        if cancel.is_cancelled() {
            return Ok(Drained::Cancelled);
        }
        let tick = match deadline {
            Some(d) => {
                let now = Instant::now();
                if now >= d {
                    return Ok(Drained::TimedOut);
                }
                (d - now).min(DRAIN_TICK)
            }
            None => DRAIN_TICK,
        };
        match rx.recv_timeout(tick) {
            Ok((stream, read)) => {
                pending -= 1;
                let buf = read.map_err(|source| ExecError::Capture {
                    program: program.to_string(),
                    stream: stream.name(),
                    source,
                })?;
                match stream {
                    Stream::Stdout => stdout = buf,
                    Stream::Stderr => stderr = buf,
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ExecError::Capture {
                    program: program.to_string(),
                    stream: "output",
                    source: std::io::Error::other("reader thread exited without a result"),
                })
            }
        }
    }
    Ok(Drained::Output { stdout, stderr })
}

fn wait_with_deadline(
    child: &mut Child,
    deadline: Option<Instant>,
    cancel: &CancelToken,
) -> std::io::Result<Wait> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Wait::Exited(status));
        }
        if cancel.is_cancelled() {
            kill_group(child);
            child.wait()?;
            return Ok(Wait::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            kill_group(child);
            child.wait()?;
            return Ok(Wait::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// SIGKILL the child's process group, then the child itself.
fn kill_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = i32::try_from(child.id()) {
            // SAFETY: kill(2) takes no pointers; a stale group id only yields ESRCH.
            unsafe {
                let _ = libc::kill(-pid, libc::SIGKILL);
            }
        }
    }
    let _ = child.kill();
}

fn exit_code(status: std::process::ExitStatus) -> i32 {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt as _;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal: Option<i32> = None;

    match status.code() {
        Some(code) => code,
        None => signal.map(|s| 128 + s).unwrap_or(1),
    }
}
