//! Running one case: build, inspect, resolve, execute, compare.

use std::path::Path;
use std::time::Duration;

use linkcheck_exec::{
    resolve, ArtifactKind, BackendConfig, CancelToken, CrossRuntime, ExecError, ExecutionPlan,
    ProcessOutcome,
};
use linkcheck_macho::{inspect, verify, ContainerError, FileType, VerifyError};
use linkcheck_targets::{ObjectFormat, PlatformDescriptor};
use tracing::{info, info_span, warn};

use crate::builder::{BuildRequest, Builder};
use crate::case::TestCase;
use crate::digest::ArtifactDigest;
use crate::report::{CaseFailure, CaseOutcome, CaseStatus};

/// Runs a resolved plan against an artifact.
pub trait Executor: Send + Sync {
    fn execute(
        &self,
        plan: &ExecutionPlan,
        artifact: &Path,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ProcessOutcome, ExecError>;
}

/// Runs artifacts as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(
        &self,
        plan: &ExecutionPlan,
        artifact: &Path,
        timeout: Duration,
        cancel: &CancelToken,
    ) -> Result<ProcessOutcome, ExecError> {
        linkcheck_exec::execute(plan, artifact, timeout, cancel)
    }
}

/// Everything shared by all cases of a run.
pub struct RunContext {
    pub host: PlatformDescriptor,
    pub backends: BackendConfig,
    pub runtime: CrossRuntime,
    pub timeout: Duration,
    pub builder: Box<dyn Builder>,
    pub executor: Box<dyn Executor>,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new(host: PlatformDescriptor, builder: Box<dyn Builder>) -> Self {
        Self {
            host,
            backends: BackendConfig::default(),
            runtime: CrossRuntime::default(),
            timeout: Duration::from_secs(30),
            builder,
            executor: Box::new(ProcessExecutor),
            cancel: CancelToken::new(),
        }
    }
}

struct Failed {
    failure: CaseFailure,
    digest: Option<ArtifactDigest>,
    backend: Option<linkcheck_exec::Backend>,
}

impl From<CaseFailure> for Failed {
    fn from(failure: CaseFailure) -> Self {
        Failed {
            failure,
            digest: None,
            backend: None,
        }
    }
}

/// Drive `case` to an outcome. Every failure is attributed to the case, its
/// target and, once one is chosen, its backend.
pub fn run_case(case: &TestCase, ctx: &RunContext) -> CaseOutcome {
    let span = info_span!("case", name = %case.name, target = %case.target);
    let _guard = span.enter();

    match drive(case, ctx) {
        Ok(outcome) => outcome,
        Err(failed) => {
            warn!(failure = %failed.failure, "case failed");
            let mut outcome = CaseOutcome::new(&case.name, case.target, CaseStatus::Fail);
            outcome.failure = Some(failed.failure);
            outcome.artifact_sha256 = failed.digest;
            outcome.backend = failed.backend;
            outcome
        }
    }
}

fn drive(case: &TestCase, ctx: &RunContext) -> Result<CaseOutcome, Failed> {
    if ctx.cancel.is_cancelled() {
        return Err(CaseFailure::Cancelled.into());
    }

    let staging = tempfile::Builder::new()
        .prefix("linkcheck-")
        .tempdir()
        .map_err(|e| CaseFailure::Build {
            message: format!("failed to create staging directory: {e}"),
        })?;

    // Built
    let request = BuildRequest {
        name: &case.name,
        target: &case.target,
        host: &ctx.host,
        kind: case.kind,
        source: case.source.as_deref(),
        aux: &case.aux,
        link_flags: &case.link_flags,
        staging: staging.path(),
    };
    let artifact = ctx.builder.build(&request).map_err(|e| CaseFailure::Build {
        message: e.to_string(),
    })?;
    let bytes = std::fs::read(&artifact).map_err(|e| CaseFailure::Build {
        message: format!("artifact {} unreadable: {e}", artifact.display()),
    })?;
    let digest = ArtifactDigest::compute(&bytes);
    info!(artifact = %artifact.display(), sha256 = digest.short(), "built");

    let with_digest = |failure: CaseFailure| Failed {
        failure,
        digest: Some(digest.clone()),
        backend: None,
    };

    // Inspected
    inspect_artifact(case, &artifact).map_err(with_digest)?;

    // Resolved
    let plan = resolve(
        &ctx.host,
        &case.target,
        case.artifact_profile(),
        &ctx.backends,
        &ctx.runtime,
    );
    let backend = plan.backend();
    if let ExecutionPlan::Skip(reason) = &plan {
        warn!(%reason, "not executed; build-only pass");
        let mut outcome = CaseOutcome::new(&case.name, case.target, CaseStatus::PassBuildOnly);
        outcome.skip_reason = Some(match reason.backend() {
            Some(b) => format!("{reason} ({b})"),
            None => reason.to_string(),
        });
        outcome.backend = backend;
        outcome.artifact_sha256 = Some(digest);
        return Ok(outcome);
    }

    // Executed
    let with_backend = |failure: CaseFailure| Failed {
        failure,
        digest: Some(digest.clone()),
        backend,
    };
    let outcome = ctx
        .executor
        .execute(&plan, &artifact, ctx.timeout, &ctx.cancel)
        .map_err(|e| with_backend(CaseFailure::Execution {
            message: e.to_string(),
        }))?;
    let (status, stdout, stderr) = match outcome {
        ProcessOutcome::Exited {
            status,
            stdout,
            stderr,
        } => (status, stdout, stderr),
        ProcessOutcome::TimedOut => {
            return Err(with_backend(CaseFailure::Timeout {
                secs: ctx.timeout.as_secs_f64(),
            }))
        }
        ProcessOutcome::Cancelled => return Err(with_backend(CaseFailure::Cancelled)),
    };

    // Compared
    compare("stdout", &case.expected.stdout, &stdout, status).map_err(with_backend)?;
    compare("stderr", &case.expected.stderr, &stderr, status).map_err(with_backend)?;

    info!(status, "passed");
    let mut outcome = CaseOutcome::new(&case.name, case.target, CaseStatus::Pass);
    outcome.backend = backend;
    outcome.artifact_sha256 = Some(digest);
    Ok(outcome)
}

fn inspect_artifact(case: &TestCase, artifact: &Path) -> Result<(), CaseFailure> {
    let format = case.target.object_format();
    if format != ObjectFormat::MachO {
        if case.expected.load_commands.is_empty() {
            return Ok(());
        }
        return Err(CaseFailure::UnsupportedInspection {
            format: format!("{format:?}"),
        });
    }

    let container = inspect(artifact).map_err(malformed)?;
    container.check_arch(case.target.arch).map_err(malformed)?;
    let file_type = match case.kind {
        ArtifactKind::Executable => FileType::Executable,
        ArtifactKind::Library => FileType::DynamicLibrary,
    };
    container.check_file_type(file_type).map_err(malformed)?;
    verify(container.commands(), &case.expected.load_commands).map_err(|e| match e {
        VerifyError::MissingExpectedLoadCommand { dump, .. } => {
            CaseFailure::MissingExpectedLoadCommand { dump }
        }
    })?;
    info!(commands = container.records.len(), "inspected");
    Ok(())
}

fn malformed(e: ContainerError) -> CaseFailure {
    CaseFailure::MalformedContainer {
        field: e.field().to_string(),
        message: e.to_string(),
    }
}

fn compare(stream: &str, expected: &[u8], actual: &[u8], status: i32) -> Result<(), CaseFailure> {
    if expected == actual {
        return Ok(());
    }
    Err(CaseFailure::OutputMismatch {
        stream: stream.to_string(),
        expected: String::from_utf8_lossy(expected).into_owned(),
        actual: String::from_utf8_lossy(actual).into_owned(),
        status,
    })
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use linkcheck_exec::{Backend, SkipReason};
    use linkcheck_macho::fixture::ContainerWriter;
    use linkcheck_macho::LoadCommand;
    use linkcheck_targets::{Abi, Arch, Os};

    fn linux_x64() -> PlatformDescriptor {
        PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Gnu)
    }

    fn mac_arm() -> PlatformDescriptor {
        PlatformDescriptor::new(Arch::Aarch64, Os::Macos, Abi::None)
    }

    fn ctx(host: PlatformDescriptor, builder: impl Builder + 'static, executor: FakeExecutor) -> RunContext {
        let mut ctx = RunContext::new(host, Box::new(builder));
        ctx.executor = Box::new(executor);
        ctx
    }

    #[test]
    fn foreign_macos_with_backends_off_is_build_only() {
        let case = TestCase::executable("hello", mac_arm()).with_source("x");
        let ctx = ctx(
            linux_x64(),
            FakeBuilder::macho(&mac_arm(), &[]),
            FakeExecutor::printing(b""),
        );
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::PassBuildOnly);
        assert_eq!(outcome.skip_reason.as_deref(), Some("unsupported combination"));
        assert!(outcome.artifact_sha256.is_some());
        assert_eq!(outcome.to_string(), "PASS (build only) hello (aarch64-macos-none)");
    }

    #[test]
    fn matching_stdout_passes() {
        let case = TestCase::executable("hello", mac_arm())
            .with_source("x")
            .expect_stdout("Hello, World!\n");
        let ctx = ctx(
            mac_arm(),
            FakeBuilder::macho(&mac_arm(), &[]),
            FakeExecutor::printing(b"Hello, World!\n"),
        );
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::Pass, "{outcome}");
        assert_eq!(outcome.backend, None);
    }

    #[test]
    fn trailing_newline_difference_fails() {
        let case = TestCase::executable("hello", mac_arm())
            .with_source("x")
            .expect_stdout("Hello, World!");
        let ctx = ctx(
            mac_arm(),
            FakeBuilder::macho(&mac_arm(), &[]),
            FakeExecutor::printing(b"Hello, World!\n"),
        );
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::Fail);
        assert_eq!(
            outcome.failure,
            Some(CaseFailure::OutputMismatch {
                stream: "stdout".into(),
                expected: "Hello, World!".into(),
                actual: "Hello, World!\n".into(),
                status: 0,
            })
        );
    }

    #[test]
    fn missing_load_command_fails_before_execution() {
        let rpath = |p: &str| LoadCommand::Rpath { path: p.into() };
        let case = TestCase::executable("rpath", mac_arm())
            .with_source("x")
            .expect_load_command(rpath("bar"));
        let executor = FakeExecutor::printing(b"");
        let ctx = ctx(mac_arm(), FakeBuilder::macho(&mac_arm(), &[rpath("foo")]), executor);
        let outcome = run_case(&case, &ctx);
        assert_eq!(
            outcome.failure,
            Some(CaseFailure::MissingExpectedLoadCommand {
                dump: "LC_RPATH path=bar".into()
            })
        );
    }

    #[test]
    fn present_load_command_passes_inspection() {
        let rpath = LoadCommand::Rpath { path: "foo".into() };
        let case = TestCase::executable("rpath", mac_arm())
            .with_source("x")
            .expect_load_command(rpath.clone());
        let ctx = ctx(
            linux_x64(),
            FakeBuilder::macho(&mac_arm(), &[rpath]),
            FakeExecutor::printing(b""),
        );
        assert_eq!(run_case(&case, &ctx).status, CaseStatus::PassBuildOnly);
    }

    #[test]
    fn wrong_cpu_type_is_malformed() {
        let case = TestCase::executable("hello", mac_arm()).with_source("x");
        let x64_mac = PlatformDescriptor::new(Arch::X86_64, Os::Macos, Abi::None);
        let ctx = ctx(
            mac_arm(),
            FakeBuilder::macho(&x64_mac, &[]),
            FakeExecutor::printing(b""),
        );
        let outcome = run_case(&case, &ctx);
        assert!(matches!(
            outcome.failure,
            Some(CaseFailure::MalformedContainer { ref field, .. }) if field == "cputype"
        ));
    }

    #[test]
    fn dylib_for_executable_case_is_malformed() {
        let case = TestCase::executable("hello", mac_arm()).with_source("x");
        let ctx = ctx(
            mac_arm(),
            FakeBuilder {
                image: ContainerWriter::dylib(Arch::Aarch64).finish(),
            },
            FakeExecutor::printing(b""),
        );
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::Fail);
        assert!(matches!(
            outcome.failure,
            Some(CaseFailure::MalformedContainer { ref field, .. }) if field == "filetype"
        ));
    }

    #[test]
    fn dylib_for_library_case_is_build_only() {
        let case = TestCase::library("lib", mac_arm()).with_source("x");
        let ctx = ctx(
            mac_arm(),
            FakeBuilder {
                image: ContainerWriter::dylib(Arch::Aarch64).finish(),
            },
            FakeExecutor::printing(b""),
        );
        assert_eq!(run_case(&case, &ctx).status, CaseStatus::PassBuildOnly);
    }

    #[test]
    fn garbage_artifact_is_malformed_magic() {
        let case = TestCase::executable("hello", mac_arm()).with_source("x");
        let ctx = ctx(
            mac_arm(),
            FakeBuilder {
                image: vec![0x7f, b'E', b'L', b'F'].repeat(16),
            },
            FakeExecutor::printing(b""),
        );
        let outcome = run_case(&case, &ctx);
        assert!(matches!(
            outcome.failure,
            Some(CaseFailure::MalformedContainer { ref field, .. }) if field == "magic"
        ));
    }

    #[test]
    fn build_failure_is_reported() {
        let case = TestCase::executable("hello", linux_x64()).with_source("x");
        let ctx = ctx(linux_x64(), FailingBuilder, FakeExecutor::printing(b""));
        let outcome = run_case(&case, &ctx);
        assert!(matches!(outcome.failure, Some(CaseFailure::Build { ref message }) if message.contains("undefined symbol")));
        assert_eq!(outcome.artifact_sha256, None);
    }

    #[test]
    fn load_commands_on_elf_target_are_rejected() {
        let case = TestCase::executable("hello", linux_x64())
            .with_source("x")
            .expect_load_command(LoadCommand::Rpath { path: "foo".into() });
        let ctx = ctx(
            linux_x64(),
            FakeBuilder { image: b"\x7fELF".to_vec() },
            FakeExecutor::printing(b""),
        );
        assert!(matches!(
            run_case(&case, &ctx).failure,
            Some(CaseFailure::UnsupportedInspection { .. })
        ));
    }

    #[test]
    fn library_is_build_only_even_on_host() {
        let case = TestCase::library("lib", linux_x64()).with_source("x");
        let ctx = ctx(
            linux_x64(),
            FakeBuilder { image: b"\x7fELF".to_vec() },
            FakeExecutor::printing(b""),
        );
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::PassBuildOnly);
        assert_eq!(outcome.skip_reason.as_deref(), Some("not executable"));
    }

    #[test]
    fn emulated_run_records_backend() {
        let target = PlatformDescriptor::new(Arch::Aarch64, Os::Linux, Abi::Gnu);
        let case = TestCase::executable("hello", target)
            .with_source("x")
            .expect_stdout("hi\n");
        let mut ctx = ctx(
            linux_x64(),
            FakeBuilder { image: b"\x7fELF".to_vec() },
            FakeExecutor::printing(b"hi\n"),
        );
        ctx.backends.enable(Backend::Qemu);
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::Pass);
        assert_eq!(outcome.backend, Some(Backend::Qemu));
    }

    #[test]
    fn missing_cross_runtime_is_build_only() {
        let target = PlatformDescriptor::new(Arch::Aarch64, Os::Linux, Abi::Gnu);
        let case = TestCase::executable("mixed", target)
            .with_source("x")
            .with_aux(crate::case::AuxSource {
                name: "foo.c".into(),
                contents: "int foo(void) { return 1; }".into(),
                flags: Vec::new(),
            });
        let mut ctx = ctx(
            linux_x64(),
            FakeBuilder { image: b"\x7fELF".to_vec() },
            FakeExecutor::printing(b""),
        );
        ctx.backends.enable(Backend::Qemu);
        let outcome = run_case(&case, &ctx);
        assert_eq!(outcome.status, CaseStatus::PassBuildOnly);
        assert_eq!(outcome.skip_reason.as_deref(), Some("missing cross runtime (qemu)"));
        assert_eq!(
            SkipReason::MissingCrossRuntime(Backend::Qemu).to_string(),
            "missing cross runtime"
        );
    }

    #[test]
    fn timeout_and_cancel_map_to_failures() {
        let case = TestCase::executable("slow", linux_x64()).with_source("x");
        for (outcome, check) in [
            (
                ProcessOutcome::TimedOut,
                (|f: &CaseFailure| matches!(f, CaseFailure::Timeout { .. })) as fn(&CaseFailure) -> bool,
            ),
            (ProcessOutcome::Cancelled, |f: &CaseFailure| {
                matches!(f, CaseFailure::Cancelled)
            }),
        ] {
            let executor = FakeExecutor { outcome };
            let ctx = ctx(linux_x64(), FakeBuilder { image: b"\x7fELF".to_vec() }, executor);
            let result = run_case(&case, &ctx);
            assert!(check(result.failure.as_ref().unwrap()), "{result}");
        }
    }

    #[test]
    fn stderr_is_compared_too() {
        let case = TestCase::executable("warn", linux_x64()).with_source("x");
        let executor = FakeExecutor {
            outcome: ProcessOutcome::Exited {
                status: 0,
                stdout: Vec::new(),
                stderr: b"warning\n".to_vec(),
            },
        };
        let ctx = ctx(linux_x64(), FakeBuilder { image: b"\x7fELF".to_vec() }, executor);
        assert!(matches!(
            run_case(&case, &ctx).failure,
            Some(CaseFailure::OutputMismatch { ref stream, .. }) if stream == "stderr"
        ));
    }
}
