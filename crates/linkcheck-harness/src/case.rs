//! Test case model.

use linkcheck_exec::{ArtifactKind, ArtifactProfile};
use linkcheck_macho::LoadCommand;
use linkcheck_targets::PlatformDescriptor;
use serde::{Deserialize, Serialize};

/// An extra compiled unit in a language other than the toolchain's own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuxSource {
    /// File name, extension included (`foo.c`).
    pub name: String,
    pub contents: String,
    /// Compile flags for this unit only.
    #[serde(default)]
    pub flags: Vec<String>,
}

/// What a successful run must produce.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedOutcome {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Each must be present in the artifact's load commands.
    pub load_commands: Vec<LoadCommand>,
}

/// One build-inspect-run check against one target.
///
/// Cases are built once and then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    pub name: String,
    pub target: PlatformDescriptor,
    pub kind: ArtifactKind,
    /// Source in the toolchain's native language.
    pub source: Option<String>,
    pub aux: Vec<AuxSource>,
    pub link_flags: Vec<String>,
    pub expected: ExpectedOutcome,
}

impl TestCase {
    pub fn new(name: impl Into<String>, target: PlatformDescriptor, kind: ArtifactKind) -> Self {
        Self {
            name: name.into(),
            target,
            kind,
            source: None,
            aux: Vec::new(),
            link_flags: Vec::new(),
            expected: ExpectedOutcome::default(),
        }
    }

    pub fn executable(name: impl Into<String>, target: PlatformDescriptor) -> Self {
        Self::new(name, target, ArtifactKind::Executable)
    }

    pub fn library(name: impl Into<String>, target: PlatformDescriptor) -> Self {
        Self::new(name, target, ArtifactKind::Library)
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_aux(mut self, aux: AuxSource) -> Self {
        self.aux.push(aux);
        self
    }

    pub fn with_link_flag(mut self, flag: impl Into<String>) -> Self {
        self.link_flags.push(flag.into());
        self
    }

    pub fn expect_stdout(mut self, stdout: impl Into<Vec<u8>>) -> Self {
        self.expected.stdout = stdout.into();
        self
    }

    pub fn expect_stderr(mut self, stderr: impl Into<Vec<u8>>) -> Self {
        self.expected.stderr = stderr.into();
        self
    }

    pub fn expect_load_command(mut self, command: LoadCommand) -> Self {
        self.expected.load_commands.push(command);
        self
    }

    /// `<name> (<target>)`, the label used in report lines.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.target)
    }

    /// The facts the execution resolver needs about this case's artifact.
    pub fn artifact_profile(&self) -> ArtifactProfile {
        ArtifactProfile {
            kind: self.kind,
            links_aux_sources: !self.aux.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_targets::{Abi, Arch, Os};

    #[test]
    fn label_includes_target() {
        let case = TestCase::executable(
            "hello",
            PlatformDescriptor::new(Arch::Aarch64, Os::Macos, Abi::None),
        );
        assert_eq!(case.label(), "hello (aarch64-macos-none)");
    }

    #[test]
    fn aux_sources_mark_profile() {
        let target = PlatformDescriptor::new(Arch::Aarch64, Os::Linux, Abi::Gnu);
        let plain = TestCase::executable("a", target);
        assert!(!plain.artifact_profile().links_aux_sources);

        let mixed = plain.with_aux(AuxSource {
            name: "foo.c".into(),
            contents: "int foo(void) { return 1; }\n".into(),
            flags: vec!["-O2".into()],
        });
        assert!(mixed.artifact_profile().links_aux_sources);
        assert_eq!(mixed.artifact_profile().kind, ArtifactKind::Executable);
    }
}
