//! Cross runtime directories.
//!
//! An emulator running a dynamically linked foreign binary needs the target's
//! system libraries. They live under a configured root, one directory per
//! target named `<arch>-<os>-<abi>`. A few architectures use a conventional
//! directory component that differs from their triple name (32-bit x86 is
//! `i686`); those live in an alias table the configuration can extend.

use std::collections::BTreeMap;
use std::path::PathBuf;

use linkcheck_targets::{Arch, PlatformDescriptor};

/// Where target system libraries are found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossRuntime {
    /// Root holding one directory per target.
    pub root: Option<PathBuf>,
    arch_aliases: BTreeMap<Arch, String>,
}

impl Default for CrossRuntime {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CrossRuntime {
    pub fn new(root: Option<PathBuf>) -> Self {
        let mut arch_aliases = BTreeMap::new();
        arch_aliases.insert(Arch::X86, "i686".to_string());
        Self { root, arch_aliases }
    }

    /// Add or replace the directory component used for `arch`.
    pub fn with_alias(mut self, arch: Arch, component: impl Into<String>) -> Self {
        self.arch_aliases.insert(arch, component.into());
        self
    }

    pub fn aliases(&self) -> &BTreeMap<Arch, String> {
        &self.arch_aliases
    }

    /// Directory component naming the target's architecture.
    pub fn arch_component(&self, arch: Arch) -> &str {
        self.arch_aliases
            .get(&arch)
            .map(String::as_str)
            .unwrap_or(arch.name())
    }

    /// Runtime directory for `target`, if a root is configured.
    pub fn dir_for(&self, target: &PlatformDescriptor) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        Some(root.join(format!(
            "{}-{}-{}",
            self.arch_component(target.arch),
            target.os,
            target.abi
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkcheck_targets::{Abi, Os};

    #[test]
    fn no_root_means_no_dir() {
        let rt = CrossRuntime::default();
        let target = PlatformDescriptor::new(Arch::Aarch64, Os::Linux, Abi::Gnu);
        assert_eq!(rt.dir_for(&target), None);
    }

    #[test]
    fn dir_joins_triple_components() {
        let rt = CrossRuntime::new(Some("/opt/glibc".into()));
        let target = PlatformDescriptor::new(Arch::Aarch64, Os::Linux, Abi::Gnu);
        assert_eq!(
            rt.dir_for(&target),
            Some(PathBuf::from("/opt/glibc/aarch64-linux-gnu"))
        );
    }

    #[test]
    fn x86_uses_i686() {
        let rt = CrossRuntime::new(Some("/opt/glibc".into()));
        let target = PlatformDescriptor::new(Arch::X86, Os::Linux, Abi::Gnu);
        assert_eq!(
            rt.dir_for(&target),
            Some(PathBuf::from("/opt/glibc/i686-linux-gnu"))
        );
    }

    #[test]
    fn aliases_are_extensible() {
        let rt = CrossRuntime::new(Some("/r".into())).with_alias(Arch::Arm, "armv7");
        let target = PlatformDescriptor::new(Arch::Arm, Os::Linux, Abi::Gnueabihf);
        assert_eq!(
            rt.dir_for(&target),
            Some(PathBuf::from("/r/armv7-linux-gnueabihf"))
        );
        assert_eq!(rt.arch_component(Arch::X86), "i686");
    }
}
