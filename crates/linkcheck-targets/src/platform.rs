//! Complete platform descriptor.
//!
//! Composes architecture + OS + ABI into the value that identifies both the
//! host and every test-case target.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::error::{Result, TargetError};
use crate::os::{Abi, ObjectFormat, Os};

/// A platform identified by CPU architecture, operating system, and ABI.
///
/// Serializes as its triple string (`aarch64-macos-none`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformDescriptor {
    pub arch: Arch,
    pub os: Os,
    pub abi: Abi,
}

impl PlatformDescriptor {
    /// Compose a descriptor from its three layers.
    pub const fn new(arch: Arch, os: Os, abi: Abi) -> Self {
        Self { arch, os, abi }
    }

    /// Compose a descriptor using the OS default ABI.
    pub const fn with_default_abi(arch: Arch, os: Os) -> Self {
        Self::new(arch, os, os.default_abi())
    }

    /// Detect the platform the current process is running on.
    pub fn host() -> Result<Self> {
        let arch: Arch = std::env::consts::ARCH
            .parse()
            .map_err(|_| TargetError::UnsupportedHost {
                detail: format!("architecture '{}'", std::env::consts::ARCH),
            })?;
        let os: Os = std::env::consts::OS
            .parse()
            .map_err(|_| TargetError::UnsupportedHost {
                detail: format!("operating system '{}'", std::env::consts::OS),
            })?;
        let abi = if cfg!(target_env = "musl") {
            Abi::Musl
        } else if cfg!(target_env = "msvc") {
            Abi::Msvc
        } else if cfg!(all(target_env = "gnu", target_arch = "arm")) {
            Abi::Gnueabihf
        } else if cfg!(target_env = "gnu") {
            Abi::Gnu
        } else {
            os.default_abi()
        };
        Ok(Self::new(arch, os, abi))
    }

    /// Object format binaries for this platform are emitted in.
    pub const fn object_format(&self) -> ObjectFormat {
        self.os.object_format()
    }

    /// Word size in bits.
    pub const fn word_size(&self) -> u32 {
        self.arch.word_size()
    }

    /// Platforms the harness ships knowledge of.
    pub fn builtin() -> Vec<PlatformDescriptor> {
        vec![
            Self::new(Arch::X86_64, Os::Linux, Abi::Gnu),
            Self::new(Arch::X86_64, Os::Linux, Abi::Musl),
            Self::new(Arch::X86, Os::Linux, Abi::Gnu),
            Self::new(Arch::Aarch64, Os::Linux, Abi::Gnu),
            Self::new(Arch::Aarch64, Os::Linux, Abi::Musl),
            Self::new(Arch::Arm, Os::Linux, Abi::Gnueabihf),
            Self::new(Arch::Riscv64, Os::Linux, Abi::Gnu),
            Self::new(Arch::X86_64, Os::Macos, Abi::None),
            Self::new(Arch::Aarch64, Os::Macos, Abi::None),
            Self::new(Arch::X86_64, Os::Windows, Abi::Gnu),
            Self::new(Arch::X86, Os::Windows, Abi::Gnu),
            Self::new(Arch::Wasm32, Os::Wasi, Abi::Musl),
        ]
    }
}

impl fmt::Display for PlatformDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.os, self.abi)
    }
}

impl From<PlatformDescriptor> for String {
    fn from(p: PlatformDescriptor) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for PlatformDescriptor {
    type Error = TargetError;

    fn try_from(s: String) -> Result<Self> {
        crate::parse::parse_triple(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_full_triple() {
        let p = PlatformDescriptor::new(Arch::Aarch64, Os::Macos, Abi::None);
        assert_eq!(p.to_string(), "aarch64-macos-none");
    }

    #[test]
    fn default_abi_composition() {
        let p = PlatformDescriptor::with_default_abi(Arch::X86_64, Os::Linux);
        assert_eq!(p.abi, Abi::Gnu);
    }

    #[test]
    fn host_is_detectable() {
        // CI hosts are all in the supported set.
        let host = PlatformDescriptor::host().unwrap();
        assert_eq!(host.os.name(), std::env::consts::OS);
    }

    #[test]
    fn builtin_targets_are_unique() {
        let all = PlatformDescriptor::builtin();
        let mut sorted = all.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), all.len());
    }

    #[test]
    fn serde_as_string() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            target: PlatformDescriptor,
        }
        let w: Wrapper = toml::from_str(r#"target = "x86_64-linux-musl""#).unwrap();
        assert_eq!(w.target, PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Musl));
        let out = toml::to_string(&w).unwrap();
        assert!(out.contains("x86_64-linux-musl"));
    }
}
