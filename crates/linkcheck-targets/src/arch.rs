//! CPU architecture layer.
//!
//! Names the instruction set a target is built for, along with the handful
//! of per-architecture facts the harness needs: word size, the Mach-O CPU
//! type code, and the name of the matching user-mode emulator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// A CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86.
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    /// 32-bit ARM.
    #[serde(rename = "arm")]
    Arm,
    #[serde(rename = "aarch64")]
    Aarch64,
    #[serde(rename = "riscv64")]
    Riscv64,
    #[serde(rename = "wasm32")]
    Wasm32,
}

/// Mach-O `CPU_ARCH_ABI64` flag.
const CPU_ARCH_ABI64: u32 = 0x0100_0000;

impl Arch {
    /// All known architectures.
    pub const ALL: &'static [Arch] = &[
        Arch::X86,
        Arch::X86_64,
        Arch::Arm,
        Arch::Aarch64,
        Arch::Riscv64,
        Arch::Wasm32,
    ];

    /// Canonical tag used in target triples.
    pub const fn name(self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
            Arch::Arm => "arm",
            Arch::Aarch64 => "aarch64",
            Arch::Riscv64 => "riscv64",
            Arch::Wasm32 => "wasm32",
        }
    }

    /// Native word size in bits.
    pub const fn word_size(self) -> u32 {
        match self {
            Arch::X86 | Arch::Arm | Arch::Wasm32 => 32,
            Arch::X86_64 | Arch::Aarch64 | Arch::Riscv64 => 64,
        }
    }

    /// Whether this is one of the x86 family.
    pub const fn is_x86(self) -> bool {
        matches!(self, Arch::X86 | Arch::X86_64)
    }

    /// The Mach-O `cputype` value for this architecture, if Mach-O supports it.
    pub const fn macho_cpu_type(self) -> Option<u32> {
        match self {
            Arch::X86 => Some(7),
            Arch::X86_64 => Some(7 | CPU_ARCH_ABI64),
            Arch::Arm => Some(12),
            Arch::Aarch64 => Some(12 | CPU_ARCH_ABI64),
            Arch::Riscv64 | Arch::Wasm32 => None,
        }
    }

    /// Map a Mach-O `cputype` value back to an architecture.
    pub fn from_macho_cpu_type(cpu_type: u32) -> Option<Arch> {
        Self::ALL
            .iter()
            .copied()
            .find(|arch| arch.macho_cpu_type() == Some(cpu_type))
    }

    /// Suffix of the QEMU user-mode emulator binary (`qemu-<suffix>`).
    pub const fn qemu_suffix(self) -> Option<&'static str> {
        match self {
            Arch::X86 => Some("i386"),
            Arch::X86_64 => Some("x86_64"),
            Arch::Arm => Some("arm"),
            Arch::Aarch64 => Some("aarch64"),
            Arch::Riscv64 => Some("riscv64"),
            Arch::Wasm32 => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x86" | "i386" | "i686" => Ok(Arch::X86),
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "arm" => Ok(Arch::Arm),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            "riscv64" => Ok(Arch::Riscv64),
            "wasm32" => Ok(Arch::Wasm32),
            other => Err(TargetError::UnknownComponent {
                component: "architecture",
                value: other.to_string(),
                triple: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for arch in Arch::ALL {
            assert_eq!(arch.name().parse::<Arch>().unwrap(), *arch);
        }
    }

    #[test]
    fn aliases_parse() {
        assert_eq!("arm64".parse::<Arch>().unwrap(), Arch::Aarch64);
        assert_eq!("i686".parse::<Arch>().unwrap(), Arch::X86);
        assert!("sparc".parse::<Arch>().is_err());
    }

    #[test]
    fn macho_cpu_types() {
        assert_eq!(Arch::X86_64.macho_cpu_type(), Some(0x0100_0007));
        assert_eq!(Arch::Aarch64.macho_cpu_type(), Some(0x0100_000C));
        assert_eq!(Arch::from_macho_cpu_type(0x0100_000C), Some(Arch::Aarch64));
        assert_eq!(Arch::from_macho_cpu_type(0xDEAD), None);
        assert_eq!(Arch::Wasm32.macho_cpu_type(), None);
    }

    #[test]
    fn word_sizes() {
        assert_eq!(Arch::X86.word_size(), 32);
        assert_eq!(Arch::Aarch64.word_size(), 64);
    }
}
