//! Operating system and ABI layers.
//!
//! Defines the OS a target runs under, the ABI it links against, and the
//! object format its binaries are emitted in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// The operating system of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Os {
    Linux,
    Macos,
    Windows,
    /// WebAssembly System Interface.
    Wasi,
    /// No operating system.
    Freestanding,
}

/// The ABI a target links against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Abi {
    None,
    Gnu,
    Gnueabihf,
    Musl,
    Msvc,
}

/// Binary container format produced for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFormat {
    MachO,
    Elf,
    Pe,
    Wasm,
}

impl Os {
    pub const ALL: &'static [Os] = &[Os::Linux, Os::Macos, Os::Windows, Os::Wasi, Os::Freestanding];

    pub const fn name(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Macos => "macos",
            Os::Windows => "windows",
            Os::Wasi => "wasi",
            Os::Freestanding => "freestanding",
        }
    }

    /// ABI assumed when a triple omits the third component.
    pub const fn default_abi(self) -> Abi {
        match self {
            Os::Linux | Os::Windows => Abi::Gnu,
            Os::Wasi => Abi::Musl,
            Os::Macos | Os::Freestanding => Abi::None,
        }
    }

    /// Object format binaries for this OS are emitted in.
    pub const fn object_format(self) -> ObjectFormat {
        match self {
            Os::Macos => ObjectFormat::MachO,
            Os::Windows => ObjectFormat::Pe,
            Os::Wasi => ObjectFormat::Wasm,
            Os::Linux | Os::Freestanding => ObjectFormat::Elf,
        }
    }
}

impl Abi {
    pub const fn name(self) -> &'static str {
        match self {
            Abi::None => "none",
            Abi::Gnu => "gnu",
            Abi::Gnueabihf => "gnueabihf",
            Abi::Musl => "musl",
            Abi::Msvc => "msvc",
        }
    }

    /// Whether binaries built for this ABI load the system C library
    /// dynamically when they link against it.
    pub const fn links_dynamic_libc(self) -> bool {
        matches!(self, Abi::Gnu | Abi::Gnueabihf)
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Os {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linux" => Ok(Os::Linux),
            "macos" | "darwin" => Ok(Os::Macos),
            "windows" => Ok(Os::Windows),
            "wasi" => Ok(Os::Wasi),
            "freestanding" => Ok(Os::Freestanding),
            other => Err(TargetError::UnknownComponent {
                component: "operating system",
                value: other.to_string(),
                triple: other.to_string(),
            }),
        }
    }
}

impl FromStr for Abi {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Abi::None),
            "gnu" => Ok(Abi::Gnu),
            "gnueabihf" => Ok(Abi::Gnueabihf),
            "musl" => Ok(Abi::Musl),
            "msvc" => Ok(Abi::Msvc),
            other => Err(TargetError::UnknownComponent {
                component: "ABI",
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
    fn default_abis() {
        assert_eq!(Os::Linux.default_abi(), Abi::Gnu);
        assert_eq!(Os::Macos.default_abi(), Abi::None);
        assert_eq!(Os::Wasi.default_abi(), Abi::Musl);
    }

    #[test]
    fn object_formats() {
        assert_eq!(Os::Macos.object_format(), ObjectFormat::MachO);
        assert_eq!(Os::Linux.object_format(), ObjectFormat::Elf);
        assert_eq!(Os::Windows.object_format(), ObjectFormat::Pe);
    }

    #[test]
    fn dynamic_libc() {
        assert!(Abi::Gnu.links_dynamic_libc());
        assert!(Abi::Gnueabihf.links_dynamic_libc());
        assert!(!Abi::Musl.links_dynamic_libc());
        assert!(!Abi::None.links_dynamic_libc());
    }

    #[test]
    fn darwin_alias() {
        assert_eq!("darwin".parse::<Os>().unwrap(), Os::Macos);
        assert!("plan9".parse::<Os>().is_err());
    }
}
