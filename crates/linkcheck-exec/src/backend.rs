//! Execution backends and their enable toggles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An external program able to run a foreign binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// User-mode QEMU, for Linux binaries of another architecture or ABI.
    Qemu,
    /// Wine, for Windows binaries on a Linux host.
    Wine,
    /// Wasmtime, for WASI modules.
    Wasmtime,
    /// Darling, for macOS binaries on a Linux host of the same architecture.
    Darling,
    /// Rosetta 2, for x86_64 macOS binaries on Apple silicon.
    Rosetta,
}

impl Backend {
    pub const ALL: &'static [Backend] = &[
        Backend::Qemu,
        Backend::Wine,
        Backend::Wasmtime,
        Backend::Darling,
        Backend::Rosetta,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Qemu => "qemu",
            Backend::Wine => "wine",
            Backend::Wasmtime => "wasmtime",
            Backend::Darling => "darling",
            Backend::Rosetta => "rosetta",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-backend enable toggles. Everything is off unless turned on.
///
/// Deserializes from the `[backends]` table of `linkcheck.toml`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub qemu: bool,
    pub wine: bool,
    pub wasmtime: bool,
    pub darling: bool,
    pub rosetta: bool,
}

impl BackendConfig {
    pub const fn all_disabled() -> Self {
        Self {
            qemu: false,
            wine: false,
            wasmtime: false,
            darling: false,
            rosetta: false,
        }
    }

    pub const fn all_enabled() -> Self {
        Self {
            qemu: true,
            wine: true,
            wasmtime: true,
            darling: true,
            rosetta: true,
        }
    }

    pub const fn is_enabled(&self, backend: Backend) -> bool {
        match backend {
            Backend::Qemu => self.qemu,
            Backend::Wine => self.wine,
            Backend::Wasmtime => self.wasmtime,
            Backend::Darling => self.darling,
            Backend::Rosetta => self.rosetta,
        }
    }

    pub fn enable(&mut self, backend: Backend) {
        match backend {
            Backend::Qemu => self.qemu = true,
            Backend::Wine => self.wine = true,
            Backend::Wasmtime => self.wasmtime = true,
            Backend::Darling => self.darling = true,
            Backend::Rosetta => self.rosetta = true,
        }
    }

    /// Backends currently switched on, in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = Backend> + '_ {
        Backend::ALL.iter().copied().filter(|b| self.is_enabled(*b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_disabled() {
        assert_eq!(BackendConfig::default(), BackendConfig::all_disabled());
        assert_eq!(BackendConfig::default().enabled().count(), 0);
    }

    #[test]
    fn enable_flips_one_toggle() {
        let mut config = BackendConfig::default();
        config.enable(Backend::Wine);
        assert!(config.is_enabled(Backend::Wine));
        assert_eq!(config.enabled().collect::<Vec<_>>(), vec![Backend::Wine]);
    }

    #[test]
    fn parses_backends_table() {
        let config: BackendConfig = toml::from_str("qemu = true\nwasmtime = true\n").unwrap();
        assert!(config.qemu && config.wasmtime);
        assert!(!config.wine && !config.darling && !config.rosetta);
    }

    #[test]
    fn rejects_unknown_backend() {
        assert!(toml::from_str::<BackendConfig>("box64 = true\n").is_err());
    }
}
