//! Error types for target platform operations.

use std::path::PathBuf;

/// Errors that can occur during target platform operations.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error reading target list files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Target list file not found.
    #[error("target file not found: {}", path.display())]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// A triple component did not name a known architecture, OS, or ABI.
    #[error("unknown {component} '{value}' in target '{triple}'")]
    UnknownComponent {
        /// Which layer failed ("architecture", "operating system", "ABI").
        component: &'static str,
        /// The offending component text.
        value: String,
        /// The full triple being parsed.
        triple: String,
    },

    /// The triple did not have two or three dash-separated components.
    #[error("malformed target '{triple}': expected <arch>-<os>[-<abi>]")]
    MalformedTriple {
        /// The full triple being parsed.
        triple: String,
    },

    /// The running host is not representable as a descriptor.
    #[error("unsupported host: {detail}")]
    UnsupportedHost {
        /// What could not be mapped.
        detail: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
