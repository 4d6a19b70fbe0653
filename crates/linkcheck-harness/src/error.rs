//! Harness errors.
//!
//! These cover loading suites. Problems while running a case never surface
//! here; they become a failed [`crate::CaseOutcome`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid suite {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("case '{case}' in {origin}: {message}")]
    InvalidCase {
        origin: String,
        case: String,
        message: String,
    },

    #[error("duplicate case name '{case}' in {origin}")]
    DuplicateCase { origin: String, case: String },
}

pub type Result<T> = std::result::Result<T, HarnessError>;
