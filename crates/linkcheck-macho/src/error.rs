//! Container inspection errors.

use std::io;

use thiserror::Error;

use crate::command::LoadCommand;

/// A container that could not be read as a supported Mach-O file.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("file too small to hold a Mach-O header ({len} bytes)")]
    FileTooSmall { len: usize },

    #[error("invalid magic 0x{found:08x}: not a Mach-O file")]
    InvalidMagic { found: u32 },

    #[error("unsupported word size: 32-bit Mach-O (magic 0x{found:08x})")]
    UnsupportedWordSize { found: u32 },

    #[error("unsupported byte order: big-endian Mach-O (magic 0x{found:08x})")]
    UnsupportedByteOrder { found: u32 },

    #[error("unsupported file type {filetype}: expected MH_EXECUTE (2) or MH_DYLIB (6)")]
    UnsupportedFileType { filetype: u32 },

    #[error("load commands region ({sizeofcmds} bytes) runs past end of file ({len} bytes)")]
    CommandsOverrun { sizeofcmds: u32, len: usize },

    #[error("load command {index} (0x{cmd:x}) declares cmdsize {cmdsize}, smaller than its 8-byte header")]
    CommandSizeTooSmall { index: u32, cmd: u32, cmdsize: u32 },

    #[error("load command {index} at offset {offset} declares cmdsize {cmdsize} but only {available} bytes remain")]
    TruncatedCommand {
        index: u32,
        offset: usize,
        cmdsize: u32,
        available: usize,
    },

    #[error("load command {index} (0x{cmd:x}) needs {needed} bytes but declares cmdsize {cmdsize}")]
    PayloadOverrun {
        index: u32,
        cmd: u32,
        needed: usize,
        cmdsize: u32,
    },

    #[error("load command {index} (0x{cmd:x}) has string offset {offset} outside its {cmdsize}-byte record")]
    BadStringOffset {
        index: u32,
        cmd: u32,
        offset: u32,
        cmdsize: u32,
    },

    #[error("cputype 0x{found:08x} does not match target architecture {expected}")]
    CpuTypeMismatch { expected: String, found: u32 },

    #[error("file type {found} does not match the expected {expected}")]
    FileTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl ContainerError {
    /// The header or record field that made the container unreadable.
    pub fn field(&self) -> &'static str {
        match self {
            ContainerError::Io(_) => "file",
            ContainerError::FileTooSmall { .. } => "header",
            ContainerError::InvalidMagic { .. }
            | ContainerError::UnsupportedWordSize { .. }
            | ContainerError::UnsupportedByteOrder { .. } => "magic",
            ContainerError::UnsupportedFileType { .. }
            | ContainerError::FileTypeMismatch { .. } => "filetype",
            ContainerError::CommandsOverrun { .. } => "sizeofcmds",
            ContainerError::CommandSizeTooSmall { .. }
            | ContainerError::TruncatedCommand { .. }
            | ContainerError::PayloadOverrun { .. } => "cmdsize",
            ContainerError::BadStringOffset { .. } => "lc_str",
            ContainerError::CpuTypeMismatch { .. } => "cputype",
        }
    }
}

/// An expected load command had no structural match in the container.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("missing expected load command: {dump}")]
    MissingExpectedLoadCommand {
        expected: Box<LoadCommand>,
        dump: String,
    },
}
