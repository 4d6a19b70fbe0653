//! Mach-O container inspection for linkcheck.
//!
//! Reads the header and load commands of a 64-bit little-endian Mach-O
//! executable or dynamic library, and checks that a set of expected load
//! commands is present. Nothing here writes containers.
//!
//! ## File Layout
//!
//! ```text
//! Mach-O 64 Layout (as read):
//! ┌──────────────────────────────┐
//! │ magic: 0xfeedfacf            │  4 bytes
//! │ cputype, cpusubtype          │  4 + 4 bytes
//! │ filetype (EXECUTE | DYLIB)   │  4 bytes
//! │ ncmds, sizeofcmds            │  4 + 4 bytes
//! │ flags, reserved              │  4 + 4 bytes
//! ├──────────────────────────────┤
//! │ load command 0               │
//! │   cmd: u32, cmdsize: u32     │
//! │   payload (cmdsize - 8)      │
//! ├──────────────────────────────┤
//! │ ... ncmds records            │
//! ├──────────────────────────────┤
//! │ segment contents (not read)  │
//! └──────────────────────────────┘
//! ```

mod command;
mod error;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixture;
mod header;
mod inspect;
mod verify;

pub use command::{BuildTool, Dylib, LinkeditData, LoadCommand, PackedVersion, Section};
pub use error::{ContainerError, VerifyError};
pub use header::{ContainerHeader, FileType, HEADER_SIZE, MH_MAGIC_64};
pub use inspect::{inspect, Container, Record};
pub use verify::{structurally_eq, verify};
