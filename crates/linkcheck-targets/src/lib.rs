//! Target platform model for linkcheck.
//!
//! A target is identified by three layers: CPU architecture + operating
//! system + ABI = [`PlatformDescriptor`]. The same descriptor type describes
//! both the host running the harness and the target a test case is built for;
//! equality between the two drives the native-vs-foreign execution decision.

pub mod arch;
pub mod error;
pub mod os;
pub mod parse;
pub mod platform;

pub use arch::Arch;
pub use error::{Result, TargetError};
pub use os::{Abi, ObjectFormat, Os};
pub use platform::PlatformDescriptor;
