//! Mach-O header parsing.

use std::fmt;

use linkcheck_targets::Arch;
use serde::Serialize;

use crate::error::ContainerError;

/// 64-bit Mach-O magic as read little-endian.
pub const MH_MAGIC_64: u32 = 0xfeed_facf;
/// 64-bit magic with the opposite byte order.
const MH_CIGAM_64: u32 = 0xcffa_edfe;
/// 32-bit Mach-O magic, either byte order.
const MH_MAGIC: u32 = 0xfeed_face;
const MH_CIGAM: u32 = 0xcefa_edfe;

/// Size of `mach_header_64`.
pub const HEADER_SIZE: usize = 32;

const MH_EXECUTE: u32 = 0x2;
const MH_DYLIB: u32 = 0x6;

/// The two container kinds the inspector accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    Executable,
    DynamicLibrary,
}

impl FileType {
    fn from_raw(filetype: u32) -> Result<Self, ContainerError> {
        match filetype {
            MH_EXECUTE => Ok(FileType::Executable),
            MH_DYLIB => Ok(FileType::DynamicLibrary),
            other => Err(ContainerError::UnsupportedFileType { filetype: other }),
        }
    }

    /// The `MH_*` constant name.
    pub fn name(self) -> &'static str {
        match self {
            FileType::Executable => "MH_EXECUTE",
            FileType::DynamicLibrary => "MH_DYLIB",
        }
    }
}

/// Parsed `mach_header_64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    pub magic: u32,
    pub cpu_type: u32,
    pub cpu_subtype: u32,
    pub file_type: FileType,
    pub command_count: u32,
    pub commands_size: u32,
    pub flags: u32,
}

impl ContainerHeader {
    /// Word size in bits. Only 64-bit containers parse.
    pub fn word_size(&self) -> u32 {
        64
    }

    /// The architecture named by `cputype`, if known.
    pub fn arch(&self) -> Option<Arch> {
        Arch::from_macho_cpu_type(self.cpu_type)
    }

    /// Parse the fixed header from the start of `data`.
    pub(crate) fn parse(data: &[u8]) -> Result<Self, ContainerError> {
        if data.len() < HEADER_SIZE {
            return Err(ContainerError::FileTooSmall { len: data.len() });
        }

        let word = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);

        let magic = word(0);
        match magic {
            MH_MAGIC_64 => {}
            MH_CIGAM_64 => return Err(ContainerError::UnsupportedByteOrder { found: magic }),
            MH_MAGIC | MH_CIGAM => return Err(ContainerError::UnsupportedWordSize { found: magic }),
            other => return Err(ContainerError::InvalidMagic { found: other }),
        }

        let file_type = FileType::from_raw(word(12))?;
        let header = Self {
            magic,
            cpu_type: word(4),
            cpu_subtype: word(8),
            file_type,
            command_count: word(16),
            commands_size: word(20),
            flags: word(24),
        };

        let needed = HEADER_SIZE.saturating_add(header.commands_size as usize);
        if needed > data.len() {
            return Err(ContainerError::CommandsOverrun {
                sizeofcmds: header.commands_size,
                len: data.len(),
            });
        }

        Ok(header)
    }
}

impl fmt::Display for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arch = self
            .arch()
            .map(|a| a.to_string())
            .unwrap_or_else(|| format!("cputype 0x{:x}", self.cpu_type));
        write!(
            f,
            "{} {} ({}-bit), {} load commands ({} bytes), flags 0x{:08x}",
            self.file_type.name(),
            arch,
            self.word_size(),
            self.command_count,
            self.commands_size,
            self.flags
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_header(magic: u32, filetype: u32) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [magic, 0x0100_000C, 0, filetype, 0, 0, 0x0020_0085, 0] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    #[test]
    fn parses_executable_header() {
        let h = ContainerHeader::parse(&raw_header(MH_MAGIC_64, MH_EXECUTE)).unwrap();
        assert_eq!(h.file_type, FileType::Executable);
        assert_eq!(h.arch(), Some(Arch::Aarch64));
        assert_eq!(h.command_count, 0);
    }

    #[test]
    fn parses_dylib_header() {
        let h = ContainerHeader::parse(&raw_header(MH_MAGIC_64, MH_DYLIB)).unwrap();
        assert_eq!(h.file_type, FileType::DynamicLibrary);
    }

    #[test]
    fn rejects_object_file_type() {
        // MH_OBJECT
        let err = ContainerHeader::parse(&raw_header(MH_MAGIC_64, 0x1)).unwrap_err();
        assert!(matches!(err, ContainerError::UnsupportedFileType { filetype: 1 }));
        assert_eq!(err.field(), "filetype");
    }

    #[test]
    fn rejects_32_bit() {
        let err = ContainerHeader::parse(&raw_header(MH_MAGIC, MH_EXECUTE)).unwrap_err();
        assert!(matches!(err, ContainerError::UnsupportedWordSize { .. }));
        assert_eq!(err.field(), "magic");
    }

    #[test]
    fn rejects_big_endian() {
        let err = ContainerHeader::parse(&raw_header(MH_CIGAM_64, MH_EXECUTE)).unwrap_err();
        assert!(matches!(err, ContainerError::UnsupportedByteOrder { .. }));
    }

    #[test]
    fn rejects_elf() {
        let mut data = raw_header(0, MH_EXECUTE);
        data[..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
        let err = ContainerHeader::parse(&data).unwrap_err();
        assert!(matches!(err, ContainerError::InvalidMagic { .. }));
    }

    #[test]
    fn rejects_short_file() {
        let err = ContainerHeader::parse(&[0xcf, 0xfa, 0xed, 0xfe]).unwrap_err();
        assert!(matches!(err, ContainerError::FileTooSmall { len: 4 }));
    }

    #[test]
    fn rejects_oversized_command_region() {
        let mut data = raw_header(MH_MAGIC_64, MH_EXECUTE);
        data[20..24].copy_from_slice(&64u32.to_le_bytes());
        let err = ContainerHeader::parse(&data).unwrap_err();
        assert!(matches!(err, ContainerError::CommandsOverrun { sizeofcmds: 64, .. }));
    }
}
