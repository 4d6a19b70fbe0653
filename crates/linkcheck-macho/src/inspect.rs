//! Sequential load-command walk.

use std::fs;
use std::path::Path;

use linkcheck_targets::Arch;
use tracing::debug;

use crate::command::LoadCommand;
use crate::error::ContainerError;
use crate::header::{ContainerHeader, FileType, HEADER_SIZE};

/// One load command together with where it sat in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Byte offset of the record from the start of the file.
    pub offset: usize,
    /// Declared `cmdsize`, header included.
    pub cmdsize: u32,
    pub command: LoadCommand,
}

/// A parsed container: header plus its load commands in file order.
#[derive(Debug, Clone)]
pub struct Container {
    pub header: ContainerHeader,
    pub records: Vec<Record>,
}

impl Container {
    /// Parse a container from an in-memory image.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ContainerError> {
        let header = ContainerHeader::parse(data)?;
        let region_end = HEADER_SIZE + header.commands_size as usize;

        let mut records = Vec::with_capacity(header.command_count.min(1024) as usize);
        let mut offset = HEADER_SIZE;
        for index in 0..header.command_count {
            let available = region_end.saturating_sub(offset);
            if available < 8 {
                return Err(ContainerError::TruncatedCommand {
                    index,
                    offset,
                    cmdsize: 0,
                    available,
                });
            }
            let cmd = read_u32(data, offset);
            let cmdsize = read_u32(data, offset + 4);
            if cmdsize < 8 {
                return Err(ContainerError::CommandSizeTooSmall { index, cmd, cmdsize });
            }
            if cmdsize as usize > available {
                return Err(ContainerError::TruncatedCommand {
                    index,
                    offset,
                    cmdsize,
                    available,
                });
            }

            let end = offset + cmdsize as usize;
            let command = LoadCommand::decode(index, &data[offset..end])?;
            debug!(index, offset, cmdsize, command = %command, "load command");
            records.push(Record {
                offset,
                cmdsize,
                command,
            });
            offset = end;
        }

        Ok(Self { header, records })
    }

    /// The load commands in file order.
    pub fn commands(&self) -> impl Iterator<Item = &LoadCommand> {
        self.records.iter().map(|r| &r.command)
    }

    /// Reject a container whose `cputype` is not the expected architecture.
    pub fn check_arch(&self, expected: Arch) -> Result<(), ContainerError> {
        if self.header.arch() == Some(expected) {
            Ok(())
        } else {
            Err(ContainerError::CpuTypeMismatch {
                expected: expected.to_string(),
                found: self.header.cpu_type,
            })
        }
    }

    /// Reject a container of the wrong kind, e.g. a dylib where an
    /// executable was built.
    pub fn check_file_type(&self, expected: FileType) -> Result<(), ContainerError> {
        if self.header.file_type == expected {
            Ok(())
        } else {
            Err(ContainerError::FileTypeMismatch {
                expected: expected.name(),
                found: self.header.file_type.name(),
            })
        }
    }
}

/// Read and parse the container at `path`.
pub fn inspect(path: &Path) -> Result<Container, ContainerError> {
    let data = fs::read(path)?;
    let container = Container::from_bytes(&data)?;
    debug!(
        path = %path.display(),
        header = %container.header,
        "inspected container"
    );
    Ok(container)
}

fn read_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}
