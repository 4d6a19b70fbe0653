//! In-memory container images for tests.
//!
//! Only compiled for this crate's tests or with the `test-fixtures` feature.

use linkcheck_targets::Arch;

use crate::command::*;
use crate::header::{HEADER_SIZE, MH_MAGIC_64};

/// Assembles a minimal Mach-O image from load commands.
#[derive(Debug, Clone)]
pub struct ContainerWriter {
    cpu_type: u32,
    file_type: u32,
    records: Vec<Vec<u8>>,
}

impl ContainerWriter {
    pub fn executable(arch: Arch) -> Self {
        Self::new(arch, 0x2)
    }

    pub fn dylib(arch: Arch) -> Self {
        Self::new(arch, 0x6)
    }

    fn new(arch: Arch, file_type: u32) -> Self {
        Self {
            cpu_type: arch.macho_cpu_type().unwrap_or(0),
            file_type,
            records: Vec::new(),
        }
    }

    /// Append a raw record with an arbitrary `cmd` code.
    pub fn raw(mut self, cmd: u32, payload: &[u8]) -> Self {
        self.records.push(record(cmd, payload.to_vec()));
        self
    }

    /// Append an encoded load command.
    pub fn command(mut self, command: &LoadCommand) -> Self {
        self.records.push(encode(command));
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let sizeofcmds: usize = self.records.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(HEADER_SIZE + sizeofcmds);
        for v in [
            MH_MAGIC_64,
            self.cpu_type,
            0,
            self.file_type,
            self.records.len() as u32,
            sizeofcmds as u32,
            0x0020_0085,
            0,
        ] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for r in self.records {
            out.extend_from_slice(&r);
        }
        out
    }
}

fn record(cmd: u32, mut payload: Vec<u8>) -> Vec<u8> {
    while (payload.len() + 8) % 8 != 0 {
        payload.push(0);
    }
    let mut out = Vec::with_capacity(payload.len() + 8);
    out.extend_from_slice(&cmd.to_le_bytes());
    out.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

fn put32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_name(buf: &mut Vec<u8>, name: &str) {
    let mut field = [0u8; 16];
    let n = name.len().min(16);
    field[..n].copy_from_slice(&name.as_bytes()[..n]);
    buf.extend_from_slice(&field);
}

/// Fixed fields followed by an `lc_str` placed right after them.
fn with_string(mut fixed: Vec<u8>, s: &str) -> Vec<u8> {
    fixed.extend_from_slice(s.as_bytes());
    fixed.push(0);
    fixed
}

fn encode(command: &LoadCommand) -> Vec<u8> {
    let cmd = command.cmd();
    let mut p = Vec::new();
    match command {
        LoadCommand::Segment64 {
            name,
            vmaddr,
            vmsize,
            fileoff,
            filesize,
            maxprot,
            initprot,
            flags,
            sections,
        } => {
            put_name(&mut p, name);
            put64(&mut p, *vmaddr);
            put64(&mut p, *vmsize);
            put64(&mut p, *fileoff);
            put64(&mut p, *filesize);
            put32(&mut p, *maxprot);
            put32(&mut p, *initprot);
            put32(&mut p, sections.len() as u32);
            put32(&mut p, *flags);
            for s in sections {
                put_name(&mut p, &s.name);
                put_name(&mut p, &s.segment);
                put64(&mut p, s.addr);
                put64(&mut p, s.size);
                put32(&mut p, s.offset);
                put32(&mut p, s.align);
                put32(&mut p, 0);
                put32(&mut p, 0);
                put32(&mut p, s.flags);
                put32(&mut p, 0);
                put32(&mut p, 0);
                put32(&mut p, 0);
            }
        }
        LoadCommand::Symtab {
            symoff,
            nsyms,
            stroff,
            strsize,
        } => {
            for v in [*symoff, *nsyms, *stroff, *strsize] {
                put32(&mut p, v);
            }
        }
        LoadCommand::Dysymtab {
            nlocalsym,
            nextdefsym,
            nundefsym,
        } => {
            let mut fields = [0u32; 18];
            fields[1] = *nlocalsym;
            fields[3] = *nextdefsym;
            fields[5] = *nundefsym;
            for v in fields {
                put32(&mut p, v);
            }
        }
        LoadCommand::LoadDylib(d)
        | LoadCommand::LoadWeakDylib(d)
        | LoadCommand::ReexportDylib(d)
        | LoadCommand::IdDylib(d) => {
            for v in [24, d.timestamp, d.current_version.0, d.compatibility_version.0] {
                put32(&mut p, v);
            }
            p = with_string(p, &d.name);
        }
        LoadCommand::LoadDylinker { name } => {
            put32(&mut p, 12);
            p = with_string(p, name);
        }
        LoadCommand::Uuid { uuid } => p.extend_from_slice(uuid),
        LoadCommand::Rpath { path } => {
            put32(&mut p, 12);
            p = with_string(p, path);
        }
        LoadCommand::CodeSignature(d)
        | LoadCommand::FunctionStarts(d)
        | LoadCommand::DataInCode(d)
        | LoadCommand::DyldExportsTrie(d)
        | LoadCommand::DyldChainedFixups(d) => {
            put32(&mut p, d.data_offset);
            put32(&mut p, d.data_size);
        }
        LoadCommand::DyldInfoOnly {
            rebase_size,
            bind_size,
            weak_bind_size,
            lazy_bind_size,
            export_size,
        } => {
            for size in [
                *rebase_size,
                *bind_size,
                *weak_bind_size,
                *lazy_bind_size,
                *export_size,
            ] {
                put32(&mut p, 0);
                put32(&mut p, size);
            }
        }
        LoadCommand::Main {
            entryoff,
            stacksize,
        } => {
            put64(&mut p, *entryoff);
            put64(&mut p, *stacksize);
        }
        LoadCommand::SourceVersion { version } => put64(&mut p, *version),
        LoadCommand::BuildVersion {
            platform,
            minos,
            sdk,
            tools,
        } => {
            for v in [*platform, minos.0, sdk.0, tools.len() as u32] {
                put32(&mut p, v);
            }
            for t in tools {
                put32(&mut p, t.tool);
                put32(&mut p, t.version.0);
            }
        }
        LoadCommand::Unknown { data, .. } => p.extend_from_slice(data),
    }
    record(cmd, p)
}
