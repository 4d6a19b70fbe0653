//! Load command model and per-kind payload decoding.
//!
//! Each record is `cmd: u32, cmdsize: u32` followed by a payload whose shape
//! depends on `cmd`. Kinds the harness asserts on are decoded into typed
//! variants; every other code is kept as [`LoadCommand::Unknown`] with its
//! payload bytes untouched, so newer toolchains never break parsing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ContainerError;

pub(crate) const LC_REQ_DYLD: u32 = 0x8000_0000;

pub(crate) const LC_SYMTAB: u32 = 0x2;
pub(crate) const LC_DYSYMTAB: u32 = 0xb;
pub(crate) const LC_LOAD_DYLIB: u32 = 0xc;
pub(crate) const LC_ID_DYLIB: u32 = 0xd;
pub(crate) const LC_LOAD_DYLINKER: u32 = 0xe;
pub(crate) const LC_LOAD_WEAK_DYLIB: u32 = 0x18 | LC_REQ_DYLD;
pub(crate) const LC_SEGMENT_64: u32 = 0x19;
pub(crate) const LC_UUID: u32 = 0x1b;
pub(crate) const LC_RPATH: u32 = 0x1c | LC_REQ_DYLD;
pub(crate) const LC_CODE_SIGNATURE: u32 = 0x1d;
pub(crate) const LC_REEXPORT_DYLIB: u32 = 0x1f | LC_REQ_DYLD;
pub(crate) const LC_DYLD_INFO_ONLY: u32 = 0x22 | LC_REQ_DYLD;
pub(crate) const LC_FUNCTION_STARTS: u32 = 0x26;
pub(crate) const LC_MAIN: u32 = 0x28 | LC_REQ_DYLD;
pub(crate) const LC_DATA_IN_CODE: u32 = 0x29;
pub(crate) const LC_SOURCE_VERSION: u32 = 0x2a;
pub(crate) const LC_BUILD_VERSION: u32 = 0x32;
pub(crate) const LC_DYLD_EXPORTS_TRIE: u32 = 0x33 | LC_REQ_DYLD;
pub(crate) const LC_DYLD_CHAINED_FIXUPS: u32 = 0x34 | LC_REQ_DYLD;

const SEGMENT_64_SIZE: usize = 72;
const SECTION_64_SIZE: usize = 80;

/// A dylib version packed as `xxxx.yy.zz` into 32 bits.
///
/// Written in expectation files as a dotted string (`"1.0.0"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackedVersion(pub u32);

impl PackedVersion {
    pub const fn new(major: u16, minor: u8, patch: u8) -> Self {
        Self(((major as u32) << 16) | ((minor as u32) << 8) | patch as u32)
    }
}

impl fmt::Display for PackedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0 >> 16, (self.0 >> 8) & 0xff, self.0 & 0xff)
    }
}

impl FromStr for PackedVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        let major = parts.next().unwrap_or_default();
        let minor = parts.next().unwrap_or("0");
        let patch = parts.next().unwrap_or("0");
        if parts.next().is_some() {
            return Err(format!("version '{s}' has more than three components"));
        }
        let bad = |_| format!("invalid version '{s}'");
        Ok(Self::new(
            major.parse().map_err(bad)?,
            minor.parse().map_err(bad)?,
            patch.parse().map_err(bad)?,
        ))
    }
}

impl TryFrom<String> for PackedVersion {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PackedVersion> for String {
    fn from(v: PackedVersion) -> Self {
        v.to_string()
    }
}

/// A `section_64` entry inside a segment command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Section {
    pub name: String,
    pub segment: String,
    #[serde(default)]
    pub addr: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub align: u32,
    #[serde(default)]
    pub flags: u32,
}

/// Payload shared by the dylib-referencing commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Dylib {
    pub name: String,
    #[serde(default)]
    pub timestamp: u32,
    pub current_version: PackedVersion,
    pub compatibility_version: PackedVersion,
}

/// Payload of the `linkedit_data_command` family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LinkeditData {
    #[serde(default)]
    pub data_offset: u32,
    #[serde(default)]
    pub data_size: u32,
}

/// One `build_tool_version` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTool {
    pub tool: u32,
    pub version: PackedVersion,
}

/// A decoded load command.
///
/// Expectation files write these as tables tagged by `kind`, e.g.
/// `{ kind = "rpath", path = "@loader_path/../lib" }`. Fields structural
/// comparison ignores (addresses, offsets, sizes, timestamps, UUID bytes,
/// build tools) may be left out. Every compared field is required, so a
/// forgotten one is a parse error rather than an expectation that never
/// matches. A segment's `sections` lists only the sections that must be
/// present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LoadCommand {
    #[serde(rename = "segment")]
    Segment64 {
        name: String,
        #[serde(default)]
        vmaddr: u64,
        #[serde(default)]
        vmsize: u64,
        #[serde(default)]
        fileoff: u64,
        #[serde(default)]
        filesize: u64,
        maxprot: u32,
        initprot: u32,
        flags: u32,
        #[serde(default)]
        sections: Vec<Section>,
    },
    Symtab {
        #[serde(default)]
        symoff: u32,
        #[serde(default)]
        nsyms: u32,
        #[serde(default)]
        stroff: u32,
        #[serde(default)]
        strsize: u32,
    },
    Dysymtab {
        #[serde(default)]
        nlocalsym: u32,
        #[serde(default)]
        nextdefsym: u32,
        #[serde(default)]
        nundefsym: u32,
    },
    LoadDylib(Dylib),
    LoadWeakDylib(Dylib),
    ReexportDylib(Dylib),
    IdDylib(Dylib),
    LoadDylinker {
        name: String,
    },
    Uuid {
        #[serde(default)]
        uuid: [u8; 16],
    },
    Rpath {
        path: String,
    },
    CodeSignature(LinkeditData),
    FunctionStarts(LinkeditData),
    DataInCode(LinkeditData),
    DyldExportsTrie(LinkeditData),
    DyldChainedFixups(LinkeditData),
    DyldInfoOnly {
        #[serde(default)]
        rebase_size: u32,
        #[serde(default)]
        bind_size: u32,
        #[serde(default)]
        weak_bind_size: u32,
        #[serde(default)]
        lazy_bind_size: u32,
        #[serde(default)]
        export_size: u32,
    },
    Main {
        #[serde(default)]
        entryoff: u64,
        stacksize: u64,
    },
    SourceVersion {
        version: u64,
    },
    BuildVersion {
        platform: u32,
        minos: PackedVersion,
        sdk: PackedVersion,
        #[serde(default)]
        tools: Vec<BuildTool>,
    },
    /// A command code this crate does not decode.
    Unknown {
        cmd: u32,
        data: Vec<u8>,
    },
}

impl LoadCommand {
    /// The 32-bit `cmd` code for this command.
    pub fn cmd(&self) -> u32 {
        match self {
            LoadCommand::Segment64 { .. } => LC_SEGMENT_64,
            LoadCommand::Symtab { .. } => LC_SYMTAB,
            LoadCommand::Dysymtab { .. } => LC_DYSYMTAB,
            LoadCommand::LoadDylib(_) => LC_LOAD_DYLIB,
            LoadCommand::LoadWeakDylib(_) => LC_LOAD_WEAK_DYLIB,
            LoadCommand::ReexportDylib(_) => LC_REEXPORT_DYLIB,
            LoadCommand::IdDylib(_) => LC_ID_DYLIB,
            LoadCommand::LoadDylinker { .. } => LC_LOAD_DYLINKER,
            LoadCommand::Uuid { .. } => LC_UUID,
            LoadCommand::Rpath { .. } => LC_RPATH,
            LoadCommand::CodeSignature(_) => LC_CODE_SIGNATURE,
            LoadCommand::FunctionStarts(_) => LC_FUNCTION_STARTS,
            LoadCommand::DataInCode(_) => LC_DATA_IN_CODE,
            LoadCommand::DyldExportsTrie(_) => LC_DYLD_EXPORTS_TRIE,
            LoadCommand::DyldChainedFixups(_) => LC_DYLD_CHAINED_FIXUPS,
            LoadCommand::DyldInfoOnly { .. } => LC_DYLD_INFO_ONLY,
            LoadCommand::Main { .. } => LC_MAIN,
            LoadCommand::SourceVersion { .. } => LC_SOURCE_VERSION,
            LoadCommand::BuildVersion { .. } => LC_BUILD_VERSION,
            LoadCommand::Unknown { cmd, .. } => *cmd,
        }
    }

    /// The `LC_*` constant name, or `None` for unknown codes.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            LoadCommand::Segment64 { .. } => "LC_SEGMENT_64",
            LoadCommand::Symtab { .. } => "LC_SYMTAB",
            LoadCommand::Dysymtab { .. } => "LC_DYSYMTAB",
            LoadCommand::LoadDylib(_) => "LC_LOAD_DYLIB",
            LoadCommand::LoadWeakDylib(_) => "LC_LOAD_WEAK_DYLIB",
            LoadCommand::ReexportDylib(_) => "LC_REEXPORT_DYLIB",
            LoadCommand::IdDylib(_) => "LC_ID_DYLIB",
            LoadCommand::LoadDylinker { .. } => "LC_LOAD_DYLINKER",
            LoadCommand::Uuid { .. } => "LC_UUID",
            LoadCommand::Rpath { .. } => "LC_RPATH",
            LoadCommand::CodeSignature(_) => "LC_CODE_SIGNATURE",
            LoadCommand::FunctionStarts(_) => "LC_FUNCTION_STARTS",
            LoadCommand::DataInCode(_) => "LC_DATA_IN_CODE",
            LoadCommand::DyldExportsTrie(_) => "LC_DYLD_EXPORTS_TRIE",
            LoadCommand::DyldChainedFixups(_) => "LC_DYLD_CHAINED_FIXUPS",
            LoadCommand::DyldInfoOnly { .. } => "LC_DYLD_INFO_ONLY",
            LoadCommand::Main { .. } => "LC_MAIN",
            LoadCommand::SourceVersion { .. } => "LC_SOURCE_VERSION",
            LoadCommand::BuildVersion { .. } => "LC_BUILD_VERSION",
            LoadCommand::Unknown { .. } => return None,
        };
        Some(name)
    }

    /// Decode one record. `record` spans exactly `cmdsize` bytes, header included.
    pub(crate) fn decode(index: u32, record: &[u8]) -> Result<Self, ContainerError> {
        let r = RecordReader { index, record };
        let cmd = r.cmd();

        let command = match cmd {
            LC_SEGMENT_64 => {
                r.require(SEGMENT_64_SIZE)?;
                let nsects = r.u32(64)? as usize;
                r.require(SEGMENT_64_SIZE + nsects.saturating_mul(SECTION_64_SIZE))?;
                let sections = (0..nsects)
                    .map(|i| {
                        let base = SEGMENT_64_SIZE + i * SECTION_64_SIZE;
                        Ok(Section {
                            name: r.fixed_str(base, 16),
                            segment: r.fixed_str(base + 16, 16),
                            addr: r.u64(base + 32)?,
                            size: r.u64(base + 40)?,
                            offset: r.u32(base + 48)?,
                            align: r.u32(base + 52)?,
                            flags: r.u32(base + 64)?,
                        })
                    })
                    .collect::<Result<Vec<_>, ContainerError>>()?;
                LoadCommand::Segment64 {
                    name: r.fixed_str(8, 16),
                    vmaddr: r.u64(24)?,
                    vmsize: r.u64(32)?,
                    fileoff: r.u64(40)?,
                    filesize: r.u64(48)?,
                    maxprot: r.u32(56)?,
                    initprot: r.u32(60)?,
                    flags: r.u32(68)?,
                    sections,
                }
            }
            LC_SYMTAB => {
                r.require(24)?;
                LoadCommand::Symtab {
                    symoff: r.u32(8)?,
                    nsyms: r.u32(12)?,
                    stroff: r.u32(16)?,
                    strsize: r.u32(20)?,
                }
            }
            LC_DYSYMTAB => {
                r.require(80)?;
                LoadCommand::Dysymtab {
                    nlocalsym: r.u32(12)?,
                    nextdefsym: r.u32(20)?,
                    nundefsym: r.u32(28)?,
                }
            }
            LC_LOAD_DYLIB => LoadCommand::LoadDylib(r.dylib()?),
            LC_LOAD_WEAK_DYLIB => LoadCommand::LoadWeakDylib(r.dylib()?),
            LC_REEXPORT_DYLIB => LoadCommand::ReexportDylib(r.dylib()?),
            LC_ID_DYLIB => LoadCommand::IdDylib(r.dylib()?),
            LC_LOAD_DYLINKER => {
                r.require(12)?;
                LoadCommand::LoadDylinker { name: r.lc_str(8)? }
            }
            LC_UUID => {
                r.require(24)?;
                let mut uuid = [0u8; 16];
                uuid.copy_from_slice(&record[8..24]);
                LoadCommand::Uuid { uuid }
            }
            LC_RPATH => {
                r.require(12)?;
                LoadCommand::Rpath { path: r.lc_str(8)? }
            }
            LC_CODE_SIGNATURE => LoadCommand::CodeSignature(r.linkedit()?),
            LC_FUNCTION_STARTS => LoadCommand::FunctionStarts(r.linkedit()?),
            LC_DATA_IN_CODE => LoadCommand::DataInCode(r.linkedit()?),
            LC_DYLD_EXPORTS_TRIE => LoadCommand::DyldExportsTrie(r.linkedit()?),
            LC_DYLD_CHAINED_FIXUPS => LoadCommand::DyldChainedFixups(r.linkedit()?),
            LC_DYLD_INFO_ONLY => {
                r.require(48)?;
                LoadCommand::DyldInfoOnly {
                    rebase_size: r.u32(12)?,
                    bind_size: r.u32(20)?,
                    weak_bind_size: r.u32(28)?,
                    lazy_bind_size: r.u32(36)?,
                    export_size: r.u32(44)?,
                }
            }
            LC_MAIN => {
                r.require(24)?;
                LoadCommand::Main {
                    entryoff: r.u64(8)?,
                    stacksize: r.u64(16)?,
                }
            }
            LC_SOURCE_VERSION => {
                r.require(16)?;
                LoadCommand::SourceVersion { version: r.u64(8)? }
            }
            LC_BUILD_VERSION => {
                r.require(24)?;
                let ntools = r.u32(20)? as usize;
                r.require(24 + ntools.saturating_mul(8))?;
                let tools = (0..ntools)
                    .map(|i| {
                        Ok(BuildTool {
                            tool: r.u32(24 + i * 8)?,
                            version: PackedVersion(r.u32(28 + i * 8)?),
                        })
                    })
                    .collect::<Result<Vec<_>, ContainerError>>()?;
                LoadCommand::BuildVersion {
                    platform: r.u32(8)?,
                    minos: PackedVersion(r.u32(12)?),
                    sdk: PackedVersion(r.u32(16)?),
                    tools,
                }
            }
            other => LoadCommand::Unknown {
                cmd: other,
                data: record[8..].to_vec(),
            },
        };
        Ok(command)
    }
}

/// Bounds-checked little-endian reads within one record.
struct RecordReader<'a> {
    index: u32,
    record: &'a [u8],
}

impl RecordReader<'_> {
    fn cmd(&self) -> u32 {
        u32::from_le_bytes([self.record[0], self.record[1], self.record[2], self.record[3]])
    }

    fn cmdsize(&self) -> u32 {
        self.record.len() as u32
    }

    fn require(&self, needed: usize) -> Result<(), ContainerError> {
        if needed > self.record.len() {
            return Err(ContainerError::PayloadOverrun {
                index: self.index,
                cmd: self.cmd(),
                needed,
                cmdsize: self.cmdsize(),
            });
        }
        Ok(())
    }

    fn u32(&self, off: usize) -> Result<u32, ContainerError> {
        self.require(off + 4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.record[off..off + 4]);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64(&self, off: usize) -> Result<u64, ContainerError> {
        self.require(off + 8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.record[off..off + 8]);
        Ok(u64::from_le_bytes(buf))
    }

    /// A NUL-padded fixed-width name such as `segname`.
    fn fixed_str(&self, off: usize, len: usize) -> String {
        let bytes = &self.record[off..off + len];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    /// An `lc_str`: the field at `off` holds the string's offset from the record start.
    fn lc_str(&self, off: usize) -> Result<String, ContainerError> {
        let str_off = self.u32(off)?;
        let start = str_off as usize;
        if start < off + 4 || start >= self.record.len() {
            return Err(ContainerError::BadStringOffset {
                index: self.index,
                cmd: self.cmd(),
                offset: str_off,
                cmdsize: self.cmdsize(),
            });
        }
        let bytes = &self.record[start..];
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    fn dylib(&self) -> Result<Dylib, ContainerError> {
        self.require(24)?;
        Ok(Dylib {
            name: self.lc_str(8)?,
            timestamp: self.u32(12)?,
            current_version: PackedVersion(self.u32(16)?),
            compatibility_version: PackedVersion(self.u32(20)?),
        })
    }

    fn linkedit(&self) -> Result<LinkeditData, ContainerError> {
        self.require(16)?;
        Ok(LinkeditData {
            data_offset: self.u32(8)?,
            data_size: self.u32(12)?,
        })
    }
}

fn prot(p: u32) -> String {
    let flag = |bit: u32, c: char| if p & bit != 0 { c } else { '-' };
    [flag(1, 'r'), flag(2, 'w'), flag(4, 'x')].iter().collect()
}

fn platform_name(platform: u32) -> String {
    match platform {
        1 => "macos".into(),
        2 => "ios".into(),
        3 => "tvos".into(),
        4 => "watchos".into(),
        6 => "maccatalyst".into(),
        7 => "iossimulator".into(),
        other => other.to_string(),
    }
}

impl fmt::Display for LoadCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}")?,
            None => write!(f, "LC_0x{:x}", self.cmd())?,
        }
        match self {
            LoadCommand::Segment64 {
                name,
                vmaddr,
                vmsize,
                maxprot,
                initprot,
                flags,
                sections,
                ..
            } => {
                write!(
                    f,
                    " segname={name} vmaddr=0x{vmaddr:x} vmsize=0x{vmsize:x} maxprot={} initprot={} flags=0x{flags:x}",
                    prot(*maxprot),
                    prot(*initprot)
                )?;
                if !sections.is_empty() {
                    let names: Vec<String> = sections
                        .iter()
                        .map(|s| format!("{},{}", s.segment, s.name))
                        .collect();
                    write!(f, " sections=[{}]", names.join(" "))?;
                }
                Ok(())
            }
            LoadCommand::Symtab { nsyms, strsize, .. } => {
                write!(f, " nsyms={nsyms} strsize={strsize}")
            }
            LoadCommand::Dysymtab {
                nlocalsym,
                nextdefsym,
                nundefsym,
            } => write!(
                f,
                " nlocalsym={nlocalsym} nextdefsym={nextdefsym} nundefsym={nundefsym}"
            ),
            LoadCommand::LoadDylib(d)
            | LoadCommand::LoadWeakDylib(d)
            | LoadCommand::ReexportDylib(d)
            | LoadCommand::IdDylib(d) => write!(
                f,
                " name={} current={} compat={}",
                d.name, d.current_version, d.compatibility_version
            ),
            LoadCommand::LoadDylinker { name } => write!(f, " name={name}"),
            LoadCommand::Uuid { uuid } => {
                write!(f, " uuid=")?;
                for b in uuid {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            LoadCommand::Rpath { path } => write!(f, " path={path}"),
            LoadCommand::CodeSignature(d)
            | LoadCommand::FunctionStarts(d)
            | LoadCommand::DataInCode(d)
            | LoadCommand::DyldExportsTrie(d)
            | LoadCommand::DyldChainedFixups(d) => {
                write!(f, " dataoff={} datasize={}", d.data_offset, d.data_size)
            }
            LoadCommand::DyldInfoOnly {
                bind_size,
                export_size,
                ..
            } => write!(f, " bind_size={bind_size} export_size={export_size}"),
            LoadCommand::Main {
                entryoff,
                stacksize,
            } => write!(f, " entryoff=0x{entryoff:x} stacksize={stacksize}"),
            LoadCommand::SourceVersion { version } => write!(
                f,
                " version={}.{}.{}.{}.{}",
                version >> 40,
                (version >> 30) & 0x3ff,
                (version >> 20) & 0x3ff,
                (version >> 10) & 0x3ff,
                version & 0x3ff
            ),
            LoadCommand::BuildVersion {
                platform,
                minos,
                sdk,
                tools,
            } => write!(
                f,
                " platform={} minos={minos} sdk={sdk} ntools={}",
                platform_name(*platform),
                tools.len()
            ),
            LoadCommand::Unknown { data, .. } => write!(f, " ({} payload bytes)", data.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(cmd: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&cmd.to_le_bytes());
        out.extend_from_slice(&((payload.len() + 8) as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn decode_rpath() {
        let mut payload = 12u32.to_le_bytes().to_vec();
        payload.extend_from_slice(b"@loader_path\0\0\0\0");
        let cmd = LoadCommand::decode(0, &record(LC_RPATH, &payload)).unwrap();
        assert_eq!(
            cmd,
            LoadCommand::Rpath {
                path: "@loader_path".into()
            }
        );
        assert_eq!(cmd.cmd(), 0x8000_001c);
    }

    #[test]
    fn decode_unknown_keeps_payload() {
        let cmd = LoadCommand::decode(3, &record(0x7777, &[1, 2, 3, 4])).unwrap();
        assert_eq!(
            cmd,
            LoadCommand::Unknown {
                cmd: 0x7777,
                data: vec![1, 2, 3, 4]
            }
        );
        assert_eq!(cmd.name(), None);
        assert_eq!(cmd.to_string(), "LC_0x7777 (4 payload bytes)");
    }

    #[test]
    fn short_payload_is_overrun() {
        // LC_MAIN needs 24 bytes.
        let err = LoadCommand::decode(1, &record(LC_MAIN, &[0; 8])).unwrap_err();
        assert!(matches!(
            err,
            ContainerError::PayloadOverrun {
                index: 1,
                needed: 24,
                cmdsize: 16,
                ..
            }
        ));
    }

    #[test]
    fn string_offset_outside_record() {
        let payload = 200u32.to_le_bytes();
        let err = LoadCommand::decode(0, &record(LC_RPATH, &payload)).unwrap_err();
        assert!(matches!(err, ContainerError::BadStringOffset { offset: 200, .. }));
    }

    #[test]
    fn packed_version_text() {
        let v: PackedVersion = "1311.100.3".parse().unwrap();
        assert_eq!(v, PackedVersion::new(1311, 100, 3));
        assert_eq!(v.to_string(), "1311.100.3");
        assert_eq!("14".parse::<PackedVersion>().unwrap().to_string(), "14.0.0");
        assert!("1.2.3.4".parse::<PackedVersion>().is_err());
        assert!("x.y".parse::<PackedVersion>().is_err());
    }

    #[test]
    fn expectations_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            cmds: Vec<LoadCommand>,
        }
        let doc: Doc = toml::from_str(
            r#"
cmds = [
  { kind = "rpath", path = "foo" },
  { kind = "load-dylib", name = "/usr/lib/libSystem.B.dylib", current-version = "1311.0.0", compatibility-version = "1.0.0" },
  { kind = "code-signature" },
]
"#,
        )
        .unwrap();
        assert_eq!(doc.cmds.len(), 3);
        assert_eq!(doc.cmds[0], LoadCommand::Rpath { path: "foo".into() });
        match &doc.cmds[1] {
            LoadCommand::LoadDylib(d) => {
                assert_eq!(d.current_version, PackedVersion::new(1311, 0, 0));
                assert_eq!(d.timestamp, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(doc.cmds[2], LoadCommand::CodeSignature(_)));
    }

    #[test]
    fn display_segment() {
        let seg = LoadCommand::Segment64 {
            name: "__TEXT".into(),
            vmaddr: 0x1_0000_0000,
            vmsize: 0x4000,
            fileoff: 0,
            filesize: 0x4000,
            maxprot: 5,
            initprot: 5,
            flags: 0,
            sections: vec![],
        };
        assert_eq!(
            seg.to_string(),
            "LC_SEGMENT_64 segname=__TEXT vmaddr=0x100000000 vmsize=0x4000 maxprot=r-x initprot=r-x flags=0x0"
        );
    }
}
