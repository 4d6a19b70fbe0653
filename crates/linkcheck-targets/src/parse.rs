//! Triple parsing, target-matrix files, and descriptor validation.
//!
//! Targets are written as `<arch>-<os>[-<abi>]`. A target matrix can also be
//! kept in a `.targets.toml` file listing the triples a suite should be
//! expanded across.

use std::path::Path;

use serde::Deserialize;

use crate::arch::Arch;
use crate::error::{Result, TargetError};
use crate::os::{Abi, Os};
use crate::platform::PlatformDescriptor;

/// A validation issue found in a platform descriptor.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Parse `<arch>-<os>[-<abi>]` into a descriptor.
pub fn parse_triple(triple: &str) -> Result<PlatformDescriptor> {
    let parts: Vec<&str> = triple.split('-').collect();
    let (arch, os, abi) = match parts.as_slice() {
        [arch, os] => (*arch, *os, None),
        [arch, os, abi] => (*arch, *os, Some(*abi)),
        _ => {
            return Err(TargetError::MalformedTriple {
                triple: triple.to_string(),
            })
        }
    };

    let with_triple = |e: TargetError| match e {
        TargetError::UnknownComponent {
            component, value, ..
        } => TargetError::UnknownComponent {
            component,
            value,
            triple: triple.to_string(),
        },
        other => other,
    };

    let arch: Arch = arch.parse().map_err(with_triple)?;
    let os: Os = os.parse().map_err(with_triple)?;
    let abi = match abi {
        Some(abi) => abi.parse::<Abi>().map_err(with_triple)?,
        None => os.default_abi(),
    };
    Ok(PlatformDescriptor::new(arch, os, abi))
}

#[derive(Debug, Deserialize)]
struct TargetMatrix {
    targets: Vec<PlatformDescriptor>,
}

/// Load a target matrix from a `.targets.toml` file.
pub fn load_target_matrix(path: &Path) -> Result<Vec<PlatformDescriptor>> {
    if !path.exists() {
        return Err(TargetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_target_matrix(&content)
}

/// Parse a target matrix from a TOML string of the form `targets = [..]`.
pub fn parse_target_matrix(toml_str: &str) -> Result<Vec<PlatformDescriptor>> {
    let matrix: TargetMatrix = toml::from_str(toml_str)?;
    Ok(matrix.targets)
}

/// Validate a descriptor for combinations no toolchain can produce.
///
/// Returns `Ok(())` if valid, or `Err(issues)` with a list of problems.
pub fn validate_platform(platform: &PlatformDescriptor) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    // 1. Mach-O targets need a Mach-O CPU type and no libc ABI
    if platform.os == Os::Macos {
        if platform.arch.macho_cpu_type().is_none() {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("architecture '{}' has no Mach-O CPU type", platform.arch),
            });
        }
        if platform.abi != Abi::None {
            issues.push(ValidationIssue {
                severity: "error",
                message: format!("macos targets use ABI 'none', not '{}'", platform.abi),
            });
        }
    }

    // 2. wasm32 only runs under WASI or freestanding
    if platform.arch == Arch::Wasm32 && !matches!(platform.os, Os::Wasi | Os::Freestanding) {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!("wasm32 cannot target '{}'", platform.os),
        });
    }
    if platform.os == Os::Wasi && platform.arch != Arch::Wasm32 {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!("wasi requires wasm32, not '{}'", platform.arch),
        });
    }

    // 3. ABI/OS pairings
    if platform.abi == Abi::Msvc && platform.os != Os::Windows {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!("msvc ABI is only valid for windows, not '{}'", platform.os),
        });
    }
    if platform.abi == Abi::Gnueabihf && platform.arch != Arch::Arm {
        issues.push(ValidationIssue {
            severity: "error",
            message: format!("gnueabihf ABI is only valid for arm, not '{}'", platform.arch),
        });
    }
    if platform.arch == Arch::Arm && platform.os == Os::Linux && platform.abi == Abi::Gnu {
        issues.push(ValidationIssue {
            severity: "warning",
            message: "arm-linux-gnu is soft-float; did you mean gnueabihf?".into(),
        });
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_triple() {
        let p = parse_triple("x86_64-linux-musl").unwrap();
        assert_eq!(p, PlatformDescriptor::new(Arch::X86_64, Os::Linux, Abi::Musl));
    }

    #[test]
    fn parse_short_triple_uses_default_abi() {
        let p = parse_triple("aarch64-macos").unwrap();
        assert_eq!(p.abi, Abi::None);
        let p = parse_triple("x86-linux").unwrap();
        assert_eq!(p.abi, Abi::Gnu);
    }

    #[test]
    fn display_round_trips() {
        for p in PlatformDescriptor::builtin() {
            assert_eq!(parse_triple(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn unknown_component_names_triple() {
        let err = parse_triple("sparc-linux-gnu").unwrap_err();
        match err {
            TargetError::UnknownComponent {
                component,
                value,
                triple,
            } => {
                assert_eq!(component, "architecture");
                assert_eq!(value, "sparc");
                assert_eq!(triple, "sparc-linux-gnu");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_triple() {
        assert!(matches!(
            parse_triple("x86_64"),
            Err(TargetError::MalformedTriple { .. })
        ));
        assert!(matches!(
            parse_triple("a-b-c-d"),
            Err(TargetError::MalformedTriple { .. })
        ));
    }

    #[test]
    fn parse_matrix() {
        let targets = parse_target_matrix(
            r#"targets = ["x86_64-macos", "aarch64-macos-none", "x86_64-linux-gnu"]"#,
        )
        .unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].os, Os::Macos);
    }

    #[test]
    fn parse_matrix_rejects_bad_triple() {
        assert!(parse_target_matrix(r#"targets = ["pdp11-unix"]"#).is_err());
    }

    #[test]
    fn load_matrix_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macho.targets.toml");
        std::fs::write(&path, r#"targets = ["aarch64-macos"]"#).unwrap();
        let targets = load_target_matrix(&path).unwrap();
        assert_eq!(targets, vec![parse_triple("aarch64-macos").unwrap()]);
    }

    #[test]
    fn load_not_found() {
        let result = load_target_matrix(Path::new("/nonexistent/path.targets.toml"));
        assert!(matches!(result, Err(TargetError::NotFound { .. })));
    }

    #[test]
    fn builtin_targets_validate() {
        for p in PlatformDescriptor::builtin() {
            assert!(validate_platform(&p).is_ok(), "{p} should validate");
        }
    }

    #[test]
    fn validate_macos_with_libc_abi() {
        let p = PlatformDescriptor::new(Arch::Aarch64, Os::Macos, Abi::Gnu);
        let issues = validate_platform(&p).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("ABI 'none'")));
    }

    #[test]
    fn validate_wasm_on_linux() {
        let p = PlatformDescriptor::new(Arch::Wasm32, Os::Linux, Abi::Musl);
        let issues = validate_platform(&p).unwrap_err();
        assert!(issues.iter().any(|i| i.message.contains("wasm32")));
    }

    #[test]
    fn validate_soft_float_arm_is_warning() {
        let p = PlatformDescriptor::new(Arch::Arm, Os::Linux, Abi::Gnu);
        let issues = validate_platform(&p).unwrap_err();
        assert!(issues.iter().all(|i| i.severity == "warning"));
    }
}
