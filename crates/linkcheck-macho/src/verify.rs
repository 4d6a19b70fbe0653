//! Expected-set containment over load commands.
//!
//! Every expected command must have at least one structurally matching actual
//! command. Extra actual commands and ordering are irrelevant. A match compares
//! the command code and the payload fields that stay stable across rebuilds;
//! addresses, offsets, sizes, timestamps and UUID bytes are ignored. An
//! expected segment's sections need only be present in the actual segment.

use tracing::debug;

use crate::command::{Dylib, LoadCommand, Section};
use crate::error::VerifyError;

fn dylib_eq(a: &Dylib, b: &Dylib) -> bool {
    a.name == b.name
        && a.current_version == b.current_version
        && a.compatibility_version == b.compatibility_version
}

fn sections_contained(actual: &[Section], expected: &[Section]) -> bool {
    expected.iter().all(|want| {
        actual
            .iter()
            .any(|have| have.name == want.name && have.segment == want.segment)
    })
}

/// Whether `actual` satisfies `expected` on the fields meaningful for their
/// kind.
pub fn structurally_eq(actual: &LoadCommand, expected: &LoadCommand) -> bool {
    use LoadCommand::*;

    match (actual, expected) {
        (
            Segment64 {
                name: n1,
                maxprot: m1,
                initprot: i1,
                flags: f1,
                sections: s1,
                ..
            },
            Segment64 {
                name: n2,
                maxprot: m2,
                initprot: i2,
                flags: f2,
                sections: s2,
                ..
            },
        ) => n1 == n2 && m1 == m2 && i1 == i2 && f1 == f2 && sections_contained(s1, s2),
        (LoadDylib(x), LoadDylib(y))
        | (LoadWeakDylib(x), LoadWeakDylib(y))
        | (ReexportDylib(x), ReexportDylib(y))
        | (IdDylib(x), IdDylib(y)) => dylib_eq(x, y),
        (LoadDylinker { name: x }, LoadDylinker { name: y }) => x == y,
        (Rpath { path: x }, Rpath { path: y }) => x == y,
        (Main { stacksize: x, .. }, Main { stacksize: y, .. }) => x == y,
        (SourceVersion { version: x }, SourceVersion { version: y }) => x == y,
        (
            BuildVersion {
                platform: p1,
                minos: m1,
                sdk: s1,
                ..
            },
            BuildVersion {
                platform: p2,
                minos: m2,
                sdk: s2,
                ..
            },
        ) => p1 == p2 && m1 == m2 && s1 == s2,
        (Unknown { cmd: c1, data: d1 }, Unknown { cmd: c2, data: d2 }) => c1 == c2 && d1 == d2,
        // Remaining kinds carry only layout-dependent fields.
        (Symtab { .. }, Symtab { .. })
        | (Dysymtab { .. }, Dysymtab { .. })
        | (Uuid { .. }, Uuid { .. })
        | (CodeSignature(_), CodeSignature(_))
        | (FunctionStarts(_), FunctionStarts(_))
        | (DataInCode(_), DataInCode(_))
        | (DyldExportsTrie(_), DyldExportsTrie(_))
        | (DyldChainedFixups(_), DyldChainedFixups(_))
        | (DyldInfoOnly { .. }, DyldInfoOnly { .. }) => true,
        _ => false,
    }
}

/// Check that every command in `expected` has a structural match in `actual`.
///
/// Stops at the first unmatched expectation.
pub fn verify<'a, I>(actual: I, expected: &[LoadCommand]) -> Result<(), VerifyError>
where
    I: IntoIterator<Item = &'a LoadCommand>,
{
    let actual: Vec<&LoadCommand> = actual.into_iter().collect();
    for want in expected {
        if !actual.iter().any(|have| structurally_eq(have, want)) {
            return Err(VerifyError::MissingExpectedLoadCommand {
                expected: Box::new(want.clone()),
                dump: want.to_string(),
            });
        }
        debug!(expected = %want, "matched load command");
    }
    Ok(())
}
