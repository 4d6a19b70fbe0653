//! `linkcheck inspect`: dump a Mach-O binary.

use std::path::Path;

use anyhow::{bail, Context, Result};
use linkcheck_macho::{inspect, Container};
use serde_json::json;

pub fn run(path: &Path, export: Option<&str>) -> Result<()> {
    let container = inspect(path).with_context(|| format!("inspecting {}", path.display()))?;
    match export.unwrap_or("text") {
        "text" => print!("{}", render_text(path, &container)),
        "json" => println!("{}", render_json(&container)?),
        other => bail!("unknown export format '{other}' (expected text or json)"),
    }
    Ok(())
}

fn render_text(path: &Path, container: &Container) -> String {
    let mut out = format!("{}: {}\n", path.display(), container.header);
    for (i, record) in container.records.iter().enumerate() {
        out.push_str(&format!(
            "  [{i:>2}] @0x{:04x} size {:>4}  {}\n",
            record.offset, record.cmdsize, record.command
        ));
    }
    out
}

fn render_json(container: &Container) -> Result<String> {
    let records: Vec<_> = container
        .records
        .iter()
        .map(|r| {
            json!({
                "offset": r.offset,
                "cmdsize": r.cmdsize,
                "command": r.command,
            })
        })
        .collect();
    let value = json!({
        "header": container.header,
        "commands": records,
    });
    serde_json::to_string_pretty(&value).context("serializing container")
}
