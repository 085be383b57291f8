//! Framework command - plan the core runtime shared library.

use anyhow::Result;
use genja_core::assemble::framework::{self, FrameworkOptions};
use genja_core::{ninja, BuildConfig};

use crate::commands::{read_dump, write_output};
use crate::report;

pub fn run(
    input: &str,
    generated: &str,
    output: &str,
    headers: &str,
    artifact: &str,
    byproduct: &str,
    cfg: &BuildConfig,
) -> Result<()> {
    let sources = read_dump(input)?;
    let genlist = read_dump(generated)?;
    report::depends(&sources.external_deps);
    report::globbed(sources.sources.len() + genlist.sources.len());

    let opts = FrameworkOptions {
        output: artifact.to_string(),
        byproduct: byproduct.to_string(),
    };
    let asm = framework::assemble(cfg, &sources.sources, &genlist.sources, &opts)?;
    write_output(output, &ninja::render(&asm.graph))?;
    write_output(headers, &side_file(&asm.headers))?;
    report::residue(&asm.residue);
    Ok(())
}

/// Render the header side file, one path per line.
pub(crate) fn side_file(headers: &[String]) -> String {
    let mut out = String::new();
    for h in headers {
        out.push_str(h);
        out.push('\n');
    }
    out
}
