//! Library command - plan one of the API shared library variants.

use anyhow::Result;
use genja_core::assemble::library::{self, LibraryOptions};
use genja_core::{ninja, BuildConfig};

use crate::commands::{read_dump, write_output};
use crate::report;

pub fn run(
    input: &str,
    generated: &str,
    output: &str,
    artifact: &str,
    headers: &str,
    cfg: &BuildConfig,
) -> Result<()> {
    let sources = read_dump(input)?;
    let genlist = read_dump(generated)?;
    report::depends(&sources.external_deps);
    report::globbed(sources.sources.len() + genlist.sources.len());

    if artifact.contains("pywrap") {
        println!(
            "{} will be built with python{}",
            artifact, cfg.py_ver
        );
    }

    let opts = LibraryOptions {
        output: artifact.to_string(),
    };
    let asm = library::assemble(cfg, &sources.sources, &genlist.sources, &opts)?;
    write_output(output, &ninja::render(&asm.graph))?;
    write_output(headers, &super::framework::side_file(&asm.headers))?;
    report::residue(&asm.residue);
    Ok(())
}
