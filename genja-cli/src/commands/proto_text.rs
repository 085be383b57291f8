//! ProtoText command - plan the standalone proto_text generator.

use anyhow::Result;
use genja_core::assemble::proto_text;
use genja_core::{ninja, BuildConfig};

use crate::commands::{read_dump, write_output};
use crate::report;

pub fn run(input: &str, generated: &str, output: &str, cfg: &BuildConfig) -> Result<()> {
    let sources = read_dump(input)?;
    let genlist = read_dump(generated)?;
    report::depends(&sources.external_deps);
    report::globbed(sources.sources.len() + genlist.sources.len());

    let asm = proto_text::assemble(cfg, &sources.sources, &genlist.sources)?;
    write_output(output, &ninja::render(&asm.graph))?;
    report::residue(&asm.residue);
    Ok(())
}
