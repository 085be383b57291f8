//! Generated command - plan the generated-sources bundle.

use anyhow::Result;
use genja_core::assemble::generated;
use genja_core::{ninja, BuildConfig};

use crate::commands::{read_dump, write_output};
use crate::report;

pub fn run(generated_dump: &str, output: &str, cfg: &BuildConfig) -> Result<()> {
    let genlist = read_dump(generated_dump)?;
    report::depends(&genlist.external_deps);
    report::globbed(genlist.sources.len());

    let asm = generated::assemble(cfg, &genlist.sources)?;
    write_output(output, &ninja::render(&asm.graph))?;
    report::residue(&asm.residue);
    Ok(())
}
