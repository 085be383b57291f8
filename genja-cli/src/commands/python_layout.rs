//! PythonLayout command - emit the python package installation script.

use anyhow::Result;
use genja_core::assemble::python_layout::{self, LayoutOptions};

use crate::commands::{read_api_list, read_dump, write_output};

pub fn run(input: &str, generated: &str, output: &str, extension: &str, api: &str) -> Result<()> {
    let sources = read_dump(input)?;
    let genlist = read_dump(generated)?;
    let api_list = read_api_list(api)?;

    let opts = LayoutOptions {
        extension: extension.to_string(),
    };
    let script = python_layout::assemble(&sources.sources, &genlist.sources, &api_list, &opts);
    println!("found {} python files", script.count);
    write_output(output, &script.script)?;
    Ok(())
}
