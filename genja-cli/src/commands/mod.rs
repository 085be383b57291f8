//! Subcommand implementations.
//!
//! One module per target family. Each `run` reads its label dumps,
//! classifies them, hands the result to the matching `genja-core`
//! assembler and writes the output file, reporting dependencies and
//! residue along the way.

pub mod framework;
pub mod generated;
pub mod library;
pub mod proto_text;
pub mod python_layout;

use anyhow::{Context, Result};
use genja_core::labels::{self, Classified};

/// Read a bazel dependency dump and classify its labels.
pub(crate) fn read_dump(path: &str) -> Result<Classified> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read label dump {path}"))?;
    Ok(labels::classify(text.lines()))
}

/// Read a declared-API list: one path per line, semicolons stripped,
/// appended to the source set without going through the classifier.
pub(crate) fn read_api_list(path: &str) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read API list {path}"))?;
    Ok(text
        .lines()
        .map(|l| l.trim().replace(';', ""))
        .filter(|l| !l.is_empty())
        .collect())
}

/// Write an output file and report its path.
pub(crate) fn write_output(path: &str, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("failed to write {path}"))?;
    crate::report::written(path);
    Ok(())
}
