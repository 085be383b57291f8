//! Target-family assemblers.
//!
//! Each submodule assembles the complete build graph for one artifact
//! family, consuming the classifier output through the filter
//! pipeline:
//!
//! - [`proto_text`] - the standalone proto_text generator executable
//! - [`framework`] - the core runtime shared library (plus the
//!   op-generator byproduct)
//! - [`library`] - the public / C++ / pywrap shared library variants
//! - [`generated`] - the generated-sources bundle
//! - [`python_layout`] - the python package installation script
//!
//! Assemblers are pure: same inputs and configuration, same graph.
//! Entries no filter step claims are returned as residue for the
//! diagnostic reporter, never treated as errors.

pub mod framework;
pub mod generated;
pub mod library;
pub mod proto_text;
pub mod python_layout;

use crate::graph::ClosedGraph;

/// Result of one graph-producing assembler run.
#[derive(Debug)]
pub struct Assembly {
    /// The finished build graph, ready for serialization.
    pub graph: ClosedGraph,
    /// Entries no filter step claimed; reported, not fatal.
    pub residue: Vec<String>,
    /// Header paths encountered during filtering, for the packaging
    /// side file. Empty for families that do not track headers.
    pub headers: Vec<String>,
}
