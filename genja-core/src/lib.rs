//! Genja core - build graph planning for the TensorFlow Debian package.
//!
//! This crate turns bazel dependency dumps into ninja build files. It
//! never runs a build step itself; it classifies labels, filters and
//! transforms path lists, assembles per-artifact build graphs and
//! serializes them for ninja to execute.
//!
//! # Pipeline
//!
//! - **Classification** ([`labels`]): split a raw label dump into
//!   external dependency names and normalized local paths
//! - **Filtering** ([`filter`]): partition-by-pattern and
//!   normalize-by-substitution over path lists
//! - **Assembly** ([`assemble`]): one assembler per artifact family,
//!   producing a [`BuildGraph`] plus unclaimed residue
//! - **Serialization** ([`ninja`]): render a closed graph to ninja
//!   syntax
//!
//! Assemblers are pure functions of their inputs and a
//! [`BuildConfig`]; all I/O lives in the command-line frontend.

pub mod assemble;
pub mod config;
pub mod filter;
pub mod graph;
pub mod labels;
pub mod ninja;

pub use config::BuildConfig;
pub use graph::{BuildEdge, BuildGraph, ClosedGraph, GraphError, Rule};
