//! Standalone generator executable.
//!
//! Plans `proto_text`, a one-shot ELF executable that later turns
//! `X.proto` schemas into `X.pb_text.{cc,h}` / `X.pb_text-impl.h`
//! reflection sources. Headers, vendored code, platform-excluded
//! sources and the schemas themselves are filtered out; what remains
//! is compiled per-source and linked against a minimal library set.

use crate::assemble::Assembly;
use crate::config::BuildConfig;
use crate::filter::{partition, rename, Patterns};
use crate::graph::{common_header, BuildEdge, BuildGraph, GraphError, Rule};

/// Sources the generator build has no use for.
const EXCLUDES: &[&str] = &[
    r".*\.h$",
    r"third_party",
    r".*windows/.*",
    r".*\.proto$",
];

/// Minimal library set for the generator link.
const GENERATOR_LIBS: &str = "-lpthread -lprotobuf -ldouble-conversion";

/// Output name of the generator executable.
pub const OUTPUT: &str = "proto_text";

pub fn assemble(
    cfg: &BuildConfig,
    sources: &[String],
    generated: &[String],
) -> Result<Assembly, GraphError> {
    let mut srclist: Vec<String> = sources.iter().chain(generated).cloned().collect();
    for pattern in EXCLUDES {
        let (_, keep) = partition(&Patterns::single(pattern), &srclist);
        srclist = keep;
    }

    let mut graph = BuildGraph::new();
    common_header(cfg, &mut graph);

    let (cclist, residue) = partition(&Patterns::single(r".*\.cc$"), &srclist);
    let mut objlist = Vec::with_capacity(cclist.len());
    for cc in &cclist {
        let obj = rename(r"\.cc$", ".o", cc);
        graph.add_edge(BuildEdge::new(
            Rule::CxxObj,
            vec![cc.clone()],
            vec![obj.clone()],
        ))?;
        objlist.push(obj);
    }

    graph.add_edge(
        BuildEdge::new(Rule::CxxExec, objlist, vec![OUTPUT.to_string()])
            .var("LIBS", GENERATOR_LIBS),
    )?;

    Ok(Assembly {
        graph: graph.close(),
        residue,
        headers: Vec::new(),
    })
}
