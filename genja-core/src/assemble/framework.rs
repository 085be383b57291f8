//! Core runtime shared library.
//!
//! Plans `libtensorflow_framework.so` and, from the subset of objects
//! under `core/kernels` and `core/ops`, a byproduct shared object the
//! generated-sources family links its per-operator generators against.
//! The byproduct is a path contract: the two families run as separate
//! invocations and meet only on the artifact name.

use crate::assemble::Assembly;
use crate::config::BuildConfig;
use crate::filter::{partition, rename, Patterns};
use crate::graph::{common_header, BuildEdge, BuildGraph, GraphError, Rule};

/// Options for the framework family.
#[derive(Debug, Clone)]
pub struct FrameworkOptions {
    /// File name of the shared object, e.g. `libtensorflow_framework.so`.
    pub output: String,
    /// File name of the op-generator byproduct, e.g. `libtfccopgen.so`.
    pub byproduct: String,
}

const EXCLUDES: &[&str] = &[
    // The framework library must not swallow the generator's main.
    r".*proto_text.gen_proto_text_functions\.cc",
    r"third_party",
    r".*/windows/.*",
    r".*\.proto$",
];

/// Curated library set for the framework link.
const FRAMEWORK_LIBS: &str = "-lfarmhash -lhighwayhash -lsnappy -lgif -ldouble-conversion \
                              -lz -lprotobuf -ljpeg -lnsync -lnsync_cpp -lpthread";

/// Object paths that feed the op-generator byproduct.
const BYPRODUCT_PATTERNS: &[&str] = &[r".*core/kernels.*", r".*core/ops.*"];

pub fn assemble(
    cfg: &BuildConfig,
    sources: &[String],
    generated: &[String],
    opts: &FrameworkOptions,
) -> Result<Assembly, GraphError> {
    let mut srclist: Vec<String> = sources.iter().chain(generated).cloned().collect();
    for pattern in EXCLUDES {
        let (_, keep) = partition(&Patterns::single(pattern), &srclist);
        srclist = keep;
    }
    let (mut headers, srclist) = partition(&Patterns::single(r".*\.h$"), &srclist);
    headers.sort();
    headers.dedup();

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

    let extra = format!(
        "-Wl,--soname={}.{} -fvisibility=hidden \
         -Wl,--version-script tensorflow/tf_framework_version_script.lds",
        opts.output, cfg.soversion
    );
    graph.add_edge(
        BuildEdge::new(Rule::CxxShlib, objlist.clone(), vec![opts.output.clone()])
            .var("LIBS", FRAMEWORK_LIBS)
            .var("EXTRA", extra),
    )?;

    // Byproduct for the per-operator generator links.
    let (op_objs, _) = partition(&Patterns::new(BYPRODUCT_PATTERNS), &objlist);
    graph.add_edge(
        BuildEdge::new(Rule::CxxShlib, op_objs, vec![opts.byproduct.clone()])
            .var("LIBS", FRAMEWORK_LIBS),
    )?;

    Ok(Assembly {
        graph: graph.close(),
        residue,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ninja;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn opts() -> FrameworkOptions {
        FrameworkOptions {
            output: "libtensorflow_framework.so".into(),
            byproduct: "libtfccopgen.so".into(),
        }
    }

    #[test]
    fn test_links_library_with_soname() {
        let cfg = BuildConfig::default();
        let srcs = paths(&["tensorflow/core/platform/env.cc"]);
        let asm = assemble(&cfg, &srcs, &[], &opts()).unwrap();
        let text = ninja::render(&asm.graph);
        assert!(text.contains(
            "build libtensorflow_framework.so: rule_CXX_SHLIB tensorflow/core/platform/env.o\n"
        ));
        assert!(text.contains("-Wl,--soname=libtensorflow_framework.so.2.0"));
        assert!(text.contains("tf_framework_version_script.lds"));
    }

    #[test]
    fn test_byproduct_links_kernel_and_op_objects_only() {
        let cfg = BuildConfig::default();
        let srcs = paths(&[
            "tensorflow/core/kernels/matmul_op.cc",
            "tensorflow/core/ops/math_ops.cc",
            "tensorflow/core/platform/env.cc",
        ]);
        let asm = assemble(&cfg, &srcs, &[], &opts()).unwrap();
        let text = ninja::render(&asm.graph);
        assert!(text.contains(
            "build libtfccopgen.so: rule_CXX_SHLIB \
             tensorflow/core/kernels/matmul_op.o tensorflow/core/ops/math_ops.o\n"
        ));
    }

    #[test]
    fn test_headers_side_list_sorted_and_unique() {
        let cfg = BuildConfig::default();
        let srcs = paths(&["b/x.h", "a/y.h", "b/x.h", "a/z.cc"]);
        let asm = assemble(&cfg, &srcs, &[], &opts()).unwrap();
        assert_eq!(asm.headers, paths(&["a/y.h", "b/x.h"]));
    }

    #[test]
    fn test_generator_main_excluded() {
        let cfg = BuildConfig::default();
        let srcs = paths(&["tensorflow/tools/proto_text/gen_proto_text_functions.cc"]);
        let asm = assemble(&cfg, &srcs, &[], &opts()).unwrap();
        let text = ninja::render(&asm.graph);
        assert!(!text.contains("gen_proto_text_functions"));
        assert!(asm.residue.is_empty());
    }
}
