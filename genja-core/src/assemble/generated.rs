//! Generated-sources bundle.
//!
//! Consumes the generated-file list only. Every path is classified
//! once into a [`GenKind`], then each kind runs its own sub-pipeline:
//! schema codegen families grouped by stem (gRPC stub pairs, protobuf
//! pairs, reflection triples, python modules), the two-phase operator
//! binding generators (link a per-operator executable, then run it as
//! a build step), the SWIG wrapper, and a handful of singleton edges
//! gated on their target actually appearing in the list.
//!
//! A stem family missing a required sibling produces no edge; its
//! present members fall through to the residue.

use crate::assemble::Assembly;
use crate::config::BuildConfig;
use crate::filter::rename;
use crate::graph::{common_header, BuildEdge, BuildGraph, GraphError, Rule};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Classification of one generated-file path. Closed set; every path
/// is classified exactly once, up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GenKind {
    /// `.grpc.pb.{cc,h}` stub pair.
    GrpcPair,
    /// `.pb.{cc,h}` serialization pair.
    ProtoPair,
    /// `.pb_text.{cc,h}` + `.pb_text-impl.h` reflection triple.
    ProtoTextTriple,
    /// `_pb2.py` python schema module.
    PyProto,
    /// C++ operator binding under `cc/ops/`.
    CcOp,
    /// Generated python operator module.
    PyOp,
    /// SWIG wrapper pair.
    Pywrap,
    /// Fixed copy of the user-op registration source.
    UserOps,
    /// Version info source, copied from the packaging patch.
    VersionInfo,
    /// Build info script output.
    BuildInfo,
    /// Cython-accelerated utility source.
    FastTensorUtil,
    /// Unrecognized; reported as residue.
    Other,
}

static CC_OP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r".*/cc/ops/.*\.(cc|h)$").unwrap());
static PY_OP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^tensorflow/python.*gen_.*_ops\.py$").unwrap());

const USER_OPS_TARGET: &str = "tensorflow/core/ops/user_ops.cc";
const USER_OPS_SOURCE: &str = "tensorflow/core/user_ops/fact.cc";
const VERSION_INFO_TARGET: &str = "tensorflow/core/util/version_info.cc";
const VERSION_INFO_PATCH: &str = "debian/patches/version_info.cc";
const BUILD_INFO_TARGET: &str = "tensorflow/python/platform/build_info.py";
const BUILD_INFO_CMD: &str =
    "python3 tensorflow/tools/build_info/gen_build_info.py --build_config cpu --raw_generate";
const FAST_TENSOR_UTIL_STEM: &str = "tensorflow/python/framework/fast_tensor_util";

/// Common objects linked into every C++ op generator.
const CC_OP_COMMON: &[&str] = &[
    "tensorflow/core/framework/op_gen_lib.cc",
    "tensorflow/cc/framework/cc_op_gen.cc",
    "tensorflow/cc/framework/cc_op_gen_main.cc",
];

/// Common sources for the python op generators. `op_gen_lib.o` is
/// shared with the C++ phase and reused, not recompiled.
const PY_OP_COMMON: &[&str] = &[
    "tensorflow/python/framework/python_op_gen.cc",
    "tensorflow/python/framework/python_op_gen_internal.cc",
    "tensorflow/python/framework/python_op_gen_main.cc",
];

const OP_GEN_LIB_CC: &str = "tensorflow/core/framework/op_gen_lib.cc";
const OP_GEN_LIB_OBJ: &str = "tensorflow/core/framework/op_gen_lib.o";
const NO_OP_CC: &str = "tensorflow/core/ops/no_op.cc";
const NO_OP_OBJ: &str = "tensorflow/core/ops/no_op.o";

/// Linker flags pulling in the framework byproduct (path contract
/// with the framework family).
const OP_GEN_EXTRA: &str = "-I. -L. -ltfccopgen";

const SWIG_CMD: &str = "swig -python -c++ -I. -module pywrap_tensorflow_internal \
                        -outdir tensorflow/python \
                        -o tensorflow/python/pywrap_tensorflow_internal.cc -globals \"\"";

fn classify_gen(path: &str) -> GenKind {
    if path.ends_with(".grpc.pb.cc") || path.ends_with(".grpc.pb.h") {
        GenKind::GrpcPair
    } else if path.ends_with(".pb.cc") || path.ends_with(".pb.h") {
        GenKind::ProtoPair
    } else if path.ends_with(".pb_text.cc")
        || path.ends_with(".pb_text.h")
        || path.ends_with(".pb_text-impl.h")
    {
        GenKind::ProtoTextTriple
    } else if path.ends_with("_pb2.py") {
        GenKind::PyProto
    } else if path == USER_OPS_TARGET {
        GenKind::UserOps
    } else if CC_OP_RE.is_match(path) {
        GenKind::CcOp
    } else if PY_OP_RE.is_match(path) {
        GenKind::PyOp
    } else if path.contains("pywrap_tensorflow_internal") {
        GenKind::Pywrap
    } else if path == VERSION_INFO_TARGET {
        GenKind::VersionInfo
    } else if path == BUILD_INFO_TARGET {
        GenKind::BuildInfo
    } else if path.contains("fast_tensor_util") {
        GenKind::FastTensorUtil
    } else {
        GenKind::Other
    }
}

#[derive(Debug, Default)]
struct Buckets {
    grpc: Vec<String>,
    proto: Vec<String>,
    proto_text: Vec<String>,
    py_proto: Vec<String>,
    cc_op: Vec<String>,
    py_op: Vec<String>,
    pywrap: Vec<String>,
    user_ops: Vec<String>,
    version_info: Vec<String>,
    build_info: Vec<String>,
    fast_tensor_util: Vec<String>,
    other: Vec<String>,
}

impl Buckets {
    fn push(&mut self, kind: GenKind, path: &str) {
        let bucket = match kind {
            GenKind::GrpcPair => &mut self.grpc,
            GenKind::ProtoPair => &mut self.proto,
            GenKind::ProtoTextTriple => &mut self.proto_text,
            GenKind::PyProto => &mut self.py_proto,
            GenKind::CcOp => &mut self.cc_op,
            GenKind::PyOp => &mut self.py_op,
            GenKind::Pywrap => &mut self.pywrap,
            GenKind::UserOps => &mut self.user_ops,
            GenKind::VersionInfo => &mut self.version_info,
            GenKind::BuildInfo => &mut self.build_info,
            GenKind::FastTensorUtil => &mut self.fast_tensor_util,
            GenKind::Other => &mut self.other,
        };
        bucket.push(path.to_string());
    }
}

/// Group paths by stem against a required suffix set.
///
/// Returns the stems whose every suffix sibling is present (sorted),
/// and the member paths of incomplete families (for the residue).
fn stem_families(paths: &[String], suffixes: &[&str]) -> (Vec<String>, Vec<String>) {
    let mut families: BTreeMap<String, BTreeMap<usize, String>> = BTreeMap::new();
    for path in paths {
        for (idx, suffix) in suffixes.iter().enumerate() {
            if let Some(stem) = path.strip_suffix(suffix) {
                families
                    .entry(stem.to_string())
                    .or_default()
                    .insert(idx, path.clone());
                break;
            }
        }
    }
    let mut stems = Vec::new();
    let mut orphans = Vec::new();
    for (stem, members) in families {
        if members.len() == suffixes.len() {
            stems.push(stem);
        } else {
            orphans.extend(members.into_values());
        }
    }
    (stems, orphans)
}

/// Basename of a slash-separated path.
fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub fn assemble(cfg: &BuildConfig, generated: &[String]) -> Result<Assembly, GraphError> {
    let mut buckets = Buckets::default();
    for path in generated {
        buckets.push(classify_gen(path), path);
    }

    let mut graph = BuildGraph::new();
    common_header(cfg, &mut graph);
    let mut residue = buckets.other.clone();

    // gRPC stub pairs, amd64 only.
    let (stems, orphans) = stem_families(&buckets.grpc, &[".grpc.pb.cc", ".grpc.pb.h"]);
    residue.extend(orphans);
    if cfg.is_amd64() {
        for stem in &stems {
            graph.add_edge(BuildEdge::new(
                Rule::ProtocGrpc,
                vec![format!("{stem}.proto")],
                vec![format!("{stem}.grpc.pb.cc"), format!("{stem}.grpc.pb.h")],
            ))?;
        }
    }

    // Protobuf serialization pairs.
    let (stems, orphans) = stem_families(&buckets.proto, &[".pb.cc", ".pb.h"]);
    residue.extend(orphans);
    for stem in &stems {
        graph.add_edge(BuildEdge::new(
            Rule::Protoc,
            vec![format!("{stem}.proto")],
            vec![format!("{stem}.pb.cc"), format!("{stem}.pb.h")],
        ))?;
    }

    // Schema reflection triples, produced by the proto_text tool.
    let (stems, orphans) = stem_families(
        &buckets.proto_text,
        &[".pb_text.cc", ".pb_text.h", ".pb_text-impl.h"],
    );
    residue.extend(orphans);
    for stem in &stems {
        graph.add_edge(BuildEdge::new(
            Rule::ProtoText,
            vec![format!("{stem}.proto")],
            vec![
                format!("{stem}.pb_text.cc"),
                format!("{stem}.pb_text.h"),
                format!("{stem}.pb_text-impl.h"),
            ],
        ))?;
    }

    // Python schema modules.
    let (stems, _) = stem_families(&buckets.py_proto, &["_pb2.py"]);
    for stem in &stems {
        graph.add_edge(BuildEdge::new(
            Rule::ProtocPython,
            vec![format!("{stem}.proto")],
            vec![format!("{stem}_pb2.py")],
        ))?;
    }

    // Fixed copy of the user-op registration source.
    if !buckets.user_ops.is_empty() {
        graph.add_edge(BuildEdge::new(
            Rule::Copy,
            vec![USER_OPS_SOURCE.to_string()],
            vec![USER_OPS_TARGET.to_string()],
        ))?;
    }

    // Two-phase C++ operator binding generation.
    let mut cc_op_objs = Vec::new();
    if !buckets.cc_op.is_empty() {
        for cc in CC_OP_COMMON {
            let obj = rename(r"\.cc$", ".o", cc);
            graph.add_edge(BuildEdge::new(
                Rule::CxxObj,
                vec![cc.to_string()],
                vec![obj.clone()],
            ))?;
            cc_op_objs.push(obj);
        }
        let stems = crate::filter::normalize(r"\.cc$", "", &buckets.cc_op);
        let stems = crate::filter::normalize(r"\.h$", "", &stems);
        let ops: BTreeSet<String> = stems
            .iter()
            .map(|s| basename(s).to_string())
            .filter(|op| !op.contains("internal"))
            .collect();
        for op in &ops {
            let mut inputs = vec![format!("tensorflow/core/ops/{op}.cc")];
            inputs.extend(cc_op_objs.iter().cloned());
            graph.add_edge(
                BuildEdge::new(Rule::CxxExec, inputs, vec![format!("{op}_gen_cc")])
                    .var("EXTRA", OP_GEN_EXTRA),
            )?;
            // The generator writes an internal-only variant alongside
            // the public binding; sendrecv is the one op that asks the
            // generator for internal mode.
            let internal_flag = if op == "sendrecv_ops" { "1" } else { "0" };
            graph.add_edge(
                BuildEdge::new(
                    Rule::CcOpGen,
                    vec![format!("{op}_gen_cc")],
                    vec![
                        format!("tensorflow/cc/ops/{op}.h"),
                        format!("tensorflow/cc/ops/{op}.cc"),
                    ],
                )
                .implicit(vec![
                    format!("tensorflow/cc/ops/{op}_internal.h"),
                    format!("tensorflow/cc/ops/{op}_internal.cc"),
                ])
                .var("cc_op_gen_internal", internal_flag),
            )?;
        }
    }

    // Two-phase python operator binding generation. Reuses the
    // op_gen_lib object from the C++ phase when that phase ran.
    if !buckets.py_op.is_empty() {
        if buckets.cc_op.is_empty() {
            graph.add_edge(BuildEdge::new(
                Rule::CxxObj,
                vec![OP_GEN_LIB_CC.to_string()],
                vec![OP_GEN_LIB_OBJ.to_string()],
            ))?;
        }
        let mut objlist = vec![OP_GEN_LIB_OBJ.to_string()];
        for cc in PY_OP_COMMON {
            let obj = rename(r"\.cc$", ".o", cc);
            graph.add_edge(BuildEdge::new(
                Rule::CxxObj,
                vec![cc.to_string()],
                vec![obj.clone()],
            ))?;
            objlist.push(obj);
        }
        let pyops: BTreeSet<String> = buckets.py_op.iter().cloned().collect();
        let mut no_op_compiled = false;
        for pyop in &pyops {
            let op = rename(r"^gen_(.*)\.py$", "$1", basename(pyop));
            let mut pyop_objs = objlist.clone();
            if pyop.contains("control_flow_ops") {
                // The control-flow generator registers NoOp as well.
                if !no_op_compiled {
                    graph.add_edge(BuildEdge::new(
                        Rule::CxxObj,
                        vec![NO_OP_CC.to_string()],
                        vec![NO_OP_OBJ.to_string()],
                    ))?;
                    no_op_compiled = true;
                }
                pyop_objs.push(NO_OP_OBJ.to_string());
            }
            let mut inputs = vec![format!("tensorflow/core/ops/{op}.cc")];
            inputs.extend(pyop_objs);
            graph.add_edge(
                BuildEdge::new(Rule::CxxExec, inputs, vec![format!("{op}_gen_python")])
                    .var("EXTRA", OP_GEN_EXTRA),
            )?;
            graph.add_edge(BuildEdge::new(
                Rule::PyOpGen,
                vec![format!("{op}_gen_python")],
                vec![pyop.clone()],
            ))?;
        }
    }

    // SWIG wrapper pair.
    if !buckets.pywrap.is_empty() {
        graph.add_edge(
            BuildEdge::new(
                Rule::AnyIn,
                vec!["tensorflow/python/tensorflow.i".to_string()],
                vec![
                    "tensorflow/python/pywrap_tensorflow_internal.py".to_string(),
                    "tensorflow/python/pywrap_tensorflow_internal.cc".to_string(),
                ],
            )
            .var("ANY", SWIG_CMD),
        )?;
    }

    // Singleton edges, each gated on its target being requested.
    if !buckets.version_info.is_empty() {
        graph.add_edge(
            BuildEdge::new(
                Rule::AnyInOut,
                vec![VERSION_INFO_PATCH.to_string()],
                vec![VERSION_INFO_TARGET.to_string()],
            )
            .var("ANY", "cp"),
        )?;
    }
    if !buckets.build_info.is_empty() {
        graph.add_edge(
            BuildEdge::new(Rule::AnyOut, Vec::new(), vec![BUILD_INFO_TARGET.to_string()])
                .var("ANY", BUILD_INFO_CMD),
        )?;
    }
    if !buckets.fast_tensor_util.is_empty() {
        // Two steps: cython transpile, then copy to the .cc name the
        // library family compiles.
        graph.add_edge(
            BuildEdge::new(
                Rule::AnyIn,
                vec![format!("{FAST_TENSOR_UTIL_STEM}.pyx")],
                vec![format!("{FAST_TENSOR_UTIL_STEM}.cpp")],
            )
            .var("ANY", "cython3 -v --cplus"),
        )?;
        graph.add_edge(
            BuildEdge::new(
                Rule::AnyInOut,
                vec![format!("{FAST_TENSOR_UTIL_STEM}.cpp")],
                vec![format!("{FAST_TENSOR_UTIL_STEM}.cc")],
            )
            .var("ANY", "cp"),
        )?;
    }

    Ok(Assembly {
        graph: graph.close(),
        residue,
        headers: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ninja;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn render_for(gen: &[&str]) -> (Assembly, String) {
        let cfg = BuildConfig::default();
        let asm = assemble(&cfg, &paths(gen)).unwrap();
        let text = ninja::render(&asm.graph);
        (asm, text)
    }

    #[test]
    fn test_proto_pair_single_edge() {
        let (asm, text) = render_for(&["p/s.pb.cc", "p/s.pb.h"]);
        assert!(text.contains("build p/s.pb.cc p/s.pb.h: rule_PROTOC p/s.proto\n"));
        assert!(asm.residue.is_empty());
    }

    #[test]
    fn test_incomplete_proto_pair_is_residue() {
        let (asm, text) = render_for(&["p/s.pb.cc"]);
        assert!(!text.contains("rule_PROTOC p/s.proto"));
        assert_eq!(asm.residue, paths(&["p/s.pb.cc"]));
    }

    #[test]
    fn test_grpc_pair_amd64_only() {
        let (_, text) = render_for(&["p/s.grpc.pb.cc", "p/s.grpc.pb.h"]);
        assert!(text.contains("build p/s.grpc.pb.cc p/s.grpc.pb.h: rule_PROTOC_GRPC p/s.proto\n"));

        let mut cfg = BuildConfig::default();
        cfg.target_arch = "arm64".into();
        let asm = assemble(&cfg, &paths(&["p/s.grpc.pb.cc", "p/s.grpc.pb.h"])).unwrap();
        let text = ninja::render(&asm.graph);
        assert!(!text.contains("rule_PROTOC_GRPC p/s.proto"));
        // Claimed by the family even when not emitted on this arch.
        assert!(asm.residue.is_empty());
    }

    #[test]
    fn test_reflection_triple() {
        let (asm, text) = render_for(&[
            "tensorflow/core/framework/types.pb_text.cc",
            "tensorflow/core/framework/types.pb_text.h",
            "tensorflow/core/framework/types.pb_text-impl.h",
        ]);
        assert!(text.contains(concat!(
            "build tensorflow/core/framework/types.pb_text.cc ",
            "tensorflow/core/framework/types.pb_text.h ",
            "tensorflow/core/framework/types.pb_text-impl.h: ",
            "rule_PROTO_TEXT tensorflow/core/framework/types.proto\n"
        )));
        assert!(asm.residue.is_empty());
    }

    #[test]
    fn test_reflection_triple_missing_member() {
        let (asm, _) = render_for(&[
            "tensorflow/core/framework/types.pb_text.cc",
            "tensorflow/core/framework/types.pb_text.h",
        ]);
        assert_eq!(asm.residue.len(), 2);
    }

    #[test]
    fn test_python_schema_module() {
        let (_, text) = render_for(&["tensorflow/core/framework/types_pb2.py"]);
        assert!(text.contains(concat!(
            "build tensorflow/core/framework/types_pb2.py: ",
            "rule_PROTOC_PYTHON tensorflow/core/framework/types.proto\n"
        )));
    }

    #[test]
    fn test_cc_op_two_phase() {
        let (asm, text) = render_for(&[
            "tensorflow/cc/ops/array_ops.cc",
            "tensorflow/cc/ops/array_ops.h",
        ]);
        // Phase one: link the per-operator generator.
        assert!(text.contains(concat!(
            "build array_ops_gen_cc: rule_CXX_EXEC tensorflow/core/ops/array_ops.cc ",
            "tensorflow/core/framework/op_gen_lib.o tensorflow/cc/framework/cc_op_gen.o ",
            "tensorflow/cc/framework/cc_op_gen_main.o\n"
        )));
        assert!(text.contains("  EXTRA = -I. -L. -ltfccopgen\n"));
        // Phase two: run it, declaring the internal variant implicitly.
        assert!(text.contains(concat!(
            "build tensorflow/cc/ops/array_ops.h tensorflow/cc/ops/array_ops.cc ",
            "| tensorflow/cc/ops/array_ops_internal.h tensorflow/cc/ops/array_ops_internal.cc: ",
            "rule_CC_OP_GEN array_ops_gen_cc\n"
        )));
        assert!(text.contains("  cc_op_gen_internal = 0\n"));
        assert!(asm.residue.is_empty());
    }

    #[test]
    fn test_sendrecv_special_case() {
        let (_, text) = render_for(&[
            "tensorflow/cc/ops/sendrecv_ops.cc",
            "tensorflow/cc/ops/sendrecv_ops.h",
        ]);
        assert!(text.contains("  cc_op_gen_internal = 1\n"));
    }

    #[test]
    fn test_internal_op_stems_do_not_generate() {
        let (_, text) = render_for(&["tensorflow/cc/ops/array_ops_internal.cc"]);
        assert!(!text.contains("_internal_gen_cc"));
    }

    #[test]
    fn test_py_op_reuses_op_gen_lib_object() {
        let (_, text) = render_for(&[
            "tensorflow/cc/ops/array_ops.cc",
            "tensorflow/cc/ops/array_ops.h",
            "tensorflow/python/ops/gen_array_ops.py",
        ]);
        // Exactly one compile edge for the shared object.
        let needle = "build tensorflow/core/framework/op_gen_lib.o:";
        assert_eq!(text.matches(needle).count(), 1);
        assert!(text.contains("build array_ops_gen_python: rule_CXX_EXEC"));
        assert!(text.contains(concat!(
            "build tensorflow/python/ops/gen_array_ops.py: ",
            "rule_PY_OP_GEN array_ops_gen_python\n"
        )));
    }

    #[test]
    fn test_py_op_alone_compiles_op_gen_lib() {
        let (_, text) = render_for(&["tensorflow/python/ops/gen_math_ops.py"]);
        assert!(text.contains("build tensorflow/core/framework/op_gen_lib.o:"));
    }

    #[test]
    fn test_control_flow_links_no_op() {
        let (_, text) = render_for(&["tensorflow/python/ops/gen_control_flow_ops.py"]);
        assert!(text.contains("build tensorflow/core/ops/no_op.o:"));
        assert!(text.contains("tensorflow/core/ops/no_op.o\n"));
    }

    #[test]
    fn test_swig_wrapper() {
        let (_, text) = render_for(&["tensorflow/python/pywrap_tensorflow_internal.cc"]);
        assert!(text.contains(concat!(
            "build tensorflow/python/pywrap_tensorflow_internal.py ",
            "tensorflow/python/pywrap_tensorflow_internal.cc: ",
            "rule_ANYi tensorflow/python/tensorflow.i\n"
        )));
        assert!(text.contains("swig -python -c++"));
    }

    #[test]
    fn test_singletons_gated_on_presence() {
        let (_, text) = render_for(&["tensorflow/core/util/version_info.cc"]);
        assert!(text.contains(concat!(
            "build tensorflow/core/util/version_info.cc: ",
            "rule_ANYio debian/patches/version_info.cc\n"
        )));

        let (_, text) = render_for(&["p/s.pb.cc", "p/s.pb.h"]);
        assert!(!text.contains("version_info"));
        assert!(!text.contains("build_info"));
    }

    #[test]
    fn test_build_info_edge() {
        let (_, text) = render_for(&["tensorflow/python/platform/build_info.py"]);
        assert!(text.contains("build tensorflow/python/platform/build_info.py: rule_ANYo\n"));
        assert!(text.contains("gen_build_info.py --build_config cpu --raw_generate"));
    }

    #[test]
    fn test_fast_tensor_util_transpile_then_copy() {
        let (_, text) = render_for(&["tensorflow/python/framework/fast_tensor_util.pyx"]);
        assert!(text.contains(concat!(
            "build tensorflow/python/framework/fast_tensor_util.cpp: ",
            "rule_ANYi tensorflow/python/framework/fast_tensor_util.pyx\n"
        )));
        assert!(text.contains("  ANY = cython3 -v --cplus\n"));
        assert!(text.contains(concat!(
            "build tensorflow/python/framework/fast_tensor_util.cc: ",
            "rule_ANYio tensorflow/python/framework/fast_tensor_util.cpp\n"
        )));
    }

    #[test]
    fn test_user_ops_copy() {
        let (_, text) = render_for(&["tensorflow/core/ops/user_ops.cc"]);
        assert!(text.contains(
            "build tensorflow/core/ops/user_ops.cc: COPY tensorflow/core/user_ops/fact.cc\n"
        ));
    }

    #[test]
    fn test_unrecognized_paths_are_residue() {
        let (asm, _) = render_for(&["tensorflow/docs/notes.md", "p/s.pb.cc", "p/s.pb.h"]);
        assert_eq!(asm.residue, paths(&["tensorflow/docs/notes.md"]));
    }
}
