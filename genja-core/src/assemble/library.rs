//! Language-binding / general runtime shared library.
//!
//! One assembler plans three artifact variants, selected by output
//! name: the public C API (`libtensorflow.so`), the C++ API
//! (`libtensorflow_cc.so`) and the python extension
//! (`_pywrap_tensorflow_internal.so`). Filtering is broader than the
//! framework family (no CUDA, cloud, test or SWIG sources), a few
//! sources need per-source flag overrides, and the variant decides the
//! version script and python flags.

use crate::assemble::Assembly;
use crate::config::BuildConfig;
use crate::filter::{partition, rename, Patterns};
use crate::graph::{common_header, BuildEdge, BuildGraph, GraphError, Rule};
use std::collections::BTreeSet;

/// Options for the library family.
#[derive(Debug, Clone)]
pub struct LibraryOptions {
    /// File name of the shared object; also selects the variant.
    pub output: String,
}

/// Exclusions applied on every architecture, in order.
const EXCLUDES: &[&str] = &[
    r"third_party",
    r".*/windows/.*",
    r".*\.cu\.cc$",
    r".*\.pbtxt$",
    // platform/cloud needs OpenSSL bits we cannot ship against,
    // platform/s3 wants the AWS SDK.
    r".*platform/cloud.*",
    r".*platform/s3.*",
    r".*_main\.cc$",
    r".*_test\.cc$",
    r".*gen_proto_text_functions\.cc",
    r".*tensorflow.contrib.cloud.*",
    r".*gcs_config_ops\.cc",
];

/// Exclusions applied after the header partition.
const LATE_EXCLUDES: &[&str] = &[r".*\.proto$", r".*\.i$", r".*contrib/gdr.*"];

/// Debug sources fail to build outside amd64.
const NON_AMD64_EXCLUDES: &[&str] = &[r".*/core/debug/.*", r".*debug_ops.*"];

/// Sources that trip eigen's std::array layout; compiled with an
/// alternate container-layout macro.
const EIGEN_EXCEPTIONS: &[&str] = &[
    "sparse_tensor_dense_matmul_op",
    "conv_grad_ops_3d",
    "adjust_contrast_op",
];

/// Library set for the final link.
const LIBRARY_LIBS: &str = "-lpthread -lprotobuf -lnsync -lnsync_cpp -ldouble-conversion \
                            -ljpeg -lpng -lgif -lhighwayhash -lfarmhash -ljsoncpp \
                            -lsqlite3 -lre2 -lcurl -llmdb -lsnappy -ldl -lz -lm \
                            -lLLVM-7 -lgrpc++";

/// Hand-maintained C source bundled from the packaging tree.
const EXTRA_SOURCES: &[&str] = &["debian/embedded/fft/fftsg.c"];

/// Cython product compiled only into the pywrap variant.
const FAST_TENSOR_UTIL: &str = "tensorflow/python/framework/fast_tensor_util.cc";

pub fn assemble(
    cfg: &BuildConfig,
    sources: &[String],
    generated: &[String],
    opts: &LibraryOptions,
) -> Result<Assembly, GraphError> {
    let is_pywrap = opts.output.contains("pywrap");

    // Combined and set-deduplicated; sorted so edge order is stable.
    let mut srclist: Vec<String> = sources
        .iter()
        .chain(generated)
        .cloned()
        .chain(EXTRA_SOURCES.iter().map(|s| s.to_string()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    for pattern in EXCLUDES {
        let (_, keep) = partition(&Patterns::single(pattern), &srclist);
        srclist = keep;
    }
    let (mut headers, mut srclist) = partition(&Patterns::single(r".*\.h$"), &srclist);
    headers.sort();
    headers.dedup();
    for pattern in LATE_EXCLUDES {
        let (_, keep) = partition(&Patterns::single(pattern), &srclist);
        srclist = keep;
    }
    if !cfg.is_amd64() {
        for pattern in NON_AMD64_EXCLUDES {
            let (_, keep) = partition(&Patterns::single(pattern), &srclist);
            srclist = keep;
        }
    }
    // The generated list may already carry the cython product.
    if is_pywrap && srclist.iter().all(|s| s != FAST_TENSOR_UTIL) {
        srclist.push(FAST_TENSOR_UTIL.to_string());
    }

    let mut graph = BuildGraph::new();
    common_header(cfg, &mut graph);

    let (cclist, residue) = partition(&Patterns::new(&[r".*\.cc$", r".*\.c$"]), &srclist);
    let mut objlist = Vec::with_capacity(cclist.len());
    for cc in &cclist {
        let obj = rename(r"\.c[c]?$", ".o", cc);
        let mut edge = BuildEdge::new(Rule::CxxObj, vec![cc.clone()], vec![obj.clone()]);
        if EIGEN_EXCEPTIONS.iter().any(|x| cc.contains(x)) {
            edge = edge.var("EXTRA", "-DEIGEN_AVOID_STL_ARRAY");
        } else if cc.contains("python") {
            edge = edge.var("EXTRA", format!("-I{} -L{}", cfg.py_incdir, cfg.py_libdir));
        }
        graph.add_edge(edge)?;
        objlist.push(obj);
    }

    let mut extra = vec![
        format!("-Wl,--soname={}.{}", opts.output, cfg.soversion),
        "-fvisibility=hidden".to_string(),
    ];
    if opts.output.contains("libtensorflow.so") {
        extra.push("-Wl,--version-script tensorflow/c/version_script.lds".into());
    } else if opts.output.contains("libtensorflow_cc.so") {
        extra.push("-Wl,--version-script tensorflow/tf_version_script.lds".into());
    } else if is_pywrap {
        tracing::debug!(py_ver = %cfg.py_ver, "planning pywrap extension");
        extra.push(format!("-I{} -L{}", cfg.py_incdir, cfg.py_libdir));
    }
    graph.add_edge(
        BuildEdge::new(Rule::CxxShlib, objlist, vec![opts.output.clone()])
            .var("LIBS", LIBRARY_LIBS)
            .var("EXTRA", extra.join(" ")),
    )?;

    Ok(Assembly {
        graph: graph.close(),
        residue,
        headers,
    })
}
