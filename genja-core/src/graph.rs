//! Build graph model.
//!
//! An append-only sequence of declarations and build edges, built in
//! memory by one assembler invocation and serialized once at the end
//! of the run. The rule vocabulary is closed: every edge names one of
//! the [`Rule`] variants, whose identifiers and command templates are
//! a fixed contract with the downstream ninja executor.
//!
//! Output uniqueness is enforced at insertion time. A second edge
//! claiming an already-produced output (primary or implicit) would
//! silently corrupt the graph, so [`BuildGraph::add_edge`] fails hard
//! and poisons the graph.

use crate::config::BuildConfig;
use std::collections::HashSet;
use thiserror::Error;

/// Graph consistency failures. These abort the assembler before any
/// output is written.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("output '{output}' is already produced by an earlier {rule} edge")]
    DuplicateOutput { output: String, rule: &'static str },

    #[error("build graph was poisoned by an earlier duplicate-output failure")]
    Poisoned,
}

/// The fixed rule vocabulary understood by the downstream executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Protobuf C++ codegen: one `.proto` to a `.pb.{cc,h}` pair.
    Protoc,
    /// Protobuf gRPC stub codegen: a `.grpc.pb.{cc,h}` pair.
    ProtocGrpc,
    /// Protobuf python codegen: a `_pb2.py` module.
    ProtocPython,
    /// Schema reflection codegen: a `.pb_text.{cc,h}` and
    /// `.pb_text-impl.h` triple, produced by the proto_text tool.
    ProtoText,
    /// Compile one C/C++ source to an object.
    CxxObj,
    /// Link objects into an executable.
    CxxExec,
    /// Link objects into a shared object.
    CxxShlib,
    /// Run a generated per-operator executable to emit C++ bindings.
    CcOpGen,
    /// Run a generated per-operator executable to emit python bindings.
    PyOpGen,
    /// Plain file copy.
    Copy,
    /// Arbitrary tool, inputs substituted into the command line.
    AnyIn,
    /// Arbitrary tool, outputs substituted.
    AnyOut,
    /// Arbitrary tool, nothing substituted.
    Any,
    /// Arbitrary tool, inputs then outputs substituted.
    AnyInOut,
}

/// Declaration order of the rule vocabulary in the preamble.
pub const RULE_VOCABULARY: [Rule; 14] = [
    Rule::Protoc,
    Rule::ProtocGrpc,
    Rule::ProtocPython,
    Rule::ProtoText,
    Rule::CxxObj,
    Rule::CxxExec,
    Rule::CxxShlib,
    Rule::CcOpGen,
    Rule::PyOpGen,
    Rule::Copy,
    Rule::AnyIn,
    Rule::AnyOut,
    Rule::Any,
    Rule::AnyInOut,
];

impl Rule {
    /// Rule identifier as it appears in the emitted build file.
    pub fn id(self) -> &'static str {
        match self {
            Rule::Protoc => "rule_PROTOC",
            Rule::ProtocGrpc => "rule_PROTOC_GRPC",
            Rule::ProtocPython => "rule_PROTOC_PYTHON",
            Rule::ProtoText => "rule_PROTO_TEXT",
            Rule::CxxObj => "rule_CXX_OBJ",
            Rule::CxxExec => "rule_CXX_EXEC",
            Rule::CxxShlib => "rule_CXX_SHLIB",
            Rule::CcOpGen => "rule_CC_OP_GEN",
            Rule::PyOpGen => "rule_PY_OP_GEN",
            Rule::Copy => "COPY",
            Rule::AnyIn => "rule_ANYi",
            Rule::AnyOut => "rule_ANYo",
            Rule::Any => "rule_ANY",
            Rule::AnyInOut => "rule_ANYio",
        }
    }

    /// Command template with `$`-placeholders for the per-edge inputs,
    /// outputs and variable overrides.
    pub fn command(self) -> &'static str {
        match self {
            Rule::Protoc => "$PROTOC $in --cpp_out . $EXTRA",
            Rule::ProtocGrpc => {
                "$PROTOC --grpc_out . --cpp_out . \
                 --plugin protoc-gen-grpc=/usr/bin/grpc_cpp_plugin $in"
            }
            Rule::ProtocPython => "$PROTOC --python_out . -I. $in",
            Rule::ProtoText => {
                "$PROTO_TEXT tensorflow/core tensorflow/core \
                 tensorflow/tools/proto_text/placeholder.txt $in"
            }
            Rule::CxxObj => "$CXX $CPPFLAGS $CXXFLAGS $INCLUDES $EXTRA -c $in -o $out",
            Rule::CxxExec => "$CXX $CPPFLAGS $CXXFLAGS $INCLUDES $LDFLAGS $LIBS $EXTRA $in -o $out",
            Rule::CxxShlib => {
                "$CXX -shared -fPIC $CPPFLAGS $CXXFLAGS $INCLUDES $LDFLAGS $LIBS $EXTRA $in -o $out"
            }
            Rule::CcOpGen => {
                "LD_LIBRARY_PATH=. ./$in $out $cc_op_gen_internal \
                 tensorflow/core/api_def/base_api"
            }
            Rule::PyOpGen => {
                "LD_LIBRARY_PATH=. ./$in \
                 tensorflow/core/api_def/base_api,tensorflow/core/api_def/python_api 1 > $out"
            }
            Rule::Copy => "cp $in $out",
            Rule::AnyIn => "$ANY $in",
            Rule::AnyOut => "$ANY $out",
            Rule::Any => "$ANY",
            Rule::AnyInOut => "$ANY $in $out",
        }
    }
}

/// One declarative build step.
#[derive(Debug, Clone)]
pub struct BuildEdge {
    pub rule: Rule,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub implicit_outputs: Vec<String>,
    /// Edge-scoped variable overrides, in insertion order.
    pub variables: Vec<(String, String)>,
}

impl BuildEdge {
    pub fn new<I, O>(rule: Rule, inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = String>,
        O: IntoIterator<Item = String>,
    {
        Self {
            rule,
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
            implicit_outputs: Vec::new(),
            variables: Vec::new(),
        }
    }

    pub fn implicit<O: IntoIterator<Item = String>>(mut self, outputs: O) -> Self {
        self.implicit_outputs.extend(outputs);
        self
    }

    pub fn var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.variables.push((name.to_string(), value.into()));
        self
    }
}

/// One item of the emitted build file, in declaration order.
#[derive(Debug, Clone)]
pub enum Item {
    Comment(String),
    Blank,
    Variable(String, String),
    RuleDecl(Rule),
    Edge(BuildEdge),
}

/// Append-only build graph builder.
#[derive(Debug, Default)]
pub struct BuildGraph {
    items: Vec<Item>,
    outputs_seen: HashSet<String>,
    poisoned: bool,
}

impl BuildGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, text: &str) {
        self.items.push(Item::Comment(text.to_string()));
    }

    pub fn blank(&mut self) {
        self.items.push(Item::Blank);
    }

    pub fn variable(&mut self, name: &str, value: impl Into<String>) {
        self.items.push(Item::Variable(name.to_string(), value.into()));
    }

    pub fn rule(&mut self, rule: Rule) {
        self.items.push(Item::RuleDecl(rule));
    }

    /// Append a build edge, enforcing output uniqueness across the
    /// whole graph. On a duplicate the graph is poisoned: no further
    /// edges are accepted.
    pub fn add_edge(&mut self, edge: BuildEdge) -> Result<(), GraphError> {
        if self.poisoned {
            return Err(GraphError::Poisoned);
        }
        for output in edge.outputs.iter().chain(&edge.implicit_outputs) {
            if !self.outputs_seen.insert(output.clone()) {
                self.poisoned = true;
                return Err(GraphError::DuplicateOutput {
                    output: output.clone(),
                    rule: edge.rule.id(),
                });
            }
        }
        self.items.push(Item::Edge(edge));
        Ok(())
    }

    /// Finalize the graph for serialization. No edges can be added
    /// afterward.
    pub fn close(self) -> ClosedGraph {
        ClosedGraph { items: self.items }
    }
}

/// A finalized build graph, ready for the serializer.
#[derive(Debug)]
pub struct ClosedGraph {
    pub(crate) items: Vec<Item>,
}

impl ClosedGraph {
    /// Iterate over the edges, mostly for inspection in tests.
    pub fn edges(&self) -> impl Iterator<Item = &BuildEdge> {
        self.items.iter().filter_map(|item| match item {
            Item::Edge(edge) => Some(edge),
            _ => None,
        })
    }
}

/// Write the fixed preamble shared by all assemblers: tool variables,
/// flag variables and the rule vocabulary.
pub fn common_header(cfg: &BuildConfig, graph: &mut BuildGraph) {
    graph.comment("-- start common header --");
    graph.comment("this build file was automatically generated by genja");
    graph.blank();
    graph.comment("-- tools --");
    graph.variable("CXX", cfg.cxx.clone());
    graph.variable("PROTOC", cfg.protoc.clone());
    graph.variable("PROTO_TEXT", cfg.proto_text.clone());
    // EXTRA carries target-specific flags; empty unless an edge
    // overrides it.
    graph.variable("EXTRA", "");
    graph.blank();
    graph.comment("-- flags --");
    graph.variable("CPPFLAGS", cfg.cppflags.clone());
    graph.variable("CXXFLAGS", cfg.cxxflags.clone());
    graph.variable("LDFLAGS", cfg.ldflags.clone());
    graph.variable("INCLUDES", cfg.includes.clone());
    graph.variable("LIBS", cfg.libs.clone());
    graph.blank();
    graph.comment("-- rules --");
    for rule in RULE_VOCABULARY {
        graph.rule(rule);
    }
    graph.blank();
    graph.comment("-- end common header --");
    graph.blank();
}
