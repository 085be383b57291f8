//! Ninja build-file serialization.
//!
//! Renders a [`ClosedGraph`] to ninja syntax: variable declarations,
//! rule declarations with their command templates, and build edges
//! with implicit outputs (`|`) and per-edge variable overrides. Paths
//! are `$`-escaped. The whole graph is rendered into one string so
//! callers can write it to disk in a single operation.

use crate::graph::{ClosedGraph, Item};
use std::fmt::Write;

/// Escape a path for use on a ninja build line.
fn escape_path(path: &str) -> String {
    path.replace('$', "$$").replace(' ', "$ ").replace(':', "$:")
}

/// Render the graph to ninja syntax.
pub fn render(graph: &ClosedGraph) -> String {
    let mut out = String::new();
    for item in &graph.items {
        match item {
            Item::Comment(text) => {
                let _ = writeln!(out, "# {text}");
            }
            Item::Blank => out.push('\n'),
            Item::Variable(name, value) => {
                let _ = writeln!(out, "{name} = {value}");
            }
            Item::RuleDecl(rule) => {
                let _ = writeln!(out, "rule {}", rule.id());
                let _ = writeln!(out, "  command = {}", rule.command());
            }
            Item::Edge(edge) => {
                let mut line = String::from("build ");
                line.push_str(
                    &edge
                        .outputs
                        .iter()
                        .map(|o| escape_path(o))
                        .collect::<Vec<_>>()
                        .join(" "),
                );
                if !edge.implicit_outputs.is_empty() {
                    line.push_str(" | ");
                    line.push_str(
                        &edge
                            .implicit_outputs
                            .iter()
                            .map(|o| escape_path(o))
                            .collect::<Vec<_>>()
                            .join(" "),
                    );
                }
                line.push_str(": ");
                line.push_str(edge.rule.id());
                for input in &edge.inputs {
                    line.push(' ');
                    line.push_str(&escape_path(input));
                }
                let _ = writeln!(out, "{line}");
                for (name, value) in &edge.variables {
                    let _ = writeln!(out, "  {name} = {value}");
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BuildEdge, BuildGraph, Rule};

    #[test]
    fn test_render_variable_and_rule() {
        let mut graph = BuildGraph::new();
        graph.variable("CXX", "g++");
        graph.rule(Rule::CxxObj);
        let text = render(&graph.close());
        assert!(text.contains("CXX = g++\n"));
        assert!(text.contains("rule rule_CXX_OBJ\n"));
        assert!(text.contains("  command = $CXX $CPPFLAGS $CXXFLAGS $INCLUDES $EXTRA -c $in -o $out\n"));
    }

    #[test]
    fn test_render_edge_with_variables() {
        let mut graph = BuildGraph::new();
        graph
            .add_edge(
                BuildEdge::new(
                    Rule::CxxExec,
                    vec!["a.o".to_string(), "b.o".to_string()],
                    vec!["prog".to_string()],
                )
                .var("LIBS", "-lpthread"),
            )
            .unwrap();
        let text = render(&graph.close());
        assert!(text.contains("build prog: rule_CXX_EXEC a.o b.o\n"));
        assert!(text.contains("  LIBS = -lpthread\n"));
    }

    #[test]
    fn test_render_implicit_outputs() {
        let mut graph = BuildGraph::new();
        graph
            .add_edge(
                BuildEdge::new(
                    Rule::CcOpGen,
                    vec!["x_gen_cc".to_string()],
                    vec!["x.h".to_string(), "x.cc".to_string()],
                )
                .implicit(vec!["x_internal.h".to_string(), "x_internal.cc".to_string()]),
            )
            .unwrap();
        let text = render(&graph.close());
        assert!(text.contains("build x.h x.cc | x_internal.h x_internal.cc: rule_CC_OP_GEN x_gen_cc\n"));
    }

    #[test]
    fn test_path_escaping() {
        assert_eq!(escape_path("a b:c$d"), "a$ b$:c$$d");
    }
}
