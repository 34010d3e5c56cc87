//! Graphviz export.

use super::{ensure_renderable, RenderError};
use crate::builder::{Definition, StateNode};
use std::io::Write;

const GRAPH_ATTRIBUTES: &[&str] = &[
    "rankdir=LR;",
    "layout=fdp;",
    "size=\"3,3\";",
    "overlap=false;",
    "splines=false;",
    "sep=0.8;",
    "inputscale=0.4;",
    "K=0.50;",
    "maxiter=2000;",
    "start=1251;",
    "graph [splines=\"spline\", ranksep=\"2\", nodesep=\"1\"];",
    "node [shape=plaintext];",
    "edge [constraint=true, fontname = \"sans-serif\"];",
];

/// Writes a definition as a `digraph`.
///
/// Every state becomes one HTML-table node showing its display name and
/// description; every edge becomes a labeled arrow.
pub struct DotWriter<'a, P> {
    definition: &'a Definition<P>,
}

impl<'a, P> DotWriter<'a, P> {
    pub fn new(definition: &'a Definition<P>) -> Self {
        Self { definition }
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<(), RenderError> {
        ensure_renderable(self.definition)?;

        writeln!(out, "digraph {{")?;
        for attribute in GRAPH_ATTRIBUTES {
            writeln!(out, "{attribute}")?;
        }
        for node in self.definition.nodes() {
            write_node(out, node)?;
        }

        let mut result = Ok(());
        self.definition.iterate_edges(|source, destination, trigger| {
            if result.is_ok() {
                result = writeln!(
                    out,
                    "\"{}\" -> \"{}\"[label=\"{}\"];",
                    escape(source.as_str()),
                    escape(destination.as_str()),
                    escape(trigger.as_str())
                );
            }
        });
        result?;

        writeln!(out, "}}")?;
        Ok(())
    }

    /// Render into a `String`.
    pub fn render(&self) -> Result<String, RenderError> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn write_node<W: Write, P>(out: &mut W, node: &StateNode<P>) -> std::io::Result<()> {
    let description = node.config().description.as_deref().unwrap_or("");
    writeln!(
        out,
        "\"{}\" [label=<<TABLE STYLE=\"ROUNDED\" BGCOLOR=\"orange\" BORDER=\"1\" CELLSPACING=\"0\" WIDTH=\"20\">\
<TR><TD BORDER=\"1\" sides=\"b\">{}</TD></TR><TR><TD BORDER=\"0\">{}</TD></TR></TABLE>>];",
        escape(node.state().as_str()),
        html_escape(node.display_name()),
        html_escape(description)
    )
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
