// src/core/graph.rs
use serde::Serialize;
use std::fmt;

/// How a visualization collaborator should draw a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// An internal decision (splitting attribute).
    Decision,
    /// A terminal outcome.
    Leaf,
    /// A named set, e.g. a rough-set region.
    Region,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// A node-and-edge list describing a result for a drawing collaborator.
/// Nothing here renders pixels.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphDescription {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: impl Into<String>, label: impl Into<String>, kind: NodeKind) {
        self.nodes.push(GraphNode {
            id: id.into(),
            label: label.into(),
            kind,
        });
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>, label: Option<String>) {
        self.edges.push(GraphEdge {
            from: from.into(),
            to: to.into(),
            label,
        });
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Graphviz DOT text for the graph.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph {\n");
        for node in &self.nodes {
            let shape = match node.kind {
                NodeKind::Decision => "ellipse",
                NodeKind::Leaf | NodeKind::Region => "box",
            };
            out.push_str(&format!(
                "  \"{}\" [label=\"{}\", shape={}];\n",
                escape(&node.id),
                escape(&node.label),
                shape
            ));
        }
        for edge in &self.edges {
            match &edge.label {
                Some(label) => out.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    escape(&edge.from),
                    escape(&edge.to),
                    escape(label)
                )),
                None => out.push_str(&format!(
                    "  \"{}\" -> \"{}\";\n",
                    escape(&edge.from),
                    escape(&edge.to)
                )),
            }
        }
        out.push('}');
        out
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for GraphDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nodes:")?;
        for node in &self.nodes {
            writeln!(f, "  {} [{:?}]: {}", node.id, node.kind, node.label)?;
        }
        writeln!(f, "Edges:")?;
        for edge in &self.edges {
            match &edge.label {
                Some(label) => writeln!(f, "  {} -> {} ({})", edge.from, edge.to, label)?,
                None => writeln!(f, "  {} -> {}", edge.from, edge.to)?,
            }
        }
        Ok(())
    }
}
