//! DOT rendering of the program graph.
//!
//! Nodes are grouped into one cluster per function; loop headers are
//! highlighted, virtual nodes sit outside every cluster.

use crate::errors::Result;
use crate::features::program_graph::domain::ProgramGraph;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the graph in DOT format.
pub fn write_dot<W: Write>(graph: &ProgramGraph, out: &mut W) -> Result<()> {
    writeln!(out, "digraph ProgramGraph {{")?;
    writeln!(out, "  compound=true;")?;

    // Group block nodes per function, in first-seen order of node ids
    let mut clusters: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    let mut free_nodes = Vec::new();
    for node in graph.nodes() {
        match node.function.as_deref() {
            Some(function) => clusters.entry(function).or_default().push(node),
            None => free_nodes.push(node),
        }
    }

    for (cluster_id, (function, nodes)) in clusters.iter().enumerate() {
        writeln!(out, "  subgraph cluster_{cluster_id} {{")?;
        writeln!(out, "    label=\"{function}\";")?;
        writeln!(out, "    style=filled;")?;
        writeln!(out, "    color=lightgrey;")?;
        writeln!(out, "    node [style=filled,color=white];")?;
        for node in nodes {
            let color = if node.is_loop_header {
                "lightblue"
            } else {
                "white"
            };
            writeln!(
                out,
                "    {} [label=\"{}\",color={}];",
                node.id.0,
                node.describe(),
                color
            )?;
        }
        writeln!(out, "  }}")?;
    }

    if !free_nodes.is_empty() {
        writeln!(out)?;
        writeln!(out, "  node [style=filled,color=yellow];")?;
        for node in free_nodes {
            writeln!(out, "  {} [label=\"{}\"];", node.id.0, node.describe())?;
        }
    }

    writeln!(out)?;
    for (from, to) in graph.edges() {
        let style = if graph.is_back_edge(from, to) {
            " [style=dashed]"
        } else {
            ""
        };
        writeln!(out, "  {} -> {}{};", from.0, to.0, style)?;
    }
    writeln!(out, "}}")?;
    Ok(())
}

/// Write the graph to a DOT file.
pub fn dump_dot(graph: &ProgramGraph, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_dot(graph, &mut file)?;
    info!(path = %path.display(), "wrote program graph");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program_graph::domain::NodeKind;

    #[test]
    fn test_dot_output_shape() {
        let mut graph = ProgramGraph::new();
        let entry = graph.add_node("Entry", NodeKind::VirtualEntry, None);
        let a = graph.add_node("a", NodeKind::Block, None);
        graph.node_mut(a).function = Some("main".into());
        let b = graph.add_node("b", NodeKind::Block, None);
        graph.node_mut(b).function = Some("main".into());
        let exit = graph.add_node("Exit", NodeKind::VirtualExit, None);
        graph.set_entry_exit(entry, exit);
        graph.add_edge(entry, a).unwrap();
        graph.add_edge(a, b).unwrap();
        graph.add_edge(b, a).unwrap();
        graph.mark_back_edge(b, a).unwrap();
        graph.add_edge(b, exit).unwrap();

        let mut buffer = Vec::new();
        write_dot(&graph, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("digraph ProgramGraph {"));
        assert!(text.contains("subgraph cluster_0"));
        assert!(text.contains("label=\"main\""));
        assert!(text.contains("color=lightblue"));
        assert!(text.contains("color=yellow"));
        assert!(text.contains("2 -> 1 [style=dashed];"));
        assert!(text.trim_end().ends_with('}'));
    }
}
