use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::graph::SystemGraph;
use super::parse::parse_system_graph;

const DEMO_GRAPH: &str = include_str!("demo_graph.json");

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphSource {
    Demo,
    File(PathBuf),
}

impl fmt::Display for GraphSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Demo => f.write_str("bundled demo"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn load_system_graph(source: &GraphSource) -> Result<SystemGraph> {
    let graph = match source {
        GraphSource::Demo => {
            parse_system_graph(DEMO_GRAPH).context("bundled demo graph is invalid")?
        }
        GraphSource::File(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read graph file {}", path.display()))?;
            parse_system_graph(&raw)
                .with_context(|| format!("failed to parse graph file {}", path.display()))?
        }
    };

    log::info!(
        "loaded system graph from {source}: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_graph_loads_with_features() {
        let graph = load_system_graph(&GraphSource::Demo).expect("demo graph loads");

        assert!(graph.nodes.len() >= 6);
        assert!(graph.nodes.iter().any(|node| node.features.len() >= 3));
        assert!(!graph.draft_nodes.is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let source = GraphSource::File(PathBuf::from("/definitely/not/here.json"));
        let error = load_system_graph(&source).expect_err("missing file fails");

        assert!(format!("{error:#}").contains("/definitely/not/here.json"));
    }
}
