use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::graph::{SystemEdge, SystemGraph, SystemNode};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<SystemNode>,
    #[serde(default)]
    edges: Vec<SystemEdge>,
    #[serde(default)]
    draft_nodes: Vec<SystemNode>,
    #[serde(default)]
    draft_edges: Vec<SystemEdge>,
}

pub(super) fn parse_system_graph(raw: &str) -> Result<SystemGraph> {
    let parsed: RawGraph = serde_json::from_str(raw).context("invalid system graph JSON")?;

    if parsed.nodes.is_empty() {
        return Err(anyhow!("system graph JSON contains no nodes"));
    }

    let mut known_ids = HashSet::with_capacity(parsed.nodes.len() + parsed.draft_nodes.len());
    for node in parsed.nodes.iter().chain(parsed.draft_nodes.iter()) {
        if node.id.is_empty() {
            return Err(anyhow!("node `{}` has an empty id", node.label));
        }
        if !known_ids.insert(node.id.clone()) {
            return Err(anyhow!("duplicate node id `{}` in system graph", node.id));
        }
    }

    for node in parsed.nodes.iter().chain(parsed.draft_nodes.iter()) {
        for feature in &node.features {
            for linked in &feature.connected_node_ids {
                if !known_ids.contains(linked) {
                    log::warn!(
                        "feature `{}` of `{}` links to unknown node `{linked}`",
                        feature.id,
                        node.id
                    );
                }
            }
        }
    }

    let edges = retain_known_edges(parsed.edges, &known_ids);
    let draft_edges = retain_known_edges(parsed.draft_edges, &known_ids);

    Ok(SystemGraph {
        nodes: parsed.nodes,
        edges,
        draft_nodes: parsed.draft_nodes,
        draft_edges,
    })
}

fn retain_known_edges(edges: Vec<SystemEdge>, known_ids: &HashSet<String>) -> Vec<SystemEdge> {
    edges
        .into_iter()
        .filter(|edge| {
            let known = known_ids.contains(&edge.source) && known_ids.contains(&edge.target);
            if !known {
                log::warn!(
                    "dropping edge `{}` ({} -> {}): unknown endpoint",
                    edge.id,
                    edge.source,
                    edge.target
                );
            }
            known && edge.source != edge.target
        })
        .collect()
}
