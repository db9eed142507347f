use std::collections::HashMap;

use eframe::egui::{Color32, Rect, Vec2, vec2};

use crate::layout::force_layout;
use crate::system::{Layer, NodeKind, SystemNode};
use crate::util::format_latency;
use crate::zoom::NodeGeometry;

use super::super::render_utils::{DRAFT, TEXT_WEAK, health_color, trace_color};
use super::super::{RenderEdge, RenderGraph, RenderNode, ViewModel};

/// Card metrics in world units.
pub(in crate::app) const CARD_WIDTH: f32 = 220.0;
pub(in crate::app) const CARD_PADDING: f32 = 12.0;
pub(in crate::app) const TITLE_HEIGHT: f32 = 20.0;
pub(in crate::app) const LINE_HEIGHT: f32 = 16.0;
const LAYOUT_SPACING: f32 = 300.0;
const LAYOUT_ITERATIONS: usize = 300;

pub(in crate::app) enum CardLine {
    Text { text: String, color: Color32 },
    Usage { cpu: f32, memory: f32 },
}

impl CardLine {
    fn text(text: impl Into<String>, color: Color32) -> Self {
        Self::Text {
            text: text.into(),
            color,
        }
    }
}

pub(in crate::app) fn layer_lines(node: &SystemNode, layer: Layer) -> Vec<CardLine> {
    match layer {
        Layer::Tracing => match &node.tracing {
            Some(tracing) => {
                let color = trace_color(tracing.status);
                let mut lines = vec![CardLine::text(
                    format!(
                        "{}  ·  {}",
                        format_latency(tracing.latency_ms),
                        tracing.status.label()
                    ),
                    color,
                )];
                if let Some(message) = &tracing.error_message {
                    lines.push(CardLine::text(message.as_str(), color));
                }
                lines
            }
            None => vec![CardLine::text("no traces", TEXT_WEAK)],
        },
        Layer::Building => match &node.building {
            Some(building) if building.is_draft => {
                let mut lines = Vec::new();
                if let Some(ticket) = &building.ticket_id {
                    lines.push(CardLine::text(format!("draft  ·  {ticket}"), DRAFT));
                }
                if let Some(proposer) = &building.proposed_by {
                    lines.push(CardLine::text(format!("proposed by {proposer}"), TEXT_WEAK));
                }
                if lines.is_empty() {
                    lines.push(CardLine::text("draft", DRAFT));
                }
                lines
            }
            _ => vec![CardLine::text("✎ propose change", TEXT_WEAK)],
        },
        Layer::Platform => match &node.platform {
            Some(platform) => vec![
                CardLine::text(
                    format!("{}  ·  {}", platform.health.label(), platform.version),
                    health_color(platform.health),
                ),
                CardLine::Usage {
                    cpu: platform.cpu,
                    memory: platform.memory,
                },
                CardLine::text(
                    format!(
                        "pods {}/{}  ·  {}",
                        platform.pods.ready, platform.pods.total, platform.last_deploy
                    ),
                    TEXT_WEAK,
                ),
            ],
            None => vec![CardLine::text("no telemetry", TEXT_WEAK)],
        },
    }
}

pub(in crate::app) fn card_size(node: &SystemNode, layer: Layer) -> Vec2 {
    let mut rows = 1 + layer_lines(node, layer).len();
    if !node.description.is_empty() {
        rows += 1;
    }
    if node.has_features() {
        rows += 1;
    }
    vec2(
        CARD_WIDTH,
        CARD_PADDING * 2.0 + TITLE_HEIGHT + rows as f32 * LINE_HEIGHT,
    )
}

/// Tracing dims nodes that carry no trace, except passive infrastructure.
pub(in crate::app) fn dimmed_in_layer(node: &SystemNode, layer: Layer) -> bool {
    layer == Layer::Tracing
        && node.tracing.is_none()
        && !matches!(node.kind, NodeKind::Database | NodeKind::Cache | NodeKind::Queue)
}

impl ViewModel {
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        let nodes = self.graph.nodes_for_layer(self.layer);
        let edges = self.graph.edges_for_layer(self.layer);

        let prior_positions = self
            .graph_cache
            .take()
            .map(|cache| {
                cache
                    .nodes
                    .into_iter()
                    .map(|node| (node.id, node.world_pos))
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let ids = nodes.iter().map(|node| node.id.clone()).collect::<Vec<_>>();
        let mut index_by_id = HashMap::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            index_by_id.insert(id.clone(), index);
        }

        let draft_edge_ids = self
            .graph
            .draft_edges
            .iter()
            .map(|edge| edge.id.as_str())
            .collect::<Vec<_>>();
        let mut render_edges = Vec::with_capacity(edges.len());
        for edge in &edges {
            let (Some(&source), Some(&target)) =
                (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
            else {
                continue;
            };
            render_edges.push(RenderEdge {
                source,
                target,
                is_draft: draft_edge_ids.contains(&edge.id.as_str()),
                status: edge.tracing.as_ref().map(|tracing| tracing.status),
            });
        }

        let pinned = nodes
            .iter()
            .map(|node| {
                node.position
                    .map(|[x, y]| vec2(x, y))
                    .or_else(|| prior_positions.get(&node.id).map(|pos| pos.to_vec2()))
            })
            .collect::<Vec<_>>();
        let pairs = render_edges
            .iter()
            .map(|edge| (edge.source, edge.target))
            .collect::<Vec<_>>();
        let positions = force_layout(&ids, &pinned, &pairs, LAYOUT_SPACING, LAYOUT_ITERATIONS);

        let render_nodes = nodes
            .iter()
            .zip(positions)
            .map(|(node, position)| RenderNode {
                id: node.id.clone(),
                world_pos: position.to_pos2(),
                size: card_size(node, self.layer),
                is_draft: node.is_draft(),
            })
            .collect::<Vec<_>>();

        self.canvas.clear_geometry();
        for node in &render_nodes {
            self.canvas.set_geometry(
                &node.id,
                NodeGeometry {
                    position: node.world_pos,
                    measured_size: Some(node.size),
                },
            );
        }

        log::debug!(
            "render graph rebuilt for {}: {} nodes, {} edges",
            self.layer.label(),
            render_nodes.len(),
            render_edges.len()
        );

        self.graph_cache = Some(RenderGraph {
            nodes: render_nodes,
            edges: render_edges,
            index_by_id,
        });
        self.graph_dirty = false;
    }

    pub(in crate::app) fn graph_bounds(&self) -> Option<Rect> {
        let cache = self.graph_cache.as_ref()?;
        cache
            .nodes
            .iter()
            .map(|node| Rect::from_min_size(node.world_pos, node.size))
            .reduce(|acc, rect| acc.union(rect))
    }
}
