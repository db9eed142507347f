use std::collections::HashSet;

use serde::Deserialize;

pub type EntityId = String;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Gateway,
    Service,
    Database,
    Queue,
    Cache,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::Service => "service",
            Self::Database => "database",
            Self::Queue => "queue",
            Self::Cache => "cache",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
    Warning,
    #[default]
    Unknown,
}

impl HealthStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Ok,
    Warning,
    Error,
}

impl TraceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Which slice of the system the canvas is currently describing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Tracing,
    Building,
    Platform,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Tracing, Layer::Building, Layer::Platform];

    pub fn label(self) -> &'static str {
        match self {
            Self::Tracing => "Tracing",
            Self::Building => "Building",
            Self::Platform => "Platform",
        }
    }

    pub fn persona(self) -> &'static str {
        match self {
            Self::Tracing => "SWE",
            Self::Building => "PO / PM",
            Self::Platform => "DevOps",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Team {
    pub name: String,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: HealthStatus,
    #[serde(default)]
    pub connected_node_ids: Vec<EntityId>,
    #[serde(default)]
    pub team: Option<Team>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingInfo {
    pub latency_ms: u32,
    pub status: TraceStatus,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingInfo {
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub proposed_by: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Pods {
    pub ready: u32,
    pub total: u32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub health: HealthStatus,
    pub version: String,
    pub cpu: f32,
    pub memory: f32,
    pub pods: Pods,
    #[serde(default)]
    pub last_deploy: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemNode {
    pub id: EntityId,
    pub label: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub position: Option<[f32; 2]>,
    #[serde(default)]
    pub tracing: Option<TracingInfo>,
    #[serde(default)]
    pub building: Option<BuildingInfo>,
    #[serde(default)]
    pub platform: Option<PlatformInfo>,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl SystemNode {
    pub fn has_features(&self) -> bool {
        !self.features.is_empty()
    }

    pub fn is_draft(&self) -> bool {
        self.building.as_ref().is_some_and(|building| building.is_draft)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTracing {
    pub status: TraceStatus,
    #[serde(default)]
    pub latency_ms: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEdge {
    pub id: String,
    pub source: EntityId,
    pub target: EntityId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub tracing: Option<EdgeTracing>,
}

impl SystemEdge {
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.source == a && self.target == b) || (self.source == b && self.target == a)
    }

    /// The endpoint opposite `id`, when this edge touches `id`.
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(self.target.as_str())
        } else if self.target == id {
            Some(self.source.as_str())
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SystemGraph {
    pub nodes: Vec<SystemNode>,
    pub edges: Vec<SystemEdge>,
    pub draft_nodes: Vec<SystemNode>,
    pub draft_edges: Vec<SystemEdge>,
}

impl SystemGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len() + self.draft_nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len() + self.draft_edges.len()
    }

    pub fn nodes_for_layer(&self, layer: Layer) -> Vec<&SystemNode> {
        let mut nodes = self.nodes.iter().collect::<Vec<_>>();
        if layer == Layer::Building {
            nodes.extend(self.draft_nodes.iter());
        }
        nodes
    }

    pub fn edges_for_layer(&self, layer: Layer) -> Vec<&SystemEdge> {
        let mut edges = self.edges.iter().collect::<Vec<_>>();
        if layer == Layer::Building {
            edges.extend(self.draft_edges.iter());
        }
        edges
    }

    pub fn node(&self, id: &str) -> Option<&SystemNode> {
        self.nodes
            .iter()
            .chain(self.draft_nodes.iter())
            .find(|node| node.id == id)
    }

    /// Distinct neighbor ids of `id` within a layer, in edge order.
    pub fn neighbors(&self, id: &str, layer: Layer) -> Vec<EntityId> {
        let mut seen = HashSet::new();
        self.edges_for_layer(layer)
            .into_iter()
            .filter_map(|edge| edge.other_end(id))
            .filter(|other| *other != id && seen.insert(*other))
            .map(str::to_owned)
            .collect()
    }
}
