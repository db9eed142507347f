mod graph;
mod load;
mod parse;

pub use graph::{
    EntityId, Feature, HealthStatus, Layer, NodeKind, SystemEdge, SystemGraph, SystemNode,
    TraceStatus,
};
#[cfg(test)]
pub use graph::EdgeTracing;
pub use load::{GraphSource, load_system_graph};
