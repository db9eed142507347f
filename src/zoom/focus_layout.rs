use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::system::{EntityId, Feature, SystemEdge, TraceStatus};

use super::geometry::{NeighborAngles, angular_mean_position, project_to_rect_border, separate};

/// Fixed geometry of the focus card and the feature arena inside it.
///
/// Feature positions are top-left corners in arena space: x starts after the
/// horizontal arena padding and y starts at the arena top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardGeometry {
    pub card_size: Vec2,
    pub arena_height: f32,
    pub arena_padding_x: f32,
    pub arena_bottom_margin: f32,
    pub feature_size: Vec2,
    pub feature_gap: f32,
    pub spread_radius: f32,
}

impl CardGeometry {
    pub const DEFAULT: CardGeometry = CardGeometry {
        card_size: vec2(540.0, 520.0),
        arena_height: 240.0,
        arena_padding_x: 16.0,
        arena_bottom_margin: 16.0,
        feature_size: vec2(150.0, 58.0),
        feature_gap: 6.0,
        spread_radius: 80.0,
    };

    pub fn arena_width(&self) -> f32 {
        self.card_size.x - 2.0 * self.arena_padding_x
    }

    /// Largest top-left coordinate that keeps a feature box inside the arena.
    pub fn arena_max(&self) -> Vec2 {
        vec2(
            self.arena_width() - self.feature_size.x,
            self.arena_height - self.feature_size.y,
        )
    }

    pub fn arena_center(&self) -> Pos2 {
        pos2(
            self.arena_width() / 2.0 - self.feature_size.x / 2.0,
            self.arena_height / 2.0 - self.feature_size.y / 2.0,
        )
    }

    pub fn min_gap(&self) -> Vec2 {
        self.feature_size + Vec2::splat(self.feature_gap)
    }

    pub fn default_arena_top(&self) -> f32 {
        self.card_size.y - self.arena_height - self.arena_bottom_margin
    }

    pub fn half_extent(&self) -> Vec2 {
        self.card_size / 2.0
    }

    /// Feature box in card-local coordinates.
    pub fn feature_rect(&self, position: Pos2, arena_top: f32) -> Rect {
        Rect::from_min_size(
            pos2(self.arena_padding_x + position.x, arena_top + position.y),
            self.feature_size,
        )
    }

    /// Where a line towards `angle` crosses the card border, card-local.
    pub fn border_point(&self, angle: f32) -> Pos2 {
        let half = self.half_extent();
        pos2(half.x, half.y) + project_to_rect_border(angle, half)
    }
}

impl Default for CardGeometry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortTone {
    Ok,
    Warning,
    Error,
    Neutral,
}

impl From<TraceStatus> for PortTone {
    fn from(status: TraceStatus) -> Self {
        match status {
            TraceStatus::Ok => Self::Ok,
            TraceStatus::Warning => Self::Warning,
            TraceStatus::Error => Self::Error,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Port {
    pub neighbor_id: EntityId,
    pub position: Pos2,
    pub tone: PortTone,
}

/// Orthogonal step line from a port into a feature box.
#[derive(Clone, Debug, PartialEq)]
pub struct Connector {
    pub neighbor_id: EntityId,
    pub feature_id: String,
    pub path: [Pos2; 4],
    pub tone: PortTone,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusLayout {
    pub feature_positions: Vec<Pos2>,
    pub ports: Vec<Port>,
    pub connectors: Vec<Connector>,
}

/// Arena positions for each feature. Without angles everything sits at the
/// arena center before separation.
pub fn feature_positions(
    card: &CardGeometry,
    features: &[Feature],
    angles: Option<&NeighborAngles>,
) -> Vec<Pos2> {
    let center = card.arena_center();
    let max = card.arena_max();
    let mut positions = features
        .iter()
        .map(|feature| match angles {
            Some(angles) => angular_mean_position(
                &feature.connected_node_ids,
                angles,
                center,
                card.spread_radius,
                max,
            ),
            None => center,
        })
        .collect::<Vec<_>>();

    separate(&mut positions, card.min_gap(), max);
    positions
}

/// Tone of the edge joining `node_id` and `neighbor_id`, in either direction.
/// Edges that carry tracing status win over bare ones.
pub fn port_tone<'a>(
    edges: impl IntoIterator<Item = &'a SystemEdge>,
    node_id: &str,
    neighbor_id: &str,
) -> PortTone {
    let mut found_bare = false;
    for edge in edges {
        if !edge.connects(node_id, neighbor_id) {
            continue;
        }
        if let Some(tracing) = &edge.tracing {
            return tracing.status.into();
        }
        found_bare = true;
    }

    if found_bare {
        log::trace!("edge {node_id} <-> {neighbor_id} carries no status");
    }
    PortTone::Neutral
}

/// Step path from `port` to the nearest point of `target` on its border side.
pub fn connector_path(port: Pos2, target: Rect) -> [Pos2; 4] {
    let end_x = port.x.clamp(target.min.x, target.max.x);
    let end_y = port.y.clamp(target.min.y, target.max.y);
    let mid_x = (port.x + end_x) / 2.0;
    [
        port,
        pos2(mid_x, port.y),
        pos2(mid_x, end_y),
        pos2(end_x, end_y),
    ]
}

pub fn compute_focus_layout<'a>(
    card: &CardGeometry,
    node_id: &str,
    features: &[Feature],
    edges: &[&'a SystemEdge],
    angles: Option<&NeighborAngles>,
    arena_top: f32,
) -> FocusLayout {
    let feature_positions = feature_positions(card, features, angles);

    let ports = angles
        .map(|angles| {
            angles
                .iter()
                .map(|(neighbor_id, angle)| Port {
                    neighbor_id: neighbor_id.clone(),
                    position: card.border_point(*angle),
                    tone: port_tone(edges.iter().copied(), node_id, neighbor_id),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let mut connectors = Vec::new();
    for port in &ports {
        for (feature, position) in features.iter().zip(&feature_positions) {
            if !feature.connected_node_ids.contains(&port.neighbor_id) {
                continue;
            }
            connectors.push(Connector {
                neighbor_id: port.neighbor_id.clone(),
                feature_id: feature.id.clone(),
                path: connector_path(port.position, card.feature_rect(*position, arena_top)),
                tone: port.tone,
            });
        }
    }

    FocusLayout {
        feature_positions,
        ports,
        connectors,
    }
}

/// Scale-from-origin transition between an on-canvas element and the focus card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeroTransform {
    pub initial_scale: Vec2,
    /// Transform origin, card-local.
    pub origin: Pos2,
}

impl HeroTransform {
    pub const FALLBACK_SCALE: f32 = 0.95;

    /// `captured` and `card_rect` are both in screen coordinates.
    pub fn new(captured: Option<Rect>, card_rect: Rect) -> Self {
        match captured {
            Some(rect) if card_rect.width() > 0.0 && card_rect.height() > 0.0 => Self {
                initial_scale: vec2(
                    rect.width() / card_rect.width(),
                    rect.height() / card_rect.height(),
                ),
                origin: (rect.center() - card_rect.min).to_pos2(),
            },
            _ => Self {
                initial_scale: Vec2::splat(Self::FALLBACK_SCALE),
                origin: (card_rect.size() / 2.0).to_pos2(),
            },
        }
    }

    /// `progress` 0 is the collapsed state, 1 the full card.
    pub fn scale_at(&self, progress: f32) -> Vec2 {
        let progress = progress.clamp(0.0, 1.0);
        self.initial_scale + (Vec2::splat(1.0) - self.initial_scale) * progress
    }

    pub fn apply(&self, local: Pos2, progress: f32) -> Pos2 {
        self.origin + (local - self.origin) * self.scale_at(progress)
    }

    pub fn apply_rect(&self, local: Rect, progress: f32) -> Rect {
        Rect::from_min_max(self.apply(local.min, progress), self.apply(local.max, progress))
    }
}
