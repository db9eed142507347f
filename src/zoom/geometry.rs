use std::collections::BTreeMap;

use eframe::egui::{Pos2, Vec2, pos2, vec2};

use crate::system::EntityId;

/// Neighbor id to direction, radians from +x with y pointing down.
pub type NeighborAngles = BTreeMap<EntityId, f32>;

const CANCEL_EPSILON: f32 = 0.01;
const AXIS_EPSILON: f32 = 1e-9;

/// Places an element along the mean direction of its connected neighbors.
///
/// `max` is the largest top-left coordinate that keeps the element inside the
/// arena on each axis. Returns `center` untouched when no direction resolves or
/// the directions cancel out.
pub fn angular_mean_position(
    connected: &[EntityId],
    angles: &NeighborAngles,
    center: Pos2,
    spread_radius: f32,
    max: Vec2,
) -> Pos2 {
    let mut sum = Vec2::ZERO;
    let mut resolved = 0usize;
    for id in connected {
        let Some(angle) = angles.get(id) else {
            continue;
        };
        sum += vec2(angle.cos(), angle.sin());
        resolved += 1;
    }

    if resolved == 0 {
        return center;
    }

    let magnitude = sum.length();
    if magnitude < CANCEL_EPSILON {
        return center;
    }

    let offset = sum / magnitude * spread_radius;
    clamp_into(center + offset, max)
}

/// One relaxation pass over every unordered pair.
///
/// Overlapping pairs are pushed apart along their smaller overlap axis by half
/// the overlap each, so a lone pair ends exactly `min_gap` apart on that axis
/// unless the bounds stop it. Dense clusters can keep some overlap.
pub fn separate(positions: &mut [Pos2], min_gap: Vec2, max: Vec2) {
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let a = positions[i];
            let b = positions[j];
            let overlap_x = min_gap.x - (b.x - a.x).abs();
            let overlap_y = min_gap.y - (b.y - a.y).abs();
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }

            // Equal offsets push the later element towards +axis.
            if overlap_x < overlap_y {
                let push = overlap_x / 2.0;
                let direction = if b.x - a.x >= 0.0 { 1.0 } else { -1.0 };
                positions[j].x = clamp_axis(b.x + direction * push, max.x);
                positions[i].x = clamp_axis(a.x - direction * push, max.x);
            } else {
                let push = overlap_y / 2.0;
                let direction = if b.y - a.y >= 0.0 { 1.0 } else { -1.0 };
                positions[j].y = clamp_axis(b.y + direction * push, max.y);
                positions[i].y = clamp_axis(a.y - direction * push, max.y);
            }
        }
    }
}

/// Offset from a rectangle's center to where a ray at `angle` leaves it.
pub fn project_to_rect_border(angle: f32, half_extent: Vec2) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    let to_vertical = if cos.abs() > AXIS_EPSILON {
        half_extent.x / cos.abs()
    } else {
        f32::INFINITY
    };
    let to_horizontal = if sin.abs() > AXIS_EPSILON {
        half_extent.y / sin.abs()
    } else {
        f32::INFINITY
    };
    let distance = to_vertical.min(to_horizontal);
    vec2(cos * distance, sin * distance)
}

pub(super) fn clamp_into(point: Pos2, max: Vec2) -> Pos2 {
    pos2(clamp_axis(point.x, max.x), clamp_axis(point.y, max.y))
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    value.min(max).max(0.0)
}
