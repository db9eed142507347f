use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke};

use crate::system::{HealthStatus, Layer, NodeKind, TraceStatus};
use crate::zoom::{PortTone, Viewport};

pub(super) const CARD_FILL: Color32 = Color32::from_rgb(28, 33, 41);
pub(super) const CARD_BORDER: Color32 = Color32::from_rgb(58, 66, 78);
pub(super) const TEXT_STRONG: Color32 = Color32::from_gray(236);
pub(super) const TEXT_WEAK: Color32 = Color32::from_gray(150);
pub(super) const SELECTED: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const DRAFT: Color32 = Color32::from_rgb(250, 204, 21);
pub(super) const FOCUS_GLOW: Color32 = Color32::from_rgb(103, 196, 255);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    color.gamma_multiply(opacity.clamp(0.0, 1.0))
}

/// Parses `#rrggbb` (the leading `#` is optional).
pub(super) fn parse_hex_color(value: &str) -> Option<Color32> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color32::from_rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub(super) fn kind_accent(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Gateway => Color32::from_rgb(167, 139, 250),
        NodeKind::Service => Color32::from_rgb(96, 165, 250),
        NodeKind::Database => Color32::from_rgb(52, 211, 153),
        NodeKind::Queue => Color32::from_rgb(251, 191, 36),
        NodeKind::Cache => Color32::from_rgb(244, 114, 182),
    }
}

pub(super) fn trace_color(status: TraceStatus) -> Color32 {
    match status {
        TraceStatus::Ok => Color32::from_rgb(74, 222, 128),
        TraceStatus::Warning => Color32::from_rgb(250, 204, 21),
        TraceStatus::Error => Color32::from_rgb(248, 113, 113),
    }
}

pub(super) fn health_color(status: HealthStatus) -> Color32 {
    match status {
        HealthStatus::Healthy => Color32::from_rgb(74, 222, 128),
        HealthStatus::Degraded | HealthStatus::Warning => Color32::from_rgb(250, 204, 21),
        HealthStatus::Critical => Color32::from_rgb(248, 113, 113),
        HealthStatus::Unknown => Color32::from_gray(140),
    }
}

pub(super) fn tone_color(tone: PortTone) -> Color32 {
    match tone {
        PortTone::Ok => trace_color(TraceStatus::Ok),
        PortTone::Warning => trace_color(TraceStatus::Warning),
        PortTone::Error => trace_color(TraceStatus::Error),
        PortTone::Neutral => Color32::from_gray(130),
    }
}

const CANVAS_FILL: Color32 = Color32::from_rgb(19, 23, 29);

pub(super) fn layer_tint(layer: Layer) -> Color32 {
    match layer {
        Layer::Tracing => Color32::from_rgb(45, 190, 220),
        Layer::Building => Color32::from_rgb(235, 180, 60),
        Layer::Platform => Color32::from_rgb(50, 200, 150),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, viewport: Viewport, tint: Color32) {
    painter.rect_filled(rect, 0.0, blend_color(CANVAS_FILL, tint, 0.03));

    let step = (56.0 * viewport.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.min + viewport.pan();
    let stroke = Stroke::new(1.0, tint.gamma_multiply(0.28));

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn dashed_rect(painter: &Painter, rect: Rect, stroke: Stroke, dash: f32) {
    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
        rect.left_top(),
    ];
    painter.extend(Shape::dashed_line(&corners, stroke, dash, dash * 0.75));
}

pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    if max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom() {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let top_left = rect.left_top();
    let top_right = rect.right_top();
    let bottom_left = rect.left_bottom();
    let bottom_right = rect.right_bottom();

    segments_intersect(start, end, top_left, top_right)
        || segments_intersect(start, end, top_right, bottom_right)
        || segments_intersect(start, end, bottom_right, bottom_left)
        || segments_intersect(start, end, bottom_left, top_left)
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

/// Point where the segment from `rect`'s center towards `toward` leaves `rect`.
pub(super) fn rect_exit_point(rect: Rect, toward: Pos2) -> Pos2 {
    let center = rect.center();
    let delta = toward - center;
    if delta.x.abs() <= f32::EPSILON && delta.y.abs() <= f32::EPSILON {
        return center;
    }
    let half = rect.size() / 2.0;
    let scale_x = if delta.x.abs() > f32::EPSILON {
        half.x / delta.x.abs()
    } else {
        f32::INFINITY
    };
    let scale_y = if delta.y.abs() > f32::EPSILON {
        half.y / delta.y.abs()
    } else {
        f32::INFINITY
    };
    center + delta * scale_x.min(scale_y).min(1.0)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn hex_colors_parse_with_or_without_hash() {
        assert_eq!(parse_hex_color("#3b82f6"), Some(Color32::from_rgb(0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex_color("10b981"), Some(Color32::from_rgb(0x10, 0xb9, 0x81)));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn every_layer_has_its_own_tint() {
        let tints = Layer::ALL.map(layer_tint);
        assert_ne!(tints[0], tints[1]);
        assert_ne!(tints[1], tints[2]);
        assert_ne!(tints[0], tints[2]);
    }

    #[test]
    fn edges_crossing_the_view_are_visible() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(100.0, 100.0));

        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -20.0), 0.0));
    }

    #[test]
    fn exit_point_lands_on_the_border() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(200.0, 100.0));

        assert_eq!(rect_exit_point(rect, pos2(500.0, 50.0)), pos2(200.0, 50.0));
        assert_eq!(rect_exit_point(rect, pos2(100.0, -300.0)), pos2(100.0, 0.0));
        assert_eq!(rect_exit_point(rect, pos2(120.0, 60.0)), pos2(120.0, 60.0));
    }
}
