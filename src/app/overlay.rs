use std::time::Duration;

use eframe::egui::{
    self, Align2, Color32, Context, CornerRadius, FontId, Id, Key, Order, Pos2, Rect, Sense,
    Shape, Stroke, StrokeKind, Ui, Vec2, pos2, vec2,
};

use crate::system::{EntityId, Layer, SystemGraph, SystemNode};
use crate::zoom::{
    CardGeometry, HeroTransform, Latch, NeighborAngles, Published, compute_focus_layout,
};

use super::animation::{Easing, Tween};
use super::graph::{CardLine, layer_lines};
use super::render_utils::{
    CARD_BORDER, CARD_FILL, FOCUS_GLOW, TEXT_STRONG, TEXT_WEAK, health_color, kind_accent,
    parse_hex_color, tone_color, with_opacity,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum OverlayAction {
    None,
    Close,
}

/// Full-size focus card for the expanded node.
///
/// The origin rect is captured once when the lock is taken and drives the
/// hero transition in both directions.
pub(super) struct FocusOverlay {
    node_id: EntityId,
    captured: Option<Rect>,
    angles: Latch<NeighborAngles>,
    seen_revision: u64,
    card: CardGeometry,
    arena_top: f32,
    transition: Tween,
    closing_from: Option<f32>,
    since_open: f32,
}

impl FocusOverlay {
    pub(super) const HERO_DURATION: Duration = Duration::from_millis(600);
    const FEATURE_FADE: Duration = Duration::from_millis(300);
    const FEATURE_DELAY: Duration = Duration::from_millis(300);
    const FEATURE_STAGGER: Duration = Duration::from_millis(60);
    const FEATURE_START_SCALE: f32 = 0.8;
    const CLOSE_SIZE: f32 = 24.0;

    pub(super) fn open(
        node_id: EntityId,
        captured: Option<Rect>,
        angles: &Published<NeighborAngles>,
    ) -> Self {
        let (latch, seen_revision) = Latch::from_current(angles);
        let card = CardGeometry::DEFAULT;
        Self {
            node_id,
            captured,
            angles: latch,
            seen_revision,
            arena_top: card.default_arena_top(),
            card,
            transition: Tween::new(Self::HERO_DURATION, Easing::InCubic),
            closing_from: None,
            since_open: 0.0,
        }
    }

    pub(super) fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Picks up newly published neighbor angles. Clearing the source keeps
    /// whatever was latched.
    pub(super) fn follow(&mut self, angles: &Published<NeighborAngles>) {
        if self.angles.follow(angles, &mut self.seen_revision) {
            log::debug!(
                "overlay for {} latched {} neighbor angles",
                self.node_id,
                self.angles.get().map_or(0, |angles| angles.len())
            );
        }
    }

    pub(super) fn close(&mut self) {
        if self.closing_from.is_some() {
            return;
        }
        self.closing_from = Some(self.progress());
        self.transition = Tween::new(Self::HERO_DURATION, Easing::InCubic);
    }

    pub(super) fn is_closing(&self) -> bool {
        self.closing_from.is_some()
    }

    pub(super) fn is_finished(&self) -> bool {
        self.is_closing() && self.transition.is_complete()
    }

    pub(super) fn advance(&mut self, dt_secs: f32) -> bool {
        self.transition.update(dt_secs);
        self.since_open += dt_secs.max(0.0);
        !self.transition.is_complete() || self.since_open < self.features_settled_at()
    }

    /// 0 is collapsed onto the captured rect, 1 is the full card.
    pub(super) fn progress(&self) -> f32 {
        match self.closing_from {
            None => self.transition.progress(),
            Some(from) => from * (1.0 - self.transition.progress()),
        }
    }

    /// Opacity of feature `index`. Its scale grows from 0.8 along with it.
    fn feature_reveal(&self, index: usize) -> f32 {
        let stagger = Self::FEATURE_STAGGER * index.min(1_000) as u32;
        let mut fade =
            Tween::new(Self::FEATURE_FADE, Easing::InCubic).with_delay(Self::FEATURE_DELAY + stagger);
        fade.update(self.since_open);
        fade.progress()
    }

    fn feature_scale(&self, index: usize) -> f32 {
        Self::FEATURE_START_SCALE + (1.0 - Self::FEATURE_START_SCALE) * self.feature_reveal(index)
    }

    /// Repaints stop once the first eight features have faded in.
    fn features_settled_at(&self) -> f32 {
        (Self::FEATURE_DELAY + Self::FEATURE_FADE + Self::FEATURE_STAGGER * 8).as_secs_f32()
    }

    pub(super) fn show(
        &mut self,
        ctx: &Context,
        area: Rect,
        graph: &SystemGraph,
        layer: Layer,
    ) -> OverlayAction {
        let Some(node) = graph.node(&self.node_id) else {
            return OverlayAction::Close;
        };

        let card_rect = Rect::from_center_size(area.center(), self.card.card_size);
        let hero = HeroTransform::new(self.captured, card_rect);
        let progress = self.progress();
        let interactive = !self.is_closing();
        let mut action = OverlayAction::None;

        egui::Area::new(Id::new(("focus_overlay", self.node_id.as_str())))
            .order(Order::Foreground)
            .fixed_pos(area.min)
            .interactable(interactive)
            .show(ctx, |ui| {
                let backdrop = ui.allocate_rect(area, Sense::click());
                let card_response =
                    ui.interact(card_rect, ui.id().with("card"), Sense::click());
                let close_local = Rect::from_min_size(
                    pos2(self.card.card_size.x - Self::CLOSE_SIZE - 12.0, 12.0),
                    Vec2::splat(Self::CLOSE_SIZE),
                );
                let close_rect = close_local.translate(card_rect.min.to_vec2());
                let close = ui.interact(close_rect, ui.id().with("close"), Sense::click());

                let painter = ui.painter_at(area);
                painter.rect_filled(area, 0.0, Color32::from_black_alpha((150.0 * progress) as u8));

                let frame = CardFrame {
                    origin: card_rect.min,
                    hero,
                    progress,
                    opacity: 0.35 + 0.65 * progress,
                };
                self.paint_card(ui, &frame, node, graph, layer, close_local);

                if interactive
                    && (close.clicked() || (backdrop.clicked() && !card_response.hovered()))
                {
                    action = OverlayAction::Close;
                }
            });

        if interactive && ctx.input(|input| input.key_pressed(Key::Escape)) {
            action = OverlayAction::Close;
        }
        action
    }

    fn paint_card(
        &self,
        ui: &Ui,
        frame: &CardFrame,
        node: &SystemNode,
        graph: &SystemGraph,
        layer: Layer,
        close_local: Rect,
    ) {
        let painter = ui.painter();
        let card = &self.card;
        let card_local = Rect::from_min_size(Pos2::ZERO, card.card_size);
        let card_screen = frame.rect(card_local);
        let text_scale = frame.text_scale();
        let accent = kind_accent(node.kind);

        painter.rect_filled(
            card_screen.expand(6.0),
            CornerRadius::same(16),
            with_opacity(FOCUS_GLOW, 0.18 * frame.opacity),
        );
        painter.rect_filled(card_screen, CornerRadius::same(12), with_opacity(CARD_FILL, frame.opacity));
        painter.rect_stroke(
            card_screen,
            CornerRadius::same(12),
            Stroke::new(1.5, with_opacity(accent, frame.opacity)),
            StrokeKind::Inside,
        );

        let text = |local: Pos2, value: &str, size: f32, color: Color32| {
            painter.text(
                frame.point(local),
                Align2::LEFT_TOP,
                value,
                FontId::proportional(size * text_scale),
                with_opacity(color, frame.opacity),
            );
        };

        text(pos2(20.0, 18.0), &node.label, 20.0, TEXT_STRONG);
        let mut subtitle = node.kind.label().to_owned();
        if let Some(team) = &node.team {
            subtitle.push_str(&format!("  ·  team {}", team.name));
        }
        let team_color = node
            .team
            .as_ref()
            .and_then(|team| parse_hex_color(&team.color))
            .unwrap_or(accent);
        text(pos2(20.0, 46.0), &subtitle, 13.0, team_color);
        if !node.description.is_empty() {
            text(pos2(20.0, 68.0), &node.description, 13.0, TEXT_WEAK);
        }

        let mut y = 100.0;
        for line in layer_lines(node, layer) {
            match line {
                CardLine::Text { text: value, color } => text(pos2(20.0, y), &value, 13.0, color),
                CardLine::Usage { cpu, memory } => {
                    for (index, (label, value)) in [("CPU", cpu), ("MEM", memory)].into_iter().enumerate() {
                        let x = 20.0 + index as f32 * 170.0;
                        text(pos2(x, y), label, 12.0, TEXT_WEAK);
                        let track = Rect::from_min_size(pos2(x + 36.0, y + 4.0), vec2(110.0, 8.0));
                        let fill = Rect::from_min_size(
                            track.min,
                            vec2(track.width() * (value / 100.0).clamp(0.0, 1.0), track.height()),
                        );
                        painter.rect_filled(frame.rect(track), 3.0, with_opacity(CARD_BORDER, frame.opacity));
                        painter.rect_filled(frame.rect(fill), 3.0, with_opacity(accent, frame.opacity));
                    }
                }
            }
            y += 22.0;
        }

        let arena_local = Rect::from_min_size(
            pos2(card.arena_padding_x, self.arena_top),
            vec2(card.arena_width(), card.arena_height),
        );
        text(
            pos2(card.arena_padding_x, self.arena_top - 22.0),
            &format!("Features ({})", node.features.len()),
            13.0,
            TEXT_STRONG,
        );
        painter.rect_stroke(
            frame.rect(arena_local),
            CornerRadius::same(8),
            Stroke::new(1.0, with_opacity(CARD_BORDER, frame.opacity)),
            StrokeKind::Inside,
        );

        let edges = graph.edges_for_layer(layer);
        let layout = compute_focus_layout(
            card,
            &node.id,
            &node.features,
            &edges,
            self.angles.get(),
            self.arena_top,
        );

        for connector in &layout.connectors {
            let points = connector.path.map(|local| frame.point(local));
            let stroke = Stroke::new(
                1.2,
                with_opacity(tone_color(connector.tone), 0.8 * frame.opacity),
            );
            painter.extend(Shape::dashed_line(&points, stroke, 6.0, 4.0));
        }

        for (index, (feature, position)) in node
            .features
            .iter()
            .zip(&layout.feature_positions)
            .enumerate()
        {
            let opacity = frame.opacity * self.feature_reveal(index);
            if opacity <= 0.0 {
                continue;
            }
            let scale = self.feature_scale(index);
            let full = card.feature_rect(*position, self.arena_top);
            let local = Rect::from_center_size(full.center(), full.size() * scale);
            let screen = frame.rect(local);
            let text_scale = text_scale * scale;
            painter.rect_filled(screen, CornerRadius::same(8), with_opacity(CARD_FILL, opacity));
            painter.rect_stroke(
                screen,
                CornerRadius::same(8),
                Stroke::new(1.0, with_opacity(health_color(feature.status), opacity)),
                StrokeKind::Inside,
            );
            painter.circle_filled(
                frame.point(local.min + vec2(12.0, 16.0) * scale),
                4.0 * text_scale,
                with_opacity(health_color(feature.status), opacity),
            );
            painter.text(
                frame.point(local.min + vec2(22.0, 9.0) * scale),
                Align2::LEFT_TOP,
                &feature.name,
                FontId::proportional(12.5 * text_scale),
                with_opacity(TEXT_STRONG, opacity),
            );
            painter.text(
                frame.point(local.min + vec2(10.0, 32.0) * scale),
                Align2::LEFT_TOP,
                feature.status.label(),
                FontId::proportional(11.0 * text_scale),
                with_opacity(TEXT_WEAK, opacity),
            );
        }

        for port in &layout.ports {
            let center = frame.point(port.position);
            let color = with_opacity(tone_color(port.tone), frame.opacity);
            painter.circle_filled(center, 5.0 * text_scale, color);
            painter.circle_stroke(
                center,
                5.0 * text_scale,
                Stroke::new(1.0, with_opacity(CARD_FILL, frame.opacity)),
            );

            let label = graph
                .node(&port.neighbor_id)
                .map_or(port.neighbor_id.as_str(), |neighbor| neighbor.label.as_str());
            let inward = (card_local.center() - port.position).normalized() * 14.0;
            painter.text(
                frame.point(port.position + inward),
                Align2::CENTER_CENTER,
                label,
                FontId::proportional(11.0 * text_scale),
                with_opacity(TEXT_WEAK, frame.opacity),
            );
        }

        let close_screen = frame.rect(close_local);
        painter.text(
            close_screen.center(),
            Align2::CENTER_CENTER,
            "×",
            FontId::proportional(16.0 * text_scale),
            with_opacity(TEXT_STRONG, frame.opacity),
        );
    }
}

/// Maps card-local coordinates to the screen for the current hero progress.
struct CardFrame {
    origin: Pos2,
    hero: HeroTransform,
    progress: f32,
    opacity: f32,
}

impl CardFrame {
    fn point(&self, local: Pos2) -> Pos2 {
        self.origin + self.hero.apply(local, self.progress).to_vec2()
    }

    fn rect(&self, local: Rect) -> Rect {
        self.hero
            .apply_rect(local, self.progress)
            .translate(self.origin.to_vec2())
    }

    fn text_scale(&self) -> f32 {
        let scale = self.hero.scale_at(self.progress);
        (scale.x * scale.y).sqrt().max(0.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles() -> NeighborAngles {
        NeighborAngles::from([("orders-db".to_owned(), 1.0)])
    }

    #[test]
    fn latches_late_angles_and_ignores_clearing() {
        let mut source = Published::new();
        let mut overlay = FocusOverlay::open("orders-service".to_owned(), None, &source);
        assert!(overlay.angles.get().is_none());

        source.publish(angles());
        overlay.follow(&source);
        assert_eq!(overlay.angles.get(), Some(&angles()));

        source.clear();
        overlay.follow(&source);
        assert_eq!(overlay.angles.get(), Some(&angles()));
    }

    #[test]
    fn closing_reverses_from_the_current_progress() {
        let source = Published::new();
        let mut overlay = FocusOverlay::open("orders-service".to_owned(), None, &source);

        overlay.advance(0.3);
        let partway = overlay.progress();
        assert!(partway > 0.0 && partway < 1.0);

        overlay.close();
        assert!((overlay.progress() - partway).abs() < 1e-6);
        assert!(!overlay.is_finished());

        overlay.advance(0.3);
        assert!(overlay.progress() < partway);

        overlay.advance(1.0);
        assert_eq!(overlay.progress(), 0.0);
        assert!(overlay.is_finished());
    }

    #[test]
    fn features_fade_in_with_a_stagger() {
        let source = Published::new();
        let mut overlay = FocusOverlay::open("orders-service".to_owned(), None, &source);

        overlay.advance(0.25);
        assert!(overlay.feature_reveal(0) < 1e-3);

        overlay.advance(0.2);
        assert!((overlay.feature_reveal(0) - 0.125).abs() < 1e-3);
        assert!(overlay.feature_reveal(0) > overlay.feature_reveal(1));
        assert!(overlay.feature_reveal(3) < 1e-3);

        overlay.advance(1.0);
        assert!((overlay.feature_reveal(3) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn features_grow_from_four_fifths_scale() {
        let source = Published::new();
        let mut overlay = FocusOverlay::open("orders-service".to_owned(), None, &source);

        assert!((overlay.feature_scale(0) - 0.8).abs() < 1e-5);

        overlay.advance(0.45);
        assert!((overlay.feature_scale(0) - 0.825).abs() < 1e-3);
        assert!(overlay.feature_scale(0) > overlay.feature_scale(1));

        overlay.advance(1.0);
        assert!((overlay.feature_scale(0) - 1.0).abs() < 1e-5);
        assert!((overlay.feature_scale(5) - 1.0).abs() < 1e-5);
    }
}
