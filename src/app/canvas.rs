use std::collections::HashMap;
use std::time::Duration;

use eframe::egui::{Pos2, Rect, Vec2};

use crate::system::EntityId;
use crate::zoom::{NeighborAngles, NodeGeometry, Viewport, ViewportHost};

use super::animation::{Easing, Tween, lerp};

struct ViewportTween {
    from: Viewport,
    to: Viewport,
    tween: Tween,
}

/// Pan/zoom substrate behind the graph view.
///
/// Viewport coordinates are relative to the top-left of the canvas rect, so
/// screen position = `rect.min + viewport.world_to_canvas(world)`.
pub(super) struct Canvas {
    viewport: Viewport,
    animation: Option<ViewportTween>,
    rect: Rect,
    geometry: HashMap<EntityId, NodeGeometry>,
}

impl Canvas {
    pub(super) const MIN_ZOOM: f32 = 0.2;
    pub(super) const MAX_ZOOM: f32 = 4.0;

    pub(super) fn new() -> Self {
        Self {
            viewport: Viewport::IDENTITY,
            animation: None,
            rect: Rect::from_min_size(Pos2::ZERO, Vec2::new(1280.0, 800.0)),
            geometry: HashMap::new(),
        }
    }

    /// Records the canvas rect for this frame and advances any viewport
    /// animation. Returns true while an animation is still running.
    pub(super) fn begin_frame(&mut self, rect: Rect, dt_secs: f32) -> bool {
        self.rect = rect;

        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        animation.tween.update(dt_secs);
        let t = animation.tween.progress();
        self.viewport = Viewport {
            x: lerp(animation.from.x, animation.to.x, t),
            y: lerp(animation.from.y, animation.to.y, t),
            zoom: lerp(animation.from.zoom, animation.to.zoom, t),
        };

        if animation.tween.is_complete() {
            self.viewport = animation.to;
            self.animation = None;
            return false;
        }
        true
    }

    pub(super) fn rect(&self) -> Rect {
        self.rect
    }

    pub(super) fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub(super) fn native_wheel(&mut self, screen_cursor: Pos2, scroll: f32) {
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        let zoom = self.viewport.zoom * zoom_factor;
        let cursor = self.to_canvas(screen_cursor);
        let next = self.viewport.zoomed_around(cursor, self.clamp_zoom(zoom));
        self.set_viewport(next, Duration::ZERO);
    }

    pub(super) fn pan_by(&mut self, delta: Vec2) {
        let viewport = self.viewport;
        self.set_viewport(
            Viewport::new(viewport.x + delta.x, viewport.y + delta.y, viewport.zoom),
            Duration::ZERO,
        );
    }

    /// Zoom and pan so `bounds` (world units) fills the canvas with a margin.
    pub(super) fn fit(&mut self, bounds: Rect, duration: Duration) {
        if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return;
        }
        let available = self.rect.size() * 0.9;
        let zoom = self.clamp_zoom((available.x / bounds.width()).min(available.y / bounds.height()));
        let canvas_center = (self.rect.size() / 2.0).to_pos2();
        let target = Viewport::new(0.0, 0.0, zoom).centered_on(bounds.center(), canvas_center);
        self.set_viewport(target, duration);
    }

    pub(super) fn zoom_step(&mut self, factor: f32, duration: Duration) {
        let target = self.animation.as_ref().map_or(self.viewport, |animation| animation.to);
        let canvas_center = (self.rect.size() / 2.0).to_pos2();
        let next = target.zoomed_around(canvas_center, self.clamp_zoom(target.zoom * factor));
        self.set_viewport(next, duration);
    }

    pub(super) fn center_on(&mut self, world: Pos2, duration: Duration) {
        let canvas_center = (self.rect.size() / 2.0).to_pos2();
        let next = self.viewport.centered_on(world, canvas_center);
        self.set_viewport(next, duration);
    }

    pub(super) fn visible_world_rect(&self) -> Rect {
        Rect::from_two_pos(
            self.viewport.canvas_to_world(Pos2::ZERO),
            self.viewport.canvas_to_world(self.rect.size().to_pos2()),
        )
    }

    pub(super) fn to_canvas(&self, screen: Pos2) -> Pos2 {
        (screen - self.rect.min).to_pos2()
    }

    pub(super) fn world_rect_to_screen(&self, world: Rect) -> Rect {
        self.viewport
            .world_rect_to_canvas(world)
            .translate(self.rect.min.to_vec2())
    }

    pub(super) fn set_geometry(&mut self, id: &str, geometry: NodeGeometry) {
        self.geometry.insert(id.to_owned(), geometry);
    }

    pub(super) fn clear_geometry(&mut self) {
        self.geometry.clear();
    }

    pub(super) fn screen_rect_of(&self, id: &str) -> Option<Rect> {
        let geometry = self.geometry.get(id)?;
        let size = geometry.measured_size?;
        Some(self.world_rect_to_screen(Rect::from_min_size(geometry.position, size)))
    }

    fn world_center_of(&self, id: &str) -> Option<Pos2> {
        let geometry = self.geometry.get(id)?;
        Some(geometry.position + geometry.measured_size.unwrap_or(Vec2::ZERO) / 2.0)
    }

    /// Direction from `id` to each neighbor, y pointing down. Neighbors without
    /// geometry are left out. `None` when `id` itself has no geometry.
    pub(super) fn neighbor_angles(&self, id: &str, neighbors: &[EntityId]) -> Option<NeighborAngles> {
        let center = self.world_center_of(id)?;
        let angles = neighbors
            .iter()
            .filter_map(|neighbor| {
                let delta = self.world_center_of(neighbor)? - center;
                Some((neighbor.clone(), delta.y.atan2(delta.x)))
            })
            .collect();
        Some(angles)
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        zoom.clamp(Self::MIN_ZOOM, Self::MAX_ZOOM)
    }
}

impl ViewportHost for Canvas {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport, duration: Duration) {
        let viewport = Viewport {
            zoom: self.clamp_zoom(viewport.zoom),
            ..viewport
        };

        if duration.is_zero() {
            self.animation = None;
            self.viewport = viewport;
            return;
        }

        self.animation = Some(ViewportTween {
            from: self.viewport,
            to: viewport,
            tween: Tween::new(duration, Easing::InOutSine),
        });
    }

    fn min_zoom(&self) -> f32 {
        Self::MIN_ZOOM
    }

    fn canvas_size(&self) -> Vec2 {
        self.rect.size()
    }

    fn node_geometry(&self, id: &str) -> Option<NodeGeometry> {
        self.geometry.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI};

    use eframe::egui::{pos2, vec2};

    use super::*;

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new();
        canvas.begin_frame(Rect::from_min_size(pos2(200.0, 40.0), vec2(1000.0, 700.0)), 0.0);
        canvas
    }

    #[test]
    fn immediate_writes_cancel_running_animations() {
        let mut canvas = canvas();
        canvas.set_viewport(Viewport::new(300.0, 0.0, 1.0), Duration::from_millis(550));
        assert!(canvas.is_animating());

        canvas.set_viewport(Viewport::new(5.0, 6.0, 1.2), Duration::ZERO);

        assert!(!canvas.is_animating());
        assert_eq!(canvas.viewport(), Viewport::new(5.0, 6.0, 1.2));
    }

    #[test]
    fn animated_viewport_reaches_its_target() {
        let mut canvas = canvas();
        let target = Viewport::new(-400.0, 120.0, 1.1);
        canvas.set_viewport(target, Duration::from_millis(550));

        let rect = canvas.rect();
        assert!(canvas.begin_frame(rect, 0.2));
        let midway = canvas.viewport();
        assert!(midway.x < 0.0 && midway.x > -400.0);

        assert!(!canvas.begin_frame(rect, 0.5));
        assert_eq!(canvas.viewport(), target);
    }

    #[test]
    fn later_animation_supersedes_earlier_one() {
        let mut canvas = canvas();
        let rect = canvas.rect();
        canvas.set_viewport(Viewport::new(500.0, 0.0, 1.0), Duration::from_millis(550));
        canvas.begin_frame(rect, 0.1);

        let second = Viewport::new(0.0, 300.0, 0.85);
        canvas.set_viewport(second, Duration::from_millis(400));
        canvas.begin_frame(rect, 1.0);

        assert_eq!(canvas.viewport(), second);
    }

    #[test]
    fn native_wheel_keeps_cursor_anchored_and_clamps() {
        let mut canvas = canvas();
        let cursor = pos2(600.0, 300.0);
        let world_before = canvas.viewport().canvas_to_world(canvas.to_canvas(cursor));

        canvas.native_wheel(cursor, 50.0);

        let viewport = canvas.viewport();
        assert!((viewport.zoom - 1.09).abs() < 1e-5);
        let world_after = viewport.canvas_to_world(canvas.to_canvas(cursor));
        assert!((world_after - world_before).length() < 1e-3);

        for _ in 0..200 {
            canvas.native_wheel(cursor, 500.0);
        }
        assert_eq!(canvas.viewport().zoom, Canvas::MAX_ZOOM);
    }

    #[test]
    fn screen_mapping_includes_the_canvas_offset() {
        let mut canvas = canvas();
        canvas.set_viewport(Viewport::new(10.0, 20.0, 2.0), Duration::ZERO);

        let mapped = canvas.world_rect_to_screen(Rect::from_min_size(pos2(5.0, 5.0), vec2(1.0, 1.0)));
        assert_eq!(mapped.min, pos2(220.0, 70.0));

        canvas.set_geometry(
            "orders",
            NodeGeometry {
                position: pos2(0.0, 0.0),
                measured_size: Some(vec2(100.0, 50.0)),
            },
        );
        let rect = canvas.screen_rect_of("orders").expect("geometry recorded");
        assert_eq!(rect.min, pos2(210.0, 60.0));
        assert_eq!(rect.size(), vec2(200.0, 100.0));
    }

    #[test]
    fn zoom_steps_keep_the_canvas_center_fixed() {
        let mut canvas = canvas();
        canvas.set_viewport(Viewport::new(-120.0, 35.0, 1.0), Duration::ZERO);
        let middle = canvas.rect().center();
        let world_before = canvas.viewport().canvas_to_world(canvas.to_canvas(middle));

        canvas.zoom_step(1.2, Duration::ZERO);
        canvas.zoom_step(1.2, Duration::ZERO);

        let viewport = canvas.viewport();
        assert!((viewport.zoom - 1.44).abs() < 1e-5);
        let world_after = viewport.canvas_to_world(canvas.to_canvas(middle));
        assert!((world_after - world_before).length() < 1e-3);

        canvas.zoom_step(0.01, Duration::ZERO);
        assert_eq!(canvas.viewport().zoom, Canvas::MIN_ZOOM);
    }

    #[test]
    fn rapid_zoom_steps_compound_on_the_animation_target() {
        let mut canvas = canvas();
        canvas.zoom_step(1.2, Duration::from_millis(200));
        canvas.zoom_step(1.2, Duration::from_millis(200));

        let rect = canvas.rect();
        canvas.begin_frame(rect, 1.0);
        assert!((canvas.viewport().zoom - 1.44).abs() < 1e-5);
    }

    #[test]
    fn centering_moves_the_point_under_the_middle() {
        let mut canvas = canvas();
        canvas.set_viewport(Viewport::new(0.0, 0.0, 2.0), Duration::ZERO);

        canvas.center_on(pos2(400.0, -50.0), Duration::ZERO);

        let visible = canvas.visible_world_rect();
        assert!((visible.center() - pos2(400.0, -50.0)).length() < 1e-3);
        assert!((visible.width() - 500.0).abs() < 1e-3);
        assert!((visible.height() - 350.0).abs() < 1e-3);
    }

    #[test]
    fn neighbor_angles_point_from_center_to_center() {
        let mut canvas = canvas();
        let size = Some(vec2(100.0, 100.0));
        for (id, position) in [
            ("orders", pos2(0.0, 0.0)),
            ("payments", pos2(0.0, 300.0)),
            ("catalog", pos2(-300.0, 0.0)),
        ] {
            canvas.set_geometry(
                id,
                NodeGeometry {
                    position,
                    measured_size: size,
                },
            );
        }

        let neighbors = ["payments", "catalog", "missing"].map(str::to_owned);
        let angles = canvas
            .neighbor_angles("orders", &neighbors)
            .expect("center known");

        assert_eq!(angles.len(), 2);
        assert!((angles["payments"] - FRAC_PI_2).abs() < 1e-5);
        assert!((angles["catalog"].abs() - PI).abs() < 1e-5);
        assert!(canvas.neighbor_angles("missing", &neighbors).is_none());
    }
}
