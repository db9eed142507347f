use std::time::Duration;

use eframe::egui::{self, Color32, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, Vec2, pos2, vec2};

use crate::system::Layer;

use super::super::ViewModel;
use super::super::animation::{Easing, Tween};
use super::super::render_utils::{
    CARD_BORDER, DRAFT, FOCUS_GLOW, TEXT_WEAK, blend_color, layer_tint, with_opacity,
};

const TINT_FADE: Duration = Duration::from_millis(700);
const MINIMAP_SIZE: Vec2 = vec2(160.0, 110.0);
const MINIMAP_INSET: f32 = 6.0;
const MINIMAP_FILL: Color32 = Color32::from_rgb(14, 17, 22);
const MINIMAP_NODE: Color32 = Color32::from_rgb(92, 98, 120);
const CHROME_MARGIN: f32 = 16.0;
const CONTROL_SIZE: f32 = 26.0;
const ZOOM_STEP: f32 = 1.2;
const ZOOM_STEP_DURATION: Duration = Duration::from_millis(200);

/// Canvas tint, fading between layers.
pub(in crate::app) struct Backdrop {
    from: Color32,
    to: Color32,
    fade: Option<Tween>,
}

impl Backdrop {
    pub(in crate::app) fn new(layer: Layer) -> Self {
        let tint = layer_tint(layer);
        Self {
            from: tint,
            to: tint,
            fade: None,
        }
    }

    pub(in crate::app) fn retarget(&mut self, layer: Layer) {
        self.from = self.color();
        self.to = layer_tint(layer);
        self.fade = Some(Tween::new(TINT_FADE, Easing::InOutSine));
    }

    pub(in crate::app) fn advance(&mut self, dt_secs: f32) -> bool {
        let Some(fade) = self.fade.as_mut() else {
            return false;
        };
        fade.update(dt_secs);
        if fade.is_complete() {
            self.fade = None;
            return false;
        }
        true
    }

    pub(in crate::app) fn color(&self) -> Color32 {
        match &self.fade {
            Some(fade) => blend_color(self.from, self.to, fade.progress()),
            None => self.to,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum ZoomControl {
    In,
    Out,
    Fit,
}

impl ZoomControl {
    const ALL: [ZoomControl; 3] = [ZoomControl::In, ZoomControl::Out, ZoomControl::Fit];

    fn label(self) -> &'static str {
        match self {
            Self::In => "+",
            Self::Out => "−",
            Self::Fit => "fit",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Self::In => "Zoom in",
            Self::Out => "Zoom out",
            Self::Fit => "Fit the graph to the view",
        }
    }
}

/// World bounds scaled into the minimap frame, aspect ratio kept.
struct MiniMap {
    scale: f32,
    offset: Vec2,
}

impl MiniMap {
    fn new(frame: Rect, bounds: Rect) -> Option<Self> {
        if !bounds.is_finite() || bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            return None;
        }
        let inner = frame.shrink(MINIMAP_INSET);
        let scale = (inner.width() / bounds.width()).min(inner.height() / bounds.height());
        let offset = inner.center().to_vec2() - bounds.center().to_vec2() * scale;
        Some(Self { scale, offset })
    }

    fn to_map(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.scale + self.offset).to_pos2()
    }

    fn to_map_rect(&self, world: Rect) -> Rect {
        Rect::from_min_max(self.to_map(world.min), self.to_map(world.max))
    }

    fn to_world(&self, map: Pos2) -> Pos2 {
        ((map.to_vec2() - self.offset) / self.scale).to_pos2()
    }
}

fn minimap_frame(canvas: Rect) -> Rect {
    Rect::from_min_size(
        pos2(
            canvas.left() + CHROME_MARGIN,
            canvas.bottom() - CHROME_MARGIN - MINIMAP_SIZE.y,
        ),
        MINIMAP_SIZE,
    )
}

fn controls_frame(canvas: Rect) -> Rect {
    let size = vec2(CONTROL_SIZE, CONTROL_SIZE * ZoomControl::ALL.len() as f32);
    Rect::from_min_size(canvas.right_bottom() - size - Vec2::splat(CHROME_MARGIN), size)
}

pub(in crate::app) fn chrome_contains(canvas: Rect, pointer: Pos2) -> bool {
    minimap_frame(canvas).contains(pointer) || controls_frame(canvas).contains(pointer)
}

impl ViewModel {
    pub(in crate::app) fn draw_minimap(&mut self, ui: &mut Ui, canvas_rect: Rect) {
        let (Some(cache), Some(bounds)) = (self.graph_cache.as_ref(), self.graph_bounds()) else {
            return;
        };
        let visible = self.canvas.visible_world_rect();
        let frame = minimap_frame(canvas_rect);
        let Some(map) = MiniMap::new(frame, bounds.union(visible)) else {
            return;
        };

        let response = ui.interact(frame, ui.id().with("minimap"), Sense::click_and_drag());
        let painter = ui.painter_at(frame);
        painter.rect_filled(frame, 6.0, with_opacity(MINIMAP_FILL, 0.92));
        for node in &cache.nodes {
            let color = if self.interaction.is_expanded(&node.id) {
                FOCUS_GLOW
            } else if node.is_draft {
                DRAFT
            } else {
                MINIMAP_NODE
            };
            let world = Rect::from_min_size(node.world_pos, node.size);
            painter.rect_filled(map.to_map_rect(world), 1.0, color);
        }
        painter.rect_stroke(
            map.to_map_rect(visible),
            1.0,
            Stroke::new(1.0, TEXT_WEAK),
            StrokeKind::Inside,
        );
        painter.rect_stroke(frame, 6.0, Stroke::new(1.0, CARD_BORDER), StrokeKind::Inside);

        if (response.clicked() || response.dragged())
            && let Some(pointer) = response.interact_pointer_pos()
        {
            self.canvas.center_on(map.to_world(pointer), Duration::ZERO);
        }
    }

    pub(in crate::app) fn draw_zoom_controls(&mut self, ui: &mut Ui, canvas_rect: Rect) {
        let frame = controls_frame(canvas_rect);
        for (index, control) in ZoomControl::ALL.into_iter().enumerate() {
            let rect = Rect::from_min_size(
                frame.min + vec2(0.0, index as f32 * CONTROL_SIZE),
                Vec2::splat(CONTROL_SIZE),
            );
            let response = ui.put(rect, egui::Button::new(control.label()));
            if response.on_hover_text(control.hint()).clicked() {
                self.apply_zoom_control(control);
            }
        }
    }

    pub(in crate::app) fn apply_zoom_control(&mut self, control: ZoomControl) {
        log::debug!("zoom control: {control:?}");
        match control {
            ZoomControl::In => self.canvas.zoom_step(ZOOM_STEP, ZOOM_STEP_DURATION),
            ZoomControl::Out => self.canvas.zoom_step(1.0 / ZOOM_STEP, ZOOM_STEP_DURATION),
            ZoomControl::Fit => self.needs_fit = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewSettings;
    use crate::system::{GraphSource, load_system_graph};
    use crate::zoom::{ViewportHost, ZoomThresholds};

    #[test]
    fn minimap_keeps_world_bounds_inside_its_frame() {
        let frame = Rect::from_min_size(pos2(16.0, 600.0), MINIMAP_SIZE);
        let bounds = Rect::from_min_max(pos2(-200.0, 0.0), pos2(1400.0, 500.0));
        let map = MiniMap::new(frame, bounds).expect("bounds have area");

        let mapped = map.to_map_rect(bounds);
        assert!(frame.contains_rect(mapped));
        assert!((mapped.width() - (MINIMAP_SIZE.x - 2.0 * MINIMAP_INSET)).abs() < 1e-3);
        assert!((mapped.center() - frame.center()).length() < 1e-3);

        let clicked = map.to_world(frame.center());
        assert!((clicked - bounds.center()).length() < 1e-2);
    }

    #[test]
    fn minimap_needs_bounds_with_area() {
        let frame = Rect::from_min_size(Pos2::ZERO, MINIMAP_SIZE);
        let flat = Rect::from_min_max(pos2(0.0, 10.0), pos2(300.0, 10.0));
        assert!(MiniMap::new(frame, flat).is_none());
    }

    #[test]
    fn chrome_sits_in_the_bottom_corners() {
        let canvas = Rect::from_min_size(pos2(0.0, 40.0), vec2(1000.0, 700.0));

        assert!(chrome_contains(canvas, pos2(30.0, 720.0)));
        assert!(chrome_contains(canvas, pos2(970.0, 720.0)));
        assert!(!chrome_contains(canvas, canvas.center()));
    }

    #[test]
    fn backdrop_fades_to_the_new_layer_tint() {
        let mut backdrop = Backdrop::new(Layer::Tracing);
        assert_eq!(backdrop.color(), layer_tint(Layer::Tracing));

        backdrop.retarget(Layer::Building);
        assert!(backdrop.advance(0.35));
        let midway = backdrop.color();
        assert_ne!(midway, layer_tint(Layer::Tracing));
        assert_ne!(midway, layer_tint(Layer::Building));

        assert!(!backdrop.advance(0.4));
        assert_eq!(backdrop.color(), layer_tint(Layer::Building));
    }

    #[test]
    fn zoom_controls_step_and_request_a_fit() {
        let graph = load_system_graph(&GraphSource::Demo).expect("demo graph loads");
        let mut model = ViewModel::new(
            graph,
            ViewSettings {
                layer: Layer::Platform,
                thresholds: ZoomThresholds::default(),
            },
        );
        model.needs_fit = false;
        let rect = model.canvas.rect();

        model.apply_zoom_control(ZoomControl::In);
        model.canvas.begin_frame(rect, 1.0);
        assert!((model.canvas.viewport().zoom - ZOOM_STEP).abs() < 1e-5);

        model.apply_zoom_control(ZoomControl::Out);
        model.canvas.begin_frame(rect, 1.0);
        assert!((model.canvas.viewport().zoom - 1.0).abs() < 1e-5);

        model.apply_zoom_control(ZoomControl::Fit);
        assert!(model.needs_fit);
    }
}
