use std::time::Duration;

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Pan/zoom transform of the canvas.
///
/// A world point `w` is drawn at `(x, y) + w * zoom`, relative to the canvas origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
}

impl Viewport {
    pub const IDENTITY: Viewport = Viewport {
        x: 0.0,
        y: 0.0,
        zoom: 1.0,
    };

    pub fn new(x: f32, y: f32, zoom: f32) -> Self {
        Self { x, y, zoom }
    }

    pub fn pan(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn world_to_canvas(&self, world: Pos2) -> Pos2 {
        pos2(self.x + world.x * self.zoom, self.y + world.y * self.zoom)
    }

    pub fn canvas_to_world(&self, canvas: Pos2) -> Pos2 {
        pos2((canvas.x - self.x) / self.zoom, (canvas.y - self.y) / self.zoom)
    }

    pub fn world_rect_to_canvas(&self, world: Rect) -> Rect {
        Rect::from_min_max(self.world_to_canvas(world.min), self.world_to_canvas(world.max))
    }

    /// Changes zoom while the canvas point under `cursor` keeps its world position.
    pub fn zoomed_around(&self, cursor: Pos2, new_zoom: f32) -> Viewport {
        let ratio = new_zoom / self.zoom;
        Viewport {
            x: cursor.x - (cursor.x - self.x) * ratio,
            y: cursor.y - (cursor.y - self.y) * ratio,
            zoom: new_zoom,
        }
    }

    /// Same zoom, panned so `world` sits at `canvas_point`.
    pub fn centered_on(&self, world: Pos2, canvas_point: Pos2) -> Viewport {
        Viewport {
            x: canvas_point.x - world.x * self.zoom,
            y: canvas_point.y - world.y * self.zoom,
            zoom: self.zoom,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Position (top-left, world units) and last measured size of a canvas node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeGeometry {
    pub position: Pos2,
    pub measured_size: Option<Vec2>,
}

/// The pan/zoom engine the semantic zoom core cooperates with but does not own.
pub trait ViewportHost {
    fn viewport(&self) -> Viewport;

    /// `Duration::ZERO` applies immediately; anything longer animates and
    /// supersedes whatever animation is in flight.
    fn set_viewport(&mut self, viewport: Viewport, duration: Duration);

    fn min_zoom(&self) -> f32;

    /// Size of the visible canvas, in canvas units.
    fn canvas_size(&self) -> Vec2;

    fn node_geometry(&self, id: &str) -> Option<NodeGeometry>;
}
