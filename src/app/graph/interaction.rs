use std::collections::HashSet;

use eframe::egui::{self, Pos2, Rect, Ui};

use crate::zoom::{LifecycleEvent, ViewportHost, WheelEvent, WheelOutcome};

use super::super::ViewModel;
use super::super::overlay::FocusOverlay;

impl ViewModel {
    pub(in crate::app) fn canvas_zoom(&self) -> f32 {
        self.canvas.viewport().zoom
    }

    pub(in crate::app) fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect) {
        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        let Some(pointer) = ui.input(|input| input.pointer.hover_pos()) else {
            return;
        };
        if rect.contains(pointer) {
            self.route_wheel(pointer, scroll);
        }
    }

    /// The semantic zoom interceptor sees the wheel first. The plain zoom
    /// only runs when it passes the event through.
    pub(in crate::app) fn route_wheel(&mut self, pointer: Pos2, scroll: f32) -> Option<WheelOutcome> {
        let event = WheelEvent::from_scroll(self.canvas.to_canvas(pointer), scroll)?;
        let outcome = self
            .interceptor
            .intercept(event, &self.interaction, &mut self.canvas);
        if outcome == WheelOutcome::PassThrough {
            self.canvas.native_wheel(pointer, scroll);
        }
        Some(outcome)
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.canvas.pan_by(response.drag_delta());
        }
    }

    pub(in crate::app) fn hovered_node(
        &self,
        pointer: Option<Pos2>,
        screen_rects: &[(usize, Rect)],
    ) -> Option<String> {
        let pointer = pointer?;
        let cache = self.graph_cache.as_ref()?;
        let zoom = self.canvas_zoom();
        screen_rects
            .iter()
            .rev()
            .filter(|(_, rect)| rect.contains(pointer))
            .filter_map(|(index, _)| cache.nodes.get(*index))
            .find(|node| {
                self.expansion
                    .phase(&node.id, &self.interaction, zoom)
                    .is_interactive()
            })
            .map(|node| node.id.clone())
    }

    pub(in crate::app) fn apply_hover(&mut self, hovered: Option<String>) {
        if self.interaction.hovered() != hovered.as_deref() {
            self.interaction.set_hovered(hovered);
        }
    }

    pub(in crate::app) fn apply_graph_selection(&mut self, selected: Option<String>) {
        self.set_selected(selected);
    }

    pub(in crate::app) fn publish_due_angles(&mut self) {
        let Some(id) = self.angles_due.take() else {
            return;
        };
        if !self.interaction.is_expanded(&id) {
            return;
        }

        let neighbors = self.graph.neighbors(&id, self.layer);
        if let Some(angles) = self.canvas.neighbor_angles(&id, &neighbors) {
            log::debug!("published {} neighbor angles for {id}", angles.len());
            self.neighbor_angles.publish(angles);
        }
    }

    pub(in crate::app) fn sync_expansion(&mut self) {
        let Some(cache) = self.graph_cache.as_ref() else {
            return;
        };
        let graph = &self.graph;
        let shown = |id: &str| cache.index_by_id.contains_key(id);
        let released = self.expansion.release_if_absent(&mut self.interaction, shown);
        let event = match released {
            LifecycleEvent::Unchanged => {
                self.expansion.observe(&mut self.interaction, &mut self.canvas, |id| {
                    shown(id) && graph.node(id).is_some_and(|node| node.has_features())
                })
            }
            released => released,
        };
        self.apply_lifecycle_event(event);
    }

    /// Drops hover and focus on nodes the current layer no longer shows.
    pub(in crate::app) fn release_hidden_focus(&mut self) {
        let shown = self
            .graph
            .nodes_for_layer(self.layer)
            .into_iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        let hidden_hover = self
            .interaction
            .hovered()
            .is_some_and(|id| !shown.contains(id));
        let event = self
            .expansion
            .release_if_absent(&mut self.interaction, |id| shown.contains(id));
        if hidden_hover {
            self.apply_hover(None);
        }
        self.apply_lifecycle_event(event);
    }

    pub(in crate::app) fn exit_focus(&mut self) {
        let event = self
            .expansion
            .exit_focus(&mut self.interaction, &mut self.canvas);
        self.apply_lifecycle_event(event);
    }

    fn apply_lifecycle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Unchanged => {}
            LifecycleEvent::Locked { id, previous } => {
                if let Some(previous) = previous {
                    log::debug!("focus moved from {previous} to {id}");
                }
                self.neighbor_angles.clear();
                self.angles_due = Some(id.clone());
                let captured = self.canvas.screen_rect_of(&id);
                self.overlay = Some(FocusOverlay::open(id, captured, &self.neighbor_angles));
            }
            LifecycleEvent::Released(_) => {
                self.angles_due = None;
                self.neighbor_angles.clear();
                if let Some(overlay) = self.overlay.as_mut() {
                    overlay.close();
                }
            }
        }
    }
}
