use eframe::egui::{self, Align, Context, Key, Layout};

use crate::system::{GraphSource, Layer, SystemGraph};
use crate::zoom::{
    ExpansionController, InteractionState, Published, ViewportHost, WheelInterceptor, ZoomRegime,
};

use super::super::canvas::Canvas;
use super::super::graph::Backdrop;
use super::super::{ViewModel, ViewSettings};

impl ViewModel {
    pub(in crate::app) fn new(graph: SystemGraph, settings: ViewSettings) -> Self {
        Self {
            graph,
            layer: settings.layer,
            backdrop: Backdrop::new(settings.layer),
            canvas: Canvas::new(),
            interaction: InteractionState::default(),
            interceptor: WheelInterceptor::new(settings.thresholds),
            expansion: ExpansionController::new(settings.thresholds),
            neighbor_angles: Published::new(),
            angles_due: None,
            overlay: None,
            graph_dirty: true,
            graph_cache: None,
            needs_fit: true,
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &GraphSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.handle_layer_keys(ctx);
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("flowscope");
                    ui.separator();
                    for layer in Layer::ALL {
                        let text = format!("{} ({})", layer.label(), layer.persona());
                        if ui.selectable_label(self.layer == layer, text).clicked() {
                            self.set_layer(layer);
                        }
                    }
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("nodes: {}", self.graph.node_count()));
                    ui.label(format!("edges: {}", self.graph.edge_count()));
                    let reload_button = ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if ui.button("Fit view").clicked() {
                        self.needs_fit = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.zoom_status_text());
                    });
                });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    fn zoom_status_text(&self) -> String {
        let zoom = self.canvas.viewport().zoom;
        let regime = ZoomRegime::classify(
            self.interaction.hovered().is_some(),
            self.interaction.expanded().is_some(),
            zoom,
            self.expansion.thresholds(),
        );
        let mut text = format!("zoom {:.0}%  |  {}", zoom * 100.0, regime.label());
        if let Some(expanded) = self.interaction.expanded() {
            text.push_str(&format!("  |  focus: {expanded}"));
        }
        text
    }

    fn handle_layer_keys(&mut self, ctx: &Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input(|input| {
            [Key::Num1, Key::Num2, Key::Num3]
                .into_iter()
                .zip(Layer::ALL)
                .find(|(key, _)| input.key_pressed(*key))
                .map(|(_, layer)| layer)
        });
        if let Some(layer) = pressed {
            self.set_layer(layer);
        }
    }

    pub(in crate::app) fn set_layer(&mut self, layer: Layer) {
        if self.layer == layer {
            return;
        }

        log::info!("switched to the {} layer", layer.label());
        self.layer = layer;
        self.backdrop.retarget(layer);
        self.set_selected(None);
        self.release_hidden_focus();
        self.graph_dirty = true;
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.interaction.selected() == selected.as_deref() {
            return;
        }
        self.interaction.set_selected(selected);
    }
}
