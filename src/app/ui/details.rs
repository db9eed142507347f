use eframe::egui::{self, Color32, ProgressBar, RichText, Ui};

use crate::system::{Layer, SystemNode};
use crate::util::{format_latency, format_percent};

use super::super::ViewModel;
use super::super::render_utils::{health_color, kind_accent, parse_hex_color, trace_color};

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.interaction.selected().map(str::to_owned) else {
            ui.label("Select a node on the canvas.");
            return;
        };

        let Some(node) = self.graph.node(&selected_id) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        ui.label(RichText::new(&node.label).strong().size(16.0));
        ui.horizontal(|ui| {
            ui.colored_label(kind_accent(node.kind), node.kind.label());
            if let Some(team) = &node.team {
                let color = parse_hex_color(&team.color).unwrap_or(Color32::GRAY);
                ui.colored_label(color, format!("team {}", team.name));
            }
            if node.is_draft() {
                ui.colored_label(Color32::from_rgb(250, 204, 21), "draft");
            }
        });
        ui.small(node.id.as_str());
        if !node.description.is_empty() {
            ui.add_space(4.0);
            ui.label(node.description.as_str());
        }

        ui.separator();
        ui.label(RichText::new(format!("{} layer", self.layer.label())).strong());
        draw_layer_block(ui, node, self.layer);

        ui.separator();
        ui.label(RichText::new(format!("Features ({})", node.features.len())).strong());
        if node.features.is_empty() {
            ui.label("No features documented for this node.");
        }
        for feature in &node.features {
            ui.horizontal(|ui| {
                ui.colored_label(health_color(feature.status), "●");
                ui.label(feature.name.as_str());
            });
            if !feature.description.is_empty() {
                ui.small(feature.description.as_str());
            }
        }

        ui.separator();
        let neighbors = self.graph.neighbors(&selected_id, self.layer);
        ui.label(RichText::new(format!("Connections ({})", neighbors.len())).strong());
        let mut next_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("connections_scroll")
            .max_height(260.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for neighbor_id in &neighbors {
                    let label = self
                        .graph
                        .node(neighbor_id)
                        .map_or(neighbor_id.as_str(), |neighbor| neighbor.label.as_str());
                    if ui.link(label).on_hover_text(neighbor_id.as_str()).clicked() {
                        next_selection = Some(neighbor_id.clone());
                    }
                }
            });

        if let Some(id) = next_selection {
            self.set_selected(Some(id));
        }
    }
}

fn draw_layer_block(ui: &mut Ui, node: &SystemNode, layer: Layer) {
    match layer {
        Layer::Tracing => match &node.tracing {
            Some(tracing) => {
                ui.horizontal(|ui| {
                    ui.label(format!("latency {}", format_latency(tracing.latency_ms)));
                    ui.colored_label(trace_color(tracing.status), tracing.status.label());
                });
                if let Some(message) = &tracing.error_message {
                    ui.colored_label(trace_color(tracing.status), message.as_str());
                }
            }
            None => {
                ui.label("No traces recorded.");
            }
        },
        Layer::Building => match &node.building {
            Some(building) if building.is_draft => {
                if let Some(ticket) = &building.ticket_id {
                    ui.label(format!("ticket {ticket}"));
                }
                if let Some(proposer) = &building.proposed_by {
                    ui.label(format!("proposed by {proposer}"));
                }
                if let Some(description) = &building.description {
                    ui.label(description.as_str());
                }
            }
            _ => {
                ui.label("Live component. Propose changes from a draft.");
            }
        },
        Layer::Platform => match &node.platform {
            Some(platform) => {
                ui.horizontal(|ui| {
                    ui.colored_label(health_color(platform.health), platform.health.label());
                    ui.label(platform.version.as_str());
                });
                ui.add(
                    ProgressBar::new(platform.cpu.clamp(0.0, 100.0) / 100.0)
                        .text(format!("CPU {}", format_percent(platform.cpu))),
                );
                ui.add(
                    ProgressBar::new(platform.memory.clamp(0.0, 100.0) / 100.0)
                        .text(format!("MEM {}", format_percent(platform.memory))),
                );
                ui.label(format!(
                    "pods {}/{}  |  deployed {}",
                    platform.pods.ready, platform.pods.total, platform.last_deploy
                ));
            }
            None => {
                ui.label("No platform telemetry.");
            }
        },
    }
}
