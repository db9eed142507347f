use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2, Vec2};

use crate::system::{EntityId, GraphSource, Layer, SystemGraph, TraceStatus, load_system_graph};
use crate::zoom::{
    ExpansionController, InteractionState, NeighborAngles, Published, WheelInterceptor,
    ZoomThresholds,
};

mod animation;
mod canvas;
mod graph;
mod overlay;
mod render_utils;
mod ui;

use canvas::Canvas;
use graph::Backdrop;
use overlay::FocusOverlay;

#[derive(Clone, Copy, Debug)]
pub struct ViewSettings {
    pub layer: Layer,
    pub thresholds: ZoomThresholds,
}

pub struct FlowScopeApp {
    source: GraphSource,
    settings: ViewSettings,
    state: AppState,
    reload_rx: Option<Receiver<Result<SystemGraph, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<SystemGraph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    graph: SystemGraph,
    layer: Layer,
    backdrop: Backdrop,
    canvas: Canvas,
    interaction: InteractionState,
    interceptor: WheelInterceptor,
    expansion: ExpansionController,
    neighbor_angles: Published<NeighborAngles>,
    angles_due: Option<EntityId>,
    overlay: Option<FocusOverlay>,
    graph_dirty: bool,
    graph_cache: Option<RenderGraph>,
    needs_fit: bool,
}

struct RenderGraph {
    nodes: Vec<RenderNode>,
    edges: Vec<RenderEdge>,
    index_by_id: HashMap<EntityId, usize>,
}

struct RenderNode {
    id: EntityId,
    world_pos: Pos2,
    size: Vec2,
    is_draft: bool,
}

struct RenderEdge {
    source: usize,
    target: usize,
    is_draft: bool,
    status: Option<TraceStatus>,
}

impl FlowScopeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, source: GraphSource, settings: ViewSettings) -> Self {
        let state = Self::start_load(source.clone());
        Self {
            source,
            settings,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(source: GraphSource) -> Receiver<Result<SystemGraph, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_system_graph(&source).map_err(|error| {
                log::error!("failed to load system graph: {error:#}");
                format!("{error:#}")
            });
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(source: GraphSource) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(source),
        }
    }

    fn ready(&self, graph: SystemGraph) -> AppState {
        AppState::Ready(Box::new(ViewModel::new(graph, self.settings)))
    }
}

impl eframe::App for FlowScopeApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(graph)) => transition = Some(Ok(graph)),
                    Ok(Err(error)) => transition = Some(Err(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading(format!("Loading system graph from {}...", self.source));
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                let mut retry = false;
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the system graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        retry = true;
                    }
                });
                if retry {
                    self.state = Self::start_load(self.source.clone());
                    return;
                }
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &self.source, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.source.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => transition = Some(result),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition =
                                Some(Err("Background load worker disconnected".to_owned()));
                        }
                    }
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(graph) => self.ready(graph),
                Err(error) => AppState::Error(error),
            };
        }
    }
}
