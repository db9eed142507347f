mod app;
mod layout;
mod system;
mod util;
mod zoom;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::{Parser, ValueEnum};

use crate::system::{GraphSource, Layer};
use crate::zoom::ZoomThresholds;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayerArg {
    Tracing,
    Building,
    Platform,
}

impl From<LayerArg> for Layer {
    fn from(value: LayerArg) -> Self {
        match value {
            LayerArg::Tracing => Layer::Tracing,
            LayerArg::Building => Layer::Building,
            LayerArg::Platform => Layer::Platform,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// System graph JSON file. The bundled demo graph is used when omitted.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Layer shown at startup.
    #[arg(long, value_enum, default_value_t = LayerArg::Tracing)]
    layer: LayerArg,

    /// Zoom at which hovering a node starts the enter cue.
    #[arg(long, default_value_t = ZoomThresholds::CUE_MIN)]
    cue_min: f32,

    /// Zoom at which the hovered node expands.
    #[arg(long, default_value_t = ZoomThresholds::EXPAND_MIN)]
    expand_min: f32,

    /// Width of the exit cue band above the expand zoom.
    #[arg(long, default_value_t = ZoomThresholds::EXIT_CUE_RANGE)]
    exit_cue_range: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let thresholds = ZoomThresholds::new(args.cue_min, args.expand_min, args.exit_cue_range)
        .context("invalid zoom thresholds")?;
    let source = args.graph.map_or(GraphSource::Demo, GraphSource::File);
    let settings = app::ViewSettings {
        layer: args.layer.into(),
        thresholds,
    };

    log::info!("starting flowscope with {source} on the {} layer", settings.layer.label());

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "flowscope",
        options,
        Box::new(move |cc| Ok(Box::new(app::FlowScopeApp::new(cc, source, settings)))),
    )
    .map_err(|error| anyhow!("failed to start the window: {error}"))
}
