//! Semantic zoom: wheel interception, the expansion lock and focus layout.
//!
//! Nothing here draws. The canvas plugs in through [`ViewportHost`].

mod controller;
mod focus_layout;
mod geometry;
mod lifecycle;
mod state;
mod thresholds;
mod viewport;

pub use controller::{WheelEvent, WheelInterceptor, WheelOutcome, ZoomRegime};
pub use focus_layout::{CardGeometry, HeroTransform, PortTone, compute_focus_layout};
pub use geometry::NeighborAngles;
pub use lifecycle::{ExpandedFootprint, ExpansionController, ExpansionPhase, LifecycleEvent};
pub use state::{InteractionState, Latch, Published};
pub use thresholds::ZoomThresholds;
pub use viewport::{NodeGeometry, Viewport, ViewportHost};
