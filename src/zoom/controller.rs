use std::time::Duration;

use eframe::egui::Pos2;

use super::state::InteractionState;
use super::thresholds::ZoomThresholds;
use super::viewport::ViewportHost;

/// How the current hover/expansion/zoom triple treats wheel input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomRegime {
    Normal,
    EnterCue,
    ExpandedExitCue,
    ExpandedDeep,
}

impl ZoomRegime {
    pub fn classify(
        hovered: bool,
        expanded: bool,
        zoom: f32,
        thresholds: &ZoomThresholds,
    ) -> Self {
        if expanded {
            if thresholds.in_deep_band(zoom) {
                return Self::ExpandedDeep;
            }
            if thresholds.in_exit_cue_band(zoom) {
                return Self::ExpandedExitCue;
            }
            return Self::Normal;
        }

        if hovered && thresholds.in_cue_band(zoom) {
            Self::EnterCue
        } else {
            Self::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::EnterCue => "enter cue",
            Self::ExpandedExitCue => "exit cue",
            Self::ExpandedDeep => "focused",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelIntent {
    ZoomIn,
    ZoomOut,
}

/// A wheel tick with the cursor in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    pub cursor: Pos2,
    pub intent: WheelIntent,
}

impl WheelEvent {
    /// `scroll` follows egui: positive scrolls up, which means zoom in.
    pub fn from_scroll(cursor: Pos2, scroll: f32) -> Option<Self> {
        if scroll.abs() <= f32::EPSILON || !scroll.is_finite() {
            return None;
        }
        let intent = if scroll > 0.0 {
            WheelIntent::ZoomIn
        } else {
            WheelIntent::ZoomOut
        };
        Some(Self { cursor, intent })
    }
}

/// What the interceptor did with an event. `Consumed` means the native zoom
/// handler must not see it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WheelOutcome {
    PassThrough,
    Consumed,
}

/// Runs ahead of the canvas' own wheel zoom and replaces it in the cue bands.
#[derive(Clone, Debug)]
pub struct WheelInterceptor {
    thresholds: ZoomThresholds,
    step_fraction: f32,
    last_regime: ZoomRegime,
}

impl WheelInterceptor {
    pub const STEP_FRACTION: f32 = 0.003;

    pub fn new(thresholds: ZoomThresholds) -> Self {
        Self {
            thresholds,
            step_fraction: Self::STEP_FRACTION,
            last_regime: ZoomRegime::Normal,
        }
    }

    #[cfg(test)]
    pub fn last_regime(&self) -> ZoomRegime {
        self.last_regime
    }

    /// Classifies with live state and, when the regime calls for it, applies
    /// a clamped cursor-anchored zoom step through `host` immediately.
    pub fn intercept<H: ViewportHost>(
        &mut self,
        event: WheelEvent,
        state: &InteractionState,
        host: &mut H,
    ) -> WheelOutcome {
        let viewport = host.viewport();
        let regime = ZoomRegime::classify(
            state.hovered().is_some(),
            state.expanded().is_some(),
            viewport.zoom,
            &self.thresholds,
        );
        if regime != self.last_regime {
            log::debug!(
                "wheel regime {} -> {} at zoom {:.3}",
                self.last_regime.label(),
                regime.label(),
                viewport.zoom
            );
            self.last_regime = regime;
        }

        let max_step = viewport.zoom * self.step_fraction;
        let next_zoom = match (regime, event.intent) {
            (ZoomRegime::ExpandedDeep | ZoomRegime::ExpandedExitCue, WheelIntent::ZoomIn) => {
                log::trace!("zoom-in blocked while focused");
                return WheelOutcome::Consumed;
            }
            (ZoomRegime::ExpandedExitCue, WheelIntent::ZoomOut) => {
                (viewport.zoom - max_step).max(host.min_zoom())
            }
            (ZoomRegime::EnterCue, WheelIntent::ZoomIn) => {
                (viewport.zoom + max_step).min(self.thresholds.expand_min)
            }
            _ => return WheelOutcome::PassThrough,
        };

        log::trace!(
            "{} step {:.4} -> {:.4}",
            regime.label(),
            viewport.zoom,
            next_zoom
        );
        host.set_viewport(viewport.zoomed_around(event.cursor, next_zoom), Duration::ZERO);
        WheelOutcome::Consumed
    }
}

#[cfg(test)]
pub(super) mod tests {
    use std::collections::HashMap;

    use eframe::egui::{Vec2, pos2, vec2};

    use super::*;
    use crate::zoom::viewport::{NodeGeometry, Viewport};

    /// Records every viewport write so tests can count recenters.
    #[derive(Debug)]
    pub(in crate::zoom) struct FakeHost {
        pub viewport: Viewport,
        pub min_zoom: f32,
        pub size: Vec2,
        pub nodes: HashMap<String, NodeGeometry>,
        pub calls: Vec<(Viewport, Duration)>,
    }

    impl FakeHost {
        pub fn at_zoom(zoom: f32) -> Self {
            Self {
                viewport: Viewport::new(0.0, 0.0, zoom),
                min_zoom: 0.2,
                size: vec2(1280.0, 800.0),
                nodes: HashMap::new(),
                calls: Vec::new(),
            }
        }

        pub fn animated_calls(&self) -> usize {
            self.calls
                .iter()
                .filter(|(_, duration)| !duration.is_zero())
                .count()
        }
    }

    impl ViewportHost for FakeHost {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn set_viewport(&mut self, viewport: Viewport, duration: Duration) {
            self.viewport = Viewport {
                zoom: viewport.zoom.clamp(self.min_zoom, 4.0),
                ..viewport
            };
            self.calls.push((viewport, duration));
        }

        fn min_zoom(&self) -> f32 {
            self.min_zoom
        }

        fn canvas_size(&self) -> Vec2 {
            self.size
        }

        fn node_geometry(&self, id: &str) -> Option<NodeGeometry> {
            self.nodes.get(id).copied()
        }
    }

    fn state(hovered: Option<&str>, expanded: Option<&str>) -> InteractionState {
        let mut state = InteractionState::default();
        state.set_hovered(hovered.map(str::to_owned));
        if let Some(id) = expanded {
            state.lock_expanded(id);
        }
        state
    }

    fn wheel(intent: WheelIntent) -> WheelEvent {
        WheelEvent {
            cursor: pos2(640.0, 400.0),
            intent,
        }
    }

    #[test]
    fn regimes_partition_every_triple() {
        let thresholds = ZoomThresholds::default();
        let mut zoom = 0.2_f32;
        while zoom <= 4.0 {
            for hovered in [false, true] {
                for expanded in [false, true] {
                    let regime = ZoomRegime::classify(hovered, expanded, zoom, &thresholds);
                    let matches = [
                        !expanded && hovered && thresholds.in_cue_band(zoom),
                        expanded && thresholds.in_exit_cue_band(zoom),
                        expanded && thresholds.in_deep_band(zoom),
                    ];
                    let expected = match matches {
                        [true, false, false] => ZoomRegime::EnterCue,
                        [false, true, false] => ZoomRegime::ExpandedExitCue,
                        [false, false, true] => ZoomRegime::ExpandedDeep,
                        [false, false, false] => ZoomRegime::Normal,
                        other => panic!("overlapping regimes {other:?} at zoom {zoom}"),
                    };
                    assert_eq!(regime, expected, "zoom {zoom} hovered {hovered} expanded {expanded}");
                }
            }
            zoom += 0.0025;
        }
    }

    #[test]
    fn enter_cue_steps_up_and_stops_at_expand_min() {
        let mut interceptor = WheelInterceptor::new(ZoomThresholds::default());
        let state = state(Some("orders"), None);
        let mut host = FakeHost::at_zoom(0.85);

        let mut previous = host.viewport.zoom;
        let mut steps = 0;
        while host.viewport.zoom < ZoomThresholds::EXPAND_MIN {
            let outcome = interceptor.intercept(wheel(WheelIntent::ZoomIn), &state, &mut host);
            assert_eq!(outcome, WheelOutcome::Consumed);
            assert!(host.viewport.zoom > previous);
            assert!(host.viewport.zoom <= ZoomThresholds::EXPAND_MIN);
            assert!(host.viewport.zoom - previous <= previous * 0.003 + 1e-6);
            previous = host.viewport.zoom;
            steps += 1;
            assert!(steps < 1000, "never reached the expand threshold");
        }

        assert_eq!(host.viewport.zoom, ZoomThresholds::EXPAND_MIN);
        assert!(host.calls.iter().all(|(_, duration)| duration.is_zero()));

        // At the threshold the enter cue no longer applies.
        let outcome = interceptor.intercept(wheel(WheelIntent::ZoomIn), &state, &mut host);
        assert_eq!(outcome, WheelOutcome::PassThrough);
    }

    #[test]
    fn enter_cue_passes_zoom_out_through() {
        let mut interceptor = WheelInterceptor::new(ZoomThresholds::default());
        let mut host = FakeHost::at_zoom(0.95);

        let outcome = interceptor.intercept(
            wheel(WheelIntent::ZoomOut),
            &state(Some("orders"), None),
            &mut host,
        );

        assert_eq!(outcome, WheelOutcome::PassThrough);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn focused_blocks_zoom_in_without_touching_viewport() {
        let mut interceptor = WheelInterceptor::new(ZoomThresholds::default());
        for zoom in [1.1, 1.15, 1.5, 3.0] {
            let mut host = FakeHost::at_zoom(zoom);
            let outcome = interceptor.intercept(
                wheel(WheelIntent::ZoomIn),
                &state(None, Some("orders")),
                &mut host,
            );

            assert_eq!(outcome, WheelOutcome::Consumed);
            assert!(host.calls.is_empty());
        }
    }

    #[test]
    fn deep_focus_passes_zoom_out_through() {
        let mut interceptor = WheelInterceptor::new(ZoomThresholds::default());
        let mut host = FakeHost::at_zoom(1.6);

        let outcome = interceptor.intercept(
            wheel(WheelIntent::ZoomOut),
            &state(Some("orders"), Some("orders")),
            &mut host,
        );

        assert_eq!(outcome, WheelOutcome::PassThrough);
    }

    #[test]
    fn exit_cue_slows_zoom_out_and_keeps_cursor_anchored() {
        let mut interceptor = WheelInterceptor::new(ZoomThresholds::default());
        let mut host = FakeHost::at_zoom(1.2);
        host.viewport.x = -150.0;
        host.viewport.y = 35.0;
        let event = WheelEvent {
            cursor: pos2(310.0, 275.0),
            intent: WheelIntent::ZoomOut,
        };
        let world_before = host.viewport.canvas_to_world(event.cursor);

        let outcome = interceptor.intercept(event, &state(None, Some("orders")), &mut host);

        assert_eq!(outcome, WheelOutcome::Consumed);
        assert!((host.viewport.zoom - 1.2 * 0.997).abs() < 1e-6);
        let world_after = host.viewport.canvas_to_world(event.cursor);
        assert!((world_after - world_before).length() < 1e-3);
        assert_eq!(interceptor.last_regime(), ZoomRegime::ExpandedExitCue);
    }

    #[test]
    fn exit_cue_step_is_floored_at_min_zoom() {
        let thresholds = ZoomThresholds::new(0.1, 0.2, 0.5).expect("valid thresholds");
        let mut interceptor = WheelInterceptor::new(thresholds);
        let mut host = FakeHost::at_zoom(0.2);
        host.min_zoom = 0.2;

        let outcome =
            interceptor.intercept(wheel(WheelIntent::ZoomOut), &state(None, Some("a")), &mut host);

        assert_eq!(outcome, WheelOutcome::Consumed);
        assert_eq!(host.viewport.zoom, 0.2);
    }

    #[test]
    fn normal_regime_never_intervenes() {
        let mut interceptor = WheelInterceptor::new(ZoomThresholds::default());
        for (hovered, zoom) in [(None, 0.9), (Some("a"), 0.5), (Some("a"), 1.4)] {
            for intent in [WheelIntent::ZoomIn, WheelIntent::ZoomOut] {
                let mut host = FakeHost::at_zoom(zoom);
                let outcome = interceptor.intercept(wheel(intent), &state(hovered, None), &mut host);
                assert_eq!(outcome, WheelOutcome::PassThrough);
                assert!(host.calls.is_empty());
            }
        }
    }

    #[test]
    fn scroll_sign_maps_to_intent() {
        let cursor = pos2(1.0, 2.0);

        assert_eq!(
            WheelEvent::from_scroll(cursor, 12.0).map(|event| event.intent),
            Some(WheelIntent::ZoomIn)
        );
        assert_eq!(
            WheelEvent::from_scroll(cursor, -3.0).map(|event| event.intent),
            Some(WheelIntent::ZoomOut)
        );
        assert_eq!(WheelEvent::from_scroll(cursor, 0.0), None);
    }
}
