use std::time::Duration;

use eframe::egui::{Pos2, Vec2, vec2};

use crate::system::EntityId;

use super::state::InteractionState;
use super::thresholds::ZoomThresholds;
use super::viewport::{NodeGeometry, ViewportHost};

/// Where a single entity stands in the semantic zoom lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpansionPhase {
    Idle,
    Cued,
    Expanded,
    ExitCue,
    /// Another entity holds the lock.
    Suppressed,
}

impl ExpansionPhase {
    pub fn of(id: &str, state: &InteractionState, zoom: f32, thresholds: &ZoomThresholds) -> Self {
        match state.expanded() {
            Some(expanded) if expanded == id => {
                if thresholds.in_exit_cue_band(zoom) {
                    Self::ExitCue
                } else {
                    Self::Expanded
                }
            }
            Some(_) => Self::Suppressed,
            None if state.is_hovered(id) && thresholds.in_cue_band(zoom) => Self::Cued,
            None => Self::Idle,
        }
    }

    pub fn is_interactive(self) -> bool {
        self != Self::Suppressed
    }

    /// Exit cue is the lower band of the expanded state.
    pub fn holds_lock(self) -> bool {
        matches!(self, Self::Expanded | Self::ExitCue)
    }
}

/// Size the recenter targets for an expanded node card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpandedFootprint {
    pub width: f32,
    pub extra_height: f32,
    pub fallback_height: f32,
}

impl ExpandedFootprint {
    pub const DEFAULT: ExpandedFootprint = ExpandedFootprint {
        width: 340.0,
        extra_height: 80.0,
        fallback_height: 160.0,
    };

    pub fn size(&self, measured: Option<Vec2>) -> Vec2 {
        let height = measured.map_or(self.fallback_height, |size| size.y);
        vec2(self.width, height + self.extra_height)
    }

    pub fn center(&self, geometry: &NodeGeometry) -> Pos2 {
        geometry.position + self.size(geometry.measured_size) / 2.0
    }
}

impl Default for ExpandedFootprint {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    Unchanged,
    Locked {
        id: EntityId,
        previous: Option<EntityId>,
    },
    Released(EntityId),
}

/// Owns the expansion lock. Nothing else writes `InteractionState::expanded`.
#[derive(Clone, Debug)]
pub struct ExpansionController {
    thresholds: ZoomThresholds,
    footprint: ExpandedFootprint,
    recenter_duration: Duration,
    exit_duration: Duration,
    rearm_pending: bool,
}

impl ExpansionController {
    pub const RECENTER_DURATION: Duration = Duration::from_millis(550);
    pub const EXIT_DURATION: Duration = Duration::from_millis(400);

    pub fn new(thresholds: ZoomThresholds) -> Self {
        Self {
            thresholds,
            footprint: ExpandedFootprint::DEFAULT,
            recenter_duration: Self::RECENTER_DURATION,
            exit_duration: Self::EXIT_DURATION,
            rearm_pending: false,
        }
    }

    pub fn thresholds(&self) -> &ZoomThresholds {
        &self.thresholds
    }

    pub fn phase(&self, id: &str, state: &InteractionState, zoom: f32) -> ExpansionPhase {
        ExpansionPhase::of(id, state, zoom, &self.thresholds)
    }

    /// True after an explicit exit until zoom falls below the expand threshold.
    #[cfg(test)]
    pub fn is_disarmed(&self) -> bool {
        self.rearm_pending
    }

    /// Re-evaluates the lock against the live triple. Call on every frame and
    /// after every zoom change; repeated calls with unchanged input do nothing.
    pub fn observe<H: ViewportHost>(
        &mut self,
        state: &mut InteractionState,
        host: &mut H,
        has_detail: impl Fn(&str) -> bool,
    ) -> LifecycleEvent {
        let zoom = host.viewport().zoom;
        let below_expand = zoom < self.thresholds.expand_min;

        if self.rearm_pending && below_expand {
            log::debug!("expansion re-armed at zoom {zoom:.3}");
            self.rearm_pending = false;
        }

        if let Some(expanded) = state.expanded().map(str::to_owned) {
            if below_expand {
                if state.release_expanded_if(&expanded) {
                    log::info!("released focus on {expanded} at zoom {zoom:.3}");
                    return LifecycleEvent::Released(expanded);
                }
                return LifecycleEvent::Unchanged;
            }
        }

        if below_expand || self.rearm_pending {
            return LifecycleEvent::Unchanged;
        }

        let Some(hovered) = state.hovered().map(str::to_owned) else {
            return LifecycleEvent::Unchanged;
        };
        if state.is_expanded(&hovered) || !has_detail(&hovered) {
            return LifecycleEvent::Unchanged;
        }

        let previous = state.lock_expanded(&hovered);
        log::info!("locked focus on {hovered} at zoom {zoom:.3}");
        self.recenter(&hovered, host);

        LifecycleEvent::Locked {
            id: hovered,
            previous,
        }
    }

    /// Drops the lock when the expanded entity is no longer on the canvas.
    /// The viewport is left alone and re-locking stays armed.
    pub fn release_if_absent(
        &mut self,
        state: &mut InteractionState,
        is_present: impl Fn(&str) -> bool,
    ) -> LifecycleEvent {
        let Some(expanded) = state.expanded().map(str::to_owned) else {
            return LifecycleEvent::Unchanged;
        };
        if is_present(&expanded) || !state.release_expanded_if(&expanded) {
            return LifecycleEvent::Unchanged;
        }

        log::info!("released focus on {expanded}, it is no longer shown");
        LifecycleEvent::Released(expanded)
    }

    /// Explicit exit from the focus view: drops the lock, keeps it from
    /// re-engaging until zoom has left the expanded bands and animates out
    /// to the cue threshold.
    pub fn exit_focus<H: ViewportHost>(
        &mut self,
        state: &mut InteractionState,
        host: &mut H,
    ) -> LifecycleEvent {
        let Some(expanded) = state.take_expanded() else {
            return LifecycleEvent::Unchanged;
        };
        self.rearm_pending = true;

        let viewport = host.viewport();
        let center = (host.canvas_size() / 2.0).to_pos2();
        let target_zoom = self.thresholds.cue_min.max(host.min_zoom());
        host.set_viewport(viewport.zoomed_around(center, target_zoom), self.exit_duration);

        log::info!("exited focus on {expanded}");
        LifecycleEvent::Released(expanded)
    }

    fn recenter<H: ViewportHost>(&self, id: &str, host: &mut H) {
        let Some(geometry) = host.node_geometry(id) else {
            log::debug!("no geometry for {id}, skipping recenter");
            return;
        };

        let viewport = host.viewport();
        let world_center = self.footprint.center(&geometry);
        let canvas_center = (host.canvas_size() / 2.0).to_pos2();
        let target = viewport.centered_on(world_center, canvas_center);

        log::debug!(
            "recentering on {id}: ({:.1}, {:.1}) at zoom {:.3}",
            target.x,
            target.y,
            target.zoom
        );
        host.set_viewport(target, self.recenter_duration);
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::system::{Feature, HealthStatus};
    use crate::zoom::controller::tests::FakeHost;
    use crate::zoom::controller::{WheelEvent, WheelIntent, WheelInterceptor, WheelOutcome};
    use crate::zoom::focus_layout::{CardGeometry, compute_focus_layout};
    use crate::zoom::geometry::NeighborAngles;

    fn hovering(id: &str) -> InteractionState {
        let mut state = InteractionState::default();
        state.set_hovered(Some(id.to_owned()));
        state
    }

    fn host_with(zoom: f32, nodes: &[(&str, Pos2, Option<Vec2>)]) -> FakeHost {
        let mut host = FakeHost::at_zoom(zoom);
        for (id, position, measured_size) in nodes {
            host.nodes.insert(
                (*id).to_owned(),
                NodeGeometry {
                    position: *position,
                    measured_size: *measured_size,
                },
            );
        }
        host
    }

    fn feature(id: &str, connected: &[&str]) -> Feature {
        Feature {
            id: id.to_owned(),
            name: id.to_owned(),
            description: String::new(),
            status: HealthStatus::Healthy,
            connected_node_ids: connected.iter().map(|value| (*value).to_owned()).collect(),
            team: None,
        }
    }

    #[test]
    fn locks_once_and_recenters_without_changing_zoom() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = hovering("orders");
        let mut host = host_with(1.1, &[("orders", pos2(400.0, 200.0), Some(vec2(220.0, 140.0)))]);

        let event = controller.observe(&mut state, &mut host, |_| true);

        assert_eq!(
            event,
            LifecycleEvent::Locked {
                id: "orders".to_owned(),
                previous: None
            }
        );
        assert_eq!(state.expanded(), Some("orders"));
        assert_eq!(host.calls.len(), 1);

        let (target, duration) = host.calls[0];
        assert_eq!(duration, ExpansionController::RECENTER_DURATION);
        assert_eq!(target.zoom, 1.1);
        // Footprint 340 x 220 centered on the 1280 x 800 canvas.
        let center = target.world_to_canvas(pos2(400.0 + 170.0, 200.0 + 110.0));
        assert!((center.x - 640.0).abs() < 1e-3 && (center.y - 400.0).abs() < 1e-3);

        assert_eq!(
            controller.observe(&mut state, &mut host, |_| true),
            LifecycleEvent::Unchanged
        );
        assert_eq!(host.calls.len(), 1);
    }

    #[test]
    fn missing_geometry_still_locks_without_recenter() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = hovering("ghost");
        let mut host = FakeHost::at_zoom(1.3);

        let event = controller.observe(&mut state, &mut host, |_| true);

        assert!(matches!(event, LifecycleEvent::Locked { .. }));
        assert!(host.calls.is_empty());
    }

    #[test]
    fn entities_without_detail_never_lock() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = hovering("user-db");
        let mut host = host_with(1.5, &[("user-db", pos2(0.0, 0.0), None)]);

        let event = controller.observe(&mut state, &mut host, |id| id != "user-db");

        assert_eq!(event, LifecycleEvent::Unchanged);
        assert_eq!(state.expanded(), None);
    }

    #[test]
    fn a_new_lock_supersedes_the_previous_one() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = hovering("orders");
        let mut host = host_with(
            1.4,
            &[
                ("orders", pos2(0.0, 0.0), None),
                ("catalog", pos2(600.0, 0.0), None),
            ],
        );
        controller.observe(&mut state, &mut host, |_| true);

        state.set_hovered(Some("catalog".to_owned()));
        let event = controller.observe(&mut state, &mut host, |_| true);

        assert_eq!(
            event,
            LifecycleEvent::Locked {
                id: "catalog".to_owned(),
                previous: Some("orders".to_owned())
            }
        );
        assert_eq!(controller.phase("catalog", &state, 1.4), ExpansionPhase::Expanded);
        assert_eq!(controller.phase("orders", &state, 1.4), ExpansionPhase::Suppressed);
        assert_eq!(host.animated_calls(), 2);
    }

    #[test]
    fn zooming_below_expand_releases_the_lock() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = hovering("orders");
        let mut host = host_with(1.1, &[("orders", pos2(0.0, 0.0), None)]);
        controller.observe(&mut state, &mut host, |_| true);

        host.viewport.zoom = 1.15;
        assert_eq!(controller.phase("orders", &state, 1.15), ExpansionPhase::ExitCue);
        assert_eq!(
            controller.observe(&mut state, &mut host, |_| true),
            LifecycleEvent::Unchanged
        );

        host.viewport.zoom = 1.09;
        let event = controller.observe(&mut state, &mut host, |_| true);

        assert_eq!(event, LifecycleEvent::Released("orders".to_owned()));
        assert_eq!(state.expanded(), None);
        assert_eq!(controller.phase("orders", &state, 1.09), ExpansionPhase::Cued);
    }

    #[test]
    fn explicit_exit_disarms_until_zoom_drops() {
        let thresholds = ZoomThresholds::default();
        let mut controller = ExpansionController::new(thresholds);
        let mut state = hovering("orders");
        let mut host = host_with(1.5, &[("orders", pos2(0.0, 0.0), None)]);
        controller.observe(&mut state, &mut host, |_| true);

        let event = controller.exit_focus(&mut state, &mut host);

        assert_eq!(event, LifecycleEvent::Released("orders".to_owned()));
        assert!(controller.is_disarmed());
        let (target, duration) = host.calls[host.calls.len() - 1];
        assert_eq!(target.zoom, thresholds.cue_min);
        assert_eq!(duration, ExpansionController::EXIT_DURATION);

        // Still hovered and zoomed in while the exit animation runs.
        host.viewport.zoom = 1.3;
        assert_eq!(
            controller.observe(&mut state, &mut host, |_| true),
            LifecycleEvent::Unchanged
        );
        assert_eq!(state.expanded(), None);

        host.viewport.zoom = 1.0;
        controller.observe(&mut state, &mut host, |_| true);
        assert!(!controller.is_disarmed());

        host.viewport.zoom = 1.1;
        assert!(matches!(
            controller.observe(&mut state, &mut host, |_| true),
            LifecycleEvent::Locked { .. }
        ));
    }

    #[test]
    fn exit_without_lock_does_nothing() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = InteractionState::default();
        let mut host = FakeHost::at_zoom(1.0);

        assert_eq!(
            controller.exit_focus(&mut state, &mut host),
            LifecycleEvent::Unchanged
        );
        assert!(!controller.is_disarmed());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn lock_on_a_hidden_entity_is_released_in_place() {
        let mut controller = ExpansionController::new(ZoomThresholds::default());
        let mut state = hovering("drafted");
        let mut host = host_with(1.3, &[("drafted", pos2(0.0, 0.0), None)]);
        controller.observe(&mut state, &mut host, |_| true);
        let calls_before = host.calls.len();

        assert_eq!(
            controller.release_if_absent(&mut state, |id| id == "drafted"),
            LifecycleEvent::Unchanged
        );
        assert_eq!(state.expanded(), Some("drafted"));

        let event = controller.release_if_absent(&mut state, |_| false);

        assert_eq!(event, LifecycleEvent::Released("drafted".to_owned()));
        assert_eq!(state.expanded(), None);
        assert!(!controller.is_disarmed());
        assert_eq!(host.calls.len(), calls_before);
        assert_eq!(
            controller.release_if_absent(&mut state, |_| false),
            LifecycleEvent::Unchanged
        );
    }

    #[test]
    fn hover_then_wheel_from_cue_to_expanded() {
        let thresholds = ZoomThresholds::default();
        let mut interceptor = WheelInterceptor::new(thresholds);
        let mut controller = ExpansionController::new(thresholds);
        let mut state = InteractionState::default();
        let mut host = host_with(0.9, &[("orders", pos2(300.0, 180.0), Some(vec2(220.0, 150.0)))]);

        let features = [
            feature("checkout", &["payments"]),
            feature("refunds", &["payments"]),
            feature("history", &["events"]),
        ];
        let has_detail = |id: &str| id == "orders";

        let mut phases = vec![controller.phase("orders", &state, host.viewport.zoom)];
        let mut record = |phase: ExpansionPhase| {
            if phases.last() != Some(&phase) {
                phases.push(phase);
            }
        };

        controller.observe(&mut state, &mut host, has_detail);
        state.set_hovered(Some("orders".to_owned()));
        controller.observe(&mut state, &mut host, has_detail);
        record(controller.phase("orders", &state, host.viewport.zoom));

        let mut events = 0;
        while state.expanded().is_none() {
            let wheel = WheelEvent {
                cursor: pos2(500.0, 300.0),
                intent: WheelIntent::ZoomIn,
            };
            let outcome = interceptor.intercept(wheel, &state, &mut host);
            assert_eq!(outcome, WheelOutcome::Consumed);
            controller.observe(&mut state, &mut host, has_detail);
            record(controller.phase("orders", &state, host.viewport.zoom));
            events += 1;
            assert!(events < 1000, "never expanded");
        }

        for _ in 0..5 {
            controller.observe(&mut state, &mut host, has_detail);
        }

        assert_eq!(phases.len(), 3);
        assert_eq!(phases[0], ExpansionPhase::Idle);
        assert_eq!(phases[1], ExpansionPhase::Cued);
        assert!(phases[2].holds_lock());
        assert_eq!(host.viewport.zoom, thresholds.expand_min);
        assert_eq!(host.animated_calls(), 1);

        let card = CardGeometry::DEFAULT;
        let angles = NeighborAngles::from([
            ("payments".to_owned(), 0.0),
            ("events".to_owned(), PI),
        ]);
        let layout = compute_focus_layout(
            &card,
            "orders",
            &features,
            &[],
            Some(&angles),
            card.default_arena_top(),
        );
        let gap = card.min_gap();
        for (i, a) in layout.feature_positions.iter().enumerate() {
            for b in &layout.feature_positions[i + 1..] {
                let overlapping =
                    (b.x - a.x).abs() < gap.x - 1e-3 && (b.y - a.y).abs() < gap.y - 1e-3;
                assert!(!overlapping, "{a:?} overlaps {b:?}");
            }
        }
    }
}
