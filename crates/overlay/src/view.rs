//! Composition root: scheduler → sync client → snapshot → animator → frame.
//!
//! The view is the single writer of the overlay snapshot. Render cycles run
//! on the tokio runtime and hand their outcomes back over a channel that is
//! drained inside [`TerrainMapView::update`], so every state change happens
//! on the caller's thread in frame order.

use std::sync::Arc;
use std::time::Duration;

use foundation::time::Time;
use layers::composite::OverlayFrame;
use layers::raster::MapLayer;
use layers::readout::ElevationReadout;
use runtime::event_bus::{Event, EventBus, EventKind};
use runtime::frame::Frame;
use runtime::metrics::Metrics;
use runtime::scheduler::RenderScheduler;
use streaming::client::TerrainRenderer;
use streaming::protocol::{AircraftPosition, DisplaySettings};
use streaming::sync::{
    ActivationEpoch, CycleAbandoned, RenderOutcome, RenderResult, RenderSyncClient, SessionGuard,
};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::animator::{TransitionAnimator, animator_for};
use crate::config::{MapSize, OverlayConfig};
use crate::inputs::DisplayInputs;
use crate::state::MapVisualizationState;

pub mod metric {
    pub const RENDER_REQUESTED: &str = "render.requested";
    pub const RENDER_COMPLETED: &str = "render.completed";
    pub const RENDER_ABANDONED: &str = "render.abandoned";
    pub const RENDER_STALE_DROPPED: &str = "render.stale_dropped";
    pub const RENDER_POLL_ATTEMPTS: &str = "render.poll_attempts";
    pub const POLL_ATTEMPTS_PER_CYCLE: &str = "render.poll_attempts_per_cycle";
    pub const TRANSITION_STARTED: &str = "transition.started";
    pub const TRANSITION_FINISHED: &str = "transition.finished";
}

/// Everything that exists only while the overlay is active.
struct OverlaySession {
    guard: SessionGuard,
    state: Arc<MapVisualizationState>,
    scheduler: RenderScheduler,
    animator: Box<dyn TransitionAnimator>,
    outcome_tx: mpsc::UnboundedSender<RenderOutcome>,
    outcomes: mpsc::UnboundedReceiver<RenderOutcome>,
    cycle_in_flight: bool,
    map_size: MapSize,
    now: Time,
}

impl OverlaySession {
    fn publish(&mut self, next: MapVisualizationState) {
        self.state = Arc::new(next);
    }

    /// Keeps the render loop alive after a cycle produced nothing.
    fn rearm_if_idle(&mut self) {
        if !self.state.transition_in_progress && !self.cycle_in_flight && !self.scheduler.is_armed()
        {
            self.scheduler.arm();
        }
    }
}

pub struct TerrainMapView {
    config: OverlayConfig,
    renderer: Arc<dyn TerrainRenderer>,
    sync: Arc<RenderSyncClient>,
    runtime: Handle,
    epoch: ActivationEpoch,
    inputs: DisplayInputs,
    session: Option<OverlaySession>,
    frame: Option<Frame>,
    events: EventBus,
    metrics: Metrics,
}

impl TerrainMapView {
    pub fn new(config: OverlayConfig, renderer: Arc<dyn TerrainRenderer>, runtime: Handle) -> Self {
        let sync = Arc::new(RenderSyncClient::new(
            Arc::clone(&renderer),
            config.side,
            config.poll_delay,
            config.transition.fetch_mode(),
        ));
        Self {
            config,
            renderer,
            sync,
            runtime,
            epoch: ActivationEpoch::new(),
            inputs: DisplayInputs::default(),
            session: None,
            frame: None,
            events: EventBus::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn inputs(&self) -> DisplayInputs {
        self.inputs
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Latest published snapshot; `None` while the overlay is inactive.
    pub fn state(&self) -> Option<Arc<MapVisualizationState>> {
        self.session.as_ref().map(|s| Arc::clone(&s.state))
    }

    pub fn is_animating(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.animator.is_active())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Hands recorded events to the host and forgets them.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    fn current_frame(&self) -> Frame {
        self.frame.unwrap_or_else(|| Frame::first(Duration::ZERO))
    }

    /// Reactive entry point for mode, range, gear and on/off changes.
    pub fn set_inputs(&mut self, inputs: DisplayInputs) {
        if inputs == self.inputs {
            return;
        }
        let was_active = self.inputs.overlay_active();
        self.inputs = inputs;
        let now_active = inputs.overlay_active();

        match (was_active, now_active) {
            (false, true) => self.activate(),
            (true, false) => self.deactivate(),
            (true, true) => {
                if let Some(session) = self.session.as_mut() {
                    session.map_size = inputs.map_size(&self.config);
                }
                self.push_settings(inputs.display_settings(&self.config));
            }
            (false, false) => {}
        }
    }

    fn activate(&mut self) {
        if self.session.is_some() {
            return;
        }
        let guard = self.epoch.begin();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let mut scheduler = RenderScheduler::new(self.config.rerender_timeout);
        scheduler.arm_with(self.config.activation_delay);
        let state = MapVisualizationState::initial().with_countdown(scheduler.remaining());

        info!(
            "terrain overlay {:?} activated (session {})",
            self.config.side,
            guard.generation()
        );
        self.session = Some(OverlaySession {
            guard,
            state: Arc::new(state),
            scheduler,
            animator: animator_for(&self.config),
            outcome_tx,
            outcomes,
            cycle_in_flight: false,
            map_size: self.inputs.map_size(&self.config),
            now: Time::ZERO,
        });
        self.events
            .emit(self.current_frame(), EventKind::Activated, self.config.side.as_query());
        self.push_settings(self.inputs.display_settings(&self.config));
    }

    /// Drops the whole session. Outstanding cycles notice the epoch change
    /// and their outcomes have nowhere left to go.
    fn deactivate(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        self.epoch.end();
        session.animator.cancel();
        session.scheduler.disarm();
        info!("terrain overlay {:?} deactivated", self.config.side);
        self.events
            .emit(self.current_frame(), EventKind::Deactivated, self.config.side.as_query());
        self.push_settings(self.inputs.display_settings(&self.config));
    }

    /// Fire-and-forget PATCH of the aircraft position.
    pub fn forward_position(&self, position: AircraftPosition) {
        let renderer = Arc::clone(&self.renderer);
        self.runtime.spawn(async move {
            if let Err(err) = renderer.update_position(position).await {
                debug!("position update failed: {err}");
            }
        });
    }

    fn push_settings(&self, settings: DisplaySettings) {
        let renderer = Arc::clone(&self.renderer);
        let side = self.config.side;
        self.runtime.spawn(async move {
            if let Err(err) = renderer.push_display_settings(side, settings).await {
                debug!("display settings push for {side:?} failed: {err}");
            }
        });
    }

    /// Per-frame entry point.
    pub fn update(&mut self, dt: Duration) {
        let frame = match self.frame {
            Some(prev) => prev.next(dt),
            None => Frame::first(dt),
        };
        self.frame = Some(frame);

        let Some(mut session) = self.session.take() else {
            return;
        };
        session.now = session.now.advanced_by(dt);

        while let Ok(outcome) = session.outcomes.try_recv() {
            session.cycle_in_flight = false;
            self.apply_outcome(&mut session, frame, outcome);
        }

        if session.animator.tick(dt).is_some() {
            self.finish_transition(&mut session, frame);
        }

        if session.scheduler.tick(dt).is_some() {
            self.request_render(&mut session, frame);
        }

        if session.state.rerender_countdown != session.scheduler.remaining() {
            let next = session.state.with_countdown(session.scheduler.remaining());
            session.publish(next);
        }

        self.session = Some(session);
    }

    fn request_render(&mut self, session: &mut OverlaySession, frame: Frame) {
        if session.cycle_in_flight {
            return;
        }
        session.cycle_in_flight = true;
        self.metrics.inc(metric::RENDER_REQUESTED);
        self.events
            .emit(frame, EventKind::RenderRequested, format!("t={:.2}", session.now.0));
        self.sync.spawn_cycle(
            &self.runtime,
            session.guard.clone(),
            session.outcome_tx.clone(),
        );
    }

    fn apply_outcome(&mut self, session: &mut OverlaySession, frame: Frame, outcome: RenderOutcome) {
        match outcome {
            Ok(result) => self.apply_result(session, frame, result),
            Err(reason) => {
                self.metrics.inc(metric::RENDER_ABANDONED);
                self.events
                    .emit(frame, EventKind::RenderAbandoned, reason.to_string());
                if reason != CycleAbandoned::Cancelled {
                    session.rearm_if_idle();
                }
            }
        }
    }

    fn apply_result(&mut self, session: &mut OverlaySession, frame: Frame, result: RenderResult) {
        self.metrics.inc(metric::RENDER_COMPLETED);
        self.metrics
            .add(metric::RENDER_POLL_ATTEMPTS, u64::from(result.poll_attempts));
        self.metrics
            .record(metric::POLL_ATTEMPTS_PER_CYCLE, u64::from(result.poll_attempts));
        self.events
            .emit(frame, EventKind::RenderResult, format!("token {}", result.token));

        let Some(map) = result.payload.destination().cloned() else {
            self.metrics.inc(metric::RENDER_ABANDONED);
            self.events
                .emit(frame, EventKind::RenderAbandoned, "empty map payload");
            session.rearm_if_idle();
            return;
        };

        match session
            .state
            .begin_transition(result.token, map, result.bands, session.now)
        {
            Ok(next) => {
                session.publish(next);
                session.animator.start(&result.payload, session.map_size);
                self.metrics.inc(metric::TRANSITION_STARTED);
                self.events.emit(
                    frame,
                    EventKind::TransitionStarted,
                    format!("token {}", result.token),
                );
                debug!("transition to token {} started", result.token);
            }
            Err(stale) => {
                self.metrics.inc(metric::RENDER_STALE_DROPPED);
                self.events
                    .emit(frame, EventKind::StaleResultDropped, stale.to_string());
                debug!("dropped render result: {stale}");
                session.rearm_if_idle();
            }
        }
    }

    fn finish_transition(&mut self, session: &mut OverlaySession, frame: Frame) {
        let next = session.state.finish_transition();
        session.publish(next);
        session.scheduler.arm();
        self.metrics.inc(metric::TRANSITION_FINISHED);
        let token = session
            .state
            .current_token
            .map(|t| t.to_string())
            .unwrap_or_default();
        self.events
            .emit(frame, EventKind::TransitionFinished, format!("token {token}"));
        debug!("transition to token {token} finished");
    }

    /// The layered overlay graphic for the current snapshot.
    pub fn compose(&self) -> OverlayFrame {
        let Some(session) = self.session.as_ref() else {
            return OverlayFrame::empty();
        };
        let state = &session.state;

        let mut layers = Vec::new();
        if let Some(shown) = state.displayed_map() {
            layers.push(MapLayer::opaque(shown.clone()));
        }
        if state.transition_in_progress {
            layers.extend(session.animator.layers());
        }

        OverlayFrame {
            layers,
            readout: Some(ElevationReadout::from_bands(
                &state.last_elevation_bands,
                &self.config.palette,
            )),
        }
    }
}

impl Drop for TerrainMapView {
    fn drop(&mut self) {
        if self.session.is_some() {
            self.epoch.end();
        }
    }
}
