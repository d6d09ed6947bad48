use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use super::event::{decode_event, UpdateEvent};
use super::forwarder::InputForwarder;
use super::reconciler::{Reconciler, SceneAdapter, SceneMirror};

/// The authoritative simulation, consumed through this trait and otherwise
/// opaque. `advance` and `poll_event` may fail; the input sinks are
/// fire-and-forget. After `shutdown`, `advance` and `poll_event` are not
/// called again.
pub trait SimulationHandle {
    fn advance(&mut self) -> Result<(), BoundaryError>;

    /// Next pending event as a tagged value, or the `{"type": 0}` marker
    /// when nothing is pending. May block briefly; well-behaved boundaries
    /// answer the marker after a bounded wait.
    fn poll_event(&mut self) -> Result<Value, BoundaryError>;

    fn pointer_moved(&mut self, x: f64, y: f64, dx: f64, dy: f64);
    fn pointer_down(&mut self);
    fn pointer_up(&mut self);
    fn key_down(&mut self, code: u32);
    fn key_up(&mut self, code: u32);
    fn shutdown(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundaryError {
    #[error("simulation channel disconnected")]
    Disconnected,
    #[error("simulation rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Wall-clock interval between simulation advances.
    pub tick_interval: Duration,
    /// Catch-up cap: at most this many advances per pump, the rest of the
    /// backlog is dropped with a warning.
    pub max_ticks_per_pump: u32,
    /// Drain batch bound per pump.
    pub max_events_per_pump: u32,
    /// Clamp for the wall-clock delta between pumps (debugger pauses, long
    /// stalls) so one slow frame cannot queue a tick burst.
    pub max_pump_delta: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(16),
            max_ticks_per_pump: 5,
            max_events_per_pump: 64,
            max_pump_delta: Duration::from_millis(250),
        }
    }
}

/// What one pump accomplished. Failure counts cover faults that were
/// absorbed; `shut_down` reports the terminal state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PumpReport {
    pub ticks_issued: u32,
    pub events_applied: u32,
    pub decode_failures: u32,
    pub apply_failures: u32,
    pub poll_failures: u32,
    pub dropped_backlog: Duration,
    pub drained_to_idle: bool,
    pub shut_down: bool,
}

/// One scene synchronization session: hosts the tick driver and the drain
/// loop as two cooperative tasks run from `pump`, and owns the mirror via
/// the reconciler. Single-threaded; store mutation only ever happens inside
/// the reconciler's synchronous call stack.
#[derive(Debug)]
pub struct SyncSession<S, A> {
    boundary: S,
    reconciler: Reconciler<A>,
    forwarder: InputForwarder,
    config: SessionConfig,
    accumulator: Duration,
    last_pump: Option<Instant>,
    shut_down: bool,
}

impl<S: SimulationHandle, A: SceneAdapter> SyncSession<S, A> {
    pub fn new(boundary: S, adapter: A, config: SessionConfig) -> Self {
        Self {
            boundary,
            reconciler: Reconciler::new(adapter),
            forwarder: InputForwarder::new(),
            config,
            accumulator: Duration::ZERO,
            last_pump: None,
            shut_down: false,
        }
    }

    pub fn mirror(&self) -> &SceneMirror {
        self.reconciler.mirror()
    }

    pub fn adapter(&self) -> &A {
        self.reconciler.adapter()
    }

    /// Split borrow for rendering: the adapter draws from the mirror.
    pub fn render_parts(&mut self) -> (&SceneMirror, &mut A) {
        self.reconciler.render_parts()
    }

    pub fn boundary(&self) -> &S {
        &self.boundary
    }

    pub fn is_shutdown(&self) -> bool {
        self.shut_down
    }

    /// One cooperative slice: run the tick driver's accumulator, then a
    /// bounded drain batch. Call once per host frame.
    pub fn pump(&mut self) -> PumpReport {
        self.pump_at(Instant::now())
    }

    pub fn pump_at(&mut self, now: Instant) -> PumpReport {
        let mut report = PumpReport::default();
        if self.shut_down {
            report.shut_down = true;
            return report;
        }

        let raw_delta = match self.last_pump.replace(now) {
            Some(previous) => now.saturating_duration_since(previous),
            None => Duration::ZERO,
        };
        self.accumulator = self
            .accumulator
            .saturating_add(raw_delta.min(self.config.max_pump_delta));

        let plan = plan_ticks(
            self.accumulator,
            self.config.tick_interval,
            self.config.max_ticks_per_pump,
        );
        self.accumulator = plan.remaining_accumulator;
        if plan.dropped_backlog > Duration::ZERO {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_pump = self.config.max_ticks_per_pump,
                "tick_backlog_dropped"
            );
            report.dropped_backlog = plan.dropped_backlog;
        }

        // Tick driver: fire-and-forget advances; results arrive through the
        // drain loop. A failing advance is fatal to the whole session.
        for _ in 0..plan.ticks_to_run {
            if let Err(boundary_error) = self.boundary.advance() {
                error!(error = %boundary_error, "simulation_advance_failed");
                self.shutdown();
                report.shut_down = true;
                return report;
            }
            report.ticks_issued += 1;
        }

        // Drain loop: one request in flight at a time; the next request is
        // not issued until the previous event has been fully applied.
        for _ in 0..self.config.max_events_per_pump {
            let value = match self.boundary.poll_event() {
                Ok(value) => value,
                Err(boundary_error) => {
                    warn!(error = %boundary_error, "event_poll_failed");
                    report.poll_failures += 1;
                    break;
                }
            };
            match decode_event(&value) {
                Ok(UpdateEvent::None) => {
                    report.drained_to_idle = true;
                    break;
                }
                Ok(event) => match self.reconciler.apply(event) {
                    Ok(()) => report.events_applied += 1,
                    Err(apply_error) => {
                        warn!(error = %apply_error, "event_apply_rejected");
                        report.apply_failures += 1;
                    }
                },
                Err(decode_error) => {
                    warn!(error = %decode_error, "event_decode_failed");
                    report.decode_failures += 1;
                }
            }
        }

        report
    }

    /// Cooperative shutdown: observed at the top of the next pump, so an
    /// in-flight slice completes but nothing further is scheduled.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.boundary.shutdown();
        info!("session_shutdown");
    }

    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if self.shut_down {
            return;
        }
        self.forwarder.pointer_moved(&mut self.boundary, x, y);
    }

    pub fn pointer_down(&mut self) {
        if self.shut_down {
            return;
        }
        self.forwarder.pointer_down(&mut self.boundary);
    }

    pub fn pointer_up(&mut self) {
        if self.shut_down {
            return;
        }
        self.forwarder.pointer_up(&mut self.boundary);
    }

    pub fn key_down(&mut self, code: u32) {
        if self.shut_down {
            return;
        }
        self.forwarder.key_down(&mut self.boundary, code);
    }

    pub fn key_up(&mut self, code: u32) {
        if self.shut_down {
            return;
        }
        self.forwarder.key_up(&mut self.boundary, code);
    }
}

#[derive(Debug, Clone, Copy)]
struct TickPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_ticks(mut accumulator: Duration, interval: Duration, max_ticks: u32) -> TickPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= interval && ticks_to_run < max_ticks {
        accumulator = accumulator.saturating_sub(interval);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= interval {
        TickPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        TickPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::sync::event::encode_event;
    use crate::sync::geometry::{PointStyle, Position};
    use crate::sync::reconciler::DrawableHandle;
    use crate::sync::store::{EntityKey, RenderRecord};

    #[derive(Debug, Default)]
    struct ScriptedBoundary {
        pending_events: VecDeque<Result<Value, BoundaryError>>,
        advance_faults: VecDeque<BoundaryError>,
        advances: u32,
        polls: u32,
        shutdowns: u32,
    }

    impl ScriptedBoundary {
        fn queue_event(&mut self, event: UpdateEvent) {
            self.pending_events.push_back(Ok(encode_event(&event)));
        }

        fn queue_raw(&mut self, value: Value) {
            self.pending_events.push_back(Ok(value));
        }

        fn queue_poll_failure(&mut self) {
            self.pending_events
                .push_back(Err(BoundaryError::Disconnected));
        }
    }

    impl SimulationHandle for ScriptedBoundary {
        fn advance(&mut self) -> Result<(), BoundaryError> {
            self.advances += 1;
            match self.advance_faults.pop_front() {
                Some(fault) => Err(fault),
                None => Ok(()),
            }
        }

        fn poll_event(&mut self) -> Result<Value, BoundaryError> {
            self.polls += 1;
            self.pending_events
                .pop_front()
                .unwrap_or_else(|| Ok(json!({ "type": 0 })))
        }

        fn pointer_moved(&mut self, _x: f64, _y: f64, _dx: f64, _dy: f64) {}
        fn pointer_down(&mut self) {}
        fn pointer_up(&mut self) {}
        fn key_down(&mut self, _code: u32) {}
        fn key_up(&mut self, _code: u32) {}

        fn shutdown(&mut self) {
            self.shutdowns += 1;
        }
    }

    #[derive(Debug, Default)]
    struct NullAdapter {
        attached: Vec<DrawableHandle>,
        detached: Vec<DrawableHandle>,
    }

    impl SceneAdapter for NullAdapter {
        fn attach(&mut self, handle: DrawableHandle) {
            self.attached.push(handle);
        }

        fn detach(&mut self, handle: DrawableHandle) {
            self.detached.push(handle);
        }
    }

    fn insert_point(key: &str, x: f64, y: f64) -> UpdateEvent {
        UpdateEvent::InsertPoint {
            entity: EntityKey::from(key),
            position: Position { x, y },
            style: PointStyle::default(),
        }
    }

    fn session(boundary: ScriptedBoundary) -> SyncSession<ScriptedBoundary, NullAdapter> {
        SyncSession::new(boundary, NullAdapter::default(), SessionConfig::default())
    }

    #[test]
    fn pump_applies_queued_events_in_order() {
        let mut boundary = ScriptedBoundary::default();
        boundary.queue_event(insert_point("a", 1.0, 1.0));
        boundary.queue_event(UpdateEvent::Select {
            entity: EntityKey::from("a"),
        });
        boundary.queue_event(insert_point("b", 2.0, 2.0));
        let mut session = session(boundary);

        let report = session.pump_at(Instant::now());

        assert_eq!(report.events_applied, 3);
        assert!(report.drained_to_idle);
        let record = session
            .mirror()
            .points()
            .get(&EntityKey::from("a"))
            .expect("record");
        assert!(record.selected());
        assert_eq!(session.mirror().points().len(), 2);
    }

    #[test]
    fn first_pump_issues_no_ticks_then_interval_elapses() {
        let mut session = session(ScriptedBoundary::default());
        let start = Instant::now();

        let first = session.pump_at(start);
        assert_eq!(first.ticks_issued, 0);

        let second = session.pump_at(start + Duration::from_millis(32));
        assert_eq!(second.ticks_issued, 2);
        assert_eq!(session.boundary().advances, 2);
    }

    #[test]
    fn tick_catch_up_is_capped_and_backlog_dropped() {
        let mut session = session(ScriptedBoundary::default());
        let start = Instant::now();

        session.pump_at(start);
        let report = session.pump_at(start + Duration::from_secs(3));

        assert_eq!(report.ticks_issued, 5);
        assert!(report.dropped_backlog > Duration::ZERO);
        // Accumulator was reset: the next immediate pump runs nothing extra.
        let next = session.pump_at(start + Duration::from_secs(3));
        assert_eq!(next.ticks_issued, 0);
    }

    #[test]
    fn poll_failure_is_absorbed_and_drain_resumes_next_pump() {
        let mut boundary = ScriptedBoundary::default();
        boundary.queue_poll_failure();
        boundary.queue_event(insert_point("a", 0.0, 0.0));
        let mut session = session(boundary);
        let start = Instant::now();

        let first = session.pump_at(start);
        assert_eq!(first.poll_failures, 1);
        assert_eq!(first.events_applied, 0);
        assert!(!session.is_shutdown());

        let second = session.pump_at(start + Duration::from_millis(1));
        assert_eq!(second.events_applied, 1);
        assert!(session.mirror().points().contains(&EntityKey::from("a")));
    }

    #[test]
    fn advance_failure_shuts_the_whole_session_down() {
        let mut boundary = ScriptedBoundary::default();
        boundary.advance_faults.push_back(BoundaryError::Rejected(
            "solver crashed".to_string(),
        ));
        let mut session = session(boundary);
        let start = Instant::now();

        session.pump_at(start);
        assert_eq!(session.boundary().polls, 1);

        let report = session.pump_at(start + Duration::from_millis(16));

        assert!(report.shut_down);
        assert!(session.is_shutdown());
        assert_eq!(session.boundary().shutdowns, 1);
        // The drain loop was torn down with the driver: no poll happened in
        // the failing pump, and later pumps schedule nothing at all.
        assert_eq!(session.boundary().polls, 1);
        let idle = session.pump_at(start + Duration::from_secs(1));
        assert!(idle.shut_down);
        assert_eq!(session.boundary().polls, 1);
        assert_eq!(session.boundary().advances, 1);
    }

    #[test]
    fn decode_failure_skips_event_and_drain_continues_same_pump() {
        let mut boundary = ScriptedBoundary::default();
        boundary.queue_raw(json!({ "type": 1, "entity": "broken" }));
        boundary.queue_event(insert_point("a", 0.0, 0.0));
        let mut session = session(boundary);

        let report = session.pump_at(Instant::now());

        assert_eq!(report.decode_failures, 1);
        assert_eq!(report.events_applied, 1);
        assert!(session.mirror().points().contains(&EntityKey::from("a")));
    }

    #[test]
    fn duplicate_insert_is_reported_but_does_not_halt_drain() {
        let mut boundary = ScriptedBoundary::default();
        boundary.queue_event(insert_point("a", 0.0, 0.0));
        boundary.queue_event(insert_point("a", 9.0, 9.0));
        boundary.queue_event(insert_point("b", 1.0, 1.0));
        let mut session = session(boundary);

        let report = session.pump_at(Instant::now());

        assert_eq!(report.apply_failures, 1);
        assert_eq!(report.events_applied, 2);
        assert_eq!(session.mirror().points().len(), 2);
    }

    #[test]
    fn unknown_tag_is_absorbed_without_failures() {
        let mut boundary = ScriptedBoundary::default();
        boundary.queue_raw(json!({ "type": 77 }));
        let mut session = session(boundary);

        let report = session.pump_at(Instant::now());

        assert_eq!(report.decode_failures, 0);
        assert_eq!(report.apply_failures, 0);
        assert_eq!(session.mirror().entity_count(), 0);
    }

    #[test]
    fn explicit_shutdown_stops_scheduling_and_input_forwarding() {
        let mut session = session(ScriptedBoundary::default());
        session.shutdown();
        session.shutdown();

        let report = session.pump_at(Instant::now());
        assert!(report.shut_down);
        assert_eq!(session.boundary().polls, 0);
        assert_eq!(session.boundary().advances, 0);
        assert_eq!(session.boundary().shutdowns, 1);

        session.pointer_down();
        session.key_down(65);
        // Nothing reaches a boundary that has been shut down.
        assert_eq!(session.boundary().shutdowns, 1);
    }

    #[test]
    fn drain_batch_is_bounded_per_pump() {
        let mut boundary = ScriptedBoundary::default();
        for index in 0..100 {
            boundary.queue_event(insert_point(&format!("p{index}"), 0.0, 0.0));
        }
        let mut session = SyncSession::new(
            boundary,
            NullAdapter::default(),
            SessionConfig {
                max_events_per_pump: 10,
                ..SessionConfig::default()
            },
        );

        let report = session.pump_at(Instant::now());
        assert_eq!(report.events_applied, 10);
        assert!(!report.drained_to_idle);
        assert_eq!(session.mirror().points().len(), 10);
    }

    #[test]
    fn plan_ticks_runs_expected_count_without_drop() {
        let plan = plan_ticks(Duration::from_millis(48), Duration::from_millis(16), 5);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_ticks_drops_backlog_past_cap() {
        let plan = plan_ticks(Duration::from_millis(120), Duration::from_millis(16), 3);
        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn plan_ticks_keeps_sub_interval_remainder() {
        let plan = plan_ticks(Duration::from_millis(20), Duration::from_millis(16), 5);
        assert_eq!(plan.ticks_to_run, 1);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(4));
    }
}
