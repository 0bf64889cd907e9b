//! Frame scheduler
//!
//! Owns the activation lifecycle of one per-frame workload. The workload's
//! own return value decides whether another frame is requested, so the
//! scheduler never needs a separately maintained "dirty" flag.
//!
//! ```text
//!            start / request_redraw
//!   Idle ─────────────────────────────► Running ──┐
//!    ▲                                    │  ▲    │ tick → true
//!    │        tick → false / stop         │  └────┘ (reschedule)
//!    └────────────────────────────────────┘
//! ```
//!
//! At most one tick is pending at any time: a new one is requested only by
//! the previous tick's completion, or by `start` while idle.

use tracing::{debug, trace};

/// Opaque identifier of a scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Host primitive that delivers one callback per display refresh
///
/// Implementations request a frame in `schedule_tick` and later hand the
/// returned handle, with the host's monotonic timestamp in milliseconds, to
/// [`FrameScheduler::on_tick`].
pub trait FrameHost {
    fn schedule_tick(&mut self) -> TickHandle;
    fn cancel_tick(&mut self, handle: TickHandle);
}

/// Per-frame workload driven by the scheduler
///
/// Receives the elapsed seconds since the previous tick and returns whether
/// another frame is wanted.
pub trait FrameTask {
    fn tick(&mut self, delta_time: f64) -> bool;
}

impl<F: FnMut(f64) -> bool> FrameTask for F {
    fn tick(&mut self, delta_time: f64) -> bool {
        self(delta_time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerState {
    Idle,
    Running {
        pending: TickHandle,
        /// Host timestamp of the previous tick, `None` right after activation
        last_timestamp: Option<f64>,
    },
}

#[derive(Debug)]
pub struct FrameScheduler<H: FrameHost> {
    host: H,
    state: SchedulerState,
}

impl<H: FrameHost> FrameScheduler<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: SchedulerState::Idle,
        }
    }

    /// Activates the loop and schedules the first tick
    ///
    /// Calling this while running replaces the pending tick, so there is
    /// still only one, and restarts delta-time measurement.
    pub fn start(&mut self) {
        if let SchedulerState::Running { pending, .. } = self.state {
            debug!("Restarting frame loop, cancelling tick {}", pending.id());
            self.host.cancel_tick(pending);
        }
        let pending = self.host.schedule_tick();
        trace!("Scheduled first tick {}", pending.id());
        self.state = SchedulerState::Running {
            pending,
            last_timestamp: None,
        };
    }

    /// Starts the loop if idle; a running loop already has a tick pending
    pub fn request_redraw(&mut self) {
        if self.state == SchedulerState::Idle {
            self.start();
        }
    }

    /// Cancels any pending tick and goes idle; idempotent
    pub fn stop(&mut self) {
        if let SchedulerState::Running { pending, .. } = self.state {
            debug!("Stopping frame loop, cancelling tick {}", pending.id());
            self.host.cancel_tick(pending);
        }
        self.state = SchedulerState::Idle;
    }

    /// Runs the tick identified by `handle` at host time `timestamp_ms`
    ///
    /// Returns `false` without calling `task` when `handle` is not the pending
    /// tick (stale or cancelled callbacks). Otherwise returns the task's
    /// continuation answer.
    pub fn on_tick<T: FrameTask + ?Sized>(
        &mut self,
        handle: TickHandle,
        timestamp_ms: f64,
        task: &mut T,
    ) -> bool {
        let last_timestamp = match self.state {
            SchedulerState::Running {
                pending,
                last_timestamp,
            } if pending == handle => last_timestamp,
            _ => {
                trace!("Ignoring stale tick {}", handle.id());
                return false;
            }
        };

        let delta_time = match last_timestamp {
            Some(last) => (timestamp_ms - last) / 1000.0,
            None => 0.0,
        };

        if task.tick(delta_time) {
            let pending = self.host.schedule_tick();
            self.state = SchedulerState::Running {
                pending,
                last_timestamp: Some(timestamp_ms),
            };
            true
        } else {
            trace!("Frame task finished, going idle");
            self.state = SchedulerState::Idle;
            false
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running { .. })
    }

    /// Handle of the tick the host should deliver next, if any
    pub fn pending(&self) -> Option<TickHandle> {
        match self.state {
            SchedulerState::Running { pending, .. } => Some(pending),
            SchedulerState::Idle => None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records schedule/cancel calls instead of talking to a display
    #[derive(Debug, Default)]
    struct RecordingHost {
        next_id: u64,
        scheduled: Vec<TickHandle>,
        cancelled: Vec<TickHandle>,
    }

    impl RecordingHost {
        fn outstanding(&self) -> Vec<TickHandle> {
            self.scheduled
                .iter()
                .filter(|h| !self.cancelled.contains(h))
                .copied()
                .collect()
        }
    }

    impl FrameHost for RecordingHost {
        fn schedule_tick(&mut self) -> TickHandle {
            self.next_id += 1;
            let handle = TickHandle::new(self.next_id);
            self.scheduled.push(handle);
            handle
        }

        fn cancel_tick(&mut self, handle: TickHandle) {
            self.cancelled.push(handle);
        }
    }

    #[test]
    fn test_request_redraw_from_idle_starts() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.request_redraw();
        assert!(scheduler.is_running());
        assert_eq!(scheduler.host().scheduled.len(), 1);
    }

    #[test]
    fn test_request_redraw_while_running_is_noop() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        scheduler.request_redraw();
        let pending = scheduler.pending();

        scheduler.request_redraw();
        scheduler.request_redraw();
        assert_eq!(scheduler.pending(), pending);
        assert_eq!(scheduler.host().scheduled.len(), 1);
    }

    #[test]
    fn test_delta_time_from_timestamps() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        let mut deltas = Vec::new();
        let mut task = |dt: f64| {
            deltas.push(dt);
            true
        };

        scheduler.start();
        for timestamp in [1000.0, 1016.0, 1050.0] {
            let handle = scheduler.pending().unwrap();
            assert!(scheduler.on_tick(handle, timestamp, &mut task));
        }

        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0], 0.0);
        assert!((deltas[1] - 0.016).abs() < 1e-12);
        assert!((deltas[2] - 0.034).abs() < 1e-12);
    }

    #[test]
    fn test_false_tick_goes_idle_and_stays_idle() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        let mut calls = 0;
        let mut task = |_dt: f64| {
            calls += 1;
            false
        };

        scheduler.start();
        let handle = scheduler.pending().unwrap();
        assert!(!scheduler.on_tick(handle, 5.0, &mut task));
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        // Redelivering the consumed handle must not run the task again
        assert!(!scheduler.on_tick(handle, 21.0, &mut task));
        assert_eq!(calls, 1);
        assert_eq!(scheduler.host().scheduled.len(), 1);
    }

    #[test]
    fn test_restart_resets_delta_time() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        let mut deltas = Vec::new();
        let mut answers = vec![false, true, true].into_iter();
        let mut task = |dt: f64| {
            deltas.push(dt);
            answers.next().unwrap_or(false)
        };

        scheduler.start();
        let handle = scheduler.pending().unwrap();
        scheduler.on_tick(handle, 100.0, &mut task);
        assert!(!scheduler.is_running());

        scheduler.request_redraw();
        let handle = scheduler.pending().unwrap();
        scheduler.on_tick(handle, 5000.0, &mut task);
        let handle = scheduler.pending().unwrap();
        scheduler.on_tick(handle, 5020.0, &mut task);

        assert_eq!(deltas[1], 0.0);
        assert!((deltas[2] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_stop_cancels_pending_and_is_idempotent() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        scheduler.start();
        let pending = scheduler.pending().unwrap();

        scheduler.stop();
        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.host().cancelled, vec![pending]);

        let mut task = |_dt: f64| -> bool { panic!("cancelled tick must not run") };
        assert!(!scheduler.on_tick(pending, 10.0, &mut task));
    }

    #[test]
    fn test_stop_on_idle_does_nothing() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        scheduler.stop();
        assert!(scheduler.host().cancelled.is_empty());
    }

    #[test]
    fn test_start_while_running_keeps_single_pending() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        scheduler.start();
        scheduler.start();
        assert_eq!(scheduler.host().outstanding().len(), 1);
        assert_eq!(scheduler.host().outstanding()[0], scheduler.pending().unwrap());
    }

    #[test]
    fn test_dirty_flag_task_draws_once_per_request() {
        let mut scheduler = FrameScheduler::new(RecordingHost::default());
        let mut dirty = true;
        let mut draws = 0;

        scheduler.request_redraw();
        let mut timestamp = 0.0;
        while let Some(handle) = scheduler.pending() {
            timestamp += 16.0;
            scheduler.on_tick(handle, timestamp, &mut |_dt: f64| {
                if dirty {
                    draws += 1;
                }
                std::mem::take(&mut dirty)
            });
        }

        assert_eq!(draws, 1);
        assert!(!scheduler.is_running());
    }
}
