//! Rate limiting for the label recomputation: two independent policies —
//! "at most once per time window" and "at most once per render frame" —
//! composed by [`RefreshScheduler`]. Movement events fire far more often
//! than either allows, and the recomputation walks the render tree.

use std::time::{Duration, Instant};

pub const LABEL_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// At most one run per time window.
#[derive(Clone, Copy, Debug)]
pub struct MinInterval {
    period: Duration,
    last: Option<Instant>,
}

impl MinInterval {
    pub fn new(period: Duration) -> MinInterval {
        MinInterval { period, last: None }
    }

    pub fn ready(&self, now: Instant) -> bool {
        self.last
            .map_or(true, |last| now.duration_since(last) >= self.period)
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// At most one pending run per animation frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameGate {
    armed: bool,
}

impl FrameGate {
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Disarm; returns whether a run was pending.
    pub fn fire(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Refresh {
    /// Run the recomputation right away.
    Now,
    /// A run was queued for the next frame.
    AtNextFrame,
    /// A run is already queued; nothing to do.
    AlreadyScheduled,
}

#[derive(Clone, Copy, Debug)]
pub struct RefreshScheduler {
    interval: MinInterval,
    gate: FrameGate,
}

impl RefreshScheduler {
    pub fn new(period: Duration) -> RefreshScheduler {
        RefreshScheduler {
            interval: MinInterval::new(period),
            gate: FrameGate::default(),
        }
    }

    /// Called on every movement event.
    pub fn request(&mut self, now: Instant) -> Refresh {
        if self.gate.is_armed() {
            Refresh::AlreadyScheduled
        } else if self.interval.ready(now) {
            self.interval.mark(now);
            Refresh::Now
        } else {
            self.gate.arm();
            Refresh::AtNextFrame
        }
    }

    /// Called on every animation frame; returns whether a deferred run is
    /// due now.
    pub fn on_frame(&mut self, now: Instant) -> bool {
        if self.gate.fire() {
            self.interval.mark(now);
            true
        } else {
            false
        }
    }
}
