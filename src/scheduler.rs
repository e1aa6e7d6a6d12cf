//! Poll cadence for the control loop.
//!
//! Polls sit on a fixed grid `interval_ms` apart.  A cycle that finishes
//! early sleeps to the next grid point; one that overruns (a pump hold
//! usually does) re-anchors the grid at "now" and polls immediately,
//! rather than firing the missed slots back to back.
//!
//! ```text
//!   due   due   due         (overrun)    due'  due'
//!    │─────│─────│──────────────────┤─────│─────│
//!                 └── 5 s pump hold ┘
//!                                   └ re-anchored here
//! ```

use log::debug;

use crate::app::ports::TimePort;

#[derive(Debug, Clone)]
pub struct Cadence {
    interval_ms: u64,
    next_due_ms: Option<u64>,
    overruns: u32,
}

impl Cadence {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms.max(1)),
            next_due_ms: None,
            overruns: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Cycles that ran past their slot since boot.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// How long to sleep before the next poll, advancing the grid.
    ///
    /// The first call anchors the grid one interval after `now_ms`.
    pub fn delay_until_next(&mut self, now_ms: u64) -> u64 {
        let Some(due) = self.next_due_ms else {
            self.next_due_ms = Some(now_ms + 2 * self.interval_ms);
            return self.interval_ms;
        };

        if now_ms < due {
            self.next_due_ms = Some(due + self.interval_ms);
            due - now_ms
        } else {
            self.overruns = self.overruns.saturating_add(1);
            debug!("cadence: cycle overran slot by {} ms, re-anchoring", now_ms - due);
            self.next_due_ms = Some(now_ms + self.interval_ms);
            0
        }
    }

    /// Sleep on `clock` until the next poll slot.
    pub fn wait(&mut self, clock: &mut impl TimePort) {
        let ms = self.delay_until_next(clock.now_ms());
        if ms > 0 {
            clock.delay_ms(ms.min(u64::from(u32::MAX)) as u32);
        }
    }
}
