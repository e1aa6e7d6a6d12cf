//! Single-slot cross-task signals.
//!
//! Both flags have one consumer (the control loop) and any number of
//! producers (HTTP handler, button task).  A set before consumption
//! collapses into the pending one; there is no queue.

use core::sync::atomic::{AtomicBool, Ordering};

/// "Water now" request from the web page or a short button press.
#[derive(Debug, Default)]
pub struct OverrideRequest {
    pending: AtomicBool,
}

impl OverrideRequest {
    pub const fn new() -> Self {
        Self { pending: AtomicBool::new(false) }
    }

    /// Set the pending flag.  Idempotent.
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Read-and-clear.  Control loop only.
    pub fn consume(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Emergency stop raised alongside a direct relay write; tells the
/// control loop to cut its current pump hold short.
#[derive(Debug, Default)]
pub struct StopRequest {
    raised: AtomicBool,
}

impl StopRequest {
    pub const fn new() -> Self {
        Self { raised: AtomicBool::new(false) }
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn take(&self) -> bool {
        self.raised.swap(false, Ordering::AcqRel)
    }

    /// Drop a stop that arrived while no pump run was in progress.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
