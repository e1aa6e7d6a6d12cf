//! `critical-section` 1.x provider for the ESP-IDF build.
//!
//! embassy-sync's `CriticalSectionRawMutex` guards the status cell, and
//! nothing else in the image links an implementation.  The section is a
//! process-wide std mutex; nesting on the same thread only bumps a depth
//! counter.

use core::cell::{Cell, RefCell};
use std::sync::{Mutex, MutexGuard, PoisonError};

static CRITICAL_SECTION_MUTEX: Mutex<()> = Mutex::new(());

thread_local! {
    static DEPTH: Cell<u8> = const { Cell::new(0) };
    static GUARD: RefCell<Option<MutexGuard<'static, ()>>> = const { RefCell::new(None) };
}

/// Enter the section; returns the nesting depth after entry.
pub fn acquire() -> u8 {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            // A panic inside a section leaves no data behind the mutex.
            let lock = CRITICAL_SECTION_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
            GUARD.with(|g| *g.borrow_mut() = Some(lock));
        }
        let next = d.saturating_add(1);
        depth.set(next);
        next
    })
}

/// Leave one nesting level; the mutex is released at depth zero.
pub fn release() {
    DEPTH.with(|depth| {
        let d = depth.get();
        if d == 0 {
            return;
        }
        depth.set(d - 1);
        if d == 1 {
            GUARD.with(|g| *g.borrow_mut() = None);
        }
    });
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    acquire()
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    release();
}
