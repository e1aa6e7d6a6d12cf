//! ISR-debounced push-button with short and long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The falling-edge ISR
//! records a timestamp into an atomic; [`ButtonDriver::tick`], polled
//! from the button task, runs the debounce + gesture state machine.
//!
//! ## Gestures
//!
//! | Gesture     | Condition              | Action             |
//! |-------------|------------------------|--------------------|
//! | Short press | Released before 3 s    | Manual watering    |
//! | Long press  | Held for 3 s           | Emergency pump stop|

use core::sync::atomic::{AtomicU32, Ordering};

const DEBOUNCE_MS: u32 = 50;
const LONG_PRESS_MS: u32 = 3000;

/// Raw ISR timestamp (milliseconds since boot, truncated to u32).
static BUTTON_ISR_TIMESTAMP: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
    /// Long press already reported; ignore until released.
    WaitRelease,
}

pub struct ButtonDriver<'a> {
    gpio: i32,
    edges: &'a AtomicU32,
    state: GestureState,
    last_isr_ms: u32,
}

impl ButtonDriver<'static> {
    /// Driver fed by the GPIO interrupt.
    pub fn new(gpio: i32) -> Self {
        Self::with_edge_source(gpio, &BUTTON_ISR_TIMESTAMP)
    }
}

impl<'a> ButtonDriver<'a> {
    pub fn with_edge_source(gpio: i32, edges: &'a AtomicU32) -> Self {
        Self {
            gpio,
            edges,
            state: GestureState::Idle,
            last_isr_ms: 0,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Advance the gesture machine.  `pressed` is the current (active-low
    /// decoded) switch state.
    pub fn tick(&mut self, now_ms: u32, pressed: bool) -> Option<ButtonEvent> {
        let isr_ms = self.edges.load(Ordering::Acquire);
        let new_edge = isr_ms != 0 && isr_ms != self.last_isr_ms;

        match self.state {
            GestureState::Idle => {
                if new_edge {
                    self.last_isr_ms = isr_ms;
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = if pressed {
                        GestureState::Pressed { since_ms }
                    } else {
                        GestureState::Idle
                    };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if !pressed {
                    self.state = GestureState::Idle;
                    return Some(ButtonEvent::ShortPress);
                }
                if now_ms.wrapping_sub(since_ms) >= LONG_PRESS_MS {
                    self.state = GestureState::WaitRelease;
                    return Some(ButtonEvent::LongPress);
                }
                None
            }

            GestureState::WaitRelease => {
                if !pressed {
                    // Edges from the hold itself are stale.
                    self.last_isr_ms = isr_ms;
                    self.state = GestureState::Idle;
                }
                None
            }
        }
    }
}

/// ISR handler: register on the button GPIO falling edge.
/// Lock-free, safe from interrupt context.
pub fn button_isr_handler(now_ms: u32) {
    BUTTON_ISR_TIMESTAMP.store(now_ms, Ordering::Release);
}
