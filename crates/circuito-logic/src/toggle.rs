//! Alternating output.

use std::sync::atomic::{AtomicBool, Ordering};

use circuito_core::{Process, SignalBus};

/// Emits an alternating level: the initial value on the first tick, then the
/// opposite, and so on.
///
/// Handy as a clock substitute in tests and demos. The flip is atomic, but a
/// toggle only alternates cleanly across buffer slots when its component
/// keeps the default in-order processing.
#[derive(Debug)]
pub struct Toggle {
    state: AtomicBool,
}

impl Toggle {
    /// Creates a toggle whose first emitted value is `initial`.
    pub fn new(initial: bool) -> Self {
        Self {
            state: AtomicBool::new(initial),
        }
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Process<bool> for Toggle {
    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&self, _inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        let value = self.state.fetch_xor(true, Ordering::SeqCst);
        outputs.set_value(0, value);
    }
}
