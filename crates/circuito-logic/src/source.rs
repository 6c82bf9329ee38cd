//! Settable constant level.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use circuito_core::{Process, SignalBus};

/// Emits its current level on output 0 every tick.
///
/// `Source` is cheap to clone and every clone shares the same level, so keep
/// a clone as a control handle before handing the source to a
/// [`Component`](circuito_core::Component):
///
/// ```rust
/// use circuito_core::Component;
/// use circuito_logic::Source;
///
/// let source = Source::new(false);
/// let control = source.clone();
/// let component = Component::new(source);
///
/// control.set_level(true); // takes effect from the next tick
/// ```
#[derive(Debug, Clone)]
pub struct Source {
    level: Arc<AtomicBool>,
}

impl Source {
    /// Creates a source emitting `level`.
    pub fn new(level: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
        }
    }

    /// Changes the emitted level, effective from the next tick.
    pub fn set_level(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }

    /// Returns the current level.
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}

impl Process<bool> for Source {
    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&self, _inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        outputs.set_value(0, self.level());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_emits_level() {
        let source = Source::new(true);
        let inputs = SignalBus::with_signal_count(0);
        let mut outputs = SignalBus::with_signal_count(1);

        source.process(&inputs, &mut outputs);
        assert_eq!(outputs.value(0), Some(&true));
    }

    #[test]
    fn test_clones_share_the_level() {
        let source = Source::new(false);
        let control = source.clone();
        control.set_level(true);

        let inputs = SignalBus::with_signal_count(0);
        let mut outputs = SignalBus::with_signal_count(1);
        source.process(&inputs, &mut outputs);
        assert_eq!(outputs.value(0), Some(&true));
    }
}
