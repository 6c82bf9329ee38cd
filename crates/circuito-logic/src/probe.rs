//! Recording sink.

use std::sync::Arc;

use parking_lot::Mutex;

use circuito_core::{Process, SignalBus};

/// Records every value arriving on its single input, in processing order.
///
/// Like [`Source`](crate::Source), a probe is cheap to clone and all clones
/// share the same log; keep one as a read handle before handing the probe to
/// a [`Component`](circuito_core::Component). Ticks where the input is empty
/// are not recorded.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    log: Arc<Mutex<Vec<bool>>>,
}

impl Probe {
    /// Creates a probe with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything recorded so far.
    pub fn values(&self) -> Vec<bool> {
        self.log.lock().clone()
    }

    /// Returns the most recently recorded value.
    pub fn last(&self) -> Option<bool> {
        self.log.lock().last().copied()
    }

    /// Empties the log.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Process<bool> for Probe {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        0
    }

    fn process(&self, inputs: &SignalBus<bool>, _outputs: &mut SignalBus<bool>) {
        if let Some(&value) = inputs.value(0) {
            self.log.lock().push(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_records_in_order() {
        let probe = Probe::new();
        let handle = probe.clone();

        let mut inputs = SignalBus::with_signal_count(1);
        let mut outputs = SignalBus::with_signal_count(0);
        for value in [true, false, true] {
            inputs.set_value(0, value);
            probe.process(&inputs, &mut outputs);
        }

        assert_eq!(handle.values(), vec![true, false, true]);
        assert_eq!(handle.last(), Some(true));
    }

    #[test]
    fn test_probe_skips_empty_ticks() {
        let probe = Probe::new();
        let inputs = SignalBus::with_signal_count(1);
        let mut outputs = SignalBus::with_signal_count(0);

        probe.process(&inputs, &mut outputs);
        assert!(probe.values().is_empty());
        assert_eq!(probe.last(), None);
    }
}
