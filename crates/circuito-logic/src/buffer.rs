//! Single-input pass-through.

use circuito_core::{Process, SignalBus};

/// Copies input 0 to output 0, emitting nothing when the input is empty.
///
/// Useful as a pipeline stage, a named junction point, or to give a feedback
/// loop an extra tick of delay.
#[derive(Debug, Clone, Default)]
pub struct Buffer;

impl Buffer {
    pub fn new() -> Self {
        Self
    }
}

impl Process<bool> for Buffer {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&self, inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        if let Some(&value) = inputs.value(0) {
            outputs.set_value(0, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_passes_value_through() {
        let buffer = Buffer::new();
        let mut inputs = SignalBus::with_signal_count(1);
        inputs.set_value(0, true);
        let mut outputs = SignalBus::with_signal_count(1);

        buffer.process(&inputs, &mut outputs);
        assert_eq!(outputs.value(0), Some(&true));
    }

    #[test]
    fn test_buffer_stays_silent_on_empty_input() {
        let buffer = Buffer::new();
        let inputs = SignalBus::with_signal_count(1);
        let mut outputs = SignalBus::with_signal_count(1);

        buffer.process(&inputs, &mut outputs);
        assert!(!outputs.has_value(0));
    }
}
