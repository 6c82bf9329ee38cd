//! Signal container indexed by port number.
//!
//! A [`SignalBus`] is the I/O surface of a component: the engine fills a
//! component's input bus from its inbound wires and the component's
//! [`Process`](crate::Process) callback populates the output bus. The bus
//! offers value-level getters and setters so callbacks rarely need to touch
//! the contained [`Signal`]s directly.
//!
//! All indexed accessors treat an out-of-range port as an absent value
//! (`None` / `false`) rather than a fault.

use crate::signal::Signal;

/// Fixed-length sequence of [`Signal`]s addressed by port index.
#[derive(Debug, Default)]
pub struct SignalBus<T> {
    signals: Vec<Signal<T>>,
}

impl<T> SignalBus<T> {
    /// Creates an empty bus with zero signals.
    pub fn new() -> Self {
        Self {
            signals: Vec::new(),
        }
    }

    /// Creates a bus holding `count` empty signals.
    pub fn with_signal_count(count: usize) -> Self {
        let mut bus = Self::new();
        bus.set_signal_count(count);
        bus
    }

    /// Resizes the bus to `count` signals.
    ///
    /// Existing slots keep their contents; new slots start empty.
    pub fn set_signal_count(&mut self, count: usize) {
        self.signals.resize_with(count, Signal::new);
    }

    /// Returns the number of signals in the bus.
    #[inline]
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    /// Returns the signal at `index`, or `None` when out of range.
    #[inline]
    pub fn signal(&self, index: usize) -> Option<&Signal<T>> {
        self.signals.get(index)
    }

    /// Returns the signal at `index` mutably, or `None` when out of range.
    #[inline]
    pub fn signal_mut(&mut self, index: usize) -> Option<&mut Signal<T>> {
        self.signals.get_mut(index)
    }

    /// Returns whether the signal at `index` holds a value.
    ///
    /// Out of range reads as `false`.
    #[inline]
    pub fn has_value(&self, index: usize) -> bool {
        self.signals.get(index).is_some_and(Signal::has_value)
    }

    /// Returns the value at `index`, or `None` when empty or out of range.
    #[inline]
    pub fn value(&self, index: usize) -> Option<&T> {
        self.signals.get(index).and_then(Signal::value)
    }

    /// Stores a value at `index`.
    ///
    /// Returns `false` (without mutating) when `index` is out of range.
    pub fn set_value(&mut self, index: usize, value: T) -> bool {
        match self.signals.get_mut(index) {
            Some(signal) => {
                signal.set(value);
                true
            }
            None => false,
        }
    }

    /// Copies `from` into the signal at `index`, leaving `from` unchanged.
    ///
    /// Returns whether a transfer occurred (`false` when `index` is out of
    /// range or `from` is empty).
    pub fn copy_signal_from(&mut self, index: usize, from: &Signal<T>) -> bool
    where
        T: Clone,
    {
        match self.signals.get_mut(index) {
            Some(signal) => signal.copy_from(from),
            None => false,
        }
    }

    /// Moves `from` into the signal at `index`, leaving `from` empty.
    ///
    /// Returns whether a transfer occurred (`false` when `index` is out of
    /// range or `from` is empty).
    pub fn move_signal_from(&mut self, index: usize, from: &mut Signal<T>) -> bool {
        match self.signals.get_mut(index) {
            Some(signal) => signal.move_from(from),
            None => false,
        }
    }

    /// Empties every signal in the bus. The signal count is unchanged.
    pub fn clear_all_values(&mut self) {
        for signal in &mut self.signals {
            signal.clear();
        }
    }
}
