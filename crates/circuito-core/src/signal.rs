//! Value container carried between components.
//!
//! Components exchange data in the form of "signals" travelling over wires.
//! A [`Signal`] is a single slot that is either empty or holds one value.
//! The two transfer operations implement the engine's transport protocol:
//! [`copy_from`](Signal::copy_from) leaves the source intact, while
//! [`move_from`](Signal::move_from) is an O(1) ownership swap that empties
//! the source — the engine grants the move to exactly one consumer per tick.

/// A single empty-or-value slot.
#[derive(Debug)]
pub struct Signal<T> {
    value: Option<T>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Signal<T> {
    /// Creates an empty signal.
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Returns whether the signal currently holds a value.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Returns a reference to the held value, or `None` when empty.
    #[inline]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Empties the signal.
    #[inline]
    pub fn clear(&mut self) {
        self.value = None;
    }

    /// Stores a value, replacing any previous one.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Copies the source's value into this signal, leaving the source
    /// unchanged.
    ///
    /// Returns whether a transfer occurred; an empty source is a no-op.
    /// When this signal already holds a value its storage is reused via
    /// `clone_from`.
    pub fn copy_from(&mut self, from: &Signal<T>) -> bool
    where
        T: Clone,
    {
        match &from.value {
            Some(value) => {
                match &mut self.value {
                    Some(slot) => slot.clone_from(value),
                    None => self.value = Some(value.clone()),
                }
                true
            }
            None => false,
        }
    }

    /// Moves the source's value into this signal, leaving the source empty.
    ///
    /// Returns whether a transfer occurred; an empty source is a no-op.
    /// This is an O(1) swap of the value holder, never a clone.
    pub fn move_from(&mut self, from: &mut Signal<T>) -> bool {
        match from.value.take() {
            Some(value) => {
                self.value = Some(value);
                true
            }
            None => false,
        }
    }
}
