//! Combinational logic gates.
//!
//! Every gate recomputes its output on each tick from whatever is present on
//! its inputs; unconnected inputs read low. The multi-input gates ([`And`],
//! [`Or`], [`Xor`], [`Nand`], [`Nor`]) accept an arbitrary fan-in via
//! `with_inputs`, defaulting to the classic two. All gates are stateless, so
//! they are safe to run out-of-order in multi-buffer circuits.

use circuito_core::{Process, SignalBus};

use crate::bit;

macro_rules! multi_input_gate {
    ($(#[$doc:meta])* $name:ident, $fold:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inputs: usize,
        }

        impl $name {
            /// Creates a two-input gate.
            pub fn new() -> Self {
                Self::with_inputs(2)
            }

            /// Creates a gate with `inputs` input ports (at least 1).
            pub fn with_inputs(inputs: usize) -> Self {
                Self {
                    inputs: inputs.max(1),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Process<bool> for $name {
            fn input_count(&self) -> usize {
                self.inputs
            }

            fn output_count(&self) -> usize {
                1
            }

            fn process(&self, inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
                let fold: fn(&SignalBus<bool>, usize) -> bool = $fold;
                outputs.set_value(0, fold(inputs, self.inputs));
            }
        }
    };
}

multi_input_gate!(
    /// Logical AND: high iff every input is high.
    And,
    |inputs, n| (0..n).all(|i| bit(inputs, i))
);

multi_input_gate!(
    /// Logical OR: high iff any input is high.
    Or,
    |inputs, n| (0..n).any(|i| bit(inputs, i))
);

multi_input_gate!(
    /// Logical XOR: high iff an odd number of inputs are high.
    Xor,
    |inputs, n| (0..n).filter(|&i| bit(inputs, i)).count() % 2 == 1
);

multi_input_gate!(
    /// Negated AND.
    Nand,
    |inputs, n| !(0..n).all(|i| bit(inputs, i))
);

multi_input_gate!(
    /// Negated OR.
    Nor,
    |inputs, n| !(0..n).any(|i| bit(inputs, i))
);

/// Logical NOT: inverts its single input.
#[derive(Debug, Clone, Default)]
pub struct Not;

impl Not {
    pub fn new() -> Self {
        Self
    }
}

impl Process<bool> for Not {
    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        1
    }

    fn process(&self, inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        outputs.set_value(0, !bit(inputs, 0));
    }
}
