//! Circuito Logic - stock single-bit components
//!
//! Ready-made [`Process`](circuito_core::Process) implementations over the
//! `bool` payload, enough to assemble real logic circuits:
//!
//! - Gates: [`And`], [`Or`], [`Not`], [`Xor`], [`Nand`], [`Nor`] — the
//!   multi-input gates accept any fan-in (default 2)
//! - [`Buffer`] — single-input pass-through
//! - [`Source`] — emits a settable level every tick
//! - [`Toggle`] — alternates its output every tick
//! - [`Probe`] — records everything that arrives on its input
//!
//! Gate inputs left unconnected (or fed by a not-yet-populated feedback
//! wire) read low, like a pulled-down pin.
//!
//! # Example
//!
//! ```rust,ignore
//! use circuito_core::{Circuit, Component, TickMode};
//! use circuito_logic::{Source, Xor, Probe};
//!
//! let mut circuit = Circuit::new();
//! let a = Component::new(Source::new(true));
//! let b = Component::new(Source::new(false));
//! let gate = Component::new(Xor::new());
//!
//! circuit.add_component(&a);
//! circuit.add_component(&b);
//! circuit.add_component(&gate);
//! circuit.connect_out_to_in(&a, 0, &gate, 0);
//! circuit.connect_out_to_in(&b, 0, &gate, 1);
//! circuit.tick(TickMode::Series);
//! ```

pub mod buffer;
pub mod gates;
pub mod probe;
pub mod source;
pub mod toggle;

pub use buffer::Buffer;
pub use gates::{And, Nand, Nor, Not, Or, Xor};
pub use probe::Probe;
pub use source::Source;
pub use toggle::Toggle;

use circuito_core::SignalBus;

/// Reads input `index` as a bit; absent values read low.
pub(crate) fn bit(inputs: &SignalBus<bool>, index: usize) -> bool {
    inputs.value(index).copied().unwrap_or(false)
}
