//! Circuito Core - tick scheduler and signal transport for dataflow circuits
//!
//! This crate is the runtime core of a dataflow-graph execution engine. Client
//! code describes a directed graph of processing components interconnected by
//! wires; the engine drives each component exactly once per logical time step
//! ("tick"), delivering upstream outputs to downstream inputs:
//!
//! - [`Signal`] — one empty-or-value slot with copy and zero-copy move transfer
//! - [`SignalBus`] — a component's indexed I/O surface
//! - [`Process`] — the user compute callback, polymorphic over its port counts
//! - [`Component`] — per-node tick state machine, reference-counted output
//!   transport, and in-order release chain
//! - [`Circuit`] — component registry, wiring API, and tick distribution
//!
//! # Architecture
//!
//! The engine performs **no up-front topological sort**. A tick is a recursive
//! dependency-ordered traversal: each component first ticks its upstream
//! sources, then pulls their outputs through its inbound wires and runs its
//! [`Process`] callback. Cycles are legal — a component re-entered mid-tick is
//! detected dynamically and its wire marked as feedback, to be read from the
//! source's still-populated previous-tick output.
//!
//! Two tick modes exist per call ([`TickMode`]):
//!
//! - **Series** — the whole traversal runs synchronously on the caller's
//!   thread. Best for circuits without parallel branches.
//! - **Parallel** — each component's per-tick work runs on a dedicated parked
//!   worker thread, so independent branches execute concurrently.
//!
//! # Multi-buffering
//!
//! For stream throughput, a [`Circuit`] can pipeline ticks across N buffer
//! slots ([`Circuit::set_buffer_count`]). Each slot owns its own buses, tick
//! state, and worker thread; a single driver loop round-robins the slots.
//! Components declared [`ProcessOrder::InOrder`] are serialised across slots
//! by a baton-passing release chain, so every in-order component sees the
//! same buffer sequence; [`ProcessOrder::OutOfOrder`] components process
//! slots concurrently.
//!
//! # Example
//!
//! ```rust,ignore
//! use circuito_core::{Circuit, Component, TickMode};
//!
//! let mut circuit = Circuit::new();
//! let source = Component::new(Pulse::new());
//! let sink = Component::new(Printer::new());
//!
//! let src_idx = circuit.add_component(&source);
//! circuit.add_component(&sink);
//! circuit.connect_out_to_in(src_idx, 0, &sink, 0);
//!
//! circuit.tick(TickMode::Series);
//! // or free-running:
//! circuit.start_auto_tick(TickMode::Parallel);
//! ```

pub mod bus;
pub mod circuit;
pub mod component;
pub mod signal;
mod wire;
mod worker;

pub use bus::SignalBus;
pub use circuit::{Circuit, ComponentSelector};
pub use component::{Component, Process, ProcessOrder, TickMode};
pub use signal::Signal;

/// Bound every signal payload must satisfy.
///
/// Blanket-implemented; client code never implements this directly. `Clone`
/// backs the copy half of the transport protocol (the move half never
/// clones), `Send + 'static` lets payloads cross worker threads.
pub trait Payload: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> Payload for T {}
