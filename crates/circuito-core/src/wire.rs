//! Connection between two components.
//!
//! A wire records where a component's input comes from: the source component
//! handle, the source output port, and the local input port. Wires live in
//! the *target* component's inbound list; holding the source handle keeps the
//! source alive for as long as the connection exists.

use crate::Payload;
use crate::component::Component;

/// Directed edge from `(from, from_output)` to the owning component's
/// `to_input`.
pub(crate) struct Wire<T: Payload> {
    pub from: Component<T>,
    pub from_output: usize,
    pub to_input: usize,
}
