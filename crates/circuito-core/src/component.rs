//! Circuit component: tick state machine and signal transport.
//!
//! A [`Component`] wraps a user-supplied [`Process`] callback with everything
//! the engine needs to drive it: per-buffer-slot input/output buses, the
//! inbound wire list, per-output reference counts for the copy-or-move
//! transport protocol, the per-slot tick state machine with feedback
//! detection, and the release chain that serialises in-order components
//! across buffer slots.
//!
//! # Ticking
//!
//! A component does work when it is ticked. [`tick`](Component::tick) first
//! ticks every upstream source (recursively, so the call walks backwards
//! through the circuit), then pulls the fresh inputs over its wires and runs
//! the [`Process`] callback; [`reset`](Component::reset) tells the component
//! the traversal is over so it can accept the next tick.
//!
//! The state machine is two-phase on purpose: a component is marked
//! `TickStarted` *before* recursing and `Ticking` *after*. A component that
//! is re-entered while still `TickStarted` is the far end of a feedback
//! cycle; the re-entering caller records the wire as feedback and reads the
//! source's previous-tick output instead of waiting on it. This is also why
//! outputs are cleared at the start of the next tick rather than in `reset`:
//! feedback wires must still be able to grab them.
//!
//! # Transport
//!
//! Each output tracks how many wires in the circuit consume it. During a
//! tick every consumer but the last receives a copy; the final consumer
//! resets the counter and takes the value with an O(1) move. One consumer
//! per tick therefore takes ownership without an allocation while earlier
//! readers keep shared-read semantics.
//!
//! # Performance tip
//!
//! If a `Process` implementation can safely run for several buffer slots
//! concurrently, construct the component with
//! [`ProcessOrder::OutOfOrder`] to exempt it from the cross-slot release
//! chain in multi-buffer circuits.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{Condvar, Mutex, RwLock};

use crate::Payload;
use crate::bus::SignalBus;
use crate::wire::Wire;
use crate::worker::ComponentWorker;

/// How a component's `process` calls are ordered across buffer slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessOrder {
    /// `process` runs for slots 0, 1, … in strict round-robin order
    /// (default). Required whenever the callback carries state that must see
    /// the stream in order.
    InOrder,
    /// `process` may run for distinct slots concurrently and complete in any
    /// order. The callback must tolerate concurrent invocation.
    OutOfOrder,
}

/// How a single tick is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickMode {
    /// Upstream ticking is synchronous recursion on the caller's thread.
    Series,
    /// Each component's per-tick work runs on its slot-local worker thread,
    /// parallelising independent branches. Feedback detection is active.
    Parallel,
}

impl Default for TickMode {
    fn default() -> Self {
        TickMode::Parallel
    }
}

/// User compute callback, polymorphic over its port counts.
///
/// The engine calls [`process`](Process::process) once per tick per buffer
/// slot, after filling `inputs` from the inbound wires and clearing
/// `outputs`. The callback may populate any subset of the outputs; an input
/// left empty by an unconnected or feedback wire simply reads as `None`.
///
/// # Contract
///
/// - `inputs` has [`input_count`](Process::input_count) signals and
///   `outputs` has [`output_count`](Process::output_count); both counts must
///   be stable for the life of the component.
/// - References to either bus must not be retained past the call.
/// - For [`ProcessOrder::OutOfOrder`] components the engine may invoke
///   `process` for distinct slots concurrently — any internal state needs
///   interior mutability that tolerates that (the trait takes `&self` for
///   this reason).
///
/// # Example
///
/// ```rust
/// use circuito_core::{Process, SignalBus};
///
/// struct And;
///
/// impl Process<bool> for And {
///     fn input_count(&self) -> usize { 2 }
///     fn output_count(&self) -> usize { 1 }
///
///     fn process(&self, inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
///         let a = inputs.value(0).copied().unwrap_or(false);
///         let b = inputs.value(1).copied().unwrap_or(false);
///         outputs.set_value(0, a && b);
///     }
/// }
/// ```
pub trait Process<T>: Send + Sync {
    /// Number of input ports.
    fn input_count(&self) -> usize;

    /// Number of output ports.
    fn output_count(&self) -> usize;

    /// Computes one tick's outputs from one tick's inputs.
    fn process(&self, inputs: &SignalBus<T>, outputs: &mut SignalBus<T>);
}

const NOT_TICKED: u8 = 0;
const TICK_STARTED: u8 = 1;
const TICKING: u8 = 2;

/// Per-output wire bookkeeping: how many wires consume this output in total,
/// and how many have pulled it in the current tick.
#[derive(Clone, Copy, Default)]
struct OutputRefs {
    total: usize,
    counter: usize,
}

/// Output-side state for one buffer slot. Bus and ref table share a lock so
/// the increment-and-transfer of the transport protocol is atomic per pull.
struct OutputState<T: Payload> {
    bus: SignalBus<T>,
    refs: Vec<OutputRefs>,
}

/// The release baton for one buffer slot of an in-order component.
#[derive(Default)]
struct ReleaseGate {
    got: Mutex<bool>,
    cond: Condvar,
}

/// Everything one buffer slot owns.
struct Slot<T: Payload> {
    tick_status: AtomicU8,
    input_bus: Mutex<SignalBus<T>>,
    output: Mutex<OutputState<T>>,
    /// Indices into the wire list whose source was seen mid-tick this cycle.
    feedback_wires: Mutex<HashSet<usize>>,
    release: ReleaseGate,
    worker: ComponentWorker,
}

impl<T: Payload> Slot<T> {
    fn new(input_count: usize, output_count: usize, refs: Vec<OutputRefs>, released: bool) -> Self {
        debug_assert_eq!(refs.len(), output_count);
        let slot = Self {
            tick_status: AtomicU8::new(NOT_TICKED),
            input_bus: Mutex::new(SignalBus::with_signal_count(input_count)),
            output: Mutex::new(OutputState {
                bus: SignalBus::with_signal_count(output_count),
                refs,
            }),
            feedback_wires: Mutex::new(HashSet::new()),
            release: ReleaseGate::default(),
            worker: ComponentWorker::new(),
        };
        *slot.release.got.lock() = released;
        slot
    }

    fn status(&self) -> u8 {
        self.tick_status.load(Ordering::Acquire)
    }

    fn set_status(&self, status: u8) {
        self.tick_status.store(status, Ordering::Release);
    }

    fn wait_for_release(&self) {
        let mut got = self.release.got.lock();
        while !*got {
            self.release.cond.wait(&mut got);
        }
        *got = false;
    }

    fn release(&self) {
        let mut got = self.release.got.lock();
        *got = true;
        self.release.cond.notify_all();
    }
}

struct ComponentCore<T: Payload> {
    process_order: ProcessOrder,
    processor: Box<dyn Process<T>>,
    wires: RwLock<Vec<Wire<T>>>,
    slots: RwLock<Vec<Slot<T>>>,
    input_names: RwLock<Vec<String>>,
    output_names: RwLock<Vec<String>>,
}

/// Shared handle to one circuit component.
///
/// Handles are cheap to clone; every clone refers to the same underlying
/// component, and identity is handle identity ([`same_as`](Self::same_as)).
/// A [`Circuit`](crate::Circuit) and the wires that target a component each
/// hold a handle, so the component stays alive for as long as anything is
/// connected to it.
pub struct Component<T: Payload> {
    core: Arc<ComponentCore<T>>,
}

impl<T: Payload> Clone for Component<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Payload> Component<T> {
    /// Creates an in-order component around the given callback.
    ///
    /// IO bus sizes are taken from the callback's declared port counts.
    pub fn new(processor: impl Process<T> + 'static) -> Self {
        Self::with_order(ProcessOrder::InOrder, processor)
    }

    /// Creates a component with an explicit [`ProcessOrder`].
    pub fn with_order(process_order: ProcessOrder, processor: impl Process<T> + 'static) -> Self {
        let input_count = processor.input_count();
        let output_count = processor.output_count();
        let slot = Slot::new(
            input_count,
            output_count,
            vec![OutputRefs::default(); output_count],
            true,
        );
        Self {
            core: Arc::new(ComponentCore {
                process_order,
                processor: Box::new(processor),
                wires: RwLock::new(Vec::new()),
                slots: RwLock::new(vec![slot]),
                input_names: RwLock::new(Vec::new()),
                output_names: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Returns whether two handles refer to the same component.
    pub fn same_as(&self, other: &Component<T>) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// Returns the component's process order.
    pub fn process_order(&self) -> ProcessOrder {
        self.core.process_order
    }

    // --- Wiring ---

    /// Connects `from`'s output `from_output` to this component's input
    /// `to_input`.
    ///
    /// Returns `false` (without mutating) when either port index is out of
    /// range. An input accepts a single wire at a time: connecting to an
    /// occupied input silently replaces the existing wire.
    ///
    /// When the component is registered with an auto-ticking circuit, wire
    /// through [`Circuit::connect_out_to_in`](crate::Circuit::connect_out_to_in)
    /// instead so the tick pipeline is drained around the mutation.
    pub fn connect_input(&self, from: &Component<T>, from_output: usize, to_input: usize) -> bool {
        if from_output >= from.output_count() || to_input >= self.input_count() {
            return false;
        }

        // An input holds one wire at most.
        self.disconnect_input(to_input);

        self.core.wires.write().push(Wire {
            from: from.clone(),
            from_output,
            to_input,
        });
        from.inc_refs(from_output);
        true
    }

    /// Removes the wire connected to `to_input`, if any.
    pub fn disconnect_input(&self, to_input: usize) {
        let mut wires = self.core.wires.write();
        if let Some(pos) = wires.iter().position(|w| w.to_input == to_input) {
            let wire = wires.remove(pos);
            drop(wires);
            wire.from.dec_refs(wire.from_output);
        }
    }

    /// Removes every wire originating from `from`.
    pub fn disconnect_input_from(&self, from: &Component<T>) {
        let mut removed = Vec::new();
        {
            let mut wires = self.core.wires.write();
            let mut i = 0;
            while i < wires.len() {
                if wires[i].from.same_as(from) {
                    removed.push(wires.remove(i));
                } else {
                    i += 1;
                }
            }
        }
        for wire in removed {
            wire.from.dec_refs(wire.from_output);
        }
    }

    /// Removes every inbound wire.
    pub fn disconnect_all_inputs(&self) {
        for input in 0..self.input_count() {
            self.disconnect_input(input);
        }
    }

    // --- IO configuration ---

    /// Number of input ports.
    pub fn input_count(&self) -> usize {
        self.core.slots.read()[0].input_bus.lock().signal_count()
    }

    /// Number of output ports.
    pub fn output_count(&self) -> usize {
        self.core.slots.read()[0].output.lock().bus.signal_count()
    }

    /// Resizes every slot's input bus.
    pub fn set_input_count(&self, count: usize) {
        let slots = self.core.slots.read();
        for slot in slots.iter() {
            slot.input_bus.lock().set_signal_count(count);
        }
    }

    /// Resizes every slot's output bus and its reference-count table.
    pub fn set_output_count(&self, count: usize) {
        let slots = self.core.slots.read();
        for slot in slots.iter() {
            let mut output = slot.output.lock();
            output.bus.set_signal_count(count);
            output.refs.resize(count, OutputRefs::default());
        }
    }

    /// Assigns display names to the input ports.
    pub fn set_input_names<S: Into<String>>(&self, names: impl IntoIterator<Item = S>) {
        *self.core.input_names.write() = names.into_iter().map(Into::into).collect();
    }

    /// Assigns display names to the output ports.
    pub fn set_output_names<S: Into<String>>(&self, names: impl IntoIterator<Item = S>) {
        *self.core.output_names.write() = names.into_iter().map(Into::into).collect();
    }

    /// Returns the display name of an input port, if one was assigned.
    pub fn input_name(&self, input: usize) -> Option<String> {
        self.core.input_names.read().get(input).cloned()
    }

    /// Returns the display name of an output port, if one was assigned.
    pub fn output_name(&self, output: usize) -> Option<String> {
        self.core.output_names.read().get(output).cloned()
    }

    // --- Buffering ---

    /// Returns the number of buffer slots (at least 1).
    pub fn buffer_count(&self) -> usize {
        self.core.slots.read().len()
    }

    /// Reshapes the component to `count` buffer slots (clamped to ≥ 1).
    ///
    /// Existing slots keep their buses; new slots start empty with the
    /// slot-0 reference totals. The release baton returns to slot 0. Must
    /// only be called while no tick is in flight — a circuit does this under
    /// its pause discipline.
    pub fn set_buffer_count(&self, count: usize) {
        let count = count.max(1);
        let mut slots = self.core.slots.write();
        if slots.len() == count {
            return;
        }

        if count < slots.len() {
            // Dropped slots stop their workers on the way out.
            slots.truncate(count);
        } else {
            let input_count = slots[0].input_bus.lock().signal_count();
            let (output_count, refs) = {
                let output = slots[0].output.lock();
                (output.bus.signal_count(), output.refs.clone())
            };
            while slots.len() < count {
                slots.push(Slot::new(input_count, output_count, refs.clone(), false));
            }
        }

        // Slot 0 holds the baton at rest.
        for (i, slot) in slots.iter().enumerate() {
            *slot.release.got.lock() = i == 0;
        }
    }

    // --- Ticking ---

    /// Runs one tick of this component (and, recursively, its upstreams) for
    /// one buffer slot.
    ///
    /// Returns `false` only when the component is already mid-tick on this
    /// slot — the caller has walked into a feedback cycle and should treat
    /// its wire as feedback. All other paths return `true`.
    pub fn tick(&self, mode: TickMode, slot: usize) -> bool {
        let slots = self.core.slots.read();
        let Some(slot_state) = slots.get(slot) else {
            return true;
        };

        match slot_state.status() {
            // Re-entered before our own upstream walk finished: the caller
            // found a feedback edge.
            TICK_STARTED => return false,
            // Already in flight this cycle.
            TICKING => return true,
            _ => {}
        }

        slot_state.set_status(TICK_STARTED);

        // Tick incoming components first so our inputs are up to date.
        {
            let wires = self.core.wires.read();
            for (index, wire) in wires.iter().enumerate() {
                match mode {
                    TickMode::Series => {
                        wire.from.tick(mode, slot);
                    }
                    TickMode::Parallel => {
                        if !wire.from.tick(mode, slot) {
                            slot_state.feedback_wires.lock().insert(index);
                        }
                    }
                }
            }
        }

        slot_state.set_status(TICKING);

        match mode {
            TickMode::Series => {
                drop(slots);
                self.run_slot(mode, slot);
            }
            TickMode::Parallel => {
                let this = self.clone();
                slot_state
                    .worker
                    .resume(Box::new(move || this.run_slot(mode, slot)));
            }
        }

        true
    }

    /// Marks the end of the current traversal for one slot: waits for the
    /// slot's work to finish, clears the input bus, and re-arms the tick
    /// state machine.
    ///
    /// Outputs are deliberately left populated so feedback wires can still
    /// read them on the next tick; they are cleared at the start of the
    /// slot's next cycle instead.
    pub fn reset(&self, slot: usize) {
        let slots = self.core.slots.read();
        let Some(slot_state) = slots.get(slot) else {
            return;
        };

        slot_state.worker.sync();
        slot_state.input_bus.lock().clear_all_values();
        slot_state.set_status(NOT_TICKED);
    }

    /// The slot-local half of a tick: acquire inputs, clear outputs, run the
    /// callback. Executes inline in series mode and on the slot's worker
    /// thread in parallel mode.
    fn run_slot(&self, mode: TickMode, slot: usize) {
        let slots = self.core.slots.read();
        let Some(slot_state) = slots.get(slot) else {
            return;
        };
        let wires = self.core.wires.read();

        {
            let mut input_bus = slot_state.input_bus.lock();
            for (index, wire) in wires.iter().enumerate() {
                if mode == TickMode::Parallel {
                    let was_feedback = slot_state.feedback_wires.lock().remove(&index);
                    if !was_feedback {
                        // Wait for the upstream's work for this slot to land.
                        wire.from.sync_worker(slot);
                    }
                    // A feedback source is still mid-tick; skip the sync and
                    // read its previous-tick output below.
                }
                wire.from
                    .pull_output(slot, wire.from_output, wire.to_input, &mut input_bus);
            }
        }

        // Clear outputs here, not in reset(): components hold their outputs
        // long enough for loopback wires to grab them during the next tick,
        // and the transport counter likewise resets on the final pull rather
        // than per traversal.
        slot_state.output.lock().bus.clear_all_values();

        if self.core.process_order == ProcessOrder::InOrder && slots.len() > 1 {
            slot_state.wait_for_release();
            self.invoke_processor(slot_state);
            slots[(slot + 1) % slots.len()].release();
        } else {
            self.invoke_processor(slot_state);
        }
    }

    fn invoke_processor(&self, slot_state: &Slot<T>) {
        let input_bus = slot_state.input_bus.lock();
        let mut output = slot_state.output.lock();
        self.core.processor.process(&input_bus, &mut output.bus);
    }

    /// Transfers one output signal into a consumer's input bus, applying the
    /// reference-counting protocol: every consumer but the last this cycle
    /// copies; the final consumer resets the counter and moves.
    fn pull_output(
        &self,
        slot: usize,
        from_output: usize,
        to_input: usize,
        to_bus: &mut SignalBus<T>,
    ) {
        let slots = self.core.slots.read();
        let Some(slot_state) = slots.get(slot) else {
            return;
        };

        let mut output = slot_state.output.lock();
        if !output.bus.has_value(from_output) {
            return;
        }

        let OutputState { bus, refs } = &mut *output;
        let Some(refs) = refs.get_mut(from_output) else {
            return;
        };
        let Some(signal) = bus.signal_mut(from_output) else {
            return;
        };

        refs.counter += 1;
        if refs.counter >= refs.total {
            // Final reference this cycle: reset the counter, move the value.
            refs.counter = 0;
            to_bus.move_signal_from(to_input, signal);
        } else {
            to_bus.copy_signal_from(to_input, signal);
        }
    }

    /// Blocks until this component's worker for `slot` has finished its
    /// current job.
    fn sync_worker(&self, slot: usize) {
        let slots = self.core.slots.read();
        if let Some(slot_state) = slots.get(slot) {
            slot_state.worker.sync();
        }
    }

    /// Records one more consumer wire on `output`, on every slot.
    fn inc_refs(&self, output: usize) {
        let slots = self.core.slots.read();
        for slot in slots.iter() {
            if let Some(refs) = slot.output.lock().refs.get_mut(output) {
                refs.total += 1;
            }
        }
    }

    /// Records one fewer consumer wire on `output`, on every slot.
    fn dec_refs(&self, output: usize) {
        let slots = self.core.slots.read();
        for slot in slots.iter() {
            if let Some(refs) = slot.output.lock().refs.get_mut(output) {
                refs.total = refs.total.saturating_sub(1);
            }
        }
    }

    // --- Introspection ---

    /// Returns whether the output at `(slot, output)` currently holds a
    /// value. Reads the bus directly without touching the transport
    /// protocol's reference counter.
    pub fn has_output_value(&self, slot: usize, output: usize) -> bool {
        let slots = self.core.slots.read();
        slots
            .get(slot)
            .is_some_and(|s| s.output.lock().bus.has_value(output))
    }

    /// Returns a clone of the value at `(slot, output)`, or `None` when the
    /// slot or port is out of range or the signal is empty. Does not count
    /// as a consumer pull.
    pub fn peek_output(&self, slot: usize, output: usize) -> Option<T> {
        let slots = self.core.slots.read();
        slots
            .get(slot)
            .and_then(|s| s.output.lock().bus.value(output).cloned())
    }
}
