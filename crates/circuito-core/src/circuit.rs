//! Workspace for adding and routing components.
//!
//! A [`Circuit`] owns a set of [`Component`]s, routes wires between them via
//! [`connect_out_to_in`](Circuit::connect_out_to_in), and distributes ticks.
//! Each input accepts a single wire at a time (connecting over an occupied
//! input replaces the wire); one output can feed any number of inputs.
//!
//! # Tick distribution
//!
//! With a buffer count of 0 (the default) a tick runs inline on the calling
//! thread: every component is ticked, then every component is reset — the
//! second pass so that all components have registered their outputs before
//! any is cleared. With a buffer count of N > 0 the circuit owns N pipeline
//! worker threads, one per buffer slot; each [`tick`](Circuit::tick) hands
//! one full circuit pass to the next worker round-robin, so N passes overlap
//! in flight.
//!
//! # Auto-ticking
//!
//! [`start_auto_tick`](Circuit::start_auto_tick) spawns a free-running
//! thread calling `tick` continuously. Topology mutations are safe while
//! auto-ticking: every mutating operation brackets itself in
//! [`pause_auto_tick`](Circuit::pause_auto_tick) /
//! [`resume_auto_tick`](Circuit::resume_auto_tick), which parks the ticker
//! and drains the pipeline before the mutation proceeds. The pause counter
//! nests, so user code can hold its own pause around a batch of mutations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::debug;
use parking_lot::{Mutex, RwLock};

use crate::Payload;
use crate::component::{Component, TickMode};
use crate::worker::{AutoTicker, CircuitWorker};

/// The tickable interior of a circuit, shared with the worker threads.
pub(crate) struct CircuitTicker<T: Payload> {
    components: Arc<RwLock<Vec<Component<T>>>>,
    workers: Mutex<Vec<CircuitWorker>>,
    current_slot: AtomicUsize,
}

impl<T: Payload> CircuitTicker<T> {
    fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(Vec::new())),
            workers: Mutex::new(Vec::new()),
            current_slot: AtomicUsize::new(0),
        }
    }

    /// Runs one circuit tick: inline when there is no worker pool, otherwise
    /// by resuming the pipeline worker at the round-robin cursor.
    fn tick(&self, mode: TickMode) {
        let workers = self.workers.lock();
        if workers.is_empty() {
            drop(workers);
            let components = self.components.read();
            for component in components.iter() {
                component.tick(mode, 0);
            }
            for component in components.iter() {
                component.reset(0);
            }
        } else {
            let current = self.current_slot.load(Ordering::SeqCst);
            workers[current].sync_and_resume(mode);
            self.current_slot
                .store((current + 1) % workers.len(), Ordering::SeqCst);
        }
    }
}

/// A set of interconnected components, ticked as a unit.
///
/// See the [module documentation](self) for an overview. Dropping a circuit
/// stops its threads and severs every wire between its components, so
/// feedback loops cannot outlive it.
pub struct Circuit<T: Payload> {
    ticker: Arc<CircuitTicker<T>>,
    auto: AutoTicker,
    pause_count: usize,
}

impl<T: Payload> Default for Circuit<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Payload> Circuit<T> {
    /// Creates an empty, single-threaded circuit.
    pub fn new() -> Self {
        Self {
            ticker: Arc::new(CircuitTicker::new()),
            auto: AutoTicker::new(),
            pause_count: 0,
        }
    }

    // --- Components ---

    /// Registers a component and returns its index.
    ///
    /// Idempotent: adding an already-registered component returns its
    /// existing index. The component's buffer count is resized to match the
    /// circuit's.
    pub fn add_component(&mut self, component: &Component<T>) -> usize {
        if let Some(index) = self.find_component(component) {
            return index;
        }

        // Components in the circuit need as many buffers as the circuit has
        // pipeline workers.
        component.set_buffer_count(self.buffer_count());

        self.pause_auto_tick();
        self.ticker.components.write().push(component.clone());
        self.resume_auto_tick();

        self.ticker.components.read().len() - 1
    }

    /// Unregisters a component, severing its inbound wires and every wire
    /// that targets it from another registered component.
    ///
    /// The caller may keep its own handle; the component itself stays valid.
    pub fn remove_component(&mut self, component: impl ComponentSelector<T>) {
        let Some(index) = self.resolve(component) else {
            return;
        };

        self.pause_auto_tick();
        self.disconnect_component_inner(index);
        self.ticker.components.write().remove(index);
        self.resume_auto_tick();
    }

    /// Removes every registered component.
    pub fn remove_all_components(&mut self) {
        while self.component_count() > 0 {
            self.remove_component(0);
        }
    }

    /// Returns the number of registered components.
    pub fn component_count(&self) -> usize {
        self.ticker.components.read().len()
    }

    // --- Wiring ---

    /// Connects `from`'s output `from_output` to `to`'s input `to_input`.
    ///
    /// `from` and `to` accept a component handle or an index in any mix.
    /// Returns `false` (without mutating) when either endpoint is not
    /// registered or a port index is out of range. Connecting to an occupied
    /// input replaces the existing wire.
    pub fn connect_out_to_in(
        &mut self,
        from: impl ComponentSelector<T>,
        from_output: usize,
        to: impl ComponentSelector<T>,
        to_input: usize,
    ) -> bool {
        let endpoints = {
            let components = self.ticker.components.read();
            let from = from.select(&components);
            let to = to.select(&components);
            match (from, to) {
                (Some(f), Some(t)) => Some((components[f].clone(), components[t].clone())),
                _ => None,
            }
        };
        let Some((from, to)) = endpoints else {
            return false;
        };

        self.pause_auto_tick();
        let connected = to.connect_input(&from, from_output, to_input);
        self.resume_auto_tick();
        connected
    }

    /// Severs a component's inbound wires and every registered wire that
    /// originates from it, leaving the component registered.
    pub fn disconnect_component(&mut self, component: impl ComponentSelector<T>) {
        let Some(index) = self.resolve(component) else {
            return;
        };

        self.pause_auto_tick();
        self.disconnect_component_inner(index);
        self.resume_auto_tick();
    }

    fn disconnect_component_inner(&self, index: usize) {
        let components = self.ticker.components.read();
        let target = &components[index];

        target.disconnect_all_inputs();
        for component in components.iter() {
            component.disconnect_input_from(target);
        }
    }

    // --- Buffering ---

    /// Returns the pipeline depth (0 = single-threaded, ticks run inline).
    pub fn buffer_count(&self) -> usize {
        self.ticker.workers.lock().len()
    }

    /// Reshapes the pipeline to `count` worker threads and propagates the
    /// buffer count to every registered component.
    ///
    /// A count of 0 returns the circuit to inline single-threaded ticking.
    /// No-op when the count is unchanged.
    pub fn set_buffer_count(&mut self, count: usize) {
        if count == self.buffer_count() {
            return;
        }
        debug!("reshaping circuit pipeline to {count} buffers");

        self.pause_auto_tick();
        {
            let mut workers = self.ticker.workers.lock();
            for worker in workers.iter_mut() {
                worker.stop();
            }
            workers.clear();
            for slot in 0..count {
                let mut worker = CircuitWorker::new();
                worker.start(Arc::clone(&self.ticker.components), slot);
                workers.push(worker);
            }
            // A reshaped pipeline restarts its rotation at slot 0.
            self.ticker.current_slot.store(0, Ordering::SeqCst);
        }

        let components = self.ticker.components.read();
        for component in components.iter() {
            component.set_buffer_count(count);
        }
        drop(components);

        self.resume_auto_tick();
    }

    // --- Ticking ---

    /// Runs one tick of the whole circuit.
    ///
    /// Inline (tick every component, then reset every component) when the
    /// buffer count is 0; otherwise hands one full pass to the next pipeline
    /// worker in round-robin order, blocking only if that worker is still
    /// busy with the pass it received a full rotation ago.
    pub fn tick(&mut self, mode: TickMode) {
        self.ticker.tick(mode);
    }

    /// Spawns a thread that calls [`tick`](Self::tick) continuously.
    ///
    /// When the ticker is merely paused this resumes it instead.
    pub fn start_auto_tick(&mut self, mode: TickMode) {
        if self.auto.is_stopped() {
            let ticker = Arc::clone(&self.ticker);
            self.auto.start(move |mode| ticker.tick(mode), mode);
        } else {
            self.resume_auto_tick();
        }
    }

    /// Stops the auto-tick thread, drains the pipeline, and waits for every
    /// worker to go idle.
    pub fn stop_auto_tick(&mut self) {
        if self.auto.is_stopped() {
            return;
        }
        let mode = self.auto.mode();
        self.auto.stop();
        self.drain_pipeline(mode);
    }

    /// Parks the auto-tick thread and drains the pipeline so no tick is in
    /// flight when this returns.
    ///
    /// Re-entrant: nested pause/resume pairs compose, and only the first
    /// pause actually parks the ticker. No-op when the circuit is not
    /// auto-ticking.
    pub fn pause_auto_tick(&mut self) {
        if self.auto.is_stopped() {
            return;
        }

        self.pause_count += 1;
        if self.pause_count == 1 && !self.auto.is_paused() {
            self.auto.pause();
            self.drain_pipeline(self.auto.mode());
        }
    }

    /// Unwinds one level of [`pause_auto_tick`](Self::pause_auto_tick);
    /// the ticker resumes when the last pause is released.
    pub fn resume_auto_tick(&mut self) {
        if self.auto.is_paused() && self.pause_count > 0 {
            self.pause_count -= 1;
            if self.pause_count == 0 {
                self.auto.resume();
            }
        }
    }

    /// Returns whether the auto-tick thread is running (paused or not).
    pub fn is_auto_ticking(&self) -> bool {
        !self.auto.is_stopped()
    }

    /// Returns whether the auto-tick thread is currently paused.
    pub fn is_auto_tick_paused(&self) -> bool {
        self.auto.is_paused()
    }

    /// Completes any in-flight round-robin rotation, then waits for every
    /// pipeline worker to park.
    fn drain_pipeline(&self, mode: TickMode) {
        while self.ticker.current_slot.load(Ordering::SeqCst) != 0 {
            self.ticker.tick(mode);
        }
        let workers = self.ticker.workers.lock();
        for worker in workers.iter() {
            worker.sync();
        }
    }

    // --- Lookup ---

    /// Returns the index of a registered component, or `None`.
    pub fn find_component(&self, component: &Component<T>) -> Option<usize> {
        self.ticker
            .components
            .read()
            .iter()
            .position(|c| c.same_as(component))
    }

    fn resolve(&self, selector: impl ComponentSelector<T>) -> Option<usize> {
        selector.select(&self.ticker.components.read())
    }
}

impl<T: Payload> Drop for Circuit<T> {
    fn drop(&mut self) {
        self.stop_auto_tick();
        {
            let mut workers = self.ticker.workers.lock();
            for worker in workers.iter_mut() {
                worker.stop();
            }
            workers.clear();
        }
        // Sever every wire so feedback loops cannot keep component handles
        // alive in a reference cycle past the circuit.
        let components = self.ticker.components.read();
        for component in components.iter() {
            component.disconnect_all_inputs();
        }
    }
}

/// Addresses a registered component either by handle or by index.
///
/// Implemented for `usize`, [`Component<T>`] and `&Component<T>`, so the
/// wiring methods accept any mix of the two addressing styles.
pub trait ComponentSelector<T: Payload> {
    /// Resolves to an index into `components`, or `None` when absent or out
    /// of range.
    fn select(&self, components: &[Component<T>]) -> Option<usize>;
}

impl<T: Payload> ComponentSelector<T> for usize {
    fn select(&self, components: &[Component<T>]) -> Option<usize> {
        (*self < components.len()).then_some(*self)
    }
}

impl<T: Payload> ComponentSelector<T> for &Component<T> {
    fn select(&self, components: &[Component<T>]) -> Option<usize> {
        components.iter().position(|c| c.same_as(self))
    }
}

impl<T: Payload> ComponentSelector<T> for Component<T> {
    fn select(&self, components: &[Component<T>]) -> Option<usize> {
        components.iter().position(|c| c.same_as(self))
    }
}
