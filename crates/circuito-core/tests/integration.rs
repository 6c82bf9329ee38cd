//! Integration tests for the circuito engine.
//!
//! Exercises whole-circuit behaviour: gate processing, series pipelines,
//! fan-out signal transport, feedback loops, multi-buffer pipelining with
//! in-order components, and auto-tick pause/resume nesting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use circuito_core::{Circuit, Component, Process, ProcessOrder, SignalBus, TickMode};

// ---------------------------------------------------------------------------
// Test processors
// ---------------------------------------------------------------------------

/// Emits a settable level on output 0 every tick.
struct Level(Arc<AtomicBool>);

impl Level {
    fn new(value: bool) -> (Self, Arc<AtomicBool>) {
        let level = Arc::new(AtomicBool::new(value));
        (Self(Arc::clone(&level)), level)
    }
}

impl Process<bool> for Level {
    fn input_count(&self) -> usize {
        0
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, _inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        outputs.set_value(0, self.0.load(Ordering::SeqCst));
    }
}

/// Copies input 0 to output 0; emits nothing on an empty input.
struct Id;

impl Process<bool> for Id {
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

/// Logical AND of two single-bit inputs; floating inputs read low.
struct And;

impl Process<bool> for And {
    fn input_count(&self) -> usize {
        2
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        let a = inputs.value(0).copied().unwrap_or(false);
        let b = inputs.value(1).copied().unwrap_or(false);
        outputs.set_value(0, a && b);
    }
}

/// Two inputs, one output: records what arrives on input 1 (the feedback
/// port) each tick, and emits `true` on output 0.
struct FeedbackRecorder {
    seen: Arc<Mutex<Vec<Option<bool>>>>,
}

impl FeedbackRecorder {
    fn new() -> (Self, Arc<Mutex<Vec<Option<bool>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl Process<bool> for FeedbackRecorder {
    fn input_count(&self) -> usize {
        2
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
        self.seen.lock().push(inputs.value(1).copied());
        outputs.set_value(0, true);
    }
}

/// Emits 1, 2, 3, … on output 0.
struct Sequence(AtomicU64);

impl Sequence {
    fn new() -> Self {
        Self(AtomicU64::new(0))
    }
}

impl Process<u64> for Sequence {
    fn input_count(&self) -> usize {
        0
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, _inputs: &SignalBus<u64>, outputs: &mut SignalBus<u64>) {
        outputs.set_value(0, self.0.fetch_add(1, Ordering::SeqCst) + 1);
    }
}

/// Copies input 0 to output 0 (u64 payload).
struct Relay;

impl Process<u64> for Relay {
    fn input_count(&self) -> usize {
        1
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, inputs: &SignalBus<u64>, outputs: &mut SignalBus<u64>) {
        if let Some(&value) = inputs.value(0) {
            outputs.set_value(0, value);
        }
    }
}

/// Records every value arriving on input 0, in process-call order.
struct Recorder {
    seen: Arc<Mutex<Vec<u64>>>,
}

impl Recorder {
    fn new() -> (Self, Arc<Mutex<Vec<u64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                seen: Arc::clone(&seen),
            },
            seen,
        )
    }
}

impl Process<u64> for Recorder {
    fn input_count(&self) -> usize {
        1
    }
    fn output_count(&self) -> usize {
        0
    }
    fn process(&self, inputs: &SignalBus<u64>, _outputs: &mut SignalBus<u64>) {
        if let Some(&value) = inputs.value(0) {
            self.seen.lock().push(value);
        }
    }
}

// ---------------------------------------------------------------------------
// Gate processing
// ---------------------------------------------------------------------------

#[test]
fn and_gate_truth() {
    let mut circuit = Circuit::new();

    let (level_a, set_a) = Level::new(true);
    let (level_b, set_b) = Level::new(true);
    let a = Component::new(level_a);
    let b = Component::new(level_b);
    let gate = Component::with_order(ProcessOrder::OutOfOrder, And);

    circuit.add_component(&a);
    circuit.add_component(&b);
    circuit.add_component(&gate);
    assert!(circuit.connect_out_to_in(&a, 0, &gate, 0));
    assert!(circuit.connect_out_to_in(&b, 0, &gate, 1));

    circuit.tick(TickMode::Series);
    assert_eq!(gate.peek_output(0, 0), Some(true));

    set_a.store(true, Ordering::SeqCst);
    set_b.store(false, Ordering::SeqCst);
    circuit.tick(TickMode::Series);
    assert_eq!(gate.peek_output(0, 0), Some(false));
}

// ---------------------------------------------------------------------------
// Series pipeline
// ---------------------------------------------------------------------------

#[test]
fn two_stage_pipeline_in_series() {
    let mut circuit = Circuit::new();

    let (level, _) = Level::new(true);
    let src = Component::new(level);
    let id = Component::new(Id);
    circuit.add_component(&src);
    circuit.add_component(&id);
    assert!(circuit.connect_out_to_in(&src, 0, &id, 0));

    circuit.tick(TickMode::Series);
    assert_eq!(id.peek_output(0, 0), Some(true));
}

// ---------------------------------------------------------------------------
// Fan-out reference counting
// ---------------------------------------------------------------------------

#[test]
fn fan_out_moves_on_last_reader_only() {
    let mut circuit = Circuit::new();

    let (level, _) = Level::new(true);
    let src = Component::new(level);
    let readers: Vec<_> = (0..3)
        .map(|_| Component::with_order(ProcessOrder::OutOfOrder, Id))
        .collect();

    circuit.add_component(&src);
    for reader in &readers {
        circuit.add_component(reader);
        assert!(circuit.connect_out_to_in(&src, 0, reader, 0));
    }

    // Inline parallel tick: component workers are used, circuit workers not.
    circuit.tick(TickMode::Parallel);

    // The last reader moved the signal out; all three observed it.
    assert!(!src.has_output_value(0, 0));
    for reader in &readers {
        assert_eq!(reader.peek_output(0, 0), Some(true));
    }

    // The reference counter reset on the final pull: the next cycle behaves
    // identically.
    circuit.tick(TickMode::Parallel);
    assert!(!src.has_output_value(0, 0));
    for reader in &readers {
        assert_eq!(reader.peek_output(0, 0), Some(true));
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[test]
fn feedback_loop_reads_previous_tick() {
    let mut circuit = Circuit::new();

    let (recorder, seen) = FeedbackRecorder::new();
    let a = Component::with_order(ProcessOrder::OutOfOrder, recorder);
    let b = Component::with_order(ProcessOrder::OutOfOrder, Id);

    // Registration order makes the b→a wire the one observed mid-tick.
    circuit.add_component(&b);
    circuit.add_component(&a);
    assert!(circuit.connect_out_to_in(&a, 0, &b, 0));
    assert!(circuit.connect_out_to_in(&b, 0, &a, 1));

    for _ in 0..4 {
        circuit.tick(TickMode::Parallel);
    }

    // Tick 1: nothing has looped around yet. Tick i>1: the value b emitted
    // on tick i-1 (a copy of a's constant `true` output).
    assert_eq!(*seen.lock(), vec![None, Some(true), Some(true), Some(true)]);
}

#[test]
fn feedback_loop_in_series_mode() {
    let mut circuit = Circuit::new();

    let (recorder, seen) = FeedbackRecorder::new();
    let a = Component::new(recorder);
    let b = Component::new(Id);

    circuit.add_component(&b);
    circuit.add_component(&a);
    assert!(circuit.connect_out_to_in(&a, 0, &b, 0));
    assert!(circuit.connect_out_to_in(&b, 0, &a, 1));

    for _ in 0..3 {
        circuit.tick(TickMode::Series);
    }
    assert_eq!(*seen.lock(), vec![None, Some(true), Some(true)]);
}

// ---------------------------------------------------------------------------
// Multi-buffer pipelining
// ---------------------------------------------------------------------------

#[test]
fn in_order_pipeline_preserves_stream_order() {
    let mut circuit = Circuit::new();

    let x = Component::new(Sequence::new());
    let y = Component::new(Relay);
    let (recorder, seen) = Recorder::new();
    let probe = Component::new(recorder);

    circuit.add_component(&x);
    circuit.add_component(&y);
    circuit.add_component(&probe);
    assert!(circuit.connect_out_to_in(&x, 0, &y, 0));
    assert!(circuit.connect_out_to_in(&y, 0, &probe, 0));

    circuit.set_buffer_count(4);
    for _ in 0..8 {
        circuit.tick(TickMode::Parallel);
    }

    // Tearing the pipeline down completes all in-flight passes.
    circuit.set_buffer_count(0);

    // Every stage ran eight times, and the probe observed the sequence in
    // emission order: the in-order release chain pairs y's i-th execution
    // with x's i-th output on the same slot.
    assert_eq!(*seen.lock(), (1..=8).collect::<Vec<u64>>());
}

#[test]
fn out_of_order_pipeline_processes_every_tick() {
    let mut circuit = Circuit::new();

    let count = Arc::new(AtomicUsize::new(0));
    struct Pulse(Arc<AtomicUsize>);
    impl Process<u64> for Pulse {
        fn input_count(&self) -> usize {
            0
        }
        fn output_count(&self) -> usize {
            1
        }
        fn process(&self, _inputs: &SignalBus<u64>, outputs: &mut SignalBus<u64>) {
            self.0.fetch_add(1, Ordering::SeqCst);
            outputs.set_value(0, 1);
        }
    }

    let src = Component::with_order(ProcessOrder::OutOfOrder, Pulse(Arc::clone(&count)));
    circuit.add_component(&src);

    circuit.set_buffer_count(2);
    for _ in 0..6 {
        circuit.tick(TickMode::Parallel);
    }
    circuit.set_buffer_count(0);

    assert_eq!(count.load(Ordering::SeqCst), 6);
}

// ---------------------------------------------------------------------------
// Auto-tick
// ---------------------------------------------------------------------------

#[test]
fn auto_tick_runs_and_stops() {
    let mut circuit = Circuit::new();

    let count = Arc::new(AtomicUsize::new(0));
    struct Beat(Arc<AtomicUsize>);
    impl Process<bool> for Beat {
        fn input_count(&self) -> usize {
            0
        }
        fn output_count(&self) -> usize {
            1
        }
        fn process(&self, _inputs: &SignalBus<bool>, outputs: &mut SignalBus<bool>) {
            self.0.fetch_add(1, Ordering::SeqCst);
            outputs.set_value(0, true);
        }
    }

    let src = Component::new(Beat(Arc::clone(&count)));
    circuit.add_component(&src);

    circuit.start_auto_tick(TickMode::Series);
    assert!(circuit.is_auto_ticking());
    while count.load(Ordering::SeqCst) < 10 {
        std::thread::yield_now();
    }
    circuit.stop_auto_tick();
    assert!(!circuit.is_auto_ticking());

    // No further ticks after stop.
    let frozen = count.load(Ordering::SeqCst);
    std::thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(count.load(Ordering::SeqCst), frozen);
}

#[test]
fn pause_auto_tick_nests() {
    let mut circuit = Circuit::new();
    let (level, _) = Level::new(true);
    let src = Component::new(level);
    circuit.add_component(&src);

    circuit.start_auto_tick(TickMode::Series);

    circuit.pause_auto_tick();
    circuit.pause_auto_tick();
    assert!(circuit.is_auto_tick_paused());

    circuit.resume_auto_tick();
    assert!(circuit.is_auto_tick_paused());

    circuit.resume_auto_tick();
    assert!(!circuit.is_auto_tick_paused());
    assert!(circuit.is_auto_ticking());

    circuit.stop_auto_tick();
}

#[test]
fn topology_mutation_while_auto_ticking() {
    let mut circuit = Circuit::new();
    let (level, _) = Level::new(true);
    let src = Component::new(level);
    let sink = Component::new(Id);
    circuit.add_component(&src);

    circuit.start_auto_tick(TickMode::Parallel);

    // Mutations pause and drain internally; no manual pause required.
    circuit.add_component(&sink);
    assert!(circuit.connect_out_to_in(&src, 0, &sink, 0));
    circuit.set_buffer_count(2);
    circuit.set_buffer_count(0);
    circuit.disconnect_component(&sink);
    circuit.remove_component(&sink);

    circuit.stop_auto_tick();
    assert_eq!(circuit.component_count(), 1);
}

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

#[test]
fn parallel_mode_with_zero_buffers_is_inline() {
    let mut circuit = Circuit::new();
    let (level, _) = Level::new(true);
    let src = Component::new(level);
    let sink = Component::new(Id);
    circuit.add_component(&src);
    circuit.add_component(&sink);
    assert!(circuit.connect_out_to_in(&src, 0, &sink, 0));

    assert_eq!(circuit.buffer_count(), 0);
    circuit.tick(TickMode::Parallel);
    assert_eq!(sink.peek_output(0, 0), Some(true));
}

#[test]
fn failed_connect_leaves_no_wire() {
    let mut circuit = Circuit::new();
    let (level, _) = Level::new(true);
    let src = Component::new(level);
    let sink = Component::new(Id);
    circuit.add_component(&src);
    circuit.add_component(&sink);

    assert!(!circuit.connect_out_to_in(&src, 3, &sink, 0));
    circuit.tick(TickMode::Series);
    assert!(!sink.has_output_value(0, 0));
}
