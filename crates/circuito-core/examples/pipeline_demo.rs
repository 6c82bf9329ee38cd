//! Minimal end-to-end demo: a counting source feeding a doubler feeding a
//! printing sink, ticked by hand and then via the auto-tick thread.
//!
//! Run with: `cargo run --example pipeline_demo`

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use circuito_core::{Circuit, Component, Process, SignalBus, TickMode};

struct Counter(AtomicU64);

impl Process<u64> for Counter {
    fn input_count(&self) -> usize {
        0
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, _inputs: &SignalBus<u64>, outputs: &mut SignalBus<u64>) {
        outputs.set_value(0, self.0.fetch_add(1, Ordering::SeqCst));
    }
}

struct Doubler;

impl Process<u64> for Doubler {
    fn input_count(&self) -> usize {
        1
    }
    fn output_count(&self) -> usize {
        1
    }
    fn process(&self, inputs: &SignalBus<u64>, outputs: &mut SignalBus<u64>) {
        if let Some(&value) = inputs.value(0) {
            outputs.set_value(0, value * 2);
        }
    }
}

struct Printer;

impl Process<u64> for Printer {
    fn input_count(&self) -> usize {
        1
    }
    fn output_count(&self) -> usize {
        0
    }
    fn process(&self, inputs: &SignalBus<u64>, _outputs: &mut SignalBus<u64>) {
        if let Some(&value) = inputs.value(0) {
            println!("-> {value}");
        }
    }
}

fn main() {
    let mut circuit = Circuit::new();

    let counter = Component::new(Counter(AtomicU64::new(0)));
    let doubler = Component::new(Doubler);
    let printer = Component::new(Printer);

    let counter_idx = circuit.add_component(&counter);
    let doubler_idx = circuit.add_component(&doubler);
    let printer_idx = circuit.add_component(&printer);

    circuit.connect_out_to_in(counter_idx, 0, doubler_idx, 0);
    circuit.connect_out_to_in(doubler_idx, 0, printer_idx, 0);

    println!("four manual series ticks:");
    for _ in 0..4 {
        circuit.tick(TickMode::Series);
    }

    println!("auto-ticking in parallel mode for 5ms:");
    circuit.start_auto_tick(TickMode::Parallel);
    thread::sleep(Duration::from_millis(5));
    circuit.stop_auto_tick();

    println!("done");
}
