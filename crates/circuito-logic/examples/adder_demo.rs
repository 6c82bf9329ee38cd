//! Prints the truth table of a full adder wired from stock gates.
//!
//! Run with: `cargo run --example adder_demo`

use circuito_core::{Circuit, Component, TickMode};
use circuito_logic::{And, Or, Source, Xor};

fn main() {
    let mut circuit = Circuit::new();

    let a = Source::new(false);
    let b = Source::new(false);
    let cin = Source::new(false);

    let a_c = Component::new(a.clone());
    let b_c = Component::new(b.clone());
    let cin_c = Component::new(cin.clone());
    let xor_ab = Component::new(Xor::new());
    let sum = Component::new(Xor::new());
    let and_ab = Component::new(And::new());
    let and_cin = Component::new(And::new());
    let cout = Component::new(Or::new());

    for c in [&a_c, &b_c, &cin_c, &xor_ab, &sum, &and_ab, &and_cin, &cout] {
        circuit.add_component(c);
    }

    circuit.connect_out_to_in(&a_c, 0, &xor_ab, 0);
    circuit.connect_out_to_in(&b_c, 0, &xor_ab, 1);
    circuit.connect_out_to_in(&xor_ab, 0, &sum, 0);
    circuit.connect_out_to_in(&cin_c, 0, &sum, 1);
    circuit.connect_out_to_in(&a_c, 0, &and_ab, 0);
    circuit.connect_out_to_in(&b_c, 0, &and_ab, 1);
    circuit.connect_out_to_in(&xor_ab, 0, &and_cin, 0);
    circuit.connect_out_to_in(&cin_c, 0, &and_cin, 1);
    circuit.connect_out_to_in(&and_ab, 0, &cout, 0);
    circuit.connect_out_to_in(&and_cin, 0, &cout, 1);

    println!(" a b cin | sum cout");
    println!("---------+---------");
    for bits in 0u8..8 {
        a.set_level(bits & 1 != 0);
        b.set_level(bits & 2 != 0);
        cin.set_level(bits & 4 != 0);

        circuit.tick(TickMode::Series);

        let s = sum.peek_output(0, 0).unwrap_or(false);
        let c = cout.peek_output(0, 0).unwrap_or(false);
        println!(
            " {} {}  {}  |  {}   {}",
            (bits & 1 != 0) as u8,
            (bits & 2 != 0) as u8,
            (bits & 4 != 0) as u8,
            s as u8,
            c as u8
        );
    }
}
