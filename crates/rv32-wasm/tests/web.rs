//! Browser-side checks of the bindings; run with `wasm-pack test --headless`.

#![cfg(target_arch = "wasm32")]

use rv32_wasm::WasmSimulator;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn runs_an_assembled_program() {
    let mut simulator = WasmSimulator::new().unwrap();
    assert_eq!(simulator.load_source("li a0, 42\necall").unwrap(), 2);
    simulator.run(100).unwrap();
    assert!(simulator.is_done());
    assert!(simulator.is_syscall());
    assert_eq!(simulator.registers().get_index(10), 42);
    assert_eq!(simulator.pc(), 8);
}

#[wasm_bindgen_test]
fn assembler_errors_become_exceptions() {
    let mut simulator = WasmSimulator::new().unwrap();
    let err = simulator.load_source("frob a0").unwrap_err();
    assert!(err.as_string().unwrap().contains("unknown instruction"));
}
