#![no_main]

use libfuzzer_sys::fuzz_target;
use rv32_core::{Simulator, SimulatorConfig};

const MAX_TICKS: usize = 256;

fuzz_target!(|data: &[u8]| {
    let code: Vec<u32> = data
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    if code.is_empty() {
        return;
    }

    let config = SimulatorConfig {
        memory_size: 1 << 16,
        ..SimulatorConfig::default()
    };
    let Ok(mut simulator) = Simulator::with_config(config) else {
        return;
    };
    if simulator.set_code(&code).is_err() {
        return;
    }

    for _ in 0..MAX_TICKS {
        if simulator.is_done() {
            break;
        }
        let before = simulator.clone();
        if simulator.tick().is_err() {
            // A faulting tick must not latch anything.
            assert_eq!(simulator.pc(), before.pc());
            assert_eq!(simulator.registers(), before.registers());
            break;
        }
        assert_eq!(simulator.registers().get(0), Some(0));
    }
});
