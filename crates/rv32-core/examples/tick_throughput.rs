//! Tick throughput of the datapath.
//!
//! ```sh
//! cargo run --release -p rv32-core --example tick_throughput
//! ```
//!
//! Every tick evaluates all truth tables and components, so this measures
//! the cost of one full datapath evaluation rather than an instruction
//! decoder fast path.

#![allow(clippy::pedantic)]

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

use std::time::{Duration, Instant};

use rv32_core::{Simulator, SimulatorConfig};

const TICKS_PER_ROUND: u64 = 100_000;
const ROUNDS: usize = 5;

/// One named workload.
struct Workload {
    name: &'static str,
    code: &'static [u32],
}

const WORKLOADS: &[Workload] = &[
    Workload {
        // loop: addi t0, t0, 1; j loop
        name: "alu_loop",
        code: &[0x0012_8293, 0xFFDF_F06F],
    },
    Workload {
        // loop: sw t0, 0(zero); lw t1, 0(zero); addi t0, t0, 1; j loop
        name: "memory_loop",
        code: &[0x0050_2023, 0x0000_2303, 0x0012_8293, 0xFF5F_F06F],
    },
];

fn measure(workload: &Workload) -> Result<Duration, rv32_core::Fault> {
    let mut simulator = Simulator::with_config(SimulatorConfig {
        memory_size: 1 << 16,
        ..SimulatorConfig::default()
    })?;
    simulator.set_code(workload.code)?;

    let mut best = Duration::MAX;
    for _ in 0..ROUNDS {
        simulator.reset()?;
        let start = Instant::now();
        let outcome = simulator.run_bounded(TICKS_PER_ROUND)?;
        let elapsed = start.elapsed();
        assert_eq!(outcome.ticks, TICKS_PER_ROUND, "{} left its loop", workload.name);
        best = best.min(elapsed);
    }
    Ok(best)
}

fn main() -> Result<(), rv32_core::Fault> {
    println!("{:<14} {:>14} {:>12}", "workload", "ticks/s", "ns/tick");
    for workload in WORKLOADS {
        let best = measure(workload)?;
        let seconds = best.as_secs_f64();
        println!(
            "{:<14} {:>14.0} {:>12.1}",
            workload.name,
            TICKS_PER_ROUND as f64 / seconds,
            seconds * 1e9 / TICKS_PER_ROUND as f64
        );
    }
    Ok(())
}
