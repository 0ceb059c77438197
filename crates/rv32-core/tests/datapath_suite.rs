//! End-to-end datapath coverage with hand-encoded RV32I programs.

#![allow(clippy::pedantic, clippy::nursery, clippy::unreadable_literal)]

use proptest::prelude::*;
use rstest::rstest;
use rv32_core::components::{alu_code, Alu, AluControl, Control, ImmGen, InstructionSplitter};
use rv32_core::{BitVector, FaultClass, RunState, Simulator, SimulatorConfig};
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn simulator(code: &[u32]) -> Simulator {
    let mut simulator = Simulator::with_config(SimulatorConfig {
        memory_size: 1 << 16,
        ..SimulatorConfig::default()
    })
    .unwrap();
    simulator.set_code(code).unwrap();
    simulator
}

fn reg(simulator: &Simulator, index: usize) -> u32 {
    simulator.registers().get(index).unwrap()
}

#[test]
fn control_tables_validate() {
    assert_eq!(Control::validate(), Ok(()));
    assert_eq!(ImmGen::validate(), Ok(()));
    assert_eq!(AluControl::validate(), Ok(()));
    assert_eq!(Alu::validate(), Ok(()));
}

#[test]
fn alu_subtracting_int_min_from_itself_sets_zero() {
    let min = BitVector::from_u32(0x8000_0000);
    let code = BitVector::from_u64(alu_code::SUB.into(), 4).unwrap();
    let outputs = Alu::tick(min, min, code).unwrap();
    assert_eq!(outputs.result, BitVector::from_u32(0));
    assert!(outputs.zero);
}

#[test]
fn countdown_loop_sums_one_to_five() {
    let mut simulator = simulator(&[
        0x00500293, // addi t0, zero, 5
        0x00000313, // addi t1, zero, 0
        0x00530333, // loop: add t1, t1, t0
        0xFFF28293, // addi t0, t0, -1
        0xFE029CE3, // bne t0, zero, loop
    ]);
    assert_eq!(simulator.run(), Ok(17));
    assert_eq!(reg(&simulator, 6), 15);
    assert_eq!(reg(&simulator, 5), 0);
    assert_eq!(simulator.state(), RunState::Done);
}

#[test]
fn call_and_return_link_through_ra() {
    let mut simulator = simulator(&[
        0x00C000EF, // jal ra, func
        0x00200593, // addi a1, zero, 2
        0x00C0006F, // jal zero, end
        0x00100513, // func: addi a0, zero, 1
        0x00008067, // jalr zero, 0(ra)
    ]);
    assert_eq!(simulator.run(), Ok(5));
    assert_eq!(reg(&simulator, 1), 4);
    assert_eq!(reg(&simulator, 10), 1);
    assert_eq!(reg(&simulator, 11), 2);
    assert_eq!(simulator.pc(), 20);
}

#[test]
fn upper_immediates_build_constants_and_pc_offsets() {
    let mut simulator = simulator(&[
        0x12345537, // lui a0, 0x12345
        0x67850513, // addi a0, a0, 0x678
        0x00001597, // auipc a1, 1
    ]);
    simulator.run().unwrap();
    assert_eq!(reg(&simulator, 10), 0x1234_5678);
    assert_eq!(reg(&simulator, 11), 0x1008);
}

#[test]
fn byte_loads_extend_by_signedness() {
    let mut simulator = simulator(&[
        0xF8000293, // addi t0, zero, -128
        0x00500023, // sb t0, 0(zero)
        0x00000503, // lb a0, 0(zero)
        0x00004583, // lbu a1, 0(zero)
    ]);
    simulator.run().unwrap();
    assert_eq!(simulator.data_memory().load(0, 4), Ok(0x80));
    assert_eq!(reg(&simulator, 10), 0xFFFF_FF80);
    assert_eq!(reg(&simulator, 11), 0x80);
}

#[test]
fn shifts_and_comparisons_respect_signedness() {
    let mut simulator = simulator(&[
        0xFF000293, // addi t0, zero, -16
        0x4022D513, // srai a0, t0, 2
        0x01C2D593, // srli a1, t0, 28
        0x0002A633, // slt a2, t0, zero
        0x0002B6B3, // sltu a3, t0, zero
    ]);
    simulator.run().unwrap();
    assert_eq!(reg(&simulator, 10), 0xFFFF_FFFC);
    assert_eq!(reg(&simulator, 11), 0xF);
    assert_eq!(reg(&simulator, 12), 1);
    assert_eq!(reg(&simulator, 13), 0);
}

#[test]
fn store_outside_memory_faults_without_side_effects() {
    // sw a0, 0(sp) with the default sp, far past a 64 KiB memory
    let mut simulator = simulator(&[0x00A12023]);
    let fault = simulator.tick().unwrap_err();
    assert_eq!(fault.class(), FaultClass::Memory);
    assert_eq!(simulator.pc(), 0);
    assert!(simulator.data_memory().is_empty());
    assert!(simulator.signals().is_none());
}

#[rstest]
#[case::all_zero(0x0000_0000)]
#[case::mul(0x0220_8033)]
#[case::fence(0x0000_000F)]
fn unsupported_words_are_decode_faults(#[case] word: u32) {
    let mut simulator = simulator(&[word]);
    assert_eq!(simulator.tick().unwrap_err().class(), FaultClass::Decode);
}

proptest! {
    #[test]
    fn i_type_fields_survive_split_and_imm_gen(
        rd in 0_u32..32,
        rs1 in 0_u32..32,
        imm in -2048_i32..2048,
    ) {
        let word = ((imm as u32 & 0xFFF) << 20) | (rs1 << 15) | (rd << 7) | 0b001_0011;
        let instruction = BitVector::from_u32(word);
        let fields = InstructionSplitter::tick(instruction).unwrap();
        prop_assert_eq!(fields.rd.to_u64(), u64::from(rd));
        prop_assert_eq!(fields.rs1.to_u64(), u64::from(rs1));
        prop_assert_eq!(ImmGen::tick(instruction).unwrap().to_i64(), i64::from(imm));
    }

    #[test]
    fn branch_offsets_survive_imm_gen(half in -2048_i32..2048) {
        let offset = half * 2;
        let imm = offset as u32;
        let word = (((imm >> 12) & 1) << 31)
            | (((imm >> 5) & 0x3F) << 25)
            | (((imm >> 1) & 0xF) << 8)
            | (((imm >> 11) & 1) << 7)
            | 0b110_0011;
        prop_assert_eq!(
            ImmGen::tick(BitVector::from_u32(word)).unwrap().to_i64(),
            i64::from(offset)
        );
    }
}
