//! The single-cycle datapath.
//!
//! [`Simulator::tick`] evaluates the whole datapath once, in a fixed order:
//!
//! 1. fetch and split the instruction at the current PC
//! 2. decode control, immediate and ALU operation
//! 3. read registers, select the second operand, run the ALU
//! 4. read data memory, compute `pc + 4` and `pc + imm`
//! 5. select the write-back value and the next PC
//! 6. clock edge: store to data memory, write the register file, latch the PC
//!
//! Every combinational value is computed from state latched at the previous
//! edge, so an instruction that reads and writes the same register sees the
//! old value. Nothing is written until every stage has succeeded, which makes
//! a faulting tick leave the machine unchanged.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::components::{
    ecall_kind, Adder, Alu, AluControl, AluOutputs, AuipcAdder, BranchAdder, Control,
    ControlSignals, DataMemory, ImmGen, InstructionFields, InstructionMemory, InstructionSplitter,
    JumpControl, MemoryAccess, Mux, ProgramCounter, RegisterFile,
};
use crate::encoding::{NOP_WORD, REGISTER_COUNT};
use crate::{BitVector, Fault, Memory, RunOutcome, RunState, SimulatorConfig};

const ALU_SRC_MUX: Mux = Mux::new(2, 32);
const WRITE_SRC_MUX: Mux = Mux::new(4, 32);
const BRANCH_BASE_MUX: Mux = Mux::new(2, 32);
const NEXT_PC_MUX: Mux = Mux::new(2, 32);
const INSTRUCTION_BYTES: BitVector = BitVector::from_u32(4);

/// Every intermediate signal of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Signals {
    /// PC the instruction was fetched from.
    pub pc: BitVector,
    /// Fetched instruction word.
    pub instruction: BitVector,
    /// Splitter outputs.
    pub fields: InstructionFields,
    /// Control unit outputs.
    pub control: ControlSignals,
    /// Sign-extended immediate.
    pub immediate: BitVector,
    /// ALU operation code.
    pub alu_control: BitVector,
    /// Register file output for `rs1`.
    pub read_data1: BitVector,
    /// Register file output for `rs2`.
    pub read_data2: BitVector,
    /// Second ALU operand after the `aluSrc` mux.
    pub alu_in2: BitVector,
    /// ALU outputs.
    pub alu: AluOutputs,
    /// Data memory read port.
    pub mem_read_data: BitVector,
    /// Sequential next PC.
    pub pc_plus_4: BitVector,
    /// `pc + imm`.
    pub auipc_result: BitVector,
    /// Value presented to the register file.
    pub write_data: BitVector,
    /// Branch adder base after the `jalr` mux.
    pub branch_base: BitVector,
    /// Branch/jump target.
    pub branch_target: BitVector,
    /// Jump control decision.
    pub take_branch: bool,
    /// PC latched at the end of the tick.
    pub next_pc: BitVector,
}

/// A single-cycle RV32I processor with its memories.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    code: Vec<u32>,
    initial_registers: BTreeMap<usize, u32>,
    pc: ProgramCounter,
    instruction_memory: InstructionMemory,
    data_memory: DataMemory,
    registers: RegisterFile,
    signals: Option<Signals>,
    state: RunState,
    ticks: u64,
}

impl Simulator {
    /// A simulator with the default configuration holding a single `nop`.
    ///
    /// # Errors
    ///
    /// See [`Simulator::with_config`].
    pub fn new() -> Result<Self, Fault> {
        Self::with_config(SimulatorConfig::default())
    }

    /// A simulator for `config` holding a single `nop`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Memory`] when `config.memory_size` is not a power of
    /// two.
    pub fn with_config(config: SimulatorConfig) -> Result<Self, Fault> {
        let mut simulator = Self {
            config,
            code: Vec::new(),
            initial_registers: BTreeMap::new(),
            pc: ProgramCounter::default(),
            instruction_memory: InstructionMemory::new(Memory::new(config.memory_size)?),
            data_memory: DataMemory::new(Memory::new(config.memory_size)?),
            registers: RegisterFile::new(),
            signals: None,
            state: RunState::Constructed,
            ticks: 0,
        };
        simulator.reset_registers()?;
        simulator.set_code(&[NOP_WORD])?;
        Ok(simulator)
    }

    /// Loads `code` at address 0 and rewinds the PC.
    ///
    /// Registers and data memory are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::Memory`] when the program does not fit.
    pub fn set_code(&mut self, code: &[u32]) -> Result<(), Fault> {
        self.instruction_memory.load_code(code)?;
        self.code = code.to_vec();
        self.rewind();
        debug!(words = code.len(), "code loaded");
        Ok(())
    }

    /// Overrides register values; the overrides also survive [`Simulator::reset`].
    ///
    /// # Errors
    ///
    /// Returns [`Fault::RegisterIndex`] for an index past `x31`; no register
    /// changes in that case.
    pub fn set_registers(&mut self, values: &BTreeMap<usize, u32>) -> Result<(), Fault> {
        if let Some(index) = values.keys().copied().find(|index| *index >= REGISTER_COUNT) {
            return Err(Fault::RegisterIndex { index });
        }
        for (index, value) in values {
            self.registers.set(*index, *value)?;
            self.initial_registers.insert(*index, *value);
        }
        Ok(())
    }

    /// Restores PC, registers and data memory to their post-construction
    /// state, keeping the loaded code and register overrides.
    ///
    /// # Errors
    ///
    /// Propagates register initialisation failures.
    pub fn reset(&mut self) -> Result<(), Fault> {
        self.data_memory.memory_mut().clear();
        self.reset_registers()?;
        self.rewind();
        debug!("simulator reset");
        Ok(())
    }

    fn reset_registers(&mut self) -> Result<(), Fault> {
        self.registers.clear();
        for (index, value) in self.config.initial_registers() {
            self.registers.set(index, value)?;
        }
        for (index, value) in &self.initial_registers {
            self.registers.set(*index, *value)?;
        }
        Ok(())
    }

    fn rewind(&mut self) {
        self.pc = ProgramCounter::default();
        self.signals = None;
        self.state = RunState::Constructed;
        self.ticks = 0;
    }

    /// Executes one instruction.
    ///
    /// # Errors
    ///
    /// Returns the first [`Fault`] raised by any stage. State is unchanged
    /// when a tick fails.
    pub fn tick(&mut self) -> Result<(), Fault> {
        let pc = self.pc.out();
        let instruction = self.instruction_memory.fetch(pc)?;
        let fields = InstructionSplitter::tick(instruction)?;
        let control = Control::tick(fields.opcode, fields.funct3, instruction)?;
        let immediate = ImmGen::tick(instruction)?;
        let alu_control = AluControl::tick(control.alu_op, fields.funct7, fields.funct3)?;

        let read_data1 = self.registers.read(fields.rs1)?;
        let read_data2 = self.registers.read(fields.rs2)?;
        let alu_in2 = ALU_SRC_MUX.tick(
            &[read_data2, immediate],
            BitVector::from_bool(control.alu_src),
        )?;
        let alu = Alu::tick(read_data1, alu_in2, alu_control)?;

        let access = MemoryAccess {
            address: alu.result,
            mem_read: control.mem_read,
            mem_write: control.mem_write,
            write_data: read_data2,
            size: control.mem_size,
            signed: control.mem_signed,
        };
        let mem_read_data = self.data_memory.tick(&access)?;
        let pc_plus_4 = Adder::tick(pc, INSTRUCTION_BYTES)?;
        let auipc_result = AuipcAdder::tick(pc, immediate)?;
        let write_data = WRITE_SRC_MUX.tick(
            &[alu.result, mem_read_data, pc_plus_4, auipc_result],
            control.write_src,
        )?;

        let branch_base = BRANCH_BASE_MUX.tick(&[pc, read_data1], BitVector::from_bool(control.jalr))?;
        let branch_target = BranchAdder::tick(branch_base, immediate)?;
        let take_branch = JumpControl::tick(
            control.branch_zero,
            control.branch_not_zero,
            control.jump,
            alu.zero,
        );
        let next_pc = NEXT_PC_MUX.tick(
            &[pc_plus_4, branch_target],
            BitVector::from_bool(take_branch),
        )?;

        self.data_memory.commit(&access)?;
        self.registers
            .write_back(control.reg_write, fields.rd, write_data)?;
        self.pc.latch(next_pc)?;

        trace!(
            tick = self.ticks,
            pc = pc.to_u64(),
            instruction = instruction.to_u64(),
            next_pc = next_pc.to_u64(),
            "tick"
        );
        self.ticks += 1;
        self.signals = Some(Signals {
            pc,
            instruction,
            fields,
            control,
            immediate,
            alu_control,
            read_data1,
            read_data2,
            alu_in2,
            alu,
            mem_read_data,
            pc_plus_4,
            auipc_result,
            write_data,
            branch_base,
            branch_target,
            take_branch,
            next_pc,
        });
        self.state = if self.is_done() {
            RunState::Done
        } else {
            RunState::Running
        };
        Ok(())
    }

    /// Ticks until [`Simulator::is_done`]; returns the number of ticks.
    ///
    /// There is no step limit: a program that never leaves its code runs
    /// forever. Use [`Simulator::run_bounded`] for untrusted programs.
    ///
    /// # Errors
    ///
    /// Stops at the first [`Fault`].
    pub fn run(&mut self) -> Result<u64, Fault> {
        let mut ticks = 0;
        while !self.is_done() {
            self.tick()?;
            ticks += 1;
        }
        debug!(ticks, pc = self.pc.data(), "run complete");
        Ok(ticks)
    }

    /// Ticks until done or `max_ticks` ticks have run.
    ///
    /// # Errors
    ///
    /// Stops at the first [`Fault`].
    pub fn run_bounded(&mut self, max_ticks: u64) -> Result<RunOutcome, Fault> {
        let mut ticks = 0;
        while ticks < max_ticks && !self.is_done() {
            self.tick()?;
            ticks += 1;
        }
        let done = self.is_done();
        debug!(ticks, done, pc = self.pc.data(), "bounded run stopped");
        Ok(RunOutcome { ticks, done })
    }

    /// `true` once the PC is past the last loaded instruction.
    #[must_use]
    pub fn is_done(&self) -> bool {
        u64::from(self.pc.data()) >= self.code.len() as u64 * 4
    }

    fn last_ecall(&self) -> Option<u64> {
        self.signals.map(|signals| signals.control.ecall.to_u64())
    }

    /// `true` when the last executed instruction was `ecall`.
    #[must_use]
    pub fn is_syscall(&self) -> bool {
        self.last_ecall() == Some(ecall_kind::ECALL.into())
    }

    /// `true` when the last executed instruction was `ebreak`.
    #[must_use]
    pub fn is_break(&self) -> bool {
        self.last_ecall() == Some(ecall_kind::EBREAK.into())
    }

    /// Current PC.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc.data()
    }

    /// Register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Loaded program words.
    #[must_use]
    pub fn code(&self) -> &[u32] {
        &self.code
    }

    /// Instruction memory.
    #[must_use]
    pub const fn instruction_memory(&self) -> &Memory {
        self.instruction_memory.memory()
    }

    /// Data memory.
    #[must_use]
    pub const fn data_memory(&self) -> &Memory {
        self.data_memory.memory()
    }

    /// Data memory, for placing program data before a run.
    pub fn data_memory_mut(&mut self) -> &mut Memory {
        self.data_memory.memory_mut()
    }

    /// Signals of the most recent tick.
    #[must_use]
    pub const fn signals(&self) -> Option<&Signals> {
        self.signals.as_ref()
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Ticks since construction or the last reset.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Construction parameters.
    #[must_use]
    pub const fn config(&self) -> &SimulatorConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::Simulator;
    use crate::{FaultClass, RunState, SimulatorConfig};

    fn small() -> Simulator {
        Simulator::with_config(SimulatorConfig {
            memory_size: 1 << 16,
            ..SimulatorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn default_program_is_a_single_nop() {
        let mut simulator = Simulator::new().unwrap();
        assert_eq!(simulator.code(), &[0x0000_0013]);
        assert_eq!(simulator.registers().get(2), Some(0x7FFF_FFF0));
        assert_eq!(simulator.registers().get(3), Some(0x1000_8000));
        assert_eq!(simulator.state(), RunState::Constructed);
        assert_eq!(simulator.run(), Ok(1));
        assert_eq!(simulator.pc(), 4);
        assert_eq!(simulator.state(), RunState::Done);
    }

    #[test]
    fn registers_read_old_values_within_a_tick() {
        let mut simulator = small();
        // addi x1, x1, 1 ; addi x1, x1, 1
        simulator.set_code(&[0x0010_8093, 0x0010_8093]).unwrap();
        simulator.tick().unwrap();
        let signals = *simulator.signals().unwrap();
        assert_eq!(signals.read_data1.to_u64(), 0);
        assert_eq!(signals.write_data.to_u64(), 1);
        assert_eq!(simulator.registers().get(1), Some(1));
        assert_eq!(simulator.state(), RunState::Running);
        simulator.tick().unwrap();
        assert_eq!(simulator.registers().get(1), Some(2));
    }

    #[test]
    fn ecall_and_ebreak_are_reported_for_the_last_instruction() {
        let mut simulator = small();
        simulator.set_code(&[0x0000_0073, 0x0010_0073, 0x0000_0013]).unwrap();
        simulator.tick().unwrap();
        assert!(simulator.is_syscall() && !simulator.is_break());
        simulator.tick().unwrap();
        assert!(simulator.is_break() && !simulator.is_syscall());
        simulator.tick().unwrap();
        assert!(!simulator.is_break() && !simulator.is_syscall());
    }

    #[test]
    fn faulting_tick_changes_nothing() {
        let mut simulator = small();
        // addi x1, x0, 5 ; <invalid>
        simulator.set_code(&[0x0050_0093, 0x0000_0000]).unwrap();
        simulator.tick().unwrap();
        let fault = simulator.tick().unwrap_err();
        assert_eq!(fault.class(), FaultClass::Decode);
        assert_eq!(simulator.pc(), 4);
        assert_eq!(simulator.ticks(), 1);
    }

    #[test]
    fn ticking_past_the_program_is_a_decode_fault() {
        let mut simulator = small();
        simulator.run().unwrap();
        assert!(simulator.is_done());
        assert_eq!(simulator.tick().unwrap_err().class(), FaultClass::Decode);
    }

    #[test]
    fn failed_set_code_keeps_the_loaded_program() {
        let mut simulator = Simulator::with_config(SimulatorConfig {
            memory_size: 16,
            ..SimulatorConfig::default()
        })
        .unwrap();
        simulator.set_code(&[0x0000_0013; 2]).unwrap();
        assert!(simulator.set_code(&[0x0000_0013; 5]).is_err());
        assert_eq!(simulator.code(), &[0x0000_0013; 2]);
        assert_eq!(simulator.instruction_memory().load(0, 4), Ok(0x13));
        assert_eq!(simulator.run(), Ok(2));
    }

    #[test]
    fn bounded_run_stops_infinite_loops() {
        let mut simulator = small();
        // jal zero, 0
        simulator.set_code(&[0x0000_006F]).unwrap();
        let outcome = simulator.run_bounded(100).unwrap();
        assert_eq!(outcome.ticks, 100);
        assert!(!outcome.done);
        assert_eq!(simulator.pc(), 0);
    }

    #[test]
    fn reset_restores_overrides_and_clears_data() {
        let mut simulator = small();
        simulator
            .set_registers(&BTreeMap::from([(10, 7), (2, 0x100)]))
            .unwrap();
        // addi a0, a0, 1 ; sw a0, 0(sp)
        simulator.set_code(&[0x0015_0513, 0x00A1_2023]).unwrap();
        simulator.run().unwrap();
        assert_eq!(simulator.data_memory().load(0x100, 4), Ok(8));
        assert_eq!(simulator.registers().get(10), Some(8));

        simulator.reset().unwrap();
        assert_eq!(simulator.pc(), 0);
        assert_eq!(simulator.registers().get(10), Some(7));
        assert_eq!(simulator.registers().get(2), Some(0x100));
        assert!(simulator.data_memory().is_empty());
        assert!(simulator.signals().is_none());
    }

    #[test]
    fn out_of_range_register_overrides_are_rejected() {
        let mut simulator = small();
        assert!(simulator
            .set_registers(&BTreeMap::from([(1, 1), (40, 1)]))
            .is_err());
        assert_eq!(simulator.registers().get(1), Some(0));
    }

    #[test]
    fn invalid_memory_size_is_rejected() {
        let config = SimulatorConfig {
            memory_size: 3000,
            ..SimulatorConfig::default()
        };
        assert!(Simulator::with_config(config).is_err());
    }
}
