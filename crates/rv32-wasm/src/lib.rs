use std::collections::BTreeMap;

use rv32_asm::{assemble, words, AssembledWord};
use rv32_core::{register_number, RunOutcome, Signals, Simulator, SimulatorConfig, TableFormat};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(s: &str);
}

macro_rules! console_log {
    ($($t:tt)*) => (log(&format!($($t)*)))
}

/// Machine state handed to the page after each step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub pc: u32,
    pub ticks: u64,
    pub done: bool,
    pub syscall: bool,
    #[serde(rename = "break")]
    pub brk: bool,
    pub line: Option<usize>,
    pub registers: Vec<u32>,
}

/// Simulator plus the source-line map of the loaded program.
///
/// Errors are already rendered to text so the page can show them as is.
#[derive(Debug, Clone)]
pub struct Session {
    simulator: Simulator,
    lines: Vec<usize>,
}

impl Session {
    /// # Errors
    ///
    /// Fails when `config.memory_size` is not a power of two.
    pub fn new(config: SimulatorConfig) -> Result<Self, String> {
        Ok(Self {
            simulator: Simulator::with_config(config).map_err(|e| e.to_string())?,
            lines: Vec::new(),
        })
    }

    /// Assembles and loads `source`; returns the number of words.
    ///
    /// # Errors
    ///
    /// Returns the assembler diagnostic with a source preview, or a fault
    /// when the program does not fit in instruction memory.
    pub fn load_source(&mut self, source: &str) -> Result<usize, String> {
        let assembled = assemble(source).map_err(|e| e.format_for_stderr(Some(source)))?;
        self.load(&assembled)?;
        Ok(assembled.len())
    }

    /// # Errors
    ///
    /// Fails when the program does not fit in instruction memory.
    pub fn load_words(&mut self, code: &[u32]) -> Result<(), String> {
        self.simulator.set_code(code).map_err(|e| e.to_string())?;
        self.lines.clear();
        Ok(())
    }

    fn load(&mut self, assembled: &[AssembledWord]) -> Result<(), String> {
        self.simulator
            .set_code(&words(assembled))
            .map_err(|e| e.to_string())?;
        self.lines = assembled.iter().map(|word| word.line).collect();
        Ok(())
    }

    /// Applies register overrides keyed by any accepted register name.
    ///
    /// # Errors
    ///
    /// Rejects the whole map when one name is not a register.
    pub fn set_registers(&mut self, values: &BTreeMap<String, u32>) -> Result<(), String> {
        let mut indexed = BTreeMap::new();
        for (name, value) in values {
            let index = register_number(name).ok_or_else(|| format!("unknown register: {name}"))?;
            indexed.insert(usize::from(index), *value);
        }
        self.simulator
            .set_registers(&indexed)
            .map_err(|e| e.to_string())
    }

    /// # Errors
    ///
    /// Returns the fault and the PC it was raised at.
    pub fn tick(&mut self) -> Result<(), String> {
        let pc = self.simulator.pc();
        self.simulator
            .tick()
            .map_err(|fault| format!("{fault} (pc {pc:#010x})"))
    }

    /// # Errors
    ///
    /// As [`Session::tick`].
    pub fn run(&mut self, max_ticks: u64) -> Result<RunOutcome, String> {
        self.simulator
            .run_bounded(max_ticks)
            .map_err(|fault| format!("{fault} (pc {:#010x})", self.simulator.pc()))
    }

    /// # Errors
    ///
    /// Propagates register initialisation failures.
    pub fn reset(&mut self) -> Result<(), String> {
        self.simulator.reset().map_err(|e| e.to_string())
    }

    /// Source line of the instruction at `pc`, when it came from source text.
    #[must_use]
    pub fn line_for_pc(&self, pc: u32) -> Option<usize> {
        if pc % 4 != 0 {
            return None;
        }
        self.lines.get(usize::try_from(pc / 4).ok()?).copied()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let pc = self.simulator.pc();
        Snapshot {
            pc,
            ticks: self.simulator.ticks(),
            done: self.simulator.is_done(),
            syscall: self.simulator.is_syscall(),
            brk: self.simulator.is_break(),
            line: self.line_for_pc(pc),
            registers: self.registers(),
        }
    }

    #[must_use]
    pub fn registers(&self) -> Vec<u32> {
        self.simulator.registers().as_array().to_vec()
    }

    #[must_use]
    pub fn signals(&self) -> Option<&Signals> {
        self.simulator.signals()
    }

    /// # Errors
    ///
    /// Fails only for a memory size the default table cannot split into words.
    pub fn data_memory_dump(&self) -> Result<String, String> {
        self.simulator
            .data_memory()
            .format_table(TableFormat::default())
            .map_err(|e| e.to_string())
    }

    #[must_use]
    pub const fn simulator(&self) -> &Simulator {
        &self.simulator
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen]
pub struct WasmSimulator {
    session: Session,
}

#[wasm_bindgen]
impl WasmSimulator {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmSimulator, JsValue> {
        console_error_panic_hook::set_once();
        Ok(Self {
            session: Session::new(SimulatorConfig::default()).map_err(|e| JsValue::from_str(&e))?,
        })
    }

    /// Assembles and loads a program; returns the number of words.
    pub fn load_source(&mut self, source: &str) -> Result<usize, JsValue> {
        match self.session.load_source(source) {
            Ok(count) => {
                console_log!("Assembled {} instructions", count);
                Ok(count)
            }
            Err(message) => {
                web_sys::console::warn_1(&JsValue::from_str(&message));
                Err(JsValue::from_str(&message))
            }
        }
    }

    pub fn load_words(&mut self, code: &[u32]) -> Result<(), JsValue> {
        self.session
            .load_words(code)
            .map_err(|e| JsValue::from_str(&e))?;
        console_log!("Loaded {} words", code.len());
        Ok(())
    }

    /// Takes an object mapping register names to values.
    pub fn set_registers(&mut self, values: JsValue) -> Result<(), JsValue> {
        let values: BTreeMap<String, u32> = serde_wasm_bindgen::from_value(values)?;
        self.session
            .set_registers(&values)
            .map_err(|e| JsValue::from_str(&e))
    }

    pub fn tick(&mut self) -> Result<(), JsValue> {
        self.session.tick().map_err(|e| JsValue::from_str(&e))
    }

    /// Runs at most `max_ticks` ticks; returns `{ ticks, done }`.
    pub fn run(&mut self, max_ticks: u32) -> Result<JsValue, JsValue> {
        let outcome = self
            .session
            .run(u64::from(max_ticks))
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&outcome)
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        self.session.reset().map_err(|e| JsValue::from_str(&e))
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.session.simulator().is_done()
    }

    #[must_use]
    pub fn is_syscall(&self) -> bool {
        self.session.simulator().is_syscall()
    }

    #[must_use]
    pub fn is_break(&self) -> bool {
        self.session.simulator().is_break()
    }

    #[must_use]
    pub fn pc(&self) -> u32 {
        self.session.simulator().pc()
    }

    #[must_use]
    pub fn registers(&self) -> js_sys::Uint32Array {
        js_sys::Uint32Array::from(self.session.registers().as_slice())
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.snapshot())
    }

    /// Signals of the last tick, or `null` before the first one.
    pub fn signals(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.signals())
    }

    pub fn data_memory_dump(&self) -> Result<String, JsValue> {
        self.session
            .data_memory_dump()
            .map_err(|e| JsValue::from_str(&e))
    }

    #[must_use]
    pub fn line_for_pc(&self, pc: u32) -> Option<usize> {
        self.session.line_for_pc(pc)
    }
}
