//! CLI entry point for the rv32 assembler binary.

use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use rv32_asm::parser::parse_number;
use rv32_asm::{assemble, words, AssembledWord};
use rv32_core::{register_number, Simulator, ABI_REGISTER_NAMES};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: rv32-asm <command> [options]

Commands:
  build <input> [-o <output>] [--verbose]   Assemble source to little-endian words
  run   <input> [--max-ticks <n>] [--reg <name>=<value>]...
                                            Assemble and simulate, then print registers

Options:
  -o, --output <file>     Output file path (default: input stem + .bin)
  -v, --verbose           Print a line/word listing (build only)
      --max-ticks <n>     Tick limit for run (default: 1000000)
      --reg <name>=<val>  Initial register value for run, e.g. a0=0x100
  -h, --help              Show this help message

Examples:
  rv32-asm build sort.s
  rv32-asm build sort.s -o sort.bin -v
  rv32-asm run sort.s --reg a0=0x100 --reg a1=7
";

const DEFAULT_MAX_TICKS: u64 = 1_000_000;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Build(BuildArgs),
    Run(RunArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct BuildArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    verbose: bool,
}

#[derive(Debug, PartialEq, Eq)]
struct RunArgs {
    input: PathBuf,
    max_ticks: u64,
    registers: BTreeMap<usize, u32>,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "build" => parse_build_args(args)
            .map(Command::Build)
            .map(ParseResult::Command),
        "run" => parse_run_args(args)
            .map(Command::Run)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn set_input(input: &mut Option<PathBuf>, arg: OsString) -> Result<(), String> {
    if arg.to_string_lossy().starts_with('-') {
        return Err(format!("unknown option: {}", arg.to_string_lossy()));
    }
    if input.is_some() {
        return Err("multiple input paths provided".to_string());
    }
    *input = Some(PathBuf::from(arg));
    Ok(())
}

#[allow(clippy::while_let_on_iterator)]
fn parse_build_args(mut args: impl Iterator<Item = OsString>) -> Result<BuildArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut output: Option<PathBuf> = None;
    let mut verbose = false;

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--verbose" || arg == "-v" {
            verbose = true;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -o".to_string())?;
            output = Some(PathBuf::from(value));
            continue;
        }

        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(BuildArgs {
        input,
        output,
        verbose,
    })
}

/// Parses `name=value`, accepting any 32-bit signed or unsigned value.
fn parse_register_assignment(text: &str) -> Result<(usize, u32), String> {
    let (name, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected <name>=<value>, got '{text}'"))?;
    let index = register_number(name.trim()).ok_or_else(|| format!("unknown register: {name}"))?;
    let value = parse_number(value.trim()).ok_or_else(|| format!("invalid number: {value}"))?;
    let value = u32::try_from(value)
        .or_else(|_| i32::try_from(value).map(|v| u32::from_ne_bytes(v.to_ne_bytes())))
        .map_err(|_| format!("value out of 32-bit range: {value}"))?;
    Ok((usize::from(index), value))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_run_args(mut args: impl Iterator<Item = OsString>) -> Result<RunArgs, String> {
    let mut input: Option<PathBuf> = None;
    let mut max_ticks = DEFAULT_MAX_TICKS;
    let mut registers = BTreeMap::new();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "--max-ticks" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --max-ticks".to_string())?;
            let value = value.to_string_lossy();
            max_ticks = value
                .parse()
                .map_err(|_| format!("invalid tick count: {value}"))?;
            continue;
        }

        if arg == "--reg" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for --reg".to_string())?;
            let (index, value) = parse_register_assignment(&value.to_string_lossy())?;
            registers.insert(index, value);
            continue;
        }

        set_input(&mut input, arg)?;
    }

    let input = input.ok_or_else(|| "missing input path".to_string())?;
    Ok(RunArgs {
        input,
        max_ticks,
        registers,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("out");

    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    parent.join(format!("{stem}.bin"))
}

fn load(input: &Path) -> Result<Vec<AssembledWord>, i32> {
    let source = fs::read_to_string(input).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", input.display());
        1
    })?;
    assemble(&source).map_err(|e| {
        eprintln!("{}", e.with_file(input).format_for_stderr(Some(&source)));
        1
    })
}

fn run_build(args: BuildArgs) -> Result<(), i32> {
    let assembled = load(&args.input)?;
    let binary: Vec<u8> = assembled
        .iter()
        .flat_map(|word| word.word.to_le_bytes())
        .collect();

    let output_path = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    if let Err(e) = fs::write(&output_path, &binary) {
        eprintln!("error: failed to write output: {e}");
        return Err(1);
    }

    if args.verbose {
        for (index, word) in assembled.iter().enumerate() {
            println!("{:08x}: {:08x} ; line {}", index * 4, word.word, word.line);
        }
    }

    println!(
        "Assembled {} ({} bytes) -> {}",
        args.input.display(),
        binary.len(),
        output_path.display()
    );

    Ok(())
}

fn run_simulation(args: &RunArgs) -> Result<(), i32> {
    let assembled = load(&args.input)?;
    let report = |fault: rv32_core::Fault| {
        eprintln!("error: {fault}");
        1
    };

    let mut simulator = Simulator::new().map_err(report)?;
    simulator.set_code(&words(&assembled)).map_err(report)?;
    simulator.set_registers(&args.registers).map_err(report)?;
    debug!(words = assembled.len(), max_ticks = args.max_ticks, "starting run");

    let outcome = simulator.run_bounded(args.max_ticks).map_err(|fault| {
        eprintln!("error: {fault} (pc {:#010x})", simulator.pc());
        1
    })?;

    println!("pc: {:#010x}  ticks: {}", simulator.pc(), outcome.ticks);
    for (index, value) in simulator.registers().as_array().iter().enumerate() {
        println!(
            "x{index:<2} {:>4} = {value:#010x} ({})",
            ABI_REGISTER_NAMES[index],
            i32::from_ne_bytes(value.to_ne_bytes())
        );
    }

    if outcome.done {
        Ok(())
    } else {
        eprintln!("error: program did not finish within {} ticks", args.max_ticks);
        Err(2)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(Command::Build(args))) => match run_build(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Ok(ParseResult::Command(Command::Run(args))) => match run_simulation(&args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}
