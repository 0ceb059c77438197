//! Instruction-matching rules.
//!
//! Rules are tried in order. A rule applies when the statement's mnemonic is in
//! its set, the operand form agrees, and its lowering function accepts the
//! argument shape; the first rule that applies wins. Pseudo-instructions lower
//! to one or more real instructions here, so label indices count the real
//! instructions.

use crate::instruction::{Instruction, Operands, Target};
use crate::mnemonic;
use crate::parser::{Argument, Form, ParseError, ParseErrorKind, ParsedInstruction};

type Lowered = (&'static str, Operands);

/// Returns `None` when the arguments do not have the shape the rule expects.
type Lower = fn(&'static str, &[Argument]) -> Option<Vec<Lowered>>;

struct Rule {
    mnemonics: &'static [&'static str],
    form: Form,
    lower: Lower,
}

const ZERO: &str = "zero";
const RA: &str = "ra";

const RULES: &[Rule] = &[
    Rule {
        mnemonics: &["add", "sub", "sll", "slt", "sltu", "xor", "srl", "sra", "or", "and"],
        form: Form::Basic,
        lower: register_register,
    },
    Rule {
        mnemonics: &["addi", "slti", "sltiu", "xori", "ori", "andi"],
        form: Form::Basic,
        lower: register_immediate,
    },
    Rule {
        mnemonics: &["slli", "srli", "srai"],
        form: Form::Basic,
        lower: shift_immediate,
    },
    Rule {
        mnemonics: &["lb", "lh", "lw", "lbu", "lhu", "jalr"],
        form: Form::Displacement,
        lower: displacement,
    },
    Rule {
        mnemonics: &["jalr"],
        form: Form::Basic,
        lower: jump_register,
    },
    Rule {
        mnemonics: &["sb", "sh", "sw"],
        form: Form::Displacement,
        lower: store,
    },
    Rule {
        mnemonics: &["beq", "bne", "blt", "bge", "bltu", "bgeu"],
        form: Form::Basic,
        lower: branch,
    },
    Rule {
        mnemonics: &["lui", "auipc"],
        form: Form::Basic,
        lower: upper,
    },
    Rule {
        mnemonics: &["jal"],
        form: Form::Basic,
        lower: jump_and_link,
    },
    Rule {
        mnemonics: &["ecall", "ebreak"],
        form: Form::Basic,
        lower: system,
    },
    Rule {
        mnemonics: &["mv"],
        form: Form::Basic,
        lower: move_register,
    },
    Rule {
        mnemonics: &["li"],
        form: Form::Basic,
        lower: load_immediate,
    },
    Rule {
        mnemonics: &["nop"],
        form: Form::Basic,
        lower: nop,
    },
    Rule {
        mnemonics: &["j"],
        form: Form::Basic,
        lower: jump,
    },
    Rule {
        mnemonics: &["jr"],
        form: Form::Basic,
        lower: jump_to_register,
    },
    Rule {
        mnemonics: &["ret"],
        form: Form::Basic,
        lower: ret,
    },
    Rule {
        mnemonics: &["beqz", "bnez"],
        form: Form::Basic,
        lower: branch_zero,
    },
    Rule {
        mnemonics: &["not"],
        form: Form::Basic,
        lower: not,
    },
    Rule {
        mnemonics: &["neg"],
        form: Form::Basic,
        lower: neg,
    },
];

fn target(arg: &Argument) -> Target {
    match arg {
        Argument::Id(label) => Target::Label(label.clone()),
        Argument::Num(offset) => Target::Offset(*offset),
    }
}

fn register_register(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Id(rs1), Argument::Id(rs2)] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::R {
            rd: rd.clone(),
            rs1: rs1.clone(),
            rs2: rs2.clone(),
        },
    )])
}

fn register_immediate(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Id(rs1), Argument::Num(imm)] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::I {
            rd: rd.clone(),
            rs1: rs1.clone(),
            imm: *imm,
        },
    )])
}

fn shift_immediate(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Id(rs1), Argument::Num(shamt)] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::Is {
            rd: rd.clone(),
            rs1: rs1.clone(),
            shamt: *shamt,
        },
    )])
}

/// `rd, imm(rs1)` for loads and `jalr`.
fn displacement(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Num(imm), Argument::Id(rs1)] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::I {
            rd: rd.clone(),
            rs1: rs1.clone(),
            imm: *imm,
        },
    )])
}

/// `jalr rd, rs1, imm` or `jalr rs1`.
fn jump_register(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    match args {
        [Argument::Id(rs1)] => Some(vec![(
            name,
            Operands::I {
                rd: RA.into(),
                rs1: rs1.clone(),
                imm: 0,
            },
        )]),
        _ => register_immediate(name, args),
    }
}

fn store(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rs2), Argument::Num(imm), Argument::Id(rs1)] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::S {
            rs1: rs1.clone(),
            rs2: rs2.clone(),
            imm: *imm,
        },
    )])
}

fn branch(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rs1), Argument::Id(rs2), destination] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::Sb {
            rs1: rs1.clone(),
            rs2: rs2.clone(),
            target: target(destination),
        },
    )])
}

fn upper(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Num(imm)] = args else {
        return None;
    };
    Some(vec![(
        name,
        Operands::U {
            rd: rd.clone(),
            imm: *imm,
        },
    )])
}

/// `jal rd, target` or `jal target` (linking through `ra`).
fn jump_and_link(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let (rd, destination) = match args {
        [Argument::Id(rd), destination] => (rd.clone(), destination),
        [destination] => (RA.to_owned(), destination),
        _ => return None,
    };
    Some(vec![(
        name,
        Operands::Uj {
            rd,
            target: target(destination),
        },
    )])
}

fn system(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    if !args.is_empty() {
        return None;
    }
    let imm = i64::from(name == "ebreak");
    Some(vec![(
        name,
        Operands::I {
            rd: ZERO.into(),
            rs1: ZERO.into(),
            imm,
        },
    )])
}

fn move_register(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Id(rs)] = args else {
        return None;
    };
    Some(vec![(
        "addi",
        Operands::I {
            rd: rd.clone(),
            rs1: rs.clone(),
            imm: 0,
        },
    )])
}

/// Splits `value` into `lui` + `addi` parts when it needs more than 12 bits.
///
/// Values in `0x8000_0000..=0xFFFF_FFFF` are taken as their 32-bit
/// two's-complement equivalent. Anything wider than 32 bits produces an upper
/// immediate the encoder rejects.
fn load_immediate(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Num(value)] = args else {
        return None;
    };
    let value = if (1_i64 << 31..1_i64 << 32).contains(value) {
        value - (1_i64 << 32)
    } else {
        *value
    };
    if (-2048..2048).contains(&value) {
        return Some(vec![(
            "addi",
            Operands::I {
                rd: rd.clone(),
                rs1: ZERO.into(),
                imm: value,
            },
        )]);
    }
    let low = ((value & 0xFFF) ^ 0x800) - 0x800;
    let high = (value - low) >> 12;
    let mut lowered = vec![(
        "lui",
        Operands::U {
            rd: rd.clone(),
            imm: high,
        },
    )];
    if low != 0 {
        lowered.push((
            "addi",
            Operands::I {
                rd: rd.clone(),
                rs1: rd.clone(),
                imm: low,
            },
        ));
    }
    Some(lowered)
}

fn nop(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    args.is_empty().then(|| {
        vec![(
            "addi",
            Operands::I {
                rd: ZERO.into(),
                rs1: ZERO.into(),
                imm: 0,
            },
        )]
    })
}

fn jump(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [destination] = args else {
        return None;
    };
    Some(vec![(
        "jal",
        Operands::Uj {
            rd: ZERO.into(),
            target: target(destination),
        },
    )])
}

fn jump_to_register(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rs1)] = args else {
        return None;
    };
    Some(vec![(
        "jalr",
        Operands::I {
            rd: ZERO.into(),
            rs1: rs1.clone(),
            imm: 0,
        },
    )])
}

fn ret(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    args.is_empty().then(|| {
        vec![(
            "jalr",
            Operands::I {
                rd: ZERO.into(),
                rs1: RA.into(),
                imm: 0,
            },
        )]
    })
}

fn branch_zero(name: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rs1), destination] = args else {
        return None;
    };
    let real = if name == "beqz" { "beq" } else { "bne" };
    Some(vec![(
        real,
        Operands::Sb {
            rs1: rs1.clone(),
            rs2: ZERO.into(),
            target: target(destination),
        },
    )])
}

fn not(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Id(rs)] = args else {
        return None;
    };
    Some(vec![(
        "xori",
        Operands::I {
            rd: rd.clone(),
            rs1: rs.clone(),
            imm: -1,
        },
    )])
}

fn neg(_: &'static str, args: &[Argument]) -> Option<Vec<Lowered>> {
    let [Argument::Id(rd), Argument::Id(rs)] = args else {
        return None;
    };
    Some(vec![(
        "sub",
        Operands::R {
            rd: rd.clone(),
            rs1: ZERO.into(),
            rs2: rs.clone(),
        },
    )])
}

fn shape(statement: &ParsedInstruction) -> String {
    let kinds: Vec<String> = statement
        .args
        .iter()
        .map(|arg| arg.kind().to_string())
        .collect();
    match (statement.form, kinds.as_slice()) {
        (Form::Displacement, [rd, imm, rs1]) => format!("{rd}, {imm}({rs1})"),
        _ => kinds.join(", "),
    }
}

fn unknown(statement: &ParsedInstruction) -> ParseError {
    ParseError {
        location: statement.location,
        kind: ParseErrorKind::UnknownInstruction {
            mnemonic: statement.mnemonic.clone(),
            shape: shape(statement),
        },
    }
}

/// Converts one parsed statement into real instructions.
///
/// # Errors
///
/// Returns [`ParseErrorKind::UnknownInstruction`] when no rule accepts the
/// mnemonic with this argument shape.
pub fn lower(statement: &ParsedInstruction) -> Result<Vec<Instruction>, ParseError> {
    for rule in RULES.iter().filter(|rule| rule.form == statement.form) {
        let Some(name) = rule
            .mnemonics
            .iter()
            .copied()
            .find(|name| name.eq_ignore_ascii_case(&statement.mnemonic))
        else {
            continue;
        };
        let Some(lowered) = (rule.lower)(name, &statement.args) else {
            continue;
        };
        return lowered
            .into_iter()
            .map(|(real, operands)| {
                let mnemonic = mnemonic::lookup(real).ok_or_else(|| unknown(statement))?;
                Ok(Instruction {
                    mnemonic,
                    operands,
                    location: statement.location,
                })
            })
            .collect();
    }
    Err(unknown(statement))
}
