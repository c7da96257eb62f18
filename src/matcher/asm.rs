//! Two-pass text assembler for matcher bytecode.
//!
//! Mirrors `vm::asm`'s pass structure (parse, collect labels by byte offset,
//! emit) but isn't unified with it behind a shared trait: the matcher's
//! grammar genuinely differs (`SPLIT` takes two label operands, `NAME`/
//! `SCREEN`/`JUMP` take one, and several vm opcodes — literals, arithmetic —
//! have no matcher counterpart at all), so a shared abstraction would mostly
//! be indirection. Same texture as `other_examples`'s
//! `kitrofimov-chip8vm` two-pass assembler: label table first, resolve on
//! the second pass.

use std::collections::HashMap;

use super::error::MatchAssembleError;
use super::opcode::Opcode;

#[derive(Debug, Clone)]
enum Operand {
    Literal(u16),
    Label(String),
}

#[derive(Debug, Clone)]
enum Statement {
    Op {
        opcode: Opcode,
        operands: Vec<Operand>,
        line: usize,
    },
    Label {
        name: String,
    },
}

fn is_label_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn operand_count(opcode: Opcode) -> usize {
    match opcode {
        Opcode::Name | Opcode::Screen | Opcode::Jump => 1,
        Opcode::Split => 2,
        Opcode::Abort | Opcode::Next | Opcode::Match => 0,
    }
}

fn statement_len(opcode: Opcode) -> u16 {
    1 + 2 * operand_count(opcode) as u16
}

fn parse(source: &str) -> Result<Vec<Statement>, MatchAssembleError> {
    let mut statements = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line = index + 1;
        let without_comment = match raw_line.find('#') {
            Some(pos) => &raw_line[..pos],
            None => raw_line,
        };
        let trimmed = without_comment.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(name) = trimmed.strip_suffix(':') {
            if !is_label_name(name) {
                return Err(MatchAssembleError::InvalidLabelName {
                    line,
                    text: name.to_string(),
                });
            }
            statements.push(Statement::Label {
                name: name.to_string(),
            });
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let mnemonic = tokens.next().expect("non-empty trimmed line");
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
            MatchAssembleError::UnknownMnemonic {
                line,
                mnemonic: mnemonic.to_string(),
            }
        })?;

        let mut operands = Vec::new();
        for token in tokens {
            operands.push(parse_operand(token, line)?);
        }

        if operands.len() != operand_count(opcode) {
            return Err(MatchAssembleError::MissingOperand { line });
        }

        statements.push(Statement::Op {
            opcode,
            operands,
            line,
        });
    }

    Ok(statements)
}

fn parse_operand(token: &str, line: usize) -> Result<Operand, MatchAssembleError> {
    if let Ok(value) = token.parse::<u16>() {
        return Ok(Operand::Literal(value));
    }
    if is_label_name(token) {
        return Ok(Operand::Label(token.to_string()));
    }
    Err(MatchAssembleError::InvalidLiteral {
        line,
        text: token.to_string(),
    })
}

fn collect_labels(statements: &[Statement]) -> Result<HashMap<String, u16>, MatchAssembleError> {
    let mut labels = HashMap::new();
    let mut offset: u16 = 0;

    for statement in statements {
        match statement {
            Statement::Label { name } => {
                if labels.insert(name.clone(), offset).is_some() {
                    return Err(MatchAssembleError::DuplicateLabel { name: name.clone() });
                }
            }
            Statement::Op { opcode, .. } => {
                offset += statement_len(*opcode);
            }
        }
    }

    Ok(labels)
}

fn resolve(operand: &Operand, labels: &HashMap<String, u16>) -> Result<u16, MatchAssembleError> {
    match operand {
        Operand::Literal(value) => Ok(*value),
        Operand::Label(name) => labels
            .get(name)
            .copied()
            .ok_or_else(|| MatchAssembleError::UnresolvedLabel { name: name.clone() }),
    }
}

fn emit(
    statements: &[Statement],
    labels: &HashMap<String, u16>,
) -> Result<Vec<u8>, MatchAssembleError> {
    let mut bytes = Vec::new();

    for statement in statements {
        let Statement::Op {
            opcode, operands, ..
        } = statement
        else {
            continue;
        };

        bytes.push(*opcode as u8);
        for operand in operands {
            let value = resolve(operand, labels)?;
            bytes.push((value >> 8) as u8);
            bytes.push((value & 0xff) as u8);
        }
    }

    Ok(bytes)
}

/// Assemble matcher source text into bytecode.
pub fn assemble(source: &str) -> Result<Vec<u8>, MatchAssembleError> {
    let statements = parse(source)?;
    let labels = collect_labels(&statements)?;
    emit(&statements, &labels)
}
