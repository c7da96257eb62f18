//! Two-pass text assembler for the arithmetic VM's bytecode: a first pass
//! collects label offsets using a byte-length model, a second pass resolves
//! labels and emits, one statement per source line.

use std::collections::HashMap;

use super::codec::encode_u16;
use super::error::AssembleError;
use super::opcode::Opcode;

/// One parsed source line, tagged by what it assembles to.
#[derive(Debug, Clone)]
enum Statement {
    Op {
        opcode: Opcode,
        arg: Option<Arg>,
        line: usize,
    },
    Label {
        name: String,
    },
}

/// An instruction's operand: either a literal or a label reference resolved
/// in the second pass.
#[derive(Debug, Clone)]
enum Arg {
    Literal(u16),
    Label(String),
}

fn is_label_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn statement_len(opcode: Opcode) -> u16 {
    if opcode.info().has_immediate { 3 } else { 1 }
}

/// Parse source text into a flat list of statements, ignoring comments and
/// blank lines.
fn parse(source: &str) -> Result<Vec<Statement>, AssembleError> {
    let mut statements = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        let without_comment = raw_line.splitn(2, '#').next().unwrap_or("").trim();
        if without_comment.is_empty() {
            continue;
        }

        if let Some(name) = without_comment.strip_suffix(':') {
            let name = name.trim();
            if !is_label_name(name) {
                return Err(AssembleError::InvalidLabelName {
                    line,
                    text: name.to_string(),
                });
            }
            statements.push(Statement::Label {
                name: name.to_string(),
            });
            continue;
        }

        let mut tokens = without_comment.split_whitespace();
        let mnemonic = tokens.next().expect("non-empty line has a first token");
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| AssembleError::UnknownMnemonic {
            line,
            mnemonic: mnemonic.to_string(),
        })?;

        let operand_token = tokens.next();
        if tokens.next().is_some() {
            return Err(AssembleError::MissingOperand { line });
        }

        let arg = match operand_token {
            Some(text) => {
                if !opcode.info().has_immediate {
                    return Err(AssembleError::MissingOperand { line });
                }
                Some(parse_arg(text, line)?)
            }
            None => {
                if opcode.info().has_immediate {
                    return Err(AssembleError::MissingOperand { line });
                }
                None
            }
        };

        statements.push(Statement::Op { opcode, arg, line });
    }

    Ok(statements)
}

fn parse_arg(text: &str, line: usize) -> Result<Arg, AssembleError> {
    if let Ok(n) = text.parse::<u16>() {
        return Ok(Arg::Literal(n));
    }
    if is_label_name(text) {
        return Ok(Arg::Label(text.to_string()));
    }
    Err(AssembleError::InvalidLiteral {
        line,
        text: text.to_string(),
    })
}

/// Pass 1: collect label offsets using a fixed size model (`OP+arg` = 3
/// bytes, bare `OP` = 1 byte, labels = 0 bytes).
fn collect_labels(statements: &[Statement]) -> Result<HashMap<String, u16>, AssembleError> {
    let mut labels = HashMap::new();
    let mut offset: u16 = 0;

    for statement in statements {
        match statement {
            Statement::Label { name } => {
                if labels.insert(name.clone(), offset).is_some() {
                    return Err(AssembleError::DuplicateLabel { name: name.clone() });
                }
            }
            Statement::Op { opcode, .. } => {
                offset += statement_len(*opcode);
            }
        }
    }

    Ok(labels)
}

/// Pass 2: resolve labels and emit bytecode.
fn emit(statements: &[Statement], labels: &HashMap<String, u16>) -> Result<Vec<u8>, AssembleError> {
    let mut bytecode = Vec::new();

    for statement in statements {
        let Statement::Op { opcode, arg, .. } = statement else {
            continue;
        };

        bytecode.push(*opcode as u8);
        if let Some(arg) = arg {
            let value = match arg {
                Arg::Literal(n) => *n,
                Arg::Label(name) => *labels
                    .get(name)
                    .ok_or_else(|| AssembleError::UnresolvedLabel { name: name.clone() })?,
            };
            encode_u16(value, &mut bytecode);
        }
    }

    Ok(bytecode)
}

/// Assemble text source into bytecode.
pub fn assemble(source: &str) -> Result<Vec<u8>, AssembleError> {
    let statements = parse(source)?;
    let labels = collect_labels(&statements)?;
    emit(&statements, &labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_a_simple_program() {
        let bytecode = assemble("PUSHI 5\nPOP_RES\nDONE\n").unwrap();
        assert_eq!(
            bytecode,
            vec![
                Opcode::PushI as u8,
                0,
                5,
                Opcode::PopRes as u8,
                Opcode::Done as u8,
            ]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let bytecode = assemble("# a comment\n\nPUSHI 5 # trailing comment\n\nPOP_RES\nDONE\n").unwrap();
        assert_eq!(bytecode.len(), 5);
    }

    #[test]
    fn resolves_forward_label_references() {
        let src = "PUSHI 3\nPUSHI 1\nADD\nJUMP target\nPUSHI 2\nADD\ntarget:\nPOP_RES\nDONE\n";
        let bytecode = assemble(src).unwrap();
        // target is at offset 3+3+1+3 = 10
        let jump_pos = 3 + 3 + 1;
        assert_eq!(bytecode[jump_pos], Opcode::Jump as u8);
        assert_eq!(bytecode[jump_pos + 1], 0);
        assert_eq!(bytecode[jump_pos + 2], 10);
    }

    #[test]
    fn unresolved_label_is_an_error() {
        let err = assemble("JUMP nowhere\n").unwrap_err();
        assert_eq!(
            err,
            AssembleError::UnresolvedLabel {
                name: "nowhere".to_string()
            }
        );
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        let err = assemble("FROB\n").unwrap_err();
        assert!(matches!(err, AssembleError::UnknownMnemonic { .. }));
    }

    #[test]
    fn case_insensitive_mnemonics() {
        let bytecode = assemble("pushi 1\npop_res\ndone\n").unwrap();
        assert_eq!(bytecode[0], Opcode::PushI as u8);
    }
}
