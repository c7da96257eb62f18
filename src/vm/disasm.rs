//! Linear disassembler: walk bytecode from offset 0, printing one mnemonic
//! (and immediate, if any) per line, stopping at the `Abort` sentinel.

use std::fmt::Write as _;

use super::codec::Cursor;
use super::opcode::Opcode;

/// Disassemble `bytecode` into one text line per instruction.
///
/// Stops at the first `Abort` byte (including a trailing `Abort` written by
/// the assembler as an implicit end marker) or at the end of the buffer.
/// Unknown bytes are rendered as `.byte N` so a malformed blob still
/// produces useful output instead of failing the whole disassembly.
pub fn disassemble(bytecode: &[u8]) -> String {
    let mut out = String::new();
    let mut cursor = Cursor::new(bytecode);

    loop {
        let Some(&byte) = bytecode.get(cursor.ip) else {
            break;
        };
        if byte == Opcode::Abort as u8 {
            break;
        }

        let start = cursor.ip;
        let Some(op) = cursor.next_opcode() else {
            let _ = writeln!(out, "{start}: .byte {byte}");
            cursor.ip = start + 1;
            continue;
        };

        if op.info().has_immediate {
            match cursor.next_u16() {
                Some(arg) => {
                    let _ = writeln!(out, "{start}: {} {arg}", op.mnemonic());
                }
                None => {
                    let _ = writeln!(out, "{start}: {} <truncated>", op.mnemonic());
                    break;
                }
            }
        } else {
            let _ = writeln!(out, "{start}: {}", op.mnemonic());
        }
    }

    out
}
