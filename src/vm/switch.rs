//! The switch-dispatch back-end: a single fetch-decode-dispatch loop over a
//! `match` on `Opcode`, returning the terminal status on the first fault.

use super::codec::Cursor;
use super::error::RuntimeStatus;
use super::opcode::Opcode;
use super::state::VmState;
use super::value::Value;

/// Run `bytecode` to completion on a fresh `VmState` using plain switch
/// dispatch. Returns the terminal status; on `RuntimeStatus::Success` the
/// result is available via `state.result`.
pub fn interpret(bytecode: &[u8]) -> (VmState, RuntimeStatus) {
    let mut state = VmState::new();
    let status = run(&mut state, bytecode);
    (state, status)
}

fn run(state: &mut VmState, bytecode: &[u8]) -> RuntimeStatus {
    loop {
        let mut cursor = Cursor {
            bytecode,
            ip: state.ip,
        };
        let Some(byte) = cursor.next_opcode_byte() else {
            return RuntimeStatus::EndOfStream;
        };
        let Some(op) = Opcode::from_byte(byte) else {
            return RuntimeStatus::UnknownOpcode;
        };

        macro_rules! next_u16 {
            () => {
                match cursor.next_u16() {
                    Some(v) => v,
                    None => return RuntimeStatus::EndOfStream,
                }
            };
        }
        macro_rules! peek_u16 {
            () => {
                match cursor.peek_u16() {
                    Some(v) => v,
                    None => return RuntimeStatus::EndOfStream,
                }
            };
        }

        match op {
            Opcode::Abort => return RuntimeStatus::EndOfStream,
            Opcode::PushI => {
                let n = next_u16!();
                state.push(Value::from(n));
            }
            Opcode::LoadI => {
                let addr = next_u16!();
                let val = state.memory[addr as usize];
                state.push(val);
            }
            Opcode::LoadAddI => {
                let addr = next_u16!();
                let val = state.memory[addr as usize];
                *state.top_mut() = state.top_mut().wrapping_add(val);
            }
            Opcode::StoreI => {
                let addr = next_u16!();
                let val = state.pop();
                state.memory[addr as usize] = val;
            }
            Opcode::Load => {
                let addr = state.pop().0 as usize;
                let val = state.memory[addr];
                state.push(val);
            }
            Opcode::Store => {
                let val = state.pop();
                let addr = state.pop().0 as usize;
                state.memory[addr] = val;
            }
            Opcode::Dup => {
                state.push(state.peek());
            }
            Opcode::Discard => {
                state.pop();
            }
            Opcode::Add => {
                let rhs = state.pop();
                *state.top_mut() = state.top_mut().wrapping_add(rhs);
            }
            Opcode::AddI => {
                let n = next_u16!();
                *state.top_mut() = state.top_mut().wrapping_add(Value::from(n));
            }
            Opcode::Sub => {
                let rhs = state.pop();
                *state.top_mut() = state.top_mut().wrapping_sub(rhs);
            }
            Opcode::Mul => {
                let rhs = state.pop();
                *state.top_mut() = state.top_mut().wrapping_mul(rhs);
            }
            Opcode::Div => {
                let rhs = state.pop();
                if rhs.0 == 0 {
                    return RuntimeStatus::DivisionByZero;
                }
                *state.top_mut() = Value(state.peek().0 / rhs.0);
            }
            Opcode::Jump => {
                let target = peek_u16!();
                state.ip = target as usize;
                continue;
            }
            Opcode::JumpIfTrue => {
                let target = next_u16!();
                if state.pop().is_truthy() {
                    state.ip = target as usize;
                    continue;
                }
            }
            Opcode::JumpIfFalse => {
                let target = next_u16!();
                if !state.pop().is_truthy() {
                    state.ip = target as usize;
                    continue;
                }
            }
            Opcode::Equal => {
                let rhs = state.pop();
                *state.top_mut() = Value::from_bool(state.peek() == rhs);
            }
            Opcode::Less => {
                let rhs = state.pop();
                *state.top_mut() = Value::from_bool(state.peek().0 < rhs.0);
            }
            Opcode::LessOrEqual => {
                let rhs = state.pop();
                *state.top_mut() = Value::from_bool(state.peek().0 <= rhs.0);
            }
            Opcode::Greater => {
                let rhs = state.pop();
                *state.top_mut() = Value::from_bool(state.peek().0 > rhs.0);
            }
            Opcode::GreaterOrEqual => {
                let rhs = state.pop();
                *state.top_mut() = Value::from_bool(state.peek().0 >= rhs.0);
            }
            Opcode::GreaterOrEqualI => {
                let n = next_u16!();
                *state.top_mut() = Value::from_bool(state.peek().0 >= n as u64);
            }
            Opcode::PopRes => {
                state.result = state.pop();
            }
            Opcode::Done => return RuntimeStatus::Success,
            Opcode::Print => {
                println!("{}", state.pop());
            }
        }

        state.ip = cursor.ip;
    }
}
