//! The trace-cached back-end: lazy per-entry compilation of a bytecode
//! offset into a linear chain of pre-decoded "superoperations". A cache
//! entry starts `Uncompiled` and is replaced with a compiled chain on first
//! visit; every later visit to the same offset reuses the compiled chain.
//!
//! Each `SuperOp` is a plain enum discriminant rather than a raw function
//! pointer, so the outer loop walks a compiled chain with an index instead
//! of a tail call. The compile-once/chain-execute contract and the
//! prejump/tail constructions below preserve the same observable semantics
//! as the switch and threaded back-ends.

use super::codec::Cursor;
use super::error::RuntimeStatus;
use super::opcode::{OPCODE_COUNT, Opcode};
use super::state::VmState;
use super::value::Value;

/// Capacity of the bytecode-offset-indexed trace cache.
pub const MAX_CODE_LEN: usize = 4096;

/// Maximum superops in one compiled chain.
pub const MAX_TRACE_LEN: usize = 16;

/// A non-control instruction's effect, applied directly to the shared stack
/// and memory. Pairs an opcode-specific handler with its pre-decoded
/// immediate (`0` when the opcode has none).
type SimpleHandler = fn(&mut VmState, u64);

/// One slot in a compiled trace chain — the Rust analogue of C's
/// `struct scode { uint64_t arg; trace_op_handler *handler; }`.
#[derive(Clone, Copy)]
enum SuperOp {
    /// Ordinary effect; falls through to the next slot in the chain.
    Simple(SimpleHandler, u64),
    /// Ends the trace with a terminal status (`ABORT`/`DONE`).
    Terminal(RuntimeStatus),
    /// Ends the trace; pops the condition and writes `pc` if taken is true
    /// (`JUMP_IF_TRUE`) or the condition is false (`JUMP_IF_FALSE`).
    Branch { jump_if: bool, target: u64 },
    /// Ends the trace; writes the fall-through `pc` unconditionally. Emitted
    /// immediately before a `Branch` slot so the untaken path still lands on
    /// the right instruction after the chain ends here.
    Prejump(u64),
    /// Ends the trace; writes `pc` to resume scanning where this chain's
    /// static length ran out (trace-too-long case).
    Tail(u64),
    /// `DIV`: only superop whose effect can itself fail at runtime. Checked
    /// separately from `Simple` because `SimpleHandler` has no way to signal
    /// `DivisionByZero` back to the chain walker, so the walker returns
    /// early instead.
    Div,
}

/// A compiled chain: up to `MAX_TRACE_LEN` superops, in order.
struct TraceChain {
    ops: Vec<SuperOp>,
}

enum CacheEntry {
    Uncompiled,
    Compiled(TraceChain),
}

struct TraceCache {
    entries: Vec<CacheEntry>,
}

impl TraceCache {
    fn new() -> Self {
        let mut entries = Vec::with_capacity(MAX_CODE_LEN);
        entries.resize_with(MAX_CODE_LEN, || CacheEntry::Uncompiled);
        TraceCache { entries }
    }
}

/// Run `bytecode` to completion on a fresh `VmState` using trace-cached
/// dispatch. Returns the terminal status; on `RuntimeStatus::Success` the
/// result is available via `state.result`.
pub fn interpret(bytecode: &[u8]) -> (VmState, RuntimeStatus) {
    let mut state = VmState::new();
    let mut cache = TraceCache::new();
    let status = run(&mut state, bytecode, &mut cache);
    (state, status)
}

fn run(state: &mut VmState, bytecode: &[u8], cache: &mut TraceCache) -> RuntimeStatus {
    let mut pc: usize = 0;
    let mut is_running = true;
    let mut status = RuntimeStatus::Success;

    while is_running {
        if pc >= cache.entries.len() {
            return RuntimeStatus::EndOfStream;
        }

        if matches!(cache.entries[pc], CacheEntry::Uncompiled) {
            match compile(bytecode, pc) {
                Ok(chain) => cache.entries[pc] = CacheEntry::Compiled(chain),
                Err(err) => return err,
            }
        }

        let CacheEntry::Compiled(chain) = &cache.entries[pc] else {
            unreachable!("just compiled")
        };

        match execute_chain(state, chain) {
            ChainOutcome::NextPc(next_pc) => pc = next_pc,
            ChainOutcome::Halt(result_status) => {
                is_running = false;
                status = result_status;
            }
        }
    }

    status
}

enum ChainOutcome {
    NextPc(usize),
    Halt(RuntimeStatus),
}

/// Walk a compiled chain slot by slot until a control superop ends it.
fn execute_chain(state: &mut VmState, chain: &TraceChain) -> ChainOutcome {
    for op in &chain.ops {
        match op {
            SuperOp::Simple(handler, arg) => handler(state, *arg),
            SuperOp::Terminal(status) => return ChainOutcome::Halt(*status),
            SuperOp::Branch { jump_if, target } => {
                let cond = state.pop().is_truthy();
                if cond == *jump_if {
                    return ChainOutcome::NextPc(*target as usize);
                }
                // Fall-through pc was already written by the preceding
                // Prejump; this chain ends here either way.
                return ChainOutcome::NextPc(state.ip);
            }
            SuperOp::Prejump(target) => {
                state.ip = *target as usize;
            }
            SuperOp::Tail(target) => return ChainOutcome::NextPc(*target as usize),
            SuperOp::Div => {
                let rhs = state.pop();
                if rhs.0 == 0 {
                    return ChainOutcome::Halt(RuntimeStatus::DivisionByZero);
                }
                *state.top_mut() = Value(state.peek().0 / rhs.0);
            }
        }
    }
    unreachable!("every compiled chain ends in a control superop")
}

/// Compile the trace starting at bytecode offset `start_pc`: scan forward,
/// inlining unconditional jumps for free, until a terminal op, a conditional
/// branch, or the chain capacity ends the scan.
fn compile(bytecode: &[u8], start_pc: usize) -> Result<TraceChain, RuntimeStatus> {
    let mut ops = Vec::with_capacity(MAX_TRACE_LEN);
    let mut pc = start_pc;

    loop {
        let Some(&byte) = bytecode.get(pc) else {
            return Err(RuntimeStatus::EndOfStream);
        };
        let Some(op) = Opcode::from_byte(byte) else {
            return Err(RuntimeStatus::UnknownOpcode);
        };
        let info = op.info();

        if info.is_terminal {
            ops.push(SuperOp::Terminal(terminal_status(op)));
            break;
        }

        if info.is_conditional_branch {
            let mut cursor = Cursor { bytecode, ip: pc + 1 };
            let target = cursor
                .next_u16()
                .ok_or(RuntimeStatus::EndOfStream)? as u64;
            let fall_through = cursor.ip as u64;
            ops.push(SuperOp::Prejump(fall_through));
            ops.push(SuperOp::Branch {
                jump_if: op == Opcode::JumpIfTrue,
                target,
            });
            break;
        }

        if info.is_absolute_jump {
            // Inline the jump at compile time: no superop emitted (and no
            // chain-length cost), just redirect the scanning cursor to the
            // target and keep scanning.
            let mut cursor = Cursor { bytecode, ip: pc + 1 };
            let target = cursor.next_u16().ok_or(RuntimeStatus::EndOfStream)?;
            pc = target as usize;
            continue;
        }

        if ops.len() >= MAX_TRACE_LEN - 2 {
            ops.push(SuperOp::Tail(pc as u64));
            break;
        }

        let mut next_pc = pc + 1;
        let arg = if info.has_immediate {
            let mut cursor = Cursor { bytecode, ip: next_pc };
            let arg = cursor.next_u16().ok_or(RuntimeStatus::EndOfStream)?;
            next_pc = cursor.ip;
            arg as u64
        } else {
            0
        };
        if op == Opcode::Div {
            ops.push(SuperOp::Div);
        } else {
            ops.push(SuperOp::Simple(simple_handler(op), arg));
        }
        pc = next_pc;
    }

    Ok(TraceChain { ops })
}

fn terminal_status(op: Opcode) -> RuntimeStatus {
    match op {
        Opcode::Abort => RuntimeStatus::EndOfStream,
        Opcode::Done => RuntimeStatus::Success,
        _ => unreachable!("only Abort and Done are terminal"),
    }
}

fn simple_handler(op: Opcode) -> SimpleHandler {
    match op {
        Opcode::PushI => |s, arg| s.push(Value(arg)),
        Opcode::LoadI => |s, arg| {
            let val = s.memory[arg as usize];
            s.push(val);
        },
        Opcode::LoadAddI => |s, arg| {
            let val = s.memory[arg as usize];
            *s.top_mut() = s.top_mut().wrapping_add(val);
        },
        Opcode::StoreI => |s, arg| {
            let val = s.pop();
            s.memory[arg as usize] = val;
        },
        Opcode::Load => |s, _| {
            let addr = s.pop().0 as usize;
            let val = s.memory[addr];
            s.push(val);
        },
        Opcode::Store => |s, _| {
            let val = s.pop();
            let addr = s.pop().0 as usize;
            s.memory[addr] = val;
        },
        Opcode::Dup => |s, _| s.push(s.peek()),
        Opcode::Discard => |s, _| {
            s.pop();
        },
        Opcode::Add => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = s.top_mut().wrapping_add(rhs);
        },
        Opcode::AddI => |s, arg| {
            *s.top_mut() = s.top_mut().wrapping_add(Value(arg));
        },
        Opcode::Sub => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = s.top_mut().wrapping_sub(rhs);
        },
        Opcode::Mul => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = s.top_mut().wrapping_mul(rhs);
        },
        Opcode::Div => unreachable!("Div compiles to SuperOp::Div, never a Simple superop"),
        Opcode::Equal => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = Value::from_bool(s.peek() == rhs);
        },
        Opcode::Less => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = Value::from_bool(s.peek().0 < rhs.0);
        },
        Opcode::LessOrEqual => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = Value::from_bool(s.peek().0 <= rhs.0);
        },
        Opcode::Greater => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = Value::from_bool(s.peek().0 > rhs.0);
        },
        Opcode::GreaterOrEqual => |s, _| {
            let rhs = s.pop();
            *s.top_mut() = Value::from_bool(s.peek().0 >= rhs.0);
        },
        Opcode::GreaterOrEqualI => |s, arg| {
            *s.top_mut() = Value::from_bool(s.peek().0 >= arg);
        },
        Opcode::PopRes => |s, _| {
            s.result = s.pop();
        },
        Opcode::Print => |s, _| println!("{}", s.pop()),
        Opcode::Abort | Opcode::Done | Opcode::Jump | Opcode::JumpIfTrue | Opcode::JumpIfFalse => {
            unreachable!("control opcodes never become a Simple superop")
        }
    }
}

#[allow(dead_code)]
const _ASSERT_OPCODE_COUNT_COVERED: [(); OPCODE_COUNT] = [(); OPCODE_COUNT];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::asm::assemble;

    fn run_source(src: &str) -> (VmState, RuntimeStatus) {
        let bytecode = assemble(src).expect("assembles");
        interpret(&bytecode)
    }

    #[test]
    fn pushi_pop_res_done() {
        let (state, status) = run_source("PUSHI 5\nPOP_RES\nDONE\n");
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(state.result, Value(5));
    }

    #[test]
    fn arithmetic_sequence() {
        let (state, status) =
            run_source("PUSHI 2\nPUSHI 11\nPUSHI 3\nADD\nMUL\nPOP_RES\nDONE\n");
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(state.result, Value(28));
    }

    #[test]
    fn division_by_zero_unwinds_the_chain() {
        let (_, status) = run_source("PUSHI 10\nPUSHI 0\nDIV\nPOP_RES\nDONE\n");
        assert_eq!(status, RuntimeStatus::DivisionByZero);
    }

    #[test]
    fn unconditional_jump_is_inlined_at_compile_time() {
        let src = "PUSHI 3\nPUSHI 1\nADD\nJUMP target\nPUSHI 2\nADD\ntarget:\nPOP_RES\nDONE\n";
        let (state, status) = run_source(src);
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(state.result, Value(4));
    }

    #[test]
    fn conditional_branch_prejump_then_branch() {
        let src = "PUSHI 1\nJUMP_IF_TRUE taken\nPUSHI 99\nPOP_RES\nDONE\ntaken:\nPUSHI 7\nPOP_RES\nDONE\n";
        let (state, status) = run_source(src);
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(state.result, Value(7));
    }

    #[test]
    fn conditional_branch_not_taken_falls_through() {
        let src = "PUSHI 0\nJUMP_IF_TRUE taken\nPUSHI 99\nPOP_RES\nDONE\ntaken:\nPUSHI 7\nPOP_RES\nDONE\n";
        let (state, status) = run_source(src);
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(state.result, Value(99));
    }

    #[test]
    fn loop_reuses_the_same_compiled_chain() {
        // A small counted loop: re-enters the same pc repeatedly, forcing
        // the cache entry to be looked up (and not recompiled) many times.
        let src = "\
            PUSHI 0\nSTOREI 0\n\
            loop:\n\
            LOADI 0\nADDI 1\nDUP\nSTOREI 0\n\
            GREATER_OR_EQUALI 5\n\
            JUMP_IF_FALSE loop\n\
            LOADI 0\nPOP_RES\nDONE\n";
        let (state, status) = run_source(src);
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(state.result, Value(5));
    }
}
