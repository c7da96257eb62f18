//! Cross-back-end equivalence and the concrete seed scenarios from spec.md
//! §8: every back-end must agree on `(status, result)` for the same
//! bytecode.

use pigletvm::vm::error::RuntimeStatus;
use pigletvm::vm::value::Value;
use pigletvm::vm::{asm, switch, threaded, trace};

fn run_all(bytecode: &[u8]) -> Vec<(RuntimeStatus, Value)> {
    vec![
        {
            let (state, status) = switch::interpret(bytecode);
            (status, state.result)
        },
        {
            let (state, status) = threaded::interpret(bytecode);
            (status, state.result)
        },
        {
            let (state, status) = trace::interpret(bytecode);
            (status, state.result)
        },
    ]
}

fn assert_all_backends_agree(bytecode: &[u8]) -> (RuntimeStatus, Value) {
    let results = run_all(bytecode);
    let reference = results[0];
    for (index, result) in results.iter().enumerate() {
        assert_eq!(
            *result, reference,
            "back-end {index} disagreed with the switch interpreter"
        );
    }
    reference
}

#[test]
fn scenario_1_push_pop_res_done() {
    let bytecode = asm::assemble("PUSHI 5\nPOP_RES\nDONE\n").unwrap();
    let (status, result) = assert_all_backends_agree(&bytecode);
    assert_eq!(status, RuntimeStatus::Success);
    assert_eq!(result, Value(5));
}

#[test]
fn scenario_2_arithmetic_composition() {
    let bytecode = asm::assemble(
        "PUSHI 2\nPUSHI 11\nPUSHI 3\nADD\nMUL\nPOP_RES\nDONE\n",
    )
    .unwrap();
    let (status, result) = assert_all_backends_agree(&bytecode);
    assert_eq!(status, RuntimeStatus::Success);
    assert_eq!(result, Value(28));
}

#[test]
fn scenario_3_division_by_zero() {
    let bytecode = asm::assemble("PUSHI 10\nPUSHI 0\nDIV\nPOP_RES\nDONE\n").unwrap();
    let (status, _result) = assert_all_backends_agree(&bytecode);
    assert_eq!(status, RuntimeStatus::DivisionByZero);
}

#[test]
fn scenario_4_unconditional_jump_skips_dead_code() {
    let bytecode = asm::assemble(
        "PUSHI 3\nPUSHI 1\nADD\nJUMP target\nPUSHI 2\nADD\ntarget:\nPOP_RES\nDONE\n",
    )
    .unwrap();
    let (status, result) = assert_all_backends_agree(&bytecode);
    assert_eq!(status, RuntimeStatus::Success);
    assert_eq!(result, Value(4));
}

#[test]
fn scenario_5_memory_store_and_load() {
    let bytecode = asm::assemble("PUSHI 111\nSTOREI 5\nLOADI 5\nPOP_RES\nDONE\n").unwrap();
    let (status, result) = assert_all_backends_agree(&bytecode);
    assert_eq!(status, RuntimeStatus::Success);
    assert_eq!(result, Value(111));
}

#[test]
fn comparisons_yield_zero_or_one_across_every_backend() {
    for (op, a, b, expected) in [
        ("EQUAL", 4, 4, 1),
        ("EQUAL", 4, 5, 0),
        ("LESS", 3, 4, 1),
        ("LESS", 4, 4, 0),
        ("LESS_OR_EQUAL", 4, 4, 1),
        ("GREATER", 5, 4, 1),
        ("GREATER_OR_EQUAL", 4, 4, 1),
    ] {
        let source = format!("PUSHI {a}\nPUSHI {b}\n{op}\nPOP_RES\nDONE\n");
        let bytecode = asm::assemble(&source).unwrap();
        let (status, result) = assert_all_backends_agree(&bytecode);
        assert_eq!(status, RuntimeStatus::Success);
        assert_eq!(result, Value(expected), "op {op} on ({a}, {b})");
    }
}

#[test]
fn idempotence_same_bytecode_twice_gives_identical_results() {
    let bytecode = asm::assemble("PUSHI 2\nPUSHI 11\nPUSHI 3\nADD\nMUL\nPOP_RES\nDONE\n").unwrap();
    let first = assert_all_backends_agree(&bytecode);
    let second = assert_all_backends_agree(&bytecode);
    assert_eq!(first, second);
}

#[test]
fn unknown_opcode_byte_is_reported_by_every_backend() {
    let bytecode = vec![0xff];
    let results = run_all(&bytecode);
    for (status, _result) in results {
        assert_eq!(status, RuntimeStatus::UnknownOpcode);
    }
}

#[test]
fn loop_with_conditional_branch_agrees_across_backends() {
    // Counts from 0 to 4, accumulating i*i at each step, via a conditional
    // back-edge — exercises the trace engine's branch-taken and
    // branch-not-taken compilation paths, plus cache reuse on repeat.
    let source = "
        PUSHI 0
        STOREI 0
        PUSHI 0
        STOREI 1
    loop:
        LOADI 1
        PUSHI 5
        LESS
        JUMP_IF_FALSE done
        LOADI 0
        LOADI 1
        LOADI 1
        MUL
        ADD
        STOREI 0
        LOADI 1
        PUSHI 1
        ADD
        STOREI 1
        JUMP loop
    done:
        LOADI 0
        POP_RES
        DONE
    ";
    let bytecode = asm::assemble(source).unwrap();
    let (status, result) = assert_all_backends_agree(&bytecode);
    assert_eq!(status, RuntimeStatus::Success);
    // 0^2 + 1^2 + 2^2 + 3^2 + 4^2 = 30
    assert_eq!(result, Value(30));
}
