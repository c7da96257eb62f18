//! PigletVM — a pedagogical stack-oriented bytecode VM.
//!
//! This crate provides the arithmetic VM (three interpreter back-ends
//! sharing one instruction set and one observable semantics) together with
//! its text assembler/disassembler, and a companion Thompson-NFA event
//! matcher with its own compact bytecode.

pub mod config;
pub mod matcher;
pub mod vm;

pub use config::{Backend, RuntimeConfig};
pub use vm::error::RuntimeStatus;
pub use vm::value::Value;
