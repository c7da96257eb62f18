//! CLI entry point for the arithmetic VM: assemble, disassemble, run, and
//! benchmark bytecode against any of the three interpreter back-ends.
//!
//! One `clap::Parser` struct wraps a `Subcommand` enum; `fn main() ->
//! ExitCode` prints errors to stderr and returns `ExitCode::FAILURE` rather
//! than panicking.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use pigletvm::config::Backend;
use pigletvm::vm::{asm, disasm, switch, threaded, trace};

#[derive(Parser)]
#[command(name = "piglet")]
#[command(about = "PigletVM: a pedagogical stack-oriented bytecode VM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble text source into a bytecode file
    Asm {
        source_path: PathBuf,
        out_path: PathBuf,
    },
    /// Print the disassembly of a bytecode file
    Dis { bytecode_path: PathBuf },
    /// Run a bytecode file once
    Run {
        bytecode_path: PathBuf,

        /// Interpreter back-end to run
        #[arg(long, value_enum, default_value = "switch")]
        backend: Backend,
    },
    /// Run a bytecode file N times, reporting total wall time
    Runtimes {
        bytecode_path: PathBuf,
        n: u32,

        #[arg(long, value_enum, default_value = "switch")]
        backend: Backend,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Asm {
            source_path,
            out_path,
        } => match cmd_asm(&source_path, &out_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        Commands::Dis { bytecode_path } => match cmd_dis(&bytecode_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        Commands::Run {
            bytecode_path,
            backend,
        } => match cmd_run(&bytecode_path, backend) {
            Ok(success) => {
                if success {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        Commands::Runtimes {
            bytecode_path,
            n,
            backend,
        } => match cmd_runtimes(&bytecode_path, n, backend) {
            Ok(success) => {
                if success {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::FAILURE
                }
            }
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
    }
}

fn cmd_asm(source_path: &PathBuf, out_path: &PathBuf) -> Result<(), String> {
    let source = std::fs::read_to_string(source_path)
        .map_err(|e| format!("error: cannot read {}: {e}", source_path.display()))?;
    let bytecode = asm::assemble(&source).map_err(|e| format!("assembly error: {e}"))?;
    std::fs::write(out_path, bytecode)
        .map_err(|e| format!("error: cannot write {}: {e}", out_path.display()))?;
    Ok(())
}

fn cmd_dis(bytecode_path: &PathBuf) -> Result<(), String> {
    let bytecode = std::fs::read(bytecode_path)
        .map_err(|e| format!("error: cannot read {}: {e}", bytecode_path.display()))?;
    print!("{}", disasm::disassemble(&bytecode));
    Ok(())
}

fn run_once(bytecode: &[u8], backend: Backend) -> (pigletvm::RuntimeStatus, pigletvm::Value) {
    let (state, status) = match backend {
        Backend::Switch => switch::interpret(bytecode),
        Backend::Threaded => threaded::interpret(bytecode),
        Backend::Trace => trace::interpret(bytecode),
    };
    (status, state.result)
}

fn cmd_run(bytecode_path: &PathBuf, backend: Backend) -> Result<bool, String> {
    let bytecode = std::fs::read(bytecode_path)
        .map_err(|e| format!("error: cannot read {}: {e}", bytecode_path.display()))?;
    let (status, result) = run_once(&bytecode, backend);
    if status.is_success() {
        println!("Result value: {}", result.0);
        Ok(true)
    } else {
        eprintln!("Runtime error: {status}");
        Ok(false)
    }
}

fn cmd_runtimes(bytecode_path: &PathBuf, n: u32, backend: Backend) -> Result<bool, String> {
    let bytecode = std::fs::read(bytecode_path)
        .map_err(|e| format!("error: cannot read {}: {e}", bytecode_path.display()))?;

    let mut all_succeeded = true;
    let start = Instant::now();
    for _ in 0..n {
        let (status, result) = run_once(&bytecode, backend);
        if status.is_success() {
            println!("Result value: {}", result.0);
        } else {
            eprintln!("Runtime error: {status}");
            all_succeeded = false;
        }
    }
    let elapsed = start.elapsed();
    eprintln!("PROFILE: code finished took {}ms", elapsed.as_millis());

    Ok(all_succeeded)
}
