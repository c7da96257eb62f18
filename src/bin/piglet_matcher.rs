//! CLI entry point for the event matcher: assemble, disassemble, and run
//! matcher bytecode against a text file of events.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pigletvm::matcher::{asm, disasm, MatchOutcome, Matcher};

#[derive(Parser)]
#[command(name = "piglet-matcher")]
#[command(about = "PigletVM's companion Thompson-NFA event matcher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble matcher text source into a bytecode file
    Asm {
        source_path: PathBuf,
        out_path: PathBuf,
    },
    /// Print the disassembly of a matcher bytecode file
    Dis { bytecode_path: PathBuf },
    /// Run matcher bytecode against a file of events
    Run {
        bytecode_path: PathBuf,
        events_path: PathBuf,
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
            events_path,
        } => match cmd_run(&bytecode_path, &events_path) {
            Ok(matched) => {
                if matched {
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

/// Parse one `"<event_name> <screen_id>"` line, packing screen into the high
/// 16 bits and name into the low 16 bits (matching `Matcher::accept`'s
/// `event_name`/`event_screen` bit layout).
fn parse_event_line(line: &str) -> Option<u32> {
    let mut fields = line.split_whitespace();
    let name: u32 = fields.next()?.parse().ok()?;
    let screen: u32 = fields.next()?.parse().ok()?;
    Some((screen << 16) | name)
}

fn read_events(events_path: &PathBuf) -> Result<Vec<u32>, String> {
    let text = std::fs::read_to_string(events_path)
        .map_err(|e| format!("error: cannot read {}: {e}", events_path.display()))?;

    let mut events = Vec::new();
    for (index, raw_line) in text.lines().enumerate() {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = parse_event_line(trimmed)
            .ok_or_else(|| format!("error: malformed event on line {}", index + 1))?;
        events.push(event);
    }
    Ok(events)
}

fn cmd_run(bytecode_path: &PathBuf, events_path: &PathBuf) -> Result<bool, String> {
    let bytecode = std::fs::read(bytecode_path)
        .map_err(|e| format!("error: cannot read {}: {e}", bytecode_path.display()))?;
    let events = read_events(events_path)?;

    let mut matcher = Matcher::create(&bytecode);
    for event in events {
        match matcher.accept(event) {
            MatchOutcome::Next => continue,
            MatchOutcome::Ok => {
                println!("MATCHED");
                return Ok(true);
            }
            MatchOutcome::Error => {
                println!("NO MATCH");
                return Ok(false);
            }
        }
    }

    println!("NO MATCH");
    Ok(false)
}
