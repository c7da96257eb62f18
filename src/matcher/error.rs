//! Error and outcome types for the event matcher, using the same
//! hand-rolled `Display`/`std::error::Error` idiom as `vm::error`.

/// The result of feeding one event to `Matcher::accept`: `NEXT` asks for
/// another event, `Ok` is a full match, `Error` is a decode fault (an
/// `ABORT` byte or unknown opcode reached by a live thread).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Next,
    Ok,
    Error,
}

/// Failures raised while assembling matcher bytecode text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchAssembleError {
    UnknownMnemonic { line: usize, mnemonic: String },
    MissingOperand { line: usize },
    InvalidLiteral { line: usize, text: String },
    UnresolvedLabel { name: String },
    DuplicateLabel { name: String },
    InvalidLabelName { line: usize, text: String },
}

impl std::fmt::Display for MatchAssembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchAssembleError::UnknownMnemonic { line, mnemonic } => {
                write!(f, "line {line}: unknown instruction '{mnemonic}'")
            }
            MatchAssembleError::MissingOperand { line } => {
                write!(f, "line {line}: missing operand")
            }
            MatchAssembleError::InvalidLiteral { line, text } => {
                write!(f, "line {line}: invalid numeric literal '{text}'")
            }
            MatchAssembleError::UnresolvedLabel { name } => {
                write!(f, "Cannot resolve a label: {name}")
            }
            MatchAssembleError::DuplicateLabel { name } => {
                write!(f, "duplicate label '{name}'")
            }
            MatchAssembleError::InvalidLabelName { line, text } => {
                write!(f, "line {line}: invalid label name '{text}'")
            }
        }
    }
}

impl std::error::Error for MatchAssembleError {}
