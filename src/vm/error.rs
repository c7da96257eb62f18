//! Error types for the arithmetic VM: manual `Display` + `std::error::Error`
//! impls rather than a derive macro, matching the rest of this crate's error
//! enums.

/// The outcome of one `interpret` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    Success,
    DivisionByZero,
    UnknownOpcode,
    EndOfStream,
}

impl std::fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            RuntimeStatus::Success => "success",
            RuntimeStatus::DivisionByZero => "division by zero",
            RuntimeStatus::UnknownOpcode => "unknown opcode",
            RuntimeStatus::EndOfStream => "end of stream",
        };
        f.write_str(message)
    }
}

impl std::error::Error for RuntimeStatus {}

impl RuntimeStatus {
    pub fn is_success(self) -> bool {
        matches!(self, RuntimeStatus::Success)
    }
}

/// Failures raised while assembling text source into bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    UnknownMnemonic { line: usize, mnemonic: String },
    MissingOperand { line: usize },
    InvalidLiteral { line: usize, text: String },
    UnresolvedLabel { name: String },
    DuplicateLabel { name: String },
    InvalidLabelName { line: usize, text: String },
}

impl std::fmt::Display for AssembleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssembleError::UnknownMnemonic { line, mnemonic } => {
                write!(f, "line {line}: unknown instruction '{mnemonic}'")
            }
            AssembleError::MissingOperand { line } => {
                write!(f, "line {line}: missing operand")
            }
            AssembleError::InvalidLiteral { line, text } => {
                write!(f, "line {line}: invalid numeric literal '{text}'")
            }
            AssembleError::UnresolvedLabel { name } => {
                write!(f, "Cannot resolve a label: {name}")
            }
            AssembleError::DuplicateLabel { name } => {
                write!(f, "duplicate label '{name}'")
            }
            AssembleError::InvalidLabelName { line, text } => {
                write!(f, "line {line}: invalid label name '{text}'")
            }
        }
    }
}

impl std::error::Error for AssembleError {}
