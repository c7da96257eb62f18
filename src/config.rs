//! Runtime configuration types: a `clap`-selectable enum plus a small config
//! struct carrying it. The only axis this crate varies at runtime is which
//! interpreter back-end runs a given bytecode blob.

use clap::ValueEnum;

/// Which interpreter back-end executes a bytecode blob.
///
/// All three are observationally equivalent: this selects an implementation
/// strategy, not a semantics.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum Backend {
    /// Plain fetch-decode-dispatch `match` loop.
    #[default]
    Switch,
    /// Dispatch via an opcode-indexed handler table.
    Threaded,
    /// Lazy per-entry trace compilation into a superop chain.
    Trace,
}

/// Runtime configuration for the arithmetic VM.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub backend: Backend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_backend_is_switch() {
        assert_eq!(RuntimeConfig::default().backend, Backend::Switch);
    }
}
