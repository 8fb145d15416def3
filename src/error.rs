use thiserror::Error;

/// Failures while replaying an access trace. The core itself never fails.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("could not read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: unknown op '{op}'")]
    UnknownOp { line: usize, op: String },

    #[error("line {line}: missing field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: bad value '{value}' for '{field}'")]
    BadValue { line: usize, field: &'static str, value: String },

    #[error("line {line}: trailing input '{rest}'")]
    TrailingInput { line: usize, rest: String },

    #[error("line {line}: cache line {index} out of range, store has {lines}")]
    LineOutOfRange { line: usize, index: usize, lines: usize },
}
