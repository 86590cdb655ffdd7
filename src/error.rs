use thiserror::Error;

/// Structured failures, one variant per kind in spec §7. The CLI
/// Orchestrator is the only place that matches on this type; every other
/// component propagates it with `?` (spec Design Note "Exception-style
/// control flow for user errors").
#[derive(Error, Debug)]
pub enum Error {
    #[error("{line_no}: {text}\n{msg}")]
    Syntax {
        line_no: usize,
        text: String,
        msg: String,
    },

    #[error("no data at: {}", .0.join(", "))]
    MissingInput(Vec<String>),

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("step has no commands to run")]
    EmptyCommands,

    #[error("optional inputs are not supported: {0}")]
    UnsupportedOptionalInput(String),

    #[error("no step matches target: {0}")]
    InvalidTarget(String),

    #[error("invalid argument '{arg}': {hint}")]
    InvalidArgument { arg: String, hint: String },

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("step {step} failed: {detail}")]
    ProtocolFailure {
        step: String,
        detail: String,
        exit: Option<i32>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Exit code table from spec §7.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument { .. } => -1,
            Error::ProtocolFailure { exit: Some(n), .. } => *n,
            _ => 1,
        }
    }
}
