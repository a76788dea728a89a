use thiserror::Error;

pub type Result<T> = std::result::Result<T, InspectError>;

#[derive(Debug, Error)]
pub enum InspectError {
    /// Raw-mode setup failed, usually because stdin is not a terminal.
    #[error("terminal setup failed: {0}")]
    Terminal(#[source] std::io::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl InspectError {
    /// Process exit code for this error. Setup failures get their own code
    /// so scripts can tell "not a tty" from runtime I/O trouble.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            InspectError::Terminal(_) => 2,
            InspectError::Io(_) | InspectError::Serialize(_) => 1,
        }
    }
}
