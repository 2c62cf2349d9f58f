use std::process::ExitCode;
use std::time::Duration;

/// Errors that cause streakbot to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("state store error: {0}")]
    Store(String),

    #[error("cycle aborted: {0}")]
    CycleAborted(String),

    #[error("{failed} health check(s) failed")]
    ChecksFailed { failed: usize },
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::Store(_) => ExitCode::from(3),
            ExitError::CycleAborted(_) => ExitCode::from(4),
            ExitError::ChecksFailed { .. } => ExitCode::from(5),
        }
    }
}

/// Failure modes of the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Throttled; the service asks us to wait at least `retry_after`.
    #[error("rate limited, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The requested state already holds (poll closed, message gone).
    #[error("already done: {0}")]
    AlreadyDone(String),

    /// Network failure, timeout or server-side error.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The service refused the request outright.
    #[error("rejected ({code}): {description}")]
    Rejected { code: u16, description: String },

    /// The service answered with something we could not decode.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl RemoteError {
    pub const fn is_already_done(&self) -> bool {
        matches!(self, RemoteError::AlreadyDone(_))
    }

    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            RemoteError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
