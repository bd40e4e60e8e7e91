use thiserror::Error;

/// Failure kinds surfaced by providers and CLI commands.
#[derive(Error, Debug)]
pub enum SproutError {
    #[error("{0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Ticket or workspace provider failure. Possibly transient.
    #[error("{0}")]
    External(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SproutError>;

impl SproutError {
    /// Process exit code for this failure kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            SproutError::Validation(_) => 2,
            SproutError::NotFound(_) => 3,
            SproutError::Configuration(_) => 4,
            SproutError::External(_) | SproutError::Io(_) | SproutError::Json(_) => 5,
            SproutError::Conflict(_) | SproutError::Internal(_) => 1,
        }
    }
}

/// Exit code for an error coming out of the outer `anyhow` layer.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<SproutError>()
        .map(SproutError::exit_code)
        .unwrap_or(1)
}
