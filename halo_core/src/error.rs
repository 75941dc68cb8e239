/// Core error type for halo
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache backend failures. Absorbed inside the cache adapter and
    /// reported through its event sink; callers only ever observe a miss.
    #[error("Cache error: {0}")]
    Cache(String),

    /// No store client became available within the acquire timeout.
    /// Retryable by the caller.
    #[error("Connection pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Update payload carried an `id` that conflicts with the
    /// authenticated subject. Never retried.
    #[error("Identity mismatch: {0}")]
    IdentityMismatch(String),

    /// Identity provider error, passed through verbatim for the route
    /// layer to translate.
    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Whether the caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::PoolExhausted(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
