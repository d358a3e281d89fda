use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Rejected combination of builder options.
    #[error("invalid access logger configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    /// Failure reported by the sink while dispatching an event.
    #[error("log sink failed: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn sink<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Sink(err.into())
    }
}
