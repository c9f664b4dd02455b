use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TracingError {
    /// An error that occurs during tracing initialization.
    #[error(transparent)]
    Init(#[from] TracingInitError),

    #[error(transparent)]
    Other(#[from] Box<dyn Send + Sync + std::error::Error>),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TracingInitError {
    #[error(transparent)]
    ParseLevel(#[from] tracing::metadata::ParseLevelError),

    #[error(transparent)]
    ParseFilter(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    FilterFromEnv(#[from] tracing_subscriber::filter::FromEnvError),

    #[error(transparent)]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

impl From<tracing::metadata::ParseLevelError> for crate::error::Error {
    fn from(value: tracing::metadata::ParseLevelError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}

impl From<tracing_subscriber::filter::ParseError> for crate::error::Error {
    fn from(value: tracing_subscriber::filter::ParseError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}

impl From<tracing_subscriber::filter::FromEnvError> for crate::error::Error {
    fn from(value: tracing_subscriber::filter::FromEnvError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}

impl From<tracing_subscriber::util::TryInitError> for crate::error::Error {
    fn from(value: tracing_subscriber::util::TryInitError) -> Self {
        Self::Tracing(TracingError::from(TracingInitError::from(value)))
    }
}
