use std::any::Any;

use thiserror::Error;

/// Convenient alias for results returned by the analysis modules.
pub type Result<T> = std::result::Result<T, ProsodyError>;

/// Failure kinds raised while turning a recording into a feature record.
#[derive(Debug, Error)]
pub enum ProsodyError {
    /// A curve is empty, has mismatched lengths or non-increasing times.
    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    /// The signal duration is zero, negative or not finite.
    #[error("invalid duration: {0} s")]
    InvalidDuration(f64),

    /// The acoustic analysis backend could not load or analyse a signal.
    #[error("acoustic provider failure: {0}")]
    ExternalProviderFailure(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProsodyError {
    pub fn invalid_curve(message: impl Into<String>) -> Self {
        Self::InvalidCurve(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::ExternalProviderFailure(message.into())
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
