/// Convenience result type used across the crate.
pub type VertexResult<T> = Result<T, VertexError>;

/// Top-level error taxonomy used by library APIs.
///
/// Every variant is fatal for a run: nothing in the scheduling or rendering path retries, since
/// skipping a frame would leave a hole in the numbered frame sequence.
#[derive(thiserror::Error, Debug)]
pub enum VertexError {
    /// Malformed puzzle documents and data corruption (dangling vertex ids, bad palette entries,
    /// out-of-range color indices).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while rasterizing or writing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// The external encoder could not be started or exited unsuccessfully.
    #[error("encode error: {detail}")]
    Encode {
        /// Encoder exit code, when the process ran to completion.
        status: Option<i32>,
        /// Human-readable failure detail.
        detail: String,
    },

    /// Errors when serializing or deserializing documents.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VertexError {
    /// Build a [`VertexError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VertexError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`VertexError::Encode`] value.
    pub fn encode(status: Option<i32>, detail: impl Into<String>) -> Self {
        Self::Encode {
            status,
            detail: detail.into(),
        }
    }

    /// Build a [`VertexError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Exit code of a failed encoder run, if this error carries one.
    pub fn encoder_status(&self) -> Option<i32> {
        match self {
            Self::Encode { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VertexError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
