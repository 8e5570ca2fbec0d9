/// Crate-wide result alias.
pub type SpectroResult<T> = Result<T, SpectroError>;

/// Errors surfaced by the analysis, render and capture layers.
#[derive(thiserror::Error, Debug)]
pub enum SpectroError {
    /// Invalid configuration or argument.
    #[error("validation error: {0}")]
    Validation(String),

    /// Audio decode or spectrum analysis failure.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Rasterization or surface failure.
    #[error("render error: {0}")]
    Render(String),

    /// Encoder construction, streaming or delivery failure.
    #[error("capture error: {0}")]
    Capture(String),

    /// The runtime lacks a capability (no ffmpeg, no matching encoder).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Configuration (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpectroError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
