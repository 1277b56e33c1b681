/// Result alias used across the crate.
pub type BackdropResult<T> = Result<T, BackdropError>;

/// Errors produced by the compositing and export pipeline.
#[derive(thiserror::Error, Debug)]
pub enum BackdropError {
    /// Bad input rejected before any media work starts (file type, size, option ranges).
    #[error("validation error: {0}")]
    Validation(String),

    /// Video metadata or a background image could not be loaded (including timeouts).
    #[error("media load error: {0}")]
    MediaLoad(String),

    /// Surface or encoder construction failed, or the encoder rejected a frame.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Any other failure while frames are being processed.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// The export was cancelled through its [`crate::CancelToken`].
    #[error("export cancelled")]
    Cancelled,

    /// Configuration or metadata could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Context-carrying failure (typically IO).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Copyable discriminant of [`BackdropError`], carried by terminal export states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`BackdropError::Validation`].
    Validation,
    /// See [`BackdropError::MediaLoad`].
    MediaLoad,
    /// See [`BackdropError::Encoding`].
    Encoding,
    /// See [`BackdropError::Pipeline`].
    Pipeline,
    /// See [`BackdropError::Cancelled`].
    Cancelled,
    /// See [`BackdropError::Serde`].
    Serde,
    /// See [`BackdropError::Other`].
    Other,
}

impl BackdropError {
    /// Build a [`BackdropError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BackdropError::MediaLoad`].
    pub fn media_load(msg: impl Into<String>) -> Self {
        Self::MediaLoad(msg.into())
    }

    /// Build a [`BackdropError::Encoding`].
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`BackdropError::Pipeline`].
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Build a [`BackdropError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::MediaLoad(_) => ErrorKind::MediaLoad,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Pipeline(_) => ErrorKind::Pipeline,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Serde(_) => ErrorKind::Serde,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<serde_json::Error> for BackdropError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
