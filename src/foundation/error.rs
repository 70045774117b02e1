use std::path::PathBuf;

/// Convenience result type used across stackreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided configuration. Raised before any rendering starts.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A requested channel plane is absent for a frame.
    #[error("frame {frame} unavailable for channel {channel}")]
    FrameUnavailable {
        /// Channel id that had no data.
        channel: u32,
        /// Frame index that was requested.
        frame: u64,
    },

    /// Channel arrays, rasters or surfaces disagree on shape.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Output target exists and overwriting was not requested.
    #[error("output '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Errors while painting a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while assembling or encoding the video container.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`ReelError::FrameUnavailable`] value.
    pub fn frame_unavailable(channel: u32, frame: u64) -> Self {
        Self::FrameUnavailable { channel, frame }
    }

    /// Build a [`ReelError::DimensionMismatch`] value.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Build a [`ReelError::AlreadyExists`] value.
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists(path.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors that abort a whole run rather than a single frame.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::AlreadyExists(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
