//! Error types for slauncher-icons
//!
//! Both enums are `Clone` because one render outcome is handed to every
//! caller joined to the same load.

/// Failure while turning an icon source into a bitmap.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid pixel buffer: {width}x{height} with {len} bytes")]
    InvalidPixels { width: u32, height: u32, len: usize },

    #[error("Icon has no pixels")]
    Empty,

    #[error("Target size must be non-zero")]
    ZeroSize,

    #[error("Render task failed: {0}")]
    Task(String),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => RenderError::Io(e.to_string()),
            other => RenderError::Decode(other.to_string()),
        }
    }
}

/// Icon cache errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IconError {
    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Icon load cancelled")]
    Cancelled,

    #[error("Icon cache destroyed")]
    Destroyed,

    #[error("Failed to start icon loader runtime: {0}")]
    Runtime(String),
}
