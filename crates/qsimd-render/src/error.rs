//! Error types for rendering.

use thiserror::Error;

/// Errors that can occur while producing an image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RenderError {
    /// The image would exceed the configured pixel bounds.
    #[error("image of {width}x{height} pixels exceeds the {max_width}x{max_height} limit")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),

    /// Nothing to draw.
    #[error("nothing to render: {0}")]
    Empty(String),
}

/// Result type for rendering.
pub type RenderResult<T> = Result<T, RenderError>;
