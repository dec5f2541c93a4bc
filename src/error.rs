//! Error types shared by the renderer hosts.

use thiserror::Error;

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, GridError>;

#[derive(Error, Debug)]
pub enum GridError {
    /// No drawing surface could be created for the requested size
    #[error("drawing surface unavailable: {0}")]
    SurfaceUnavailable(String),

    /// Window or display creation failed
    #[error("window error: {0}")]
    Window(String),

    /// GL context, GL surface or Skia GL interface creation failed
    #[error("GL context error: {0}")]
    GlContext(String),

    /// Pixel readback or image encoding failed
    #[error("encode error: {0}")]
    Encode(String),

    /// Configuration could not be parsed
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
