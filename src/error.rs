//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;

/// Errors produced by the cosmoview crate.
#[derive(Debug)]
pub enum CosmoError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// A view's external asset could not be loaded or decoded.
    AssetLoad(String),
    /// The runtime was constructed without any views.
    NoViews,
    /// Viewer event-loop failure.
    Viewer(String),
}

impl fmt::Display for CosmoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::AssetLoad(msg) => write!(f, "asset load error: {msg}"),
            Self::NoViews => write!(f, "view runtime needs at least one view"),
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
        }
    }
}

impl std::error::Error for CosmoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for CosmoError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<std::io::Error> for CosmoError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
