//! Error types for the layout engine.
//!
//! Stepping and layout functions are total over structurally valid input;
//! the only rejected configuration is a degenerate canvas.

use thiserror::Error;

/// Errors surfaced by the layout engine
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("canvas dimensions must be positive and finite, got {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },
}

/// Result type for engine configuration
pub type GraphResult<T> = Result<T, GraphError>;
