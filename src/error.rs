// filepath: src/error.rs
//! Error type for compositing calls
//!
//! Every variant names the step that failed. A failed call has already
//! released whatever it created before the error reaches the caller.

use crate::color::Operator;

/// Which half of a resource's lifetime a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Release,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Acquire => f.write_str("create"),
            Stage::Release => f.write_str("release"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    /// The pixel buffer or its bitmap object could not be created (or deleted)
    #[error("failed to {stage} {width}x{height} pixel buffer")]
    AllocationFailure {
        width: i32,
        height: i32,
        stage: Stage,
    },

    /// The intermediate drawing context could not be created (or deleted)
    #[error("failed to {stage} compatible drawing context")]
    ContextFailure { stage: Stage },

    /// The buffer could not be selected into (or restored out of) the context
    #[error("failed to {stage} bitmap selection on drawing context")]
    BindingFailure { stage: Stage },

    /// AlphaBlend or BitBlt reported failure
    #[error("{operator} blit onto destination failed")]
    BlendFailure { operator: Operator },

    /// A rectangle with a negative extent, or one too wide to address
    #[error("rectangle extent {width}x{height} is negative or out of range")]
    InvalidRect { width: i64, height: i64 },

    /// Source and destination sizes differ; blits are never rescaled
    #[error(
        "source {src_width}x{src_height} does not match destination {dst_width}x{dst_height}"
    )]
    SizeMismatch {
        src_width: i32,
        src_height: i32,
        dst_width: i32,
        dst_height: i32,
    },
}

pub type Result<T, E = CompositeError> = std::result::Result<T, E>;
