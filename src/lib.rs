pub mod builder;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod gdi;
pub mod geometry;

// Re-export for the windowing layer
pub use crate::color::{Color, Operator};
pub use crate::compositor::{fill_rect, Compositor};
pub use crate::error::{CompositeError, Result};
pub use crate::gdi::software::SoftwareGdi;
pub use crate::gdi::Gdi;
pub use crate::geometry::Rect;
