// filepath: src/gdi/mod.rs
//! Native graphics layer
//!
//! The compositor only talks to the platform through the [`Gdi`] trait.
//! Guard types own the handles it creates, and [`software::SoftwareGdi`] is
//! an in-memory implementation of the trait.

pub mod guard;
pub mod interface;
pub mod software;

pub use guard::{MemoryDc, Selection};
pub use interface::{
    AlphaFormat, BitmapInfoHeader, BlendFunction, BlendOp, Compression, Gdi, RasterOp,
};
