// filepath: src/gdi/interface.rs
//! Native graphics layer interface
//!
//! This file defines the trait a platform backend implements and the plain
//! data it exchanges with the compositor: bitmap headers, blend functions
//! and raster operations. Every fallible primitive reports failure the way
//! the platform does (a null handle or a false return); turning that into a
//! typed error is the caller's job.

use crate::geometry::Rect;
use std::fmt::Debug;

/// Pixel storage format requested for a DIB section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Uncompressed pixels (`BI_RGB`)
    Rgb,
    /// Channel masks supplied separately (`BI_BITFIELDS`), not supported here
    BitFields,
}

/// Header describing a device-independent bitmap
///
/// A negative `height` requests top-down row order. A positive one gives the
/// platform default, bottom-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: Compression,
    /// Byte size of the pixel memory, 0 lets the platform compute it
    pub size_image: u32,
}

impl BitmapInfoHeader {
    /// Header for a 32bpp uncompressed bitmap stored top-down
    pub fn top_down_32bpp(width: i32, height: i32) -> Self {
        Self {
            width,
            height: -height,
            planes: 1,
            bit_count: 32,
            compression: Compression::Rgb,
            size_image: (width.max(0) as u32)
                .saturating_mul(height.max(0) as u32)
                .saturating_mul(4),
        }
    }

    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    /// Number of rows regardless of orientation
    pub fn rows(&self) -> i32 {
        self.height.saturating_abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BlendOp {
    SrcOver = 0x00,
}

/// How `alpha_blend` interprets the source alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlphaFormat {
    /// Per-pixel alpha, color channels premultiplied (`AC_SRC_ALPHA`)
    PremultipliedSource = 0x01,
}

/// Parameters for `alpha_blend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFunction {
    pub blend_op: BlendOp,
    pub blend_flags: u8,
    pub source_constant_alpha: u8,
    pub alpha_format: AlphaFormat,
}

impl BlendFunction {
    /// Source-over with per-pixel premultiplied alpha and full constant opacity
    pub const fn per_pixel_premultiplied() -> Self {
        Self {
            blend_op: BlendOp::SrcOver,
            blend_flags: 0,
            source_constant_alpha: 255,
            alpha_format: AlphaFormat::PremultipliedSource,
        }
    }
}

/// Raster operation for `bit_blt`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterOp {
    /// Copy source pixels verbatim
    SrcCopy,
}

impl RasterOp {
    pub const fn code(self) -> u32 {
        match self {
            RasterOp::SrcCopy => 0x00CC_0020,
        }
    }
}

/// Platform primitives the compositor is built on
///
/// Handles are plain copyable values; ownership is tracked by the guard types
/// in [`crate::gdi::guard`] and [`crate::builder`], never by the handles.
pub trait Gdi {
    /// Drawing context handle
    type Dc: Copy + Debug + PartialEq;
    /// Bitmap (drawable object) handle
    type Bitmap: Copy + Debug + PartialEq;

    /// Create a DIB section compatible with `dc`, or `None` on failure
    fn create_dib_section(&self, dc: Self::Dc, header: &BitmapInfoHeader) -> Option<Self::Bitmap>;

    /// Run `f` over the bitmap's pixel memory, `None` if the handle is invalid.
    ///
    /// Cells are laid out in the row order the bitmap was created with.
    /// Implementations must not hold internal locks while `f` runs: `f` may
    /// call back into the same `Gdi`. While `f` runs the bitmap's pixels are
    /// on loan, so blits that read or write that bitmap, deleting it, and
    /// nested `with_dib_bits` calls on it fail.
    fn with_dib_bits<R>(&self, bitmap: Self::Bitmap, f: impl FnOnce(&mut [u32]) -> R) -> Option<R>;

    /// Destroy a bitmap. Fails while the bitmap is selected into a context.
    fn delete_object(&self, bitmap: Self::Bitmap) -> bool;

    /// Create a memory context compatible with `dc`, or `None` on failure
    fn create_compatible_dc(&self, dc: Self::Dc) -> Option<Self::Dc>;

    fn delete_dc(&self, dc: Self::Dc) -> bool;

    /// Select `bitmap` into `dc`, returning the previously selected bitmap
    fn select_object(&self, dc: Self::Dc, bitmap: Self::Bitmap) -> Option<Self::Bitmap>;

    /// Composite `src_rect` of `src` onto `dst_rect` of `dst`
    fn alpha_blend(
        &self,
        dst: Self::Dc,
        dst_rect: Rect,
        src: Self::Dc,
        src_rect: Rect,
        func: BlendFunction,
    ) -> bool;

    /// Copy a `dst_rect`-sized block from `src` at (`src_x`, `src_y`) to `dst`
    fn bit_blt(
        &self,
        dst: Self::Dc,
        dst_rect: Rect,
        src: Self::Dc,
        src_x: i32,
        src_y: i32,
        rop: RasterOp,
    ) -> bool;
}
