// filepath: src/builder.rs
//! Surface buffer builder
//!
//! Allocates the off-screen pixel buffer a fill is staged in: a 32bpp,
//! uncompressed, top-down DIB section sized to the target rectangle and
//! compatible with the destination context.

use crate::error::{CompositeError, Result, Stage};
use crate::gdi::{BitmapInfoHeader, Gdi};
use crate::geometry::Rect;
use log::{debug, warn};

/// Owned off-screen bitmap with writable pixel memory
///
/// The bitmap is deleted when the buffer is dropped, or explicitly through
/// [`SurfaceBuffer::delete`] when the caller wants to see the outcome.
pub struct SurfaceBuffer<'g, G: Gdi> {
    gdi: &'g G,
    bitmap: G::Bitmap,
    width: i32,
    height: i32,
    released: bool,
}

impl<'g, G: Gdi> SurfaceBuffer<'g, G> {
    pub fn bitmap(&self) -> G::Bitmap {
        self.bitmap
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of 32-bit cells in the buffer
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` over the pixel cells, row-major and top-down
    pub fn write_pixels<R>(&mut self, f: impl FnOnce(&mut [u32]) -> R) -> Result<R> {
        self.gdi
            .with_dib_bits(self.bitmap, f)
            .ok_or(CompositeError::AllocationFailure {
                width: self.width,
                height: self.height,
                stage: Stage::Acquire,
            })
    }

    /// Read-only copy of the pixel cells
    pub fn to_vec(&self) -> Result<Vec<u32>> {
        self.gdi
            .with_dib_bits(self.bitmap, |cells| cells.to_vec())
            .ok_or(CompositeError::AllocationFailure {
                width: self.width,
                height: self.height,
                stage: Stage::Acquire,
            })
    }

    /// Delete the bitmap now and report whether the platform accepted it
    pub fn delete(mut self) -> Result<()> {
        self.released = true;
        if self.gdi.delete_object(self.bitmap) {
            Ok(())
        } else {
            Err(CompositeError::AllocationFailure {
                width: self.width,
                height: self.height,
                stage: Stage::Release,
            })
        }
    }
}

impl<G: Gdi> Drop for SurfaceBuffer<'_, G> {
    fn drop(&mut self) {
        if !self.released && !self.gdi.delete_object(self.bitmap) {
            warn!("Failed to delete pixel buffer {:?}", self.bitmap);
        }
    }
}

/// Allocate a top-down 32bpp buffer the size of `rect`, compatible with `dc`
pub fn build_surface_buffer<'g, G: Gdi>(
    gdi: &'g G,
    dc: G::Dc,
    rect: &Rect,
) -> Result<SurfaceBuffer<'g, G>> {
    let Some((width, height)) = rect.checked_size().filter(|_| !rect.is_inverted()) else {
        return Err(CompositeError::InvalidRect {
            width: rect.span_x(),
            height: rect.span_y(),
        });
    };

    let header = BitmapInfoHeader::top_down_32bpp(width, height);
    let bitmap = gdi
        .create_dib_section(dc, &header)
        .ok_or(CompositeError::AllocationFailure {
            width,
            height,
            stage: Stage::Acquire,
        })?;
    debug!("Allocated {}x{} pixel buffer {:?}", width, height, bitmap);

    Ok(SurfaceBuffer {
        gdi,
        bitmap,
        width,
        height,
        released: false,
    })
}
