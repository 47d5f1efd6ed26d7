// filepath: src/gdi/guard.rs
//! Scoped ownership of intermediate drawing contexts and bitmap selections
//!
//! Dropping a guard releases what it holds, so early returns never leak.
//! The explicit `delete`/`restore` methods do the same release but hand the
//! platform's verdict back to the caller.

use crate::builder::SurfaceBuffer;
use crate::error::{CompositeError, Result, Stage};
use crate::gdi::Gdi;
use log::warn;

/// Memory drawing context created compatible with a destination context
pub struct MemoryDc<'g, G: Gdi> {
    gdi: &'g G,
    dc: G::Dc,
    released: bool,
}

impl<'g, G: Gdi> MemoryDc<'g, G> {
    pub fn compatible_with(gdi: &'g G, dc: G::Dc) -> Result<Self> {
        let dc = gdi
            .create_compatible_dc(dc)
            .ok_or(CompositeError::ContextFailure {
                stage: Stage::Acquire,
            })?;
        Ok(Self {
            gdi,
            dc,
            released: false,
        })
    }

    /// Make `buffer` the context's drawable, remembering what it replaced.
    ///
    /// The returned guard borrows `buffer`, so the bitmap cannot be deleted
    /// until the previous selection is back in place.
    pub fn select<'a>(
        &'a self,
        buffer: &'a SurfaceBuffer<'g, G>,
    ) -> Result<Selection<'a, 'g, G>> {
        let previous = self
            .gdi
            .select_object(self.dc, buffer.bitmap())
            .ok_or(CompositeError::BindingFailure {
                stage: Stage::Acquire,
            })?;
        Ok(Selection {
            dc: self,
            _buffer: buffer,
            previous,
            restored: false,
        })
    }

    pub fn delete(mut self) -> Result<()> {
        self.released = true;
        if self.gdi.delete_dc(self.dc) {
            Ok(())
        } else {
            Err(CompositeError::ContextFailure {
                stage: Stage::Release,
            })
        }
    }
}

impl<G: Gdi> Drop for MemoryDc<'_, G> {
    fn drop(&mut self) {
        if !self.released && !self.gdi.delete_dc(self.dc) {
            warn!("Failed to delete compatible context {:?}", self.dc);
        }
    }
}

/// A buffer selected into a [`MemoryDc`]
pub struct Selection<'a, 'g, G: Gdi> {
    dc: &'a MemoryDc<'g, G>,
    _buffer: &'a SurfaceBuffer<'g, G>,
    previous: G::Bitmap,
    restored: bool,
}

impl<G: Gdi> Selection<'_, '_, G> {
    /// Context the buffer is selected into, usable as a blit source
    pub fn source(&self) -> G::Dc {
        self.dc.dc
    }

    /// Put the previously selected object back
    pub fn restore(mut self) -> Result<()> {
        self.restored = true;
        self.dc
            .gdi
            .select_object(self.dc.dc, self.previous)
            .map(|_| ())
            .ok_or(CompositeError::BindingFailure {
                stage: Stage::Release,
            })
    }
}

impl<G: Gdi> Drop for Selection<'_, '_, G> {
    fn drop(&mut self) {
        if !self.restored && self.dc.gdi.select_object(self.dc.dc, self.previous).is_none() {
            warn!(
                "Failed to restore previous selection {:?} on {:?}",
                self.previous, self.dc.dc
            );
        }
    }
}
