// filepath: src/compositor.rs
//! Rectangle compositor
//!
//! Fills an off-screen buffer with one color and blends it onto a
//! destination context. Each call walks Created -> Filled -> Blended ->
//! Released; every handle it creates is owned by a guard, so a failure at
//! any step still releases what came before it, newest first.

use crate::builder::{build_surface_buffer, SurfaceBuffer};
use crate::color::{Color, Operator};
use crate::error::{CompositeError, Result};
use crate::gdi::{BlendFunction, Gdi, MemoryDc, RasterOp};
use crate::geometry::Rect;
use log::{debug, warn};

/// Write `color` into every cell of `buffer`
pub fn fill<G: Gdi>(buffer: &mut SurfaceBuffer<'_, G>, color: Color) -> Result<()> {
    buffer.write_pixels(|cells| cells.fill(color.0))
}

/// Composite the first `src_width` x `src_height` pixels of `buffer` onto
/// `dst_rect` of `dc`.
///
/// Blits are never scaled: the source size has to match the destination
/// rectangle, otherwise [`CompositeError::SizeMismatch`] is returned before
/// anything is created.
pub fn blend<'g, G: Gdi>(
    gdi: &'g G,
    dc: G::Dc,
    buffer: &SurfaceBuffer<'g, G>,
    dst_rect: &Rect,
    src_width: i32,
    src_height: i32,
    operator: Operator,
) -> Result<()> {
    if dst_rect.checked_size() != Some((src_width, src_height)) {
        return Err(CompositeError::SizeMismatch {
            src_width,
            src_height,
            dst_width: dst_rect.width(),
            dst_height: dst_rect.height(),
        });
    }

    let memory_dc = MemoryDc::compatible_with(gdi, dc)?;
    let selection = memory_dc.select(buffer)?;

    let blitted = match operator {
        Operator::Over => gdi.alpha_blend(
            dc,
            *dst_rect,
            selection.source(),
            Rect::from_size(src_width, src_height),
            BlendFunction::per_pixel_premultiplied(),
        ),
        Operator::Src => gdi.bit_blt(
            dc,
            *dst_rect,
            selection.source(),
            0,
            0,
            RasterOp::SrcCopy,
        ),
    };
    if !blitted {
        return Err(CompositeError::BlendFailure { operator });
    }

    // The bitmap has to leave the context before either is destroyed
    selection.restore()?;
    memory_dc.delete()
}

/// Fill `rect` on `dc` with `color` using `operator`
///
/// Zero-area rectangles are a no-op and touch no native resources.
pub fn fill_rect<G: Gdi>(
    gdi: &G,
    dc: G::Dc,
    rect: &Rect,
    color: Color,
    operator: Operator,
) -> Result<()> {
    let invalid = CompositeError::InvalidRect {
        width: rect.span_x(),
        height: rect.span_y(),
    };
    if rect.is_inverted() {
        return Err(invalid);
    }
    if rect.is_empty() {
        debug!("fill_rect: {:?} is empty, nothing to do", rect);
        return Ok(());
    }
    debug!(
        "fill_rect: {:?} on {:?} with {:?} ({})",
        rect, dc, color, operator
    );

    let (width, height) = rect.checked_size().ok_or(invalid)?;

    let mut buffer = build_surface_buffer(gdi, dc, rect)?;
    fill(&mut buffer, color)?;
    blend(gdi, dc, &buffer, rect, width, height, operator)?;
    buffer.delete()
}

/// Compositor bound to one native graphics layer
pub struct Compositor<'g, G: Gdi> {
    gdi: &'g G,
}

impl<'g, G: Gdi> Compositor<'g, G> {
    pub fn new(gdi: &'g G) -> Self {
        Self { gdi }
    }

    pub fn gdi(&self) -> &'g G {
        self.gdi
    }

    /// See [`fill_rect`]. Failures are logged before being returned.
    pub fn fill_rect(&self, dc: G::Dc, rect: &Rect, color: Color, operator: Operator) -> Result<()> {
        fill_rect(self.gdi, dc, rect, color, operator).inspect_err(|e| {
            warn!("fill_rect {:?} ({}) failed: {}", rect, operator, e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use crate::gdi::software::{Primitive, SoftwareGdi};

    #[test]
    fn fill_writes_every_cell() {
        let gdi = SoftwareGdi::new();
        let dc = gdi.create_surface(8, 8, Color::BLACK).unwrap();
        for (w, h) in [(1, 1), (3, 5), (8, 2)] {
            let mut buf = build_surface_buffer(&gdi, dc, &Rect::from_size(w, h)).unwrap();
            fill(&mut buf, Color(0x8040_2010)).unwrap();
            let cells = buf.to_vec().unwrap();
            assert_eq!(cells.len(), (w * h) as usize);
            assert!(cells.iter().all(|&c| c == 0x8040_2010));
        }
        assert!(gdi.stats().is_balanced());
    }

    #[test]
    fn mismatched_sizes_are_rejected_up_front() {
        let gdi = SoftwareGdi::new();
        let dc = gdi.create_surface(8, 8, Color::BLACK).unwrap();
        let buf = build_surface_buffer(&gdi, dc, &Rect::from_size(2, 2)).unwrap();
        let err = blend(&gdi, dc, &buf, &Rect::new(0, 0, 4, 4), 2, 2, Operator::Over)
            .err()
            .unwrap();
        assert_eq!(
            err,
            CompositeError::SizeMismatch {
                src_width: 2,
                src_height: 2,
                dst_width: 4,
                dst_height: 4
            }
        );
        assert_eq!(gdi.stats().dcs_created, 0);
        assert_eq!(gdi.pixel(dc, 3, 3), Some(Color::BLACK));
    }

    #[test]
    fn each_failing_step_maps_to_its_error() {
        let cases = [
            (
                Primitive::CreateDibSection,
                0,
                CompositeError::AllocationFailure {
                    width: 2,
                    height: 2,
                    stage: Stage::Acquire,
                },
            ),
            (
                Primitive::CreateCompatibleDc,
                0,
                CompositeError::ContextFailure {
                    stage: Stage::Acquire,
                },
            ),
            (
                Primitive::SelectObject,
                0,
                CompositeError::BindingFailure {
                    stage: Stage::Acquire,
                },
            ),
            (
                Primitive::AlphaBlend,
                0,
                CompositeError::BlendFailure {
                    operator: Operator::Over,
                },
            ),
            (
                Primitive::SelectObject,
                1,
                CompositeError::BindingFailure {
                    stage: Stage::Release,
                },
            ),
            (
                Primitive::DeleteDc,
                0,
                CompositeError::ContextFailure {
                    stage: Stage::Release,
                },
            ),
        ];
        for (primitive, successes, expected) in cases {
            let gdi = SoftwareGdi::new();
            let dc = gdi.create_surface(4, 4, Color::BLACK).unwrap();
            gdi.fail_after(primitive, successes);
            let err = fill_rect(&gdi, dc, &Rect::new(1, 1, 3, 3), Color::WHITE, Operator::Over)
                .err()
                .unwrap();
            assert_eq!(err, expected, "failing {:?}", primitive);
        }
    }

    #[test]
    fn compositor_facade_forwards() {
        let gdi = SoftwareGdi::new();
        let dc = gdi.create_surface(4, 4, Color::BLACK).unwrap();
        let compositor = Compositor::new(&gdi);
        compositor
            .fill_rect(dc, &Rect::new(0, 0, 2, 2), Color::WHITE, Operator::Src)
            .unwrap();
        assert_eq!(gdi.pixel(dc, 1, 1), Some(Color::WHITE));
        assert_eq!(gdi.pixel(dc, 2, 2), Some(Color::BLACK));
        assert!(compositor.gdi().stats().is_balanced());
    }
}
