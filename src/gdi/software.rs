// filepath: src/gdi/software.rs
//! In-memory implementation of the native graphics layer
//!
//! `SoftwareGdi` keeps every surface, memory context and bitmap in a table
//! behind one mutex. It follows the platform rules the compositor relies on:
//! a memory context starts with a 1x1 stock bitmap selected, a bitmap can be
//! selected into one context at a time, a selected bitmap cannot be deleted,
//! and bitmaps created with a positive height store rows bottom-up.
//!
//! `with_dib_bits` takes a bitmap's pixels out of the table and runs the
//! callback unlocked, so the callback may use the backend again.
//!
//! It also counts handle creation and destruction, and can be told to fail a
//! given primitive, which is what the leak tests are built on.

use super::interface::{BitmapInfoHeader, BlendFunction, Compression, Gdi, RasterOp};
use crate::color::{mul_div_255, Color};
use crate::geometry::Rect;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DcId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BitmapId(u32);

/// Primitives that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    CreateDibSection,
    DeleteObject,
    CreateCompatibleDc,
    DeleteDc,
    SelectObject,
    AlphaBlend,
    BitBlt,
}

/// Creation and destruction counts for compositor-owned handles
///
/// Surfaces and the stock bitmaps that come with memory contexts are not
/// counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleStats {
    pub bitmaps_created: usize,
    pub bitmaps_deleted: usize,
    pub dcs_created: usize,
    pub dcs_deleted: usize,
}

impl HandleStats {
    pub fn is_balanced(&self) -> bool {
        self.bitmaps_created == self.bitmaps_deleted && self.dcs_created == self.dcs_deleted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DcKind {
    /// Stands in for a window's context; owns its backing bitmap
    Surface,
    /// Created by `create_compatible_dc`; owns a stock bitmap
    Memory { stock: BitmapId },
}

#[derive(Debug)]
struct DcEntry {
    kind: DcKind,
    selected: BitmapId,
}

#[derive(Debug)]
struct BitmapEntry {
    width: i32,
    height: i32,
    top_down: bool,
    pixels: Vec<u32>,
    /// Pixels are lent to a `with_dib_bits` callback and absent from the table
    checked_out: bool,
    selected_into: Option<DcId>,
    /// Stock and surface bitmaps cannot be deleted through `delete_object`
    owned_by_dc: bool,
}

impl BitmapEntry {
    /// `None` when the cell count overflows or the memory cannot be reserved
    fn try_new(
        width: i32,
        height: i32,
        top_down: bool,
        fill: u32,
        owned_by_dc: bool,
    ) -> Option<Self> {
        let len = usize::try_from(width)
            .ok()?
            .checked_mul(usize::try_from(height).ok()?)?;
        let mut pixels = Vec::new();
        if let Err(e) = pixels.try_reserve_exact(len) {
            debug!("Cannot allocate {}x{} bitmap: {}", width, height, e);
            return None;
        }
        pixels.resize(len, fill);
        Some(Self {
            width,
            height,
            top_down,
            pixels,
            checked_out: false,
            selected_into: None,
            owned_by_dc,
        })
    }

    fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    /// Index of the cell at top-down coordinates (x, y)
    fn index(&self, x: i32, y: i32) -> usize {
        let row = if self.top_down {
            y
        } else {
            self.height - 1 - y
        };
        row as usize * self.width as usize + x as usize
    }

    fn get(&self, x: i32, y: i32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    fn set(&mut self, x: i32, y: i32, value: u32) {
        let i = self.index(x, y);
        self.pixels[i] = value;
    }
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    dcs: HashMap<DcId, DcEntry>,
    bitmaps: HashMap<BitmapId, BitmapEntry>,
    stats: HandleStats,
    /// Remaining successful calls before the primitive fails once
    faults: HashMap<Primitive, u32>,
}

impl State {
    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_bitmap(&mut self, entry: BitmapEntry) -> BitmapId {
        let id = BitmapId(self.next());
        self.bitmaps.insert(id, entry);
        id
    }

    fn insert_dc(&mut self, kind: DcKind, selected: BitmapId) -> DcId {
        let id = DcId(self.next());
        self.dcs.insert(id, DcEntry { kind, selected });
        if let Some(bmp) = self.bitmaps.get_mut(&selected) {
            bmp.selected_into = Some(id);
        }
        id
    }

    /// Consume an injected fault for `primitive`, returning true when this call must fail
    fn should_fail(&mut self, primitive: Primitive) -> bool {
        let Some(remaining) = self.faults.get_mut(&primitive) else {
            return false;
        };
        if *remaining > 0 {
            *remaining -= 1;
            return false;
        }
        self.faults.remove(&primitive);
        debug!("Injected failure for {:?}", primitive);
        true
    }

    /// Bitmap currently selected into `dc`
    fn target(&self, dc: DcId) -> Option<BitmapId> {
        self.dcs.get(&dc).map(|entry| entry.selected)
    }

    /// Bitmap whose pixels are in the table rather than lent out
    fn resident(&self, bitmap: BitmapId) -> Option<&BitmapEntry> {
        self.bitmaps.get(&bitmap).filter(|entry| !entry.checked_out)
    }

    fn resident_mut(&mut self, bitmap: BitmapId) -> Option<&mut BitmapEntry> {
        self.bitmaps
            .get_mut(&bitmap)
            .filter(|entry| !entry.checked_out)
    }
}

/// Pixels taken out of the table by `with_dib_bits`, put back on drop
struct Lent<'a> {
    gdi: &'a SoftwareGdi,
    bitmap: BitmapId,
    pixels: Vec<u32>,
}

impl Drop for Lent<'_> {
    fn drop(&mut self) {
        let mut state = self.gdi.lock();
        if let Some(entry) = state.bitmaps.get_mut(&self.bitmap) {
            entry.pixels = std::mem::take(&mut self.pixels);
            entry.checked_out = false;
        }
    }
}

/// Software stand-in for the platform graphics layer
#[derive(Debug, Default)]
pub struct SoftwareGdi {
    state: Mutex<State>,
}

impl SoftwareGdi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a top-down destination surface filled with `fill`
    ///
    /// Returns `None` when a side does not fit in `i32` or the pixel memory
    /// cannot be allocated.
    pub fn create_surface(&self, width: u32, height: u32, fill: Color) -> Option<DcId> {
        let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
            debug!("Surface size {}x{} is out of range", width, height);
            return None;
        };
        let entry = BitmapEntry::try_new(w, h, true, fill.0, true)?;
        let mut state = self.lock();
        let bitmap = state.insert_bitmap(entry);
        let dc = state.insert_dc(DcKind::Surface, bitmap);
        debug!("Created {}x{} surface {:?}", width, height, dc);
        Some(dc)
    }

    pub fn destroy_surface(&self, dc: DcId) -> bool {
        let mut state = self.lock();
        match state.dcs.get(&dc) {
            Some(DcEntry {
                kind: DcKind::Surface,
                selected,
            }) => {
                let bitmap = *selected;
                state.dcs.remove(&dc);
                state.bitmaps.remove(&bitmap);
                true
            }
            _ => false,
        }
    }

    pub fn surface_size(&self, dc: DcId) -> Option<(i32, i32)> {
        let state = self.lock();
        let bmp = state.bitmaps.get(&state.target(dc)?)?;
        Some((bmp.width, bmp.height))
    }

    /// Pixels of the bitmap currently selected into `dc`, top-down
    pub fn read_surface(&self, dc: DcId) -> Option<Vec<u32>> {
        let state = self.lock();
        let bmp = state.resident(state.target(dc)?)?;
        let mut out = Vec::with_capacity(bmp.pixels.len());
        for y in 0..bmp.height {
            for x in 0..bmp.width {
                out.push(bmp.get(x, y));
            }
        }
        Some(out)
    }

    pub fn pixel(&self, dc: DcId, x: i32, y: i32) -> Option<Color> {
        let state = self.lock();
        let bmp = state.resident(state.target(dc)?)?;
        bmp.bounds().contains(x, y).then(|| Color(bmp.get(x, y)))
    }

    /// Make the next call of `primitive` fail
    pub fn fail_next(&self, primitive: Primitive) {
        self.fail_after(primitive, 0);
    }

    /// Let `successes` calls of `primitive` through, then fail the next one
    pub fn fail_after(&self, primitive: Primitive, successes: u32) {
        self.lock().faults.insert(primitive, successes);
    }

    pub fn stats(&self) -> HandleStats {
        self.lock().stats
    }

    /// Compositor-created contexts and bitmaps still alive
    pub fn live_handles(&self) -> usize {
        let stats = self.stats();
        (stats.bitmaps_created - stats.bitmaps_deleted) + (stats.dcs_created - stats.dcs_deleted)
    }
}

/// Premultiplied source-over of one packed pixel: `s + d * (255 - sa) / 255`
pub fn over(src: u32, dst: u32) -> u32 {
    let inv = 255 - (src >> 24) as u8;
    let mut out = 0u32;
    for shift in [0, 8, 16, 24] {
        let s = (src >> shift) as u8;
        let d = (dst >> shift) as u8;
        let c = s.saturating_add(mul_div_255(d, inv));
        out |= (c as u32) << shift;
    }
    out
}

/// Scale every channel of a packed pixel by `alpha / 255`
fn scale(pixel: u32, alpha: u8) -> u32 {
    if alpha == 255 {
        return pixel;
    }
    let mut out = 0u32;
    for shift in [0, 8, 16, 24] {
        out |= (mul_div_255((pixel >> shift) as u8, alpha) as u32) << shift;
    }
    out
}

impl Gdi for SoftwareGdi {
    type Dc = DcId;
    type Bitmap = BitmapId;

    fn create_dib_section(&self, dc: DcId, header: &BitmapInfoHeader) -> Option<BitmapId> {
        let mut state = self.lock();
        if state.should_fail(Primitive::CreateDibSection) || !state.dcs.contains_key(&dc) {
            return None;
        }
        let rows = header.rows();
        let expected_size = (header.width as i64 * rows as i64).saturating_mul(4);
        if header.planes != 1
            || header.bit_count != 32
            || header.compression != Compression::Rgb
            || header.width <= 0
            || rows == 0
            || (header.size_image != 0 && header.size_image as i64 != expected_size)
        {
            trace!("Rejected bitmap header {:?}", header);
            return None;
        }
        let entry = BitmapEntry::try_new(header.width, rows, header.is_top_down(), 0, false)?;
        let id = state.insert_bitmap(entry);
        state.stats.bitmaps_created += 1;
        trace!("create_dib_section -> {:?}", id);
        Some(id)
    }

    fn with_dib_bits<R>(&self, bitmap: BitmapId, f: impl FnOnce(&mut [u32]) -> R) -> Option<R> {
        // Take the pixels out so `f` runs with the table unlocked
        let pixels = {
            let mut state = self.lock();
            let entry = state.resident_mut(bitmap)?;
            if entry.owned_by_dc {
                return None;
            }
            entry.checked_out = true;
            std::mem::take(&mut entry.pixels)
        };
        let mut lent = Lent {
            gdi: self,
            bitmap,
            pixels,
        };
        Some(f(lent.pixels.as_mut_slice()))
    }

    fn delete_object(&self, bitmap: BitmapId) -> bool {
        let mut state = self.lock();
        if state.should_fail(Primitive::DeleteObject) {
            return false;
        }
        match state.bitmaps.get(&bitmap) {
            Some(entry)
                if !entry.owned_by_dc && !entry.checked_out && entry.selected_into.is_none() =>
            {
                state.bitmaps.remove(&bitmap);
                state.stats.bitmaps_deleted += 1;
                trace!("delete_object {:?}", bitmap);
                true
            }
            Some(entry) => {
                debug!(
                    "Refusing to delete {:?} (selected into {:?}, lent out: {})",
                    bitmap, entry.selected_into, entry.checked_out
                );
                false
            }
            None => false,
        }
    }

    fn create_compatible_dc(&self, dc: DcId) -> Option<DcId> {
        let mut state = self.lock();
        if state.should_fail(Primitive::CreateCompatibleDc) || !state.dcs.contains_key(&dc) {
            return None;
        }
        let stock = state.insert_bitmap(BitmapEntry::try_new(1, 1, true, 0, true)?);
        let id = state.insert_dc(DcKind::Memory { stock }, stock);
        state.stats.dcs_created += 1;
        trace!("create_compatible_dc({:?}) -> {:?}", dc, id);
        Some(id)
    }

    fn delete_dc(&self, dc: DcId) -> bool {
        let mut state = self.lock();
        if state.should_fail(Primitive::DeleteDc) {
            return false;
        }
        let (stock, selected) = match state.dcs.get(&dc) {
            Some(DcEntry {
                kind: DcKind::Memory { stock },
                selected,
            }) => (*stock, *selected),
            _ => return false,
        };
        // A bitmap still selected is released from the context, not destroyed
        if let Some(bmp) = state.bitmaps.get_mut(&selected) {
            bmp.selected_into = None;
        }
        state.bitmaps.remove(&stock);
        state.dcs.remove(&dc);
        state.stats.dcs_deleted += 1;
        trace!("delete_dc {:?}", dc);
        true
    }

    fn select_object(&self, dc: DcId, bitmap: BitmapId) -> Option<BitmapId> {
        let mut state = self.lock();
        if state.should_fail(Primitive::SelectObject) {
            return None;
        }
        let previous = match state.dcs.get(&dc) {
            Some(DcEntry {
                kind: DcKind::Memory { .. },
                selected,
            }) => *selected,
            _ => return None,
        };
        match state.bitmaps.get(&bitmap)?.selected_into {
            Some(owner) if owner != dc => return None,
            _ => {}
        }
        if let Some(prev) = state.bitmaps.get_mut(&previous) {
            prev.selected_into = None;
        }
        if let Some(next) = state.bitmaps.get_mut(&bitmap) {
            next.selected_into = Some(dc);
        }
        if let Some(entry) = state.dcs.get_mut(&dc) {
            entry.selected = bitmap;
        }
        trace!("select_object({:?}, {:?}) -> {:?}", dc, bitmap, previous);
        Some(previous)
    }

    fn alpha_blend(
        &self,
        dst: DcId,
        dst_rect: Rect,
        src: DcId,
        src_rect: Rect,
        func: BlendFunction,
    ) -> bool {
        let mut state = self.lock();
        if state.should_fail(Primitive::AlphaBlend) {
            return false;
        }
        let (Some(src_id), Some(dst_id)) = (state.target(src), state.target(dst)) else {
            return false;
        };
        if dst_rect.is_inverted() || src_rect.is_inverted() {
            return false;
        }
        let Some(source) = state.resident(src_id) else {
            return false;
        };
        if src_rect.intersect(&source.bounds()) != Some(src_rect) {
            trace!("alpha_blend source {:?} outside {:?}", src_rect, source.bounds());
            return false;
        }
        // Snapshot the source region; source and destination may share a table entry
        let (sw, sh) = (src_rect.width(), src_rect.height());
        let mut sampled = Vec::with_capacity(src_rect.area());
        for y in src_rect.top..src_rect.bottom {
            for x in src_rect.left..src_rect.right {
                sampled.push(source.get(x, y));
            }
        }

        let Some(target) = state.resident_mut(dst_id) else {
            return false;
        };
        let Some(clip) = dst_rect.intersect(&target.bounds()) else {
            return true;
        };
        // Offsets stay in i64: the edges of `dst_rect` may be further apart than i32 allows
        let (dw, dh) = (dst_rect.span_x(), dst_rect.span_y());
        for y in clip.top..clip.bottom {
            // Nearest-neighbour mapping; identity when the sizes match
            let sy = ((y as i64 - dst_rect.top as i64) * sh as i64 / dh) as usize;
            for x in clip.left..clip.right {
                let sx = ((x as i64 - dst_rect.left as i64) * sw as i64 / dw) as usize;
                let s = sampled[sy * sw as usize + sx];
                let d = target.get(x, y);
                target.set(x, y, over(scale(s, func.source_constant_alpha), d));
            }
        }
        true
    }

    fn bit_blt(
        &self,
        dst: DcId,
        dst_rect: Rect,
        src: DcId,
        src_x: i32,
        src_y: i32,
        rop: RasterOp,
    ) -> bool {
        let mut state = self.lock();
        if state.should_fail(Primitive::BitBlt) {
            return false;
        }
        // SRCCOPY is the only raster operation there is to model
        trace!("bit_blt({:?} -> {:?}, rop {:#010x})", src, dst, rop.code());
        let (Some(src_id), Some(dst_id)) = (state.target(src), state.target(dst)) else {
            return false;
        };
        if dst_rect.is_inverted() {
            return false;
        }
        let (Some(source), Some(target)) = (state.resident(src_id), state.resident(dst_id)) else {
            return false;
        };
        let Some(clip) = dst_rect.intersect(&target.bounds()) else {
            return true;
        };

        // Only the visible part is sampled; source and destination may share a table entry
        let (dx, dy) = (
            src_x as i64 - dst_rect.left as i64,
            src_y as i64 - dst_rect.top as i64,
        );
        let bounds = source.bounds();
        let mut sampled = Vec::with_capacity(clip.area());
        for y in clip.top..clip.bottom {
            for x in clip.left..clip.right {
                let cell = match (i32::try_from(x as i64 + dx), i32::try_from(y as i64 + dy)) {
                    (Ok(sx), Ok(sy)) if bounds.contains(sx, sy) => Some(source.get(sx, sy)),
                    _ => None,
                };
                sampled.push(cell);
            }
        }

        let Some(target) = state.resident_mut(dst_id) else {
            return false;
        };
        let mut cells = sampled.into_iter();
        for y in clip.top..clip.bottom {
            for x in clip.left..clip.right {
                // Pixels with no source behind them are left alone
                if let Some(Some(s)) = cells.next() {
                    target.set(x, y, s);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_dc_starts_with_stock_bitmap() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(2, 2, Color::BLACK).unwrap();
        let mem = gdi.create_compatible_dc(surface).unwrap();
        assert_eq!(gdi.surface_size(mem), Some((1, 1)));
        assert!(gdi.delete_dc(mem));
        assert!(gdi.stats().is_balanced());
    }

    #[test]
    fn selected_bitmap_cannot_be_deleted() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(2, 2, Color::BLACK).unwrap();
        let bmp = gdi
            .create_dib_section(surface, &BitmapInfoHeader::top_down_32bpp(2, 2))
            .unwrap();
        let mem = gdi.create_compatible_dc(surface).unwrap();
        let prev = gdi.select_object(mem, bmp).unwrap();
        assert!(!gdi.delete_object(bmp));
        assert_eq!(gdi.select_object(mem, prev), Some(bmp));
        assert!(gdi.delete_object(bmp));
        assert!(gdi.delete_dc(mem));
        assert!(gdi.stats().is_balanced());
    }

    #[test]
    fn bitmap_selected_once_at_a_time() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(2, 2, Color::BLACK).unwrap();
        let bmp = gdi
            .create_dib_section(surface, &BitmapInfoHeader::top_down_32bpp(1, 1))
            .unwrap();
        let a = gdi.create_compatible_dc(surface).unwrap();
        let b = gdi.create_compatible_dc(surface).unwrap();
        assert!(gdi.select_object(a, bmp).is_some());
        assert!(gdi.select_object(b, bmp).is_none());
    }

    #[test]
    fn bottom_up_bitmap_flips_rows() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(1, 2, Color::TRANSPARENT).unwrap();
        let mut header = BitmapInfoHeader::top_down_32bpp(1, 2);
        header.height = 2;
        let bmp = gdi.create_dib_section(surface, &header).unwrap();
        gdi.with_dib_bits(bmp, |cells| {
            cells[0] = 0xFF00_0001;
            cells[1] = 0xFF00_0002;
        });
        let mem = gdi.create_compatible_dc(surface).unwrap();
        gdi.select_object(mem, bmp).unwrap();
        assert!(gdi.bit_blt(surface, Rect::from_size(1, 2), mem, 0, 0, RasterOp::SrcCopy));
        assert_eq!(gdi.read_surface(surface), Some(vec![0xFF00_0002, 0xFF00_0001]));
    }

    #[test]
    fn rejects_unsupported_headers() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(1, 1, Color::BLACK).unwrap();
        let mut header = BitmapInfoHeader::top_down_32bpp(4, 4);
        header.bit_count = 24;
        assert!(gdi.create_dib_section(surface, &header).is_none());
        let mut header = BitmapInfoHeader::top_down_32bpp(4, 4);
        header.compression = Compression::BitFields;
        assert!(gdi.create_dib_section(surface, &header).is_none());
        assert!(gdi
            .create_dib_section(surface, &BitmapInfoHeader::top_down_32bpp(0, 4))
            .is_none());
        assert_eq!(gdi.stats().bitmaps_created, 0);
    }

    #[test]
    fn over_math() {
        assert_eq!(over(0xFF12_3456, 0xFFAB_CDEF), 0xFF12_3456);
        assert_eq!(over(0x0000_0000, 0xFFAB_CDEF), 0xFFAB_CDEF);
        assert_eq!(over(0x8080_8080, 0xFF00_0000), 0xFF80_8080);
        // Channels above alpha saturate instead of wrapping
        assert_eq!(over(0x80FF_FFFF, 0xFF00_0000), 0xFFFF_FFFF);
    }

    #[test]
    fn alpha_blend_clips_to_destination() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(3, 3, Color::BLACK).unwrap();
        let bmp = gdi
            .create_dib_section(surface, &BitmapInfoHeader::top_down_32bpp(2, 2))
            .unwrap();
        gdi.with_dib_bits(bmp, |cells| cells.fill(Color::WHITE.0));
        let mem = gdi.create_compatible_dc(surface).unwrap();
        gdi.select_object(mem, bmp).unwrap();
        assert!(gdi.alpha_blend(
            surface,
            Rect::new(2, 2, 4, 4),
            mem,
            Rect::from_size(2, 2),
            BlendFunction::per_pixel_premultiplied(),
        ));
        let px = gdi.read_surface(surface).unwrap();
        assert_eq!(px.iter().filter(|&&p| p == Color::WHITE.0).count(), 1);
        assert_eq!(gdi.pixel(surface, 2, 2), Some(Color::WHITE));
    }

    #[test]
    fn bit_blt_with_far_source_offset_copies_nothing() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(4, 4, Color::BLACK).unwrap();
        let src = gdi.create_surface(4, 4, Color::WHITE).unwrap();
        assert!(gdi.bit_blt(
            surface,
            Rect::from_size(4, 4),
            src,
            i32::MAX,
            i32::MAX - 1,
            RasterOp::SrcCopy
        ));
        assert!(gdi.bit_blt(
            surface,
            Rect::new(i32::MIN, i32::MIN, 2, 2),
            src,
            0,
            0,
            RasterOp::SrcCopy
        ));
        assert_eq!(gdi.read_surface(surface), Some(vec![Color::BLACK.0; 16]));
    }

    #[test]
    fn oversized_allocations_fail_instead_of_aborting() {
        let gdi = SoftwareGdi::new();
        assert_eq!(gdi.create_surface(3_000_000_000, 1, Color::BLACK), None);
        assert_eq!(gdi.create_surface(1, u32::MAX, Color::BLACK), None);

        let surface = gdi.create_surface(1, 1, Color::BLACK).unwrap();
        let mut header = BitmapInfoHeader::top_down_32bpp(i32::MAX, i32::MAX);
        header.size_image = 0;
        assert!(gdi.create_dib_section(surface, &header).is_none());
        assert_eq!(gdi.stats().bitmaps_created, 0);
    }

    #[test]
    fn pixel_callback_can_reenter_the_backend() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(2, 2, Color::BLACK).unwrap();
        let bmp = gdi
            .create_dib_section(surface, &BitmapInfoHeader::top_down_32bpp(2, 2))
            .unwrap();
        let mem = gdi.create_compatible_dc(surface).unwrap();

        let seen = gdi.with_dib_bits(bmp, |cells| {
            cells.fill(Color::WHITE.0);
            // The bitmap is on loan: anything touching its pixels fails
            assert_eq!(gdi.with_dib_bits(bmp, |inner| inner.len()), None);
            assert!(!gdi.delete_object(bmp));
            assert!(gdi.select_object(mem, bmp).is_some());
            assert!(!gdi.bit_blt(surface, Rect::from_size(2, 2), mem, 0, 0, RasterOp::SrcCopy));
            // Everything else goes through
            assert_eq!(gdi.pixel(surface, 1, 1), Some(Color::BLACK));
            gdi.stats().bitmaps_created
        });
        assert_eq!(seen, Some(1));

        assert!(gdi.bit_blt(surface, Rect::from_size(2, 2), mem, 0, 0, RasterOp::SrcCopy));
        assert_eq!(gdi.read_surface(surface), Some(vec![Color::WHITE.0; 4]));
        assert_eq!(gdi.with_dib_bits(bmp, |cells| cells.len()), Some(4));
    }

    #[test]
    fn injected_fault_fires_once_after_successes() {
        let gdi = SoftwareGdi::new();
        let surface = gdi.create_surface(1, 1, Color::BLACK).unwrap();
        gdi.fail_after(Primitive::CreateCompatibleDc, 1);
        let first = gdi.create_compatible_dc(surface);
        assert!(first.is_some());
        assert!(gdi.create_compatible_dc(surface).is_none());
        assert!(gdi.create_compatible_dc(surface).is_some());
    }
}
