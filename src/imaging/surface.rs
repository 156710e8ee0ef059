//! Rendering surfaces with guaranteed release.
//!
//! A [`Surface`] is an RGBA canvas pre-filled with opaque white. It can only
//! be obtained from a [`SurfaceTracker`], and dropping it shrinks the canvas
//! to 0x0 and decrements the tracker's live count, so every exit path of an
//! encode pass (including `?` returns) releases it.

use super::codec::CodecError;
use image::buffer::ConvertBuffer;
use image::{RgbImage, Rgba, RgbaImage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    acquired: AtomicUsize,
}

/// Hands out surfaces and counts the ones not yet released.
///
/// Clones share counters.
#[derive(Debug, Clone, Default)]
pub struct SurfaceTracker {
    counters: Arc<Counters>,
}

impl SurfaceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a white `width`x`height` surface.
    ///
    /// Allocation failure is reported instead of aborting the process.
    pub fn acquire(&self, width: u32, height: u32) -> Result<Surface, CodecError> {
        let alloc_err = || CodecError::SurfaceAllocation { width, height };
        if width == 0 || height == 0 {
            return Err(alloc_err());
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(4))
            .ok_or_else(alloc_err)?;

        let mut buf: Vec<u8> = Vec::new();
        buf.try_reserve_exact(len).map_err(|_| alloc_err())?;
        buf.resize(len, 255);
        let canvas = RgbaImage::from_raw(width, height, buf).ok_or_else(alloc_err)?;

        self.counters.live.fetch_add(1, Ordering::SeqCst);
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        log::trace!("surface {width}x{height} acquired");

        Ok(Surface {
            canvas,
            tracker: self.clone(),
        })
    }

    /// Surfaces currently held.
    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Surfaces handed out since creation.
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }
}

/// Exclusively owned rendering surface for one pass.
#[derive(Debug)]
pub struct Surface {
    canvas: RgbaImage,
    tracker: SurfaceTracker,
}

impl Surface {
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Composite `image` over the white background at the origin.
    pub fn draw(&mut self, image: &RgbaImage) {
        image::imageops::overlay(&mut self.canvas, image, 0, 0);
    }

    /// Opaque RGB copy of the canvas, ready for encoding.
    pub fn to_rgb(&self) -> RgbImage {
        self.canvas.convert()
    }

    #[cfg(test)]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.canvas.get_pixel(x, y)
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        let (w, h) = self.canvas.dimensions();
        self.canvas = RgbaImage::new(0, 0);
        self.tracker.counters.live.fetch_sub(1, Ordering::SeqCst);
        log::trace!("surface {w}x{h} released");
    }
}
