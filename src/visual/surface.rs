//! Drawing surface
//!
//! An RGBA8 pixel buffer sized for the device pixel ratio. Callers draw in
//! logical units; the surface scales them to device pixels and clips
//! everything to its bounds.

use super::color::{blend_over, Color};
use crate::error::{OverloadError, Result};
use log::warn;

/// Largest backing dimension in device pixels
pub const MAX_DIMENSION_PX: usize = 16_384;

/// Bytes per pixel (RGBA8)
pub const BYTES_PER_PIXEL: usize = 4;

/// Size of the surface in logical units plus its device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSpec {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl SurfaceSpec {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }
}

/// RGBA8 raster the visual engine draws onto
#[derive(Debug, Clone)]
pub struct Surface {
    spec: SurfaceSpec,
    pixel_width: usize,
    pixel_height: usize,
    pixels: Vec<u8>,
    /// Current translation in logical units
    translation: (f32, f32),
    saved: Vec<(f32, f32)>,
}

impl Surface {
    /// Acquire a surface for `spec`.
    ///
    /// # Errors
    /// `SurfaceUnavailable` when any dimension or the pixel ratio is zero,
    /// negative or not finite.
    pub fn new(spec: SurfaceSpec) -> Result<Self> {
        let SurfaceSpec {
            width,
            height,
            device_pixel_ratio: dpr,
        } = spec;
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if !(usable(width) && usable(height) && usable(dpr)) {
            return Err(OverloadError::SurfaceUnavailable {
                reason: format!("cannot back a {width}x{height} surface at {dpr}x"),
            });
        }

        let to_pixels = |logical: f32| -> Result<usize> {
            let px = (logical * dpr).round();
            if px < 1.0 {
                return Err(OverloadError::SurfaceUnavailable {
                    reason: format!("{logical} logical units at {dpr}x is under one pixel"),
                });
            }
            if px > MAX_DIMENSION_PX as f32 {
                warn!(
                    "[VISUAL] Clamping {} px surface dimension to {}",
                    px, MAX_DIMENSION_PX
                );
                return Ok(MAX_DIMENSION_PX);
            }
            Ok(px as usize)
        };
        let pixel_width = to_pixels(width)?;
        let pixel_height = to_pixels(height)?;

        Ok(Self {
            spec,
            pixel_width,
            pixel_height,
            pixels: vec![0; pixel_width * pixel_height * BYTES_PER_PIXEL],
            translation: (0.0, 0.0),
            saved: Vec::new(),
        })
    }

    pub fn spec(&self) -> SurfaceSpec {
        self.spec
    }

    /// Logical width
    pub fn width(&self) -> f32 {
        self.spec.width
    }

    /// Logical height
    pub fn height(&self) -> f32 {
        self.spec.height
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.spec.device_pixel_ratio
    }

    pub fn pixel_width(&self) -> usize {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> usize {
        self.pixel_height
    }

    /// Bytes in one row of device pixels
    pub fn stride(&self) -> usize {
        self.pixel_width * BYTES_PER_PIXEL
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Copy of the current pixels
    pub fn snapshot(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// RGBA of one device pixel
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.pixel_width || y >= self.pixel_height {
            return None;
        }
        let i = (y * self.pixel_width + x) * BYTES_PER_PIXEL;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    /// Whether every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&b| b == 0)
    }

    // ------------------------------------------------------------------------
    // Transform stack
    // ------------------------------------------------------------------------

    /// Push the current transform
    pub fn save(&mut self) {
        self.saved.push(self.translation);
    }

    /// Offset subsequent drawing by (`dx`, `dy`) logical units
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.translation.0 += dx;
        self.translation.1 += dy;
    }

    /// Pop back to the last saved transform; an unbalanced call resets it
    pub fn restore(&mut self) {
        self.translation = self.saved.pop().unwrap_or((0.0, 0.0));
    }

    pub fn translation(&self) -> (f32, f32) {
        self.translation
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    /// Reset every pixel to transparent
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Composite `color` over the whole surface
    pub fn fill(&mut self, color: Color) {
        if color.a == 0 {
            return;
        }
        for pixel in self.pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            blend_over(pixel, color);
        }
    }

    /// Composite a filled circle centred at logical (`x`, `y`)
    pub fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
        if color.a == 0 || !(radius > 0.0) {
            return;
        }
        let dpr = self.spec.device_pixel_ratio;
        let cx = (x + self.translation.0) * dpr;
        let cy = (y + self.translation.1) * dpr;
        let r = radius * dpr;

        let min_x = (cx - r).floor().max(0.0) as usize;
        let min_y = (cy - r).floor().max(0.0) as usize;
        let max_x = ((cx + r).ceil().max(0.0) as usize).min(self.pixel_width);
        let max_y = ((cy + r).ceil().max(0.0) as usize).min(self.pixel_height);
        let r2 = r * r;

        for py in min_y..max_y {
            let dy = py as f32 + 0.5 - cy;
            for px in min_x..max_x {
                let dx = px as f32 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    let i = (py * self.pixel_width + px) * BYTES_PER_PIXEL;
                    blend_over(&mut self.pixels[i..i + BYTES_PER_PIXEL], color);
                }
            }
        }
    }
}
