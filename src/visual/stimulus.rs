//! Stimulus renderers
//!
//! The per-kind algorithms, kept as free functions over plain inputs so the
//! timing and scaling rules can be checked without a running engine.

use super::color::Color;
use super::surface::{Surface, BYTES_PER_PIXEL};
use rand::Rng;

/// Maximum horizontal shift of the distortion at full effective intensity, in pixels
pub const DISTORTION_SHIFT_PX: f32 = 50.0;

/// Maximum shake offset at full effective intensity, in logical units
pub const SHAKE_RANGE: f32 = 10.0;

// ============================================================================
// Flicker
// ============================================================================

/// Whether a flicker stimulus paints on `frame`.
///
/// The strobe fires when `sin(frame * frequency * 0.1)` rises above
/// `1 - intensity * (1 + stress)`, so higher stress widens each flash.
pub fn flicker_active(frame: u64, frequency: f32, intensity: f32, stress: f32) -> bool {
    let threshold = 1.0 - intensity as f64 * (1.0 + stress as f64);
    (frame as f64 * frequency as f64 * 0.1).sin() > threshold
}

// ============================================================================
// Overlay
// ============================================================================

/// Opacity of the overlay wash at `stress`, capped at fully opaque
pub fn overlay_alpha(opacity: f32, stress: f32) -> f32 {
    (opacity * (1.0 + stress)).clamp(0.0, 1.0)
}

pub fn render_overlay(surface: &mut Surface, color: Color, opacity: f32, stress: f32) {
    surface.fill(color.with_opacity(overlay_alpha(opacity, stress)));
}

// ============================================================================
// Distortion
// ============================================================================

/// Intensity after stress scaling for distortion and shake
pub fn effective_intensity(intensity: f32, stress: f32) -> f32 {
    intensity * (1.0 + stress * 2.0)
}

/// Shift every row sideways by a wave that varies with time and position.
///
/// For the pixel at byte offset `i` the shift is
/// `sin(frame * 0.1 + i * 0.001) * intensity * 50` pixels. Colour is
/// sampled from the shifted position within the same row, clamped to the
/// edge, and alpha is left alone. Returns false when there was nothing to do.
pub fn apply_distortion(surface: &mut Surface, frame: u64, intensity: f32) -> bool {
    if intensity <= 0.0 || surface.is_blank() {
        return false;
    }

    let width = surface.pixel_width();
    let stride = surface.stride();
    let source = surface.snapshot();
    let time = frame as f64 * 0.1;
    let amplitude = intensity as f64 * DISTORTION_SHIFT_PX as f64;

    for (row_index, row) in surface.pixels_mut().chunks_exact_mut(stride).enumerate() {
        let row_start = row_index * stride;
        for x in 0..width {
            let byte_index = row_start + x * BYTES_PER_PIXEL;
            let shift = ((time + byte_index as f64 * 0.001).sin() * amplitude).floor() as i64;
            let src_x = (x as i64 + shift).clamp(0, width as i64 - 1) as usize;
            if src_x == x {
                continue;
            }
            let src = row_start + src_x * BYTES_PER_PIXEL;
            let dst = x * BYTES_PER_PIXEL;
            row[dst..dst + 3].copy_from_slice(&source[src..src + 3]);
        }
    }
    true
}

// ============================================================================
// Shake
// ============================================================================

/// Random jitter offset for a shake stimulus, in logical units
pub fn shake_offset<R: Rng + ?Sized>(rng: &mut R, intensity: f32, stress: f32) -> (f32, f32) {
    let range = effective_intensity(intensity, stress) * SHAKE_RANGE;
    let dx = (rng.gen::<f32>() - 0.5) * range;
    let dy = (rng.gen::<f32>() - 0.5) * range;
    (dx, dy)
}

/// Compute a shake offset inside a saved transform scope.
///
/// Nothing is drawn inside the scope, so the offset has no visible effect;
/// it is returned for the frame report.
pub fn render_shake<R: Rng + ?Sized>(
    surface: &mut Surface,
    rng: &mut R,
    intensity: f32,
    stress: f32,
) -> (f32, f32) {
    let (dx, dy) = shake_offset(rng, intensity, stress);
    surface.save();
    surface.translate(dx, dy);
    surface.restore();
    (dx, dy)
}
