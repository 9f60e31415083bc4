//! Font parsing backend interface
//!
//! The engine never parses font binaries itself; everything it needs from a
//! font file goes through this trait. The production implementation sits on
//! `fontdue`; tests substitute a synthetic backend.
//!
//! Scales follow the stb_truetype convention: metrics come back in font
//! units and the engine multiplies by `pixel_scale` for a given size, so
//! kerning and advances round identically at every size.

use fontdue::{Font as FontdueFont, FontSettings};
use log::warn;

/// Vertical face metrics in font units
#[derive(Debug, Clone, Copy)]
pub struct FaceMetrics {
    pub ascent: f32,
    /// Negative below the baseline
    pub descent: f32,
    pub line_gap: f32,
}

/// Horizontal metrics and bitmap bounding box for one glyph.
/// `advance`/`lsb` are font units; the box is in pixels at the requested
/// scale, y growing downward from the baseline.
#[derive(Debug, Clone, Copy)]
pub struct GlyphMetrics {
    pub advance: f32,
    pub lsb: f32,
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// Font-parsing operations consumed by the glyph cache
pub trait FontBackend {
    /// Opaque parsed-face handle
    type Face;

    /// Parse a face out of raw font-file bytes. `None` on malformed or
    /// empty data (reported to the caller as an invalid font handle).
    fn load_face(&self, data: &[u8], face_index: u32) -> Option<Self::Face>;

    /// Vertical metrics in font units
    fn face_metrics(&self, face: &Self::Face) -> FaceMetrics;

    /// Font-unit to pixel scale factor for a pixel size
    fn pixel_scale(&self, face: &Self::Face, size: f32) -> f32;

    /// Glyph index for a codepoint; 0 when the face has no glyph for it
    fn glyph_index(&self, face: &Self::Face, codepoint: u32) -> u16;

    /// Metrics and pixel bounding box for a glyph at `scale`
    fn glyph_metrics(&self, face: &Self::Face, glyph: u16, scale: f32) -> GlyphMetrics;

    /// Rasterize a glyph as an 8-bit coverage bitmap into `out`
    /// (row-major, `width` bytes per row, `width * height` total).
    /// Returns false if the glyph could not be rendered.
    fn render_glyph(
        &self,
        face: &Self::Face,
        glyph: u16,
        scale_x: f32,
        scale_y: f32,
        width: usize,
        height: usize,
        out: &mut [u8],
    ) -> bool;

    /// Kerning adjustment between two glyph indices, in font units
    fn kern_advance(&self, face: &Self::Face, left: u16, right: u16) -> f32;
}

/// Parsed face for [`FontdueBackend`]
pub struct FontdueFace {
    font: FontdueFont,
    units_per_em: f32,
    metrics: FaceMetrics,
}

/// Production backend on the `fontdue` rasterizer
#[derive(Debug, Default)]
pub struct FontdueBackend;

impl FontdueBackend {
    pub fn new() -> Self {
        Self
    }
}

impl FontBackend for FontdueBackend {
    type Face = FontdueFace;

    fn load_face(&self, data: &[u8], face_index: u32) -> Option<FontdueFace> {
        if data.is_empty() {
            return None;
        }
        let settings = FontSettings {
            collection_index: face_index,
            ..FontSettings::default()
        };
        let font = match FontdueFont::from_bytes(data, settings) {
            Ok(f) => f,
            Err(e) => {
                warn!("Failed to parse font data: {}", e);
                return None;
            }
        };
        let units_per_em = font.units_per_em();
        // Asking for line metrics at em size yields font units directly
        let lm = font.horizontal_line_metrics(units_per_em)?;
        Some(FontdueFace {
            metrics: FaceMetrics {
                ascent: lm.ascent,
                descent: lm.descent,
                line_gap: lm.line_gap,
            },
            units_per_em,
            font,
        })
    }

    fn face_metrics(&self, face: &FontdueFace) -> FaceMetrics {
        face.metrics
    }

    fn pixel_scale(&self, face: &FontdueFace, size: f32) -> f32 {
        size / face.units_per_em
    }

    fn glyph_index(&self, face: &FontdueFace, codepoint: u32) -> u16 {
        match char::from_u32(codepoint) {
            Some(c) => face.font.lookup_glyph_index(c),
            None => 0,
        }
    }

    fn glyph_metrics(&self, face: &FontdueFace, glyph: u16, scale: f32) -> GlyphMetrics {
        let px = scale * face.units_per_em;
        let m = face.font.metrics_indexed(glyph, px);
        let em = face.font.metrics_indexed(glyph, face.units_per_em);
        // fontdue reports ymin from the baseline upward; convert to a
        // y-down box with y0 at the bitmap top.
        GlyphMetrics {
            advance: em.advance_width,
            lsb: em.xmin as f32,
            x0: m.xmin,
            y0: -(m.ymin + m.height as i32),
            x1: m.xmin + m.width as i32,
            y1: -m.ymin,
        }
    }

    fn render_glyph(
        &self,
        face: &FontdueFace,
        glyph: u16,
        scale_x: f32,
        _scale_y: f32,
        width: usize,
        height: usize,
        out: &mut [u8],
    ) -> bool {
        let px = scale_x * face.units_per_em;
        let (m, bitmap) = face.font.rasterize_indexed(glyph, px);
        if m.width == 0 || m.height == 0 {
            return true;
        }
        let rows = m.height.min(height);
        let cols = m.width.min(width);
        for y in 0..rows {
            let src = y * m.width;
            let dst = y * width;
            out[dst..dst + cols].copy_from_slice(&bitmap[src..src + cols]);
        }
        true
    }

    fn kern_advance(&self, face: &FontdueFace, left: u16, right: u16) -> f32 {
        face.font
            .horizontal_kern_indexed(left, right, face.units_per_em)
            .unwrap_or(0.0)
    }
}
