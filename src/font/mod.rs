//! Font records and the per-font glyph cache
//!
//! Handles:
//! - font registration from raw bytes (parsing delegated to the backend)
//! - normalized vertical metrics, computed once at load time
//! - the glyph arena: a flat record array addressed through a fixed-size
//!   hash table with chained indices (no per-glyph allocation)
//! - the bounded fallback font list

pub mod backend;

use crate::constants::{HASH_LUT_SIZE, INIT_GLYPHS, MAX_FALLBACKS};
use backend::FaceMetrics;

/// Index of a registered font within the engine
pub type FontId = usize;

/// One baked (or measured) glyph record.
///
/// `x0 < 0` marks a glyph that was resolved for measurement only and has no
/// atlas bitmap yet. Atlas coordinates include the blur padding.
#[derive(Debug, Clone, Copy)]
pub struct Glyph {
    /// Unicode codepoint
    pub codepoint: u32,
    /// Font size in tenths of a pixel (cache key component)
    pub size: i16,
    /// Blur radius in pixels (cache key component)
    pub blur: i16,
    /// Glyph index reported by the font backend (0 = missing)
    pub index: u16,
    /// Atlas rectangle, padding included
    pub x0: i16,
    pub y0: i16,
    pub x1: i16,
    pub y1: i16,
    /// Horizontal advance in tenths of a pixel
    pub xadv: i16,
    /// Offset from the pen to the bitmap's left edge
    pub xoff: i16,
    /// Offset from the baseline to the bitmap's top edge
    pub yoff: i16,
    /// Next record in the same hash bucket (-1 = end of chain)
    next: i32,
}

/// A registered font: owned file bytes, backend face handle, normalized
/// metrics and the glyph cache
pub struct Font<F> {
    /// Advisory unique name for lookup
    pub name: String,
    /// Raw font file bytes (owned for the lifetime of the font)
    pub data: Vec<u8>,
    /// Opaque handle into the font backend
    pub face: F,
    /// Ascender as a fraction of the ascender-to-descender height
    pub ascender: f32,
    /// Descender fraction (negative)
    pub descender: f32,
    /// Line height fraction
    pub lineh: f32,
    glyphs: Vec<Glyph>,
    lut: [i32; HASH_LUT_SIZE],
    fallbacks: Vec<FontId>,
}

impl<F> Font<F> {
    /// Build a font record around a loaded face. Vertical metrics are
    /// normalized once here so later queries scale by size only.
    pub fn new(name: &str, data: Vec<u8>, face: F, metrics: FaceMetrics) -> Self {
        let ascent = metrics.ascent + metrics.line_gap;
        let fh = ascent - metrics.descent;
        let ascender = ascent / fh;
        let descender = metrics.descent / fh;
        Self {
            name: name.to_owned(),
            data,
            face,
            ascender,
            descender,
            lineh: ascender - descender,
            glyphs: Vec::with_capacity(INIT_GLYPHS),
            lut: [-1; HASH_LUT_SIZE],
            fallbacks: Vec::new(),
        }
    }

    /// Look up a cached glyph by its (codepoint, size, blur) key
    pub fn find_glyph(&self, codepoint: u32, isize: i16, iblur: i16) -> Option<usize> {
        let h = (hash_int(codepoint) & (HASH_LUT_SIZE as u32 - 1)) as usize;
        let mut i = self.lut[h];
        while i != -1 {
            let g = &self.glyphs[i as usize];
            if g.codepoint == codepoint && g.size == isize && g.blur == iblur {
                return Some(i as usize);
            }
            i = g.next;
        }
        None
    }

    /// Append a fresh glyph record and link it into its hash chain
    pub fn alloc_glyph(&mut self, codepoint: u32, isize: i16, iblur: i16) -> usize {
        let h = (hash_int(codepoint) & (HASH_LUT_SIZE as u32 - 1)) as usize;
        let i = self.glyphs.len();
        self.glyphs.push(Glyph {
            codepoint,
            size: isize,
            blur: iblur,
            index: 0,
            x0: -1,
            y0: -1,
            x1: -1,
            y1: -1,
            xadv: 0,
            xoff: 0,
            yoff: 0,
            next: self.lut[h],
        });
        self.lut[h] = i as i32;
        i
    }

    pub fn glyph(&self, i: usize) -> &Glyph {
        &self.glyphs[i]
    }

    pub fn glyph_mut(&mut self, i: usize) -> &mut Glyph {
        &mut self.glyphs[i]
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Drop every cached glyph in bulk (atlas reset). Metrics, face and
    /// fallback list are untouched.
    pub fn clear_glyphs(&mut self) {
        self.glyphs.clear();
        self.lut = [-1; HASH_LUT_SIZE];
    }

    /// Append a fallback font, bounded by `MAX_FALLBACKS`
    pub fn add_fallback(&mut self, id: FontId) -> bool {
        if self.fallbacks.len() >= MAX_FALLBACKS {
            return false;
        }
        self.fallbacks.push(id);
        true
    }

    /// Fallback fonts in consult order
    pub fn fallbacks(&self) -> &[FontId] {
        &self.fallbacks
    }
}

/// Integer mix hash for codepoint bucketing
fn hash_int(mut a: u32) -> u32 {
    a = a.wrapping_add(!(a << 15));
    a ^= a >> 10;
    a = a.wrapping_add(a << 3);
    a ^= a >> 6;
    a = a.wrapping_add(!(a << 11));
    a ^= a >> 16;
    a
}
