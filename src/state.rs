//! Render state
//!
//! A snapshot of every attribute that influences shaping and quad emission.
//! The engine keeps a bounded stack of these; all setters act on the top.

use bitflags::bitflags;

bitflags! {
    /// Text alignment relative to the pen position.
    /// Combine one horizontal flag with one vertical flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Align: u32 {
        // Horizontal
        const LEFT     = 1 << 0;
        const CENTER   = 1 << 1;
        const RIGHT    = 1 << 2;
        // Vertical
        const TOP      = 1 << 3;
        const MIDDLE   = 1 << 4;
        const BOTTOM   = 1 << 5;
        const BASELINE = 1 << 6;
    }
}

/// Y-axis convention of the output coordinate space, chosen at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YOrigin {
    /// y grows downward (typical 2D/UI projection)
    TopLeft,
    /// y grows upward (GL-style projection)
    BottomLeft,
}

/// One style snapshot
#[derive(Debug, Clone, Copy)]
pub struct RenderState {
    /// Font size in pixels
    pub size: f32,
    /// Packed RGBA color (little-endian byte order r,g,b,a)
    pub color: u32,
    /// Active font index
    pub font: usize,
    /// Blur radius in pixels
    pub blur: f32,
    /// Extra spacing between glyphs in pixels
    pub spacing: f32,
    /// Alignment flags
    pub align: Align,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            size: 12.0,
            color: 0xffff_ffff,
            font: 0,
            blur: 0.0,
            spacing: 0.0,
            align: Align::LEFT.union(Align::BASELINE),
        }
    }
}

/// Pack r,g,b,a bytes into the color format used by the vertex batch
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}
