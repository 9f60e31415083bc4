//! Global constants for glyphbatch
//!
//! Consolidates capacity and limit constants
//! to eliminate magic numbers throughout the codebase.

// ============================================================================
// Capacity Constants
// ============================================================================

/// Scratch buffer size in bytes for staging rasterized glyph bitmaps.
/// A glyph whose bitmap exceeds this is reported as `ScratchFull` and skipped.
pub const SCRATCH_BUF_SIZE: usize = 96000;

/// Per-font glyph hash table size (must be a power of two)
pub const HASH_LUT_SIZE: usize = 256;

/// Initial font slot capacity
pub const INIT_FONTS: usize = 4;

/// Initial per-font glyph arena capacity
pub const INIT_GLYPHS: usize = 256;

/// Initial skyline node capacity
pub const INIT_ATLAS_NODES: usize = 256;

/// Vertex batch capacity (vertices, 6 per glyph quad)
pub const VERTEX_COUNT: usize = 1024;

/// Maximum render-state stack depth
pub const MAX_STATES: usize = 20;

/// Maximum fallback fonts per font
pub const MAX_FALLBACKS: usize = 20;

// ============================================================================
// Rendering Constants
// ============================================================================

/// Maximum blur radius in pixels (larger requests are clamped)
pub const MAX_BLUR: i16 = 20;

/// Padding added on each side of a baked glyph, beyond the blur radius.
/// One pixel guards against atlas bleeding, one allows bilinear sampling.
pub const GLYPH_PAD: i16 = 2;

/// Side length of the opaque white calibration rect baked at atlas origin
pub const WHITE_RECT_SIZE: i32 = 2;
