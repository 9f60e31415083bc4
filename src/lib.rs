//! Runtime glyph atlas and text layout
//!
//! A single-threaded engine that rasterizes glyphs on demand into one
//! growing 8-bit coverage texture, caches them per font under a chained
//! hash, and walks UTF-8 strings into textured quads with kerning,
//! alignment and optional blur. Font parsing and GPU upload sit behind
//! traits so the engine itself owns no platform handles.
//!
//! Architecture:
//! - `atlas`    - skyline bottom-left rectangle packer
//! - `font`     - per-font glyph cache and the font backend trait
//! - `engine`   - state stack, shaping walk, bake and batch orchestration
//! - `batch`    - vertex accumulation and dirty-region tracking
//! - `blur`     - fixed-point exponential blur for baked glyphs
//! - `renderer` - GPU-side callback trait
//! - `utf8`     - incremental UTF-8 decoder

pub mod atlas;
pub mod batch;
pub mod blur;
pub mod constants;
pub mod engine;
pub mod error;
pub mod font;
pub mod renderer;
pub mod state;
pub mod utf8;

pub use engine::{BitmapMode, Bounds, Quad, TextEngine, TextIter, VertMetrics};
pub use error::{ErrorCallback, StashError};
pub use font::backend::{FaceMetrics, FontBackend, FontdueBackend, FontdueFace, GlyphMetrics};
pub use font::{Font, FontId, Glyph};
pub use renderer::{NullRenderer, TextRenderer};
pub use state::{rgba, Align, RenderState, YOrigin};
