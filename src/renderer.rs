//! Renderer backend interface
//!
//! The engine produces atlas pixels and triangle batches; everything
//! GPU-facing lives behind this trait. The engine notifies it at
//! construction (`create`), atlas growth (`resize`), before drawing when
//! atlas bytes changed (`update`), on every batch flush (`draw`) and on
//! teardown (`delete`).

/// GPU-facing backend consuming atlas updates and triangle batches
pub trait TextRenderer {
    /// Create texture storage for a `width` x `height` single-channel atlas.
    /// Returning `false` aborts engine construction.
    fn create(&mut self, width: i32, height: i32) -> bool;

    /// Replace texture storage with new dimensions (atlas expand/reset).
    /// Returning `false` cancels the expand/reset.
    fn resize(&mut self, width: i32, height: i32) -> bool;

    /// Upload changed atlas bytes. `rect` is `[x0, y0, x1, y1]` within the
    /// full `data` buffer (row stride = atlas width).
    fn update(&mut self, rect: [i32; 4], data: &[u8]);

    /// Draw `nverts` vertices as triangles from the parallel arrays
    /// (2 floats per position/texcoord, one packed RGBA per vertex).
    fn draw(&mut self, verts: &[f32], tcoords: &[f32], colors: &[u32], nverts: usize);

    /// Release GPU resources. Called once when the engine is dropped.
    fn delete(&mut self);
}

/// Renderer that ignores everything. Useful for measurement-only engines
/// and as a stand-in while wiring up a real backend.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl TextRenderer for NullRenderer {
    fn create(&mut self, _width: i32, _height: i32) -> bool {
        true
    }

    fn resize(&mut self, _width: i32, _height: i32) -> bool {
        true
    }

    fn update(&mut self, _rect: [i32; 4], _data: &[u8]) {}

    fn draw(&mut self, _verts: &[f32], _tcoords: &[f32], _colors: &[u32], _nverts: usize) {}

    fn delete(&mut self) {}
}
