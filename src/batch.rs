//! Vertex batching and dirty-region tracking
//!
//! The batch holds triangle geometry as parallel position/texcoord/color
//! arrays up to a fixed vertex capacity; the engine flushes it to the
//! renderer when full and at the end of every draw call. The dirty rect
//! accumulates the union of atlas bytes written since the renderer last
//! pulled it.

use crate::constants::VERTEX_COUNT;

/// Fixed-capacity triangle batch (parallel arrays, 2 floats per position
/// and texcoord, one packed color per vertex)
pub struct VertexBatch {
    verts: Vec<f32>,
    tcoords: Vec<f32>,
    colors: Vec<u32>,
    nverts: usize,
}

impl VertexBatch {
    pub fn new() -> Self {
        Self {
            verts: vec![0.0; VERTEX_COUNT * 2],
            tcoords: vec![0.0; VERTEX_COUNT * 2],
            colors: vec![0; VERTEX_COUNT],
            nverts: 0,
        }
    }

    /// True if appending `n` more vertices would exceed capacity
    pub fn would_overflow(&self, n: usize) -> bool {
        self.nverts + n > VERTEX_COUNT
    }

    pub fn push(&mut self, x: f32, y: f32, s: f32, t: f32, color: u32) {
        debug_assert!(self.nverts < VERTEX_COUNT);
        self.verts[self.nverts * 2] = x;
        self.verts[self.nverts * 2 + 1] = y;
        self.tcoords[self.nverts * 2] = s;
        self.tcoords[self.nverts * 2 + 1] = t;
        self.colors[self.nverts] = color;
        self.nverts += 1;
    }

    pub fn len(&self) -> usize {
        self.nverts
    }

    pub fn is_empty(&self) -> bool {
        self.nverts == 0
    }

    /// Current geometry as (positions, texcoords, colors, vertex count)
    pub fn arrays(&self) -> (&[f32], &[f32], &[u32], usize) {
        (&self.verts, &self.tcoords, &self.colors, self.nverts)
    }

    pub fn clear(&mut self) {
        self.nverts = 0;
    }
}

impl Default for VertexBatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Union of atlas sub-rectangles written since the last pull.
/// The empty state is the inverted sentinel `[w, h, 0, 0]` so the first
/// write sets the rect exactly.
#[derive(Debug, Clone, Copy)]
pub struct DirtyRect {
    rect: [i32; 4],
    width: i32,
    height: i32,
}

impl DirtyRect {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            rect: [width, height, 0, 0],
            width,
            height,
        }
    }

    /// Reset to the empty sentinel, adopting new atlas dimensions
    pub fn reset(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.rect = [width, height, 0, 0];
    }

    /// Union a written region `[x0, y0)..[x1, y1)` into the rect
    pub fn add(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        self.rect[0] = self.rect[0].min(x0);
        self.rect[1] = self.rect[1].min(y0);
        self.rect[2] = self.rect[2].max(x1);
        self.rect[3] = self.rect[3].max(y1);
    }

    pub fn is_empty(&self) -> bool {
        self.rect[0] >= self.rect[2] || self.rect[1] >= self.rect[3]
    }

    /// Return the accumulated rect and reset to empty, or `None` if
    /// nothing changed since the last pull
    pub fn take(&mut self) -> Option<[i32; 4]> {
        if self.is_empty() {
            return None;
        }
        let rect = self.rect;
        self.rect = [self.width, self.height, 0, 0];
        Some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_capacity_boundary() {
        let mut batch = VertexBatch::new();
        assert!(!batch.would_overflow(VERTEX_COUNT));
        assert!(batch.would_overflow(VERTEX_COUNT + 1));
        for _ in 0..VERTEX_COUNT - 3 {
            batch.push(0.0, 0.0, 0.0, 0.0, 0);
        }
        // 3 slots left: one more triangle fits, two do not
        assert!(!batch.would_overflow(3));
        assert!(batch.would_overflow(6));
        batch.clear();
        assert!(batch.is_empty());
        assert!(!batch.would_overflow(6));
    }

    #[test]
    fn test_batch_parallel_arrays() {
        let mut batch = VertexBatch::new();
        batch.push(1.0, 2.0, 0.25, 0.5, 0xff00ff00);
        let (verts, tcoords, colors, n) = batch.arrays();
        assert_eq!(n, 1);
        assert_eq!(&verts[..2], &[1.0, 2.0]);
        assert_eq!(&tcoords[..2], &[0.25, 0.5]);
        assert_eq!(colors[0], 0xff00ff00);
    }

    #[test]
    fn test_dirty_rect_sentinel() {
        let mut dirty = DirtyRect::new(64, 64);
        assert!(dirty.is_empty());
        assert_eq!(dirty.take(), None);

        dirty.add(10, 20, 14, 26);
        assert_eq!(dirty.take(), Some([10, 20, 14, 26]));
        assert_eq!(dirty.take(), None);
    }

    #[test]
    fn test_dirty_rect_union() {
        let mut dirty = DirtyRect::new(64, 64);
        dirty.add(10, 10, 20, 20);
        dirty.add(0, 15, 5, 40);
        assert_eq!(dirty.take(), Some([0, 10, 20, 40]));
    }
}
