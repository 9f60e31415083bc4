//! Skyline atlas allocator
//!
//! Tracks free space in the glyph texture as a left-to-right skyline:
//! each node records the topmost occupied height over a horizontal span.
//! Allocation drops a rectangle at the lowest spot it fits (bottom-left
//! heuristic); there is no per-rect free, only whole-atlas reset.

use crate::constants::INIT_ATLAS_NODES;
use log::debug;

/// One skyline segment: the region above `(x, y)` over `width` pixels is free
#[derive(Debug, Clone, Copy)]
pub struct AtlasNode {
    pub x: i16,
    pub y: i16,
    pub width: i16,
}

/// Skyline packer over a `width` x `height` pixel region
pub struct Atlas {
    pub width: i32,
    pub height: i32,
    nodes: Vec<AtlasNode>,
}

impl Atlas {
    pub fn new(width: i32, height: i32) -> Self {
        let mut nodes = Vec::with_capacity(INIT_ATLAS_NODES);
        nodes.push(AtlasNode {
            x: 0,
            y: 0,
            width: width as i16,
        });
        Self {
            width,
            height,
            nodes,
        }
    }

    /// Skyline nodes, left to right, covering the full atlas width
    pub fn nodes(&self) -> &[AtlasNode] {
        &self.nodes
    }

    /// Highest skyline level currently in use
    pub fn max_height(&self) -> i32 {
        self.nodes.iter().map(|n| i32::from(n.y)).max().unwrap_or(0)
    }

    /// Grow the canvas without disturbing existing allocations.
    /// Added width becomes a new free span at height 0; added height only
    /// extends the vertical space available to future allocations.
    pub fn expand(&mut self, width: i32, height: i32) {
        if width > self.width {
            self.nodes.push(AtlasNode {
                x: self.width as i16,
                y: 0,
                width: (width - self.width) as i16,
            });
        }
        self.width = width;
        self.height = height;
        debug!("Atlas expanded to {}x{}", width, height);
    }

    /// Drop all allocations and re-initialize to a single free span
    pub fn reset(&mut self, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        self.nodes.clear();
        self.nodes.push(AtlasNode {
            x: 0,
            y: 0,
            width: width as i16,
        });
    }

    /// Allocate a `rw` x `rh` rectangle. Returns its top-left corner,
    /// or `None` when no skyline position can hold it.
    pub fn add_rect(&mut self, rw: i32, rh: i32) -> Option<(i32, i32)> {
        // Seed one past the height bound so a fit ending exactly at the
        // atlas height is still a candidate (rect_fits already rejects
        // anything taller).
        let mut best_h = self.height + 1;
        let mut best_w = self.width;
        let mut best_i = None;
        let mut best_x = 0;
        let mut best_y = 0;

        // Bottom-left heuristic: lowest resulting height wins,
        // ties broken by the narrowest candidate node.
        for i in 0..self.nodes.len() {
            if let Some(y) = self.rect_fits(i, rw, rh) {
                let node_w = i32::from(self.nodes[i].width);
                if y + rh < best_h || (y + rh == best_h && node_w < best_w) {
                    best_i = Some(i);
                    best_h = y + rh;
                    best_w = node_w;
                    best_x = i32::from(self.nodes[i].x);
                    best_y = y;
                }
            }
        }

        let i = best_i?;
        self.add_skyline_level(i, best_x, best_y, rw, rh);
        Some((best_x, best_y))
    }

    /// Lowest y at which a `w` x `h` rect fits starting at node `i`
    /// (think of a tetris block dropped at that column), or `None`.
    fn rect_fits(&self, mut i: usize, w: i32, h: i32) -> Option<i32> {
        let x = i32::from(self.nodes[i].x);
        let mut y = i32::from(self.nodes[i].y);
        if x + w > self.width {
            return None;
        }
        let mut space_left = w;
        while space_left > 0 {
            if i == self.nodes.len() {
                return None;
            }
            y = y.max(i32::from(self.nodes[i].y));
            if y + h > self.height {
                return None;
            }
            space_left -= i32::from(self.nodes[i].width);
            i += 1;
        }
        Some(y)
    }

    fn add_skyline_level(&mut self, idx: usize, x: i32, y: i32, w: i32, h: i32) {
        self.nodes.insert(
            idx,
            AtlasNode {
                x: x as i16,
                y: (y + h) as i16,
                width: w as i16,
            },
        );

        // Shrink or remove segments shadowed by the new one.
        let mut i = idx + 1;
        while i < self.nodes.len() {
            let prev_end = i32::from(self.nodes[i - 1].x) + i32::from(self.nodes[i - 1].width);
            if i32::from(self.nodes[i].x) < prev_end {
                let shrink = prev_end - i32::from(self.nodes[i].x);
                self.nodes[i].x += shrink as i16;
                self.nodes[i].width -= shrink as i16;
                if self.nodes[i].width <= 0 {
                    self.nodes.remove(i);
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        // Merge adjacent segments at the same height to bound node growth.
        let mut i = 0;
        while i + 1 < self.nodes.len() {
            if self.nodes[i].y == self.nodes[i + 1].y {
                self.nodes[i].width += self.nodes[i + 1].width;
                self.nodes.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}
