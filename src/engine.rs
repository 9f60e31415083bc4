//! Text engine
//!
//! Owns the atlas pixels, the registered fonts and their glyph caches, the
//! render-state stack and the vertex batch. A draw call decodes UTF-8,
//! resolves each codepoint to a cached or freshly baked glyph, emits one
//! quad per glyph and flushes accumulated triangles to the renderer
//! backend; measurement shares the same walk without touching the atlas.

use anyhow::{bail, Result};
use log::{debug, info, warn};

use crate::atlas::Atlas;
use crate::batch::{DirtyRect, VertexBatch};
use crate::blur::blur_region;
use crate::constants::{
    GLYPH_PAD, INIT_FONTS, MAX_BLUR, MAX_STATES, SCRATCH_BUF_SIZE, WHITE_RECT_SIZE,
};
use crate::error::{ErrorCallback, StashError};
use crate::font::backend::FontBackend;
use crate::font::{Font, FontId};
use crate::renderer::TextRenderer;
use crate::state::{Align, RenderState, YOrigin};
use crate::utf8::Utf8Decoder;

/// Whether a glyph lookup must produce atlas pixels or only metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapMode {
    /// Metrics only; measurement paths use this so they never allocate
    /// atlas space
    Optional,
    /// Bake the bitmap into the atlas (draw paths)
    Required,
}

/// Screen-space corners and atlas UVs for one glyph
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Quad {
    pub x0: f32,
    pub y0: f32,
    pub s0: f32,
    pub t0: f32,
    pub x1: f32,
    pub y1: f32,
    pub s1: f32,
    pub t1: f32,
}

/// Alignment-adjusted bounding box of a measured string
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

/// Vertical metrics of the active font at the active size, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertMetrics {
    pub ascender: f32,
    pub descender: f32,
    pub lineh: f32,
}

/// Restartable per-glyph walk over one string.
///
/// Holds no engine borrows; advance it with
/// [`TextEngine::text_iter_next`].
pub struct TextIter<'a> {
    /// Codepoint of the glyph produced by the last step
    pub codepoint: u32,
    /// Pen position of the last-produced glyph
    pub x: f32,
    pub y: f32,
    font: FontId,
    nextx: f32,
    nexty: f32,
    scale: f32,
    spacing: f32,
    isize: i16,
    iblur: i16,
    text: &'a [u8],
    pos: usize,
    stop: Option<u32>,
    dec: Utf8Decoder,
    prev_glyph: Option<u16>,
    mode: BitmapMode,
}

/// Runtime glyph atlas, cache and layout engine
pub struct TextEngine<B: FontBackend, R: TextRenderer> {
    backend: B,
    renderer: R,
    y_origin: YOrigin,
    width: i32,
    height: i32,
    itw: f32,
    ith: f32,
    tex_data: Vec<u8>,
    dirty: DirtyRect,
    atlas: Atlas,
    fonts: Vec<Font<B::Face>>,
    batch: VertexBatch,
    scratch: Vec<u8>,
    states: Vec<RenderState>,
    error_cb: Option<ErrorCallback>,
}

impl<B: FontBackend, R: TextRenderer> TextEngine<B, R> {
    /// Create an engine over a `width` x `height` atlas. Notifies the
    /// renderer (`create`) and bakes the white calibration rect.
    pub fn new(
        backend: B,
        mut renderer: R,
        width: i32,
        height: i32,
        y_origin: YOrigin,
    ) -> Result<Self> {
        if !renderer.create(width, height) {
            bail!("renderer rejected {}x{} atlas texture", width, height);
        }
        let mut engine = Self {
            backend,
            renderer,
            y_origin,
            width,
            height,
            itw: 1.0 / width as f32,
            ith: 1.0 / height as f32,
            tex_data: vec![0; (width * height) as usize],
            dirty: DirtyRect::new(width, height),
            atlas: Atlas::new(width, height),
            fonts: Vec::with_capacity(INIT_FONTS),
            batch: VertexBatch::new(),
            scratch: vec![0; SCRATCH_BUF_SIZE],
            states: {
                let mut s = Vec::with_capacity(MAX_STATES);
                s.push(RenderState::default());
                s
            },
            error_cb: None,
        };
        engine.add_white_rect(WHITE_RECT_SIZE, WHITE_RECT_SIZE);
        info!("Text engine created with {}x{} atlas", width, height);
        Ok(engine)
    }

    /// Register a callback invoked at the point of every recoverable failure
    pub fn set_error_callback(&mut self, cb: impl FnMut(StashError) + 'static) {
        self.error_cb = Some(Box::new(cb));
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn report(&mut self, err: StashError) {
        warn!("{}", err);
        if let Some(cb) = self.error_cb.as_mut() {
            cb(err);
        }
    }

    // ========================================================================
    // Fonts
    // ========================================================================

    /// Register a font from a file. `None` if the file is missing or the
    /// backend rejects the data.
    pub fn add_font(&mut self, name: &str, path: &str, face_index: u32) -> Option<FontId> {
        let data = match std::fs::read(path) {
            Ok(d) => d,
            Err(e) => {
                warn!("Failed to read font file {}: {}", path, e);
                return None;
            }
        };
        self.add_font_mem(name, data, face_index)
    }

    /// Register a font from owned bytes. `None` on empty or malformed data.
    pub fn add_font_mem(&mut self, name: &str, data: Vec<u8>, face_index: u32) -> Option<FontId> {
        if data.is_empty() {
            return None;
        }
        let face = self.backend.load_face(&data, face_index)?;
        let metrics = self.backend.face_metrics(&face);
        let font = Font::new(name, data, face, metrics);
        info!(
            "Font '{}' registered (ascender {:.3}, lineh {:.3})",
            name, font.ascender, font.lineh
        );
        self.fonts.push(font);
        Some(self.fonts.len() - 1)
    }

    /// Find a registered font by its advisory name
    pub fn font_by_name(&self, name: &str) -> Option<FontId> {
        self.fonts.iter().position(|f| f.name == name)
    }

    /// Consult `fallback` when `base` lacks a codepoint. False when either
    /// id is unknown or the fallback list is full.
    pub fn add_fallback_font(&mut self, base: FontId, fallback: FontId) -> bool {
        if base >= self.fonts.len() || fallback >= self.fonts.len() {
            return false;
        }
        self.fonts[base].add_fallback(fallback)
    }

    // ========================================================================
    // Render state stack
    // ========================================================================

    fn state(&self) -> &RenderState {
        // Depth floor is 1; pop_state refuses to go below it.
        self.states.last().expect("state stack is never empty")
    }

    fn state_mut(&mut self) -> &mut RenderState {
        self.states.last_mut().expect("state stack is never empty")
    }

    /// Duplicate the current top state onto the stack
    pub fn push_state(&mut self) {
        if self.states.len() >= MAX_STATES {
            self.report(StashError::StatesOverflow);
            return;
        }
        let top = *self.state();
        self.states.push(top);
    }

    /// Discard the top state; at depth 1 this is a reported no-op
    pub fn pop_state(&mut self) {
        if self.states.len() <= 1 {
            self.report(StashError::StatesUnderflow);
            return;
        }
        self.states.pop();
    }

    /// Reset the top state to defaults in place (depth unchanged)
    pub fn clear_state(&mut self) {
        *self.state_mut() = RenderState::default();
    }

    pub fn set_size(&mut self, size: f32) {
        self.state_mut().size = size;
    }

    pub fn set_color(&mut self, color: u32) {
        self.state_mut().color = color;
    }

    pub fn set_spacing(&mut self, spacing: f32) {
        self.state_mut().spacing = spacing;
    }

    pub fn set_blur(&mut self, blur: f32) {
        self.state_mut().blur = blur;
    }

    pub fn set_align(&mut self, align: Align) {
        self.state_mut().align = align;
    }

    pub fn set_font(&mut self, font: FontId) {
        self.state_mut().font = font;
    }

    // ========================================================================
    // Glyph cache
    // ========================================================================

    fn get_glyph(
        &mut self,
        font_id: FontId,
        codepoint: u32,
        isize: i16,
        iblur: i16,
        mode: BitmapMode,
    ) -> Option<usize> {
        if isize < 2 {
            return None;
        }
        let iblur = iblur.clamp(0, MAX_BLUR);
        let pad = i32::from(iblur + GLYPH_PAD);
        let size = f32::from(isize) / 10.0;

        let mut existing = None;
        if let Some(i) = self.fonts[font_id].find_glyph(codepoint, isize, iblur) {
            let g = self.fonts[font_id].glyph(i);
            if mode == BitmapMode::Optional || (g.x0 >= 0 && g.y0 >= 0) {
                return Some(i);
            }
            // Cached for measurement only; bake the bitmap now.
            existing = Some(i);
        }

        // Resolve the glyph index, walking the fallback chain in order.
        // A miss everywhere still caches index 0 (renders blank) so the
        // probe is not repeated every frame.
        let mut render_font = font_id;
        let mut index = self.backend.glyph_index(&self.fonts[font_id].face, codepoint);
        if index == 0 {
            for &fb in self.fonts[font_id].fallbacks() {
                let fb_index = self.backend.glyph_index(&self.fonts[fb].face, codepoint);
                if fb_index != 0 {
                    index = fb_index;
                    render_font = fb;
                    break;
                }
            }
        }

        let scale = self.backend.pixel_scale(&self.fonts[render_font].face, size);
        let gm = self
            .backend
            .glyph_metrics(&self.fonts[render_font].face, index, scale);
        let gw = gm.x1 - gm.x0 + pad * 2;
        let gh = gm.y1 - gm.y0 + pad * 2;
        let bw = (gw - pad * 2) as usize;
        let bh = (gh - pad * 2) as usize;

        let (gx, gy) = if mode == BitmapMode::Required {
            if bw * bh > SCRATCH_BUF_SIZE {
                self.report(StashError::ScratchFull(bw * bh));
                return None;
            }
            match self.atlas.add_rect(gw, gh) {
                Some(pos) => pos,
                None => {
                    self.report(StashError::AtlasFull((gw * gh) as usize));
                    return None;
                }
            }
        } else {
            (-1, -1)
        };

        let gi = existing
            .unwrap_or_else(|| self.fonts[font_id].alloc_glyph(codepoint, isize, iblur));
        {
            let glyph = self.fonts[font_id].glyph_mut(gi);
            glyph.index = index;
            glyph.x0 = gx as i16;
            glyph.y0 = gy as i16;
            glyph.x1 = (gx + gw) as i16;
            glyph.y1 = (gy + gh) as i16;
            glyph.xadv = (scale * gm.advance * 10.0) as i16;
            glyph.xoff = (gm.x0 - pad) as i16;
            glyph.yoff = (gm.y0 - pad) as i16;
        }
        if mode == BitmapMode::Optional {
            return Some(gi);
        }

        // Rasterize into the scratch staging buffer, then copy the rows
        // into the atlas inside the padded cell.
        let stride = self.width as usize;
        if bw > 0 && bh > 0 {
            self.scratch[..bw * bh].fill(0);
            let ok = self.backend.render_glyph(
                &self.fonts[render_font].face,
                index,
                scale,
                scale,
                bw,
                bh,
                &mut self.scratch,
            );
            if ok {
                let dst_x = (gx + pad) as usize;
                let dst_y = (gy + pad) as usize;
                for row in 0..bh {
                    let dst = (dst_y + row) * stride + dst_x;
                    self.tex_data[dst..dst + bw].copy_from_slice(&self.scratch[row * bw..row * bw + bw]);
                }
            }
        }

        // One-pixel empty border around the cell for clean interpolation
        let base = gy as usize * stride + gx as usize;
        let (cw, ch) = (gw as usize, gh as usize);
        for y in 0..ch {
            self.tex_data[base + y * stride] = 0;
            self.tex_data[base + y * stride + cw - 1] = 0;
        }
        for x in 0..cw {
            self.tex_data[base + x] = 0;
            self.tex_data[base + (ch - 1) * stride + x] = 0;
        }

        if iblur > 0 {
            blur_region(&mut self.tex_data[base..], cw, ch, stride, iblur);
        }

        self.dirty.add(gx, gy, gx + gw, gy + gh);
        debug!(
            "Baked glyph U+{:04X} size {} blur {} at ({}, {})",
            codepoint, isize, iblur, gx, gy
        );
        Some(gi)
    }

    fn get_quad(
        &self,
        font_id: FontId,
        prev_glyph: Option<u16>,
        gi: usize,
        scale: f32,
        spacing: f32,
        x: &mut f32,
        y: &mut f32,
    ) -> Quad {
        let font = &self.fonts[font_id];
        let glyph = font.glyph(gi);

        if let Some(prev) = prev_glyph {
            let kern = self.backend.kern_advance(&font.face, prev, glyph.index) * scale;
            *x += (kern + spacing + 0.5) as i32 as f32;
        }

        // Inset the cell by one pixel on each side: the padding holds a
        // zeroed border so bilinear sampling never leaks a neighbor.
        let xoff = f32::from(glyph.xoff + 1);
        let yoff = f32::from(glyph.yoff + 1);
        let x0 = f32::from(glyph.x0 + 1);
        let y0 = f32::from(glyph.y0 + 1);
        let x1 = f32::from(glyph.x1 - 1);
        let y1 = f32::from(glyph.y1 - 1);

        // Snap to whole pixels to avoid shimmering under animation
        let mut q = Quad::default();
        match self.y_origin {
            YOrigin::TopLeft => {
                let rx = (*x + xoff).floor();
                let ry = (*y + yoff).floor();
                q.x0 = rx;
                q.y0 = ry;
                q.x1 = rx + (x1 - x0);
                q.y1 = ry + (y1 - y0);
            }
            YOrigin::BottomLeft => {
                let rx = (*x + xoff).floor();
                let ry = (*y - yoff).floor();
                q.x0 = rx;
                q.y0 = ry;
                q.x1 = rx + (x1 - x0);
                q.y1 = ry - (y1 - y0);
            }
        }
        q.s0 = x0 * self.itw;
        q.t0 = y0 * self.ith;
        q.s1 = x1 * self.itw;
        q.t1 = y1 * self.ith;

        *x += (f32::from(glyph.xadv) / 10.0 + 0.5) as i32 as f32;
        q
    }

    fn vert_align(&self, font: &Font<B::Face>, align: Align, isize: i16) -> f32 {
        let s = f32::from(isize) / 10.0;
        let up = match self.y_origin {
            YOrigin::TopLeft => 1.0,
            YOrigin::BottomLeft => -1.0,
        };
        if align.contains(Align::TOP) {
            up * font.ascender * s
        } else if align.contains(Align::MIDDLE) {
            up * (font.ascender + font.descender) / 2.0 * s
        } else if align.contains(Align::BOTTOM) {
            up * font.descender * s
        } else {
            // BASELINE (default)
            0.0
        }
    }

    // ========================================================================
    // Draw and measure
    // ========================================================================

    /// Draw `text` with the current state, batching quads and flushing to
    /// the renderer. Stops before the first `stop` codepoint if given.
    /// Returns the final pen x position.
    pub fn draw_text(&mut self, x: f32, y: f32, text: &str, stop: Option<char>) -> f32 {
        let state = *self.state();
        let isize = (state.size * 10.0) as i16;
        let iblur = state.blur as i16;
        if state.font >= self.fonts.len() {
            return x;
        }
        let stop_cp = stop.map(|c| c as u32);
        let scale = self
            .backend
            .pixel_scale(&self.fonts[state.font].face, f32::from(isize) / 10.0);

        let mut x = x;
        let mut y = y;
        // Non-left alignment needs the total advance up front, which costs
        // a full measurement walk before the emitting walk.
        if state.align.contains(Align::RIGHT) {
            let (advance, _) = self.text_bounds(x, y, text, stop);
            x -= advance;
        } else if state.align.contains(Align::CENTER) {
            let (advance, _) = self.text_bounds(x, y, text, stop);
            x -= advance * 0.5;
        }
        y += self.vert_align(&self.fonts[state.font], state.align, isize);

        let mut prev_glyph: Option<u16> = None;
        let mut dec = Utf8Decoder::new();
        for i in 0..text.len() {
            let Some(codepoint) = dec.push(text.as_bytes()[i]) else {
                continue;
            };
            if Some(codepoint) == stop_cp {
                break;
            }
            match self.get_glyph(state.font, codepoint, isize, iblur, BitmapMode::Required) {
                Some(gi) => {
                    let q = self.get_quad(
                        state.font,
                        prev_glyph,
                        gi,
                        scale,
                        state.spacing,
                        &mut x,
                        &mut y,
                    );
                    if self.batch.would_overflow(6) {
                        self.flush();
                    }
                    self.push_quad(&q, state.color);
                    prev_glyph = Some(self.fonts[state.font].glyph(gi).index);
                }
                None => {
                    // Unresolvable glyph: skip it, keep shaping the rest
                    prev_glyph = None;
                }
            }
        }
        self.flush();
        x
    }

    /// Measure `text` without baking anything into the atlas.
    /// Returns the total advance and the alignment-adjusted bounds.
    pub fn text_bounds(&mut self, x: f32, y: f32, text: &str, stop: Option<char>) -> (f32, Bounds) {
        let state = *self.state();
        let isize = (state.size * 10.0) as i16;
        let iblur = state.blur as i16;
        if state.font >= self.fonts.len() {
            return (0.0, Bounds::default());
        }
        let stop_cp = stop.map(|c| c as u32);
        let scale = self
            .backend
            .pixel_scale(&self.fonts[state.font].face, f32::from(isize) / 10.0);

        let mut x = x;
        let mut y = y + self.vert_align(&self.fonts[state.font], state.align, isize);
        let startx = x;
        let (mut minx, mut maxx) = (x, x);
        let (mut miny, mut maxy) = (y, y);

        let mut prev_glyph: Option<u16> = None;
        let mut dec = Utf8Decoder::new();
        for i in 0..text.len() {
            let Some(codepoint) = dec.push(text.as_bytes()[i]) else {
                continue;
            };
            if Some(codepoint) == stop_cp {
                break;
            }
            match self.get_glyph(state.font, codepoint, isize, iblur, BitmapMode::Optional) {
                Some(gi) => {
                    let q = self.get_quad(
                        state.font,
                        prev_glyph,
                        gi,
                        scale,
                        state.spacing,
                        &mut x,
                        &mut y,
                    );
                    minx = minx.min(q.x0);
                    maxx = maxx.max(q.x1);
                    match self.y_origin {
                        YOrigin::TopLeft => {
                            miny = miny.min(q.y0);
                            maxy = maxy.max(q.y1);
                        }
                        YOrigin::BottomLeft => {
                            miny = miny.min(q.y1);
                            maxy = maxy.max(q.y0);
                        }
                    }
                    prev_glyph = Some(self.fonts[state.font].glyph(gi).index);
                }
                None => {
                    prev_glyph = None;
                }
            }
        }

        let advance = x - startx;
        if state.align.contains(Align::RIGHT) {
            minx -= advance;
            maxx -= advance;
        } else if state.align.contains(Align::CENTER) {
            minx -= advance * 0.5;
            maxx -= advance * 0.5;
        }

        (
            advance,
            Bounds {
                xmin: minx,
                ymin: miny,
                xmax: maxx,
                ymax: maxy,
            },
        )
    }

    /// Vertical extent of a text line anchored at `y` with the current
    /// state, as (miny, maxy)
    pub fn line_bounds(&self, y: f32) -> Option<(f32, f32)> {
        let state = *self.state();
        if state.font >= self.fonts.len() {
            return None;
        }
        let isize = (state.size * 10.0) as i16;
        let font = &self.fonts[state.font];
        let y = y + self.vert_align(font, state.align, isize);
        let s = f32::from(isize) / 10.0;
        Some(match self.y_origin {
            YOrigin::TopLeft => {
                let miny = y - font.ascender * s;
                (miny, miny + font.lineh * s)
            }
            YOrigin::BottomLeft => {
                let maxy = y + font.ascender * s;
                (maxy - font.lineh * s, maxy)
            }
        })
    }

    /// Ascender, descender and line height of the active font scaled to
    /// the active size
    pub fn vert_metrics(&self) -> Option<VertMetrics> {
        let state = self.state();
        if state.font >= self.fonts.len() {
            return None;
        }
        let font = &self.fonts[state.font];
        let isize = (state.size * 10.0) as i16;
        let s = f32::from(isize) / 10.0;
        Some(VertMetrics {
            ascender: font.ascender * s,
            descender: font.descender * s,
            lineh: font.lineh * s,
        })
    }

    // ========================================================================
    // Incremental iteration
    // ========================================================================

    /// Start a per-glyph walk over `text`. The same alignment setup as
    /// [`Self::draw_text`] happens here, including the pre-measure for
    /// center/right alignment.
    pub fn text_iter<'a>(
        &mut self,
        x: f32,
        y: f32,
        text: &'a str,
        stop: Option<char>,
        mode: BitmapMode,
    ) -> Option<TextIter<'a>> {
        let state = *self.state();
        if state.font >= self.fonts.len() {
            return None;
        }
        let isize = (state.size * 10.0) as i16;
        let iblur = state.blur as i16;
        let scale = self
            .backend
            .pixel_scale(&self.fonts[state.font].face, f32::from(isize) / 10.0);

        let mut x = x;
        if state.align.contains(Align::RIGHT) {
            let (advance, _) = self.text_bounds(x, y, text, stop);
            x -= advance;
        } else if state.align.contains(Align::CENTER) {
            let (advance, _) = self.text_bounds(x, y, text, stop);
            x -= advance * 0.5;
        }
        let y = y + self.vert_align(&self.fonts[state.font], state.align, isize);

        Some(TextIter {
            codepoint: 0,
            x,
            y,
            font: state.font,
            nextx: x,
            nexty: y,
            scale,
            spacing: state.spacing,
            isize,
            iblur,
            text: text.as_bytes(),
            pos: 0,
            stop: stop.map(|c| c as u32),
            dec: Utf8Decoder::new(),
            prev_glyph: None,
            mode,
        })
    }

    /// Produce the next glyph quad, or `None` at the end of the string.
    /// Unresolvable glyphs are skipped, matching the draw path.
    pub fn text_iter_next(&mut self, iter: &mut TextIter<'_>) -> Option<Quad> {
        while iter.pos < iter.text.len() {
            let byte = iter.text[iter.pos];
            iter.pos += 1;
            let Some(codepoint) = iter.dec.push(byte) else {
                continue;
            };
            if Some(codepoint) == iter.stop {
                iter.pos = iter.text.len();
                return None;
            }
            iter.codepoint = codepoint;
            iter.x = iter.nextx;
            iter.y = iter.nexty;
            match self.get_glyph(iter.font, codepoint, iter.isize, iter.iblur, iter.mode) {
                Some(gi) => {
                    let q = self.get_quad(
                        iter.font,
                        iter.prev_glyph,
                        gi,
                        iter.scale,
                        iter.spacing,
                        &mut iter.nextx,
                        &mut iter.nexty,
                    );
                    iter.prev_glyph = Some(self.fonts[iter.font].glyph(gi).index);
                    return Some(q);
                }
                None => {
                    iter.prev_glyph = None;
                }
            }
        }
        None
    }

    // ========================================================================
    // Batch and atlas plumbing
    // ========================================================================

    fn push_quad(&mut self, q: &Quad, color: u32) {
        self.batch.push(q.x0, q.y0, q.s0, q.t0, color);
        self.batch.push(q.x1, q.y1, q.s1, q.t1, color);
        self.batch.push(q.x1, q.y0, q.s1, q.t0, color);

        self.batch.push(q.x0, q.y0, q.s0, q.t0, color);
        self.batch.push(q.x0, q.y1, q.s0, q.t1, color);
        self.batch.push(q.x1, q.y1, q.s1, q.t1, color);
    }

    /// Push pending atlas bytes and triangles to the renderer
    fn flush(&mut self) {
        if let Some(rect) = self.dirty.take() {
            self.renderer.update(rect, &self.tex_data);
        }
        if !self.batch.is_empty() {
            let (verts, tcoords, colors, nverts) = self.batch.arrays();
            self.renderer.draw(verts, tcoords, colors, nverts);
            self.batch.clear();
        }
    }

    fn add_white_rect(&mut self, w: i32, h: i32) {
        let Some((gx, gy)) = self.atlas.add_rect(w, h) else {
            return;
        };
        for y in 0..h {
            let row = ((gy + y) * self.width + gx) as usize;
            self.tex_data[row..row + w as usize].fill(0xff);
        }
        self.dirty.add(gx, gy, gx + w, gy + h);
    }

    /// Atlas dimensions in pixels
    pub fn atlas_size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    /// CPU-side atlas pixels (single channel coverage) and dimensions
    pub fn texture_data(&self) -> (&[u8], i32, i32) {
        (&self.tex_data, self.width, self.height)
    }

    /// Pull the dirty rectangle `[x0, y0, x1, y1]` accumulated since the
    /// last pull, resetting it. `None` when nothing changed.
    pub fn validate_texture(&mut self) -> Option<[i32; 4]> {
        self.dirty.take()
    }

    /// Grow the atlas to at least `width` x `height`, preserving every
    /// existing allocation and its pixels. False if the renderer refuses
    /// the resize.
    pub fn expand_atlas(&mut self, width: i32, height: i32) -> bool {
        let width = width.max(self.width);
        let height = height.max(self.height);
        if width == self.width && height == self.height {
            return true;
        }
        self.flush();
        if !self.renderer.resize(width, height) {
            return false;
        }

        // Copy old rows into the wider buffer; new columns and rows are zero
        let mut data = vec![0u8; (width * height) as usize];
        let old_w = self.width as usize;
        for y in 0..self.height as usize {
            let dst = y * width as usize;
            let src = y * old_w;
            data[dst..dst + old_w].copy_from_slice(&self.tex_data[src..src + old_w]);
        }
        self.tex_data = data;

        self.atlas.expand(width, height);

        // Everything already baked must be re-uploaded by the renderer
        let maxy = self.atlas.max_height();
        self.dirty.reset(width, height);
        self.dirty.add(0, 0, self.width, maxy);

        self.width = width;
        self.height = height;
        self.itw = 1.0 / width as f32;
        self.ith = 1.0 / height as f32;
        true
    }

    /// Reset the atlas to exactly `width` x `height`: clears packing state,
    /// pixels and every font's glyph cache. Font metrics and fallback
    /// lists survive; the white rect is re-baked at its fixed position.
    pub fn reset_atlas(&mut self, width: i32, height: i32) -> bool {
        self.flush();
        if !self.renderer.resize(width, height) {
            return false;
        }

        self.atlas.reset(width, height);
        self.tex_data = vec![0; (width * height) as usize];
        self.dirty.reset(width, height);
        for font in &mut self.fonts {
            font.clear_glyphs();
        }

        self.width = width;
        self.height = height;
        self.itw = 1.0 / width as f32;
        self.ith = 1.0 / height as f32;

        self.add_white_rect(WHITE_RECT_SIZE, WHITE_RECT_SIZE);
        info!("Atlas reset to {}x{}", width, height);
        true
    }

    /// Visualize the atlas: a faint background quad, the full texture and
    /// one bar per skyline node, drawn at `(x, y)`
    pub fn draw_debug(&mut self, x: f32, y: f32) {
        let w = self.width as f32;
        let h = self.height as f32;
        let u = if self.width == 0 { 0.0 } else { 1.0 / w };
        let v = if self.height == 0 { 0.0 } else { 1.0 / h };

        if self.batch.would_overflow(12) {
            self.flush();
        }

        // Background fill via the white calibration texel
        self.push_quad(
            &Quad {
                x0: x,
                y0: y,
                s0: u,
                t0: v,
                x1: x + w,
                y1: y + h,
                s1: u,
                t1: v,
            },
            0x0fff_ffff,
        );

        // The atlas texture itself
        self.push_quad(
            &Quad {
                x0: x,
                y0: y,
                s0: 0.0,
                t0: 0.0,
                x1: x + w,
                y1: y + h,
                s1: 1.0,
                t1: 1.0,
            },
            0xffff_ffff,
        );

        // One bar per skyline node
        let nodes: Vec<_> = self.atlas.nodes().to_vec();
        for n in nodes {
            if self.batch.would_overflow(6) {
                self.flush();
            }
            self.push_quad(
                &Quad {
                    x0: x + f32::from(n.x),
                    y0: y + f32::from(n.y),
                    s0: u,
                    t0: v,
                    x1: x + f32::from(n.x) + f32::from(n.width),
                    y1: y + f32::from(n.y) + 1.0,
                    s1: u,
                    t1: v,
                },
                0xc000_00ff,
            );
        }

        self.flush();
    }
}

impl<B: FontBackend, R: TextRenderer> Drop for TextEngine<B, R> {
    fn drop(&mut self) {
        self.renderer.delete();
    }
}
