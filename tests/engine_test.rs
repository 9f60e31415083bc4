//! Engine integration tests over a deterministic mock font backend and a
//! recording renderer, so baking, caching, batching and error reporting
//! can be observed without real font files or a GPU.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glyphbatch::{
    Align, BitmapMode, FaceMetrics, FontBackend, GlyphMetrics, StashError, TextEngine,
    TextRenderer, YOrigin,
};

/// Face covering codepoints 32..=max_cp. Every covered glyph is a 10x10
/// box on the baseline with a 600 font-unit advance (12 px at size 20,
/// upem 1000); glyph 0 is empty with zero advance.
struct MockFace {
    max_cp: u32,
}

struct MockBackend {
    kern: f32,
    rendered: Rc<Cell<usize>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            kern: 0.0,
            rendered: Rc::new(Cell::new(0)),
        }
    }

    fn with_kern(kern: f32) -> Self {
        Self {
            kern,
            rendered: Rc::new(Cell::new(0)),
        }
    }

    fn render_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.rendered)
    }
}

impl FontBackend for MockBackend {
    type Face = MockFace;

    fn load_face(&self, data: &[u8], _face_index: u32) -> Option<MockFace> {
        // First byte selects coverage: 0xFF is the full-range face,
        // anything else covers ASCII only
        Some(MockFace {
            max_cp: if data[0] == 0xFF { 0x10FFFF } else { 127 },
        })
    }

    fn face_metrics(&self, _face: &MockFace) -> FaceMetrics {
        FaceMetrics {
            ascent: 800.0,
            descent: -200.0,
            line_gap: 0.0,
        }
    }

    fn pixel_scale(&self, _face: &MockFace, size: f32) -> f32 {
        size / 1000.0
    }

    fn glyph_index(&self, face: &MockFace, codepoint: u32) -> u16 {
        if (32..=face.max_cp).contains(&codepoint) {
            codepoint as u16
        } else {
            0
        }
    }

    fn glyph_metrics(&self, _face: &MockFace, glyph: u16, _scale: f32) -> GlyphMetrics {
        if glyph == 0 {
            return GlyphMetrics {
                advance: 0.0,
                lsb: 0.0,
                x0: 0,
                y0: 0,
                x1: 0,
                y1: 0,
            };
        }
        GlyphMetrics {
            advance: 600.0,
            lsb: 50.0,
            x0: 0,
            y0: -10,
            x1: 10,
            y1: 0,
        }
    }

    fn render_glyph(
        &self,
        _face: &MockFace,
        _glyph: u16,
        _scale_x: f32,
        _scale_y: f32,
        width: usize,
        height: usize,
        out: &mut [u8],
    ) -> bool {
        self.rendered.set(self.rendered.get() + 1);
        out[..width * height].fill(0xff);
        true
    }

    fn kern_advance(&self, _face: &MockFace, left: u16, right: u16) -> f32 {
        if left != 0 && right != 0 {
            self.kern
        } else {
            0.0
        }
    }
}

#[derive(Default)]
struct RecordingRenderer {
    created: Option<(i32, i32)>,
    resizes: Vec<(i32, i32)>,
    updates: Vec<[i32; 4]>,
    draws: Vec<usize>,
    deleted: bool,
}

impl TextRenderer for RecordingRenderer {
    fn create(&mut self, width: i32, height: i32) -> bool {
        self.created = Some((width, height));
        true
    }

    fn resize(&mut self, width: i32, height: i32) -> bool {
        self.resizes.push((width, height));
        true
    }

    fn update(&mut self, rect: [i32; 4], _data: &[u8]) {
        self.updates.push(rect);
    }

    fn draw(&mut self, _verts: &[f32], _tcoords: &[f32], _colors: &[u32], nverts: usize) {
        self.draws.push(nverts);
    }

    fn delete(&mut self) {
        self.deleted = true;
    }
}

type Engine = TextEngine<MockBackend, RecordingRenderer>;

fn engine(width: i32, height: i32) -> (Engine, Rc<Cell<usize>>) {
    engine_with(MockBackend::new(), width, height)
}

fn engine_with(backend: MockBackend, width: i32, height: i32) -> (Engine, Rc<Cell<usize>>) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
    let rendered = backend.render_counter();
    let mut e = TextEngine::new(
        backend,
        RecordingRenderer::default(),
        width,
        height,
        YOrigin::TopLeft,
    )
    .unwrap();
    let font = e.add_font_mem("mock", vec![1, 0, 0, 0], 0).unwrap();
    e.set_font(font);
    e.set_size(20.0);
    (e, rendered)
}

fn collect_errors(engine: &mut Engine) -> Rc<RefCell<Vec<StashError>>> {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    engine.set_error_callback(move |e| sink.borrow_mut().push(e));
    errors
}

#[test]
fn test_white_rect_baked_on_creation() {
    let (mut engine, _) = engine(64, 64);
    let (data, w, _) = engine.texture_data();
    assert_eq!(data[0], 0xff);
    assert_eq!(data[1], 0xff);
    assert_eq!(data[w as usize], 0xff);
    assert_eq!(data[w as usize + 1], 0xff);

    assert_eq!(engine.renderer().created, Some((64, 64)));
    // The white rect is pending upload until the first pull
    let rect = engine.validate_texture().unwrap();
    assert!(rect[0] <= 0 && rect[1] <= 0 && rect[2] >= 2 && rect[3] >= 2);
    assert_eq!(engine.validate_texture(), None);
}

#[test]
fn test_glyphs_baked_once_and_cached() {
    let (mut engine, rendered) = engine(256, 256);

    engine.draw_text(10.0, 50.0, "AB", None);
    assert_eq!(rendered.get(), 2);
    assert_eq!(engine.renderer().draws, vec![12]);
    // Bake plus the initial white rect arrive as one dirty upload
    assert_eq!(engine.renderer().updates.len(), 1);

    engine.draw_text(10.0, 80.0, "AB", None);
    assert_eq!(rendered.get(), 2, "second draw must hit the cache");
    assert_eq!(engine.renderer().draws, vec![12, 12]);
    // Nothing new was baked, so no further texture upload
    assert_eq!(engine.renderer().updates.len(), 1);
}

#[test]
fn test_pen_advance_with_kerning_and_spacing() {
    // 600 units at scale 0.02 is 12 px per glyph; kern 50 units is 1 px,
    // plus 2.5 spacing, truncated: (1.0 + 2.5 + 0.5) as int = 4
    let (mut engine, _) = engine_with(MockBackend::with_kern(50.0), 256, 256);
    engine.set_spacing(2.5);
    let end = engine.draw_text(100.0, 50.0, "AB", None);
    assert_eq!(end, 128.0);

    let (advance, _) = engine.text_bounds(100.0, 50.0, "AB", None);
    assert_eq!(advance, 28.0);
}

#[test]
fn test_atlas_full_reported_and_draw_continues() {
    // 16x16 atlas: the white rect plus one 14x14 glyph cell fill it
    let (mut engine, rendered) = engine(16, 16);
    let errors = collect_errors(&mut engine);

    let end = engine.draw_text(0.0, 10.0, "AB", None);
    assert_eq!(rendered.get(), 1, "only the first glyph fits");
    assert_eq!(
        errors.borrow().as_slice(),
        &[StashError::AtlasFull(14 * 14)]
    );
    // The failed glyph is skipped without advancing the pen
    assert_eq!(end, 12.0);
    assert_eq!(engine.renderer().draws, vec![6]);
}

#[test]
fn test_expand_atlas_preserves_pixels() {
    let (mut engine, rendered) = engine(64, 64);
    engine.draw_text(10.0, 50.0, "A", None);

    let before: Vec<u8> = engine.texture_data().0.to_vec();
    assert!(engine.expand_atlas(128, 64));
    assert_eq!(engine.renderer().resizes, vec![(128, 64)]);

    let (after, w, h) = engine.texture_data();
    assert_eq!((w, h), (128, 64));
    for y in 0..64usize {
        assert_eq!(&after[y * 128..y * 128 + 64], &before[y * 64..y * 64 + 64]);
    }

    // Old content must be re-uploaded
    let rect = engine.validate_texture().unwrap();
    assert_eq!(rect[0], 0);
    assert_eq!(rect[1], 0);
    assert_eq!(rect[2], 64);
    assert!(rect[3] >= 14);

    // Cached glyphs stay valid, no re-bake after the expand
    engine.draw_text(10.0, 50.0, "A", None);
    assert_eq!(rendered.get(), 1);
}

#[test]
fn test_expand_never_shrinks() {
    let (mut engine, _) = engine(64, 64);
    assert!(engine.expand_atlas(32, 32));
    assert_eq!(engine.atlas_size(), (64, 64));
    assert!(engine.renderer().resizes.is_empty());
}

#[test]
fn test_reset_atlas_clears_cache_keeps_fonts() {
    let (mut engine, rendered) = engine(64, 64);
    engine.draw_text(10.0, 50.0, "A", None);
    assert_eq!(rendered.get(), 1);

    assert!(engine.reset_atlas(64, 64));

    // White rect is re-baked at the origin of the cleared texture
    let (data, w, _) = engine.texture_data();
    assert_eq!(data[0], 0xff);
    assert_eq!(data[w as usize + 1], 0xff);

    // Font registration and metrics survive the reset
    let vm = engine.vert_metrics().unwrap();
    assert_eq!(vm.ascender, 16.0);
    assert_eq!(vm.descender, -4.0);
    assert_eq!(vm.lineh, 20.0);

    // The glyph cache does not: drawing re-bakes
    engine.draw_text(10.0, 50.0, "A", None);
    assert_eq!(rendered.get(), 2);
}

#[test]
fn test_state_stack_depth_limits() {
    let (mut engine, _) = engine(64, 64);
    let errors = collect_errors(&mut engine);

    // Depth floor: popping the last state is a reported no-op
    engine.pop_state();
    assert_eq!(errors.borrow().as_slice(), &[StashError::StatesUnderflow]);
    assert!(engine.vert_metrics().is_some());

    // Fill to the cap, then one more
    for _ in 0..19 {
        engine.push_state();
    }
    assert_eq!(errors.borrow().len(), 1);
    engine.push_state();
    assert_eq!(errors.borrow().last(), Some(&StashError::StatesOverflow));
}

#[test]
fn test_state_push_copies_and_clear_keeps_depth() {
    let (mut engine, _) = engine(64, 64);
    engine.set_size(30.0);

    engine.push_state();
    // ascender fraction is 0.8, so size 30 reads back as 24
    assert_eq!(engine.vert_metrics().unwrap().ascender, 24.0);

    engine.clear_state();
    assert_eq!(engine.vert_metrics().unwrap().ascender, 9.6);

    engine.pop_state();
    assert_eq!(engine.vert_metrics().unwrap().ascender, 24.0);
}

#[test]
fn test_center_alignment_shifts_half_advance() {
    let (mut engine, _) = engine(256, 256);

    let (advance, left) = engine.text_bounds(100.0, 50.0, "AB", None);
    engine.set_align(Align::CENTER | Align::BASELINE);
    let (advance_c, center) = engine.text_bounds(100.0, 50.0, "AB", None);
    engine.set_align(Align::RIGHT | Align::BASELINE);
    let (advance_r, right) = engine.text_bounds(100.0, 50.0, "AB", None);

    assert_eq!(advance, advance_c);
    assert_eq!(advance, advance_r);
    assert_eq!(center.xmin, left.xmin - advance * 0.5);
    assert_eq!(center.xmax, left.xmax - advance * 0.5);
    assert_eq!(right.xmin, left.xmin - advance);
}

#[test]
fn test_measurement_does_not_touch_atlas() {
    let (mut engine, rendered) = engine(256, 256);
    engine.validate_texture(); // drain the white-rect dirty rect

    let (advance, bounds) = engine.text_bounds(0.0, 50.0, "AB", None);
    assert_eq!(advance, 24.0);
    assert!(bounds.xmax > bounds.xmin);
    assert_eq!(rendered.get(), 0);
    assert_eq!(engine.validate_texture(), None);

    // The measured entries are reused by the draw, which then bakes
    engine.draw_text(0.0, 50.0, "AB", None);
    assert_eq!(rendered.get(), 2);
    assert!(engine.renderer().updates.len() == 1);
}

#[test]
fn test_fallback_font_resolves_missing_glyphs() {
    let (mut engine, rendered) = engine(256, 256);
    let wide = engine.add_font_mem("wide", vec![0xFF, 0, 0, 0], 0).unwrap();

    // ASCII-only face: e-acute maps to the empty glyph, zero advance
    let end = engine.draw_text(10.0, 50.0, "\u{e9}", None);
    assert_eq!(end, 10.0);
    assert_eq!(rendered.get(), 0);

    let base = engine.font_by_name("mock").unwrap();
    assert!(engine.add_fallback_font(base, wide));

    // New size gives a fresh cache key, now resolved via the fallback.
    // 600 units at scale 0.021 is 12.6 px, advanced as trunc(12.6 + 0.5)
    engine.set_size(21.0);
    let end = engine.draw_text(10.0, 50.0, "\u{e9}", None);
    assert_eq!(end, 23.0);
    assert_eq!(rendered.get(), 1);
}

#[test]
fn test_stop_char_terminates_walk() {
    let (mut engine, _) = engine(256, 256);
    let (advance_full, _) = engine.text_bounds(0.0, 0.0, "AB", None);
    let (advance_cut, _) = engine.text_bounds(0.0, 0.0, "AB|CD", Some('|'));
    assert_eq!(advance_full, advance_cut);

    let end = engine.draw_text(0.0, 0.0, "AB|CD", Some('|'));
    assert_eq!(end, advance_full);
}

#[test]
fn test_line_bounds_and_metrics() {
    let (mut engine, _) = engine(64, 64);

    // Size 20 with ascent/descent fractions 0.8 / -0.2
    let vm = engine.vert_metrics().unwrap();
    assert_eq!(vm.ascender, 16.0);
    assert_eq!(vm.descender, -4.0);
    assert_eq!(vm.lineh, 20.0);

    // Baseline at y=100, top-left origin: the line spans one lineh
    let (miny, maxy) = engine.line_bounds(100.0).unwrap();
    assert_eq!(miny, 100.0 - 16.0);
    assert_eq!(maxy, miny + 20.0);

    engine.set_align(Align::LEFT | Align::TOP);
    let (miny, maxy) = engine.line_bounds(100.0).unwrap();
    assert_eq!(miny, 100.0);
    assert_eq!(maxy, 120.0);
}

#[test]
fn test_text_iter_matches_draw_positions() {
    let (mut engine, _) = engine(256, 256);

    let mut quads = Vec::new();
    let mut iter = engine
        .text_iter(10.0, 50.0, "AB", None, BitmapMode::Required)
        .unwrap();
    while let Some(q) = engine.text_iter_next(&mut iter) {
        quads.push((iter.codepoint, q));
    }
    assert_eq!(quads.len(), 2);
    assert_eq!(quads[0].0, 'A' as u32);
    assert_eq!(quads[1].0, 'B' as u32);
    // Second glyph sits one advance (12 px) right of the first
    assert_eq!(quads[1].1.x0 - quads[0].1.x0, 12.0);
    // Top-left origin: quads grow downward from above the baseline
    assert!(quads[0].1.y1 > quads[0].1.y0);

    // UVs address a non-empty atlas region
    assert!(quads[0].1.s1 > quads[0].1.s0);
    assert!(quads[0].1.t1 > quads[0].1.t0);
}

#[test]
fn test_blur_variants_are_distinct_cache_entries() {
    let (mut engine, rendered) = engine(256, 256);
    engine.draw_text(10.0, 50.0, "A", None);
    assert_eq!(rendered.get(), 1);

    engine.set_blur(4.0);
    engine.draw_text(10.0, 50.0, "A", None);
    assert_eq!(rendered.get(), 2, "blurred variant is baked separately");

    engine.set_blur(0.0);
    engine.draw_text(10.0, 50.0, "A", None);
    assert_eq!(rendered.get(), 2, "sharp variant is still cached");
}

#[test]
fn test_renderer_deleted_on_drop() {
    // Drop paths are observable through a leaked flag
    let flag = Rc::new(Cell::new(false));

    struct DropRenderer(Rc<Cell<bool>>);
    impl TextRenderer for DropRenderer {
        fn create(&mut self, _w: i32, _h: i32) -> bool {
            true
        }
        fn resize(&mut self, _w: i32, _h: i32) -> bool {
            true
        }
        fn update(&mut self, _rect: [i32; 4], _data: &[u8]) {}
        fn draw(&mut self, _v: &[f32], _t: &[f32], _c: &[u32], _n: usize) {}
        fn delete(&mut self) {
            self.0.set(true);
        }
    }

    let engine = TextEngine::new(
        MockBackend::new(),
        DropRenderer(Rc::clone(&flag)),
        64,
        64,
        YOrigin::TopLeft,
    )
    .unwrap();
    drop(engine);
    assert!(flag.get());
}
