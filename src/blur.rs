//! Glyph blur
//!
//! Fixed-point exponential box blur applied in place to a baked glyph's
//! atlas region. Two horizontal and two vertical passes approximate a
//! gaussian; the region's border is forced to zero so blurred glyphs stay
//! inside their padded cells.

/// Accumulator precision bits
const APREC: i32 = 16;
/// Pixel precision bits
const ZPREC: i32 = 7;

/// Blur a `w` x `h` region of `dst` (row stride `stride`) by `blur` pixels
pub fn blur_region(dst: &mut [u8], w: usize, h: usize, stride: usize, blur: i16) {
    if blur < 1 {
        return;
    }
    // Alpha chosen so ~90% of the kernel falls within the radius
    let sigma = f32::from(blur) * 0.57735; // 1 / sqrt(3)
    let alpha = ((1 << APREC) as f32 * (1.0 - (-2.3 / (sigma + 1.0)).exp())) as i32;
    blur_rows(dst, w, h, stride, alpha);
    blur_cols(dst, w, h, stride, alpha);
    blur_rows(dst, w, h, stride, alpha);
    blur_cols(dst, w, h, stride, alpha);
}

fn blur_cols(dst: &mut [u8], w: usize, h: usize, stride: usize, alpha: i32) {
    for y in 0..h {
        let row = &mut dst[y * stride..y * stride + w];
        let mut z = 0i32;
        for x in 1..w {
            z += (alpha * ((i32::from(row[x]) << ZPREC) - z)) >> APREC;
            row[x] = (z >> ZPREC) as u8;
        }
        row[w - 1] = 0; // force zero border
        z = 0;
        for x in (0..w - 1).rev() {
            z += (alpha * ((i32::from(row[x]) << ZPREC) - z)) >> APREC;
            row[x] = (z >> ZPREC) as u8;
        }
        row[0] = 0; // force zero border
    }
}

fn blur_rows(dst: &mut [u8], w: usize, h: usize, stride: usize, alpha: i32) {
    for x in 0..w {
        let mut z = 0i32;
        for y in 1..h {
            let i = y * stride + x;
            z += (alpha * ((i32::from(dst[i]) << ZPREC) - z)) >> APREC;
            dst[i] = (z >> ZPREC) as u8;
        }
        dst[(h - 1) * stride + x] = 0; // force zero border
        z = 0;
        for y in (0..h - 1).rev() {
            let i = y * stride + x;
            z += (alpha * ((i32::from(dst[i]) << ZPREC) - z)) >> APREC;
            dst[i] = (z >> ZPREC) as u8;
        }
        dst[x] = 0; // force zero border
    }
}
