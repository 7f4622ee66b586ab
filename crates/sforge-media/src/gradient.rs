//! In-process segment images.
//!
//! Each segment gets a two-stop gradient whose hue and direction are a pure
//! function of `(style, index)`, with a `n/total` badge drawn from a built-in
//! 5x7 bitmap font so no font files or external tools are needed.

use image::{Rgb, RgbImage};
use std::path::Path;

use sforge_models::Style;

use crate::error::MediaResult;

/// Glyph grid size.
const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;
/// Pixels per glyph cell.
const GLYPH_SCALE: u32 = 16;
/// Horizontal gap between glyphs, in cells.
const GLYPH_GAP: u32 = 1;
/// Badge padding in pixels.
const BADGE_PADDING: u32 = 28;
/// Badge backdrop darkening (0 = none, 1 = black).
const BADGE_SHADE: f32 = 0.55;

/// Successive segments are rotated by the golden angle so neighbours never share a hue.
const GOLDEN_ANGLE_DEG: f32 = 137.508;

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

impl Rgb8 {
    fn lerp(self, other: Rgb8, t: f32) -> Rgb8 {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb8(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }

    fn to_pixel(self) -> Rgb<u8> {
        Rgb([self.0, self.1, self.2])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    Vertical,
    Horizontal,
    Diagonal,
}

/// Everything needed to draw one segment image.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientSpec {
    pub from: Rgb8,
    pub to: Rgb8,
    pub direction: GradientDirection,
    pub caption: String,
}

impl GradientSpec {
    /// Deterministic spec for segment `index` of `total`.
    pub fn for_segment(style: Style, index: usize, total: usize) -> Self {
        let hue = base_hue(style) + GOLDEN_ANGLE_DEG * index as f32;
        let direction = match index % 3 {
            0 => GradientDirection::Vertical,
            1 => GradientDirection::Diagonal,
            _ => GradientDirection::Horizontal,
        };

        Self {
            from: hsv_to_rgb(hue, 0.65, 0.95),
            to: hsv_to_rgb(hue + 40.0, 0.85, 0.30),
            direction,
            caption: segment_caption(index, total),
        }
    }
}

/// Caption drawn on segment `index` of `total`.
pub fn segment_caption(index: usize, total: usize) -> String {
    format!("{}/{}", index + 1, total.max(1))
}

fn base_hue(style: Style) -> f32 {
    match style {
        Style::Viral => 330.0,
        Style::Educational => 205.0,
        Style::Story => 30.0,
    }
}

/// HSV (degrees, 0-1, 0-1) to RGB.
fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> Rgb8 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = value * saturation;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = value - c;

    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb8(to_u8(r), to_u8(g), to_u8(b))
}

/// Render the gradient with its caption badge.
pub fn render_gradient(spec: &GradientSpec, width: u32, height: u32) -> RgbImage {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;

    let mut img = RgbImage::from_fn(width, height, |x, y| {
        let t = match spec.direction {
            GradientDirection::Vertical => y as f32 / h,
            GradientDirection::Horizontal => x as f32 / w,
            GradientDirection::Diagonal => (x as f32 / w + y as f32 / h) / 2.0,
        };
        spec.from.lerp(spec.to, t.clamp(0.0, 1.0)).to_pixel()
    });

    draw_caption(&mut img, &spec.caption);
    img
}

/// Color used when a segment falls back to a plain placeholder.
pub fn placeholder_color(index: usize) -> Rgb8 {
    const PALETTE: [Rgb8; 4] = [
        Rgb8(40, 44, 52),
        Rgb8(52, 40, 60),
        Rgb8(36, 54, 58),
        Rgb8(58, 48, 36),
    ];
    PALETTE[index % PALETTE.len()]
}

/// Render a solid placeholder.
pub fn render_placeholder(color: Rgb8, width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, color.to_pixel())
}

/// Render and save a gradient segment as PNG.
pub fn write_gradient(spec: &GradientSpec, width: u32, height: u32, path: &Path) -> MediaResult<()> {
    render_gradient(spec, width, height).save(path)?;
    Ok(())
}

/// Render and save a solid placeholder as PNG.
pub fn write_placeholder(index: usize, width: u32, height: u32, path: &Path) -> MediaResult<()> {
    render_placeholder(placeholder_color(index), width, height).save(path)?;
    Ok(())
}

/// Draw `caption` centered in the lower fifth of the image over a shaded box.
/// Characters without a glyph are skipped.
pub fn draw_caption(img: &mut RgbImage, caption: &str) {
    let glyphs: Vec<&[u8; GLYPH_ROWS as usize]> = caption.chars().filter_map(glyph).collect();
    if glyphs.is_empty() {
        return;
    }

    let count = glyphs.len() as u32;
    let text_w = (count * GLYPH_COLS + (count - 1) * GLYPH_GAP) * GLYPH_SCALE;
    let text_h = GLYPH_ROWS * GLYPH_SCALE;
    let box_w = text_w + BADGE_PADDING * 2;
    let box_h = text_h + BADGE_PADDING * 2;

    if box_w > img.width() || box_h > img.height() {
        return;
    }

    let box_x = (img.width() - box_w) / 2;
    let box_y = (img.height() * 4 / 5).min(img.height() - box_h);

    for y in box_y..box_y + box_h {
        for x in box_x..box_x + box_w {
            let px = img.get_pixel_mut(x, y);
            for channel in px.0.iter_mut() {
                *channel = (*channel as f32 * (1.0 - BADGE_SHADE)) as u8;
            }
        }
    }

    let white = Rgb([255, 255, 255]);
    let origin_x = box_x + BADGE_PADDING;
    let origin_y = box_y + BADGE_PADDING;

    for (i, rows) in glyphs.iter().enumerate() {
        let glyph_x = origin_x + i as u32 * (GLYPH_COLS + GLYPH_GAP) * GLYPH_SCALE;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (1 << (GLYPH_COLS - 1 - col)) == 0 {
                    continue;
                }
                let cell_x = glyph_x + col * GLYPH_SCALE;
                let cell_y = origin_y + row as u32 * GLYPH_SCALE;
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        img.put_pixel(cell_x + dx, cell_y + dy, white);
                    }
                }
            }
        }
    }
}

fn glyph(c: char) -> Option<&'static [u8; GLYPH_ROWS as usize]> {
    const DIGITS: [[u8; 7]; 10] = [
        [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
    ];
    const SLASH: [u8; 7] = [0b00001, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b10000];

    match c {
        '0'..='9' => Some(&DIGITS[c as usize - '0' as usize]),
        '/' => Some(&SLASH),
        _ => None,
    }
}
