//! Pure image helpers for the composited photo path: random tint and caption
//! overlay. Consumed by the writer as black boxes that take an image and
//! return a transformed one; nothing here touches the library or the index.

pub mod font;

use image::{DynamicImage, ImageError, Rgba, RgbaImage};
use rand::Rng as _;

/// Caption text heights as fractions of the image width, with an overall
/// 0.8 shrink.
const LARGE_FONT_FRACTION: f64 = 0.16761649346 * 0.8;
const SMALL_FONT_FRACTION: f64 = 0.05095541401 * 0.8;

/// Random opaque RGB color.
pub fn random_color() -> [u8; 3] {
    let mut rng = rand::thread_rng();
    [rng.gen(), rng.gen(), rng.gen()]
}

/// Tint with a random color at 50% alpha. See [`tinted`].
pub fn random_tint(image: &DynamicImage) -> RgbaImage {
    tinted(image, random_color())
}

/// Source-atop tint: the color layer at 50% alpha is composited onto the
/// image, clipped to the image's own coverage. Fully transparent pixels stay
/// untouched; everywhere else the result is an even blend of tint and source,
/// keeping the source's alpha.
pub fn tinted(image: &DynamicImage, tint: [u8; 3]) -> RgbaImage {
    let mut out = image.to_rgba8();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        if a == 0 {
            continue;
        }
        *pixel = Rgba([
            ((tint[0] as u16 + r as u16) / 2) as u8,
            ((tint[1] as u16 + g as u16) / 2) as u8,
            ((tint[2] as u16 + b as u16) / 2) as u8,
            a,
        ]);
    }
    out
}

/// Overlay a two-line caption: `large_line` big, `small_line` beneath it,
/// white text centered over a half-alpha black panel spanning the lower half
/// of the image.
pub fn with_caption(image: &DynamicImage, large_line: &str, small_line: &str) -> RgbaImage {
    let mut out = image.to_rgba8();
    let (width, height) = out.dimensions();
    let panel_top = height / 2;

    for y in panel_top..height {
        for x in 0..width {
            let Rgba([r, g, b, a]) = *out.get_pixel(x, y);
            out.put_pixel(x, y, Rgba([r / 2, g / 2, b / 2, a]));
        }
    }

    let large_scale = scale_for(width, LARGE_FONT_FRACTION);
    let small_scale = scale_for(width, SMALL_FONT_FRACTION);
    let line_gap = 3 * small_scale;

    let large_h = font::GLYPH_HEIGHT * large_scale;
    let small_h = font::GLYPH_HEIGHT * small_scale;
    let block_h = large_h + line_gap + small_h;

    // Center the two-line block vertically inside the panel.
    let panel_h = height - panel_top;
    let block_top = panel_top + panel_h.saturating_sub(block_h) / 2;

    draw_line(&mut out, large_line, large_scale, block_top);
    draw_line(&mut out, small_line, small_scale, block_top + large_h + line_gap);
    out
}

/// Encode as JPEG (quality 90). Alpha is flattened since JPEG has none.
pub fn encode_jpeg(image: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 90);
    rgb.write_with_encoder(encoder)?;
    Ok(bytes)
}

/// Integer glyph scale approximating `width * fraction` pixels of text height.
fn scale_for(width: u32, fraction: f64) -> u32 {
    let target = (width as f64 * fraction / font::GLYPH_HEIGHT as f64).round() as u32;
    target.max(1)
}

/// Draw one horizontally centered line of white text.
fn draw_line(out: &mut RgbaImage, text: &str, scale: u32, top: u32) {
    let (width, height) = out.dimensions();
    let line_w = font::text_width(text, scale);
    let left = width.saturating_sub(line_w) / 2;

    let mut pen_x = left;
    for c in text.chars() {
        let rows = font::glyph(c);
        for (gy, row) in rows.iter().enumerate() {
            for gx in 0..font::GLYPH_WIDTH {
                if row & (0x10 >> gx) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = pen_x + gx * scale + dx;
                        let y = top + gy as u32 * scale + dy;
                        if x < width && y < height {
                            out.put_pixel(x, y, Rgba([255, 255, 255, 255]));
                        }
                    }
                }
            }
        }
        pen_x += font::GLYPH_ADVANCE * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> DynamicImage {
        let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
        DynamicImage::ImageRgba8(img)
    }

    #[test]
    fn tint_blends_evenly_over_opaque_pixels() {
        let image = solid(4, 4, [200, 100, 0, 255]);
        let tinted = tinted(&image, [0, 100, 200]);
        assert_eq!(*tinted.get_pixel(0, 0), Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn tint_leaves_transparent_pixels_alone() {
        let image = solid(4, 4, [0, 0, 0, 0]);
        let tinted = tinted(&image, [255, 255, 255]);
        assert_eq!(*tinted.get_pixel(2, 2), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn tint_preserves_source_alpha() {
        let image = solid(4, 4, [10, 10, 10, 128]);
        let tinted = tinted(&image, [10, 10, 10]);
        assert_eq!(tinted.get_pixel(1, 1).0[3], 128);
    }

    #[test]
    fn caption_darkens_lower_half_only() {
        let image = solid(100, 100, [200, 200, 200, 255]);
        let captioned = with_caption(&image, "", "");
        assert_eq!(*captioned.get_pixel(0, 0), Rgba([200, 200, 200, 255]));
        assert_eq!(*captioned.get_pixel(0, 99), Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn caption_draws_white_pixels_in_lower_half() {
        let image = solid(200, 200, [0, 0, 0, 255]);
        let captioned = with_caption(&image, "[abcde]", "2024-04-28_13:45:12_123");
        let white = captioned
            .enumerate_pixels()
            .filter(|(_, y, p)| *y >= 100 && p.0 == [255, 255, 255, 255])
            .count();
        assert!(white > 0, "expected rendered caption pixels");
        let white_upper = captioned
            .enumerate_pixels()
            .filter(|(_, y, p)| *y < 100 && p.0 == [255, 255, 255, 255])
            .count();
        assert_eq!(white_upper, 0);
    }

    #[test]
    fn jpeg_encoding_yields_decodable_bytes() {
        let image = solid(32, 32, [10, 200, 30, 255]).to_rgba8();
        let bytes = encode_jpeg(&image).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 32);
    }
}
