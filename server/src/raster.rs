//! Flat-color rasterization of stroke batches.
//!
//! DESIGN
//! ======
//! The generative endpoints forward a raster of the current canvas to the
//! model. Strokes are painted as round-capped polylines onto a white
//! background by stamping filled discs along each segment — matching the
//! flat, anti-aliasing-free look the model prompt assumes. Only the five
//! prompt-permitted palette colors plus hex values are recognized; unknown
//! colors fall back to black.

use image::codecs::png::PngEncoder;
use image::{Rgba, RgbaImage};
use sketch::{Point, Stroke};

pub const DEFAULT_CANVAS_WIDTH: u32 = 1280;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 720;

/// Upper bound on either canvas dimension; requests past this are invalid.
pub const MAX_CANVAS_DIM: u32 = 4096;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("canvas dimensions out of range: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

// =============================================================================
// RENDERING
// =============================================================================

/// Render strokes onto a white canvas and encode as PNG.
///
/// # Errors
///
/// Rejects zero or oversized dimensions; propagates encoder failures.
pub fn render_png(strokes: &[Stroke], width: u32, height: u32) -> Result<Vec<u8>, RasterError> {
    if width == 0 || height == 0 || width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(RasterError::InvalidDimensions { width, height });
    }

    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
    for stroke in strokes {
        let color = parse_color(&stroke.color);
        let radius = (stroke.width / 2.0).max(0.75);
        match stroke.points.as_slice() {
            [] => {}
            [point] => stamp(&mut canvas, *point, radius, color),
            points => {
                for pair in points.windows(2) {
                    stamp_segment(&mut canvas, pair[0], pair[1], radius, color);
                }
            }
        }
    }

    let mut png = Vec::new();
    canvas.write_with_encoder(PngEncoder::new(&mut png))?;
    Ok(png)
}

/// Stamp discs along a segment at half-radius spacing, including both
/// endpoints (round caps).
fn stamp_segment(canvas: &mut RgbaImage, from: Point, to: Point, radius: f64, color: Rgba<u8>) {
    let length = ((to.x - from.x).powi(2) + (to.y - from.y).powi(2)).sqrt();
    let step = (radius / 2.0).max(0.5);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = (length / step).ceil() as u32;

    stamp(canvas, from, radius, color);
    for i in 1..=steps {
        let t = f64::from(i) / f64::from(steps);
        let point = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
        stamp(canvas, point, radius, color);
    }
}

/// Paint a filled disc, clipped to the canvas.
fn stamp(canvas: &mut RgbaImage, center: Point, radius: f64, color: Rgba<u8>) {
    #[allow(clippy::cast_possible_truncation)]
    let (cx, cy) = (center.x.round() as i64, center.y.round() as i64);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let r = radius.ceil() as i64;

    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let dist_sq = (x as f64 - center.x).powi(2) + (y as f64 - center.y).powi(2);
            if dist_sq <= radius * radius {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                canvas.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

// =============================================================================
// COLORS
// =============================================================================

/// Parse a CSS-ish stroke color: the five palette names or `#rgb`/`#rrggbb`
/// hex. Unknown values fall back to black.
#[must_use]
pub fn parse_color(value: &str) -> Rgba<u8> {
    match value.trim().to_lowercase().as_str() {
        "white" => WHITE,
        "red" => Rgba([255, 0, 0, 255]),
        "green" => Rgba([0, 128, 0, 255]),
        "blue" => Rgba([0, 0, 255, 255]),
        "black" => BLACK,
        hex => parse_hex(hex).unwrap_or(BLACK),
    }
}

fn parse_hex(value: &str) -> Option<Rgba<u8>> {
    let digits = value.strip_prefix('#')?;
    match digits.len() {
        3 => {
            let mut channels = [0_u8; 3];
            for (i, c) in digits.chars().enumerate() {
                let nibble = u8::from_str_radix(&c.to_string(), 16).ok()?;
                channels[i] = nibble * 17;
            }
            Some(Rgba([channels[0], channels[1], channels[2], 255]))
        }
        6 => {
            let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
            let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
            let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
            Some(Rgba([r, g, b, 255]))
        }
        _ => None,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "raster_test.rs"]
mod tests;
