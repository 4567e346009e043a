use super::*;

use uuid::Uuid;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

fn stroke(points: Vec<Point>, color: &str, width: f64) -> Stroke {
    Stroke { id: Uuid::new_v4(), points, color: color.into(), width, owner: None }
}

#[test]
fn render_produces_png_bytes() {
    let strokes = vec![stroke(
        vec![Point::new(10.0, 10.0), Point::new(50.0, 40.0)],
        "black",
        3.0,
    )];
    let png = render_png(&strokes, 100, 80).unwrap();
    assert_eq!(&png[..8], &PNG_MAGIC);
}

#[test]
fn render_handles_single_point_dot() {
    let strokes = vec![stroke(vec![Point::new(5.0, 5.0)], "red", 6.0)];
    let png = render_png(&strokes, 20, 20).unwrap();
    assert_eq!(&png[..8], &PNG_MAGIC);
}

#[test]
fn render_clips_out_of_bounds_points() {
    let strokes = vec![stroke(
        vec![Point::new(-50.0, -50.0), Point::new(500.0, 500.0)],
        "blue",
        4.0,
    )];
    // Must not panic; everything outside the canvas is clipped.
    let png = render_png(&strokes, 64, 64).unwrap();
    assert_eq!(&png[..8], &PNG_MAGIC);
}

#[test]
fn render_rejects_degenerate_dimensions() {
    assert!(matches!(
        render_png(&[], 0, 100),
        Err(RasterError::InvalidDimensions { .. })
    ));
    assert!(matches!(
        render_png(&[], 100, MAX_CANVAS_DIM + 1),
        Err(RasterError::InvalidDimensions { .. })
    ));
}

#[test]
fn named_palette_colors_resolve() {
    assert_eq!(parse_color("black"), Rgba([0, 0, 0, 255]));
    assert_eq!(parse_color("white"), Rgba([255, 255, 255, 255]));
    assert_eq!(parse_color("red"), Rgba([255, 0, 0, 255]));
    assert_eq!(parse_color("green"), Rgba([0, 128, 0, 255]));
    assert_eq!(parse_color("blue"), Rgba([0, 0, 255, 255]));
}

#[test]
fn hex_colors_resolve() {
    assert_eq!(parse_color("#ff8000"), Rgba([255, 128, 0, 255]));
    assert_eq!(parse_color("#F80"), Rgba([255, 136, 0, 255]));
}

#[test]
fn unknown_colors_fall_back_to_black() {
    assert_eq!(parse_color("chartreuse"), Rgba([0, 0, 0, 255]));
    assert_eq!(parse_color("#12"), Rgba([0, 0, 0, 255]));
}
