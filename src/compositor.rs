//! Solid-color background compositing
//!
//! Standard source-over compositing of a segmented foreground onto an
//! opaque canvas. Integer arithmetic keeps the guarantees exact: pixels
//! with zero alpha become exactly the canvas color, pixels with full alpha
//! keep their source RGB untouched.

use crate::color::BackgroundColor;
use image::{Rgba, RgbaImage};

/// Build an opaque canvas of the given color and dimensions
#[must_use]
pub fn solid_canvas(width: u32, height: u32, color: BackgroundColor) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color.to_rgba())
}

/// Composite a segmented image (alpha = foreground opacity) over a solid
/// color canvas of identical dimensions.
///
/// Per pixel, with alpha normalized to [0,1]:
/// `out.rgb = fg.rgb * a + color.rgb * (1 - a)`, `out.alpha = 255`.
/// The canvas is opaque, so the result is always fully opaque.
#[must_use]
pub fn composite_over_color(segmented: &RgbaImage, color: BackgroundColor) -> RgbaImage {
    let (width, height) = segmented.dimensions();
    let mut output = solid_canvas(width, height, color);

    for (x, y, fg) in segmented.enumerate_pixels() {
        let alpha = fg[3];
        let bg = output.get_pixel(x, y);
        output.put_pixel(
            x,
            y,
            Rgba([
                blend_channel(fg[0], bg[0], alpha),
                blend_channel(fg[1], bg[1], alpha),
                blend_channel(fg[2], bg[2], alpha),
                255,
            ]),
        );
    }

    output
}

/// Rounded integer source-over blend of one channel.
///
/// `a = 0` yields exactly `bg`; `a = 255` yields exactly `fg`.
fn blend_channel(fg: u8, bg: u8, alpha: u8) -> u8 {
    let fg = u32::from(fg);
    let bg = u32::from(bg);
    let a = u32::from(alpha);
    ((fg * a + bg * (255 - a) + 127) / 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmented_pixel(r: u8, g: u8, b: u8, a: u8) -> RgbaImage {
        RgbaImage::from_pixel(1, 1, Rgba([r, g, b, a]))
    }

    #[test]
    fn test_zero_alpha_becomes_exactly_the_color() {
        let segmented = segmented_pixel(10, 20, 30, 0);
        let out = composite_over_color(&segmented, BackgroundColor::new(1, 2, 3));
        assert_eq!(out.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_full_alpha_preserves_source_rgb_exactly() {
        for value in [0u8, 1, 127, 128, 254, 255] {
            let segmented = segmented_pixel(value, value, value, 255);
            let out = composite_over_color(&segmented, BackgroundColor::BLUE);
            assert_eq!(out.get_pixel(0, 0).0, [value, value, value, 255]);
        }
    }

    #[test]
    fn test_half_alpha_blends_midway() {
        let segmented = segmented_pixel(255, 255, 255, 128);
        let out = composite_over_color(&segmented, BackgroundColor::BLACK);
        let px = out.get_pixel(0, 0);
        // 255 * 128/255 rounded
        assert_eq!(px.0, [128, 128, 128, 255]);
    }

    #[test]
    fn test_output_is_fully_opaque() {
        let mut segmented = RgbaImage::new(4, 4);
        for (i, pixel) in segmented.pixels_mut().enumerate() {
            *pixel = Rgba([50, 60, 70, (i * 17 % 256) as u8]);
        }

        let out = composite_over_color(&segmented, BackgroundColor::GREEN);
        assert!(out.pixels().all(|p| p[3] == 255));
        assert_eq!(out.dimensions(), (4, 4));
    }

    #[test]
    fn test_uniform_background_is_idempotent() {
        // Compositing a fully-background image yields the canvas; doing it
        // again with the same color must not change a single pixel.
        let color = BackgroundColor::new(7, 77, 177);
        let segmented = RgbaImage::from_pixel(3, 3, Rgba([90, 90, 90, 0]));

        let first = composite_over_color(&segmented, color);
        assert!(first.pixels().all(|p| p.0 == [7, 77, 177, 255]));

        // Re-segment with "everything is background" and composite again
        let mut re_segmented = first.clone();
        for pixel in re_segmented.pixels_mut() {
            pixel[3] = 0;
        }
        let second = composite_over_color(&re_segmented, color);
        assert_eq!(first, second);
    }

    #[test]
    fn test_checkerboard_scenario() {
        // 2x2, matte [255, 0, 0, 255], blue background: pixels 1 and 4 keep
        // their RGB, pixels 2 and 3 become exactly blue.
        let mut segmented = RgbaImage::new(2, 2);
        segmented.put_pixel(0, 0, Rgba([11, 12, 13, 255]));
        segmented.put_pixel(1, 0, Rgba([21, 22, 23, 0]));
        segmented.put_pixel(0, 1, Rgba([31, 32, 33, 0]));
        segmented.put_pixel(1, 1, Rgba([41, 42, 43, 255]));

        let out = composite_over_color(&segmented, BackgroundColor::new(0, 0, 255));
        assert_eq!(out.get_pixel(0, 0).0, [11, 12, 13, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(0, 1).0, [0, 0, 255, 255]);
        assert_eq!(out.get_pixel(1, 1).0, [41, 42, 43, 255]);
    }

    #[test]
    fn test_solid_canvas() {
        let canvas = solid_canvas(5, 4, BackgroundColor::RED);
        assert_eq!(canvas.dimensions(), (5, 4));
        assert!(canvas.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }
}
