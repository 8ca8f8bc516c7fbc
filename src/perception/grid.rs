//! Alignment grid overlay.
//!
//! The model reasons in a 0–1000 space over the image it receives; evenly
//! spaced lines give it visual anchors at every 100 units (for 10 divisions).
use image::{Rgb, RgbImage};

/// Semi-transparent red, 1 px wide.
const LINE_RGB: (u8, u8, u8) = (255, 0, 0);
const LINE_ALPHA: u8 = 80;

/// Draw `divisions - 1` vertical and horizontal lines in place.
pub fn draw_alignment_grid(canvas: &mut RgbImage, divisions: u32) {
    let (w, h) = canvas.dimensions();
    let divisions = divisions.max(1);
    let step_x = w / divisions;
    let step_y = h / divisions;
    if step_x == 0 || step_y == 0 {
        return;
    }

    let (r, g, b) = LINE_RGB;
    for i in 1..divisions {
        let x = i * step_x;
        if x >= w {
            break;
        }
        for y in 0..h {
            blend_pixel(canvas.get_pixel_mut(x, y), r, g, b, LINE_ALPHA);
        }
    }
    for i in 1..divisions {
        let y = i * step_y;
        if y >= h {
            break;
        }
        for x in 0..w {
            blend_pixel(canvas.get_pixel_mut(x, y), r, g, b, LINE_ALPHA);
        }
    }
}

fn blend_pixel(pixel: &mut Rgb<u8>, r: u8, g: u8, b: u8, a: u8) {
    let alpha = a as f32 / 255.0;
    pixel[0] = (pixel[0] as f32 * (1.0 - alpha) + r as f32 * alpha).round() as u8;
    pixel[1] = (pixel[1] as f32 * (1.0 - alpha) + g as f32 * alpha).round() as u8;
    pixel[2] = (pixel[2] as f32 * (1.0 - alpha) + b as f32 * alpha).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_land_on_every_tenth() {
        let mut img = RgbImage::from_pixel(100, 50, Rgb([0, 0, 0]));
        draw_alignment_grid(&mut img, 10);

        // vertical line at x=10, horizontal line at y=5
        assert!(img.get_pixel(10, 2)[0] > 0);
        assert!(img.get_pixel(3, 5)[0] > 0);
        // cell interior and the outer border stay untouched
        assert_eq!(img.get_pixel(3, 2), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(img.get_pixel(99, 49), &Rgb([0, 0, 0]));
    }

    #[test]
    fn blend_keeps_underlying_content_visible() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([0, 0, 255]));
        draw_alignment_grid(&mut img, 2);
        let p = img.get_pixel(10, 3);
        assert!(p[0] > 0 && p[2] > 0, "expected a red/blue mix, got {p:?}");
    }

    #[test]
    fn tiny_images_are_left_alone() {
        let mut img = RgbImage::from_pixel(5, 5, Rgb([7, 7, 7]));
        draw_alignment_grid(&mut img, 10);
        assert!(img.pixels().all(|p| *p == Rgb([7, 7, 7])));
    }
}
