//! Synthetic frame painters shared by stage tests.

use image::{GrayImage, Luma};

/// A constant-valued frame.
pub(crate) fn flat_frame(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// Paints a filled disc, clipped to the frame.
pub(crate) fn draw_disc(frame: &mut GrayImage, cx: i32, cy: i32, radius: i32, value: u8) {
    let (w, h) = frame.dimensions();
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
                continue;
            }
            let dx = x - cx;
            let dy = y - cy;
            if dx * dx + dy * dy <= radius * radius {
                frame.put_pixel(x as u32, y as u32, Luma([value]));
            }
        }
    }
}

/// Paints a filled axis-aligned rectangle, clipped to the frame.
pub(crate) fn draw_rect(frame: &mut GrayImage, x0: i32, y0: i32, width: i32, height: i32, value: u8) {
    let (w, h) = frame.dimensions();
    for y in y0..y0 + height {
        for x in x0..x0 + width {
            if x < 0 || y < 0 || x >= w as i32 || y >= h as i32 {
                continue;
            }
            frame.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
}
