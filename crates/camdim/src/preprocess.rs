//! Frame conversion: BT.709 luminance extraction and separable Gaussian
//! smoothing with replicated borders.

use image::{GrayImage, Luma, RgbImage, RgbaImage};

/// BT.709 luma weights for 8-bit RGB, in channel order.
pub const LUMA_WEIGHTS: [f32; 3] = [0.2126, 0.7152, 0.0722];

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = LUMA_WEIGHTS[0] * f32::from(r)
        + LUMA_WEIGHTS[1] * f32::from(g)
        + LUMA_WEIGHTS[2] * f32::from(b);
    y.round().clamp(0.0, 255.0) as u8
}

/// Collapses an RGBA frame to single-channel luminance. Alpha is ignored.
pub fn rgba_to_gray(frame: &RgbaImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (dst, src) in gray.pixels_mut().zip(frame.pixels()) {
        dst.0[0] = luma(src.0[0], src.0[1], src.0[2]);
    }
    gray
}

/// Collapses an RGB frame to single-channel luminance.
pub fn rgb_to_gray(frame: &RgbImage) -> GrayImage {
    let (width, height) = frame.dimensions();
    let mut gray = GrayImage::new(width, height);
    for (dst, src) in gray.pixels_mut().zip(frame.pixels()) {
        dst.0[0] = luma(src.0[0], src.0[1], src.0[2]);
    }
    gray
}

/// 1-D Gaussian kernel for `sigma`, normalized to unit sum.
///
/// Size is `ceil(6 sigma)` forced odd, so the kernel covers three standard
/// deviations on each side. Sub-unit sigmas can collapse to a single tap,
/// which makes the blur an identity.
pub(crate) fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let mut size = (sigma * 6.0).ceil() as usize;
    if size % 2 == 0 {
        size += 1;
    }
    let radius = (size / 2) as i32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel = Vec::with_capacity(size);
    let mut sum = 0.0f32;
    for i in -radius..=radius {
        let v = (-((i * i) as f32) / two_sigma_sq).exp();
        kernel.push(v);
        sum += v;
    }
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

/// Two-pass separable Gaussian blur. Out-of-bounds taps replicate the
/// nearest border pixel. A non-positive sigma returns the input unchanged.
pub fn gaussian_blur(gray: &GrayImage, sigma: f32) -> GrayImage {
    if !(sigma > 0.0) {
        return gray.clone();
    }
    let kernel = gaussian_kernel(sigma);
    if kernel.len() < 3 {
        return gray.clone();
    }
    let (width, height) = gray.dimensions();
    let radius = (kernel.len() / 2) as i64;
    let w = width as i64;
    let h = height as i64;
    let src = gray.as_raw();

    // Horizontal pass into an f32 buffer so the vertical pass does not
    // accumulate u8 rounding error.
    let mut tmp = vec![0.0f32; (width * height) as usize];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sx = (x + k as i64 - radius).clamp(0, w - 1);
                acc += kv * f32::from(src[(row + sx) as usize]);
            }
            tmp[(row + x) as usize] = acc;
        }
    }

    let mut out = GrayImage::new(width, height);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let sy = (y + k as i64 - radius).clamp(0, h - 1);
                acc += kv * tmp[(sy * w + x) as usize];
            }
            out.put_pixel(x as u32, y as u32, Luma([acc.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}
