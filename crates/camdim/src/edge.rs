//! Canny edge detection from first principles: Sobel gradients, 4-sector
//! non-maximum suppression and double-threshold hysteresis with
//! 8-connected weak-edge promotion.

use image::{GrayImage, Luma};

use crate::params::{CannyThresholds, GradientNorm};

/// Fraction of total pixel mass left above the strong threshold when the
/// thresholds are derived from the magnitude histogram.
pub const STRONG_TAIL_FRACTION: f64 = 0.06;
/// Fraction of total pixel mass left above the weak threshold.
pub const WEAK_TAIL_FRACTION: f64 = 0.16;

const HISTOGRAM_BINS: usize = 1024;

/// Binary edge raster plus the bookkeeping of its construction.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    /// 0 / 255 edge image, same dimensions as the input frame.
    pub map: GrayImage,
    /// Number of set pixels in `map`.
    pub edge_pixels: usize,
    /// Weak hysteresis threshold actually applied (resolved when auto).
    pub low: f32,
    /// Strong hysteresis threshold actually applied.
    pub high: f32,
}

impl EdgeMap {
    pub fn width(&self) -> u32 {
        self.map.width()
    }

    pub fn height(&self) -> u32 {
        self.map.height()
    }

    /// Bounds-checked edge test; out-of-frame coordinates are not edges.
    #[inline]
    pub fn is_edge(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= i64::from(self.map.width()) || y >= i64::from(self.map.height()) {
            return false;
        }
        self.map.get_pixel(x as u32, y as u32).0[0] != 0
    }

    /// Fraction of set pixels in the `(2 radius + 1)²` window around
    /// `(cx, cy)`. Used as the local edge-support score term.
    pub fn local_density(&self, cx: i64, cy: i64, radius: i64) -> f64 {
        let mut set = 0usize;
        let mut total = 0usize;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                total += 1;
                if self.is_edge(cx + dx, cy + dy) {
                    set += 1;
                }
            }
        }
        if total == 0 {
            return 0.0;
        }
        set as f64 / total as f64
    }
}

struct Gradients {
    gx: Vec<f32>,
    gy: Vec<f32>,
    mag: Vec<f32>,
    width: usize,
    height: usize,
}

/// 3x3 Sobel responses with replicated borders.
fn sobel_gradients(gray: &GrayImage, norm: GradientNorm) -> Gradients {
    let (width, height) = gray.dimensions();
    let w = width as i64;
    let h = height as i64;
    let src = gray.as_raw();
    let sample = |x: i64, y: i64| -> f32 {
        let sx = x.clamp(0, w - 1);
        let sy = y.clamp(0, h - 1);
        f32::from(src[(sy * w + sx) as usize])
    };

    let len = (width * height) as usize;
    let mut gx = vec![0.0f32; len];
    let mut gy = vec![0.0f32; len];
    let mut mag = vec![0.0f32; len];
    for y in 0..h {
        for x in 0..w {
            let tl = sample(x - 1, y - 1);
            let tc = sample(x, y - 1);
            let tr = sample(x + 1, y - 1);
            let ml = sample(x - 1, y);
            let mr = sample(x + 1, y);
            let bl = sample(x - 1, y + 1);
            let bc = sample(x, y + 1);
            let br = sample(x + 1, y + 1);
            let dx = (tr + 2.0 * mr + br) - (tl + 2.0 * ml + bl);
            let dy = (bl + 2.0 * bc + br) - (tl + 2.0 * tc + tr);
            let i = (y * w + x) as usize;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = match norm {
                GradientNorm::L2 => (dx * dx + dy * dy).sqrt(),
                GradientNorm::L1 => dx.abs() + dy.abs(),
            };
        }
    }
    Gradients {
        gx,
        gy,
        mag,
        width: width as usize,
        height: height as usize,
    }
}

/// Offset along the gradient direction, quantized to one of four sectors.
fn sector_offset(gx: f32, gy: f32) -> (i64, i64) {
    let angle = gy.atan2(gx).to_degrees();
    let folded = ((angle % 180.0) + 180.0) % 180.0;
    if !(22.5..157.5).contains(&folded) {
        (1, 0)
    } else if folded < 67.5 {
        (1, 1)
    } else if folded < 112.5 {
        (0, 1)
    } else {
        (-1, 1)
    }
}

/// Keeps only pixels that are maximal along their gradient direction.
///
/// The forward neighbor is compared strictly so a two-pixel plateau thins
/// to a single response instead of surviving whole or vanishing.
fn suppress_non_maxima(g: &Gradients) -> Vec<f32> {
    let w = g.width as i64;
    let h = g.height as i64;
    let mag_at = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0.0
        } else {
            g.mag[(y * w + x) as usize]
        }
    };

    let mut out = vec![0.0f32; g.mag.len()];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let m = g.mag[i];
            if m <= 0.0 {
                continue;
            }
            let (dx, dy) = sector_offset(g.gx[i], g.gy[i]);
            let forward = mag_at(x + dx, y + dy);
            let backward = mag_at(x - dx, y - dy);
            if m > forward && m >= backward {
                out[i] = m;
            }
        }
    }
    out
}

/// Histogram-derived hysteresis thresholds.
///
/// Each threshold is the magnitude above which a fixed fraction of all
/// pixels lies: 6% for strong, 16% for weak. A flat frame has zero
/// maximum magnitude and yields `(0, 0)`, which downstream turns into an
/// empty edge map rather than an error.
fn auto_thresholds(mag: &[f32]) -> (f32, f32) {
    let max = mag.iter().fold(0.0f32, |m, &v| m.max(v));
    if !(max > 0.0) {
        return (0.0, 0.0);
    }
    let scale = (HISTOGRAM_BINS - 1) as f32 / max;
    let mut hist = vec![0u32; HISTOGRAM_BINS];
    for &m in mag {
        hist[(m * scale) as usize] += 1;
    }
    let total = mag.len() as f64;
    let high = tail_cut(&hist, total * STRONG_TAIL_FRACTION) as f32 / scale;
    let mut low = tail_cut(&hist, total * WEAK_TAIL_FRACTION) as f32 / scale;
    if low >= high {
        low = 0.5 * high;
    }
    (low, high)
}

/// Highest bin index at which the cumulative count from the top reaches
/// `target`.
fn tail_cut(hist: &[u32], target: f64) -> usize {
    let mut cum = 0.0;
    for (bin, &count) in hist.iter().enumerate().rev() {
        cum += f64::from(count);
        if cum >= target {
            return bin;
        }
    }
    0
}

const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Double-threshold hysteresis: seeds from strong pixels, flood-promotes
/// 8-connected weak pixels, discards the rest.
fn hysteresis(nms: &[f32], width: usize, height: usize, low: f32, high: f32) -> (GrayImage, usize) {
    let mut state = vec![0u8; nms.len()];
    let mut stack: Vec<usize> = Vec::new();
    for (i, &m) in nms.iter().enumerate() {
        if m > high {
            state[i] = STRONG;
            stack.push(i);
        } else if m > low {
            state[i] = WEAK;
        }
    }

    let w = width as i64;
    let h = height as i64;
    while let Some(i) = stack.pop() {
        let x = (i % width) as i64;
        let y = (i / width) as i64;
        for dy in -1..=1i64 {
            for dx in -1..=1i64 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x + dx;
                let ny = y + dy;
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let j = (ny * w + nx) as usize;
                if state[j] == WEAK {
                    state[j] = STRONG;
                    stack.push(j);
                }
            }
        }
    }

    let mut map = GrayImage::new(width as u32, height as u32);
    let mut edge_pixels = 0usize;
    for (i, &s) in state.iter().enumerate() {
        if s == STRONG {
            map.put_pixel((i % width) as u32, (i / width) as u32, Luma([255]));
            edge_pixels += 1;
        }
    }
    (map, edge_pixels)
}

/// Runs the full edge detector over a (typically pre-blurred) luminance
/// frame.
pub fn detect_edges(gray: &GrayImage, thresholds: CannyThresholds, norm: GradientNorm) -> EdgeMap {
    let gradients = sobel_gradients(gray, norm);
    let (low, high) = match thresholds {
        CannyThresholds::Manual { low, high } => (low, high),
        CannyThresholds::Auto => auto_thresholds(&gradients.mag),
    };
    let nms = suppress_non_maxima(&gradients);
    let (map, edge_pixels) = hysteresis(&nms, gradients.width, gradients.height, low, high);
    tracing::debug!(low, high, edge_pixels, "edge map built");
    EdgeMap {
        map,
        edge_pixels,
        low,
        high,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_image(width: u32, height: u32, split: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x < split {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    #[test]
    fn vertical_step_yields_one_column_of_edges() {
        let img = step_image(16, 16, 8);
        let edges = detect_edges(
            &img,
            CannyThresholds::Manual {
                low: 100.0,
                high: 400.0,
            },
            GradientNorm::L2,
        );
        assert!(edges.edge_pixels > 0);
        for y in 0..16 {
            for x in 0..16 {
                let on = edges.is_edge(x, y);
                if on {
                    assert_eq!(x, 8, "unexpected edge at ({x}, {y})");
                }
            }
        }
        // the full column responds
        assert_eq!(edges.edge_pixels, 16);
    }

    #[test]
    fn flat_frame_produces_empty_map() {
        let img = GrayImage::from_pixel(32, 24, Luma([77]));
        let edges = detect_edges(&img, CannyThresholds::Auto, GradientNorm::L2);
        assert_eq!(edges.edge_pixels, 0);
        assert_eq!(edges.low, 0.0);
        assert_eq!(edges.high, 0.0);
    }

    #[test]
    fn auto_thresholds_keep_an_open_band() {
        // uniform ramp: every pixel has the same magnitude, so both
        // percentile cuts land in one bin and the fallback halves low
        let img = GrayImage::from_fn(64, 16, |x, _| Luma([(x * 4) as u8]));
        let edges = detect_edges(&img, CannyThresholds::Auto, GradientNorm::L2);
        assert!(edges.high > 0.0);
        assert!(edges.low < edges.high);
    }

    #[test]
    fn l1_magnitude_detects_the_same_step() {
        let img = step_image(16, 16, 8);
        let l2 = detect_edges(
            &img,
            CannyThresholds::Manual {
                low: 100.0,
                high: 400.0,
            },
            GradientNorm::L2,
        );
        let l1 = detect_edges(
            &img,
            CannyThresholds::Manual {
                low: 100.0,
                high: 400.0,
            },
            GradientNorm::L1,
        );
        assert_eq!(l1.edge_pixels, l2.edge_pixels);
    }

    #[test]
    fn weak_pixels_need_a_strong_neighbor() {
        // row of magnitudes: isolated weak run with one strong pixel
        let nms = [0.0, 45.0, 60.0, 45.0, 0.0, 45.0];
        let (map, count) = hysteresis(&nms, 6, 1, 30.0, 50.0);
        assert_eq!(count, 3);
        assert_eq!(map.get_pixel(1, 0).0[0], 255);
        assert_eq!(map.get_pixel(2, 0).0[0], 255);
        assert_eq!(map.get_pixel(3, 0).0[0], 255);
        // the detached weak pixel at x=5 is dropped
        assert_eq!(map.get_pixel(5, 0).0[0], 0);
    }

    #[test]
    fn sector_offsets_cover_the_four_directions() {
        assert_eq!(sector_offset(1.0, 0.0), (1, 0));
        assert_eq!(sector_offset(-1.0, 0.0), (1, 0));
        assert_eq!(sector_offset(0.0, 1.0), (0, 1));
        assert_eq!(sector_offset(1.0, 1.0), (1, 1));
        assert_eq!(sector_offset(-1.0, 1.0), (-1, 1));
    }
}
