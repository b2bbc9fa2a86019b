//! Seed selection for boundary tracing.
//!
//! Seeds are true boundary pixels: edge pixels with at least one non-edge
//! 8-neighbor. The search walks concentric square rings outward from the
//! search center, so seeds near the center are found (and traced) first.
//! That bias is deliberate: it approximates "the object the user means"
//! without full scene segmentation.

use crate::edge::EdgeMap;

/// Radial step between scanned rings, in pixels. Every ring is visited so
/// no boundary pixel inside the search zone can be skipped.
const RING_STEP: i64 = 1;

/// Edge pixel with at least one non-edge 8-neighbor. Pixels on the frame
/// border count: their out-of-frame neighbors are non-edges.
fn is_boundary_pixel(edges: &EdgeMap, x: i64, y: i64) -> bool {
    if !edges.is_edge(x, y) {
        return false;
    }
    for dy in -1..=1i64 {
        for dx in -1..=1i64 {
            if dx == 0 && dy == 0 {
                continue;
            }
            if !edges.is_edge(x + dx, y + dy) {
                return true;
            }
        }
    }
    false
}

/// Collects up to `max_seeds` boundary pixels around `center`, nearest
/// rings first, out to `max_radius_frac` of the frame half-diagonal.
///
/// The scan order within a ring is fixed (top row, bottom row, then the
/// two side columns), which together with the ring order makes the seed
/// list deterministic for a given edge map.
pub fn find_seeds(
    edges: &EdgeMap,
    center: [f32; 2],
    max_radius_frac: f64,
    max_seeds: usize,
) -> Vec<[i32; 2]> {
    let w = i64::from(edges.width());
    let h = i64::from(edges.height());
    if w == 0 || h == 0 || max_seeds == 0 {
        return Vec::new();
    }
    let half_diag = (((w * w + h * h) as f64).sqrt()) / 2.0;
    let max_radius = (half_diag * max_radius_frac).ceil() as i64;
    let cx = f64::from(center[0]).round() as i64;
    let cy = f64::from(center[1]).round() as i64;

    let mut seeds: Vec<[i32; 2]> = Vec::new();
    let mut push = |seeds: &mut Vec<[i32; 2]>, x: i64, y: i64| {
        if seeds.len() < max_seeds && is_boundary_pixel(edges, x, y) {
            seeds.push([x as i32, y as i32]);
        }
    };

    if is_boundary_pixel(edges, cx, cy) {
        seeds.push([cx as i32, cy as i32]);
    }
    let mut radius = RING_STEP;
    while radius <= max_radius && seeds.len() < max_seeds {
        for x in (cx - radius)..=(cx + radius) {
            push(&mut seeds, x, cy - radius);
        }
        for x in (cx - radius)..=(cx + radius) {
            push(&mut seeds, x, cy + radius);
        }
        for y in (cy - radius + 1)..(cy + radius) {
            push(&mut seeds, cx - radius, y);
        }
        for y in (cy - radius + 1)..(cy + radius) {
            push(&mut seeds, cx + radius, y);
        }
        radius += RING_STEP;
    }
    seeds
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn edge_map_from(set: &[(u32, u32)], width: u32, height: u32) -> EdgeMap {
        let mut map = GrayImage::new(width, height);
        for &(x, y) in set {
            map.put_pixel(x, y, Luma([255]));
        }
        EdgeMap {
            map,
            edge_pixels: set.len(),
            low: 0.0,
            high: 0.0,
        }
    }

    #[test]
    fn nearest_boundary_pixels_come_first() {
        // one edge pixel near the center, one far away
        let edges = edge_map_from(&[(21, 20), (5, 5)], 40, 40);
        let seeds = find_seeds(&edges, [20.0, 20.0], 1.0, 8);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0], [21, 20]);
        assert_eq!(seeds[1], [5, 5]);
    }

    #[test]
    fn seeds_outside_the_radius_are_ignored() {
        let edges = edge_map_from(&[(2, 2)], 64, 64);
        // tiny radius: the corner pixel is out of reach
        let seeds = find_seeds(&edges, [32.0, 32.0], 0.1, 8);
        assert!(seeds.is_empty());
    }

    #[test]
    fn interior_pixels_are_not_seeds() {
        // 3x3 solid block: the center pixel has no non-edge neighbor
        let mut set = Vec::new();
        for y in 10..13 {
            for x in 10..13 {
                set.push((x, y));
            }
        }
        let edges = edge_map_from(&set, 24, 24);
        let seeds = find_seeds(&edges, [11.0, 11.0], 1.0, 16);
        assert!(!seeds.iter().any(|&s| s == [11, 11]));
        assert_eq!(seeds.len(), 8);
    }

    #[test]
    fn seed_count_is_capped() {
        let mut set = Vec::new();
        for x in 0..32 {
            set.push((x, 10));
        }
        let edges = edge_map_from(&set, 32, 32);
        let seeds = find_seeds(&edges, [16.0, 10.0], 1.0, 5);
        assert_eq!(seeds.len(), 5);
    }
}
