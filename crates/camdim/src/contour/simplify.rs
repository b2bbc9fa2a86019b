//! Douglas-Peucker polyline simplification.

/// Perpendicular distance from `p` to the chord `a..b`. Falls back to the
/// point distance when the chord is degenerate.
fn perpendicular_distance(p: [i32; 2], a: [i32; 2], b: [i32; 2]) -> f64 {
    let (px, py) = (f64::from(p[0]), f64::from(p[1]));
    let (ax, ay) = (f64::from(a[0]), f64::from(a[1]));
    let (bx, by) = (f64::from(b[0]), f64::from(b[1]));
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    if len_sq <= f64::EPSILON {
        return ((px - ax).powi(2) + (py - ay).powi(2)).sqrt();
    }
    (dx * (py - ay) - dy * (px - ax)).abs() / len_sq.sqrt()
}

/// Reduces a contour to the vertices that deviate from their local chord
/// by more than `epsilon` pixels.
///
/// Implemented with an explicit segment stack instead of recursion, so
/// the working depth is bounded by the contour length. Endpoints are
/// always kept; with `epsilon <= 0` the input is returned unchanged.
pub fn simplify_contour(points: &[[i32; 2]], epsilon: f64) -> Vec<[i32; 2]> {
    if points.len() <= 3 || epsilon <= 0.0 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;

    let mut stack: Vec<(usize, usize)> = vec![(0, last)];
    while let Some((a, b)) = stack.pop() {
        if b <= a + 1 {
            continue;
        }
        let mut far = a;
        let mut max_dist = 0.0f64;
        for i in a + 1..b {
            let d = perpendicular_distance(points[i], points[a], points[b]);
            if d > max_dist {
                max_dist = d;
                far = i;
            }
        }
        if max_dist > epsilon {
            keep[far] = true;
            stack.push((a, far));
            stack.push((far, b));
        }
    }

    points
        .iter()
        .zip(keep.iter())
        .filter_map(|(p, &k)| if k { Some(*p) } else { None })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collinear_run_collapses_to_endpoints() {
        let line: Vec<[i32; 2]> = (0..=10).map(|x| [x, 0]).collect();
        let out = simplify_contour(&line, 1.0);
        assert_eq!(out, vec![[0, 0], [10, 0]]);
    }

    #[test]
    fn rectangle_outline_keeps_its_corners() {
        // clockwise walk around a 10x6 rectangle boundary
        let mut ring: Vec<[i32; 2]> = Vec::new();
        for x in 0..10 {
            ring.push([x, 0]);
        }
        for y in 0..6 {
            ring.push([9, y]);
        }
        for x in (0..10).rev() {
            ring.push([x, 5]);
        }
        for y in (1..6).rev() {
            ring.push([0, y]);
        }
        let out = simplify_contour(&ring, 0.8);
        assert!(out.len() <= 8, "kept {} points", out.len());
        for corner in [[0, 0], [9, 0], [9, 5], [0, 5]] {
            assert!(out.contains(&corner), "missing corner {corner:?}");
        }
    }

    #[test]
    fn deviating_vertex_survives() {
        let mut line: Vec<[i32; 2]> = (0..=10).map(|x| [x, 0]).collect();
        line[5] = [5, 4];
        let out = simplify_contour(&line, 1.5);
        assert!(out.contains(&[5, 4]));
        assert_eq!(out.first(), Some(&[0, 0]));
        assert_eq!(out.last(), Some(&[10, 0]));
    }

    #[test]
    fn zero_epsilon_is_a_passthrough() {
        let pts: Vec<[i32; 2]> = vec![[0, 0], [1, 1], [2, 0], [3, 1], [4, 0]];
        assert_eq!(simplify_contour(&pts, 0.0), pts);
    }

    #[test]
    fn short_contours_pass_through() {
        let tri = vec![[0, 0], [4, 0], [2, 3]];
        assert_eq!(simplify_contour(&tri, 2.0), tri);
    }
}
