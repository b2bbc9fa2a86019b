//! Moore-neighbor boundary tracing over a binary edge map.

use crate::edge::EdgeMap;

/// Clockwise Moore neighborhood, starting east.
const MOORE: [(i64, i64); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Walks the 8-connected boundary starting at `seed` and returns the
/// closed contour, or `None` for isolated pixels and walks that exhaust
/// the step cap.
///
/// After each accepted step the neighbor search restarts two positions
/// behind the last heading (`dir + 6` mod 8), which turns the walk left
/// so it hugs the boundary instead of cutting across it. The walk closes
/// when it steps back onto the seed with at least three points collected;
/// it bails at `max_steps` so a pathological edge map cannot spin forever.
/// An open segment closes degenerately by walking out and back; the
/// resulting zero-area loop is culled later by the validity gate.
pub fn trace_boundary(edges: &EdgeMap, seed: [i32; 2], max_steps: usize) -> Option<Vec<[i32; 2]>> {
    let start = (i64::from(seed[0]), i64::from(seed[1]));
    if !edges.is_edge(start.0, start.1) {
        return None;
    }

    let mut points: Vec<[i32; 2]> = vec![seed];
    let mut current = start;
    let mut dir = 0usize;

    for _ in 0..max_steps {
        let mut advanced = false;
        for i in 0..8 {
            let idx = (dir + 6 + i) % 8;
            let (dx, dy) = MOORE[idx];
            let next = (current.0 + dx, current.1 + dy);
            if !edges.is_edge(next.0, next.1) {
                continue;
            }
            if next == start && points.len() >= 3 {
                return Some(points);
            }
            current = next;
            dir = idx;
            points.push([next.0 as i32, next.1 as i32]);
            advanced = true;
            break;
        }
        if !advanced {
            // isolated pixel or a dead end
            return None;
        }
    }
    tracing::trace!(seed = ?seed, max_steps, "boundary walk hit the step cap");
    None
}
