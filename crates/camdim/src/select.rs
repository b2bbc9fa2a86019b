//! Candidate gating, scoring and ranking.
//!
//! The validity gate is the single place where contours are judged
//! acceptable; every caller goes through it with the same
//! [`ValidityBounds`] table. Survivors are scored as a weighted sum of
//! normalized terms and returned best first.

use crate::contour::Contour;
use crate::params::{ScoreWeights, ValidityBounds};
use crate::shape::ShapeDescriptor;

/// A traced, simplified and analyzed contour awaiting selection.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub contour: Contour,
    pub shape: ShapeDescriptor,
    /// Edge-map density sampled around the seed, in `[0, 1]`.
    pub edge_support: f64,
}

/// A candidate that survived the gate, with its ranking score and the
/// confidence reported to the caller.
#[derive(Debug, Clone)]
pub(crate) struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: f64,
    pub confidence: f64,
}

fn half_diagonal(frame_w: u32, frame_h: u32) -> f64 {
    let hx = f64::from(frame_w) / 2.0;
    let hy = f64::from(frame_h) / 2.0;
    (hx * hx + hy * hy).sqrt()
}

fn center_distance(shape: &ShapeDescriptor, center: [f32; 2]) -> f64 {
    let dx = shape.centroid[0] - f64::from(center[0]);
    let dy = shape.centroid[1] - f64::from(center[1]);
    (dx * dx + dy * dy).sqrt()
}

/// Closeness of a shape's centroid to the search anchor: 1.0 on the
/// anchor, 0.0 at or beyond half the frame diagonal.
pub(crate) fn centrality(
    shape: &ShapeDescriptor,
    frame_w: u32,
    frame_h: u32,
    center: [f32; 2],
) -> f64 {
    let d = center_distance(shape, center);
    (1.0 - d / half_diagonal(frame_w, frame_h)).max(0.0)
}

/// Applies the validity gate to one candidate shape. `center` is the
/// search anchor the centrality radius is measured from. Rejections are
/// logged at trace level with the failing bound.
pub(crate) fn passes_validity(
    shape: &ShapeDescriptor,
    frame_w: u32,
    frame_h: u32,
    center: [f32; 2],
    bounds: &ValidityBounds,
) -> bool {
    let frame_area = f64::from(frame_w) * f64::from(frame_h);
    let area_fraction = shape.area / frame_area;
    if area_fraction < bounds.min_area_fraction || area_fraction > bounds.max_area_fraction {
        tracing::trace!(area_fraction, "rejected: area fraction out of band");
        return false;
    }
    if shape.bbox.width() < bounds.min_bbox_side_px || shape.bbox.height() < bounds.min_bbox_side_px
    {
        tracing::trace!(
            width = shape.bbox.width(),
            height = shape.bbox.height(),
            "rejected: bounding box below pixel floor"
        );
        return false;
    }
    let distance = center_distance(shape, center);
    let max_distance = bounds.centrality_radius_frac * half_diagonal(frame_w, frame_h);
    if distance > max_distance {
        tracing::trace!(distance, max_distance, "rejected: centroid outside search radius");
        return false;
    }
    if shape.aspect_ratio < bounds.min_aspect || shape.aspect_ratio > bounds.max_aspect {
        tracing::trace!(aspect = shape.aspect_ratio, "rejected: aspect out of band");
        return false;
    }
    if shape.circularity < bounds.min_circularity || shape.circularity > bounds.max_circularity {
        tracing::trace!(circularity = shape.circularity, "rejected: circularity out of band");
        return false;
    }
    if shape.solidity < bounds.min_solidity || shape.solidity > bounds.max_solidity {
        tracing::trace!(solidity = shape.solidity, "rejected: solidity out of band");
        return false;
    }
    true
}

/// Scores the gated candidates and returns at most `max_results` of them,
/// best first. Score ties break toward the larger area so repeated runs
/// on the same frame stay stable.
pub(crate) fn rank(
    candidates: Vec<Candidate>,
    frame_w: u32,
    frame_h: u32,
    center: [f32; 2],
    weights: &ScoreWeights,
    max_results: usize,
) -> Vec<ScoredCandidate> {
    if candidates.is_empty() {
        return Vec::new();
    }
    let max_area = candidates
        .iter()
        .map(|c| c.shape.area)
        .fold(f64::MIN, f64::max)
        .max(f64::EPSILON);
    let total = weights.total();

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let area_term = candidate.shape.area / max_area;
            let centrality_term = centrality(&candidate.shape, frame_w, frame_h, center);
            let regularity_term = candidate.shape.regularity();
            let edge_term = candidate.edge_support.clamp(0.0, 1.0);
            let score = (weights.area * area_term
                + weights.centrality * centrality_term
                + weights.regularity * regularity_term
                + weights.edge_strength * edge_term)
                / total;
            let confidence =
                (0.6 * regularity_term + 0.4 * edge_term).clamp(0.0, 1.0);
            ScoredCandidate {
                candidate,
                score,
                confidence,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then(b.candidate.shape.area.partial_cmp(&a.candidate.shape.area).unwrap())
    });
    scored.truncate(max_results);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mid(w: u32, h: u32) -> [f32; 2] {
        [w as f32 / 2.0, h as f32 / 2.0]
    }

    fn square_candidate(cx: i32, cy: i32, half: i32) -> Candidate {
        let points = vec![
            [cx - half, cy - half],
            [cx + half, cy - half],
            [cx + half, cy + half],
            [cx - half, cy + half],
        ];
        Candidate {
            shape: ShapeDescriptor::from_polygon(&points),
            contour: Contour {
                points,
                seed: [cx, cy - half],
            },
            edge_support: 0.8,
        }
    }

    #[test]
    fn gate_accepts_a_centered_square() {
        let c = square_candidate(100, 100, 30);
        assert!(passes_validity(
            &c.shape,
            200,
            200,
            mid(200, 200),
            &ValidityBounds::default()
        ));
    }

    #[test]
    fn gate_rejects_undersized_and_offcenter_shapes() {
        let bounds = ValidityBounds::default();
        // 5x5 px, below both the area fraction and the bbox floor
        let tiny = square_candidate(100, 100, 2);
        assert!(!passes_validity(&tiny.shape, 200, 200, mid(200, 200), &bounds));
        // centroid sits in the far corner, outside 0.75 of the half-diagonal
        let corner = square_candidate(12, 12, 12);
        assert!(!passes_validity(&corner.shape, 640, 640, mid(640, 640), &bounds));
    }

    #[test]
    fn gate_rejects_extreme_aspect() {
        // 640x80 px bar, aspect 8
        let bar = [[0, 60], [639, 60], [639, 139], [0, 139]];
        let shape = ShapeDescriptor::from_polygon(&bar);
        let mut bounds = ValidityBounds::default();
        bounds.max_aspect = 4.0;
        assert!(!passes_validity(&shape, 640, 200, mid(640, 200), &bounds));
        bounds.max_aspect = ValidityBounds::DEFAULT_MAX_ASPECT;
        assert!(passes_validity(&shape, 640, 200, mid(640, 200), &bounds));
    }

    #[test]
    fn ranking_prefers_large_centered_candidates() {
        let big_centered = square_candidate(320, 240, 80);
        let small_offset = square_candidate(470, 130, 30);
        let out = rank(
            vec![small_offset, big_centered],
            640,
            480,
            mid(640, 480),
            &ScoreWeights::default(),
            8,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].candidate.shape.bbox.width(), 161);
        assert!(out[0].score > out[1].score);
    }

    #[test]
    fn score_ties_break_toward_larger_area() {
        // concentric squares have identical centrality; with weight only
        // on centrality their scores tie exactly
        let weights = ScoreWeights {
            area: 0.0,
            centrality: 1.0,
            regularity: 0.0,
            edge_strength: 0.0,
        };
        let small = square_candidate(320, 240, 40);
        let large = square_candidate(320, 240, 90);
        let out = rank(vec![small, large], 640, 480, mid(640, 480), &weights, 8);
        assert_eq!(out[0].score, out[1].score);
        assert!(out[0].candidate.shape.area > out[1].candidate.shape.area);
    }

    #[test]
    fn result_count_is_capped() {
        let candidates: Vec<Candidate> = (0..6)
            .map(|i| square_candidate(200 + 10 * i, 200, 40 + i))
            .collect();
        let out = rank(candidates, 640, 480, mid(640, 480), &ScoreWeights::default(), 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn empty_input_ranks_to_nothing() {
        assert!(rank(
            Vec::new(),
            640,
            480,
            mid(640, 480),
            &ScoreWeights::default(),
            4
        )
        .is_empty());
    }

    #[test]
    fn search_anchor_moves_the_gate_and_the_ranking() {
        let bounds = ValidityBounds::default();
        // out of reach from the frame center, in reach from a nearby anchor
        let corner = square_candidate(12, 12, 12);
        assert!(!passes_validity(&corner.shape, 640, 640, mid(640, 640), &bounds));
        assert!(passes_validity(&corner.shape, 640, 640, [40.0, 40.0], &bounds));

        // identical squares, the anchor decides which ranks first
        let left = square_candidate(160, 240, 40);
        let right = square_candidate(480, 240, 40);
        let out = rank(
            vec![left, right],
            640,
            480,
            [480.0, 240.0],
            &ScoreWeights::default(),
            2,
        );
        assert!((out[0].candidate.shape.centroid[0] - 480.0).abs() < 1e-9);
        assert!(out[0].score > out[1].score);
    }

    #[test]
    fn confidence_tracks_shape_quality_and_edge_support() {
        let mut c = square_candidate(320, 240, 60);
        c.edge_support = 1.0;
        let out = rank(vec![c], 640, 480, mid(640, 480), &ScoreWeights::default(), 1);
        let conf = out[0].confidence;
        // square: regularity (pi/4 + 1 + 1) / 3, edge term saturated
        let expected = 0.6 * ((std::f64::consts::FRAC_PI_4 + 2.0) / 3.0) + 0.4;
        assert!((conf - expected).abs() < 1e-9, "confidence {conf}");
    }
}
