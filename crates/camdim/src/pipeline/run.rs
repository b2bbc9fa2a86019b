//! Stage wiring of the single-frame pipeline.

use image::GrayImage;

use super::result::{Detection, FrameAnalysis, FrameDiagnostics};
use crate::calib::CalibrationState;
use crate::contour::{find_seeds, simplify_contour, trace_boundary, Contour};
use crate::edge::{detect_edges, EdgeMap};
use crate::error::AnalysisError;
use crate::measure::{measure_detection, DepthModel};
use crate::params::DetectionParams;
use crate::preprocess::gaussian_blur;
use crate::select::{self, Candidate};
use crate::shape::ShapeDescriptor;

/// Half-width of the window used to sample edge support around a seed.
const EDGE_SUPPORT_RADIUS: i64 = 3;
/// Trace step budget as a multiple of the longer frame side.
const MAX_TRACE_STEPS_FACTOR: usize = 4;

/// Runs the full pipeline over one grayscale frame.
///
/// The only hard failures are malformed inputs: a frame below the
/// minimum size or inconsistent parameters. A frame with nothing worth
/// measuring returns an empty [`FrameAnalysis`].
pub fn run(
    gray: &GrayImage,
    params: &DetectionParams,
    calibration: &CalibrationState,
    depth_model: &dyn DepthModel,
    now_unix: u64,
) -> Result<FrameAnalysis, AnalysisError> {
    params.validate()?;
    let (width, height) = gray.dimensions();
    if width < DetectionParams::MIN_FRAME_SIDE || height < DetectionParams::MIN_FRAME_SIDE {
        return Err(AnalysisError::FrameTooSmall {
            width,
            height,
            min: DetectionParams::MIN_FRAME_SIDE,
        });
    }

    let blurred = gaussian_blur(gray, params.blur_sigma);
    let edges = detect_edges(&blurred, params.thresholds, params.gradient_norm);
    let mut diagnostics = FrameDiagnostics {
        edge_pixels: edges.edge_pixels,
        low_threshold: edges.low,
        high_threshold: edges.high,
        ..FrameDiagnostics::default()
    };
    if edges.edge_pixels == 0 {
        tracing::debug!("no edge pixels survived, returning empty result");
        return Ok(FrameAnalysis {
            width,
            height,
            objects: Vec::new(),
            diagnostics,
        });
    }

    let center = params
        .search_center
        .unwrap_or([width as f32 / 2.0, height as f32 / 2.0]);
    let seeds = find_seeds(
        &edges,
        center,
        params.validity.centrality_radius_frac,
        params.max_seeds,
    );
    diagnostics.seeds_probed = seeds.len();

    let max_steps = MAX_TRACE_STEPS_FACTOR * width.max(height) as usize;
    let mut visited = vec![false; width as usize * height as usize];
    let index_of = |p: [i32; 2]| p[1] as usize * width as usize + p[0] as usize;

    let mut candidates: Vec<Candidate> = Vec::new();
    for seed in seeds {
        if visited[index_of(seed)] {
            continue;
        }
        let Some(points) = trace_boundary(&edges, seed, max_steps) else {
            continue;
        };
        // claimed only on completed walks, so a failed partial trace
        // cannot shadow a closed contour reachable from a later seed
        claim_component(&edges, seed, &mut visited);
        diagnostics.contours_traced += 1;

        if points.len() < params.min_contour_points {
            diagnostics.candidates_rejected += 1;
            continue;
        }
        let simplified = simplify_contour(&points, params.simplify_epsilon);
        let shape = ShapeDescriptor::from_polygon(&simplified);
        if !select::passes_validity(&shape, width, height, center, &params.validity) {
            diagnostics.candidates_rejected += 1;
            continue;
        }
        let edge_support =
            edges.local_density(i64::from(seed[0]), i64::from(seed[1]), EDGE_SUPPORT_RADIUS);
        candidates.push(Candidate {
            contour: Contour {
                points: simplified,
                seed,
            },
            shape,
            edge_support,
        });
    }

    diagnostics.candidates_valid = candidates.len();
    let ranked = select::rank(
        candidates,
        width,
        height,
        center,
        &params.weights,
        params.max_detections,
    );
    let objects: Vec<_> = ranked
        .into_iter()
        .map(|scored| {
            let detection = Detection {
                contour: scored.candidate.contour,
                shape: scored.candidate.shape,
                score: scored.score,
                confidence: scored.confidence,
                edge_support: scored.candidate.edge_support,
            };
            measure_detection(
                &detection,
                calibration,
                depth_model,
                &params.measure,
                width,
                height,
                now_unix,
            )
        })
        .collect();
    if !objects.is_empty() {
        let total: f64 = objects.iter().map(|o| o.detection.confidence).sum();
        diagnostics.mean_confidence = total / objects.len() as f64;
    }

    tracing::info!(
        objects = objects.len(),
        edge_pixels = diagnostics.edge_pixels,
        seeds_probed = diagnostics.seeds_probed,
        contours_traced = diagnostics.contours_traced,
        rejected = diagnostics.candidates_rejected,
        valid = diagnostics.candidates_valid,
        mean_confidence = diagnostics.mean_confidence,
        "frame analyzed"
    );
    Ok(FrameAnalysis {
        width,
        height,
        objects,
        diagnostics,
    })
}

/// Marks the whole 8-connected edge component around `seed` as visited.
///
/// A trace walks only one side of a thick edge ring; claiming the full
/// component keeps the ring's other boundary from seeding a second,
/// near-identical detection of the same object.
fn claim_component(edges: &EdgeMap, seed: [i32; 2], visited: &mut [bool]) {
    let width = edges.width() as usize;
    let index_of = |p: [i32; 2]| p[1] as usize * width + p[0] as usize;
    visited[index_of(seed)] = true;
    let mut stack = vec![seed];
    while let Some([x, y]) = stack.pop() {
        for dy in -1..=1i32 {
            for dx in -1..=1i32 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let next = [x + dx, y + dy];
                if !edges.is_edge(i64::from(next[0]), i64::from(next[1])) {
                    continue;
                }
                let i = index_of(next);
                if !visited[i] {
                    visited[i] = true;
                    stack.push(next);
                }
            }
        }
    }
}
