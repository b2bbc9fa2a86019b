//! Result types of a single-frame analysis.

use crate::contour::Contour;
use crate::measure::MeasuredObject;
use crate::shape::ShapeDescriptor;

/// One validated and scored object boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    /// Simplified boundary polygon.
    pub contour: Contour,
    /// Geometry derived from that polygon.
    pub shape: ShapeDescriptor,
    /// Ranking score within this frame, `[0, 1]`.
    pub score: f64,
    /// How much to trust the detection, `[0, 1]`.
    pub confidence: f64,
    /// Edge-map density around the seed, `[0, 1]`.
    pub edge_support: f64,
}

/// Stage counters kept alongside every result. Useful when a frame comes
/// back empty and the question is which stage starved.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct FrameDiagnostics {
    /// Pixels surviving hysteresis.
    pub edge_pixels: usize,
    /// Applied hysteresis thresholds, resolved from the histogram when
    /// the caller asked for automatic ones.
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Boundary seeds examined.
    pub seeds_probed: usize,
    /// Closed contours traced from those seeds.
    pub contours_traced: usize,
    /// Candidates dropped by the validity gate or the point floor.
    pub candidates_rejected: usize,
    /// Candidates that survived the gate and entered ranking.
    pub candidates_valid: usize,
    /// Mean confidence over the reported objects, zero when none.
    pub mean_confidence: f64,
}

/// Everything one frame produced.
///
/// An empty `objects` list is the regular "nothing valid in frame"
/// outcome, not an error.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameAnalysis {
    pub width: u32,
    pub height: u32,
    /// Measured objects, best score first.
    pub objects: Vec<MeasuredObject>,
    pub diagnostics: FrameDiagnostics,
}

impl FrameAnalysis {
    /// A result with no objects and zeroed counters.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
            diagnostics: FrameDiagnostics::default(),
        }
    }

    /// The highest-scoring object, when any survived.
    pub fn best(&self) -> Option<&MeasuredObject> {
        self.objects.first()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
