//! Pipeline configuration: quality profiles, edge thresholds, the candidate
//! validity gate and scoring weights.
//!
//! All knobs live in [`DetectionParams`] and are passed explicitly per call.
//! Nothing in the pipeline reads ambient or global state.

use crate::error::AnalysisError;
use crate::measure::MeasureConfig;

/// Norm used to collapse the two Sobel responses into one magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientNorm {
    /// Euclidean `sqrt(gx² + gy²)`.
    #[default]
    L2,
    /// Manhattan `|gx| + |gy|`, cheaper and slightly noisier.
    L1,
}

/// Preset speed/fidelity trade-off.
///
/// A profile is not a separate pipeline: it only rewrites the tunable
/// fields of [`DetectionParams`] via [`DetectionParams::apply_profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityProfile {
    /// Light blur, L1 magnitude, few seeds. For preview cadence.
    Fast,
    /// Default trade-off.
    #[default]
    Balanced,
    /// Heavier blur and denser seeding for still captures.
    Accurate,
}

impl QualityProfile {
    pub(crate) fn blur_sigma(self) -> f32 {
        match self {
            QualityProfile::Fast => 1.0,
            QualityProfile::Balanced => 1.4,
            QualityProfile::Accurate => 2.0,
        }
    }

    pub(crate) fn gradient_norm(self) -> GradientNorm {
        match self {
            QualityProfile::Fast => GradientNorm::L1,
            QualityProfile::Balanced | QualityProfile::Accurate => GradientNorm::L2,
        }
    }

    pub(crate) fn max_seeds(self) -> usize {
        match self {
            QualityProfile::Fast => 48,
            QualityProfile::Balanced => 96,
            QualityProfile::Accurate => 160,
        }
    }

    pub(crate) fn simplify_epsilon(self) -> f64 {
        match self {
            QualityProfile::Fast => 1.5,
            QualityProfile::Balanced => 1.2,
            QualityProfile::Accurate => 1.0,
        }
    }
}

/// Where the Canny hysteresis thresholds come from.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CannyThresholds {
    /// Derive both thresholds from the gradient magnitude histogram.
    Auto,
    /// Caller-supplied absolute magnitude thresholds, `low < high`.
    Manual { low: f32, high: f32 },
}

impl Default for CannyThresholds {
    fn default() -> Self {
        CannyThresholds::Auto
    }
}

/// Weights of the candidate score terms. Each term is normalized to
/// `[0, 1]` before weighting, so relative magnitudes are what matters.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreWeights {
    /// Object area relative to the largest surviving candidate.
    pub area: f64,
    /// Proximity to the search center, `1 - distance / max_distance`.
    pub centrality: f64,
    /// Mean of circularity, solidity and convexity.
    pub regularity: f64,
    /// Gradient support sampled from the edge map around the seed.
    pub edge_strength: f64,
}

impl ScoreWeights {
    /// Sum of all weights; the score divides by this.
    pub fn total(&self) -> f64 {
        self.area + self.centrality + self.regularity + self.edge_strength
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        WeightProfile::Balanced.weights()
    }
}

/// Named scoring presets chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightProfile {
    /// Even pull between size, position and shape quality.
    #[default]
    Balanced,
    /// Favor whatever sits closest to the search center.
    PrioritizeCenter,
    /// Favor the largest valid object in frame.
    PrioritizeSize,
    /// Favor high-contrast, well-supported boundaries.
    PrioritizeEdges,
}

impl WeightProfile {
    /// The weight set this profile stands for.
    pub fn weights(self) -> ScoreWeights {
        match self {
            WeightProfile::Balanced => ScoreWeights {
                area: 0.30,
                centrality: 0.30,
                regularity: 0.25,
                edge_strength: 0.15,
            },
            WeightProfile::PrioritizeCenter => ScoreWeights {
                area: 0.15,
                centrality: 0.55,
                regularity: 0.20,
                edge_strength: 0.10,
            },
            WeightProfile::PrioritizeSize => ScoreWeights {
                area: 0.55,
                centrality: 0.15,
                regularity: 0.20,
                edge_strength: 0.10,
            },
            WeightProfile::PrioritizeEdges => ScoreWeights {
                area: 0.20,
                centrality: 0.20,
                regularity: 0.20,
                edge_strength: 0.40,
            },
        }
    }
}

/// Bounds a contour must satisfy before it can be scored at all.
///
/// One table for every caller; the gate is applied identically wherever
/// candidates are filtered.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidityBounds {
    /// Minimum object area as a fraction of frame area.
    #[serde(default = "default_min_area_fraction")]
    pub min_area_fraction: f64,
    /// Maximum object area as a fraction of frame area.
    #[serde(default = "default_max_area_fraction")]
    pub max_area_fraction: f64,
    /// Minimum bounding-box side in pixels.
    #[serde(default = "default_min_bbox_side_px")]
    pub min_bbox_side_px: u32,
    /// Maximum centroid distance from the search center, as a fraction of
    /// the frame half-diagonal.
    #[serde(default = "default_centrality_radius_frac")]
    pub centrality_radius_frac: f64,
    /// Accepted aspect-ratio band (width / height).
    #[serde(default = "default_min_aspect")]
    pub min_aspect: f64,
    #[serde(default = "default_max_aspect")]
    pub max_aspect: f64,
    /// Accepted circularity band. The upper end sits above the ideal 1.0
    /// to absorb quantization overshoot on small contours.
    #[serde(default = "default_min_circularity")]
    pub min_circularity: f64,
    #[serde(default = "default_max_circularity")]
    pub max_circularity: f64,
    /// Accepted solidity band.
    #[serde(default = "default_min_solidity")]
    pub min_solidity: f64,
    #[serde(default = "default_max_solidity")]
    pub max_solidity: f64,
}

impl ValidityBounds {
    pub const DEFAULT_MIN_AREA_FRACTION: f64 = 8e-4;
    pub const DEFAULT_MAX_AREA_FRACTION: f64 = 0.60;
    pub const DEFAULT_MIN_BBOX_SIDE_PX: u32 = 12;
    pub const DEFAULT_CENTRALITY_RADIUS_FRAC: f64 = 0.75;
    pub const DEFAULT_MIN_ASPECT: f64 = 0.05;
    pub const DEFAULT_MAX_ASPECT: f64 = 20.0;
    pub const DEFAULT_MIN_CIRCULARITY: f64 = 0.05;
    pub const DEFAULT_MAX_CIRCULARITY: f64 = 1.25;
    pub const DEFAULT_MIN_SOLIDITY: f64 = 0.30;
    pub const DEFAULT_MAX_SOLIDITY: f64 = 1.05;
}

fn default_min_area_fraction() -> f64 {
    ValidityBounds::DEFAULT_MIN_AREA_FRACTION
}
fn default_max_area_fraction() -> f64 {
    ValidityBounds::DEFAULT_MAX_AREA_FRACTION
}
fn default_min_bbox_side_px() -> u32 {
    ValidityBounds::DEFAULT_MIN_BBOX_SIDE_PX
}
fn default_centrality_radius_frac() -> f64 {
    ValidityBounds::DEFAULT_CENTRALITY_RADIUS_FRAC
}
fn default_min_aspect() -> f64 {
    ValidityBounds::DEFAULT_MIN_ASPECT
}
fn default_max_aspect() -> f64 {
    ValidityBounds::DEFAULT_MAX_ASPECT
}
fn default_min_circularity() -> f64 {
    ValidityBounds::DEFAULT_MIN_CIRCULARITY
}
fn default_max_circularity() -> f64 {
    ValidityBounds::DEFAULT_MAX_CIRCULARITY
}
fn default_min_solidity() -> f64 {
    ValidityBounds::DEFAULT_MIN_SOLIDITY
}
fn default_max_solidity() -> f64 {
    ValidityBounds::DEFAULT_MAX_SOLIDITY
}

impl Default for ValidityBounds {
    fn default() -> Self {
        Self {
            min_area_fraction: Self::DEFAULT_MIN_AREA_FRACTION,
            max_area_fraction: Self::DEFAULT_MAX_AREA_FRACTION,
            min_bbox_side_px: Self::DEFAULT_MIN_BBOX_SIDE_PX,
            centrality_radius_frac: Self::DEFAULT_CENTRALITY_RADIUS_FRAC,
            min_aspect: Self::DEFAULT_MIN_ASPECT,
            max_aspect: Self::DEFAULT_MAX_ASPECT,
            min_circularity: Self::DEFAULT_MIN_CIRCULARITY,
            max_circularity: Self::DEFAULT_MAX_CIRCULARITY,
            min_solidity: Self::DEFAULT_MIN_SOLIDITY,
            max_solidity: Self::DEFAULT_MAX_SOLIDITY,
        }
    }
}

/// Full per-call configuration of the analysis pipeline.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DetectionParams {
    /// Profile the tunables below were derived from. Informational once
    /// individual fields are overridden.
    #[serde(default)]
    pub quality: QualityProfile,
    /// Gaussian sigma for preprocessing. Kernel size follows as
    /// `ceil(6 sigma)` forced odd.
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    /// Magnitude norm for the edge detector.
    #[serde(default)]
    pub gradient_norm: GradientNorm,
    /// Hysteresis threshold source.
    #[serde(default)]
    pub thresholds: CannyThresholds,
    /// Cap on boundary seeds considered per frame.
    #[serde(default = "default_max_seeds")]
    pub max_seeds: usize,
    /// Contours with fewer traced points are dropped before analysis.
    #[serde(default = "default_min_contour_points")]
    pub min_contour_points: usize,
    /// Douglas-Peucker tolerance in pixels.
    #[serde(default = "default_simplify_epsilon")]
    pub simplify_epsilon: f64,
    /// Anchor for seed search, the centrality gate and the centrality
    /// score, in pixel coordinates. `None` anchors to the frame center;
    /// interactive callers pass the user's tap point instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_center: Option<[f32; 2]>,
    /// Candidate validity gate.
    #[serde(default)]
    pub validity: ValidityBounds,
    /// Candidate scoring weights.
    #[serde(default)]
    pub weights: ScoreWeights,
    /// Maximum number of measured objects returned, best first.
    #[serde(default = "default_max_detections")]
    pub max_detections: usize,
    /// Measurement reporting options.
    #[serde(default)]
    pub measure: MeasureConfig,
}

impl DetectionParams {
    pub const DEFAULT_BLUR_SIGMA: f32 = 1.4;
    pub const DEFAULT_MAX_SEEDS: usize = 96;
    pub const DEFAULT_MIN_CONTOUR_POINTS: usize = 8;
    pub const DEFAULT_SIMPLIFY_EPSILON: f64 = 1.2;
    pub const DEFAULT_MAX_DETECTIONS: usize = 1;

    /// Smallest frame side the pipeline accepts.
    pub const MIN_FRAME_SIDE: u32 = 16;

    /// Defaults with `profile`'s tunables applied.
    pub fn with_profile(profile: QualityProfile) -> Self {
        let mut params = Self {
            quality: profile,
            ..Self::default()
        };
        params.apply_profile();
        params
    }

    /// Rewrites the profile-derived fields (`blur_sigma`, `gradient_norm`,
    /// `max_seeds`, `simplify_epsilon`) from `self.quality`, leaving the
    /// gate, weights and measurement options untouched.
    pub fn apply_profile(&mut self) {
        self.blur_sigma = self.quality.blur_sigma();
        self.gradient_norm = self.quality.gradient_norm();
        self.max_seeds = self.quality.max_seeds();
        self.simplify_epsilon = self.quality.simplify_epsilon();
    }

    /// Checks internal consistency. Called once at the pipeline entry so
    /// stage code can assume well-formed parameters.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !(self.blur_sigma > 0.0) || !self.blur_sigma.is_finite() {
            return Err(AnalysisError::InvalidParams(format!(
                "blur_sigma must be positive and finite, got {}",
                self.blur_sigma
            )));
        }
        if let CannyThresholds::Manual { low, high } = self.thresholds {
            if !(low >= 0.0) || !(high > low) {
                return Err(AnalysisError::InvalidParams(format!(
                    "manual thresholds need 0 <= low < high, got low={low} high={high}"
                )));
            }
        }
        if self.max_seeds == 0 {
            return Err(AnalysisError::InvalidParams(
                "max_seeds must be at least 1".into(),
            ));
        }
        if self.max_detections == 0 {
            return Err(AnalysisError::InvalidParams(
                "max_detections must be at least 1".into(),
            ));
        }
        if !(self.simplify_epsilon >= 0.0) {
            return Err(AnalysisError::InvalidParams(format!(
                "simplify_epsilon must be non-negative, got {}",
                self.simplify_epsilon
            )));
        }
        if let Some([x, y]) = self.search_center {
            if !x.is_finite() || !y.is_finite() {
                return Err(AnalysisError::InvalidParams(format!(
                    "search_center must be finite, got [{x}, {y}]"
                )));
            }
        }
        let v = &self.validity;
        if !(v.min_area_fraction >= 0.0)
            || !(v.max_area_fraction <= 1.0)
            || v.min_area_fraction >= v.max_area_fraction
        {
            return Err(AnalysisError::InvalidParams(format!(
                "area fraction band [{}, {}] is not a sub-range of [0, 1]",
                v.min_area_fraction, v.max_area_fraction
            )));
        }
        if v.min_aspect <= 0.0 || v.min_aspect >= v.max_aspect {
            return Err(AnalysisError::InvalidParams(format!(
                "aspect band [{}, {}] is empty or non-positive",
                v.min_aspect, v.max_aspect
            )));
        }
        let w = &self.weights;
        if w.area < 0.0 || w.centrality < 0.0 || w.regularity < 0.0 || w.edge_strength < 0.0 {
            return Err(AnalysisError::InvalidParams(
                "score weights must be non-negative".into(),
            ));
        }
        if w.total() <= 0.0 {
            return Err(AnalysisError::InvalidParams(
                "at least one score weight must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_blur_sigma() -> f32 {
    DetectionParams::DEFAULT_BLUR_SIGMA
}
fn default_max_seeds() -> usize {
    DetectionParams::DEFAULT_MAX_SEEDS
}
fn default_min_contour_points() -> usize {
    DetectionParams::DEFAULT_MIN_CONTOUR_POINTS
}
fn default_simplify_epsilon() -> f64 {
    DetectionParams::DEFAULT_SIMPLIFY_EPSILON
}
fn default_max_detections() -> usize {
    DetectionParams::DEFAULT_MAX_DETECTIONS
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            quality: QualityProfile::Balanced,
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            gradient_norm: GradientNorm::L2,
            thresholds: CannyThresholds::Auto,
            max_seeds: Self::DEFAULT_MAX_SEEDS,
            min_contour_points: Self::DEFAULT_MIN_CONTOUR_POINTS,
            simplify_epsilon: Self::DEFAULT_SIMPLIFY_EPSILON,
            search_center: None,
            validity: ValidityBounds::default(),
            weights: ScoreWeights::default(),
            max_detections: Self::DEFAULT_MAX_DETECTIONS,
            measure: MeasureConfig::default(),
        }
    }
}
