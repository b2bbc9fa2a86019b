//! camdim — single-frame object detection and physical measurement.
//!
//! Takes one camera frame, finds the dominant object boundaries and
//! reports real-world dimensions through a pixel-to-millimeter
//! calibration. The pipeline stages are:
//!
//! 1. **Preprocess** – BT.709 luminance extraction, separable Gaussian blur.
//! 2. **Edges** – Sobel gradients, non-maximum suppression, hysteresis
//!    with histogram-derived thresholds.
//! 3. **Contours** – centrality-biased seeding, Moore boundary tracing,
//!    Douglas-Peucker simplification.
//! 4. **Shape** – area, perimeter, convex hull, enclosing circle, moment
//!    invariants and the derived shape ratios.
//! 5. **Select** – validity gate plus weighted scoring, best candidates
//!    first.
//! 6. **Calibrate** – manual span, reference object, size heuristic or
//!    stored device profile, each with confidence and a freshness TTL.
//! 7. **Measure** – unit conversion, depth estimation, box volume and
//!    surface area.
//!
//! # Public API
//! [`Analyzer`] is the primary entry point: it owns parameters,
//! calibration and a result history. [`pipeline::run`] is the stateless
//! one-shot equivalent. [`DetectionParams`] with [`QualityProfile`] and
//! [`WeightProfile`] cover tuning; results come back as
//! [`FrameAnalysis`] holding [`MeasuredObject`]s.
//!
//! An empty frame is a normal outcome, not an error, and an expired or
//! low-confidence calibration degrades output to pixel units instead of
//! failing the call.

pub mod analyzer;
pub mod calib;
pub mod contour;
pub mod edge;
pub mod error;
pub mod history;
pub mod measure;
pub mod params;
pub mod pipeline;
pub mod preprocess;
mod select;
pub mod shape;
#[cfg(test)]
mod test_utils;
pub mod units;

pub use analyzer::Analyzer;
pub use calib::{
    CalibrationMethod, CalibrationState, CatalogError, ReferenceCatalog, ReferenceEntry,
};
pub use contour::Contour;
pub use error::{AnalysisError, CalibrationError};
pub use history::AnalysisHistory;
pub use measure::{
    BlendedDepthModel, DepthContext, DepthEstimate, DepthModel, FixedRatioDepthModel,
    MeasureConfig, MeasuredObject, PhysicalMeasurement,
};
pub use params::{
    CannyThresholds, DetectionParams, GradientNorm, QualityProfile, ScoreWeights, ValidityBounds,
    WeightProfile,
};
pub use pipeline::{Detection, FrameAnalysis, FrameDiagnostics};
pub use shape::{Aabb, EnclosingCircle, ShapeDescriptor};
pub use units::LengthUnit;
