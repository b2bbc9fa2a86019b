//! Error taxonomy for frame analysis and calibration.
//!
//! Only malformed input is a hard error. An empty detection set and an
//! expired calibration are normal outcomes: the first yields a
//! [`FrameAnalysis`](crate::FrameAnalysis) with zero measured objects, the
//! second makes the pipeline report pixel units instead of failing.

use thiserror::Error;

/// Hard failures of the analysis entry points.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Frame smaller than the minimum the pipeline can process.
    #[error("frame {width}x{height} is below the {min}x{min} px minimum")]
    FrameTooSmall { width: u32, height: u32, min: u32 },
    /// Raw buffer length inconsistent with the declared geometry.
    #[error("buffer of {len} bytes does not hold a {width}x{height} frame with {channels} channels")]
    BufferSizeMismatch {
        len: usize,
        width: u32,
        height: u32,
        channels: u32,
    },
    /// Parameter combination that cannot produce a meaningful run.
    #[error("invalid detection parameters: {0}")]
    InvalidParams(String),
}

/// Rejected calibration requests.
///
/// A rejection is reported to the caller and never replaces the active
/// [`CalibrationState`](crate::CalibrationState).
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The caller-supplied known measurement is unusable.
    #[error("known measurement must be positive, got {0}")]
    NonPositiveMeasurement(f64),
    /// The detection's pixel extent is unusable as a calibration baseline.
    #[error("detected pixel span must be positive, got {0}")]
    NonPositiveSpan(f64),
    /// No catalog entry matched the detection's aspect ratio.
    #[error("no reference entry matches aspect ratio {aspect:.3} within {tolerance_pct:.0}% tolerance")]
    NoCatalogMatch { aspect: f64, tolerance_pct: f64 },
    /// A reference id was requested that the catalog does not contain.
    #[error("reference object '{0}' not present in catalog")]
    UnknownReference(String),
    /// Calibration needs at least one detected object to anchor to.
    #[error("cannot calibrate from an empty detection set")]
    EmptyDetection,
    /// Caller-supplied certainty outside `[0, 1]`.
    #[error("certainty must lie in [0, 1], got {0}")]
    CertaintyOutOfRange(f64),
    /// Estimated confidence is too low to activate the new state.
    #[error("calibration confidence {confidence:.2} is below the {floor:.2} floor")]
    BelowConfidenceFloor { confidence: f64, floor: f64 },
}
