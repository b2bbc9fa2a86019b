//! Pixel-to-millimeter scale calibration.
//!
//! Strategies in descending trust order: a manually measured span, a
//! recognized reference object from the [`ReferenceCatalog`], a capped
//! size heuristic and a stored device profile. Every state carries a
//! confidence and the relative error margin implied by it. A state older
//! than 24 hours or below the confidence floor stops validating, and
//! measurements fall back to pixel units instead of carrying a stale
//! scale.

mod catalog;

pub use catalog::{CatalogError, ReferenceCatalog, ReferenceEntry};

use crate::error::CalibrationError;
use crate::units::LengthUnit;

/// Lifetime of a calibration before it reports as stale.
pub const CALIBRATION_TTL_SECS: u64 = 86_400;
/// States below this confidence never validate.
pub const MIN_CONFIDENCE: f64 = 0.7;
/// Hard ceiling on the confidence a size heuristic can claim.
pub const AUTO_CONFIDENCE_CAP: f64 = 0.8;
/// Aspect-ratio deviation accepted when matching catalog entries.
pub const DEFAULT_ASPECT_TOLERANCE_PCT: f64 = 15.0;
/// Certainty assumed for a manual span when the caller has no better
/// estimate of their own measuring accuracy.
pub const DEFAULT_MANUAL_CERTAINTY: f64 = 0.95;

/// Relative error floor from pixel quantization of the measured span.
const QUANTIZATION_MARGIN: f64 = 0.02;

/// Size heuristic bands: minimum covered area fraction, assumed long-side
/// length in millimeters, base confidence of the band. Scanned top down;
/// the zero row catches everything small.
const AUTO_SIZE_TABLE: [(f64, f64, f64); 4] = [
    (0.25, 180.0, 0.55),
    (0.10, 140.0, 0.62),
    (0.04, 100.0, 0.65),
    (0.00, 70.0, 0.50),
];
/// Confidence added on top of the band base for a perfectly centered
/// detection.
const AUTO_CENTRALITY_BONUS: f64 = 0.15;

/// Relative error band implied by a confidence level: the quantization
/// floor plus the full confidence gap.
fn margin_for(confidence: f64) -> f64 {
    (QUANTIZATION_MARGIN + (1.0 - confidence)).clamp(0.0, 1.0)
}

/// How the active scale was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationMethod {
    /// User measured a known span on screen.
    Manual,
    /// Matched against a catalog object of known size.
    ReferenceObject,
    /// Size heuristic from a dominant detection.
    Automatic,
    /// Scale stored for this camera model.
    DeviceProfile,
    /// No usable scale; measurements stay in pixels.
    #[default]
    Uncalibrated,
}

/// Active scale with its provenance and age.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationState {
    pub method: CalibrationMethod,
    /// Pixels that cover one millimeter at the object plane.
    pub pixels_per_mm: f64,
    /// Trust in the scale, `[0, 1]`.
    pub confidence: f64,
    /// Relative error band measurements under this scale may carry,
    /// `[0, 1]`.
    pub error_margin: f64,
    /// Unix timestamp of the calibration capture.
    pub captured_at_unix: u64,
    /// Catalog id of the matched reference, when one was used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
}

impl CalibrationState {
    /// The explicit no-scale state.
    pub fn uncalibrated() -> Self {
        Self {
            method: CalibrationMethod::Uncalibrated,
            pixels_per_mm: 0.0,
            confidence: 0.0,
            error_margin: 1.0,
            captured_at_unix: 0,
            reference_id: None,
        }
    }

    /// A scale persisted for the capturing device.
    pub fn device_profile(
        pixels_per_mm: f64,
        certainty: f64,
        now_unix: u64,
    ) -> Result<Self, CalibrationError> {
        if !(pixels_per_mm > 0.0) || !pixels_per_mm.is_finite() {
            return Err(CalibrationError::NonPositiveSpan(pixels_per_mm));
        }
        if !(0.0..=1.0).contains(&certainty) {
            return Err(CalibrationError::CertaintyOutOfRange(certainty));
        }
        Ok(Self {
            method: CalibrationMethod::DeviceProfile,
            pixels_per_mm,
            confidence: certainty,
            error_margin: margin_for(certainty),
            captured_at_unix: now_unix,
            reference_id: None,
        })
    }

    /// Seconds since the capture, zero when `now` precedes it.
    pub fn age_secs(&self, now_unix: u64) -> u64 {
        now_unix.saturating_sub(self.captured_at_unix)
    }

    /// Whether the state outlived [`CALIBRATION_TTL_SECS`].
    pub fn is_expired(&self, now_unix: u64) -> bool {
        self.age_secs(now_unix) > CALIBRATION_TTL_SECS
    }

    /// A state measures only while it is fresh, confident and carries a
    /// positive scale.
    pub fn is_valid(&self, now_unix: u64) -> bool {
        self.method != CalibrationMethod::Uncalibrated
            && self.pixels_per_mm > 0.0
            && self.pixels_per_mm.is_finite()
            && self.confidence >= MIN_CONFIDENCE
            && !self.is_expired(now_unix)
    }
}

/// Scale from a span the user measured on screen against a known length.
///
/// `certainty` is the caller's trust in their own span measurement,
/// `[0, 1]`; it becomes the state's confidence and sets the error
/// margin. [`DEFAULT_MANUAL_CERTAINTY`] suits an unassisted on-screen
/// measurement.
pub fn calibrate_manual(
    span_px: f64,
    known: f64,
    unit: LengthUnit,
    certainty: f64,
    now_unix: u64,
) -> Result<CalibrationState, CalibrationError> {
    if !(span_px > 0.0) || !span_px.is_finite() {
        return Err(CalibrationError::NonPositiveSpan(span_px));
    }
    if !(known > 0.0) || !known.is_finite() {
        return Err(CalibrationError::NonPositiveMeasurement(known));
    }
    if !(0.0..=1.0).contains(&certainty) {
        return Err(CalibrationError::CertaintyOutOfRange(certainty));
    }
    let known_mm = known * unit.millimeters_per_unit();
    let state = CalibrationState {
        method: CalibrationMethod::Manual,
        pixels_per_mm: span_px / known_mm,
        confidence: certainty,
        error_margin: margin_for(certainty),
        captured_at_unix: now_unix,
        reference_id: None,
    };
    tracing::debug!(scale = state.pixels_per_mm, certainty, "manual calibration accepted");
    Ok(state)
}

/// Scale from an object with known physical dimensions.
///
/// With `reference_id` the entry is taken verbatim; otherwise the catalog
/// entry whose aspect ratio best matches the observed box is used. The
/// two per-axis scales are averaged, and their relative divergence
/// (a perspective or mismatch tell) discounts the entry's accuracy to
/// form the confidence.
pub fn calibrate_reference(
    span_px: [f64; 2],
    reference_id: Option<&str>,
    catalog: &ReferenceCatalog,
    now_unix: u64,
) -> Result<CalibrationState, CalibrationError> {
    let [w_px, h_px] = span_px;
    if !(w_px > 0.0) || !w_px.is_finite() {
        return Err(CalibrationError::NonPositiveSpan(w_px));
    }
    if !(h_px > 0.0) || !h_px.is_finite() {
        return Err(CalibrationError::NonPositiveSpan(h_px));
    }
    let long_px = w_px.max(h_px);
    let short_px = w_px.min(h_px);
    let observed_aspect = long_px / short_px;

    let entry = match reference_id {
        Some(id) => catalog
            .get(id)
            .ok_or_else(|| CalibrationError::UnknownReference(id.to_string()))?,
        None => catalog
            .best_aspect_match(observed_aspect, DEFAULT_ASPECT_TOLERANCE_PCT)
            .ok_or(CalibrationError::NoCatalogMatch {
                aspect: observed_aspect,
                tolerance_pct: DEFAULT_ASPECT_TOLERANCE_PCT,
            })?,
    };

    let scale_long = long_px / entry.long_side_mm();
    let scale_short = short_px / entry.short_side_mm();
    let divergence = (scale_long - scale_short).abs() / scale_long.max(scale_short);
    let confidence = (entry.accuracy * (1.0 - divergence)).clamp(0.0, 1.0);
    let state = CalibrationState {
        method: CalibrationMethod::ReferenceObject,
        pixels_per_mm: (scale_long + scale_short) / 2.0,
        confidence,
        error_margin: margin_for(confidence),
        captured_at_unix: now_unix,
        reference_id: Some(entry.id.clone()),
    };
    tracing::debug!(
        reference = %entry.id,
        scale = state.pixels_per_mm,
        divergence,
        "reference calibration accepted"
    );
    Ok(state)
}

/// Scale guessed from a dominant detection without any user input.
///
/// How much of the frame the detection covers picks an assumed long-side
/// length and a base confidence from the builtin size table; the
/// detection's centrality adds a fixed bonus on top, never past
/// [`AUTO_CONFIDENCE_CAP`]. Small or badly off-center objects score
/// below [`MIN_CONFIDENCE`] and are rejected outright.
pub fn calibrate_automatic(
    span_px: [f64; 2],
    area_fraction: f64,
    centrality: f64,
    now_unix: u64,
) -> Result<CalibrationState, CalibrationError> {
    let long_px = span_px[0].max(span_px[1]);
    if !(long_px > 0.0) || !long_px.is_finite() {
        return Err(CalibrationError::NonPositiveSpan(long_px));
    }
    let area_fraction = if area_fraction.is_finite() {
        area_fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let centrality = if centrality.is_finite() {
        centrality.clamp(0.0, 1.0)
    } else {
        0.0
    };

    let (_, nominal_mm, base_confidence) = AUTO_SIZE_TABLE
        .into_iter()
        .find(|&(floor, _, _)| area_fraction >= floor)
        .unwrap_or(AUTO_SIZE_TABLE[AUTO_SIZE_TABLE.len() - 1]);
    let confidence =
        (base_confidence + AUTO_CENTRALITY_BONUS * centrality).min(AUTO_CONFIDENCE_CAP);
    if confidence < MIN_CONFIDENCE {
        return Err(CalibrationError::BelowConfidenceFloor {
            confidence,
            floor: MIN_CONFIDENCE,
        });
    }
    let state = CalibrationState {
        method: CalibrationMethod::Automatic,
        pixels_per_mm: long_px / nominal_mm,
        confidence,
        error_margin: margin_for(confidence),
        captured_at_unix: now_unix,
        reference_id: None,
    };
    tracing::debug!(
        scale = state.pixels_per_mm,
        confidence,
        area_fraction,
        "automatic calibration accepted"
    );
    Ok(state)
}
