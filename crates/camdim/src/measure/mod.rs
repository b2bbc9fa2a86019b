//! Conversion of pixel-space detections into physical measurements.
//!
//! Lengths divide by the calibrated pixels-per-millimeter scale, areas by
//! its square. The third dimension comes from the configured
//! [`DepthModel`], and volume and surface area are those of the
//! axis-aligned `width x height x depth` box. Shape ratios that drop
//! under elongation are also reported with the aspect penalty divided
//! out, and every measurement carries the calibration's relative error
//! band. Without a valid calibration the same numbers are reported in
//! pixel units and the object is tagged
//! [`CalibrationMethod::Uncalibrated`].

mod depth;

pub use depth::{BlendedDepthModel, DepthContext, DepthEstimate, DepthModel, FixedRatioDepthModel};

use crate::calib::{CalibrationMethod, CalibrationState};
use crate::pipeline::Detection;
use crate::units::{round_to, LengthUnit};

/// Reporting options for the measurement stage.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasureConfig {
    /// Unit of every reported length. Ignored while uncalibrated, which
    /// always reports pixels.
    #[serde(default)]
    pub unit: LengthUnit,
    /// Decimal places kept on reported values.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl MeasureConfig {
    pub const DEFAULT_DECIMALS: u32 = 2;
}

fn default_decimals() -> u32 {
    MeasureConfig::DEFAULT_DECIMALS
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            unit: LengthUnit::default(),
            decimals: Self::DEFAULT_DECIMALS,
        }
    }
}

/// Physical dimensions of one detected object.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PhysicalMeasurement {
    /// Unit of every linear field below; areas use its square, volumes
    /// its cube.
    pub unit: LengthUnit,
    /// Bounding-box width.
    pub width: f64,
    /// Bounding-box height.
    pub height: f64,
    /// Estimated thickness.
    pub depth: f64,
    /// Enclosed area.
    pub area: f64,
    /// Boundary length.
    pub perimeter: f64,
    /// Volume of the bounding box extruded by `depth`.
    pub volume: f64,
    /// Surface area of that box.
    pub surface_area: f64,
    /// Diameter of the circle with the same area.
    pub equivalent_diameter: f64,
    /// Mean span corrected for elongation: the arithmetic mean of width
    /// and height scaled by `2 sqrt(rho) / (1 + rho)`, which lands on
    /// their geometric mean.
    pub aspect_corrected_span: f64,
    /// Circularity with the elongation penalty divided out; any
    /// rectangle reads the square's `pi / 4`. Capped at 1.0.
    pub corrected_circularity: f64,
    /// Solidity under the same elongation gain, capped at 1.0.
    pub corrected_solidity: f64,
    /// Compactness with the elongation gain divided out; any rectangle
    /// reads the square's 16.
    pub corrected_compactness: f64,
    /// Trust in the depth estimate, `[0, 1]`.
    pub depth_confidence: f64,
    /// Relative error band inherited from the calibration, 1.0 in
    /// pixel reports.
    pub error_margin: f64,
    /// Scale used for the conversion; absent in pixel reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_pixels_per_mm: Option<f64>,
}

/// A detection together with its physical measurement.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MeasuredObject {
    pub detection: Detection,
    /// Provenance of the scale, [`CalibrationMethod::Uncalibrated`] when
    /// the measurement fell back to pixels.
    pub calibration_method: CalibrationMethod,
    pub measurement: PhysicalMeasurement,
}

impl MeasuredObject {
    /// Whether real-world units were available.
    pub fn is_calibrated(&self) -> bool {
        self.calibration_method != CalibrationMethod::Uncalibrated
    }
}

/// Converts one detection into physical numbers.
///
/// An invalid or expired calibration is not an error: the object comes
/// back measured in pixels and tagged uncalibrated.
pub fn measure_detection(
    detection: &Detection,
    calibration: &CalibrationState,
    model: &dyn DepthModel,
    config: &MeasureConfig,
    frame_w: u32,
    frame_h: u32,
    now_unix: u64,
) -> MeasuredObject {
    let shape = &detection.shape;
    let width_px = f64::from(shape.bbox.width());
    let height_px = f64::from(shape.bbox.height());

    let ctx = DepthContext {
        bbox_w_px: width_px,
        bbox_h_px: height_px,
        centroid: shape.centroid,
        area_px: shape.area,
        frame_w,
        frame_h,
        edge_support: detection.edge_support,
        detection_confidence: detection.confidence,
    };
    let depth_est = model.estimate(&ctx);

    let calibrated = calibration.is_valid(now_unix);
    if !calibrated {
        tracing::debug!(
            age_secs = calibration.age_secs(now_unix),
            confidence = calibration.confidence,
            "no valid calibration, reporting pixel units"
        );
    }
    let method = if calibrated {
        calibration.method
    } else {
        CalibrationMethod::Uncalibrated
    };
    let (unit, scale) = if calibrated && config.unit != LengthUnit::Pixels {
        (config.unit, Some(calibration.pixels_per_mm))
    } else {
        (LengthUnit::Pixels, None)
    };

    let to_unit = |px: f64| match scale {
        Some(s) => LengthUnit::Millimeters.convert(px / s, unit),
        None => px,
    };
    let to_unit_area = |px2: f64| match scale {
        Some(s) => LengthUnit::Millimeters.convert_area(px2 / (s * s), unit),
        None => px2,
    };

    let width = to_unit(width_px);
    let height = to_unit(height_px);
    let depth = to_unit(depth_est.depth_px);
    let area = to_unit_area(shape.area);
    let perimeter = to_unit(shape.perimeter);
    let equivalent_diameter = 2.0 * (area / std::f64::consts::PI).sqrt();
    let rho = shape.aspect_ratio.max(f64::EPSILON);
    let aspect_corrected_span = (width + height) / 2.0 * (2.0 * rho.sqrt() / (1.0 + rho));
    // factor by which stretching a square to aspect rho lowers its
    // circularity; symmetric in rho and 1/rho
    let elongation_gain = (1.0 + rho).powi(2) / (4.0 * rho);
    let corrected_circularity = (shape.circularity * elongation_gain).min(1.0);
    let corrected_solidity = (shape.solidity * elongation_gain).min(1.0);
    let corrected_compactness = shape.compactness / elongation_gain;
    let error_margin = if calibrated { calibration.error_margin } else { 1.0 };
    let volume = width * height * depth;
    let surface_area = 2.0 * (width * height + width * depth + height * depth);

    let d = config.decimals;
    MeasuredObject {
        detection: detection.clone(),
        calibration_method: method,
        measurement: PhysicalMeasurement {
            unit,
            width: round_to(width, d),
            height: round_to(height, d),
            depth: round_to(depth, d),
            area: round_to(area, d),
            perimeter: round_to(perimeter, d),
            volume: round_to(volume, d),
            surface_area: round_to(surface_area, d),
            equivalent_diameter: round_to(equivalent_diameter, d),
            aspect_corrected_span: round_to(aspect_corrected_span, d),
            corrected_circularity: round_to(corrected_circularity, d),
            corrected_solidity: round_to(corrected_solidity, d),
            corrected_compactness: round_to(corrected_compactness, d),
            depth_confidence: round_to(depth_est.confidence, d),
            error_margin: round_to(error_margin, d),
            scale_pixels_per_mm: scale,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calib::{calibrate_manual, DEFAULT_MANUAL_CERTAINTY};
    use crate::contour::Contour;
    use crate::shape::ShapeDescriptor;

    const NOW: u64 = 1_700_000_000;

    fn rect_detection(w: i32, h: i32) -> Detection {
        let points = vec![[0, 0], [w - 1, 0], [w - 1, h - 1], [0, h - 1]];
        Detection {
            shape: ShapeDescriptor::from_polygon(&points),
            contour: Contour {
                points,
                seed: [0, 0],
            },
            score: 0.9,
            confidence: 0.9,
            edge_support: 0.8,
        }
    }

    #[test]
    fn calibrated_card_box_measures_its_true_width() {
        let detection = rect_detection(214, 135);
        let calib = calibrate_manual(214.0, 85.6, LengthUnit::Millimeters, DEFAULT_MANUAL_CERTAINTY, NOW)
            .expect("manual");
        let model = FixedRatioDepthModel { ratio: 0.2 };
        let out = measure_detection(
            &detection,
            &calib,
            &model,
            &MeasureConfig::default(),
            640,
            480,
            NOW,
        );
        assert!(out.is_calibrated());
        assert_eq!(out.measurement.unit, LengthUnit::Millimeters);
        assert!((out.measurement.width - 85.6).abs() < 1e-9);
        assert!((out.measurement.height - 54.0).abs() < 1e-9);
        assert_eq!(out.measurement.scale_pixels_per_mm, Some(calib.pixels_per_mm));
    }

    #[test]
    fn centimeter_report_converts_back_to_millimeters() {
        let detection = rect_detection(214, 135);
        let calib = calibrate_manual(214.0, 85.6, LengthUnit::Millimeters, DEFAULT_MANUAL_CERTAINTY, NOW)
            .expect("manual");
        let model = FixedRatioDepthModel { ratio: 0.2 };
        let config = MeasureConfig {
            unit: LengthUnit::Centimeters,
            decimals: 3,
        };
        let out = measure_detection(&detection, &calib, &model, &config, 640, 480, NOW);
        assert!((out.measurement.width - 8.56).abs() < 1e-9);
        let back = LengthUnit::Centimeters.convert(out.measurement.width, LengthUnit::Millimeters);
        assert!((back - 85.6).abs() < 1e-9);
    }

    #[test]
    fn box_volume_and_surface_follow_the_three_dimensions() {
        let detection = rect_detection(10, 5);
        let calib = CalibrationState::uncalibrated();
        let model = FixedRatioDepthModel { ratio: 0.4 };
        let out = measure_detection(
            &detection,
            &calib,
            &model,
            &MeasureConfig::default(),
            64,
            64,
            NOW,
        );
        // 10 x 5 px box, depth 0.4 * 5 = 2 px
        let m = &out.measurement;
        assert_eq!(m.unit, LengthUnit::Pixels);
        assert_eq!(m.width, 10.0);
        assert_eq!(m.height, 5.0);
        assert_eq!(m.depth, 2.0);
        assert_eq!(m.volume, 100.0);
        assert_eq!(m.surface_area, 160.0);
    }

    #[test]
    fn expired_calibration_reports_pixels() {
        let detection = rect_detection(50, 50);
        let calib = calibrate_manual(250.0, 100.0, LengthUnit::Millimeters, DEFAULT_MANUAL_CERTAINTY, NOW)
            .expect("manual");
        let model = FixedRatioDepthModel { ratio: 0.3 };
        let later = NOW + crate::calib::CALIBRATION_TTL_SECS + 1;
        let out = measure_detection(
            &detection,
            &calib,
            &model,
            &MeasureConfig::default(),
            640,
            480,
            later,
        );
        assert!(!out.is_calibrated());
        assert_eq!(out.calibration_method, CalibrationMethod::Uncalibrated);
        assert_eq!(out.measurement.unit, LengthUnit::Pixels);
        assert_eq!(out.measurement.width, 50.0);
        assert_eq!(out.measurement.scale_pixels_per_mm, None);
        // a pixel fallback carries the full error band
        assert_eq!(out.measurement.error_margin, 1.0);
    }

    #[test]
    fn decimals_zero_rounds_to_integers() {
        let detection = rect_detection(214, 135);
        let calib = calibrate_manual(214.0, 85.6, LengthUnit::Millimeters, DEFAULT_MANUAL_CERTAINTY, NOW)
            .expect("manual");
        let model = FixedRatioDepthModel { ratio: 0.2 };
        let config = MeasureConfig {
            unit: LengthUnit::Millimeters,
            decimals: 0,
        };
        let out = measure_detection(&detection, &calib, &model, &config, 640, 480, NOW);
        assert_eq!(out.measurement.width, 86.0);
        assert_eq!(out.measurement.height, 54.0);
        assert_eq!(out.measurement.depth_confidence.fract(), 0.0);
        assert_eq!(out.measurement.error_margin.fract(), 0.0);
    }

    #[test]
    fn corrected_span_is_the_geometric_mean() {
        let detection = rect_detection(214, 135);
        let calib = calibrate_manual(214.0, 85.6, LengthUnit::Millimeters, DEFAULT_MANUAL_CERTAINTY, NOW)
            .expect("manual");
        let model = FixedRatioDepthModel { ratio: 0.2 };
        let config = MeasureConfig {
            unit: LengthUnit::Millimeters,
            decimals: 4,
        };
        let out = measure_detection(&detection, &calib, &model, &config, 640, 480, NOW);
        let m = &out.measurement;
        let expected = (m.width * m.height).sqrt();
        assert!(
            (m.aspect_corrected_span - expected).abs() < 0.01,
            "span {} vs geometric mean {expected}",
            m.aspect_corrected_span
        );
    }

    #[test]
    fn corrected_descriptors_remove_the_elongation_penalty() {
        // 10:1 bar: raw circularity sits near pi / 4 / 3.025, raw
        // compactness near 16 * 3.025
        let detection = rect_detection(400, 40);
        let model = FixedRatioDepthModel { ratio: 0.2 };
        let config = MeasureConfig {
            unit: LengthUnit::Millimeters,
            decimals: 4,
        };
        let out = measure_detection(
            &detection,
            &CalibrationState::uncalibrated(),
            &model,
            &config,
            640,
            480,
            NOW,
        );
        let m = &out.measurement;
        let shape = &out.detection.shape;
        assert!(m.corrected_circularity > shape.circularity);
        assert!((m.corrected_circularity - std::f64::consts::FRAC_PI_4).abs() < 0.03);
        assert!((m.corrected_compactness - 16.0).abs() < 0.5);
        assert_eq!(m.corrected_solidity, 1.0);
    }

    #[test]
    fn measurements_inherit_the_calibration_margin() {
        let detection = rect_detection(214, 135);
        let calib =
            calibrate_manual(214.0, 85.6, LengthUnit::Millimeters, 0.9, NOW).expect("manual");
        let model = FixedRatioDepthModel { ratio: 0.2 };
        let out = measure_detection(
            &detection,
            &calib,
            &model,
            &MeasureConfig::default(),
            640,
            480,
            NOW,
        );
        // 0.02 quantization floor plus the 0.1 certainty gap
        assert!((out.measurement.error_margin - 0.12).abs() < 1e-9);
    }

    #[test]
    fn depth_confidence_honors_the_decimal_setting() {
        let detection = rect_detection(120, 90);
        let model = BlendedDepthModel::default();
        let config = MeasureConfig {
            unit: LengthUnit::Millimeters,
            decimals: 1,
        };
        let out = measure_detection(
            &detection,
            &CalibrationState::uncalibrated(),
            &model,
            &config,
            640,
            480,
            NOW,
        );
        let dc = out.measurement.depth_confidence;
        assert!((0.0..=1.0).contains(&dc));
        assert!((dc * 10.0 - (dc * 10.0).round()).abs() < 1e-9);
    }
}
