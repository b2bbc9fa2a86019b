//! Stateful front end over the analysis pipeline.
//!
//! [`Analyzer`] owns the detection parameters, the active calibration
//! state, the depth model and a rolling history of results. Frames can
//! arrive as grayscale or color images or as raw interleaved buffers;
//! every entry point funnels into the same pipeline run and records the
//! outcome in the history, which is also what automatic calibration
//! anchors to.

use std::time::{SystemTime, UNIX_EPOCH};

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::calib::{self, CalibrationState, ReferenceCatalog};
use crate::error::{AnalysisError, CalibrationError};
use crate::history::AnalysisHistory;
use crate::measure::{BlendedDepthModel, DepthModel};
use crate::params::DetectionParams;
use crate::pipeline::{self, FrameAnalysis};
use crate::preprocess::{rgb_to_gray, rgba_to_gray};
use crate::select;
use crate::units::LengthUnit;

/// Seconds since the Unix epoch, zero on a clock set before it.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Measurement session: parameters, calibration, depth model, history.
///
/// All state is explicit and per instance. Two analyzers never share
/// anything, which keeps concurrent sessions and tests independent.
#[derive(Debug)]
pub struct Analyzer {
    params: DetectionParams,
    calibration: CalibrationState,
    depth_model: Box<dyn DepthModel>,
    history: AnalysisHistory,
}

impl Analyzer {
    /// New session with the given parameters, an uncalibrated scale and
    /// the blended depth heuristic.
    pub fn new(params: DetectionParams) -> Result<Self, AnalysisError> {
        params.validate()?;
        Ok(Self {
            params,
            calibration: CalibrationState::uncalibrated(),
            depth_model: Box::new(BlendedDepthModel::default()),
            history: AnalysisHistory::default(),
        })
    }

    /// Replace the depth model, builder style.
    pub fn with_depth_model(mut self, model: Box<dyn DepthModel>) -> Self {
        self.depth_model = model;
        self
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    /// Swap in new parameters after validating them. On error the
    /// previous parameters stay active.
    pub fn set_params(&mut self, params: DetectionParams) -> Result<(), AnalysisError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Install an externally built state, e.g. a persisted device profile.
    pub fn set_calibration(&mut self, state: CalibrationState) {
        self.calibration = state;
    }

    /// Forget the active scale; measurements return to pixel units.
    pub fn clear_calibration(&mut self) {
        self.calibration = CalibrationState::uncalibrated();
    }

    pub fn history(&self) -> &AnalysisHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Analyze a grayscale frame using the wall clock.
    pub fn analyze_gray(&mut self, gray: &GrayImage) -> Result<FrameAnalysis, AnalysisError> {
        self.analyze_gray_at(gray, unix_now())
    }

    /// Analyze a grayscale frame at an explicit timestamp.
    ///
    /// The timestamp drives calibration freshness checks; pinning it
    /// makes a run reproducible bit for bit.
    pub fn analyze_gray_at(
        &mut self,
        gray: &GrayImage,
        now_unix: u64,
    ) -> Result<FrameAnalysis, AnalysisError> {
        let analysis = pipeline::run(
            gray,
            &self.params,
            &self.calibration,
            self.depth_model.as_ref(),
            now_unix,
        )?;
        self.history.push(analysis.clone());
        Ok(analysis)
    }

    /// Analyze any decoded image; color data is collapsed to luminance.
    pub fn analyze_image(&mut self, image: &DynamicImage) -> Result<FrameAnalysis, AnalysisError> {
        self.analyze_gray(&image.to_luma8())
    }

    /// Analyze a raw interleaved RGBA buffer, `width * height * 4` bytes.
    pub fn analyze_rgba(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<FrameAnalysis, AnalysisError> {
        let frame = RgbaImage::from_raw(width, height, data.to_vec()).ok_or(
            AnalysisError::BufferSizeMismatch {
                len: data.len(),
                width,
                height,
                channels: 4,
            },
        )?;
        self.analyze_gray(&rgba_to_gray(&frame))
    }

    /// Analyze a raw interleaved RGB buffer, `width * height * 3` bytes.
    pub fn analyze_rgb(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<FrameAnalysis, AnalysisError> {
        let frame = RgbImage::from_raw(width, height, data.to_vec()).ok_or(
            AnalysisError::BufferSizeMismatch {
                len: data.len(),
                width,
                height,
                channels: 3,
            },
        )?;
        self.analyze_gray(&rgb_to_gray(&frame))
    }

    /// Analyze a raw single-channel buffer, `width * height` bytes.
    pub fn analyze_luma(
        &mut self,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Result<FrameAnalysis, AnalysisError> {
        let frame = GrayImage::from_raw(width, height, data.to_vec()).ok_or(
            AnalysisError::BufferSizeMismatch {
                len: data.len(),
                width,
                height,
                channels: 1,
            },
        )?;
        self.analyze_gray(&frame)
    }

    /// Calibrate from a span the user measured on screen. `certainty`
    /// is the caller's trust in that span, `[0, 1]`; it becomes the
    /// state's confidence and sets the error margin on every
    /// measurement made under this scale.
    pub fn calibrate_manual(
        &mut self,
        span_px: f64,
        known: f64,
        unit: LengthUnit,
        certainty: f64,
    ) -> Result<&CalibrationState, CalibrationError> {
        self.calibration = calib::calibrate_manual(span_px, known, unit, certainty, unix_now())?;
        Ok(&self.calibration)
    }

    /// Calibrate from a detected reference object.
    ///
    /// Without an explicit `catalog` the builtin one is used; without a
    /// `reference_id` the entry is picked by aspect ratio.
    pub fn calibrate_reference(
        &mut self,
        span_px: [f64; 2],
        reference_id: Option<&str>,
        catalog: Option<&ReferenceCatalog>,
    ) -> Result<&CalibrationState, CalibrationError> {
        let builtin;
        let catalog = match catalog {
            Some(c) => c,
            None => {
                builtin = ReferenceCatalog::default();
                &builtin
            }
        };
        self.calibration = calib::calibrate_reference(span_px, reference_id, catalog, unix_now())?;
        Ok(&self.calibration)
    }

    /// Calibrate from the best detection of the most recent analysis.
    ///
    /// The fraction of the frame the detection covers picks an assumed
    /// physical size band, and its closeness to the search anchor sets
    /// how far the confidence rises within that band. Fails with
    /// [`CalibrationError::EmptyDetection`] when the history is empty or
    /// the latest frame measured nothing.
    pub fn calibrate_automatic(&mut self) -> Result<&CalibrationState, CalibrationError> {
        let (span, area_fraction, centrality) = {
            let analysis = self
                .history
                .latest()
                .ok_or(CalibrationError::EmptyDetection)?;
            let best = analysis.best().ok_or(CalibrationError::EmptyDetection)?;
            let shape = &best.detection.shape;
            let center = self.params.search_center.unwrap_or([
                analysis.width as f32 / 2.0,
                analysis.height as f32 / 2.0,
            ]);
            let frame_area = f64::from(analysis.width) * f64::from(analysis.height);
            (
                [f64::from(shape.bbox.width()), f64::from(shape.bbox.height())],
                shape.area / frame_area.max(f64::EPSILON),
                select::centrality(shape, analysis.width, analysis.height, center),
            )
        };
        self.calibration = calib::calibrate_automatic(span, area_fraction, centrality, unix_now())?;
        Ok(&self.calibration)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(DetectionParams::default()).expect("default parameters must be valid")
    }
}
