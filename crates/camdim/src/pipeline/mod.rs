//! End-to-end single-frame analysis pipeline.
//!
//! [`run`] chains the stages in order:
//!
//! 1. **Preprocess** – Gaussian blur of the grayscale frame.
//! 2. **Edges** – Canny edge detection with adaptive thresholds.
//! 3. **Seeds** – centrality-biased scan for trace starting points.
//! 4. **Trace** – Moore boundary walk from each unvisited seed.
//! 5. **Simplify** – Douglas-Peucker reduction of traced contours.
//! 6. **Shape** – geometric descriptors per simplified contour.
//! 7. **Select** – validity gate, weighted scoring, ranking.
//! 8. **Measure** – physical measurements via the calibration state.
//!
//! The result types in this module are the serialization surface of the
//! crate: everything needed to persist or compare a frame analysis.

mod result;
mod run;

pub use result::{Detection, FrameAnalysis, FrameDiagnostics};
pub use run::run;
