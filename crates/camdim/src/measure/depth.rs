//! Heuristic estimation of the third box dimension.
//!
//! A single frame carries no direct depth signal, so the estimate is a
//! reliability-weighted blend of four weak cues: vertical position in the
//! frame, relative size, boundary sharpness and distance from the frame
//! center. Each cue votes for a thickness expressed as a fraction of the
//! object's minor pixel span. The blend is pulled toward a prior when the
//! detection itself is shaky, then clamped to a sane band.

/// Per-object inputs the depth cues read.
#[derive(Debug, Clone, Copy)]
pub struct DepthContext {
    /// Bounding-box width in pixels.
    pub bbox_w_px: f64,
    /// Bounding-box height in pixels.
    pub bbox_h_px: f64,
    /// Object centroid in frame coordinates.
    pub centroid: [f64; 2],
    /// Enclosed area in square pixels.
    pub area_px: f64,
    pub frame_w: u32,
    pub frame_h: u32,
    /// Edge-map density around the seed, `[0, 1]`.
    pub edge_support: f64,
    /// Confidence of the detection being measured, `[0, 1]`.
    pub detection_confidence: f64,
}

/// A depth guess and how much to trust it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthEstimate {
    /// Estimated thickness in pixels at the object plane.
    pub depth_px: f64,
    /// Trust in the estimate, `[0, 1]`.
    pub confidence: f64,
}

/// Strategy for deriving the third box dimension of a detection.
pub trait DepthModel: std::fmt::Debug + Send + Sync {
    fn estimate(&self, ctx: &DepthContext) -> DepthEstimate;
}

/// The default four-cue blend.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlendedDepthModel {
    /// Thickness fraction assumed when no cue can be trusted.
    pub prior_ratio: f64,
    /// Lower clamp on the blended thickness fraction.
    pub min_ratio: f64,
    /// Upper clamp on the blended thickness fraction.
    pub max_ratio: f64,
}

impl BlendedDepthModel {
    pub const DEFAULT_PRIOR_RATIO: f64 = 0.35;
    pub const DEFAULT_MIN_RATIO: f64 = 0.05;
    pub const DEFAULT_MAX_RATIO: f64 = 0.90;
}

impl Default for BlendedDepthModel {
    fn default() -> Self {
        Self {
            prior_ratio: Self::DEFAULT_PRIOR_RATIO,
            min_ratio: Self::DEFAULT_MIN_RATIO,
            max_ratio: Self::DEFAULT_MAX_RATIO,
        }
    }
}

impl DepthModel for BlendedDepthModel {
    fn estimate(&self, ctx: &DepthContext) -> DepthEstimate {
        let minor_px = ctx.bbox_w_px.min(ctx.bbox_h_px).max(0.0);
        let frame_area = f64::from(ctx.frame_w) * f64::from(ctx.frame_h);
        let half_w = f64::from(ctx.frame_w) / 2.0;
        let half_h = f64::from(ctx.frame_h) / 2.0;
        let half_diag = (half_w * half_w + half_h * half_h).sqrt();

        // vertical position: lower objects sit closer to the camera
        let y_norm = (ctx.centroid[1] / f64::from(ctx.frame_h)).clamp(0.0, 1.0);
        let v_perspective = 0.2 + 0.4 * y_norm;
        let r_perspective = 0.25 + 0.5 * ((y_norm - 0.5).abs() * 2.0);

        // relative size on a log curve, large objects read as bulkier
        let area_frac = (ctx.area_px / frame_area).clamp(0.0, 1.0);
        let v_size = 0.15 + 0.5 * (1.0 + 9.0 * area_frac).ln() / 10f64.ln();
        let r_size = 0.5 + 0.2 * area_frac;

        // boundary sharpness as a focus proxy
        let focus = ctx.edge_support.clamp(0.0, 1.0);
        let v_focus = 0.2 + 0.4 * focus;
        let r_focus = 0.2 + 0.6 * focus;

        // central objects face the camera head-on, keep them near the prior
        let dx = ctx.centroid[0] - half_w;
        let dy = ctx.centroid[1] - half_h;
        let d_norm = ((dx * dx + dy * dy).sqrt() / half_diag).clamp(0.0, 1.0);
        let v_center = self.prior_ratio * (1.2 - 0.4 * d_norm);
        let r_center = 0.3 + 0.4 * (1.0 - d_norm);

        let votes = [
            (v_perspective, r_perspective),
            (v_size, r_size),
            (v_focus, r_focus),
            (v_center, r_center),
        ];
        let total_reliability: f64 = votes.iter().map(|(_, r)| r).sum();
        let blended = if total_reliability > f64::EPSILON {
            votes
                .iter()
                .map(|(v, r)| v * (r / total_reliability))
                .sum()
        } else {
            self.prior_ratio
        };

        let trust = ctx.detection_confidence.clamp(0.0, 1.0);
        let ratio = (trust * blended + (1.0 - trust) * self.prior_ratio)
            .clamp(self.min_ratio, self.max_ratio);

        DepthEstimate {
            depth_px: ratio * minor_px,
            confidence: ((total_reliability / votes.len() as f64) * trust).clamp(0.0, 1.0),
        }
    }
}

/// Fixed thickness fraction of the minor span. Useful when the object
/// class is known ahead of time, and as a deterministic stand-in.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FixedRatioDepthModel {
    pub ratio: f64,
}

impl DepthModel for FixedRatioDepthModel {
    fn estimate(&self, ctx: &DepthContext) -> DepthEstimate {
        DepthEstimate {
            depth_px: self.ratio * ctx.bbox_w_px.min(ctx.bbox_h_px).max(0.0),
            confidence: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_at(cy: f64) -> DepthContext {
        DepthContext {
            bbox_w_px: 120.0,
            bbox_h_px: 100.0,
            centroid: [320.0, cy],
            area_px: 9000.0,
            frame_w: 640,
            frame_h: 480,
            edge_support: 0.5,
            detection_confidence: 1.0,
        }
    }

    #[test]
    fn lower_objects_read_thicker() {
        let model = BlendedDepthModel::default();
        let low = model.estimate(&ctx_at(384.0));
        let high = model.estimate(&ctx_at(144.0));
        assert!(
            low.depth_px > high.depth_px,
            "low {} vs high {}",
            low.depth_px,
            high.depth_px
        );
    }

    #[test]
    fn zero_detection_confidence_falls_back_to_the_prior() {
        let model = BlendedDepthModel::default();
        let mut ctx = ctx_at(400.0);
        ctx.detection_confidence = 0.0;
        let est = model.estimate(&ctx);
        assert!((est.depth_px - model.prior_ratio * 100.0).abs() < 1e-9);
        assert_eq!(est.confidence, 0.0);
    }

    #[test]
    fn blend_stays_inside_the_clamp_band() {
        let model = BlendedDepthModel::default();
        for cy in [0.0, 120.0, 240.0, 360.0, 479.0] {
            for edge in [0.0, 0.5, 1.0] {
                for conf in [0.0, 0.4, 1.0] {
                    let mut ctx = ctx_at(cy);
                    ctx.edge_support = edge;
                    ctx.detection_confidence = conf;
                    let est = model.estimate(&ctx);
                    let ratio = est.depth_px / 100.0;
                    assert!(
                        (model.min_ratio..=model.max_ratio).contains(&ratio),
                        "ratio {ratio} escaped"
                    );
                    assert!((0.0..=1.0).contains(&est.confidence));
                }
            }
        }
    }

    #[test]
    fn narrow_clamp_band_binds() {
        let model = BlendedDepthModel {
            prior_ratio: 0.9,
            min_ratio: 0.1,
            max_ratio: 0.2,
        };
        let est = model.estimate(&ctx_at(240.0));
        assert!((est.depth_px - 0.2 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_ratio_scales_the_minor_span() {
        let model = FixedRatioDepthModel { ratio: 0.4 };
        let est = model.estimate(&ctx_at(240.0));
        assert_eq!(est.depth_px, 40.0);
        assert_eq!(est.confidence, 1.0);
    }
}
