//! Central moments and Hu invariants of a simplified contour polygon.
//!
//! Moments integrate over the enclosed region, edge by edge through the
//! shoelace decomposition, and normalize by area powers. That makes the
//! seven Hu values invariant to translation, rotation and scale, so the
//! same object read at two distances reports the same signature. They go
//! through `sign(h) * ln(|h| + 1)` at the end to stay in a comparable
//! numeric range.

/// Second and third order central moments of the enclosed region.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CentralMoments {
    /// Enclosed area standing in for mass.
    pub m00: f64,
    pub mu20: f64,
    pub mu11: f64,
    pub mu02: f64,
    pub mu30: f64,
    pub mu21: f64,
    pub mu12: f64,
    pub mu03: f64,
}

impl CentralMoments {
    /// Region moments about the area centroid. Degenerate polygons
    /// (fewer than three vertices, or collinear ones) enclose nothing
    /// and yield all zeros.
    pub fn from_points(points: &[[i32; 2]]) -> Self {
        let zero = Self {
            m00: 0.0,
            mu20: 0.0,
            mu11: 0.0,
            mu02: 0.0,
            mu30: 0.0,
            mu21: 0.0,
            mu12: 0.0,
            mu03: 0.0,
        };
        if points.len() < 3 {
            return zero;
        }

        // raw moments m_pq = integral of x^p y^q over the interior,
        // accumulated per edge from the shoelace cross term
        let mut m00 = 0.0f64;
        let mut m10 = 0.0f64;
        let mut m01 = 0.0f64;
        let mut m20 = 0.0f64;
        let mut m11 = 0.0f64;
        let mut m02 = 0.0f64;
        let mut m30 = 0.0f64;
        let mut m21 = 0.0f64;
        let mut m12 = 0.0f64;
        let mut m03 = 0.0f64;
        for i in 0..points.len() {
            let [xi, yi] = points[i].map(f64::from);
            let [xj, yj] = points[(i + 1) % points.len()].map(f64::from);
            let a = xi * yj - xj * yi;
            m00 += a;
            m10 += a * (xi + xj);
            m01 += a * (yi + yj);
            m20 += a * (xi * xi + xi * xj + xj * xj);
            m11 += a * (2.0 * xi * yi + xi * yj + xj * yi + 2.0 * xj * yj);
            m02 += a * (yi * yi + yi * yj + yj * yj);
            m30 += a * (xi * xi * xi + xi * xi * xj + xi * xj * xj + xj * xj * xj);
            m21 += a
                * (3.0 * xi * xi * yi
                    + xi * xi * yj
                    + 2.0 * xi * xj * (yi + yj)
                    + xj * xj * yi
                    + 3.0 * xj * xj * yj);
            m12 += a
                * (3.0 * yi * yi * xi
                    + yi * yi * xj
                    + 2.0 * yi * yj * (xi + xj)
                    + yj * yj * xi
                    + 3.0 * yj * yj * xj);
            m03 += a * (yi * yi * yi + yi * yi * yj + yi * yj * yj + yj * yj * yj);
        }
        m00 /= 2.0;
        m10 /= 6.0;
        m01 /= 6.0;
        m20 /= 12.0;
        m11 /= 24.0;
        m02 /= 12.0;
        m30 /= 20.0;
        m21 /= 60.0;
        m12 /= 60.0;
        m03 /= 20.0;
        // clockwise winding negates every raw moment
        if m00 < 0.0 {
            m00 = -m00;
            m10 = -m10;
            m01 = -m01;
            m20 = -m20;
            m11 = -m11;
            m02 = -m02;
            m30 = -m30;
            m21 = -m21;
            m12 = -m12;
            m03 = -m03;
        }
        if m00 <= f64::EPSILON {
            return zero;
        }

        let cx = m10 / m00;
        let cy = m01 / m00;
        Self {
            m00,
            mu20: m20 - cx * m10,
            mu11: m11 - cx * m01,
            mu02: m02 - cy * m01,
            mu30: m30 - 3.0 * cx * m20 + 2.0 * cx * cx * m10,
            mu21: m21 - 2.0 * cx * m11 - cy * m20 + 2.0 * cx * cx * m01,
            mu12: m12 - 2.0 * cy * m11 - cx * m02 + 2.0 * cy * cy * m10,
            mu03: m03 - 3.0 * cy * m02 + 2.0 * cy * cy * m01,
        }
    }

    /// Normalized moment `mu_pq / m00^(1 + (p + q) / 2)`.
    fn eta(&self, mu: f64, order: i32) -> f64 {
        if self.m00 <= 0.0 {
            return 0.0;
        }
        mu / self.m00.powf(1.0 + f64::from(order) / 2.0)
    }

    /// Principal-axis angle in degrees, in `(-90, 90]`.
    pub fn orientation_deg(&self) -> f64 {
        if self.m00 <= 0.0 {
            return 0.0;
        }
        let angle = 0.5 * (2.0 * self.mu11).atan2(self.mu20 - self.mu02);
        angle.to_degrees()
    }

    /// The seven Hu invariants after the log transform.
    pub fn hu_invariants(&self) -> [f64; 7] {
        let n20 = self.eta(self.mu20, 2);
        let n11 = self.eta(self.mu11, 2);
        let n02 = self.eta(self.mu02, 2);
        let n30 = self.eta(self.mu30, 3);
        let n21 = self.eta(self.mu21, 3);
        let n12 = self.eta(self.mu12, 3);
        let n03 = self.eta(self.mu03, 3);

        let q30_12 = n30 + n12;
        let q21_03 = n21 + n03;

        let h1 = n20 + n02;
        let h2 = (n20 - n02).powi(2) + 4.0 * n11 * n11;
        let h3 = (n30 - 3.0 * n12).powi(2) + (3.0 * n21 - n03).powi(2);
        let h4 = q30_12.powi(2) + q21_03.powi(2);
        let h5 = (n30 - 3.0 * n12) * q30_12 * (q30_12.powi(2) - 3.0 * q21_03.powi(2))
            + (3.0 * n21 - n03) * q21_03 * (3.0 * q30_12.powi(2) - q21_03.powi(2));
        let h6 = (n20 - n02) * (q30_12.powi(2) - q21_03.powi(2))
            + 4.0 * n11 * q30_12 * q21_03;
        let h7 = (3.0 * n21 - n03) * q30_12 * (q30_12.powi(2) - 3.0 * q21_03.powi(2))
            - (n30 - 3.0 * n12) * q21_03 * (3.0 * q30_12.powi(2) - q21_03.powi(2));

        [h1, h2, h3, h4, h5, h6, h7].map(log_scale)
    }
}

/// Sign-preserving log compression, `sign(h) * ln(|h| + 1)`.
fn log_scale(h: f64) -> f64 {
    h.signum() * (h.abs() + 1.0).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: i32) -> Vec<[i32; 2]> {
        vec![[0, 0], [side, 0], [side, side], [0, side]]
    }

    #[test]
    fn unit_square_matches_closed_forms() {
        // side a: area a^2, mu20 = mu02 = a^4/12, odd moments vanish
        let m = CentralMoments::from_points(&square(6));
        assert!((m.m00 - 36.0).abs() < 1e-9);
        assert!((m.mu20 - 108.0).abs() < 1e-9);
        assert!((m.mu02 - 108.0).abs() < 1e-9);
        assert!(m.mu11.abs() < 1e-9);
        assert!(m.mu30.abs() < 1e-9);
        assert!(m.mu03.abs() < 1e-9);
    }

    #[test]
    fn symmetric_region_has_balanced_second_moments() {
        let m = CentralMoments::from_points(&square(7));
        assert!((m.mu11).abs() < 1e-9);
        assert!((m.mu20 - m.mu02).abs() < 1e-9);
        let hu = m.hu_invariants();
        // h2 collapses when the two axes carry equal spread
        assert!(hu[1].abs() < 1e-9, "h2 = {}", hu[1]);
    }

    #[test]
    fn winding_direction_does_not_change_the_moments() {
        let mut rev = square(9);
        rev.reverse();
        let a = CentralMoments::from_points(&square(9));
        let b = CentralMoments::from_points(&rev);
        assert!((a.m00 - b.m00).abs() < 1e-9);
        assert!((a.mu20 - b.mu20).abs() < 1e-9);
        assert!((a.mu30 - b.mu30).abs() < 1e-9);
    }

    #[test]
    fn hu_invariants_ignore_translation() {
        let base: Vec<[i32; 2]> = vec![[0, 0], [9, 1], [11, 5], [4, 8], [-2, 4], [3, 2]];
        let shifted: Vec<[i32; 2]> = base.iter().map(|p| [p[0] + 40, p[1] - 13]).collect();
        let a = CentralMoments::from_points(&base).hu_invariants();
        let b = CentralMoments::from_points(&shifted).hu_invariants();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn hu_invariants_ignore_quarter_turns() {
        // (x, y) -> (-y, x) stays on the integer grid, so the comparison
        // is exact up to float noise
        let base: Vec<[i32; 2]> = vec![[0, 0], [9, 1], [11, 5], [4, 8], [-2, 4], [3, 2]];
        let rotated: Vec<[i32; 2]> = base.iter().map(|p| [-p[1], p[0]]).collect();
        let a = CentralMoments::from_points(&base).hu_invariants();
        let b = CentralMoments::from_points(&rotated).hu_invariants();
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-9, "h{} drifted: {x} vs {y}", i + 1);
        }
    }

    #[test]
    fn hu_invariants_ignore_scale() {
        // area-power normalization cancels the scale exactly, integer
        // coordinates keep the tenfold copy exact too
        let a = CentralMoments::from_points(&square(10)).hu_invariants();
        let b = CentralMoments::from_points(&square(100)).hu_invariants();
        for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
            assert!((x - y).abs() < 1e-9, "h{} drifted: {x} vs {y}", i + 1);
        }
        // h1 of any square is the log-compressed 1/6
        assert!((a[0] - (1.0f64 / 6.0 + 1.0).ln()).abs() < 1e-9, "h1 = {}", a[0]);
    }

    #[test]
    fn orientation_follows_the_long_axis() {
        let horizontal = [[0, 0], [40, 0], [40, 6], [0, 6]];
        let d = CentralMoments::from_points(&horizontal).orientation_deg();
        assert!(d.abs() < 1.0, "expected near-horizontal, got {d}");

        // thin box along y = x
        let diagonal = [[0, 0], [30, 30], [26, 34], [-4, 4]];
        let d = CentralMoments::from_points(&diagonal).orientation_deg();
        assert!((d - 45.0).abs() < 1.0, "expected 45 degrees, got {d}");
    }

    #[test]
    fn degenerate_input_stays_finite() {
        for degenerate in [&[][..], &[[3, 4]][..], &[[0, 0], [2, 0], [4, 0]][..]] {
            let m = CentralMoments::from_points(degenerate);
            assert_eq!(m.m00, 0.0);
            assert_eq!(m.orientation_deg(), 0.0);
            assert!(m.hu_invariants().iter().all(|h| h.is_finite()));
        }
    }
}
