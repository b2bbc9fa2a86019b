//! Shape analysis of a simplified contour: geometric measures, convex
//! hull derived ratios, moment invariants.
//!
//! Every ratio that is bounded in the continuous case gets a small
//! tolerance above its ideal ceiling before clamping, so quantization
//! overshoot on coarse polygons is visible instead of silently flattened.

mod geometry;
mod hull;
mod moments;

pub use geometry::{polygon_area, polygon_centroid, polygon_perimeter, Aabb, EnclosingCircle};
pub use hull::convex_hull;
pub use moments::CentralMoments;

/// Headroom added above the ideal 1.0 ceiling of bounded ratios.
pub const RATIO_TOLERANCE: f64 = 0.05;

fn clamp_ratio(v: f64) -> f64 {
    if !v.is_finite() {
        return 0.0;
    }
    v.clamp(0.0, 1.0 + RATIO_TOLERANCE)
}

/// Everything the selector and the measurement stage need to know about
/// one candidate polygon.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeDescriptor {
    /// Enclosed area in square pixels.
    pub area: f64,
    /// Closed boundary length in pixels.
    pub perimeter: f64,
    /// Area-weighted centroid, vertex mean for degenerate polygons.
    pub centroid: [f64; 2],
    /// Pixel bounding box.
    pub bbox: Aabb,
    /// Approximate minimum enclosing circle.
    pub enclosing_circle: EnclosingCircle,
    /// `4 pi A / P^2`, 1.0 for an ideal disc.
    pub circularity: f64,
    /// Area over convex hull area.
    pub solidity: f64,
    /// Hull perimeter over contour perimeter.
    pub convexity: f64,
    /// `P^2 / A`, 16 for a square, `4 pi` for an ideal disc; grows with
    /// boundary complexity.
    pub compactness: f64,
    /// Area over bounding-box area.
    pub extent: f64,
    /// Bounding-box width over height.
    pub aspect_ratio: f64,
    /// Principal-axis angle in degrees, `(-90, 90]`.
    pub orientation_deg: f64,
    /// Log-compressed Hu invariants.
    pub hu: [f64; 7],
}

impl ShapeDescriptor {
    /// Full descriptor of a simplified contour polygon.
    ///
    /// Degenerate polygons (fewer than three vertices, or collinear ones)
    /// come back with zero area and zeroed ratios rather than an error;
    /// the validity gate removes them downstream.
    pub fn from_polygon(points: &[[i32; 2]]) -> Self {
        let area = polygon_area(points);
        let perimeter = polygon_perimeter(points);
        let centroid = polygon_centroid(points);
        let bbox = Aabb::from_points(points);
        let enclosing_circle = EnclosingCircle::from_points(points);

        let hull = convex_hull(points);
        let hull_area = polygon_area(&hull);
        let hull_perimeter = polygon_perimeter(&hull);

        let circularity = if perimeter > f64::EPSILON {
            clamp_ratio(4.0 * std::f64::consts::PI * area / (perimeter * perimeter))
        } else {
            0.0
        };
        let solidity = if hull_area > f64::EPSILON {
            clamp_ratio(area / hull_area)
        } else {
            0.0
        };
        let convexity = if perimeter > f64::EPSILON {
            clamp_ratio(hull_perimeter / perimeter)
        } else {
            0.0
        };
        let compactness = if area > f64::EPSILON {
            perimeter * perimeter / area
        } else {
            0.0
        };
        let bbox_area = f64::from(bbox.width()) * f64::from(bbox.height());
        let extent = if bbox_area > 0.0 {
            clamp_ratio(area / bbox_area)
        } else {
            0.0
        };
        let aspect_ratio = f64::from(bbox.width()) / f64::from(bbox.height().max(1));

        let moments = CentralMoments::from_points(points);

        Self {
            area,
            perimeter,
            centroid,
            bbox,
            enclosing_circle,
            circularity,
            solidity,
            convexity,
            compactness,
            extent,
            aspect_ratio,
            orientation_deg: moments.orientation_deg(),
            hu: moments.hu_invariants(),
        }
    }

    /// Mean of circularity, solidity and convexity with each term capped
    /// at 1.0. Feeds both the candidate score and the reported confidence.
    pub fn regularity(&self) -> f64 {
        (self.circularity.min(1.0) + self.solidity.min(1.0) + self.convexity.min(1.0)) / 3.0
    }
}
