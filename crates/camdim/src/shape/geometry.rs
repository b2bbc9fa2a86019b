//! Polygon primitives: area, perimeter, centroid, bounding box and an
//! approximate minimum enclosing circle.

/// Axis-aligned bounding box of a pixel polygon, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Aabb {
    /// Tight box around `points`. Empty input collapses to a zero box at
    /// the origin.
    pub fn from_points(points: &[[i32; 2]]) -> Self {
        let Some(first) = points.first() else {
            return Self {
                min_x: 0,
                min_y: 0,
                max_x: 0,
                max_y: 0,
            };
        };
        let mut aabb = Self {
            min_x: first[0],
            min_y: first[1],
            max_x: first[0],
            max_y: first[1],
        };
        for p in &points[1..] {
            aabb.min_x = aabb.min_x.min(p[0]);
            aabb.min_y = aabb.min_y.min(p[1]);
            aabb.max_x = aabb.max_x.max(p[0]);
            aabb.max_y = aabb.max_y.max(p[1]);
        }
        aabb
    }

    /// Width in pixels, counting both boundary columns.
    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1).max(0) as u32
    }

    /// Height in pixels, counting both boundary rows.
    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1).max(0) as u32
    }

    /// Box center in continuous coordinates.
    pub fn center(&self) -> [f64; 2] {
        [
            f64::from(self.min_x + self.max_x) / 2.0,
            f64::from(self.min_y + self.max_y) / 2.0,
        ]
    }
}

/// Approximate smallest circle containing a point set.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnclosingCircle {
    pub center: [f64; 2],
    pub radius: f64,
}

fn dist(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn as_f64(p: [i32; 2]) -> [f64; 2] {
    [f64::from(p[0]), f64::from(p[1])]
}

impl EnclosingCircle {
    /// Circle at the bounding-box center whose radius reaches the
    /// farthest vertex. Covers every point by construction; the fixed
    /// anchor overshoots the optimal radius when the shape is asymmetric
    /// about its box.
    pub fn from_points(points: &[[i32; 2]]) -> Self {
        if points.is_empty() {
            return Self {
                center: [0.0, 0.0],
                radius: 0.0,
            };
        }
        let center = Aabb::from_points(points).center();
        let radius = points
            .iter()
            .map(|&p| dist(center, as_f64(p)))
            .fold(0.0f64, f64::max);
        Self { center, radius }
    }
}

/// Signed shoelace sum of a closed polygon; positive for counterclockwise
/// winding in a y-up frame.
fn signed_area(points: &[[i32; 2]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += f64::from(a[0]) * f64::from(b[1]) - f64::from(b[0]) * f64::from(a[1]);
    }
    sum / 2.0
}

/// Unsigned area enclosed by the polygon.
pub fn polygon_area(points: &[[i32; 2]]) -> f64 {
    signed_area(points).abs()
}

/// Closed-loop perimeter, including the edge back to the first vertex.
pub fn polygon_perimeter(points: &[[i32; 2]]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for i in 0..points.len() {
        let a = as_f64(points[i]);
        let b = as_f64(points[(i + 1) % points.len()]);
        sum += dist(a, b);
    }
    sum
}

/// Area-weighted polygon centroid. Degenerate polygons (near-zero area)
/// fall back to the vertex mean so the result is always finite.
pub fn polygon_centroid(points: &[[i32; 2]]) -> [f64; 2] {
    let area = signed_area(points);
    if points.is_empty() {
        return [0.0, 0.0];
    }
    if area.abs() > 1e-9 {
        let mut cx = 0.0f64;
        let mut cy = 0.0f64;
        for i in 0..points.len() {
            let a = points[i];
            let b = points[(i + 1) % points.len()];
            let cross =
                f64::from(a[0]) * f64::from(b[1]) - f64::from(b[0]) * f64::from(a[1]);
            cx += (f64::from(a[0]) + f64::from(b[0])) * cross;
            cy += (f64::from(a[1]) + f64::from(b[1])) * cross;
        }
        let scale = 1.0 / (6.0 * area);
        return [cx * scale, cy * scale];
    }
    let n = points.len() as f64;
    let mut cx = 0.0f64;
    let mut cy = 0.0f64;
    for p in points {
        cx += f64::from(p[0]);
        cy += f64::from(p[1]);
    }
    [cx / n, cy / n]
}
