//! Contour extraction: centrality-biased seed search, Moore boundary
//! tracing over the edge map and Douglas-Peucker simplification.

mod seed;
mod simplify;
mod trace;

pub use seed::find_seeds;
pub use simplify::simplify_contour;
pub use trace::trace_boundary;

/// Closed pixel boundary in trace order, plus the seed it grew from.
///
/// The last point connects implicitly back to the first. Non-degenerate
/// geometry needs at least three points; shorter sequences are rejected
/// upstream.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Contour {
    /// Boundary pixels in walk order.
    pub points: Vec<[i32; 2]>,
    /// Edge pixel the trace started from.
    pub seed: [i32; 2],
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
