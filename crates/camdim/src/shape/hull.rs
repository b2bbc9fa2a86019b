//! Convex hull by Andrew's monotone chain, the sort-based variant of the
//! Graham scan.

/// Cross product of `o->a` and `o->b` in integer arithmetic.
fn cross(o: [i32; 2], a: [i32; 2], b: [i32; 2]) -> i64 {
    let oax = i64::from(a[0]) - i64::from(o[0]);
    let oay = i64::from(a[1]) - i64::from(o[1]);
    let obx = i64::from(b[0]) - i64::from(o[0]);
    let oby = i64::from(b[1]) - i64::from(o[1]);
    oax * oby - oay * obx
}

/// Convex hull of `points` in counterclockwise order without repeating the
/// first vertex. Collinear points along hull edges are dropped, so every
/// returned vertex is a strict corner. Inputs with fewer than three
/// distinct points come back sorted and deduplicated.
pub fn convex_hull(points: &[[i32; 2]]) -> Vec<[i32; 2]> {
    let mut sorted: Vec<[i32; 2]> = points.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut hull: Vec<[i32; 2]> = Vec::with_capacity(sorted.len() * 2);
    // lower chain, then upper chain over the same sorted run
    for &p in &sorted {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev() {
        while hull.len() >= lower_len
            && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(hull: &[[i32; 2]], p: [i32; 2]) -> bool {
        if hull.len() < 3 {
            return hull.contains(&p);
        }
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            if cross(a, b, p) < 0 {
                return false;
            }
        }
        true
    }

    #[test]
    fn hull_of_square_cloud_is_the_four_corners() {
        let mut pts = vec![[0, 0], [10, 0], [10, 10], [0, 10]];
        pts.extend([[5, 5], [3, 7], [8, 2], [5, 0], [10, 4]]);
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        for corner in [[0, 0], [10, 0], [10, 10], [0, 10]] {
            assert!(hull.contains(&corner));
        }
    }

    #[test]
    fn hull_is_convex_and_contains_every_input_point() {
        let pts: Vec<[i32; 2]> = vec![
            [3, 1],
            [12, 4],
            [9, 14],
            [1, 9],
            [6, 6],
            [14, 9],
            [2, 3],
            [7, 0],
            [11, 12],
        ];
        let hull = convex_hull(&pts);
        for i in 0..hull.len() {
            let a = hull[i];
            let b = hull[(i + 1) % hull.len()];
            let c = hull[(i + 2) % hull.len()];
            assert!(cross(a, b, c) > 0, "non-convex turn at {b:?}");
        }
        for p in &pts {
            assert!(contains(&hull, *p), "{p:?} escaped the hull");
        }
    }

    #[test]
    fn collinear_input_reduces_to_a_segment() {
        let pts: Vec<[i32; 2]> = (0..6).map(|i| [i, 2 * i]).collect();
        let hull = convex_hull(&pts);
        assert_eq!(hull, vec![[0, 0], [5, 10]]);
    }

    #[test]
    fn duplicate_points_are_ignored() {
        let pts = vec![[0, 0], [4, 0], [4, 4], [0, 0], [4, 0], [0, 4]];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
    }
}
