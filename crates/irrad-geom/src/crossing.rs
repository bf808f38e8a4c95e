//! Finite segment crossing tests (closed-form).

use irrad_math::{Point3, Vec3};

/// Determinant magnitude below this is treated as parallel, no crossing.
const DET_TOLERANCE: f64 = 1e-12;

/// Result of a crossing test.
#[derive(Debug, Clone, Copy)]
pub struct Crossing {
    /// Parametric position of the crossing along the probe segment,
    /// in `[0, 1]`.
    pub s: f64,
    /// The crossing point.
    pub point: Point3,
}

/// Intersect two finite 2D segments `a0 → a1` and `b0 → b1`.
///
/// Solves the 2×2 system on the segment parameterization with Cramer's
/// rule. Both parameters must lie in `[0, 1]`: a value outside that
/// range means the crossing point lies outside a finite extent, not
/// just behind the probe. The z components are ignored.
pub fn segment_crossing(a0: &Point3, a1: &Point3, b0: &Point3, b1: &Point3) -> Option<Crossing> {
    let d = a1 - a0;
    let e = b1 - b0;
    let r = b0 - a0;

    // [ d.x  -e.x ] [s]   [r.x]
    // [ d.y  -e.y ] [t] = [r.y]
    let det = d.x * (-e.y) - (-e.x) * d.y;
    if det.abs() < DET_TOLERANCE {
        return None; // Parallel or degenerate
    }

    let s = (r.x * (-e.y) - (-e.x) * r.y) / det;
    let t = (d.x * r.y - r.x * d.y) / det;

    if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&t) {
        return None;
    }

    Some(Crossing { s, point: a0 + s * d })
}

/// Intersect a finite 3D segment `a0 → a1` with a planar parallelogram
/// patch `{origin, e_u, e_v}`.
///
/// Solves `a0 + s·d = origin + u·e_u + v·e_v` with Cramer's rule on the
/// 3×3 system; all of `s, u, v` must lie in `[0, 1]`.
pub fn patch_crossing(
    a0: &Point3,
    a1: &Point3,
    origin: &Point3,
    e_u: &Vec3,
    e_v: &Vec3,
) -> Option<Crossing> {
    let d = a1 - a0;
    let r = origin - a0;

    // Column matrix [d, -e_u, -e_v]; det = d · (e_u × e_v)
    let n = e_u.cross(e_v);
    let det = d.dot(&n);
    if det.abs() < DET_TOLERANCE {
        return None; // Probe lies in or parallel to the patch plane
    }

    let s = r.dot(&n) / det;
    let u = d.dot(&e_v.cross(&r)) / det;
    let v = d.dot(&r.cross(e_u)) / det;

    if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
        return None;
    }

    Some(Crossing { s, point: a0 + s * d })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use irrad_math::Vec3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn test_segment_crossing_analytic() {
        // Diagonals of the unit square cross at (0.5, 0.5)
        let hit = segment_crossing(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 1.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(hit.s, 0.5, max_relative = 1e-14);
        assert_relative_eq!(hit.point.x, 0.5, max_relative = 1e-14);
        assert_relative_eq!(hit.point.y, 0.5, max_relative = 1e-14);
    }

    #[test]
    fn test_segment_crossing_parallel() {
        let hit = segment_crossing(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &p(1.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_crossing_outside_extent() {
        // Lines cross at (2, 0), beyond the end of the first segment
        let hit = segment_crossing(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(2.0, -1.0, 0.0),
            &p(2.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_segment_crossing_behind_probe() {
        // Crossing at negative s
        let hit = segment_crossing(
            &p(0.0, 0.0, 0.0),
            &p(1.0, 0.0, 0.0),
            &p(-1.0, -1.0, 0.0),
            &p(-1.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_patch_crossing_analytic() {
        // Unit patch in the xy-plane, probe straight down through (0.3, 0.4)
        let hit = patch_crossing(
            &p(0.3, 0.4, 5.0),
            &p(0.3, 0.4, -5.0),
            &p(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(hit.s, 0.5, max_relative = 1e-14);
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-14);
        assert_relative_eq!(hit.point.x, 0.3, max_relative = 1e-14);
        assert_relative_eq!(hit.point.y, 0.4, max_relative = 1e-14);
    }

    #[test]
    fn test_patch_crossing_outside_patch() {
        let hit = patch_crossing(
            &p(1.5, 0.5, 5.0),
            &p(1.5, 0.5, -5.0),
            &p(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_patch_crossing_parallel() {
        let hit = patch_crossing(
            &p(0.5, 0.5, 1.0),
            &p(1.5, 0.5, 1.0),
            &p(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_patch_crossing_short_probe() {
        // Probe ends before reaching the patch plane
        let hit = patch_crossing(
            &p(0.5, 0.5, 5.0),
            &p(0.5, 0.5, 1.0),
            &p(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(hit.is_none());
    }

    #[test]
    fn test_tilted_patch() {
        // Patch tilted 45° about the x axis, probe down the z axis at its center
        let hit = patch_crossing(
            &p(0.5, 0.0, 5.0),
            &p(0.5, 0.0, -5.0),
            &p(0.0, -0.5, -0.5),
            &Vec3::new(1.0, 0.0, 0.0),
            &Vec3::new(0.0, 1.0, 1.0),
        )
        .unwrap();
        assert_relative_eq!(hit.point.z, 0.0, epsilon = 1e-14);
        assert_relative_eq!(hit.point.y, 0.0, epsilon = 1e-14);
    }
}
