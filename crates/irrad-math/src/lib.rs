#![warn(missing_docs)]

//! Math types for the irrad radiative-transport kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types for
//! ray tracing on unstructured meshes, plus the angular discretization
//! used to generate ray directions and solid-angle quadrature weights.

use std::f64::consts::PI;

use nalgebra::{Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Physical and numerical constants.
pub mod consts {
    /// Stefan-Boltzmann constant (W / m² K⁴).
    pub const SIGMA: f64 = 5.6696e-8;

    /// A very tiny number, below any physically meaningful quantity.
    pub const TINY: f64 = 1e-30;

    /// A somewhat small number, used for floating comparisons.
    pub const SMALL: f64 = 1e-10;
}

/// Discretization of the unit sphere into ray directions.
///
/// Directions are indexed by `(i_theta, i_phi)` with the polar angle
/// sampled at band midpoints. Each direction carries a solid-angle
/// quadrature weight `Δφ · (cos θ_lo − cos θ_hi)`; the weights of the
/// full grid sum exactly to the total solid angle, `4π` for the sphere
/// and `2π` for the planar (2D) variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AngularGrid {
    n_theta: usize,
    n_phi: usize,
    planar: bool,
}

impl AngularGrid {
    /// Full-sphere discretization with `n_theta` polar bands and `n_phi`
    /// azimuthal sectors.
    pub fn sphere(n_theta: usize, n_phi: usize) -> Self {
        Self {
            n_theta,
            n_phi,
            planar: false,
        }
    }

    /// In-plane discretization for 2D problems: a single polar band at
    /// the equator with `n_phi` azimuthal sectors, total weight `2π`.
    pub fn planar(n_phi: usize) -> Self {
        Self {
            n_theta: 1,
            n_phi,
            planar: true,
        }
    }

    /// Number of polar bands.
    #[inline]
    pub fn n_theta(&self) -> usize {
        self.n_theta
    }

    /// Number of azimuthal sectors.
    #[inline]
    pub fn n_phi(&self) -> usize {
        self.n_phi
    }

    /// Whether this is the planar (2D) variant.
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.planar
    }

    /// Total number of directions.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_theta * self.n_phi
    }

    /// True if the grid has no directions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit direction for the `(i_theta, i_phi)` sample.
    ///
    /// Always a 3-component vector; the planar variant keeps the
    /// direction in the xy-plane.
    pub fn direction(&self, i_theta: usize, i_phi: usize) -> Vec3 {
        let phi = 2.0 * PI * (i_phi as f64 + 0.5) / self.n_phi as f64;
        if self.planar {
            Vec3::new(phi.cos(), phi.sin(), 0.0)
        } else {
            let theta = PI * (i_theta as f64 + 0.5) / self.n_theta as f64;
            Vec3::new(
                theta.sin() * phi.cos(),
                theta.sin() * phi.sin(),
                theta.cos(),
            )
        }
    }

    /// Solid-angle quadrature weight for the `(i_theta, i_phi)` sample.
    pub fn weight(&self, i_theta: usize, _i_phi: usize) -> f64 {
        if self.planar {
            return 2.0 * PI / self.n_phi as f64;
        }
        let theta_lo = PI * i_theta as f64 / self.n_theta as f64;
        let theta_hi = PI * (i_theta + 1) as f64 / self.n_theta as f64;
        let d_phi = 2.0 * PI / self.n_phi as f64;
        d_phi * (theta_lo.cos() - theta_hi.cos())
    }

    /// Total solid angle covered by the grid.
    pub fn total_solid_angle(&self) -> f64 {
        if self.planar {
            2.0 * PI
        } else {
            4.0 * PI
        }
    }

    /// Iterate over all `(i_theta, i_phi)` index pairs.
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize)> {
        let n_phi = self.n_phi;
        (0..self.n_theta).flat_map(move |t| (0..n_phi).map(move |p| (t, p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sphere_weights_sum_to_4pi() {
        for (n_theta, n_phi) in [(1, 1), (2, 3), (5, 8), (16, 32)] {
            let grid = AngularGrid::sphere(n_theta, n_phi);
            let total: f64 = grid.indices().map(|(t, p)| grid.weight(t, p)).sum();
            assert_relative_eq!(total, 4.0 * PI, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_planar_weights_sum_to_2pi() {
        for n_phi in [1, 4, 7, 64] {
            let grid = AngularGrid::planar(n_phi);
            let total: f64 = grid.indices().map(|(t, p)| grid.weight(t, p)).sum();
            assert_relative_eq!(total, 2.0 * PI, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_directions_are_unit() {
        let grid = AngularGrid::sphere(4, 6);
        for (t, p) in grid.indices() {
            assert_relative_eq!(grid.direction(t, p).norm(), 1.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_planar_directions_stay_in_plane() {
        let grid = AngularGrid::planar(8);
        for (t, p) in grid.indices() {
            let dir = grid.direction(t, p);
            assert_eq!(dir.z, 0.0);
            assert_relative_eq!(dir.norm(), 1.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_index_count_matches_len() {
        let grid = AngularGrid::sphere(3, 5);
        assert_eq!(grid.indices().count(), grid.len());
        assert_eq!(grid.len(), 15);
    }
}
