#![warn(missing_docs)]

//! Ray-face crossing kernel for the irrad radiative-transport engine.
//!
//! Provides the pure, stateless geometry used by the ray search: finite
//! segment/segment crossing in 2D and segment/patch crossing in 3D, both
//! solved in closed form. Small errors here compound over many ray
//! segments, so the kernel works directly on the linear-system
//! parameterization instead of normalized ray forms.
//!
//! - [`FaceGeometry`] - geometric description of one mesh face
//! - [`crossing`] - crossing tests per face kind
//! - [`bbox`] - axis-aligned bounds used to size probe segments

pub mod bbox;
pub mod crossing;

pub use bbox::Aabb;
pub use crossing::{patch_crossing, segment_crossing, Crossing};

use irrad_math::{Point3, Vec3};

/// Geometric description of a single mesh face.
#[derive(Debug, Clone, Copy)]
pub enum FaceGeometry {
    /// An edge of a planar (2D) mesh; the z components are ignored.
    Edge {
        /// First endpoint.
        a: Point3,
        /// Second endpoint.
        b: Point3,
    },
    /// A planar parallelogram patch spanned by two in-plane vectors.
    Patch {
        /// Corner point of the patch.
        origin: Point3,
        /// First in-plane spanning vector.
        e_u: Vec3,
        /// Second in-plane spanning vector.
        e_v: Vec3,
    },
}

impl FaceGeometry {
    /// Test a finite probe segment `p0 → p1` against this face.
    ///
    /// Returns the crossing within both finite extents, or `None` when
    /// the probe is parallel to the face or the crossing point lies
    /// outside either extent.
    pub fn crossing(&self, p0: &Point3, p1: &Point3) -> Option<Crossing> {
        match self {
            FaceGeometry::Edge { a, b } => segment_crossing(p0, p1, a, b),
            FaceGeometry::Patch { origin, e_u, e_v } => patch_crossing(p0, p1, origin, e_u, e_v),
        }
    }
}
