#![warn(missing_docs)]

//! Mesh, field, and property interfaces for the irrad engine.
//!
//! The radiative-transport core does not build meshes, partition them,
//! or compute flow physics; it consumes them through the traits defined
//! here. A partitioned rectilinear [`BlockMesh`] (and its 2D counterpart
//! [`PlaneMesh`]) is provided for tests and demos — it implements
//! [`MeshView`] for any rank layout, so single- versus multi-partition
//! behavior can be exercised in one process.

pub mod block;
pub mod properties;

pub use block::{BlockMesh, PlaneMesh};
pub use properties::{flame_intensity, ConstantProperties, RadiationProperties};

use irrad_geom::{Aabb, FaceGeometry};
use irrad_math::Point3;

/// What lies across a cell face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbor {
    /// The face is on the boundary of the physical domain.
    Boundary,
    /// The neighboring cell is owned by this partition.
    Local(usize),
    /// The neighboring cell is owned by another partition.
    Remote {
        /// Owning rank of the neighbor.
        rank: usize,
        /// Cell index local to the owning rank.
        cell: usize,
    },
}

/// One face of a cell: its geometry and what lies across it.
#[derive(Debug, Clone)]
pub struct Face {
    /// Geometric description used for crossing tests.
    pub geometry: FaceGeometry,
    /// Adjacency across the face.
    pub neighbor: Neighbor,
}

/// Read-only view of one partition of the mesh.
///
/// Cell indices are local to the partition; remote adjacency is
/// expressed in the owning rank's local indices.
pub trait MeshView {
    /// Spatial dimension of the mesh (2 or 3).
    fn dim(&self) -> usize;

    /// Number of cells owned by this partition.
    fn cell_count(&self) -> usize;

    /// Centroid of a local cell.
    fn centroid(&self, cell: usize) -> Point3;

    /// Faces of a local cell.
    fn faces(&self, cell: usize) -> &[Face];

    /// Minimum cell inradius over the partition, used to scale the
    /// forward offset that keeps advancing particles off faces.
    fn min_cell_radius(&self) -> f64;

    /// Bounds of the entire physical domain (all partitions).
    fn bounds(&self) -> Aabb;
}

/// Read-only view of the flow solution on one partition.
///
/// Queried once per solve cycle; the engine never writes fields.
pub trait FieldView {
    /// Temperature of a local cell.
    fn temperature(&self, cell: usize) -> f64;
}

impl FieldView for Vec<f64> {
    fn temperature(&self, cell: usize) -> f64 {
        self[cell]
    }
}

impl FieldView for [f64] {
    fn temperature(&self, cell: usize) -> f64 {
        self[cell]
    }
}
