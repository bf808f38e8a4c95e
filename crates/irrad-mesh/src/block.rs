//! Partitioned rectilinear meshes for tests and demos.
//!
//! Cells are axis-aligned boxes (3D) or rectangles (2D) on a regular
//! grid, partitioned into contiguous slabs along x. Every partition is
//! a self-contained [`MeshView`]; remote adjacency is expressed in the
//! owning rank's local indices, exactly as a real mesh/partition
//! provider would.

use crate::{Face, MeshView, Neighbor};
use irrad_geom::{Aabb, FaceGeometry};
use irrad_math::{Point3, Vec3};

/// x-index range `[x0, x1)` owned by `rank` out of `ranks` slabs.
fn slab_range(nx: usize, ranks: usize, rank: usize) -> (usize, usize) {
    let base = nx / ranks;
    let extra = nx % ranks;
    let x0 = rank * base + rank.min(extra);
    let width = base + usize::from(rank < extra);
    (x0, x0 + width)
}

/// Owning rank of global x-index `ix`.
fn slab_owner(nx: usize, ranks: usize, ix: usize) -> usize {
    for rank in 0..ranks {
        let (x0, x1) = slab_range(nx, ranks, rank);
        if ix >= x0 && ix < x1 {
            return rank;
        }
    }
    unreachable!("x index {ix} outside grid of {nx}")
}

/// One partition of a rectilinear 3D mesh.
#[derive(Debug, Clone)]
pub struct BlockMesh {
    rank: usize,
    nx: usize,
    ny: usize,
    nz: usize,
    x0: usize,
    x1: usize,
    step: Vec3,
    origin: Point3,
    bounds: Aabb,
    faces: Vec<Vec<Face>>,
    centroids: Vec<Point3>,
}

impl BlockMesh {
    /// Partition a global `nx × ny × nz` grid over `ranks` contiguous
    /// x-slabs. Every rank must own at least one cell column.
    pub fn partition(
        nx: usize,
        ny: usize,
        nz: usize,
        min: Point3,
        max: Point3,
        ranks: usize,
    ) -> Vec<BlockMesh> {
        assert!(nx * ny * nz > 0, "grid must be non-empty");
        assert!(ranks >= 1 && ranks <= nx, "need 1..=nx ranks");

        let step = Vec3::new(
            (max.x - min.x) / nx as f64,
            (max.y - min.y) / ny as f64,
            (max.z - min.z) / nz as f64,
        );
        let bounds = Aabb::new(min, max);

        (0..ranks)
            .map(|rank| {
                let (x0, x1) = slab_range(nx, ranks, rank);
                let mut mesh = BlockMesh {
                    rank,
                    nx,
                    ny,
                    nz,
                    x0,
                    x1,
                    step,
                    origin: min,
                    bounds,
                    faces: Vec::new(),
                    centroids: Vec::new(),
                };
                mesh.build(ranks);
                mesh
            })
            .collect()
    }

    /// The whole grid as a single partition.
    pub fn single(nx: usize, ny: usize, nz: usize, min: Point3, max: Point3) -> BlockMesh {
        Self::partition(nx, ny, nz, min, max, 1).pop().unwrap()
    }

    /// Global cell index of a local cell, stable across partitionings.
    pub fn global_cell(&self, local: usize) -> usize {
        let width = self.x1 - self.x0;
        let ix = self.x0 + local % width;
        let iy = (local / width) % self.ny;
        let iz = local / (width * self.ny);
        ix + self.nx * (iy + self.ny * iz)
    }

    fn local_cell(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (ix - self.x0) + (self.x1 - self.x0) * (iy + self.ny * iz)
    }

    fn corner(&self, ix: usize, iy: usize, iz: usize) -> Point3 {
        Point3::new(
            self.origin.x + ix as f64 * self.step.x,
            self.origin.y + iy as f64 * self.step.y,
            self.origin.z + iz as f64 * self.step.z,
        )
    }

    fn neighbor(&self, ranks: usize, ix: i64, iy: i64, iz: i64) -> Neighbor {
        if ix < 0
            || iy < 0
            || iz < 0
            || ix >= self.nx as i64
            || iy >= self.ny as i64
            || iz >= self.nz as i64
        {
            return Neighbor::Boundary;
        }
        let (ix, iy, iz) = (ix as usize, iy as usize, iz as usize);
        let owner = slab_owner(self.nx, ranks, ix);
        if owner == self.rank {
            Neighbor::Local(self.local_cell(ix, iy, iz))
        } else {
            let (x0, x1) = slab_range(self.nx, ranks, owner);
            let cell = (ix - x0) + (x1 - x0) * (iy + self.ny * iz);
            Neighbor::Remote { rank: owner, cell }
        }
    }

    fn build(&mut self, ranks: usize) {
        let (sx, sy, sz) = (self.step.x, self.step.y, self.step.z);
        let e_x = Vec3::new(sx, 0.0, 0.0);
        let e_y = Vec3::new(0.0, sy, 0.0);
        let e_z = Vec3::new(0.0, 0.0, sz);

        for iz in 0..self.nz {
            for iy in 0..self.ny {
                for ix in self.x0..self.x1 {
                    let c = self.corner(ix, iy, iz);
                    let (ix_i, iy_i, iz_i) = (ix as i64, iy as i64, iz as i64);
                    let faces = vec![
                        Face {
                            geometry: FaceGeometry::Patch { origin: c, e_u: e_y, e_v: e_z },
                            neighbor: self.neighbor(ranks, ix_i - 1, iy_i, iz_i),
                        },
                        Face {
                            geometry: FaceGeometry::Patch {
                                origin: c + e_x,
                                e_u: e_y,
                                e_v: e_z,
                            },
                            neighbor: self.neighbor(ranks, ix_i + 1, iy_i, iz_i),
                        },
                        Face {
                            geometry: FaceGeometry::Patch { origin: c, e_u: e_x, e_v: e_z },
                            neighbor: self.neighbor(ranks, ix_i, iy_i - 1, iz_i),
                        },
                        Face {
                            geometry: FaceGeometry::Patch {
                                origin: c + e_y,
                                e_u: e_x,
                                e_v: e_z,
                            },
                            neighbor: self.neighbor(ranks, ix_i, iy_i + 1, iz_i),
                        },
                        Face {
                            geometry: FaceGeometry::Patch { origin: c, e_u: e_x, e_v: e_y },
                            neighbor: self.neighbor(ranks, ix_i, iy_i, iz_i - 1),
                        },
                        Face {
                            geometry: FaceGeometry::Patch {
                                origin: c + e_z,
                                e_u: e_x,
                                e_v: e_y,
                            },
                            neighbor: self.neighbor(ranks, ix_i, iy_i, iz_i + 1),
                        },
                    ];
                    self.faces.push(faces);
                    self.centroids
                        .push(c + Vec3::new(sx / 2.0, sy / 2.0, sz / 2.0));
                }
            }
        }
    }
}

impl MeshView for BlockMesh {
    fn dim(&self) -> usize {
        3
    }

    fn cell_count(&self) -> usize {
        self.centroids.len()
    }

    fn centroid(&self, cell: usize) -> Point3 {
        self.centroids[cell]
    }

    fn faces(&self, cell: usize) -> &[Face] {
        &self.faces[cell]
    }

    fn min_cell_radius(&self) -> f64 {
        0.5 * self.step.x.min(self.step.y).min(self.step.z)
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }
}

/// One partition of a rectilinear 2D mesh in the xy-plane.
#[derive(Debug, Clone)]
pub struct PlaneMesh {
    rank: usize,
    nx: usize,
    ny: usize,
    x0: usize,
    x1: usize,
    step: Vec3,
    origin: Point3,
    bounds: Aabb,
    faces: Vec<Vec<Face>>,
    centroids: Vec<Point3>,
}

impl PlaneMesh {
    /// Partition a global `nx × ny` grid over `ranks` contiguous
    /// x-slabs.
    pub fn partition(
        nx: usize,
        ny: usize,
        min: Point3,
        max: Point3,
        ranks: usize,
    ) -> Vec<PlaneMesh> {
        assert!(nx * ny > 0, "grid must be non-empty");
        assert!(ranks >= 1 && ranks <= nx, "need 1..=nx ranks");

        let step = Vec3::new((max.x - min.x) / nx as f64, (max.y - min.y) / ny as f64, 0.0);
        let bounds = Aabb::new(min, max);

        (0..ranks)
            .map(|rank| {
                let (x0, x1) = slab_range(nx, ranks, rank);
                let mut mesh = PlaneMesh {
                    rank,
                    nx,
                    ny,
                    x0,
                    x1,
                    step,
                    origin: min,
                    bounds,
                    faces: Vec::new(),
                    centroids: Vec::new(),
                };
                mesh.build(ranks);
                mesh
            })
            .collect()
    }

    /// The whole grid as a single partition.
    pub fn single(nx: usize, ny: usize, min: Point3, max: Point3) -> PlaneMesh {
        Self::partition(nx, ny, min, max, 1).pop().unwrap()
    }

    /// Global cell index of a local cell, stable across partitionings.
    pub fn global_cell(&self, local: usize) -> usize {
        let width = self.x1 - self.x0;
        let ix = self.x0 + local % width;
        let iy = local / width;
        ix + self.nx * iy
    }

    fn corner(&self, ix: usize, iy: usize) -> Point3 {
        Point3::new(
            self.origin.x + ix as f64 * self.step.x,
            self.origin.y + iy as f64 * self.step.y,
            0.0,
        )
    }

    fn neighbor(&self, ranks: usize, ix: i64, iy: i64) -> Neighbor {
        if ix < 0 || iy < 0 || ix >= self.nx as i64 || iy >= self.ny as i64 {
            return Neighbor::Boundary;
        }
        let (ix, iy) = (ix as usize, iy as usize);
        let owner = slab_owner(self.nx, ranks, ix);
        if owner == self.rank {
            Neighbor::Local((ix - self.x0) + (self.x1 - self.x0) * iy)
        } else {
            let (x0, x1) = slab_range(self.nx, ranks, owner);
            Neighbor::Remote {
                rank: owner,
                cell: (ix - x0) + (x1 - x0) * iy,
            }
        }
    }

    fn build(&mut self, ranks: usize) {
        let (sx, sy) = (self.step.x, self.step.y);
        for iy in 0..self.ny {
            for ix in self.x0..self.x1 {
                let c = self.corner(ix, iy);
                let (ix_i, iy_i) = (ix as i64, iy as i64);
                let up = Vec3::new(0.0, sy, 0.0);
                let right = Vec3::new(sx, 0.0, 0.0);
                let faces = vec![
                    Face {
                        geometry: FaceGeometry::Edge { a: c, b: c + up },
                        neighbor: self.neighbor(ranks, ix_i - 1, iy_i),
                    },
                    Face {
                        geometry: FaceGeometry::Edge { a: c + right, b: c + right + up },
                        neighbor: self.neighbor(ranks, ix_i + 1, iy_i),
                    },
                    Face {
                        geometry: FaceGeometry::Edge { a: c, b: c + right },
                        neighbor: self.neighbor(ranks, ix_i, iy_i - 1),
                    },
                    Face {
                        geometry: FaceGeometry::Edge { a: c + up, b: c + up + right },
                        neighbor: self.neighbor(ranks, ix_i, iy_i + 1),
                    },
                ];
                self.faces.push(faces);
                self.centroids.push(c + Vec3::new(sx / 2.0, sy / 2.0, 0.0));
            }
        }
    }
}

impl MeshView for PlaneMesh {
    fn dim(&self) -> usize {
        2
    }

    fn cell_count(&self) -> usize {
        self.centroids.len()
    }

    fn centroid(&self, cell: usize) -> Point3 {
        self.centroids[cell]
    }

    fn faces(&self, cell: usize) -> &[Face] {
        &self.faces[cell]
    }

    fn min_cell_radius(&self) -> f64 {
        0.5 * self.step.x.min(self.step.y)
    }

    fn bounds(&self) -> Aabb {
        self.bounds
    }
}
