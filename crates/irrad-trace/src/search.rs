//! The bulk-synchronous ray search loop.

use irrad_comm::Communicator;
use irrad_math::consts::SMALL;
use irrad_math::{AngularGrid, Point3};
use irrad_mesh::{MeshView, Neighbor};
use log::{debug, info};

use crate::error::{Result, TraceError};
use crate::particle::{Identifier, Segment, Virtualcoord};

/// Tunables for the search loop.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Forward offset applied after each face crossing, as a fraction
    /// of the mesh's minimum cell radius. Keeps the advanced virtual
    /// coordinate off the crossed face so it is not re-intersected due
    /// to floating error.
    pub forward_offset: f64,
    /// Ceiling on migration rounds before the search is declared
    /// stalled.
    pub max_migration_rounds: usize,
}

/// A ray originating on this rank: its origin cell and the solid-angle
/// quadrature weight of its direction.
#[derive(Debug, Clone, Copy)]
pub struct OriginRay {
    /// Origin cell, local to this rank.
    pub cell: usize,
    /// Solid-angle quadrature weight.
    pub weight: f64,
}

/// A chain piece recorded on this rank: the segments a ray accumulated
/// here between partition crossings.
#[derive(Debug, Clone)]
pub struct RayPiece {
    /// Position of this piece in its ray's global chain.
    pub identifier: Identifier,
    /// Segments in traversal order (nearest the origin first).
    pub segments: Vec<Segment>,
    /// Exit cell at the physical domain boundary, for the terminal
    /// piece of a ray; `None` for pieces that handed off to a remote
    /// partition.
    pub boundary_cell: Option<usize>,
}

/// Static description of one piece, shipped to the ray's origin rank
/// once the search settles. The aggregation index is built from these.
#[derive(Debug, Clone)]
pub struct PieceReport {
    /// Position of the piece in its ray's global chain.
    pub identifier: Identifier,
    /// Per-segment path lengths in traversal order.
    pub h: Vec<f64>,
    /// Whether the piece ends at the physical domain boundary.
    pub terminal: bool,
}

/// Result of the search on one rank.
#[derive(Debug)]
pub struct SearchOutput {
    /// Rays originating on this rank, in seeding order.
    pub origin_rays: Vec<OriginRay>,
    /// All chain pieces recorded on this rank (for local and remote
    /// origins alike), indexed by `remote_ray_id`.
    pub pieces: Vec<RayPiece>,
    /// Chain reports for locally originating rays, indexed by
    /// `origin_ray_id`; pieces arrive unordered.
    pub reports: Vec<Vec<PieceReport>>,
}

/// A particle that crossed into another partition, en route to its new
/// owner.
#[derive(Debug, Clone, Copy)]
struct Migrant {
    identifier: Identifier,
    virt: Virtualcoord,
    /// Entry cell, local to the destination rank.
    cell: usize,
}

/// A particle walking the local partition.
///
/// Ray lifecycle: Generated → Stepping → {BoundaryHit |
/// CrossedPartition → Stepping on the new owner} → Terminated.
#[derive(Debug, Clone, Copy)]
struct SearchParticle {
    identifier: Identifier,
    virt: Virtualcoord,
    /// Physical placement: the exact point of the last face crossing.
    position: Point3,
    cell: usize,
    /// Local piece being filled (`identifier.remote_ray_id`).
    piece: usize,
}

/// Outcome of walking a particle through the local partition.
enum Walk {
    /// The ray reached the physical domain boundary.
    Terminated,
    /// The ray crossed into another partition.
    Crossed {
        rank: usize,
        cell: usize,
    },
}

/// Trace every `(origin cell, direction)` ray of this rank to
/// termination, migrating particles across partitions in lockstep
/// rounds until no particle anywhere remains active.
///
/// `origin_cells` selects the local cells that emit rays; rays still
/// traverse every cell on their way out, restricted region or not.
pub fn search<M: MeshView, C: Communicator>(
    mesh: &M,
    comm: &C,
    grid: &AngularGrid,
    config: &SearchConfig,
    origin_cells: &[usize],
) -> Result<SearchOutput> {
    let offset = config.forward_offset * mesh.min_cell_radius();
    let probe_len = 1.05 * mesh.bounds().diagonal();
    let rank = comm.rank();

    let mut origin_rays = Vec::with_capacity(origin_cells.len() * grid.len());
    let mut pieces: Vec<RayPiece> = Vec::with_capacity(origin_cells.len() * grid.len());
    let mut active = Vec::with_capacity(origin_cells.len() * grid.len());

    for &cell in origin_cells {
        for (i_theta, i_phi) in grid.indices() {
            let direction = grid.direction(i_theta, i_phi);
            if direction.norm() < SMALL {
                return Err(TraceError::DegenerateDirection { cell, i_theta, i_phi });
            }

            let origin_ray_id = origin_rays.len();
            let piece = pieces.len();
            let identifier = Identifier {
                origin_rank: rank,
                origin_ray_id,
                remote_rank: rank,
                remote_ray_id: piece,
                n_segment: 0,
            };
            origin_rays.push(OriginRay {
                cell,
                weight: grid.weight(i_theta, i_phi),
            });
            pieces.push(RayPiece {
                identifier,
                segments: Vec::new(),
                boundary_cell: None,
            });
            let centroid = mesh.centroid(cell);
            active.push(SearchParticle {
                identifier,
                virt: Virtualcoord::new(centroid, direction),
                position: centroid,
                cell,
                piece,
            });
        }
    }
    debug!("rank {rank}: seeded {} search particles", active.len());

    let mut rounds = 0usize;
    loop {
        let mut outbound: Vec<Vec<Migrant>> = vec![Vec::new(); comm.size()];
        for mut particle in active.drain(..) {
            match walk_local(mesh, &mut pieces, &mut particle, offset, probe_len)? {
                Walk::Terminated => {}
                Walk::Crossed { rank: dst, cell } => {
                    let identifier = Identifier {
                        n_segment: particle.identifier.n_segment + 1,
                        ..particle.identifier
                    };
                    outbound[dst].push(Migrant {
                        identifier,
                        virt: particle.virt,
                        cell,
                    });
                }
            }
        }

        let migrating: u64 = outbound.iter().map(|bucket| bucket.len() as u64).sum();
        if comm.all_reduce_sum(migrating)? == 0 {
            break;
        }
        rounds += 1;
        if rounds > config.max_migration_rounds {
            return Err(TraceError::MigrationStall { rounds });
        }

        for migrant in comm.exchange(outbound)?.into_iter().flatten() {
            let piece = pieces.len();
            let identifier = Identifier {
                remote_rank: rank,
                remote_ray_id: piece,
                ..migrant.identifier
            };
            pieces.push(RayPiece {
                identifier,
                segments: Vec::new(),
                boundary_cell: None,
            });
            active.push(SearchParticle {
                identifier,
                virt: migrant.virt,
                position: migrant.virt.position(),
                cell: migrant.cell,
                piece,
            });
        }
    }

    // Every chain has settled; ship each piece's static description to
    // the rank its ray originates on.
    let mut report_out: Vec<Vec<PieceReport>> = vec![Vec::new(); comm.size()];
    for piece in &pieces {
        report_out[piece.identifier.origin_rank].push(PieceReport {
            identifier: piece.identifier,
            h: piece.segments.iter().map(|s| s.h).collect(),
            terminal: piece.boundary_cell.is_some(),
        });
    }
    let mut reports: Vec<Vec<PieceReport>> = vec![Vec::new(); origin_rays.len()];
    for report in comm.exchange(report_out)?.into_iter().flatten() {
        reports[report.identifier.origin_ray_id].push(report);
    }

    let segments: usize = pieces.iter().map(|p| p.segments.len()).sum();
    info!(
        "rank {rank}: ray search settled after {rounds} migration rounds \
         ({} origin rays, {} pieces, {segments} segments)",
        origin_rays.len(),
        pieces.len(),
    );

    Ok(SearchOutput {
        origin_rays,
        pieces,
        reports,
    })
}

/// Step a particle cell by cell until it leaves this partition.
fn walk_local<M: MeshView>(
    mesh: &M,
    pieces: &mut [RayPiece],
    particle: &mut SearchParticle,
    offset: f64,
    probe_len: f64,
) -> Result<Walk> {
    loop {
        let start = particle.virt.position();
        let end = start + probe_len * particle.virt.direction();

        // Nearest face the particle is moving toward. Parallel faces
        // are skipped by the crossing kernel; that is only fatal if no
        // forward face remains at all.
        let mut nearest: Option<(f64, Point3, Neighbor)> = None;
        for face in mesh.faces(particle.cell) {
            if let Some(crossing) = face.geometry.crossing(&start, &end) {
                let dist = crossing.s * probe_len;
                if dist > 0.0 && nearest.map_or(true, |(best, ..)| dist < best) {
                    nearest = Some((dist, crossing.point, face.neighbor));
                }
            }
        }
        let Some((dist, point, neighbor)) = nearest else {
            return Err(TraceError::NoForwardFace {
                cell: particle.cell,
            });
        };

        // The recorded h telescopes: the offset carried past this face
        // is recovered when the next crossing is measured from the
        // offset position, so summed h equals the traveled path.
        pieces[particle.piece].segments.push(Segment {
            cell: particle.cell,
            h: dist + offset,
        });
        particle.virt.advance(dist + offset);
        particle.position = point;
        debug_assert!(
            mesh.bounds().contains(&particle.position),
            "face crossing left the domain at cell {}",
            particle.cell
        );

        match neighbor {
            Neighbor::Local(cell) => particle.cell = cell,
            Neighbor::Boundary => {
                pieces[particle.piece].boundary_cell = Some(particle.cell);
                return Ok(Walk::Terminated);
            }
            Neighbor::Remote { rank, cell } => return Ok(Walk::Crossed { rank, cell }),
        }
    }
}
