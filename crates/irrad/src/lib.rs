#![warn(missing_docs)]

//! Distributed ray-tracing radiative-transport engine.
//!
//! Computes radiative heat transfer across a partitioned, unstructured
//! mesh by tracing discrete rays from every participating cell,
//! accumulating absorption and emission along each ray, and reducing
//! the result into a net irradiation source term per cell.
//!
//! The expensive geometry — which cells each ray crosses, and on which
//! rank — is discovered once by the ray search ([`irrad_trace`]) and
//! frozen into a persistent aggregation index. Each solve cycle then
//! only re-evaluates the radiative properties of known segments,
//! gathers them to the rays' origin ranks, and integrates the
//! transport recurrence along each chain.
//!
//! # Example
//!
//! ```ignore
//! use irrad::{BoundaryCondition, Radiation, RadiationSettings};
//! use irrad_comm::SingleProcess;
//! use irrad_mesh::{BlockMesh, ConstantProperties};
//!
//! let mesh = BlockMesh::single(8, 8, 8, min, max);
//! let mut radiation = Radiation::new(
//!     RadiationSettings::default(),
//!     ConstantProperties::new(1.0),
//!     BoundaryCondition::Cold,
//! )?;
//! radiation.initialize(&mesh, &SingleProcess)?;
//!
//! // Every time the energy source term is needed:
//! radiation.evaluate_gains(&temperatures, &SingleProcess)?;
//! radiation.solve(&temperatures)?;
//! let source = radiation.irradiation(cell);
//! ```

pub mod aggregate;
pub mod boundary;
mod carrier;
pub mod error;
pub mod integrate;
pub mod settings;

pub use aggregate::{Aggregator, Gathered, PiecePayload};
pub use boundary::BoundaryCondition;
pub use carrier::Carrier;
pub use error::{Result, TransportError};
pub use integrate::compose_chain;
pub use settings::{Interval, RadiationSettings};

use irrad_comm::Communicator;
use irrad_mesh::{flame_intensity, FieldView, MeshView, RadiationProperties};
use irrad_trace::{search, OriginRay, RayPiece};
use log::{debug, info};
use rayon::prelude::*;

use crate::carrier::{check_temperature, solve_segment};

/// State built once per mesh/ray configuration by [`Radiation::initialize`].
#[derive(Debug)]
struct Engine {
    origin_rays: Vec<OriginRay>,
    pieces: Vec<RayPiece>,
    aggregator: Aggregator,
    /// Cells that emit rays (and receive a net source term).
    region: Vec<usize>,
    /// Total solid angle of the angular grid (4π, or 2π planar); the
    /// emission integral `∫ I_b dΩ` scales with it.
    solid_angle: f64,
    /// Per-cell radiative gains `G`, refreshed by `evaluate_gains`.
    gains: Vec<f64>,
    /// Per-cell net irradiation source, refreshed by `solve`.
    net: Vec<f64>,
    /// Per-exit-cell boundary loss diagnostic.
    losses: Vec<f64>,
}

/// The radiative-transport solver for one mesh partition.
///
/// SPMD: every rank constructs its own `Radiation` with identical
/// settings and drives it through the same sequence of collective
/// calls ([`initialize`](Radiation::initialize),
/// [`evaluate_gains`](Radiation::evaluate_gains)).
#[derive(Debug)]
pub struct Radiation<P: RadiationProperties> {
    settings: RadiationSettings,
    properties: P,
    boundary: BoundaryCondition,
    region: Option<Vec<usize>>,
    gains_clock: Interval,
    engine: Option<Engine>,
}

impl<P: RadiationProperties> Radiation<P> {
    /// Create a solver with validated settings, a radiative property
    /// model, and a domain boundary condition.
    pub fn new(
        settings: RadiationSettings,
        properties: P,
        boundary: BoundaryCondition,
    ) -> Result<Self> {
        settings.validate()?;
        let gains_clock = Interval::new(settings.gains_interval);
        Ok(Self {
            settings,
            properties,
            boundary,
            region: None,
            gains_clock,
            engine: None,
        })
    }

    /// Restrict ray origins (and the net source term) to the given
    /// local cells. Rays still traverse every cell on their way out.
    pub fn with_region(mut self, cells: Vec<usize>) -> Self {
        self.region = Some(cells);
        self
    }

    /// Perform the one-time ray search and build the aggregation
    /// index. Expensive; called once per mesh/ray-count configuration.
    ///
    /// Collective: every rank of `comm` must call this together.
    pub fn initialize<M: MeshView, C: Communicator>(&mut self, mesh: &M, comm: &C) -> Result<()> {
        let grid = self.settings.angular_grid(mesh.dim());
        let region = match &self.region {
            Some(cells) => cells.clone(),
            None => (0..mesh.cell_count()).collect(),
        };
        let output = search(mesh, comm, &grid, &self.settings.search_config(), &region)?;
        let aggregator = Aggregator::build(&output.reports)?;
        info!(
            "radiation initialized: {} origin rays, {} chain segments on rank {}",
            output.origin_rays.len(),
            aggregator.segment_count(),
            comm.rank(),
        );

        self.engine = Some(Engine {
            origin_rays: output.origin_rays,
            pieces: output.pieces,
            aggregator,
            region,
            solid_angle: grid.total_solid_angle(),
            gains: vec![0.0; mesh.cell_count()],
            net: vec![0.0; mesh.cell_count()],
            losses: vec![0.0; mesh.cell_count()],
        });
        Ok(())
    }

    /// Evaluate the radiative gains from the domain: segment solve,
    /// distributed gather, and intensity integration. This is the
    /// expensive half of a solve cycle; it does not touch geometry.
    ///
    /// Collective: every rank of `comm` must call this together.
    pub fn evaluate_gains<F: FieldView, C: Communicator>(
        &mut self,
        fields: &F,
        comm: &C,
    ) -> Result<()> {
        let Self {
            properties,
            boundary,
            engine,
            ..
        } = self;
        let engine = engine.as_mut().ok_or(TransportError::NotInitialized)?;

        // Solve every local segment against the current fields. Any
        // non-physical state aborts the cycle before results commit.
        let mut outbound: Vec<Vec<PiecePayload>> = vec![Vec::new(); comm.size()];
        let mut losses = vec![0.0; engine.losses.len()];
        for piece in &engine.pieces {
            let mut carriers = Vec::with_capacity(piece.segments.len());
            for segment in &piece.segments {
                carriers.push(solve_segment(
                    segment.cell,
                    fields.temperature(segment.cell),
                    &*properties,
                )?);
            }
            let incoming = match piece.boundary_cell {
                Some(cell) => {
                    let temperature = check_temperature(cell, fields.temperature(cell))?;
                    losses[cell] += boundary.loss_fraction() * flame_intensity(1.0, temperature);
                    Some(boundary.incoming(temperature))
                }
                None => None,
            };
            outbound[piece.identifier.origin_rank].push(PiecePayload {
                origin_ray_id: piece.identifier.origin_ray_id,
                n_segment: piece.identifier.n_segment,
                carriers,
                boundary: incoming,
            });
        }

        let gathered = engine.aggregator.gather(comm, outbound)?;

        // Rays are independent until the per-cell reduction; integrate
        // them in parallel.
        let aggregator = &engine.aggregator;
        let intensities: Vec<f64> = (0..aggregator.ray_count())
            .into_par_iter()
            .map(|ray| {
                compose_chain(
                    gathered.boundary[ray],
                    &gathered.summary[aggregator.ray_range(ray)],
                    aggregator.path_lengths(ray),
                )
            })
            .collect();

        engine.gains.fill(0.0);
        for (ray, intensity) in intensities.iter().enumerate() {
            let origin = engine.origin_rays[ray];
            engine.gains[origin.cell] += origin.weight * intensity;
        }
        engine.losses = losses;
        debug!("evaluated gains over {} rays", intensities.len());
        Ok(())
    }

    /// Evaluate gains if the configured interval is due. Returns
    /// whether a refresh happened.
    ///
    /// When it refreshes this is collective; configure the same
    /// interval on every rank so the ranks stay in lockstep.
    pub fn refresh_gains<F: FieldView, C: Communicator>(
        &mut self,
        fields: &F,
        comm: &C,
    ) -> Result<bool> {
        if self.gains_clock.check() {
            self.evaluate_gains(fields, comm)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Combine the stored gains with local emission into the per-cell
    /// net irradiation source term `κ (G − Ω I_b)`, where `Ω` is the
    /// total solid angle of the angular grid (4π in 3D).
    ///
    /// Purely local and cheap; callers may run it every stage while
    /// refreshing gains on an interval.
    pub fn solve<F: FieldView>(&mut self, fields: &F) -> Result<()> {
        let Self {
            properties, engine, ..
        } = self;
        let engine = engine.as_mut().ok_or(TransportError::NotInitialized)?;

        let mut net = Vec::with_capacity(engine.region.len());
        for &cell in &engine.region {
            let temperature = check_temperature(cell, fields.temperature(cell))?;
            let (kappa, ib) = properties.absorptivity(temperature);
            net.push(kappa * (engine.gains[cell] - engine.solid_angle * ib));
        }
        for (&cell, value) in engine.region.iter().zip(net) {
            engine.net[cell] = value;
        }
        Ok(())
    }

    /// Net irradiation source of a local cell, saturated at the
    /// configured bound.
    ///
    /// The clamp guards against transient non-physical states coming
    /// out of the coupled flow solver; it is not a physical limit.
    /// Values beyond ±`saturation` read as exactly ±`saturation` and
    /// NaN reads as zero. Zero before `initialize`/`solve`.
    pub fn irradiation(&self, cell: usize) -> f64 {
        match &self.engine {
            Some(engine) => saturate(engine.net[cell], self.settings.saturation),
            None => 0.0,
        }
    }

    /// Radiative gains `G` of a local cell from the last
    /// `evaluate_gains`. Unclamped.
    pub fn gains(&self, cell: usize) -> f64 {
        self.engine.as_ref().map_or(0.0, |engine| engine.gains[cell])
    }

    /// Boundary loss diagnostic accumulated at a local exit cell
    /// during the last `evaluate_gains`.
    pub fn boundary_loss(&self, cell: usize) -> f64 {
        self.engine.as_ref().map_or(0.0, |engine| engine.losses[cell])
    }
}

/// Saturate `value` at ±`bound`; NaN reads as zero.
fn saturate(value: f64, bound: f64) -> f64 {
    if value.abs() < bound {
        value
    } else if value >= bound {
        bound
    } else if value <= -bound {
        -bound
    } else {
        0.0
    }
}
