//! Error types for the ray search.

use irrad_comm::CommError;
use thiserror::Error;

/// Errors that can occur during the ray search.
#[derive(Error, Debug)]
pub enum TraceError {
    /// A ray direction with no usable components reached the seeder.
    #[error("degenerate ray direction for cell {cell} (theta {i_theta}, phi {i_phi})")]
    DegenerateDirection {
        /// Origin cell of the rejected ray.
        cell: usize,
        /// Polar index of the rejected direction.
        i_theta: usize,
        /// Azimuthal index of the rejected direction.
        i_phi: usize,
    },

    /// An advancing particle found no forward face to cross. This
    /// corrupts the global segment count invariant, so it is fatal
    /// rather than dropped.
    #[error("particle in cell {cell} found no forward face")]
    NoForwardFace {
        /// Cell in which the particle stalled.
        cell: usize,
    },

    /// The migration loop failed to settle within the round ceiling;
    /// indicates a mesh/topology bug.
    #[error("ray migration failed to settle within {rounds} rounds")]
    MigrationStall {
        /// Rounds executed before giving up.
        rounds: usize,
    },

    /// Communication failure during a collective.
    #[error(transparent)]
    Comm(#[from] CommError),
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, TraceError>;
