//! Error types for the radiative-transport solver.

use irrad_comm::CommError;
use irrad_trace::TraceError;
use thiserror::Error;

/// Errors that can occur in the radiative-transport solver.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Invalid configuration.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A solve was requested before `initialize`.
    #[error("radiation engine is not initialized")]
    NotInitialized,

    /// A negative or non-finite temperature reached the segment
    /// solver. Surfaced instead of clamped: a single bad segment would
    /// corrupt an entire ray's composed intensity, and silent clamping
    /// would mask upstream bugs in the coupled solver.
    #[error("non-physical temperature {value} at cell {cell}")]
    NonPhysicalState {
        /// Offending cell, local to this rank.
        cell: usize,
        /// The rejected temperature value.
        value: f64,
    },

    /// A ray's gathered chain has a gap, duplicate, or misplaced
    /// terminal piece; indicates an initialization-time indexing bug.
    #[error("ray {ray} chain has a gap or duplicate at piece {n_segment}")]
    AggregationMismatch {
        /// Origin-local ray index.
        ray: usize,
        /// Piece index at which the chain is inconsistent.
        n_segment: usize,
    },

    /// Failure during the ray search.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Communication failure during aggregation.
    #[error(transparent)]
    Comm(#[from] CommError),
}

/// Result type for solver operations.
pub type Result<T> = std::result::Result<T, TransportError>;
