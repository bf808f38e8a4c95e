#![warn(missing_docs)]

//! Distributed cell-by-cell ray search for the irrad engine.
//!
//! For every local origin cell and every discretized angular direction,
//! a search particle walks the mesh face by face, recording one
//! [`Segment`] per cell crossed. A particle that reaches a partition
//! boundary is handed to the owning rank in a bulk-synchronous
//! migration round; a particle that reaches the physical domain
//! boundary terminates its ray. The search runs once per mesh/ray
//! configuration and produces the static chain reports the
//! aggregation index is built from.
//!
//! - [`Identifier`], [`Segment`], [`Virtualcoord`] - per-particle state
//! - [`search`] - the bulk-synchronous search loop
//! - [`SearchOutput`] - local pieces plus origin-side chain reports

pub mod error;
mod particle;
mod search;

pub use error::{Result, TraceError};
pub use particle::{Identifier, Segment, Virtualcoord};
pub use search::{search, OriginRay, PieceReport, RayPiece, SearchConfig, SearchOutput};
