//! Distributed segment aggregation.
//!
//! The aggregator is built once from the search's chain reports and
//! never changes afterwards: ray geometry is fixed for a static mesh,
//! so only the carrier payload varies per solve. Every cycle, each
//! rank pushes the carriers of its local pieces to the rays' origin
//! ranks in one exchange; the origin scatters them into a preallocated
//! summary buffer at offsets precomputed from `n_segment`. Chain order
//! is therefore guaranteed by construction, not by arrival order.

use std::ops::Range;

use irrad_comm::Communicator;
use irrad_trace::PieceReport;

use crate::carrier::Carrier;
use crate::error::{Result, TransportError};

/// Per-cycle payload pushed from a piece's owning rank to its ray's
/// origin rank.
#[derive(Debug, Clone)]
pub struct PiecePayload {
    /// Origin-local ray index.
    pub origin_ray_id: usize,
    /// Piece position in the ray's chain.
    pub n_segment: usize,
    /// Freshly computed carriers, one per segment, traversal order.
    pub carriers: Vec<Carrier>,
    /// Incoming boundary intensity; `Some` only on the terminal piece.
    pub boundary: Option<f64>,
}

/// Chains pulled for one cycle: per-segment carriers in global per-ray
/// order plus the boundary intensity terminating each ray.
#[derive(Debug)]
pub struct Gathered {
    /// Carriers for all local rays, laid out per [`Aggregator::ray_range`].
    pub summary: Vec<Carrier>,
    /// Incoming boundary intensity per origin ray.
    pub boundary: Vec<f64>,
}

/// Persistent index from "segment slot in global per-ray order" to its
/// position in the origin rank's summary buffer.
#[derive(Debug)]
pub struct Aggregator {
    /// Ray `r`'s chain occupies `ray_offsets[r]..ray_offsets[r + 1]`
    /// of the summary buffer.
    ray_offsets: Vec<usize>,
    /// Per ray, per piece (indexed by `n_segment`): summary offset of
    /// the piece's first segment and its segment count.
    piece_slots: Vec<Vec<(usize, usize)>>,
    /// Static per-segment path lengths in summary order.
    h: Vec<f64>,
}

impl Aggregator {
    /// Build the index from the search's chain reports, one bucket per
    /// locally originating ray.
    ///
    /// Validates each chain: piece indices must be contiguous from
    /// zero with no duplicates, and exactly the last piece terminal.
    pub fn build(reports: &[Vec<PieceReport>]) -> Result<Self> {
        let mut ray_offsets = Vec::with_capacity(reports.len() + 1);
        ray_offsets.push(0);
        let mut piece_slots = Vec::with_capacity(reports.len());
        let mut h = Vec::new();

        for (ray, pieces) in reports.iter().enumerate() {
            let mut ordered: Vec<Option<&PieceReport>> = vec![None; pieces.len()];
            for piece in pieces {
                let n_segment = piece.identifier.n_segment;
                match ordered.get_mut(n_segment) {
                    Some(slot @ None) => *slot = Some(piece),
                    // Duplicate index, or an index beyond the piece
                    // count (which implies a gap below it)
                    _ => return Err(TransportError::AggregationMismatch { ray, n_segment }),
                }
            }

            let mut slots = Vec::with_capacity(pieces.len());
            for (n_segment, slot) in ordered.iter().enumerate() {
                let Some(piece) = slot else {
                    return Err(TransportError::AggregationMismatch { ray, n_segment });
                };
                if piece.terminal != (n_segment + 1 == ordered.len()) {
                    return Err(TransportError::AggregationMismatch { ray, n_segment });
                }
                slots.push((h.len(), piece.h.len()));
                h.extend_from_slice(&piece.h);
            }
            piece_slots.push(slots);
            ray_offsets.push(h.len());
        }

        Ok(Self {
            ray_offsets,
            piece_slots,
            h,
        })
    }

    /// Number of origin rays indexed.
    pub fn ray_count(&self) -> usize {
        self.piece_slots.len()
    }

    /// Total number of segments across all local rays.
    pub fn segment_count(&self) -> usize {
        self.h.len()
    }

    /// Summary-buffer range of one ray's chain, ordered with segment 0
    /// nearest the origin.
    pub fn ray_range(&self, ray: usize) -> Range<usize> {
        self.ray_offsets[ray]..self.ray_offsets[ray + 1]
    }

    /// Static path lengths of one ray's chain, in chain order.
    pub fn path_lengths(&self, ray: usize) -> &[f64] {
        &self.h[self.ray_range(ray)]
    }

    /// Push this rank's payloads and pull the ordered chains of its
    /// locally originating rays.
    ///
    /// `outbound[dst]` holds the payloads destined for rank `dst`. All
    /// ranks must call this collectively once per cycle.
    pub fn gather<C: Communicator>(
        &self,
        comm: &C,
        outbound: Vec<Vec<PiecePayload>>,
    ) -> Result<Gathered> {
        let inbound = comm.exchange(outbound)?;

        let mut summary = vec![Carrier::default(); self.h.len()];
        let mut boundary: Vec<Option<f64>> = vec![None; self.ray_count()];
        let mut seen: Vec<Vec<bool>> = self
            .piece_slots
            .iter()
            .map(|slots| vec![false; slots.len()])
            .collect();

        for payload in inbound.into_iter().flatten() {
            let ray = payload.origin_ray_id;
            let mismatch = TransportError::AggregationMismatch {
                ray,
                n_segment: payload.n_segment,
            };
            let Some(slots) = self.piece_slots.get(ray) else {
                return Err(mismatch);
            };
            let Some(&(offset, count)) = slots.get(payload.n_segment) else {
                return Err(mismatch);
            };
            if payload.carriers.len() != count || seen[ray][payload.n_segment] {
                return Err(mismatch);
            }
            seen[ray][payload.n_segment] = true;
            summary[offset..offset + count].copy_from_slice(&payload.carriers);

            if let Some(incoming) = payload.boundary {
                // Only the terminal piece carries the boundary value
                if payload.n_segment + 1 != slots.len() || boundary[ray].is_some() {
                    return Err(mismatch);
                }
                boundary[ray] = Some(incoming);
            }
        }

        // A gap at this point means a piece's owner never pushed it
        for (ray, flags) in seen.iter().enumerate() {
            if let Some(n_segment) = flags.iter().position(|&filled| !filled) {
                return Err(TransportError::AggregationMismatch { ray, n_segment });
            }
            if boundary[ray].is_none() {
                return Err(TransportError::AggregationMismatch {
                    ray,
                    n_segment: flags.len().saturating_sub(1),
                });
            }
        }

        Ok(Gathered {
            summary,
            boundary: boundary.into_iter().flatten().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irrad_comm::SingleProcess;
    use irrad_trace::Identifier;

    fn report(ray: usize, n_segment: usize, h: Vec<f64>, terminal: bool) -> PieceReport {
        PieceReport {
            identifier: Identifier {
                origin_rank: 0,
                origin_ray_id: ray,
                remote_rank: 0,
                remote_ray_id: 0,
                n_segment,
            },
            h,
            terminal,
        }
    }

    #[test]
    fn test_build_orders_pieces_by_n_segment() {
        // Pieces reported out of order
        let reports = vec![vec![
            report(0, 1, vec![3.0, 4.0], true),
            report(0, 0, vec![1.0, 2.0], false),
        ]];
        let aggregator = Aggregator::build(&reports).unwrap();
        assert_eq!(aggregator.ray_count(), 1);
        assert_eq!(aggregator.segment_count(), 4);
        assert_eq!(aggregator.path_lengths(0), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_build_rejects_gap() {
        // n_segment 1 missing: index 2 lands out of range for 2 pieces
        let reports = vec![vec![
            report(0, 0, vec![1.0], false),
            report(0, 2, vec![2.0], true),
        ]];
        assert!(matches!(
            Aggregator::build(&reports),
            Err(TransportError::AggregationMismatch { ray: 0, .. })
        ));
    }

    #[test]
    fn test_build_rejects_duplicate() {
        let reports = vec![vec![
            report(0, 0, vec![1.0], false),
            report(0, 0, vec![2.0], true),
        ]];
        assert!(matches!(
            Aggregator::build(&reports),
            Err(TransportError::AggregationMismatch { ray: 0, n_segment: 0 })
        ));
    }

    #[test]
    fn test_build_rejects_terminal_in_middle() {
        let reports = vec![vec![
            report(0, 0, vec![1.0], true),
            report(0, 1, vec![2.0], false),
        ]];
        assert!(Aggregator::build(&reports).is_err());
    }

    #[test]
    fn test_gather_scatters_by_n_segment() {
        let reports = vec![vec![
            report(0, 0, vec![1.0], false),
            report(0, 1, vec![2.0, 3.0], true),
        ]];
        let aggregator = Aggregator::build(&reports).unwrap();

        let near = Carrier { ij: 1.0, krad: 0.1 };
        let far_a = Carrier { ij: 2.0, krad: 0.2 };
        let far_b = Carrier { ij: 3.0, krad: 0.3 };
        // Push the far piece first; order of arrival must not matter
        let outbound = vec![vec![
            PiecePayload {
                origin_ray_id: 0,
                n_segment: 1,
                carriers: vec![far_a, far_b],
                boundary: Some(0.5),
            },
            PiecePayload {
                origin_ray_id: 0,
                n_segment: 0,
                carriers: vec![near],
                boundary: None,
            },
        ]];
        let gathered = aggregator.gather(&SingleProcess, outbound).unwrap();
        assert_eq!(gathered.summary, vec![near, far_a, far_b]);
        assert_eq!(gathered.boundary, vec![0.5]);
    }

    #[test]
    fn test_gather_rejects_missing_piece() {
        let reports = vec![vec![
            report(0, 0, vec![1.0], false),
            report(0, 1, vec![2.0], true),
        ]];
        let aggregator = Aggregator::build(&reports).unwrap();
        let outbound = vec![vec![PiecePayload {
            origin_ray_id: 0,
            n_segment: 0,
            carriers: vec![Carrier::default()],
            boundary: None,
        }]];
        assert!(matches!(
            aggregator.gather(&SingleProcess, outbound),
            Err(TransportError::AggregationMismatch { ray: 0, n_segment: 1 })
        ));
    }

    #[test]
    fn test_gather_rejects_wrong_segment_count() {
        let reports = vec![vec![report(0, 0, vec![1.0, 2.0], true)]];
        let aggregator = Aggregator::build(&reports).unwrap();
        let outbound = vec![vec![PiecePayload {
            origin_ray_id: 0,
            n_segment: 0,
            carriers: vec![Carrier::default()], // expected two
            boundary: Some(0.0),
        }]];
        assert!(aggregator.gather(&SingleProcess, outbound).is_err());
    }
}
