//! Intensity integration along a gathered ray chain.

use crate::carrier::Carrier;

/// Compose a ray's ordered chain from the farthest segment inward.
///
/// `carriers[0]` is the segment nearest the origin cell and `h` holds
/// the matching path lengths. Starting from the boundary intensity at
/// the far end, each segment applies the closed-form solution of
/// `dI/ds = κ (I_b − I)` with locally constant properties:
///
/// ```text
/// I ← I · exp(−κ h) + I_b · (1 − exp(−κ h))
/// ```
///
/// The composition is not commutative, so the chain order produced by
/// the aggregator is load-bearing.
pub fn compose_chain(boundary_intensity: f64, carriers: &[Carrier], h: &[f64]) -> f64 {
    debug_assert_eq!(carriers.len(), h.len());
    let mut intensity = boundary_intensity;
    for (carrier, &h) in carriers.iter().zip(h).rev() {
        let transmission = (-carrier.krad * h).exp();
        intensity = intensity * transmission + carrier.ij * (1.0 - transmission);
    }
    intensity
}
