//! Radiative property models.
//!
//! The engine treats absorptivity as a black box: a pure function from
//! cell state to an absorption coefficient and a blackbody source
//! intensity. Real property models (spectral, soot, species-dependent)
//! live outside this crate; [`ConstantProperties`] covers gray media
//! and testing.

use irrad_math::consts::SIGMA;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Blackbody intensity `ε σ T⁴ / π` for a surface or medium at
/// temperature `temperature` with emissivity `epsilon`.
#[inline]
pub fn flame_intensity(epsilon: f64, temperature: f64) -> f64 {
    epsilon * SIGMA * temperature.powi(4) / PI
}

/// Absorptivity model: pure function of cell state.
pub trait RadiationProperties {
    /// Absorption coefficient `κ` and blackbody source intensity `I_b`
    /// at the given cell temperature.
    ///
    /// Must be pure; the engine may evaluate it any number of times per
    /// cycle and in parallel.
    fn absorptivity(&self, temperature: f64) -> (f64, f64);
}

/// Gray medium with a constant absorption coefficient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConstantProperties {
    /// Absorption coefficient (1/m).
    pub kappa: f64,
    /// Medium emissivity applied to the blackbody source.
    pub emissivity: f64,
}

impl ConstantProperties {
    /// Gray medium with the given absorption coefficient and unit
    /// emissivity.
    pub fn new(kappa: f64) -> Self {
        Self {
            kappa,
            emissivity: 1.0,
        }
    }
}

impl RadiationProperties for ConstantProperties {
    fn absorptivity(&self, temperature: f64) -> (f64, f64) {
        (self.kappa, flame_intensity(self.emissivity, temperature))
    }
}
