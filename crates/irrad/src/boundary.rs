//! Boundary behavior at domain exits.
//!
//! Every ray chain ends at the physical domain boundary; the variant
//! chosen here supplies the intensity entering the domain at that
//! point and the loss accounting for the energy leaving it.

use irrad_mesh::flame_intensity;
use serde::{Deserialize, Serialize};

/// Behavior of the physical domain boundary, dispatched by tag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// Cold, non-emitting exit: no incoming radiation, everything
    /// arriving at the boundary is lost.
    Cold,
    /// Diffusely emitting surface with the given emissivity, assumed
    /// in equilibrium with the adjacent cell.
    Emitting {
        /// Surface emissivity in [0, 1].
        emissivity: f64,
    },
    /// Perfectly reflecting surface: zero net flux through the
    /// boundary, approximated as a blackbody at the exit-cell
    /// temperature.
    Reflecting,
}

impl BoundaryCondition {
    /// Intensity entering the domain where a ray exits, given the
    /// temperature of the cell adjacent to the boundary.
    pub fn incoming(&self, exit_temperature: f64) -> f64 {
        match self {
            BoundaryCondition::Cold => 0.0,
            BoundaryCondition::Emitting { emissivity } => {
                flame_intensity(*emissivity, exit_temperature)
            }
            BoundaryCondition::Reflecting => flame_intensity(1.0, exit_temperature),
        }
    }

    /// Fraction of the radiation arriving at the boundary that leaves
    /// the domain, used for loss diagnostics.
    pub fn loss_fraction(&self) -> f64 {
        match self {
            BoundaryCondition::Cold => 1.0,
            BoundaryCondition::Emitting { emissivity } => *emissivity,
            BoundaryCondition::Reflecting => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cold_boundary() {
        assert_eq!(BoundaryCondition::Cold.incoming(1500.0), 0.0);
        assert_eq!(BoundaryCondition::Cold.loss_fraction(), 1.0);
    }

    #[test]
    fn test_emitting_boundary_scales_with_emissivity() {
        let half = BoundaryCondition::Emitting { emissivity: 0.5 };
        let full = BoundaryCondition::Emitting { emissivity: 1.0 };
        assert_relative_eq!(
            half.incoming(800.0) * 2.0,
            full.incoming(800.0),
            max_relative = 1e-14
        );
    }

    #[test]
    fn test_reflecting_boundary_has_no_loss() {
        let bc = BoundaryCondition::Reflecting;
        assert_eq!(bc.loss_fraction(), 0.0);
        assert_relative_eq!(
            bc.incoming(800.0),
            flame_intensity(1.0, 800.0),
            max_relative = 1e-14
        );
    }
}
