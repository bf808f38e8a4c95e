//! Solver configuration.

use irrad_math::AngularGrid;
use irrad_trace::SearchConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};

/// Radiative-transport parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadiationSettings {
    /// Number of polar angle subdivisions (3D meshes only).
    pub n_theta: usize,
    /// Number of azimuthal angle subdivisions.
    pub n_phi: usize,
    /// Saturation bound applied by the irradiation read accessor.
    /// Guards against transient non-physical states from the coupled
    /// flow solver; not a physical limit, and tunable because the
    /// right magnitude depends on the problem's scales.
    pub saturation: f64,
    /// Forward offset applied after each face crossing during the ray
    /// search, as a fraction of the minimum cell radius. Keeps a
    /// particle from re-intersecting the face it just crossed;
    /// mesh-scale dependent, hence tunable.
    pub forward_offset: f64,
    /// Ceiling on bulk-synchronous migration rounds before the search
    /// is declared stalled.
    pub max_migration_rounds: usize,
    /// Evaluate the (expensive) radiative gains every n-th refresh
    /// request; 1 refreshes on every request.
    pub gains_interval: usize,
}

impl Default for RadiationSettings {
    fn default() -> Self {
        Self {
            n_theta: 5,
            n_phi: 10,
            saturation: 1e10,
            forward_offset: 0.1,
            max_migration_rounds: 512,
            gains_interval: 1,
        }
    }
}

impl RadiationSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.n_theta == 0 || self.n_phi == 0 {
            return Err(TransportError::InvalidSettings(
                "n_theta and n_phi must be at least 1".into(),
            ));
        }
        if !(self.saturation > 0.0) {
            return Err(TransportError::InvalidSettings(
                "saturation must be positive".into(),
            ));
        }
        if !(self.forward_offset > 0.0 && self.forward_offset < 1.0) {
            return Err(TransportError::InvalidSettings(
                "forward_offset must be in (0, 1)".into(),
            ));
        }
        if self.max_migration_rounds == 0 {
            return Err(TransportError::InvalidSettings(
                "max_migration_rounds must be at least 1".into(),
            ));
        }
        if self.gains_interval == 0 {
            return Err(TransportError::InvalidSettings(
                "gains_interval must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Angular grid for a mesh of the given dimension.
    pub(crate) fn angular_grid(&self, dim: usize) -> AngularGrid {
        if dim == 2 {
            AngularGrid::planar(self.n_phi)
        } else {
            AngularGrid::sphere(self.n_theta, self.n_phi)
        }
    }

    pub(crate) fn search_config(&self) -> SearchConfig {
        SearchConfig {
            forward_offset: self.forward_offset,
            max_migration_rounds: self.max_migration_rounds,
        }
    }
}

/// Counts refresh requests and fires every n-th one, starting with the
/// first.
#[derive(Debug, Clone)]
pub struct Interval {
    every: usize,
    count: usize,
}

impl Interval {
    /// Fire every `every`-th check.
    pub fn new(every: usize) -> Self {
        Self { every, count: 0 }
    }

    /// Advance the clock; true when this request should be honored.
    pub fn check(&mut self) -> bool {
        let fire = self.count == 0;
        self.count = (self.count + 1) % self.every;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(RadiationSettings::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_settings() {
        let no_angles = RadiationSettings {
            n_phi: 0,
            ..RadiationSettings::default()
        };
        assert!(no_angles.validate().is_err());

        let bad_offset = RadiationSettings {
            forward_offset: 1.5,
            ..RadiationSettings::default()
        };
        assert!(bad_offset.validate().is_err());

        let bad_saturation = RadiationSettings {
            saturation: -1.0,
            ..RadiationSettings::default()
        };
        assert!(bad_saturation.validate().is_err());
    }

    #[test]
    fn test_interval_fires_every_nth() {
        let mut interval = Interval::new(3);
        let fired: Vec<bool> = (0..7).map(|_| interval.check()).collect();
        assert_eq!(fired, vec![true, false, false, true, false, false, true]);
    }

    #[test]
    fn test_interval_of_one_always_fires() {
        let mut interval = Interval::new(1);
        assert!((0..5).all(|_| interval.check()));
    }

    #[test]
    fn test_planar_grid_for_2d() {
        let settings = RadiationSettings::default();
        assert!(settings.angular_grid(2).is_planar());
        assert!(!settings.angular_grid(3).is_planar());
    }
}
