//! Per-segment radiative quantities.

use irrad_mesh::RadiationProperties;

use crate::error::{Result, TransportError};

/// Radiative quantities computed for one segment at the current field
/// state: the blackbody source and the absorption coefficient.
///
/// Carriers exist for one gains evaluation only; they are rebuilt from
/// the fields every cycle and never persisted across time steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Carrier {
    /// Blackbody source intensity for the segment.
    pub ij: f64,
    /// Absorption coefficient for the segment.
    pub krad: f64,
}

impl Default for Carrier {
    /// A transparent, non-emitting segment.
    fn default() -> Self {
        Self { ij: 0.0, krad: 1.0 }
    }
}

/// Evaluate the carrier for one segment.
///
/// Rejects non-physical input by propagating an error rather than
/// producing NaN/Inf.
pub(crate) fn solve_segment<P: RadiationProperties>(
    cell: usize,
    temperature: f64,
    properties: &P,
) -> Result<Carrier> {
    check_temperature(cell, temperature)?;
    let (krad, ij) = properties.absorptivity(temperature);
    Ok(Carrier { ij, krad })
}

/// Reject negative or non-finite temperatures.
pub(crate) fn check_temperature(cell: usize, temperature: f64) -> Result<f64> {
    if !temperature.is_finite() || temperature < 0.0 {
        return Err(TransportError::NonPhysicalState {
            cell,
            value: temperature,
        });
    }
    Ok(temperature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use irrad_mesh::ConstantProperties;

    #[test]
    fn test_solve_segment() {
        let props = ConstantProperties::new(0.5);
        let carrier = solve_segment(0, 1000.0, &props).unwrap();
        assert_eq!(carrier.krad, 0.5);
        assert!(carrier.ij > 0.0);
    }

    #[test]
    fn test_negative_temperature_is_rejected() {
        let props = ConstantProperties::new(0.5);
        let result = solve_segment(3, -1.0, &props);
        assert!(matches!(
            result,
            Err(TransportError::NonPhysicalState { cell: 3, .. })
        ));
    }

    #[test]
    fn test_nan_temperature_is_rejected() {
        let props = ConstantProperties::new(0.5);
        assert!(solve_segment(0, f64::NAN, &props).is_err());
        assert!(solve_segment(0, f64::INFINITY, &props).is_err());
    }
}
