//! Global scalar state of the membrane.

use std::f64::consts::PI;

use serde::Serialize;

/// Volume of the sphere with surface area `area`
pub fn sphere_volume_for_area(area: f64) -> f64 {
    4.0 / 3.0 * PI * (area / (4.0 * PI)).powf(1.5)
}

/// Current and reference area and volume, with the derived tension and pressure
///
/// The reference values are fixed at construction.
#[derive(Debug, Clone, Serialize)]
pub struct ScalarState {
    pub surface_area: f64,
    pub volume: f64,
    ref_surface_area: f64,
    ref_volume: f64,
    /// Surface tension from the last force pass
    pub surface_tension: f64,
    /// Osmotic pressure from the last force pass
    pub pressure: f64,
}

impl ScalarState {
    /// Reference area is the initial area; reference volume is the volume of
    /// the sphere of that area
    pub fn new(surface_area: f64, volume: f64) -> Self {
        Self {
            surface_area,
            volume,
            ref_surface_area: surface_area,
            ref_volume: sphere_volume_for_area(surface_area),
            surface_tension: 0.0,
            pressure: 0.0,
        }
    }

    pub fn ref_surface_area(&self) -> f64 {
        self.ref_surface_area
    }

    pub fn ref_volume(&self) -> f64 {
        self.ref_volume
    }

    /// Current reduced volume V / V_ref
    pub fn reduced_volume(&self) -> f64 {
        self.volume / self.ref_volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_reference_volume() {
        let r: f64 = 1.3;
        let area = 4.0 * PI * r * r;
        let volume = 4.0 / 3.0 * PI * r.powi(3);
        let scalars = ScalarState::new(area, volume);
        assert!((scalars.ref_volume() - volume).abs() < 1e-12);
        assert!((scalars.reduced_volume() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_reference_survives_updates() {
        let mut scalars = ScalarState::new(2.0, 0.1);
        scalars.surface_area = 3.0;
        scalars.volume = 0.2;
        assert_eq!(scalars.ref_surface_area(), 2.0);
        assert_eq!(scalars.ref_volume(), sphere_volume_for_area(2.0));
    }
}
