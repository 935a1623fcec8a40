//! Dissipative Particle Dynamics (DPD) thermostat on mesh edges.
//!
//! Every edge couples its two endpoints with:
//! F_D = -γ (v_ij · r̂) r̂        (dissipative)
//! F_R = σ θ r̂                  (random, θ ~ N(0, 1))
//!
//! Fluctuation-dissipation theorem: σ² = 2 γ k_B T / dt
//!
//! Both terms are applied with opposite signs to the two endpoints, so the
//! thermostat conserves momentum.
//!
//! Reference: Groot & Warren, J Chem Phys 1997
//! Reference: Español & Warren, Europhys Lett 1995

use glam::DVec3;
use rand::Rng;
use rand_distr::StandardNormal;

use super::System;
use crate::geometry::Mesh;

/// Boltzmann constant in simulation units
pub const K_BOLTZMANN: f64 = 1.380_648_52e-5;

/// Random force amplitude σ = sqrt(2 γ k_B T / dt)
pub fn noise_amplitude(friction: f64, temperature: f64, dt: f64) -> f64 {
    (2.0 * friction * K_BOLTZMANN * temperature / dt).sqrt()
}

/// Pairwise DPD forces over all edges
///
/// Edges are visited in index order, one normal draw per edge, so a seeded
/// generator gives a reproducible stream. The dissipative branch is skipped
/// when `friction` is exactly zero, the random branch when σ is exactly zero.
/// Forces accumulate into `damping` and `stochastic`.
#[allow(clippy::too_many_arguments)]
pub fn pairwise_forces<R: Rng + ?Sized>(
    mesh: &Mesh,
    positions: &[DVec3],
    velocities: &[DVec3],
    friction: f64,
    sigma: f64,
    rng: &mut R,
    damping: &mut [DVec3],
    stochastic: &mut [DVec3],
) {
    for e in mesh.edges() {
        let (v1, v2) = mesh.edge_vertices(e);
        let (i, j) = (v1.index(), v2.index());

        let dir = (positions[i] - positions[j]).normalize_or_zero();

        if friction != 0.0 {
            let dvel = velocities[i] - velocities[j];
            let df = friction * dvel.dot(dir) * dir;
            damping[i] -= df;
            damping[j] += df;
        }

        if sigma != 0.0 {
            let theta: f64 = rng.sample(StandardNormal);
            let noise = sigma * theta;
            stochastic[i] += noise * dir;
            stochastic[j] -= noise * dir;
        }
    }
}

impl System {
    /// Damping and stochastic forces for a step of size `dt`
    pub fn compute_dpd_forces(&mut self, dt: f64) {
        let sigma = noise_amplitude(self.parameters.friction, self.parameters.temperature, dt);
        self.forces.reset_dpd();
        pairwise_forces(
            &self.mesh,
            &self.fields.positions,
            &self.fields.velocities,
            self.parameters.friction,
            sigma,
            &mut self.rng,
            &mut self.forces.damping,
            &mut self.forces.stochastic,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, Parameters};
    use crate::geometry::icosphere;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_triangles() -> (Mesh, Vec<DVec3>) {
        let faces = [[0, 1, 2], [0, 2, 3]];
        let mesh = Mesh::from_triangles(4, &faces).unwrap();
        let positions = vec![
            DVec3::ZERO,
            DVec3::X,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::Y,
        ];
        (mesh, positions)
    }

    #[test]
    fn test_fluctuation_dissipation() {
        let sigma = noise_amplitude(2.0, 300.0, 0.01);
        let expected_sq = 2.0 * 2.0 * K_BOLTZMANN * 300.0 / 0.01;
        assert!((sigma * sigma - expected_sq).abs() / expected_sq < 1e-12);
        assert_eq!(noise_amplitude(2.0, 0.0, 0.01), 0.0);
        assert_eq!(noise_amplitude(0.0, 300.0, 0.01), 0.0);
    }

    #[test]
    fn test_dissipative_force_direction() {
        // Single edge 0 -> 1 along x
        let (mesh, positions) = two_triangles();
        let mut rng = StdRng::seed_from_u64(0);
        let mut damping = vec![DVec3::ZERO; 4];
        let mut stochastic = vec![DVec3::ZERO; 4];

        // Vertices 0 and 1 approach each other
        let mut velocities = vec![DVec3::ZERO; 4];
        velocities[0] = DVec3::X;
        velocities[1] = -DVec3::X;
        pairwise_forces(
            &mesh,
            &positions,
            &velocities,
            1.0,
            0.0,
            &mut rng,
            &mut damping,
            &mut stochastic,
        );

        // Dissipation resists the approach
        assert!(damping[0].x < 0.0);
        assert!(damping[1].x > 0.0);
        assert!(stochastic.iter().all(|f| *f == DVec3::ZERO));
    }

    #[test]
    fn test_forces_are_pairwise_and_momentum_conserving() {
        let (mesh, positions) = icosphere(1.0, 1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let velocities: Vec<DVec3> = (0..positions.len())
            .map(|i| DVec3::new((i as f64).sin(), (i as f64 * 0.5).cos(), 0.1 * i as f64))
            .collect();
        let mut damping = vec![DVec3::ZERO; positions.len()];
        let mut stochastic = vec![DVec3::ZERO; positions.len()];
        pairwise_forces(
            &mesh,
            &positions,
            &velocities,
            0.7,
            0.3,
            &mut rng,
            &mut damping,
            &mut stochastic,
        );

        assert!(damping.iter().sum::<DVec3>().length() < 1e-12);
        assert!(stochastic.iter().sum::<DVec3>().length() < 1e-12);
        assert!(stochastic.iter().any(|f| f.length() > 0.0));
    }

    #[test]
    fn test_zero_friction_and_temperature_give_exact_zeros() {
        let (mesh, positions) = icosphere(1.0, 1).unwrap();
        let params = Parameters {
            friction: 0.0,
            temperature: 0.0,
            ..Default::default()
        };
        let mut system = System::new(mesh, positions, params, Options::default()).unwrap();
        system.fields.velocities.fill(DVec3::new(0.1, -0.2, 0.3));
        system.compute_dpd_forces(0.01);
        assert!(system.forces.damping.iter().all(|f| *f == DVec3::ZERO));
        assert!(system.forces.stochastic.iter().all(|f| *f == DVec3::ZERO));

        // Friction alone still gives no noise at zero temperature
        system.parameters.friction = 1.0;
        system.fields.velocities[0] = DVec3::new(1.0, 0.0, 0.0);
        system.compute_dpd_forces(0.01);
        assert!(system.forces.damping.iter().any(|f| *f != DVec3::ZERO));
        assert!(system.forces.stochastic.iter().all(|f| *f == DVec3::ZERO));
    }

    #[test]
    fn test_seeded_stream_is_reproducible() {
        let (mesh, positions) = icosphere(1.0, 1).unwrap();
        let params = Parameters {
            temperature: 1e4,
            seed: 42,
            ..Default::default()
        };
        let mut a = System::new(mesh.clone(), positions.clone(), params.clone(), Options::default())
            .unwrap();
        let mut b = System::new(mesh, positions, params, Options::default()).unwrap();
        a.compute_dpd_forces(0.01);
        b.compute_dpd_forces(0.01);
        assert_eq!(a.forces.stochastic, b.forces.stochastic);

        a.compute_dpd_forces(0.01);
        assert_ne!(a.forces.stochastic, b.forces.stochastic);
    }

    #[test]
    fn test_damping_is_recomputed_each_pass() {
        let (mesh, positions) = icosphere(1.0, 1).unwrap();
        let mut system = System::new(mesh, positions, Parameters::default(), Options::default())
            .unwrap();
        system.fields.velocities[0] = DVec3::new(1.0, 0.0, 0.0);
        system.compute_dpd_forces(0.01);
        let first = system.forces.damping.clone();
        system.compute_dpd_forces(0.01);
        assert_eq!(system.forces.damping, first);
    }
}
