//! Membrane forces from discrete variations of the Helfrich energy.
//!
//! The live force pass is [`System::compute_physical_forces`]: the
//! fundamental three forces (bending, capillary, osmotic) from halfedge
//! accumulation, plus normal-directed line-capillary and external forces.
//! The closed-form scalar forces are alternate formulations kept for
//! cross-validation and status output.
//!
//! Sign conventions: forces are negative energy gradients, so on a sphere
//! larger than its target the osmotic force points inward.

use glam::DVec3;

use super::diagnostics::has_outlier;
use super::System;
use crate::config::PressureMode;
use crate::geometry::{Geometry, LinearOperator};

/// Outlier bound used by the bending smoothness check
const SMOOTHNESS_THRESHOLD: f64 = 0.5;

impl System {
    /// Surface tension from the current area
    ///
    /// On a closed mesh this is dE_surface/dA, Ksg (A - A0)/A0 + λSG, so the
    /// Lagrange multiplier enters the capillary force as well as the energy.
    pub fn surface_tension(&self) -> f64 {
        let p = &self.parameters;
        if self.options.is_open_mesh() {
            p.surface_modulus
        } else {
            let ref_area = self.scalars.ref_surface_area();
            p.surface_modulus * (self.scalars.surface_area - ref_area) / ref_area
                + p.surface_lagrange
        }
    }

    /// Osmotic pressure from the current volume
    pub fn pressure(&self) -> f64 {
        let p = &self.parameters;
        let volume = self.scalars.volume;
        match self.options.pressure_mode {
            PressureMode::Open => p.volume_modulus,
            PressureMode::FixedReducedVolume => {
                let target = self.scalars.ref_volume() * p.reduced_volume;
                -(p.volume_modulus * (volume - target) / target + p.volume_lagrange)
            }
            PressureMode::AmbientConcentration => {
                p.volume_modulus / volume - p.volume_modulus * p.ambient_concentration
            }
        }
    }

    /// Bending, capillary and osmotic forces from halfedge accumulation
    ///
    /// Each vertex collects the gradient of its own energy density and the
    /// gradients transmitted from every neighbour's energy density.
    pub fn compute_fundamental_three_forces(&mut self) {
        let surface_tension = self.surface_tension();
        let pressure = self.pressure();
        self.scalars.surface_tension = surface_tension;
        self.scalars.pressure = pressure;

        let mesh = &self.mesh;
        let geometry = &self.geometry;
        let pos = &self.fields.positions;
        let kb = &self.fields.bending_modulus;
        let h0 = &self.fields.spontaneous_curvature;
        let forces = &mut self.forces;

        let normal = |h| mesh.face(h).map(|f| geometry.face_normal(f));
        let vector = |h| Geometry::halfedge_vector(mesh, pos, h);

        for v in mesh.vertices() {
            let i = v.index();

            let mut vol_grad = DVec3::ZERO;
            let mut area_grad_i = DVec3::ZERO;
            let mut gauss_vec = DVec3::ZERO;
            let mut schlafli_vec = DVec3::ZERO;
            let mut bend_j_sum = DVec3::ZERO;
            let mut area_grad_j_sum = DVec3::ZERO;

            for &he in mesh.outgoing(v) {
                let j = mesh.tip(he).index();
                let e = mesh.edge(he).index();
                let twin = mesh.twin(he);
                let e_ji = pos[i] - pos[j];

                let next = mesh.next(he);
                let next_next = mesh.next(next);
                let twin_next = mesh.next(twin);
                let twin_next_next = mesh.next(twin_next);

                let w = &geometry.halfedge_cotan_weights;
                let mut area_grad_j = DVec3::ZERO;
                // ∇_i of the dihedral terms in H_i and in H_j
                let mut schlafli_i = DVec3::ZERO;
                let mut schlafli_ji = DVec3::ZERO;

                if let Some(n) = normal(he) {
                    let opposite = vector(next);
                    let (a, b) = (mesh.tail(next).index(), mesh.tip(next).index());
                    vol_grad += pos[a].cross(pos[b]) / 6.0;
                    area_grad_i += n.cross(opposite) / 6.0;
                    area_grad_j += n.cross(opposite) / 6.0;
                    schlafli_i += w[next_next.index()] * n;
                    schlafli_ji -= w[he.index()] * n;
                }
                if let Some(n) = normal(twin) {
                    area_grad_j += n.cross(vector(twin_next_next)) / 6.0;
                    schlafli_i += w[twin_next.index()] * n;
                    schlafli_ji -= w[twin.index()] * n;
                }

                let gauss_ji = 0.5 * geometry.edge_dihedral_angles[e] * e_ji.normalize_or_zero();
                gauss_vec += gauss_ji;
                schlafli_vec += schlafli_i;

                let h_j = geometry.pointwise_mean_curvature(j);
                bend_j_sum += kb[j]
                    * (h_j - h0[j])
                    * (gauss_ji + schlafli_ji + (-h_j - h0[j]) * area_grad_j);
                area_grad_j_sum += area_grad_j;
            }

            let h_i = geometry.pointwise_mean_curvature(i);
            let bend_i = kb[i]
                * (h_i - h0[i])
                * (gauss_vec + schlafli_vec + (-h_i - h0[i]) * area_grad_i);

            forces.bending[i] = -bend_i - bend_j_sum;
            forces.capillary[i] = -surface_tension * (area_grad_i + area_grad_j_sum);
            forces.osmotic[i] = pressure * vol_grad;
            forces.fundamental[i] = forces.bending[i] + forces.capillary[i] + forces.osmotic[i];
        }
    }

    /// Cotangent-weighted area gradient Σ w_e (p_i - p_j) of every vertex
    pub fn area_gradient_cotan(&self) -> Vec<DVec3> {
        let pos = &self.fields.positions;
        self.mesh
            .vertices()
            .map(|v| {
                self.mesh
                    .outgoing(v)
                    .iter()
                    .map(|&he| {
                        let w = self.geometry.edge_cotan_weights[self.mesh.edge(he).index()];
                        w * (pos[v.index()] - pos[self.mesh.tip(he).index()])
                    })
                    .sum::<DVec3>()
            })
            .collect()
    }

    /// Normal bending force from the Laplacian formulation,
    /// 2 Kb (H - H0)(H² + H H0 - K) + Δ(Kb (H - H0)) integrated over dual areas
    ///
    /// Positive values point along the outward vertex normal. Also records
    /// whether the result is free of outliers.
    pub fn compute_bending_force(&mut self) -> &[f64] {
        let geometry = &self.geometry;
        let kb = &self.fields.bending_modulus;
        let h0 = &self.fields.spontaneous_curvature;
        let area = &geometry.vertex_dual_areas;
        let n = self.mesh.n_vertices();

        let h: Vec<f64> = (0..n).map(|i| geometry.pointwise_mean_curvature(i)).collect();
        let weighted_mismatch: Vec<f64> = (0..n).map(|i| kb[i] * (h[i] - h0[i])).collect();
        let laplacian = geometry.cotan_laplacian.apply(&weighted_mismatch);

        let integrand: Vec<f64> = (0..n)
            .map(|i| {
                let lap_h = -laplacian[i] / area[i];
                let scalar = h[i] * h[i] + h[i] * h0[i] - geometry.pointwise_gaussian_curvature(i);
                let product = 2.0 * kb[i] * (h[i] - h0[i]) * scalar;
                product + lap_h
            })
            .collect();
        self.forces.bending_pressure = geometry.lumped_mass_matrix.apply(&integrand);

        self.forces.is_smooth = !has_outlier(&self.forces.bending_pressure, SMOOTHNESS_THRESHOLD);
        if !self.forces.is_smooth {
            log::debug!("Bending force has outliers at t = {:.4}", self.time);
        }
        &self.forces.bending_pressure
    }

    /// Closed-form capillary force -2 γ H
    pub fn compute_capillary_force(&mut self) -> &[f64] {
        let surface_tension = self.surface_tension();
        self.scalars.surface_tension = surface_tension;
        self.forces.capillary_pressure = self
            .geometry
            .vertex_mean_curvatures
            .iter()
            .map(|&h| -2.0 * surface_tension * h)
            .collect();
        &self.forces.capillary_pressure
    }

    /// Closed-form osmotic pressure per unit dual area
    pub fn compute_osmotic_force(&mut self) -> &[f64] {
        let pressure = self.pressure();
        self.scalars.pressure = pressure;
        self.forces.osmotic_pressure = self
            .geometry
            .vertex_dual_areas
            .iter()
            .map(|&a| pressure / a)
            .collect();
        &self.forces.osmotic_pressure
    }

    /// Line-capillary force magnitude -D ★1⁻¹ ((★1 η/ℓ) ⊙ max(θ, 0))
    ///
    /// Concave edges are dropped.
    pub fn compute_line_capillary_force(&mut self) -> &[f64] {
        let geometry = &self.geometry;
        let tension_density: Vec<f64> = self
            .line_tension
            .iter()
            .zip(&geometry.edge_lengths)
            .map(|(&eta, &l)| eta / l)
            .collect();
        let mut edge_force = geometry.hodge1.apply(&tension_density);
        for (f, &theta) in edge_force.iter_mut().zip(&geometry.edge_dihedral_angles) {
            *f *= theta.max(0.0);
        }
        let edge_force = geometry.hodge1_inverse.apply(&edge_force);
        self.forces.line_capillary = geometry
            .edge_to_vertex
            .apply(&edge_force)
            .into_iter()
            .map(|f| -f)
            .collect();
        &self.forces.line_capillary
    }

    /// Gaussian external force around the reference vertex, integrated over dual areas
    pub fn compute_external_force(&mut self) -> &[f64] {
        let distances = &self.fields.geodesic_distance;
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);
        let std_dev = max_distance / self.parameters.external_concentration;
        let magnitude: Vec<f64> = distances
            .iter()
            .map(|&d| self.parameters.external_force * (-d * d / (2.0 * std_dev * std_dev)).exp())
            .collect();

        self.forces.external = self.geometry.lumped_mass_matrix.apply(&magnitude);
        for ((vector, &f), n) in self
            .forces
            .external_vectors
            .iter_mut()
            .zip(&self.forces.external)
            .zip(&self.geometry.vertex_normals)
        {
            *vector = f * *n;
        }
        &self.forces.external
    }

    /// μ = ε - 2 Kb (H - H0) dH0/dφ with H0(φ) = 2 H0max φ / (1 + φ²)
    pub fn compute_chemical_potential(&mut self) -> &[f64] {
        let h0_max = self.parameters.spontaneous_curvature;
        let epsilon = self.parameters.protein_binding;
        let geometry = &self.geometry;
        let fields = &self.fields;

        self.forces.chemical_potential = (0..self.mesh.n_vertices())
            .map(|i| {
                let phi = fields.protein_density[i];
                let phi_sq = phi * phi;
                let dh0_dphi = 2.0 * h0_max * (1.0 - phi_sq) / ((1.0 + phi_sq) * (1.0 + phi_sq));
                let mismatch =
                    geometry.pointwise_mean_curvature(i) - fields.spontaneous_curvature[i];
                epsilon - 2.0 * fields.bending_modulus[i] * mismatch * dh0_dphi
            })
            .collect();
        &self.forces.chemical_potential
    }

    /// Full deterministic force pass
    pub fn compute_physical_forces(&mut self) {
        self.forces.reset_physical();

        self.compute_fundamental_three_forces();
        if self.parameters.line_tension != 0.0 {
            self.compute_line_capillary_force();
        }
        if self.options.is_protein {
            self.compute_chemical_potential();
        }
        if self.parameters.external_force != 0.0 {
            self.compute_external_force();
        }

        let forces = &mut self.forces;
        for (i, physical) in forces.physical.iter_mut().enumerate() {
            let normal_magnitude = forces.line_capillary[i] + forces.external[i];
            *physical = forces.fundamental[i] + normal_magnitude * self.geometry.vertex_normals[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, Parameters};
    use crate::geometry::{ellipsoid, icosphere, spherical_cap};
    use approx::assert_relative_eq;

    fn sphere_system(params: Parameters, options: Options) -> System {
        let (mesh, positions) = icosphere(1.0, 2).unwrap();
        System::new(mesh, positions, params, options).unwrap()
    }

    #[test]
    fn test_area_gradient_formulations_agree() {
        let (mesh, positions) = ellipsoid(DVec3::new(1.2, 1.0, 0.8), 2).unwrap();
        let mut system =
            System::new(mesh, positions, Parameters::default(), Options::default()).unwrap();
        // Tension of exactly one so the capillary force is minus the area gradient
        system.scalars.surface_area = 2.0 * system.scalars.ref_surface_area();
        system.compute_fundamental_three_forces();
        assert_relative_eq!(system.scalars.surface_tension, 2.0, epsilon = 1e-12);

        let cotan = system.area_gradient_cotan();
        for (capillary, grad) in system.forces.capillary.iter().zip(&cotan) {
            assert!((*capillary + 2.0 * *grad).length() < 1e-10);
        }
    }

    #[test]
    fn test_volume_gradient_matches_area_weighted_normals() {
        let params = Parameters {
            volume_modulus: 0.0,
            volume_lagrange: -1.0,
            ..Default::default()
        };
        let mut system = sphere_system(params, Options::default());
        system.compute_fundamental_three_forces();
        assert_relative_eq!(system.scalars.pressure, 1.0, epsilon = 1e-12);

        for v in system.mesh.vertices() {
            let expected: DVec3 = system
                .mesh
                .outgoing(v)
                .iter()
                .filter_map(|&h| system.mesh.face(h))
                .map(|f| system.geometry.face_areas[f.index()] * system.geometry.face_normal(f) / 3.0)
                .sum();
            assert!((system.forces.osmotic[v.index()] - expected).length() < 1e-12);
        }
    }

    #[test]
    fn test_bending_force_vanishes_at_matching_curvature() {
        let params = Parameters {
            bending_modulus: 1.0,
            ..Default::default()
        };
        let mut system = sphere_system(params, Options::default());
        let n = system.n_vertices();
        for i in 0..n {
            system.fields.spontaneous_curvature[i] = system.geometry.pointwise_mean_curvature(i);
        }
        system.compute_fundamental_three_forces();
        for f in &system.forces.bending {
            assert!(f.length() < 1e-12);
        }
    }

    #[test]
    fn test_pressure_modes() {
        let params = Parameters {
            volume_modulus: 2.0,
            ambient_concentration: 0.5,
            ..Default::default()
        };
        let mut system = sphere_system(params, Options::default());
        let v = system.scalars.volume;
        let target = system.scalars.ref_volume() * 0.7;
        assert_relative_eq!(system.pressure(), -2.0 * (v - target) / target, epsilon = 1e-12);

        system.options.pressure_mode = PressureMode::AmbientConcentration;
        assert_relative_eq!(system.pressure(), 2.0 / v - 1.0, epsilon = 1e-12);

        system.options.pressure_mode = PressureMode::Open;
        assert_relative_eq!(system.pressure(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(system.surface_tension(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_closed_form_capillary_and_osmotic() {
        let mut system = sphere_system(Parameters::default(), Options::default());
        system.scalars.surface_area *= 1.5;
        let tension = system.surface_tension();
        let h = system.geometry.vertex_mean_curvatures.clone();
        let capillary = system.compute_capillary_force().to_vec();
        for (c, h) in capillary.iter().zip(&h) {
            assert_relative_eq!(*c, -2.0 * tension * h, epsilon = 1e-14);
        }

        let pressure = system.pressure();
        let osmotic = system.compute_osmotic_force().to_vec();
        for (o, a) in osmotic.iter().zip(&system.geometry.vertex_dual_areas) {
            assert_relative_eq!(*o * a, pressure, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_laplacian_bending_is_smooth_on_sphere() {
        let params = Parameters {
            bending_modulus: 0.1,
            spontaneous_curvature: 0.5,
            ..Default::default()
        };
        let mut system = sphere_system(params, Options::default());
        let bending = system.compute_bending_force().to_vec();
        assert!(bending.iter().all(|f| f.is_finite()));
        assert!(system.forces.is_smooth);
    }

    #[test]
    fn test_line_capillary_zero_without_tension() {
        let mut system = sphere_system(Parameters::default(), Options::default());
        let line = system.compute_line_capillary_force();
        assert!(line.iter().all(|&f| f == 0.0));
    }

    #[test]
    fn test_external_force_peaks_at_reference_vertex() {
        let params = Parameters {
            external_force: 1.0,
            external_concentration: 4.0,
            reference_vertex: 5,
            ..Default::default()
        };
        let mut system = sphere_system(params, Options::default());
        let external = system.compute_external_force().to_vec();
        let magnitude = |i: usize| external[i] / system.geometry.vertex_dual_areas[i];
        assert_relative_eq!(magnitude(5), 1.0, epsilon = 1e-12);
        for i in 0..system.n_vertices() {
            assert!(magnitude(i) <= 1.0 + 1e-12);
        }
        let n5 = system.geometry.vertex_normals[5];
        assert!((system.forces.external_vectors[5] - external[5] * n5).length() < 1e-15);
    }

    #[test]
    fn test_chemical_potential_at_saturation_is_binding_energy() {
        // dH0/dφ vanishes at φ = 1
        let params = Parameters {
            spontaneous_curvature: 1.0,
            protein_binding: -0.3,
            ..Default::default()
        };
        let options = Options {
            is_protein: true,
            ..Default::default()
        };
        let mut system = sphere_system(params, options);
        let mu = system.compute_chemical_potential();
        assert!(mu.iter().all(|&m| (m + 0.3).abs() < 1e-12));
    }

    #[test]
    fn test_physical_forces_include_normal_terms() {
        let params = Parameters {
            external_force: 0.5,
            ..Default::default()
        };
        let mut system = sphere_system(params, Options::default());
        system.compute_physical_forces();
        for i in 0..system.n_vertices() {
            let expected = system.forces.fundamental[i]
                + system.forces.external[i] * system.geometry.vertex_normals[i];
            assert!((system.forces.physical[i] - expected).length() < 1e-15);
        }
    }

    #[test]
    fn test_open_patch_forces_are_finite() {
        let (mesh, positions) = spherical_cap(1.0, 1.0, 5, 16).unwrap();
        let params = Parameters {
            bending_modulus: 0.1,
            ..Default::default()
        };
        let mut system = System::new(mesh, positions, params, Options::default()).unwrap();
        system.compute_physical_forces();
        assert!(system
            .forces
            .physical
            .iter()
            .all(|f| f.is_finite()));
    }
}
