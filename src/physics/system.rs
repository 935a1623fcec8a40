//! The simulated membrane: topology, embedding, fields and force buffers.

use glam::DVec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{ConfigError, Options, Parameters, PressureMode};
use crate::geometry::{geodesic_distance, Geometry, LinearOperator, Mesh, VertexId};
use crate::state::{ForceFields, ScalarState, VertexFields};

/// Complete state of one membrane simulation
pub struct System {
    pub mesh: Mesh,
    pub geometry: Geometry,
    pub parameters: Parameters,
    pub options: Options,
    pub fields: VertexFields,
    pub forces: ForceFields,
    pub scalars: ScalarState,
    /// Line tension per edge, nonzero only across curvature-domain interfaces
    pub line_tension: Vec<f64>,
    /// Simulated time
    pub time: f64,
    /// Generator behind the stochastic forces, seeded once
    pub(crate) rng: StdRng,
}

impl System {
    /// Build a system from a mesh and its initial embedding
    ///
    /// Meshes with a boundary always run with [`PressureMode::Open`].
    pub fn new(
        mesh: Mesh,
        positions: Vec<DVec3>,
        parameters: Parameters,
        mut options: Options,
    ) -> Result<Self, ConfigError> {
        if positions.len() != mesh.n_vertices() {
            return Err(ConfigError::PositionCount {
                positions: positions.len(),
                n_vertices: mesh.n_vertices(),
            });
        }
        parameters.validate(mesh.n_vertices())?;

        if mesh.has_boundary() && options.pressure_mode != PressureMode::Open {
            log::warn!(
                "Mesh has a boundary, switching pressure mode from {:?} to Open",
                options.pressure_mode
            );
            options.pressure_mode = PressureMode::Open;
        }

        let geometry = Geometry::new(&mesh, &positions, options.laplacian);
        let scalars = ScalarState::new(geometry.surface_area, geometry.volume);

        let mut fields = VertexFields::new(positions, &parameters);
        fields.geodesic_distance = geodesic_distance(
            &mesh,
            &fields.positions,
            VertexId(parameters.reference_vertex),
        );

        let n_vertices = mesh.n_vertices();
        let n_edges = mesh.n_edges();
        let rng = StdRng::seed_from_u64(parameters.seed);

        let mut system = Self {
            mesh,
            geometry,
            parameters,
            options,
            fields,
            forces: ForceFields::new(n_vertices),
            scalars,
            line_tension: vec![0.0; n_edges],
            time: 0.0,
            rng,
        };
        system.update_spontaneous_curvature();
        system.update_line_tension();

        log::debug!(
            "System created: {} vertices, {} edges, {} faces, area {:.4}, volume {:.4}",
            n_vertices,
            n_edges,
            system.mesh.n_faces(),
            system.scalars.surface_area,
            system.scalars.volume
        );

        Ok(system)
    }

    pub fn n_vertices(&self) -> usize {
        self.mesh.n_vertices()
    }

    /// Recompute geometry and every geometry-derived field
    ///
    /// Must run after any change to `fields.positions`, before the next force pass.
    pub fn update_vertex_positions(&mut self) {
        self.geometry.update(&self.mesh, &self.fields.positions);
        self.scalars.surface_area = self.geometry.surface_area;
        self.scalars.volume = self.geometry.volume;
        self.update_spontaneous_curvature();
        self.update_line_tension();
    }

    /// Local spontaneous curvature from the protein density, the curvature
    /// domain, or the constant parameter
    fn update_spontaneous_curvature(&mut self) {
        let h0 = self.parameters.spontaneous_curvature;
        let h0_field = &mut self.fields.spontaneous_curvature;

        if self.options.is_protein {
            for (h, &phi) in h0_field.iter_mut().zip(&self.fields.protein_density) {
                *h = 2.0 * h0 * phi / (1.0 + phi * phi);
            }
        } else if self.options.is_local_curvature {
            let radius = self.parameters.domain_radius;
            let sharpness = self.parameters.domain_sharpness;
            for (h, &d) in h0_field.iter_mut().zip(&self.fields.geodesic_distance) {
                *h = h0 * 0.5 * (1.0 + (sharpness * (radius - d)).tanh());
            }
        } else {
            h0_field.fill(h0);
        }
    }

    /// η |d0 χ| with χ the spontaneous curvature relative to its maximum
    fn update_line_tension(&mut self) {
        let eta = self.parameters.line_tension;
        let h0 = self.parameters.spontaneous_curvature;
        if eta == 0.0 || h0 == 0.0 {
            self.line_tension.fill(0.0);
            return;
        }

        let indicator: Vec<f64> = self
            .fields
            .spontaneous_curvature
            .iter()
            .map(|&h| h / h0)
            .collect();
        let jumps = self.geometry.d0.apply(&indicator);
        for (tension, jump) in self.line_tension.iter_mut().zip(jumps) {
            *tension = eta * jump.abs();
        }
    }

    /// Height of the reference vertex
    pub fn reference_height(&self) -> f64 {
        self.fields.positions[self.parameters.reference_vertex].z.abs()
    }
}
