//! Discrete differential geometry of a triangulated surface.
//!
//! [`Geometry`] caches every quantity the force computation reads: face
//! normals, cotangent weights, dihedral angles, integrated curvatures, dual
//! areas and the sparse operators built from them. It must be refreshed with
//! [`Geometry::update`] after every change of vertex positions.
//!
//! Conventions:
//! - halfedge cotan weight = ½ cot of the angle opposite the halfedge (0 on exterior halfedges)
//! - edge cotan weight = sum over both halfedges
//! - dihedral angle is positive on convex edges and 0 on boundary edges
//! - mean curvature is area-integrated: H = ¼ Σ θ_e ℓ_e
//! - Gaussian curvature is the angle defect (2π, or π on the boundary, minus the angle sum)
//! - dual area is barycentric (⅓ of the incident face areas)

use std::f64::consts::PI;

use glam::DVec3;
use sprs::CsMat;

use super::mesh::{FaceId, HalfedgeId, Mesh};
use super::operators::{cotan_laplacian, diagonal, edge_to_vertex_average, exterior_derivative_0};
use crate::config::LaplacianKind;

/// Signed volume of the tetrahedron spanned by the origin and a triangle
#[inline]
pub fn signed_volume(p0: DVec3, p1: DVec3, p2: DVec3) -> f64 {
    p0.dot(p1.cross(p2)) / 6.0
}

/// Geometric quantities of a mesh embedding
#[derive(Debug, Clone)]
pub struct Geometry {
    pub laplacian_kind: LaplacianKind,

    pub face_normals: Vec<DVec3>,
    pub face_areas: Vec<f64>,
    /// Interior angle at the tail of each halfedge (0 on exterior halfedges)
    pub corner_angles: Vec<f64>,
    pub halfedge_cotan_weights: Vec<f64>,

    pub edge_lengths: Vec<f64>,
    pub edge_cotan_weights: Vec<f64>,
    pub edge_dihedral_angles: Vec<f64>,

    pub vertex_dual_areas: Vec<f64>,
    pub vertex_mean_curvatures: Vec<f64>,
    pub vertex_gaussian_curvatures: Vec<f64>,
    /// Angle-weighted unit normals
    pub vertex_normals: Vec<DVec3>,

    pub surface_area: f64,
    pub volume: f64,

    /// Positive semi-definite Laplacian L (V x V)
    pub cotan_laplacian: CsMat<f64>,
    /// Diagonal of dual areas (V x V)
    pub lumped_mass_matrix: CsMat<f64>,
    /// Hodge star on 1-forms (E x E)
    pub hodge1: CsMat<f64>,
    pub hodge1_inverse: CsMat<f64>,
    /// Exterior derivative on 0-forms (E x V)
    pub d0: CsMat<f64>,
    /// |d0|^T / 2, maps edge quantities back onto their endpoints (V x E)
    pub edge_to_vertex: CsMat<f64>,
}

impl Geometry {
    pub fn new(mesh: &Mesh, positions: &[DVec3], laplacian_kind: LaplacianKind) -> Self {
        let n_v = mesh.n_vertices();
        let n_e = mesh.n_edges();
        let n_f = mesh.n_faces();
        let n_h = mesh.n_halfedges();

        let mut geometry = Self {
            laplacian_kind,
            face_normals: vec![DVec3::ZERO; n_f],
            face_areas: vec![0.0; n_f],
            corner_angles: vec![0.0; n_h],
            halfedge_cotan_weights: vec![0.0; n_h],
            edge_lengths: vec![0.0; n_e],
            edge_cotan_weights: vec![0.0; n_e],
            edge_dihedral_angles: vec![0.0; n_e],
            vertex_dual_areas: vec![0.0; n_v],
            vertex_mean_curvatures: vec![0.0; n_v],
            vertex_gaussian_curvatures: vec![0.0; n_v],
            vertex_normals: vec![DVec3::ZERO; n_v],
            surface_area: 0.0,
            volume: 0.0,
            cotan_laplacian: CsMat::zero((n_v, n_v)),
            lumped_mass_matrix: CsMat::zero((n_v, n_v)),
            hodge1: CsMat::zero((n_e, n_e)),
            hodge1_inverse: CsMat::zero((n_e, n_e)),
            d0: exterior_derivative_0(mesh),
            edge_to_vertex: edge_to_vertex_average(mesh),
        };
        geometry.update(mesh, positions);
        geometry
    }

    /// Recompute all position-dependent quantities
    pub fn update(&mut self, mesh: &Mesh, positions: &[DVec3]) {
        debug_assert_eq!(positions.len(), mesh.n_vertices());

        self.update_faces(mesh, positions);
        self.update_halfedges(mesh, positions);
        self.update_edges(mesh, positions);
        self.update_vertices(mesh);

        self.surface_area = self.face_areas.iter().sum();
        self.volume = enclosed_volume(mesh, positions);

        let laplacian_weights: Vec<f64> = match self.laplacian_kind {
            LaplacianKind::Cotan => self.edge_cotan_weights.clone(),
            LaplacianKind::NonNegativeCotan => {
                self.edge_cotan_weights.iter().map(|&w| w.max(0.0)).collect()
            }
        };
        self.cotan_laplacian = cotan_laplacian(mesh, &laplacian_weights);
        self.lumped_mass_matrix = diagonal(&self.vertex_dual_areas);
        self.hodge1 = diagonal(&self.edge_cotan_weights);
        let inverse: Vec<f64> = self
            .edge_cotan_weights
            .iter()
            .map(|&w| if w != 0.0 { 1.0 / w } else { 0.0 })
            .collect();
        self.hodge1_inverse = diagonal(&inverse);
    }

    fn update_faces(&mut self, mesh: &Mesh, positions: &[DVec3]) {
        for f in mesh.faces() {
            let [a, b, c] = mesh.face_vertices(f).map(|v| positions[v.index()]);
            let cross = (b - a).cross(c - a);
            let length = cross.length();
            self.face_areas[f.index()] = 0.5 * length;
            self.face_normals[f.index()] = if length > 0.0 { cross / length } else { DVec3::ZERO };
        }
    }

    fn update_halfedges(&mut self, mesh: &Mesh, positions: &[DVec3]) {
        for h in mesh.halfedges() {
            if !mesh.is_interior(h) {
                self.corner_angles[h.index()] = 0.0;
                self.halfedge_cotan_weights[h.index()] = 0.0;
                continue;
            }
            let tail = positions[mesh.tail(h).index()];
            let tip = positions[mesh.tip(h).index()];
            let opposite = positions[mesh.tail(mesh.next(mesh.next(h))).index()];

            // Angle at the tail, between the two face edges leaving it
            let u = tip - tail;
            let v = opposite - tail;
            self.corner_angles[h.index()] = u.cross(v).length().atan2(u.dot(v));

            // Angle at the opposite corner
            let u = tail - opposite;
            let v = tip - opposite;
            let sin = u.cross(v).length();
            self.halfedge_cotan_weights[h.index()] = 0.5 * u.dot(v) / sin;
        }
    }

    fn update_edges(&mut self, mesh: &Mesh, positions: &[DVec3]) {
        for e in mesh.edges() {
            let h = mesh.edge_halfedge(e);
            let t = mesh.twin(h);
            let vec = positions[mesh.tip(h).index()] - positions[mesh.tail(h).index()];
            let length = vec.length();

            self.edge_lengths[e.index()] = length;
            self.edge_cotan_weights[e.index()] =
                self.halfedge_cotan_weights[h.index()] + self.halfedge_cotan_weights[t.index()];

            self.edge_dihedral_angles[e.index()] = match (mesh.face(h), mesh.face(t)) {
                (Some(f1), Some(f2)) => {
                    let n1 = self.face_normals[f1.index()];
                    let n2 = self.face_normals[f2.index()];
                    let direction = vec / length;
                    direction.dot(n1.cross(n2)).atan2(n1.dot(n2))
                }
                _ => 0.0,
            };
        }
    }

    fn update_vertices(&mut self, mesh: &Mesh) {
        for v in mesh.vertices() {
            let mut dual_area = 0.0;
            let mut mean = 0.0;
            let mut angle_sum = 0.0;
            let mut normal = DVec3::ZERO;

            for &h in mesh.outgoing(v) {
                let e = mesh.edge(h).index();
                mean += self.edge_dihedral_angles[e] * self.edge_lengths[e];
                if let Some(f) = mesh.face(h) {
                    let angle = self.corner_angles[h.index()];
                    dual_area += self.face_areas[f.index()] / 3.0;
                    angle_sum += angle;
                    normal += angle * self.face_normals[f.index()];
                }
            }

            let defect_base = if mesh.is_boundary_vertex(v) { PI } else { 2.0 * PI };
            let i = v.index();
            self.vertex_dual_areas[i] = dual_area;
            self.vertex_mean_curvatures[i] = mean / 4.0;
            self.vertex_gaussian_curvatures[i] = defect_base - angle_sum;
            self.vertex_normals[i] = normal.normalize_or_zero();
        }
    }

    /// Vector from tail to tip of a halfedge
    #[inline]
    pub fn halfedge_vector(mesh: &Mesh, positions: &[DVec3], h: HalfedgeId) -> DVec3 {
        positions[mesh.tip(h).index()] - positions[mesh.tail(h).index()]
    }

    #[inline]
    pub fn face_normal(&self, f: FaceId) -> DVec3 {
        self.face_normals[f.index()]
    }

    /// Pointwise mean curvature H / A
    pub fn pointwise_mean_curvature(&self, i: usize) -> f64 {
        self.vertex_mean_curvatures[i] / self.vertex_dual_areas[i]
    }

    /// Pointwise Gaussian curvature K / A
    pub fn pointwise_gaussian_curvature(&self, i: usize) -> f64 {
        self.vertex_gaussian_curvatures[i] / self.vertex_dual_areas[i]
    }
}

/// Volume enclosed by the surface; boundary loops are closed by fans
pub fn enclosed_volume(mesh: &Mesh, positions: &[DVec3]) -> f64 {
    let mut volume = 0.0;

    for boundary in mesh.boundary_loops() {
        let anchor = mesh.tail(boundary[0]);
        for &h in &boundary {
            let (tail, tip) = (mesh.tail(h), mesh.tip(h));
            if tail != anchor && tip != anchor {
                volume += signed_volume(
                    positions[tail.index()],
                    positions[tip.index()],
                    positions[anchor.index()],
                );
            }
        }
    }

    for f in mesh.faces() {
        let [a, b, c] = mesh.face_vertices(f).map(|v| positions[v.index()]);
        volume += signed_volume(a, b, c);
    }

    volume
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::{icosphere, spherical_cap};
    use crate::geometry::LinearOperator;
    use approx::assert_relative_eq;

    #[test]
    fn test_unit_tetrahedron_volume() {
        let positions = [DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
        let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh = Mesh::from_triangles(4, &faces).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        assert_relative_eq!(geometry.volume, 1.0 / 6.0, epsilon = 1e-14);
    }

    #[test]
    fn test_sphere_area_and_volume() {
        let (mesh, positions) = icosphere(1.0, 3).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        assert_relative_eq!(geometry.surface_area, 4.0 * PI, max_relative = 0.02);
        assert_relative_eq!(geometry.volume, 4.0 / 3.0 * PI, max_relative = 0.03);
    }

    #[test]
    fn test_gauss_bonnet() {
        let (mesh, positions) = icosphere(1.7, 2).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        let total: f64 = geometry.vertex_gaussian_curvatures.iter().sum();
        assert_relative_eq!(total, 4.0 * PI, epsilon = 1e-10);
    }

    #[test]
    fn test_sphere_mean_curvature() {
        let radius = 2.0;
        let (mesh, positions) = icosphere(radius, 3).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        assert!(geometry.edge_dihedral_angles.iter().all(|&theta| theta > 0.0));

        // Barycentric dual areas make pointwise H vary between vertices of
        // different valence, so only its sign is checked per vertex
        let mut weighted = 0.0;
        for i in 0..mesh.n_vertices() {
            let h = geometry.pointwise_mean_curvature(i);
            assert!(h > 0.0);
            weighted += h * geometry.vertex_dual_areas[i];
        }
        assert_relative_eq!(weighted / geometry.surface_area, 1.0 / radius, max_relative = 0.05);
    }

    #[test]
    fn test_dual_areas_partition_surface() {
        let (mesh, positions) = spherical_cap(1.0, 1.2, 5, 16).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        let total: f64 = geometry.vertex_dual_areas.iter().sum();
        assert_relative_eq!(total, geometry.surface_area, epsilon = 1e-12);
        for e in mesh.edges() {
            if mesh.is_boundary_edge(e) {
                assert_eq!(geometry.edge_dihedral_angles[e.index()], 0.0);
            }
        }
    }

    #[test]
    fn test_vertex_normals_point_outward() {
        let (mesh, positions) = icosphere(1.0, 2).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        for (n, p) in geometry.vertex_normals.iter().zip(&positions) {
            assert!(n.dot(*p) > 0.99);
        }
    }

    #[test]
    fn test_laplacian_of_coordinates_is_mean_curvature_normal() {
        // L x = 2 H n integrated over the dual cell, i.e. the area gradient
        let (mesh, positions) = icosphere(1.0, 3).unwrap();
        let geometry = Geometry::new(&mesh, &positions, LaplacianKind::Cotan);
        let xs: Vec<f64> = positions.iter().map(|p| p.x).collect();
        let lx = geometry.cotan_laplacian.apply(&xs);
        for (i, p) in positions.iter().enumerate() {
            let scale = 2.0 * geometry.vertex_mean_curvatures[i];
            assert!((lx[i] - scale * p.x).abs() < 0.1 * scale);
        }
    }

    #[test]
    fn test_nonnegative_laplacian_drops_negative_weights() {
        let (mesh, mut positions) = icosphere(1.0, 1).unwrap();
        positions[0] *= 1.8;
        let clamped = Geometry::new(&mesh, &positions, LaplacianKind::NonNegativeCotan);
        for row in clamped.cotan_laplacian.outer_iterator() {
            for (_, &value) in row.iter() {
                // Off-diagonal entries are -w <= 0, diagonals are sums of w >= 0
                assert!(value.is_finite());
            }
        }
        for (i, row) in clamped.cotan_laplacian.outer_iterator().enumerate() {
            for (j, &value) in row.iter() {
                if i != j {
                    assert!(value <= 0.0);
                }
            }
        }
    }
}
