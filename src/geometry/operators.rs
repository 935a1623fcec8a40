//! Sparse discrete operators on vertex (0-form) and edge (1-form) data.

use sprs::{CsMat, TriMat};

use super::mesh::Mesh;

/// Matrix-vector products for CSR operators
pub trait LinearOperator {
    /// out = A * v
    fn apply(&self, v: &[f64]) -> Vec<f64>;
}

impl LinearOperator for CsMat<f64> {
    fn apply(&self, v: &[f64]) -> Vec<f64> {
        debug_assert_eq!(self.cols(), v.len());
        let mut result = vec![0.0; self.rows()];
        for (row_idx, row) in self.outer_iterator().enumerate() {
            let mut sum = 0.0;
            for (col_idx, &val) in row.iter() {
                sum += val * v[col_idx];
            }
            result[row_idx] = sum;
        }
        result
    }
}

/// Diagonal matrix in CSR format
pub fn diagonal(values: &[f64]) -> CsMat<f64> {
    let n = values.len();
    let mut triplets = TriMat::new((n, n));
    for (i, &value) in values.iter().enumerate() {
        triplets.add_triplet(i, i, value);
    }
    triplets.to_csr()
}

/// Exterior derivative on 0-forms (E x V)
///
/// Row `e` holds -1 at the tail and +1 at the tip of the edge's canonical halfedge.
pub fn exterior_derivative_0(mesh: &Mesh) -> CsMat<f64> {
    let mut triplets = TriMat::new((mesh.n_edges(), mesh.n_vertices()));
    for e in mesh.edges() {
        let (tail, tip) = mesh.edge_vertices(e);
        triplets.add_triplet(e.index(), tail.index(), -1.0);
        triplets.add_triplet(e.index(), tip.index(), 1.0);
    }
    triplets.to_csr()
}

/// Edge-to-vertex averaging |d0|^T / 2 (V x E)
pub fn edge_to_vertex_average(mesh: &Mesh) -> CsMat<f64> {
    let mut triplets = TriMat::new((mesh.n_vertices(), mesh.n_edges()));
    for e in mesh.edges() {
        let (tail, tip) = mesh.edge_vertices(e);
        triplets.add_triplet(tail.index(), e.index(), 0.5);
        triplets.add_triplet(tip.index(), e.index(), 0.5);
    }
    triplets.to_csr()
}

/// Positive semi-definite cotangent Laplacian from per-edge weights
pub fn cotan_laplacian(mesh: &Mesh, edge_weights: &[f64]) -> CsMat<f64> {
    let n = mesh.n_vertices();
    let mut triplets = TriMat::new((n, n));
    for e in mesh.edges() {
        let (i, j) = mesh.edge_vertices(e);
        let w = edge_weights[e.index()];
        triplets.add_triplet(i.index(), i.index(), w);
        triplets.add_triplet(j.index(), j.index(), w);
        triplets.add_triplet(i.index(), j.index(), -w);
        triplets.add_triplet(j.index(), i.index(), -w);
    }
    triplets.to_csr()
}
