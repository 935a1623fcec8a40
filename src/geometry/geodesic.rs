//! Distances along the surface from a source vertex.
//!
//! Shortest paths are taken over the edge graph with Euclidean edge lengths,
//! which overestimates the true geodesic distance by a bounded factor on
//! well-shaped triangulations.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::DVec3;

use super::mesh::{Mesh, VertexId};

#[derive(Debug, Clone, Copy)]
struct Frontier {
    distance: f64,
    vertex: usize,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap
        other
            .distance
            .partial_cmp(&self.distance)
            .unwrap_or(Ordering::Equal)
    }
}

/// Edge-graph distance of every vertex from `source`
///
/// Vertices in a different connected component get `f64::INFINITY`.
pub fn geodesic_distance(mesh: &Mesh, positions: &[DVec3], source: VertexId) -> Vec<f64> {
    let mut distances = vec![f64::INFINITY; mesh.n_vertices()];
    let mut heap = BinaryHeap::new();

    distances[source.index()] = 0.0;
    heap.push(Frontier {
        distance: 0.0,
        vertex: source.index(),
    });

    while let Some(Frontier { distance, vertex }) = heap.pop() {
        if distance > distances[vertex] {
            continue;
        }
        for neighbor in mesh.neighbors(VertexId(vertex)) {
            let j = neighbor.index();
            let candidate = distance + positions[vertex].distance(positions[j]);
            if candidate < distances[j] {
                distances[j] = candidate;
                heap.push(Frontier {
                    distance: candidate,
                    vertex: j,
                });
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shapes::{icosphere, spherical_cap};

    #[test]
    fn test_source_is_zero_and_neighbors_are_edge_lengths() {
        let (mesh, positions) = icosphere(1.0, 1).unwrap();
        let distances = geodesic_distance(&mesh, &positions, VertexId(0));
        assert_eq!(distances[0], 0.0);
        for v in mesh.neighbors(VertexId(0)) {
            let edge = positions[0].distance(positions[v.index()]);
            assert!(distances[v.index()] <= edge + 1e-12);
        }
    }

    #[test]
    fn test_antipode_distance_is_bounded() {
        let (mesh, positions) = icosphere(1.0, 2).unwrap();
        let distances = geodesic_distance(&mesh, &positions, VertexId(0));
        // Vertex 3 is the antipode of vertex 0 on the icosahedron
        assert!((positions[3] + positions[0]).length() < 1e-9);
        let antipode = distances[3];
        assert!(antipode >= 2.0);
        assert!(antipode < 2.0 * std::f64::consts::PI);
        let max = distances.iter().cloned().fold(0.0, f64::max);
        assert!(max < 2.0 * std::f64::consts::PI);
    }

    #[test]
    fn test_cap_distances_grow_by_ring() {
        let (mesh, positions) = spherical_cap(1.0, 1.0, 3, 8).unwrap();
        let distances = geodesic_distance(&mesh, &positions, VertexId(0));
        // Pole, then ring 1 (indices 1..=8), then ring 2
        assert!(distances[1..=8].iter().all(|&d| d > 0.0));
        assert!(distances[9..=16]
            .iter()
            .all(|&d| d > distances[1] - 1e-12));
        assert!(distances.iter().all(|d| d.is_finite()));
    }
}
