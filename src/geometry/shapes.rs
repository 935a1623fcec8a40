//! Parametric surface meshes used as initial conditions.
//!
//! Closed vesicles start from subdivided icosahedra (optionally stretched into
//! ellipsoids); open patches are spherical caps triangulated ring by ring.

use std::collections::HashMap;

use glam::DVec3;

use super::mesh::{Mesh, MeshError};

/// Golden ratio used by the icosahedron vertex coordinates
const PHI: f64 = 1.618_033_988_749_895;

const ICOSAHEDRON_FACES: [[usize; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

/// Triangulated sphere from `subdivisions` rounds of 1-to-4 refinement
///
/// Vertex count is 10 * 4^n + 2. Faces are oriented with outward normals.
pub fn icosphere(radius: f64, subdivisions: usize) -> Result<(Mesh, Vec<DVec3>), MeshError> {
    let mut positions: Vec<DVec3> = [
        (-1.0, PHI, 0.0),
        (1.0, PHI, 0.0),
        (-1.0, -PHI, 0.0),
        (1.0, -PHI, 0.0),
        (0.0, -1.0, PHI),
        (0.0, 1.0, PHI),
        (0.0, -1.0, -PHI),
        (0.0, 1.0, -PHI),
        (PHI, 0.0, -1.0),
        (PHI, 0.0, 1.0),
        (-PHI, 0.0, -1.0),
        (-PHI, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| DVec3::new(x, y, z).normalize())
    .collect();
    let mut faces = ICOSAHEDRON_FACES.to_vec();

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut refined = Vec::with_capacity(faces.len() * 4);

        let mut midpoint = |a: usize, b: usize, positions: &mut Vec<DVec3>| -> usize {
            let key = (a.min(b), a.max(b));
            *midpoints.entry(key).or_insert_with(|| {
                positions.push((positions[a] + positions[b]).normalize());
                positions.len() - 1
            })
        };

        for &[a, b, c] in &faces {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            refined.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = refined;
    }

    for p in positions.iter_mut() {
        *p *= radius;
    }

    let mesh = Mesh::from_triangles(positions.len(), &faces)?;
    Ok((mesh, positions))
}

/// Icosphere of unit radius stretched to semi-axes `axes`
pub fn ellipsoid(axes: DVec3, subdivisions: usize) -> Result<(Mesh, Vec<DVec3>), MeshError> {
    let (mesh, mut positions) = icosphere(1.0, subdivisions)?;
    for p in positions.iter_mut() {
        *p *= axes;
    }
    Ok((mesh, positions))
}

/// Open spherical cap around +z
///
/// `cap_angle` is the polar angle of the boundary ring. Vertices are laid out
/// as a pole followed by `rings` rings of `angular_divisions` vertices.
pub fn spherical_cap(
    radius: f64,
    cap_angle: f64,
    rings: usize,
    angular_divisions: usize,
) -> Result<(Mesh, Vec<DVec3>), MeshError> {
    let mut positions = vec![DVec3::new(0.0, 0.0, radius)];
    let mut faces = Vec::new();

    for i in 1..=rings {
        let theta = cap_angle * i as f64 / rings as f64;
        for j in 0..angular_divisions {
            let phi = j as f64 / angular_divisions as f64 * std::f64::consts::TAU;
            positions.push(
                radius
                    * DVec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()),
            );
        }
    }

    let ring_start = |i: usize| 1 + (i - 1) * angular_divisions;

    // Connect pole to first ring
    for j in 0..angular_divisions {
        let curr = ring_start(1) + j;
        let next = ring_start(1) + (j + 1) % angular_divisions;
        faces.push([0, curr, next]);
    }

    // Connect rings
    for i in 1..rings {
        for j in 0..angular_divisions {
            let curr = ring_start(i) + j;
            let next = ring_start(i) + (j + 1) % angular_divisions;
            let curr_outer = ring_start(i + 1) + j;
            let next_outer = ring_start(i + 1) + (j + 1) % angular_divisions;

            faces.push([curr, curr_outer, next]);
            faces.push([next, curr_outer, next_outer]);
        }
    }

    let mesh = Mesh::from_triangles(positions.len(), &faces)?;
    Ok((mesh, positions))
}
