//! Halfedge mesh topology.
//!
//! The combinatorial structure is stored as flat arenas addressed by typed
//! integer handles. Every halfedge has a twin: halfedges on the boundary of an
//! open mesh point to no face and chain into boundary loops through `next`.
//! Topology is immutable after construction; vertex positions live elsewhere.

use std::collections::HashMap;

use thiserror::Error;

macro_rules! mesh_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl $name {
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

mesh_handle!(
    /// Handle to a vertex
    VertexId
);
mesh_handle!(
    /// Handle to a directed halfedge
    HalfedgeId
);
mesh_handle!(
    /// Handle to an undirected edge
    EdgeId
);
mesh_handle!(
    /// Handle to a triangular face
    FaceId
);

/// Errors raised while building a mesh from a face list
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    #[error("mesh has no faces")]
    Empty,
    #[error("face {face} references vertex {vertex}, but the mesh has {n_vertices} vertices")]
    VertexOutOfRange {
        face: usize,
        vertex: usize,
        n_vertices: usize,
    },
    #[error("face {0} repeats a vertex")]
    DegenerateFace(usize),
    #[error("directed edge {0} -> {1} is used by more than one face (non-manifold or inconsistently oriented)")]
    DuplicateHalfedge(usize, usize),
    #[error("vertex {0} touches more than one boundary loop")]
    NonManifoldVertex(usize),
    #[error("vertex {0} is not referenced by any face")]
    IsolatedVertex(usize),
}

#[derive(Debug, Clone)]
struct HalfedgeRecord {
    tail: usize,
    next: usize,
    twin: usize,
    edge: usize,
    face: Option<usize>,
}

/// Triangle mesh connectivity with O(1) halfedge navigation
#[derive(Debug, Clone)]
pub struct Mesh {
    halfedges: Vec<HalfedgeRecord>,
    /// Canonical halfedge of each edge (the interior one on boundary edges)
    edge_halfedge: Vec<usize>,
    faces: Vec<[usize; 3]>,
    outgoing: Vec<Vec<HalfedgeId>>,
    boundary_vertex: Vec<bool>,
}

impl Mesh {
    /// Build the halfedge structure from consistently oriented triangles
    pub fn from_triangles(n_vertices: usize, faces: &[[usize; 3]]) -> Result<Self, MeshError> {
        if faces.is_empty() {
            return Err(MeshError::Empty);
        }

        let n_interior = faces.len() * 3;
        let mut halfedges = Vec::with_capacity(n_interior + n_interior / 8);
        let mut directed: HashMap<(usize, usize), usize> = HashMap::with_capacity(n_interior);

        for (f, face) in faces.iter().enumerate() {
            for &vertex in face {
                if vertex >= n_vertices {
                    return Err(MeshError::VertexOutOfRange {
                        face: f,
                        vertex,
                        n_vertices,
                    });
                }
            }
            if face[0] == face[1] || face[1] == face[2] || face[2] == face[0] {
                return Err(MeshError::DegenerateFace(f));
            }
            for k in 0..3 {
                let (a, b) = (face[k], face[(k + 1) % 3]);
                let h = 3 * f + k;
                if directed.insert((a, b), h).is_some() {
                    return Err(MeshError::DuplicateHalfedge(a, b));
                }
                halfedges.push(HalfedgeRecord {
                    tail: a,
                    next: 3 * f + (k + 1) % 3,
                    twin: usize::MAX,
                    edge: usize::MAX,
                    face: Some(f),
                });
            }
        }

        // Pair twins, creating exterior halfedges where no opposite face exists
        let mut boundary_out: HashMap<usize, usize> = HashMap::new();
        for h in 0..n_interior {
            let tail = halfedges[h].tail;
            let tip = halfedges[halfedges[h].next].tail;
            match directed.get(&(tip, tail)) {
                Some(&t) => halfedges[h].twin = t,
                None => {
                    let b = halfedges.len();
                    halfedges.push(HalfedgeRecord {
                        tail: tip,
                        next: usize::MAX,
                        twin: h,
                        edge: usize::MAX,
                        face: None,
                    });
                    halfedges[h].twin = b;
                    if boundary_out.insert(tip, b).is_some() {
                        return Err(MeshError::NonManifoldVertex(tip));
                    }
                }
            }
        }

        // Exterior halfedges u -> v continue with the exterior halfedge leaving v
        for b in n_interior..halfedges.len() {
            let tip = halfedges[halfedges[b].twin].tail;
            let next = *boundary_out
                .get(&tip)
                .ok_or(MeshError::NonManifoldVertex(tip))?;
            halfedges[b].next = next;
        }

        let mut edge_halfedge = Vec::with_capacity(n_interior / 2 + boundary_out.len());
        for h in 0..n_interior {
            let twin = halfedges[h].twin;
            if twin >= n_interior || h < twin {
                let e = edge_halfedge.len();
                edge_halfedge.push(h);
                halfedges[h].edge = e;
                halfedges[twin].edge = e;
            }
        }

        let mut outgoing = vec![Vec::new(); n_vertices];
        for (h, record) in halfedges.iter().enumerate() {
            outgoing[record.tail].push(HalfedgeId(h));
        }
        if let Some(v) = outgoing.iter().position(|out| out.is_empty()) {
            return Err(MeshError::IsolatedVertex(v));
        }

        let mut boundary_vertex = vec![false; n_vertices];
        for &v in boundary_out.keys() {
            boundary_vertex[v] = true;
        }

        Ok(Self {
            halfedges,
            edge_halfedge,
            faces: faces.to_vec(),
            outgoing,
            boundary_vertex,
        })
    }

    pub fn n_vertices(&self) -> usize {
        self.outgoing.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edge_halfedge.len()
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn n_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.n_vertices()).map(VertexId)
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.n_edges()).map(EdgeId)
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.n_faces()).map(FaceId)
    }

    pub fn halfedges(&self) -> impl Iterator<Item = HalfedgeId> + '_ {
        (0..self.n_halfedges()).map(HalfedgeId)
    }

    /// Vertex the halfedge starts from
    #[inline]
    pub fn tail(&self, h: HalfedgeId) -> VertexId {
        VertexId(self.halfedges[h.0].tail)
    }

    /// Vertex the halfedge points to
    #[inline]
    pub fn tip(&self, h: HalfedgeId) -> VertexId {
        self.tail(self.next(h))
    }

    #[inline]
    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        HalfedgeId(self.halfedges[h.0].next)
    }

    #[inline]
    pub fn twin(&self, h: HalfedgeId) -> HalfedgeId {
        HalfedgeId(self.halfedges[h.0].twin)
    }

    #[inline]
    pub fn edge(&self, h: HalfedgeId) -> EdgeId {
        EdgeId(self.halfedges[h.0].edge)
    }

    /// Incident face, `None` for exterior halfedges
    #[inline]
    pub fn face(&self, h: HalfedgeId) -> Option<FaceId> {
        self.halfedges[h.0].face.map(FaceId)
    }

    #[inline]
    pub fn is_interior(&self, h: HalfedgeId) -> bool {
        self.halfedges[h.0].face.is_some()
    }

    /// Canonical halfedge of an edge; always interior
    #[inline]
    pub fn edge_halfedge(&self, e: EdgeId) -> HalfedgeId {
        HalfedgeId(self.edge_halfedge[e.0])
    }

    /// Endpoints of an edge, ordered along its canonical halfedge
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId) -> (VertexId, VertexId) {
        let h = self.edge_halfedge(e);
        (self.tail(h), self.tip(h))
    }

    pub fn is_boundary_edge(&self, e: EdgeId) -> bool {
        !self.is_interior(self.twin(self.edge_halfedge(e)))
    }

    #[inline]
    pub fn face_vertices(&self, f: FaceId) -> [VertexId; 3] {
        let [a, b, c] = self.faces[f.0];
        [VertexId(a), VertexId(b), VertexId(c)]
    }

    /// Face list the mesh was built from
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Halfedges leaving `v`, exterior ones included
    #[inline]
    pub fn outgoing(&self, v: VertexId) -> &[HalfedgeId] {
        &self.outgoing[v.0]
    }

    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.boundary_vertex[v.0]
    }

    pub fn has_boundary(&self) -> bool {
        self.halfedges.len() > 3 * self.faces.len()
    }

    /// Exterior halfedges grouped into closed loops
    pub fn boundary_loops(&self) -> Vec<Vec<HalfedgeId>> {
        let n_interior = 3 * self.faces.len();
        let mut visited = vec![false; self.halfedges.len()];
        let mut loops = Vec::new();
        for start in n_interior..self.halfedges.len() {
            if visited[start] {
                continue;
            }
            let mut boundary = Vec::new();
            let mut h = start;
            while !visited[h] {
                visited[h] = true;
                boundary.push(HalfedgeId(h));
                h = self.halfedges[h].next;
            }
            loops.push(boundary);
        }
        loops
    }

    /// Neighbouring vertices of `v`
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.outgoing(v).iter().map(move |&h| self.tip(h))
    }

    /// Euler characteristic V - E + F
    pub fn euler_characteristic(&self) -> i64 {
        self.n_vertices() as i64 - self.n_edges() as i64 + self.n_faces() as i64
    }
}
