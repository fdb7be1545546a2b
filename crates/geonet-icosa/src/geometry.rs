//! Icosahedron vertices, faces and centroids.

use geonet_coords::{LatLon, rotation_between, twist_about};
use glam::DVec3;

use crate::error::GeometryError;

/// Index into [`Icosahedron::vertices`].
pub type VertexId = usize;

/// Index into [`Icosahedron::faces`].
pub type FaceId = usize;

/// Number of vertices of an icosahedron.
pub const VERTEX_COUNT: usize = 12;

/// Number of faces of an icosahedron.
pub const FACE_COUNT: usize = 20;

/// Signed-distance tolerance of the convexity test.
const PLANE_EPSILON: f64 = 1e-9;

/// An undirected edge, stored with the smaller vertex id first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(VertexId, VertexId);

impl Edge {
    /// Canonical edge between two vertices (order of arguments is irrelevant).
    #[must_use]
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    /// Smaller vertex id.
    #[must_use]
    pub fn lo(self) -> VertexId {
        self.0
    }

    /// Larger vertex id.
    #[must_use]
    pub fn hi(self) -> VertexId {
        self.1
    }

    /// Whether `v` is one of the endpoints.
    #[must_use]
    pub fn touches(self, v: VertexId) -> bool {
        self.0 == v || self.1 == v
    }
}

/// A triangular face. Vertex ids are kept in ascending order, which is the
/// canonical order the unfolder uses for the root face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Face {
    verts: [VertexId; 3],
}

impl Face {
    /// Build a face from three distinct vertex ids.
    #[must_use]
    pub fn new(a: VertexId, b: VertexId, c: VertexId) -> Self {
        let mut verts = [a, b, c];
        verts.sort_unstable();
        debug_assert!(verts[0] != verts[1] && verts[1] != verts[2]);
        Self { verts }
    }

    /// The three vertex ids in canonical order.
    #[must_use]
    pub fn vertices(&self) -> [VertexId; 3] {
        self.verts
    }

    /// The three edges in winding order `(a,b)`, `(b,c)`, `(c,a)`.
    #[must_use]
    pub fn edges(&self) -> [Edge; 3] {
        let [a, b, c] = self.verts;
        [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
    }

    /// Whether `v` is a corner of this face.
    #[must_use]
    pub fn contains(&self, v: VertexId) -> bool {
        self.verts.contains(&v)
    }

    /// The corner opposite `edge`, or `None` if `edge` is not on this face.
    #[must_use]
    pub fn opposite(&self, edge: Edge) -> Option<VertexId> {
        if !self.contains(edge.lo()) || !self.contains(edge.hi()) {
            return None;
        }
        self.verts.iter().copied().find(|&v| !edge.touches(v))
    }
}

/// Places vertex `vertex_id` exactly at `target`, then spins the solid by
/// `twist_deg` about that point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pin {
    /// Vertex to pin.
    pub vertex_id: VertexId,
    /// Where the vertex should land.
    pub target: LatLon,
    /// Rotation about the pinned axis, degrees.
    pub twist_deg: f64,
}

/// A unit icosahedron: 12 unit vertices and the 20 faces found by the
/// convexity test.
#[derive(Clone, Debug)]
pub struct Icosahedron {
    vertices: Vec<DVec3>,
    faces: Vec<Face>,
}

/// The 12 golden-ratio vertices `(0, ±1, ±φ)`, `(±1, ±φ, 0)`, `(±φ, 0, ±1)`,
/// normalised onto the unit sphere.
#[must_use]
pub fn canonical_vertices() -> [DVec3; VERTEX_COUNT] {
    let phi = (1.0 + 5.0_f64.sqrt()) * 0.5;
    [
        DVec3::new(0.0, 1.0, phi),
        DVec3::new(0.0, -1.0, phi),
        DVec3::new(0.0, 1.0, -phi),
        DVec3::new(0.0, -1.0, -phi),
        DVec3::new(1.0, phi, 0.0),
        DVec3::new(-1.0, phi, 0.0),
        DVec3::new(1.0, -phi, 0.0),
        DVec3::new(-1.0, -phi, 0.0),
        DVec3::new(phi, 0.0, 1.0),
        DVec3::new(phi, 0.0, -1.0),
        DVec3::new(-phi, 0.0, 1.0),
        DVec3::new(-phi, 0.0, -1.0),
    ]
    .map(DVec3::normalize)
}

/// Rotate the solid so its most mutually opposite vertex pair sits on the
/// poles, the first vertex of the pair at `+Z`.
///
/// The pair minimises the dot product; ties keep the first pair found.
pub fn pole_orient(vertices: &mut [DVec3]) {
    let n = vertices.len();
    if n < 2 {
        return;
    }
    let (mut best_i, mut best_j, mut best_d) = (0, 1, 1.0);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = vertices[i].dot(vertices[j]);
            if d < best_d {
                (best_i, best_j, best_d) = (i, j, d);
            }
        }
    }

    let q = rotation_between(vertices[best_i], DVec3::Z);
    for v in vertices.iter_mut() {
        *v = (q * *v).normalize();
    }
    // Flip about X if the partner did not land in the southern hemisphere.
    if vertices[best_j].z > 0.0 {
        for v in vertices.iter_mut() {
            *v = DVec3::new(v.x, -v.y, -v.z);
        }
    }
}

/// Find every vertex triple whose plane leaves all remaining vertices on one
/// side. For an icosahedron this yields exactly [`FACE_COUNT`] faces.
pub fn generate_faces(vertices: &[DVec3]) -> Result<Vec<Face>, GeometryError> {
    let n = vertices.len();
    let mut faces: Vec<Face> = Vec::with_capacity(FACE_COUNT);

    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                let (va, vb, vc) = (vertices[a], vertices[b], vertices[c]);
                let normal = (vb - va).cross(vc - va);
                let len = normal.length();
                if len < 1e-12 {
                    continue;
                }
                let normal = normal / len;

                let (mut pos, mut neg) = (0usize, 0usize);
                for (k, vk) in vertices.iter().enumerate() {
                    if k == a || k == b || k == c {
                        continue;
                    }
                    let s = normal.dot(*vk - va);
                    if s > PLANE_EPSILON {
                        pos += 1;
                    } else if s < -PLANE_EPSILON {
                        neg += 1;
                    }
                    if pos > 0 && neg > 0 {
                        break;
                    }
                }
                if pos > 0 && neg > 0 {
                    continue;
                }

                let face = Face::new(a, b, c);
                if !faces.contains(&face) {
                    faces.push(face);
                }
            }
        }
    }

    if faces.len() != FACE_COUNT {
        return Err(GeometryError::FaceCount { found: faces.len() });
    }
    Ok(faces)
}

impl Icosahedron {
    /// Build from arbitrary vertex positions. Vertices are normalised and the
    /// faces generated; anything other than 20 faces is an error.
    pub fn from_vertices(vertices: Vec<DVec3>) -> Result<Self, GeometryError> {
        let mut unit = Vec::with_capacity(vertices.len());
        for (id, v) in vertices.into_iter().enumerate() {
            if v.length_squared() < 1e-24 || !v.is_finite() {
                return Err(GeometryError::DegenerateVertex { id });
            }
            unit.push(v.normalize());
        }
        let faces = generate_faces(&unit)?;
        Ok(Self {
            vertices: unit,
            faces,
        })
    }

    /// The canonical icosahedron rotated so an opposite vertex pair is on the
    /// poles.
    pub fn pole_oriented() -> Result<Self, GeometryError> {
        let mut vertices = canonical_vertices().to_vec();
        pole_orient(&mut vertices);
        Self::from_vertices(vertices)
    }

    /// Pole-oriented icosahedron with `pin` applied.
    pub fn pinned(pin: &Pin) -> Result<Self, GeometryError> {
        Self::pole_oriented()?.with_pin(pin)
    }

    /// Rigidly rotate the whole solid so `pin.vertex_id` lands on
    /// `pin.target`, then twist about that axis. Face topology is unchanged.
    pub fn with_pin(&self, pin: &Pin) -> Result<Self, GeometryError> {
        let from = *self
            .vertices
            .get(pin.vertex_id)
            .ok_or(GeometryError::VertexOutOfRange { id: pin.vertex_id })?;
        let target = pin.target.to_unit();

        let mut q = rotation_between(from, target);
        if pin.twist_deg.abs() > 1e-9 {
            q = twist_about(target, pin.twist_deg) * q;
        }

        let vertices: Vec<DVec3> = self.vertices.iter().map(|&v| (q * v).normalize()).collect();
        let faces = generate_faces(&vertices)?;
        Ok(Self { vertices, faces })
    }

    /// All vertices (unit vectors), indexed by [`VertexId`].
    #[must_use]
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// A single vertex.
    #[must_use]
    pub fn vertex(&self, id: VertexId) -> DVec3 {
        self.vertices[id]
    }

    /// All faces, indexed by [`FaceId`].
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// A single face.
    #[must_use]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id]
    }

    /// Centroid of a face projected onto the unit sphere.
    #[must_use]
    pub fn centroid(&self, id: FaceId) -> DVec3 {
        let [a, b, c] = self.faces[id].vertices();
        (self.vertices[a] + self.vertices[b] + self.vertices[c]).normalize()
    }

    /// The face among `candidates` whose centroid is closest to `dir`.
    /// Ties keep the first candidate.
    pub fn nearest_face<I>(&self, candidates: I, dir: DVec3) -> Option<FaceId>
    where
        I: IntoIterator<Item = FaceId>,
    {
        let mut best: Option<(FaceId, f64)> = None;
        for f in candidates {
            let d = self.centroid(f).dot(dir);
            if best.is_none_or(|(_, bd)| d > bd) {
                best = Some((f, d));
            }
        }
        best.map(|(f, _)| f)
    }
}
