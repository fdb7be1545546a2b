//! Edge-to-face incidence and face adjacency.

use std::collections::{BTreeMap, BTreeSet};

use crate::geometry::{Edge, Face, FaceId};

/// A set of face ids. Regions are passed and returned by value.
pub type Region = BTreeSet<FaceId>;

/// Face adjacency derived from a face list.
///
/// On a closed solid every edge has exactly two faces; an edge with one face
/// is a boundary and contributes no adjacency.
#[derive(Clone, Debug)]
pub struct FaceGraph {
    edge_faces: BTreeMap<Edge, Vec<FaceId>>,
    neighbors: Vec<BTreeSet<FaceId>>,
}

impl FaceGraph {
    /// Build the graph from all three edges of every face.
    #[must_use]
    pub fn new(faces: &[Face]) -> Self {
        let mut edge_faces: BTreeMap<Edge, Vec<FaceId>> = BTreeMap::new();
        for (fi, face) in faces.iter().enumerate() {
            for edge in face.edges() {
                edge_faces.entry(edge).or_default().push(fi);
            }
        }

        let mut neighbors = vec![BTreeSet::new(); faces.len()];
        for flist in edge_faces.values() {
            if let [a, b] = flist.as_slice() {
                neighbors[*a].insert(*b);
                neighbors[*b].insert(*a);
            }
        }

        Self {
            edge_faces,
            neighbors,
        }
    }

    /// Number of faces the graph was built from.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Faces incident to `edge` (empty if the edge does not exist).
    #[must_use]
    pub fn faces_on_edge(&self, edge: Edge) -> &[FaceId] {
        self.edge_faces.get(&edge).map_or(&[], Vec::as_slice)
    }

    /// The face across `edge` from `face`, if the edge is shared by two faces.
    #[must_use]
    pub fn across(&self, edge: Edge, face: FaceId) -> Option<FaceId> {
        match self.faces_on_edge(edge) {
            [a, b] if *a == face => Some(*b),
            [a, b] if *b == face => Some(*a),
            _ => None,
        }
    }

    /// Adjacent faces of `face`.
    #[must_use]
    pub fn neighbors(&self, face: FaceId) -> &BTreeSet<FaceId> {
        &self.neighbors[face]
    }

    /// All edges with their incident faces, in edge order.
    pub fn edges(&self) -> impl Iterator<Item = (Edge, &[FaceId])> {
        self.edge_faces.iter().map(|(e, f)| (*e, f.as_slice()))
    }

    /// Edges whose two faces both lie in `region`.
    pub fn internal_edges<'a>(&'a self, region: &'a Region) -> impl Iterator<Item = Edge> + 'a {
        self.edges().filter_map(move |(e, flist)| match flist {
            [a, b] if region.contains(a) && region.contains(b) => Some(e),
            _ => None,
        })
    }

    /// Faces of `region` reachable from `start` without leaving the region.
    #[must_use]
    pub fn reachable(&self, region: &Region, start: FaceId) -> Region {
        let mut seen = Region::new();
        if !region.contains(&start) {
            return seen;
        }
        seen.insert(start);
        let mut stack = vec![start];
        while let Some(u) = stack.pop() {
            for &v in &self.neighbors[u] {
                if region.contains(&v) && seen.insert(v) {
                    stack.push(v);
                }
            }
        }
        seen
    }

    /// Whether `region` is non-empty and a single connected component.
    #[must_use]
    pub fn is_connected(&self, region: &Region) -> bool {
        match region.first() {
            Some(&start) => self.reachable(region, start).len() == region.len(),
            None => false,
        }
    }

    /// Faces of `region` that touch at least one face of `other`.
    #[must_use]
    pub fn boundary(&self, region: &Region, other: &Region) -> Region {
        region
            .iter()
            .copied()
            .filter(|&f| self.neighbors[f].iter().any(|n| other.contains(n)))
            .collect()
    }

    /// Unclaimed neighbours of `region`: adjacent faces in neither `region`
    /// nor `other`.
    #[must_use]
    pub fn frontier(&self, region: &Region, other: &Region) -> Region {
        region
            .iter()
            .flat_map(|&f| self.neighbors[f].iter().copied())
            .filter(|n| !region.contains(n) && !other.contains(n))
            .collect()
    }
}
