//! Icosahedron geometry and its split into two contiguous hemispheres.
//!
//! Builds the 12 vertices and 20 faces of a unit icosahedron (optionally
//! pinned and twisted so a chosen vertex lands on a geographic point),
//! derives the face adjacency graph, partitions the faces into two connected
//! 10-face regions scored against reference directions, and selects the
//! seam edges that the unfolder must not cross.

mod error;
mod face_graph;
mod geometry;
mod seam;
mod split;

pub use error::{GeometryError, PartitionError};
pub use face_graph::{FaceGraph, Region};
pub use geometry::{
    Edge, FACE_COUNT, Face, FaceId, Icosahedron, Pin, VERTEX_COUNT, VertexId, canonical_vertices,
    generate_faces, pole_orient,
};
pub use seam::{ForbiddenEdges, SeamSpec, edge_midpoint};
pub use split::{
    FaceScores, HEMISPHERE_FACES, HemisphereSplit, HemisphereSplitter, RepairBound,
    apply_overrides, repair_connectivity,
};
