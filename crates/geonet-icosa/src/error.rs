//! Construction and partition errors.

use crate::{FaceId, VertexId};

/// Errors raised while building the icosahedron. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// The convexity test produced the wrong number of faces.
    #[error("expected 20 faces, got {found}")]
    FaceCount {
        /// Number of distinct faces that passed the plane test.
        found: usize,
    },
    /// A vertex has (near) zero length and cannot be normalised.
    #[error("vertex {id} is degenerate")]
    DegenerateVertex {
        /// Offending vertex.
        id: VertexId,
    },
    /// A pin referenced a vertex that does not exist.
    #[error("vertex id {id} out of range (12 vertices)")]
    VertexOutOfRange {
        /// Requested vertex.
        id: VertexId,
    },
}

/// Errors raised while partitioning faces into hemispheres. All are fatal.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// Region growing did not end at 10/10.
    #[error("split sizes wrong: west={west} east={east}")]
    Sizes {
        /// West region size.
        west: usize,
        /// East region size.
        east: usize,
    },
    /// The bounded swap search could not make both regions connected.
    #[error(
        "could not find a connected 10/10 split after {rounds} repair rounds \
         ({candidates} candidates per side); adjust reference directions or pin/twist"
    )]
    Unrepairable {
        /// Round bound that was exhausted.
        rounds: usize,
        /// Candidate faces tried per side in each round.
        candidates: usize,
    },
    /// Manual overrides left the regions at the wrong sizes.
    #[error("overrides broke 10/10 sizing: west={west} east={east}")]
    OverrideSizes {
        /// West region size after overrides.
        west: usize,
        /// East region size after overrides.
        east: usize,
    },
    /// Manual overrides disconnected a region.
    #[error("overrides broke contiguity; remove or change the forced faces")]
    OverrideDisconnected,
    /// A forced face id does not exist.
    #[error("forced face {face} out of range (20 faces)")]
    OverrideFaceOutOfRange {
        /// Offending face id.
        face: FaceId,
    },
}
