//! Unfolding errors.

use geonet_icosa::FaceId;

/// Errors raised by [`crate::NetUnfolder`]. All are fatal for the hemisphere.
#[derive(Debug, thiserror::Error)]
pub enum UnfoldError {
    /// Seam edges cut the allowed faces into more than one piece.
    #[error("unfolding missed faces {faces:?}; reduce the seam longitude tolerance")]
    MissingFaces {
        /// Faces that could not be reached from the root, ascending.
        faces: Vec<FaceId>,
    },
    /// The root face is not part of the subset being unfolded.
    #[error("root face {root} is not in the face subset")]
    RootNotAllowed {
        /// Requested root.
        root: FaceId,
    },
}
