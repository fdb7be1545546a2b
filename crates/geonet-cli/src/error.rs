//! Top-level pipeline error.

use geonet_config::ConfigError;
use geonet_icosa::{GeometryError, PartitionError};
use geonet_raster::RasterError;
use geonet_unfold::UnfoldError;

/// Anything that stops a run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The icosahedron could not be built or pinned.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// No valid 10/10 hemisphere split was found.
    #[error(transparent)]
    Partition(#[from] PartitionError),
    /// One hemisphere could not be laid flat.
    #[error("{hemisphere}: {source}")]
    Unfold {
        /// `"west"` or `"east"`.
        hemisphere: &'static str,
        /// Why the unfolding failed.
        #[source]
        source: UnfoldError,
    },
    /// Rendering or writing an image failed.
    #[error(transparent)]
    Raster(#[from] RasterError),
    /// A hemisphere ended up without faces to root its net at.
    #[error("{0} hemisphere has no faces")]
    EmptyHemisphere(&'static str),
    /// The worker rendering a hemisphere panicked.
    #[error("{0} hemisphere render panicked")]
    RenderPanicked(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_unfold_error_names_hemisphere() {
        let err = PipelineError::Unfold {
            hemisphere: "east",
            source: UnfoldError::MissingFaces { faces: vec![4, 8] },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("east: "), "{msg}");
        assert!(msg.contains("[4, 8]"), "{msg}");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_is_transparent() {
        let inner = ConfigError::Invalid {
            field: "net.edge_px",
            reason: "must be a positive number".to_string(),
        };
        let shown = inner.to_string();
        let err = PipelineError::from(inner);
        assert_eq!(err.to_string(), shown);
        assert_eq!(PipelineError::EmptyHemisphere("west").to_string(), "west hemisphere has no faces");
    }
}
