//! Rasterisation errors.

use geonet_tiles::TileError;

/// Errors raised while rendering or writing a hemisphere.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// A tile lookup failed.
    #[error(transparent)]
    Tile(#[from] TileError),
    /// Encoding an output image failed.
    #[error("image encoding: {0}")]
    Image(#[from] image::ImageError),
    /// Spawning a worker or writing output failed.
    #[error("raster I/O: {0}")]
    Io(#[from] std::io::Error),
    /// The net has no faces.
    #[error("cannot rasterise an empty net")]
    EmptyNet,
    /// The canvas would exceed the supported pixel count.
    #[error("canvas {width}x{height} is too large; reduce the net edge length")]
    CanvasTooLarge {
        /// Requested width.
        width: u64,
        /// Requested height.
        height: u64,
    },
    /// A worker thread panicked.
    #[error("rasteriser worker panicked")]
    WorkerPanicked,
}
