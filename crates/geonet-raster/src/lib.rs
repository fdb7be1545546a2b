//! Rasterisation of unfolded hemisphere nets.
//!
//! Every pixel inside a placed triangle is mapped back onto the sphere by
//! renormalised barycentric blending of the face's corners, then sampled
//! from the elevation and land-cover caches. Faces are processed on worker
//! threads and merged into one [`Canvas`] per hemisphere.

mod canvas;
mod error;
mod output;
mod palette;
mod rasterizer;

pub use canvas::{Canvas, CanvasLayout, NO_FACE};
pub use error::RasterError;
pub use output::{
    ElevationRange, OutputPaths, elevation_image, elevation_to_u8, landcover_rgb, mask_image, write_outputs,
};
pub use palette::{WORLDCOVER_PALETTE, class_color};
pub use rasterizer::{FaceScan, Rasterizer, back_project, barycentric};
