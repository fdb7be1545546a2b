//! Planar unfolding of icosahedron face subsets.
//!
//! [`NetUnfolder`] lays a connected set of faces flat by breadth-first rigid
//! placement, refusing to cross seam edges. [`PlanarTransform`] then mirrors
//! or rotates the resulting [`Net`] and moves it to the positive quadrant.

mod error;
mod net;
mod transform;
mod unfolder;

pub use error::UnfoldError;
pub use net::{Bounds, Hinge, Net, Placement};
pub use transform::PlanarTransform;
pub use unfolder::NetUnfolder;
