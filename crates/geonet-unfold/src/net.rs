//! Placed faces in the plane.

use std::collections::BTreeMap;

use geonet_icosa::{Edge, FaceId, VertexId};
use glam::DVec2;

/// One face laid out in the plane: `points[i]` is where `order[i]` landed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Vertex ids in placement order.
    pub order: [VertexId; 3],
    /// Plane coordinates matching `order`.
    pub points: [DVec2; 3],
}

impl Placement {
    /// Plane position of `vertex` in this face, if it is a corner.
    #[must_use]
    pub fn point_of(&self, vertex: VertexId) -> Option<DVec2> {
        self.order
            .iter()
            .position(|&v| v == vertex)
            .map(|i| self.points[i])
    }

    fn map_points(&self, f: impl Fn(DVec2) -> DVec2) -> Self {
        Self {
            order: self.order,
            points: self.points.map(f),
        }
    }
}

/// The placed neighbour a face was unfolded from and the edge they share.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hinge {
    /// Face this one was hinged onto.
    pub parent: FaceId,
    /// Shared edge the face was rotated about.
    pub edge: Edge,
}

/// Axis-aligned bounding box in the plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: DVec2,
    /// Maximum corner.
    pub max: DVec2,
}

impl Bounds {
    /// Box centre.
    #[must_use]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }
}

/// A planar net: one [`Placement`] per face, all from one rigid unfolding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Net {
    placements: BTreeMap<FaceId, Placement>,
    hinges: BTreeMap<FaceId, Hinge>,
}

impl Net {
    pub(crate) fn insert(&mut self, face: FaceId, placement: Placement) {
        self.placements.insert(face, placement);
    }

    pub(crate) fn insert_hinged(&mut self, face: FaceId, placement: Placement, hinge: Hinge) {
        self.placements.insert(face, placement);
        self.hinges.insert(face, hinge);
    }

    /// How `face` was attached; `None` for the root and unplaced faces.
    #[must_use]
    pub fn hinge(&self, face: FaceId) -> Option<Hinge> {
        self.hinges.get(&face).copied()
    }

    /// Placements in ascending face order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceId, &Placement)> {
        self.placements.iter().map(|(f, p)| (*f, p))
    }

    /// Placement of one face.
    #[must_use]
    pub fn get(&self, face: FaceId) -> Option<&Placement> {
        self.placements.get(&face)
    }

    /// Whether `face` has been placed.
    #[must_use]
    pub fn contains(&self, face: FaceId) -> bool {
        self.placements.contains_key(&face)
    }

    /// Number of placed faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether no face has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Bounding box of all placed points, `None` for an empty net.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self.placements.values().flat_map(|p| p.points);
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Bounds { min, max })
    }

    /// Apply `f` to every point of every placement.
    #[must_use]
    pub fn map_points(&self, f: impl Fn(DVec2) -> DVec2) -> Self {
        let placements = self
            .placements
            .iter()
            .map(|(face, p)| (*face, p.map_points(&f)))
            .collect();
        Self {
            placements,
            hinges: self.hinges.clone(),
        }
    }

    /// Shift every point by `offset`.
    #[must_use]
    pub fn translated(&self, offset: DVec2) -> Self {
        self.map_points(|p| p + offset)
    }

    /// Shift so the bounding box's minimum corner sits at the origin.
    #[must_use]
    pub fn at_origin(&self) -> Self {
        match self.bounds() {
            Some(b) => self.translated(-b.min),
            None => self.clone(),
        }
    }
}
