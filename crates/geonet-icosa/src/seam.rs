//! Seam selection: which internal edges of a region the unfolder must cut.

use std::collections::BTreeSet;

use geonet_coords::{LatLon, lon_distance};

use crate::face_graph::{FaceGraph, Region};
use crate::geometry::{Edge, Icosahedron};

/// Undirected edges the unfolder may not cross.
pub type ForbiddenEdges = BTreeSet<Edge>;

/// A meridian-like cut running south from `start_lat` near longitude `lon`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeamSpec {
    /// Seam longitude in degrees.
    pub lon: f64,
    /// Edges whose midpoint is at or below this latitude are eligible.
    pub start_lat: f64,
    /// Maximum wrap-aware longitude distance from `lon`, degrees.
    pub tolerance_deg: f64,
}

impl SeamSpec {
    /// Internal edges of `region` whose midpoint lies within the longitude
    /// tolerance of the seam and at or south of its start latitude.
    #[must_use]
    pub fn forbidden_edges(&self, ico: &Icosahedron, graph: &FaceGraph, region: &Region) -> ForbiddenEdges {
        graph
            .internal_edges(region)
            .filter(|&e| {
                let mid = edge_midpoint(ico, e);
                lon_distance(mid.lon, self.lon) <= self.tolerance_deg
                    && mid.lat <= self.start_lat + 1e-9
            })
            .collect()
    }
}

/// Geographic position of an edge's midpoint on the sphere.
#[must_use]
pub fn edge_midpoint(ico: &Icosahedron, edge: Edge) -> LatLon {
    let m = (ico.vertex(edge.lo()) + ico.vertex(edge.hi())).normalize();
    LatLon::from_unit(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FACE_COUNT, Pin};

    fn setup() -> (Icosahedron, FaceGraph) {
        let ico = Icosahedron::pinned(&Pin {
            vertex_id: 0,
            target: LatLon::new(26.0, 25.0),
            twist_deg: 0.0,
        })
        .unwrap();
        let graph = FaceGraph::new(ico.faces());
        (ico, graph)
    }

    #[test]
    fn test_empty_region_has_no_seam() {
        let (ico, graph) = setup();
        let spec = SeamSpec {
            lon: 25.0,
            start_lat: 90.0,
            tolerance_deg: 180.0,
        };
        assert!(spec.forbidden_edges(&ico, &graph, &Region::new()).is_empty());
    }

    #[test]
    fn test_full_tolerance_takes_every_internal_edge() {
        let (ico, graph) = setup();
        let all: Region = (0..FACE_COUNT).collect();
        let spec = SeamSpec {
            lon: 0.0,
            start_lat: 90.0,
            tolerance_deg: 180.0,
        };
        assert_eq!(spec.forbidden_edges(&ico, &graph, &all).len(), 30);
    }

    #[test]
    fn test_selected_edges_respect_limits() {
        let (ico, graph) = setup();
        let all: Region = (0..FACE_COUNT).collect();
        let spec = SeamSpec {
            lon: 25.0,
            start_lat: 26.0,
            tolerance_deg: 40.0,
        };
        let forbidden = spec.forbidden_edges(&ico, &graph, &all);
        assert!(!forbidden.is_empty());
        for e in &forbidden {
            let m = edge_midpoint(&ico, *e);
            assert!(lon_distance(m.lon, 25.0) <= 40.0);
            assert!(m.lat <= 26.0 + 1e-9);
        }
    }

    #[test]
    fn test_wraparound_longitude() {
        let (ico, graph) = setup();
        let all: Region = (0..FACE_COUNT).collect();
        let a = SeamSpec {
            lon: 180.0,
            start_lat: 90.0,
            tolerance_deg: 30.0,
        };
        let b = SeamSpec { lon: -180.0, ..a };
        assert_eq!(
            a.forbidden_edges(&ico, &graph, &all),
            b.forbidden_edges(&ico, &graph, &all)
        );
    }

    #[test]
    fn test_midpoint_of_pinned_edge() {
        let (ico, graph) = setup();
        let (e, _) = graph.edges().find(|(e, _)| e.touches(0)).unwrap();
        let m = edge_midpoint(&ico, e);
        let pin = LatLon::new(26.0, 25.0).to_unit();
        // Midpoint of an icosahedron edge is half the edge arc (~31.7°) away.
        let angle = m.to_unit().dot(pin).acos().to_degrees();
        assert!((angle - 31.717).abs() < 0.01, "angle {angle}");
    }
}
