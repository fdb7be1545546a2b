//! Breadth-first rigid unfolding.

use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_3;

use geonet_icosa::{Edge, FaceGraph, FaceId, ForbiddenEdges, Icosahedron, Region};
use glam::{DMat2, DVec2};
use tracing::debug;

use crate::error::UnfoldError;
use crate::net::{Hinge, Net, Placement};

/// Lays a connected face subset flat as equilateral triangles.
///
/// The root face is placed at `(0,0)`, `(L,0)`, `(L/2, L·√3/2)` in its
/// canonical vertex order. Every other face is hinged onto an already placed
/// neighbour across their shared edge, on the side away from the
/// neighbour's third corner.
pub struct NetUnfolder<'a> {
    ico: &'a Icosahedron,
    graph: &'a FaceGraph,
    edge_len: f64,
}

impl<'a> NetUnfolder<'a> {
    /// Unfolder producing triangles with sides of `edge_len` plane units.
    #[must_use]
    pub fn new(ico: &'a Icosahedron, graph: &'a FaceGraph, edge_len: f64) -> Self {
        Self {
            ico,
            graph,
            edge_len,
        }
    }

    /// Unfold `allowed` starting at `root`, never crossing an edge in
    /// `forbidden`.
    ///
    /// Fails with [`UnfoldError::MissingFaces`] if any allowed face is not
    /// reachable from the root; no partial net is returned.
    pub fn unfold(&self, root: FaceId, allowed: &Region, forbidden: &ForbiddenEdges) -> Result<Net, UnfoldError> {
        if !allowed.contains(&root) {
            return Err(UnfoldError::RootNotAllowed { root });
        }

        let side = self.edge_len;
        let h = side * 3.0_f64.sqrt() * 0.5;

        let mut net = Net::default();
        net.insert(
            root,
            Placement {
                order: self.ico.face(root).vertices(),
                points: [DVec2::ZERO, DVec2::new(side, 0.0), DVec2::new(side * 0.5, h)],
            },
        );

        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            let Some(&placed) = net.get(current) else {
                continue;
            };
            let [a, b, c] = placed.order;
            let [pa, pb, pc] = placed.points;

            for (u, v, pu, pv, p_third) in [(a, b, pa, pb, pc), (b, c, pb, pc, pa), (c, a, pc, pa, pb)] {
                let edge = Edge::new(u, v);
                if forbidden.contains(&edge) {
                    continue;
                }
                let Some(next) = self.graph.across(edge, current) else {
                    continue;
                };
                if !allowed.contains(&next) || net.contains(next) {
                    continue;
                }
                let Some(third) = self.ico.face(next).opposite(edge) else {
                    continue;
                };

                let apex = hinge_apex(pu, pv, p_third);
                net.insert_hinged(
                    next,
                    Placement {
                        order: [u, v, third],
                        points: [pu, pv, apex],
                    },
                    Hinge { parent: current, edge },
                );
                debug!(face = next, from = current, "Placed face");
                queue.push_back(next);
            }
        }

        let missing: Vec<FaceId> = allowed.iter().copied().filter(|&f| !net.contains(f)).collect();
        if !missing.is_empty() {
            return Err(UnfoldError::MissingFaces { faces: missing });
        }
        Ok(net)
    }
}

/// Third corner of the equilateral triangle on edge `pu → pv` that lies on
/// the opposite side from `away_from`.
fn hinge_apex(pu: DVec2, pv: DVec2, away_from: DVec2) -> DVec2 {
    let d = pv - pu;
    let c1 = pu + DMat2::from_angle(FRAC_PI_3) * d;
    let c2 = pu + DMat2::from_angle(-FRAC_PI_3) * d;
    if c1.distance_squared(away_from) < c2.distance_squared(away_from) {
        c2
    } else {
        c1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonet_coords::LatLon;
    use geonet_icosa::{FACE_COUNT, HemisphereSplitter, Pin, SeamSpec};

    const EDGE: f64 = 100.0;
    const TOL: f64 = 1e-4 * EDGE;

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

    fn assert_equilateral(net: &Net) {
        for (f, p) in net.iter() {
            let [a, b, c] = p.points;
            for d in [a.distance(b), b.distance(c), c.distance(a)] {
                assert!((d - EDGE).abs() < TOL, "face {f} side {d}");
            }
        }
    }

    #[test]
    fn test_hinge_apex_picks_far_side() {
        let pu = DVec2::ZERO;
        let pv = DVec2::new(1.0, 0.0);
        let apex = hinge_apex(pu, pv, DVec2::new(0.5, 0.866));
        assert!(apex.y < 0.0);
        let apex = hinge_apex(pu, pv, DVec2::new(0.5, -0.866));
        assert!(apex.y > 0.0);
        assert!((apex.distance(pu) - 1.0).abs() < 1e-12);
        assert!((apex.distance(pv) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_root_placement() {
        let (ico, graph) = setup();
        let region: Region = [4].into_iter().collect();
        let net = NetUnfolder::new(&ico, &graph, EDGE)
            .unfold(4, &region, &ForbiddenEdges::new())
            .unwrap();
        assert_eq!(net.len(), 1);
        let p = net.get(4).unwrap();
        assert_eq!(p.order, ico.face(4).vertices());
        assert_eq!(p.points[0], DVec2::ZERO);
        assert_eq!(p.points[1], DVec2::new(EDGE, 0.0));
    }

    #[test]
    fn test_hemispheres_unfold_completely_and_glue() {
        let (ico, graph) = setup();
        let split = HemisphereSplitter::new(&ico, &graph)
            .split(LatLon::new(25.0, 20.0), LatLon::new(15.0, -90.0))
            .unwrap();
        let unfolder = NetUnfolder::new(&ico, &graph, EDGE);
        let none = ForbiddenEdges::new();

        for region in [&split.west, &split.east] {
            let root = *region.first().unwrap();
            let net = unfolder.unfold(root, region, &none).unwrap();
            assert_eq!(net.len(), region.len());
            assert_equilateral(&net);
        }
    }

    #[test]
    fn test_tree_edges_glue_exactly() {
        // In a BFS unfolding every non-root face shares its hinge edge with
        // its parent, so each placed face has at least one coinciding
        // neighbour.
        let (ico, graph) = setup();
        let all: Region = (0..FACE_COUNT).collect();
        let net = NetUnfolder::new(&ico, &graph, EDGE)
            .unfold(0, &all, &ForbiddenEdges::new())
            .unwrap();
        assert_eq!(net.len(), FACE_COUNT);
        for (f, p) in net.iter().filter(|(f, _)| *f != 0) {
            let glued = graph.neighbors(f).iter().any(|&g| {
                let q = net.get(g).unwrap();
                let shared: Vec<_> = p.order.iter().filter(|&&v| q.order.contains(&v)).collect();
                shared.len() == 2
                    && shared
                        .iter()
                        .all(|&&v| p.point_of(v).unwrap().distance(q.point_of(v).unwrap()) < TOL)
            });
            assert!(glued, "face {f} is not attached to any neighbour");
        }
    }

    #[test]
    fn test_east_with_seam_is_complete() {
        let (ico, graph) = setup();
        let split = HemisphereSplitter::new(&ico, &graph)
            .split(LatLon::new(25.0, 20.0), LatLon::new(15.0, -90.0))
            .unwrap();
        let forbidden = SeamSpec {
            lon: 25.0,
            start_lat: 26.0,
            tolerance_deg: 12.0,
        }
        .forbidden_edges(&ico, &graph, &split.east);
        let root = ico
            .nearest_face(split.east.iter().copied(), LatLon::new(26.0, 25.0).to_unit())
            .unwrap();
        let net = NetUnfolder::new(&ico, &graph, EDGE)
            .unfold(root, &split.east, &forbidden)
            .unwrap();
        assert_eq!(net.len(), 10);
        assert_equilateral(&net);
    }

    #[test]
    fn test_seamed_hemispheres_hinge_on_shared_edges() {
        let (ico, graph) = setup();
        let pin = LatLon::new(26.0, 25.0);
        let split = HemisphereSplitter::new(&ico, &graph)
            .split(LatLon::new(25.0, 20.0), LatLon::new(15.0, -90.0))
            .unwrap();
        let seam = SeamSpec {
            lon: 25.0,
            start_lat: 26.0,
            tolerance_deg: 12.0,
        };
        let unfolder = NetUnfolder::new(&ico, &graph, EDGE);

        for region in [&split.west, &split.east] {
            let forbidden = seam.forbidden_edges(&ico, &graph, region);
            let root = ico.nearest_face(region.iter().copied(), pin.to_unit()).unwrap();
            let net = unfolder.unfold(root, region, &forbidden).unwrap();
            assert_eq!(net.len(), region.len());
            assert_eq!(net.hinge(root), None);

            for (f, p) in net.iter().filter(|&(f, _)| f != root) {
                let hinge = net.hinge(f).unwrap();
                assert!(!forbidden.contains(&hinge.edge), "face {f} hinged on seam edge {:?}", hinge.edge);
                assert!(region.contains(&hinge.parent));
                assert_eq!(graph.across(hinge.edge, hinge.parent), Some(f));

                let q = net.get(hinge.parent).unwrap();
                for v in [hinge.edge.lo(), hinge.edge.hi()] {
                    let d = p.point_of(v).unwrap().distance(q.point_of(v).unwrap());
                    assert!(d < 1e-9, "face {f} vertex {v} off its parent by {d}");
                }
            }
        }
        assert!(seam.forbidden_edges(&ico, &graph, &split.east).contains(&Edge::new(4, 8)));
    }

    #[test]
    fn test_forbidden_edges_disconnect_root() {
        let (ico, graph) = setup();
        let all: Region = (0..FACE_COUNT).collect();
        let root = 7;
        let forbidden: ForbiddenEdges = ico.face(root).edges().into_iter().collect();
        let err = NetUnfolder::new(&ico, &graph, EDGE)
            .unfold(root, &all, &forbidden)
            .unwrap_err();
        let UnfoldError::MissingFaces { faces } = err else {
            panic!("unexpected error {err}");
        };
        let expected: Vec<FaceId> = (0..FACE_COUNT).filter(|&f| f != root).collect();
        assert_eq!(faces, expected);
    }

    #[test]
    fn test_missing_faces_are_exactly_unreachable() {
        let (ico, graph) = setup();
        // Cut a ring around vertex 3: its five faces become unreachable
        // from a root on the other side.
        let all: Region = (0..FACE_COUNT).collect();
        let cap: Vec<FaceId> = (0..FACE_COUNT).filter(|&f| ico.face(f).contains(3)).collect();
        let forbidden: ForbiddenEdges = cap
            .iter()
            .flat_map(|&f| ico.face(f).edges())
            .filter(|e| !e.touches(3))
            .collect();
        let root = (0..FACE_COUNT).find(|&f| ico.face(f).contains(0)).unwrap();

        let err = NetUnfolder::new(&ico, &graph, EDGE)
            .unfold(root, &all, &forbidden)
            .unwrap_err();
        match err {
            UnfoldError::MissingFaces { faces } => assert_eq!(faces, cap),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_missing_faces_message() {
        let err = UnfoldError::MissingFaces { faces: vec![3, 9] };
        let msg = err.to_string();
        assert!(msg.contains("[3, 9]"));
        assert!(msg.contains("reduce the seam"));
    }

    #[test]
    fn test_root_must_be_allowed() {
        let (ico, graph) = setup();
        let region: Region = [1, 2].into_iter().collect();
        assert!(matches!(
            NetUnfolder::new(&ico, &graph, EDGE).unfold(5, &region, &ForbiddenEdges::new()),
            Err(UnfoldError::RootNotAllowed { root: 5 })
        ));
    }
}
