//! Contiguous 10/10 hemisphere partition.
//!
//! Two regions are grown in lock-step from seed faces that best match the
//! east and west reference directions. The result is validated for size and
//! connectivity; a disconnected result goes through a bounded swap search
//! before being rejected.

use std::cmp::Ordering;

use geonet_coords::LatLon;
use glam::DVec3;
use tracing::{debug, info};

use crate::error::PartitionError;
use crate::face_graph::{FaceGraph, Region};
use crate::geometry::{FaceId, Icosahedron};

/// Faces per hemisphere.
pub const HEMISPHERE_FACES: usize = 10;

/// Limits of the connectivity repair search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepairBound {
    /// Maximum number of swap rounds.
    pub max_rounds: usize,
    /// Boundary faces considered per side in each round.
    pub candidates_per_side: usize,
}

impl Default for RepairBound {
    fn default() -> Self {
        Self {
            max_rounds: 200,
            candidates_per_side: 8,
        }
    }
}

/// Per-face alignment with the two reference directions.
#[derive(Clone, Debug)]
pub struct FaceScores {
    east: Vec<f64>,
    west: Vec<f64>,
}

impl FaceScores {
    /// Score each face centroid against both reference directions.
    #[must_use]
    pub fn new(ico: &Icosahedron, east_ref: DVec3, west_ref: DVec3) -> Self {
        let n = ico.faces().len();
        let mut east = Vec::with_capacity(n);
        let mut west = Vec::with_capacity(n);
        for f in 0..n {
            let c = ico.centroid(f);
            east.push(c.dot(east_ref));
            west.push(c.dot(west_ref));
        }
        Self { east, west }
    }

    /// Dot product of the face centroid with the east reference.
    #[must_use]
    pub fn east(&self, f: FaceId) -> f64 {
        self.east[f]
    }

    /// Dot product of the face centroid with the west reference.
    #[must_use]
    pub fn west(&self, f: FaceId) -> f64 {
        self.west[f]
    }

    /// How much more east-like than west-like a face is.
    #[must_use]
    pub fn east_bias(&self, f: FaceId) -> f64 {
        self.east[f] - self.west[f]
    }

    /// How much more west-like than east-like a face is.
    #[must_use]
    pub fn west_bias(&self, f: FaceId) -> f64 {
        self.west[f] - self.east[f]
    }

    /// Best-scoring east and west seeds. If both pick the same face, the
    /// west seed moves to the next-best west face.
    #[must_use]
    pub fn seeds(&self) -> (FaceId, FaceId) {
        let faces = 0..self.east.len();
        let seed_e = argmax(faces.clone(), |f| self.east[f]).unwrap_or(0);
        let mut seed_w = argmax(faces.clone(), |f| self.west[f]).unwrap_or(0);
        if seed_e == seed_w {
            let mut order: Vec<FaceId> = faces.collect();
            order.sort_by(|&a, &b| cmp_desc(self.west[a], self.west[b]));
            if let Some(&next) = order.iter().find(|&&f| f != seed_e) {
                seed_w = next;
            }
        }
        (seed_e, seed_w)
    }
}

/// The two hemisphere regions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HemisphereSplit {
    /// West region (scored against the west reference).
    pub west: Region,
    /// East region (scored against the east reference).
    pub east: Region,
}

impl HemisphereSplit {
    /// Whether both regions are single connected components.
    #[must_use]
    pub fn is_connected(&self, graph: &FaceGraph) -> bool {
        graph.is_connected(&self.west) && graph.is_connected(&self.east)
    }

    /// Whether both regions have exactly [`HEMISPHERE_FACES`] faces.
    #[must_use]
    pub fn has_exact_sizes(&self) -> bool {
        self.west.len() == HEMISPHERE_FACES && self.east.len() == HEMISPHERE_FACES
    }
}

/// Region-growing splitter.
pub struct HemisphereSplitter<'a> {
    ico: &'a Icosahedron,
    graph: &'a FaceGraph,
    bound: RepairBound,
}

impl<'a> HemisphereSplitter<'a> {
    /// Splitter with the default repair bound.
    #[must_use]
    pub fn new(ico: &'a Icosahedron, graph: &'a FaceGraph) -> Self {
        Self {
            ico,
            graph,
            bound: RepairBound::default(),
        }
    }

    /// Replace the repair bound.
    #[must_use]
    pub fn with_repair_bound(mut self, bound: RepairBound) -> Self {
        self.bound = bound;
        self
    }

    /// Partition all faces into a connected west and east region of 10 faces
    /// each.
    pub fn split(&self, east_ref: LatLon, west_ref: LatLon) -> Result<HemisphereSplit, PartitionError> {
        let scores = FaceScores::new(self.ico, east_ref.to_unit(), west_ref.to_unit());
        let (seed_e, seed_w) = scores.seeds();
        info!(seed_east = seed_e, seed_west = seed_w, "Hemisphere seeds");

        let split = grow(self.graph, &scores, seed_e, seed_w);
        let split = fill_unassigned(&scores, split, self.graph.face_count());

        if !split.has_exact_sizes() {
            return Err(PartitionError::Sizes {
                west: split.west.len(),
                east: split.east.len(),
            });
        }

        repair_connectivity(self.graph, &scores, split, self.bound)
    }
}

/// Greedy lock-step growth. The smaller region grows first; on equal sizes
/// the side whose best frontier face has the larger score differential wins.
fn grow(graph: &FaceGraph, scores: &FaceScores, seed_e: FaceId, seed_w: FaceId) -> HemisphereSplit {
    let mut east = Region::from([seed_e]);
    let mut west = Region::from([seed_w]);

    while east.len() < HEMISPHERE_FACES || west.len() < HEMISPHERE_FACES {
        let fe = if east.len() < HEMISPHERE_FACES {
            graph.frontier(&east, &west)
        } else {
            Region::new()
        };
        let fw = if west.len() < HEMISPHERE_FACES {
            graph.frontier(&west, &east)
        } else {
            Region::new()
        };
        if fe.is_empty() && fw.is_empty() {
            break;
        }

        let mut grow_east = match east.len().cmp(&west.len()) {
            Ordering::Less => true,
            Ordering::Greater => false,
            Ordering::Equal => {
                let best_e = fe.iter().map(|&f| scores.east_bias(f)).fold(f64::NEG_INFINITY, f64::max);
                let best_w = fw.iter().map(|&f| scores.west_bias(f)).fold(f64::NEG_INFINITY, f64::max);
                best_e >= best_w
            }
        };
        if grow_east && fe.is_empty() {
            grow_east = false;
        } else if !grow_east && fw.is_empty() {
            grow_east = true;
        }

        if grow_east {
            if let Some(f) = argmax2(fe.iter().copied(), |f| (scores.east_bias(f), scores.east(f))) {
                debug!(face = f, size = east.len() + 1, "Grow east");
                east.insert(f);
            }
        } else if let Some(f) = argmax2(fw.iter().copied(), |f| (scores.west_bias(f), scores.west(f))) {
            debug!(face = f, size = west.len() + 1, "Grow west");
            west.insert(f);
        }
    }

    HemisphereSplit { west, east }
}

/// Hand out faces that growth never reached, most east-like first, to
/// whichever side still has room.
fn fill_unassigned(scores: &FaceScores, mut split: HemisphereSplit, face_count: usize) -> HemisphereSplit {
    let mut unassigned: Vec<FaceId> = (0..face_count)
        .filter(|f| !split.east.contains(f) && !split.west.contains(f))
        .collect();
    unassigned.sort_by(|&a, &b| cmp_desc(scores.east_bias(a), scores.east_bias(b)));

    for f in unassigned {
        if split.east.len() < HEMISPHERE_FACES {
            split.east.insert(f);
        } else {
            split.west.insert(f);
        }
    }
    split
}

/// Restore connectivity by swapping one boundary face from each side.
///
/// Each round tries the `candidates_per_side` least-committed boundary faces
/// of each region and keeps the first swap after which both regions are
/// connected. A round without such a swap ends the search.
pub fn repair_connectivity(
    graph: &FaceGraph,
    scores: &FaceScores,
    split: HemisphereSplit,
    bound: RepairBound,
) -> Result<HemisphereSplit, PartitionError> {
    let mut split = split;
    for round in 0..bound.max_rounds {
        if split.is_connected(graph) {
            break;
        }

        let mut be: Vec<FaceId> = graph.boundary(&split.east, &split.west).into_iter().collect();
        let mut bw: Vec<FaceId> = graph.boundary(&split.west, &split.east).into_iter().collect();
        be.sort_by(|&a, &b| scores.east_bias(a).total_cmp(&scores.east_bias(b)));
        bw.sort_by(|&a, &b| scores.west_bias(a).total_cmp(&scores.west_bias(b)));

        let mut swapped = None;
        'search: for &e_out in be.iter().take(bound.candidates_per_side) {
            for &w_out in bw.iter().take(bound.candidates_per_side) {
                let mut east = split.east.clone();
                let mut west = split.west.clone();
                east.remove(&e_out);
                west.remove(&w_out);
                east.insert(w_out);
                west.insert(e_out);
                let candidate = HemisphereSplit { west, east };
                debug!(round, e_out, w_out, "Repair swap attempt");
                if candidate.is_connected(graph) {
                    swapped = Some(candidate);
                    break 'search;
                }
            }
        }

        match swapped {
            Some(s) => split = s,
            None => break,
        }
    }

    if split.is_connected(graph) {
        Ok(split)
    } else {
        Err(PartitionError::Unrepairable {
            rounds: bound.max_rounds,
            candidates: bound.candidates_per_side,
        })
    }
}

/// Move forced faces to their requested side, then validate. Overrides are
/// never repaired: any size or connectivity violation is an error.
pub fn apply_overrides(
    graph: &FaceGraph,
    split: HemisphereSplit,
    force_east: &[FaceId],
    force_west: &[FaceId],
) -> Result<HemisphereSplit, PartitionError> {
    if force_east.is_empty() && force_west.is_empty() {
        return Ok(split);
    }

    let mut split = split;
    for &f in force_east {
        if f >= graph.face_count() {
            return Err(PartitionError::OverrideFaceOutOfRange { face: f });
        }
        split.west.remove(&f);
        split.east.insert(f);
    }
    for &f in force_west {
        if f >= graph.face_count() {
            return Err(PartitionError::OverrideFaceOutOfRange { face: f });
        }
        split.east.remove(&f);
        split.west.insert(f);
    }

    if !split.has_exact_sizes() {
        return Err(PartitionError::OverrideSizes {
            west: split.west.len(),
            east: split.east.len(),
        });
    }
    if !split.is_connected(graph) {
        return Err(PartitionError::OverrideDisconnected);
    }
    Ok(split)
}

/// Descending order for floats, `NaN`-safe.
fn cmp_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// First element with the strictly largest key.
fn argmax<I, F>(items: I, key: F) -> Option<FaceId>
where
    I: IntoIterator<Item = FaceId>,
    F: Fn(FaceId) -> f64,
{
    argmax2(items, |f| (key(f), 0.0))
}

/// First element with the lexicographically largest `(primary, secondary)` key.
fn argmax2<I, F>(items: I, key: F) -> Option<FaceId>
where
    I: IntoIterator<Item = FaceId>,
    F: Fn(FaceId) -> (f64, f64),
{
    let mut best: Option<(FaceId, (f64, f64))> = None;
    for f in items {
        let k = key(f);
        let better = match best {
            None => true,
            Some((_, bk)) => match k.0.total_cmp(&bk.0) {
                Ordering::Greater => true,
                Ordering::Equal => k.1 > bk.1,
                Ordering::Less => false,
            },
        };
        if better {
            best = Some((f, k));
        }
    }
    best.map(|(f, _)| f)
}
