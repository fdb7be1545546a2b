//! Per-face scan conversion and parallel rendering.

use crossbeam_channel::{Receiver, Sender, bounded};
use geonet_coords::LatLon;
use geonet_icosa::{FaceId, Icosahedron};
use geonet_tiles::{GeoSampler, TileError};
use geonet_unfold::{Net, Placement};
use glam::{DVec2, DVec3};
use tracing::{debug, info};

use crate::canvas::{Canvas, CanvasLayout};
use crate::error::RasterError;

/// Barycentric weights of `p` in triangle `abc`, `None` for a degenerate
/// triangle. Weights sum to one; all are non-negative inside.
#[must_use]
pub fn barycentric(a: DVec2, b: DVec2, c: DVec2, p: DVec2) -> Option<DVec3> {
    let denom = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
    if denom.abs() < f64::EPSILON {
        return None;
    }
    let u = ((b.y - c.y) * (p.x - c.x) + (c.x - b.x) * (p.y - c.y)) / denom;
    let v = ((c.y - a.y) * (p.x - c.x) + (a.x - c.x) * (p.y - c.y)) / denom;
    Some(DVec3::new(u, v, 1.0 - u - v))
}

/// Blend three unit corners by `weights` and project back onto the sphere.
#[must_use]
pub fn back_project(weights: DVec3, corners: [DVec3; 3]) -> LatLon {
    let p = corners[0] * weights.x + corners[1] * weights.y + corners[2] * weights.z;
    LatLon::from_unit(p.normalize_or(corners[0]))
}

/// Pixels covered by one face and the sphere points they map to.
#[derive(Clone, Debug, Default)]
pub struct FaceScan {
    /// Canvas `(x, y)` of each covered pixel.
    pub pixels: Vec<(u32, u32)>,
    /// Back-projected position of each pixel centre.
    pub points: Vec<LatLon>,
}

impl FaceScan {
    /// Number of covered pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the face covers no pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Sampled values for one face, sent back from a worker.
struct FaceRaster {
    face: FaceId,
    scan: FaceScan,
    elevation: Vec<f32>,
    class: Vec<u8>,
}

/// Renders a [`Net`] into a [`Canvas`] by sampling elevation and land cover
/// at every covered pixel.
pub struct Rasterizer<'a> {
    ico: &'a Icosahedron,
    margin: u32,
    threads: usize,
}

impl<'a> Rasterizer<'a> {
    /// Rasterizer with `margin` empty pixels around the net, using one
    /// worker per CPU.
    #[must_use]
    pub fn new(ico: &'a Icosahedron, margin: u32) -> Self {
        Self {
            ico,
            margin,
            threads: 0,
        }
    }

    /// Worker count; `0` picks one per CPU.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    fn worker_count(&self, faces: usize) -> usize {
        let wanted = if self.threads == 0 { num_cpus::get() } else { self.threads };
        wanted.clamp(1, faces.max(1))
    }

    /// Scan-convert one placed face.
    ///
    /// Pixel centres sit at `+0.5`. The scan box is the triangle's bounding
    /// box grown by one pixel and clamped to the canvas.
    #[must_use]
    pub fn scan_face(&self, layout: &CanvasLayout, placement: &Placement) -> FaceScan {
        let [a, b, c] = placement.points.map(|p| layout.to_pixel(p));
        let corners = placement.order.map(|v| self.ico.vertex(v));

        let lo = a.min(b).min(c);
        let hi = a.max(b).max(c);
        let x0 = (lo.x - 1.0).floor().max(0.0) as u32;
        let y0 = (lo.y - 1.0).floor().max(0.0) as u32;
        let x1 = ((hi.x + 1.0).ceil() as u32).min(layout.width.saturating_sub(1));
        let y1 = ((hi.y + 1.0).ceil() as u32).min(layout.height.saturating_sub(1));

        let mut scan = FaceScan::default();
        if x1 <= x0 || y1 <= y0 {
            return scan;
        }

        for y in y0..=y1 {
            for x in x0..=x1 {
                let centre = DVec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let Some(w) = barycentric(a, b, c, centre) else {
                    return scan;
                };
                if w.min_element() >= 0.0 {
                    scan.pixels.push((x, y));
                    scan.points.push(back_project(w, corners));
                }
            }
        }
        scan
    }

    fn raster_face<E, L>(
        &self,
        layout: &CanvasLayout,
        face: FaceId,
        placement: &Placement,
        elevation: &E,
        land: &L,
    ) -> Result<FaceRaster, TileError>
    where
        E: GeoSampler<Output = f32>,
        L: GeoSampler<Output = u8>,
    {
        let scan = self.scan_face(layout, placement);
        let heights = elevation.sample(&scan.points)?;
        let class = land.sample(&scan.points)?;
        Ok(FaceRaster {
            face,
            scan,
            elevation: heights,
            class,
        })
    }

    /// Render every face of `net`.
    ///
    /// Faces are handed to worker threads over a channel; finished faces are
    /// merged on the calling thread. The first sampling error aborts the
    /// render once outstanding faces drain.
    pub fn render<E, L>(&self, net: &Net, elevation: &E, land: &L) -> Result<Canvas, RasterError>
    where
        E: GeoSampler<Output = f32>,
        L: GeoSampler<Output = u8>,
    {
        let layout = CanvasLayout::for_net(net, self.margin)?;
        let mut canvas = Canvas::new(layout);
        let workers = self.worker_count(net.len());
        debug!(
            "Rasterising {} faces on {}x{} canvas with {} workers",
            net.len(),
            layout.width,
            layout.height,
            workers
        );

        let (task_sender, task_receiver): (Sender<(FaceId, Placement)>, Receiver<_>) = bounded(net.len().max(1));
        let (result_sender, result_receiver) = bounded::<Result<FaceRaster, TileError>>(workers);
        for (face, placement) in net.iter() {
            // capacity covers every face
            let _ = task_sender.send((face, *placement));
        }
        drop(task_sender);

        std::thread::scope(|s| -> Result<(), RasterError> {
            let mut handles = Vec::with_capacity(workers);
            for _ in 0..workers {
                let receiver = task_receiver.clone();
                let sender = result_sender.clone();
                let layout = &layout;
                let handle = std::thread::Builder::new()
                    .name("raster-worker".into())
                    .spawn_scoped(s, move || {
                        while let Ok((face, placement)) = receiver.recv() {
                            let result = self.raster_face(layout, face, &placement, elevation, land);
                            if sender.send(result).is_err() {
                                break;
                            }
                        }
                    })?;
                handles.push(handle);
            }
            drop(result_sender);

            let mut first_error = None;
            for result in &result_receiver {
                match result {
                    Ok(raster) => {
                        info!("face {:02} -> {} px", raster.face, raster.scan.len());
                        merge(&mut canvas, raster);
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            for handle in handles {
                handle.join().map_err(|_| RasterError::WorkerPanicked)?;
            }
            match first_error {
                Some(e) => Err(e.into()),
                None => Ok(()),
            }
        })?;

        Ok(canvas)
    }
}

fn merge(canvas: &mut Canvas, raster: FaceRaster) {
    let values = raster.elevation.into_iter().zip(raster.class);
    for (&(x, y), (h, cls)) in raster.scan.pixels.iter().zip(values) {
        canvas.put(raster.face, x, y, h, cls);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonet_icosa::{FaceGraph, Region};
    use geonet_unfold::NetUnfolder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EPSILON: f64 = 1e-9;

    struct Constant<T>(T);

    impl<T: Copy + Send + Sync> GeoSampler for Constant<T> {
        type Output = T;

        fn sample(&self, points: &[LatLon]) -> Result<Vec<T>, TileError> {
            Ok(vec![self.0; points.len()])
        }
    }

    /// Elevation equal to latitude.
    struct Latitude;

    impl GeoSampler for Latitude {
        type Output = f32;

        fn sample(&self, points: &[LatLon]) -> Result<Vec<f32>, TileError> {
            Ok(points.iter().map(|p| p.lat as f32).collect())
        }
    }

    /// Fails on the second call.
    struct FailsLater(AtomicUsize);

    impl GeoSampler for FailsLater {
        type Output = u8;

        fn sample(&self, points: &[LatLon]) -> Result<Vec<u8>, TileError> {
            if self.0.fetch_add(1, Ordering::SeqCst) >= 1 {
                return Err(TileError::Decode {
                    key: "test".into(),
                    reason: "broken".into(),
                });
            }
            Ok(vec![0; points.len()])
        }
    }

    fn fixture() -> (Icosahedron, FaceGraph) {
        let ico = Icosahedron::pole_oriented().unwrap();
        let graph = FaceGraph::new(ico.faces());
        (ico, graph)
    }

    /// First `n` faces reached breadth-first from face 0.
    fn connected(graph: &FaceGraph, n: usize) -> Region {
        let mut order = vec![0];
        let mut i = 0;
        while order.len() < n {
            for &f in graph.neighbors(order[i]) {
                if order.len() < n && !order.contains(&f) {
                    order.push(f);
                }
            }
            i += 1;
        }
        order.into_iter().collect()
    }

    fn unfold(ico: &Icosahedron, graph: &FaceGraph, faces: Region, edge: f64) -> Net {
        let root = *faces.first().unwrap();
        NetUnfolder::new(ico, graph, edge)
            .unfold(root, &faces, &Default::default())
            .unwrap()
    }

    #[test]
    fn test_barycentric_corners_and_centroid() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(4.0, 0.0);
        let c = DVec2::new(0.0, 4.0);
        assert!((barycentric(a, b, c, a).unwrap() - DVec3::X).length() < EPSILON);
        assert!((barycentric(a, b, c, b).unwrap() - DVec3::Y).length() < EPSILON);
        assert!((barycentric(a, b, c, c).unwrap() - DVec3::Z).length() < EPSILON);

        let w = barycentric(a, b, c, (a + b + c) / 3.0).unwrap();
        assert!((w - DVec3::splat(1.0 / 3.0)).length() < EPSILON);

        let outside = barycentric(a, b, c, DVec2::new(5.0, 5.0)).unwrap();
        assert!(outside.min_element() < 0.0);
    }

    #[test]
    fn test_barycentric_degenerate() {
        let p = DVec2::new(1.0, 1.0);
        assert!(barycentric(p, p, DVec2::new(2.0, 2.0), p).is_none());
    }

    #[test]
    fn test_back_project_corner_and_idempotent() {
        let (ico, _) = fixture();
        let corners = ico.face(3).vertices().map(|v| ico.vertex(v));

        let at_b = back_project(DVec3::Y, corners).to_unit();
        assert!((at_b - corners[1]).length() < 1e-9);

        // A point already on the sphere maps to itself.
        let same = [corners[0]; 3];
        let p = back_project(DVec3::new(0.2, 0.3, 0.5), same).to_unit();
        assert!((p - corners[0]).length() < 1e-9);

        let mid = back_project(DVec3::splat(1.0 / 3.0), corners).to_unit();
        assert!((mid.length() - 1.0).abs() < EPSILON);
        assert!((mid - ico.centroid(3).normalize()).length() < 1e-9);
    }

    #[test]
    fn test_single_face_coverage() {
        let (ico, graph) = fixture();
        let net = unfold(&ico, &graph, Region::from([0]), 100.0);
        let canvas = Rasterizer::new(&ico, 32)
            .with_threads(1)
            .render(&net, &Constant(42.0_f32), &Constant(30_u8))
            .unwrap();

        let area = 100.0 * 100.0 * 3.0_f64.sqrt() / 4.0;
        let covered = canvas.covered() as f64;
        assert!((covered - area).abs() / area < 0.03, "covered {covered} vs area {area}");

        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.is_covered(x, y) {
                    assert_eq!(canvas.elevation(x, y), 42.0);
                    assert_eq!(canvas.class(x, y), 30);
                    assert_eq!(canvas.owner(x, y), Some(0));
                } else {
                    assert!(canvas.elevation(x, y).is_nan());
                }
            }
        }
        // margin stays empty
        assert!((0..canvas.width()).all(|x| !canvas.is_covered(x, 0)));
    }

    #[test]
    fn test_pixels_map_near_their_vertex() {
        let (ico, graph) = fixture();
        let net = unfold(&ico, &graph, Region::from([5]), 100.0);
        let placement = *net.get(5).unwrap();
        let layout = CanvasLayout::for_net(&net, 8).unwrap();
        let canvas = Rasterizer::new(&ico, 8)
            .with_threads(1)
            .render(&net, &Latitude, &Constant(0_u8))
            .unwrap();

        for (vertex, point) in placement.order.iter().zip(placement.points) {
            let px = layout.to_pixel(point);
            let centroid = layout.to_pixel((placement.points[0] + placement.points[1] + placement.points[2]) / 3.0);
            // step four pixels from the corner toward the centroid
            let inside = px + (centroid - px).normalize() * 4.0;
            let (x, y) = (inside.x as u32, inside.y as u32);
            assert!(canvas.is_covered(x, y));
            let lat = LatLon::from_unit(ico.vertex(*vertex)).lat;
            assert!((f64::from(canvas.elevation(x, y)) - lat).abs() < 5.0);
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let (ico, graph) = fixture();
        let net = unfold(&ico, &graph, connected(&graph, 6), 40.0);
        assert_eq!(net.len(), 6);

        let serial = Rasterizer::new(&ico, 4)
            .with_threads(1)
            .render(&net, &Latitude, &Constant(50_u8))
            .unwrap();
        let parallel = Rasterizer::new(&ico, 4)
            .with_threads(4)
            .render(&net, &Latitude, &Constant(50_u8))
            .unwrap();

        assert_eq!(serial.owners(), parallel.owners());
        assert_eq!(serial.classes(), parallel.classes());
        let same = serial
            .elevations()
            .iter()
            .zip(parallel.elevations())
            .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()));
        assert!(same);
    }

    #[test]
    fn test_sampler_error_propagates() {
        let (ico, graph) = fixture();
        let net = unfold(&ico, &graph, connected(&graph, 5), 20.0);
        assert_eq!(net.len(), 5);
        let err = Rasterizer::new(&ico, 2)
            .with_threads(2)
            .render(&net, &Constant(0.0_f32), &FailsLater(AtomicUsize::new(0)))
            .unwrap_err();
        assert!(matches!(err, RasterError::Tile(TileError::Decode { .. })));
    }
}
