//! Pixel buffers for one rendered hemisphere.

use geonet_icosa::FaceId;
use geonet_unfold::Net;
use glam::DVec2;

use crate::error::RasterError;

/// Owner value of a pixel no face covers.
pub const NO_FACE: u8 = u8::MAX;

/// Largest canvas accepted, in pixels.
const MAX_PIXELS: u64 = 1 << 32;

/// Maps net coordinates to canvas pixels.
///
/// The net's y axis points up while image rows grow downward, so points are
/// flipped before the margin offset is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasLayout {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Minimum corner of the flipped net.
    pub min: DVec2,
    /// Empty border around the net, in pixels.
    pub margin: u32,
}

impl CanvasLayout {
    /// Layout fitting `net` with `margin` pixels on every side.
    pub fn for_net(net: &Net, margin: u32) -> Result<Self, RasterError> {
        let bounds = net.bounds().ok_or(RasterError::EmptyNet)?;
        let flip = |p: DVec2| DVec2::new(p.x, -p.y);
        let a = flip(bounds.min);
        let b = flip(bounds.max);
        let min = a.min(b);
        let max = a.max(b);

        let pad = 2 * u64::from(margin) + 2;
        let width = (max.x - min.x).ceil() as u64 + pad;
        let height = (max.y - min.y).ceil() as u64 + pad;
        if width > u64::from(u32::MAX) || height > u64::from(u32::MAX) || width * height > MAX_PIXELS {
            return Err(RasterError::CanvasTooLarge { width, height });
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            min,
            margin,
        })
    }

    /// Canvas position of a net point.
    #[must_use]
    pub fn to_pixel(&self, p: DVec2) -> DVec2 {
        let m = f64::from(self.margin);
        DVec2::new(p.x - self.min.x + m, -p.y - self.min.y + m)
    }

    /// Total pixel count.
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Rendered hemisphere: which face owns each pixel, its elevation and its
/// land-cover class. All buffers are row-major.
#[derive(Clone, Debug)]
pub struct Canvas {
    layout: CanvasLayout,
    owner: Vec<u8>,
    elevation: Vec<f32>,
    class: Vec<u8>,
}

impl Canvas {
    /// Blank canvas: no owners, `NaN` elevation, class 0.
    #[must_use]
    pub fn new(layout: CanvasLayout) -> Self {
        let n = layout.pixel_count();
        Self {
            layout,
            owner: vec![NO_FACE; n],
            elevation: vec![f32::NAN; n],
            class: vec![0; n],
        }
    }

    /// The layout this canvas was created for.
    #[must_use]
    pub fn layout(&self) -> &CanvasLayout {
        &self.layout
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.layout.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.layout.width as usize + x as usize
    }

    /// Store one sampled pixel of `face`.
    ///
    /// Pixels on an edge shared by two faces go to the higher face id, so
    /// the result does not depend on the order faces finish in.
    pub fn put(&mut self, face: FaceId, x: u32, y: u32, elevation: f32, class: u8) {
        let i = self.index(x, y);
        let face = face.min(usize::from(NO_FACE - 1)) as u8;
        if self.owner[i] != NO_FACE && self.owner[i] > face {
            return;
        }
        self.owner[i] = face;
        self.elevation[i] = elevation;
        self.class[i] = class;
    }

    /// Whether any face covers `(x, y)`.
    #[must_use]
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.owner[self.index(x, y)] != NO_FACE
    }

    /// Face covering `(x, y)`.
    #[must_use]
    pub fn owner(&self, x: u32, y: u32) -> Option<FaceId> {
        match self.owner[self.index(x, y)] {
            NO_FACE => None,
            f => Some(usize::from(f)),
        }
    }

    /// Elevation at `(x, y)`; `NaN` where uncovered or without data.
    #[must_use]
    pub fn elevation(&self, x: u32, y: u32) -> f32 {
        self.elevation[self.index(x, y)]
    }

    /// Land-cover class at `(x, y)`.
    #[must_use]
    pub fn class(&self, x: u32, y: u32) -> u8 {
        self.class[self.index(x, y)]
    }

    /// Number of covered pixels.
    #[must_use]
    pub fn covered(&self) -> usize {
        self.owner.iter().filter(|&&o| o != NO_FACE).count()
    }

    /// Row-major owner buffer.
    #[must_use]
    pub fn owners(&self) -> &[u8] {
        &self.owner
    }

    /// Row-major elevation buffer.
    #[must_use]
    pub fn elevations(&self) -> &[f32] {
        &self.elevation
    }

    /// Row-major class buffer.
    #[must_use]
    pub fn classes(&self) -> &[u8] {
        &self.class
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geonet_icosa::{FaceGraph, Icosahedron, Region};
    use geonet_unfold::NetUnfolder;

    fn single_face_net(edge: f64) -> Net {
        let ico = Icosahedron::pole_oriented().unwrap();
        let graph = FaceGraph::new(ico.faces());
        NetUnfolder::new(&ico, &graph, edge)
            .unfold(0, &Region::from([0]), &Default::default())
            .unwrap()
    }

    #[test]
    fn test_layout_size() {
        let layout = CanvasLayout::for_net(&single_face_net(100.0), 32).unwrap();
        // ceil(100) + 2*32 + 2, ceil(86.60) + 2*32 + 2
        assert_eq!(layout.width, 166);
        assert_eq!(layout.height, 153);
    }

    #[test]
    fn test_layout_flips_y() {
        let layout = CanvasLayout::for_net(&single_face_net(100.0), 10).unwrap();
        let bottom_left = layout.to_pixel(DVec2::ZERO);
        let apex = layout.to_pixel(DVec2::new(50.0, 100.0 * 3.0_f64.sqrt() / 2.0));
        assert!(apex.y < bottom_left.y);
        assert!((apex.y - 10.0).abs() < 1e-9);
        assert!((bottom_left.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_net_rejected() {
        assert!(matches!(
            CanvasLayout::for_net(&Net::default(), 32),
            Err(RasterError::EmptyNet)
        ));
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let net = single_face_net(1.0e6);
        assert!(matches!(
            CanvasLayout::for_net(&net, 0),
            Err(RasterError::CanvasTooLarge { .. })
        ));
    }

    #[test]
    fn test_higher_face_wins_shared_pixel() {
        let layout = CanvasLayout::for_net(&single_face_net(10.0), 1).unwrap();
        let mut canvas = Canvas::new(layout);
        assert_eq!(canvas.covered(), 0);

        canvas.put(7, 3, 3, 100.0, 10);
        canvas.put(2, 3, 3, 200.0, 20);
        assert_eq!(canvas.owner(3, 3), Some(7));
        assert_eq!(canvas.elevation(3, 3), 100.0);

        canvas.put(9, 3, 3, 300.0, 30);
        assert_eq!(canvas.owner(3, 3), Some(9));
        assert_eq!(canvas.class(3, 3), 30);
        assert_eq!(canvas.covered(), 1);
        assert!(canvas.elevation(0, 0).is_nan());
    }
}
