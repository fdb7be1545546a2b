//! Dense 2-D sample arrays.

/// A numeric sample type a tile can hold and persist.
pub trait TileSample: Copy + Default + Send + Sync + 'static {
    /// Tag written into `.tile` headers.
    const DTYPE: u8;
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Append the little-endian encoding of `self`.
    fn write_le(self, out: &mut Vec<u8>);

    /// Decode from exactly [`Self::SIZE`] little-endian bytes.
    fn read_le(bytes: &[u8]) -> Self;
}

impl TileSample for u8 {
    const DTYPE: u8 = 1;
    const SIZE: usize = 1;

    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    fn read_le(bytes: &[u8]) -> Self {
        bytes[0]
    }
}

impl TileSample for f32 {
    const DTYPE: u8 = 2;
    const SIZE: usize = 4;

    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }

    fn read_le(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Row-major `rows × cols` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: TileSample> Tile<T> {
    /// Wrap `data`; `None` if its length is not `rows * cols`.
    #[must_use]
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// A tile with every sample set to `value`.
    #[must_use]
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// A tile of default (zero) samples.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, T::default())
    }

    /// `(rows, cols)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Raw samples, row-major.
    #[must_use]
    pub fn samples(&self) -> &[T] {
        &self.data
    }

    /// Sample at `(row, col)`; panics when out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Approximate heap size in bytes.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.data.len() * T::SIZE
    }

    /// Nearest sample to a fractional pixel position, ties to even, clamped
    /// to the tile.
    #[must_use]
    pub fn nearest(&self, row: f64, col: f64) -> T {
        let r = clamp_index(row.round_ties_even(), self.rows);
        let c = clamp_index(col.round_ties_even(), self.cols);
        self.get(r, c)
    }
}

impl Tile<f32> {
    /// Bilinear interpolation at a fractional pixel position.
    ///
    /// The four neighbours are clamped to the tile, and the weights are taken
    /// relative to the clamped top-left neighbour.
    #[must_use]
    pub fn bilinear(&self, row: f64, col: f64) -> f32 {
        let r0f = row.floor();
        let c0f = col.floor();
        let r0 = clamp_index(r0f, self.rows);
        let r1 = clamp_index(r0f + 1.0, self.rows);
        let c0 = clamp_index(c0f, self.cols);
        let c1 = clamp_index(c0f + 1.0, self.cols);

        let dr = (row - r0 as f64) as f32;
        let dc = (col - c0 as f64) as f32;

        let v0 = self.get(r0, c0) * (1.0 - dc) + self.get(r0, c1) * dc;
        let v1 = self.get(r1, c0) * (1.0 - dc) + self.get(r1, c1) * dc;
        v0 * (1.0 - dr) + v1 * dr
    }
}

fn clamp_index(v: f64, len: usize) -> usize {
    if v <= 0.0 || v.is_nan() {
        0
    } else {
        (v as usize).min(len.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn ramp() -> Tile<f32> {
        // value = 10 * row + col
        let data = (0..4)
            .flat_map(|r| (0..4).map(move |c| (10 * r + c) as f32))
            .collect();
        Tile::from_vec(4, 4, data).unwrap()
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Tile::from_vec(2, 2, vec![0u8; 3]).is_none());
        assert_eq!(Tile::from_vec(2, 3, vec![0u8; 6]).unwrap().shape(), (2, 3));
    }

    #[test]
    fn test_bilinear_constant_is_exact() {
        let tile = Tile::filled(8, 8, 123.25_f32);
        for (r, c) in [(0.0, 0.0), (3.3, 4.9), (6.99, 0.01), (7.0, 7.0), (-2.0, 11.5)] {
            assert!((tile.bilinear(r, c) - 123.25).abs() < EPSILON, "at ({r}, {c})");
        }
    }

    #[test]
    fn test_bilinear_interpolates_ramp() {
        let tile = ramp();
        assert!((tile.bilinear(1.0, 2.0) - 12.0).abs() < EPSILON);
        assert!((tile.bilinear(1.5, 2.0) - 17.0).abs() < EPSILON);
        assert!((tile.bilinear(1.25, 2.5) - 15.0).abs() < EPSILON);
    }

    #[test]
    fn test_bilinear_clamps_at_edges() {
        let tile = ramp();
        assert!((tile.bilinear(3.0, 3.0) - 33.0).abs() < EPSILON);
        assert!((tile.bilinear(-1.0, 0.0) - 0.0).abs() < EPSILON);
    }

    #[test]
    fn test_nearest_rounds_and_clamps() {
        let data: Vec<u8> = (0..9).collect();
        let tile = Tile::from_vec(3, 3, data).unwrap();
        assert_eq!(tile.nearest(0.4, 0.6), 1);
        assert_eq!(tile.nearest(1.5, 0.0), 6);
        assert_eq!(tile.nearest(0.5, 0.0), 0);
        assert_eq!(tile.nearest(9.0, -3.0), 6);
    }

    #[test]
    fn test_sample_encoding() {
        let mut buf = Vec::new();
        (-1.5_f32).write_le(&mut buf);
        7u8.write_le(&mut buf);
        assert_eq!(buf.len(), f32::SIZE + u8::SIZE);
        assert_eq!(f32::read_le(&buf[..4]), -1.5);
        assert_eq!(u8::read_le(&buf[4..]), 7);
    }
}
