//! Tile fetch, storage and decode errors.

/// A network fetch that did not produce bytes.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered 404. Never retried.
    #[error("not found: {url}")]
    NotFound {
        /// Requested URL.
        url: String,
    },
    /// Every attempt failed.
    #[error("failed after {attempts} tries: {url}; last error: {last}")]
    Exhausted {
        /// Requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Message of the final failure.
        last: String,
    },
}

/// Why a `.tile` file was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The data does not start with the expected magic bytes.
    #[error("invalid magic bytes")]
    InvalidMagic,
    /// The format version is not supported by this build.
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),
    /// The sample type tag differs from the one requested.
    #[error("dtype tag {found}, expected {expected}")]
    DtypeMismatch {
        /// Tag read from the file.
        found: u8,
        /// Tag of the requested sample type.
        expected: u8,
    },
    /// Header shape differs from the expected tile shape.
    #[error("shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        /// Rows and columns read from the file.
        found: (usize, usize),
        /// Expected rows and columns.
        expected: (usize, usize),
    },
    /// The data is shorter or longer than its header promises.
    #[error("payload is {actual} bytes, expected {expected}")]
    Length {
        /// Byte count implied by the header.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },
}

/// Errors surfaced by [`crate::TileCache`] lookups.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// Network fetch failed after retries.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Fetched bytes could not be turned into samples.
    #[error("cannot decode tile {key}: {reason}")]
    Decode {
        /// Human-readable tile key.
        key: String,
        /// Decoder message.
        reason: String,
    },
    /// Reading or writing the on-disk store failed.
    #[error("tile store I/O: {0}")]
    Io(#[from] std::io::Error),
}
