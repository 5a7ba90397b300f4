//! Error types for the smooth-edges crate.

/// Errors that can occur while refining a cutout or moving it in and out of files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-tunable parameter is outside its valid range.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A mask and a buffer (or two layers) do not share dimensions.
    #[error(
        "dimension mismatch: expected {}x{}, got {}x{}",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    DimensionMismatch {
        /// Dimensions of the reference raster.
        expected: (u32, u32),
        /// Dimensions of the raster that failed to match.
        actual: (u32, u32),
    },

    /// A pixel read fell outside the buffer.
    #[error("pixel ({x}, {y}) out of range for {width}x{height} buffer")]
    OutOfRange {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Buffer width in pixels.
        width: u32,
        /// Buffer height in pixels.
        height: u32,
    },

    /// The pixel byte length does not match `width * height * 4`.
    #[error("buffer for {width}x{height} RGBA image must hold {expected} bytes, got {actual}")]
    BufferSize {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Required byte length.
        expected: ExpectedLen,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while decoding or encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// Required byte length reported by [`Error::BufferSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedLen {
    /// The exact number of bytes required.
    Bytes(usize),
    /// `width * height * 4` does not fit in `usize`.
    Overflow,
}

impl std::fmt::Display for ExpectedLen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(n) => write!(f, "{n}"),
            Self::Overflow => f.write_str("more than usize::MAX"),
        }
    }
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
