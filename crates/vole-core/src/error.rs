use crate::shape::Shape;

/// All errors that can occur within Vole.
///
/// This enum captures every failure mode of the data pipeline: invalid
/// configuration, malformed transform chains, out-of-bounds record access,
/// failures fetching external records, and the shape/dtype errors raised by
/// the tensor runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Configuration errors
    /// A batch size of zero was requested.
    #[error("invalid batch size {batch_size}: must be at least 1")]
    InvalidBatchSize { batch_size: usize },

    /// Any other invalid option detected at construction time.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A transform step rejected the output of the step before it.
    #[error("malformed pipeline at step {step} ({name}): {source}")]
    MalformedPipeline {
        step: usize,
        name: String,
        #[source]
        source: Box<Error>,
    },

    // Record access errors
    /// `get(index)` was called with an index outside `[0, len)`.
    #[error("index {index} out of bounds for dataset of size {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    // Resource errors
    /// Fetching or decoding an external record failed.
    #[error("failed to fetch record {index}: {message}")]
    Resource { index: usize, message: String },

    /// I/O error from an external source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker task panicked or was dropped before reporting its batch.
    #[error("worker failed: {0}")]
    Worker(String),

    // Tensor runtime errors
    /// Shape mismatch between two tensors.
    #[error("shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: Shape, got: Shape },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Dimension index out of range for the tensor's rank.
    #[error("dimension out of range: dim {dim} for tensor with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Narrow/slice operation out of bounds.
    #[error("narrow out of bounds: dim {dim}, start {start}, len {len}, dim_size {dim_size}")]
    NarrowOutOfBounds {
        dim: usize,
        start: usize,
        len: usize,
        dim_size: usize,
    },

    /// Tried to access a scalar from a non-scalar tensor.
    #[error("not a scalar: tensor has shape {shape}")]
    NotAScalar { shape: Shape },

    /// Element count mismatch when creating from a vec.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// Cannot reshape because element counts differ.
    #[error(
        "cannot reshape: source has {src} elements, target shape {dst_shape} has {dst} elements"
    )]
    ReshapeElementMismatch {
        src: usize,
        dst: usize,
        dst_shape: Shape,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }

    /// Whether this error reports a structural misconfiguration (bad batch
    /// size, bad option, malformed transform chain) rather than a failure of
    /// one particular record.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidBatchSize { .. }
                | Error::InvalidConfig(_)
                | Error::MalformedPipeline { .. }
        )
    }

    /// Whether this error is a shape/rank/layout complaint from the tensor
    /// runtime. The pipeline turns these into [`Error::MalformedPipeline`].
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. }
                | Error::RankMismatch { .. }
                | Error::DimOutOfRange { .. }
                | Error::NarrowOutOfBounds { .. }
                | Error::ElementCountMismatch { .. }
                | Error::ReshapeElementMismatch { .. }
        )
    }
}

/// Convenience Result type used throughout Vole.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
