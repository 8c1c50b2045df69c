//! Error types for the pipegen core library.
//!
//! Defines the error enum exposed by the public API, stable machine-readable
//! error codes, and a convenient result alias.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::index::NodeClass;

/// An error produced while generating or serializing an instance.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A layer was configured with zero nodes. Every layer must be non-empty,
    /// otherwise no valid arcs exist between adjacent layers.
    #[error("layer {class} must contain at least one node (got {got})")]
    InvalidSize {
        /// The offending node class.
        class: NodeClass,
        /// The rejected size.
        got: usize,
    },
    /// A ratio computation had a zero denominator, so no valid distribution
    /// of the numerator exists.
    #[error("cannot distribute {quantity} across zero {denominator}")]
    DivisionUndefined {
        /// Human-readable name of the quantity being distributed.
        quantity: &'static str,
        /// Human-readable name of the zero-count denominator.
        denominator: &'static str,
    },
    /// A sampled numeric field was non-finite or negative. Such values must
    /// never reach the serializer.
    #[error("field `{field}` holds malformed value {value}")]
    MalformedMetadata {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
    /// A cost or arc array does not match the length implied by the topology.
    #[error("array `{array}` has length {actual} but {expected} was expected")]
    ParallelArrayMismatch {
        /// Name of the offending array.
        array: &'static str,
        /// Length implied by the topology.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },
    /// Writing the parameter file or report failed. No partial artifact is
    /// left behind.
    #[error("failed to write `{path}`: {source}")]
    Write {
        /// Target path of the failed write.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
}

/// Stable codes describing [`GeneratorError`] variants.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GeneratorErrorCode {
    /// A layer was configured with zero nodes.
    InvalidSize,
    /// A ratio computation had a zero denominator.
    DivisionUndefined,
    /// A sampled numeric field was non-finite or negative.
    MalformedMetadata,
    /// A cost or arc array has the wrong length.
    ParallelArrayMismatch,
    /// Writing an artifact failed.
    Write,
}

impl GeneratorErrorCode {
    /// Return the stable machine-readable representation of this error code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSize => "PIPEGEN_INVALID_SIZE",
            Self::DivisionUndefined => "PIPEGEN_DIVISION_UNDEFINED",
            Self::MalformedMetadata => "PIPEGEN_MALFORMED_METADATA",
            Self::ParallelArrayMismatch => "PIPEGEN_PARALLEL_ARRAY_MISMATCH",
            Self::Write => "PIPEGEN_WRITE",
        }
    }
}

impl fmt::Display for GeneratorErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl GeneratorError {
    /// Retrieve the stable [`GeneratorErrorCode`] for this error.
    #[must_use]
    pub const fn code(&self) -> GeneratorErrorCode {
        match self {
            Self::InvalidSize { .. } => GeneratorErrorCode::InvalidSize,
            Self::DivisionUndefined { .. } => GeneratorErrorCode::DivisionUndefined,
            Self::MalformedMetadata { .. } => GeneratorErrorCode::MalformedMetadata,
            Self::ParallelArrayMismatch { .. } => GeneratorErrorCode::ParallelArrayMismatch,
            Self::Write { .. } => GeneratorErrorCode::Write,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, GeneratorError>;
