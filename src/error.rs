//! Error types surfaced by the mesh generator.
//!
//! Every failure is reported at the top level of an operation; no partial
//! mesh is ever handed back.

use thiserror::Error;

/// Result type used throughout the crate
pub type MeshResult<T> = Result<T, MeshError>;

/// Errors raised while validating a block topology or generating a mesh
#[derive(Error, Debug)]
pub enum MeshError {
    /// The topology dimension is not 2 or 3, or supplied data does not
    /// match it
    #[error("dimension mismatch: {details}")]
    InvalidDimension {
        /// What is wrong
        details: String,
    },

    /// A block corner list is malformed
    #[error("invalid corners for block {block}: {details}")]
    InvalidBlockCorners {
        /// Index of the offending block
        block: usize,
        /// What is wrong with it
        details: String,
    },

    /// A grading ratio or segment count is unusable
    #[error("invalid edge grading: {segments} segments with ratio {grading}")]
    InvalidGrading {
        /// Segment count along the edge
        segments: usize,
        /// Expansion ratio, as given
        grading: f64,
    },

    /// A patch face is not on the boundary, or is claimed twice
    #[error("invalid patch '{name}': {details}")]
    InvalidPatch {
        /// Patch name
        name: String,
        /// What is wrong with it
        details: String,
    },

    /// The block distribution or partitioning request is unusable
    #[error("invalid partition: {details}")]
    InvalidPartition {
        /// What is wrong with it
        details: String,
    },

    /// Ranks disagree on the input topology (opt-in signature check)
    #[error("ranks hold different block topologies")]
    InconsistentTopology,

    /// Reading or writing a topology file failed
    #[cfg(feature = "serde")]
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A topology file does not parse
    #[cfg(feature = "serde")]
    #[error("malformed topology file: {message}")]
    InvalidFormat {
        /// Parser diagnostic
        message: String,
    },
}

impl MeshError {
    pub(crate) fn dimension_mismatch(details: impl Into<String>) -> Self {
        Self::InvalidDimension {
            details: details.into(),
        }
    }

    pub(crate) fn bad_corners(block: usize, details: impl Into<String>) -> Self {
        Self::InvalidBlockCorners {
            block,
            details: details.into(),
        }
    }

    pub(crate) fn bad_patch(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidPatch {
            name: name.into(),
            details: details.into(),
        }
    }

    pub(crate) fn bad_partition(details: impl Into<String>) -> Self {
        Self::InvalidPartition {
            details: details.into(),
        }
    }
}
