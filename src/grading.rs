//! Graded subdivision of block edges.
//!
//! Every block edge is refined into mapped coordinates on `[-1, 1]`. An
//! expansion ratio of 1 subdivides uniformly; any other ratio produces a
//! geometric progression of segment lengths whose last-to-first ratio equals
//! the requested grading.

use crate::{
    error::{MeshError, MeshResult},
    types::RealScalar,
};
use num::Float;

/// Subdivide `[-1, 1]` into `segments` cells graded by `grading`.
///
/// Returns the `segments + 1` mapped coordinates of the cell boundaries,
/// starting at -1 and ending at 1. For a grading `r != 1` the segment
/// lengths form a geometric progression with
/// `(x_n - x_(n-1)) / (x_1 - x_0) == r`.
pub fn mapped_coordinates<T: RealScalar>(segments: usize, grading: T) -> MeshResult<Vec<T>> {
    if segments == 0 || grading <= T::zero() {
        return Err(MeshError::InvalidGrading {
            segments,
            grading: num::cast::<T, f64>(grading).unwrap_or(f64::NAN),
        });
    }

    let one = T::one();
    let two = T::from(2.0).unwrap();

    // A single cell spans the whole interval whatever the grading says.
    if segments == 1 {
        return Ok(vec![-one, one]);
    }

    let coords = if Float::abs(grading - one) > T::from(1e-6).unwrap() {
        let q = Float::powf(grading, one / T::from(segments - 1).unwrap());
        let denom = one - grading * q;
        (0..=segments)
            .map(|i| two * (one - Float::powi(q, i as i32)) / denom - one)
            .collect::<Vec<_>>()
    } else {
        let step = two / T::from(segments).unwrap();
        (0..=segments)
            .map(|i| T::from(i).unwrap() * step - one)
            .collect::<Vec<_>>()
    };

    let eps = T::from(150.0).unwrap() * T::epsilon();
    debug_assert!(Float::abs(coords[0] + one) < eps);
    debug_assert!(Float::abs(coords[segments] - one) < eps);

    Ok(coords)
}

/// Mapped coordinates for every edge of one block axis.
///
/// `gradings` holds one expansion ratio per edge along the axis (two in 2D,
/// four in 3D); one coordinate sequence is returned per edge.
pub fn axis_mapped_coordinates<T: RealScalar>(
    segments: usize,
    gradings: &[T],
) -> MeshResult<Vec<Vec<T>>> {
    gradings
        .iter()
        .map(|g| mapped_coordinates(segments, *g))
        .collect()
}
