//! Block topology: the coarse, user-supplied description of the domain.
//!
//! A [BlockTopology] is a shared cloud of corner points, a list of
//! curvilinear blocks referencing `2^D` of those points each, per-axis
//! segment counts and per-edge grading ratios, plus named boundary patches.
//! Every rank of a parallel run must hold an identical topology; the
//! refined mesh is derived from it without communication.

pub mod adjacency;
pub(crate) mod cells;

use crate::{
    error::{MeshError, MeshResult},
    types::RealScalar,
};
use itertools::izip;
use std::hash::{Hash, Hasher};

/// A named set of boundary faces
#[derive(Debug, Clone)]
pub struct PatchSpec {
    name: String,
    /// Face corner tuples, flattened with stride `2^(D-1)`
    faces: Vec<usize>,
    corners_per_face: usize,
}

impl PatchSpec {
    /// Patch name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of coarse faces in the patch
    pub fn face_count(&self) -> usize {
        self.faces.len() / self.corners_per_face
    }

    /// Corner point indices of one coarse face
    pub fn face(&self, index: usize) -> &[usize] {
        &self.faces[index * self.corners_per_face..(index + 1) * self.corners_per_face]
    }
}

/// Coarse block decomposition of a 2D or 3D domain
#[derive(Debug, Clone)]
pub struct BlockTopology<T: RealScalar> {
    dim: usize,
    points: Vec<T>,
    block_corners: Vec<usize>,
    block_segments: Vec<usize>,
    block_gradings: Vec<T>,
    patches: Vec<PatchSpec>,
    distribution: Option<Vec<usize>>,
}

impl<T: RealScalar> BlockTopology<T> {
    /// Create an empty topology of the given dimension
    pub fn new(dim: usize) -> MeshResult<Self> {
        if dim != 2 && dim != 3 {
            return Err(MeshError::dimension_mismatch(format!(
                "unsupported dimension {dim}, must be 2 or 3"
            )));
        }
        Ok(Self {
            dim,
            points: vec![],
            block_corners: vec![],
            block_segments: vec![],
            block_gradings: vec![],
            patches: vec![],
            distribution: None,
        })
    }

    /// Add a corner point, returning its index
    pub fn add_point(&mut self, coords: &[T]) -> MeshResult<usize> {
        if coords.len() != self.dim {
            return Err(MeshError::dimension_mismatch(format!(
                "point has {} coordinates in a {}D topology",
                coords.len(),
                self.dim
            )));
        }
        self.points.extend_from_slice(coords);
        Ok(self.point_count() - 1)
    }

    /// Add a block, returning its index.
    ///
    /// `corners` lists `2^D` point indices in canonical order, `segments`
    /// the cell count along each axis and `gradings` one expansion ratio
    /// per edge, grouped by axis.
    pub fn add_block(
        &mut self,
        corners: &[usize],
        segments: &[usize],
        gradings: &[T],
    ) -> MeshResult<usize> {
        let block = self.block_count();
        if corners.len() != cells::corner_count(self.dim) {
            return Err(MeshError::bad_corners(
                block,
                format!(
                    "got {} corners, expected {}",
                    corners.len(),
                    cells::corner_count(self.dim)
                ),
            ));
        }
        if let Some(c) = corners.iter().find(|c| **c >= self.point_count()) {
            return Err(MeshError::bad_corners(
                block,
                format!("corner point {c} does not exist"),
            ));
        }
        if segments.len() != self.dim {
            return Err(MeshError::bad_corners(
                block,
                format!(
                    "got {} segment counts, expected one per axis of a {}D block",
                    segments.len(),
                    self.dim
                ),
            ));
        }
        let nb_edges = self.dim * cells::edges_per_axis(self.dim);
        if gradings.len() != nb_edges {
            return Err(MeshError::bad_corners(
                block,
                format!("got {} edge gradings, expected {nb_edges}", gradings.len()),
            ));
        }
        for (axis, s) in segments.iter().enumerate() {
            for g in &gradings
                [axis * cells::edges_per_axis(self.dim)..(axis + 1) * cells::edges_per_axis(self.dim)]
            {
                if *s == 0 || *g <= T::zero() {
                    return Err(MeshError::InvalidGrading {
                        segments: *s,
                        grading: num::cast::<T, f64>(*g).unwrap_or(f64::NAN),
                    });
                }
            }
        }

        self.block_corners.extend_from_slice(corners);
        self.block_segments.extend_from_slice(segments);
        self.block_gradings.extend_from_slice(gradings);
        Ok(block)
    }

    /// Add a named boundary patch from a flat list of face corner tuples
    pub fn add_patch(&mut self, name: &str, faces: &[usize]) -> MeshResult<usize> {
        if self.patches.iter().any(|p| p.name == name) {
            return Err(MeshError::bad_patch(name, "patch defined twice"));
        }
        let corners_per_face = cells::face_corner_count(self.dim);
        if faces.len() % corners_per_face != 0 {
            return Err(MeshError::bad_patch(
                name,
                format!(
                    "face list length {} is not a multiple of {corners_per_face} corners per face",
                    faces.len()
                ),
            ));
        }
        if let Some(c) = faces.iter().find(|c| **c >= self.point_count()) {
            return Err(MeshError::bad_patch(
                name,
                format!("face corner point {c} does not exist"),
            ));
        }
        self.patches.push(PatchSpec {
            name: String::from(name),
            faces: faces.to_vec(),
            corners_per_face,
        });
        Ok(self.patches.len() - 1)
    }

    /// Set the contiguous block-to-process distribution (`P + 1` offsets)
    pub fn set_distribution(&mut self, distribution: Vec<usize>) {
        self.distribution = Some(distribution);
    }

    /// Dimension of the topology (2 or 3)
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of corner points
    pub fn point_count(&self) -> usize {
        self.points.len() / self.dim
    }

    /// Number of blocks
    pub fn block_count(&self) -> usize {
        if self.block_corners.is_empty() {
            0
        } else {
            self.block_corners.len() / cells::corner_count(self.dim)
        }
    }

    /// Coordinates of a corner point
    pub fn point(&self, index: usize) -> &[T] {
        &self.points[index * self.dim..(index + 1) * self.dim]
    }

    /// Corner point indices of a block
    pub fn block_corners(&self, block: usize) -> &[usize] {
        let n = cells::corner_count(self.dim);
        &self.block_corners[block * n..(block + 1) * n]
    }

    /// Per-axis cell counts of a block
    pub fn block_segments(&self, block: usize) -> &[usize] {
        &self.block_segments[block * self.dim..(block + 1) * self.dim]
    }

    /// All edge gradings of a block, grouped by axis
    pub fn block_gradings(&self, block: usize) -> &[T] {
        let n = self.dim * cells::edges_per_axis(self.dim);
        &self.block_gradings[block * n..(block + 1) * n]
    }

    /// Edge gradings of a block along one axis
    pub fn axis_gradings(&self, block: usize, axis: usize) -> &[T] {
        let per_axis = cells::edges_per_axis(self.dim);
        &self.block_gradings(block)[axis * per_axis..(axis + 1) * per_axis]
    }

    /// Number of refined cells a block produces
    pub fn block_cell_count(&self, block: usize) -> usize {
        self.block_segments(block).iter().product()
    }

    /// Total number of refined cells the topology produces
    pub fn cell_count(&self) -> usize {
        (0..self.block_count()).map(|b| self.block_cell_count(b)).sum()
    }

    /// The boundary patches, in insertion order
    pub fn patches(&self) -> &[PatchSpec] {
        &self.patches
    }

    /// The block-to-process distribution, if one was set
    pub fn distribution(&self) -> Option<&[usize]> {
        self.distribution.as_deref()
    }

    /// Scale all corner points by a uniform factor
    pub fn scale_points(&mut self, factor: T) {
        for x in &mut self.points {
            *x = *x * factor;
        }
    }

    /// Deterministic 64-bit signature of the full topology.
    ///
    /// Every rank of a parallel run computes the same value iff the inputs
    /// are bytewise identical; gathered and compared when the consistency
    /// check is requested.
    pub fn signature(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.dim.hash(&mut hasher);
        for x in &self.points {
            num::cast::<T, f64>(*x).unwrap_or(f64::NAN).to_bits().hash(&mut hasher);
        }
        self.block_corners.hash(&mut hasher);
        self.block_segments.hash(&mut hasher);
        for g in &self.block_gradings {
            num::cast::<T, f64>(*g).unwrap_or(f64::NAN).to_bits().hash(&mut hasher);
        }
        for patch in &self.patches {
            patch.name.hash(&mut hasher);
            patch.faces.hash(&mut hasher);
        }
        self.distribution.hash(&mut hasher);
        hasher.finish()
    }

    /// Check the distribution against a process count
    pub(crate) fn validate_distribution(&self, nb_ranks: usize) -> MeshResult<&[usize]> {
        let Some(dist) = self.distribution() else {
            return Err(MeshError::bad_partition(
                "no block distribution set; partition the blocks first",
            ));
        };
        if dist.len() != nb_ranks + 1 {
            return Err(MeshError::bad_partition(format!(
                "distribution length {} does not match {} processes + 1",
                dist.len(),
                nb_ranks
            )));
        }
        if dist[0] != 0 || dist[nb_ranks] != self.block_count() {
            return Err(MeshError::bad_partition(format!(
                "distribution must span all {} blocks",
                self.block_count()
            )));
        }
        if dist.windows(2).any(|w| w[1] < w[0]) {
            return Err(MeshError::bad_partition("distribution must be non-decreasing"));
        }
        Ok(dist)
    }

    /// Cross-table sanity checks that add_* cannot see in isolation
    pub(crate) fn validate(&self) -> MeshResult<()> {
        for (block, (corners, segments)) in izip!(
            self.block_corners.chunks(cells::corner_count(self.dim)),
            self.block_segments.chunks(self.dim)
        )
        .enumerate()
        {
            debug_assert_eq!(corners.len(), cells::corner_count(self.dim));
            if segments.iter().any(|s| *s == 0) {
                return Err(MeshError::bad_corners(block, "zero segments along an axis"));
            }
        }
        Ok(())
    }
}
