//! The refined unstructured mesh produced by the generator.
//!
//! A [Mesh] holds one rank's share: local node coordinates (owned nodes
//! first, ghosts appended), cell and patch-element connectivity in local
//! node ids, and the global id and ownership of every local node and
//! element.

pub mod builder;
pub(crate) mod indexing;

use crate::types::{Ownership, RealScalar};

/// Surface elements of one boundary patch on the local rank
#[derive(Debug)]
pub struct MeshPatch {
    name: String,
    corners_per_face: usize,
    faces: Vec<usize>,
    global_indices: Vec<usize>,
}

impl MeshPatch {
    pub(crate) fn new(name: String, corners_per_face: usize) -> Self {
        Self {
            name,
            corners_per_face,
            faces: vec![],
            global_indices: vec![],
        }
    }

    pub(crate) fn push_face(&mut self, nodes: &[usize]) {
        debug_assert_eq!(nodes.len(), self.corners_per_face);
        self.faces.extend_from_slice(nodes);
    }

    pub(crate) fn set_global_indices(&mut self, indices: Vec<usize>) {
        debug_assert_eq!(indices.len(), self.face_count());
        self.global_indices = indices;
    }

    /// Patch name; faces assigned to no named patch end up in `"default"`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of surface elements emitted on this rank
    pub fn face_count(&self) -> usize {
        self.faces.len() / self.corners_per_face
    }

    /// Local node ids of one surface element
    pub fn face(&self, index: usize) -> &[usize] {
        &self.faces[index * self.corners_per_face..(index + 1) * self.corners_per_face]
    }

    /// Global element ids of the surface elements, parallel to the faces
    pub fn global_indices(&self) -> &[usize] {
        &self.global_indices
    }
}

/// One rank's share of a generated mesh
#[derive(Debug)]
pub struct Mesh<T: RealScalar> {
    pub(crate) dim: usize,
    pub(crate) coordinates: Vec<T>,
    pub(crate) owned_node_count: usize,
    pub(crate) global_node_count: usize,
    pub(crate) cells: Vec<usize>,
    pub(crate) patches: Vec<MeshPatch>,
    pub(crate) node_global_indices: Vec<usize>,
    pub(crate) node_ownership: Vec<Ownership>,
    pub(crate) cell_global_indices: Vec<usize>,
    pub(crate) cell_ownership: Vec<Ownership>,
}

impl<T: RealScalar> Mesh<T> {
    /// Geometric dimension
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of local nodes, ghosts included
    pub fn node_count(&self) -> usize {
        self.coordinates.len() / self.dim
    }

    /// Number of nodes owned by this rank
    pub fn owned_node_count(&self) -> usize {
        self.owned_node_count
    }

    /// Number of ghost nodes appended after the owned nodes
    pub fn ghost_node_count(&self) -> usize {
        self.node_count() - self.owned_node_count
    }

    /// Number of nodes across all ranks
    pub fn global_node_count(&self) -> usize {
        self.global_node_count
    }

    /// Coordinates of a local node
    pub fn point(&self, node: usize) -> &[T] {
        &self.coordinates[node * self.dim..(node + 1) * self.dim]
    }

    /// Nodes per cell (4 for quadrilaterals, 8 for hexahedra)
    pub fn corners_per_cell(&self) -> usize {
        1 << self.dim
    }

    /// Number of local cells
    pub fn cell_count(&self) -> usize {
        self.cells.len() / self.corners_per_cell()
    }

    /// Local node ids of one cell
    pub fn cell(&self, index: usize) -> &[usize] {
        let n = self.corners_per_cell();
        &self.cells[index * n..(index + 1) * n]
    }

    /// The boundary patches with local elements, named patches first in
    /// definition order, the default patch last
    pub fn patches(&self) -> &[MeshPatch] {
        &self.patches
    }

    /// Look up a patch by name
    pub fn patch(&self, name: &str) -> Option<&MeshPatch> {
        self.patches.iter().find(|p| p.name() == name)
    }

    /// Global node id of every local node
    pub fn node_global_indices(&self) -> &[usize] {
        &self.node_global_indices
    }

    /// Ownership of every local node
    pub fn node_ownership(&self) -> &[Ownership] {
        &self.node_ownership
    }

    /// Global element id of every local cell
    pub fn cell_global_indices(&self) -> &[usize] {
        &self.cell_global_indices
    }

    /// Ownership of every local cell
    pub fn cell_ownership(&self) -> &[Ownership] {
        &self.cell_ownership
    }
}
