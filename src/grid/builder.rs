//! Mesh generation: refining a block topology into an unstructured mesh.
//!
//! Every rank derives the complete node numbering from the shared topology
//! and only materializes the blocks of its own range, inventing local ids
//! for remote nodes on first contact. The only communication in the base
//! path is one all-gather of per-rank element counts for the global element
//! ids.

use crate::{
    error::{MeshError, MeshResult},
    geometry,
    grid::indexing::NodeIndexer,
    grid::{Mesh, MeshPatch},
    parallel::{Collective, OverlapGrower},
    partition,
    topology::adjacency::{FaceConnectivity, FaceLink},
    topology::{cells, BlockTopology},
    types::{Ownership, RealScalar},
};
use log::{debug, info};
use std::borrow::Cow;

/// One block face covered by a patch
#[derive(Debug, Clone, Copy)]
struct PatchFace {
    block: usize,
    axis: usize,
    positive: bool,
}

/// Generates the refined mesh from a block topology
pub struct MeshGenerator<'a, T: RealScalar> {
    topology: &'a BlockTopology<T>,
    verify_topology: bool,
}

impl<'a, T: RealScalar> MeshGenerator<'a, T> {
    /// Create a generator for a topology
    pub fn new(topology: &'a BlockTopology<T>) -> Self {
        Self {
            topology,
            verify_topology: false,
        }
    }

    /// Gather a topology signature across ranks before generating and fail
    /// with [MeshError::InconsistentTopology] on any mismatch
    pub fn verify_topology(mut self, verify: bool) -> Self {
        self.verify_topology = verify;
        self
    }

    /// Generate this rank's share of the refined mesh
    pub fn generate<C: Collective>(&self, comm: &C) -> MeshResult<Mesh<T>> {
        self.generate_local(comm)
    }

    /// Generate and then grow `overlap` rings of ghost cells through the
    /// supplied connectivity collaborator
    pub fn generate_with_overlap<C: Collective, G: OverlapGrower<T>>(
        &self,
        comm: &C,
        overlap: usize,
        grower: &mut G,
    ) -> MeshResult<Mesh<T>> {
        let mut mesh = self.generate_local(comm)?;
        if comm.size() > 1 {
            for round in 0..overlap {
                debug!("growing overlap ring {} of {overlap}", round + 1);
                grower.grow(comm, &mut mesh)?;
            }
        }
        Ok(mesh)
    }

    fn generate_local<C: Collective>(&self, comm: &C) -> MeshResult<Mesh<T>> {
        let rank = comm.rank();
        let nb_ranks = comm.size();
        let dim = self.topology.dim();
        self.topology.validate()?;

        // Without a distribution a parallel run slices the blocks itself.
        let topology: Cow<'_, BlockTopology<T>> =
            if nb_ranks > 1 && self.topology.distribution().is_none() {
                Cow::Owned(partition::partition_blocks(self.topology, nb_ranks, 0)?)
            } else {
                Cow::Borrowed(self.topology)
            };
        let distribution = match topology.distribution() {
            Some(_) => topology.validate_distribution(nb_ranks)?.to_vec(),
            None => vec![0, topology.block_count()],
        };

        if self.verify_topology {
            let mut signatures = vec![];
            comm.all_gather(topology.signature(), &mut signatures);
            if signatures.iter().any(|s| *s != signatures[0]) {
                return Err(MeshError::InconsistentTopology);
            }
        }

        let connectivity = FaceConnectivity::new(&topology)?;
        let mut indexer = NodeIndexer::new(&topology, &connectivity, &distribution, rank);

        let blocks_begin = distribution[rank];
        let blocks_end = distribution[rank + 1];
        let corners_per_cell = cells::corner_count(dim);
        let nb_local_cells: usize = (blocks_begin..blocks_end)
            .map(|b| topology.block_cell_count(b))
            .sum();

        // Interior cells; this also allocates every ghost id this rank needs.
        let mut mesh_cells = Vec::with_capacity(nb_local_cells * corners_per_cell);
        for block in blocks_begin..blocks_end {
            emit_block_cells(&topology, block, &mut indexer, &mut mesh_cells);
        }

        // Patch elements of the local blocks, named patches then default.
        let mut patch_records: Vec<Vec<PatchFace>> = vec![vec![]; topology.patches().len()];
        let mut default_records: Vec<PatchFace> = vec![];
        for block in blocks_begin..blocks_end {
            for axis in 0..dim {
                for positive in [false, true] {
                    let face = if positive {
                        cells::positive_face(dim, axis)
                    } else {
                        cells::negative_face(dim, axis)
                    };
                    let record = PatchFace {
                        block,
                        axis,
                        positive,
                    };
                    match connectivity.link(block, face) {
                        FaceLink::Patch(p) => patch_records[p].push(record),
                        FaceLink::Default => default_records.push(record),
                        FaceLink::Neighbor { .. } => {}
                    }
                }
            }
        }

        let corners_per_face = cells::face_corner_count(dim);
        let mut patches = vec![];
        for (spec, records) in topology.patches().iter().zip(&patch_records) {
            let mut patch = MeshPatch::new(String::from(spec.name()), corners_per_face);
            for record in records {
                emit_patch_elements(&topology, *record, &mut indexer, &mut patch);
            }
            patches.push(patch);
        }
        if !default_records.is_empty() {
            let mut patch = MeshPatch::new(String::from("default"), corners_per_face);
            for record in &default_records {
                emit_patch_elements(&topology, *record, &mut indexer, &mut patch);
            }
            patches.push(patch);
        }

        // The ghost set is closed now; place the coordinates.
        let nb_local_nodes = indexer.owned_count() + indexer.ghost_count();
        let mut coordinates = vec![T::zero(); nb_local_nodes * dim];
        for block in blocks_begin..blocks_end {
            geometry::fill_block_coordinates(&topology, block, &indexer, &mut coordinates)?;
        }

        let mut node_global_indices = vec![0; nb_local_nodes];
        let mut node_ownership = vec![Ownership::Owned; nb_local_nodes];
        for (lid, gid) in node_global_indices.iter_mut().take(indexer.owned_count()).enumerate() {
            *gid = indexer.local_begin() + lid;
        }
        for (gid, lid) in indexer.ghosts() {
            let owner = indexer.owner_rank(gid);
            node_global_indices[lid] = gid;
            node_ownership[lid] = Ownership::Ghost(owner, gid - indexer.node_distribution()[owner]);
        }

        // Global element ids: one all-gather, then a prefix sum. Volume
        // cells come first, then each patch in emission order.
        let nb_patch_elements: usize = patches.iter().map(|p| p.face_count()).sum();
        let mut element_counts = vec![];
        comm.all_gather((nb_local_cells + nb_patch_elements) as u64, &mut element_counts);
        let mut next_element: usize = element_counts[..rank].iter().map(|c| *c as usize).sum();

        let cell_global_indices = (next_element..next_element + nb_local_cells).collect::<Vec<_>>();
        next_element += nb_local_cells;
        for patch in &mut patches {
            let count = patch.face_count();
            patch.set_global_indices((next_element..next_element + count).collect());
            next_element += count;
        }

        info!(
            "rank {rank}/{nb_ranks}: {}D mesh with {} cells, {} owned nodes, {} ghosts, {} patch elements",
            dim,
            nb_local_cells,
            indexer.owned_count(),
            indexer.ghost_count(),
            nb_patch_elements
        );

        Ok(Mesh {
            dim,
            coordinates,
            owned_node_count: indexer.owned_count(),
            global_node_count: *indexer.node_distribution().last().unwrap(),
            cells: mesh_cells,
            patches,
            node_global_indices,
            node_ownership,
            cell_global_indices,
            cell_ownership: vec![Ownership::Owned; nb_local_cells],
        })
    }
}

/// Hexahedron corner offsets: bottom quad counter-clockwise, then the top
const HEXA_CELL_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Quadrilateral corner offsets, counter-clockwise
const QUAD_CELL_OFFSETS: [[usize; 2]; 4] = [[0, 0], [1, 0], [1, 1], [0, 1]];

fn emit_block_cells<T: RealScalar>(
    topology: &BlockTopology<T>,
    block: usize,
    indexer: &mut NodeIndexer,
    out: &mut Vec<usize>,
) {
    let segments = topology.block_segments(block);
    if topology.dim() == 2 {
        for j in 0..segments[1] {
            for i in 0..segments[0] {
                for [di, dj] in QUAD_CELL_OFFSETS {
                    let gid = indexer.global_index(block, &[i + di, j + dj]);
                    out.push(indexer.local_index(gid));
                }
            }
        }
    } else {
        for k in 0..segments[2] {
            for j in 0..segments[1] {
                for i in 0..segments[0] {
                    for [di, dj, dk] in HEXA_CELL_OFFSETS {
                        let gid = indexer.global_index(block, &[i + di, j + dj, k + dk]);
                        out.push(indexer.local_index(gid));
                    }
                }
            }
        }
    }
}

/// Emit the surface elements of one covered block face, row-major over the
/// free axes, oriented so the outward normal leaves the block.
fn emit_patch_elements<T: RealScalar>(
    topology: &BlockTopology<T>,
    record: PatchFace,
    indexer: &mut NodeIndexer,
    patch: &mut MeshPatch,
) {
    let dim = topology.dim();
    let segments = topology.block_segments(record.block);
    let fixed = if record.positive {
        segments[record.axis]
    } else {
        0
    };
    let free = (0..dim).filter(|d| *d != record.axis).collect::<Vec<_>>();

    if dim == 2 {
        let span = segments[free[0]];
        let node = |u: usize, indexer: &mut NodeIndexer| {
            let u = if record.positive { u } else { span - u };
            let mut idx = [0usize; 2];
            idx[record.axis] = fixed;
            idx[free[0]] = u;
            indexer.local_index(indexer.global_index(record.block, &idx))
        };
        for u in 0..span {
            let line = [node(u, indexer), node(u + 1, indexer)];
            patch.push_face(&line);
        }
    } else {
        let span = segments[free[0]];
        let node = |u: usize, v: usize, indexer: &mut NodeIndexer| {
            let u = if record.positive { u } else { span - u };
            let mut idx = [0usize; 3];
            idx[record.axis] = fixed;
            idx[free[0]] = u;
            idx[free[1]] = v;
            indexer.local_index(indexer.global_index(record.block, &idx))
        };
        for u in 0..span {
            for v in 0..segments[free[1]] {
                let quad = [
                    node(u, v, indexer),
                    node(u + 1, v, indexer),
                    node(u + 1, v + 1, indexer),
                    node(u, v + 1, indexer),
                ];
                patch.push_face(&quad);
            }
        }
    }
}
