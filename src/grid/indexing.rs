//! Structured-to-global node index resolution.
//!
//! Each block owns the nodes of its structured grid except those on its
//! positive-direction interior faces; those belong to the neighbor behind
//! the face. Resolving an index triple therefore hops across positive faces
//! until the triple lands inside the owning block, which makes every rank
//! agree on the global id of every shared node without communication.

use crate::{
    topology::adjacency::FaceConnectivity,
    topology::{cells, BlockTopology},
    types::RealScalar,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Per-block index bookkeeping
#[derive(Debug)]
pub(crate) struct BlockRecord {
    /// Owned node count along each axis: `segments + 1` where the
    /// positive-direction face is on the boundary, `segments` otherwise
    /// (the closing node belongs to the neighbor)
    pub nb_points: [usize; 3],
    /// Cell count along each axis
    pub segments: [usize; 3],
    /// Block behind the positive-direction face; `None` on the boundary
    pub neighbor: [Option<usize>; 3],
    /// Row-major strides over the owned nodes
    pub strides: [usize; 3],
    /// Global id of this block's first owned node
    pub start_index: usize,
    /// Number of nodes the block owns
    pub nb_nodes: usize,
}

/// Resolves structured triples to global and local node ids
#[derive(Debug)]
pub(crate) struct NodeIndexer {
    dim: usize,
    blocks: Vec<BlockRecord>,
    node_distribution: Vec<usize>,
    local_begin: usize,
    local_end: usize,
    ghost_map: HashMap<usize, usize>,
    ghost_counter: usize,
}

impl NodeIndexer {
    pub fn new<T: RealScalar>(
        topology: &BlockTopology<T>,
        connectivity: &FaceConnectivity,
        distribution: &[usize],
        rank: usize,
    ) -> Self {
        let dim = topology.dim();
        let nb_blocks = topology.block_count();

        let mut blocks = Vec::with_capacity(nb_blocks);
        let mut block_start = 0;
        for b in 0..nb_blocks {
            let segments = topology.block_segments(b);
            let mut record = BlockRecord {
                nb_points: [1; 3],
                segments: [1; 3],
                neighbor: [None; 3],
                strides: [0; 3],
                start_index: block_start,
                nb_nodes: 1,
            };
            let mut stride = 1;
            for d in 0..dim {
                let face = cells::positive_face(dim, d);
                record.neighbor[d] = connectivity.neighbor_block(b, face);
                record.segments[d] = segments[d];
                record.nb_points[d] = segments[d] + usize::from(record.neighbor[d].is_none());
                record.strides[d] = stride;
                stride *= record.nb_points[d];
            }
            record.nb_nodes = stride;
            block_start += record.nb_nodes;
            blocks.push(record);
        }

        // Owned-node prefix per block, with the grand total as sentinel
        let mut first_node = Vec::with_capacity(nb_blocks + 1);
        first_node.push(0);
        for record in &blocks {
            first_node.push(first_node.last().unwrap() + record.nb_nodes);
        }

        let mut node_distribution = Vec::with_capacity(distribution.len());
        node_distribution.push(0);
        for w in distribution.windows(2) {
            let owned = first_node[w[1]] - first_node[w[0]];
            node_distribution.push(node_distribution.last().unwrap() + owned);
        }

        let local_begin = node_distribution[rank];
        let local_end = node_distribution[rank + 1];

        Self {
            dim,
            blocks,
            node_distribution,
            local_begin,
            local_end,
            ghost_map: HashMap::new(),
            ghost_counter: 0,
        }
    }

    pub fn block(&self, block: usize) -> &BlockRecord {
        &self.blocks[block]
    }

    /// Global id of the node at a structured index triple of a block.
    ///
    /// Hops across positive faces are repeated until no index sits on an
    /// interior closing face; a hop may expose an earlier axis to a further
    /// hop, so the passes run to a fixed point (at most one hop per axis).
    pub fn global_index(&self, block: usize, indices: &[usize]) -> usize {
        debug_assert_eq!(indices.len(), self.dim);
        let mut b = block;
        let mut idx = [0usize; 3];
        idx[..self.dim].copy_from_slice(indices);
        loop {
            let mut hopped = false;
            for d in 0..self.dim {
                let record = &self.blocks[b];
                debug_assert!(idx[d] <= record.segments[d]);
                if idx[d] == record.nb_points[d] {
                    b = record.neighbor[d].expect("an index beyond a bounded face");
                    idx[d] = 0;
                    hopped = true;
                }
            }
            if !hopped {
                break;
            }
        }
        let record = &self.blocks[b];
        record.start_index
            + (0..self.dim)
                .map(|d| record.strides[d] * idx[d])
                .sum::<usize>()
    }

    /// Local id for a global id, allocating a ghost id on first sight of a
    /// remote node
    pub fn local_index(&mut self, gid: usize) -> usize {
        if gid >= self.local_begin && gid < self.local_end {
            return gid - self.local_begin;
        }
        let next = self.local_end - self.local_begin + self.ghost_counter;
        match self.ghost_map.entry(gid) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(slot) => {
                slot.insert(next);
                self.ghost_counter += 1;
                next
            }
        }
    }

    /// Local id for a global id already seen by [Self::local_index]
    pub fn lookup_local(&self, gid: usize) -> usize {
        if gid >= self.local_begin && gid < self.local_end {
            gid - self.local_begin
        } else {
            self.ghost_map[&gid]
        }
    }

    /// Rank owning a global node id
    pub fn owner_rank(&self, gid: usize) -> usize {
        self.node_distribution.partition_point(|x| *x <= gid) - 1
    }

    pub fn node_distribution(&self) -> &[usize] {
        &self.node_distribution
    }

    pub fn local_begin(&self) -> usize {
        self.local_begin
    }

    pub fn owned_count(&self) -> usize {
        self.local_end - self.local_begin
    }

    pub fn ghost_count(&self) -> usize {
        self.ghost_counter
    }

    /// All (global id, local id) ghost pairs, in unspecified order
    pub fn ghosts(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.ghost_map.iter().map(|(gid, lid)| (*gid, *lid))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn indexer_for(topology: &BlockTopology<f64>, distribution: &[usize], rank: usize) -> NodeIndexer {
        let conn = FaceConnectivity::new(topology).unwrap();
        NodeIndexer::new(topology, &conn, distribution, rank)
    }

    fn channel_3d() -> BlockTopology<f64> {
        let mut t = BlockTopology::new(3).unwrap();
        for x in [0.0, 1.0, 2.0] {
            for (y, z) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                t.add_point(&[x, y, z]).unwrap();
            }
        }
        // corners of slab [x, x+1]: lower quad then upper quad
        t.add_block(&[0, 4, 5, 1, 3, 7, 6, 2], &[4, 2, 2], &[1.0; 12]).unwrap();
        t.add_block(&[4, 8, 9, 5, 7, 11, 10, 6], &[4, 2, 2], &[1.0; 12]).unwrap();
        t
    }

    #[test]
    fn test_channel_node_counts() {
        let t = channel_3d();
        let idx = indexer_for(&t, &[0, 2], 0);
        // block 0 shares its +xi face: owns 4*3*3 nodes, block 1 owns 5*3*3
        assert_eq!(idx.block(0).nb_points[..3], [4, 3, 3]);
        assert_eq!(idx.block(1).nb_points[..3], [5, 3, 3]);
        assert_eq!(idx.node_distribution(), &[0, 81]);
    }

    #[test]
    fn test_shared_face_resolves_identically() {
        let t = channel_3d();
        let idx = indexer_for(&t, &[0, 2], 0);
        for j in 0..=2 {
            for k in 0..=2 {
                let from_left = idx.global_index(0, &[4, j, k]);
                let from_right = idx.global_index(1, &[0, j, k]);
                assert_eq!(from_left, from_right);
            }
        }
    }

    #[test]
    fn test_corner_cross_resolves_identically() {
        // 2x2 block grid; the center node is incident to all four blocks.
        let mut t = BlockTopology::<f64>::new(2).unwrap();
        for y in [0.0, 1.0, 2.0] {
            for x in [0.0, 1.0, 2.0] {
                t.add_point(&[x, y]).unwrap();
            }
        }
        t.add_block(&[0, 1, 4, 3], &[2, 2], &[1.0; 4]).unwrap();
        t.add_block(&[1, 2, 5, 4], &[2, 2], &[1.0; 4]).unwrap();
        t.add_block(&[3, 4, 7, 6], &[2, 2], &[1.0; 4]).unwrap();
        t.add_block(&[4, 5, 8, 7], &[2, 2], &[1.0; 4]).unwrap();
        let idx = indexer_for(&t, &[0, 4], 0);

        let center = [
            idx.global_index(0, &[2, 2]),
            idx.global_index(1, &[0, 2]),
            idx.global_index(2, &[2, 0]),
            idx.global_index(3, &[0, 0]),
        ];
        assert!(center.iter().all(|gid| *gid == center[3]));

        // Total node count: blocks own 4, 6, 6, 9 nodes.
        assert_eq!(idx.node_distribution(), &[0, 25]);
    }

    #[test]
    fn test_ghost_allocation_is_lazy_and_stable() {
        let t = channel_3d();
        let mut idx = indexer_for(&t, &[0, 1, 2], 0);
        assert_eq!(idx.node_distribution(), &[0, 36, 81]);

        // A node owned by rank 1, seen from rank 0.
        let gid = idx.global_index(1, &[1, 0, 0]);
        assert!(gid >= 36);
        let lid = idx.local_index(gid);
        assert_eq!(lid, 36);
        assert_eq!(idx.local_index(gid), 36);
        assert_eq!(idx.ghost_count(), 1);

        let other = idx.global_index(1, &[2, 0, 0]);
        assert_eq!(idx.local_index(other), 37);
        assert_eq!(idx.ghost_count(), 2);
        assert_eq!(idx.owner_rank(gid), 1);
        assert_eq!(idx.owner_rank(0), 0);
    }
}
