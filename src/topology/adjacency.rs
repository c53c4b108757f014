//! Inter-block face connectivity.
//!
//! Faces are identified by their corner point sets, never by axis labels:
//! two blocks are neighbors iff one face of each references the same
//! `2^(D-1)` corner points. Boundary faces resolve to a named patch or to
//! the default patch.

use crate::{
    error::{MeshError, MeshResult},
    topology::{cells, BlockTopology},
    types::RealScalar,
};
use std::collections::HashMap;

/// What lies on the other side of a block face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLink {
    /// An adjacent block, and the mirroring face on that block
    Neighbor {
        /// Adjacent block index (may equal the owning block for periodic wraps)
        block: usize,
        /// Face of the adjacent block that coincides with this one
        face: usize,
    },
    /// The boundary, covered by the named patch with this index
    Patch(usize),
    /// The boundary, not covered by any named patch
    Default,
}

/// Face connectivity of a block topology
#[derive(Debug)]
pub struct FaceConnectivity {
    faces_per_block: usize,
    links: Vec<FaceLink>,
}

fn face_key<T: RealScalar>(topology: &BlockTopology<T>, block: usize, face: usize) -> Vec<usize> {
    let corners = topology.block_corners(block);
    let mut key = cells::face_corners(topology.dim(), face)
        .iter()
        .map(|c| corners[*c])
        .collect::<Vec<_>>();
    key.sort_unstable();
    key
}

impl FaceConnectivity {
    /// Detect the adjacency of all blocks in a topology
    pub fn new<T: RealScalar>(topology: &BlockTopology<T>) -> MeshResult<Self> {
        let dim = topology.dim();
        let faces_per_block = cells::face_count(dim);
        let corners_per_face = cells::face_corner_count(dim);

        // Invert the corner sets: one entry per distinct face key, listing
        // every (block, face) that references it.
        let mut face_table: HashMap<Vec<usize>, Vec<(usize, usize)>> = HashMap::new();
        for block in 0..topology.block_count() {
            for face in 0..faces_per_block {
                face_table
                    .entry(face_key(topology, block, face))
                    .or_default()
                    .push((block, face));
            }
        }

        // Patch faces, keyed the same way. A key may only be claimed once.
        let mut patch_table: HashMap<Vec<usize>, (usize, bool)> = HashMap::new();
        for (patch_idx, patch) in topology.patches().iter().enumerate() {
            for i in 0..patch.face_count() {
                let mut key = patch.face(i).to_vec();
                debug_assert_eq!(key.len(), corners_per_face);
                key.sort_unstable();
                if patch_table.insert(key, (patch_idx, false)).is_some() {
                    return Err(MeshError::bad_patch(
                        patch.name(),
                        "face is already covered by a patch",
                    ));
                }
            }
        }

        let mut links = Vec::with_capacity(topology.block_count() * faces_per_block);
        for block in 0..topology.block_count() {
            for face in 0..faces_per_block {
                let key = face_key(topology, block, face);
                let sharers = &face_table[&key];
                let link = match sharers.len() {
                    1 => {
                        if let Some((patch_idx, used)) = patch_table.get_mut(&key) {
                            *used = true;
                            FaceLink::Patch(*patch_idx)
                        } else {
                            FaceLink::Default
                        }
                    }
                    2 => {
                        let (other_block, other_face) = sharers
                            .iter()
                            .copied()
                            .find(|entry| *entry != (block, face))
                            .expect("a shared face pairs two distinct block faces");
                        FaceLink::Neighbor {
                            block: other_block,
                            face: other_face,
                        }
                    }
                    n => {
                        return Err(MeshError::bad_corners(
                            block,
                            format!("face shared by {n} block faces, topology is not manifold"),
                        ))
                    }
                };
                links.push(link);
            }
        }

        // Patch faces that matched no boundary face are either interior or
        // reference corners no block face uses.
        for (patch_idx, used) in patch_table.values() {
            if !used {
                return Err(MeshError::bad_patch(
                    topology.patches()[*patch_idx].name(),
                    "face is not on the boundary",
                ));
            }
        }

        Ok(Self {
            faces_per_block,
            links,
        })
    }

    /// What a block face connects to
    pub fn link(&self, block: usize, face: usize) -> FaceLink {
        self.links[block * self.faces_per_block + face]
    }

    /// True iff the face lies on the boundary
    pub fn is_boundary(&self, block: usize, face: usize) -> bool {
        !matches!(self.link(block, face), FaceLink::Neighbor { .. })
    }

    /// The block behind a face, if the face is interior
    pub fn neighbor_block(&self, block: usize, face: usize) -> Option<usize> {
        match self.link(block, face) {
            FaceLink::Neighbor { block, .. } => Some(block),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topology::cells::{negative_face, positive_face};

    fn two_block_strip() -> BlockTopology<f64> {
        let mut t = BlockTopology::new(2).unwrap();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (0.0, 1.0)] {
            t.add_point(&[x, y]).unwrap();
        }
        t.add_block(&[0, 1, 4, 5], &[2, 2], &[1.0; 4]).unwrap();
        t.add_block(&[1, 2, 3, 4], &[2, 2], &[1.0; 4]).unwrap();
        t
    }

    #[test]
    fn test_strip_neighbors() {
        let t = two_block_strip();
        let conn = FaceConnectivity::new(&t).unwrap();
        assert_eq!(
            conn.link(0, positive_face(2, 0)),
            FaceLink::Neighbor {
                block: 1,
                face: negative_face(2, 0)
            }
        );
        assert_eq!(
            conn.link(1, negative_face(2, 0)),
            FaceLink::Neighbor {
                block: 0,
                face: positive_face(2, 0)
            }
        );
        assert!(conn.is_boundary(0, negative_face(2, 0)));
        assert!(conn.is_boundary(1, positive_face(2, 0)));
        assert_eq!(conn.link(0, negative_face(2, 1)), FaceLink::Default);
    }

    #[test]
    fn test_named_and_default_patches() {
        let mut t = two_block_strip();
        t.add_patch("inlet", &[0, 5]).unwrap();
        let conn = FaceConnectivity::new(&t).unwrap();
        assert_eq!(conn.link(0, negative_face(2, 0)), FaceLink::Patch(0));
        assert_eq!(conn.link(1, positive_face(2, 0)), FaceLink::Default);
    }

    #[test]
    fn test_patch_on_interior_face_rejected() {
        let mut t = two_block_strip();
        // Points 1 and 4 form the face shared by the two blocks.
        t.add_patch("shared", &[1, 4]).unwrap();
        assert!(matches!(
            FaceConnectivity::new(&t),
            Err(MeshError::InvalidPatch { .. })
        ));
    }

    #[test]
    fn test_face_covered_twice_rejected() {
        let mut t = two_block_strip();
        t.add_patch("left", &[0, 5]).unwrap();
        t.add_patch("also_left", &[5, 0]).unwrap();
        assert!(matches!(
            FaceConnectivity::new(&t),
            Err(MeshError::InvalidPatch { .. })
        ));
    }

    #[test]
    fn test_periodic_ring() {
        // Four quads around the origin; every +xi face wraps onto the next
        // block's -xi face, closing the loop from block 3 back to block 0.
        let mut t = BlockTopology::<f64>::new(2).unwrap();
        let inner = 1.0;
        let outer = 2.0;
        for r in [inner, outer] {
            for k in 0..4 {
                let phi = std::f64::consts::FRAC_PI_2 * k as f64;
                t.add_point(&[r * phi.cos(), r * phi.sin()]).unwrap();
            }
        }
        for k in 0..4 {
            let a = k;
            let b = (k + 1) % 4;
            t.add_block(&[a, b, 4 + b, 4 + a], &[2, 2], &[1.0; 4]).unwrap();
        }
        let conn = FaceConnectivity::new(&t).unwrap();
        for k in 0..4 {
            assert_eq!(
                conn.link(k, positive_face(2, 0)),
                FaceLink::Neighbor {
                    block: (k + 1) % 4,
                    face: negative_face(2, 0)
                }
            );
            assert!(conn.is_boundary(k, positive_face(2, 1)));
            assert!(conn.is_boundary(k, negative_face(2, 1)));
        }
    }
}
