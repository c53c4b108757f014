//! Ready-made block topologies.
//!
//! Convenience constructors for the shapes the examples and tests keep
//! reaching for. All of them use uniform gradings; grade or patch the
//! returned topology afterwards if needed.

use crate::{topology::BlockTopology, types::RealScalar};

/// A unit square refined as a single block
pub fn unit_square<T: RealScalar>(nx: usize, ny: usize) -> BlockTopology<T> {
    let zero = T::zero();
    let one = T::one();
    let mut topology = BlockTopology::new(2).expect("2 is a supported dimension");
    topology.add_point(&[zero, zero]).unwrap();
    topology.add_point(&[one, zero]).unwrap();
    topology.add_point(&[one, one]).unwrap();
    topology.add_point(&[zero, one]).unwrap();
    topology
        .add_block(&[0, 1, 2, 3], &[nx, ny], &[one; 4])
        .expect("the unit square block is valid");
    topology
}

/// A unit cube refined as a single block
pub fn unit_cube<T: RealScalar>(nx: usize, ny: usize, nz: usize) -> BlockTopology<T> {
    let zero = T::zero();
    let one = T::one();
    let mut topology = BlockTopology::new(3).expect("3 is a supported dimension");
    for (x, y, z) in [
        (zero, zero, zero),
        (one, zero, zero),
        (one, one, zero),
        (zero, one, zero),
        (zero, zero, one),
        (one, zero, one),
        (one, one, one),
        (zero, one, one),
    ] {
        topology.add_point(&[x, y, z]).unwrap();
    }
    topology
        .add_block(&[0, 1, 2, 3, 4, 5, 6, 7], &[nx, ny, nz], &[one; 12])
        .expect("the unit cube block is valid");
    topology
}

/// `nb_blocks` unit squares in a row along x, each refined `nx` by `ny`
pub fn block_strip_2d<T: RealScalar>(nb_blocks: usize, nx: usize, ny: usize) -> BlockTopology<T> {
    let zero = T::zero();
    let one = T::one();
    let mut topology = BlockTopology::new(2).expect("2 is a supported dimension");
    for x in 0..=nb_blocks {
        topology.add_point(&[T::from(x).unwrap(), zero]).unwrap();
        topology.add_point(&[T::from(x).unwrap(), one]).unwrap();
    }
    for b in 0..nb_blocks {
        let lo = 2 * b;
        topology
            .add_block(&[lo, lo + 2, lo + 3, lo + 1], &[nx, ny], &[one; 4])
            .expect("strip blocks are valid");
    }
    topology
}

/// `nb_blocks` unit cubes in a row along x, each refined `nx, ny, nz`
pub fn block_strip_3d<T: RealScalar>(
    nb_blocks: usize,
    nx: usize,
    ny: usize,
    nz: usize,
) -> BlockTopology<T> {
    let zero = T::zero();
    let one = T::one();
    let mut topology = BlockTopology::new(3).expect("3 is a supported dimension");
    for x in 0..=nb_blocks {
        let x = T::from(x).unwrap();
        topology.add_point(&[x, zero, zero]).unwrap();
        topology.add_point(&[x, one, zero]).unwrap();
        topology.add_point(&[x, one, one]).unwrap();
        topology.add_point(&[x, zero, one]).unwrap();
    }
    for b in 0..nb_blocks {
        let lo = 4 * b;
        let hi = 4 * (b + 1);
        topology
            .add_block(
                &[lo, hi, hi + 1, lo + 1, lo + 3, hi + 3, hi + 2, lo + 2],
                &[nx, ny, nz],
                &[one; 12],
            )
            .expect("strip blocks are valid");
    }
    topology
}
