//! Node placement by edge-weighted trans-finite interpolation.
//!
//! Each block maps the reference cube onto its curvilinear extent. The
//! mapped coordinate of a node blends the per-edge graded subdivisions of
//! the block: the weight of an edge vanishes on the edges furthest from it,
//! so coincident gradings collapse to a plain bilinear/trilinear map while
//! differing gradings follow the nearest edge. The blended mapped
//! coordinate is pushed through the block's Lagrange shape functions to
//! produce physical coordinates.

use crate::{
    error::MeshResult,
    grading,
    grid::indexing::NodeIndexer,
    topology::{cells, BlockTopology},
    types::{Array2D, ArrayND, RealScalar},
};
use ndelement::{
    ciarlet::lagrange,
    traits::FiniteElement,
    types::{Continuity, ReferenceCellType},
};
use rlst::{rlst_dynamic_array2, rlst_dynamic_array4};

/// Reference cell refined inside a block of the given dimension
pub(crate) fn reference_cell_type(dim: usize) -> ReferenceCellType {
    match dim {
        2 => ReferenceCellType::Quadrilateral,
        3 => ReferenceCellType::Hexahedron,
        _ => unreachable!("dimension is validated on construction"),
    }
}

/// Compute the coordinates of every node of a block and store them at the
/// node's local id.
///
/// All of the block's nodes must already have local ids, which is the case
/// after its cells were emitted.
pub(crate) fn fill_block_coordinates<T: RealScalar>(
    topology: &BlockTopology<T>,
    block: usize,
    indexer: &NodeIndexer,
    coordinates: &mut [T],
) -> MeshResult<()> {
    let mapped = match topology.dim() {
        2 => mapped_nodes_2d(topology, block)?,
        3 => mapped_nodes_3d(topology, block)?,
        _ => unreachable!("dimension is validated on construction"),
    };
    place_nodes(topology, block, indexer, mapped, coordinates);
    Ok(())
}

/// Blended mapped coordinates of all nodes of a 2D block, node-major
fn mapped_nodes_2d<T: RealScalar>(topology: &BlockTopology<T>, block: usize) -> MeshResult<Vec<T>> {
    let segments = topology.block_segments(block);
    let ksi = grading::axis_mapped_coordinates(segments[0], topology.axis_gradings(block, 0))?;
    let eta = grading::axis_mapped_coordinates(segments[1], topology.axis_gradings(block, 1))?;

    let one = T::one();
    let mut mapped = Vec::with_capacity(2 * (segments[0] + 1) * (segments[1] + 1));
    for j in 0..=segments[1] {
        for i in 0..=segments[0] {
            let (k0, k1) = (ksi[0][i], ksi[1][i]);
            let (e0, e1) = (eta[0][j], eta[1][j]);

            let wk0 = (one - k0) * (one - e0) + (one + k0) * (one - e1);
            let wk1 = (one - k1) * (one + e0) + (one + k1) * (one + e1);
            let we0 = (one - e0) * (one - k0) + (one + e0) * (one - k1);
            let we1 = (one - e1) * (one + k0) + (one + e1) * (one + k1);

            mapped.push((wk0 * k0 + wk1 * k1) / (wk0 + wk1));
            mapped.push((we0 * e0 + we1 * e1) / (we0 + we1));
        }
    }
    Ok(mapped)
}

/// Blended mapped coordinates of all nodes of a 3D block, node-major
fn mapped_nodes_3d<T: RealScalar>(topology: &BlockTopology<T>, block: usize) -> MeshResult<Vec<T>> {
    let segments = topology.block_segments(block);
    let ksi = grading::axis_mapped_coordinates(segments[0], topology.axis_gradings(block, 0))?;
    let eta = grading::axis_mapped_coordinates(segments[1], topology.axis_gradings(block, 1))?;
    let zta = grading::axis_mapped_coordinates(segments[2], topology.axis_gradings(block, 2))?;

    let one = T::one();
    let nb_nodes = (segments[0] + 1) * (segments[1] + 1) * (segments[2] + 1);
    let mut mapped = Vec::with_capacity(3 * nb_nodes);
    for k in 0..=segments[2] {
        for j in 0..=segments[1] {
            for i in 0..=segments[0] {
                let (k0, k1, k2, k3) = (ksi[0][i], ksi[1][i], ksi[2][i], ksi[3][i]);
                let (e0, e1, e2, e3) = (eta[0][j], eta[1][j], eta[2][j], eta[3][j]);
                let (z0, z1, z2, z3) = (zta[0][k], zta[1][k], zta[2][k], zta[3][k]);

                let wk = [
                    (one - k0) * (one - e0) * (one - z0) + (one + k0) * (one - e1) * (one - z1),
                    (one - k1) * (one + e0) * (one - z3) + (one + k1) * (one + e1) * (one - z2),
                    (one - k2) * (one + e3) * (one + z3) + (one + k2) * (one + e2) * (one + z2),
                    (one - k3) * (one - e3) * (one + z0) + (one + k3) * (one - e2) * (one + z1),
                ];
                let we = [
                    (one - e0) * (one - k0) * (one - z0) + (one + e0) * (one - k1) * (one - z3),
                    (one - e1) * (one + k0) * (one - z1) + (one + e1) * (one + k1) * (one - z2),
                    (one - e2) * (one + k3) * (one + z1) + (one + e2) * (one + k2) * (one + z2),
                    (one - e3) * (one - k3) * (one + z0) + (one + e3) * (one - k2) * (one + z3),
                ];
                let wz = [
                    (one - z0) * (one - k0) * (one - e0) + (one + z0) * (one - k3) * (one - e3),
                    (one - z1) * (one + k0) * (one - e1) + (one + z1) * (one + k3) * (one - e2),
                    (one - z2) * (one + k1) * (one + e1) + (one + z2) * (one + k2) * (one + e2),
                    (one - z3) * (one - k1) * (one + e0) + (one + z3) * (one - k2) * (one + e3),
                ];

                let blend = |w: &[T; 4], c: [T; 4]| {
                    (w[0] * c[0] + w[1] * c[1] + w[2] * c[2] + w[3] * c[3])
                        / (w[0] + w[1] + w[2] + w[3])
                };
                mapped.push(blend(&wk, [k0, k1, k2, k3]));
                mapped.push(blend(&we, [e0, e1, e2, e3]));
                mapped.push(blend(&wz, [z0, z1, z2, z3]));
            }
        }
    }
    Ok(mapped)
}

/// Evaluate the block's shape functions at every mapped node and scatter the
/// physical coordinates into the local coordinate table.
fn place_nodes<T: RealScalar>(
    topology: &BlockTopology<T>,
    block: usize,
    indexer: &NodeIndexer,
    mapped: Vec<T>,
    coordinates: &mut [T],
) {
    let dim = topology.dim();
    let nb_nodes = mapped.len() / dim;
    let half = T::from(0.5).unwrap();
    let one = T::one();

    // ndelement reference cells live on [0, 1]^d
    let mut points: Array2D<T> = rlst_dynamic_array2!(T, [dim, nb_nodes]);
    for p in 0..nb_nodes {
        for d in 0..dim {
            points[[d, p]] = half * (mapped[p * dim + d] + one);
        }
    }

    let element = lagrange::create::<T>(reference_cell_type(dim), 1, Continuity::Standard);
    let mut table: ArrayND<4, T> =
        rlst_dynamic_array4!(T, element.tabulate_array_shape(0, nb_nodes));
    element.tabulate(&points, 0, &mut table);

    // Physical corner coordinates feeding each basis function
    let corners = topology.block_corners(block);
    let basis_points = cells::basis_corners(dim)
        .iter()
        .map(|c| topology.point(corners[*c]))
        .collect::<Vec<_>>();

    let segments = topology.block_segments(block);
    let mut structured = [0usize; 3];
    let mut p = 0;
    let mut walk = |indexer: &NodeIndexer, structured: &[usize], p: usize| {
        let lid = indexer.lookup_local(indexer.global_index(block, structured));
        for d in 0..dim {
            let mut x = T::zero();
            for (basis, corner) in basis_points.iter().enumerate() {
                x += table[[0, p, basis, 0]] * corner[d];
            }
            coordinates[lid * dim + d] = x;
        }
    };
    if dim == 2 {
        for j in 0..=segments[1] {
            for i in 0..=segments[0] {
                structured[0] = i;
                structured[1] = j;
                walk(indexer, &structured[..2], p);
                p += 1;
            }
        }
    } else {
        for k in 0..=segments[2] {
            for j in 0..=segments[1] {
                for i in 0..=segments[0] {
                    structured[0] = i;
                    structured[1] = j;
                    structured[2] = k;
                    walk(indexer, &structured[..3], p);
                    p += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topology::adjacency::FaceConnectivity;
    use approx::assert_relative_eq;

    fn fill_serial(topology: &BlockTopology<f64>) -> Vec<f64> {
        let conn = FaceConnectivity::new(topology).unwrap();
        let indexer = NodeIndexer::new(topology, &conn, &[0, topology.block_count()], 0);
        let mut coordinates = vec![0.0; indexer.owned_count() * topology.dim()];
        for block in 0..topology.block_count() {
            fill_block_coordinates(topology, block, &indexer, &mut coordinates).unwrap();
        }
        coordinates
    }

    #[test]
    fn test_corners_match_input_points() {
        let mut t = BlockTopology::<f64>::new(3).unwrap();
        let pts = [
            [0.0, 0.0, 0.0],
            [2.0, 0.1, 0.0],
            [2.2, 1.9, -0.1],
            [0.1, 2.0, 0.05],
            [0.0, 0.0, 3.0],
            [2.0, 0.1, 3.1],
            [2.2, 1.9, 2.9],
            [0.1, 2.0, 3.0],
        ];
        for p in &pts {
            t.add_point(p).unwrap();
        }
        t.add_block(&[0, 1, 2, 3, 4, 5, 6, 7], &[3, 2, 2], &[1.5; 12]).unwrap();

        let conn = FaceConnectivity::new(&t).unwrap();
        let indexer = NodeIndexer::new(&t, &conn, &[0, 1], 0);
        let coords = fill_serial(&t);

        let corner_nodes = [
            ([0, 0, 0], 0),
            ([3, 0, 0], 1),
            ([3, 2, 0], 2),
            ([0, 2, 0], 3),
            ([0, 0, 2], 4),
            ([3, 0, 2], 5),
            ([3, 2, 2], 6),
            ([0, 2, 2], 7),
        ];
        for (structured, point) in corner_nodes {
            let lid = indexer.lookup_local(indexer.global_index(0, &structured));
            for d in 0..3 {
                assert_relative_eq!(coords[lid * 3 + d], pts[point][d], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_graded_square_cell_widths() {
        // Both xi edges graded 2, eta uniform: a 10x10 unit square.
        let mut t = BlockTopology::<f64>::new(2).unwrap();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            t.add_point(&[x, y]).unwrap();
        }
        t.add_block(&[0, 1, 2, 3], &[10, 10], &[2.0, 2.0, 1.0, 1.0]).unwrap();

        let conn = FaceConnectivity::new(&t).unwrap();
        let indexer = NodeIndexer::new(&t, &conn, &[0, 1], 0);
        let coords = fill_serial(&t);

        let x_at = |i: usize, j: usize| {
            let lid = indexer.lookup_local(indexer.global_index(0, &[i, j]));
            coords[lid * 2]
        };
        let q = 2.0f64.powf(1.0 / 9.0);
        let total: f64 = (0..10).map(|i| q.powi(i)).sum();
        let first = x_at(1, 0) - x_at(0, 0);
        let last = x_at(10, 0) - x_at(9, 0);
        assert_relative_eq!(first, 1.0 / total, epsilon = 1e-10);
        assert_relative_eq!(last, q.powi(9) / total, epsilon = 1e-10);
        assert_relative_eq!(last / first, 2.0, epsilon = 1e-10);

        // eta stays uniform on every row
        for j in 0..10 {
            let lid0 = indexer.lookup_local(indexer.global_index(0, &[0, j]));
            let lid1 = indexer.lookup_local(indexer.global_index(0, &[0, j + 1]));
            assert_relative_eq!(coords[lid1 * 2 + 1] - coords[lid0 * 2 + 1], 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_uniform_cube_lattice() {
        let mut t = BlockTopology::<f64>::new(3).unwrap();
        for (x, y, z) in [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ] {
            t.add_point(&[x, y, z]).unwrap();
        }
        t.add_block(&[0, 1, 2, 3, 4, 5, 6, 7], &[2, 2, 2], &[1.0; 12]).unwrap();

        let conn = FaceConnectivity::new(&t).unwrap();
        let indexer = NodeIndexer::new(&t, &conn, &[0, 1], 0);
        let coords = fill_serial(&t);

        for k in 0..=2 {
            for j in 0..=2 {
                for i in 0..=2 {
                    let lid = indexer.lookup_local(indexer.global_index(0, &[i, j, k]));
                    assert_relative_eq!(coords[lid * 3], i as f64 / 2.0, epsilon = 1e-12);
                    assert_relative_eq!(coords[lid * 3 + 1], j as f64 / 2.0, epsilon = 1e-12);
                    assert_relative_eq!(coords[lid * 3 + 2], k as f64 / 2.0, epsilon = 1e-12);
                }
            }
        }
    }
}
