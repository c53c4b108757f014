//! Balanced partitioning of a block topology along one axis.
//!
//! The block set is swept layer by layer from the boundary in the chosen
//! direction, accumulating whole layers into each partition. When the next
//! layer would overshoot the per-partition element target, every block of
//! the layer is cut mid-grading: the cut plane is placed by evaluating the
//! blocks' edge gradings, and both halves receive gradings that keep the
//! refined node positions of the original mesh.

use crate::{
    error::{MeshError, MeshResult},
    grading,
    topology::adjacency::{FaceConnectivity, FaceLink},
    topology::{cells, BlockTopology},
    types::RealScalar,
};
use itertools::izip;
use log::debug;

/// Last-to-first spacing ratio of a window of a mapped-coordinate sequence
fn window_grading<T: RealScalar>(seq: &[T], offset: usize, len: usize) -> T {
    (seq[offset + len] - seq[offset + len - 1]) / (seq[offset + 1] - seq[offset])
}

/// Blocks whose negative-direction face starts a sweep along `axis`
fn starting_layer(
    connectivity: &FaceConnectivity,
    nb_blocks: usize,
    negative: usize,
    transverse_faces: &[usize],
) -> Vec<usize> {
    let mut layer = vec![];
    for block in 0..nb_blocks {
        if !connectivity.is_boundary(block, negative) {
            continue;
        }
        let aligned = transverse_faces.iter().all(|face| {
            connectivity
                .neighbor_block(block, *face)
                .map(|t| connectivity.is_boundary(t, negative))
                .unwrap_or(true)
        });
        if aligned {
            layer.push(block);
        }
    }
    layer
}

/// Rewrite a topology into an equivalent one whose blocks fall into
/// `nb_partitions` contiguous groups of roughly equal element count.
///
/// Blocks may be split orthogonally to `axis`; the returned topology carries
/// the matching block distribution and produces the same refined mesh as
/// the input.
pub fn partition_blocks<T: RealScalar>(
    topology: &BlockTopology<T>,
    nb_partitions: usize,
    axis: usize,
) -> MeshResult<BlockTopology<T>> {
    let dim = topology.dim();
    if axis >= dim {
        return Err(MeshError::bad_partition(format!(
            "axis {axis} out of range for a {dim}D topology"
        )));
    }
    if nb_partitions == 0 {
        return Err(MeshError::bad_partition("at least one partition is required"));
    }
    topology.validate()?;
    let connectivity = FaceConnectivity::new(topology)?;

    let nb_blocks = topology.block_count();
    let negative = cells::negative_face(dim, axis);
    let positive = cells::positive_face(dim, axis);
    let edges_per_axis = cells::edges_per_axis(dim);
    let transverse_axes = (0..dim).filter(|d| *d != axis).collect::<Vec<_>>();
    let transverse_faces = transverse_axes
        .iter()
        .flat_map(|d| [cells::negative_face(dim, *d), cells::positive_face(dim, *d)])
        .collect::<Vec<_>>();

    let mut layer = starting_layer(&connectivity, nb_blocks, negative, &transverse_faces);
    if layer.is_empty() {
        return Err(MeshError::bad_partition(format!(
            "no starting layer: no block has a boundary face on the negative side of axis {axis}"
        )));
    }

    let global_nb_elements = topology.cell_count();
    let partition_size = (global_nb_elements + nb_partitions - 1) / nb_partitions;
    debug!(
        "partitioning {} blocks ({} cells) into {} parts of <= {} cells along axis {}",
        nb_blocks, global_nb_elements, nb_partitions, partition_size, axis
    );

    let nb_input_points = topology.point_count();
    let mut points = Vec::with_capacity(nb_input_points * dim);
    for i in 0..nb_input_points {
        points.extend_from_slice(topology.point(i));
    }

    // Point remappings: where the start/end face corners of each original
    // block currently sit. Cuts move the start mapping onto the cut plane.
    let mut start_map = (0..nb_input_points).collect::<Vec<_>>();
    let mut end_map = (0..nb_input_points).collect::<Vec<_>>();

    // Not-yet-assigned slices of each original block
    let mut work_segments = (0..nb_blocks)
        .map(|b| topology.block_segments(b)[axis])
        .collect::<Vec<_>>();
    let mut cut_offset = vec![0usize; nb_blocks];

    let mut out_blocks: Vec<Vec<usize>> = vec![];
    let mut out_segments: Vec<Vec<usize>> = vec![];
    let mut out_gradings: Vec<Vec<T>> = vec![];
    let mut patch_faces: Vec<Vec<usize>> = vec![vec![]; topology.patches().len()];
    let mut distribution = Vec::with_capacity(nb_partitions + 1);

    let half = T::from(0.5).unwrap();
    let one = T::one();

    let mut nb_partitioned = 0usize;
    for partition in 0..nb_partitions {
        distribution.push(out_blocks.len());

        let slice_size: usize = layer
            .iter()
            .map(|b| {
                transverse_axes
                    .iter()
                    .map(|a| topology.block_segments(*b)[*a])
                    .product::<usize>()
            })
            .sum();
        if layer.is_empty() || slice_size == 0 {
            return Err(MeshError::bad_partition(format!(
                "partition {partition} has no blocks left to assign"
            )));
        }

        let mut nb_slices = (partition_size + slice_size - 1) / slice_size;
        if nb_partitioned + nb_slices * slice_size > global_nb_elements {
            let remaining = global_nb_elements - nb_partitioned;
            if partition + 1 != nb_partitions || remaining % slice_size != 0 {
                return Err(MeshError::bad_partition(format!(
                    "cannot close partition {partition}: {remaining} cells left for slices of {slice_size}"
                )));
            }
            nb_slices = remaining / slice_size;
        }
        nb_partitioned += nb_slices * slice_size;

        while nb_slices > 0 {
            if layer.is_empty() {
                return Err(MeshError::bad_partition(
                    "sweep ran out of blocks before its partition filled up",
                ));
            }
            let block_nb_slices = work_segments[layer[0]];
            if layer.iter().any(|b| work_segments[*b] != block_nb_slices) {
                return Err(MeshError::bad_partition(format!(
                    "blocks of one layer disagree on their axis-{axis} segment count"
                )));
            }
            if block_nb_slices == 0 {
                return Err(MeshError::bad_partition(
                    "sweep revisited an exhausted block; is the topology periodic along the partition axis?",
                ));
            }

            // New block rows for this round start from the current start-face
            // mapping, before any cut moves it.
            let mut new_rows = layer
                .iter()
                .map(|b| {
                    let mut row = topology.block_corners(*b).to_vec();
                    for c in cells::face_corners(dim, negative) {
                        row[*c] = start_map[topology.block_corners(*b)[*c]];
                    }
                    row
                })
                .collect::<Vec<_>>();

            let mut advanced = None;
            if block_nb_slices > nb_slices {
                // The layer is larger than what the partition still needs:
                // cut it.
                let mut node_is_mapped = vec![false; nb_input_points];
                for &b in &layer {
                    let seqs = grading::axis_mapped_coordinates(
                        topology.block_segments(b)[axis],
                        topology.axis_gradings(b, axis),
                    )?;
                    let offset = cut_offset[b];
                    let cut = offset + nb_slices;
                    let mut gradings_row = topology.block_gradings(b).to_vec();
                    for (e, edge) in cells::axis_edges(dim, axis).iter().enumerate() {
                        let start_node = topology.block_corners(b)[edge[0]];
                        let end_node = topology.block_corners(b)[edge[1]];
                        if !node_is_mapped[end_node] {
                            node_is_mapped[end_node] = true;
                            // Cut-plane corner: the original end corner with
                            // its axis coordinate interpolated between the
                            // original edge end points.
                            let t = (seqs[e][cut] + one) * half;
                            let x0 = topology.point(start_node)[axis];
                            let x1 = topology.point(end_node)[axis];
                            let mut coords = topology.point(end_node).to_vec();
                            coords[axis] = x0 + (x1 - x0) * t;
                            let new_point = points.len() / dim;
                            points.extend_from_slice(&coords);
                            end_map[end_node] = new_point;
                            start_map[start_node] = new_point;
                        }
                        gradings_row[axis * edges_per_axis + e] =
                            window_grading(&seqs[e], offset, nb_slices);
                    }
                    let mut segments_row = topology.block_segments(b).to_vec();
                    segments_row[axis] = nb_slices;
                    out_segments.push(segments_row);
                    out_gradings.push(gradings_row);
                    work_segments[b] -= nb_slices;
                    cut_offset[b] += nb_slices;
                }
                nb_slices = 0;
            } else {
                // The whole layer fits into this partition.
                for &b in &layer {
                    let offset = cut_offset[b];
                    let mut gradings_row = topology.block_gradings(b).to_vec();
                    if offset > 0 {
                        let seqs = grading::axis_mapped_coordinates(
                            topology.block_segments(b)[axis],
                            topology.axis_gradings(b, axis),
                        )?;
                        for e in 0..edges_per_axis {
                            gradings_row[axis * edges_per_axis + e] =
                                window_grading(&seqs[e], offset, work_segments[b]);
                        }
                    }
                    let mut segments_row = topology.block_segments(b).to_vec();
                    segments_row[axis] = work_segments[b];
                    out_segments.push(segments_row);
                    out_gradings.push(gradings_row);
                    // The remainder of the block closes on its original
                    // end-face corners.
                    for c in cells::face_corners(dim, positive) {
                        let end_node = topology.block_corners(b)[*c];
                        end_map[end_node] = end_node;
                    }
                }
                nb_slices -= block_nb_slices;

                // Advance to the positive-side neighbors, then grow the new
                // layer transversely until it is closed.
                let mut next: Vec<usize> = vec![];
                for &b in &layer {
                    if let Some(n) = connectivity.neighbor_block(b, positive) {
                        if !next.contains(&n) {
                            next.push(n);
                        }
                    }
                }
                let mut i = 0;
                while i < next.len() {
                    for face in &transverse_faces {
                        if let Some(t) = connectivity.neighbor_block(next[i], *face) {
                            if !next.contains(&t) {
                                next.push(t);
                            }
                        }
                    }
                    i += 1;
                }
                advanced = Some(next);
            }

            // Close the rows, emit them, and carry the transverse patches.
            for (row, &b) in izip!(new_rows.iter_mut(), &layer) {
                for c in cells::face_corners(dim, positive) {
                    row[*c] = end_map[topology.block_corners(b)[*c]];
                }
                for face in &transverse_faces {
                    if let FaceLink::Patch(p) = connectivity.link(b, *face) {
                        for c in cells::face_corners(dim, *face) {
                            patch_faces[p].push(row[*c]);
                        }
                    }
                }
                out_blocks.push(std::mem::take(row));
            }
            if let Some(next) = advanced {
                layer = next;
            }
        }
    }
    distribution.push(out_blocks.len());

    // The original start- and end-direction patch faces survive unsplit.
    for b in 0..nb_blocks {
        for face in [negative, positive] {
            if let FaceLink::Patch(p) = connectivity.link(b, face) {
                for c in cells::face_corners(dim, face) {
                    patch_faces[p].push(topology.block_corners(b)[*c]);
                }
            }
        }
    }

    let mut out = BlockTopology::new(dim)?;
    for i in 0..points.len() / dim {
        out.add_point(&points[i * dim..(i + 1) * dim])?;
    }
    for (row, segments_row, gradings_row) in izip!(&out_blocks, &out_segments, &out_gradings) {
        out.add_block(row, segments_row, gradings_row)?;
    }
    for (patch, faces) in izip!(topology.patches(), &patch_faces) {
        out.add_patch(patch.name(), faces)?;
    }
    out.set_distribution(distribution);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    /// `nb` unit cubes in a row along x, (2, 2, 2) cells each
    fn strip_3d(nb: usize, segments: [usize; 3], grading: f64) -> BlockTopology<f64> {
        let mut t = BlockTopology::new(3).unwrap();
        for x in 0..=nb {
            for (y, z) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                t.add_point(&[x as f64, y, z]).unwrap();
            }
        }
        let mut gradings = [1.0; 12];
        gradings[..4].copy_from_slice(&[grading; 4]);
        for b in 0..nb {
            let lo = 4 * b;
            let hi = 4 * (b + 1);
            t.add_block(
                &[lo, hi, hi + 1, lo + 1, lo + 3, hi + 3, hi + 2, lo + 2],
                &segments,
                &gradings,
            )
            .unwrap();
        }
        t
    }

    #[test]
    fn test_whole_layer_partitioning() {
        // 6 blocks x 8 cells into 3 parts: 2 blocks each, no cut needed.
        let t = strip_3d(6, [2, 2, 2], 1.0);
        let p = partition_blocks(&t, 3, 0).unwrap();
        assert_eq!(p.block_count(), 6);
        assert_eq!(p.distribution(), Some(&[0, 2, 4, 6][..]));
        for part in 0..3 {
            let cells: usize = (2 * part..2 * part + 2).map(|b| p.block_cell_count(b)).sum();
            assert_eq!(cells, 16);
        }
    }

    #[test]
    fn test_mid_block_cuts() {
        // 2 blocks x 12 cells into 3 parts of 8: both blocks get cut.
        let t = strip_3d(2, [3, 2, 2], 1.0);
        let p = partition_blocks(&t, 3, 0).unwrap();
        assert_eq!(p.block_count(), 4);
        assert_eq!(p.distribution(), Some(&[0, 1, 3, 4][..]));
        assert_eq!(p.block_segments(0), &[2, 2, 2]);
        assert_eq!(p.block_segments(1), &[1, 2, 2]);
        assert_eq!(p.block_segments(2), &[1, 2, 2]);
        assert_eq!(p.block_segments(3), &[2, 2, 2]);
        assert_eq!(p.cell_count(), t.cell_count());

        // Uniform gradings: block 0 was cut at slice 2 of 3, so the new
        // corner plane sits at x = 2/3.
        let corner = p.block_corners(1)[0];
        assert_relative_eq!(p.point(corner)[0], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cut_preserves_graded_planes() {
        // One block, 4 graded slices, cut into 2 + 2.
        let t = strip_3d(1, [4, 2, 2], 3.0);
        let p = partition_blocks(&t, 2, 0).unwrap();
        assert_eq!(p.block_count(), 2);

        let seq = grading::mapped_coordinates(4, 3.0).unwrap();
        let expected = (seq[2] + 1.0) / 2.0;
        let corner = p.block_corners(1)[0];
        assert_relative_eq!(p.point(corner)[0], expected, epsilon = 1e-12);

        // Both halves keep the spacing ratios of the original sequence.
        let left = p.axis_gradings(0, 0);
        let right = p.axis_gradings(1, 0);
        assert_relative_eq!(left[0], (seq[2] - seq[1]) / (seq[1] - seq[0]), epsilon = 1e-12);
        assert_relative_eq!(right[0], (seq[4] - seq[3]) / (seq[3] - seq[2]), epsilon = 1e-12);
    }

    #[test]
    fn test_partitioning_is_idempotent() {
        let t = strip_3d(4, [2, 2, 2], 1.0);
        let once = partition_blocks(&t, 1, 0).unwrap();
        let twice = partition_blocks(&once, 1, 0).unwrap();
        assert_eq!(once.block_count(), twice.block_count());
        assert_eq!(once.distribution(), twice.distribution());
        for b in 0..once.block_count() {
            assert_eq!(once.block_corners(b), twice.block_corners(b));
            assert_eq!(once.block_segments(b), twice.block_segments(b));
        }
    }

    #[test]
    fn test_patch_carry_through() {
        let mut t = strip_3d(2, [3, 2, 2], 1.0);
        // south wall of both blocks (the -eta faces), plus the inlet
        t.add_patch("wall", &[0, 4, 7, 3, 4, 8, 11, 7]).unwrap();
        t.add_patch("inlet", &[0, 3, 2, 1]).unwrap();
        let p = partition_blocks(&t, 3, 0).unwrap();

        let wall = &p.patches()[0];
        assert_eq!(wall.name(), "wall");
        // one wall face per emitted block
        assert_eq!(wall.face_count(), p.block_count());
        let inlet = &p.patches()[1];
        assert_eq!(inlet.face_count(), 1);

        // The rewritten topology must still pass adjacency validation.
        assert!(FaceConnectivity::new(&p).is_ok());
    }

    #[test]
    fn test_no_starting_layer() {
        // A periodic 2D ring has no boundary in the sweep direction.
        let mut t = BlockTopology::<f64>::new(2).unwrap();
        for r in [1.0, 2.0] {
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
        assert!(matches!(
            partition_blocks(&t, 2, 0),
            Err(MeshError::InvalidPartition { .. })
        ));
    }

    #[test]
    fn test_axis_out_of_range() {
        let t = strip_3d(2, [2, 2, 2], 1.0);
        assert!(partition_blocks(&t, 2, 3).is_err());
    }
}
