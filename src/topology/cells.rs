//! Canonical corner, face and edge numbering for quadrilateral and
//! hexahedral blocks.
//!
//! Corners are numbered counter-clockwise starting at the bottom-left
//! corner; a hexahedron lists its bottom quad first and the top quad above
//! it in the same order. Faces follow the canonical order
//! `[-eta, +xi, +eta, -xi]` in 2D and `[-zeta, -eta, +xi, +eta, -xi, +zeta]`
//! in 3D. The edges of an axis are numbered counter-clockwise in the
//! transverse plane starting from the (-,-) corner, which is also the layout
//! of the per-edge grading table.

/// Corner pairs of each quadrilateral face, outward boundary order
const QUAD_FACES: [[usize; 2]; 4] = [
    [0, 1], // -eta
    [1, 2], // +xi
    [2, 3], // +eta
    [3, 0], // -xi
];

/// Corner quads of each hexahedron face
const HEXA_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1], // -zeta
    [0, 1, 5, 4], // -eta
    [1, 2, 6, 5], // +xi
    [3, 7, 6, 2], // +eta
    [0, 4, 7, 3], // -xi
    [4, 5, 6, 7], // +zeta
];

/// Face on the positive side of each axis, 2D
const QUAD_POSITIVE_FACE: [usize; 2] = [1, 2];
/// Face on the negative side of each axis, 2D
const QUAD_NEGATIVE_FACE: [usize; 2] = [3, 0];
/// Face on the positive side of each axis, 3D
const HEXA_POSITIVE_FACE: [usize; 3] = [2, 3, 5];
/// Face on the negative side of each axis, 3D
const HEXA_NEGATIVE_FACE: [usize; 3] = [4, 1, 0];

/// (start, end) corners of the edges along each axis, 2D
const QUAD_EDGES: [[[usize; 2]; 2]; 2] = [
    [[0, 1], [3, 2]], // along xi, at eta = -1 and +1
    [[0, 3], [1, 2]], // along eta, at xi = -1 and +1
];

/// (start, end) corners of the edges along each axis, 3D
const HEXA_EDGES: [[[usize; 2]; 4]; 3] = [
    [[0, 1], [3, 2], [7, 6], [4, 5]], // along xi
    [[0, 3], [1, 2], [5, 6], [4, 7]], // along eta
    [[0, 4], [1, 5], [2, 6], [3, 7]], // along zeta
];

/// Canonical corner feeding each Lagrange basis function of ndelement's
/// lexicographically numbered reference quad/hex
const QUAD_BASIS_CORNERS: [usize; 4] = [0, 1, 3, 2];
const HEXA_BASIS_CORNERS: [usize; 8] = [0, 1, 3, 2, 4, 5, 7, 6];

/// Number of corners of a block
pub(crate) fn corner_count(dim: usize) -> usize {
    1 << dim
}

/// Number of faces of a block
pub(crate) fn face_count(dim: usize) -> usize {
    2 * dim
}

/// Number of corners of a single face
pub(crate) fn face_corner_count(dim: usize) -> usize {
    1 << (dim - 1)
}

/// Number of edges running along one axis (equals the per-axis grading count)
pub(crate) fn edges_per_axis(dim: usize) -> usize {
    1 << (dim - 1)
}

/// Local corners of a face, in canonical face order
pub(crate) fn face_corners(dim: usize, face: usize) -> &'static [usize] {
    match dim {
        2 => &QUAD_FACES[face],
        3 => &HEXA_FACES[face],
        _ => unreachable!("dimension is validated on construction"),
    }
}

/// Face id on the positive side of an axis
pub(crate) fn positive_face(dim: usize, axis: usize) -> usize {
    match dim {
        2 => QUAD_POSITIVE_FACE[axis],
        3 => HEXA_POSITIVE_FACE[axis],
        _ => unreachable!("dimension is validated on construction"),
    }
}

/// Face id on the negative side of an axis
pub(crate) fn negative_face(dim: usize, axis: usize) -> usize {
    match dim {
        2 => QUAD_NEGATIVE_FACE[axis],
        3 => HEXA_NEGATIVE_FACE[axis],
        _ => unreachable!("dimension is validated on construction"),
    }
}

/// The axis a face is orthogonal to and whether it sits on the positive side
pub(crate) fn face_axis(dim: usize, face: usize) -> (usize, bool) {
    for axis in 0..dim {
        if positive_face(dim, axis) == face {
            return (axis, true);
        }
        if negative_face(dim, axis) == face {
            return (axis, false);
        }
    }
    unreachable!("face ids are bounded by face_count");
}

/// (start, end) corner pairs of the edges along an axis, in grading order
pub(crate) fn axis_edges(dim: usize, axis: usize) -> &'static [[usize; 2]] {
    match dim {
        2 => &QUAD_EDGES[axis],
        3 => &HEXA_EDGES[axis],
        _ => unreachable!("dimension is validated on construction"),
    }
}

/// Canonical corner index feeding each ndelement basis function
pub(crate) fn basis_corners(dim: usize) -> &'static [usize] {
    match dim {
        2 => &QUAD_BASIS_CORNERS,
        3 => &HEXA_BASIS_CORNERS,
        _ => unreachable!("dimension is validated on construction"),
    }
}
