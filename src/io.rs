//! Topology file input and output.
//!
//! The on-disk form is a RON dictionary mirroring the topology tables, plus
//! a `scaling_factor` that is applied uniformly to the points at load time.

use crate::{
    error::{MeshError, MeshResult},
    topology::BlockTopology,
    types::RealScalar,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Serialize, Deserialize)]
struct TopologyFile<T> {
    dimension: usize,
    scaling_factor: T,
    points: Vec<Vec<T>>,
    block_corners: Vec<Vec<usize>>,
    block_segments: Vec<Vec<usize>>,
    block_gradings: Vec<Vec<T>>,
    patches: Vec<(String, Vec<usize>)>,
    block_distribution: Option<Vec<usize>>,
}

/// Parse a topology from a RON dictionary
pub fn from_ron_str<T: RealScalar + DeserializeOwned>(input: &str) -> MeshResult<BlockTopology<T>> {
    let file: TopologyFile<T> = ron::from_str(input).map_err(|e| MeshError::InvalidFormat {
        message: e.to_string(),
    })?;

    let mut topology = BlockTopology::new(file.dimension)?;
    for point in &file.points {
        if point.len() != file.dimension {
            return Err(MeshError::InvalidFormat {
                message: format!(
                    "point with {} coordinates in a {}D topology",
                    point.len(),
                    file.dimension
                ),
            });
        }
        topology.add_point(point)?;
    }
    if file.block_corners.len() != file.block_segments.len()
        || file.block_corners.len() != file.block_gradings.len()
    {
        return Err(MeshError::InvalidFormat {
            message: String::from("block tables disagree on the number of blocks"),
        });
    }
    let nb_edges = file.dimension * (1 << (file.dimension - 1));
    for ((corners, segments), gradings) in file
        .block_corners
        .iter()
        .zip(&file.block_segments)
        .zip(&file.block_gradings)
    {
        if segments.len() != file.dimension {
            return Err(MeshError::InvalidFormat {
                message: String::from("segment row does not match the dimension"),
            });
        }
        if gradings.len() != nb_edges {
            return Err(MeshError::InvalidFormat {
                message: format!(
                    "grading row with {} entries, expected {nb_edges} for a {}D block",
                    gradings.len(),
                    file.dimension
                ),
            });
        }
        topology.add_block(corners, segments, gradings)?;
    }
    for (name, faces) in &file.patches {
        topology.add_patch(name, faces)?;
    }
    if let Some(distribution) = file.block_distribution {
        topology.set_distribution(distribution);
    }
    topology.scale_points(file.scaling_factor);
    Ok(topology)
}

/// Serialize a topology to a RON dictionary with a scaling factor of one
pub fn to_ron_string<T: RealScalar + Serialize>(topology: &BlockTopology<T>) -> String {
    let file = TopologyFile {
        dimension: topology.dim(),
        scaling_factor: T::one(),
        points: (0..topology.point_count())
            .map(|i| topology.point(i).to_vec())
            .collect(),
        block_corners: (0..topology.block_count())
            .map(|b| topology.block_corners(b).to_vec())
            .collect(),
        block_segments: (0..topology.block_count())
            .map(|b| topology.block_segments(b).to_vec())
            .collect(),
        block_gradings: (0..topology.block_count())
            .map(|b| topology.block_gradings(b).to_vec())
            .collect(),
        patches: topology
            .patches()
            .iter()
            .map(|p| {
                let faces = (0..p.face_count()).flat_map(|i| p.face(i).to_vec()).collect();
                (String::from(p.name()), faces)
            })
            .collect(),
        block_distribution: topology.distribution().map(<[usize]>::to_vec),
    };
    ron::to_string(&file).unwrap()
}

/// Load a topology from a RON file
pub fn read_topology<T: RealScalar + DeserializeOwned>(
    path: impl AsRef<Path>,
) -> MeshResult<BlockTopology<T>> {
    from_ron_str(&fs::read_to_string(path)?)
}

/// Store a topology as a RON file
pub fn write_topology<T: RealScalar + Serialize>(
    path: impl AsRef<Path>,
    topology: &BlockTopology<T>,
) -> MeshResult<()> {
    fs::write(path, to_ron_string(topology))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shapes::unit_square;
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip() {
        let mut t = unit_square::<f64>(4, 4);
        t.add_patch("south", &[0, 1]).unwrap();
        t.set_distribution(vec![0, 1]);

        let text = to_ron_string(&t);
        let back = from_ron_str::<f64>(&text).unwrap();
        assert_eq!(back.dim(), 2);
        assert_eq!(back.point_count(), 4);
        assert_eq!(back.block_count(), 1);
        assert_eq!(back.block_segments(0), &[4, 4]);
        assert_eq!(back.patches().len(), 1);
        assert_eq!(back.patches()[0].name(), "south");
        assert_eq!(back.distribution(), Some(&[0, 1][..]));
    }

    #[test]
    fn test_scaling_factor() {
        let text = "(dimension: 2, scaling_factor: 0.001, \
                    points: [[0.0, 0.0], [1000.0, 0.0], [1000.0, 1000.0], [0.0, 1000.0]], \
                    block_corners: [[0, 1, 2, 3]], block_segments: [[2, 2]], \
                    block_gradings: [[1.0, 1.0, 1.0, 1.0]], patches: [], \
                    block_distribution: None)";
        let t = from_ron_str::<f64>(text).unwrap();
        assert_relative_eq!(t.point(1)[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.point(2)[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            from_ron_str::<f64>("(nonsense"),
            Err(MeshError::InvalidFormat { .. })
        ));
        // 3 coordinates in a 2D topology
        let text = "(dimension: 2, scaling_factor: 1.0, points: [[0.0, 0.0, 0.0]], \
                    block_corners: [], block_segments: [], block_gradings: [], \
                    patches: [], block_distribution: None)";
        assert!(matches!(
            from_ron_str::<f64>(text),
            Err(MeshError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_short_grading_row() {
        // A 2D block needs 4 edge gradings; a short row must error out
        // instead of tearing down the process.
        let text = "(dimension: 2, scaling_factor: 1.0, \
                    points: [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]], \
                    block_corners: [[0, 1, 2, 3]], block_segments: [[2, 2]], \
                    block_gradings: [[1.0]], patches: [], \
                    block_distribution: None)";
        assert!(matches!(
            from_ron_str::<f64>(text),
            Err(MeshError::InvalidFormat { .. })
        ));
    }
}
