//! Structured block meshes refined into distributed unstructured grids.
//!
//! `blockgrid` turns a coarse description of a domain — a handful of
//! curvilinear "blocks" glued together at shared corner points — into a
//! fully refined mesh of quadrilateral (2D) or hexahedral (3D) cells with a
//! consistent global node numbering across the ranks of a parallel run.
//!
//! ## Describing a domain
//!
//! A [BlockTopology] is built from a shared cloud of corner points. Each
//! block references `2^D` of them in canonical order (counter-clockwise,
//! bottom quad before top quad in 3D) and carries the number of cells along
//! each of its axes plus one expansion ratio per edge. Two blocks are glued
//! wherever they reference the same corner points for a face; there is no
//! separate interface description.
//!
//! ```
//! use blockgrid::{BlockTopology, MeshGenerator, SerialComm};
//!
//! let mut topology = BlockTopology::<f64>::new(2).unwrap();
//! topology.add_point(&[0.0, 0.0]).unwrap();
//! topology.add_point(&[1.0, 0.0]).unwrap();
//! topology.add_point(&[1.0, 1.0]).unwrap();
//! topology.add_point(&[0.0, 1.0]).unwrap();
//!
//! // 4 x 4 cells; both eta edges pack the cells towards the bottom wall
//! topology
//!     .add_block(&[0, 1, 2, 3], &[4, 4], &[1.0, 1.0, 2.0, 2.0])
//!     .unwrap();
//! topology.add_patch("wall", &[0, 1]).unwrap();
//!
//! let mesh = MeshGenerator::new(&topology).generate(&SerialComm).unwrap();
//! assert_eq!(mesh.node_count(), 25);
//! assert_eq!(mesh.cell_count(), 16);
//! assert_eq!(mesh.patch("wall").unwrap().face_count(), 4);
//! // the three remaining sides fall into the default patch
//! assert_eq!(mesh.patch("default").unwrap().face_count(), 12);
//! ```
//!
//! ## Running in parallel
//!
//! Every rank passes the *same* topology to the generator together with a
//! [Collective](parallel::Collective) communicator (the `mpi` feature
//! provides one backed by rsmpi). Blocks are assigned to ranks by a
//! contiguous block distribution; [partition_blocks] rewrites a topology
//! into a balanced equivalent, splitting blocks mid-grading where layer
//! boundaries do not line up, and `generate` does so automatically when no
//! distribution was set. Each rank receives its own cells and coordinates,
//! with ghost nodes appended after the owned nodes and global ids and
//! ownership recorded per node and per element.
//!
//! Because all ranks derive the numbering from the same topology with the
//! same deterministic rules, the base mesh needs no communication beyond a
//! single all-gather for the global element ids.

#![cfg_attr(feature = "strict", deny(warnings), deny(unused_crate_dependencies))]
#![warn(missing_docs)]

pub mod error;
mod geometry;
pub mod grading;
pub mod grid;
#[cfg(feature = "serde")]
pub mod io;
pub mod parallel;
pub mod partition;
pub mod shapes;
pub mod topology;
pub mod types;

pub use error::{MeshError, MeshResult};
pub use grid::builder::MeshGenerator;
pub use grid::{Mesh, MeshPatch};
pub use parallel::{Collective, SerialComm};
pub use partition::partition_blocks;
pub use topology::BlockTopology;
