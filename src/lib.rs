// Constructive solid geometry cells for Monte Carlo particle transport
pub mod bounding_box;
pub mod cell;
pub mod config;
pub mod error;
pub mod geometry;
pub mod lattice;
pub mod neighbor_list;
pub mod region;
pub mod state;
pub mod surface;
pub mod universe;

pub use bounding_box::BoundingBox;
pub use cell::{Boundary, Cell, CellInstance, CellRegion, Fill, GeometryType, ParentCell};
pub use config::{Config, FP_COINCIDENT, FP_PRECISION, K_BOLTZMANN};
pub use error::{GeometryError, Result};
pub use geometry::{Geometry, Location};
pub use lattice::Lattice;
pub use neighbor_list::NeighborList;
pub use region::{CsgRegion, Token};
pub use state::{CellProperties, CellState};
pub use surface::{Surface, SurfaceKind, SurfaceSet};
pub use universe::Universe;
