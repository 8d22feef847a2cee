use crate::bounding_box::BoundingBox;
use crate::config::{Config, K_BOLTZMANN};
use crate::error::{GeometryError, Result};
use crate::neighbor_list::NeighborList;
use crate::region::CsgRegion;
use crate::surface::SurfaceSet;
use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What occupies the interior of a cell
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    /// Material ids, either one shared entry or one per instance. `None` is void.
    Material(Vec<Option<u32>>),
    /// Index of the universe filling the cell
    Universe(usize),
    /// Index of the lattice filling the cell
    Lattice(usize),
}

impl Fill {
    pub fn is_material(&self) -> bool {
        matches!(self, Fill::Material(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    Csg,
}

/// Oncoming boundary of a cell along a ray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub distance: f64,
    /// Signed surface token of the half-space entered on crossing
    pub surface: i32,
}

/// Spatial representation behind a cell.
///
/// CSG regions are one implementation; other representations only have to
/// answer the same queries.
pub trait CellRegion: std::fmt::Debug + Send + Sync {
    fn geometry_type(&self) -> GeometryType;

    fn contains(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> bool;

    fn distance(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> Result<Option<Boundary>>;

    fn bounding_box(&self, surfaces: &dyn SurfaceSet) -> BoundingBox;

    /// Signed surface tokens referenced by the region
    fn halfspaces(&self) -> Vec<i32>;

    /// Raw tokens written to the state container
    fn region_tokens(&self) -> Vec<i32>;
}

impl CellRegion for CsgRegion {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Csg
    }

    fn contains(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> bool {
        CsgRegion::contains(self, point, direction, on_surface, surfaces)
    }

    fn distance(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> Result<Option<Boundary>> {
        let norm = Vector3::from(direction).norm();
        if !(norm > 0.0 && norm.is_finite()) {
            return Err(GeometryError::InvalidArgument(format!(
                "ray direction {:?} has no length",
                direction
            )));
        }
        Ok(CsgRegion::distance(self, point, direction, on_surface, surfaces)
            .map(|(distance, surface)| Boundary { distance, surface }))
    }

    fn bounding_box(&self, surfaces: &dyn SurfaceSet) -> BoundingBox {
        CsgRegion::bounding_box(self, surfaces)
    }

    fn halfspaces(&self) -> Vec<i32> {
        CsgRegion::halfspaces(self).collect()
    }

    fn region_tokens(&self) -> Vec<i32> {
        self.to_raw()
    }
}

/// One physical occurrence of a cell in the unrolled geometry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellInstance {
    pub index_cell: usize,
    pub instance: usize,
}

/// One link of an ancestry chain: an enclosing cell and, when that cell
/// holds a lattice, the flat index of the lattice element entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParentCell {
    pub cell_index: usize,
    pub lattice_index: Option<usize>,
}

/// A Cell represents a geometric region of one universe
///
/// Cells follow the OpenMC model:
/// - a region (boolean combination of surface half-spaces)
/// - a fill (material, nested universe or lattice)
/// - per-instance bookkeeping once the geometry has been unrolled
#[derive(Clone, Debug)]
pub struct Cell {
    pub cell_id: u32,
    pub name: Option<String>,
    /// Index of the universe this cell belongs to
    pub universe: usize,
    pub fill: Fill,
    pub region: Arc<dyn CellRegion>,
    /// Number of distinct physical occurrences, set when the geometry is built
    pub n_instances: usize,
    /// Row of the distribcell offset tables, shared by every cell of the
    /// same universe
    pub distribcell_index: Option<usize>,
    /// Translation applied to the filling universe
    pub translation: [f64; 3],
    /// Row-major rotation matrix, optionally followed by the Euler angles
    pub(crate) rotation: Vec<f64>,
    /// sqrt(k_B * T) in sqrt(eV), one shared value or one per instance
    pub(crate) sqrt_kt: Vec<f64>,
    /// Distribcell offset table, indexed by distribcell index
    pub offset: Vec<usize>,
    pub neighbors: NeighborList,
}

impl Cell {
    /// Create a new CSG cell
    pub fn new(
        cell_id: u32,
        region: CsgRegion,
        universe: usize,
        fill: Fill,
        name: Option<String>,
    ) -> Self {
        Self::with_region(cell_id, Arc::new(region), universe, fill, name)
    }

    /// Create a cell around any region representation
    pub fn with_region(
        cell_id: u32,
        region: Arc<dyn CellRegion>,
        universe: usize,
        fill: Fill,
        name: Option<String>,
    ) -> Self {
        let temperature = Config::global().default_temperature;
        Cell {
            cell_id,
            name,
            universe,
            fill,
            region,
            n_instances: 0,
            distribcell_index: None,
            translation: [0.0; 3],
            rotation: Vec::new(),
            sqrt_kt: vec![(K_BOLTZMANN * temperature).sqrt()],
            offset: Vec::new(),
            neighbors: NeighborList::new(),
        }
    }

    pub fn geometry_type(&self) -> GeometryType {
        self.region.geometry_type()
    }

    /// Check if a point is inside this cell's region
    pub fn contains(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> bool {
        self.region.contains(point, direction, on_surface, surfaces)
    }

    /// Find the oncoming boundary of this cell
    pub fn distance(
        &self,
        point: [f64; 3],
        direction: [f64; 3],
        on_surface: i32,
        surfaces: &dyn SurfaceSet,
    ) -> Result<Option<Boundary>> {
        self.region.distance(point, direction, on_surface, surfaces)
    }

    pub fn bounding_box(&self, surfaces: &dyn SurfaceSet) -> BoundingBox {
        self.region.bounding_box(surfaces)
    }

    /// Material filling the given instance
    pub fn material(&self, instance: usize) -> Option<u32> {
        match &self.fill {
            Fill::Material(materials) if materials.len() == 1 => materials[0],
            Fill::Material(materials) => materials.get(instance).copied().flatten(),
            _ => None,
        }
    }

    /// Temperature of a cell instance in K. `None` returns the first
    /// instance's temperature as a representative value.
    pub fn temperature(&self, instance: Option<usize>) -> Result<f64> {
        let missing = |i: usize| {
            GeometryError::NotFound(format!(
                "cell {} has no instance {} ({} instances)",
                self.cell_id, i, self.n_instances
            ))
        };
        let sqrt_kt = match instance {
            Some(i) if i >= self.n_instances => return Err(missing(i)),
            Some(i) if self.sqrt_kt.len() > 1 => {
                *self.sqrt_kt.get(i).ok_or_else(|| missing(i))?
            }
            _ => self.sqrt_kt[0],
        };
        Ok(sqrt_kt * sqrt_kt / K_BOLTZMANN)
    }

    /// Stored sqrt(k_B T) values in sqrt(eV)
    pub fn sqrt_kt(&self) -> &[f64] {
        &self.sqrt_kt
    }

    /// Set the temperature of one instance, or of every instance when
    /// `instance` is `None`. Only material-filled cells carry temperatures;
    /// see `Geometry::set_temperature` for cells filled with universes.
    pub fn set_temperature(&mut self, temperature: f64, instance: Option<usize>) -> Result<()> {
        Config::global().check_temperature(temperature)?;
        if !self.fill.is_material() {
            return Err(GeometryError::InvalidArgument(format!(
                "attempted to set the temperature of cell {} which is not filled by a material",
                self.cell_id
            )));
        }
        let value = (K_BOLTZMANN * temperature).sqrt();
        match instance {
            Some(i) => {
                if i >= self.n_instances {
                    return Err(GeometryError::NotFound(format!(
                        "cell {} has no instance {} ({} instances)",
                        self.cell_id, i, self.n_instances
                    )));
                }
                if self.sqrt_kt.len() != self.n_instances {
                    let first = self.sqrt_kt[0];
                    self.sqrt_kt.resize(self.n_instances, first);
                }
                self.sqrt_kt[i] = value;
            }
            None => self.sqrt_kt.iter_mut().for_each(|t| *t = value),
        }
        Ok(())
    }

    fn require_filled(&self, what: &str) -> Result<()> {
        if self.fill.is_material() {
            return Err(GeometryError::InvalidArgument(format!(
                "cannot apply a {} to cell {} because it is not filled with another universe",
                what, self.cell_id
            )));
        }
        Ok(())
    }

    /// Set the rotation of the filling universe.
    ///
    /// Three values are Euler angles in degrees about x, y and z; nine values
    /// are a row-major matrix. Angles are stored as the derived matrix
    /// followed by the angles themselves.
    pub fn set_rotation(&mut self, rotation: &[f64]) -> Result<()> {
        self.require_filled("rotation")?;
        let values = match rotation.len() {
            3 => {
                let phi = -rotation[0].to_radians();
                let theta = -rotation[1].to_radians();
                let psi = -rotation[2].to_radians();
                let rotation_matrix = Rotation3::from_euler_angles(phi, theta, psi);
                let matrix = rotation_matrix.matrix();
                let mut values = Vec::with_capacity(12);
                for i in 0..3 {
                    for j in 0..3 {
                        values.push(matrix[(i, j)]);
                    }
                }
                values.extend_from_slice(rotation);
                values
            }
            9 => rotation.to_vec(),
            n => {
                return Err(GeometryError::InvalidArgument(format!(
                    "non-3D rotation vector of length {} applied to cell {}",
                    n, self.cell_id
                )))
            }
        };
        self.rotation = values;
        Ok(())
    }

    /// Stored rotation: empty, a 9-entry matrix, or matrix plus angles
    pub fn rotation(&self) -> &[f64] {
        &self.rotation
    }

    pub fn rotation_matrix(&self) -> Option<Matrix3<f64>> {
        if self.rotation.len() < 9 {
            return None;
        }
        Some(Matrix3::from_row_slice(&self.rotation[..9]))
    }

    pub fn set_translation(&mut self, translation: [f64; 3]) -> Result<()> {
        self.require_filled("translation")?;
        self.translation = translation;
        Ok(())
    }

    /// Transform a position and direction into the filling universe's frame
    pub fn to_local(&self, point: [f64; 3], direction: [f64; 3]) -> ([f64; 3], [f64; 3]) {
        let shifted = Vector3::from(point) - Vector3::from(self.translation);
        match self.rotation_matrix() {
            Some(matrix) => {
                let r = matrix * shifted;
                let u = matrix * Vector3::from(direction);
                ([r.x, r.y, r.z], [u.x, u.y, u.z])
            }
            None => ([shifted.x, shifted.y, shifted.z], direction),
        }
    }
}
