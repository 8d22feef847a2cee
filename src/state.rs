use crate::cell::{Cell, Fill, GeometryType};
use crate::config::K_BOLTZMANN;
use crate::error::{GeometryError, Result};
use crate::geometry::Geometry;
use crate::region::CsgRegion;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Serializable description of a cell.
///
/// Region tokens are stored in infix order as raw integers, with operators
/// encoded as the reserved values at the top of the `i32` range.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub universe: usize,
    pub fill: Fill,
    pub geom_type: GeometryType,
    pub region: Vec<i32>,
    pub n_instances: usize,
    /// Temperatures in K, one shared value or one per instance
    pub temperatures: Vec<f64>,
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub rotation: Vec<f64>,
    #[serde(default)]
    pub offset: Vec<usize>,
}

/// Temperatures of one cell, as exchanged between runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellProperties {
    pub id: u32,
    pub temperatures: Vec<f64>,
}

impl CellState {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Cell {
    pub fn to_state(&self) -> CellState {
        CellState {
            id: self.cell_id,
            name: self.name.clone(),
            universe: self.universe,
            fill: self.fill.clone(),
            geom_type: self.geometry_type(),
            region: self.region.region_tokens(),
            n_instances: self.n_instances,
            temperatures: self
                .sqrt_kt
                .iter()
                .map(|s| s * s / K_BOLTZMANN)
                .collect(),
            translation: self.translation,
            rotation: self.rotation.clone(),
            offset: self.offset.clone(),
        }
    }

    /// Rebuild a cell from its state. Neighbor lists start empty and the
    /// distribcell index is assigned again when the geometry is built.
    pub fn from_state(state: &CellState) -> Result<Self> {
        let region = match state.geom_type {
            GeometryType::Csg => CsgRegion::from_raw(&state.region)?,
        };
        if !matches!(state.rotation.len(), 0 | 9 | 12) {
            return Err(GeometryError::State(format!(
                "cell {} has a rotation of length {}",
                state.id,
                state.rotation.len()
            )));
        }
        if state.temperatures.is_empty()
            || state.temperatures.iter().any(|t| !(*t >= 0.0 && t.is_finite()))
        {
            return Err(GeometryError::State(format!(
                "cell {} has invalid temperatures {:?}",
                state.id, state.temperatures
            )));
        }
        let mut cell = Cell::with_region(
            state.id,
            Arc::new(region),
            state.universe,
            state.fill.clone(),
            state.name.clone(),
        );
        cell.n_instances = state.n_instances;
        cell.translation = state.translation;
        cell.rotation = state.rotation.clone();
        cell.sqrt_kt = state
            .temperatures
            .iter()
            .map(|t| (K_BOLTZMANN * t).sqrt())
            .collect();
        cell.offset = state.offset.clone();
        Ok(cell)
    }

    pub fn export_properties(&self) -> CellProperties {
        CellProperties {
            id: self.cell_id,
            temperatures: self
                .sqrt_kt
                .iter()
                .map(|s| s * s / K_BOLTZMANN)
                .collect(),
        }
    }

    /// Load temperatures written by [`Cell::export_properties`]. The number
    /// of temperatures must match what the cell currently stores.
    pub fn import_properties(&mut self, properties: &CellProperties) -> Result<()> {
        if properties.id != self.cell_id {
            return Err(GeometryError::InvalidArgument(format!(
                "properties for cell {} cannot be applied to cell {}",
                properties.id, self.cell_id
            )));
        }
        if properties.temperatures.len() != self.sqrt_kt.len() {
            return Err(GeometryError::InvalidArgument(format!(
                "number of temperatures for cell {} doesn't match: expected {}, got {}",
                self.cell_id,
                self.sqrt_kt.len(),
                properties.temperatures.len()
            )));
        }
        self.sqrt_kt = properties
            .temperatures
            .iter()
            .map(|t| (K_BOLTZMANN * t).sqrt())
            .collect();
        Ok(())
    }
}

impl Geometry {
    /// Temperatures of every cell, serialized as JSON
    pub fn export_properties(&self) -> Result<String> {
        let properties: Vec<CellProperties> =
            self.cells.iter().map(Cell::export_properties).collect();
        Ok(serde_json::to_string_pretty(&properties)?)
    }

    /// Apply temperatures produced by [`Geometry::export_properties`].
    /// Nothing is written unless every entry applies cleanly.
    pub fn import_properties(&mut self, json: &str) -> Result<()> {
        let properties: Vec<CellProperties> = serde_json::from_str(json)?;
        let mut staged = self.cells.clone();
        for entry in &properties {
            let index = self.cell_index(entry.id)?;
            staged[index].import_properties(entry)?;
        }
        for (cell, updated) in self.cells.iter_mut().zip(staged) {
            cell.sqrt_kt = updated.sqrt_kt;
        }
        tracing::debug!(cells = properties.len(), "imported cell properties");
        Ok(())
    }
}
