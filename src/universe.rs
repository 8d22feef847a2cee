use crate::cell::Cell;
use crate::surface::SurfaceSet;

/// A universe is an ordered set of cells that together tile space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Universe {
    pub universe_id: u32,
    /// Indices of member cells, in the order they were defined
    pub cells: Vec<usize>,
}

impl Universe {
    pub fn new(universe_id: u32) -> Self {
        Universe {
            universe_id,
            cells: Vec::new(),
        }
    }

    /// First member cell containing the point, or None if not found
    pub fn find_cell(
        &self,
        cells: &[Cell],
        surfaces: &dyn SurfaceSet,
        point: [f64; 3],
        direction: [f64; 3],
    ) -> Option<usize> {
        self.cells
            .iter()
            .copied()
            .find(|&i| cells[i].contains(point, direction, 0, surfaces))
    }
}
