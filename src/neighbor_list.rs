use std::sync::RwLock;

/// Cells in the same universe that particles have been seen to cross into.
///
/// The list only ever grows and pushing an entry twice is a no-op, so
/// concurrent first-use from many particles is safe. It is a search hint and
/// never the authority on where a point is.
#[derive(Debug, Default)]
pub struct NeighborList {
    cells: RwLock<Vec<usize>>,
}

impl NeighborList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a neighboring cell index if it is not already present
    pub fn push(&self, cell: usize) {
        if self.contains(cell) {
            return;
        }
        let mut cells = self
            .cells
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another thread may have added it between the read and the write
        if !cells.contains(&cell) {
            cells.push(cell);
        }
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.cells
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(&cell)
    }

    /// Copy of the current entries in insertion order
    pub fn snapshot(&self) -> Vec<usize> {
        self.cells
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.cells
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.cells
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Clone for NeighborList {
    fn clone(&self) -> Self {
        NeighborList {
            cells: RwLock::new(self.snapshot()),
        }
    }
}
