use crate::error::{GeometryError, Result};

/// Rectangular lattice of universes.
///
/// Elements are stored flat with x varying fastest, then y, then z. A lattice
/// with a single z layer is treated as 2D and leaves z untouched.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    pub lattice_id: u32,
    pub lower_left: [f64; 3],
    pub pitch: [f64; 3],
    pub shape: [usize; 3],
    /// Universe index of each element
    pub universes: Vec<usize>,
    /// Distribcell offsets, `offsets[distribcell][element]`
    pub offsets: Vec<Vec<usize>>,
}

impl Lattice {
    pub fn new(
        lattice_id: u32,
        lower_left: [f64; 3],
        pitch: [f64; 3],
        shape: [usize; 3],
        universes: Vec<usize>,
    ) -> Result<Self> {
        let expected = shape[0] * shape[1] * shape[2];
        if expected == 0 || universes.len() != expected {
            return Err(GeometryError::Construction(format!(
                "lattice {} has shape {:?} but {} universes",
                lattice_id,
                shape,
                universes.len()
            )));
        }
        if pitch.iter().any(|p| !(*p > 0.0)) {
            return Err(GeometryError::Construction(format!(
                "lattice {} has non-positive pitch {:?}",
                lattice_id, pitch
            )));
        }
        Ok(Lattice {
            lattice_id,
            lower_left,
            pitch,
            shape,
            universes,
            offsets: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.universes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.universes.is_empty()
    }

    fn is_2d(&self) -> bool {
        self.shape[2] == 1
    }

    pub fn flat_index(&self, indices: [usize; 3]) -> usize {
        indices[0] + self.shape[0] * (indices[1] + self.shape[1] * indices[2])
    }

    /// Lattice element containing `point`, if it lies within the lattice
    pub fn get_indices(&self, point: [f64; 3]) -> Option<[usize; 3]> {
        let mut indices = [0usize; 3];
        let axes = if self.is_2d() { 2 } else { 3 };
        for i in 0..axes {
            let position = ((point[i] - self.lower_left[i]) / self.pitch[i]).floor();
            if !(position >= 0.0 && position < self.shape[i] as f64) {
                return None;
            }
            indices[i] = position as usize;
        }
        Some(indices)
    }

    /// Position of `point` relative to the center of element `indices`
    pub fn local_position(&self, point: [f64; 3], indices: [usize; 3]) -> [f64; 3] {
        let mut local = point;
        let axes = if self.is_2d() { 2 } else { 3 };
        for i in 0..axes {
            local[i] = point[i]
                - (self.lower_left[i] + (indices[i] as f64 + 0.5) * self.pitch[i]);
        }
        local
    }

    /// Flat index and local position of the element containing `point`
    pub fn find_element(&self, point: [f64; 3]) -> Option<(usize, [f64; 3])> {
        let indices = self.get_indices(point)?;
        Some((self.flat_index(indices), self.local_position(point, indices)))
    }

    pub fn offset(&self, distribcell: usize, element: usize) -> usize {
        self.offsets
            .get(distribcell)
            .and_then(|row| row.get(element))
            .copied()
            .unwrap_or(0)
    }
}
