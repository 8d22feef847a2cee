/// Axis-aligned box, possibly unbounded along any axis.
///
/// An empty box is represented with `lower_left` at +inf and `upper_right`
/// at -inf so that it is the identity for [`BoundingBox::union`].
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub lower_left: [f64; 3],
    pub upper_right: [f64; 3],
    pub center: [f64; 3],
    pub width: [f64; 3],
}

impl BoundingBox {
    pub fn new(lower_left: [f64; 3], upper_right: [f64; 3]) -> Self {
        let center = [
            0.5 * (lower_left[0] + upper_right[0]),
            0.5 * (lower_left[1] + upper_right[1]),
            0.5 * (lower_left[2] + upper_right[2]),
        ];
        let width = [
            upper_right[0] - lower_left[0],
            upper_right[1] - lower_left[1],
            upper_right[2] - lower_left[2],
        ];
        BoundingBox {
            lower_left,
            upper_right,
            center,
            width,
        }
    }

    /// Box covering all of space
    pub fn infinite() -> Self {
        Self::new([f64::NEG_INFINITY; 3], [f64::INFINITY; 3])
    }

    pub fn empty() -> Self {
        Self::new([f64::INFINITY; 3], [f64::NEG_INFINITY; 3])
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.lower_left[i] > self.upper_right[i])
    }

    pub fn is_infinite(&self) -> bool {
        (0..3).any(|i| self.lower_left[i].is_infinite() || self.upper_right[i].is_infinite())
    }

    /// Smallest box contained in both boxes
    pub fn intersection(&self, other: &Self) -> Self {
        let mut lower = [0.0; 3];
        let mut upper = [0.0; 3];
        for i in 0..3 {
            lower[i] = self.lower_left[i].max(other.lower_left[i]);
            upper[i] = self.upper_right[i].min(other.upper_right[i]);
        }
        Self::new(lower, upper)
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut lower = [0.0; 3];
        let mut upper = [0.0; 3];
        for i in 0..3 {
            lower[i] = self.lower_left[i].min(other.lower_left[i]);
            upper[i] = self.upper_right[i].max(other.upper_right[i]);
        }
        Self::new(lower, upper)
    }

    /// Check whether a point lies inside the box (boundary included)
    pub fn contains(&self, point: [f64; 3]) -> bool {
        (0..3).all(|i| point[i] >= self.lower_left[i] && point[i] <= self.upper_right[i])
    }
}

// Unbounded boxes have NaN centers, so equality looks at the corners only
impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        self.lower_left == other.lower_left && self.upper_right == other.upper_right
    }
}

impl std::ops::BitAnd for &BoundingBox {
    type Output = BoundingBox;

    fn bitand(self, rhs: Self) -> BoundingBox {
        self.intersection(rhs)
    }
}

impl std::ops::BitOr for &BoundingBox {
    type Output = BoundingBox;

    fn bitor(self, rhs: Self) -> BoundingBox {
        self.union(rhs)
    }
}

/// Compare box corners allowing for the padding of half-space faces
#[cfg(test)]
pub(crate) fn assert_corners(bbox: &BoundingBox, lower: [f64; 3], upper: [f64; 3]) {
    let near = |a: f64, b: f64| a == b || (a - b).abs() < 1e-9;
    for i in 0..3 {
        assert!(near(bbox.lower_left[i], lower[i]), "lower {:?} != {:?}", bbox.lower_left, lower);
        assert!(near(bbox.upper_right[i], upper[i]), "upper {:?} != {:?}", bbox.upper_right, upper);
    }
}
