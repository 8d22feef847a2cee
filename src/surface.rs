use crate::bounding_box::BoundingBox;
use crate::config::FP_COINCIDENT;

#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    pub surface_id: usize,
    pub kind: SurfaceKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceKind {
    /// ax + by + cz - d = 0
    Plane { a: f64, b: f64, c: f64, d: f64 },
    Sphere {
        x0: f64,
        y0: f64,
        z0: f64,
        radius: f64,
    },
    /// Infinite cylinder, `axis` is kept normalised
    Cylinder {
        axis: [f64; 3],
        origin: [f64; 3],
        radius: f64,
    },
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Component of `v` perpendicular to the unit vector `axis`
fn reject(v: [f64; 3], axis: [f64; 3]) -> [f64; 3] {
    let along = dot(v, axis);
    [
        v[0] - along * axis[0],
        v[1] - along * axis[1],
        v[2] - along * axis[2],
    ]
}

/// Index of the coordinate axis `v` points along, if any
fn aligned_axis(v: [f64; 3]) -> Option<usize> {
    let mut found = None;
    for (i, component) in v.iter().enumerate() {
        if *component != 0.0 {
            if found.is_some() {
                return None;
            }
            found = Some(i);
        }
    }
    found
}

/// Roots of a*t^2 + 2*k*t + c = 0 seen from a point with value `c`.
/// Returns the first positive crossing, honouring the coincident case.
fn quadratic_distance(a: f64, k: f64, c: f64, coincident: bool) -> Option<f64> {
    if a == 0.0 {
        return None;
    }
    let quad = k * k - a * c;
    if quad < 0.0 {
        return None;
    }
    if coincident || c.abs() < FP_COINCIDENT {
        // On the surface: only the far root counts, and only when heading inward
        if k >= 0.0 {
            None
        } else {
            Some((-k + quad.sqrt()) / a)
        }
    } else if c < 0.0 {
        Some((-k + quad.sqrt()) / a)
    } else {
        let d = (-k - quad.sqrt()) / a;
        if d < 0.0 {
            None
        } else {
            Some(d)
        }
    }
}

impl Surface {
    pub fn new_plane(a: f64, b: f64, c: f64, d: f64, surface_id: usize) -> Self {
        Surface {
            surface_id,
            kind: SurfaceKind::Plane { a, b, c, d },
        }
    }

    pub fn new_sphere(x0: f64, y0: f64, z0: f64, radius: f64, surface_id: usize) -> Self {
        Surface {
            surface_id,
            kind: SurfaceKind::Sphere { x0, y0, z0, radius },
        }
    }

    pub fn new_cylinder(axis: [f64; 3], origin: [f64; 3], radius: f64, surface_id: usize) -> Self {
        let norm = dot(axis, axis).sqrt();
        let axis = if norm > 0.0 {
            [axis[0] / norm, axis[1] / norm, axis[2] / norm]
        } else {
            axis
        };
        Surface {
            surface_id,
            kind: SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            },
        }
    }

    pub fn x_plane(x0: f64, surface_id: usize) -> Self {
        Self::new_plane(1.0, 0.0, 0.0, x0, surface_id)
    }

    pub fn y_plane(y0: f64, surface_id: usize) -> Self {
        Self::new_plane(0.0, 1.0, 0.0, y0, surface_id)
    }

    pub fn z_plane(z0: f64, surface_id: usize) -> Self {
        Self::new_plane(0.0, 0.0, 1.0, z0, surface_id)
    }

    pub fn x_cylinder(y0: f64, z0: f64, radius: f64, surface_id: usize) -> Self {
        Self::new_cylinder([1.0, 0.0, 0.0], [0.0, y0, z0], radius, surface_id)
    }

    pub fn y_cylinder(x0: f64, z0: f64, radius: f64, surface_id: usize) -> Self {
        Self::new_cylinder([0.0, 1.0, 0.0], [x0, 0.0, z0], radius, surface_id)
    }

    /// Create a cylinder oriented along the Z axis, centered at (x0, y0)
    pub fn z_cylinder(x0: f64, y0: f64, radius: f64, surface_id: usize) -> Self {
        Self::new_cylinder([0.0, 0.0, 1.0], [x0, y0, 0.0], radius, surface_id)
    }

    /// Signed surface function: negative inside, positive outside
    pub fn evaluate(&self, point: [f64; 3]) -> f64 {
        match &self.kind {
            SurfaceKind::Plane { a, b, c, d } => a * point[0] + b * point[1] + c * point[2] - d,
            SurfaceKind::Sphere { x0, y0, z0, radius } => {
                let v = sub(point, [*x0, *y0, *z0]);
                dot(v, v).sqrt() - radius
            }
            SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            } => {
                let m = reject(sub(point, *origin), *axis);
                dot(m, m).sqrt() - radius
            }
        }
    }

    /// Outward normal (not normalised) at `point`
    pub fn normal(&self, point: [f64; 3]) -> [f64; 3] {
        match &self.kind {
            SurfaceKind::Plane { a, b, c, .. } => [*a, *b, *c],
            SurfaceKind::Sphere { x0, y0, z0, .. } => sub(point, [*x0, *y0, *z0]),
            SurfaceKind::Cylinder { axis, origin, .. } => reject(sub(point, *origin), *axis),
        }
    }

    /// Which side of the surface the point is on; true is the positive half-space.
    /// Points within `FP_COINCIDENT` of the surface take the side `direction` heads toward.
    pub fn sense(&self, point: [f64; 3], direction: [f64; 3]) -> bool {
        let f = self.evaluate(point);
        if f.abs() < FP_COINCIDENT {
            return dot(direction, self.normal(point)) > 0.0;
        }
        f > 0.0
    }

    /// Distance along `direction` to the next crossing of this surface.
    /// `coincident` marks the point as lying on the surface already, which
    /// rules out a crossing at zero distance.
    pub fn distance(&self, point: [f64; 3], direction: [f64; 3], coincident: bool) -> Option<f64> {
        match &self.kind {
            SurfaceKind::Plane { a, b, c, .. } => {
                let f = self.evaluate(point);
                let projection = a * direction[0] + b * direction[1] + c * direction[2];
                if coincident || f.abs() < FP_COINCIDENT || projection == 0.0 {
                    return None;
                }
                let t = -f / projection;
                if t < 0.0 {
                    None
                } else {
                    Some(t)
                }
            }
            SurfaceKind::Sphere { x0, y0, z0, radius } => {
                let oc = sub(point, [*x0, *y0, *z0]);
                let a = dot(direction, direction);
                let k = dot(oc, direction);
                let c = dot(oc, oc) - radius * radius;
                quadratic_distance(a, k, c, coincident)
            }
            SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            } => {
                let d = reject(direction, *axis);
                let m = reject(sub(point, *origin), *axis);
                let a = dot(d, d);
                if a.abs() < 1e-24 {
                    // Travelling parallel to the axis
                    return None;
                }
                let k = dot(m, d);
                let c = dot(m, m) - radius * radius;
                quadratic_distance(a, k, c, coincident)
            }
        }
    }

    /// Bounding box of one half-space of this surface.
    /// `positive` selects the half-space where `evaluate` is positive.
    ///
    /// Finite faces are pushed out by the `FP_COINCIDENT` band, since
    /// `sense` may place a point within that band on either side.
    pub fn bounding_box(&self, positive: bool) -> BoundingBox {
        match &self.kind {
            SurfaceKind::Plane { a, b, c, d } => {
                let normal = [*a, *b, *c];
                let Some(axis) = aligned_axis(normal) else {
                    return BoundingBox::infinite();
                };
                let value = d / normal[axis];
                let pad = FP_COINCIDENT / normal[axis].abs();
                let mut lower = [f64::NEG_INFINITY; 3];
                let mut upper = [f64::INFINITY; 3];
                // A negative normal component flips which side is "above"
                if positive == (normal[axis] > 0.0) {
                    lower[axis] = value - pad;
                } else {
                    upper[axis] = value + pad;
                }
                BoundingBox::new(lower, upper)
            }
            SurfaceKind::Sphere { x0, y0, z0, radius } => {
                if positive {
                    BoundingBox::infinite()
                } else {
                    let r = radius + FP_COINCIDENT;
                    BoundingBox::new([x0 - r, y0 - r, z0 - r], [x0 + r, y0 + r, z0 + r])
                }
            }
            SurfaceKind::Cylinder {
                axis,
                origin,
                radius,
            } => match aligned_axis(*axis) {
                Some(along) if !positive => {
                    let mut lower = [0.0; 3];
                    let mut upper = [0.0; 3];
                    for i in 0..3 {
                        if i == along {
                            lower[i] = f64::NEG_INFINITY;
                            upper[i] = f64::INFINITY;
                        } else {
                            lower[i] = origin[i] - radius - FP_COINCIDENT;
                            upper[i] = origin[i] + radius + FP_COINCIDENT;
                        }
                    }
                    BoundingBox::new(lower, upper)
                }
                _ => BoundingBox::infinite(),
            },
        }
    }
}

/// Lookup of half-space primitives by position in the surface arena.
///
/// Regions hold only signed indices; every query goes through this trait so
/// the same region can be evaluated against different surface storage.
pub trait SurfaceSet {
    fn sense(&self, index: usize, point: [f64; 3], direction: [f64; 3]) -> bool;

    fn distance(
        &self,
        index: usize,
        point: [f64; 3],
        direction: [f64; 3],
        coincident: bool,
    ) -> Option<f64>;

    fn bounding_box(&self, index: usize, positive: bool) -> BoundingBox;
}

impl SurfaceSet for [Surface] {
    fn sense(&self, index: usize, point: [f64; 3], direction: [f64; 3]) -> bool {
        self[index].sense(point, direction)
    }

    fn distance(
        &self,
        index: usize,
        point: [f64; 3],
        direction: [f64; 3],
        coincident: bool,
    ) -> Option<f64> {
        self[index].distance(point, direction, coincident)
    }

    fn bounding_box(&self, index: usize, positive: bool) -> BoundingBox {
        self[index].bounding_box(positive)
    }
}

impl SurfaceSet for Vec<Surface> {
    fn sense(&self, index: usize, point: [f64; 3], direction: [f64; 3]) -> bool {
        self.as_slice().sense(index, point, direction)
    }

    fn distance(
        &self,
        index: usize,
        point: [f64; 3],
        direction: [f64; 3],
        coincident: bool,
    ) -> Option<f64> {
        SurfaceSet::distance(self.as_slice(), index, point, direction, coincident)
    }

    fn bounding_box(&self, index: usize, positive: bool) -> BoundingBox {
        SurfaceSet::bounding_box(self.as_slice(), index, positive)
    }
}
