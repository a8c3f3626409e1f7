use serde::Serialize;

use crate::error::{GeometryError, Result};
use crate::math::quadratic::solve_half_quadratic;
use crate::math::{surface_tolerance, Aabb, Point3, Vector3, TOLERANCE};

use super::{classify_excess, tangent_escape, Intersection, PointClassification, Solid};

/// A cylinder along the local z axis, optionally hollow.
#[derive(Debug, Clone, Serialize)]
pub struct Tube {
    inner_radius: f64,
    outer_radius: f64,
    half_length: f64,
    #[serde(skip)]
    tol: f64,
}

impl Tube {
    /// Creates a tube from its radii and half-length along z.
    ///
    /// # Errors
    ///
    /// Returns an error if `outer_radius` or `half_length` is not positive,
    /// or `inner_radius` is outside `[0, outer_radius)`.
    pub fn new(inner_radius: f64, outer_radius: f64, half_length: f64) -> Result<Self> {
        for (parameter, value) in [("outer_radius", outer_radius), ("half_length", half_length)] {
            if value.is_nan() || value <= TOLERANCE {
                return Err(GeometryError::ParameterOutOfRange {
                    parameter,
                    value,
                    min: TOLERANCE,
                    max: f64::INFINITY,
                }
                .into());
            }
        }
        if inner_radius.is_nan() || inner_radius < 0.0 || inner_radius >= outer_radius - TOLERANCE
        {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "inner_radius",
                value: inner_radius,
                min: 0.0,
                max: outer_radius,
            }
            .into());
        }
        Ok(Self {
            inner_radius,
            outer_radius,
            half_length,
            tol: surface_tolerance(outer_radius.max(half_length)),
        })
    }

    /// Creates a solid cylinder.
    ///
    /// # Errors
    ///
    /// See [`Tube::new`].
    pub fn cylinder(radius: f64, half_length: f64) -> Result<Self> {
        Self::new(0.0, radius, half_length)
    }

    #[must_use]
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    #[must_use]
    pub fn half_length(&self) -> f64 {
        self.half_length
    }

    pub(crate) fn scaled(&self, factor: f64) -> Self {
        let outer_radius = self.outer_radius * factor;
        let half_length = self.half_length * factor;
        Self {
            inner_radius: self.inner_radius * factor,
            outer_radius,
            half_length,
            tol: surface_tolerance(outer_radius.max(half_length)),
        }
    }

    fn has_bore(&self) -> bool {
        self.inner_radius > 0.0
    }

    /// Constraint violations: (outer radial, inner radial, axial).
    fn excess(&self, point: &Point3) -> [f64; 3] {
        let r = point.x.hypot(point.y);
        let inner = if self.has_bore() {
            self.inner_radius - r
        } else {
            f64::NEG_INFINITY
        };
        [r - self.outer_radius, inner, point.z.abs() - self.half_length]
    }

    fn max_excess(&self, point: &Point3) -> f64 {
        self.excess(point).into_iter().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Roots of `x(t)^2 + y(t)^2 = radius^2`; `None` for rays parallel to z.
    fn radial_roots(point: &Point3, dir: &Vector3, radius: f64) -> Option<(f64, f64)> {
        let a = dir.x * dir.x + dir.y * dir.y;
        if a < f64::MIN_POSITIVE {
            return None;
        }
        let b = point.x * dir.x + point.y * dir.y;
        let c = point.x * point.x + point.y * point.y - radius * radius;
        solve_half_quadratic(a, b, c)
    }

    fn within_length(&self, z: f64) -> bool {
        z.abs() <= self.half_length + self.tol
    }

    /// Exit distance for a ray tangent to the outer wall at `point`, or
    /// zero when the ray is not tangent there.
    fn outer_tangent_escape(&self, point: &Point3, dir: &Vector3) -> f64 {
        let r = point.x.hypot(point.y);
        let transverse = dir.x.hypot(dir.y);
        if transverse < f64::MIN_POSITIVE || (r - self.outer_radius).abs() > self.tol {
            return 0.0;
        }
        if (point.x * dir.x + point.y * dir.y).abs() > TOLERANCE * r {
            return 0.0;
        }
        tangent_escape(self.outer_radius, transverse, self.tol)
    }
}

impl Solid for Tube {
    fn classify(&self, point: &Point3) -> PointClassification {
        classify_excess(self.max_excess(point), self.tol)
    }

    fn outward_normal(&self, point: &Point3) -> Vector3 {
        let excess = self.excess(point);
        let r = point.x.hypot(point.y);
        let radial = if r < f64::MIN_POSITIVE {
            Vector3::x()
        } else {
            Vector3::new(point.x / r, point.y / r, 0.0)
        };
        let axial = Vector3::new(0.0, 0.0, 1.0_f64.copysign(point.z));
        let nearest = (0..3)
            .max_by(|&i, &j| excess[i].total_cmp(&excess[j]))
            .unwrap_or(0);
        match nearest {
            0 => radial,
            1 => -radial,
            _ => axial,
        }
    }

    fn distance_to_in(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        if self.classify(point) == PointClassification::Inside {
            return Intersection::capped(0.0, max_distance);
        }
        let mut best = f64::INFINITY;

        // End caps: only the face the ray approaches from outside
        if dir.z.abs() >= f64::MIN_POSITIVE {
            let face = -self.half_length.copysign(dir.z);
            let t = (face - point.z) / dir.z;
            if t >= -self.tol {
                let hit = point + dir * t;
                let r = hit.x.hypot(hit.y);
                if r <= self.outer_radius + self.tol && r >= self.inner_radius - self.tol {
                    best = best.min(t);
                }
            }
        }

        // Outer wall, entered at the near root
        if let Some((t1, t2)) = Self::radial_roots(point, dir, self.outer_radius) {
            if t2 - t1 > self.tol && t1 >= -self.tol && self.within_length(point.z + t1 * dir.z) {
                best = best.min(t1);
            }
        }

        // Inner wall, entered when leaving the bore at the far root
        if self.has_bore() {
            if let Some((t1, t2)) = Self::radial_roots(point, dir, self.inner_radius) {
                if t2 - t1 > self.tol && t2 >= -self.tol && self.within_length(point.z + t2 * dir.z)
                {
                    best = best.min(t2);
                }
            }
        }

        if best.is_finite() {
            Intersection::capped(best, max_distance)
        } else {
            Intersection::miss(max_distance)
        }
    }

    fn distance_to_out(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        let mut t = f64::INFINITY;
        if dir.z.abs() >= f64::MIN_POSITIVE {
            t = t.min((self.half_length.copysign(dir.z) - point.z) / dir.z);
        }
        let escape = self.outer_tangent_escape(point, dir);
        match Self::radial_roots(point, dir, self.outer_radius) {
            Some((_, t2)) => t = t.min(t2.max(escape)),
            None if escape > 0.0 => t = t.min(escape),
            None => {}
        }
        if self.has_bore() {
            if let Some((t1, t2)) = Self::radial_roots(point, dir, self.inner_radius) {
                if t2 - t1 > self.tol && t2 > self.tol {
                    t = t.min(t1);
                }
            }
        }
        Intersection::capped(t, max_distance)
    }

    fn safety_to_in(&self, point: &Point3) -> f64 {
        self.max_excess(point).max(0.0)
    }

    fn safety_to_out(&self, point: &Point3) -> f64 {
        (-self.max_excess(point)).max(0.0)
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::symmetric(&Vector3::new(
            self.outer_radius,
            self.outer_radius,
            self.half_length,
        ))
    }
}
