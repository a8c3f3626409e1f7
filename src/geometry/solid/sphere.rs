use serde::Serialize;

use crate::error::{GeometryError, Result};
use crate::math::quadratic::solve_half_quadratic;
use crate::math::{surface_tolerance, Aabb, Point3, Vector3, TOLERANCE};

use super::{classify_excess, tangent_escape, Intersection, PointClassification, Solid};

/// A solid sphere, or a spherical shell when `inner_radius > 0`,
/// centered on the local origin.
#[derive(Debug, Clone, Serialize)]
pub struct Sphere {
    inner_radius: f64,
    outer_radius: f64,
    #[serde(skip)]
    tol: f64,
}

impl Sphere {
    /// Creates a solid sphere.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius is not positive.
    pub fn new(radius: f64) -> Result<Self> {
        Self::shell(0.0, radius)
    }

    /// Creates a spherical shell between two radii.
    ///
    /// # Errors
    ///
    /// Returns an error if `outer_radius` is not positive or `inner_radius`
    /// is outside `[0, outer_radius)`.
    pub fn shell(inner_radius: f64, outer_radius: f64) -> Result<Self> {
        if outer_radius.is_nan() || outer_radius < TOLERANCE {
            return Err(
                GeometryError::Degenerate("sphere radius must be positive".into()).into(),
            );
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
            tol: surface_tolerance(outer_radius),
        })
    }

    /// Returns the outer radius.
    #[must_use]
    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    /// Returns the inner radius (zero for a solid sphere).
    #[must_use]
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    pub(crate) fn scaled(&self, factor: f64) -> Self {
        Self {
            inner_radius: self.inner_radius * factor,
            outer_radius: self.outer_radius * factor,
            tol: surface_tolerance(self.outer_radius * factor),
        }
    }

    fn has_cavity(&self) -> bool {
        self.inner_radius > 0.0
    }

    /// Roots of `|p + t d| = radius`.
    fn roots(point: &Point3, dir: &Vector3, radius: f64) -> Option<(f64, f64)> {
        let b = point.coords.dot(dir);
        let c = point.coords.norm_squared() - radius * radius;
        solve_half_quadratic(dir.norm_squared(), b, c)
    }

    /// Signed violation of the radial constraints (positive outside).
    fn excess(&self, r: f64) -> f64 {
        let outer = r - self.outer_radius;
        if self.has_cavity() {
            outer.max(self.inner_radius - r)
        } else {
            outer
        }
    }
}

impl Solid for Sphere {
    fn classify(&self, point: &Point3) -> PointClassification {
        classify_excess(self.excess(point.coords.norm()), self.tol)
    }

    fn outward_normal(&self, point: &Point3) -> Vector3 {
        let r = point.coords.norm();
        if r < f64::MIN_POSITIVE {
            return Vector3::z();
        }
        let radial = point.coords / r;
        if self.has_cavity() && (r - self.inner_radius).abs() < (self.outer_radius - r).abs() {
            -radial
        } else {
            radial
        }
    }

    fn distance_to_in(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        let r = point.coords.norm();
        if self.has_cavity() && r <= self.inner_radius + self.tol {
            // Inside the cavity: the material starts where the ray leaves it
            return match Self::roots(point, dir, self.inner_radius) {
                Some((_, t_exit)) => Intersection::capped(t_exit, max_distance),
                None => Intersection::capped(0.0, max_distance),
            };
        }
        if r < self.outer_radius - self.tol {
            // Inside the material already
            return Intersection::capped(0.0, max_distance);
        }
        match Self::roots(point, dir, self.outer_radius) {
            // Tangent rays and rays moving away are misses
            Some((t_enter, t_exit)) if t_exit - t_enter > self.tol && t_exit > self.tol => {
                Intersection::capped(t_enter, max_distance)
            }
            _ => Intersection::miss(max_distance),
        }
    }

    fn distance_to_out(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        let mut t = match Self::roots(point, dir, self.outer_radius) {
            Some((_, t_exit)) => t_exit,
            None => 0.0,
        };
        let r = point.coords.norm();
        if (r - self.outer_radius).abs() <= self.tol
            && point.coords.dot(dir).abs() <= TOLERANCE * r
        {
            // Tangent to the outer surface: leave it behind by a margin
            t = t.max(tangent_escape(self.outer_radius, dir.norm(), self.tol));
        }
        if self.has_cavity() {
            if let Some((t_enter, t_exit)) = Self::roots(point, dir, self.inner_radius) {
                if t_exit - t_enter > self.tol && t_exit > self.tol {
                    t = t.min(t_enter);
                }
            }
        }
        Intersection::capped(t, max_distance)
    }

    fn safety_to_in(&self, point: &Point3) -> f64 {
        self.excess(point.coords.norm()).max(0.0)
    }

    fn safety_to_out(&self, point: &Point3) -> f64 {
        (-self.excess(point.coords.norm())).max(0.0)
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::symmetric(&Vector3::repeat(self.outer_radius))
    }
}
