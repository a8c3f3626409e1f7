use serde::Serialize;

use crate::error::{GeometryError, Result};
use crate::math::{surface_tolerance, Aabb, Point3, Vector3, TOLERANCE};

use super::{classify_excess, Intersection, PointClassification, Solid};

/// A rectangular box centered on the local origin.
#[derive(Debug, Clone, Serialize)]
pub struct Cuboid {
    half_widths: Vector3,
    #[serde(skip)]
    tol: f64,
}

impl Cuboid {
    /// Creates a box from its half-widths along x, y and z.
    ///
    /// # Errors
    ///
    /// Returns an error if any half-width is not positive.
    pub fn new(hx: f64, hy: f64, hz: f64) -> Result<Self> {
        for (parameter, value) in [("hx", hx), ("hy", hy), ("hz", hz)] {
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
        let half_widths = Vector3::new(hx, hy, hz);
        Ok(Self {
            half_widths,
            tol: surface_tolerance(half_widths.max()),
        })
    }

    /// Returns the half-widths.
    #[must_use]
    pub fn half_widths(&self) -> &Vector3 {
        &self.half_widths
    }

    pub(crate) fn scaled(&self, factor: f64) -> Self {
        let half_widths = self.half_widths * factor;
        Self {
            half_widths,
            tol: surface_tolerance(half_widths.max()),
        }
    }

    /// Per-axis distance outside each face pair (negative inside).
    fn excess(&self, point: &Point3) -> Vector3 {
        point.coords.abs() - self.half_widths
    }
}

impl Solid for Cuboid {
    fn classify(&self, point: &Point3) -> PointClassification {
        classify_excess(self.excess(point).max(), self.tol)
    }

    fn outward_normal(&self, point: &Point3) -> Vector3 {
        let axis = self.excess(point).imax();
        let mut n = Vector3::zeros();
        n[axis] = 1.0_f64.copysign(point[axis]);
        n
    }

    fn distance_to_in(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        let mut t_near = f64::NEG_INFINITY;
        let mut t_far = f64::INFINITY;
        for i in 0..3 {
            let h = self.half_widths[i];
            if dir[i].abs() < f64::MIN_POSITIVE {
                // Parallel to this face pair: must already be strictly between them
                if point[i].abs() >= h - self.tol {
                    return Intersection::miss(max_distance);
                }
                continue;
            }
            let a = (-h - point[i]) / dir[i];
            let b = (h - point[i]) / dir[i];
            t_near = t_near.max(a.min(b));
            t_far = t_far.min(a.max(b));
        }

        // Leaving (t_far ~ 0) or grazing an edge (t_far ~ t_near) is not an entry
        if t_far <= t_near.max(0.0) + self.tol {
            return Intersection::miss(max_distance);
        }
        Intersection::capped(t_near, max_distance)
    }

    fn distance_to_out(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        let mut t = f64::INFINITY;
        for i in 0..3 {
            if dir[i].abs() < f64::MIN_POSITIVE {
                continue;
            }
            let face = self.half_widths[i].copysign(dir[i]);
            t = t.min((face - point[i]) / dir[i]);
        }
        Intersection::capped(t, max_distance)
    }

    fn safety_to_in(&self, point: &Point3) -> f64 {
        self.excess(point).max().max(0.0)
    }

    fn safety_to_out(&self, point: &Point3) -> f64 {
        (-self.excess(point).max()).max(0.0)
    }

    fn bounding_box(&self) -> Aabb {
        Aabb::symmetric(&self.half_widths)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::solid::test_util::assert_safety_bounds_distance;

    fn cube() -> Cuboid {
        Cuboid::new(1.0, 2.0, 3.0).unwrap()
    }

    #[test]
    fn invalid_half_width() {
        assert!(Cuboid::new(1.0, 0.0, 1.0).is_err());
        assert!(Cuboid::new(f64::NAN, 1.0, 1.0).is_err());
    }

    #[test]
    fn classify_points() {
        let c = cube();
        assert_eq!(c.classify(&Point3::origin()), PointClassification::Inside);
        assert_eq!(c.classify(&Point3::new(1.0, 0.0, 0.0)), PointClassification::OnBoundary);
        assert_eq!(c.classify(&Point3::new(0.0, 2.5, 0.0)), PointClassification::Outside);
    }

    #[test]
    fn normal_points_out_of_nearest_face() {
        let c = cube();
        let n = c.outward_normal(&Point3::new(0.0, -2.0, 0.5));
        assert!((n + Vector3::y()).norm() < TOLERANCE);
    }

    #[test]
    fn distance_from_inside() {
        let c = cube();
        let d = c.distance_to_out(&Point3::new(0.5, 0.0, 0.0), &Vector3::x(), f64::INFINITY);
        assert!(d.hit);
        assert!((d.distance - 0.5).abs() < TOLERANCE);

        let capped = c.distance_to_out(&Point3::new(0.5, 0.0, 0.0), &Vector3::x(), 0.25);
        assert!(!capped.hit);
        assert!((capped.distance - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn distance_from_outside() {
        let c = cube();
        let p = Point3::new(-4.0, 0.0, 0.0);
        let d = c.distance_to_in(&p, &Vector3::x(), f64::INFINITY);
        assert!(d.hit);
        assert!((d.distance - 3.0).abs() < TOLERANCE);
        assert!(!c.distance_to_in(&p, &-Vector3::x(), f64::INFINITY).hit);
        assert!(!c.distance_to_in(&p, &Vector3::y(), f64::INFINITY).hit);
    }

    #[test]
    fn on_surface_conventions() {
        let c = cube();
        let p = Point3::new(1.0, 0.0, 0.0);
        // Leaving: zero to exit, and no re-entry reported
        let out = c.distance_to_out(&p, &Vector3::x(), f64::INFINITY);
        assert!(out.hit && out.distance.abs() < TOLERANCE);
        assert!(!c.distance_to_in(&p, &Vector3::x(), f64::INFINITY).hit);
        // Entering: zero to enter, then the far face
        let inward = -Vector3::x();
        let entry = c.distance_to_in(&p, &inward, f64::INFINITY);
        assert!(entry.hit && entry.distance.abs() < TOLERANCE);
        let boundary = c.distance_to_boundary(&p, &inward, f64::INFINITY);
        assert!((boundary.distance - 2.0).abs() < TOLERANCE);
        assert!(c.enters(&p, &inward));
        assert!(!c.enters(&p, &Vector3::x()));
    }

    #[test]
    fn sliding_along_face_does_not_enter() {
        let c = cube();
        let p = Point3::new(1.0, -5.0, 0.0);
        assert!(!c.distance_to_in(&p, &Vector3::y(), f64::INFINITY).hit);
    }

    #[test]
    fn safeties_are_axis_bounds() {
        let c = cube();
        assert!((c.safety_to_in(&Point3::new(2.1, 3.0, 0.0)) - 1.1).abs() < TOLERANCE);
        assert!((c.safety_to_out(&Point3::new(0.5, 0.0, 0.0)) - 0.5).abs() < TOLERANCE);
        assert!(c.safety_distance(&Point3::new(1.0, 0.0, 0.0)).abs() < TOLERANCE);
    }

    #[test]
    fn safety_never_exceeds_distance() {
        let c = cube();
        for p in [
            Point3::new(0.1, -0.3, 2.0),
            Point3::new(0.9, 1.9, -2.9),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(-2.0, 5.0, 4.0),
        ] {
            assert_safety_bounds_distance(&c, &p);
        }
    }
}
