//! Local solid evaluators.
//!
//! Each primitive answers distance and safety queries for a point and
//! direction expressed in its own local frame. The navigation layer maps
//! global coordinates into that frame before calling in.

mod boolean;
mod cuboid;
mod sphere;
mod tube;

pub use boolean::{BooleanOp, BooleanSolid};
pub use cuboid::Cuboid;
pub use sphere::Sphere;
pub use tube::Tube;

use serde::Serialize;

use crate::math::{Aabb, Point3, Vector3, TOLERANCE};

/// Classification of a point relative to a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
}

/// Result of a distance-to-surface query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Distance along the ray, capped at the query limit.
    pub distance: f64,
    /// Whether a surface was reached within the limit.
    pub hit: bool,
}

impl Intersection {
    /// No surface within `max_distance`.
    #[must_use]
    pub fn miss(max_distance: f64) -> Self {
        Self {
            distance: max_distance,
            hit: false,
        }
    }

    /// Surface at `distance` (clamped to be non-negative) unless it lies
    /// beyond `max_distance`.
    #[must_use]
    pub fn capped(distance: f64, max_distance: f64) -> Self {
        let distance = distance.max(0.0);
        if distance <= max_distance {
            Self {
                distance,
                hit: true,
            }
        } else {
            Self::miss(max_distance)
        }
    }
}

/// Distance and safety evaluation for a single solid in its local frame.
///
/// The directional primitives follow one convention: `distance_to_in`
/// assumes the point is outside or on the surface, `distance_to_out`
/// assumes it is inside or on the surface. A point on the surface heading
/// across it gets zero; a point on the surface heading away gets the next
/// surface along the ray, never the one being left. A tangent direction on a
/// curved surface gets a small positive exit distance.
pub trait Solid {
    /// Classifies `point` with the solid's surface tolerance.
    fn classify(&self, point: &Point3) -> PointClassification;

    /// Outward unit normal of the surface nearest to `point`.
    fn outward_normal(&self, point: &Point3) -> Vector3;

    /// Distance along `dir` until the ray enters the solid.
    fn distance_to_in(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection;

    /// Distance along `dir` until the ray leaves the solid.
    fn distance_to_out(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection;

    /// Lower bound on the distance from an outside point to the solid.
    fn safety_to_in(&self, point: &Point3) -> f64;

    /// Lower bound on the distance from an inside point to the surface.
    fn safety_to_out(&self, point: &Point3) -> f64;

    /// Bounding box in the local frame.
    fn bounding_box(&self) -> Aabb;

    /// Distance to the nearest surface crossing along `dir`, whichever side
    /// of the surface `point` is on.
    fn distance_to_boundary(
        &self,
        point: &Point3,
        dir: &Vector3,
        max_distance: f64,
    ) -> Intersection {
        match self.classify(point) {
            PointClassification::Inside => self.distance_to_out(point, dir, max_distance),
            PointClassification::Outside => self.distance_to_in(point, dir, max_distance),
            PointClassification::OnBoundary => {
                if self.enters(point, dir) {
                    self.distance_to_out(point, dir, max_distance)
                } else {
                    self.distance_to_in(point, dir, max_distance)
                }
            }
        }
    }

    /// Direction-independent lower bound on the distance to the surface.
    fn safety_distance(&self, point: &Point3) -> f64 {
        match self.classify(point) {
            PointClassification::Inside => self.safety_to_out(point),
            PointClassification::Outside => self.safety_to_in(point),
            PointClassification::OnBoundary => 0.0,
        }
    }

    /// Whether a track at `point` heading along `dir` belongs to the solid.
    ///
    /// On the surface this holds unless `dir` points outward by more than
    /// the tolerance, so a tangent direction stays with the solid. Curved
    /// solids pair this with a small positive tangent exit distance in
    /// `distance_to_out`.
    fn enters(&self, point: &Point3, dir: &Vector3) -> bool {
        match self.classify(point) {
            PointClassification::Inside => true,
            PointClassification::Outside => false,
            PointClassification::OnBoundary => self.outward_normal(point).dot(dir) <= TOLERANCE,
        }
    }
}

/// Closed set of solids understood by the navigator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "_type", rename_all = "lowercase")]
pub enum SolidShape {
    Box(Cuboid),
    Sphere(Sphere),
    Tube(Tube),
    Boolean(BooleanSolid),
}

impl SolidShape {
    /// Returns a copy with every length multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> SolidShape {
        match self {
            SolidShape::Box(s) => SolidShape::Box(s.scaled(factor)),
            SolidShape::Sphere(s) => SolidShape::Sphere(s.scaled(factor)),
            SolidShape::Tube(s) => SolidShape::Tube(s.scaled(factor)),
            SolidShape::Boolean(s) => SolidShape::Boolean(s.scaled(factor)),
        }
    }

    fn as_solid(&self) -> &dyn Solid {
        match self {
            SolidShape::Box(s) => s,
            SolidShape::Sphere(s) => s,
            SolidShape::Tube(s) => s,
            SolidShape::Boolean(s) => s,
        }
    }
}

impl From<Cuboid> for SolidShape {
    fn from(s: Cuboid) -> Self {
        SolidShape::Box(s)
    }
}

impl From<Sphere> for SolidShape {
    fn from(s: Sphere) -> Self {
        SolidShape::Sphere(s)
    }
}

impl From<Tube> for SolidShape {
    fn from(s: Tube) -> Self {
        SolidShape::Tube(s)
    }
}

impl From<BooleanSolid> for SolidShape {
    fn from(s: BooleanSolid) -> Self {
        SolidShape::Boolean(s)
    }
}

impl Solid for SolidShape {
    fn classify(&self, point: &Point3) -> PointClassification {
        self.as_solid().classify(point)
    }

    fn outward_normal(&self, point: &Point3) -> Vector3 {
        self.as_solid().outward_normal(point)
    }

    fn distance_to_in(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        self.as_solid().distance_to_in(point, dir, max_distance)
    }

    fn distance_to_out(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        self.as_solid().distance_to_out(point, dir, max_distance)
    }

    fn safety_to_in(&self, point: &Point3) -> f64 {
        self.as_solid().safety_to_in(point)
    }

    fn safety_to_out(&self, point: &Point3) -> f64 {
        self.as_solid().safety_to_out(point)
    }

    fn bounding_box(&self) -> Aabb {
        self.as_solid().bounding_box()
    }
}

/// Distance along a tangent ray, with transverse speed `transverse`, at
/// which it clears a convex surface of curvature radius `radius` by twice
/// `tol`.
pub(crate) fn tangent_escape(radius: f64, transverse: f64, tol: f64) -> f64 {
    (4.0 * radius * tol).sqrt() / transverse
}

/// Classifies by the signed "outside-ness" `excess`: the largest amount by
/// which the point violates one of the solid's bounding constraints.
pub(crate) fn classify_excess(excess: f64, tol: f64) -> PointClassification {
    if excess > tol {
        PointClassification::Outside
    } else if excess < -tol {
        PointClassification::Inside
    } else {
        PointClassification::OnBoundary
    }
}
