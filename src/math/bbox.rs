use serde::Serialize;

use crate::error::{GeometryError, Result};

use super::{Point3, Vector3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a bounding box from its corners.
    ///
    /// # Errors
    ///
    /// Returns an error if `min` exceeds `max` along any axis.
    pub fn new(min: Point3, max: Point3) -> Result<Self> {
        for axis in 0..3 {
            if min[axis] > max[axis] {
                return Err(GeometryError::Degenerate(format!(
                    "bounding box lower corner exceeds upper along axis {axis}"
                ))
                .into());
            }
        }
        Ok(Self { min, max })
    }

    /// A box centered on the origin with the given half-widths.
    #[must_use]
    pub fn symmetric(half: &Vector3) -> Self {
        Self {
            min: Point3::from(-half),
            max: Point3::from(*half),
        }
    }

    /// The inverted box that any [`expand`](Self::expand) call overwrites.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Grows the box to include `point`.
    pub fn expand(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// The eight corners.
    #[must_use]
    pub fn corners(&self) -> [Point3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Smallest box containing both.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Overlap of both boxes, clamped so that the result stays valid.
    #[must_use]
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        let min = self.min.sup(&other.min);
        let max = self.max.inf(&other.max);
        Aabb {
            min,
            max: max.sup(&min),
        }
    }

    /// Returns a copy with both corners multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Aabb {
        Aabb {
            min: Point3::from(self.min.coords * factor),
            max: Point3::from(self.max.coords * factor),
        }
    }

    /// Largest absolute coordinate of either corner.
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        self.min.coords.amax().max(self.max.coords.amax())
    }

    /// Whether `point` lies inside the box grown by `tol` on every side.
    #[must_use]
    pub fn contains(&self, point: &Point3, tol: f64) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] - tol && point[i] <= self.max[i] + tol)
    }

    /// Whether `other` fits inside this box grown by `tol`.
    #[must_use]
    pub fn encloses(&self, other: &Aabb, tol: f64) -> bool {
        self.contains(&other.min, tol) && self.contains(&other.max, tol)
    }

    /// Lower bound on the Euclidean distance from `point` to the box.
    ///
    /// This is the largest per-axis gap, which is zero inside the box.
    #[must_use]
    pub fn distance_lower_bound(&self, point: &Point3) -> f64 {
        (0..3)
            .map(|i| (self.min[i] - point[i]).max(point[i] - self.max[i]))
            .fold(0.0, f64::max)
    }

    /// Whether the ray `origin + t * dir` touches the box for some
    /// `t` in `[0, max_distance]`, using the slab method.
    #[must_use]
    pub fn intersects_ray(
        &self,
        origin: &Point3,
        dir: &Vector3,
        max_distance: f64,
        tol: f64,
    ) -> bool {
        let mut t_near = 0.0_f64;
        let mut t_far = max_distance;
        for i in 0..3 {
            let lo = self.min[i] - tol;
            let hi = self.max[i] + tol;
            if dir[i].abs() < f64::MIN_POSITIVE {
                if origin[i] < lo || origin[i] > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / dir[i];
            let (t1, t2) = {
                let a = (lo - origin[i]) * inv;
                let b = (hi - origin[i]) * inv;
                if a <= b { (a, b) } else { (b, a) }
            };
            t_near = t_near.max(t1);
            t_far = t_far.min(t2);
            if t_near > t_far {
                return false;
            }
        }
        true
    }
}
