use serde::Serialize;

use crate::error::{GeometryError, Result};

use super::{Aabb, Matrix3, Point3, Vector3, TOLERANCE};

/// Rigid placement of a local frame inside its parent frame.
///
/// Maps local coordinates to parent coordinates as `p' = R p + t`. The
/// matrix `R` is orthonormal and may be improper (determinant -1), which is
/// how mirrored volumes are expressed. Distances are preserved either way,
/// so solids can be evaluated in their local frame without rescaling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transform {
    rotation: Matrix3,
    translation: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity placement.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::new(x, y, z),
        }
    }

    /// Creates a transform from an orthonormal matrix and a translation.
    ///
    /// # Errors
    ///
    /// Returns an error if `rotation` is not orthonormal.
    pub fn new(rotation: Matrix3, translation: Vector3) -> Result<Self> {
        let defect = (rotation.transpose() * rotation - Matrix3::identity()).amax();
        if defect > 1e3 * TOLERANCE {
            return Err(GeometryError::NotOrthonormal(format!(
                "|R^T R - I| = {defect:e}"
            ))
            .into());
        }
        Ok(Self {
            rotation,
            translation,
        })
    }

    /// Rotation by `angle` radians about the z axis, then translation.
    #[must_use]
    pub fn rotation_z(angle: f64, translation: Vector3) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            rotation: Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
            translation,
        }
    }

    /// Mirror through the plane containing the origin with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero-length.
    pub fn reflection(normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let n = normal / len;
        // Householder matrix I - 2 n n^T
        let rotation = Matrix3::identity() - n * n.transpose() * 2.0;
        Ok(Self {
            rotation,
            translation: Vector3::zeros(),
        })
    }

    /// Returns the orthonormal part.
    #[must_use]
    pub fn rotation(&self) -> &Matrix3 {
        &self.rotation
    }

    /// Returns the translation part.
    #[must_use]
    pub fn translation_vector(&self) -> &Vector3 {
        &self.translation
    }

    /// Whether the transform mirrors space (determinant -1).
    #[must_use]
    pub fn is_reflection(&self) -> bool {
        self.rotation.determinant() < 0.0
    }

    /// Composes `self` (outer) with `inner`: the result maps `inner`'s local
    /// frame straight into `self`'s parent frame.
    #[must_use]
    pub fn then(&self, inner: &Transform) -> Transform {
        Transform {
            rotation: self.rotation * inner.rotation,
            translation: self.rotation * inner.translation + self.translation,
        }
    }

    /// Returns a copy with the translation multiplied by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Transform {
        Transform {
            rotation: self.rotation,
            translation: self.translation * factor,
        }
    }

    /// Maps a parent-frame point into the local frame.
    #[must_use]
    pub fn to_local_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.rotation.tr_mul(&(point.coords - self.translation)))
    }

    /// Maps a parent-frame direction into the local frame.
    #[must_use]
    pub fn to_local_dir(&self, dir: &Vector3) -> Vector3 {
        self.rotation.tr_mul(dir)
    }

    /// Maps a local point into the parent frame.
    #[must_use]
    pub fn to_parent_point(&self, point: &Point3) -> Point3 {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Maps a local direction into the parent frame.
    #[must_use]
    pub fn to_parent_dir(&self, dir: &Vector3) -> Vector3 {
        self.rotation * dir
    }

    /// Bounding box in the parent frame of a local bounding box.
    #[must_use]
    pub fn to_parent_bbox(&self, bbox: &Aabb) -> Aabb {
        let mut result = Aabb::empty();
        for corner in bbox.corners() {
            result.expand(&self.to_parent_point(&corner));
        }
        result
    }
}
