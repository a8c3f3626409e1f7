pub mod bbox;
pub mod quadratic;
pub mod transform;

pub use bbox::Aabb;
pub use transform::Transform;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 rotation (or reflection) matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// Relative geometric tolerance for surface coincidence.
pub const TOLERANCE: f64 = 1e-10;

/// Absolute surface half-thickness for a solid of characteristic size `length`.
///
/// Lengths below one internal unit use the bare relative tolerance.
#[must_use]
pub fn surface_tolerance(length: f64) -> f64 {
    TOLERANCE * length.max(1.0)
}

/// Returns whether `dir` has unit length within a loose relative tolerance.
#[must_use]
pub fn is_soft_unit_vector(dir: &Vector3) -> bool {
    (dir.norm_squared() - 1.0).abs() < 1e-6
}
