use serde::Serialize;

use crate::math::{surface_tolerance, Aabb, Point3, Transform, Vector3};

use super::{Intersection, PointClassification, Solid, SolidShape};

/// Upper bound on surface-to-surface hops when marching through a
/// composite. Each hop crosses at least one operand surface.
const MAX_MARCH_STEPS: usize = 32;

/// Set operation combining the two operands of a [`BooleanSolid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanOp {
    Union,
    Intersection,
    /// Left minus right.
    Subtraction,
}

/// Constructive solid built from two shapes.
///
/// The left operand shares the boolean's local frame; the right operand is
/// placed inside it by `right_transform`. Directional queries march from
/// operand surface to operand surface until the combined membership
/// changes.
#[derive(Debug, Clone, Serialize)]
pub struct BooleanSolid {
    op: BooleanOp,
    left: Box<SolidShape>,
    right: Box<SolidShape>,
    right_transform: Transform,
    #[serde(skip)]
    tol: f64,
}

impl BooleanSolid {
    #[must_use]
    pub fn new(
        op: BooleanOp,
        left: impl Into<SolidShape>,
        right: impl Into<SolidShape>,
        right_transform: Transform,
    ) -> Self {
        let left = Box::new(left.into());
        let right = Box::new(right.into());
        let tol = Self::tolerance_for(&left, &right, &right_transform, op);
        Self {
            op,
            left,
            right,
            right_transform,
            tol,
        }
    }

    #[must_use]
    pub fn union(
        left: impl Into<SolidShape>,
        right: impl Into<SolidShape>,
        right_transform: Transform,
    ) -> Self {
        Self::new(BooleanOp::Union, left, right, right_transform)
    }

    #[must_use]
    pub fn intersection(
        left: impl Into<SolidShape>,
        right: impl Into<SolidShape>,
        right_transform: Transform,
    ) -> Self {
        Self::new(BooleanOp::Intersection, left, right, right_transform)
    }

    #[must_use]
    pub fn subtraction(
        left: impl Into<SolidShape>,
        right: impl Into<SolidShape>,
        right_transform: Transform,
    ) -> Self {
        Self::new(BooleanOp::Subtraction, left, right, right_transform)
    }

    #[must_use]
    pub fn op(&self) -> BooleanOp {
        self.op
    }

    pub(crate) fn scaled(&self, factor: f64) -> Self {
        Self::new(
            self.op,
            self.left.scaled(factor),
            self.right.scaled(factor),
            self.right_transform.scaled(factor),
        )
    }

    fn tolerance_for(
        left: &SolidShape,
        right: &SolidShape,
        placement: &Transform,
        op: BooleanOp,
    ) -> f64 {
        surface_tolerance(Self::combined_bbox(left, right, placement, op).max_extent())
    }

    fn combined_bbox(
        left: &SolidShape,
        right: &SolidShape,
        placement: &Transform,
        op: BooleanOp,
    ) -> Aabb {
        let left_box = left.bounding_box();
        let right_box = placement.to_parent_bbox(&right.bounding_box());
        match op {
            BooleanOp::Union => left_box.union(&right_box),
            BooleanOp::Intersection => left_box.intersection(&right_box),
            BooleanOp::Subtraction => left_box,
        }
    }

    /// Point and direction in the right operand's frame.
    fn to_right(&self, point: &Point3, dir: &Vector3) -> (Point3, Vector3) {
        (
            self.right_transform.to_local_point(point),
            self.right_transform.to_local_dir(dir),
        )
    }

    /// Whether the operand surfaces through `point` face each other, as on
    /// the shared face of two touching operands.
    fn faces_oppose(&self, point: &Point3) -> bool {
        let pr = self.right_transform.to_local_point(point);
        let left = self.left.outward_normal(point);
        let right = self
            .right_transform
            .to_parent_dir(&self.right.outward_normal(&pr));
        left.dot(&right) < 0.0
    }

    fn union_distance_to_out(
        &self,
        point: &Point3,
        dir: &Vector3,
        max_distance: f64,
    ) -> Intersection {
        let mut t = 0.0;
        for _ in 0..MAX_MARCH_STEPS {
            let p = point + dir * t;
            let (pr, dr) = self.to_right(&p, dir);
            let mut step = 0.0_f64;
            if self.left.enters(&p, dir) {
                step = step.max(self.left.distance_to_out(&p, dir, f64::INFINITY).distance);
            }
            if self.right.enters(&pr, &dr) {
                step = step.max(self.right.distance_to_out(&pr, &dr, f64::INFINITY).distance);
            }
            if step <= self.tol {
                return Intersection::capped(t, max_distance);
            }
            t += step;
            if t > max_distance {
                return Intersection::miss(max_distance);
            }
        }
        // Still inside an operand when the march gave up: `t` is safe to
        // travel but is not a confirmed exit
        Intersection {
            distance: t,
            hit: false,
        }
    }

    fn intersection_distance_to_in(
        &self,
        point: &Point3,
        dir: &Vector3,
        max_distance: f64,
    ) -> Intersection {
        let mut t = 0.0;
        for _ in 0..MAX_MARCH_STEPS {
            let p = point + dir * t;
            let (pr, dr) = self.to_right(&p, dir);
            let mut step = 0.0_f64;
            if !self.left.enters(&p, dir) {
                let hit = self.left.distance_to_in(&p, dir, f64::INFINITY);
                if !hit.hit {
                    return Intersection::miss(max_distance);
                }
                step = step.max(hit.distance);
            }
            if !self.right.enters(&pr, &dr) {
                let hit = self.right.distance_to_in(&pr, &dr, f64::INFINITY);
                if !hit.hit {
                    return Intersection::miss(max_distance);
                }
                step = step.max(hit.distance);
            }
            // Inside both operands
            if step <= self.tol {
                return Intersection::capped(t, max_distance);
            }
            t += step;
            if t > max_distance {
                break;
            }
        }
        Intersection::miss(max_distance)
    }

    fn subtraction_distance_to_in(
        &self,
        point: &Point3,
        dir: &Vector3,
        max_distance: f64,
    ) -> Intersection {
        let mut t = 0.0;
        for _ in 0..MAX_MARCH_STEPS {
            let p = point + dir * t;
            let (pr, dr) = self.to_right(&p, dir);
            let in_left = self.left.enters(&p, dir);
            let in_right = self.right.enters(&pr, &dr);
            if in_left && !in_right {
                return Intersection::capped(t, max_distance);
            }
            let mut step = 0.0_f64;
            if !in_left {
                let hit = self.left.distance_to_in(&p, dir, f64::INFINITY);
                if !hit.hit {
                    return Intersection::miss(max_distance);
                }
                step = step.max(hit.distance);
            }
            if in_right {
                step = step.max(self.right.distance_to_out(&pr, &dr, f64::INFINITY).distance);
            }
            if step <= 0.0 {
                break;
            }
            t += step;
            if t > max_distance {
                break;
            }
        }
        Intersection::miss(max_distance)
    }
}

impl Solid for BooleanSolid {
    fn classify(&self, point: &Point3) -> PointClassification {
        use PointClassification::{Inside, OnBoundary, Outside};

        let a = self.left.classify(point);
        let b = self.right.classify(&self.right_transform.to_local_point(point));
        match self.op {
            BooleanOp::Union => match (a, b) {
                (Inside, _) | (_, Inside) => Inside,
                (Outside, Outside) => Outside,
                (OnBoundary, OnBoundary) if self.faces_oppose(point) => Inside,
                _ => OnBoundary,
            },
            BooleanOp::Intersection => match (a, b) {
                (Inside, Inside) => Inside,
                (Outside, _) | (_, Outside) => Outside,
                _ => OnBoundary,
            },
            BooleanOp::Subtraction => match (a, b) {
                (Inside, Outside) => Inside,
                (Outside, _) | (_, Inside) => Outside,
                _ => OnBoundary,
            },
        }
    }

    fn outward_normal(&self, point: &Point3) -> Vector3 {
        let pr = self.right_transform.to_local_point(point);
        if self.left.safety_distance(point) <= self.right.safety_distance(&pr) {
            return self.left.outward_normal(point);
        }
        let n = self
            .right_transform
            .to_parent_dir(&self.right.outward_normal(&pr));
        if self.op == BooleanOp::Subtraction {
            -n
        } else {
            n
        }
    }

    fn distance_to_in(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        match self.op {
            BooleanOp::Union => {
                let (pr, dr) = self.to_right(point, dir);
                let a = self.left.distance_to_in(point, dir, max_distance);
                let b = self.right.distance_to_in(&pr, &dr, max_distance);
                if b.hit && (!a.hit || b.distance < a.distance) {
                    b
                } else {
                    a
                }
            }
            BooleanOp::Intersection => self.intersection_distance_to_in(point, dir, max_distance),
            BooleanOp::Subtraction => self.subtraction_distance_to_in(point, dir, max_distance),
        }
    }

    fn distance_to_out(&self, point: &Point3, dir: &Vector3, max_distance: f64) -> Intersection {
        let (pr, dr) = self.to_right(point, dir);
        let (a, b) = match self.op {
            BooleanOp::Union => return self.union_distance_to_out(point, dir, max_distance),
            BooleanOp::Intersection => (
                self.left.distance_to_out(point, dir, max_distance),
                self.right.distance_to_out(&pr, &dr, max_distance),
            ),
            BooleanOp::Subtraction => (
                self.left.distance_to_out(point, dir, max_distance),
                self.right.distance_to_in(&pr, &dr, max_distance),
            ),
        };
        if b.hit && (!a.hit || b.distance < a.distance) {
            b
        } else {
            a
        }
    }

    // Operand safeties clamp to zero on the wrong side of their surface, so
    // the combinations below stay valid lower bounds for any point.

    fn safety_to_in(&self, point: &Point3) -> f64 {
        let pr = self.right_transform.to_local_point(point);
        let left = self.left.safety_to_in(point);
        match self.op {
            BooleanOp::Union => left.min(self.right.safety_to_in(&pr)),
            BooleanOp::Intersection => left.max(self.right.safety_to_in(&pr)),
            BooleanOp::Subtraction => left.max(self.right.safety_to_out(&pr)),
        }
    }

    fn safety_to_out(&self, point: &Point3) -> f64 {
        let pr = self.right_transform.to_local_point(point);
        let left = self.left.safety_to_out(point);
        match self.op {
            BooleanOp::Union => left.max(self.right.safety_to_out(&pr)),
            BooleanOp::Intersection => left.min(self.right.safety_to_out(&pr)),
            BooleanOp::Subtraction => left.min(self.right.safety_to_in(&pr)),
        }
    }

    fn bounding_box(&self) -> Aabb {
        Self::combined_bbox(&self.left, &self.right, &self.right_transform, self.op)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::solid::test_util::assert_safety_bounds_distance;
    use crate::geometry::solid::{Cuboid, Sphere};
    use approx::assert_abs_diff_eq;

    fn unit_cube() -> Cuboid {
        Cuboid::new(1.0, 1.0, 1.0).unwrap()
    }

    /// Two unit cubes overlapping on x in [0.5, 1].
    fn pair(op: BooleanOp) -> BooleanSolid {
        BooleanSolid::new(op, unit_cube(), unit_cube(), Transform::translation(1.5, 0.0, 0.0))
    }

    #[test]
    fn union_marches_through_overlap() {
        let u = pair(BooleanOp::Union);
        let entry = u.distance_to_in(&Point3::new(-5.0, 0.0, 0.0), &Vector3::x(), f64::INFINITY);
        assert_abs_diff_eq!(entry.distance, 4.0, epsilon = 1e-12);
        let exit = u.distance_to_out(&Point3::new(-1.0, 0.0, 0.0), &Vector3::x(), f64::INFINITY);
        assert_abs_diff_eq!(exit.distance, 3.5, epsilon = 1e-12);
        assert_eq!(u.classify(&Point3::new(1.0, 0.0, 0.0)), PointClassification::Inside);
    }

    #[test]
    fn intersection_enters_at_later_surface() {
        let i = pair(BooleanOp::Intersection);
        let entry = i.distance_to_in(&Point3::new(-5.0, 0.0, 0.0), &Vector3::x(), f64::INFINITY);
        assert!(entry.hit);
        assert_abs_diff_eq!(entry.distance, 5.5, epsilon = 1e-12);
        let exit = i.distance_to_out(&Point3::new(0.75, 0.0, 0.0), &Vector3::x(), f64::INFINITY);
        assert_abs_diff_eq!(exit.distance, 0.25, epsilon = 1e-12);
        // Heading away from both operands
        assert!(!i.distance_to_in(&Point3::new(-5.0, 0.0, 0.0), &-Vector3::x(), f64::INFINITY).hit);
    }

    #[test]
    fn subtraction_skips_removed_region() {
        let s = pair(BooleanOp::Subtraction);
        let exit = s.distance_to_out(&Point3::origin(), &Vector3::x(), f64::INFINITY);
        assert_abs_diff_eq!(exit.distance, 0.5, epsilon = 1e-12);
        // From beyond the removed part heading back: enters at x = 0.5
        let entry = s.distance_to_in(&Point3::new(3.0, 0.0, 0.0), &-Vector3::x(), f64::INFINITY);
        assert!(entry.hit);
        assert_abs_diff_eq!(entry.distance, 2.5, epsilon = 1e-12);
        assert_eq!(s.classify(&Point3::new(0.75, 0.0, 0.0)), PointClassification::Outside);
    }

    #[test]
    fn subtraction_normal_faces_into_removed_region() {
        let s = pair(BooleanOp::Subtraction);
        let n = s.outward_normal(&Point3::new(0.5, 0.2, 0.0));
        assert_abs_diff_eq!(n, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn bounding_boxes() {
        let u = pair(BooleanOp::Union).bounding_box();
        assert_abs_diff_eq!(u.max.x, 2.5);
        let i = pair(BooleanOp::Intersection).bounding_box();
        assert_abs_diff_eq!(i.min.x, 0.5);
        assert_abs_diff_eq!(i.max.x, 1.0);
        let s = pair(BooleanOp::Subtraction).bounding_box();
        assert_abs_diff_eq!(s.max.x, 1.0);
    }

    #[test]
    fn hollow_ball_matches_shell() {
        let hollow = BooleanSolid::subtraction(
            Sphere::new(5.0).unwrap(),
            Sphere::new(2.0).unwrap(),
            Transform::identity(),
        );
        let shell = Sphere::shell(2.0, 5.0).unwrap();
        let points = [
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(0.0, 6.0, 1.0),
        ];
        for p in points {
            for d in [Vector3::x(), -Vector3::x(), Vector3::new(0.0, 0.6, 0.8)] {
                let expected = shell.distance_to_boundary(&p, &d, f64::INFINITY);
                let actual = hollow.distance_to_boundary(&p, &d, f64::INFINITY);
                assert_eq!(expected.hit, actual.hit);
                if expected.hit {
                    assert_abs_diff_eq!(expected.distance, actual.distance, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn touching_union_has_no_internal_face() {
        let placement = Transform::translation(2.0, 0.0, 0.0);
        let u = BooleanSolid::union(unit_cube(), unit_cube(), placement);
        assert_eq!(u.classify(&Point3::new(1.0, 0.0, 0.0)), PointClassification::Inside);
        assert_eq!(u.classify(&Point3::new(0.0, 1.0, 0.0)), PointClassification::OnBoundary);
        let exit = u.distance_to_out(&Point3::origin(), &Vector3::x(), f64::INFINITY);
        assert!(exit.hit);
        assert_abs_diff_eq!(exit.distance, 3.0, epsilon = 1e-12);
    }

    /// Disjoint cubes of half width 0.6 centered every 2 along x.
    fn comb(teeth: u32) -> SolidShape {
        (1..teeth).fold(SolidShape::from(Cuboid::new(0.6, 1.0, 1.0).unwrap()), |acc, k| {
            let tooth = Cuboid::new(0.6, 1.0, 1.0).unwrap();
            let offset = 2.0 * f64::from(k);
            BooleanSolid::union(acc, tooth, Transform::translation(offset, 0.0, 0.0)).into()
        })
    }

    #[test]
    fn union_march_gives_up_without_an_exit() {
        // Two interleaved combs form one bar over [-0.6, 39.6] that takes 40
        // hops to cross
        let bar = BooleanSolid::union(comb(20), comb(20), Transform::translation(1.0, 0.0, 0.0));
        let out = bar.distance_to_out(&Point3::origin(), &Vector3::x(), f64::INFINITY);
        assert!(!out.hit);
        assert_abs_diff_eq!(out.distance, 31.6, epsilon = 1e-9);
        assert_eq!(bar.classify(&Point3::new(31.6, 0.0, 0.0)), PointClassification::Inside);

        let short = BooleanSolid::union(comb(5), comb(5), Transform::translation(1.0, 0.0, 0.0));
        let out = short.distance_to_out(&Point3::origin(), &Vector3::x(), f64::INFINITY);
        assert!(out.hit);
        assert_abs_diff_eq!(out.distance, 9.6, epsilon = 1e-9);
    }

    #[test]
    fn scaled_operands_follow_placement() {
        let u = pair(BooleanOp::Union).scaled(10.0);
        let exit = u.distance_to_out(&Point3::new(-10.0, 0.0, 0.0), &Vector3::x(), f64::INFINITY);
        assert_abs_diff_eq!(exit.distance, 35.0, epsilon = 1e-9);
    }

    #[test]
    fn safety_never_exceeds_distance() {
        let rotated = BooleanSolid::subtraction(
            Cuboid::new(3.0, 2.0, 1.0).unwrap(),
            unit_cube(),
            Transform::rotation_z(0.4, Vector3::new(2.5, 0.0, 0.0)),
        );
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.75, 0.3, 0.2),
            Point3::new(-2.0, 1.0, 0.5),
            Point3::new(4.0, 3.0, 0.0),
        ];
        for op in [BooleanOp::Union, BooleanOp::Intersection, BooleanOp::Subtraction] {
            for p in &points {
                assert_safety_bounds_distance(&pair(op), p);
            }
        }
        for p in &points {
            assert_safety_bounds_distance(&rotated, p);
        }
    }
}
