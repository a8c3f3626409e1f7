/// Real roots of `a t^2 + 2 b t + c = 0`, sorted ascending.
///
/// Uses the cancellation-free form `q = -(b + sign(b) sqrt(b^2 - a c))`,
/// roots `q / a` and `c / q`, so a root near zero keeps full precision when
/// the ray origin sits on the surface. A double root is returned twice.
#[must_use]
pub fn solve_half_quadratic(a: f64, b: f64, c: f64) -> Option<(f64, f64)> {
    if a.abs() < f64::MIN_POSITIVE {
        // Degenerate to the linear equation 2 b t + c = 0
        if b.abs() < f64::MIN_POSITIVE {
            return None;
        }
        let t = -c / (2.0 * b);
        return Some((t, t));
    }

    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }

    let q = -(b + disc.sqrt().copysign(b));
    if q.abs() < f64::MIN_POSITIVE {
        // b == 0 and disc == 0 imply c == 0: double root at the origin
        return Some((0.0, 0.0));
    }

    let t1 = q / a;
    let t2 = c / q;
    Some(if t1 <= t2 { (t1, t2) } else { (t2, t1) })
}
