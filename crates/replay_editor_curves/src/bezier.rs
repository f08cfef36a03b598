// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cubic bezier math.
//!
//! Curves are stored in explicit four control point form. All operations are
//! pure; a channel segment is converted into a [`CubicBezier`] on demand with
//! [`CubicBezier::from_keyframes`].

use crate::error::{CurveError, Result};
use crate::keyframe::{HandleSide, Keyframe};
use glam::DVec2;
use std::f64::consts::PI;

/// Relative tolerance used when deciding whether a polynomial degree collapses
const DEGREE_EPSILON: f64 = 1e-12;

/// Tolerance for parameter and bounding box checks
const BOUNDS_EPSILON: f64 = 1e-7;

/// Up to three real roots. Missing roots are `None`, never zero.
pub type Roots = [Option<f64>; 3];

/// A cubic bezier curve in explicit control point form
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CubicBezier {
    /// Start point
    pub p0: DVec2,
    /// First control point
    pub p1: DVec2,
    /// Second control point
    pub p2: DVec2,
    /// End point
    pub p3: DVec2,
}

impl CubicBezier {
    /// Create a curve from its four control points
    pub const fn new(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Build the segment between two adjacent keyframes.
    ///
    /// `p0` is the left center, `p1` the left outgoing handle, `p2` the right
    /// incoming handle and `p3` the right center, all in curve space.
    pub fn from_keyframes(left: &Keyframe, right: &Keyframe) -> Self {
        Self {
            p0: left.center(),
            p1: left.global_handle(HandleSide::B),
            p2: right.global_handle(HandleSide::A),
            p3: right.center(),
        }
    }

    /// Write this curve back onto a pair of adjacent keyframes.
    ///
    /// Centers are moved first so the handle offsets end up relative to the
    /// new centers. Times are rounded to whole milliseconds.
    pub fn apply_to_keyframes(&self, left: &mut Keyframe, right: &mut Keyframe) {
        left.set_center(self.p0);
        left.set_global_handle(HandleSide::B, self.p1);
        right.set_center(self.p3);
        right.set_global_handle(HandleSide::A, self.p2);
    }

    /// Evaluate the curve at parameter `t`
    pub fn sample(&self, t: f64) -> DVec2 {
        let mt = 1.0 - t;
        self.p0 * (mt * mt * mt)
            + self.p1 * (3.0 * mt * mt * t)
            + self.p2 * (3.0 * mt * t * t)
            + self.p3 * (t * t * t)
    }

    /// First derivative at parameter `t`
    pub fn derive(&self, t: f64) -> DVec2 {
        let mt = 1.0 - t;
        (self.p1 - self.p0) * (3.0 * mt * mt)
            + (self.p2 - self.p1) * (6.0 * mt * t)
            + (self.p3 - self.p2) * (3.0 * t * t)
    }

    /// Second derivative at parameter `t`
    pub fn derive2(&self, t: f64) -> DVec2 {
        (self.p2 - 2.0 * self.p1 + self.p0) * (6.0 * (1.0 - t))
            + (self.p3 - 2.0 * self.p2 + self.p1) * (6.0 * t)
    }

    /// Power basis coefficients `[a, b, c, d]` with `B(t) = at^3 + bt^2 + ct + d`
    fn coefficients(&self) -> [DVec2; 4] {
        [
            -self.p0 + 3.0 * self.p1 - 3.0 * self.p2 + self.p3,
            3.0 * self.p0 - 6.0 * self.p1 + 3.0 * self.p2,
            -3.0 * self.p0 + 3.0 * self.p1,
            self.p0,
        ]
    }

    /// Real roots of the X polynomial
    pub fn cubic_roots_x(&self) -> Roots {
        self.intersect_x(0.0)
    }

    /// Real roots of the Y polynomial
    pub fn cubic_roots_y(&self) -> Roots {
        self.intersect_y(0.0)
    }

    /// Parameters at which the curve crosses the vertical line `x`
    pub fn intersect_x(&self, x: f64) -> Roots {
        let [a, b, c, d] = self.coefficients();
        solve_cubic(a.x, b.x, c.x, d.x - x)
    }

    /// Parameters at which the curve crosses the horizontal line `y`
    pub fn intersect_y(&self, y: f64) -> Roots {
        let [a, b, c, d] = self.coefficients();
        solve_cubic(a.y, b.y, c.y, d.y - y)
    }

    /// Points where the curve crosses the infinite line through `line_start`
    /// and `line_end`.
    ///
    /// With `check_bounds` only points with a parameter in `[0, 1]` that also
    /// lie inside the bounding box of the segment are yielded.
    pub fn compute_intersections(
        &self,
        line_start: DVec2,
        line_end: DVec2,
        check_bounds: bool,
    ) -> impl Iterator<Item = DVec2> {
        // Implicit line: la*x + lb*y + lc = 0
        let la = line_end.y - line_start.y;
        let lb = line_start.x - line_end.x;
        let lc = line_start.x * (line_start.y - line_end.y)
            + line_start.y * (line_end.x - line_start.x);

        let k = self.coefficients();
        let project = |v: DVec2| la * v.x + lb * v.y;
        let roots = solve_cubic(project(k[0]), project(k[1]), project(k[2]), project(k[3]) + lc);

        let min = line_start.min(line_end);
        let max = line_start.max(line_end);
        let curve = *self;

        roots.into_iter().flatten().filter_map(move |t| {
            if check_bounds && !(-BOUNDS_EPSILON..=1.0 + BOUNDS_EPSILON).contains(&t) {
                return None;
            }
            let point = curve.sample(t);
            if check_bounds && !within_box(point, min, max) {
                return None;
            }
            Some(point)
        })
    }

    /// Split the curve at `t` into two curves tracing the same path
    pub fn subdivide(&self, t: f64) -> Result<(Self, Self)> {
        if !(t > 0.0 && t < 1.0) {
            return Err(CurveError::InvalidArgument(format!(
                "subdivision parameter must be in (0, 1), got {t}"
            )));
        }

        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);

        Ok((
            Self::new(self.p0, p01, p012, mid),
            Self::new(mid, p123, p23, self.p3),
        ))
    }
}

/// Scale `v` so its X component becomes `x` while keeping its direction.
///
/// A vertical vector can only be rescaled to `x == 0`, in which case it is
/// returned unchanged.
pub fn set_x_keep_direction(v: DVec2, x: f64) -> Result<DVec2> {
    if v.x == 0.0 {
        if x == 0.0 {
            return Ok(v);
        }
        return Err(CurveError::VerticalDirection { target: x });
    }
    Ok(v * (x / v.x))
}

fn within_box(point: DVec2, min: DVec2, max: DVec2) -> bool {
    point.x >= min.x - BOUNDS_EPSILON
        && point.x <= max.x + BOUNDS_EPSILON
        && point.y >= min.y - BOUNDS_EPSILON
        && point.y <= max.y + BOUNDS_EPSILON
}

/// Real roots of `at^3 + bt^2 + ct + d`
fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Roots {
    let scale = a.abs().max(b.abs()).max(c.abs());
    if scale == 0.0 {
        return [None; 3];
    }
    if a.abs() <= DEGREE_EPSILON * scale {
        return solve_quadratic(b, c, d);
    }

    // Normalize to t^3 + bt^2 + ct + d
    let (b, c, d) = (b / a, c / a, d / a);
    let q = (3.0 * c - b * b) / 9.0;
    let r = (9.0 * b * c - 27.0 * d - 2.0 * b * b * b) / 54.0;
    let disc = q * q * q + r * r;
    let shift = -b / 3.0;

    if disc < 0.0 {
        // Three distinct real roots
        let theta = (r / (-q * q * q).sqrt()).clamp(-1.0, 1.0).acos();
        let m = 2.0 * (-q).sqrt();
        return [
            Some(m * (theta / 3.0).cos() + shift),
            Some(m * ((theta + 2.0 * PI) / 3.0).cos() + shift),
            Some(m * ((theta + 4.0 * PI) / 3.0).cos() + shift),
        ];
    }

    let sqrt_disc = disc.sqrt();
    let s = (r + sqrt_disc).cbrt();
    let t = (r - sqrt_disc).cbrt();
    let first = shift + s + t;

    // Imaginary part vanishes: the other two roots coincide
    if (s - t).abs() <= BOUNDS_EPSILON * (1.0 + s.abs()) {
        let second = shift - (s + t) / 2.0;
        if (second - first).abs() > BOUNDS_EPSILON {
            return [Some(first), Some(second), None];
        }
    }
    [Some(first), None, None]
}

/// Real roots of `at^2 + bt + c`
fn solve_quadratic(a: f64, b: f64, c: f64) -> Roots {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        return [None; 3];
    }
    if a.abs() <= DEGREE_EPSILON * scale {
        return [Some(-c / b), None, None];
    }

    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 && disc > -DEGREE_EPSILON * b * b {
        disc = 0.0;
    }
    if disc < 0.0 {
        return [None; 3];
    }
    if disc == 0.0 {
        return [Some(-b / (2.0 * a)), None, None];
    }

    // Numerically stable form
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        let root = (-c / a).sqrt();
        return [Some(root), Some(-root), None];
    }
    [Some(q / a), Some(c / q), None]
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < EPS
    }

    fn wave() -> CubicBezier {
        CubicBezier::new(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 4.0),
            DVec2::new(3.0, -4.0),
            DVec2::new(4.0, 1.0),
        )
    }

    fn sorted(roots: Roots) -> Vec<f64> {
        let mut values: Vec<f64> = roots.into_iter().flatten().collect();
        values.sort_by(f64::total_cmp);
        values
    }

    #[test]
    fn test_endpoint_identity() {
        let curve = wave();
        assert!(close(curve.sample(0.0), curve.p0));
        assert!(close(curve.sample(1.0), curve.p3));
    }

    #[test]
    fn test_derivatives_at_endpoints() {
        let curve = wave();
        assert!(close(curve.derive(0.0), 3.0 * (curve.p1 - curve.p0)));
        assert!(close(curve.derive(1.0), 3.0 * (curve.p3 - curve.p2)));
        assert!(close(
            curve.derive2(0.0),
            6.0 * (curve.p2 - 2.0 * curve.p1 + curve.p0)
        ));
        assert!(close(
            curve.derive2(1.0),
            6.0 * (curve.p3 - 2.0 * curve.p2 + curve.p1)
        ));
    }

    #[test]
    fn test_straight_line_intersect_x() {
        let curve = CubicBezier::new(
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0 / 3.0, 1.0),
            DVec2::new(20.0 / 3.0, 2.0),
            DVec2::new(10.0, 3.0),
        );
        let roots = sorted(curve.intersect_x(5.0));
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 0.5).abs() < EPS);
    }

    #[test]
    fn test_absent_roots_are_none() {
        // x(t) stays in [1, 2], so it never crosses zero
        let curve = CubicBezier::new(
            DVec2::new(1.0, 0.0),
            DVec2::new(1.5, 0.0),
            DVec2::new(1.5, 0.0),
            DVec2::new(2.0, 0.0),
        );
        let roots = curve.cubic_roots_x();
        assert!(roots.iter().flatten().all(|t| curve.sample(*t).x.abs() < 1e-6));
        assert!(!roots.iter().flatten().any(|t| (0.0..=1.0).contains(t)));

        // y(t) is identically zero: no isolated roots
        assert_eq!(curve.cubic_roots_y(), [None; 3]);
    }

    #[test]
    fn test_three_roots() {
        let curve = wave();
        let roots = sorted(curve.cubic_roots_y());
        assert_eq!(roots.len(), 3);
        for t in roots {
            assert!(curve.sample(t).y.abs() < 1e-6, "root {t} is not on y = 0");
        }
    }

    #[test]
    fn test_intersections_bounds_filtering() {
        let curve = wave();
        // The curve crosses y = 0 near x = 0, x = 2.1 and x = 3.7
        let start = DVec2::new(-1.0, 0.0);
        let end = DVec2::new(3.0, 0.0);

        let all: Vec<DVec2> = curve.compute_intersections(start, end, false).collect();
        let bounded: Vec<DVec2> = curve.compute_intersections(start, end, true).collect();

        assert_eq!(all.len(), 3);
        assert_eq!(bounded.len(), 2);
        for point in &bounded {
            assert!(all.iter().any(|p| close(*p, *point)));
            assert!(point.x >= -1.0 - 1e-6 && point.x <= 3.0 + 1e-6);
            assert!(point.y.abs() < 1e-6);
        }
    }

    #[test]
    fn test_intersections_diagonal_line() {
        let curve = CubicBezier::new(
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 0.0),
        );
        let hits: Vec<DVec2> = curve
            .compute_intersections(DVec2::new(0.0, 0.0), DVec2::new(1.0, 1.0), true)
            .collect();
        assert!(!hits.is_empty());
        for point in hits {
            assert!((point.x - point.y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_subdivide_traces_same_path() {
        let curve = wave();
        let (left, right) = curve.subdivide(0.25).unwrap();
        assert!(close(left.sample(0.0), curve.p0));
        assert!(close(left.sample(1.0), curve.sample(0.25)));
        assert!(close(right.sample(0.0), curve.sample(0.25)));
        assert!(close(right.sample(1.0), curve.p3));
        assert!(close(left.sample(0.5), curve.sample(0.125)));
        assert!(close(right.sample(0.5), curve.sample(0.625)));
    }

    #[test]
    fn test_subdivide_rejects_out_of_range() {
        assert!(wave().subdivide(0.0).is_err());
        assert!(wave().subdivide(1.5).is_err());
    }

    #[test]
    fn test_set_x_keep_direction() {
        let v = set_x_keep_direction(DVec2::new(2.0, 4.0), 1.0).unwrap();
        assert!(close(v, DVec2::new(1.0, 2.0)));

        let flipped = set_x_keep_direction(DVec2::new(-3.0, 3.0), 1.5).unwrap();
        assert!(close(flipped, DVec2::new(1.5, -1.5)));

        assert!(set_x_keep_direction(DVec2::new(0.0, 1.0), 1.0).is_err());
        assert_eq!(
            set_x_keep_direction(DVec2::new(0.0, 1.0), 0.0),
            Ok(DVec2::new(0.0, 1.0))
        );
    }

    #[test]
    fn test_keyframe_conversion() {
        let mut left = Keyframe::new(0, 1.0);
        left.handle_b = DVec2::new(2.0, 1.0);
        let mut right = Keyframe::new(9, 4.0);
        right.handle_a = DVec2::new(-3.0, 0.0);

        let curve = CubicBezier::from_keyframes(&left, &right);
        assert!(close(curve.p0, DVec2::new(0.0, 1.0)));
        assert!(close(curve.p1, DVec2::new(2.0, 2.0)));
        assert!(close(curve.p2, DVec2::new(6.0, 4.0)));
        assert!(close(curve.p3, DVec2::new(9.0, 4.0)));

        let moved = CubicBezier::new(
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(5.0, 2.0),
            DVec2::new(8.0, 2.0),
        );
        moved.apply_to_keyframes(&mut left, &mut right);
        assert_eq!(left.time, 1);
        assert_eq!(right.time, 8);
        assert!(close(left.handle_b, DVec2::new(1.0, 0.0)));
        assert!(close(right.handle_a, DVec2::new(-3.0, 0.0)));
    }
}
