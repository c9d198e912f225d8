//! Flattening of cubic bézier curve segments by recursive de Casteljau
//! subdivision, implemented both with callback and iterator based APIs.
//!
//! Each sub-segment is split at its parametric midpoint until a layered cascade
//! of termination criteria accepts it: a cross-product flatness proxy first,
//! then (optionally) a bound on the tangent direction change, then cusp
//! detection which preserves sharp corners as explicit vertices instead of
//! smoothing through them. A recursion limit guarantees termination on
//! degenerate geometry.

use crate::cubic_bezier::CubicBezierSegment;
use crate::scalar::Scalar;
use crate::Point;
use arrayvec::ArrayVec;

/// Hard ceiling on the subdivision depth used by default.
pub const DEFAULT_RECURSION_LIMIT: u32 = 32;

/// The tolerances governing a flattening call.
///
/// There is no sane default for the distance tolerance, so it has to be
/// supplied to the constructor; everything else starts out with conservative
/// defaults that yield pure flatness-driven termination.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct FlatteningOptions<S> {
    /// Maximum distance between the curve and its polyline approximation, in
    /// coordinate units. Must be positive and finite.
    pub distance_tolerance: S,
    /// Maximum cumulative tangent direction change tolerated across an accepted
    /// sub-segment, in radians. Values below `angle_tolerance_epsilon` disable
    /// angle-based refinement entirely.
    pub angle_tolerance: S,
    /// If nonzero, a single local turning angle above this value (radians) is
    /// treated as a cusp: the offending control point is emitted as a sharp
    /// vertex instead of being smoothed over. Zero disables cusp detection.
    pub cusp_limit: S,
    /// Cross-product areas below this threshold are treated as exactly
    /// collinear.
    pub collinearity_epsilon: S,
    /// An `angle_tolerance` below this threshold switches the angle checks off.
    pub angle_tolerance_epsilon: S,
    /// Hard ceiling on the subdivision depth, guaranteeing termination even for
    /// degenerate or numerically pathological inputs.
    pub recursion_limit: u32,
}

impl<S: Scalar> FlatteningOptions<S> {
    /// Creates a configuration from the mandatory distance tolerance.
    ///
    /// Angle-based refinement and cusp detection start out disabled.
    pub fn new(distance_tolerance: S) -> Self {
        FlatteningOptions {
            distance_tolerance,
            angle_tolerance: S::ZERO,
            cusp_limit: S::ZERO,
            collinearity_epsilon: S::value(1e-30),
            angle_tolerance_epsilon: S::value(0.01),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_angle_tolerance(mut self, radians: S) -> Self {
        self.angle_tolerance = radians;
        self
    }

    pub fn with_cusp_limit(mut self, radians: S) -> Self {
        self.cusp_limit = radians;
        self
    }

    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }
}

/// Iterates through the interior points of the flattened curve, invoking a
/// callback at each of them.
///
/// The callback never receives the curve's endpoints; the caller prepends
/// `curve.from` and appends `curve.to` to obtain the full polyline. Points are
/// produced in curve-parameter order.
///
/// Non-finite control points short-circuit to an empty result rather than
/// grinding through the recursion limit with meaningless arithmetic.
pub fn flatten_cubic_bezier<S: Scalar, F: FnMut(Point<S>)>(
    curve: &CubicBezierSegment<S>,
    options: &FlatteningOptions<S>,
    call_back: &mut F,
) {
    debug_assert!(options.distance_tolerance > S::ZERO);

    if !curve.is_finite() {
        return;
    }

    let square_tolerance = options.distance_tolerance * options.distance_tolerance;
    flatten_recursive(curve, options, square_tolerance, 0, call_back);
}

fn flatten_recursive<S: Scalar, F: FnMut(Point<S>)>(
    curve: &CubicBezierSegment<S>,
    options: &FlatteningOptions<S>,
    square_tolerance: S,
    level: u32,
    call_back: &mut F,
) {
    if level > options.recursion_limit {
        return;
    }

    let (first, second) = curve.split(S::HALF);

    // The very first call always subdivides: a whole segment is never assumed
    // flat.
    if level > 0 {
        if let Some(points) = flattening_step(curve, first.to, square_tolerance, options) {
            for p in points {
                call_back(p);
            }
            return;
        }
    }

    // First half before second half, so that emission follows the curve's
    // parameterization.
    flatten_recursive(&first, options, square_tolerance, level + 1, call_back);
    flatten_recursive(&second, options, square_tolerance, level + 1, call_back);
}

/// Decides whether the subdivision can stop at this sub-segment and, if so,
/// which vertices stand in for it. `None` requests further subdivision.
///
/// `mid` is the point on the curve at parameter 0.5 of the sub-segment (the
/// split point computed by the caller).
fn flattening_step<S: Scalar>(
    curve: &CubicBezierSegment<S>,
    mid: Point<S>,
    square_tolerance: S,
    options: &FlatteningOptions<S>,
) -> Option<ArrayVec<Point<S>, 2>> {
    let chord = curve.to - curve.from;

    // Twice the area of the triangle formed by each control point with the
    // chord: a cheap proxy for how far ctrl1 and ctrl2 stray from it.
    let d2 = (curve.ctrl1 - curve.to).cross(chord).abs();
    let d3 = (curve.ctrl2 - curve.to).cross(chord).abs();

    let mut points = ArrayVec::new();

    if d2 > options.collinearity_epsilon && d3 > options.collinearity_epsilon {
        // Regular case, neither control point is collinear with the chord.
        if (d2 + d3) * (d2 + d3) > square_tolerance * chord.square_length() {
            return None;
        }

        if options.angle_tolerance < options.angle_tolerance_epsilon {
            points.push(mid);
            return Some(points);
        }

        // Angle & cusp conditions.
        let a23 = direction_angle(curve.ctrl1, curve.ctrl2);
        let da1 = turning_angle(a23 - direction_angle(curve.from, curve.ctrl1));
        let da2 = turning_angle(direction_angle(curve.ctrl2, curve.to) - a23);

        if da1 + da2 < options.angle_tolerance {
            points.push(mid);
            return Some(points);
        }

        if options.cusp_limit != S::ZERO {
            if da1 > options.cusp_limit {
                points.push(curve.ctrl1);
                return Some(points);
            }
            if da2 > options.cusp_limit {
                points.push(curve.ctrl2);
                return Some(points);
            }
        }

        return None;
    }

    if d2 > options.collinearity_epsilon {
        // from, ctrl2 and to are collinear, only ctrl1 stands out.
        if d2 * d2 > square_tolerance * chord.square_length() {
            return None;
        }

        if options.angle_tolerance < options.angle_tolerance_epsilon {
            points.push(mid);
            return Some(points);
        }

        let da1 = turning_angle(
            direction_angle(curve.ctrl1, curve.ctrl2) - direction_angle(curve.from, curve.ctrl1),
        );

        if da1 < options.angle_tolerance {
            points.push(curve.ctrl1);
            points.push(curve.ctrl2);
            return Some(points);
        }

        if options.cusp_limit != S::ZERO && da1 > options.cusp_limit {
            points.push(curve.ctrl1);
            return Some(points);
        }

        return None;
    }

    if d3 > options.collinearity_epsilon {
        // from, ctrl1 and to are collinear, only ctrl2 stands out.
        if d3 * d3 > square_tolerance * chord.square_length() {
            return None;
        }

        if options.angle_tolerance < options.angle_tolerance_epsilon {
            points.push(mid);
            return Some(points);
        }

        let da1 = turning_angle(
            direction_angle(curve.ctrl2, curve.to) - direction_angle(curve.ctrl1, curve.ctrl2),
        );

        if da1 < options.angle_tolerance {
            points.push(curve.ctrl1);
            points.push(curve.ctrl2);
            return Some(points);
        }

        if options.cusp_limit != S::ZERO && da1 > options.cusp_limit {
            points.push(curve.ctrl2);
            return Some(points);
        }

        return None;
    }

    // Fully collinear control polygon, possibly with a near-zero chord. Fall
    // back to the offset of the curve midpoint from the chord midpoint.
    let offset = mid - curve.baseline().mid_point();
    if offset.square_length() <= square_tolerance {
        points.push(mid);
        return Some(points);
    }

    None
}

fn direction_angle<S: Scalar>(from: Point<S>, to: Point<S>) -> S {
    (to.y - from.y).atan2(to.x - from.x)
}

// Fold an angle difference into [0, π].
fn turning_angle<S: Scalar>(da: S) -> S {
    let da = da.abs();
    if da >= S::PI() {
        S::TWO * S::PI() - da
    } else {
        da
    }
}

/// An iterator over a cubic bezier segment that yields the interior points of
/// the flattened approximation.
///
/// The iterator starts at the first point *after* the origin of the curve and
/// ends at the last point *before* its destination, producing the same sequence
/// as [`flatten_cubic_bezier`].
pub struct Flattened<S: Scalar> {
    options: FlatteningOptions<S>,
    square_tolerance: S,
    // Sub-curves left to process, the earliest in curve order on top.
    stack: Vec<(CubicBezierSegment<S>, u32)>,
    pending: Option<Point<S>>,
}

impl<S: Scalar> Flattened<S> {
    pub(crate) fn new(curve: &CubicBezierSegment<S>, options: &FlatteningOptions<S>) -> Self {
        debug_assert!(options.distance_tolerance > S::ZERO);

        let mut stack = Vec::new();
        if curve.is_finite() {
            stack.push((*curve, 0));
        }

        Flattened {
            options: *options,
            square_tolerance: options.distance_tolerance * options.distance_tolerance,
            stack,
            pending: None,
        }
    }
}

impl<S: Scalar> Iterator for Flattened<S> {
    type Item = Point<S>;

    fn next(&mut self) -> Option<Point<S>> {
        if let Some(p) = self.pending.take() {
            return Some(p);
        }

        while let Some((curve, level)) = self.stack.pop() {
            if level > self.options.recursion_limit {
                continue;
            }

            let (first, second) = curve.split(S::HALF);

            if level > 0 {
                if let Some(points) =
                    flattening_step(&curve, first.to, self.square_tolerance, &self.options)
                {
                    let mut points = points.into_iter();
                    let head = points.next();
                    debug_assert!(head.is_some());
                    self.pending = points.next();
                    return head;
                }
            }

            self.stack.push((second, level + 1));
            self.stack.push((first, level + 1));
        }

        None
    }
}

#[cfg(test)]
use crate::{point, LineSegment};

// Interior points with the curve endpoints attached, i.e. the polyline the
// drawing host would actually render.
#[cfg(test)]
fn polyline_with_endpoints(
    curve: &CubicBezierSegment<f64>,
    options: &FlatteningOptions<f64>,
) -> Vec<Point<f64>> {
    let mut polyline = vec![curve.from];
    polyline.extend(curve.flatten(options));
    polyline.push(curve.to);
    polyline
}

// Maximum distance from a dense sampling of the curve to the polyline.
#[cfg(test)]
fn max_deviation(curve: &CubicBezierSegment<f64>, polyline: &[Point<f64>]) -> f64 {
    let mut max = 0.0f64;
    for i in 0..=1000 {
        let t = i as f64 / 1000.0;
        let p = curve.sample(t);
        let mut min = f64::MAX;
        for pair in polyline.windows(2) {
            let segment = LineSegment {
                from: pair[0],
                to: pair[1],
            };
            min = min.min(segment.distance_to_point(p));
        }
        max = max.max(min);
    }
    max
}

// Distance from a point to a dense sampling of the curve.
#[cfg(test)]
fn distance_to_curve(curve: &CubicBezierSegment<f64>, p: Point<f64>) -> f64 {
    let mut min = f64::MAX;
    for i in 0..=1000 {
        let t = i as f64 / 1000.0;
        min = min.min((curve.sample(t) - p).length());
    }
    min
}

#[test]
fn collinear_segment_stays_on_the_line() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 0.0),
        ctrl2: point(6.0, 0.0),
        to: point(10.0, 0.0),
    };

    let options = FlatteningOptions::new(0.5);
    let points = curve.flatten(&options);

    let mut previous_x = 0.0;
    for p in &points {
        assert_eq!(p.y, 0.0);
        assert!(p.x > 0.0 && p.x < 10.0);
        assert!(p.x > previous_x);
        previous_x = p.x;
    }
}

#[test]
fn symmetric_curve_yields_symmetric_points() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 4.0),
        ctrl2: point(7.0, 4.0),
        to: point(10.0, 0.0),
    };

    let options = FlatteningOptions::new(0.25);
    let points = curve.flatten(&options);
    assert!(!points.is_empty());

    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[n - 1 - i];
        assert!((a.x + b.x - 10.0).abs() < 1e-6);
        assert!((a.y - b.y).abs() < 1e-6);
    }
}

#[test]
fn tighter_tolerance_never_removes_points() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 4.0),
        ctrl2: point(7.0, 4.0),
        to: point(10.0, 0.0),
    };

    let mut previous_count = 0;
    for &tolerance in &[2.0, 0.5, 0.1, 0.02] {
        let options = FlatteningOptions::new(tolerance);
        let polyline = polyline_with_endpoints(&curve, &options);

        let count = polyline.len();
        assert!(count >= previous_count);
        previous_count = count;

        // A small slack absorbs the sampling granularity of the measurement.
        assert!(max_deviation(&curve, &polyline) <= tolerance * 1.05 + 1e-9);
    }
}

#[test]
fn recursion_limit_bounds_degenerate_input() {
    // All four control points coincide.
    let degenerate = CubicBezierSegment {
        from: point(5.0f64, 5.0),
        ctrl1: point(5.0, 5.0),
        ctrl2: point(5.0, 5.0),
        to: point(5.0, 5.0),
    };

    let options = FlatteningOptions::new(0.1);
    let points = degenerate.flatten(&options);
    assert!(!points.is_empty());
    for p in &points {
        assert_eq!(*p, point(5.0, 5.0));
    }

    // A self-overlapping control polygon forming an extreme cusp, with a
    // tolerance tight enough that only the depth ceiling stops the recursion.
    let cusp = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(100.0, 0.0),
        ctrl2: point(-100.0, 0.0),
        to: point(10.0, 0.0),
    };

    let limit = 8;
    let options = FlatteningOptions::new(1e-6).with_recursion_limit(limit);
    let points = cusp.flatten(&options);

    // Each surviving leaf of the subdivision tree emits at most two points.
    assert!(points.len() <= 1usize << (limit + 2));
}

#[test]
fn endpoints_are_not_emitted() {
    let curves = [
        CubicBezierSegment {
            from: point(0.0f64, 0.0),
            ctrl1: point(10.0, 0.0),
            ctrl2: point(10.0, 10.0),
            to: point(0.0, 10.0),
        },
        CubicBezierSegment {
            from: point(0.0f64, 0.0),
            ctrl1: point(1.0, 0.0),
            ctrl2: point(0.0, 1.0),
            to: point(1.0, 1.0),
        },
        CubicBezierSegment {
            from: point(0.0f64, 0.0),
            ctrl1: point(0.0, 0.0),
            ctrl2: point(50.0, 70.0),
            to: point(100.0, 100.0),
        },
    ];

    let options = FlatteningOptions::new(0.01);
    for curve in &curves {
        for p in curve.flatten(&options) {
            assert!((p - curve.from).length() > 1e-6);
            assert!((p - curve.to).length() > 1e-6);
        }
    }
}

#[test]
fn cusp_limit_emits_sharp_vertices() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(10.0, 0.0),
        ctrl2: point(10.0, 10.0),
        to: point(0.0, 10.0),
    };

    // Without cusp detection every accepted sub-segment is represented by its
    // curve midpoint, so all emitted points lie on the curve itself (the
    // threshold absorbs the sampling granularity of the measurement).
    let smooth = FlatteningOptions::new(5.0).with_angle_tolerance(0.5);
    for p in curve.flatten(&smooth) {
        assert!(distance_to_curve(&curve, p) < 0.02);
    }

    // With a small cusp limit the sharp turns at the control points are kept as
    // explicit vertices, away from the curve and towards ctrl1/ctrl2.
    let with_cusp = smooth.with_cusp_limit(0.1);
    let points = curve.flatten(&with_cusp);

    assert_eq!(points.len(), 2);
    assert!((points[0] - point(5.0, 0.0)).length() < 1e-9);
    assert!((points[1] - point(7.5, 7.5)).length() < 1e-9);
    assert!(distance_to_curve(&curve, points[0]) > 1.0);
}

#[test]
fn angle_tolerance_increases_density() {
    let curve = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 4.0),
        ctrl2: point(7.0, 4.0),
        to: point(10.0, 0.0),
    };

    let flatness_only = FlatteningOptions::new(2.0);
    let with_angle = flatness_only.with_angle_tolerance(0.1);

    assert!(curve.flatten(&with_angle).len() > curve.flatten(&flatness_only).len());
}

#[test]
fn non_finite_input_yields_empty_polyline() {
    let options = FlatteningOptions::new(0.1);

    let nan_curve = CubicBezierSegment {
        from: point(0.0f32, 0.0),
        ctrl1: point(f32::NAN, 4.0),
        ctrl2: point(7.0, 4.0),
        to: point(10.0, 0.0),
    };
    assert!(nan_curve.flatten(&options).is_empty());
    assert_eq!(nan_curve.flattened(&options).next(), None);

    let inf_curve = CubicBezierSegment {
        from: point(0.0f32, 0.0),
        ctrl1: point(3.0, 4.0),
        ctrl2: point(7.0, f32::INFINITY),
        to: point(10.0, 0.0),
    };
    assert!(inf_curve.flatten(&options).is_empty());
}

#[cfg(test)]
fn assert_approx_eq(a: &[Point<f64>], b: &[Point<f64>]) {
    if a.len() != b.len() {
        println!("left:  {:?}", a);
        println!("right: {:?}", b);
        panic!("Lengths differ ({} != {})", a.len(), b.len());
    }
    for i in 0..a.len() {
        if (a[i].x - b[i].x).abs() > 1e-9 || (a[i].y - b[i].y).abs() > 1e-9 {
            println!("left:  {:?}", a);
            println!("right: {:?}", b);
            panic!("The arrays are not equal");
        }
    }
}

#[test]
fn test_iterator_builder_1() {
    let options = FlatteningOptions::new(0.01);
    let c1 = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(1.0, 0.0),
        ctrl2: point(1.0, 1.0),
        to: point(0.0, 1.0),
    };
    let iter_points: Vec<Point<f64>> = c1.flattened(&options).collect();
    let mut builder_points = Vec::new();
    c1.for_each_flattened(&options, &mut |p| {
        builder_points.push(p);
    });

    assert!(iter_points.len() > 2);
    assert_approx_eq(&iter_points[..], &builder_points[..]);
}

#[test]
fn test_iterator_builder_2() {
    let options = FlatteningOptions::new(0.01)
        .with_angle_tolerance(0.2)
        .with_cusp_limit(0.5);
    let c1 = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(1.0, 0.0),
        ctrl2: point(0.0, 1.0),
        to: point(1.0, 1.0),
    };
    let iter_points: Vec<Point<f64>> = c1.flattened(&options).collect();
    let mut builder_points = Vec::new();
    c1.for_each_flattened(&options, &mut |p| {
        builder_points.push(p);
    });

    assert!(iter_points.len() > 2);
    assert_approx_eq(&iter_points[..], &builder_points[..]);
}

#[test]
fn test_iterator_builder_3() {
    let options = FlatteningOptions::new(0.01);
    let c1 = CubicBezierSegment {
        from: point(141.0f64, 135.0),
        ctrl1: point(141.0, 130.0),
        ctrl2: point(140.0, 130.0),
        to: point(131.0, 130.0),
    };
    let iter_points: Vec<Point<f64>> = c1.flattened(&options).collect();
    let mut builder_points = Vec::new();
    c1.for_each_flattened(&options, &mut |p| {
        builder_points.push(p);
    });

    assert!(iter_points.len() > 2);
    assert_approx_eq(&iter_points[..], &builder_points[..]);
}
