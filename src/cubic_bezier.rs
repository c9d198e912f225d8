use crate::flatten_cubic::{flatten_cubic_bezier, FlatteningOptions};
use crate::scalar::Scalar;
use crate::{LineSegment, Point, Vector};

pub use crate::flatten_cubic::Flattened;

/// A 2d curve segment defined by four points: the beginning of the segment, two control
/// points and the end of the segment.
///
/// The curve is defined by equation:
/// ```∀ t ∈ [0..1],  P(t) = (1 - t)³ * from + 3 * (1 - t)² * t * ctrl1 + 3 * t² * (1 - t) * ctrl2 + t³ * to```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct CubicBezierSegment<S> {
    pub from: Point<S>,
    pub ctrl1: Point<S>,
    pub ctrl2: Point<S>,
    pub to: Point<S>,
}

impl<S: Scalar> CubicBezierSegment<S> {
    /// Sample the curve at t (expecting t between 0 and 1).
    pub fn sample(&self, t: S) -> Point<S> {
        let t2 = t * t;
        let t3 = t2 * t;
        let one_t = S::ONE - t;
        let one_t2 = one_t * one_t;
        let one_t3 = one_t2 * one_t;

        self.from * one_t3
            + self.ctrl1.to_vector() * S::THREE * one_t2 * t
            + self.ctrl2.to_vector() * S::THREE * one_t * t2
            + self.to.to_vector() * t3
    }

    /// Sample the x coordinate of the curve at t (expecting t between 0 and 1).
    pub fn x(&self, t: S) -> S {
        self.sample(t).x
    }

    /// Sample the y coordinate of the curve at t (expecting t between 0 and 1).
    pub fn y(&self, t: S) -> S {
        self.sample(t).y
    }

    /// Sample the curve's derivative at t (expecting t between 0 and 1).
    pub fn derivative(&self, t: S) -> Vector<S> {
        let one_t = S::ONE - t;

        (self.ctrl1 - self.from) * S::THREE * one_t * one_t
            + (self.ctrl2 - self.ctrl1) * S::SIX * one_t * t
            + (self.to - self.ctrl2) * S::THREE * t * t
    }

    /// Sample the x coordinate of the curve's derivative at t (expecting t between 0 and 1).
    pub fn dx(&self, t: S) -> S {
        self.derivative(t).x
    }

    /// Sample the y coordinate of the curve's derivative at t (expecting t between 0 and 1).
    pub fn dy(&self, t: S) -> S {
        self.derivative(t).y
    }

    /// Split this curve into two sub-curves.
    pub fn split(&self, t: S) -> (CubicBezierSegment<S>, CubicBezierSegment<S>) {
        let ctrl1a = self.from + (self.ctrl1 - self.from) * t;
        let ctrl2a = self.ctrl1 + (self.ctrl2 - self.ctrl1) * t;
        let ctrl1aa = ctrl1a + (ctrl2a - ctrl1a) * t;
        let ctrl3a = self.ctrl2 + (self.to - self.ctrl2) * t;
        let ctrl2aa = ctrl2a + (ctrl3a - ctrl2a) * t;
        let ctrl1aaa = ctrl1aa + (ctrl2aa - ctrl1aa) * t;

        (
            CubicBezierSegment {
                from: self.from,
                ctrl1: ctrl1a,
                ctrl2: ctrl1aa,
                to: ctrl1aaa,
            },
            CubicBezierSegment {
                from: ctrl1aaa,
                ctrl1: ctrl2aa,
                ctrl2: ctrl3a,
                to: self.to,
            },
        )
    }

    /// Return the curve before the split point.
    pub fn before_split(&self, t: S) -> CubicBezierSegment<S> {
        self.split(t).0
    }

    /// Return the curve after the split point.
    pub fn after_split(&self, t: S) -> CubicBezierSegment<S> {
        self.split(t).1
    }

    /// The chord of the segment, from its beginning to its end.
    #[inline]
    pub fn baseline(&self) -> LineSegment<S> {
        LineSegment {
            from: self.from,
            to: self.to,
        }
    }

    /// Swap the beginning and the end of the segment.
    pub fn flip(&self) -> Self {
        CubicBezierSegment {
            from: self.to,
            ctrl1: self.ctrl2,
            ctrl2: self.ctrl1,
            to: self.from,
        }
    }

    /// Whether the control points deviate from the chord by less than `tolerance`.
    pub fn is_linear(&self, tolerance: S) -> bool {
        if (self.from - self.to).square_length() < S::EPSILON {
            return false;
        }

        let baseline = self.baseline();
        baseline.distance_to_point(self.ctrl1) <= tolerance
            && baseline.distance_to_point(self.ctrl2) <= tolerance
    }

    /// Whether the segment is, within `tolerance`, a single point.
    pub fn is_a_point(&self, tolerance: S) -> bool {
        let tolerance_squared = tolerance * tolerance;
        // Use <= so that tolerance can be zero.
        (self.from - self.to).square_length() <= tolerance_squared
            && (self.from - self.ctrl1).square_length() <= tolerance_squared
            && (self.to - self.ctrl2).square_length() <= tolerance_squared
    }

    /// Whether all four control points are finite.
    pub fn is_finite(&self) -> bool {
        self.from.x.is_finite()
            && self.from.y.is_finite()
            && self.ctrl1.x.is_finite()
            && self.ctrl1.y.is_finite()
            && self.ctrl2.x.is_finite()
            && self.ctrl2.y.is_finite()
            && self.to.x.is_finite()
            && self.to.y.is_finite()
    }

    /// Flatten the curve into an owned polyline of interior points.
    ///
    /// The returned sequence follows the curve from `from` to `to` but contains
    /// neither endpoint; the caller prepends `from` and appends `to` to obtain
    /// the full approximation.
    pub fn flatten(&self, options: &FlatteningOptions<S>) -> Vec<Point<S>> {
        let mut points = Vec::new();
        self.for_each_flattened(options, &mut |p| {
            points.push(p);
        });

        points
    }

    /// Iterates through the interior points of the flattened curve, invoking a
    /// callback at each of them.
    pub fn for_each_flattened<F: FnMut(Point<S>)>(
        &self,
        options: &FlatteningOptions<S>,
        call_back: &mut F,
    ) {
        flatten_cubic_bezier(self, options, call_back);
    }

    /// Returns the flattened representation of the curve as an iterator over the
    /// interior points, starting *after* the beginning of the curve and ending
    /// *before* its end.
    pub fn flattened(&self, options: &FlatteningOptions<S>) -> Flattened<S> {
        Flattened::new(self, options)
    }

    /// Compute the length of the segment using a flattened approximation.
    pub fn approximate_length(&self, options: &FlatteningOptions<S>) -> S {
        let mut from = self.from;
        let mut len = S::ZERO;
        self.for_each_flattened(options, &mut |to| {
            len += (to - from).length();
            from = to;
        });
        len += (self.to - from).length();

        len
    }
}

#[cfg(test)]
use crate::point;

#[test]
fn sample_at_endpoints() {
    let c = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(1.0, 2.0),
        ctrl2: point(4.0, 2.0),
        to: point(5.0, 0.0),
    };

    assert_eq!(c.sample(0.0), c.from);
    assert_eq!(c.sample(1.0), c.to);
}

#[test]
fn split_at_midpoint() {
    let c = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 4.0),
        ctrl2: point(7.0, 4.0),
        to: point(10.0, 0.0),
    };

    let (first, second) = c.split(0.5);

    assert_eq!(first.from, c.from);
    assert_eq!(second.to, c.to);
    assert_eq!(first.to, second.from);

    let mid = c.sample(0.5);
    assert!((first.to.x - mid.x).abs() < 1e-9);
    assert!((first.to.y - mid.y).abs() < 1e-9);

    // The two sub-curves sample the same positions as the original curve.
    for i in 0..=10 {
        let t = i as f64 / 10.0;
        let a = first.sample(t);
        let b = c.sample(t * 0.5);
        assert!((a - b).length() < 1e-9);
    }
}

#[test]
fn derivatives() {
    let c1 = CubicBezierSegment {
        from: point(1.0f32, 1.0),
        ctrl1: point(1.0, 2.0),
        ctrl2: point(2.0, 1.0),
        to: point(2.0, 2.0),
    };

    assert_eq!(c1.dx(0.0), 0.0);
    assert_eq!(c1.dx(1.0), 0.0);
    assert_eq!(c1.dy(0.5), 0.0);
}

#[test]
fn is_linear() {
    let c = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 0.0),
        ctrl2: point(6.0, 0.0),
        to: point(10.0, 0.0),
    };
    assert!(c.is_linear(1e-9));

    let c = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 1.0),
        ctrl2: point(6.0, 0.0),
        to: point(10.0, 0.0),
    };
    assert!(!c.is_linear(1e-9));
}

#[test]
fn is_a_point() {
    let p = point(3.0f64, 4.0);
    let c = CubicBezierSegment {
        from: p,
        ctrl1: p,
        ctrl2: p,
        to: p,
    };
    assert!(c.is_a_point(0.0));

    let c = CubicBezierSegment {
        from: p,
        ctrl1: p,
        ctrl2: point(3.1, 4.0),
        to: p,
    };
    assert!(!c.is_a_point(0.0));
    assert!(c.is_a_point(0.2));
}

#[test]
fn is_finite() {
    let c = CubicBezierSegment {
        from: point(0.0f32, 0.0),
        ctrl1: point(3.0, 1.0),
        ctrl2: point(6.0, 0.0),
        to: point(10.0, 0.0),
    };
    assert!(c.is_finite());

    let mut bad = c;
    bad.ctrl2.y = f32::NAN;
    assert!(!bad.is_finite());

    let mut bad = c;
    bad.to.x = f32::INFINITY;
    assert!(!bad.is_finite());
}

#[test]
fn approximate_length_of_a_line() {
    let c = CubicBezierSegment {
        from: point(0.0f64, 0.0),
        ctrl1: point(3.0, 0.0),
        ctrl2: point(6.0, 0.0),
        to: point(10.0, 0.0),
    };

    let options = FlatteningOptions::new(0.01);
    assert!((c.approximate_length(&options) - 10.0).abs() < 0.01);
}
