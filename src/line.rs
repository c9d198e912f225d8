use crate::scalar::Scalar;
use crate::{Point, Vector};

/// A linear segment.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct LineSegment<S> {
    pub from: Point<S>,
    pub to: Point<S>,
}

impl<S: Scalar> LineSegment<S> {
    /// Sample the segment at t (expecting t between 0 and 1).
    #[inline]
    pub fn sample(&self, t: S) -> Point<S> {
        self.from.lerp(self.to, t)
    }

    /// Returns an inverted version of this segment where the beginning and the end
    /// points are swapped.
    #[inline]
    pub fn flip(&self) -> Self {
        LineSegment {
            from: self.to,
            to: self.from,
        }
    }

    #[inline]
    pub fn to_vector(&self) -> Vector<S> {
        self.to - self.from
    }

    /// The length of the segment.
    #[inline]
    pub fn length(&self) -> S {
        self.to_vector().length()
    }

    #[inline]
    pub fn square_length(&self) -> S {
        self.to_vector().square_length()
    }

    #[inline]
    pub fn mid_point(&self) -> Point<S> {
        self.sample(S::HALF)
    }

    /// Returns the closest point on the segment to a given point.
    pub fn closest_point(&self, p: Point<S>) -> Point<S> {
        let v = self.to_vector();
        let square_length = v.square_length();
        if square_length == S::ZERO {
            return self.from;
        }

        let t = (p - self.from).dot(v) / square_length;

        self.sample(t.max(S::ZERO).min(S::ONE))
    }

    /// Squared distance from a point to the segment.
    pub fn square_distance_to_point(&self, p: Point<S>) -> S {
        (self.closest_point(p) - p).square_length()
    }

    /// Distance from a point to the segment.
    pub fn distance_to_point(&self, p: Point<S>) -> S {
        self.square_distance_to_point(p).sqrt()
    }
}

#[cfg(test)]
use crate::point;

#[test]
fn closest_point_on_segment() {
    let seg = LineSegment {
        from: point(0.0f64, 0.0),
        to: point(10.0, 0.0),
    };

    assert_eq!(seg.closest_point(point(3.0, 5.0)), point(3.0, 0.0));
    assert_eq!(seg.closest_point(point(-2.0, 1.0)), point(0.0, 0.0));
    assert_eq!(seg.closest_point(point(12.0, -1.0)), point(10.0, 0.0));
}

#[test]
fn distance_to_point() {
    let seg = LineSegment {
        from: point(0.0f32, 0.0),
        to: point(4.0, 0.0),
    };

    assert!((seg.distance_to_point(point(2.0, 3.0)) - 3.0).abs() < 1e-6);
    assert!((seg.distance_to_point(point(7.0, 4.0)) - 5.0).abs() < 1e-6);

    let degenerate = LineSegment {
        from: point(1.0f32, 1.0),
        to: point(1.0, 1.0),
    };
    assert!((degenerate.distance_to_point(point(1.0, 2.0)) - 1.0).abs() < 1e-6);
}

#[test]
fn simple_sample() {
    let seg = LineSegment {
        from: point(0.0f32, 0.0),
        to: point(10.0, 4.0),
    };

    assert_eq!(seg.sample(0.0), seg.from);
    assert_eq!(seg.sample(1.0), seg.to);
    assert_eq!(seg.mid_point(), point(5.0, 2.0));
    assert_eq!(seg.flip().sample(1.0), seg.from);
}
