#![deny(bare_trait_objects)]
#![deny(unconditional_recursion)]
#![allow(clippy::many_single_char_names)]

//! Adaptive flattening of 2d cubic bézier curve segments on top of euclid.
//!
//! # Flattening
//!
//! Flattening is the action of approximating a curve with a succession of line
//! segments, so that a renderer or hit-tester only ever has to deal with
//! polylines.
//!
//! This crate implements the classic recursive de Casteljau subdivision scheme:
//! a segment is split at its parametric midpoint until each piece is flat
//! enough, where "flat enough" is governed by a [`FlatteningOptions`] value
//! combining a distance tolerance, an optional angle tolerance, cusp detection
//! and a hard recursion limit.
//!
//! The distance tolerance corresponds to the maximum distance between the curve
//! and its linear approximation. The smaller the tolerance is, the more precise
//! the approximation and the more points are generated. This value is typically
//! chosen in function of the zoom level.
//!
//! The produced points are the *interior* vertices of the approximation: the
//! segment's endpoints are never emitted and it is up to the caller to prepend
//! `from` and append `to` when building the full polyline.
//!
//! ```
//! use bezier_flatten::{CubicBezierSegment, FlatteningOptions, point};
//!
//! let curve = CubicBezierSegment {
//!     from: point(0.0, 0.0),
//!     ctrl1: point(3.0, 4.0),
//!     ctrl2: point(7.0, 4.0),
//!     to: point(10.0, 0.0),
//! };
//!
//! let options = FlatteningOptions::new(0.1);
//! let mut polyline = vec![curve.from];
//! polyline.extend(curve.flatten(&options));
//! polyline.push(curve.to);
//! ```

// Reexport dependencies.
pub use arrayvec;
pub use euclid;

#[cfg(feature = "serialization")]
#[macro_use]
pub extern crate serde;

pub mod cubic_bezier;
pub mod flatten_cubic;
mod line;

#[doc(inline)]
pub use crate::cubic_bezier::CubicBezierSegment;
#[doc(inline)]
pub use crate::flatten_cubic::{flatten_cubic_bezier, FlatteningOptions, Flattened};
#[doc(inline)]
pub use crate::line::LineSegment;

pub use crate::scalar::Scalar;

mod scalar {
    pub(crate) use num_traits::{Float, FloatConst, NumCast};

    use core::fmt::{Debug, Display};
    use core::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

    pub trait Scalar:
        Float
        + NumCast
        + FloatConst
        + Sized
        + Display
        + Debug
        + AddAssign
        + SubAssign
        + MulAssign
        + DivAssign
    {
        const HALF: Self;
        const ZERO: Self;
        const ONE: Self;
        const TWO: Self;
        const THREE: Self;
        const FOUR: Self;
        const SIX: Self;
        const NINE: Self;

        const EPSILON: Self;

        fn value(v: f32) -> Self;
    }

    impl Scalar for f32 {
        const HALF: Self = 0.5;
        const ZERO: Self = 0.0;
        const ONE: Self = 1.0;
        const TWO: Self = 2.0;
        const THREE: Self = 3.0;
        const FOUR: Self = 4.0;
        const SIX: Self = 6.0;
        const NINE: Self = 9.0;

        const EPSILON: Self = 1e-4;

        #[inline]
        fn value(v: f32) -> Self {
            v
        }
    }

    impl Scalar for f64 {
        const HALF: Self = 0.5;
        const ZERO: Self = 0.0;
        const ONE: Self = 1.0;
        const TWO: Self = 2.0;
        const THREE: Self = 3.0;
        const FOUR: Self = 4.0;
        const SIX: Self = 6.0;
        const NINE: Self = 9.0;

        const EPSILON: Self = 1e-8;

        #[inline]
        fn value(v: f32) -> Self {
            v as f64
        }
    }
}

/// Alias for `euclid::default::Point2D`.
pub use euclid::default::Point2D as Point;

/// Alias for `euclid::default::Vector2D`.
pub use euclid::default::Vector2D as Vector;

/// Shorthand for `Vector::new(x, y)`.
#[inline]
pub fn vector<S>(x: S, y: S) -> Vector<S> {
    Vector::new(x, y)
}

/// Shorthand for `Point::new(x, y)`.
#[inline]
pub fn point<S>(x: S, y: S) -> Point<S> {
    Point::new(x, y)
}
