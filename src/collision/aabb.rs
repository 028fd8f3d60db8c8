//! Axis Aligned Bounding Box.

use crate::math::{Point, Real, Vector, DIM};

/// An Axis-Aligned Bounding Box, defined by its minimum and maximum corners.
///
/// Invariant: `mins[i] <= maxs[i]` for every axis, except for the empty box
/// returned by [`Aabb::new_invalid`] which contains no point at all.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// The point with the smallest coordinates of this AABB.
    pub mins: Point,
    /// The point with the greatest coordinates of this AABB.
    pub maxs: Point,
}

impl Aabb {
    /// Creates a new AABB from its minimum and maximum corners.
    #[inline]
    pub fn new(mins: Point, maxs: Point) -> Aabb {
        Aabb { mins, maxs }
    }

    /// Creates an invalid AABB with `mins` greater than `maxs`, so that
    /// growing it with any point yields a valid box.
    #[inline]
    pub fn new_invalid() -> Self {
        Aabb {
            mins: Point::from(Vector::repeat(Real::MAX)),
            maxs: Point::from(Vector::repeat(-Real::MAX)),
        }
    }

    /// The smallest AABB containing all the given points.
    pub fn from_points(points: &[Point]) -> Aabb {
        let mut result = Aabb::new_invalid();
        for pt in points {
            result.take_point(*pt);
        }
        result
    }

    /// Grows this AABB so it contains `pt`.
    #[inline]
    pub fn take_point(&mut self, pt: Point) {
        self.mins = self.mins.inf(&pt);
        self.maxs = self.maxs.sup(&pt);
    }

    /// Enlarges this AABB by `amount` on every side.
    #[inline]
    pub fn loosened(&self, amount: Real) -> Aabb {
        let margin = Vector::repeat(amount);
        Aabb {
            mins: self.mins - margin,
            maxs: self.maxs + margin,
        }
    }

    /// Checks whether `pt` lies inside this AABB.
    #[inline]
    pub fn contains_local_point(&self, pt: &Point) -> bool {
        for i in 0..DIM {
            if pt[i] < self.mins[i] || pt[i] > self.maxs[i] {
                return false;
            }
        }
        true
    }
}
