//! Various unsorted geometrical and logical operators.

pub use self::sorted_pair::SortedPair;

mod sorted_pair;

use crate::math::{Point, UnitVector, DEFAULT_EPSILON};

/// Computes the normal of a counter-clock-wise triangle.
///
/// Returns `None` if the triangle is degenerate.
#[inline]
pub fn ccw_face_normal(pts: [&Point; 3]) -> Option<UnitVector> {
    let ab = *pts[1] - *pts[0];
    let ac = *pts[2] - *pts[0];
    let res = ab.cross(&ac);

    UnitVector::try_new(res, DEFAULT_EPSILON)
}
