//! Triangle closest-point projection.

use crate::math::{Point, UnitVector};
use crate::utils;

/// A triangle shape.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Triangle {
    /// The triangle first point.
    pub a: Point,
    /// The triangle second point.
    pub b: Point,
    /// The triangle third point.
    pub c: Point,
}

impl Triangle {
    /// Creates a triangle from three points.
    #[inline]
    pub fn new(a: Point, b: Point, c: Point) -> Triangle {
        Triangle { a, b, c }
    }

    /// The normal of the counter-clock-wise winding, or `None` if the
    /// triangle is degenerate.
    #[inline]
    pub fn normal(&self) -> Option<UnitVector> {
        utils::ccw_face_normal([&self.a, &self.b, &self.c])
    }

    /// Projects `pt` onto this triangle, Voronoï region by Voronoï region.
    pub fn closest_point(&self, pt: &Point) -> Point {
        let a = self.a;
        let b = self.b;
        let c = self.c;

        let ab = b - a;
        let ac = c - a;
        let ap = pt - a;

        let ab_ap = ab.dot(&ap);
        let ac_ap = ac.dot(&ap);

        if ab_ap <= 0.0 && ac_ap <= 0.0 {
            // Voronoï region of `a`.
            return a;
        }

        let bp = pt - b;
        let ab_bp = ab.dot(&bp);
        let ac_bp = ac.dot(&bp);

        if ab_bp >= 0.0 && ac_bp <= ab_bp {
            // Voronoï region of `b`.
            return b;
        }

        let cp = pt - c;
        let ab_cp = ab.dot(&cp);
        let ac_cp = ac.dot(&cp);

        if ac_cp >= 0.0 && ab_cp <= ac_cp {
            // Voronoï region of `c`.
            return c;
        }

        let n = ab.cross(&ac);

        let vc = n.dot(&ab.cross(&ap));
        if vc < 0.0 && ab_ap >= 0.0 && ab_bp <= 0.0 {
            // Voronoï region of `ab`.
            let v = ab_ap / ab.norm_squared();
            return a + ab * v;
        }

        let vb = -n.dot(&ac.cross(&cp));
        if vb < 0.0 && ac_ap >= 0.0 && ac_cp <= 0.0 {
            // Voronoï region of `ac`.
            let w = ac_ap / ac.norm_squared();
            return a + ac * w;
        }

        let bc = c - b;
        let va = n.dot(&bc.cross(&bp));
        if va < 0.0 && ac_bp - ab_bp >= 0.0 && ab_cp - ac_cp >= 0.0 {
            // Voronoï region of `bc`.
            let w = bc.dot(&bp) / bc.norm_squared();
            return b + bc * w;
        }

        // Voronoï region of the face. Nearly degenerate triangles may zero
        // the denominator; fall back to the nearest vertex in that case.
        let denom_sum = va + vb + vc;
        if denom_sum != 0.0 {
            let denom = 1.0 / denom_sum;
            let v = vb * denom;
            let w = vc * denom;
            a + ab * v + ac * w
        } else {
            nearest_vertex(pt, [a, b, c])
        }
    }
}

fn nearest_vertex(pt: &Point, vertices: [Point; 3]) -> Point {
    let mut best = vertices[0];
    let mut best_dist = (pt - best).norm_squared();
    for v in &vertices[1..] {
        let dist = (pt - v).norm_squared();
        if dist < best_dist {
            best_dist = dist;
            best = *v;
        }
    }
    best
}
