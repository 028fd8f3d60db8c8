//! Vertex-level penetration detection and push-out resolution.

use crate::collision::BakedSurface;
use crate::math::{Point, Real, UnitVector};
use ordered_float::OrderedFloat;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};

/// Smallest accepted push-out distance, in length units.
pub const MIN_PUSH_OUT: Real = 0.0005;
/// Largest accepted push-out distance, in length units.
pub const MAX_PUSH_OUT: Real = 0.05;
/// Smallest accepted penetration threshold.
pub const MIN_THRESHOLD: Real = 0.001;
/// Largest accepted penetration threshold.
pub const MAX_THRESHOLD: Real = 0.1;

/// How much the local bounding box is expanded, as a multiple of the
/// penetration threshold, before rejecting a vertex.
const BBOX_EXPANSION: Real = 4.0;

/// One detected penetration of a vertex against a reference triangle.
#[derive(Copy, Clone, Debug)]
pub struct PenetrationCandidate {
    /// Penetration depth, always `>= 0`.
    pub depth: Real,
    /// World-space push-out direction (the offending triangle's normal).
    pub dir: UnitVector,
}

/// Clamped numeric settings of one resolution pass.
#[derive(Copy, Clone, Debug)]
pub struct ResolveSettings {
    /// Clearance added beyond the surface after push-out.
    pub push_out: Real,
    /// Maximum depth at which a back-side vertex still counts as
    /// penetrating.
    pub threshold: Real,
    /// Triangle scan stride for priority surfaces.
    pub priority_stride: usize,
    /// Triangle scan stride for remainder surfaces.
    pub remainder_stride: usize,
}

impl ResolveSettings {
    /// Clamps `push_out` and `threshold` into their safe ranges and derives
    /// scan strides: advanced sampling scans every priority triangle,
    /// otherwise every second one; remainder surfaces scan twice as coarse.
    pub fn new(push_out: Real, threshold: Real, advanced_sampling: bool) -> Self {
        let priority_stride = if advanced_sampling { 1 } else { 2 };
        ResolveSettings {
            push_out: push_out.clamp(MIN_PUSH_OUT, MAX_PUSH_OUT),
            threshold: threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            priority_stride,
            remainder_stride: priority_stride * 2,
        }
    }
}

/// Scans one surface for penetrations of a world-space point.
///
/// The point is pulled into the surface's local space, rejected early if it
/// lies outside the expanded local bounding box, then tested against every
/// `stride`-th triangle: the closest point on the triangle is computed and
/// the signed distance taken along the triangle normal. A point on the back
/// side within `threshold` yields a candidate. Degenerate triangles have no
/// normal and are skipped rather than corrected.
fn collect_candidates(
    surface: &BakedSurface,
    world_pt: &Point,
    stride: usize,
    threshold: Real,
    out: &mut SmallVec<[PenetrationCandidate; 4]>,
) {
    let local_pt = surface.world.inverse_transform_point(world_pt);
    if !surface
        .local_aabb()
        .loosened(threshold * BBOX_EXPANSION)
        .contains_local_point(&local_pt)
    {
        return;
    }

    let mut i = 0;
    while i < surface.num_triangles() {
        let tri = surface.triangle(i);
        i += stride;

        let Some(local_normal) = tri.normal() else {
            continue;
        };

        let closest = tri.closest_point(&local_pt);
        let world_closest = surface.world.transform_point(&closest);
        let world_normal = surface.world.transform_vector(&local_normal);
        let Some(world_normal) = UnitVector::try_new(world_normal, 1.0e-9) else {
            continue;
        };

        let signed = world_normal.dot(&(world_pt - world_closest));
        if signed < 0.0 && -signed <= threshold {
            out.push(PenetrationCandidate {
                depth: -signed,
                dir: world_normal,
            });
        }
    }
}

/// Resolves penetrations of a world-space vertex buffer against baked
/// reference surfaces, in place.
///
/// Priority surfaces are scanned first at the finer stride; only vertices
/// they leave unresolved are tested against the remainder set. Among all
/// candidates of a vertex the shallowest depth wins, and the vertex is
/// displaced along that candidate's direction by `depth + push_out`.
/// Vertices with no candidate are untouched.
///
/// The cancel flag is checked between vertices; once raised, no further
/// vertex is displaced. Returns the indices of displaced vertices, in
/// increasing order.
pub fn resolve_buffer(
    surfaces: &[BakedSurface],
    world_points: &mut [Point],
    settings: &ResolveSettings,
    cancel: &AtomicBool,
) -> Vec<usize> {
    let mut displaced = Vec::new();
    if surfaces.is_empty() {
        return displaced;
    }

    let priority: Vec<&BakedSurface> = surfaces.iter().filter(|s| s.priority).collect();
    let remainder: Vec<&BakedSurface> = surfaces.iter().filter(|s| !s.priority).collect();

    let mut candidates: SmallVec<[PenetrationCandidate; 4]> = SmallVec::new();
    for (vid, pt) in world_points.iter_mut().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        candidates.clear();
        for surface in &priority {
            collect_candidates(surface, pt, settings.priority_stride, settings.threshold, &mut candidates);
        }

        // A vertex the priority pass resolved is excluded from the
        // remainder pass.
        if candidates.is_empty() {
            for surface in &remainder {
                collect_candidates(
                    surface,
                    pt,
                    settings.remainder_stride,
                    settings.threshold,
                    &mut candidates,
                );
            }
        }

        let Some(chosen) = candidates
            .iter()
            .min_by_key(|c| OrderedFloat(c.depth))
        else {
            continue;
        };

        *pt += chosen.dir.into_inner() * (chosen.depth + settings.push_out);
        displaced.push(vid);
    }

    displaced
}
