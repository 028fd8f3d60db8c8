//! The operations exposed to the UI-owning collaborator.
//!
//! Everything here is a synchronous, single-threaded batch pass over the
//! scene graph it is handed: snapshots, baked surfaces and adjacency graphs
//! are derived per invocation and dropped at the end, including on early
//! return. No file I/O, no undo journal.

use crate::alignment::{self, AlignmentError};
use crate::collision::{resolve_buffer, BakedSurface, ResolveSettings};
use crate::correspondence::{CorrespondenceResolver, CorrespondenceTable};
use crate::math::{Point, Real};
use crate::scene::{NodeId, SceneGraph};
use crate::skeleton::SkeletonSnapshot;
use crate::smoothing::{relax, VertexAdjacency};
use std::sync::atomic::{AtomicBool, Ordering};

/// Laplacian iterations run when shape preservation is enabled.
const SMOOTH_ITERATIONS: usize = 2;

/// The caller-facing result of a mutating operation.
#[derive(Clone, Debug)]
pub struct FitOutcome {
    /// `true` iff the scene was modified.
    pub changed: bool,
    /// A human-readable status line.
    pub status: String,
}

/// Caller-supplied knobs of one penetration resolution pass.
///
/// All numeric fields are clamped into their safe ranges internally, so out
/// of range values degrade rather than misbehave.
#[derive(Clone, Debug)]
pub struct PenetrationParams {
    /// Clearance kept between clothing and character after push-out.
    pub push_out_distance: Real,
    /// Maximum depth at which a vertex still counts as penetrating.
    pub penetration_threshold: Real,
    /// Scan every priority triangle instead of every second one.
    pub advanced_sampling: bool,
    /// Test body/torso/limb surfaces first, the rest only for vertices the
    /// priority pass left unresolved.
    pub prefer_body_meshes: bool,
    /// Run shape-preserving smoothing over the displaced region.
    pub preserve_shape: bool,
    /// Smoothing strength in `[0, 1]`.
    pub preserve_strength: Real,
}

impl Default for PenetrationParams {
    fn default() -> Self {
        PenetrationParams {
            push_out_distance: 0.005,
            penetration_threshold: 0.015,
            advanced_sampling: false,
            prefer_body_meshes: true,
            preserve_shape: true,
            preserve_strength: 0.5,
        }
    }
}

/// Captures both skeletons and resolves their correspondence.
///
/// Missing roots yield an empty table, never an error. The returned table
/// may be edited by the caller before being applied; it stays valid only as
/// long as the scene does not change.
pub fn build_correspondence(
    graph: &SceneGraph,
    character_root: NodeId,
    clothing_root: NodeId,
    resolver: &CorrespondenceResolver,
) -> CorrespondenceTable {
    let character = SkeletonSnapshot::capture(graph, character_root);
    let clothing = SkeletonSnapshot::capture(graph, clothing_root);
    resolver.resolve(&character, &clothing)
}

/// Applies a correspondence table, with the documented failure recovery:
/// on a mutation failure the clothing root's parent link is restored to its
/// pre-operation value, the error is logged, and the failure is surfaced as
/// a boolean plus a status string.
///
/// Idempotent given an unchanged scene and table.
pub fn align_clothing(
    graph: &mut SceneGraph,
    table: &CorrespondenceTable,
    clothing_root: NodeId,
) -> FitOutcome {
    let previous_parent = graph.parent(clothing_root);

    match alignment::apply_alignment(graph, table, clothing_root) {
        Ok(true) => FitOutcome {
            changed: true,
            status: format!("aligned {} bone(s)", table.entries.len()),
        },
        Ok(false) => FitOutcome {
            changed: false,
            status: "nothing to align".to_owned(),
        },
        Err(err @ AlignmentError::NodeVanished(_)) => {
            log::warn!("alignment failed: {err}");
            graph.set_parent(clothing_root, previous_parent);
            FitOutcome {
                changed: false,
                status: format!("alignment failed: {err}"),
            }
        }
    }
}

/// Resolves interpenetration of every clothing mesh under `clothing_root`
/// against the posed character surfaces under `character_root`.
///
/// Returns `true` iff any mesh changed. Alignment must already have been
/// applied; baking happens here, from the current pose.
pub fn resolve_penetration(
    graph: &mut SceneGraph,
    character_root: NodeId,
    clothing_root: NodeId,
    params: &PenetrationParams,
) -> bool {
    resolve_penetration_cancellable(
        graph,
        character_root,
        clothing_root,
        params,
        &AtomicBool::new(false),
    )
}

/// Like [`resolve_penetration`], checking `cancel` between vertices. A mesh
/// whose scan was cancelled is left untouched.
pub fn resolve_penetration_cancellable(
    graph: &mut SceneGraph,
    character_root: NodeId,
    clothing_root: NodeId,
    params: &PenetrationParams,
    cancel: &AtomicBool,
) -> bool {
    if !graph.contains(character_root) || !graph.contains(clothing_root) {
        return false;
    }

    let settings = ResolveSettings::new(
        params.push_out_distance,
        params.penetration_threshold,
        params.advanced_sampling,
    );
    let strength = params.preserve_strength.clamp(0.0, 1.0);

    let mut surfaces: Vec<BakedSurface> = graph
        .descendants(character_root)
        .into_iter()
        .filter_map(|node| BakedSurface::bake(graph, node))
        .collect();
    if surfaces.is_empty() {
        return false;
    }

    if !params.prefer_body_meshes {
        // No partitioning requested: everything runs in the fine-grained
        // first pass.
        for surface in &mut surfaces {
            surface.priority = true;
        }
    }

    let mut changed = false;
    for node in graph.descendants(clothing_root) {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        let Some(mesh) = graph.get(node).and_then(|n| n.mesh.as_ref()) else {
            continue;
        };
        if mesh.num_triangles() == 0 {
            continue;
        }

        let world = graph.world_transform(node);
        let originals: Vec<Point> = mesh
            .vertices()
            .iter()
            .map(|v| world.transform_point(v))
            .collect();
        let indices = mesh.indices().to_vec();

        let mut positions = originals.clone();
        let displaced = resolve_buffer(&surfaces, &mut positions, &settings, cancel);

        if displaced.is_empty() || cancel.load(Ordering::Relaxed) {
            continue;
        }

        if params.preserve_shape {
            let adjacency = VertexAdjacency::from_triangles(positions.len(), &indices);
            relax(
                &mut positions,
                &originals,
                &displaced,
                &adjacency,
                strength,
                SMOOTH_ITERATIONS,
            );
        }

        let local: Vec<Point> = positions
            .iter()
            .map(|p| world.inverse_transform_point(p))
            .collect();

        // Derived data (bounds, normals) is refreshed by `set_vertices`;
        // untouched meshes never get here.
        if let Some(node) = graph.get_mut(node) {
            log::debug!("displaced {} vertex/vertices on `{}`", displaced.len(), node.name);
            if let Some(mesh) = node.mesh.as_mut() {
                mesh.set_vertices(local);
                changed = true;
            }
        }
    }

    changed
}
