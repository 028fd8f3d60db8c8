//! Rigid alignment of the clothing skeleton onto its character counterparts.

use crate::correspondence::CorrespondenceTable;
use crate::scene::{NodeId, SceneGraph};
use thiserror::Error;

/// A failure while mutating the clothing skeleton.
///
/// Resolution passes never produce these; only the mutation step can fail,
/// typically because a live node was deleted between resolution and
/// application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    /// A node referenced by the table no longer exists in the scene.
    #[error("node `{0}` referenced by the correspondence table no longer exists")]
    NodeVanished(String),
}

/// Snaps every paired clothing bone onto its character counterpart, then
/// reconstructs unmapped bones from their recorded relative offsets.
///
/// Paired bones adopt the character bone's world translation and rotation,
/// in table order. Unmapped bones are restored strictly afterwards, each
/// exactly once, so their anchors are already aligned. Returns `true` if any
/// node was moved.
///
/// An empty table or a missing clothing root short-circuits to `Ok(false)`
/// without mutating anything. Every node the table references, paired and
/// unmapped alike, is validated before the first mutation, so an `Err`
/// guarantees the scene was not touched.
pub fn apply_alignment(
    graph: &mut SceneGraph,
    table: &CorrespondenceTable,
    clothing_root: NodeId,
) -> Result<bool, AlignmentError> {
    if table.entries.is_empty() || !graph.contains(clothing_root) {
        return Ok(false);
    }

    // Validate before the first mutation; stale input must not leave the
    // scene partially aligned.
    for entry in &table.entries {
        let Some(clothing) = entry.clothing else {
            continue;
        };
        if !graph.contains(entry.character) || !graph.contains(clothing) {
            return Err(AlignmentError::NodeVanished(entry.canonical_name.clone()));
        }
    }
    for unmapped in &table.unmapped {
        if !graph.contains(unmapped.node) || !graph.contains(unmapped.anchor) {
            // One of the pair may already be gone; name whichever survives.
            let name = if graph.contains(unmapped.node) {
                graph.name(unmapped.node)
            } else {
                graph.name(unmapped.anchor)
            };
            return Err(AlignmentError::NodeVanished(name.to_owned()));
        }
    }

    let mut moved = false;

    for entry in &table.entries {
        let Some(clothing) = entry.clothing else {
            continue;
        };

        let target = graph.world_transform(entry.character);
        graph.set_world_translation(clothing, target.translation.into());
        graph.set_world_rotation(clothing, target.rotation);
        moved = true;
    }

    for unmapped in &table.unmapped {
        let anchor_world = graph.world_transform(unmapped.anchor);
        let world = anchor_world.mul_transform(&unmapped.local_offset);
        graph.set_world_transform(unmapped.node, world);
        moved = true;
    }

    Ok(moved)
}
