use clothfit::correspondence::{CorrespondenceResolver, MatchVocabulary};
use clothfit::math::Vector;
use clothfit::pipeline::{align_clothing, build_correspondence};
use clothfit::scene::{NodeId, SceneGraph, Transform};

fn rig(graph: &mut SceneGraph, base_height: f32) -> (NodeId, NodeId, NodeId) {
    let hips = graph.add("Hips", None, Transform::from_translation(Vector::y() * base_height));
    let spine = graph.add("Spine", Some(hips), Transform::from_translation(Vector::y() * 0.2));
    let chest = graph.add("Chest", Some(spine), Transform::from_translation(Vector::y() * 0.25));
    (hips, spine, chest)
}

#[test]
fn paired_bones_snap_onto_character_world_pose() {
    let mut graph = SceneGraph::new();
    let (char_hips, _, char_chest) = rig(&mut graph, 1.0);
    let (cloth_hips, _, cloth_chest) = rig(&mut graph, 0.8);

    let resolver = CorrespondenceResolver::new(MatchVocabulary::default());
    let table = build_correspondence(&graph, char_hips, cloth_hips, &resolver);
    let outcome = align_clothing(&mut graph, &table, cloth_hips);

    assert!(outcome.changed);
    let char_world = graph.world_transform(char_chest);
    let cloth_world = graph.world_transform(cloth_chest);
    approx::assert_relative_eq!(cloth_world.translation, char_world.translation, epsilon = 1.0e-5);
}

#[test]
fn unmapped_bones_keep_their_relative_offset() {
    let mut graph = SceneGraph::new();
    let (char_hips, _, _) = rig(&mut graph, 1.0);
    let (cloth_hips, _, _) = rig(&mut graph, 0.7);
    let offset = Vector::new(0.1, -0.15, 0.05);
    let skirt = graph.add("Skirt_01", Some(cloth_hips), Transform::from_translation(offset));

    let resolver = CorrespondenceResolver::new(MatchVocabulary::default());
    let table = build_correspondence(&graph, char_hips, cloth_hips, &resolver);
    assert_eq!(table.unmapped.len(), 1);

    let outcome = align_clothing(&mut graph, &table, cloth_hips);
    assert!(outcome.changed);

    let hips_world = graph.world_transform(cloth_hips);
    let skirt_world = graph.world_transform(skirt);
    approx::assert_relative_eq!(
        skirt_world.translation - hips_world.translation,
        offset,
        epsilon = 1.0e-5
    );
    // And the hips themselves reached the character height.
    approx::assert_relative_eq!(hips_world.translation, Vector::y(), epsilon = 1.0e-5);
}

#[test]
fn alignment_is_idempotent_for_an_unchanged_scene() {
    let mut graph = SceneGraph::new();
    let (char_hips, _, _) = rig(&mut graph, 1.0);
    let (cloth_hips, _, cloth_chest) = rig(&mut graph, 0.8);

    let resolver = CorrespondenceResolver::new(MatchVocabulary::default());
    let table = build_correspondence(&graph, char_hips, cloth_hips, &resolver);

    let first = align_clothing(&mut graph, &table, cloth_hips);
    let after_first = graph.world_transform(cloth_chest);
    let second = align_clothing(&mut graph, &table, cloth_hips);
    let after_second = graph.world_transform(cloth_chest);

    assert!(first.changed);
    assert!(second.changed);
    approx::assert_relative_eq!(
        after_first.translation,
        after_second.translation,
        epsilon = 1.0e-6
    );
}

#[test]
fn empty_table_short_circuits_without_mutation() {
    let mut graph = SceneGraph::new();
    let (_, _, _) = rig(&mut graph, 1.0);
    let (cloth_hips, _, cloth_chest) = rig(&mut graph, 0.8);
    let before = graph.world_transform(cloth_chest);

    let table = clothfit::correspondence::CorrespondenceTable::default();
    let outcome = align_clothing(&mut graph, &table, cloth_hips);

    assert!(!outcome.changed);
    assert_eq!(graph.world_transform(cloth_chest), before);
}

#[test]
fn vanished_node_surfaces_as_failed_outcome() {
    let mut graph = SceneGraph::new();
    let (char_hips, _, _) = rig(&mut graph, 1.0);
    let (cloth_hips, cloth_spine, _) = rig(&mut graph, 0.8);

    let resolver = CorrespondenceResolver::new(MatchVocabulary::default());
    let table = build_correspondence(&graph, char_hips, cloth_hips, &resolver);

    // The scene changes between resolution and application.
    graph.remove_subtree(cloth_spine);

    let previous_parent = graph.parent(cloth_hips);
    let outcome = align_clothing(&mut graph, &table, cloth_hips);

    assert!(!outcome.changed);
    assert!(outcome.status.contains("failed"));
    assert_eq!(graph.parent(cloth_hips), previous_parent);
}

#[test]
fn stale_table_leaves_every_bone_untouched() {
    let mut graph = SceneGraph::new();
    let (char_hips, _, _) = rig(&mut graph, 1.0);
    let (cloth_hips, cloth_spine, _) = rig(&mut graph, 0.5);

    let resolver = CorrespondenceResolver::new(MatchVocabulary::default());
    let table = build_correspondence(&graph, char_hips, cloth_hips, &resolver);

    // The hips pair earlier in the table than the spine; if validation were
    // interleaved with mutation they would move before the failure.
    graph.remove_subtree(cloth_spine);
    let hips_before = graph.world_transform(cloth_hips);

    let outcome = align_clothing(&mut graph, &table, cloth_hips);

    assert!(!outcome.changed);
    assert_eq!(graph.world_transform(cloth_hips), hips_before);
}
