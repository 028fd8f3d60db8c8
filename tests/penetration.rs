use clothfit::math::{Point, Real, Vector};
use clothfit::pipeline::{resolve_penetration, resolve_penetration_cancellable, PenetrationParams};
use clothfit::scene::{NodeId, SceneGraph, SkinnedMesh, Transform};
use rand::{Rng, SeedableRng};
use std::sync::atomic::AtomicBool;

/// A quad in the xy plane at z = 0, normals +z, attached to a node named
/// so it lands in the priority set.
fn character_with_body(graph: &mut SceneGraph) -> NodeId {
    let root = graph.add("Armature", None, Transform::identity());
    let vertices = vec![
        Point::new(-1.0, -1.0, 0.0),
        Point::new(1.0, -1.0, 0.0),
        Point::new(1.0, 1.0, 0.0),
        Point::new(-1.0, 1.0, 0.0),
    ];
    let indices = vec![[0, 1, 2], [0, 2, 3]];
    let _body = graph.add_with_mesh(
        "Body",
        Some(root),
        Transform::identity(),
        SkinnedMesh::new(vertices, indices),
    );
    root
}

fn clothing_with_triangle(graph: &mut SceneGraph, z: Real) -> (NodeId, NodeId) {
    let root = graph.add("Jacket", None, Transform::identity());
    let vertices = vec![
        Point::new(-0.2, -0.2, z),
        Point::new(0.2, -0.2, z),
        Point::new(0.0, 0.2, z),
    ];
    let mesh_node = graph.add_with_mesh(
        "JacketMesh",
        Some(root),
        Transform::identity(),
        SkinnedMesh::new(vertices, vec![[0, 1, 2]]),
    );
    (root, mesh_node)
}

fn params_no_smoothing() -> PenetrationParams {
    PenetrationParams {
        push_out_distance: 0.01,
        penetration_threshold: 0.015,
        advanced_sampling: true,
        prefer_body_meshes: true,
        preserve_shape: false,
        preserve_strength: 0.5,
    }
}

#[test]
fn penetrating_vertices_are_pushed_out_by_depth_plus_clearance() {
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);
    let (clothing, mesh_node) = clothing_with_triangle(&mut graph, -0.005);

    let changed = resolve_penetration(&mut graph, character, clothing, &params_no_smoothing());
    assert!(changed);

    let mesh = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap();
    for v in mesh.vertices() {
        // 0.005 deep, pushed by depth + 0.01 clearance: displaced ~0.015.
        approx::assert_relative_eq!(v.z, 0.01, epsilon = 1.0e-5);
    }
}

#[test]
fn displaced_vertices_end_up_at_least_push_out_in_front() {
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);
    let (clothing, mesh_node) = clothing_with_triangle(&mut graph, -0.012);

    let params = params_no_smoothing();
    assert!(resolve_penetration(&mut graph, character, clothing, &params));

    let mesh = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap();
    for v in mesh.vertices() {
        assert!(v.z >= params.push_out_distance - 1.0e-5);
    }
}

#[test]
fn resolution_is_idempotent_once_clear() {
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);
    let (clothing, mesh_node) = clothing_with_triangle(&mut graph, -0.008);

    let params = params_no_smoothing();
    assert!(resolve_penetration(&mut graph, character, clothing, &params));
    let after_first: Vec<Point> = graph
        .get(mesh_node)
        .unwrap()
        .mesh
        .as_ref()
        .unwrap()
        .vertices()
        .to_vec();

    assert!(!resolve_penetration(&mut graph, character, clothing, &params));
    let after_second = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap().vertices();
    assert_eq!(after_first.as_slice(), after_second);
}

#[test]
fn clothing_outside_expanded_bounds_is_untouched() {
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);
    let (clothing, mesh_node) = clothing_with_triangle(&mut graph, 3.0);

    let before: Vec<Point> = graph
        .get(mesh_node)
        .unwrap()
        .mesh
        .as_ref()
        .unwrap()
        .vertices()
        .to_vec();

    let changed = resolve_penetration(&mut graph, character, clothing, &params_no_smoothing());

    assert!(!changed);
    let after = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap().vertices();
    assert_eq!(before.as_slice(), after);
}

#[test]
fn missing_reference_surfaces_are_a_no_op() {
    let mut graph = SceneGraph::new();
    // A character with no meshes at all.
    let character = graph.add("Armature", None, Transform::identity());
    let (clothing, _) = clothing_with_triangle(&mut graph, -0.005);

    assert!(!resolve_penetration(&mut graph, character, clothing, &params_no_smoothing()));
}

#[test]
fn zero_triangle_meshes_are_skipped_on_both_sides() {
    // A character whose only mesh has vertices but no triangles bakes to
    // nothing, so there is no surface to test against.
    let mut graph = SceneGraph::new();
    let character = graph.add("Armature", None, Transform::identity());
    graph.add_with_mesh(
        "Body",
        Some(character),
        Transform::identity(),
        SkinnedMesh::new(vec![Point::new(0.0, 0.0, 0.0)], Vec::new()),
    );
    let (clothing, _) = clothing_with_triangle(&mut graph, -0.005);
    assert!(!resolve_penetration(&mut graph, character, clothing, &params_no_smoothing()));

    // And a triangle-less clothing mesh is never scanned, even deep inside
    // a real surface.
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);
    let clothing = graph.add("Jacket", None, Transform::identity());
    let vertices = vec![Point::new(0.0, 0.0, -0.005), Point::new(0.1, 0.0, -0.005)];
    let mesh_node = graph.add_with_mesh(
        "JacketMesh",
        Some(clothing),
        Transform::identity(),
        SkinnedMesh::new(vertices.clone(), Vec::new()),
    );

    let changed = resolve_penetration(&mut graph, character, clothing, &params_no_smoothing());

    assert!(!changed);
    let after = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap().vertices();
    assert_eq!(vertices.as_slice(), after);
}

#[test]
fn cancelled_pass_reports_unchanged() {
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);
    let (clothing, mesh_node) = clothing_with_triangle(&mut graph, -0.005);

    let before: Vec<Point> = graph
        .get(mesh_node)
        .unwrap()
        .mesh
        .as_ref()
        .unwrap()
        .vertices()
        .to_vec();

    let cancel = AtomicBool::new(true);
    let changed = resolve_penetration_cancellable(
        &mut graph,
        character,
        clothing,
        &params_no_smoothing(),
        &cancel,
    );

    assert!(!changed);
    let after = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap().vertices();
    assert_eq!(before.as_slice(), after);
}

#[test]
fn smoothing_only_touches_the_displaced_region() {
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);

    // A strip of 8 vertices; only the first two penetrate.
    let clothing = graph.add("Jacket", None, Transform::identity());
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for i in 0..4u32 {
        let x = i as Real * 0.1;
        let z = if i == 0 { -0.005 } else { 0.2 };
        vertices.push(Point::new(x, 0.0, z));
        vertices.push(Point::new(x, 0.1, z));
        if i > 0 {
            let a = (i - 1) * 2;
            indices.push([a, a + 1, a + 2]);
            indices.push([a + 1, a + 3, a + 2]);
        }
    }
    let mesh_node = graph.add_with_mesh(
        "JacketMesh",
        Some(clothing),
        Transform::identity(),
        SkinnedMesh::new(vertices.clone(), indices),
    );

    let mut params = params_no_smoothing();
    params.preserve_shape = true;
    assert!(resolve_penetration(&mut graph, character, clothing, &params));

    let after = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap().vertices();
    // Vertices 0 and 1 were displaced, 2 and 3 are their one-ring. The far
    // end of the strip is neither and must be bit-identical.
    for v in 4..8 {
        assert_eq!(after[v], vertices[v], "vertex {} moved", v);
    }
    assert!(after[0].z > vertices[0].z);
}

#[test]
fn randomized_buffers_settle_in_one_pass() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0xC10_7F17);
    let mut graph = SceneGraph::new();
    let character = character_with_body(&mut graph);

    let clothing = graph.add("Jacket", None, Transform::identity());
    let mut vertices = Vec::new();
    for _ in 0..40 {
        vertices.push(Point::new(
            rng.gen_range(-0.8..0.8),
            rng.gen_range(-0.8..0.8),
            rng.gen_range(-0.012..-0.001),
        ));
    }
    // Fan triangulation; the exact topology does not matter here.
    let indices: Vec<[u32; 3]> = (1..39).map(|i| [0, i, i + 1]).collect();
    let mesh_node = graph.add_with_mesh(
        "JacketMesh",
        Some(clothing),
        Transform::identity(),
        SkinnedMesh::new(vertices, indices),
    );

    let params = params_no_smoothing();
    assert!(resolve_penetration(&mut graph, character, clothing, &params));

    {
        let mesh = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap();
        for v in mesh.vertices() {
            assert!(v.z >= params.push_out_distance - 1.0e-5);
        }
    }

    // Everything is clear of the surface now; a second pass must not move
    // a single vertex.
    assert!(!resolve_penetration(&mut graph, character, clothing, &params));
}

#[test]
fn skinned_character_surfaces_bake_at_the_posed_position() {
    use arrayvec::ArrayVec;
    use clothfit::scene::SkinBinding;

    let mut graph = SceneGraph::new();
    let root = graph.add("Armature", None, Transform::identity());
    // The bone sits 0.5 above its bind pose, so the baked quad does too.
    let bone = graph.add(
        "BodyBone",
        Some(root),
        Transform::from_translation(Vector::z() * 0.5),
    );

    let vertices = vec![
        Point::new(-1.0, -1.0, 0.0),
        Point::new(1.0, -1.0, 0.0),
        Point::new(1.0, 1.0, 0.0),
        Point::new(-1.0, 1.0, 0.0),
    ];
    let influences = (0..4)
        .map(|_| {
            let mut inf: ArrayVec<(u16, Real), 4> = ArrayVec::new();
            inf.push((0, 1.0));
            inf
        })
        .collect();
    let mesh = SkinnedMesh::new(vertices, vec![[0, 1, 2], [0, 2, 3]]).with_skin(SkinBinding {
        joints: vec![bone],
        inverse_bind: vec![Transform::identity()],
        influences,
    });
    graph.add_with_mesh("Body", Some(root), Transform::identity(), mesh);

    // Clothing slightly below the posed (z = 0.5) surface, well above the
    // bind-pose plane.
    let (clothing, mesh_node) = clothing_with_triangle(&mut graph, 0.49);

    let changed = resolve_penetration(&mut graph, root, clothing, &params_no_smoothing());
    assert!(changed);

    let mesh = graph.get(mesh_node).unwrap().mesh.as_ref().unwrap();
    for v in mesh.vertices() {
        approx::assert_relative_eq!(v.z, 0.51, epsilon = 1.0e-4);
    }
}
