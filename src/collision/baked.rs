//! Posed triangle-mesh snapshots of reference surfaces.

use crate::collision::{Aabb, Triangle};
use crate::correspondence::normalize_name;
use crate::math::Point;
use crate::scene::{NodeId, SceneGraph, Transform};

/// Surface names matching one of these substrings are tested first during
/// penetration resolution.
const PRIORITY_KEYWORDS: [&str; 8] = [
    "body", "torso", "chest", "skin", "belly", "arm", "leg", "hip",
];

/// A reference surface captured at its current posed world positions.
///
/// Vertices are stored in the owning node's local space (the posed world
/// positions pulled back through the node's world transform), so point
/// queries can run a cheap local-space bounding-box rejection first.
///
/// Baked surfaces never outlive one resolution pass.
#[derive(Clone, Debug)]
pub struct BakedSurface {
    /// The surface node's name, kept for priority classification and logs.
    pub name: String,
    /// The world transform of the owning node at bake time.
    pub world: Transform,
    /// `true` if this surface belongs to the priority (body) set.
    pub priority: bool,
    vertices: Vec<Point>,
    indices: Vec<[u32; 3]>,
    local_aabb: Aabb,
}

impl BakedSurface {
    /// Bakes the mesh attached to `node`, post-skinning, at its current
    /// pose. Returns `None` for nodes without a mesh or with no triangles.
    pub fn bake(graph: &SceneGraph, node: NodeId) -> Option<Self> {
        let scene_node = graph.get(node)?;
        let mesh = scene_node.mesh.as_ref()?;
        if mesh.num_triangles() == 0 {
            return None;
        }

        let world = graph.world_transform(node);
        let vertices: Vec<Point> = mesh
            .bake_world_vertices(graph, node)
            .iter()
            .map(|p| world.inverse_transform_point(p))
            .collect();
        let local_aabb = Aabb::from_points(&vertices);
        let name = scene_node.name.clone();
        let normalized = normalize_name(&name);
        let priority = PRIORITY_KEYWORDS
            .iter()
            .any(|k| normalized.contains(k));

        Some(BakedSurface {
            name,
            world,
            priority,
            vertices,
            indices: mesh.indices().to_vec(),
            local_aabb,
        })
    }

    /// Builds a surface directly from world-space buffers, with an identity
    /// world transform.
    pub fn from_world_buffers(name: impl Into<String>, vertices: Vec<Point>, indices: Vec<[u32; 3]>) -> Self {
        let local_aabb = Aabb::from_points(&vertices);
        let name = name.into();
        let normalized = normalize_name(&name);
        let priority = PRIORITY_KEYWORDS
            .iter()
            .any(|k| normalized.contains(k));

        BakedSurface {
            name,
            world: Transform::identity(),
            priority,
            vertices,
            indices,
            local_aabb,
        }
    }

    /// The baked vertices, in the surface's local space.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// The triangle index buffer.
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// The local-space bounding box of the baked vertices.
    pub fn local_aabb(&self) -> &Aabb {
        &self.local_aabb
    }

    /// The `i`-th triangle, in local space.
    pub fn triangle(&self, i: usize) -> Triangle {
        let idx = self.indices[i];
        Triangle::new(
            self.vertices[idx[0] as usize],
            self.vertices[idx[1] as usize],
            self.vertices[idx[2] as usize],
        )
    }
}
