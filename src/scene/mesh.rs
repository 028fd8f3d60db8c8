use crate::collision::Aabb;
use crate::math::{Point, Real, Vector};
use crate::scene::{NodeId, SceneGraph, Transform};
use arrayvec::ArrayVec;

/// Weighted bone influences of a single vertex, at most four.
pub type VertexInfluences = ArrayVec<(u16, Real), 4>;

/// Bind-pose data tying a mesh to the skeleton that deforms it.
#[derive(Clone, Debug)]
pub struct SkinBinding {
    /// The skeleton nodes deforming this mesh.
    pub joints: Vec<NodeId>,
    /// Per-joint inverse bind transforms captured at authoring time.
    pub inverse_bind: Vec<Transform>,
    /// Per-vertex weighted joint indices into `joints`.
    pub influences: Vec<VertexInfluences>,
}

/// A triangle mesh with optional skinning data.
///
/// Vertices are stored in the owning node's local space; the posed
/// world-space positions are derived on demand by [`SkinnedMesh::bake_world_vertices`].
#[derive(Clone, Debug)]
pub struct SkinnedMesh {
    vertices: Vec<Point>,
    indices: Vec<[u32; 3]>,
    normals: Vec<Vector>,
    local_aabb: Aabb,
    skin: Option<SkinBinding>,
}

impl SkinnedMesh {
    /// Builds a mesh from its buffers, deriving normals and bounds.
    pub fn new(vertices: Vec<Point>, indices: Vec<[u32; 3]>) -> Self {
        let local_aabb = Aabb::from_points(&vertices);
        let mut mesh = SkinnedMesh {
            vertices,
            indices,
            normals: Vec::new(),
            local_aabb,
            skin: None,
        };
        mesh.recompute_normals();
        mesh
    }

    /// Attaches skinning data.
    pub fn with_skin(mut self, skin: SkinBinding) -> Self {
        self.skin = Some(skin);
        self
    }

    /// The vertex buffer, in local space.
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// The triangle index buffer.
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// The per-vertex normals.
    pub fn normals(&self) -> &[Vector] {
        &self.normals
    }

    /// The local-space bounding box.
    pub fn local_aabb(&self) -> &Aabb {
        &self.local_aabb
    }

    /// The skinning data, if any.
    pub fn skin(&self) -> Option<&SkinBinding> {
        self.skin.as_ref()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Replaces the vertex buffer and refreshes normals and bounds.
    ///
    /// Only called when a pass actually modified the mesh, so unmodified
    /// meshes never pay for recomputation.
    pub fn set_vertices(&mut self, vertices: Vec<Point>) {
        debug_assert_eq!(vertices.len(), self.vertices.len());
        self.vertices = vertices;
        self.local_aabb = Aabb::from_points(&self.vertices);
        self.recompute_normals();
    }

    /// Computes the posed world-space position of every vertex.
    ///
    /// Skinned meshes blend each vertex through its weighted joint
    /// transforms and the inverse bind pose; unskinned meshes go through the
    /// owning node's world transform alone.
    pub fn bake_world_vertices(&self, graph: &SceneGraph, owner: NodeId) -> Vec<Point> {
        match &self.skin {
            None => {
                let world = graph.world_transform(owner);
                self.vertices.iter().map(|v| world.transform_point(v)).collect()
            }
            Some(skin) => {
                let joint_worlds: Vec<Transform> = skin
                    .joints
                    .iter()
                    .zip(skin.inverse_bind.iter())
                    .map(|(joint, inv_bind)| graph.world_transform(*joint).mul_transform(inv_bind))
                    .collect();

                self.vertices
                    .iter()
                    .zip(skin.influences.iter())
                    .map(|(v, influences)| {
                        if influences.is_empty() {
                            return *v;
                        }

                        let mut blended = Vector::zeros();
                        let mut total = 0.0;
                        for (joint, weight) in influences.iter() {
                            let posed = joint_worlds[*joint as usize].transform_point(v);
                            blended += posed.coords * *weight;
                            total += *weight;
                        }

                        if total > 0.0 {
                            Point::from(blended / total)
                        } else {
                            *v
                        }
                    })
                    .collect()
            }
        }
    }

    /// Recomputes area-weighted per-vertex normals.
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![Vector::zeros(); self.vertices.len()];

        for idx in &self.indices {
            let a = self.vertices[idx[0] as usize];
            let b = self.vertices[idx[1] as usize];
            let c = self.vertices[idx[2] as usize];
            // Cross product magnitude carries the area weighting.
            let n = (b - a).cross(&(c - a));
            for i in idx {
                normals[*i as usize] += n;
            }
        }

        for n in &mut normals {
            let norm = n.norm();
            if norm > 0.0 {
                *n /= norm;
            }
        }

        self.normals = normals;
    }
}
