//! Minimal mutable scene hierarchy the fitting passes operate on.

pub use self::mesh::{SkinBinding, SkinnedMesh, VertexInfluences};
pub use self::node::{NodeId, SceneGraph, SceneNode, Transform};

mod mesh;
mod node;
