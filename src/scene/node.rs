use crate::math::{Point, Rotation, Vector};
use crate::scene::SkinnedMesh;
use slab::Slab;

/// A translation/rotation/scale transform placing a node in its parent's space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    /// The translation part.
    pub translation: Vector,
    /// The rotation part.
    pub rotation: Rotation,
    /// The non-uniform scale part.
    pub scale: Vector,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// The identity transform.
    pub fn identity() -> Self {
        Transform {
            translation: Vector::zeros(),
            rotation: Rotation::identity(),
            scale: Vector::repeat(1.0),
        }
    }

    /// A pure translation.
    pub fn from_translation(translation: Vector) -> Self {
        Transform {
            translation,
            ..Self::identity()
        }
    }

    /// A translation and rotation, with unit scale.
    pub fn from_parts(translation: Vector, rotation: Rotation) -> Self {
        Transform {
            translation,
            rotation,
            scale: Vector::repeat(1.0),
        }
    }

    /// Applies this transform to a point.
    #[inline]
    pub fn transform_point(&self, pt: &Point) -> Point {
        let scaled = pt.coords.component_mul(&self.scale);
        Point::from(self.translation + self.rotation * scaled)
    }

    /// Applies this transform to a vector (no translation).
    #[inline]
    pub fn transform_vector(&self, v: &Vector) -> Vector {
        self.rotation * v.component_mul(&self.scale)
    }

    /// Applies the inverse of this transform to a point.
    ///
    /// Zero scale components are left unscaled instead of dividing by zero.
    #[inline]
    pub fn inverse_transform_point(&self, pt: &Point) -> Point {
        let unrotated = self.rotation.inverse() * (pt.coords - self.translation);
        Point::from(unrotated.component_mul(&inv_scale(&self.scale)))
    }

    /// Applies the inverse rotation of this transform to a vector.
    #[inline]
    pub fn inverse_transform_vector(&self, v: &Vector) -> Vector {
        (self.rotation.inverse() * v).component_mul(&inv_scale(&self.scale))
    }

    /// Composes `self` (a parent-space transform) with a child-local transform.
    ///
    /// Non-uniform scale composes component-wise; shear introduced by rotated
    /// non-uniform scale is not represented, matching the usual engine TRS
    /// convention.
    pub fn mul_transform(&self, local: &Transform) -> Transform {
        Transform {
            translation: self.transform_point(&Point::from(local.translation)).coords,
            rotation: self.rotation * local.rotation,
            scale: self.scale.component_mul(&local.scale),
        }
    }

    /// The local transform `offset` such that `ancestor.mul_transform(&offset) == self`.
    pub fn relative_to(&self, ancestor: &Transform) -> Transform {
        Transform {
            translation: ancestor
                .inverse_transform_point(&Point::from(self.translation))
                .coords,
            rotation: ancestor.rotation.inverse() * self.rotation,
            scale: self.scale.component_mul(&inv_scale(&ancestor.scale)),
        }
    }
}

#[inline]
fn inv_scale(scale: &Vector) -> Vector {
    scale.map(|s| if s != 0.0 { 1.0 / s } else { 1.0 })
}

/// A handle to a node stored in a [`SceneGraph`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

/// A named node of the live scene hierarchy.
#[derive(Debug)]
pub struct SceneNode {
    /// The node name. Not required to be unique.
    pub name: String,
    /// The transform relative to the parent node.
    pub local: Transform,
    /// The triangle mesh attached to this node, if any.
    pub mesh: Option<SkinnedMesh>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// The parent of this node, if it has one.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The children of this node, in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The mutable node hierarchy both fitting subsystems read and align.
#[derive(Default, Debug)]
pub struct SceneGraph {
    nodes: Slab<SceneNode>,
}

impl SceneGraph {
    /// Creates an empty scene graph.
    pub fn new() -> Self {
        SceneGraph { nodes: Slab::new() }
    }

    /// Inserts a node under `parent` (or as a root if `None`).
    pub fn add(&mut self, name: impl Into<String>, parent: Option<NodeId>, local: Transform) -> NodeId {
        let id = NodeId(self.nodes.insert(SceneNode {
            name: name.into(),
            local,
            mesh: None,
            parent,
            children: Vec::new(),
        }));

        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }

        id
    }

    /// Inserts a mesh-bearing node under `parent`.
    pub fn add_with_mesh(
        &mut self,
        name: impl Into<String>,
        parent: Option<NodeId>,
        local: Transform,
        mesh: SkinnedMesh,
    ) -> NodeId {
        let id = self.add(name, parent, local);
        self.nodes[id.0].mesh = Some(mesh);
        id
    }

    /// Returns `true` if `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    /// Borrows a node.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.0)
    }

    /// Mutably borrows a node.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.0)
    }

    /// The name of a node, or `""` if it no longer exists.
    pub fn name(&self, id: NodeId) -> &str {
        self.get(id).map(|n| n.name.as_str()).unwrap_or("")
    }

    /// The parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The children of a node, in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Re-parents `id` under `new_parent`, keeping its local transform value.
    pub fn set_parent(&mut self, id: NodeId, new_parent: Option<NodeId>) {
        if !self.nodes.contains(id.0) {
            return;
        }

        if let Some(old) = self.nodes[id.0].parent {
            if self.nodes.contains(old.0) {
                self.nodes[old.0].children.retain(|c| *c != id);
            }
        }

        self.nodes[id.0].parent = new_parent;
        if let Some(parent) = new_parent {
            self.nodes[parent.0].children.push(id);
        }
    }

    /// Removes a node and its whole subtree.
    pub fn remove_subtree(&mut self, id: NodeId) {
        if !self.nodes.contains(id.0) {
            return;
        }

        if let Some(parent) = self.nodes[id.0].parent {
            if self.nodes.contains(parent.0) {
                self.nodes[parent.0].children.retain(|c| *c != id);
            }
        }

        let mut stack = vec![id];
        while let Some(curr) = stack.pop() {
            if let Some(node) = self.nodes.try_remove(curr.0) {
                stack.extend(node.children);
            }
        }
    }

    /// The world transform of a node, composed from the root down.
    pub fn world_transform(&self, id: NodeId) -> Transform {
        let mut chain = Vec::new();
        let mut curr = Some(id);
        while let Some(c) = curr {
            match self.get(c) {
                Some(node) => {
                    chain.push(node.local);
                    curr = node.parent;
                }
                None => break,
            }
        }

        let mut world = Transform::identity();
        for local in chain.iter().rev() {
            world = world.mul_transform(local);
        }
        world
    }

    /// Moves a node so that its world-space position becomes `pos`.
    pub fn set_world_translation(&mut self, id: NodeId, pos: Point) {
        let parent_world = match self.parent(id) {
            Some(parent) => self.world_transform(parent),
            None => Transform::identity(),
        };

        if let Some(node) = self.get_mut(id) {
            node.local.translation = parent_world.inverse_transform_point(&pos).coords;
        }
    }

    /// Rotates a node so that its world-space rotation becomes `rot`.
    pub fn set_world_rotation(&mut self, id: NodeId, rot: Rotation) {
        let parent_world = match self.parent(id) {
            Some(parent) => self.world_transform(parent),
            None => Transform::identity(),
        };

        if let Some(node) = self.get_mut(id) {
            node.local.rotation = parent_world.rotation.inverse() * rot;
        }
    }

    /// Overwrites the full local transform so the node's world transform becomes `world`.
    pub fn set_world_transform(&mut self, id: NodeId, world: Transform) {
        let parent_world = match self.parent(id) {
            Some(parent) => self.world_transform(parent),
            None => Transform::identity(),
        };

        if let Some(node) = self.get_mut(id) {
            node.local = world.relative_to(&parent_world);
        }
    }

    /// All nodes of the subtree rooted at `root`, depth-first in child
    /// insertion order. The traversal order is stable for an unchanged scene.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(root) {
            return out;
        }

        let mut stack = vec![root];
        while let Some(curr) = stack.pop() {
            out.push(curr);
            let children = self.children(curr);
            for child in children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }
}
