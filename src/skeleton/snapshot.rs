use crate::scene::{NodeId, SceneGraph, Transform};
use hashbrown::HashMap;

/// One bone of a [`SkeletonSnapshot`].
///
/// This record is an immutable capture; the live node it mirrors is mutated
/// later, not this record.
#[derive(Clone, Debug)]
pub struct BoneRecord {
    /// The live node this record was captured from.
    pub node: NodeId,
    /// The node name at capture time.
    pub name: String,
    /// The world transform at capture time.
    pub world: Transform,
    /// Index of the parent record within the snapshot, if the parent is part
    /// of the same capture.
    pub parent: Option<usize>,
    /// Whether the node carries a render mesh.
    pub has_mesh: bool,
}

/// A read-only capture of a skeleton hierarchy.
///
/// Records are stored depth-first in child insertion order, so two captures
/// of an unchanged scene list bones identically. Snapshots are created fresh
/// per fitting operation and discarded at its end.
#[derive(Default, Debug)]
pub struct SkeletonSnapshot {
    records: Vec<BoneRecord>,
    by_node: HashMap<NodeId, usize>,
    children: Vec<Vec<usize>>,
}

impl SkeletonSnapshot {
    /// Captures the subtree rooted at `root`.
    ///
    /// A missing root yields an empty snapshot, never an error.
    pub fn capture(graph: &SceneGraph, root: NodeId) -> Self {
        let mut snapshot = SkeletonSnapshot::default();
        if !graph.contains(root) {
            return snapshot;
        }

        for node in graph.descendants(root) {
            let parent = graph
                .parent(node)
                .and_then(|p| snapshot.by_node.get(&p).copied());
            let record = BoneRecord {
                node,
                name: graph.name(node).to_owned(),
                world: graph.world_transform(node),
                parent,
                has_mesh: graph.get(node).is_some_and(|n| n.mesh.is_some()),
            };

            let idx = snapshot.records.len();
            snapshot.by_node.insert(node, idx);
            snapshot.children.push(Vec::new());
            if let Some(parent) = parent {
                snapshot.children[parent].push(idx);
            }
            snapshot.records.push(record);
        }

        snapshot
    }

    /// `true` if the capture found no bones.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of captured bones.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// All records, in capture (depth-first) order.
    pub fn records(&self) -> &[BoneRecord] {
        &self.records
    }

    /// The record at `idx`.
    pub fn record(&self, idx: usize) -> &BoneRecord {
        &self.records[idx]
    }

    /// The record index for a live node, if it was captured.
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.by_node.get(&node).copied()
    }

    /// Indices of the direct children of record `idx`, in capture order.
    pub fn children_of(&self, idx: usize) -> &[usize] {
        &self.children[idx]
    }
}
