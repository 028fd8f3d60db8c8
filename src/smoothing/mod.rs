//! Shape-preserving Laplacian smoothing of displaced vertices.

use crate::math::{Point, Real, Vector};
use crate::utils::SortedPair;
use hashbrown::{HashMap, HashSet};

/// How strongly a directly displaced vertex is pulled back toward its
/// pre-resolution position after each relaxation step. Kept weak so the
/// push-out fix survives smoothing.
const ANCHOR_DISPLACED: Real = 0.15;
/// The pull for vertices that are merely adjacent to a displaced one.
/// Stronger, so the surrounding shape is preserved.
const ANCHOR_NEIGHBOR: Real = 0.55;

/// Undirected vertex adjacency over shared triangle edges.
///
/// Rebuilt per resolution pass; correctness never depends on caching it.
#[derive(Clone, Debug)]
pub struct VertexAdjacency {
    neighbors: Vec<Vec<u32>>,
}

impl VertexAdjacency {
    /// Builds the adjacency graph of a triangle index buffer.
    pub fn from_triangles(vertex_count: usize, indices: &[[u32; 3]]) -> Self {
        let mut edges: HashSet<SortedPair<u32>> = HashSet::new();
        let mut neighbors = vec![Vec::new(); vertex_count];

        for idx in indices {
            for (a, b) in [(idx[0], idx[1]), (idx[1], idx[2]), (idx[2], idx[0])] {
                if edges.insert(SortedPair::new(a, b)) {
                    neighbors[a as usize].push(b);
                    neighbors[b as usize].push(a);
                }
            }
        }

        VertexAdjacency { neighbors }
    }

    /// The neighbors of vertex `v`.
    pub fn neighbors(&self, v: usize) -> &[u32] {
        &self.neighbors[v]
    }

    /// Number of vertices the graph was built over.
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// `true` if the graph has no vertices.
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Runs a bounded number of Laplacian relaxation iterations restricted to
/// the displaced vertices and their one-ring neighborhoods.
///
/// Each iteration moves every vertex of the region toward its neighbors'
/// centroid, scaled by `strength` in `[0, 1]`, then blends it back toward
/// its position in `originals`: weakly for directly displaced vertices (keep
/// the fix), strongly for merely adjacent ones (preserve the shape).
/// Vertices outside the region are never moved.
pub fn relax(
    positions: &mut [Point],
    originals: &[Point],
    displaced: &[usize],
    adjacency: &VertexAdjacency,
    strength: Real,
    iterations: usize,
) {
    if displaced.is_empty() || strength <= 0.0 {
        return;
    }
    let strength = strength.min(1.0);

    // Region membership: value marks whether the vertex was directly
    // displaced (vs. pulled in as a neighbor).
    let mut region: HashMap<usize, bool> = HashMap::new();
    for &v in displaced {
        region.insert(v, true);
    }
    for &v in displaced {
        for &n in adjacency.neighbors(v) {
            region.entry(n as usize).or_insert(false);
        }
    }

    // Deterministic iteration order regardless of hash state.
    let mut order: Vec<usize> = region.keys().copied().collect();
    order.sort_unstable();

    let mut staged: Vec<(usize, Point)> = Vec::with_capacity(order.len());
    for _ in 0..iterations {
        staged.clear();

        for &v in &order {
            let neighbors = adjacency.neighbors(v);
            if neighbors.is_empty() {
                continue;
            }

            let mut centroid = Vector::zeros();
            for &n in neighbors {
                centroid += positions[n as usize].coords;
            }
            centroid /= neighbors.len() as Real;

            let relaxed = positions[v].coords.lerp(&centroid, strength);
            let anchor = if region[&v] {
                ANCHOR_DISPLACED
            } else {
                ANCHOR_NEIGHBOR
            };
            let blended = relaxed.lerp(&originals[v].coords, anchor);
            staged.push((v, Point::from(blended)));
        }

        // Two-phase: all reads above happen against the previous iteration.
        for (v, p) in &staged {
            positions[*v] = *p;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_positions() -> Vec<Point> {
        // 3x3 planar grid.
        let mut pts = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                pts.push(Point::new(x as Real, y as Real, 0.0));
            }
        }
        pts
    }

    fn grid_indices() -> Vec<[u32; 3]> {
        let mut idx = Vec::new();
        for y in 0..2u32 {
            for x in 0..2u32 {
                let a = y * 3 + x;
                idx.push([a, a + 1, a + 4]);
                idx.push([a, a + 4, a + 3]);
            }
        }
        idx
    }

    #[test]
    fn adjacency_links_shared_edges_once() {
        let adj = VertexAdjacency::from_triangles(9, &grid_indices());
        // Center vertex of the grid touches all 4 axis neighbors plus the
        // two diagonal split edges.
        let mut center: Vec<u32> = adj.neighbors(4).to_vec();
        center.sort_unstable();
        assert_eq!(center, vec![0, 1, 3, 5, 7, 8]);
    }

    #[test]
    fn untouched_vertices_never_move() {
        let originals = grid_positions();
        let mut positions = originals.clone();
        // Displace the corner vertex 0; only 0 and its neighbors may move.
        positions[0].z = 0.5;

        let adj = VertexAdjacency::from_triangles(9, &grid_indices());
        relax(&mut positions, &originals, &[0], &adj, 0.8, 2);

        for v in [2, 5, 6, 7, 8] {
            assert_eq!(positions[v], originals[v], "vertex {} moved", v);
        }
    }

    #[test]
    fn displaced_vertex_keeps_most_of_its_fix() {
        let originals = grid_positions();
        let mut positions = originals.clone();
        positions[4].z = 0.1;

        let adj = VertexAdjacency::from_triangles(9, &grid_indices());
        relax(&mut positions, &originals, &[4], &adj, 0.5, 2);

        // Smoothing blends toward flat neighbors but the anchor keeps the
        // bulk of the displacement.
        assert!(positions[4].z > 0.02 && positions[4].z < 0.1);
    }

    #[test]
    fn zero_strength_is_a_no_op() {
        let originals = grid_positions();
        let mut positions = originals.clone();
        positions[4].z = 0.1;
        let expected = positions.clone();

        let adj = VertexAdjacency::from_triangles(9, &grid_indices());
        relax(&mut positions, &originals, &[4], &adj, 0.0, 3);

        assert_eq!(positions, expected);
    }
}
