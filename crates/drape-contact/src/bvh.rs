//! k-DOP bounding volume tree.
//!
//! A quad-tree over the faces of one surface, stored as an arena of
//! [`BvtNode`]s addressed by [`NodeId`]. Leaves are created first, one
//! per face in face order, so they occupy `nodes[..leaf_count]` and are
//! threaded into a doubly linked list independent of tree shape.
//!
//! Building sorts leaves along the longest axis of the enclosing bound
//! and splits them into up to four near-equal runs per level. Updating
//! refits every leaf (in parallel) and then propagates bounds upward,
//! joining a parent only once all of its children have been refreshed.
//!
//! Leaf bounds are inflated by `epsilon`. Internal bounds are the exact
//! union of their children.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use drape_math::{Kdop, KdopType, Vec3};
use drape_mesh::normals::face_normal;
use drape_mesh::Face;
use drape_types::error::try_reserve;
use drape_types::{DrapeError, DrapeResult};

use crate::sort::introsort;

/// Quad-tree branching factor.
pub const BRANCHING: usize = 4;

/// Index of a node in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One node of a [`BoundingVolumeTree`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvtNode {
    pub bound: Kdop,
    pub children: [Option<NodeId>; BRANCHING],
    pub children_count: u8,
    pub parent: Option<NodeId>,
    /// Next leaf in creation order (leaves only).
    pub next: Option<NodeId>,
    /// Previous leaf in creation order (leaves only).
    pub prev: Option<NodeId>,
    pub is_leaf: bool,
    /// Face this leaf bounds (leaves only).
    pub face: u32,
    /// Children refreshed so far in the current update.
    traversed: u8,
    /// Average face normal of the subtree.
    pub normal: Vec3,
    /// Angular spread of face normals around `normal`, radians.
    pub alpha: f32,
}

impl BvtNode {
    fn leaf(face: u32, bound: Kdop, normal: Vec3) -> Self {
        Self {
            bound,
            children: [None; BRANCHING],
            children_count: 0,
            parent: None,
            next: None,
            prev: None,
            is_leaf: true,
            face,
            traversed: 0,
            normal,
            alpha: 0.0,
        }
    }

    fn internal() -> Self {
        Self {
            bound: Kdop::EMPTY,
            children: [None; BRANCHING],
            children_count: 0,
            parent: None,
            next: None,
            prev: None,
            is_leaf: false,
            face: u32::MAX,
            traversed: 0,
            normal: Vec3::ZERO,
            alpha: 0.0,
        }
    }

    /// Populated children.
    pub fn child_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.children.iter().flatten().copied()
    }

    /// Pending-join counter; zero between updates.
    pub fn traversed(&self) -> u8 {
        self.traversed
    }
}

/// Bounding volume tree over the faces of one surface.
#[derive(Debug, Clone)]
pub struct BoundingVolumeTree {
    kind: KdopType,
    epsilon: f32,
    faces: Vec<Face>,
    vertex_count: usize,
    nodes: Vec<BvtNode>,
    root: Option<NodeId>,
    leaf_head: Option<NodeId>,
    parallel: bool,
}

fn leaf_bound(kind: KdopType, epsilon: f32, face: &Face, prev: &[Vec3], cur: &[Vec3], moving: bool) -> Kdop {
    let mut bound = Kdop::EMPTY;
    for c in face.corners() {
        bound.add_point(kind, cur[c as usize]);
        if moving {
            bound.add_point(kind, prev[c as usize]);
        }
    }
    bound.inflate(kind, epsilon);
    bound
}

impl BoundingVolumeTree {
    /// Builds a tree whose leaves bound each face swept from `prev` to `cur`.
    ///
    /// Fails with [`DrapeError::InvalidMesh`] if a face indexes past the
    /// position arrays and with [`DrapeError::Allocation`] if the arena
    /// cannot be reserved.
    pub fn build(
        faces: &[Face],
        prev: &[Vec3],
        cur: &[Vec3],
        kind: KdopType,
        epsilon: f32,
    ) -> DrapeResult<Self> {
        if prev.len() != cur.len() {
            return Err(DrapeError::TopologyMismatch {
                expected: cur.len(),
                found: prev.len(),
            });
        }
        let vertex_count = cur.len();
        if let Some(bad) = faces
            .iter()
            .flat_map(|f| f.corners())
            .find(|&c| c as usize >= vertex_count)
        {
            return Err(DrapeError::InvalidMesh(format!(
                "face references vertex {bad} (vertex count: {vertex_count})"
            )));
        }

        let leaf_count = faces.len();
        let mut nodes = Vec::new();
        try_reserve(&mut nodes, 2 * leaf_count, "bvt nodes")?;
        let mut own_faces = Vec::new();
        try_reserve(&mut own_faces, leaf_count, "bvt faces")?;
        own_faces.extend_from_slice(faces);

        for (f, face) in faces.iter().enumerate() {
            let bound = leaf_bound(kind, epsilon, face, prev, cur, true);
            let mut leaf = BvtNode::leaf(f as u32, bound, face_normal(face, cur));
            if f > 0 {
                leaf.prev = Some(NodeId(f as u32 - 1));
            }
            if f + 1 < leaf_count {
                leaf.next = Some(NodeId(f as u32 + 1));
            }
            nodes.push(leaf);
        }

        let mut tree = Self {
            kind,
            epsilon,
            faces: own_faces,
            vertex_count,
            nodes,
            root: None,
            leaf_head: (leaf_count > 0).then_some(NodeId(0)),
            parallel: true,
        };

        if leaf_count > 0 {
            let mut order: Vec<u32> = Vec::new();
            try_reserve(&mut order, leaf_count, "bvt leaf order")?;
            order.extend(0..leaf_count as u32);
            tree.root = Some(tree.partition(&mut order, None));
        }

        debug!(
            leaves = leaf_count,
            nodes = tree.nodes.len(),
            k = kind.k(),
            "built bounding volume tree"
        );
        Ok(tree)
    }

    /// Builds a tree over a single position snapshot.
    pub fn build_static(faces: &[Face], positions: &[Vec3], kind: KdopType, epsilon: f32) -> DrapeResult<Self> {
        Self::build(faces, positions, positions, kind, epsilon)
    }

    /// Discards the arena and builds a fresh tree, e.g. after a topology change.
    pub fn rebuild(&mut self, faces: &[Face], prev: &[Vec3], cur: &[Vec3]) -> DrapeResult<()> {
        let parallel = self.parallel;
        *self = Self::build(faces, prev, cur, self.kind, self.epsilon)?;
        self.parallel = parallel;
        Ok(())
    }

    /// Enables or disables parallel leaf refits.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Builds the subtree over `leaves`, returning its root.
    fn partition(&mut self, leaves: &mut [u32], parent: Option<NodeId>) -> NodeId {
        if let [single] = leaves {
            let id = NodeId(*single);
            self.nodes[id.index()].parent = parent;
            return id;
        }

        let id = NodeId(self.nodes.len() as u32);
        let mut node = BvtNode::internal();
        node.parent = parent;
        for &leaf in leaves.iter() {
            node.bound.union_with(self.kind, &self.nodes[leaf as usize].bound);
        }
        let axis = node.bound.longest_axis(self.kind);
        self.nodes.push(node);

        {
            let nodes = &self.nodes;
            introsort(leaves, |&leaf| nodes[leaf as usize].bound.center(axis));
        }

        let len = leaves.len();
        let mut slot = 0;
        for i in 0..BRANCHING {
            let start = len * i / BRANCHING;
            let end = len * (i + 1) / BRANCHING;
            if start == end {
                continue;
            }
            let child = self.partition(&mut leaves[start..end], Some(id));
            self.nodes[id.index()].children[slot] = Some(child);
            slot += 1;
        }
        self.nodes[id.index()].children_count = slot as u8;
        self.join(id);
        id
    }

    /// Recomputes an internal node's bound and normal cone from its children.
    ///
    /// The bound is the exact union of the child bounds. Only leaves
    /// carry the `epsilon` inflation.
    fn join(&mut self, id: NodeId) {
        let kind = self.kind;
        let node = self.nodes[id.index()];
        let mut bound = Kdop::EMPTY;
        let mut normal_sum = Vec3::ZERO;
        for child in node.child_ids() {
            let c = &self.nodes[child.index()];
            bound.union_with(kind, &c.bound);
            normal_sum += c.normal;
        }

        let normal = normal_sum.normalize_or_zero();
        let mut alpha: f32 = 0.0;
        for child in node.child_ids() {
            let c = &self.nodes[child.index()];
            let spread = if normal == Vec3::ZERO || c.normal == Vec3::ZERO {
                std::f32::consts::PI
            } else {
                c.normal.dot(normal).clamp(-1.0, 1.0).acos()
            };
            alpha = alpha.max(spread + c.alpha);
        }

        let node = &mut self.nodes[id.index()];
        node.bound = bound;
        node.normal = normal;
        node.alpha = alpha;
    }

    /// Refits the tree after positions change.
    ///
    /// Static updates bound each face at `cur`; moving updates bound the
    /// sweep from `prev` to `cur`.
    pub fn update(&mut self, prev: &[Vec3], cur: &[Vec3], moving: bool) -> DrapeResult<()> {
        for len in [prev.len(), cur.len()] {
            if len != self.vertex_count {
                return Err(DrapeError::TopologyMismatch {
                    expected: self.vertex_count,
                    found: len,
                });
            }
        }

        let (kind, epsilon) = (self.kind, self.epsilon);
        let leaf_count = self.faces.len();
        let faces = &self.faces;
        let leaves = &mut self.nodes[..leaf_count];
        let refit = |node: &mut BvtNode| {
            let face = &faces[node.face as usize];
            node.bound = leaf_bound(kind, epsilon, face, prev, cur, moving);
            node.normal = face_normal(face, cur);
        };
        if self.parallel {
            leaves.par_iter_mut().for_each(refit);
        } else {
            leaves.iter_mut().for_each(refit);
        }

        self.propagate();
        Ok(())
    }

    /// Bottom-up join along the leaf list, gated by `traversed` counters.
    fn propagate(&mut self) {
        let mut leaf = self.leaf_head;
        while let Some(id) = leaf {
            let mut parent = self.nodes[id.index()].parent;
            while let Some(p) = parent {
                let node = &mut self.nodes[p.index()];
                node.traversed += 1;
                if node.traversed < node.children_count {
                    break;
                }
                node.traversed = 0;
                self.join(p);
                parent = self.nodes[p.index()].parent;
            }
            leaf = self.nodes[id.index()].next;
        }
    }

    pub fn kind(&self) -> KdopType {
        self.kind
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&BvtNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[BvtNode] {
        &self.nodes
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn leaf_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Walks the leaf list in creation order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.leaf_head, move |id| self.nodes[id.index()].next)
    }

    /// Height of the tree; a single-leaf tree has depth 1.
    pub fn depth(&self) -> usize {
        fn walk(tree: &BoundingVolumeTree, id: NodeId) -> usize {
            1 + tree.nodes[id.index()]
                .child_ids()
                .map(|c| walk(tree, c))
                .max()
                .unwrap_or(0)
        }
        self.root.map_or(0, |r| walk(self, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_mesh::generators::quad_grid;

    #[test]
    fn propagation_leaves_counters_reset() {
        let surface = quad_grid(9, 7, 1.0, 1.0);
        let mut tree =
            BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop18, 0.01).unwrap();
        let moved: Vec<Vec3> = surface.positions.iter().map(|p| *p + Vec3::Y).collect();
        tree.update(&surface.positions, &moved, true).unwrap();
        assert!(tree.nodes.iter().all(|n| n.traversed == 0));
    }

    #[test]
    fn leaves_precede_internal_nodes() {
        let surface = quad_grid(5, 5, 1.0, 1.0);
        let tree =
            BoundingVolumeTree::build_static(&surface.faces, &surface.positions, KdopType::Dop26, 0.0).unwrap();
        for (i, node) in tree.nodes.iter().enumerate() {
            assert_eq!(node.is_leaf, i < tree.leaf_count());
            if node.is_leaf {
                assert_eq!(node.face as usize, i);
            }
        }
    }
}
