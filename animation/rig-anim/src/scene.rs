//! Scene graph storage
//!
//! Nodes live in an arena addressed by [`NodeId`]. Each node stores its
//! parent index and its ordered child indices, so the hierarchy can be walked
//! iteratively without recursion and without reference cycles.
//!
//! Names are not required to be unique. Every name lookup resolves to the
//! first node with that name in depth-first pre-order, which is the order a
//! recursive search from the root would visit them in.

use std::collections::HashMap;

use glam::Mat4;

use crate::error::{AnimError, Result};

/// Index of a node inside a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node of every scene graph
    pub const ROOT: Self = Self(0);

    /// Arena slot of this node
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single node of the scene hierarchy
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Node {
    /// Node name, used to bind bones and animation channels
    pub name: String,
    /// Static local transform relative to the parent
    pub transform: Mat4,
    /// Parent node (None for the root)
    pub parent: Option<NodeId>,
    /// Children in declaration order
    pub children: Vec<NodeId>,
    /// Indices of non-skinned meshes placed by this node
    pub meshes: Vec<usize>,
}

/// Source of per-node local transforms
///
/// Implemented by [`SceneGraph`] (the static bind pose) and by
/// [`crate::hierarchy::Pose`] (a sampled animation frame), so that walks such
/// as rig extraction can run against either.
pub trait LocalTransforms {
    /// Local transform of the given node
    fn local_transform(&self, node: NodeId) -> Mat4;
}

/// Immutable node hierarchy with a precomputed name index
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    pre_order: Vec<NodeId>,
    names: HashMap<String, NodeId>,
}

impl SceneGraph {
    /// Start building a scene graph from its root node
    pub fn builder(root_name: impl Into<String>, root_transform: Mat4) -> SceneBuilder {
        SceneBuilder::new(root_name, root_transform)
    }

    /// The root node id
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the scene
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A scene always contains its root, so this is never true
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node ids in depth-first pre-order (parents before children)
    pub fn pre_order(&self) -> &[NodeId] {
        &self.pre_order
    }

    /// Find the first node with the given name in depth-first pre-order
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Like [`Self::find`], but fails with [`AnimError::NodeNotFound`]
    pub fn require(&self, name: &str) -> Result<NodeId> {
        self.find(name)
            .ok_or_else(|| AnimError::NodeNotFound(name.to_string()))
    }

    /// Find a node by name together with its accumulated world transform
    ///
    /// The world transform is the product of the local transforms along the
    /// chain from the root down to (and including) the found node.
    pub fn find_with_transform<T: LocalTransforms + ?Sized>(
        &self,
        name: &str,
        locals: &T,
    ) -> Option<(NodeId, Mat4)> {
        let id = self.find(name)?;
        Some((id, self.world_transform(id, locals)))
    }

    /// Accumulate the world transform of a node from the given local transforms
    pub fn world_transform<T: LocalTransforms + ?Sized>(&self, id: NodeId, locals: &T) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            chain.push(node_id);
            current = self.nodes.get(node_id.0).and_then(|n| n.parent);
        }

        chain
            .iter()
            .rev()
            .fold(Mat4::IDENTITY, |world, &node_id| {
                world * locals.local_transform(node_id)
            })
    }

    /// Depth of a node below the root (root has depth 0)
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(id.0).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes.get(parent.0).and_then(|n| n.parent);
        }
        depth
    }
}

impl LocalTransforms for SceneGraph {
    fn local_transform(&self, node: NodeId) -> Mat4 {
        self.nodes
            .get(node.0)
            .map_or(Mat4::IDENTITY, |n| n.transform)
    }
}

/// Incremental constructor for a [`SceneGraph`]
#[derive(Debug, Clone)]
pub struct SceneBuilder {
    nodes: Vec<Node>,
}

impl SceneBuilder {
    /// Create a builder holding only the root node
    pub fn new(root_name: impl Into<String>, root_transform: Mat4) -> Self {
        Self {
            nodes: vec![Node {
                name: root_name.into(),
                transform: root_transform,
                parent: None,
                children: Vec::new(),
                meshes: Vec::new(),
            }],
        }
    }

    /// Append a child under `parent`, after any children it already has
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        transform: Mat4,
    ) -> Result<NodeId> {
        if parent.0 >= self.nodes.len() {
            return Err(AnimError::ValidationError(format!(
                "parent node {} does not exist ({} nodes)",
                parent.0,
                self.nodes.len()
            )));
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.into(),
            transform,
            parent: Some(parent),
            children: Vec::new(),
            meshes: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Place a non-skinned mesh at the given node
    pub fn attach_mesh(&mut self, node: NodeId, mesh_index: usize) -> Result<()> {
        let target = self.nodes.get_mut(node.0).ok_or_else(|| {
            AnimError::ValidationError(format!("cannot attach mesh to missing node {}", node.0))
        })?;
        target.meshes.push(mesh_index);
        Ok(())
    }

    /// Finish the graph, computing traversal order and the name index
    pub fn build(self) -> SceneGraph {
        let mut pre_order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            pre_order.push(id);
            // Reverse push so the first child is visited first
            for &child in self.nodes[id.0].children.iter().rev() {
                stack.push(child);
            }
        }

        let mut names = HashMap::with_capacity(self.nodes.len());
        for &id in &pre_order {
            names
                .entry(self.nodes[id.0].name.clone())
                .or_insert(id);
        }

        log::debug!(
            "Built scene graph with {} nodes ({} unique names)",
            self.nodes.len(),
            names.len()
        );

        SceneGraph {
            nodes: self.nodes,
            pre_order,
            names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(x, y, z))
    }

    #[test]
    fn test_pre_order_follows_declaration_order() {
        let mut builder = SceneGraph::builder("root", Mat4::IDENTITY);
        let a = builder.add_child(NodeId::ROOT, "a", Mat4::IDENTITY).unwrap();
        let b = builder.add_child(NodeId::ROOT, "b", Mat4::IDENTITY).unwrap();
        let a1 = builder.add_child(a, "a1", Mat4::IDENTITY).unwrap();
        let b1 = builder.add_child(b, "b1", Mat4::IDENTITY).unwrap();
        let a2 = builder.add_child(a, "a2", Mat4::IDENTITY).unwrap();
        let scene = builder.build();

        assert_eq!(scene.pre_order(), &[NodeId::ROOT, a, a1, a2, b, b1]);
    }

    #[test]
    fn test_duplicate_names_resolve_to_first_pre_order_match() {
        let mut builder = SceneGraph::builder("root", Mat4::IDENTITY);
        let a = builder.add_child(NodeId::ROOT, "a", Mat4::IDENTITY).unwrap();
        let late = builder.add_child(NodeId::ROOT, "joint", Mat4::IDENTITY).unwrap();
        // Added after `late`, but visited first in pre-order
        let early = builder.add_child(a, "joint", Mat4::IDENTITY).unwrap();
        let scene = builder.build();

        assert_ne!(early, late);
        assert_eq!(scene.find("joint"), Some(early));
    }

    #[test]
    fn test_find_with_transform_accumulates_chain() {
        let mut builder = SceneGraph::builder("root", translation(1.0, 0.0, 0.0));
        let a = builder
            .add_child(NodeId::ROOT, "a", translation(0.0, 2.0, 0.0))
            .unwrap();
        builder.add_child(a, "b", translation(0.0, 0.0, 3.0)).unwrap();
        let scene = builder.build();

        let (_, world) = scene.find_with_transform("b", &scene).unwrap();
        let p = world.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!(scene.find_with_transform("missing", &scene).is_none());
    }

    #[test]
    fn test_add_child_to_missing_parent_fails() {
        let mut builder = SceneGraph::builder("root", Mat4::IDENTITY);
        let result = builder.add_child(NodeId(7), "orphan", Mat4::IDENTITY);
        assert!(matches!(result, Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_depth_and_require() {
        let mut builder = SceneGraph::builder("root", Mat4::IDENTITY);
        let a = builder.add_child(NodeId::ROOT, "a", Mat4::IDENTITY).unwrap();
        let b = builder.add_child(a, "b", Mat4::IDENTITY).unwrap();
        let scene = builder.build();

        assert_eq!(scene.depth(NodeId::ROOT), 0);
        assert_eq!(scene.depth(b), 2);
        assert_eq!(scene.require("b"), Ok(b));
        assert_eq!(
            scene.require("nope"),
            Err(AnimError::NodeNotFound("nope".to_string()))
        );
    }
}
