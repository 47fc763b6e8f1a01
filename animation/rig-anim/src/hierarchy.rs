//! Node hierarchy transform propagation
//!
//! Walks the scene graph parent-before-children and combines every node's
//! local transform with its parent's world transform. Nodes driven by a
//! channel of the active clip get their local transform replaced by the
//! sampled `T * R * S` for this frame only: the result is stored in a
//! [`Pose`], the scene graph itself is never modified.

use glam::{Mat4, Vec3};

use crate::animation::{AnimationClip, ClipBinding, sample};
use crate::error::Result;
use crate::mesh::Mesh;
use crate::scene::{LocalTransforms, NodeId, SceneGraph};

/// A clip together with its binding to the scene being walked
#[derive(Debug, Clone, Copy)]
pub struct ActiveClip<'a> {
    pub clip: &'a AnimationClip,
    pub binding: &'a ClipBinding,
}

impl<'a> ActiveClip<'a> {
    /// Pair a clip with its binding
    pub fn new(clip: &'a AnimationClip, binding: &'a ClipBinding) -> Self {
        Self { clip, binding }
    }
}

/// Per-frame transforms of every node, indexed by [`NodeId`]
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    locals: Vec<Mat4>,
    worlds: Vec<Mat4>,
    animated: Vec<bool>,
    mesh_transforms: Vec<Mat4>,
}

impl Pose {
    /// Pose of the static scene graph, without any animation applied
    pub fn bind_pose(scene: &SceneGraph, meshes: &[Mesh]) -> Self {
        walk(scene, meshes, |_| Ok(None)).unwrap_or_else(|_| Self::identity(scene, meshes))
    }

    fn identity(scene: &SceneGraph, meshes: &[Mesh]) -> Self {
        Self {
            locals: vec![Mat4::IDENTITY; scene.len()],
            worlds: vec![Mat4::IDENTITY; scene.len()],
            animated: vec![false; scene.len()],
            mesh_transforms: vec![Mat4::IDENTITY; meshes.len()],
        }
    }

    /// Local transform used for a node in this frame
    pub fn local(&self, node: NodeId) -> Mat4 {
        self.locals.get(node.index()).copied().unwrap_or(Mat4::IDENTITY)
    }

    /// Accumulated world transform of a node
    pub fn world(&self, node: NodeId) -> Mat4 {
        self.worlds.get(node.index()).copied().unwrap_or(Mat4::IDENTITY)
    }

    /// World-space origin of a node
    pub fn world_position(&self, node: NodeId) -> Vec3 {
        self.world(node).transform_point3(Vec3::ZERO)
    }

    /// Whether the node's local transform came from a channel this frame
    pub fn is_animated(&self, node: NodeId) -> bool {
        self.animated.get(node.index()).copied().unwrap_or(false)
    }

    /// Model matrix of a non-skinned mesh
    ///
    /// Meshes that no node places keep the identity matrix.
    pub fn mesh_transform(&self, mesh: usize) -> Option<Mat4> {
        self.mesh_transforms.get(mesh).copied()
    }

    /// Model matrices of all meshes, in mesh order
    pub fn mesh_transforms(&self) -> &[Mat4] {
        &self.mesh_transforms
    }

    /// All world transforms in arena order
    pub fn world_transforms(&self) -> &[Mat4] {
        &self.worlds
    }

    /// Number of nodes covered by this pose
    pub fn node_count(&self) -> usize {
        self.worlds.len()
    }
}

impl LocalTransforms for Pose {
    fn local_transform(&self, node: NodeId) -> Mat4 {
        self.local(node)
    }
}

/// Compute the pose of the scene at `time` ticks into the active clip
///
/// With no active clip this is the bind pose. Fails only when a channel is
/// sampled outside its key range, which the animation clock rules out by
/// wrapping time into the clip.
pub fn propagate(
    scene: &SceneGraph,
    meshes: &[Mesh],
    active: Option<ActiveClip<'_>>,
    time: f64,
) -> Result<Pose> {
    let Some(active) = active else {
        return walk(scene, meshes, |_| Ok(None));
    };

    walk(scene, meshes, |node| {
        let Some(channel) = active.binding.channel(active.clip, node) else {
            return Ok(None);
        };
        Ok(sample(channel, time)?.map(|s| s.to_matrix()))
    })
}

/// Iterative pre-order walk; `animate` may override a node's local transform
fn walk<F>(scene: &SceneGraph, meshes: &[Mesh], mut animate: F) -> Result<Pose>
where
    F: FnMut(NodeId) -> Result<Option<Mat4>>,
{
    let mut pose = Pose::identity(scene, meshes);

    for &id in scene.pre_order() {
        let Some(node) = scene.node(id) else {
            continue;
        };

        let parent_world = node.parent.map_or(Mat4::IDENTITY, |p| pose.worlds[p.index()]);

        let local = match animate(id)? {
            Some(animated) => {
                pose.animated[id.index()] = true;
                animated
            }
            None => node.transform,
        };

        let world = parent_world * local;
        pose.locals[id.index()] = local;
        pose.worlds[id.index()] = world;

        for &mesh_index in &node.meshes {
            if let Some(mesh) = meshes.get(mesh_index)
                && !mesh.is_skinned()
            {
                pose.mesh_transforms[mesh_index] = world;
            }
        }
    }

    log::trace!(
        "Propagated {} nodes ({} animated)",
        pose.worlds.len(),
        pose.animated.iter().filter(|a| **a).count()
    );

    Ok(pose)
}
