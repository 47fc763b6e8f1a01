//! Skeleton extraction for debug overlays
//!
//! Produces one line segment per bone below a named root, connecting each
//! node's world position to its parent's.

use glam::{Mat4, Vec3};

use crate::scene::{LocalTransforms, NodeId, SceneGraph};

/// A bone drawn as a line from its parent's origin to its own
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct BoneSegment {
    /// Name of the child node this segment ends at
    pub name: String,
    /// World-space origin of the parent node
    pub parent_position: Vec3,
    /// World-space origin of the child node
    pub child_position: Vec3,
}

impl BoneSegment {
    /// Segment length in world units
    pub fn length(&self) -> f32 {
        self.parent_position.distance(self.child_position)
    }
}

/// Extract the bone segments below `root_name`
///
/// The root is resolved by name (first pre-order match) and its world
/// transform accumulated along its ancestor chain. Every descendant then
/// yields one segment, in depth-first pre-order. An unknown root yields no
/// segments.
///
/// `locals` selects the pose: pass the [`SceneGraph`] itself for the bind
/// pose or a [`crate::hierarchy::Pose`] for an animated frame.
pub fn extract_rig<T: LocalTransforms + ?Sized>(
    scene: &SceneGraph,
    locals: &T,
    root_name: &str,
) -> Vec<BoneSegment> {
    let Some((root, root_world)) = scene.find_with_transform(root_name, locals) else {
        log::warn!("Rig root '{root_name}' not found, no bone segments extracted");
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut stack: Vec<(NodeId, Mat4)> = Vec::new();
    push_children(scene, root, root_world, &mut stack);

    while let Some((id, parent_world)) = stack.pop() {
        let Some(node) = scene.node(id) else {
            continue;
        };
        let world = parent_world * locals.local_transform(id);

        segments.push(BoneSegment {
            name: node.name.clone(),
            parent_position: parent_world.transform_point3(Vec3::ZERO),
            child_position: world.transform_point3(Vec3::ZERO),
        });

        push_children(scene, id, world, &mut stack);
    }

    log::trace!(
        "Extracted {} bone segments below '{}'",
        segments.len(),
        root_name
    );
    segments
}

fn push_children(scene: &SceneGraph, id: NodeId, world: Mat4, stack: &mut Vec<(NodeId, Mat4)>) {
    if let Some(node) = scene.node(id) {
        // Reversed so the first child is popped first
        stack.extend(node.children.iter().rev().map(|&child| (child, world)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::propagate;

    fn skeleton() -> SceneGraph {
        let mut builder = SceneGraph::builder("Armature", Mat4::from_translation(Vec3::Z));
        let hips = builder
            .add_child(NodeId::ROOT, "Hips", Mat4::from_translation(Vec3::Y))
            .unwrap();
        let spine = builder
            .add_child(hips, "Spine", Mat4::from_translation(Vec3::Y))
            .unwrap();
        builder
            .add_child(spine, "Head", Mat4::from_translation(Vec3::Y))
            .unwrap();
        builder
            .add_child(hips, "LeftLeg", Mat4::from_translation(Vec3::NEG_Y))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_segments_in_pre_order() {
        let scene = skeleton();
        let segments = extract_rig(&scene, &scene, "Hips");

        let names: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Spine", "Head", "LeftLeg"]);

        // The root's ancestor chain is included
        assert_eq!(segments[0].parent_position, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(segments[0].child_position, Vec3::new(0.0, 2.0, 1.0));
        assert_eq!(segments[1].child_position, Vec3::new(0.0, 3.0, 1.0));
        assert_eq!(segments[2].parent_position, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(segments[2].child_position, Vec3::new(0.0, 0.0, 1.0));
        assert!((segments[1].length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let scene = skeleton();
        assert!(extract_rig(&scene, &scene, "Tail").is_empty());
    }

    #[test]
    fn test_leaf_root_has_no_segments() {
        let scene = skeleton();
        assert!(extract_rig(&scene, &scene, "Head").is_empty());
    }

    #[test]
    fn test_pose_and_scene_agree_without_animation() {
        let scene = skeleton();
        let pose = propagate(&scene, &[], None, 0.0).unwrap();
        assert_eq!(
            extract_rig(&scene, &pose, "Armature"),
            extract_rig(&scene, &scene, "Armature")
        );
    }
}
