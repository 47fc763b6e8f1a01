//! Loaded rigged model: scene graph, meshes and clips

use crate::animation::{AnimationClip, Keyframe};
use crate::error::{AnimError, Result};
use crate::mesh::Mesh;
use crate::scene::SceneGraph;

/// Allowed deviation of a rotation key from unit length
const UNIT_TOLERANCE: f32 = 1e-3;

/// Everything the scene importer hands over, immutable after load
#[derive(Debug, Clone)]
pub struct AnimatedModel {
    /// Node hierarchy
    pub scene: SceneGraph,
    /// Meshes, addressed by index from nodes
    pub meshes: Vec<Mesh>,
    /// Animation clips
    pub clips: Vec<AnimationClip>,
}

impl AnimatedModel {
    /// Bundle imported data into a model
    pub fn new(scene: SceneGraph, meshes: Vec<Mesh>, clips: Vec<AnimationClip>) -> Self {
        Self {
            scene,
            meshes,
            clips,
        }
    }

    /// Find a clip by name
    pub fn clip(&self, name: &str) -> Option<(usize, &AnimationClip)> {
        self.clips.iter().enumerate().find(|(_, c)| c.name == name)
    }

    /// Number of meshes deformed by bones
    pub fn skinned_mesh_count(&self) -> usize {
        self.meshes.iter().filter(|m| m.is_skinned()).count()
    }

    /// Total number of bones over all meshes
    pub fn bone_count(&self) -> usize {
        self.meshes.iter().map(|m| m.bones.len()).sum()
    }

    /// Validate the model structure
    ///
    /// Checks the invariants the per-frame pipeline relies on, so problems
    /// show up at load time instead of in the middle of playback.
    pub fn validate(&self) -> Result<()> {
        // Mesh references from nodes
        for node in self.scene.nodes() {
            for &mesh in &node.meshes {
                if mesh >= self.meshes.len() {
                    return Err(AnimError::ValidationError(format!(
                        "Node '{}' references mesh {} but the model has {} meshes",
                        node.name,
                        mesh,
                        self.meshes.len()
                    )));
                }
            }
        }

        for (index, mesh) in self.meshes.iter().enumerate() {
            self.validate_mesh(index, mesh)?;
        }

        for clip in &self.clips {
            validate_clip(clip)?;
        }

        Ok(())
    }

    fn validate_mesh(&self, index: usize, mesh: &Mesh) -> Result<()> {
        let vertex_count = mesh.vertex_count();

        if !mesh.normals.is_empty() && mesh.normals.len() != vertex_count {
            return Err(AnimError::ValidationError(format!(
                "Mesh {} has {} normals for {} vertices",
                index,
                mesh.normals.len(),
                vertex_count
            )));
        }
        if !mesh.tex_coords.is_empty() && mesh.tex_coords.len() != vertex_count {
            return Err(AnimError::ValidationError(format!(
                "Mesh {} has {} texture coordinates for {} vertices",
                index,
                mesh.tex_coords.len(),
                vertex_count
            )));
        }

        if mesh.indices.len() % 3 != 0 {
            return Err(AnimError::ValidationError(format!(
                "Mesh {} index count {} is not a multiple of 3",
                index,
                mesh.indices.len()
            )));
        }
        if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(AnimError::ValidationError(format!(
                "Mesh {index} index {bad} is out of range ({vertex_count} vertices)"
            )));
        }

        for bone in &mesh.bones {
            if self.scene.find(&bone.name).is_none() {
                return Err(AnimError::MalformedRig {
                    bone: bone.name.clone(),
                    mesh: index,
                });
            }
            if let Some(w) = bone.weights.iter().find(|w| w.vertex as usize >= vertex_count) {
                return Err(AnimError::ValidationError(format!(
                    "Bone '{}' of mesh {} weights vertex {} ({} vertices)",
                    bone.name, index, w.vertex, vertex_count
                )));
            }
        }

        Ok(())
    }
}

fn validate_clip(clip: &AnimationClip) -> Result<()> {
    if !clip.duration.is_finite() || clip.duration <= 0.0 {
        return Err(AnimError::InvalidClip(format!(
            "clip '{}' has duration {}",
            clip.name, clip.duration
        )));
    }
    if !clip.ticks_per_second.is_finite() || clip.ticks_per_second < 0.0 {
        return Err(AnimError::InvalidClip(format!(
            "clip '{}' has rate {}",
            clip.name, clip.ticks_per_second
        )));
    }

    for channel in &clip.channels {
        let sorted = keys_sorted(&channel.positions)
            && keys_sorted(&channel.rotations)
            && keys_sorted(&channel.scales);
        if !sorted {
            return Err(AnimError::ValidationError(format!(
                "Channel '{}' of clip '{}' has decreasing key times",
                channel.node_name, clip.name
            )));
        }

        // Clock times lie in [0, duration); multi-key tracks must reach the end
        let short = [
            track_end(&channel.positions),
            track_end(&channel.rotations),
            track_end(&channel.scales),
        ]
        .into_iter()
        .flatten()
        .find(|&end| end < clip.duration);
        if let Some(end) = short {
            return Err(AnimError::InvalidClip(format!(
                "channel '{}' of clip '{}' ends at {} before the clip duration {}",
                channel.node_name, clip.name, end, clip.duration
            )));
        }

        if let Some(key) = channel
            .rotations
            .iter()
            .find(|k| !k.value.is_finite() || (k.value.length() - 1.0).abs() > UNIT_TOLERANCE)
        {
            return Err(AnimError::ValidationError(format!(
                "Channel '{}' of clip '{}' has a non-unit rotation key at {} (length {})",
                channel.node_name,
                clip.name,
                key.time,
                key.value.length()
            )));
        }
    }

    Ok(())
}

/// Last key time of a track with more than one key
fn track_end<T>(keys: &[Keyframe<T>]) -> Option<f64> {
    match keys {
        [_, .., last] => Some(last.time),
        _ => None,
    }
}

fn keys_sorted<T>(keys: &[Keyframe<T>]) -> bool {
    keys.windows(2).all(|pair| pair[0].time <= pair[1].time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationChannel, QuatKey, VectorKey};
    use crate::mesh::Bone;
    use crate::scene::NodeId;
    use glam::{Mat4, Quat, Vec3};

    fn model() -> AnimatedModel {
        let mut builder = SceneGraph::builder("root", Mat4::IDENTITY);
        let body = builder.add_child(NodeId::ROOT, "Body", Mat4::IDENTITY).unwrap();
        builder.attach_mesh(body, 0).unwrap();
        let scene = builder.build();

        let mesh = Mesh {
            name: "body".to_string(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            normals: vec![Vec3::Z; 3],
            indices: vec![0, 1, 2],
            bones: vec![Bone::new("Body", Mat4::IDENTITY).with_weight(2, 1.0)],
            ..Mesh::default()
        };

        let mut channel = AnimationChannel::new("Body");
        channel.positions = vec![
            VectorKey::new(0.0, Vec3::ZERO),
            VectorKey::new(10.0, Vec3::X),
        ];
        let mut clip = AnimationClip::new("walk", 10.0, 0.0);
        clip.channels.push(channel);

        AnimatedModel::new(scene, vec![mesh], vec![clip])
    }

    #[test]
    fn test_valid_model() {
        let model = model();
        model.validate().unwrap();
        assert_eq!(model.skinned_mesh_count(), 1);
        assert_eq!(model.bone_count(), 1);
        assert_eq!(model.clip("walk").map(|(i, _)| i), Some(0));
        assert!(model.clip("run").is_none());
    }

    #[test]
    fn test_index_count_not_multiple_of_three() {
        let mut model = model();
        model.meshes[0].indices.push(0);
        assert!(matches!(model.validate(), Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_index_out_of_range() {
        let mut model = model();
        model.meshes[0].indices = vec![0, 1, 3];
        assert!(matches!(model.validate(), Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_normal_count_mismatch() {
        let mut model = model();
        model.meshes[0].normals.pop();
        assert!(matches!(model.validate(), Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_weight_vertex_out_of_range() {
        let mut model = model();
        model.meshes[0].bones[0].weights[0].vertex = 7;
        assert!(matches!(model.validate(), Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_bone_without_node() {
        let mut model = model();
        model.meshes[0].bones[0].name = "Ghost".to_string();
        assert_eq!(
            model.validate(),
            Err(AnimError::MalformedRig {
                bone: "Ghost".to_string(),
                mesh: 0
            })
        );
    }

    #[test]
    fn test_node_mesh_reference_out_of_range() {
        let mut model = model();
        model.meshes.clear();
        assert!(matches!(model.validate(), Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_decreasing_key_times() {
        let mut model = model();
        model.clips[0].channels[0].positions.reverse();
        assert!(matches!(model.validate(), Err(AnimError::ValidationError(_))));
    }

    #[test]
    fn test_zero_duration_clip() {
        let mut model = model();
        model.clips[0].duration = 0.0;
        assert!(matches!(model.validate(), Err(AnimError::InvalidClip(_))));
    }

    #[test]
    fn test_track_ending_before_duration() {
        let mut model = model();
        model.clips[0].channels[0].positions[1].time = 9.0;
        assert!(matches!(model.validate(), Err(AnimError::InvalidClip(_))));

        // Single keys hold their value for the whole clip
        model.clips[0].channels[0].positions.truncate(1);
        model.validate().unwrap();
    }

    #[test]
    fn test_track_may_run_past_duration() {
        let mut model = model();
        model.clips[0].channels[0].positions[1].time = 12.0;
        model.validate().unwrap();
    }

    #[test]
    fn test_non_unit_rotation_key() {
        let mut model = model();
        let rotated = |model: &mut AnimatedModel, rotation: Quat| {
            model.clips[0].channels[0].rotations = vec![QuatKey::new(0.0, rotation)];
            model.validate()
        };

        let doubled = Quat::from_xyzw(0.0, 0.0, 0.0, 2.0);
        assert!(matches!(
            rotated(&mut model, doubled),
            Err(AnimError::ValidationError(_))
        ));
        let zero = Quat::from_xyzw(0.0, 0.0, 0.0, 0.0);
        assert!(matches!(
            rotated(&mut model, zero),
            Err(AnimError::ValidationError(_))
        ));
        let nan = Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0);
        assert!(matches!(
            rotated(&mut model, nan),
            Err(AnimError::ValidationError(_))
        ));

        assert_eq!(rotated(&mut model, Quat::from_rotation_z(0.4)), Ok(()));
    }
}
