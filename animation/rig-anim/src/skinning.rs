//! Linear-blend skinning
//!
//! Every skinned mesh vertex is recomputed from its bind pose as the weighted
//! sum of its bones' skinning matrices applied to it:
//!
//! ```text
//! skin[b]   = world(node of bone b) * offset[b]
//! p'        = sum over bones b of weight(b, v) * (skin[b] * p)
//! n'        = sum over bones b of weight(b, v) * (mat3(skin[b]) * n)
//! ```
//!
//! Weights are used exactly as authored: they are never normalized, so
//! influences that do not sum to one scale the result accordingly. Normals are
//! likewise left unnormalized for the renderer to handle.
//!
//! # Example
//!
//! ```rust
//! use glam::{Mat4, Vec3};
//! use rig_anim::{Bone, Mesh, NodeId, Pose, SceneGraph, SkinningState};
//!
//! let mut builder = SceneGraph::builder("Armature", Mat4::IDENTITY);
//! builder.add_child(NodeId::ROOT, "Bone", Mat4::from_translation(Vec3::X))?;
//! let scene = builder.build();
//!
//! let mesh = Mesh {
//!     positions: vec![Vec3::ZERO],
//!     normals: vec![Vec3::Y],
//!     bones: vec![Bone::new("Bone", Mat4::IDENTITY).with_weight(0, 1.0)],
//!     ..Mesh::default()
//! };
//! let meshes = vec![mesh];
//!
//! let pose = Pose::bind_pose(&scene, &meshes);
//! let mut state = SkinningState::default();
//! state.deform(&scene, &pose, &meshes)?;
//!
//! assert_eq!(state.mesh(0).unwrap().positions[0], Vec3::X);
//! # Ok::<(), rig_anim::AnimError>(())
//! ```

use glam::{Mat3, Mat4, Vec3};

use crate::error::{AnimError, Result};
use crate::hierarchy::Pose;
use crate::mesh::{Mesh, MeshLayout};
use crate::scene::SceneGraph;

/// Deformed vertex data of one skinned mesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedMesh {
    /// Skinned positions, one per mesh vertex
    pub positions: Vec<Vec3>,
    /// Skinned normals, one per mesh vertex
    pub normals: Vec<Vec3>,
}

impl SkinnedMesh {
    /// Axis-aligned bounds of the skinned positions
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(min, max), &p| (min.min(p), max.max(p))),
        )
    }
}

/// Per-frame skinning output for all meshes
///
/// Slots of meshes without bones stay `None`. Buffers are reused between
/// frames, but their contents are fully recomputed by every
/// [`SkinningState::deform`] call. After a failed call the contents are
/// unspecified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinningState {
    meshes: Vec<Option<SkinnedMesh>>,
}

impl SkinningState {
    /// Deform every skinned mesh with the bone transforms of `pose`
    pub fn deform(&mut self, scene: &SceneGraph, pose: &Pose, meshes: &[Mesh]) -> Result<()> {
        self.meshes.resize_with(meshes.len(), || None);

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.meshes
                .par_iter_mut()
                .zip(meshes.par_iter())
                .enumerate()
                .try_for_each(|(index, (slot, mesh))| deform_into(scene, pose, mesh, index, slot))?;
        }

        #[cfg(not(feature = "parallel"))]
        for (index, (slot, mesh)) in self.meshes.iter_mut().zip(meshes).enumerate() {
            deform_into(scene, pose, mesh, index, slot)?;
        }

        Ok(())
    }

    /// Skinned data of a mesh, if the mesh is skinned
    pub fn mesh(&self, index: usize) -> Option<&SkinnedMesh> {
        self.meshes.get(index).and_then(Option::as_ref)
    }

    /// Number of mesh slots
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// Whether no mesh has been deformed yet
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Iterate over `(mesh index, skinned data)` for skinned meshes
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SkinnedMesh)> {
        self.meshes
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|m| (i, m)))
    }

    /// Copy skinned vertices into shared buffers laid out by `layout`
    ///
    /// Rigid meshes are left untouched in the target buffers.
    pub fn write_packed(
        &self,
        layout: &MeshLayout,
        positions: &mut [Vec3],
        normals: &mut [Vec3],
    ) -> Result<()> {
        for (index, skinned) in self.iter() {
            let entry = layout.entry(index).ok_or_else(|| {
                AnimError::ValidationError(format!("mesh {index} is missing from the layout"))
            })?;
            let range = entry.base_vertex..entry.base_vertex + skinned.positions.len();
            let positions_len = positions.len();
            let normals_len = normals.len();

            let position_target = positions.get_mut(range.clone()).ok_or_else(|| {
                AnimError::ValidationError(format!(
                    "position buffer too small for mesh {index} ({positions_len} < {})",
                    range.end
                ))
            })?;
            position_target.copy_from_slice(&skinned.positions);

            let normal_target = normals.get_mut(range.clone()).ok_or_else(|| {
                AnimError::ValidationError(format!(
                    "normal buffer too small for mesh {index} ({normals_len} < {})",
                    range.end
                ))
            })?;
            normal_target.copy_from_slice(&skinned.normals);
        }
        Ok(())
    }
}

/// Deform all meshes into a fresh [`SkinningState`]
pub fn deform(scene: &SceneGraph, pose: &Pose, meshes: &[Mesh]) -> Result<SkinningState> {
    let mut state = SkinningState::default();
    state.deform(scene, pose, meshes)?;
    Ok(state)
}

/// Skinning matrix of every bone of a mesh, in bone order
///
/// Useful for renderers that skin on the GPU. Fails with
/// [`AnimError::MalformedRig`] when a bone names a node the scene lacks.
pub fn skinning_matrices(
    scene: &SceneGraph,
    pose: &Pose,
    mesh: &Mesh,
    mesh_index: usize,
) -> Result<Vec<Mat4>> {
    mesh.bones
        .iter()
        .map(|bone| {
            let node = scene
                .find(&bone.name)
                .ok_or_else(|| AnimError::MalformedRig {
                    bone: bone.name.clone(),
                    mesh: mesh_index,
                })?;
            Ok(pose.world(node) * bone.offset)
        })
        .collect()
}

fn deform_into(
    scene: &SceneGraph,
    pose: &Pose,
    mesh: &Mesh,
    index: usize,
    slot: &mut Option<SkinnedMesh>,
) -> Result<()> {
    if !mesh.is_skinned() {
        *slot = None;
        return Ok(());
    }

    let matrices = skinning_matrices(scene, pose, mesh, index)?;

    let vertex_count = mesh.vertex_count();
    let out = slot.get_or_insert_with(SkinnedMesh::default);
    out.positions.clear();
    out.positions.resize(vertex_count, Vec3::ZERO);
    out.normals.clear();
    out.normals.resize(vertex_count, Vec3::ZERO);

    for (bone, skin) in mesh.bones.iter().zip(&matrices) {
        // Normals only take rotation and scale
        let skin3 = Mat3::from_mat4(*skin);

        for w in &bone.weights {
            let v = w.vertex as usize;
            let Some(&position) = mesh.positions.get(v) else {
                return Err(AnimError::ValidationError(format!(
                    "bone '{}' of mesh {} weights vertex {} but the mesh has {} vertices",
                    bone.name, index, v, vertex_count
                )));
            };
            let normal = mesh.normals.get(v).copied().unwrap_or(Vec3::ZERO);

            out.positions[v] += skin.transform_point3(position) * w.weight;
            out.normals[v] += (skin3 * normal) * w.weight;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Bone;
    use crate::scene::NodeId;

    fn two_bone_scene(a: Mat4, b: Mat4) -> SceneGraph {
        let mut builder = SceneGraph::builder("root", Mat4::IDENTITY);
        builder.add_child(NodeId::ROOT, "A", a).unwrap();
        builder.add_child(NodeId::ROOT, "B", b).unwrap();
        builder.build()
    }

    fn single_vertex_mesh(position: Vec3, bones: Vec<Bone>) -> Mesh {
        Mesh {
            name: "skin".to_string(),
            positions: vec![position],
            normals: vec![Vec3::Y],
            bones,
            ..Mesh::default()
        }
    }

    #[test]
    fn test_equal_weights_on_identity_bones_preserve_vertex() {
        let scene = two_bone_scene(Mat4::IDENTITY, Mat4::IDENTITY);
        let mesh = single_vertex_mesh(
            Vec3::new(1.0, 2.0, 3.0),
            vec![
                Bone::new("A", Mat4::IDENTITY).with_weight(0, 0.5),
                Bone::new("B", Mat4::IDENTITY).with_weight(0, 0.5),
            ],
        );
        let meshes = vec![mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        let state = deform(&scene, &pose, &meshes).unwrap();
        let skinned = state.mesh(0).unwrap();
        assert!((skinned.positions[0] - Vec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
        assert!((skinned.normals[0] - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_weights_are_not_normalized() {
        let scene = two_bone_scene(Mat4::IDENTITY, Mat4::IDENTITY);
        let mesh = single_vertex_mesh(
            Vec3::new(2.0, 0.0, 0.0),
            vec![
                Bone::new("A", Mat4::IDENTITY).with_weight(0, 0.25),
                Bone::new("B", Mat4::IDENTITY).with_weight(0, 0.25),
            ],
        );
        let meshes = vec![mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        let state = deform(&scene, &pose, &meshes).unwrap();
        assert!((state.mesh(0).unwrap().positions[0] - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_blend_between_translated_bones() {
        let scene = two_bone_scene(
            Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)),
            Mat4::from_translation(Vec3::new(0.0, 4.0, 0.0)),
        );
        let mesh = single_vertex_mesh(
            Vec3::ZERO,
            vec![
                Bone::new("A", Mat4::IDENTITY).with_weight(0, 0.5),
                Bone::new("B", Mat4::IDENTITY).with_weight(0, 0.5),
            ],
        );
        let meshes = vec![mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        let state = deform(&scene, &pose, &meshes).unwrap();
        let skinned = state.mesh(0).unwrap();
        assert!((skinned.positions[0] - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
        // Translation does not reach the normals
        assert!((skinned.normals[0] - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_offset_matrix_cancels_bind_pose() {
        let bind = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        let scene = two_bone_scene(bind, Mat4::IDENTITY);
        let mesh = single_vertex_mesh(
            Vec3::new(0.0, 1.5, 0.0),
            vec![Bone::new("A", bind.inverse()).with_weight(0, 1.0)],
        );
        let meshes = vec![mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        let state = deform(&scene, &pose, &meshes).unwrap();
        assert!((state.mesh(0).unwrap().positions[0] - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_normals_follow_bone_rotation() {
        let rotate = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let scene = two_bone_scene(rotate, Mat4::IDENTITY);
        let mesh = single_vertex_mesh(
            Vec3::X,
            vec![Bone::new("A", Mat4::IDENTITY).with_weight(0, 1.0)],
        );
        let meshes = vec![mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        let state = deform(&scene, &pose, &meshes).unwrap();
        let skinned = state.mesh(0).unwrap();
        assert!((skinned.positions[0] - Vec3::Y).length() < 1e-6);
        assert!((skinned.normals[0] - Vec3::NEG_X).length() < 1e-6);
    }

    #[test]
    fn test_missing_bone_node_is_malformed_rig() {
        let scene = two_bone_scene(Mat4::IDENTITY, Mat4::IDENTITY);
        let mesh = single_vertex_mesh(
            Vec3::ONE,
            vec![Bone::new("Ghost", Mat4::IDENTITY).with_weight(0, 1.0)],
        );
        let meshes = vec![Mesh::default(), mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        let err = deform(&scene, &pose, &meshes).unwrap_err();
        assert_eq!(
            err,
            AnimError::MalformedRig {
                bone: "Ghost".to_string(),
                mesh: 1
            }
        );
    }

    #[test]
    fn test_rigid_meshes_have_no_skinned_slot() {
        let scene = two_bone_scene(Mat4::IDENTITY, Mat4::IDENTITY);
        let meshes = vec![
            Mesh {
                positions: vec![Vec3::ONE],
                ..Mesh::default()
            },
            single_vertex_mesh(Vec3::ONE, vec![Bone::new("A", Mat4::IDENTITY).with_weight(0, 1.0)]),
        ];
        let pose = Pose::bind_pose(&scene, &meshes);

        let state = deform(&scene, &pose, &meshes).unwrap();
        assert_eq!(state.len(), 2);
        assert!(state.mesh(0).is_none());
        assert!(state.mesh(1).is_some());
        assert_eq!(state.iter().count(), 1);
    }

    #[test]
    fn test_weight_past_last_vertex_is_rejected() {
        let scene = two_bone_scene(Mat4::IDENTITY, Mat4::IDENTITY);
        let mesh = single_vertex_mesh(
            Vec3::ONE,
            vec![Bone::new("A", Mat4::IDENTITY).with_weight(3, 1.0)],
        );
        let meshes = vec![mesh];
        let pose = Pose::bind_pose(&scene, &meshes);

        assert!(matches!(
            deform(&scene, &pose, &meshes),
            Err(AnimError::ValidationError(_))
        ));
    }

    #[test]
    fn test_write_packed_places_mesh_at_base_vertex() {
        let scene = two_bone_scene(Mat4::from_translation(Vec3::Z), Mat4::IDENTITY);
        let rigid = Mesh {
            positions: vec![Vec3::ZERO; 2],
            normals: vec![Vec3::Y; 2],
            ..Mesh::default()
        };
        let skinned = single_vertex_mesh(
            Vec3::X,
            vec![Bone::new("A", Mat4::IDENTITY).with_weight(0, 1.0)],
        );
        let meshes = vec![rigid, skinned];
        let layout = MeshLayout::new(&meshes);
        let (mut positions, mut normals) = layout.pack_vertices(&meshes);

        let pose = Pose::bind_pose(&scene, &meshes);
        let state = deform(&scene, &pose, &meshes).unwrap();
        state.write_packed(&layout, &mut positions, &mut normals).unwrap();

        assert_eq!(positions[0], Vec3::ZERO);
        assert!((positions[2] - Vec3::new(1.0, 0.0, 1.0)).length() < 1e-6);

        let mut short = vec![Vec3::ZERO; 2];
        assert_eq!(
            state.write_packed(&layout, &mut short, &mut normals),
            Err(AnimError::ValidationError(
                "position buffer too small for mesh 1 (2 < 3)".to_string()
            ))
        );
        let mut short_normals = vec![Vec3::ZERO; 1];
        assert_eq!(
            state.write_packed(&layout, &mut positions, &mut short_normals),
            Err(AnimError::ValidationError(
                "normal buffer too small for mesh 1 (1 < 3)".to_string()
            ))
        );
    }

    #[test]
    fn test_bounds() {
        let skinned = SkinnedMesh {
            positions: vec![Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 0.5)],
            normals: Vec::new(),
        };
        let (min, max) = skinned.bounds().unwrap();
        assert_eq!(min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 3.0, 0.5));
        assert!(SkinnedMesh::default().bounds().is_none());
    }
}
