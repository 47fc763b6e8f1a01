//! Scene snapshot documents
//!
//! A snapshot is an already-imported scene written out as JSON or YAML: a
//! nested node tree, meshes with bone weights and animation clips. The file
//! extension selects the format.
//!
//! ```yaml
//! root:
//!   name: Hips
//!   children:
//!     - name: Spine
//!       transform: { translation: [0, 1, 0] }
//! meshes:
//!   - name: torso
//!     positions: [[0.5, 1, 0]]
//!     bones:
//!       - name: Spine
//!         offset: { translation: [0, -1, 0] }
//!         weights: [{ vertex: 0, weight: 1.0 }]
//! clips:
//!   - name: rise
//!     duration: 10
//!     channels:
//!       - node: Spine
//!         positions: [{ time: 0, value: [0, 1, 0] }, { time: 10, value: [0, 2, 0] }]
//!         rotations: [{ time: 0, value: [0, 0, 0, 1] }]
//!         scales: [{ time: 0, value: [1, 1, 1] }]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::{Mat4, Quat, Vec2, Vec3};
use rig_anim::animation::Keyframe;
use rig_anim::{
    AnimatedModel, AnimationChannel, AnimationClip, Bone, Mesh, NodeId, SceneBuilder, SceneGraph,
    VertexWeight,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems specific to snapshot documents
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file extension names no supported format
    #[error("Unsupported scene document '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(PathBuf),

    /// A rotation quaternion of (near) zero length
    #[error("Node '{0}' has a degenerate rotation")]
    DegenerateRotation(String),

    /// A rotation key of (near) zero length
    #[error("Rotation key at {time} of channel '{node}' in clip '{clip}' is degenerate")]
    DegenerateRotationKey { clip: String, node: String, time: f64 },
}

/// Local transform as a column-major matrix or as translation/rotation/scale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformDoc {
    /// Sixteen column-major values
    Matrix { matrix: Mat4 },
    /// Any subset of translation, rotation (x, y, z, w) and scale
    Trs {
        #[serde(default)]
        translation: Option<Vec3>,
        #[serde(default)]
        rotation: Option<Quat>,
        #[serde(default)]
        scale: Option<Vec3>,
    },
}

impl Default for TransformDoc {
    fn default() -> Self {
        Self::Matrix {
            matrix: Mat4::IDENTITY,
        }
    }
}

impl TransformDoc {
    fn to_matrix(&self, owner: &str) -> Result<Mat4, DocumentError> {
        match self {
            Self::Matrix { matrix } => Ok(*matrix),
            Self::Trs {
                translation,
                rotation,
                scale,
            } => {
                let rotation = rotation.unwrap_or(Quat::IDENTITY);
                if rotation.length_squared() <= f32::EPSILON {
                    return Err(DocumentError::DegenerateRotation(owner.to_string()));
                }
                Ok(Mat4::from_scale_rotation_translation(
                    scale.unwrap_or(Vec3::ONE),
                    rotation.normalize(),
                    translation.unwrap_or(Vec3::ZERO),
                ))
            }
        }
    }
}

/// One node with its subtree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDoc {
    pub name: String,
    #[serde(default)]
    pub transform: TransformDoc,
    /// Indices of rigid meshes placed by this node
    #[serde(default)]
    pub meshes: Vec<usize>,
    #[serde(default)]
    pub children: Vec<NodeDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneDoc {
    pub name: String,
    #[serde(default)]
    pub offset: TransformDoc,
    #[serde(default)]
    pub weights: Vec<VertexWeight>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshDoc {
    #[serde(default)]
    pub name: String,
    pub positions: Vec<Vec3>,
    #[serde(default)]
    pub normals: Vec<Vec3>,
    #[serde(default)]
    pub tex_coords: Vec<Vec2>,
    #[serde(default)]
    pub indices: Vec<u32>,
    #[serde(default)]
    pub bones: Vec<BoneDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDoc {
    pub node: String,
    #[serde(default)]
    pub positions: Vec<Keyframe<Vec3>>,
    #[serde(default)]
    pub rotations: Vec<Keyframe<Quat>>,
    #[serde(default)]
    pub scales: Vec<Keyframe<Vec3>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipDoc {
    pub name: String,
    /// Length in ticks
    pub duration: f64,
    /// Omitted or 0 means 25 ticks per second
    #[serde(default)]
    pub ticks_per_second: f64,
    #[serde(default)]
    pub channels: Vec<ChannelDoc>,
}

impl ClipDoc {
    /// Convert to a clip, normalizing rotation keys
    fn into_clip(self) -> Result<AnimationClip, DocumentError> {
        let mut clip = AnimationClip::new(self.name, self.duration, self.ticks_per_second);
        for channel in self.channels {
            let rotations = channel
                .rotations
                .into_iter()
                .map(|key| {
                    if !key.value.is_finite() || key.value.length_squared() <= f32::EPSILON {
                        return Err(DocumentError::DegenerateRotationKey {
                            clip: clip.name.clone(),
                            node: channel.node.clone(),
                            time: key.time,
                        });
                    }
                    Ok(Keyframe::new(key.time, key.value.normalize()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            clip.channels.push(AnimationChannel {
                node_name: channel.node,
                positions: channel.positions,
                rotations,
                scales: channel.scales,
            });
        }
        Ok(clip)
    }
}

/// A complete scene snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDocument {
    pub root: NodeDoc,
    #[serde(default)]
    pub meshes: Vec<MeshDoc>,
    #[serde(default)]
    pub clips: Vec<ClipDoc>,
}

impl SceneDocument {
    /// Read a snapshot, picking JSON or YAML from the file extension
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let yaml = match extension.as_deref() {
            Some("json") => false,
            Some("yaml" | "yml") => true,
            _ => return Err(DocumentError::UnsupportedFormat(path.to_path_buf()).into()),
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene document {}", path.display()))?;

        let document = if yaml {
            serde_yaml_ng::from_str(&text)
                .with_context(|| format!("Failed to parse YAML scene {}", path.display()))?
        } else {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse JSON scene {}", path.display()))?
        };

        log::debug!("Loaded scene document {}", path.display());
        Ok(document)
    }

    /// Convert the snapshot into the in-memory model
    pub fn into_model(self) -> Result<AnimatedModel> {
        let scene = build_scene(&self.root)?;

        let meshes = self
            .meshes
            .into_iter()
            .map(|mesh| {
                let bones = mesh
                    .bones
                    .into_iter()
                    .map(|bone| {
                        Ok(Bone {
                            offset: bone.offset.to_matrix(&bone.name)?,
                            name: bone.name,
                            weights: bone.weights,
                        })
                    })
                    .collect::<Result<Vec<_>, DocumentError>>()?;
                Ok(Mesh {
                    name: mesh.name,
                    positions: mesh.positions,
                    normals: mesh.normals,
                    tex_coords: mesh.tex_coords,
                    indices: mesh.indices,
                    bones,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let clips = self
            .clips
            .into_iter()
            .map(ClipDoc::into_clip)
            .collect::<Result<Vec<_>, DocumentError>>()?;

        Ok(AnimatedModel::new(scene, meshes, clips))
    }
}

/// Load a snapshot file straight into a model
pub fn load_model(path: &Path) -> Result<AnimatedModel> {
    SceneDocument::load(path)?
        .into_model()
        .with_context(|| format!("Invalid scene document {}", path.display()))
}

fn build_scene(root: &NodeDoc) -> Result<SceneGraph> {
    let mut builder = SceneGraph::builder(
        root.name.clone(),
        root.transform.to_matrix(&root.name)?,
    );
    for &mesh in &root.meshes {
        builder.attach_mesh(NodeId::ROOT, mesh)?;
    }

    // Children are added in declaration order, so ids follow document order
    let mut pending: Vec<(NodeId, &NodeDoc)> = root
        .children
        .iter()
        .rev()
        .map(|child| (NodeId::ROOT, child))
        .collect();

    while let Some((parent, doc)) = pending.pop() {
        let id = add_node(&mut builder, parent, doc)?;
        pending.extend(doc.children.iter().rev().map(|child| (id, child)));
    }

    Ok(builder.build())
}

fn add_node(builder: &mut SceneBuilder, parent: NodeId, doc: &NodeDoc) -> Result<NodeId> {
    let id = builder.add_child(parent, doc.name.clone(), doc.transform.to_matrix(&doc.name)?)?;
    for &mesh in &doc.meshes {
        builder.attach_mesh(id, mesh)?;
    }
    Ok(id)
}
