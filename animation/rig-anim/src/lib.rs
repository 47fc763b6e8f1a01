//! Skeletal animation playback for rigged meshes
//!
//! Takes an imported scene (node hierarchy, meshes with bone weights and
//! keyframe clips) and turns wall-clock time into deformed vertex buffers:
//!
//! - [`animation`]: keyframe sampling, clip binding and the looping clock
//! - [`hierarchy`]: per-frame node transform propagation into a [`Pose`]
//! - [`skinning`]: linear-blend skinning of every skinned mesh
//! - [`rig`]: bone segment extraction for debug drawing
//! - [`player`]: a frame driver running all of the above in order
//!
//! # Example
//!
//! ```rust
//! use glam::{Mat4, Vec3};
//! use rig_anim::{AnimatedModel, AnimationPlayer, NodeId, PlayerConfig, SceneGraph};
//!
//! let mut builder = SceneGraph::builder("Hips", Mat4::IDENTITY);
//! builder.add_child(NodeId::ROOT, "Spine", Mat4::from_translation(Vec3::Y))?;
//! let model = AnimatedModel::new(builder.build(), Vec::new(), Vec::new());
//! model.validate()?;
//!
//! let mut player = AnimationPlayer::new(model, PlayerConfig::default())?;
//! let frame = player.advance(1.0 / 60.0)?;
//! assert!(!frame.looped);
//! # Ok::<(), rig_anim::AnimError>(())
//! ```

pub mod animation;
pub mod error;
pub mod hierarchy;
pub mod mesh;
pub mod model;
pub mod player;
pub mod rig;
pub mod scene;
pub mod skinning;

// Re-export common types
pub use animation::{AnimationChannel, AnimationClip, AnimationClock, ClipBinding};
pub use error::{AnimError, Result};
pub use hierarchy::{ActiveClip, Pose, propagate};
pub use mesh::{Bone, BoneInfluence, Mesh, MeshEntry, MeshLayout, VertexWeight};
pub use model::AnimatedModel;
pub use player::{AnimationPlayer, Frame, FrameOrder, PlayerConfig};
pub use rig::{BoneSegment, extract_rig};
pub use scene::{LocalTransforms, Node, NodeId, SceneBuilder, SceneGraph};
pub use skinning::{SkinnedMesh, SkinningState, deform, skinning_matrices};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
