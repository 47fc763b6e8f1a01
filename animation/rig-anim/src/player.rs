//! Frame driver tying clock, hierarchy walk and skinning together
//!
//! [`AnimationPlayer`] owns an [`AnimatedModel`] and produces one [`Frame`]
//! per call to [`AnimationPlayer::advance`]:
//!
//! 1. the clock of the active clip is advanced by the scaled wall time,
//! 2. the node hierarchy is propagated at the resulting tick,
//! 3. every skinned mesh is deformed with the new bone transforms.
//!
//! With [`FrameOrder::DeformThenPropagate`] steps 2 and 3 are swapped, so the
//! meshes lag the skeleton by one frame.

use crate::animation::{AnimationClip, AnimationClock, ClipBinding};
use crate::error::{AnimError, Result};
use crate::hierarchy::{ActiveClip, Pose, propagate};
use crate::model::AnimatedModel;
use crate::rig::{BoneSegment, extract_rig};
use crate::skinning::SkinningState;

/// Order of hierarchy propagation and skinning inside a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum FrameOrder {
    /// Skin with the bone transforms of the current frame
    #[default]
    PropagateThenDeform,
    /// Skin with the previous frame's bone transforms
    DeformThenPropagate,
}

/// Playback settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct PlayerConfig {
    /// Ordering of propagation and skinning
    pub order: FrameOrder,
    /// Root node for [`AnimationPlayer::skeleton`]; no skeleton when unset
    pub rig_root: Option<String>,
    /// Re-extract the skeleton every this many frames (0 behaves like 1)
    pub rig_interval: u32,
    /// Clock position, in seconds, at start and after a restart
    pub start_offset_seconds: f64,
    /// Wall time multiplier
    pub speed: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            order: FrameOrder::default(),
            rig_root: None,
            rig_interval: 1,
            start_offset_seconds: 0.0,
            speed: 1.0,
        }
    }
}

/// Output of one frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Number of frames produced so far (0 before the first advance)
    pub index: u64,
    /// Position inside the active clip, in ticks
    pub animation_time: f64,
    /// Whether the clip wrapped around during this frame
    pub looped: bool,
    /// Node transforms of this frame
    pub pose: Pose,
    /// Deformed vertices of every skinned mesh
    pub skinning: SkinningState,
}

#[derive(Debug, Clone)]
struct Playback {
    clip: usize,
    binding: ClipBinding,
    clock: AnimationClock,
}

/// Plays the clips of an [`AnimatedModel`]
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    model: AnimatedModel,
    config: PlayerConfig,
    playback: Option<Playback>,
    paused: bool,
    frame: Frame,
    rig: Vec<BoneSegment>,
    rig_frame: Option<u64>,
}

impl AnimationPlayer {
    /// Create a player, starting the model's first clip if it has any
    pub fn new(model: AnimatedModel, config: PlayerConfig) -> Result<Self> {
        check_speed(config.speed)?;

        let pose = Pose::bind_pose(&model.scene, &model.meshes);
        let mut skinning = SkinningState::default();
        skinning.deform(&model.scene, &pose, &model.meshes)?;

        let mut player = Self {
            model,
            config,
            playback: None,
            paused: false,
            frame: Frame {
                index: 0,
                animation_time: 0.0,
                looped: false,
                pose,
                skinning,
            },
            rig: Vec::new(),
            rig_frame: None,
        };

        if !player.model.clips.is_empty() {
            player.select_clip_index(0)?;
        }
        Ok(player)
    }

    /// Switch to the clip with the given name
    pub fn select_clip(&mut self, name: &str) -> Result<()> {
        let (index, _) = self
            .model
            .clip(name)
            .ok_or_else(|| AnimError::InvalidClip(format!("no clip named '{name}'")))?;
        self.select_clip_index(index)
    }

    /// Switch to the clip at `index`, restarting playback at the start offset
    pub fn select_clip_index(&mut self, index: usize) -> Result<()> {
        let clip = self.model.clips.get(index).ok_or_else(|| {
            AnimError::InvalidClip(format!(
                "clip index {} out of range ({} clips)",
                index,
                self.model.clips.len()
            ))
        })?;

        let mut clock = AnimationClock::new(clip)?;
        clock.reset(self.config.start_offset_seconds);
        let binding = ClipBinding::new(&self.model.scene, clip);

        log::debug!(
            "Playing clip '{}' ({:.2}s at {} ticks/s)",
            clip.name,
            clip.duration_seconds(),
            clock.ticks_per_second()
        );

        self.playback = Some(Playback {
            clip: index,
            binding,
            clock,
        });
        self.rig_frame = None;
        Ok(())
    }

    /// Stop animating and show the bind pose from the next frame on
    pub fn clear_clip(&mut self) {
        self.playback = None;
        self.rig_frame = None;
    }

    /// Produce the next frame after `elapsed_seconds` of wall time
    pub fn advance(&mut self, elapsed_seconds: f64) -> Result<&Frame> {
        let step = if self.paused {
            0.0
        } else {
            elapsed_seconds * self.config.speed
        };

        let previous_clock = self.playback.as_ref().map(|p| p.clock.clone());
        let (animation_time, looped) = match self.playback.as_mut() {
            Some(playback) => {
                let tick = playback.clock.tick(step);
                (tick.animation_time, tick.looped)
            }
            None => (0.0, false),
        };

        // A failed frame leaves the clock where it was
        if let Err(err) = self.render(animation_time) {
            if let (Some(playback), Some(clock)) = (self.playback.as_mut(), previous_clock) {
                playback.clock = clock;
            }
            return Err(err);
        }

        self.frame.index += 1;
        self.frame.animation_time = animation_time;
        self.frame.looped = looped;

        if looped {
            log::debug!("Clip looped at frame {}", self.frame.index);
        }

        Ok(&self.frame)
    }

    fn render(&mut self, animation_time: f64) -> Result<()> {
        let scene = &self.model.scene;
        let meshes = &self.model.meshes;
        let active = self.playback.as_ref().and_then(|p| {
            self.model
                .clips
                .get(p.clip)
                .map(|clip| ActiveClip::new(clip, &p.binding))
        });

        match self.config.order {
            FrameOrder::PropagateThenDeform => {
                self.frame.pose = propagate(scene, meshes, active, animation_time)?;
                self.frame
                    .skinning
                    .deform(scene, &self.frame.pose, meshes)?;
            }
            FrameOrder::DeformThenPropagate => {
                self.frame
                    .skinning
                    .deform(scene, &self.frame.pose, meshes)?;
                self.frame.pose = propagate(scene, meshes, active, animation_time)?;
            }
        }
        Ok(())
    }

    /// Bone segments below the configured rig root for the current frame
    ///
    /// The segments are recomputed at most every `rig_interval` frames and
    /// served from a cache in between.
    pub fn skeleton(&mut self) -> &[BoneSegment] {
        let Some(root) = self.config.rig_root.as_deref() else {
            return &[];
        };

        let interval = u64::from(self.config.rig_interval.max(1));
        let stale = match self.rig_frame {
            None => true,
            Some(at) => self.frame.index.saturating_sub(at) >= interval,
        };

        if stale {
            self.rig = extract_rig(&self.model.scene, &self.frame.pose, root);
            self.rig_frame = Some(self.frame.index);
        }
        &self.rig
    }

    /// Rewind the clock to the start offset
    pub fn restart(&mut self) {
        if let Some(playback) = self.playback.as_mut() {
            playback.clock.reset(self.config.start_offset_seconds);
        }
        self.rig_frame = None;
    }

    /// Freeze the clock; frames keep being produced at the same time
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continue after [`Self::pause`]
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether the clock is frozen
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Change the wall time multiplier
    pub fn set_speed(&mut self, speed: f64) -> Result<()> {
        check_speed(speed)?;
        self.config.speed = speed;
        Ok(())
    }

    /// Most recent frame
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Clip currently playing
    pub fn active_clip(&self) -> Option<&AnimationClip> {
        self.playback
            .as_ref()
            .and_then(|p| self.model.clips.get(p.clip))
    }

    /// Clock of the clip currently playing
    pub fn clock(&self) -> Option<&AnimationClock> {
        self.playback.as_ref().map(|p| &p.clock)
    }

    /// The played model
    pub fn model(&self) -> &AnimatedModel {
        &self.model
    }

    /// Playback settings
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }
}

fn check_speed(speed: f64) -> Result<()> {
    if !speed.is_finite() || speed < 0.0 {
        return Err(AnimError::ValidationError(format!(
            "playback speed must be finite and non-negative, got {speed}"
        )));
    }
    Ok(())
}
