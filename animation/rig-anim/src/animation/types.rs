//! Keyframe, channel and clip types

use glam::{Quat, Vec3};

/// Playback rate used when a clip declares zero ticks per second
pub const DEFAULT_TICKS_PER_SECOND: f64 = 25.0;

/// A timestamped value on a keyframe track
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Keyframe<T> {
    /// Key time in ticks
    pub time: f64,
    /// Key value
    pub value: T,
}

impl<T> Keyframe<T> {
    /// Create a new keyframe
    pub const fn new(time: f64, value: T) -> Self {
        Self { time, value }
    }
}

/// Position or scale key
pub type VectorKey = Keyframe<Vec3>;

/// Rotation key
pub type QuatKey = Keyframe<Quat>;

/// Keyframe tracks driving the local transform of one node
#[derive(Debug, Clone, Default)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnimationChannel {
    /// Name of the animated node
    pub node_name: String,
    /// Translation keys
    pub positions: Vec<VectorKey>,
    /// Rotation keys
    pub rotations: Vec<QuatKey>,
    /// Scale keys
    pub scales: Vec<VectorKey>,
}

impl AnimationChannel {
    /// Create an empty channel for a node
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Self::default()
        }
    }

    /// Check that every component has at least one key
    pub fn is_complete(&self) -> bool {
        !self.positions.is_empty() && !self.rotations.is_empty() && !self.scales.is_empty()
    }

    /// Time of the last key over all components
    pub fn last_key_time(&self) -> Option<f64> {
        let positions = self.positions.last().map(|k| k.time);
        let rotations = self.rotations.last().map(|k| k.time);
        let scales = self.scales.last().map(|k| k.time);
        [positions, rotations, scales]
            .into_iter()
            .flatten()
            .reduce(f64::max)
    }
}

/// A named animation made of per-node channels
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde-support",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AnimationClip {
    /// Clip name
    pub name: String,
    /// Length in ticks
    pub duration: f64,
    /// Declared rate (0 means "use the default")
    pub ticks_per_second: f64,
    /// Channels, at most one of which is used per node name
    pub channels: Vec<AnimationChannel>,
}

impl AnimationClip {
    /// Create a clip without channels
    pub fn new(name: impl Into<String>, duration: f64, ticks_per_second: f64) -> Self {
        Self {
            name: name.into(),
            duration,
            ticks_per_second,
            channels: Vec::new(),
        }
    }

    /// Rate used for playback, falling back to 25 ticks per second
    pub fn effective_ticks_per_second(&self) -> f64 {
        if self.ticks_per_second == 0.0 {
            DEFAULT_TICKS_PER_SECOND
        } else {
            self.ticks_per_second
        }
    }

    /// Clip length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.duration / self.effective_ticks_per_second()
    }

    /// First channel targeting the given node name
    pub fn channel(&self, node_name: &str) -> Option<&AnimationChannel> {
        self.channels.iter().find(|c| c.node_name == node_name)
    }
}

/// Trait for values that can be blended between two keyframes
pub trait Lerp: Copy {
    /// Interpolate from `self` to `other` by factor `t` in [0, 1]
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self::lerp(*self, *other, t)
    }
}

impl Lerp for Quat {
    /// Spherical interpolation, re-normalized to absorb numeric drift
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.slerp(*other, t).normalize()
    }
}
