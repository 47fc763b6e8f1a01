//! Keyframe animation
//!
//! This module provides the time side of the pipeline:
//! - Keyframe, channel and clip types
//! - Keyframe sampling (linear for vectors, spherical for rotations)
//! - Node-to-channel binding for a clip
//! - The looping animation clock
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use rig_anim::animation::{AnimationChannel, AnimationClock, AnimationClip, VectorKey, sample};
//!
//! let mut channel = AnimationChannel::new("Spine");
//! channel.positions = vec![
//!     VectorKey::new(0.0, Vec3::new(0.0, 1.0, 0.0)),
//!     VectorKey::new(10.0, Vec3::new(0.0, 2.0, 0.0)),
//! ];
//! channel.rotations = vec![rig_anim::animation::QuatKey::new(0.0, glam::Quat::IDENTITY)];
//! channel.scales = vec![VectorKey::new(0.0, Vec3::ONE)];
//!
//! let mut clip = AnimationClip::new("bend", 10.0, 0.0);
//! clip.channels.push(channel);
//!
//! let mut clock = AnimationClock::new(&clip)?;
//! let tick = clock.tick(0.2); // 0.2 s at the default 25 ticks/s
//! let sample = sample(&clip.channels[0], tick.animation_time)?.unwrap();
//! assert!((sample.position.y - 1.5).abs() < 1e-5);
//! # Ok::<(), rig_anim::AnimError>(())
//! ```

mod binding;
mod clock;
mod interpolation;
mod types;

pub use binding::ClipBinding;
pub use clock::{AnimationClock, ClockTick};
pub use interpolation::{KeyframeSample, find_key_index, sample, sample_track};
pub use types::{
    AnimationChannel, AnimationClip, DEFAULT_TICKS_PER_SECOND, Keyframe, Lerp, QuatKey,
    VectorKey,
};
