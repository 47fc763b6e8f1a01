//! Keyframe sampling for animation channels

use glam::{Mat4, Quat, Vec3};

use super::types::{AnimationChannel, Keyframe, Lerp};
use crate::error::{AnimError, Result};

/// Find the index of the earlier key in the pair bracketing `time`
///
/// Returns `i` such that `keys[i].time <= time < keys[i + 1].time`. Times
/// before the first key resolve to the first pair. Times at or after the last
/// key have no bracket and fail with [`AnimError::TimeOutOfRange`]; callers are
/// expected to wrap time into the clip range first.
pub fn find_key_index<T>(keys: &[Keyframe<T>], time: f64) -> Result<usize> {
    for i in 0..keys.len().saturating_sub(1) {
        if time < keys[i + 1].time {
            return Ok(i);
        }
    }

    Err(AnimError::TimeOutOfRange {
        time,
        last_key: keys.last().map_or(0.0, |k| k.time),
    })
}

/// Sample one keyframe track at the given time
///
/// Returns `Ok(None)` for an empty track and the key value unchanged for a
/// single-key track.
pub fn sample_track<T: Lerp>(keys: &[Keyframe<T>], time: f64) -> Result<Option<T>> {
    match keys {
        [] => Ok(None),
        [only] => Ok(Some(only.value)),
        _ => {
            let index = find_key_index(keys, time)?;
            let start = &keys[index];
            let end = &keys[index + 1];

            let delta = end.time - start.time;
            let factor = if delta > 0.0 {
                ((time - start.time) / delta) as f32
            } else {
                0.0
            };

            Ok(Some(start.value.lerp(&end.value, factor.clamp(0.0, 1.0))))
        }
    }
}

/// Interpolated local transform components of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeSample {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl KeyframeSample {
    /// Compose `T(position) * R(rotation) * S(scale)`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Sample a channel at `time` (in ticks)
///
/// Returns `Ok(None)` when any component has no keys at all, in which case
/// the node keeps its static local transform.
pub fn sample(channel: &AnimationChannel, time: f64) -> Result<Option<KeyframeSample>> {
    let Some(position) = sample_track(&channel.positions, time)? else {
        return Ok(None);
    };
    let Some(rotation) = sample_track(&channel.rotations, time)? else {
        return Ok(None);
    };
    let Some(scale) = sample_track(&channel.scales, time)? else {
        return Ok(None);
    };

    Ok(Some(KeyframeSample {
        position,
        rotation,
        scale,
    }))
}
