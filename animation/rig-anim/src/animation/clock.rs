//! Wall-clock to animation-tick conversion

use super::types::AnimationClip;
use crate::error::{AnimError, Result};

/// Result of advancing an [`AnimationClock`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    /// Time inside the clip, in ticks, wrapped into `[0, duration)`
    pub animation_time: f64,
    /// Whether this step crossed the end of the clip
    pub looped: bool,
}

/// Maps accumulated wall time onto a looping tick position
///
/// After a step reports `looped`, the accumulator is folded back into the
/// current loop, so every crossing of the clip end is reported exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClock {
    /// Seconds accumulated since the last loop
    total_seconds: f64,
    /// Playback rate
    ticks_per_second: f64,
    /// Clip length in ticks
    duration: f64,
}

impl AnimationClock {
    /// Create a clock for a clip
    pub fn new(clip: &AnimationClip) -> Result<Self> {
        Self::with_rate(clip.duration, clip.effective_ticks_per_second())
            .map_err(|e| match e {
                AnimError::InvalidClip(reason) => {
                    AnimError::InvalidClip(format!("clip '{}': {}", clip.name, reason))
                }
                other => other,
            })
    }

    /// Create a clock from a duration (ticks) and rate (ticks per second)
    pub fn with_rate(duration: f64, ticks_per_second: f64) -> Result<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AnimError::InvalidClip(format!(
                "duration must be positive, got {duration}"
            )));
        }
        if !ticks_per_second.is_finite() || ticks_per_second <= 0.0 {
            return Err(AnimError::InvalidClip(format!(
                "ticks per second must be positive, got {ticks_per_second}"
            )));
        }

        Ok(Self {
            total_seconds: 0.0,
            ticks_per_second,
            duration,
        })
    }

    /// Advance by `elapsed_seconds` of wall time
    pub fn tick(&mut self, elapsed_seconds: f64) -> ClockTick {
        self.total_seconds += elapsed_seconds;

        let time_in_ticks = self.total_seconds * self.ticks_per_second;
        let animation_time = time_in_ticks.rem_euclid(self.duration);
        let looped = time_in_ticks > self.duration;

        if looped {
            log::trace!(
                "Animation looped at {:.3} ticks (duration {:.3})",
                time_in_ticks,
                self.duration
            );
            self.total_seconds = animation_time / self.ticks_per_second;
        }

        ClockTick {
            animation_time,
            looped,
        }
    }

    /// Restart from `offset_seconds` into the clip
    pub fn reset(&mut self, offset_seconds: f64) {
        self.total_seconds = offset_seconds.max(0.0);
    }

    /// Seconds accumulated in the current loop
    pub fn elapsed_seconds(&self) -> f64 {
        self.total_seconds
    }

    /// Current position in ticks, wrapped into the clip
    pub fn animation_time(&self) -> f64 {
        (self.total_seconds * self.ticks_per_second).rem_euclid(self.duration)
    }

    /// Playback rate in ticks per second
    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Clip length in ticks
    pub fn duration(&self) -> f64 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_converts_seconds_to_ticks() {
        let mut clock = AnimationClock::with_rate(100.0, 25.0).unwrap();
        let tick = clock.tick(1.0);
        assert!((tick.animation_time - 25.0).abs() < 1e-9);
        assert!(!tick.looped);
    }

    #[test]
    fn test_zero_rate_clip_uses_default() {
        let clip = AnimationClip::new("idle", 50.0, 0.0);
        let mut clock = AnimationClock::new(&clip).unwrap();
        assert_eq!(clock.ticks_per_second(), 25.0);
        let tick = clock.tick(1.0);
        assert!((tick.animation_time - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_loop_reported_once_per_crossing() {
        // 10 ticks at 10 ticks/s: one loop per second
        let mut clock = AnimationClock::with_rate(10.0, 10.0).unwrap();
        let mut loops = 0;
        for _ in 0..250 {
            let tick = clock.tick(0.01);
            assert!((0.0..10.0).contains(&tick.animation_time));
            if tick.looped {
                loops += 1;
            }
        }
        // 2.5 seconds of playback crosses the clip end twice
        assert_eq!(loops, 2);
    }

    #[test]
    fn test_loop_keeps_remainder() {
        let mut clock = AnimationClock::with_rate(10.0, 10.0).unwrap();
        clock.tick(0.9);
        let tick = clock.tick(0.3);
        assert!(tick.looped);
        assert!((tick.animation_time - 2.0).abs() < 1e-9);

        let tick = clock.tick(0.1);
        assert!(!tick.looped);
        assert!((tick.animation_time - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_clock_parameters() {
        assert!(matches!(
            AnimationClock::with_rate(0.0, 25.0),
            Err(AnimError::InvalidClip(_))
        ));
        assert!(matches!(
            AnimationClock::with_rate(10.0, -1.0),
            Err(AnimError::InvalidClip(_))
        ));
        let clip = AnimationClip::new("broken", f64::NAN, 25.0);
        assert!(AnimationClock::new(&clip).is_err());
    }

    #[test]
    fn test_reset_with_offset() {
        let mut clock = AnimationClock::with_rate(100.0, 25.0).unwrap();
        clock.tick(2.0);
        clock.reset(0.9);
        assert!((clock.elapsed_seconds() - 0.9).abs() < 1e-12);
        assert!((clock.animation_time() - 22.5).abs() < 1e-9);
    }
}
