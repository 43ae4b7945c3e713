//! Playback clock of a single model.
//!
//! Time is in milliseconds. Speeds use a scale where
//! [`DEFAULT_ANIM_SPEED`](crate::settings::DEFAULT_ANIM_SPEED) (1000.0) plays
//! a clip in real time, so one update advances the clock by
//! `dt * speed / 1000`.

use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::model::ModelFlags;
use crate::settings::DEFAULT_ANIM_SPEED;

#[derive(Debug, Clone)]
pub struct Playback {
    pub(crate) anim: Option<Arc<AnimationClip>>,
    pub(crate) next_anim: Option<Arc<AnimationClip>>,
    pub(crate) speed: f32,
    pub(crate) time: f32,
}

impl Default for Playback {
    fn default() -> Self {
        Self {
            anim: None,
            next_anim: None,
            speed: DEFAULT_ANIM_SPEED,
            time: 0.0,
        }
    }
}

impl Playback {
    #[inline]
    #[must_use]
    pub fn animation(&self) -> Option<&Arc<AnimationClip>> {
        self.anim.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn next_animation(&self) -> Option<&Arc<AnimationClip>> {
        self.next_anim.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[inline]
    fn step(&self, dt: f32) -> f32 {
        dt * self.speed / DEFAULT_ANIM_SPEED
    }

    /// Advances the clock by `dt` milliseconds of real time.
    ///
    /// Returns `true` when the queued clip took over.
    pub(crate) fn advance(&mut self, dt: f32, flags: &mut ModelFlags) -> bool {
        if self.anim.is_none() {
            return false;
        }

        self.time += self.step(dt);
        let mut switched = false;

        while let Some(anim) = &self.anim {
            let duration = anim.duration();

            if self.time >= duration
                && let Some(next) = self.next_anim.take()
            {
                // Queued clips always loop
                self.anim = Some(next);
                self.time -= duration;
                flags.remove(ModelFlags::NO_LOOP_ANIMATION);
                switched = true;
                continue;
            }

            if duration <= 0.0 {
                self.time = 0.0;
            } else if flags.contains(ModelFlags::NO_LOOP_ANIMATION) {
                self.time = self.time.clamp(0.0, duration);
            } else {
                self.time = self.time.rem_euclid(duration);
            }
            break;
        }

        switched
    }

    /// Whether advancing by `dt` would run a one-shot clip to its end with
    /// nothing queued after it.
    #[must_use]
    pub(crate) fn needs_new_anim(&self, dt: f32, flags: ModelFlags) -> bool {
        let Some(anim) = &self.anim else {
            return false;
        };
        self.next_anim.is_none()
            && flags.contains(ModelFlags::NO_LOOP_ANIMATION)
            && self.time + self.step(dt) >= anim.duration()
    }
}
