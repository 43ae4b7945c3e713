//! Unit-level animation controller.
//!
//! Gameplay code thinks in named states ("idle", "melee") and in gameplay
//! timers ("the attack lands 500 ms from now and repeats every 2 s").
//! [`UnitAnimation`] maps those onto model playback through the
//! [`AnimationControl`] capability, and keeps any synced models (e.g. a
//! mounted rider) playing in lockstep with the main model.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::animation::AnimationClip;
use crate::errors::Result;
use crate::model::{AnimationControl, ModelHandle, PlaybackAccess};
use crate::settings::{DEFAULT_ANIM_SPEED, ModelSettings};

#[derive(Debug, Clone)]
pub struct UnitAnimation {
    model: ModelHandle,
    synced: SmallVec<[ModelHandle; 2]>,
    state: String,
    default_anim_speed: f32,
}

impl UnitAnimation {
    #[must_use]
    pub fn new(model: ModelHandle, settings: &ModelSettings) -> Self {
        Self {
            model,
            synced: SmallVec::new(),
            state: String::new(),
            default_anim_speed: settings.default_anim_speed,
        }
    }

    #[inline]
    #[must_use]
    pub fn model(&self) -> ModelHandle {
        self.model
    }

    /// Name of the last state passed to [`set_animation_state`](Self::set_animation_state).
    #[inline]
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn synced_models(&self) -> &[ModelHandle] {
        &self.synced
    }

    /// Registers a model that mirrors the main model's playback.
    pub fn add_synced_model(&mut self, model: ModelHandle) {
        if model != self.model && !self.synced.contains(&model) {
            self.synced.push(model);
        }
    }

    pub fn remove_synced_model(&mut self, model: ModelHandle) {
        self.synced.retain(|m| *m != model);
    }

    /// Enters `state`, playing `clip` at `speed` times its authored rate.
    pub fn set_animation_state<C: AnimationControl + ?Sized>(
        &mut self,
        ctl: &mut C,
        state: &str,
        clip: Option<Arc<AnimationClip>>,
        once: bool,
        speed: f32,
        next: Option<Arc<AnimationClip>>,
    ) -> Result<()> {
        let anim_speed = clip
            .as_ref()
            .map_or(self.default_anim_speed, |c| self.default_anim_speed * speed * c.speed());

        ctl.set_animation(self.model, clip, once, anim_speed, next)?;
        self.sync_models(ctl)?;

        log::trace!("Unit animation state -> '{state}'");
        self.state = state.to_string();
        Ok(())
    }

    /// Rescales playback so one full cycle of the current clip takes
    /// `repeat_ms` of real time.
    pub fn set_sync_repeat<C: AnimationControl + ?Sized>(&mut self, ctl: &mut C, repeat_ms: f32) -> Result<()> {
        let Some(clip) = ctl.animation(self.model)? else {
            return Ok(());
        };
        if repeat_ms <= 0.0 || clip.duration() <= 0.0 {
            return Ok(());
        }

        let speed = clip.duration() * DEFAULT_ANIM_SPEED / repeat_ms;
        ctl.set_anim_speed(PlaybackAccess::new(), self.model, speed)?;
        self.sync_models(ctl)
    }

    /// Positions the clock so the clip's first action cue is reached
    /// `offset_ms` of real time from now. Clips without a cue use time 0.
    pub fn set_sync_offset<C: AnimationControl + ?Sized>(&mut self, ctl: &mut C, offset_ms: f32) -> Result<()> {
        let Some(clip) = ctl.animation(self.model)? else {
            return Ok(());
        };
        let duration = clip.duration();
        if duration <= 0.0 {
            return Ok(());
        }

        let speed = ctl.anim_speed(self.model)?;
        let action = clip.action_time().unwrap_or(0.0);
        let time = (action - offset_ms * speed / DEFAULT_ANIM_SPEED).rem_euclid(duration);

        ctl.set_anim_time(PlaybackAccess::new(), self.model, time)?;
        self.sync_models(ctl)
    }

    /// Shorthand for [`set_sync_repeat`](Self::set_sync_repeat) followed by
    /// [`set_sync_offset`](Self::set_sync_offset).
    pub fn set_animation_sync<C: AnimationControl + ?Sized>(
        &mut self,
        ctl: &mut C,
        action_ms: f32,
        repeat_ms: f32,
    ) -> Result<()> {
        self.set_sync_repeat(ctl, repeat_ms)?;
        self.set_sync_offset(ctl, action_ms)
    }

    /// Whether the next update of `dt` ms finishes a one-shot clip.
    pub fn is_exhausting<C: AnimationControl + ?Sized>(&self, ctl: &C, dt: f32) -> Result<bool> {
        ctl.needs_new_anim(self.model, dt)
    }

    fn sync_models<C: AnimationControl + ?Sized>(&self, ctl: &mut C) -> Result<()> {
        for &synced in &self.synced {
            ctl.copy_animation_from(synced, self.model)?;
        }
        Ok(())
    }
}
