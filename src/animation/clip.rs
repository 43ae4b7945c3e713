use std::sync::Arc;

use glam::{Quat, Vec3};
use uuid::Uuid;

use crate::animation::tracks::KeyframeTrack;
use crate::errors::{ModelError, Result};
use crate::resources::{BonePose, SkeletonDef};

/// Keyframes driving one bone. Empty tracks fall back to the bone's bind pose.
#[derive(Debug, Clone)]
pub struct BoneTrack {
    pub translation: KeyframeTrack<Vec3>,
    pub rotation: KeyframeTrack<Quat>,
    pub scale: KeyframeTrack<Vec3>,
}

impl BoneTrack {
    /// A track that keeps the bone in its bind pose.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            translation: KeyframeTrack::empty(),
            rotation: KeyframeTrack::empty(),
            scale: KeyframeTrack::empty(),
        }
    }

    #[must_use]
    pub fn sample(&self, time: f32, rest: &BonePose) -> BonePose {
        BonePose {
            translation: self.translation.sample(time).unwrap_or(rest.translation),
            rotation: self.rotation.sample(time).map_or(rest.rotation, Quat::normalize),
            scale: self.scale.sample(time).unwrap_or(rest.scale),
        }
    }

    fn end_time(&self) -> f32 {
        self.translation
            .end_time()
            .max(self.rotation.end_time())
            .max(self.scale.end_time())
    }

    fn key_times(&self) -> impl Iterator<Item = f32> + '_ {
        self.translation
            .times
            .iter()
            .chain(&self.rotation.times)
            .chain(&self.scale.times)
            .copied()
    }
}

impl Default for BoneTrack {
    fn default() -> Self {
        Self::empty()
    }
}

/// Immutable keyframe data for one animation, one track per skeleton bone.
///
/// Produced by an asset loader and shared through the [`ClipCache`](super::ClipCache).
#[derive(Debug, Clone)]
pub struct AnimationData {
    pub id: Uuid,
    pub name: String,
    /// Length in milliseconds.
    pub duration: f32,
    /// Authored frame spacing (ms), if the source format has one.
    pub frame_time: Option<f32>,
    pub bones: Vec<BoneTrack>,
}

impl AnimationData {
    /// Creates keyframe data whose duration is the last keyframe time of any track.
    #[must_use]
    pub fn new(name: &str, bones: Vec<BoneTrack>) -> Self {
        let duration = bones.iter().map(BoneTrack::end_time).fold(0.0_f32, f32::max);
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            duration,
            frame_time: None,
            bones,
        }
    }

    /// Overrides the duration. Negative values clamp to 0; non-finite
    /// values are ignored.
    #[must_use]
    pub fn with_duration(mut self, duration: f32) -> Self {
        if duration.is_finite() {
            self.duration = duration.max(0.0);
        }
        self
    }

    #[must_use]
    pub fn with_frame_time(mut self, frame_time: f32) -> Self {
        self.frame_time = (frame_time > 0.0).then_some(frame_time);
        self
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// Writes the local pose of every bone at `time` into `out`.
    pub fn sample_pose(&self, time: f32, skeleton: &SkeletonDef, out: &mut Vec<BonePose>) {
        out.clear();
        out.extend(
            skeleton
                .bones()
                .iter()
                .enumerate()
                .map(|(i, bone)| match self.bones.get(i) {
                    Some(track) => track.sample(time, &bone.bind_pose),
                    None => bone.bind_pose,
                }),
        );
    }

    /// Times at which a bound sweep samples this animation: every frame step
    /// from 0 to the duration, every keyframe, and the duration itself.
    #[must_use]
    pub fn sample_times(&self, fallback_interval: f32) -> Vec<f32> {
        let step = self.frame_time.unwrap_or(fallback_interval);
        let mut times = Vec::new();
        if step > 0.0 && self.duration.is_finite() {
            let frames = (self.duration / step).ceil() as usize;
            times.extend((0..=frames).map(|i| (i as f32 * step).min(self.duration)));
        }
        times.push(0.0);
        times.push(self.duration);
        times.extend(
            self.bones
                .iter()
                .flat_map(BoneTrack::key_times)
                .filter(|t| (0.0..=self.duration).contains(t)),
        );
        times.sort_by(f32::total_cmp);
        times.dedup();
        times
    }

    /// Fails unless every skeleton bone has exactly one track.
    pub fn check_compatible(&self, clip_name: &str, skeleton: Option<&SkeletonDef>) -> Result<()> {
        let Some(skeleton) = skeleton else {
            return Err(ModelError::incompatible(clip_name, "model has no skeleton"));
        };
        if self.bones.len() != skeleton.bone_count() {
            return Err(ModelError::incompatible(
                clip_name,
                format!(
                    "{} animation tracks != {} model bones",
                    self.bones.len(),
                    skeleton.bone_count()
                ),
            ));
        }
        Ok(())
    }
}

/// Keyframe data bound to a playback speed and two action cues.
///
/// Action timestamps mark moments (e.g. the frame a sword connects) that the
/// caller reacts to; the model runtime never interprets them.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub id: Uuid,
    name: String,
    data: Arc<AnimationData>,
    speed: f32,
    action_time: Option<f32>,
    action_time2: Option<f32>,
}

impl AnimationClip {
    #[must_use]
    pub fn new(name: &str, data: Arc<AnimationData>, speed: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            data,
            speed,
            action_time: None,
            action_time2: None,
        }
    }

    /// Sets the action cues from fractions of the duration. Negative means "no cue".
    #[must_use]
    pub fn with_action_positions(mut self, action_pos: f64, action_pos2: f64) -> Self {
        let duration = f64::from(self.data.duration);
        let to_time = |pos: f64| (pos >= 0.0).then(|| (pos.min(1.0) * duration) as f32);
        self.action_time = to_time(action_pos);
        self.action_time2 = to_time(action_pos2);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn data(&self) -> &Arc<AnimationData> {
        &self.data
    }

    /// Length in milliseconds.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.data.duration
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.data.bone_count()
    }

    /// Authored playback speed multiplier (1.0 = as authored).
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// First action cue, in milliseconds from the clip start.
    #[inline]
    pub fn action_time(&self) -> Option<f32> {
        self.action_time
    }

    #[inline]
    pub fn action_time2(&self) -> Option<f32> {
        self.action_time2
    }

    pub fn check_compatible(&self, skeleton: Option<&SkeletonDef>) -> Result<()> {
        self.data.check_compatible(&self.name, skeleton)
    }
}
