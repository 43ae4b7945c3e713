//! In-memory clip cache.
//!
//! Keyframe data is registered once per source file name; clips binding that
//! data to a name, speed and action cues are created on demand and shared, so
//! identical requests return the same `Arc<AnimationClip>`.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::animation::clip::{AnimationClip, AnimationData};
use crate::errors::{ModelError, Result};
use crate::resources::SkeletonDef;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClipKey {
    filename: String,
    name: String,
    speed: u32,
    action_pos: u64,
    action_pos2: u64,
}

#[derive(Debug, Default)]
pub struct ClipCache {
    sources: FxHashMap<String, Arc<AnimationData>>,
    clips: FxHashMap<ClipKey, Arc<AnimationClip>>,
}

impl ClipCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers keyframe data under `filename`, replacing any previous entry.
    ///
    /// Clips already built from the old data stay valid but are no longer
    /// returned by [`load_clip`](Self::load_clip).
    pub fn insert(&mut self, filename: &str, data: AnimationData) -> Arc<AnimationData> {
        let data = Arc::new(data);
        if self.sources.insert(filename.to_string(), data.clone()).is_some() {
            self.clips.retain(|key, _| key.filename != filename);
        }
        data
    }

    #[must_use]
    pub fn get_data(&self, filename: &str) -> Option<&Arc<AnimationData>> {
        self.sources.get(filename)
    }

    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.sources.contains_key(filename)
    }

    /// Number of distinct clips handed out so far.
    #[must_use]
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Returns a clip for the keyframes registered under `filename`.
    ///
    /// `action_pos` / `action_pos2` are fractions of the clip duration;
    /// negative values mean "no cue". When `skeleton` is given the keyframes
    /// must have one track per bone.
    pub fn load_clip(
        &mut self,
        filename: &str,
        name: &str,
        speed: f32,
        action_pos: f64,
        action_pos2: f64,
        skeleton: Option<&SkeletonDef>,
    ) -> Result<Arc<AnimationClip>> {
        let data = self
            .sources
            .get(filename)
            .ok_or_else(|| ModelError::ClipNotFound(filename.to_string()))?;

        if skeleton.is_some() {
            data.check_compatible(name, skeleton)?;
        }

        let key = ClipKey {
            filename: filename.to_string(),
            name: name.to_string(),
            speed: speed.to_bits(),
            action_pos: action_pos.to_bits(),
            action_pos2: action_pos2.to_bits(),
        };

        if let Some(clip) = self.clips.get(&key) {
            return Ok(clip.clone());
        }

        let clip = Arc::new(
            AnimationClip::new(name, data.clone(), speed).with_action_positions(action_pos, action_pos2),
        );
        log::trace!("Built animation clip '{name}' from '{filename}'");
        self.clips.insert(key, clip.clone());
        Ok(clip)
    }
}
