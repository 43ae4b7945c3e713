use std::sync::Arc;

use crate::animation::AnimationClip;
use crate::errors::{ModelError, Result};
use crate::model::{AnimatedModel, ModelHandle, ModelStore};

/// Proof that the caller may set a model's clock or speed directly.
///
/// Only controllers inside this crate (such as
/// [`UnitAnimation`](crate::unit_animation::UnitAnimation)) can create one.
#[derive(Debug, Clone, Copy)]
pub struct PlaybackAccess(());

impl PlaybackAccess {
    pub(crate) const fn new() -> Self {
        Self(())
    }
}

/// Playback capability for controllers that drive models they do not own.
///
/// This is the only way to set a model's clock or speed directly; everything
/// else goes through [`ModelStore`]'s playback methods. The raw setters take a
/// [`PlaybackAccess`] token.
pub trait AnimationControl {
    fn set_animation(
        &mut self,
        model: ModelHandle,
        clip: Option<Arc<AnimationClip>>,
        once: bool,
        speed: f32,
        next: Option<Arc<AnimationClip>>,
    ) -> Result<()>;

    fn copy_animation_from(&mut self, target: ModelHandle, source: ModelHandle) -> Result<()>;

    /// Jumps to `time` milliseconds into the current clip.
    fn set_anim_time(&mut self, access: PlaybackAccess, model: ModelHandle, time: f32) -> Result<()>;

    /// Changes the playback rate (1000 = real time) without touching the clock.
    fn set_anim_speed(&mut self, access: PlaybackAccess, model: ModelHandle, speed: f32) -> Result<()>;

    fn needs_new_anim(&self, model: ModelHandle, dt: f32) -> Result<bool>;

    fn animation(&self, model: ModelHandle) -> Result<Option<Arc<AnimationClip>>>;

    fn anim_speed(&self, model: ModelHandle) -> Result<f32>;
}

impl AnimationControl for ModelStore {
    fn set_animation(
        &mut self,
        model: ModelHandle,
        clip: Option<Arc<AnimationClip>>,
        once: bool,
        speed: f32,
        next: Option<Arc<AnimationClip>>,
    ) -> Result<()> {
        ModelStore::set_animation(self, model, clip, once, speed, next)
    }

    fn copy_animation_from(&mut self, target: ModelHandle, source: ModelHandle) -> Result<()> {
        ModelStore::copy_animation_from(self, target, source)
    }

    fn set_anim_time(&mut self, _: PlaybackAccess, model: ModelHandle, time: f32) -> Result<()> {
        self.get_mut(model).ok_or(ModelError::ModelNotFound)?.set_anim_time(time);
        self.invalidate_position(model)
    }

    fn set_anim_speed(&mut self, _: PlaybackAccess, model: ModelHandle, speed: f32) -> Result<()> {
        self.get_mut(model).ok_or(ModelError::ModelNotFound)?.set_anim_speed(speed);
        Ok(())
    }

    fn needs_new_anim(&self, model: ModelHandle, dt: f32) -> Result<bool> {
        self.get(model)
            .map(|m| m.needs_new_anim(dt))
            .ok_or(ModelError::ModelNotFound)
    }

    fn animation(&self, model: ModelHandle) -> Result<Option<Arc<AnimationClip>>> {
        self.get(model)
            .map(|m| m.animation().cloned())
            .ok_or(ModelError::ModelNotFound)
    }

    fn anim_speed(&self, model: ModelHandle) -> Result<f32> {
        self.get(model)
            .map(AnimatedModel::anim_speed)
            .ok_or(ModelError::ModelNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationData, BoneTrack};
    use crate::resources::{Bone, BonePose, GeometryDefinition, SkeletonDef, VertexBlend};
    use glam::{Vec2, Vec3};

    fn store_with_clip() -> (ModelStore, ModelHandle) {
        let geometry = GeometryDefinition::new("stick")
            .with_vertices(vec![Vec3::ZERO; 3], vec![Vec3::Z; 3], vec![Vec2::ZERO; 3])
            .with_indices(vec![0, 1, 2])
            .with_skeleton(
                SkeletonDef::new(vec![Bone::new("root", None, BonePose::IDENTITY)]),
                vec![VertexBlend::single(0); 3],
            );
        let data = AnimationData::new("idle", vec![BoneTrack::empty()]).with_duration(1000.0);
        let clip = Arc::new(AnimationClip::new("idle", Arc::new(data), 1.0));

        let mut store = ModelStore::new();
        let model = store.create(Arc::new(geometry)).unwrap();
        store.set_animation(model, Some(clip), false, 1000.0, None).unwrap();
        (store, model)
    }

    #[test]
    fn raw_setters_change_clock_and_invalidate() {
        let (mut store, model) = store_with_clip();
        store.validate_position(model).unwrap();

        store.set_anim_time(PlaybackAccess::new(), model, 600.0).unwrap();
        store.set_anim_speed(PlaybackAccess::new(), model, 250.0).unwrap();

        let m = store.get(model).unwrap();
        assert_eq!(m.anim_time(), 600.0);
        assert_eq!(m.anim_speed(), 250.0);
        assert!(!m.is_position_valid());
    }

    #[test]
    fn raw_setters_report_missing_model() {
        let (mut store, model) = store_with_clip();
        store.remove_model(model).unwrap();
        assert_eq!(
            store.set_anim_time(PlaybackAccess::new(), model, 1.0),
            Err(ModelError::ModelNotFound)
        );
    }
}
