use std::sync::Arc;

use bitflags::bitflags;
use glam::{Affine3A, Vec4};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::animation::{AnimationClip, ClipCache};
use crate::errors::{ModelError, Result};
use crate::model::{ModelHandle, Playback, Prop};
use crate::resources::{BoundingBox, GeometryDefinition, MaterialHandle, SkeletonDef, TextureHandle};
use crate::settings::ModelSettings;
use crate::skinning::{BoneMatrixSet, animated_bound};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModelFlags: u32 {
        const CAST_SHADOWS = 1 << 0;
        /// The current clip stops on its last frame instead of looping.
        /// Owned by playback; `set_flags` never changes it.
        const NO_LOOP_ANIMATION = 1 << 1;
    }
}

/// One instance of a mesh in the attachment tree.
///
/// Instances are created empty, bound to shared geometry once with
/// [`initialize`](Self::initialize) and then usually handed to a
/// [`ModelStore`](crate::model::ModelStore), which owns the tree structure
/// and keeps the cached transforms consistent.
#[derive(Debug)]
pub struct AnimatedModel {
    geometry: Option<Arc<GeometryDefinition>>,

    // === Transform ===
    pub(crate) local_transform: Affine3A,
    pub(crate) world_transform: Affine3A,
    pub(crate) position_valid: bool,

    // === Tree ===
    pub(crate) parent: Option<ModelHandle>,
    pub(crate) props: SmallVec<[Prop; 4]>,

    // === Playback ===
    pub(crate) flags: ModelFlags,
    pub(crate) playback: Playback,
    bones: Option<BoneMatrixSet>,

    // === Bounds ===
    object_bound: BoundingBox,
    /// Keyframe data already folded into `object_bound`.
    bounded_clips: FxHashSet<Uuid>,
    bound_sample_interval: f32,
    pub(crate) world_bound: BoundingBox,

    // === Appearance ===
    texture: Option<TextureHandle>,
    material: Option<MaterialHandle>,
    shading_color: Vec4,
    pub(crate) player_color: Vec4,
}

impl Default for AnimatedModel {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimatedModel {
    /// Creates an uninitialized instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            geometry: None,
            local_transform: Affine3A::IDENTITY,
            world_transform: Affine3A::IDENTITY,
            position_valid: false,
            parent: None,
            props: SmallVec::new(),
            flags: ModelFlags::empty(),
            playback: Playback::default(),
            bones: None,
            object_bound: BoundingBox::EMPTY,
            bounded_clips: FxHashSet::default(),
            bound_sample_interval: ModelSettings::default().bound_sample_interval_ms,
            world_bound: BoundingBox::EMPTY,
            texture: None,
            material: None,
            shading_color: Vec4::ONE,
            player_color: Vec4::ONE,
        }
    }

    /// Binds the instance to `geometry` using default settings.
    pub fn initialize(&mut self, geometry: Arc<GeometryDefinition>) -> Result<()> {
        self.initialize_with(geometry, &ModelSettings::default())
    }

    /// Binds the instance to `geometry`.
    ///
    /// Validates the geometry, allocates bone matrices for skeletal meshes and
    /// computes the rest-pose object bound. On failure the instance is left
    /// untouched.
    pub fn initialize_with(&mut self, geometry: Arc<GeometryDefinition>, settings: &ModelSettings) -> Result<()> {
        if self.geometry.is_some() {
            return Err(ModelError::InitializationFailure(format!(
                "model is already initialized, cannot rebind to '{}'",
                geometry.name
            )));
        }

        let bones = geometry
            .validate(settings.blend_weight_tolerance)
            .and_then(|()| geometry.skeleton().map(BoneMatrixSet::from_skeleton).transpose())
            .inspect_err(|e| log::warn!("{e}"))?;

        self.object_bound = geometry.rest_bound();
        self.bounded_clips.clear();
        self.bound_sample_interval = settings.bound_sample_interval_ms;
        self.bones = bones;
        self.geometry = Some(geometry);
        self.position_valid = false;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.geometry.is_some()
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> Option<&Arc<GeometryDefinition>> {
        self.geometry.as_ref()
    }

    #[must_use]
    pub fn skeleton(&self) -> Option<&SkeletonDef> {
        self.geometry.as_deref().and_then(GeometryDefinition::skeleton)
    }

    #[inline]
    #[must_use]
    pub fn local_transform(&self) -> &Affine3A {
        &self.local_transform
    }

    /// World transform as of the last validation.
    #[inline]
    #[must_use]
    pub fn world_transform(&self) -> &Affine3A {
        debug_assert!(self.position_valid, "world transform read from an invalid model");
        &self.world_transform
    }

    #[inline]
    #[must_use]
    pub fn is_position_valid(&self) -> bool {
        self.position_valid
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<ModelHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    /// Mutable view of the props. Edges cannot be added or removed through it.
    #[inline]
    pub fn props_mut(&mut self) -> &mut [Prop] {
        &mut self.props
    }

    #[inline]
    #[must_use]
    pub fn flags(&self) -> ModelFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: ModelFlags) {
        let no_loop = self.flags & ModelFlags::NO_LOOP_ANIMATION;
        self.flags = (flags - ModelFlags::NO_LOOP_ANIMATION) | no_loop;
    }

    // === Playback state ===

    #[inline]
    #[must_use]
    pub fn animation(&self) -> Option<&Arc<AnimationClip>> {
        self.playback.animation()
    }

    #[inline]
    #[must_use]
    pub fn next_animation(&self) -> Option<&Arc<AnimationClip>> {
        self.playback.next_animation()
    }

    /// Current clip time in milliseconds.
    #[inline]
    #[must_use]
    pub fn anim_time(&self) -> f32 {
        self.playback.time()
    }

    #[inline]
    #[must_use]
    pub fn anim_speed(&self) -> f32 {
        self.playback.speed()
    }

    #[inline]
    #[must_use]
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// Whether `update(dt)` would run a one-shot clip to its end.
    #[must_use]
    pub fn needs_new_anim(&self, dt: f32) -> bool {
        self.playback.needs_new_anim(dt, self.flags)
    }

    // === Skinning ===

    /// Skinning matrices (world bone pose × inverse bind), one per bone.
    ///
    /// `None` for static meshes. Only meaningful after validation.
    #[must_use]
    pub fn bone_matrices(&self) -> Option<&[Affine3A]> {
        debug_assert!(self.position_valid, "bone matrices read from an invalid model");
        self.bones.as_ref().map(BoneMatrixSet::skinning_matrices)
    }

    /// World-space bone transforms of the current pose.
    #[must_use]
    pub fn bone_poses(&self) -> Option<&[Affine3A]> {
        debug_assert!(self.position_valid, "bone poses read from an invalid model");
        self.bones.as_ref().map(BoneMatrixSet::bone_poses)
    }

    #[must_use]
    pub fn inverse_bind_matrices(&self) -> Option<&[Affine3A]> {
        self.bones.as_ref().map(BoneMatrixSet::inverse_bind_matrices)
    }

    // === Bounds ===

    /// Object-space bound covering the rest pose and every clip this
    /// instance has been given.
    #[inline]
    #[must_use]
    pub fn object_bound(&self) -> &BoundingBox {
        &self.object_bound
    }

    /// Result of the last `calc_bounds` on this model.
    #[inline]
    #[must_use]
    pub fn world_bound(&self) -> &BoundingBox {
        &self.world_bound
    }

    // === Appearance ===

    #[inline]
    #[must_use]
    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn set_texture(&mut self, texture: Option<TextureHandle>) {
        self.texture = texture;
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> Option<MaterialHandle> {
        self.material
    }

    pub fn set_material(&mut self, material: Option<MaterialHandle>) {
        self.material = material;
    }

    #[inline]
    #[must_use]
    pub fn shading_color(&self) -> Vec4 {
        self.shading_color
    }

    pub fn set_shading_color(&mut self, color: Vec4) {
        self.shading_color = color;
    }

    /// Player tint. Set through [`ModelStore::set_player_color`](crate::model::ModelStore::set_player_color)
    /// so it reaches every prop.
    #[inline]
    #[must_use]
    pub fn player_color(&self) -> Vec4 {
        self.player_color
    }

    /// Fetches a clip from `cache` that fits this instance's skeleton.
    pub fn build_animation(
        &self,
        cache: &mut ClipCache,
        filename: &str,
        name: &str,
        speed: f32,
        action_pos: f64,
        action_pos2: f64,
    ) -> Result<Arc<AnimationClip>> {
        let geometry = self.geometry.as_ref().ok_or(ModelError::NotInitialized)?;
        let skeleton = geometry
            .skeleton()
            .ok_or_else(|| ModelError::incompatible(name, "model has no skeleton"))?;
        cache.load_clip(filename, name, speed, action_pos, action_pos2, Some(skeleton))
    }

    // ========================================================================
    // Crate-internal mutation (reached through ModelStore)
    // ========================================================================

    pub(crate) fn set_animation(
        &mut self,
        clip: Option<Arc<AnimationClip>>,
        once: bool,
        speed: f32,
        next: Option<Arc<AnimationClip>>,
    ) -> Result<()> {
        for candidate in clip.iter().chain(next.iter()) {
            candidate
                .check_compatible(self.skeleton())
                .inspect_err(|e| log::warn!("{e}"))?;
        }

        for candidate in clip.iter().chain(next.iter()) {
            self.extend_object_bound(candidate);
        }

        self.flags.set(ModelFlags::NO_LOOP_ANIMATION, once && clip.is_some());
        self.playback = Playback {
            anim: clip,
            next_anim: next,
            speed,
            time: 0.0,
        };
        self.position_valid = false;
        Ok(())
    }

    /// Copies clock and clips from a model whose skeleton has `source_skeleton`'s layout.
    pub(crate) fn copy_playback(
        &mut self,
        playback: &Playback,
        source_flags: ModelFlags,
        source_skeleton: Option<&SkeletonDef>,
    ) -> Result<()> {
        let compatible = match (self.skeleton(), source_skeleton) {
            (Some(ours), Some(theirs)) => ours.same_layout(theirs),
            (None, None) => playback.anim.is_none() && playback.next_anim.is_none(),
            _ => false,
        };
        if !compatible {
            let clip = playback.anim.as_ref().map_or("<none>", |c| c.name());
            let err = ModelError::incompatible(clip, "source and target skeleton layouts differ");
            log::warn!("{err}");
            return Err(err);
        }

        for candidate in playback.anim.iter().chain(playback.next_anim.iter()) {
            self.extend_object_bound(candidate);
        }

        self.playback = playback.clone();
        self.flags.set(
            ModelFlags::NO_LOOP_ANIMATION,
            source_flags.contains(ModelFlags::NO_LOOP_ANIMATION),
        );
        self.position_valid = false;
        Ok(())
    }

    pub(crate) fn set_anim_time(&mut self, time: f32) {
        self.playback.time = time;
        self.position_valid = false;
    }

    pub(crate) fn set_anim_speed(&mut self, speed: f32) {
        self.playback.speed = speed;
    }

    /// Steps the clock. Returns `true` when a queued clip took over.
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        let switched = self.playback.advance(dt, &mut self.flags);
        self.position_valid = false;
        switched
    }

    /// Recomputes the world transform and bone matrices from `frame`, the
    /// attachment frame supplied by the parent (identity for roots).
    pub(crate) fn validate_from(&mut self, frame: &Affine3A) {
        self.world_transform = *frame * self.local_transform;

        if let (Some(skeleton), Some(bones)) = (
            self.geometry.as_deref().and_then(GeometryDefinition::skeleton),
            self.bones.as_mut(),
        ) {
            let pose = self
                .playback
                .anim
                .as_ref()
                .map(|clip| (clip.data().as_ref(), self.playback.time));
            bones.update(skeleton, pose, &self.world_transform);
        }

        self.position_valid = true;
    }

    /// World-space frame a prop on `point` hangs from. Requires a valid model.
    pub(crate) fn attachment_frame(&self, point: usize) -> Affine3A {
        let Some(prop_point) = self.geometry.as_ref().and_then(|g| g.prop_points().get(point)) else {
            return self.world_transform;
        };

        let base = prop_point
            .bone
            .and_then(|bone| self.bones.as_ref()?.bone_poses().get(bone).copied())
            .unwrap_or(self.world_transform);
        base * prop_point.transform
    }

    /// Folds every sampled pose of `clip` into the object bound, once per
    /// distinct keyframe data.
    fn extend_object_bound(&mut self, clip: &AnimationClip) {
        let data = clip.data();
        if !self.bounded_clips.insert(data.id) {
            return;
        }
        let (Some(geometry), Some(bones)) = (self.geometry.as_deref(), self.bones.as_ref()) else {
            return;
        };

        let mut scratch = bones.clone();
        let swept = animated_bound(geometry, data, self.bound_sample_interval, &mut scratch);
        self.object_bound = self.object_bound.union(&swept);
    }

    /// Copy that shares geometry and appearance handles but has no tree links
    /// and must be validated before use.
    pub(crate) fn detached_clone(&self) -> Self {
        Self {
            geometry: self.geometry.clone(),
            local_transform: self.local_transform,
            world_transform: Affine3A::IDENTITY,
            position_valid: false,
            parent: None,
            props: SmallVec::new(),
            flags: self.flags,
            playback: self.playback.clone(),
            bones: self.bones.clone(),
            object_bound: self.object_bound,
            bounded_clips: self.bounded_clips.clone(),
            bound_sample_interval: self.bound_sample_interval,
            world_bound: BoundingBox::EMPTY,
            texture: self.texture,
            material: self.material,
            shading_color: self.shading_color,
            player_color: self.player_color,
        }
    }
}
