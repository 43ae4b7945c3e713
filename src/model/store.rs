//! Model arena and tree operations.
//!
//! Every [`AnimatedModel`] in a tree lives in one [`ModelStore`]. Parents
//! reference children through [`Prop`] edges and children point back with a
//! non-owning [`ModelHandle`].
//!
//! # Cache protocol
//!
//! - Anything that changes where a model or its bones end up (transform,
//!   clock, clip, attachment) marks that model and all its descendants invalid.
//! - [`ModelStore::validate_position`] climbs to the top-most invalid ancestor
//!   and recomputes that whole subtree parent-first, so a valid model never has
//!   an invalid ancestor.

use std::sync::Arc;

use glam::{Affine3A, Vec4};
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::animation::AnimationClip;
use crate::errors::{ModelError, Result};
use crate::model::{AnimatedModel, ModelHandle, Prop, TemplateId};
use crate::resources::{BoundingBox, GeometryDefinition};
use crate::settings::ModelSettings;

#[derive(Debug, Default)]
pub struct ModelStore {
    models: SlotMap<ModelHandle, AnimatedModel>,
    settings: ModelSettings,
}

impl ModelStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: ModelSettings) -> Self {
        Self {
            models: SlotMap::with_key(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Adds a detached model as a new root.
    pub fn insert(&mut self, model: AnimatedModel) -> ModelHandle {
        debug_assert!(model.parent.is_none() && model.props.is_empty());
        self.models.insert(model)
    }

    /// Creates and initializes a model for `geometry` with the store's settings.
    pub fn create(&mut self, geometry: Arc<GeometryDefinition>) -> Result<ModelHandle> {
        let mut model = AnimatedModel::new();
        model.initialize_with(geometry, &self.settings)?;
        Ok(self.models.insert(model))
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: ModelHandle) -> Option<&AnimatedModel> {
        self.models.get(handle)
    }

    /// Mutable access for appearance changes. Tree structure, transforms and
    /// playback are changed through the store so caches stay consistent.
    #[inline]
    pub fn get_mut(&mut self, handle: ModelHandle) -> Option<&mut AnimatedModel> {
        self.models.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: ModelHandle) -> bool {
        self.models.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelHandle, &AnimatedModel)> {
        self.models.iter()
    }

    /// Handles of every model without a parent.
    pub fn roots(&self) -> impl Iterator<Item = ModelHandle> + '_ {
        self.models
            .iter()
            .filter(|(_, m)| m.parent.is_none())
            .map(|(h, _)| h)
    }

    fn model(&self, handle: ModelHandle) -> Result<&AnimatedModel> {
        self.models.get(handle).ok_or(ModelError::ModelNotFound)
    }

    fn model_mut(&mut self, handle: ModelHandle) -> Result<&mut AnimatedModel> {
        self.models.get_mut(handle).ok_or(ModelError::ModelNotFound)
    }

    /// Removes a model and, recursively, every prop it owns.
    pub fn remove_model(&mut self, handle: ModelHandle) -> Result<()> {
        let parent = self.model(handle)?.parent;

        if let Some(parent) = parent
            && let Some(p) = self.models.get_mut(parent)
            && let Some(pos) = p.props.iter().position(|prop| prop.model == handle)
        {
            p.props.remove(pos);
        }

        let mut stack = vec![handle];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(model) = self.models.remove(current) {
                stack.extend(model.props.iter().map(|prop| prop.model));
                removed += 1;
            }
        }
        log::debug!("Removed model subtree ({removed} models)");
        Ok(())
    }

    // ========================================================================
    // Props
    // ========================================================================

    /// Attaches `child` to the prop point named `point_name` of `parent`.
    pub fn add_prop(
        &mut self,
        parent: ModelHandle,
        point_name: &str,
        child: ModelHandle,
        template: Option<TemplateId>,
    ) -> Result<()> {
        let parent_model = self.model(parent)?;
        let child_model = self.model(child)?;

        let point = parent_model
            .geometry()
            .and_then(|g| g.find_prop_point(point_name))
            .ok_or_else(|| ModelError::InvalidAttachmentPoint(point_name.to_string()))?;

        if self.is_ancestor_or_self(child, parent) {
            return Err(ModelError::AttachmentCycle);
        }
        if child_model.parent.is_some() {
            return Err(ModelError::AlreadyAttached);
        }

        self.model_mut(parent)?.props.push(Prop {
            point,
            model: child,
            template,
        });
        self.model_mut(child)?.parent = Some(parent);
        self.invalidate_position(child)?;

        log::debug!("Attached prop at '{point_name}'");
        Ok(())
    }

    /// Detaches the first prop on `point_name`.
    ///
    /// The detached child stays in the store as a root; its handle is returned
    /// so the caller can re-attach or remove it. Unknown or empty points
    /// yield `Ok(None)`.
    pub fn remove_prop(&mut self, parent: ModelHandle, point_name: &str) -> Result<Option<ModelHandle>> {
        let parent_model = self.model_mut(parent)?;
        let Some(point) = parent_model.geometry().and_then(|g| g.find_prop_point(point_name)) else {
            return Ok(None);
        };
        let Some(pos) = parent_model.props.iter().position(|p| p.point == point) else {
            return Ok(None);
        };

        let prop = parent_model.props.remove(pos);
        if let Some(child) = self.models.get_mut(prop.model) {
            child.parent = None;
        }
        self.invalidate_position(prop.model)?;

        log::debug!("Detached prop from '{point_name}'");
        Ok(Some(prop.model))
    }

    /// Whether `candidate` is `handle` or one of its ancestors.
    fn is_ancestor_or_self(&self, candidate: ModelHandle, handle: ModelHandle) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            if h == candidate {
                return true;
            }
            current = self.models.get(h).and_then(|m| m.parent);
        }
        false
    }

    // ========================================================================
    // Transforms & validation
    // ========================================================================

    pub fn set_transform(&mut self, handle: ModelHandle, transform: Affine3A) -> Result<()> {
        self.model_mut(handle)?.local_transform = transform;
        self.invalidate_position(handle)
    }

    /// Marks `handle` and all its descendants invalid.
    pub fn invalidate_position(&mut self, handle: ModelHandle) -> Result<()> {
        self.model(handle)?;

        let mut stack: SmallVec<[ModelHandle; 16]> = SmallVec::new();
        stack.push(handle);
        while let Some(current) = stack.pop() {
            let Some(model) = self.models.get_mut(current) else {
                continue;
            };
            model.position_valid = false;
            stack.extend(model.props.iter().map(|p| p.model));
        }
        Ok(())
    }

    /// Brings the world transform and bone matrices of `handle` up to date,
    /// together with every invalid ancestor and their subtrees.
    pub fn validate_position(&mut self, handle: ModelHandle) -> Result<()> {
        if self.model(handle)?.position_valid {
            return Ok(());
        }

        // 1. Climb to the top-most invalid ancestor
        let mut top = handle;
        while let Some(parent) = self.models.get(top).and_then(|m| m.parent) {
            match self.models.get(parent) {
                Some(p) if !p.position_valid => top = parent,
                _ => break,
            }
        }

        // 2. Frame the subtree hangs from
        let frame = self.parent_frame(top);

        // 3. Parent-first walk: (model, attachment frame)
        let mut stack: Vec<(ModelHandle, Affine3A)> = Vec::with_capacity(16);
        stack.push((top, frame));

        while let Some((current, frame)) = stack.pop() {
            let Some(model) = self.models.get_mut(current) else {
                continue;
            };
            model.validate_from(&frame);

            for prop in model.props.iter().rev() {
                stack.push((prop.model, model.attachment_frame(prop.point)));
            }
        }

        Ok(())
    }

    /// Attachment frame of `handle` from its (valid) parent, identity for roots.
    fn parent_frame(&self, handle: ModelHandle) -> Affine3A {
        let Some(parent) = self.models.get(handle).and_then(|m| m.parent) else {
            return Affine3A::IDENTITY;
        };
        let Some(parent_model) = self.models.get(parent) else {
            return Affine3A::IDENTITY;
        };
        parent_model
            .props
            .iter()
            .find(|p| p.model == handle)
            .map_or(parent_model.world_transform, |p| parent_model.attachment_frame(p.point))
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    /// World-space bound of `handle` and all its props.
    ///
    /// Validates `handle` and every invalid prop below it. Each visited
    /// model's `world_bound` is refreshed.
    pub fn calc_bounds(&mut self, handle: ModelHandle) -> Result<BoundingBox> {
        self.calc_bounds_recursive(handle)
    }

    fn calc_bounds_recursive(&mut self, handle: ModelHandle) -> Result<BoundingBox> {
        // A prop can be invalid under a valid parent (moved, stepped or just attached)
        self.validate_position(handle)?;
        let model = self.model(handle)?;

        let mut bound = if model.is_initialized() {
            model.object_bound().transform(&model.world_transform)
        } else {
            BoundingBox::EMPTY
        };
        let children: SmallVec<[ModelHandle; 4]> = model.props.iter().map(|p| p.model).collect();

        for child in children {
            bound = bound.union(&self.calc_bounds_recursive(child)?);
        }

        self.model_mut(handle)?.world_bound = bound;
        Ok(bound)
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Advances the clocks of `handle` and all its props by `dt` milliseconds.
    pub fn update(&mut self, handle: ModelHandle, dt: f32) -> Result<()> {
        self.model(handle)?;

        let mut stack: SmallVec<[ModelHandle; 16]> = SmallVec::new();
        stack.push(handle);
        while let Some(current) = stack.pop() {
            let Some(model) = self.models.get_mut(current) else {
                continue;
            };
            if model.advance(dt) {
                log::trace!(
                    "Switched to queued animation '{}'",
                    model.animation().map_or("", |c| c.name())
                );
            }
            stack.extend(model.props.iter().map(|p| p.model));
        }
        Ok(())
    }

    /// Plays `clip` on `handle` from time 0.
    ///
    /// `speed` is on the 1000 = real-time scale. `once` stops the clip on its
    /// last frame; `next` is switched to (and looped) when the clip ends.
    pub fn set_animation(
        &mut self,
        handle: ModelHandle,
        clip: Option<Arc<AnimationClip>>,
        once: bool,
        speed: f32,
        next: Option<Arc<AnimationClip>>,
    ) -> Result<()> {
        self.model_mut(handle)?.set_animation(clip, once, speed, next)?;
        self.invalidate_position(handle)
    }

    /// Makes `target` play exactly what `source` plays, at the same time.
    pub fn copy_animation_from(&mut self, target: ModelHandle, source: ModelHandle) -> Result<()> {
        let source_model = self.model(source)?;
        let playback = source_model.playback.clone();
        let flags = source_model.flags;
        let geometry = source_model.geometry().cloned();

        self.model_mut(target)?
            .copy_playback(&playback, flags, geometry.as_deref().and_then(GeometryDefinition::skeleton))?;
        self.invalidate_position(target)
    }

    // ========================================================================
    // Clone & appearance
    // ========================================================================

    /// Deep-copies `handle` and its props. The copy is an invalid root.
    pub fn clone_model(&mut self, handle: ModelHandle) -> Result<ModelHandle> {
        let copy = self.clone_subtree(handle)?;
        log::debug!("Cloned model subtree");
        Ok(copy)
    }

    fn clone_subtree(&mut self, handle: ModelHandle) -> Result<ModelHandle> {
        let source = self.model(handle)?;
        let copy = source.detached_clone();
        let props = source.props.clone();

        let new_handle = self.models.insert(copy);
        for prop in props {
            let child = self.clone_subtree(prop.model)?;
            self.model_mut(child)?.parent = Some(new_handle);
            self.model_mut(new_handle)?.props.push(Prop { model: child, ..prop });
        }
        Ok(new_handle)
    }

    /// Sets the player tint on `handle` and every prop below it.
    pub fn set_player_color(&mut self, handle: ModelHandle, color: Vec4) -> Result<()> {
        self.model(handle)?;

        let mut stack: SmallVec<[ModelHandle; 16]> = SmallVec::new();
        stack.push(handle);
        while let Some(current) = stack.pop() {
            let Some(model) = self.models.get_mut(current) else {
                continue;
            };
            model.player_color = color;
            stack.extend(model.props.iter().map(|p| p.model));
        }
        Ok(())
    }
}
