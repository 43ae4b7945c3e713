//! Bounds Tests
//!
//! Tests for:
//! - Object bound growth as clips are bound to an instance
//! - Conservatism of world bounds at every sampled frame
//! - World bounds over prop subtrees

mod common;

use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3};

use myth_actor::animation::AnimationClip;
use myth_actor::model::{AnimatedModel, ModelStore};
use myth_actor::skinning::skin_point;
use myth_actor::{BoundingBox, DEFAULT_ANIM_SPEED, ModelHandle};

use common::*;

fn assert_box(bound: &BoundingBox, min: Vec3, max: Vec3) {
    assert!(approx_vec(bound.min, min), "min {:?} != {min:?}", bound.min);
    assert!(approx_vec(bound.max, max), "max {:?} != {max:?}", bound.max);
}

// ============================================================================
// Object bound
// ============================================================================

#[test]
fn object_bound_covers_clip_sweep() {
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    assert_box(store.get(arm).unwrap().object_bound(), Vec3::ZERO, Vec3::new(1.0, 2.0, 0.0));

    store.set_animation(arm, Some(raise_clip()), false, DEFAULT_ANIM_SPEED, None).unwrap();
    assert_box(store.get(arm).unwrap().object_bound(), Vec3::ZERO, Vec3::new(1.0, 4.0, 0.0));
}

#[test]
fn object_bound_accumulates_across_clips() {
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    store.set_animation(arm, Some(raise_clip()), false, DEFAULT_ANIM_SPEED, None).unwrap();
    store.set_animation(arm, Some(swing_clip()), false, DEFAULT_ANIM_SPEED, None).unwrap();

    let bound = store.get(arm).unwrap().object_bound();
    // Swing lays the arm along -X; raise lifts the tip to y = 4
    assert!(approx(bound.min.x, -2.0));
    assert!(approx(bound.max.y, 4.0));
}

#[test]
fn queued_clip_is_part_of_object_bound() {
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    store
        .set_animation(arm, Some(swing_clip()), true, DEFAULT_ANIM_SPEED, Some(raise_clip()))
        .unwrap();
    assert!(approx(store.get(arm).unwrap().object_bound().max.y, 4.0));
}

#[test]
fn copied_playback_extends_target_bound() {
    let mut store = ModelStore::new();
    let source = store.create(arm_geometry()).unwrap();
    let target = store.create(arm_geometry()).unwrap();
    store.set_animation(source, Some(raise_clip()), false, DEFAULT_ANIM_SPEED, None).unwrap();
    store.copy_animation_from(target, source).unwrap();

    assert!(approx(store.get(target).unwrap().object_bound().max.y, 4.0));
}

// ============================================================================
// Conservatism
// ============================================================================

fn check_conservative(store: &mut ModelStore, arm: ModelHandle, clip: &Arc<AnimationClip>) {
    let interval = store.settings().bound_sample_interval_ms;
    let geometry = store.get(arm).unwrap().geometry().unwrap().clone();

    for time in clip.data().sample_times(interval) {
        // Restart as a one-shot and step straight to `time`
        store.set_animation(arm, Some(clip.clone()), true, DEFAULT_ANIM_SPEED, None).unwrap();
        store.update(arm, time).unwrap();
        assert!((store.get(arm).unwrap().anim_time() - time).abs() < 1e-3);
        let bound = store.calc_bounds(arm).unwrap();

        let matrices = store.get(arm).unwrap().bone_matrices().unwrap();
        for (position, blend) in geometry.positions().iter().zip(geometry.blends()) {
            let world = skin_point(*position, blend, matrices);
            assert!(
                bound.contains_point(world, 1e-3),
                "vertex {world:?} escapes {bound:?} at t = {time}"
            );
        }
    }
}

#[test]
fn world_bound_is_conservative_at_sampled_frames() {
    init_logger();
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    store
        .set_transform(
            arm,
            Affine3A::from_rotation_translation(Quat::from_rotation_y(0.4), Vec3::new(3.0, 0.0, -2.0)),
        )
        .unwrap();

    for clip in [raise_clip(), swing_clip()] {
        store.set_animation(arm, Some(clip.clone()), false, DEFAULT_ANIM_SPEED, None).unwrap();
        check_conservative(&mut store, arm, &clip);
    }
}

// ============================================================================
// calc_bounds over props
// ============================================================================

#[test]
fn calc_bounds_unions_props() {
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    let gem = store.create(gem_geometry()).unwrap();
    store
        .set_transform(arm, Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)))
        .unwrap();
    store.add_prop(arm, "hand", gem, None).unwrap();

    let bound = store.calc_bounds(arm).unwrap();
    assert_box(&bound, Vec3::new(9.5, 0.0, 0.0), Vec3::new(11.0, 2.5, 0.0));

    // Each node keeps its own subtree bound
    assert_box(store.get(arm).unwrap().world_bound(), bound.min, bound.max);
    assert_box(
        store.get(gem).unwrap().world_bound(),
        Vec3::new(9.5, 1.5, 0.0),
        Vec3::new(10.5, 2.5, 0.0),
    );
}

#[test]
fn calc_bounds_validates_first() {
    let mut store = ModelStore::new();
    let gem = store.create(gem_geometry()).unwrap();
    store.set_transform(gem, Affine3A::from_translation(Vec3::Z)).unwrap();

    let bound = store.calc_bounds(gem).unwrap();
    assert!(store.get(gem).unwrap().is_position_valid());
    assert_box(&bound, Vec3::new(-0.5, 0.0, 1.0), Vec3::new(0.5, 1.0, 1.0));
}

#[test]
fn uninitialized_model_has_empty_bound() {
    let mut store = ModelStore::new();
    let empty = store.insert(AnimatedModel::new());
    assert!(store.calc_bounds(empty).unwrap().is_empty());
}

// ============================================================================
// Invalid props under a valid parent
// ============================================================================

#[test]
fn calc_bounds_refreshes_moved_prop() {
    init_logger();
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    let gem = store.create(gem_geometry()).unwrap();
    store.add_prop(arm, "hand", gem, None).unwrap();
    store.calc_bounds(arm).unwrap();

    store
        .set_transform(gem, Affine3A::from_translation(Vec3::new(100.0, 0.0, 0.0)))
        .unwrap();
    assert!(store.get(arm).unwrap().is_position_valid());

    let bound = store.calc_bounds(arm).unwrap();
    assert!(store.get(gem).unwrap().is_position_valid());
    assert_box(&bound, Vec3::ZERO, Vec3::new(100.5, 2.5, 0.0));
    assert_box(
        store.get(gem).unwrap().world_bound(),
        Vec3::new(99.5, 1.5, 0.0),
        Vec3::new(100.5, 2.5, 0.0),
    );
}

#[test]
fn calc_bounds_places_prop_attached_after_validation() {
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    let gem = store.create(gem_geometry()).unwrap();
    store
        .set_transform(arm, Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0)))
        .unwrap();
    store.validate_position(arm).unwrap();

    store.add_prop(arm, "hand", gem, None).unwrap();
    let bound = store.calc_bounds(arm).unwrap();
    assert_box(&bound, Vec3::new(9.5, 0.0, 0.0), Vec3::new(11.0, 2.5, 0.0));

    // Detach and re-attach on the other point
    store.remove_prop(arm, "hand").unwrap();
    store.add_prop(arm, "base", gem, None).unwrap();
    let bound = store.calc_bounds(arm).unwrap();
    assert_box(
        store.get(gem).unwrap().world_bound(),
        Vec3::new(9.5, 0.0, 1.0),
        Vec3::new(10.5, 1.0, 1.0),
    );
    assert!(approx(bound.max.z, 1.0));
}

#[test]
fn calc_bounds_validates_stepped_prop() {
    let mut store = ModelStore::new();
    let arm = store.create(arm_geometry()).unwrap();
    let held = store.create(arm_geometry()).unwrap();
    store.add_prop(arm, "hand", held, None).unwrap();
    store.set_animation(held, Some(raise_clip()), true, DEFAULT_ANIM_SPEED, None).unwrap();
    store.calc_bounds(arm).unwrap();

    store.update(held, 1000.0).unwrap();
    let bound = store.calc_bounds(arm).unwrap();

    let model = store.get(held).unwrap();
    assert!(model.is_position_valid());
    // Held arm hangs at y = 1.5; its raised tip vertex (0, 2, 0) ends at 1.5 + 4
    let tip = model.bone_matrices().unwrap()[1].transform_point3(Vec3::new(0.0, 2.0, 0.0));
    assert!(approx_vec(tip, Vec3::new(0.0, 5.5, 0.0)));
    assert!(bound.contains_point(tip, 1e-3));
}
