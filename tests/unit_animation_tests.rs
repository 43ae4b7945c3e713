//! Unit Animation Controller Tests
//!
//! Tests for:
//! - State changes with speed composition and synced-model mirroring
//! - Repeat-time and action-offset synchronisation
//! - Exhaustion queries

mod common;

use std::sync::Arc;

use myth_actor::animation::AnimationClip;
use myth_actor::model::ModelStore;
use myth_actor::{ModelError, ModelHandle, ModelSettings, UnitAnimation};

use common::*;

/// One-second raise clip with authored speed 1.5 and an action cue at 50%.
fn attack_clip() -> Arc<AnimationClip> {
    Arc::new(AnimationClip::new("attack", Arc::new(raise_data()), 1.5).with_action_positions(0.5, -1.0))
}

fn unit() -> (ModelStore, ModelHandle, UnitAnimation) {
    init_logger();
    let mut store = ModelStore::new();
    let body = store.create(arm_geometry()).unwrap();
    let unit = UnitAnimation::new(body, store.settings());
    (store, body, unit)
}

#[test]
fn state_speed_composes_default_request_and_clip() -> anyhow::Result<()> {
    let (mut store, body, mut unit) = unit();
    unit.set_animation_state(&mut store, "melee", Some(attack_clip()), false, 2.0, None)?;

    let model = store.get(body).unwrap();
    assert_eq!(unit.state(), "melee");
    assert!(approx(model.anim_speed(), 1000.0 * 2.0 * 1.5));
    assert_eq!(model.animation().unwrap().name(), "attack");
    Ok(())
}

#[test]
fn custom_default_speed_is_respected() -> anyhow::Result<()> {
    init_logger();
    let mut store = ModelStore::with_settings(ModelSettings {
        default_anim_speed: 500.0,
        ..Default::default()
    });
    let body = store.create(arm_geometry())?;
    let mut unit = UnitAnimation::new(body, store.settings());

    unit.set_animation_state(&mut store, "idle", Some(raise_clip()), false, 1.0, None)?;
    assert!(approx(store.get(body).unwrap().anim_speed(), 500.0));
    Ok(())
}

#[test]
fn failed_state_change_keeps_previous_state() {
    let (mut store, _, mut unit) = unit();
    unit.set_animation_state(&mut store, "idle", Some(raise_clip()), false, 1.0, None)
        .unwrap();

    let result = unit.set_animation_state(&mut store, "broken", Some(clip(tripod_data())), false, 1.0, None);
    assert!(matches!(result, Err(ModelError::AnimationIncompatible { .. })));
    assert_eq!(unit.state(), "idle");
}

#[test]
fn synced_models_mirror_playback() -> anyhow::Result<()> {
    let (mut store, body, mut unit) = unit();
    let rider = store.create(arm_geometry())?;
    unit.add_synced_model(rider);
    unit.add_synced_model(rider);
    unit.add_synced_model(body);
    assert_eq!(unit.synced_models(), &[rider]);

    let clip = attack_clip();
    unit.set_animation_state(&mut store, "melee", Some(clip.clone()), true, 1.0, None)?;
    unit.set_animation_sync(&mut store, 400.0, 2000.0)?;

    let body_model = store.get(body).unwrap();
    let rider_model = store.get(rider).unwrap();
    assert!(Arc::ptr_eq(rider_model.animation().unwrap(), &clip));
    assert_eq!(rider_model.anim_time(), body_model.anim_time());
    assert_eq!(rider_model.anim_speed(), body_model.anim_speed());
    assert_eq!(rider_model.flags(), body_model.flags());

    unit.remove_synced_model(rider);
    assert!(unit.synced_models().is_empty());
    Ok(())
}

#[test]
fn sync_repeat_stretches_cycle() -> anyhow::Result<()> {
    let (mut store, body, mut unit) = unit();
    unit.set_animation_state(&mut store, "melee", Some(attack_clip()), false, 1.0, None)?;
    unit.set_sync_repeat(&mut store, 2000.0)?;

    // One 1000 ms cycle per 2000 ms of real time
    assert!(approx(store.get(body).unwrap().anim_speed(), 500.0));

    store.update(body, 2000.0)?;
    assert!(store.get(body).unwrap().anim_time() < 1e-2);
    Ok(())
}

#[test]
fn sync_offset_lands_action_on_time() -> anyhow::Result<()> {
    let (mut store, body, mut unit) = unit();
    unit.set_animation_state(&mut store, "melee", Some(attack_clip()), false, 1.0, None)?;
    unit.set_animation_sync(&mut store, 400.0, 2000.0)?;

    // speed 500: 400 ms of real time covers 200 ms of clip before the cue at 500
    assert!(approx(store.get(body).unwrap().anim_time(), 300.0));

    store.update(body, 400.0)?;
    assert!(approx(store.get(body).unwrap().anim_time(), 500.0));
    Ok(())
}

#[test]
fn sync_offset_wraps_into_clip() -> anyhow::Result<()> {
    let (mut store, body, mut unit) = unit();
    unit.set_animation_state(&mut store, "melee", Some(attack_clip()), false, 1.0, None)?;
    unit.set_animation_sync(&mut store, 2000.0, 2000.0)?;

    // 2000 ms at speed 500 is one full cycle back from the cue
    assert!(approx(store.get(body).unwrap().anim_time(), 500.0));
    Ok(())
}

#[test]
fn sync_without_clip_is_a_no_op() -> anyhow::Result<()> {
    let (mut store, body, mut unit) = unit();
    unit.set_animation_sync(&mut store, 100.0, 1000.0)?;
    assert_eq!(store.get(body).unwrap().anim_time(), 0.0);
    Ok(())
}

#[test]
fn exhaustion_forwards_needs_new_anim() -> anyhow::Result<()> {
    let (mut store, _, mut unit) = unit();
    unit.set_animation_state(&mut store, "die", Some(raise_clip()), true, 1.0, None)?;

    assert!(!unit.is_exhausting(&store, 100.0)?);
    assert!(unit.is_exhausting(&store, 1000.0)?);
    Ok(())
}
