//! Shared fixtures for the integration tests.
//!
//! The "arm" geometry is a two-bone skeleton: `root` at the origin and `hand`
//! one unit up the Y axis. Vertices at y = 1 and y = 2 follow `hand`, the rest
//! follow `root`.

#![allow(dead_code)]

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Affine3A, Quat, Vec2, Vec3};

use myth_actor::animation::{AnimationClip, AnimationData, BoneTrack, ClipCache, InterpolationMode, KeyframeTrack};
use myth_actor::resources::{Bone, BonePose, GeometryDefinition, PropPoint, SkeletonDef, VertexBlend};

pub const EPSILON: f32 = 1e-4;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Geometry
// ============================================================================

pub fn arm_skeleton() -> SkeletonDef {
    SkeletonDef::new(vec![
        Bone::new("root", None, BonePose::IDENTITY),
        Bone::new("hand", Some(0), BonePose::from_translation(Vec3::Y)),
    ])
}

pub fn arm_positions() -> Vec<Vec3> {
    vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(0.0, 2.0, 0.0)]
}

pub fn arm_blends() -> Vec<VertexBlend> {
    vec![
        VertexBlend::single(0),
        VertexBlend::single(0),
        VertexBlend::single(1),
        VertexBlend::single(1),
    ]
}

/// Arm geometry with two prop points: `hand` (0.5 above the hand bone) and
/// `base` (one unit along +Z of the model origin, not bone-bound).
pub fn arm_definition() -> GeometryDefinition {
    let positions = arm_positions();
    let count = positions.len();
    GeometryDefinition::new("arm")
        .with_vertices(positions, vec![Vec3::Z; count], vec![Vec2::ZERO; count])
        .with_indices(vec![0, 1, 2, 1, 3, 2])
        .with_skeleton(arm_skeleton(), arm_blends())
        .with_prop_point(PropPoint::new(
            "hand",
            Some(1),
            Affine3A::from_translation(Vec3::new(0.0, 0.5, 0.0)),
        ))
        .with_prop_point(PropPoint::new("base", None, Affine3A::from_translation(Vec3::Z)))
}

pub fn arm_geometry() -> Arc<GeometryDefinition> {
    Arc::new(arm_definition())
}

/// Static triangle with a `top` prop point at y = 1.
pub fn gem_geometry() -> Arc<GeometryDefinition> {
    Arc::new(
        GeometryDefinition::new("gem")
            .with_vertices(
                vec![Vec3::new(-0.5, 0.0, 0.0), Vec3::new(0.5, 0.0, 0.0), Vec3::Y],
                vec![Vec3::Z; 3],
                vec![Vec2::ZERO; 3],
            )
            .with_indices(vec![0, 1, 2])
            .with_prop_point(PropPoint::new("top", None, Affine3A::from_translation(Vec3::Y))),
    )
}

// ============================================================================
// Animation
// ============================================================================

/// Lifts the hand bone from y = 1 to y = 3 over one second.
pub fn raise_data() -> AnimationData {
    AnimationData::new(
        "raise",
        vec![
            BoneTrack::empty(),
            BoneTrack {
                translation: KeyframeTrack::new(
                    vec![0.0, 1000.0],
                    vec![Vec3::Y, Vec3::new(0.0, 3.0, 0.0)],
                    InterpolationMode::Linear,
                ),
                ..BoneTrack::empty()
            },
        ],
    )
}

/// Rotates the root bone 90 degrees about +Z over one second.
pub fn swing_data() -> AnimationData {
    AnimationData::new(
        "swing",
        vec![
            BoneTrack {
                rotation: KeyframeTrack::new(
                    vec![0.0, 1000.0],
                    vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
                    InterpolationMode::Linear,
                ),
                ..BoneTrack::empty()
            },
            BoneTrack::empty(),
        ],
    )
}

/// Keyframes for a three-bone rig; incompatible with the arm.
pub fn tripod_data() -> AnimationData {
    AnimationData::new("tripod", vec![BoneTrack::empty(), BoneTrack::empty(), BoneTrack::empty()])
        .with_duration(500.0)
}

pub fn clip(data: AnimationData) -> Arc<AnimationClip> {
    let name = data.name.clone();
    Arc::new(AnimationClip::new(&name, Arc::new(data), 1.0))
}

pub fn raise_clip() -> Arc<AnimationClip> {
    clip(raise_data())
}

pub fn swing_clip() -> Arc<AnimationClip> {
    clip(swing_data())
}

/// Cache with `raise`, `swing` and `tripod` registered under `anim/<name>.psa`.
pub fn clip_cache() -> ClipCache {
    let mut cache = ClipCache::new();
    cache.insert("anim/raise.psa", raise_data());
    cache.insert("anim/swing.psa", swing_data());
    cache.insert("anim/tripod.psa", tripod_data());
    cache
}
