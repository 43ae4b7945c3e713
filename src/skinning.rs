//! Bone matrices and vertex skinning.
//!
//! Data flow for one validation of a skeletal model:
//!
//! 1. sample the playing clip into per-bone local poses (bind pose when idle)
//! 2. compose them through the hierarchy, starting from the model's world
//!    transform, into world-space bone poses
//! 3. multiply each pose by the bone's inverse bind matrix to get the
//!    skinning matrix the renderer applies to vertices

use glam::{Affine3A, Vec3};

use crate::animation::AnimationData;
use crate::errors::{ModelError, Result};
use crate::resources::{BonePose, BoundingBox, GeometryDefinition, SkeletonDef, VertexBlend};

/// Per-instance bone matrices, sized to the skeleton's bone count.
#[derive(Debug, Clone)]
pub struct BoneMatrixSet {
    /// World-space transform of every bone in the current pose.
    bone_poses: Vec<Affine3A>,
    /// `bone_poses[i] * inverse_bind[i]`, ready for vertex skinning.
    skinning: Vec<Affine3A>,
    /// Inverse of each bone's model-space bind matrix. Read-only after creation.
    inverse_bind: Vec<Affine3A>,
    local_scratch: Vec<BonePose>,
}

impl BoneMatrixSet {
    /// Allocates the matrices and derives the inverse bind matrices.
    pub fn from_skeleton(skeleton: &SkeletonDef) -> Result<Self> {
        let bind = skeleton.bind_matrices();
        let count = bind.len();

        let mut inverse_bind = Vec::with_capacity(count);
        for (i, matrix) in bind.iter().enumerate() {
            let det = matrix.matrix3.determinant();
            if !det.is_finite() || det.abs() < 1e-8 {
                return Err(ModelError::InitializationFailure(format!(
                    "bind matrix of bone {i} is not invertible"
                )));
            }
            inverse_bind.push(matrix.inverse());
        }

        Ok(Self {
            bone_poses: bind,
            skinning: vec![Affine3A::IDENTITY; count],
            inverse_bind,
            local_scratch: Vec::with_capacity(count),
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.skinning.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skinning.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn skinning_matrices(&self) -> &[Affine3A] {
        &self.skinning
    }

    #[inline]
    #[must_use]
    pub fn bone_poses(&self) -> &[Affine3A] {
        &self.bone_poses
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Affine3A] {
        &self.inverse_bind
    }

    /// Poses the skeleton at `animation`'s sample time (bind pose for `None`)
    /// with the skeleton root placed at `world`.
    pub fn update(
        &mut self,
        skeleton: &SkeletonDef,
        animation: Option<(&AnimationData, f32)>,
        world: &Affine3A,
    ) {
        match animation {
            Some((data, time)) => data.sample_pose(time, skeleton, &mut self.local_scratch),
            None => {
                self.local_scratch.clear();
                self.local_scratch
                    .extend(skeleton.bones().iter().map(|b| b.bind_pose));
            }
        }

        for (i, bone) in skeleton.bones().iter().enumerate() {
            let local = self.local_scratch[i].to_affine();
            // Parents precede children, so the parent's pose is already current
            let pose = match bone.parent {
                Some(parent) => self.bone_poses[parent] * local,
                None => *world * local,
            };
            self.bone_poses[i] = pose;
            self.skinning[i] = pose * self.inverse_bind[i];
        }
    }
}

/// Position of a bind-pose vertex after skinning with `matrices`.
#[must_use]
pub fn skin_point(position: Vec3, blend: &VertexBlend, matrices: &[Affine3A]) -> Vec3 {
    blend
        .influences()
        .filter_map(|(bone, weight)| matrices.get(bone).map(|m| m.transform_point3(position) * weight))
        .fold(Vec3::ZERO, |acc, p| acc + p)
}

/// Object-space bound of `geometry` swept over every sample time of `data`.
///
/// `scratch` must have been created from the geometry's skeleton; its pose is
/// overwritten.
#[must_use]
pub fn animated_bound(
    geometry: &GeometryDefinition,
    data: &AnimationData,
    sample_interval: f32,
    scratch: &mut BoneMatrixSet,
) -> BoundingBox {
    let Some(skeleton) = geometry.skeleton() else {
        return geometry.rest_bound();
    };

    let mut bound = BoundingBox::EMPTY;
    for time in data.sample_times(sample_interval) {
        scratch.update(skeleton, Some((data, time)), &Affine3A::IDENTITY);
        let matrices = scratch.skinning_matrices();
        for (position, blend) in geometry.positions().iter().zip(geometry.blends()) {
            bound.extend(skin_point(*position, blend, matrices));
        }
    }
    bound
}

/// Direction of a bind-pose normal after skinning with `matrices`.
#[must_use]
pub fn skin_normal(normal: Vec3, blend: &VertexBlend, matrices: &[Affine3A]) -> Vec3 {
    blend
        .influences()
        .filter_map(|(bone, weight)| matrices.get(bone).map(|m| m.transform_vector3(normal) * weight))
        .fold(Vec3::ZERO, |acc, n| acc + n)
        .normalize_or_zero()
}
