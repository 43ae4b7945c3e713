//! Immutable mesh and skeleton definitions.
//!
//! A [`GeometryDefinition`] is built once (normally by an asset loader),
//! wrapped in an `Arc` and shared by every model instance that uses it. Nothing
//! in this crate mutates a definition after construction.

use glam::{Affine3A, Quat, Vec2, Vec3};
use uuid::Uuid;

use crate::errors::{ModelError, Result};
use crate::resources::BoundingBox;

/// Maximum number of bones that may influence a single vertex.
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Local translation / rotation / scale of one bone relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BonePose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    #[must_use]
    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::ONE,
        }
    }

    #[inline]
    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for BonePose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Parent bone index. Parents always precede their children.
    pub parent: Option<usize>,
    /// Rest pose, relative to the parent bone (or model space for roots).
    pub bind_pose: BonePose,
}

impl Bone {
    #[must_use]
    pub fn new(name: &str, parent: Option<usize>, bind_pose: BonePose) -> Self {
        Self {
            name: name.to_string(),
            parent,
            bind_pose,
        }
    }
}

/// Bind-pose bone hierarchy of a skeletal mesh.
#[derive(Debug, Clone, Default)]
pub struct SkeletonDef {
    bones: Vec<Bone>,
}

impl SkeletonDef {
    #[must_use]
    pub fn new(bones: Vec<Bone>) -> Self {
        Self { bones }
    }

    #[inline]
    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    /// Two skeletons share a layout when they have the same bone count and
    /// the same parent for every bone. Playback state can be copied between
    /// instances whose skeletons share a layout.
    #[must_use]
    pub fn same_layout(&self, other: &SkeletonDef) -> bool {
        self.bones.len() == other.bones.len()
            && self
                .bones
                .iter()
                .zip(&other.bones)
                .all(|(a, b)| a.parent == b.parent)
    }

    /// Model-space bind matrices, composed through the hierarchy.
    #[must_use]
    pub fn bind_matrices(&self) -> Vec<Affine3A> {
        let mut out: Vec<Affine3A> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let local = bone.bind_pose.to_affine();
            let world = match bone.parent {
                Some(p) => out[p] * local,
                None => local,
            };
            out.push(world);
        }
        out
    }

    fn validate(&self) -> Result<()> {
        for (i, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent
                && parent >= i
            {
                return Err(ModelError::InitializationFailure(format!(
                    "bone {i} ('{}') has parent {parent}, parents must precede children",
                    bone.name
                )));
            }
        }
        Ok(())
    }
}

/// Named location on a mesh where another model can be attached.
#[derive(Debug, Clone)]
pub struct PropPoint {
    pub name: String,
    /// Bone the point rides on; `None` attaches to the model's own transform.
    pub bone: Option<usize>,
    /// Offset relative to the bone (or model) frame.
    pub transform: Affine3A,
}

impl PropPoint {
    #[must_use]
    pub fn new(name: &str, bone: Option<usize>, transform: Affine3A) -> Self {
        Self {
            name: name.to_string(),
            bone,
            transform,
        }
    }
}

/// Bone indices and weights of one skinned vertex. Unused slots carry weight 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBlend {
    pub bones: [u8; MAX_BONE_INFLUENCES],
    pub weights: [f32; MAX_BONE_INFLUENCES],
}

impl VertexBlend {
    /// A vertex driven entirely by one bone.
    #[must_use]
    pub fn single(bone: u8) -> Self {
        Self {
            bones: [bone, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Iterator over the influences with a non-zero weight.
    pub fn influences(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.bones
            .iter()
            .zip(self.weights)
            .filter(|(_, w)| *w > 0.0)
            .map(|(b, w)| (usize::from(*b), w))
    }
}

/// Immutable mesh data shared across model instances.
#[derive(Debug, Clone)]
pub struct GeometryDefinition {
    pub id: Uuid,
    pub name: String,

    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,

    /// Per-vertex skinning data; empty for static meshes.
    blends: Vec<VertexBlend>,
    skeleton: Option<SkeletonDef>,
    prop_points: Vec<PropPoint>,
}

impl GeometryDefinition {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            blends: Vec::new(),
            skeleton: None,
            prop_points: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_vertices(mut self, positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>) -> Self {
        self.positions = positions;
        self.normals = normals;
        self.uvs = uvs;
        self
    }

    #[must_use]
    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    #[must_use]
    pub fn with_skeleton(mut self, skeleton: SkeletonDef, blends: Vec<VertexBlend>) -> Self {
        self.skeleton = Some(skeleton);
        self.blends = blends;
        self
    }

    #[must_use]
    pub fn with_prop_point(mut self, point: PropPoint) -> Self {
        self.prop_points.push(point);
        self
    }

    // === Accessors ===

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn blends(&self) -> &[VertexBlend] {
        &self.blends
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn skeleton(&self) -> Option<&SkeletonDef> {
        self.skeleton.as_ref()
    }

    #[inline]
    pub fn has_skeleton(&self) -> bool {
        self.skeleton.is_some()
    }

    pub fn bone_count(&self) -> usize {
        self.skeleton.as_ref().map_or(0, SkeletonDef::bone_count)
    }

    #[inline]
    pub fn prop_points(&self) -> &[PropPoint] {
        &self.prop_points
    }

    pub fn find_prop_point(&self, name: &str) -> Option<usize> {
        self.prop_points.iter().position(|p| p.name == name)
    }

    /// Bound of the raw (bind-pose) vertex positions.
    pub fn rest_bound(&self) -> BoundingBox {
        BoundingBox::from_points(self.positions.iter().copied())
    }

    /// Checks every structural requirement a model instance relies on.
    pub fn validate(&self, blend_weight_tolerance: f32) -> Result<()> {
        let fail = |msg: String| Err(ModelError::InitializationFailure(format!("'{}': {msg}", self.name)));
        let vertex_count = self.positions.len();

        if self.normals.len() != vertex_count {
            return fail(format!("{} normals for {vertex_count} vertices", self.normals.len()));
        }
        if self.uvs.len() != vertex_count {
            return fail(format!("{} uvs for {vertex_count} vertices", self.uvs.len()));
        }
        if self.indices.len() % 3 != 0 {
            return fail(format!("index count {} is not a multiple of 3", self.indices.len()));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return fail(format!("index {bad} out of range for {vertex_count} vertices"));
        }

        let bone_count = self.bone_count();
        if let Some(skeleton) = &self.skeleton {
            skeleton.validate()?;

            if self.blends.len() != vertex_count {
                return fail(format!("{} blends for {vertex_count} vertices", self.blends.len()));
            }
            for (v, blend) in self.blends.iter().enumerate() {
                let mut sum = 0.0;
                for (&bone, &weight) in blend.bones.iter().zip(&blend.weights) {
                    if weight < 0.0 {
                        return fail(format!("vertex {v} has negative blend weight"));
                    }
                    if weight > 0.0 && usize::from(bone) >= bone_count {
                        return fail(format!(
                            "vertex {v} references bone {bone}, skeleton has {bone_count}"
                        ));
                    }
                    sum += weight;
                }
                if (sum - 1.0).abs() > blend_weight_tolerance {
                    return fail(format!("vertex {v} blend weights sum to {sum}"));
                }
            }
        } else if !self.blends.is_empty() {
            return fail("blend data without a skeleton".to_string());
        }

        for point in &self.prop_points {
            if let Some(bone) = point.bone
                && bone >= bone_count
            {
                return fail(format!(
                    "prop point '{}' references bone {bone}, skeleton has {bone_count}",
                    point.name
                ));
            }
        }

        Ok(())
    }
}
