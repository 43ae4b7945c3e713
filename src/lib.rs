pub mod errors;
pub mod settings;
pub mod resources;
pub mod animation;
pub mod skinning;
pub mod model;
pub mod unit_animation;

pub use errors::{ModelError, Result};
pub use settings::{DEFAULT_ANIM_SPEED, ModelSettings};
pub use resources::{
    Bone, BonePose, BoundingBox, GeometryDefinition, MaterialHandle, PropPoint, SkeletonDef, TextureHandle,
    VertexBlend,
};
pub use animation::{AnimationClip, AnimationData, BoneTrack, ClipCache, InterpolationMode, KeyframeTrack};
pub use skinning::BoneMatrixSet;
pub use model::{
    AnimatedModel, AnimationControl, ModelFlags, ModelHandle, ModelStore, PlaybackAccess, Prop, TemplateId,
};
pub use unit_animation::UnitAnimation;
