//! Shared resource definitions
//!
//! Data the model runtime consumes but never owns exclusively:
//! - GeometryDefinition: immutable mesh, skeleton and prop points
//! - BoundingBox: axis-aligned bounds used for object and world bounds
//! - TextureHandle / MaterialHandle: opaque keys issued by the renderer's
//!   resource managers

pub mod bounds;
pub mod geometry;

pub use bounds::BoundingBox;
pub use geometry::{
    Bone, BonePose, GeometryDefinition, MAX_BONE_INFLUENCES, PropPoint, SkeletonDef, VertexBlend,
};

use slotmap::new_key_type;

new_key_type! {
    pub struct TextureHandle;
    pub struct MaterialHandle;
}
