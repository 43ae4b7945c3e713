mod values;
pub mod tracks;
pub mod clip;
pub mod cache;

pub use values::Interpolatable;
pub use tracks::{InterpolationMode, KeyframeTrack};
pub use clip::{AnimationClip, AnimationData, BoneTrack};
pub use cache::ClipCache;
