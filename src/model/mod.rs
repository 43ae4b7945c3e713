//! Animated model instances and the attachment tree.
//!
//! - [`AnimatedModel`]: one skinned (or static) mesh instance with its own
//!   playback clock and cached transforms
//! - [`Prop`]: edge attaching a child model to a named point of its parent
//! - [`ModelStore`]: arena owning every model; tree operations live here
//! - [`AnimationControl`]: playback capability handed to higher-level controllers

pub mod control;
pub mod model;
pub mod playback;
pub mod prop;
pub mod store;

pub use control::{AnimationControl, PlaybackAccess};
pub use model::{AnimatedModel, ModelFlags};
pub use playback::Playback;
pub use prop::{Prop, TemplateId};
pub use store::ModelStore;

use slotmap::new_key_type;

new_key_type! {
    /// Handle of a model inside a [`ModelStore`].
    pub struct ModelHandle;
}
