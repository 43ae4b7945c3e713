//! Model Runtime Settings
//!
//! Tunables shared by every model instance created through a
//! [`ModelStore`](crate::model::ModelStore).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myth_actor::{ModelSettings, ModelStore};
//!
//! // Default: real-time playback at 1000.0, bounds swept at 30 fps
//! let store = ModelStore::new();
//!
//! // Coarser bound sweeps for large crowds
//! let store = ModelStore::with_settings(ModelSettings {
//!     bound_sample_interval_ms: 100.0,
//!     ..Default::default()
//! });
//! ```

/// Playback rate at which one millisecond of update time advances the
/// animation clock by one millisecond.
pub const DEFAULT_ANIM_SPEED: f32 = 1000.0;

/// Configuration for model initialization and bound computation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelSettings {
    /// Rate that maps update time 1:1 onto animation time.
    ///
    /// Speeds handed to `set_animation` are expressed on this scale.
    pub default_anim_speed: f32,

    /// Sample spacing (ms) used when sweeping a clip for its object bound,
    /// for clips that do not carry their own frame time.
    pub bound_sample_interval_ms: f32,

    /// Maximum deviation from 1.0 accepted for a vertex's blend weight sum.
    pub blend_weight_tolerance: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_anim_speed: DEFAULT_ANIM_SPEED,
            bound_sample_interval_ms: 1000.0 / 30.0,
            blend_weight_tolerance: 0.01,
        }
    }
}
