//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`ModelError`] covers every failure mode of the model
//! runtime:
//! - Geometry that cannot back a model instance
//! - Animation clips whose bone layout does not fit a skeleton
//! - Prop attachment errors (unknown points, cycles, double ownership)
//! - Stale or unknown model handles
//!
//! None of these are retryable: the same inputs always fail the same way, and
//! the caller decides whether to skip, log or substitute a default.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, ModelError>`.
//!
//! ```rust,ignore
//! use myth_actor::errors::{ModelError, Result};
//!
//! fn spawn(store: &mut ModelStore, geometry: Arc<GeometryDefinition>) -> Result<ModelHandle> {
//!     store.create(geometry)
//! }
//! ```

use thiserror::Error;

/// The main error type for the model runtime.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    // ========================================================================
    // Initialization Errors
    // ========================================================================
    /// The geometry is malformed or cannot back a model instance.
    ///
    /// The instance the geometry was offered to is left untouched.
    #[error("Model initialization failed: {0}")]
    InitializationFailure(String),

    /// An operation that needs bound geometry was called on an empty model.
    #[error("Model has not been initialized with geometry")]
    NotInitialized,

    // ========================================================================
    // Animation Errors
    // ========================================================================
    /// The clip's bone layout does not match the instance's skeleton.
    #[error("Animation '{clip}' is incompatible with the model skeleton: {reason}")]
    AnimationIncompatible {
        /// Name of the rejected clip
        clip: String,
        /// What did not match
        reason: String,
    },

    /// The clip cache has no keyframe data registered under this file name.
    #[error("Animation clip not found: {0}")]
    ClipNotFound(String),

    // ========================================================================
    // Attachment Errors
    // ========================================================================
    /// The parent geometry has no prop point with this name.
    #[error("Invalid attachment point: {0}")]
    InvalidAttachmentPoint(String),

    /// The child is the parent itself or one of its ancestors.
    #[error("Attaching this prop would create a cycle in the model tree")]
    AttachmentCycle,

    /// The child is already a prop of another model.
    #[error("Model is already attached to a parent")]
    AlreadyAttached,

    // ========================================================================
    // Handle Errors
    // ========================================================================
    /// The handle does not refer to a live model in the store.
    #[error("Model not found")]
    ModelNotFound,
}

impl ModelError {
    pub(crate) fn incompatible(clip: &str, reason: impl Into<String>) -> Self {
        ModelError::AnimationIncompatible {
            clip: clip.to_string(),
            reason: reason.into(),
        }
    }
}

/// Alias for `Result<T, ModelError>`.
pub type Result<T> = std::result::Result<T, ModelError>;
