//!
//! Base types, traits and utils.
//!

use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasher;
use thiserror::Error;

use crate::target::PropertyId;

/// Animation error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// An animation or clip with the same id already exists.
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    /// No clip with this id exists.
    #[error("Unknown clip: {0}")]
    UnknownClip(String),
    /// The target doesn't support the property.
    #[error("Unsupported property: {0:?}")]
    UnsupportedProperty(PropertyId),
    /// The property name can't be resolved.
    #[error("Unknown property: {0}")]
    UnknownProperty(String),
    /// Not enough keyframes.
    #[error("Invalid key count: {0}")]
    InvalidKeyCount(usize),
    /// Repeat count is neither a number nor `INDEFINITE`.
    #[error("Invalid repeat count: {0}")]
    InvalidRepeatCount(String),
    /// Clip table frame count is zero.
    #[error("Invalid frame count")]
    InvalidFrameCount,
    /// Input arrays don't match each other.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(&'static str),
    /// The animation owning a clip has been destroyed.
    #[error("Animation dropped")]
    AnimationDropped,
}

impl AnimationError {
    pub fn is_duplicate_id(&self) -> bool {
        matches!(self, AnimationError::DuplicateId(_))
    }

    pub fn is_unknown_clip(&self) -> bool {
        matches!(self, AnimationError::UnknownClip(_))
    }

    pub fn is_unsupported_property(&self) -> bool {
        matches!(self, AnimationError::UnsupportedProperty(_))
    }

    pub fn is_unknown_property(&self) -> bool {
        matches!(self, AnimationError::UnknownProperty(_))
    }

    pub fn is_invalid_key_count(&self) -> bool {
        matches!(self, AnimationError::InvalidKeyCount(_))
    }

    pub fn is_invalid_repeat_count(&self) -> bool {
        matches!(self, AnimationError::InvalidRepeatCount(_))
    }

    pub fn is_invalid_frame_count(&self) -> bool {
        matches!(self, AnimationError::InvalidFrameCount)
    }

    pub fn is_invalid_arguments(&self) -> bool {
        matches!(self, AnimationError::InvalidArguments(_))
    }

    pub fn is_animation_dropped(&self) -> bool {
        matches!(self, AnimationError::AnimationDropped)
    }
}

/// A hasher builder that creates `DefaultHasher` with default keys.
///
/// Keeps per-target bookkeeping iteration stable between runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicState;

impl DeterministicState {
    /// Creates a new `DeterministicState` that builds `DefaultHasher` with default keys.
    pub const fn new() -> DeterministicState {
        DeterministicState
    }
}

impl BuildHasher for DeterministicState {
    type Hasher = DefaultHasher;

    fn build_hasher(&self) -> DefaultHasher {
        DefaultHasher::default()
    }
}

/// Milliseconds, the time unit of animations and clips.
pub type Millis = u64;

/// Float comparison with an absolute tolerance.
#[inline]
pub(crate) fn f32_abs_diff_eq(a: f32, b: f32, diff: f32) -> bool {
    (a - b).abs() <= diff
}
