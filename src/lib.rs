mod animation;
mod base;
mod clip;
mod controller;
mod curve;
mod description;
mod encoder;
mod interpolation;
mod target;
mod transform;
mod value;

pub mod test_utils;

pub use animation::{Animation, Channel, DEFAULT_CLIP_ID};
pub use base::*;
pub use clip::{AnimationClip, ClipEvent, ClipListener, ClipListenerRef, RepeatCount};
pub use controller::{AnimationController, ControllerState};
pub use curve::Curve;
pub use description::{AnimationDesc, ClipDesc, ClipTable};
pub use encoder::{
    decompose_transform_channel, group_skin_channels, optimize_animations, AnimationChannel, EncodedAnimation,
    EncoderLog, EPSILON,
};
pub use interpolation::Interpolation;
pub use target::{
    convert_by_values, destroy_target_animation, target_animation, AnimationTarget, PropertyId, TargetRef,
    TargetState, TargetType,
};
pub use transform::{Transform, UniformTarget};
pub use value::AnimationValue;
