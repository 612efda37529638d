//!
//! Declarative animation descriptions.
//!

use crate::base::Millis;
use crate::clip::RepeatCount;

/// A named clip of a clip table, in frames.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClipDesc {
    pub id: String,
    pub begin: u32,
    pub end: u32,
    pub repeat_count: Option<RepeatCount>,
    pub speed: Option<f32>,
    pub loop_blend_time: Option<Millis>,
}

/// Frame based clip definitions of one animation.
///
/// Frame `f` maps to `f / frame_count` of the animation duration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ClipTable {
    pub frame_count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub clips: Vec<ClipDesc>,
}

/// Keyframes and playback settings of a single property animation.
///
/// `property` and `curve` use the names accepted by `PropertyId::from_name` and
/// `Interpolation::from_name`. `key_in` and `key_out` are either both empty or laid out like
/// `key_values`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AnimationDesc {
    pub property: String,
    pub key_count: usize,
    pub key_times: Vec<Millis>,
    pub key_values: Vec<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub key_in: Vec<f32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub key_out: Vec<f32>,
    pub curve: Option<String>,
    pub repeat_count: Option<RepeatCount>,
    pub clips: Option<ClipTable>,
}
