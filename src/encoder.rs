//!
//! Offline optimization of baked animation channels.
//!

use log::{debug, info, trace, warn};
use std::fmt;
use std::rc::Rc;

use crate::animation::{Animation, ChannelKeys};
use crate::base::{AnimationError, Millis};
use crate::controller::AnimationController;
use crate::interpolation::Interpolation;
use crate::target::{PropertyId, TargetRef};

/// Tolerance of the identity tests.
pub const EPSILON: f32 = 1.2e-7;

const SRT_COMPONENTS: usize = 10;

#[inline]
fn is_almost_one(value: f32) -> bool {
    (value - 1.0).abs() < EPSILON
}

#[inline]
fn is_almost_zero(value: f32) -> bool {
    value.abs() < EPSILON
}

/// Leveled logger of the encoder pass.
///
/// Messages at or below `verbosity` are forwarded to `log`: level 1 as info, level 2 as
/// debug, deeper levels as trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderLog {
    verbosity: u8,
}

impl EncoderLog {
    pub fn new(verbosity: u8) -> EncoderLog {
        EncoderLog { verbosity }
    }

    #[inline]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    #[inline]
    pub fn enabled(&self, level: u8) -> bool {
        level <= self.verbosity
    }

    pub fn log(&self, level: u8, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        match level {
            0 | 1 => info!("{}", args),
            2 => debug!("{}", args),
            _ => trace!("{}", args),
        }
    }
}

/// A baked channel as read from an asset.
///
/// Key times are in milliseconds. Tangents are either empty or laid out like the key values.
/// Interpolations are either empty (all linear), a single one, or one per key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "rkyv", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationChannel {
    pub target_id: String,
    pub target_attribute: PropertyId,
    pub key_times: Vec<f32>,
    pub key_values: Vec<f32>,
    pub tangents_in: Vec<f32>,
    pub tangents_out: Vec<f32>,
    pub interpolations: Vec<Interpolation>,
}

impl AnimationChannel {
    pub fn new(target_id: &str, target_attribute: PropertyId) -> AnimationChannel {
        AnimationChannel {
            target_id: target_id.to_string(),
            target_attribute,
            key_times: Vec::new(),
            key_values: Vec::new(),
            tangents_in: Vec::new(),
            tangents_out: Vec::new(),
            interpolations: Vec::new(),
        }
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.key_times.len()
    }

    /// Floats per key, 0 without keys.
    pub fn component_count(&self) -> usize {
        match self.key_count() {
            0 => 0,
            count => self.key_values.len() / count,
        }
    }

    fn is_linear(&self) -> bool {
        self.interpolations.iter().all(|i| *i == Interpolation::Linear)
    }

    fn same_value(&self, a: usize, b: usize) -> bool {
        let cc = self.component_count();
        self.key_values[a * cc..(a + 1) * cc] == self.key_values[b * cc..(b + 1) * cc]
    }

    /// Collapses runs of 3 or more identical linear keys to the first and last key of the run.
    ///
    /// The removed keys lie on a flat segment, so the curve is unchanged.
    pub fn remove_duplicates(&mut self) {
        let key_count = self.key_count();
        if key_count < 3 || self.component_count() == 0 || !self.is_linear() {
            return;
        }

        let mut keep = Vec::with_capacity(key_count);
        let mut run_start = 0;
        for i in 1..=key_count {
            if i == key_count || !self.same_value(run_start, i) {
                keep.push(run_start);
                if i - 1 > run_start {
                    keep.push(i - 1);
                }
                run_start = i;
            }
        }
        if keep.len() < key_count {
            self.retain_keys(&keep);
        }
    }

    fn retain_keys(&mut self, keep: &[usize]) {
        let cc = self.component_count();
        let key_count = self.key_count();
        let pick = |src: &[f32]| -> Vec<f32> {
            keep.iter()
                .flat_map(|k| src[k * cc..(k + 1) * cc].iter().copied())
                .collect()
        };

        self.key_values = pick(&self.key_values);
        if self.tangents_in.len() == key_count * cc {
            self.tangents_in = pick(&self.tangents_in);
        }
        if self.tangents_out.len() == key_count * cc {
            self.tangents_out = pick(&self.tangents_out);
        }
        if self.interpolations.len() == key_count {
            self.interpolations = keep.iter().map(|k| self.interpolations[*k]).collect();
        }
        self.key_times = keep.iter().map(|k| self.key_times[*k]).collect();
    }

    // Same keys and target, different attribute and values.
    fn derive(&self, attribute: PropertyId, values: Vec<f32>, tangents: (Vec<f32>, Vec<f32>)) -> AnimationChannel {
        AnimationChannel {
            target_id: self.target_id.clone(),
            target_attribute: attribute,
            key_times: self.key_times.clone(),
            key_values: values,
            tangents_in: tangents.0,
            tangents_out: tangents.1,
            interpolations: self.interpolations.clone(),
        }
    }
}

/// A baked animation, a list of channels sharing an id.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "rkyv", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodedAnimation {
    pub id: String,
    pub channels: Vec<AnimationChannel>,
}

impl EncodedAnimation {
    pub fn new(id: &str) -> EncodedAnimation {
        EncodedAnimation {
            id: id.to_string(),
            channels: Vec::new(),
        }
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Creates the runtime animation of these channels.
    ///
    /// `resolve` maps target ids to targets. Channels of unknown targets are skipped with a
    /// warning. Missing tangents are zero, missing interpolations linear.
    pub fn instantiate<F>(&self, controller: &AnimationController, mut resolve: F) -> Result<Rc<Animation>, AnimationError>
    where
        F: FnMut(&str) -> Option<TargetRef>,
    {
        let animation = controller.new_animation(&self.id)?;
        for channel in &self.channels {
            let Some(target) = resolve(&channel.target_id) else {
                warn!("Animation {}: no target named {}", self.id, channel.target_id);
                continue;
            };

            let times: Vec<Millis> = channel.key_times.iter().map(|t| t.max(0.0).round() as Millis).collect();
            let interpolations: &[Interpolation] = if channel.interpolations.is_empty() {
                &[Interpolation::Linear]
            } else {
                &channel.interpolations
            };
            let tangents = if channel.tangents_in.is_empty() && channel.tangents_out.is_empty() {
                None
            } else {
                Some((channel.tangents_in.as_slice(), channel.tangents_out.as_slice()))
            };

            animation.create_channel_keys(
                &target,
                channel.target_attribute,
                ChannelKeys {
                    times: &times,
                    values: &channel.key_values,
                    tangents,
                    interpolations,
                },
            )?;
        }
        controller.register_animation(animation.clone());
        Ok(animation)
    }
}

// Splits interleaved scale, rotation, translation keys.
fn deinterleave(values: &[f32]) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let key_count = values.len() / SRT_COMPONENTS;
    let mut scale = Vec::with_capacity(key_count * 3);
    let mut rotate = Vec::with_capacity(key_count * 4);
    let mut translate = Vec::with_capacity(key_count * 3);
    for key in values.chunks_exact(SRT_COMPONENTS) {
        scale.extend_from_slice(&key[0..3]);
        rotate.extend_from_slice(&key[3..7]);
        translate.extend_from_slice(&key[7..10]);
    }
    (scale, rotate, translate)
}

/// Splits a scale, rotation, translation channel into separate channels.
///
/// A channel is dropped when all its keys are identity: scale 1, rotation (0, 0, 0, 1),
/// translation 0. Kept channels have their duplicate keys removed.
pub fn decompose_transform_channel(channel: &AnimationChannel, log: &EncoderLog) -> Vec<AnimationChannel> {
    let key_count = channel.key_count();
    if key_count == 0 {
        warn!("Channel of {} has no keys, dropping it", channel.target_id);
        return Vec::new();
    }
    if channel.key_values.len() != key_count * SRT_COMPONENTS {
        warn!(
            "Channel of {} doesn't hold {} floats per key, keeping it as is",
            channel.target_id, SRT_COMPONENTS
        );
        return vec![channel.clone()];
    }

    let (scale, rotate, translate) = deinterleave(&channel.key_values);
    let has_tangents = channel.tangents_in.len() == channel.key_values.len()
        && channel.tangents_out.len() == channel.key_values.len();
    let (tangents_in, tangents_out) = if has_tangents {
        (deinterleave(&channel.tangents_in), deinterleave(&channel.tangents_out))
    } else {
        Default::default()
    };

    let mut channels = Vec::with_capacity(3);

    if scale.iter().all(|v| is_almost_one(*v)) {
        log.log(2, format_args!("    Discarding scale channel."));
    } else {
        log.log(3, format_args!("    Keeping scale channel."));
        let mut scale_channel = channel.derive(PropertyId::Scale, scale, (tangents_in.0, tangents_out.0));
        scale_channel.remove_duplicates();
        channels.push(scale_channel);
    }

    let identity = |q: &[f32]| is_almost_zero(q[0]) && is_almost_zero(q[1]) && is_almost_zero(q[2]) && is_almost_one(q[3]);
    if rotate.chunks_exact(4).all(identity) {
        log.log(2, format_args!("    Discarding rotation channel."));
    } else {
        log.log(3, format_args!("    Keeping rotation channel."));
        let mut rotate_channel = channel.derive(PropertyId::Rotate, rotate, (tangents_in.1, tangents_out.1));
        rotate_channel.remove_duplicates();
        channels.push(rotate_channel);
    }

    if translate.iter().all(|v| is_almost_zero(*v)) {
        log.log(2, format_args!("    Discarding translation channel."));
    } else {
        log.log(3, format_args!("    Keeping translation channel."));
        let mut translate_channel = channel.derive(PropertyId::Translate, translate, (tangents_in.2, tangents_out.2));
        translate_channel.remove_duplicates();
        channels.push(translate_channel);
    }

    channels
}

/// Decomposes every scale, rotation, translation channel targeting a node.
///
/// Decomposed channels replace their source channel at the end of the channel list.
pub fn optimize_animations<F>(animations: &mut [EncodedAnimation], is_node: F, log: &EncoderLog)
where
    F: Fn(&str) -> bool,
{
    log.log(1, format_args!("Optimizing animations."));
    for animation in animations.iter_mut() {
        let channel_count = animation.channels.len();
        log.log(
            2,
            format_args!("Optimizing {} channel(s) in animation '{}'.", channel_count, animation.id),
        );

        // Backwards, decomposed channels are appended.
        for index in (0..channel_count).rev() {
            let channel = &animation.channels[index];
            if channel.target_attribute != PropertyId::ScaleRotateTranslate || !is_node(&channel.target_id) {
                continue;
            }
            log.log(
                2,
                format_args!("  Optimizing animation channel {}:{}.", animation.id, index + 1),
            );
            let channel = animation.channels.remove(index);
            let decomposed = decompose_transform_channel(&channel, log);
            animation.channels.extend(decomposed);
        }
    }
}

/// Moves the channels targeting the joints of a skin into one animation named `animations`.
///
/// Animations left without channels are removed. A skin without joints is skipped with a
/// warning.
pub fn group_skin_channels(animations: &mut Vec<EncodedAnimation>, joints: &[&str], log: &EncoderLog) {
    if joints.is_empty() {
        warn!("Skin has no joints, not grouping its animations");
        return;
    }

    let mut grouped = EncodedAnimation::new("animations");
    for i in (0..animations.len()).rev() {
        let animation = &mut animations[i];
        for j in (0..animation.channels.len()).rev() {
            if joints.contains(&animation.channels[j].target_id.as_str()) {
                grouped.channels.push(animation.channels.remove(j));
            }
        }
        if animation.channels.is_empty() {
            animations.remove(i);
        }
    }

    if grouped.channels.is_empty() {
        return;
    }
    grouped.channels.reverse();
    log.log(
        2,
        format_args!("Grouped {} channel(s) of {} joint(s).", grouped.channels.len(), joints.len()),
    );
    animations.push(grouped);
}
