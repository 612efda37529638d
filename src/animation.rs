//!
//! Animation data structure.
//!

use log::warn;
use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::base::{AnimationError, Millis};
use crate::clip::AnimationClip;
use crate::controller::ControllerInner;
use crate::curve::Curve;
use crate::description::ClipTable;
use crate::interpolation::Interpolation;
use crate::target::{PropertyId, TargetRef, TargetType};

/// Id of the clip spanning a whole animation.
pub const DEFAULT_CLIP_ID: &str = "default_clip";

/// One animated property of one target.
#[derive(Debug)]
pub struct Channel {
    target: TargetRef,
    property: PropertyId,
    curve: Curve,
    duration: Millis,
}

impl Channel {
    #[inline]
    pub fn target(&self) -> &TargetRef {
        &self.target
    }

    #[inline]
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// The channel curve, normalized to `[0, 1]`.
    #[inline]
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    /// Time between the first and the last key.
    #[inline]
    pub fn duration(&self) -> Millis {
        self.duration
    }
}

/// Raw keyframes of a channel.
pub(crate) struct ChannelKeys<'t> {
    pub(crate) times: &'t [Millis],
    pub(crate) values: &'t [f32],
    pub(crate) tangents: Option<(&'t [f32], &'t [f32])>,
    /// One interpolation for all keys, or one per key.
    pub(crate) interpolations: &'t [Interpolation],
}

/// A set of channels animating targets over a shared duration.
///
/// Animations are created by an `AnimationController`, and played through their clips.
#[derive(Debug)]
pub struct Animation {
    id: String,
    me: Weak<Animation>,
    controller: Weak<RefCell<ControllerInner>>,
    duration: Cell<Millis>,
    channels: RefCell<Vec<Channel>>,
    // Bumped on every channel change, clips rebind when it moves.
    generation: Cell<u64>,
    clips: RefCell<Vec<Rc<AnimationClip>>>,
    default_clip: RefCell<Option<Rc<AnimationClip>>>,
}

impl Animation {
    pub(crate) fn new(id: &str, controller: Weak<RefCell<ControllerInner>>) -> Rc<Animation> {
        Rc::new_cyclic(|me| Animation {
            id: id.to_string(),
            me: me.clone(),
            controller,
            duration: Cell::new(0),
            channels: RefCell::new(Vec::new()),
            generation: Cell::new(0),
            clips: RefCell::new(Vec::new()),
            default_clip: RefCell::new(None),
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The longest channel duration.
    #[inline]
    pub fn duration(&self) -> Millis {
        self.duration.get()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.borrow().len()
    }

    pub fn channels(&self) -> Ref<'_, [Channel]> {
        Ref::map(self.channels.borrow(), |channels| channels.as_slice())
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn controller(&self) -> Option<Rc<RefCell<ControllerInner>>> {
        self.controller.upgrade()
    }

    /// Adds a channel animating `property` of `target`.
    ///
    /// `key_times` must ascend, `key_values` holds `key_times.len()` values of the property
    /// one after another.
    pub fn create_channel(
        &self,
        target: &TargetRef,
        property: PropertyId,
        key_times: &[Millis],
        key_values: &[f32],
        interpolation: Interpolation,
    ) -> Result<(), AnimationError> {
        if interpolation.needs_tangents() {
            return Err(AnimationError::InvalidArguments("interpolation requires tangents"));
        }
        self.create_channel_keys(
            target,
            property,
            ChannelKeys {
                times: key_times,
                values: key_values,
                tangents: None,
                interpolations: &[interpolation],
            },
        )
    }

    /// Adds a channel with explicit in and out tangents, laid out like `key_values`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_channel_with_tangents(
        &self,
        target: &TargetRef,
        property: PropertyId,
        key_times: &[Millis],
        key_values: &[f32],
        key_in: &[f32],
        key_out: &[f32],
        interpolation: Interpolation,
    ) -> Result<(), AnimationError> {
        self.create_channel_keys(
            target,
            property,
            ChannelKeys {
                times: key_times,
                values: key_values,
                tangents: Some((key_in, key_out)),
                interpolations: &[interpolation],
            },
        )
    }

    pub(crate) fn create_channel_keys(
        &self,
        target: &TargetRef,
        property: PropertyId,
        keys: ChannelKeys<'_>,
    ) -> Result<(), AnimationError> {
        let key_count = keys.times.len();
        if key_count == 0 {
            return Err(AnimationError::InvalidKeyCount(0));
        }

        let (target_type, component_count) = {
            let target = target.borrow();
            (target.target_type(), target.property_component_count(property))
        };
        let Some(component_count) = component_count else {
            warn!("Animation {}: target doesn't support property {:?}", self.id, property);
            return Err(AnimationError::UnsupportedProperty(property));
        };

        if keys.values.len() != key_count * component_count {
            return Err(AnimationError::InvalidArguments("key value count doesn't match key count"));
        }
        if let Some((key_in, key_out)) = keys.tangents {
            if key_in.len() != keys.values.len() || key_out.len() != keys.values.len() {
                return Err(AnimationError::InvalidArguments("tangent count doesn't match key values"));
            }
        }
        if keys.interpolations.len() != 1 && keys.interpolations.len() != key_count {
            return Err(AnimationError::InvalidArguments("interpolation count doesn't match key count"));
        }
        if keys.times.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(AnimationError::InvalidArguments("key times must ascend"));
        }

        let mut curve = Curve::new(key_count, component_count);
        if target_type == TargetType::Transform {
            if let Some(offset) = property.quaternion_offset() {
                curve.set_quaternion_offset(offset);
            }
        }

        let first = keys.times[0];
        let duration = keys.times[key_count - 1] - first;
        for i in 0..key_count {
            // End points are pinned to avoid rounding away from 0 and 1.
            let time = if i == 0 {
                0.0
            } else if i == key_count - 1 {
                1.0
            } else if duration == 0 {
                0.0
            } else {
                ((keys.times[i] - first) as f64 / duration as f64) as f32
            };
            let interpolation = match keys.interpolations {
                [interpolation] => *interpolation,
                interpolations => interpolations[i],
            };
            let range = i * component_count..(i + 1) * component_count;
            match keys.tangents {
                Some((key_in, key_out)) => curve.set_point_with_tangents(
                    i,
                    time,
                    &keys.values[range.clone()],
                    interpolation,
                    &key_in[range.clone()],
                    &key_out[range],
                ),
                None => curve.set_point(i, time, &keys.values[range], interpolation),
            }
        }

        self.channels.borrow_mut().push(Channel {
            target: target.clone(),
            property,
            curve,
            duration,
        });
        self.generation.set(self.generation.get() + 1);
        if duration > self.duration.get() {
            self.duration.set(duration);
        }
        if let Some(me) = self.me.upgrade() {
            target.borrow_mut().animation_state_mut().add_animation(&me);
        }
        Ok(())
    }

    /// Whether any channel animates `target`.
    pub fn targets(&self, target: &TargetRef) -> bool {
        self.channels.borrow().iter().any(|channel| Rc::ptr_eq(&channel.target, target))
    }

    /// Drops every channel animating `target`.
    pub fn remove_channels_for(&self, target: &TargetRef) {
        let mut channels = self.channels.borrow_mut();
        let count = channels.len();
        channels.retain(|channel| !Rc::ptr_eq(&channel.target, target));
        if channels.len() != count {
            self.generation.set(self.generation.get() + 1);
        }
    }

    /// Creates a clip playing `[start_time, end_time]` of the animation.
    pub fn create_clip(&self, id: &str, start_time: Millis, end_time: Millis) -> Result<Rc<AnimationClip>, AnimationError> {
        if self.find_clip(id).is_some() {
            return Err(AnimationError::DuplicateId(id.to_string()));
        }
        if start_time > end_time || end_time > self.duration() {
            return Err(AnimationError::InvalidArguments("clip range must lie within the animation"));
        }
        let me = self.me.upgrade().ok_or(AnimationError::AnimationDropped)?;
        let clip = AnimationClip::new(id, &me, start_time, end_time);
        self.clips.borrow_mut().push(clip.clone());
        Ok(clip)
    }

    /// Creates the clips of a frame based clip table.
    ///
    /// Frame `f` maps to `f / frame_count * duration` milliseconds.
    pub fn create_clips(&self, table: &ClipTable) -> Result<(), AnimationError> {
        if table.frame_count == 0 {
            return Err(AnimationError::InvalidFrameCount);
        }
        let duration = self.duration();
        let to_millis = |frame: u32| -> Millis {
            let millis = (frame as f64 / table.frame_count as f64 * duration as f64).round() as Millis;
            millis.min(duration)
        };

        for desc in &table.clips {
            let clip = self.create_clip(&desc.id, to_millis(desc.begin), to_millis(desc.end))?;
            if let Some(speed) = desc.speed {
                clip.set_speed(speed);
            }
            if let Some(loop_blend_time) = desc.loop_blend_time {
                clip.set_loop_blend_time(loop_blend_time);
            }
            if let Some(repeat_count) = desc.repeat_count {
                clip.set_repeat_count(repeat_count);
            }
        }
        Ok(())
    }

    fn find_clip(&self, id: &str) -> Option<Rc<AnimationClip>> {
        self.clips.borrow().iter().find(|clip| clip.id() == id).cloned()
    }

    /// The clip spanning the whole animation, created on first use.
    pub fn default_clip(&self) -> Option<Rc<AnimationClip>> {
        let mut default_clip = self.default_clip.borrow_mut();
        if default_clip.is_none() {
            let me = self.me.upgrade()?;
            *default_clip = Some(AnimationClip::new(DEFAULT_CLIP_ID, &me, 0, self.duration()));
        }
        default_clip.clone()
    }

    /// Finds a clip by id, `None` selects the default clip.
    pub fn clip(&self, id: Option<&str>) -> Option<Rc<AnimationClip>> {
        match id {
            Some(id) => self.find_clip(id),
            None => self.default_clip(),
        }
    }

    pub fn clip_at(&self, index: usize) -> Option<Rc<AnimationClip>> {
        self.clips.borrow().get(index).cloned()
    }

    /// Number of named clips, the default clip excluded.
    pub fn clip_count(&self) -> usize {
        self.clips.borrow().len()
    }

    fn clip_or_err(&self, id: Option<&str>) -> Result<Rc<AnimationClip>, AnimationError> {
        self.clip(id)
            .ok_or_else(|| AnimationError::UnknownClip(id.unwrap_or(DEFAULT_CLIP_ID).to_string()))
    }

    /// Plays a clip by id, `None` plays the default clip.
    pub fn play(&self, id: Option<&str>) -> Result<(), AnimationError> {
        self.clip_or_err(id)?.play()
    }

    pub fn stop(&self, id: Option<&str>) -> Result<(), AnimationError> {
        self.clip_or_err(id)?.stop();
        Ok(())
    }

    pub fn pause(&self, id: Option<&str>) -> Result<(), AnimationError> {
        self.clip_or_err(id)?.pause();
        Ok(())
    }

    /// Stops every clip of the animation.
    pub(crate) fn stop_clips(&self) {
        let mut clips = self.clips.borrow().clone();
        clips.extend(self.default_clip.borrow().iter().cloned());
        for clip in clips {
            clip.stop();
        }
    }
}
