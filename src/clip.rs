//!
//! Animation clip playback.
//!

use glam::Quat;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use crate::animation::{Animation, Channel};
use crate::base::{AnimationError, Millis};
use crate::controller::ControllerInner;
use crate::curve::{interpolate_quaternion, Curve};
use crate::target::{DriverId, PropertyId, TargetRef};
use crate::value::AnimationValue;

/// How many times a clip plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepeatCount {
    /// A positive, possibly fractional, repeat count.
    Count(f32),
    /// Loops until stopped.
    Indefinite,
}

impl Default for RepeatCount {
    fn default() -> RepeatCount {
        RepeatCount::Count(1.0)
    }
}

impl RepeatCount {
    /// Checked constructor of `RepeatCount::Count`.
    pub fn count(count: f32) -> Result<RepeatCount, AnimationError> {
        if count.is_finite() && count > 0.0 {
            Ok(RepeatCount::Count(count))
        } else {
            Err(AnimationError::InvalidRepeatCount(count.to_string()))
        }
    }
}

impl FromStr for RepeatCount {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<RepeatCount, AnimationError> {
        let s = s.trim();
        if s == "INDEFINITE" {
            return Ok(RepeatCount::Indefinite);
        }
        match s.parse::<f32>() {
            Ok(count) => RepeatCount::count(count).map_err(|_| AnimationError::InvalidRepeatCount(s.to_string())),
            Err(_) => Err(AnimationError::InvalidRepeatCount(s.to_string())),
        }
    }
}

impl fmt::Display for RepeatCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatCount::Count(count) => write!(f, "{}", count),
            RepeatCount::Indefinite => write!(f, "INDEFINITE"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RepeatCount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RepeatCount::Count(count) => serializer.serialize_f32(*count),
            RepeatCount::Indefinite => serializer.serialize_str("INDEFINITE"),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RepeatCount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<RepeatCount, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f32),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(count) => RepeatCount::count(count).map_err(serde::de::Error::custom),
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Kind of a clip event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClipEvent {
    Begin,
    End,
    /// A timed event registered with `AnimationClip::add_listener`.
    Default,
}

/// Receives clip events.
///
/// Listeners are called with no clip or controller state borrowed, so they may play, stop
/// or cross fade clips freely.
pub trait ClipListener {
    fn animation_event(&self, clip: &AnimationClip, event: ClipEvent);
}

impl<F> ClipListener for F
where
    F: Fn(&AnimationClip, ClipEvent),
{
    #[inline]
    fn animation_event(&self, clip: &AnimationClip, event: ClipEvent) {
        self(clip, event)
    }
}

/// Shared handle of a clip listener.
pub type ClipListenerRef = Rc<dyn ClipListener>;

#[inline]
fn same_listener(a: &ClipListenerRef, b: &ClipListenerRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const u8, Rc::as_ptr(b) as *const u8)
}

#[derive(Default)]
struct ClipListeners {
    begin: Vec<ClipListenerRef>,
    end: Vec<ClipListenerRef>,
    // Sorted by event time.
    timed: Vec<(Millis, ClipListenerRef)>,
}

#[derive(Debug)]
struct DrivenSlot {
    target: TargetRef,
    property: PropertyId,
    driver: DriverId,
    priority: u32,
}

#[derive(Debug)]
struct ClipState {
    repeat_count: RepeatCount,
    active_duration: Millis,
    speed: f32,
    blend_weight: f32,
    loop_blend_time: Millis,

    playing: bool,
    started: bool,
    paused: bool,
    time_started: Millis,
    elapsed_time: Millis,
    running_time: f64,

    fading_in: bool,
    fading_out: bool,
    fading_out_started: bool,
    cross_fade_to: Option<Rc<AnimationClip>>,
    cross_fade_duration: Millis,
    cross_fade_elapsed: f64,

    listener_cursor: usize,
    last_position: f64,

    values: Vec<AnimationValue>,
    channel_slots: Vec<usize>,
    driven: Vec<DrivenSlot>,
    bound_generation: u64,
    scratch: Vec<f32>,
}

impl ClipState {
    fn new(duration: Millis) -> ClipState {
        ClipState {
            repeat_count: RepeatCount::Count(1.0),
            active_duration: duration,
            speed: 1.0,
            blend_weight: 1.0,
            loop_blend_time: 0,
            playing: false,
            started: false,
            paused: false,
            time_started: 0,
            elapsed_time: 0,
            running_time: 0.0,
            fading_in: false,
            fading_out: false,
            fading_out_started: false,
            cross_fade_to: None,
            cross_fade_duration: 0,
            cross_fade_elapsed: 0.0,
            listener_cursor: 0,
            last_position: 0.0,
            values: Vec::new(),
            channel_slots: Vec::new(),
            driven: Vec::new(),
            bound_generation: 0,
            scratch: Vec::new(),
        }
    }
}

/// A playable time range of an animation.
///
/// A clip plays `[start_time, end_time]` of its animation `repeat_count` times at `speed`,
/// and composites the result into the targets with `blend_weight`. Playing clips are
/// ticked by the `AnimationController` that created the animation.
pub struct AnimationClip {
    id: String,
    me: Weak<AnimationClip>,
    animation: Weak<Animation>,
    start_time: Millis,
    end_time: Millis,
    duration: Millis,
    state: RefCell<ClipState>,
    listeners: RefCell<ClipListeners>,
}

impl fmt::Debug for AnimationClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationClip")
            .field("id", &self.id)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("playing", &self.is_playing())
            .finish()
    }
}

impl AnimationClip {
    pub(crate) fn new(id: &str, animation: &Rc<Animation>, start_time: Millis, end_time: Millis) -> Rc<AnimationClip> {
        assert!(start_time <= end_time, "clip ends before it starts");
        let duration = end_time - start_time;
        Rc::new_cyclic(|me| AnimationClip {
            id: id.to_string(),
            me: me.clone(),
            animation: Rc::downgrade(animation),
            start_time,
            end_time,
            duration,
            state: RefCell::new(ClipState::new(duration)),
            listeners: RefCell::new(ClipListeners::default()),
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn start_time(&self) -> Millis {
        self.start_time
    }

    #[inline]
    pub fn end_time(&self) -> Millis {
        self.end_time
    }

    /// Length of one repeat.
    #[inline]
    pub fn duration(&self) -> Millis {
        self.duration
    }

    /// The owning animation, `None` once it has been dropped.
    pub fn animation(&self) -> Option<Rc<Animation>> {
        self.animation.upgrade()
    }

    pub fn repeat_count(&self) -> RepeatCount {
        self.state.borrow().repeat_count
    }

    /// Sets the repeat count, and recomputes the active duration from it.
    pub fn set_repeat_count(&self, repeat_count: RepeatCount) {
        if let RepeatCount::Count(count) = repeat_count {
            assert!(count.is_finite() && count > 0.0, "repeat count must be positive");
        }
        let mut state = self.state.borrow_mut();
        state.repeat_count = repeat_count;
        state.active_duration = self.active_duration_for(repeat_count, state.loop_blend_time);
    }

    /// Total play time of all repeats.
    pub fn active_duration(&self) -> Millis {
        self.state.borrow().active_duration
    }

    /// Sets the total play time, and derives a finite repeat count from it.
    pub fn set_active_duration(&self, active_duration: Millis) {
        assert!(active_duration > 0, "active duration must be positive");
        let mut state = self.state.borrow_mut();
        let cycle = self.duration + state.loop_blend_time;
        state.active_duration = active_duration;
        state.repeat_count = match cycle {
            0 => RepeatCount::Count(1.0),
            cycle => RepeatCount::Count((active_duration as f64 / cycle as f64) as f32),
        };
    }

    fn active_duration_for(&self, repeat_count: RepeatCount, loop_blend_time: Millis) -> Millis {
        match repeat_count {
            RepeatCount::Indefinite => self.duration + loop_blend_time,
            RepeatCount::Count(count) => {
                let count = count as f64;
                let blends = (count - 1.0).max(0.0);
                (self.duration as f64 * count + loop_blend_time as f64 * blends).round() as Millis
            }
        }
    }

    pub fn speed(&self) -> f32 {
        self.state.borrow().speed
    }

    /// Sets the playback speed. Negative speeds play backwards.
    pub fn set_speed(&self, speed: f32) {
        assert!(speed.is_finite(), "speed must be finite");
        self.state.borrow_mut().speed = speed;
    }

    pub fn blend_weight(&self) -> f32 {
        self.state.borrow().blend_weight
    }

    pub fn set_blend_weight(&self, blend_weight: f32) {
        assert!((0.0..=1.0).contains(&blend_weight), "blend weight out of [0, 1]");
        self.state.borrow_mut().blend_weight = blend_weight;
    }

    pub fn loop_blend_time(&self) -> Millis {
        self.state.borrow().loop_blend_time
    }

    /// Sets the time spent blending from the last frame back to the first one between repeats.
    pub fn set_loop_blend_time(&self, loop_blend_time: Millis) {
        let mut state = self.state.borrow_mut();
        state.loop_blend_time = loop_blend_time;
        state.active_duration = self.active_duration_for(state.repeat_count, loop_blend_time);
    }

    /// Controller time at the last `play()`.
    pub fn time_started(&self) -> Millis {
        self.state.borrow().time_started
    }

    /// Wall clock time elapsed since the clip began.
    pub fn elapsed_time(&self) -> Millis {
        self.state.borrow().elapsed_time
    }

    /// Speed scaled time since the clip began, within `[0, active_duration]` while playing.
    pub fn running_time(&self) -> f64 {
        self.state.borrow().running_time
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state.borrow().paused
    }

    /// Whether the clip is fading out into another clip.
    pub fn is_cross_fading(&self) -> bool {
        self.state.borrow().fading_out
    }

    fn controller(&self) -> Result<Rc<RefCell<ControllerInner>>, AnimationError> {
        self.animation
            .upgrade()
            .and_then(|animation| animation.controller())
            .ok_or(AnimationError::AnimationDropped)
    }

    /// Starts playing the clip. Playing an already playing clip restarts it.
    pub fn play(&self) -> Result<(), AnimationError> {
        let controller = self.controller()?;
        let clip = self.me.upgrade().ok_or(AnimationError::AnimationDropped)?;

        if self.is_playing() {
            self.on_end();
        }

        let game_time = controller.borrow().game_time();
        {
            let mut state = self.state.borrow_mut();
            state.playing = true;
            state.paused = false;
            state.time_started = game_time;
        }
        controller.borrow_mut().schedule(clip);
        Ok(())
    }

    /// Stops the clip and releases the properties it drives.
    pub fn stop(&self) {
        if !self.is_playing() {
            return;
        }
        self.state.borrow_mut().playing = false;
        if let Ok(controller) = self.controller() {
            controller.borrow_mut().unschedule(self);
        }
        self.on_end();
    }

    /// Freezes the clip. A paused clip stays scheduled but doesn't advance.
    pub fn pause(&self) {
        let mut state = self.state.borrow_mut();
        if state.playing {
            state.paused = true;
        }
    }

    pub fn resume(&self) {
        let started = {
            let mut state = self.state.borrow_mut();
            if !state.paused {
                return;
            }
            state.paused = false;
            state.started
        };

        // Not begun yet, the first tick measures from now.
        if !started {
            if let Ok(controller) = self.controller() {
                let game_time = controller.borrow().game_time();
                self.state.borrow_mut().time_started = game_time;
            }
        }
    }

    /// Fades this clip out and `to` in over `duration`.
    ///
    /// `to` restarts with weight 0. Both clips are playing while the fade lasts, and this
    /// clip stops when it completes.
    pub fn cross_fade(&self, to: &Rc<AnimationClip>, duration: Millis) -> Result<(), AnimationError> {
        assert!(!std::ptr::eq(self, Rc::as_ptr(to)), "cannot cross fade a clip into itself");

        // `to` was fading out into this clip, cancel it.
        {
            let mut to_state = to.state.borrow_mut();
            let into_me = to_state
                .cross_fade_to
                .as_ref()
                .is_some_and(|clip| std::ptr::eq(Rc::as_ptr(clip), self));
            if to_state.fading_out && into_me {
                to_state.fading_out = false;
                to_state.fading_out_started = false;
                to_state.cross_fade_to = None;
                self.state.borrow_mut().fading_in = false;
            }
        }

        let previous = self.state.borrow_mut().cross_fade_to.take();
        if let Some(previous) = previous {
            previous.state.borrow_mut().fading_in = false;
        }

        // This clip ticks first, so `to` sees this tick's fade weight.
        if !self.is_playing() {
            self.play()?;
        }
        to.play()?;
        {
            let mut to_state = to.state.borrow_mut();
            to_state.blend_weight = 0.0;
            to_state.fading_in = true;
        }
        {
            let mut state = self.state.borrow_mut();
            state.cross_fade_to = Some(to.clone());
            state.cross_fade_duration = duration;
            state.cross_fade_elapsed = 0.0;
            state.fading_out = true;
            state.fading_out_started = true;
        }
        Ok(())
    }

    pub fn add_begin_listener(&self, listener: ClipListenerRef) {
        self.listeners.borrow_mut().begin.push(listener);
    }

    pub fn remove_begin_listener(&self, listener: &ClipListenerRef) {
        self.listeners.borrow_mut().begin.retain(|l| !same_listener(l, listener));
    }

    pub fn add_end_listener(&self, listener: ClipListenerRef) {
        self.listeners.borrow_mut().end.push(listener);
    }

    pub fn remove_end_listener(&self, listener: &ClipListenerRef) {
        self.listeners.borrow_mut().end.retain(|l| !same_listener(l, listener));
    }

    /// Registers a listener fired with `ClipEvent::Default` each time playback passes
    /// `event_time`, measured from the clip start.
    pub fn add_listener(&self, listener: ClipListenerRef, event_time: Millis) {
        assert!(event_time <= self.duration, "event time past the clip end");
        let mut listeners = self.listeners.borrow_mut();
        let index = listeners.timed.partition_point(|(time, _)| *time <= event_time);
        listeners.timed.insert(index, (event_time, listener));

        let mut state = self.state.borrow_mut();
        if state.started && index < state.listener_cursor {
            state.listener_cursor += 1;
        }
    }

    pub fn remove_listener(&self, listener: &ClipListenerRef, event_time: Millis) {
        let mut listeners = self.listeners.borrow_mut();
        let Some(index) = listeners
            .timed
            .iter()
            .position(|(time, l)| *time == event_time && same_listener(l, listener))
        else {
            return;
        };
        listeners.timed.remove(index);

        let mut state = self.state.borrow_mut();
        if index < state.listener_cursor {
            state.listener_cursor -= 1;
        }
    }

    /// Advances the clip. Returns true when the clip has finished.
    pub(crate) fn update(&self, elapsed: Millis, now: Millis) -> bool {
        {
            let state = self.state.borrow();
            if !state.playing {
                return true;
            }
            if state.paused {
                return false;
            }
        }
        let Some(animation) = self.animation.upgrade() else {
            self.state.borrow_mut().playing = false;
            return true;
        };

        if !self.state.borrow().started {
            self.on_begin(&animation, now);
            if !self.state.borrow().started {
                return !self.is_playing();
            }
        } else {
            let mut state = self.state.borrow_mut();
            state.elapsed_time += elapsed;
            state.running_time += elapsed as f64 * state.speed as f64;
        }

        let (position, mut finished) = self.position();

        self.fire_timed_listeners(position);
        if !self.state.borrow().started {
            return !self.is_playing();
        }

        if self.update_cross_fade(elapsed, now) {
            finished = true;
        }

        self.apply(&animation, position);

        if finished {
            self.state.borrow_mut().playing = false;
            self.on_end();
        }
        finished
    }

    // Position within the current repeat, in milliseconds from the clip start.
    fn position(&self) -> (f64, bool) {
        let state = self.state.borrow();
        let cycle = (self.duration + state.loop_blend_time) as f64;
        let running = state.running_time;
        let forward = state.speed >= 0.0;
        let active = state.active_duration as f64;

        let done = (forward && running >= active) || (!forward && running <= 0.0);
        match state.repeat_count {
            RepeatCount::Count(_) if done => {
                let position = if !forward || cycle <= 0.0 {
                    0.0
                } else {
                    match active % cycle {
                        p if p == 0.0 => self.duration as f64,
                        p => p,
                    }
                };
                (position, true)
            }
            _ if cycle <= 0.0 => (0.0, false),
            _ => (running.rem_euclid(cycle), false),
        }
    }

    fn on_begin(&self, animation: &Animation, now: Millis) {
        {
            let timed_count = self.listeners.borrow().timed.len();
            let channels = animation.channels();
            let mut state = self.state.borrow_mut();
            state.started = true;

            // Measured from the wall clock, the tick delta may predate `play()`.
            let wall_time = now.saturating_sub(state.time_started);
            let delta = wall_time as f64 * state.speed as f64;
            let forward = state.speed >= 0.0;
            state.elapsed_time = wall_time;
            state.running_time = if forward {
                delta
            } else {
                state.active_duration as f64 + delta
            };
            state.listener_cursor = if forward { 0 } else { timed_count };
            state.last_position = if forward { 0.0 } else { f64::INFINITY };

            bind_channels(&channels, animation.generation(), &mut state);
        }

        let listeners = self.listeners.borrow().begin.clone();
        for listener in listeners {
            listener.animation_event(self, ClipEvent::Begin);
        }
    }

    fn on_end(&self) {
        let driven = {
            let mut state = self.state.borrow_mut();
            state.blend_weight = 1.0;
            state.started = false;
            state.paused = false;
            state.fading_in = false;
            state.fading_out = false;
            state.fading_out_started = false;
            state.cross_fade_to = None;
            state.elapsed_time = 0;
            state.running_time = 0.0;
            state.values.clear();
            state.channel_slots.clear();
            std::mem::take(&mut state.driven)
        };
        for slot in driven {
            slot.target
                .borrow_mut()
                .animation_state_mut()
                .end_driving(slot.property, slot.driver);
        }

        let listeners = self.listeners.borrow().end.clone();
        for listener in listeners {
            listener.animation_event(self, ClipEvent::End);
        }
    }

    fn fire_timed_listeners(&self, position: f64) {
        let due = {
            let listeners = self.listeners.borrow();
            let mut state = self.state.borrow_mut();
            let timed = &listeners.timed;
            let mut due = Vec::new();

            if state.speed >= 0.0 {
                if position < state.last_position {
                    // Wrapped into a new repeat, flush the rest of the previous one.
                    due.extend(timed[state.listener_cursor.min(timed.len())..].iter().map(|(_, l)| l.clone()));
                    state.listener_cursor = 0;
                }
                while state.listener_cursor < timed.len() && timed[state.listener_cursor].0 as f64 <= position {
                    due.push(timed[state.listener_cursor].1.clone());
                    state.listener_cursor += 1;
                }
            } else {
                if position > state.last_position {
                    due.extend(timed[..state.listener_cursor.min(timed.len())].iter().rev().map(|(_, l)| l.clone()));
                    state.listener_cursor = timed.len();
                }
                while state.listener_cursor > 0 && timed[state.listener_cursor - 1].0 as f64 >= position {
                    due.push(timed[state.listener_cursor - 1].1.clone());
                    state.listener_cursor -= 1;
                }
            }
            state.last_position = position;
            due
        };

        for listener in due {
            listener.animation_event(self, ClipEvent::Default);
        }
    }

    // Returns true when a cross fade out of this clip has completed.
    fn update_cross_fade(&self, elapsed: Millis, now: Millis) -> bool {
        let mut state = self.state.borrow_mut();
        if !state.fading_out {
            return false;
        }
        let Some(to) = state.cross_fade_to.clone() else {
            state.fading_out = false;
            return false;
        };

        let speed = state.speed.abs() as f64;
        if state.fading_out_started {
            state.cross_fade_elapsed = now.saturating_sub(to.time_started()) as f64 * speed;
            state.fading_out_started = false;
        } else {
            state.cross_fade_elapsed += elapsed as f64 * speed;
        }

        let duration = state.cross_fade_duration as f64;
        if state.cross_fade_elapsed < duration {
            let remaining = ((duration - state.cross_fade_elapsed) / duration) as f32;
            let to_weight = if state.fading_in {
                // Hand over a share of the weight this clip is receiving.
                let weight = (1.0 - remaining) * state.blend_weight;
                state.blend_weight -= weight;
                weight
            } else {
                state.blend_weight = remaining;
                1.0 - remaining
            };
            drop(state);
            to.state.borrow_mut().blend_weight = to_weight;
            false
        } else {
            let to_weight = if state.fading_in { state.blend_weight } else { 1.0 };
            state.blend_weight = 0.0;
            state.fading_out = false;
            state.cross_fade_to = None;
            drop(state);

            let mut to_state = to.state.borrow_mut();
            to_state.blend_weight = to_weight;
            to_state.fading_in = false;
            true
        }
    }

    fn apply(&self, animation: &Animation, position: f64) {
        let channels = animation.channels();
        let mut state = self.state.borrow_mut();
        if state.bound_generation != animation.generation() {
            bind_channels(&channels, animation.generation(), &mut state);
        }

        let animation_duration = animation.duration() as f64;
        let start_time = self.start_time as f64;
        let ratio = |position: f64| -> f32 {
            if animation_duration > 0.0 {
                ((start_time + position) / animation_duration) as f32
            } else {
                0.0
            }
        };

        let duration = self.duration as f64;
        let loop_blend = match state.loop_blend_time {
            loop_blend_time if loop_blend_time > 0 && position > duration => {
                Some(((position - duration) / loop_blend_time as f64).min(1.0) as f32)
            }
            _ => None,
        };

        let ClipState {
            values,
            channel_slots,
            driven,
            scratch,
            blend_weight,
            ..
        } = &mut *state;

        for slot in driven.iter_mut() {
            slot.priority = slot.target.borrow().animation_state().priority(slot.property, slot.driver);
        }

        for (index, channel) in channels.iter().enumerate() {
            let priority = driven[channel_slots[index]].priority;
            let value = &mut values[index];
            channel.target().borrow().get_property_value(channel.property(), value);

            let curve = channel.curve();
            match loop_blend {
                Some(t) => blend_loop(curve, ratio(duration), ratio(0.0), t, value.interpolated_mut(), scratch),
                None => curve.evaluate(ratio(position), value.interpolated_mut()),
            }
            composite(value, priority, *blend_weight, curve.quaternion_offset());

            channel.target().borrow_mut().set_property_value(channel.property(), value);
        }
    }
}

// Rebuilds the per channel values, and registers the clip on every distinct (target, property).
fn bind_channels(channels: &[Channel], generation: u64, state: &mut ClipState) {
    for slot in state.driven.drain(..) {
        slot.target
            .borrow_mut()
            .animation_state_mut()
            .end_driving(slot.property, slot.driver);
    }
    state.bound_generation = generation;
    state.channel_slots.clear();
    state.values.clear();

    for channel in channels {
        let existing = state
            .driven
            .iter()
            .position(|slot| Rc::ptr_eq(&slot.target, channel.target()) && slot.property == channel.property());
        let slot = match existing {
            Some(slot) => slot,
            None => {
                let driver = channel
                    .target()
                    .borrow_mut()
                    .animation_state_mut()
                    .begin_driving(channel.property());
                state.driven.push(DrivenSlot {
                    target: channel.target().clone(),
                    property: channel.property(),
                    driver,
                    priority: 0,
                });
                state.driven.len() - 1
            }
        };
        state.channel_slots.push(slot);
        state.values.push(AnimationValue::new(channel.curve().component_count()));
    }
}

// Evaluates the blend from the clip's last frame back to its first one.
fn blend_loop(curve: &Curve, end: f32, start: f32, t: f32, dst: &mut [f32], scratch: &mut Vec<f32>) {
    scratch.resize(dst.len(), 0.0);
    curve.evaluate(end, dst);
    curve.evaluate(start, scratch);

    let quaternion = curve.quaternion_offset().map(|offset| offset..offset + 4);
    for (i, (d, s)) in dst.iter_mut().zip(scratch.iter()).enumerate() {
        if quaternion.as_ref().map_or(true, |q| !q.contains(&i)) {
            *d += (s - *d) * t;
        }
    }
    if let Some(q) = quaternion {
        let from = Quat::from_slice(&dst[q.clone()]).to_array();
        interpolate_quaternion(t, &from, &scratch[q.clone()], &mut dst[q]);
    }
}

/// Composites the interpolated value of a channel into its current value.
///
/// The priority 1 clip of a property replaces the value, others add onto it. Quaternion
/// spans are scaled by slerping from identity, and compose by multiplication.
fn composite(value: &mut AnimationValue, priority: u32, weight: f32, quaternion_offset: Option<usize>) {
    let (current, interpolated) = value.split_mut();
    let quaternion = quaternion_offset.map(|offset| offset..offset + 4);
    let is_scalar = |i: usize| quaternion.as_ref().map_or(true, |q| !q.contains(&i));

    if weight == 0.0 {
        if priority == 1 {
            for i in (0..current.len()).filter(|i| is_scalar(*i)) {
                current[i] = 0.0;
            }
            if let Some(q) = quaternion {
                Quat::IDENTITY.write_to_slice(&mut current[q]);
            }
        }
        return;
    }

    for i in (0..current.len()).filter(|i| is_scalar(*i)) {
        if priority == 1 {
            current[i] = interpolated[i] * weight;
        } else {
            current[i] += interpolated[i] * weight;
        }
    }
    if let Some(q) = quaternion {
        let mut rotation = Quat::from_slice(&interpolated[q.clone()]);
        if weight != 1.0 {
            rotation = Quat::IDENTITY.slerp(rotation, weight);
        }
        if priority != 1 {
            rotation = Quat::from_slice(&current[q.clone()]) * rotation;
        }
        rotation.write_to_slice(&mut current[q]);
    }
}
