//!
//! Animation controller, the clip scheduler.
//!

use log::{debug, warn};
use std::cell::RefCell;
use std::rc::Rc;

use crate::animation::{Animation, ChannelKeys};
use crate::base::{AnimationError, Millis};
use crate::clip::AnimationClip;
use crate::description::AnimationDesc;
use crate::interpolation::Interpolation;
use crate::target::{convert_by_values, PropertyId, TargetRef};

/// Scheduling state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerState {
    /// At least one clip is playing.
    Running,
    /// Nothing is playing.
    Idle,
    /// Updates are ignored until resumed.
    Paused,
}

#[derive(Debug)]
pub(crate) struct ControllerInner {
    state: ControllerState,
    game_time: Millis,
    running: Vec<Rc<AnimationClip>>,
    animations: Vec<Rc<Animation>>,
}

impl ControllerInner {
    #[inline]
    pub(crate) fn game_time(&self) -> Millis {
        self.game_time
    }

    fn set_state(&mut self, state: ControllerState) {
        if self.state != state {
            debug!("Animation controller {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Adds a clip to the running list, moving it to the back if already present.
    pub(crate) fn schedule(&mut self, clip: Rc<AnimationClip>) {
        if self.running.is_empty() {
            self.set_state(ControllerState::Running);
        }
        self.running.retain(|c| !Rc::ptr_eq(c, &clip));
        self.running.push(clip);
    }

    pub(crate) fn unschedule(&mut self, clip: &AnimationClip) {
        self.running.retain(|c| !std::ptr::eq(Rc::as_ptr(c), clip));
        if self.running.is_empty() {
            self.set_state(ControllerState::Idle);
        }
    }

    fn is_scheduled(&self, clip: &Rc<AnimationClip>) -> bool {
        self.running.iter().any(|c| Rc::ptr_eq(c, clip))
    }
}

/// Owns animations and ticks their playing clips.
///
/// Everything is single threaded: clips, animations and targets are shared through `Rc`, and
/// one `update()` per frame advances every playing clip in the order it was played.
#[derive(Debug)]
pub struct AnimationController {
    inner: Rc<RefCell<ControllerInner>>,
}

impl Default for AnimationController {
    fn default() -> AnimationController {
        AnimationController::new()
    }
}

impl AnimationController {
    pub fn new() -> AnimationController {
        AnimationController {
            inner: Rc::new(RefCell::new(ControllerInner {
                state: ControllerState::Idle,
                game_time: 0,
                running: Vec::new(),
                animations: Vec::new(),
            })),
        }
    }

    pub fn state(&self) -> ControllerState {
        self.inner.borrow().state
    }

    /// Accumulated time of all updates while running.
    pub fn game_time(&self) -> Millis {
        self.inner.borrow().game_time
    }

    pub fn running_clip_count(&self) -> usize {
        self.inner.borrow().running.len()
    }

    pub fn initialize(&self) {
        self.inner.borrow_mut().set_state(ControllerState::Idle);
    }

    /// Stops everything and pauses the controller.
    pub fn finalize(&self) {
        self.stop_all_animations();
        self.inner.borrow_mut().set_state(ControllerState::Paused);
    }

    pub fn pause(&self) {
        self.inner.borrow_mut().set_state(ControllerState::Paused);
    }

    pub fn resume(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.running.is_empty() {
            inner.set_state(ControllerState::Idle);
        } else {
            inner.set_state(ControllerState::Running);
        }
    }

    /// Advances every playing clip by `elapsed` milliseconds.
    ///
    /// Finished clips leave the running list, and the controller goes idle once it's empty.
    pub fn update(&self, elapsed: Millis) {
        let (now, clips) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state != ControllerState::Running {
                return;
            }
            inner.game_time += elapsed;
            (inner.game_time, inner.running.clone())
        };

        for clip in clips {
            // Stopped by a listener earlier in this update.
            if !self.inner.borrow().is_scheduled(&clip) {
                continue;
            }
            if clip.update(elapsed, now) && !clip.is_playing() {
                self.inner.borrow_mut().unschedule(&clip);
            }
        }
    }

    /// Creates an animation of one property of `target`.
    ///
    /// Needs at least 2 keys and an interpolation that doesn't read tangents. Returns
    /// `AnimationError::DuplicateId` if the id is taken.
    pub fn create_animation(
        &self,
        id: &str,
        target: &TargetRef,
        property: PropertyId,
        key_times: &[Millis],
        key_values: &[f32],
        interpolation: Interpolation,
    ) -> Result<Rc<Animation>, AnimationError> {
        if interpolation.needs_tangents() {
            return Err(AnimationError::InvalidArguments("interpolation requires tangents"));
        }
        self.create_keyed_animation(
            id,
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

    #[allow(clippy::too_many_arguments)]
    pub fn create_animation_with_tangents(
        &self,
        id: &str,
        target: &TargetRef,
        property: PropertyId,
        key_times: &[Millis],
        key_values: &[f32],
        key_in: &[f32],
        key_out: &[f32],
        interpolation: Interpolation,
    ) -> Result<Rc<Animation>, AnimationError> {
        self.create_keyed_animation(
            id,
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

    /// Creates a 2 key animation from `from` to `to` over `duration`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_animation_from_to(
        &self,
        id: &str,
        target: &TargetRef,
        property: PropertyId,
        from: &[f32],
        to: &[f32],
        interpolation: Interpolation,
        duration: Millis,
    ) -> Result<Rc<Animation>, AnimationError> {
        if from.len() != to.len() {
            return Err(AnimationError::InvalidArguments("from and to sizes differ"));
        }
        let key_values = [from, to].concat();
        self.create_animation(id, target, property, &[0, duration], &key_values, interpolation)
    }

    /// Creates a 2 key animation from `from` to `from` offset by `by`.
    ///
    /// Scales multiply, rotations compose and everything else adds.
    #[allow(clippy::too_many_arguments)]
    pub fn create_animation_from_by(
        &self,
        id: &str,
        target: &TargetRef,
        property: PropertyId,
        from: &[f32],
        by: &[f32],
        interpolation: Interpolation,
        duration: Millis,
    ) -> Result<Rc<Animation>, AnimationError> {
        if from.len() != by.len() {
            return Err(AnimationError::InvalidArguments("from and by sizes differ"));
        }
        let target_type = target.borrow().target_type();
        let mut to = by.to_vec();
        convert_by_values(target_type, property, from, &mut to);
        self.create_animation_from_to(id, target, property, from, &to, interpolation, duration)
    }

    /// Creates an animation from a declarative description.
    ///
    /// The repeat count applies to the default clip, and the clip table, if any, creates
    /// named clips. Unknown interpolation names fall back to `Linear`.
    pub fn create_animation_from_desc(
        &self,
        id: &str,
        target: &TargetRef,
        desc: &AnimationDesc,
    ) -> Result<Rc<Animation>, AnimationError> {
        let property =
            PropertyId::from_name(&desc.property).ok_or_else(|| AnimationError::UnknownProperty(desc.property.clone()))?;
        if desc.key_count != desc.key_times.len() {
            return Err(AnimationError::InvalidKeyCount(desc.key_count));
        }

        let interpolation = match &desc.curve {
            None => Interpolation::Linear,
            Some(name) => Interpolation::from_name(name).unwrap_or_else(|| {
                warn!("Animation {}: unknown curve {}, using LINEAR", id, name);
                Interpolation::Linear
            }),
        };

        let animation = if desc.key_in.is_empty() && desc.key_out.is_empty() {
            self.create_keyed_animation(
                id,
                target,
                property,
                ChannelKeys {
                    times: &desc.key_times,
                    values: &desc.key_values,
                    tangents: None,
                    interpolations: &[interpolation],
                },
            )?
        } else {
            self.create_animation_with_tangents(
                id,
                target,
                property,
                &desc.key_times,
                &desc.key_values,
                &desc.key_in,
                &desc.key_out,
                interpolation,
            )?
        };

        if let Some(repeat_count) = desc.repeat_count {
            if let Some(clip) = animation.default_clip() {
                clip.set_repeat_count(repeat_count);
            }
        }
        if let Some(table) = &desc.clips {
            if let Err(err) = animation.create_clips(table) {
                self.destroy_animation(id);
                return Err(err);
            }
        }
        Ok(animation)
    }

    fn create_keyed_animation(
        &self,
        id: &str,
        target: &TargetRef,
        property: PropertyId,
        keys: ChannelKeys<'_>,
    ) -> Result<Rc<Animation>, AnimationError> {
        if keys.times.len() < 2 {
            return Err(AnimationError::InvalidKeyCount(keys.times.len()));
        }
        let animation = self.new_animation(id)?;
        animation.create_channel_keys(target, property, keys)?;
        self.register_animation(animation.clone());
        Ok(animation)
    }

    /// An empty animation bound to this controller, not yet registered.
    pub(crate) fn new_animation(&self, id: &str) -> Result<Rc<Animation>, AnimationError> {
        if self.animation(id).is_some() {
            return Err(AnimationError::DuplicateId(id.to_string()));
        }
        Ok(Animation::new(id, Rc::downgrade(&self.inner)))
    }

    pub(crate) fn register_animation(&self, animation: Rc<Animation>) {
        debug!(
            "Created animation {} ({} channel(s), {}ms)",
            animation.id(),
            animation.channel_count(),
            animation.duration()
        );
        self.inner.borrow_mut().animations.push(animation);
    }

    pub fn animation(&self, id: &str) -> Option<Rc<Animation>> {
        self.inner.borrow().animations.iter().find(|a| a.id() == id).cloned()
    }

    pub fn animation_count(&self) -> usize {
        self.inner.borrow().animations.len()
    }

    /// Stops the clips of animation `id` and forgets it. Returns false if there is no such
    /// animation.
    pub fn destroy_animation(&self, id: &str) -> bool {
        let animation = {
            let mut inner = self.inner.borrow_mut();
            match inner.animations.iter().position(|a| a.id() == id) {
                Some(index) => inner.animations.remove(index),
                None => return false,
            }
        };
        self.release_animation(&animation);
        true
    }

    pub fn destroy_all_animations(&self) {
        let animations = std::mem::take(&mut self.inner.borrow_mut().animations);
        for animation in &animations {
            self.release_animation(animation);
        }
    }

    fn release_animation(&self, animation: &Rc<Animation>) {
        animation.stop_clips();
        for channel in animation.channels().iter() {
            channel
                .target()
                .borrow_mut()
                .animation_state_mut()
                .remove_animation(animation);
        }
        debug!("Destroyed animation {}", animation.id());
    }

    /// Stops every playing clip.
    pub fn stop_all_animations(&self) {
        let clips = self.inner.borrow().running.clone();
        for clip in clips {
            clip.stop();
        }
    }
}

#[cfg(test)]
mod controller_tests {
    use std::cell::Cell;
    use wasm_bindgen_test::*;

    use super::*;
    use crate::clip::ClipEvent;
    use crate::transform::Transform;

    fn translate_x(controller: &AnimationController, id: &str, target: &TargetRef) -> Rc<Animation> {
        controller
            .create_animation(
                id,
                target,
                PropertyId::TranslateX,
                &[0, 1000],
                &[0.0, 10.0],
                Interpolation::Linear,
            )
            .unwrap()
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_state_machine() {
        let controller = AnimationController::new();
        assert_eq!(controller.state(), ControllerState::Idle);

        let target: TargetRef = Rc::new(RefCell::new(Transform::new()));
        let animation = translate_x(&controller, "move", &target);
        animation.play(None).unwrap();
        assert_eq!(controller.state(), ControllerState::Running);
        assert_eq!(controller.running_clip_count(), 1);

        controller.pause();
        controller.update(500);
        assert_eq!(controller.game_time(), 0);

        controller.resume();
        assert_eq!(controller.state(), ControllerState::Running);
        controller.update(500);
        assert_eq!(controller.game_time(), 500);

        controller.stop_all_animations();
        assert_eq!(controller.state(), ControllerState::Idle);
        controller.resume();
        assert_eq!(controller.state(), ControllerState::Idle);

        animation.play(None).unwrap();
        controller.finalize();
        assert_eq!(controller.state(), ControllerState::Paused);
        assert_eq!(controller.running_clip_count(), 0);
        controller.initialize();
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_create_animation_errors() {
        let controller = AnimationController::new();
        let target: TargetRef = Rc::new(RefCell::new(Transform::new()));
        translate_x(&controller, "move", &target);

        let err = controller
            .create_animation("move", &target, PropertyId::TranslateY, &[0, 10], &[0.0, 1.0], Interpolation::Linear)
            .unwrap_err();
        assert!(err.is_duplicate_id());

        let err = controller
            .create_animation("one", &target, PropertyId::TranslateY, &[0], &[0.0], Interpolation::Linear)
            .unwrap_err();
        assert!(err.is_invalid_key_count());

        let err = controller
            .create_animation("bad", &target, PropertyId::Uniform, &[0, 10], &[0.0, 1.0], Interpolation::Linear)
            .unwrap_err();
        assert!(err.is_unsupported_property());
        assert_eq!(controller.animation_count(), 1);
        assert!(controller.animation("bad").is_none());
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_restart_moves_clip_to_back() {
        let controller = AnimationController::new();
        let target: TargetRef = Rc::new(RefCell::new(Transform::new()));
        let a = translate_x(&controller, "a", &target);
        let b = translate_x(&controller, "b", &target);

        let ended = Rc::new(Cell::new(0));
        let counter = ended.clone();
        a.default_clip().unwrap().add_end_listener(Rc::new(move |_: &AnimationClip, event: ClipEvent| {
            assert_eq!(event, ClipEvent::End);
            counter.set(counter.get() + 1);
        }));

        a.play(None).unwrap();
        b.play(None).unwrap();
        a.play(None).unwrap();
        assert_eq!(ended.get(), 1);
        assert_eq!(controller.running_clip_count(), 2);
        let running = controller.inner.borrow().running.clone();
        assert!(Rc::ptr_eq(&running[1], &a.default_clip().unwrap()));
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_destroy_animation() {
        let controller = AnimationController::new();
        let target: TargetRef = Rc::new(RefCell::new(Transform::new()));
        let animation = translate_x(&controller, "move", &target);
        animation.play(None).unwrap();
        controller.update(100);
        assert_eq!(target.borrow().animation_state().active_animation_count(PropertyId::TranslateX), 1);

        assert!(controller.destroy_animation("move"));
        assert!(!controller.destroy_animation("move"));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert_eq!(target.borrow().animation_state().active_animation_count(PropertyId::TranslateX), 0);
        assert!(target.borrow().animation_state().animation("move").is_none());

        translate_x(&controller, "a", &target);
        translate_x(&controller, "b", &target);
        controller.destroy_all_animations();
        assert_eq!(controller.animation_count(), 0);
    }
}
