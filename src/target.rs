//!
//! Animation target capability.
//!

use glam::Quat;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::animation::Animation;
use crate::base::DeterministicState;
use crate::value::AnimationValue;

/// Kind of an animation target.
///
/// Only transform targets get quaternion spans in their curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Scalar,
    Transform,
}

/// Animatable property of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "rkyv", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyId {
    /// Uniform scale, 1 float applied to all axes.
    ScaleUnit,
    Scale,
    ScaleX,
    ScaleY,
    ScaleZ,
    /// Quaternion (x, y, z, w).
    Rotate,
    Translate,
    TranslateX,
    TranslateY,
    TranslateZ,
    /// Quaternion followed by translation.
    RotateTranslate,
    /// Scale followed by quaternion.
    ScaleRotate,
    /// Scale followed by translation.
    ScaleTranslate,
    /// Scale, quaternion, then translation.
    ScaleRotateTranslate,
    /// The whole float block of a scalar target.
    Uniform,
    /// Target defined property.
    Custom(u32),
}

const PROPERTY_NAMES: [(&str, PropertyId); 15] = [
    ("ANIMATE_SCALE_UNIT", PropertyId::ScaleUnit),
    ("ANIMATE_SCALE", PropertyId::Scale),
    ("ANIMATE_SCALE_X", PropertyId::ScaleX),
    ("ANIMATE_SCALE_Y", PropertyId::ScaleY),
    ("ANIMATE_SCALE_Z", PropertyId::ScaleZ),
    ("ANIMATE_ROTATE", PropertyId::Rotate),
    ("ANIMATE_TRANSLATE", PropertyId::Translate),
    ("ANIMATE_TRANSLATE_X", PropertyId::TranslateX),
    ("ANIMATE_TRANSLATE_Y", PropertyId::TranslateY),
    ("ANIMATE_TRANSLATE_Z", PropertyId::TranslateZ),
    ("ANIMATE_ROTATE_TRANSLATE", PropertyId::RotateTranslate),
    ("ANIMATE_SCALE_ROTATE", PropertyId::ScaleRotate),
    ("ANIMATE_SCALE_TRANSLATE", PropertyId::ScaleTranslate),
    ("ANIMATE_SCALE_ROTATE_TRANSLATE", PropertyId::ScaleRotateTranslate),
    ("ANIMATE_UNIFORM", PropertyId::Uniform),
];

impl PropertyId {
    /// Parses a property name like `ANIMATE_TRANSLATE_X`.
    pub fn from_name(name: &str) -> Option<PropertyId> {
        PROPERTY_NAMES.iter().find(|(n, _)| *n == name).map(|(_, id)| *id)
    }

    /// Property name, `None` for custom properties.
    pub fn name(&self) -> Option<&'static str> {
        PROPERTY_NAMES.iter().find(|(_, id)| id == self).map(|(n, _)| *n)
    }

    /// Float count of transform properties.
    pub fn transform_component_count(&self) -> Option<usize> {
        match self {
            PropertyId::ScaleUnit
            | PropertyId::ScaleX
            | PropertyId::ScaleY
            | PropertyId::ScaleZ
            | PropertyId::TranslateX
            | PropertyId::TranslateY
            | PropertyId::TranslateZ => Some(1),
            PropertyId::Scale | PropertyId::Translate => Some(3),
            PropertyId::Rotate => Some(4),
            PropertyId::ScaleTranslate => Some(6),
            PropertyId::RotateTranslate | PropertyId::ScaleRotate => Some(7),
            PropertyId::ScaleRotateTranslate => Some(10),
            PropertyId::Uniform | PropertyId::Custom(_) => None,
        }
    }

    /// Index of the quaternion span in transform property values.
    pub fn quaternion_offset(&self) -> Option<usize> {
        match self {
            PropertyId::Rotate | PropertyId::RotateTranslate => Some(0),
            PropertyId::ScaleRotate | PropertyId::ScaleRotateTranslate => Some(3),
            _ => None,
        }
    }
}

/// Anything animatable.
///
/// A target declares how many floats each supported property takes, and reads and writes
/// those floats through an `AnimationValue`. It also owns a `TargetState` used by the
/// clips driving it.
pub trait AnimationTarget: Debug {
    fn target_type(&self) -> TargetType;

    /// Float count of `property`, `None` if the property is unsupported.
    fn property_component_count(&self, property: PropertyId) -> Option<usize>;

    /// Reads `property` into the current value of `value`.
    fn get_property_value(&self, property: PropertyId, value: &mut AnimationValue);

    /// Writes the current value of `value` into `property`.
    fn set_property_value(&mut self, property: PropertyId, value: &AnimationValue);

    fn animation_state(&self) -> &TargetState;

    fn animation_state_mut(&mut self) -> &mut TargetState;
}

/// Shared handle of an animation target.
pub type TargetRef = Rc<RefCell<dyn AnimationTarget>>;

/// Handle of one clip driving one property of a target.
pub(crate) type DriverId = u64;

/// Animation bookkeeping embedded in every target.
///
/// Tracks, per property, the clips driving it in the order they began. The first clip has
/// priority 1 and replaces the value, later clips add onto it. When a clip ends the ones
/// after it move up, paused clips keep their place.
#[derive(Debug, Default)]
pub struct TargetState {
    animations: Vec<Weak<Animation>>,
    drivers: HashMap<PropertyId, Vec<DriverId>, DeterministicState>,
    next_driver: DriverId,
}

impl Clone for TargetState {
    // Animations bind to one target, a clone starts unanimated.
    fn clone(&self) -> TargetState {
        TargetState::new()
    }
}

impl TargetState {
    pub fn new() -> TargetState {
        TargetState::default()
    }

    /// Number of clips driving `property`.
    pub fn active_animation_count(&self, property: PropertyId) -> u32 {
        self.drivers.get(&property).map(|d| d.len() as u32).unwrap_or(0)
    }

    /// Registers one more clip on `property`.
    pub(crate) fn begin_driving(&mut self, property: PropertyId) -> DriverId {
        self.next_driver += 1;
        let driver = self.next_driver;
        self.drivers.entry(property).or_default().push(driver);
        driver
    }

    /// Unregisters a clip from `property`.
    pub(crate) fn end_driving(&mut self, property: PropertyId, driver: DriverId) {
        let idle = match self.drivers.get_mut(&property) {
            Some(drivers) => {
                drivers.retain(|d| *d != driver);
                drivers.is_empty()
            }
            None => false,
        };
        if idle {
            self.drivers.remove(&property);
        }
    }

    /// 1 based rank of `driver` among the clips driving `property`, 0 if it isn't one.
    pub(crate) fn priority(&self, property: PropertyId, driver: DriverId) -> u32 {
        self.drivers
            .get(&property)
            .and_then(|drivers| drivers.iter().position(|d| *d == driver))
            .map_or(0, |index| index as u32 + 1)
    }

    pub(crate) fn add_animation(&mut self, animation: &Rc<Animation>) {
        self.animations.retain(|a| a.strong_count() > 0);
        if !self.animations.iter().any(|a| a.ptr_eq(&Rc::downgrade(animation))) {
            self.animations.push(Rc::downgrade(animation));
        }
    }

    pub(crate) fn remove_animation(&mut self, animation: &Rc<Animation>) {
        let weak = Rc::downgrade(animation);
        self.animations.retain(|a| a.strong_count() > 0 && !a.ptr_eq(&weak));
    }

    /// Finds a live animation driving this target by id.
    pub fn animation(&self, id: &str) -> Option<Rc<Animation>> {
        self.animations
            .iter()
            .filter_map(|a| a.upgrade())
            .find(|a| a.id() == id)
    }

    /// Live animations driving this target.
    pub fn animations(&self) -> Vec<Rc<Animation>> {
        self.animations.iter().filter_map(|a| a.upgrade()).collect()
    }
}

/// Finds the animation `id` driving `target`.
pub fn target_animation(target: &TargetRef, id: &str) -> Option<Rc<Animation>> {
    target.borrow().animation_state().animation(id)
}

/// Removes the channels of animation `id` driving `target`.
/// Returns false if no such animation drives the target.
pub fn destroy_target_animation(target: &TargetRef, id: &str) -> bool {
    let animation = match target_animation(target, id) {
        Some(animation) => animation,
        None => return false,
    };
    animation.remove_channels_for(target);
    target.borrow_mut().animation_state_mut().remove_animation(&animation);
    true
}

/// Converts a relative `by` value of `property` into an absolute value, starting from `from`.
///
/// Scales multiply, rotations compose as `by * from`, everything else adds.
pub fn convert_by_values(target_type: TargetType, property: PropertyId, from: &[f32], by: &mut [f32]) {
    assert_eq!(from.len(), by.len(), "from/by size mismatch");
    if target_type != TargetType::Transform {
        add_values(from, by);
        return;
    }

    match property {
        PropertyId::ScaleUnit | PropertyId::Scale | PropertyId::ScaleX | PropertyId::ScaleY | PropertyId::ScaleZ => {
            multiply_values(from, by)
        }
        PropertyId::Rotate => multiply_quaternion(from, by),
        PropertyId::RotateTranslate => {
            multiply_quaternion(&from[0..4], &mut by[0..4]);
            add_values(&from[4..7], &mut by[4..7]);
        }
        PropertyId::ScaleRotate => {
            multiply_values(&from[0..3], &mut by[0..3]);
            multiply_quaternion(&from[3..7], &mut by[3..7]);
        }
        PropertyId::ScaleTranslate => {
            multiply_values(&from[0..3], &mut by[0..3]);
            add_values(&from[3..6], &mut by[3..6]);
        }
        PropertyId::ScaleRotateTranslate => {
            multiply_values(&from[0..3], &mut by[0..3]);
            multiply_quaternion(&from[3..7], &mut by[3..7]);
            add_values(&from[7..10], &mut by[7..10]);
        }
        _ => add_values(from, by),
    }
}

#[inline]
fn add_values(from: &[f32], by: &mut [f32]) {
    by.iter_mut().zip(from).for_each(|(b, f)| *b += f);
}

#[inline]
fn multiply_values(from: &[f32], by: &mut [f32]) {
    by.iter_mut().zip(from).for_each(|(b, f)| *b *= f);
}

#[inline]
fn multiply_quaternion(from: &[f32], by: &mut [f32]) {
    let q = Quat::from_slice(by) * Quat::from_slice(from);
    q.write_to_slice(by);
}

#[cfg(test)]
mod target_tests {
    use wasm_bindgen_test::*;

    use super::*;

    #[test]
    #[wasm_bindgen_test]
    fn test_property_names() {
        assert_eq!(PropertyId::from_name("ANIMATE_TRANSLATE_X"), Some(PropertyId::TranslateX));
        assert_eq!(
            PropertyId::from_name("ANIMATE_SCALE_ROTATE_TRANSLATE"),
            Some(PropertyId::ScaleRotateTranslate)
        );
        assert_eq!(PropertyId::from_name("ANIMATE_OPACITY"), None);
        for (name, id) in PROPERTY_NAMES {
            assert_eq!(id.name(), Some(name));
        }
        assert_eq!(PropertyId::Custom(3).name(), None);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_property_layout() {
        assert_eq!(PropertyId::ScaleUnit.transform_component_count(), Some(1));
        assert_eq!(PropertyId::Translate.transform_component_count(), Some(3));
        assert_eq!(PropertyId::Rotate.transform_component_count(), Some(4));
        assert_eq!(PropertyId::RotateTranslate.transform_component_count(), Some(7));
        assert_eq!(PropertyId::ScaleRotateTranslate.transform_component_count(), Some(10));
        assert_eq!(PropertyId::Uniform.transform_component_count(), None);

        assert_eq!(PropertyId::Rotate.quaternion_offset(), Some(0));
        assert_eq!(PropertyId::RotateTranslate.quaternion_offset(), Some(0));
        assert_eq!(PropertyId::ScaleRotateTranslate.quaternion_offset(), Some(3));
        assert_eq!(PropertyId::Translate.quaternion_offset(), None);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_priority_slots() {
        let mut state = TargetState::new();
        let p = PropertyId::TranslateX;
        let a = state.begin_driving(p);
        let b = state.begin_driving(p);
        let y = state.begin_driving(PropertyId::TranslateY);
        assert_eq!(state.priority(p, a), 1);
        assert_eq!(state.priority(p, b), 2);
        assert_eq!(state.priority(PropertyId::TranslateY, y), 1);
        assert_eq!(state.priority(PropertyId::TranslateY, a), 0);
        assert_eq!(state.active_animation_count(p), 2);

        state.end_driving(p, a);
        assert_eq!(state.active_animation_count(p), 1);
        assert_eq!(state.priority(p, b), 1);

        state.end_driving(p, b);
        assert_eq!(state.active_animation_count(p), 0);
        assert_eq!(state.priority(p, b), 0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_priority_renumbering() {
        let mut state = TargetState::new();
        let p = PropertyId::Uniform;
        let a = state.begin_driving(p);
        let b = state.begin_driving(p);
        let c = state.begin_driving(p);
        state.end_driving(p, a);

        // Stable however often the survivors ask.
        for _ in 0..3 {
            assert_eq!(state.priority(p, b), 1);
        }
        assert_eq!(state.priority(p, c), 2);

        let d = state.begin_driving(p);
        state.end_driving(p, b);
        assert_eq!(state.priority(p, c), 1);
        assert_eq!(state.priority(p, d), 2);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_convert_by_values() {
        let mut by = [2.0, 3.0];
        convert_by_values(TargetType::Scalar, PropertyId::Uniform, &[1.0, 1.0], &mut by);
        assert_eq!(by, [3.0, 4.0]);

        let mut by = [2.0, 2.0, 2.0];
        convert_by_values(TargetType::Transform, PropertyId::Scale, &[1.5, 2.0, 3.0], &mut by);
        assert_eq!(by, [3.0, 4.0, 6.0]);

        let mut by = [5.0];
        convert_by_values(TargetType::Transform, PropertyId::TranslateX, &[1.0], &mut by);
        assert_eq!(by, [6.0]);

        let from = Quat::from_rotation_z(0.5);
        let rel = Quat::from_rotation_z(0.25);
        let mut by = [0.0; 10];
        by[0..3].copy_from_slice(&[2.0, 2.0, 2.0]);
        rel.write_to_slice(&mut by[3..7]);
        by[7..10].copy_from_slice(&[1.0, 2.0, 3.0]);
        let mut from_values = [0.0; 10];
        from_values[0..3].copy_from_slice(&[1.0, 2.0, 3.0]);
        from.write_to_slice(&mut from_values[3..7]);
        from_values[7..10].copy_from_slice(&[1.0, 1.0, 1.0]);

        convert_by_values(TargetType::Transform, PropertyId::ScaleRotateTranslate, &from_values, &mut by);
        assert_eq!(&by[0..3], &[2.0, 4.0, 6.0]);
        assert!(Quat::from_slice(&by[3..7]).abs_diff_eq(Quat::from_rotation_z(0.75), 1e-6));
        assert_eq!(&by[7..10], &[2.0, 3.0, 4.0]);
    }
}
