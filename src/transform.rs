//!
//! Built-in animation targets.
//!

use glam::{Quat, Vec3};
use static_assertions::const_assert_eq;

use crate::target::{AnimationTarget, PropertyId, TargetState, TargetType};
use crate::value::AnimationValue;

const SCALE_COMPONENTS: usize = 3;
const ROTATE_COMPONENTS: usize = 4;
const TRANSLATE_COMPONENTS: usize = 3;
const SRT_COMPONENTS: usize = 10;

const_assert_eq!(SRT_COMPONENTS, SCALE_COMPONENTS + ROTATE_COMPONENTS + TRANSLATE_COMPONENTS);

/// A scale, rotation and translation target.
#[derive(Debug, Clone)]
pub struct Transform {
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
    state: TargetState,
}

impl Default for Transform {
    fn default() -> Transform {
        Transform::new()
    }
}

impl Transform {
    /// Identity transform.
    pub fn new() -> Transform {
        Transform::from_srt(Vec3::ONE, Quat::IDENTITY, Vec3::ZERO)
    }

    pub fn from_srt(scale: Vec3, rotation: Quat, translation: Vec3) -> Transform {
        Transform {
            scale,
            rotation,
            translation,
            state: TargetState::new(),
        }
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    #[inline]
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    #[inline]
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    #[inline]
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
    }
}

#[inline]
fn read_vec3(value: &AnimationValue, index: usize) -> Vec3 {
    Vec3::from_slice(&value.current()[index..index + 3])
}

#[inline]
fn read_quat(value: &AnimationValue, index: usize) -> Quat {
    Quat::from_slice(&value.current()[index..index + 4])
}

impl AnimationTarget for Transform {
    fn target_type(&self) -> TargetType {
        TargetType::Transform
    }

    fn property_component_count(&self, property: PropertyId) -> Option<usize> {
        property.transform_component_count()
    }

    fn get_property_value(&self, property: PropertyId, value: &mut AnimationValue) {
        match property {
            PropertyId::ScaleUnit | PropertyId::ScaleX => value.set_float(0, self.scale.x),
            PropertyId::ScaleY => value.set_float(0, self.scale.y),
            PropertyId::ScaleZ => value.set_float(0, self.scale.z),
            PropertyId::Scale => value.set_floats(0, &self.scale.to_array()),
            PropertyId::Rotate => value.set_floats(0, &self.rotation.to_array()),
            PropertyId::Translate => value.set_floats(0, &self.translation.to_array()),
            PropertyId::TranslateX => value.set_float(0, self.translation.x),
            PropertyId::TranslateY => value.set_float(0, self.translation.y),
            PropertyId::TranslateZ => value.set_float(0, self.translation.z),
            PropertyId::RotateTranslate => {
                value.set_floats(0, &self.rotation.to_array());
                value.set_floats(4, &self.translation.to_array());
            }
            PropertyId::ScaleRotate => {
                value.set_floats(0, &self.scale.to_array());
                value.set_floats(3, &self.rotation.to_array());
            }
            PropertyId::ScaleTranslate => {
                value.set_floats(0, &self.scale.to_array());
                value.set_floats(3, &self.translation.to_array());
            }
            PropertyId::ScaleRotateTranslate => {
                value.set_floats(0, &self.scale.to_array());
                value.set_floats(3, &self.rotation.to_array());
                value.set_floats(7, &self.translation.to_array());
            }
            PropertyId::Uniform | PropertyId::Custom(_) => {}
        }
    }

    fn set_property_value(&mut self, property: PropertyId, value: &AnimationValue) {
        match property {
            PropertyId::ScaleUnit => self.scale = Vec3::splat(value.float(0)),
            PropertyId::ScaleX => self.scale.x = value.float(0),
            PropertyId::ScaleY => self.scale.y = value.float(0),
            PropertyId::ScaleZ => self.scale.z = value.float(0),
            PropertyId::Scale => self.scale = read_vec3(value, 0),
            PropertyId::Rotate => self.rotation = read_quat(value, 0),
            PropertyId::Translate => self.translation = read_vec3(value, 0),
            PropertyId::TranslateX => self.translation.x = value.float(0),
            PropertyId::TranslateY => self.translation.y = value.float(0),
            PropertyId::TranslateZ => self.translation.z = value.float(0),
            PropertyId::RotateTranslate => {
                self.rotation = read_quat(value, 0);
                self.translation = read_vec3(value, 4);
            }
            PropertyId::ScaleRotate => {
                self.scale = read_vec3(value, 0);
                self.rotation = read_quat(value, 3);
            }
            PropertyId::ScaleTranslate => {
                self.scale = read_vec3(value, 0);
                self.translation = read_vec3(value, 3);
            }
            PropertyId::ScaleRotateTranslate => {
                self.scale = read_vec3(value, 0);
                self.rotation = read_quat(value, 3);
                self.translation = read_vec3(value, 7);
            }
            PropertyId::Uniform | PropertyId::Custom(_) => {}
        }
    }

    #[inline]
    fn animation_state(&self) -> &TargetState {
        &self.state
    }

    #[inline]
    fn animation_state_mut(&mut self) -> &mut TargetState {
        &mut self.state
    }
}

/// A block of floats, e.g. a material parameter.
///
/// `Uniform` animates the whole block, `Custom(i)` animates the float `i`.
#[derive(Debug, Clone, Default)]
pub struct UniformTarget {
    values: Vec<f32>,
    state: TargetState,
}

impl UniformTarget {
    pub fn new(values: &[f32]) -> UniformTarget {
        UniformTarget {
            values: values.to_vec(),
            state: TargetState::new(),
        }
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }
}

impl AnimationTarget for UniformTarget {
    fn target_type(&self) -> TargetType {
        TargetType::Scalar
    }

    fn property_component_count(&self, property: PropertyId) -> Option<usize> {
        match property {
            PropertyId::Uniform if !self.values.is_empty() => Some(self.values.len()),
            PropertyId::Custom(index) if (index as usize) < self.values.len() => Some(1),
            _ => None,
        }
    }

    fn get_property_value(&self, property: PropertyId, value: &mut AnimationValue) {
        match property {
            PropertyId::Uniform => value.set_floats(0, &self.values),
            PropertyId::Custom(index) => value.set_float(0, self.values[index as usize]),
            _ => {}
        }
    }

    fn set_property_value(&mut self, property: PropertyId, value: &AnimationValue) {
        match property {
            PropertyId::Uniform => value.floats(0, &mut self.values),
            PropertyId::Custom(index) => self.values[index as usize] = value.float(0),
            _ => {}
        }
    }

    #[inline]
    fn animation_state(&self) -> &TargetState {
        &self.state
    }

    #[inline]
    fn animation_state_mut(&mut self) -> &mut TargetState {
        &mut self.state
    }
}
