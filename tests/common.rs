#![allow(dead_code)]

use glam::Vec3;
use keyframe_animation_rs::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub const DIFF: f32 = 1e-4;

/// A transform together with its type erased handle.
pub fn new_transform() -> (Rc<RefCell<Transform>>, TargetRef) {
    let transform = Rc::new(RefCell::new(Transform::new()));
    let target: TargetRef = transform.clone();
    (transform, target)
}

/// Animates translation X of `target` linearly from `from` to `to` over `duration`.
pub fn translate_x(
    controller: &AnimationController,
    id: &str,
    target: &TargetRef,
    from: f32,
    to: f32,
    duration: Millis,
) -> Rc<Animation> {
    controller
        .create_animation_from_to(
            id,
            target,
            PropertyId::TranslateX,
            &[from],
            &[to],
            Interpolation::Linear,
            duration,
        )
        .unwrap()
}

pub fn x_of(transform: &Rc<RefCell<Transform>>) -> f32 {
    transform.borrow().translation().x
}

pub fn assert_f32_eq(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() <= DIFF,
        "actual: {}, expected: {}",
        actual,
        expected
    );
}

pub fn assert_vec3_eq(actual: Vec3, expected: Vec3) {
    assert!(actual.abs_diff_eq(expected, DIFF), "actual: {}, expected: {}", actual, expected);
}

/// Counts events of one kind.
pub fn counter(event: ClipEvent) -> (Rc<Cell<u32>>, ClipListenerRef) {
    let count = Rc::new(Cell::new(0));
    let inner = count.clone();
    let listener: ClipListenerRef = Rc::new(move |_: &AnimationClip, e: ClipEvent| {
        if e == event {
            inner.set(inner.get() + 1);
        }
    });
    (count, listener)
}
