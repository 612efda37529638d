//!
//! Animation value buffer.
//!

/// The value of one animated property at a point in time.
///
/// `current` holds the composited value pushed to the target, `interpolated` is the scratch
/// buffer the curve is evaluated into before compositing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AnimationValue {
    current: Vec<f32>,
    interpolated: Vec<f32>,
}

impl AnimationValue {
    /// Creates a zero-filled value with `component_count` floats.
    pub fn new(component_count: usize) -> AnimationValue {
        AnimationValue {
            current: vec![0.0; component_count],
            interpolated: vec![0.0; component_count],
        }
    }

    /// Creates a value holding `values` as current value.
    pub fn from_slice(values: &[f32]) -> AnimationValue {
        AnimationValue {
            current: values.to_vec(),
            interpolated: vec![0.0; values.len()],
        }
    }

    #[inline]
    pub fn component_count(&self) -> usize {
        self.current.len()
    }

    /// Gets the float at `index`.
    #[inline]
    pub fn float(&self, index: usize) -> f32 {
        self.current[index]
    }

    /// Sets the float at `index`.
    #[inline]
    pub fn set_float(&mut self, index: usize, value: f32) {
        self.current[index] = value;
    }

    /// Copies `dst.len()` floats starting at `index` into `dst`.
    #[inline]
    pub fn floats(&self, index: usize, dst: &mut [f32]) {
        dst.copy_from_slice(&self.current[index..index + dst.len()]);
    }

    /// Copies `src` into the value starting at `index`.
    #[inline]
    pub fn set_floats(&mut self, index: usize, src: &[f32]) {
        self.current[index..index + src.len()].copy_from_slice(src);
    }

    #[inline]
    pub fn current(&self) -> &[f32] {
        &self.current
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut [f32] {
        &mut self.current
    }

    #[inline]
    pub fn interpolated(&self) -> &[f32] {
        &self.interpolated
    }

    #[inline]
    pub fn interpolated_mut(&mut self) -> &mut [f32] {
        &mut self.interpolated
    }

    /// Splits into (current, interpolated) for in-place compositing.
    #[inline]
    pub(crate) fn split_mut(&mut self) -> (&mut [f32], &[f32]) {
        (&mut self.current, &self.interpolated)
    }
}

#[cfg(test)]
mod value_tests {
    use wasm_bindgen_test::*;

    use super::*;

    #[test]
    #[wasm_bindgen_test]
    fn test_floats() {
        let mut value = AnimationValue::new(4);
        assert_eq!(value.component_count(), 4);
        assert_eq!(value.current(), &[0.0; 4]);

        value.set_float(1, 2.5);
        assert_eq!(value.float(1), 2.5);

        value.set_floats(2, &[3.0, 4.0]);
        let mut dst = [0.0; 3];
        value.floats(1, &mut dst);
        assert_eq!(dst, [2.5, 3.0, 4.0]);

        value.interpolated_mut()[0] = 9.0;
        assert_eq!(value.interpolated(), &[9.0, 0.0, 0.0, 0.0]);
        assert_eq!(value.float(0), 0.0);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_from_slice() {
        let value = AnimationValue::from_slice(&[1.0, 2.0]);
        assert_eq!(value.current(), &[1.0, 2.0]);
        assert_eq!(value.interpolated(), &[0.0, 0.0]);
    }
}
