//!
//! Curve data structure and evaluation.
//!

use glam::Quat;

use crate::interpolation::Interpolation;

/// An n-dimensional curve over `[0, 1]`.
///
/// Point times, values, tangents and interpolation types are all stored as separate buffers
/// in order to access the cache coherently. Times are accessed alone by the binary search
/// that starts every evaluation.
///
/// The first point always sits at time 0 and the last one at time 1. An optional quaternion
/// offset marks 4 consecutive components that are interpolated spherically.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "rkyv", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Curve {
    point_count: u32,
    component_count: u32,
    times: Vec<f32>,
    values: Vec<f32>,
    in_tangents: Vec<f32>,
    out_tangents: Vec<f32>,
    interpolations: Vec<Interpolation>,
    quaternion_offset: Option<u32>,
}

impl Curve {
    /// Creates a curve of `point_count` linear points, each holding `component_count` floats.
    pub fn new(point_count: usize, component_count: usize) -> Curve {
        assert!(point_count >= 1, "curve needs at least one point");
        assert!(component_count >= 1, "curve needs at least one component");

        let mut times = vec![0.0; point_count];
        if point_count > 1 {
            times[point_count - 1] = 1.0;
        }
        let floats = point_count * component_count;
        Curve {
            point_count: point_count as u32,
            component_count: component_count as u32,
            times,
            values: vec![0.0; floats],
            in_tangents: vec![0.0; floats],
            out_tangents: vec![0.0; floats],
            interpolations: vec![Interpolation::Linear; point_count],
            quaternion_offset: None,
        }
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count as usize
    }

    #[inline]
    pub fn component_count(&self) -> usize {
        self.component_count as usize
    }

    /// Time of the first point.
    #[inline]
    pub fn start_time(&self) -> f32 {
        self.times[0]
    }

    /// Time of the last point.
    #[inline]
    pub fn end_time(&self) -> f32 {
        self.times[self.point_count() - 1]
    }

    /// Point times.
    #[inline]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    pub fn point_time(&self, index: usize) -> f32 {
        self.times[index]
    }

    #[inline]
    pub fn point_interpolation(&self, index: usize) -> Interpolation {
        self.interpolations[index]
    }

    /// Value of the point at `index`.
    #[inline]
    pub fn point_value(&self, index: usize) -> &[f32] {
        let cc = self.component_count();
        &self.values[index * cc..(index + 1) * cc]
    }

    /// (value, in tangent, out tangent) of the point at `index`.
    pub fn point_values(&self, index: usize) -> (&[f32], &[f32], &[f32]) {
        let range = self.point_range(index);
        (
            &self.values[range.clone()],
            &self.in_tangents[range.clone()],
            &self.out_tangents[range],
        )
    }

    /// Component index of the quaternion span, if any.
    #[inline]
    pub fn quaternion_offset(&self) -> Option<usize> {
        self.quaternion_offset.map(|o| o as usize)
    }

    /// Marks components `offset..offset + 4` as a unit quaternion.
    pub fn set_quaternion_offset(&mut self, offset: usize) {
        assert!(
            self.component_count() >= 4 && offset <= self.component_count() - 4,
            "quaternion offset out of range"
        );
        self.quaternion_offset = Some(offset as u32);
    }

    /// Sets a point with zero tangents.
    pub fn set_point(&mut self, index: usize, time: f32, value: &[f32], interpolation: Interpolation) {
        self.set_point_time_value(index, time, value, interpolation);
        let range = self.point_range(index);
        self.in_tangents[range.clone()].fill(0.0);
        self.out_tangents[range].fill(0.0);
    }

    /// Sets a point and its tangents.
    pub fn set_point_with_tangents(
        &mut self,
        index: usize,
        time: f32,
        value: &[f32],
        interpolation: Interpolation,
        in_value: &[f32],
        out_value: &[f32],
    ) {
        self.set_point_time_value(index, time, value, interpolation);
        self.write_tangents(index, in_value, out_value);
    }

    /// Changes the interpolation and tangents of a point, keeping its time and value.
    pub fn set_tangent(&mut self, index: usize, interpolation: Interpolation, in_value: &[f32], out_value: &[f32]) {
        assert!(index < self.point_count(), "point index out of range");
        self.interpolations[index] = interpolation;
        self.write_tangents(index, in_value, out_value);
    }

    fn set_point_time_value(&mut self, index: usize, time: f32, value: &[f32], interpolation: Interpolation) {
        let count = self.point_count();
        assert!(index < count, "point index out of range");
        assert!((0.0..=1.0).contains(&time), "point time out of [0, 1]");
        assert!(
            count == 1 || ((index != 0 || time == 0.0) && (index != count - 1 || time == 1.0)),
            "curve end points must stay at 0 and 1"
        );
        assert_eq!(value.len(), self.component_count(), "value size mismatch");

        self.times[index] = time;
        let range = self.point_range(index);
        self.values[range].copy_from_slice(value);
        self.interpolations[index] = interpolation;
    }

    fn write_tangents(&mut self, index: usize, in_value: &[f32], out_value: &[f32]) {
        assert_eq!(in_value.len(), self.component_count(), "in tangent size mismatch");
        assert_eq!(out_value.len(), self.component_count(), "out tangent size mismatch");
        let range = self.point_range(index);
        self.in_tangents[range.clone()].copy_from_slice(in_value);
        self.out_tangents[range].copy_from_slice(out_value);
    }

    #[inline]
    fn point_range(&self, index: usize) -> std::ops::Range<usize> {
        let cc = self.component_count();
        index * cc..(index + 1) * cc
    }

    /// Evaluates the whole curve at `time` into `dst`.
    #[inline]
    pub fn evaluate(&self, time: f32, dst: &mut [f32]) {
        self.evaluate_range(time, 0.0, 1.0, 0.0, dst);
    }

    /// Evaluates the sub-range `[start_time, end_time]` of the curve at `time` into `dst`.
    ///
    /// `time` is local to the sub-range. With a zero `loop_blend_time`, time is clamped to
    /// the sub-range end points. Otherwise times past either end blend between the last and
    /// first point over `loop_blend_time`.
    pub fn evaluate_range(&self, time: f32, start_time: f32, end_time: f32, loop_blend_time: f32, dst: &mut [f32]) {
        assert!(
            start_time >= 0.0 && start_time <= end_time && end_time <= 1.0 && loop_blend_time >= 0.0,
            "invalid evaluation range"
        );
        let cc = self.component_count();
        let dst = &mut dst[..cc];

        if self.point_count == 1 {
            dst.copy_from_slice(self.point_value(0));
            return;
        }

        let mut min = 0;
        let mut max = self.point_count() - 1;
        let mut local_time = time;
        if start_time > 0.0 || end_time < 1.0 {
            min = self.determine_index(start_time, 0, max);
            max = self.determine_index(end_time, min, max);
            local_time = self.times[min] + (self.times[max] - self.times[min]) * time;
        }

        if loop_blend_time == 0.0 {
            local_time = local_time.clamp(self.times[min], self.times[max]);
        }

        if local_time == self.times[min] {
            dst.copy_from_slice(self.point_value(min));
            return;
        }
        if local_time == self.times[max] {
            dst.copy_from_slice(self.point_value(max));
            return;
        }

        let (index, to, t) = if local_time > self.times[max] {
            // Looping forward.
            (max, min, (local_time - self.times[max]) / loop_blend_time)
        } else if local_time < self.times[min] {
            // Looping in reverse.
            (min, max, (self.times[min] - local_time) / loop_blend_time)
        } else {
            let index = self.determine_index(local_time, min, max);
            let to = if index == max { index } else { index + 1 };
            let t = (local_time - self.times[index]) / (self.times[to] - self.times[index]);
            (index, to, t)
        };
        let from = index;

        match self.interpolations[from] {
            Interpolation::Bezier => self.interpolate_bezier(t, from, to, dst),
            Interpolation::Bspline => {
                let c0 = if index == 0 { from } else { index - 1 };
                let c3 = if index + 2 >= self.point_count() { to } else { index + 2 };
                self.interpolate_bspline(t, c0, from, to, c3, dst);
            }
            Interpolation::Flat => self.interpolate_hermite_flat(t, from, to, dst),
            Interpolation::Hermite => self.interpolate_hermite(t, from, to, dst),
            Interpolation::Smooth => self.interpolate_hermite_smooth(t, from, to, dst),
            Interpolation::Step => dst.copy_from_slice(self.point_value(from)),
            Interpolation::Linear => self.interpolate_linear(t, from, to, dst),
            easing => self.interpolate_linear(easing.ease(t), from, to, dst),
        }
    }

    /// Binary search of the point whose segment `[times[i], times[i + 1])` contains `time`,
    /// limited to `[min, max]`. Returns `max` when no segment matches.
    pub fn determine_index(&self, time: f32, min: usize, max: usize) -> usize {
        let (mut min, mut max) = (min, max);
        while min <= max {
            let mid = (min + max) >> 1;
            let time_mid = self.times[mid];
            if time >= time_mid && (mid + 1 >= self.point_count() || time < self.times[mid + 1]) {
                return mid;
            } else if time < time_mid {
                if mid == 0 {
                    return 0;
                }
                max = mid - 1;
            } else {
                min = mid + 1;
            }
        }
        max
    }

    // Runs `scalar` on every component outside the quaternion span, copying components that
    // are equal at both ends, then slerps the quaternion span with `s`.
    #[inline]
    fn blend_components<F>(&self, s: f32, from: usize, to: usize, dst: &mut [f32], scalar: F)
    where
        F: Fn(usize, f32, f32) -> f32,
    {
        let from_value = self.point_value(from);
        let to_value = self.point_value(to);
        let (quat_begin, quat_end) = match self.quaternion_offset() {
            Some(offset) => (offset, offset + 4),
            None => (dst.len(), dst.len()),
        };

        for i in (0..quat_begin).chain(quat_end..dst.len()) {
            dst[i] = if from_value[i] == to_value[i] {
                from_value[i]
            } else {
                scalar(i, from_value[i], to_value[i])
            };
        }

        if quat_begin < quat_end {
            interpolate_quaternion(
                s,
                &from_value[quat_begin..quat_end],
                &to_value[quat_begin..quat_end],
                &mut dst[quat_begin..quat_end],
            );
        }
    }

    fn interpolate_bezier(&self, s: f32, from: usize, to: usize, dst: &mut [f32]) {
        let s_2 = s * s;
        let eq0 = 1.0 - s;
        let eq0_2 = eq0 * eq0;
        let eq1 = eq0_2 * eq0;
        let eq2 = 3.0 * s * eq0_2;
        let eq3 = 3.0 * s_2 * eq0;
        let eq4 = s_2 * s;

        let out_value = &self.out_tangents[self.point_range(from)];
        let in_value = &self.in_tangents[self.point_range(to)];
        self.blend_components(s, from, to, dst, |i, a, b| {
            a * eq1 + out_value[i] * eq2 + in_value[i] * eq3 + b * eq4
        });
    }

    fn interpolate_bspline(&self, s: f32, c0: usize, c1: usize, c2: usize, c3: usize, dst: &mut [f32]) {
        let s_2 = s * s;
        let s_3 = s_2 * s;
        let eq0 = (-s_3 + 3.0 * s_2 - 3.0 * s + 1.0) / 6.0;
        let eq1 = (3.0 * s_3 - 6.0 * s_2 + 4.0) / 6.0;
        let eq2 = (-3.0 * s_3 + 3.0 * s_2 + 3.0 * s + 1.0) / 6.0;
        let eq3 = s_3 / 6.0;

        let c0_value = self.point_value(c0);
        let c3_value = self.point_value(c3);
        self.blend_components(s, c1, c2, dst, |i, a, b| {
            c0_value[i] * eq0 + a * eq1 + b * eq2 + c3_value[i] * eq3
        });
    }

    fn interpolate_hermite(&self, s: f32, from: usize, to: usize, dst: &mut [f32]) {
        let (h00, h01, h10, h11) = hermite_basis(s);
        let out_value = &self.out_tangents[self.point_range(from)];
        let in_value = &self.in_tangents[self.point_range(to)];
        self.blend_components(s, from, to, dst, |i, a, b| {
            h00 * a + h01 * b + h10 * out_value[i] + h11 * in_value[i]
        });
    }

    fn interpolate_hermite_flat(&self, s: f32, from: usize, to: usize, dst: &mut [f32]) {
        let (h00, h01, _, _) = hermite_basis(s);
        self.blend_components(s, from, to, dst, |_, a, b| h00 * a + h01 * b);
    }

    fn interpolate_hermite_smooth(&self, s: f32, from: usize, to: usize, dst: &mut [f32]) {
        let (h00, h01, h10, h11) = hermite_basis(s);
        let count = self.point_count();
        let prev = if from == 0 { None } else { Some(from - 1) };
        let next = if from + 2 == count || to + 1 >= count {
            None
        } else {
            Some(to + 1)
        };
        let (time_from, time_to) = (self.times[from], self.times[to]);

        self.blend_components(s, from, to, dst, |i, a, b| {
            let out_value = match prev {
                None => b - a,
                Some(p) => {
                    let time_prev = self.times[p];
                    (b - self.point_value(p)[i]) * ((time_from - time_prev) / (time_to - time_prev))
                }
            };
            let in_value = match next {
                None => b - a,
                Some(n) => {
                    let time_next = self.times[n];
                    (self.point_value(n)[i] - a) * ((time_to - time_from) / (time_next - time_from))
                }
            };
            h00 * a + h01 * b + h10 * out_value + h11 * in_value
        });
    }

    fn interpolate_linear(&self, s: f32, from: usize, to: usize, dst: &mut [f32]) {
        self.blend_components(s, from, to, dst, |_, a, b| a + (b - a) * s);
    }
}

#[inline]
fn hermite_basis(s: f32) -> (f32, f32, f32, f32) {
    let s_2 = s * s;
    let s_3 = s_2 * s;
    (
        2.0 * s_3 - 3.0 * s_2 + 1.0,
        -2.0 * s_3 + 3.0 * s_2,
        s_3 - 2.0 * s_2 + s,
        s_3 - s_2,
    )
}

/// Spherical interpolation of the (x, y, z, w) quaternions `from` and `to`.
/// A negative `s` swaps the end points and negates the parameter.
pub(crate) fn interpolate_quaternion(s: f32, from: &[f32], to: &[f32], dst: &mut [f32]) {
    if from == to {
        dst.copy_from_slice(from);
        return;
    }
    let qa = Quat::from_slice(from);
    let qb = Quat::from_slice(to);
    let q = if s >= 0.0 { qa.slerp(qb, s) } else { qb.slerp(qa, -s) };
    q.write_to_slice(dst);
}

#[cfg(test)]
mod curve_tests {
    use glam::Vec3;
    use rand::{Rng, SeedableRng};
    use wasm_bindgen_test::*;

    use super::*;

    fn linear_curve(values: &[&[f32]], times: &[f32], interpolation: Interpolation) -> Curve {
        let mut curve = Curve::new(values.len(), values[0].len());
        for (i, value) in values.iter().enumerate() {
            curve.set_point(i, times[i], value, interpolation);
        }
        curve
    }

    fn execute_test(curve: &Curve, time: f32, expected: &[f32]) {
        let mut dst = vec![0.0; curve.component_count()];
        curve.evaluate(time, &mut dst);
        for (a, b) in dst.iter().zip(expected.iter()) {
            assert!((a - b).abs() <= 1e-5, "{:?} != {:?}", dst, expected);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_new() {
        let curve = Curve::new(3, 2);
        assert_eq!(curve.point_count(), 3);
        assert_eq!(curve.component_count(), 2);
        assert_eq!(curve.start_time(), 0.0);
        assert_eq!(curve.end_time(), 1.0);
        assert_eq!(curve.point_interpolation(1), Interpolation::Linear);
        assert_eq!(curve.quaternion_offset(), None);

        let single = Curve::new(1, 3);
        assert_eq!(single.start_time(), 0.0);
        assert_eq!(single.end_time(), 0.0);
    }

    #[test]
    #[wasm_bindgen_test]
    #[should_panic]
    fn test_set_point_keeps_end_points() {
        let mut curve = Curve::new(2, 1);
        curve.set_point(0, 0.5, &[1.0], Interpolation::Linear);
    }

    #[test]
    #[wasm_bindgen_test]
    #[should_panic]
    fn test_quaternion_offset_range() {
        let mut curve = Curve::new(2, 5);
        curve.set_quaternion_offset(2);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_point_values() {
        let mut curve = Curve::new(2, 2);
        curve.set_point_with_tangents(0, 0.0, &[1.0, 2.0], Interpolation::Hermite, &[3.0, 4.0], &[5.0, 6.0]);
        let (value, in_value, out_value) = curve.point_values(0);
        assert_eq!(value, &[1.0, 2.0]);
        assert_eq!(in_value, &[3.0, 4.0]);
        assert_eq!(out_value, &[5.0, 6.0]);

        curve.set_tangent(0, Interpolation::Bezier, &[0.0, 0.0], &[1.0, 1.0]);
        let (value, in_value, out_value) = curve.point_values(0);
        assert_eq!(value, &[1.0, 2.0]);
        assert_eq!(in_value, &[0.0, 0.0]);
        assert_eq!(out_value, &[1.0, 1.0]);
        assert_eq!(curve.point_interpolation(0), Interpolation::Bezier);

        curve.set_point(0, 0.0, &[7.0, 8.0], Interpolation::Step);
        let (_, in_value, out_value) = curve.point_values(0);
        assert_eq!(in_value, &[0.0, 0.0]);
        assert_eq!(out_value, &[0.0, 0.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_determine_index() {
        let curve = linear_curve(&[&[0.0], &[1.0], &[2.0], &[3.0]], &[0.0, 0.25, 0.5, 1.0], Interpolation::Linear);
        assert_eq!(curve.determine_index(0.0, 0, 3), 0);
        assert_eq!(curve.determine_index(0.1, 0, 3), 0);
        assert_eq!(curve.determine_index(0.25, 0, 3), 1);
        assert_eq!(curve.determine_index(0.3, 0, 3), 1);
        assert_eq!(curve.determine_index(0.75, 0, 3), 2);
        assert_eq!(curve.determine_index(1.0, 0, 3), 3);
        assert_eq!(curve.determine_index(0.75, 2, 3), 2);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_single_point() {
        let mut curve = Curve::new(1, 3);
        curve.set_point(0, 0.0, &[1.0, 2.0, 3.0], Interpolation::Bezier);
        for time in [0.0, 0.3, 1.0] {
            let mut dst = [0.0; 3];
            curve.evaluate(time, &mut dst);
            assert_eq!(dst, [1.0, 2.0, 3.0]);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_boundary_exact() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for interpolation in Interpolation::all() {
            let mut curve = Curve::new(4, 3);
            for i in 0..4 {
                let time = [0.0, 0.3, 0.6, 1.0][i];
                let value: Vec<f32> = (0..3).map(|_| rng.gen_range(-100.0..100.0)).collect();
                let tangent: Vec<f32> = (0..3).map(|_| rng.gen_range(-10.0..10.0)).collect();
                curve.set_point_with_tangents(i, time, &value, interpolation, &tangent, &tangent);
            }
            let mut dst = [0.0; 3];
            curve.evaluate(0.0, &mut dst);
            assert_eq!(&dst, curve.point_value(0), "{:?}", interpolation);
            curve.evaluate(1.0, &mut dst);
            assert_eq!(&dst, curve.point_value(3), "{:?}", interpolation);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_clamp() {
        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Linear);
        execute_test(&curve, -0.5, &[0.0]);
        execute_test(&curve, 1.5, &[10.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_linear() {
        let curve = linear_curve(&[&[0.0, 4.0, -2.0], &[10.0, 4.0, 2.0]], &[0.0, 1.0], Interpolation::Linear);
        execute_test(&curve, 0.5, &[5.0, 4.0, 0.0]);
        execute_test(&curve, 0.25, &[2.5, 4.0, -1.0]);

        let curve = linear_curve(&[&[0.0], &[10.0], &[30.0]], &[0.0, 0.5, 1.0], Interpolation::Linear);
        execute_test(&curve, 0.25, &[5.0]);
        execute_test(&curve, 0.75, &[20.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_step() {
        let curve = linear_curve(&[&[1.0], &[5.0], &[9.0]], &[0.0, 0.5, 1.0], Interpolation::Step);
        execute_test(&curve, 0.1, &[1.0]);
        execute_test(&curve, 0.49, &[1.0]);
        execute_test(&curve, 0.5, &[5.0]);
        execute_test(&curve, 0.99, &[5.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_equal_components_hold() {
        let curve = linear_curve(&[&[0.1, 7.0], &[0.9, 7.0]], &[0.0, 1.0], Interpolation::ElasticOut);
        let mut dst = [0.0; 2];
        for i in 1..10 {
            curve.evaluate(i as f32 / 10.0, &mut dst);
            assert_eq!(dst[1], 7.0);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_tangent_laws() {
        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Bezier);
        execute_test(&curve, 0.5, &[1.25]);

        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Hermite);
        execute_test(&curve, 0.5, &[5.0]);

        let mut curve = Curve::new(2, 1);
        curve.set_point_with_tangents(0, 0.0, &[0.0], Interpolation::Hermite, &[0.0], &[8.0]);
        curve.set_point_with_tangents(1, 1.0, &[10.0], Interpolation::Hermite, &[8.0], &[0.0]);
        // 0.5 * 0 + 0.5 * 10 + 0.125 * 8 - 0.125 * 8
        execute_test(&curve, 0.5, &[5.0]);
        // h00 = 0.896, h01 = 0.104, h10 = 0.128, h11 = -0.032
        execute_test(&curve, 0.2, &[0.104 * 10.0 + 0.128 * 8.0 - 0.032 * 8.0]);

        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Flat);
        execute_test(&curve, 0.5, &[5.0]);
        execute_test(&curve, 0.2, &[1.04]);

        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Smooth);
        execute_test(&curve, 0.5, &[5.0]);

        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Bspline);
        execute_test(&curve, 0.5, &[5.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_easing() {
        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::QuadraticIn);
        execute_test(&curve, 0.5, &[2.5]);

        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::CubicOut);
        execute_test(&curve, 0.5, &[8.75]);

        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::BounceOut);
        execute_test(&curve, 0.2, &[10.0 * Interpolation::BounceOut.ease(0.2)]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_sub_range() {
        let curve = linear_curve(&[&[0.0], &[10.0], &[20.0]], &[0.0, 0.5, 1.0], Interpolation::Linear);
        let mut dst = [0.0];
        curve.evaluate_range(0.5, 0.5, 1.0, 0.0, &mut dst);
        assert_eq!(dst, [15.0]);
        curve.evaluate_range(0.0, 0.5, 1.0, 0.0, &mut dst);
        assert_eq!(dst, [10.0]);
        curve.evaluate_range(1.0, 0.0, 0.5, 0.0, &mut dst);
        assert_eq!(dst, [10.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_loop_blend() {
        let curve = linear_curve(&[&[0.0], &[10.0]], &[0.0, 1.0], Interpolation::Linear);
        let mut dst = [0.0];
        curve.evaluate_range(1.5, 0.0, 1.0, 1.0, &mut dst);
        assert_eq!(dst, [5.0]);
        curve.evaluate_range(1.25, 0.0, 1.0, 0.5, &mut dst);
        assert_eq!(dst, [5.0]);
        curve.evaluate_range(-0.25, 0.0, 1.0, 1.0, &mut dst);
        assert_eq!(dst, [2.5]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_quaternion_slerp() {
        let qa = Quat::IDENTITY;
        let qb = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

        let mut curve = Curve::new(2, 4);
        curve.set_quaternion_offset(0);
        curve.set_point(0, 0.0, &qa.to_array(), Interpolation::Linear);
        curve.set_point(1, 1.0, &qb.to_array(), Interpolation::Linear);

        let mut dst = [0.0; 4];
        curve.evaluate(0.5, &mut dst);
        let q = Quat::from_array(dst);
        assert!((q.length() - 1.0).abs() < 1e-5);
        assert!(q.abs_diff_eq(qa.slerp(qb, 0.5), 1e-5), "{:?}", q);

        // Component-wise average isn't unit length.
        let average = Quat::from_xyzw(
            (qa.x + qb.x) * 0.5,
            (qa.y + qb.y) * 0.5,
            (qa.z + qb.z) * 0.5,
            (qa.w + qb.w) * 0.5,
        );
        assert!(average.length() < 0.99);
        assert!(!q.abs_diff_eq(average, 1e-3));
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_quaternion_span_with_scalars() {
        let qb = Quat::from_rotation_z(1.0);
        let from: Vec<f32> = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0].to_vec();
        let mut to = vec![3.0, 3.0, 3.0];
        to.extend_from_slice(&qb.to_array());
        to.extend_from_slice(&Vec3::new(4.0, 0.0, -4.0).to_array());

        let mut curve = Curve::new(2, 10);
        curve.set_quaternion_offset(3);
        curve.set_point(0, 0.0, &from, Interpolation::Hermite);
        curve.set_point(1, 1.0, &to, Interpolation::Hermite);

        let mut dst = [0.0; 10];
        curve.evaluate(0.5, &mut dst);
        assert_eq!(&dst[0..3], &[2.0, 2.0, 2.0]);
        let q = Quat::from_slice(&dst[3..7]);
        assert!(q.abs_diff_eq(Quat::IDENTITY.slerp(qb, 0.5), 1e-5));
        assert_eq!(&dst[7..10], &[2.0, 0.0, -2.0]);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_quaternion_negative_parameter() {
        let qa = Quat::IDENTITY;
        let qb = Quat::from_rotation_x(1.0);
        let mut dst = [0.0; 4];
        interpolate_quaternion(-0.25, &qa.to_array(), &qb.to_array(), &mut dst);
        assert!(Quat::from_array(dst).abs_diff_eq(qb.slerp(qa, 0.25), 1e-6));
    }
}
