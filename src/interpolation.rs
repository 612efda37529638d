//!
//! Curve interpolation types and easing functions.
//!

use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Interpolation law of a curve segment, selected by the segment's first point.
///
/// `Bezier` and `Hermite` read the point tangents, `Flat` and `Smooth` synthesize them,
/// `Bspline` uses the neighbor points as control points, and `Step` holds the first value.
/// All easing types remap the segment parameter and finish with a linear blend.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "rkyv", derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Interpolation {
    Bezier,
    Bspline,
    Flat,
    Hermite,
    #[default]
    Linear,
    Smooth,
    Step,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    QuadraticOutIn,
    CubicIn,
    CubicOut,
    CubicInOut,
    CubicOutIn,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuarticOutIn,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    QuinticOutIn,
    SineIn,
    SineOut,
    SineInOut,
    SineOutIn,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    ExponentialOutIn,
    CircularIn,
    CircularOut,
    CircularInOut,
    CircularOutIn,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    ElasticOutIn,
    OvershootIn,
    OvershootOut,
    OvershootInOut,
    OvershootOutIn,
    BounceIn,
    BounceOut,
    BounceInOut,
    BounceOutIn,
}

const NAMES: [(&str, Interpolation); 47] = [
    ("BEZIER", Interpolation::Bezier),
    ("BSPLINE", Interpolation::Bspline),
    ("FLAT", Interpolation::Flat),
    ("HERMITE", Interpolation::Hermite),
    ("LINEAR", Interpolation::Linear),
    ("SMOOTH", Interpolation::Smooth),
    ("STEP", Interpolation::Step),
    ("QUADRATIC_IN", Interpolation::QuadraticIn),
    ("QUADRATIC_OUT", Interpolation::QuadraticOut),
    ("QUADRATIC_IN_OUT", Interpolation::QuadraticInOut),
    ("QUADRATIC_OUT_IN", Interpolation::QuadraticOutIn),
    ("CUBIC_IN", Interpolation::CubicIn),
    ("CUBIC_OUT", Interpolation::CubicOut),
    ("CUBIC_IN_OUT", Interpolation::CubicInOut),
    ("CUBIC_OUT_IN", Interpolation::CubicOutIn),
    ("QUARTIC_IN", Interpolation::QuarticIn),
    ("QUARTIC_OUT", Interpolation::QuarticOut),
    ("QUARTIC_IN_OUT", Interpolation::QuarticInOut),
    ("QUARTIC_OUT_IN", Interpolation::QuarticOutIn),
    ("QUINTIC_IN", Interpolation::QuinticIn),
    ("QUINTIC_OUT", Interpolation::QuinticOut),
    ("QUINTIC_IN_OUT", Interpolation::QuinticInOut),
    ("QUINTIC_OUT_IN", Interpolation::QuinticOutIn),
    ("SINE_IN", Interpolation::SineIn),
    ("SINE_OUT", Interpolation::SineOut),
    ("SINE_IN_OUT", Interpolation::SineInOut),
    ("SINE_OUT_IN", Interpolation::SineOutIn),
    ("EXPONENTIAL_IN", Interpolation::ExponentialIn),
    ("EXPONENTIAL_OUT", Interpolation::ExponentialOut),
    ("EXPONENTIAL_IN_OUT", Interpolation::ExponentialInOut),
    ("EXPONENTIAL_OUT_IN", Interpolation::ExponentialOutIn),
    ("CIRCULAR_IN", Interpolation::CircularIn),
    ("CIRCULAR_OUT", Interpolation::CircularOut),
    ("CIRCULAR_IN_OUT", Interpolation::CircularInOut),
    ("CIRCULAR_OUT_IN", Interpolation::CircularOutIn),
    ("ELASTIC_IN", Interpolation::ElasticIn),
    ("ELASTIC_OUT", Interpolation::ElasticOut),
    ("ELASTIC_IN_OUT", Interpolation::ElasticInOut),
    ("ELASTIC_OUT_IN", Interpolation::ElasticOutIn),
    ("OVERSHOOT_IN", Interpolation::OvershootIn),
    ("OVERSHOOT_OUT", Interpolation::OvershootOut),
    ("OVERSHOOT_IN_OUT", Interpolation::OvershootInOut),
    ("OVERSHOOT_OUT_IN", Interpolation::OvershootOutIn),
    ("BOUNCE_IN", Interpolation::BounceIn),
    ("BOUNCE_OUT", Interpolation::BounceOut),
    ("BOUNCE_IN_OUT", Interpolation::BounceInOut),
    ("BOUNCE_OUT_IN", Interpolation::BounceOutIn),
];

impl Interpolation {
    /// Every interpolation type, in declaration order.
    pub fn all() -> impl Iterator<Item = Interpolation> {
        NAMES.iter().map(|(_, interp)| *interp)
    }

    /// Parses a name like `LINEAR` or `INTERPOLATION_LINEAR`.
    pub fn from_name(name: &str) -> Option<Interpolation> {
        let name = name.strip_prefix("INTERPOLATION_").unwrap_or(name);
        NAMES.iter().find(|(n, _)| *n == name).map(|(_, interp)| *interp)
    }

    /// Canonical name, without prefix.
    pub fn name(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, interp)| interp == self)
            .map(|(n, _)| *n)
            .unwrap_or("LINEAR")
    }

    /// Whether the type reads the tangents stored in curve points.
    #[inline]
    pub fn needs_tangents(&self) -> bool {
        matches!(self, Interpolation::Bezier | Interpolation::Hermite)
    }

    /// Whether the type is an easing remap finished by a linear blend.
    #[inline]
    pub fn is_easing(&self) -> bool {
        !matches!(
            self,
            Interpolation::Bezier
                | Interpolation::Bspline
                | Interpolation::Flat
                | Interpolation::Hermite
                | Interpolation::Linear
                | Interpolation::Smooth
                | Interpolation::Step
        )
    }

    /// Remaps the segment parameter `t`. Non-easing types return `t` unchanged.
    pub fn ease(&self, t: f32) -> f32 {
        let mut t = t;
        match self {
            Interpolation::QuadraticIn => t *= t,
            Interpolation::QuadraticOut => t *= -(t - 2.0),
            Interpolation::QuadraticInOut => {
                let tx2 = t * 2.0;
                if tx2 < 1.0 {
                    t = 0.5 * (tx2 * tx2);
                } else {
                    let temp = tx2 - 1.0;
                    t = 0.5 * (-(temp * (temp - 2.0)) + 1.0);
                }
            }
            Interpolation::QuadraticOutIn => {
                if t < 0.5 {
                    t = 2.0 * t * (1.0 - t);
                } else {
                    t = 1.0 + 2.0 * t * (t - 1.0);
                }
            }
            Interpolation::CubicIn => t *= t * t,
            Interpolation::CubicOut => {
                t -= 1.0;
                t = t * t * t + 1.0;
            }
            Interpolation::CubicInOut => {
                t *= 2.0;
                if t < 1.0 {
                    t = t * t * t * 0.5;
                } else {
                    t -= 2.0;
                    t = (t * t * t + 2.0) * 0.5;
                }
            }
            Interpolation::CubicOutIn => {
                t = 2.0 * t - 1.0;
                t = (t * t * t + 1.0) * 0.5;
            }
            Interpolation::QuarticIn => t *= t * t * t,
            Interpolation::QuarticOut => {
                t -= 1.0;
                t = -(t * t * t * t) + 1.0;
            }
            Interpolation::QuarticInOut => {
                t *= 2.0;
                if t < 1.0 {
                    t = 0.5 * t * t * t * t;
                } else {
                    t -= 2.0;
                    t = -0.5 * (t * t * t * t - 2.0);
                }
            }
            Interpolation::QuarticOutIn => {
                t = 2.0 * t - 1.0;
                if t < 0.0 {
                    t = 0.5 * (-(t * t) * t * t + 1.0);
                } else {
                    t = 0.5 * (t * t * t * t + 1.0);
                }
            }
            Interpolation::QuinticIn => t *= t * t * t * t,
            Interpolation::QuinticOut => {
                t -= 1.0;
                t = t * t * t * t * t + 1.0;
            }
            Interpolation::QuinticInOut => {
                t *= 2.0;
                if t < 1.0 {
                    t = 0.5 * t * t * t * t * t;
                } else {
                    t -= 2.0;
                    t = 0.5 * (t * t * t * t * t + 2.0);
                }
            }
            Interpolation::QuinticOutIn => {
                t = 2.0 * t - 1.0;
                t = 0.5 * (t * t * t * t * t + 1.0);
            }
            Interpolation::SineIn => t = -((t * FRAC_PI_2).cos() - 1.0),
            Interpolation::SineOut => t = (t * FRAC_PI_2).sin(),
            Interpolation::SineInOut => t = -0.5 * ((PI * t).cos() - 1.0),
            Interpolation::SineOutIn => {
                if t < 0.5 {
                    t = 0.5 * (PI * t).sin();
                } else {
                    t = -0.5 * (FRAC_PI_2 * (2.0 * t - 1.0)).cos() + 1.0;
                }
            }
            Interpolation::ExponentialIn => {
                if t != 0.0 {
                    t = (10.0 * (t - 1.0)).exp();
                }
            }
            Interpolation::ExponentialOut => {
                if t != 1.0 {
                    t = -(-10.0 * t).exp() + 1.0;
                }
            }
            Interpolation::ExponentialInOut => {
                if t != 0.0 && t != 1.0 {
                    if t < 0.5 {
                        t = 0.5 * (10.0 * (2.0 * t - 1.0)).exp();
                    } else {
                        t = -0.5 * (10.0 * (-2.0 * t + 1.0)).exp() + 1.0;
                    }
                }
            }
            Interpolation::ExponentialOutIn => {
                if t != 0.0 && t != 1.0 {
                    if t < 0.5 {
                        t = -0.5 * (-20.0 * t).exp() + 0.5;
                    } else {
                        t = 0.5 * (20.0 * (t - 1.0)).exp() + 0.5;
                    }
                }
            }
            Interpolation::CircularIn => t = -((1.0 - t * t).sqrt() - 1.0),
            Interpolation::CircularOut => {
                t -= 1.0;
                t = (1.0 - t * t).sqrt();
            }
            Interpolation::CircularInOut => {
                t *= 2.0;
                if t < 1.0 {
                    t = 0.5 * (-(1.0 - t * t).sqrt() + 1.0);
                } else {
                    t -= 2.0;
                    t = 0.5 * ((1.0 - t * t).sqrt() + 1.0);
                }
            }
            Interpolation::CircularOutIn => {
                t = 2.0 * t - 1.0;
                if t < 0.0 {
                    t = 0.5 * (1.0 - t * t).sqrt();
                } else {
                    t = 0.5 * (2.0 - (1.0 - t * t).sqrt());
                }
            }
            Interpolation::ElasticIn => {
                if t != 0.0 && t != 1.0 {
                    t -= 1.0;
                    t = -1.0 * ((10.0 * t).exp() * ((t - 0.075) * TAU / 0.3).sin());
                }
            }
            Interpolation::ElasticOut => {
                if t != 0.0 && t != 1.0 {
                    t = (-10.0 * t).exp() * ((t - 0.075) * TAU / 0.3).sin() + 1.0;
                }
            }
            Interpolation::ElasticInOut => {
                if t != 0.0 && t != 1.0 {
                    t = 2.0 * t - 1.0;
                    if t < 0.0 {
                        t = -0.5 * ((10.0 * t).exp() * ((t - 0.1125) * TAU / 0.45).sin());
                    } else {
                        t = 0.5 * (-10.0 * t).exp() * ((t - 0.1125) * TAU / 0.45).sin() + 1.0;
                    }
                }
            }
            Interpolation::ElasticOutIn => {
                if t != 0.0 && t != 1.0 {
                    t *= 2.0;
                    if t < 1.0 {
                        t = 0.5 * ((-10.0 * t).exp() * ((t - 0.1125) * TAU / 0.45).sin()) + 0.5;
                    } else {
                        t = 0.5 * ((10.0 * (t - 2.0)).exp() * ((t - 0.1125) * TAU / 0.45).sin()) + 0.5;
                    }
                }
            }
            Interpolation::OvershootIn => t = t * t * (2.70158 * t - 1.70158),
            Interpolation::OvershootOut => {
                t -= 1.0;
                t = t * t * (2.70158 * t + 1.70158) + 1.0;
            }
            Interpolation::OvershootInOut => {
                t *= 2.0;
                if t < 1.0 {
                    t = 0.5 * t * t * (3.5949095 * t - 2.5949095);
                } else {
                    t -= 2.0;
                    t = 0.5 * (t * t * (3.5949095 * t + 2.5949095) + 2.0);
                }
            }
            Interpolation::OvershootOutIn => {
                t = 2.0 * t - 1.0;
                if t < 0.0 {
                    t = 0.5 * (t * t * (3.5949095 * t + 2.5949095) + 1.0);
                } else {
                    t = 0.5 * (t * t * (3.5949095 * t - 2.5949095) + 1.0);
                }
            }
            Interpolation::BounceIn => t = 1.0 - bounce(1.0 - t),
            Interpolation::BounceOut => t = bounce(t),
            Interpolation::BounceInOut => {
                if t < 0.5 {
                    t = (1.0 - bounce(1.0 - t * 2.0)) * 0.5;
                } else {
                    t = 0.5 * bounce(t * 2.0 - 1.0) + 0.5;
                }
            }
            Interpolation::BounceOutIn => {
                if t < 0.1818181818 {
                    t = 15.125 * t * t;
                } else if t < 0.3636363636 {
                    t = 1.5 + (-8.250000001 + 15.125 * t) * t;
                } else if t < 0.4545454546 {
                    t = 3.0 + (-12.375 + 15.125 * t) * t;
                } else if t < 0.5 {
                    t = 3.9375 + (-14.4375 + 15.125 * t) * t;
                } else if t <= 0.5454545455 {
                    t = -3.625000004 + (15.81250001 - 15.125 * t) * t;
                } else if t <= 0.6363636365 {
                    t = -4.75 + (17.875 - 15.125 * t) * t;
                } else if t <= 0.8181818180 {
                    t = -7.374999995 + (21.99999999 - 15.125 * t) * t;
                } else {
                    t = -14.125 + (30.25 - 15.125 * t) * t;
                }
            }
            _ => {}
        }
        t
    }
}

// Cascaded parabola of the bounce family.
#[inline]
fn bounce(mut t: f32) -> f32 {
    if t < 0.36363636363636365 {
        7.5625 * t * t
    } else if t < 0.7272727272727273 {
        t -= 0.5454545454545454;
        7.5625 * t * t + 0.75
    } else if t < 0.9090909090909091 {
        t -= 0.8181818181818182;
        7.5625 * t * t + 0.9375
    } else {
        t -= 0.9545454545454546;
        7.5625 * t * t + 0.984375
    }
}

#[cfg(test)]
mod interpolation_tests {
    use wasm_bindgen_test::*;

    use super::*;

    #[test]
    #[wasm_bindgen_test]
    fn test_names() {
        assert_eq!(Interpolation::all().count(), 47);
        for interp in Interpolation::all() {
            assert_eq!(Interpolation::from_name(interp.name()), Some(interp));
        }
        assert_eq!(
            Interpolation::from_name("INTERPOLATION_BOUNCE_OUT_IN"),
            Some(Interpolation::BounceOutIn)
        );
        assert_eq!(Interpolation::from_name("SMOOTHSTEP"), None);
        assert_eq!(Interpolation::default(), Interpolation::Linear);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_classification() {
        assert!(Interpolation::Bezier.needs_tangents());
        assert!(Interpolation::Hermite.needs_tangents());
        assert!(!Interpolation::Smooth.needs_tangents());
        assert!(!Interpolation::Linear.is_easing());
        assert!(!Interpolation::Step.is_easing());
        assert!(Interpolation::SineIn.is_easing());
        assert_eq!(Interpolation::all().filter(|i| i.is_easing()).count(), 40);
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_ease_endpoints() {
        for interp in Interpolation::all().filter(|i| i.is_easing()) {
            let start = interp.ease(0.0);
            let end = interp.ease(1.0);
            assert!(start.abs() < 1e-3, "{:?} ease(0) = {}", interp, start);
            assert!((end - 1.0).abs() < 1e-3, "{:?} ease(1) = {}", interp, end);
        }
    }

    #[test]
    #[wasm_bindgen_test]
    fn test_ease_values() {
        assert_eq!(Interpolation::Linear.ease(0.3), 0.3);
        assert_eq!(Interpolation::QuadraticIn.ease(0.5), 0.25);
        assert_eq!(Interpolation::QuadraticOut.ease(0.5), 0.75);
        assert_eq!(Interpolation::CubicIn.ease(0.5), 0.125);
        assert_eq!(Interpolation::CubicInOut.ease(0.5), 0.5);
        assert_eq!(Interpolation::QuinticOutIn.ease(0.5), 0.5);
        assert!((Interpolation::SineInOut.ease(0.5) - 0.5).abs() < 1e-6);
        assert!(Interpolation::OvershootIn.ease(0.2) < 0.0);
        assert!(Interpolation::OvershootOut.ease(0.8) > 1.0);
        assert_eq!(Interpolation::BounceOut.ease(0.2), 7.5625 * 0.2 * 0.2);
    }
}
