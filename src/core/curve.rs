//! Easing curves used to map control values onto perceptual ranges.

use std::f64::consts::FRAC_PI_2;

/// Easing curves mapping a normalized input [0, 1] onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Curve {
    /// Output equals input
    #[default]
    Linear,

    /// Sine ease-in: gentle near zero, steepest at the top.
    ///
    /// Used for volume so that low-level fades change smoothly.
    InSine,

    /// Exponential ease-in: flat until roughly 0.7, then climbs fast.
    ///
    /// Never reaches exactly 0 except at `t == 0`.
    InExpo,
}

impl Curve {
    /// Applies the curve to `t`, clamped to [0, 1].
    ///
    /// # Examples
    ///
    /// ```
    /// use soundstack::Curve;
    ///
    /// assert_eq!(Curve::Linear.apply(0.5), 0.5);
    /// assert!((Curve::InSine.apply(1.0) - 1.0).abs() < 1e-12);
    /// assert_eq!(Curve::InExpo.apply(0.0), 0.0);
    /// ```
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Curve::Linear => t,
            Curve::InSine => 1.0 - (t * FRAC_PI_2).cos(),
            Curve::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * (t - 1.0))
                }
            }
        }
    }
}

/// Linear crossfade from `a` to `b` by `t`.
pub fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
