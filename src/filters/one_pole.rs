//! Single-pole IIR lowpass and highpass filters.
//!
//! Both filters share one control, `strength` in [0, 1], which sets the pole
//! through `alpha = sin(strength * pi / 2)`. Strength 0 is a passthrough and
//! strength 1 gives the heaviest smoothing (lowpass) or differencing
//! (highpass). Filter memory is kept per channel and carries across chunks,
//! and keeps tracking the input while a filter is bypassed.

use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer};
use crate::effects::Algorithm;

/// Shared, lock-free parameters of a [`Lowpass`] or [`Highpass`] filter.
#[derive(Debug, Clone)]
pub struct FilterParams {
    active: ActiveFlag,
    strength: AtomicParam,
}

impl FilterParams {
    fn new(strength: f64) -> Self {
        Self {
            active: ActiveFlag::default(),
            strength: AtomicParam::new(strength),
        }
    }

    /// Sets the filter strength in [0, 1].
    pub fn set_strength(&self, strength: f64) {
        self.strength.set_clamped(strength, 0.0, 1.0);
    }

    pub fn strength(&self) -> f64 {
        self.strength.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Pole coefficient for the current strength.
    pub fn alpha(&self) -> f64 {
        (self.strength() * FRAC_PI_2).sin()
    }
}

/// Smooths the stream: `out = (1 - alpha) * in + alpha * prev_out`.
pub struct Lowpass {
    params: Arc<FilterParams>,
    prev: (f64, f64),
}

impl Lowpass {
    /// Creates a lowpass filter at strength 0.5.
    pub fn new() -> Self {
        Self {
            params: Arc::new(FilterParams::new(0.5)),
            prev: (0.0, 0.0),
        }
    }

    pub fn with_strength(self, strength: f64) -> Self {
        self.params.set_strength(strength);
        self
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }
}

impl Default for Lowpass {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Lowpass {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(FilterParams::clone(&self.params)),
            prev: (0.0, 0.0),
        }
    }
}

impl Algorithm for Lowpass {
    type Controls = Arc<FilterParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        let active = self.params.is_active();
        let alpha = self.params.alpha();
        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            let out_l = (1.0 - alpha) * l + alpha * self.prev.0;
            let out_r = (1.0 - alpha) * r + alpha * self.prev.1;
            self.prev = (out_l, out_r);
            if active {
                audio.set(i, out_l, out_r);
            }
        }
    }

    fn reset(&mut self) {
        self.prev = (0.0, 0.0);
    }

    fn controls(&self) -> Self::Controls {
        Arc::clone(&self.params)
    }

    fn is_active(&self) -> bool {
        self.params.is_active()
    }

    fn set_active(&self, active: bool) {
        self.params.set_active(active);
    }
}

/// Emphasizes change: `out = (1 - alpha) * in + alpha * (in - prev_in)`.
pub struct Highpass {
    params: Arc<FilterParams>,
    prev_input: (f64, f64),
}

impl Highpass {
    /// Creates a highpass filter at strength 0.8.
    pub fn new() -> Self {
        Self {
            params: Arc::new(FilterParams::new(0.8)),
            prev_input: (0.0, 0.0),
        }
    }

    pub fn with_strength(self, strength: f64) -> Self {
        self.params.set_strength(strength);
        self
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }
}

impl Default for Highpass {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Highpass {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(FilterParams::clone(&self.params)),
            prev_input: (0.0, 0.0),
        }
    }
}

impl Algorithm for Highpass {
    type Controls = Arc<FilterParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        if !self.params.is_active() {
            if let Some(last) = audio.len().checked_sub(1) {
                self.prev_input = audio.get(last);
            }
            return;
        }

        let alpha = self.params.alpha();
        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            let out_l = (1.0 - alpha) * l + alpha * (l - self.prev_input.0);
            let out_r = (1.0 - alpha) * r + alpha * (r - self.prev_input.1);
            self.prev_input = (l, r);
            audio.set(i, out_l, out_r);
        }
    }

    fn reset(&mut self) {
        self.prev_input = (0.0, 0.0);
    }

    fn controls(&self) -> Self::Controls {
        Arc::clone(&self.params)
    }

    fn is_active(&self) -> bool {
        self.params.is_active()
    }

    fn set_active(&self, active: bool) {
        self.params.set_active(active);
    }
}
