//! Linear stereo panning.

use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer};
use crate::effects::Algorithm;

/// Shared, lock-free parameters of a [`Pan`] effect.
#[derive(Debug, Clone)]
pub struct PanParams {
    active: ActiveFlag,
    pan: AtomicParam,
}

impl PanParams {
    /// Sets the pan position: -1.0 is hard left, 0.0 centered, 1.0 hard right.
    pub fn set_pan(&self, pan: f64) {
        self.pan.set_clamped(pan, -1.0, 1.0);
    }

    pub fn pan(&self) -> f64 {
        self.pan.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// `(left, right)` channel gains for the current position.
    ///
    /// Neither gain exceeds unity; the far channel fades linearly to silence.
    pub fn gains(&self) -> (f64, f64) {
        let pan = self.pan();
        ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
    }
}

/// Balances a stream between the left and right channels.
pub struct Pan {
    params: Arc<PanParams>,
}

impl Pan {
    /// Creates a centered pan effect.
    pub fn new() -> Self {
        Self {
            params: Arc::new(PanParams {
                active: ActiveFlag::default(),
                pan: AtomicParam::new(0.0),
            }),
        }
    }

    pub fn with_pan(self, pan: f64) -> Self {
        self.params.set_pan(pan);
        self
    }

    pub fn params(&self) -> &PanParams {
        &self.params
    }
}

impl Default for Pan {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Pan {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(PanParams::clone(&self.params)),
        }
    }
}

impl Algorithm for Pan {
    type Controls = Arc<PanParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        if !self.params.is_active() {
            return;
        }

        let (left_gain, right_gain) = self.params.gains();
        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            audio.set(i, l * left_gain, r * right_gain);
        }
    }

    fn reset(&mut self) {}

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
