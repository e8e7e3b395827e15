//! Sample-and-hold bitcrusher for lo-fi sample-rate reduction.

use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer, Curve};
use crate::effects::Algorithm;

/// Longest hold, in frames, reached at full strength.
pub const MAX_HOLD_FRAMES: f64 = 1000.0;

/// Shared, lock-free parameters of a [`Bitcrush`] effect.
#[derive(Debug, Clone)]
pub struct BitcrushParams {
    active: ActiveFlag,
    strength: AtomicParam,
}

impl BitcrushParams {
    /// Sets the crush strength in [0, 1].
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

    /// Hold length in frames for the current strength, never below one.
    pub fn hold(&self) -> f64 {
        (Curve::InExpo.apply(self.strength()) * MAX_HOLD_FRAMES).max(1.0)
    }
}

/// Reduces the effective sample rate by holding frames within each chunk.
///
/// Frame `i` is replaced by frame `round(i / hold) * hold` of the same
/// chunk, clamped to the last frame read. Holds never reach across chunk
/// boundaries, so the effect needs no history.
pub struct Bitcrush {
    params: Arc<BitcrushParams>,
}

impl Bitcrush {
    /// Creates a bitcrusher at full strength.
    pub fn new() -> Self {
        Self {
            params: Arc::new(BitcrushParams {
                active: ActiveFlag::default(),
                strength: AtomicParam::new(1.0),
            }),
        }
    }

    pub fn with_strength(self, strength: f64) -> Self {
        self.params.set_strength(strength);
        self
    }

    pub fn params(&self) -> &BitcrushParams {
        &self.params
    }
}

impl Default for Bitcrush {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Bitcrush {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(BitcrushParams::clone(&self.params)),
        }
    }
}

impl Algorithm for Bitcrush {
    type Controls = Arc<BitcrushParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        if !self.params.is_active() || self.params.strength() == 0.0 || audio.is_empty() {
            return;
        }

        let hold = self.params.hold();
        let last = audio.len() - 1;
        // Ascending order: the held index never exceeds i by more than half
        // a hold, and frames ahead of i are still unmodified when read.
        for i in 0..audio.len() {
            let held = (((i as f64 / hold).round() * hold) as usize).min(last);
            let (l, r) = audio.get(held);
            audio.set(i, l, r);
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
