//! Gating distortion that snaps quiet samples to the nearest whole step.

use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer};
use crate::effects::Algorithm;

/// Shared, lock-free parameters of a [`Distortion`] effect.
#[derive(Debug, Clone)]
pub struct DistortionParams {
    active: ActiveFlag,
    crush: AtomicParam,
}

impl DistortionParams {
    /// Sets the crush threshold in [0, 1]. Samples quieter than this are
    /// rounded to -1, 0 or 1.
    pub fn set_crush(&self, crush: f64) {
        self.crush.set_clamped(crush, 0.0, 1.0);
    }

    pub fn crush(&self) -> f64 {
        self.crush.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Hard-gates and clips the stream.
///
/// Every sample whose magnitude is below the crush threshold is rounded on
/// the normalized scale, which silences quiet passages outright and pushes
/// samples at or above 0.5 to full scale. A threshold of 0 disables it.
pub struct Distortion {
    params: Arc<DistortionParams>,
}

impl Distortion {
    /// Creates a distortion with a crush threshold of 0 (no effect).
    pub fn new() -> Self {
        Self {
            params: Arc::new(DistortionParams {
                active: ActiveFlag::default(),
                crush: AtomicParam::new(0.0),
            }),
        }
    }

    pub fn with_crush(self, crush: f64) -> Self {
        self.params.set_crush(crush);
        self
    }

    pub fn params(&self) -> &DistortionParams {
        &self.params
    }
}

impl Default for Distortion {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Distortion {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(DistortionParams::clone(&self.params)),
        }
    }
}

fn crush_sample(sample: f64, threshold: f64) -> f64 {
    if sample.abs() < threshold {
        sample.round()
    } else {
        sample
    }
}

impl Algorithm for Distortion {
    type Controls = Arc<DistortionParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        let threshold = self.params.crush();
        if !self.params.is_active() || threshold <= 0.0 {
            return;
        }

        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            audio.set(i, crush_sample(l, threshold), crush_sample(r, threshold));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode_frames, encode_frames};

    #[test]
    fn test_zero_crush_is_identity() {
        let bytes = encode_frames(&[(0.2, -0.3), (0.7, 0.01)]);
        let mut processed = bytes.clone();
        Distortion::new().process(&mut AudioBuffer::new(&mut processed));
        assert_eq!(bytes, processed);
    }

    #[test]
    fn test_quiet_samples_snap() {
        let mut distortion = Distortion::new().with_crush(0.8);
        let mut bytes = encode_frames(&[(0.3, -0.6), (0.9, -0.2)]);
        distortion.process(&mut AudioBuffer::new(&mut bytes));
        let out = decode_frames(&bytes);

        assert_eq!(out[0], (0.0, -1.0));
        // 0.9 is above the threshold and untouched
        assert!((out[1].0 - 0.9).abs() < 1e-4);
        assert_eq!(out[1].1, 0.0);
    }

    #[test]
    fn test_crush_clamped() {
        assert_eq!(Distortion::new().with_crush(5.0).params().crush(), 1.0);
        assert_eq!(Distortion::new().with_crush(-5.0).params().crush(), 0.0);
    }
}
