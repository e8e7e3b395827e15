//! Volume effect with a sine-eased gain curve and loudness normalization.

use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer, Curve};
use crate::effects::Algorithm;

/// Shared, lock-free parameters of a [`Volume`] effect.
#[derive(Debug, Clone)]
pub struct VolumeParams {
    active: ActiveFlag,
    strength: AtomicParam,
    normalization: AtomicParam,
}

impl VolumeParams {
    /// Sets the volume strength. 0.0 is silence and 1.0 is unity.
    ///
    /// Values up to 1.0 are shaped by a sine ease-in curve; values above 1.0
    /// are used verbatim and deliberately over-amplify (output is clipped).
    /// Negative values clamp to 0.
    pub fn set_strength(&self, strength: f64) {
        self.strength.set_clamped(strength, 0.0, f64::MAX);
    }

    pub fn strength(&self) -> f64 {
        self.strength.get()
    }

    /// Sets the normalization factor, usually taken from an
    /// [`AnalysisResult`](crate::AnalysisResult).
    pub fn set_normalization(&self, normalization: f64) {
        self.normalization.set_clamped(normalization, 0.0, f64::MAX);
    }

    pub fn normalization(&self) -> f64 {
        self.normalization.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Effective linear gain for the current settings.
    pub fn gain(&self) -> f64 {
        let strength = self.strength();
        let shaped = if strength <= 1.0 {
            Curve::InSine.apply(strength)
        } else {
            strength
        };
        shaped * self.normalization()
    }
}

/// Changes the overall loudness of a stream.
///
/// # Examples
///
/// ```
/// use soundstack::{AudioBuffer, Algorithm, Volume};
///
/// let mut volume = Volume::new().with_strength(2.0);
/// let mut bytes = soundstack::encode_frames(&[(0.25, -0.25)]);
/// volume.process(&mut AudioBuffer::new(&mut bytes));
///
/// let (l, r) = AudioBuffer::new(&mut bytes).get(0);
/// assert!((l - 0.5).abs() < 1e-3 && (r + 0.5).abs() < 1e-3);
/// ```
pub struct Volume {
    params: Arc<VolumeParams>,
}

impl Volume {
    /// Creates a unity-gain volume effect with a normalization factor of 1.
    pub fn new() -> Self {
        Self {
            params: Arc::new(VolumeParams {
                active: ActiveFlag::default(),
                strength: AtomicParam::new(1.0),
                normalization: AtomicParam::new(1.0),
            }),
        }
    }

    pub fn with_strength(self, strength: f64) -> Self {
        self.params.set_strength(strength);
        self
    }

    pub fn with_normalization(self, normalization: f64) -> Self {
        self.params.set_normalization(normalization);
        self
    }

    pub fn params(&self) -> &VolumeParams {
        &self.params
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Volume {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(VolumeParams::clone(&self.params)),
        }
    }
}

impl Algorithm for Volume {
    type Controls = Arc<VolumeParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        if !self.params.is_active() {
            return;
        }

        let gain = self.params.gain();
        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            audio.set(i, l * gain, r * gain);
        }
    }

    fn reset(&mut self) {
        // Stateless
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
