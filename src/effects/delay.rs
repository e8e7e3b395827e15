//! Delay effect with feedback and dry/wet mix.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer, mix};
use crate::effects::Algorithm;

/// Shared, lock-free parameters of a [`Delay`] effect.
#[derive(Debug, Clone)]
pub struct DelayParams {
    active: ActiveFlag,
    wait: AtomicParam,
    strength: AtomicParam,
    feedback: AtomicParam,
}

impl DelayParams {
    /// Sets the echo delay in seconds. Negative values clamp to 0.
    ///
    /// Shrinking the wait discards the oldest buffered frames at the start of
    /// the next chunk.
    pub fn set_wait(&self, seconds: f64) {
        self.wait.set_clamped(seconds, 0.0, f64::MAX);
    }

    pub fn wait(&self) -> f64 {
        self.wait.get()
    }

    /// Sets how strongly the echo is mixed over the dry signal (>= 0).
    pub fn set_strength(&self, strength: f64) {
        self.strength.set_clamped(strength, 0.0, f64::MAX);
    }

    pub fn strength(&self) -> f64 {
        self.strength.get()
    }

    /// Sets how much of each echo is fed back into the delay line, in [0, 1].
    pub fn set_feedback(&self, feedback: f64) {
        self.feedback.set_clamped(feedback, 0.0, 1.0);
    }

    pub fn feedback(&self) -> f64 {
        self.feedback.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Echoes the stream after a configurable wait.
///
/// Once `wait` seconds have been buffered, each output frame is the dry frame
/// crossfaded by `strength` toward `dry + oldest`, where `oldest` is the line
/// entry written `wait` seconds ago. The line stores `dry + feedback * oldest`,
/// so with zero feedback every echo is a single clean repeat.
///
/// The delay line keeps running while the effect is inactive, so toggling
/// it back on resumes with correct history. Echoes that would ring past the
/// end of the source are cut off with it.
pub struct Delay {
    params: Arc<DelayParams>,
    sample_rate: u32,
    line: VecDeque<(f64, f64)>,
}

impl Delay {
    /// Creates a delay with a 0.1 s wait, full strength and 0.5 feedback.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Rate of the stream the delay will run on, in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self {
            params: Arc::new(DelayParams {
                active: ActiveFlag::default(),
                wait: AtomicParam::new(0.1),
                strength: AtomicParam::new(1.0),
                feedback: AtomicParam::new(0.5),
            }),
            sample_rate,
            line: VecDeque::new(),
        }
    }

    pub fn with_wait(self, seconds: f64) -> Self {
        self.params.set_wait(seconds);
        self
    }

    pub fn with_strength(self, strength: f64) -> Self {
        self.params.set_strength(strength);
        self
    }

    pub fn with_feedback(self, feedback: f64) -> Self {
        self.params.set_feedback(feedback);
        self
    }

    pub fn params(&self) -> &DelayParams {
        &self.params
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of frames currently held in the delay line.
    pub fn buffered(&self) -> usize {
        self.line.len()
    }

    fn capacity(&self, wait: f64) -> usize {
        (wait * self.sample_rate as f64) as usize
    }
}

impl Clone for Delay {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(DelayParams::clone(&self.params)),
            sample_rate: self.sample_rate,
            line: VecDeque::new(),
        }
    }
}

impl Algorithm for Delay {
    type Controls = Arc<DelayParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        let active = self.params.is_active();
        let strength = self.params.strength();
        let feedback = self.params.feedback();
        let capacity = self.capacity(self.params.wait());

        while self.line.len() > capacity {
            self.line.pop_front();
        }

        for i in 0..audio.len() {
            let (l, r) = audio.get(i);

            // Nothing echoes until a full wait has been buffered
            let oldest = if self.line.len() >= capacity {
                self.line.front()
            } else {
                None
            };

            let (stored, out) = match oldest {
                Some(&(ol, or)) => (
                    (l + ol * feedback, r + or * feedback),
                    (mix(l, l + ol, strength), mix(r, r + or, strength)),
                ),
                None => ((l, r), (l, r)),
            };

            self.line.push_back(stored);
            if self.line.len() > capacity {
                self.line.pop_front();
            }

            if active {
                audio.set(i, out.0, out.1);
            }
        }
    }

    fn reset(&mut self) {
        self.line.clear();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode_frames, encode_frames};

    const SAMPLE_RATE: u32 = 1000;

    fn run(delay: &mut Delay, frames: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let mut bytes = encode_frames(frames);
        delay.process(&mut AudioBuffer::new(&mut bytes));
        decode_frames(&bytes)
    }

    fn impulse(len: usize) -> Vec<(f64, f64)> {
        let mut frames = vec![(0.0, 0.0); len];
        frames[0] = (0.5, -0.5);
        frames
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let input: Vec<(f64, f64)> = (0..50).map(|i| ((i as f64 * 0.1).sin() * 0.5, 0.1)).collect();
        let bytes = encode_frames(&input);
        let mut processed = bytes.clone();
        let mut delay = Delay::new(SAMPLE_RATE).with_strength(0.0);
        delay.process(&mut AudioBuffer::new(&mut processed));
        assert_eq!(bytes, processed);
    }

    #[test]
    fn test_single_echo_without_feedback() {
        // 0.01 s at 1 kHz = 10 frames
        let mut delay = Delay::new(SAMPLE_RATE)
            .with_wait(0.01)
            .with_strength(1.0)
            .with_feedback(0.0);
        let out = run(&mut delay, &impulse(40));

        assert!((out[0].0 - 0.5).abs() < 1e-4);
        assert!((out[10].0 - 0.5).abs() < 1e-4);
        assert!((out[10].1 + 0.5).abs() < 1e-4);
        // No compounding with zero feedback
        assert_eq!(out[20], (0.0, 0.0));
        for (i, frame) in out.iter().enumerate() {
            if i != 0 && i != 10 {
                assert_eq!(*frame, (0.0, 0.0), "frame {i}");
            }
        }
    }

    #[test]
    fn test_feedback_repeats_decay() {
        let mut delay = Delay::new(SAMPLE_RATE)
            .with_wait(0.01)
            .with_strength(1.0)
            .with_feedback(0.5);
        let out = run(&mut delay, &impulse(40));

        assert!((out[10].0 - 0.5).abs() < 1e-4);
        assert!((out[20].0 - 0.25).abs() < 1e-4);
        assert!((out[30].0 - 0.125).abs() < 1e-4);
    }

    #[test]
    fn test_history_spans_chunk_boundaries() {
        let mut whole = Delay::new(SAMPLE_RATE).with_wait(0.01).with_feedback(0.3);
        let mut split = whole.clone();
        let input: Vec<(f64, f64)> = (0..64).map(|i| ((i as f64 * 0.7).sin() * 0.4, 0.0)).collect();

        let expected = run(&mut whole, &input);
        let mut actual = Vec::new();
        for chunk in input.chunks(7) {
            actual.extend(run(&mut split, chunk));
        }
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_inactive_keeps_filling_line() {
        let mut delay = Delay::new(SAMPLE_RATE)
            .with_wait(0.01)
            .with_strength(1.0)
            .with_feedback(0.0);
        delay.set_active(false);

        let out = run(&mut delay, &impulse(5));
        assert!((out[0].0 - 0.5).abs() < 1e-4);
        assert_eq!(delay.buffered(), 5);

        delay.set_active(true);
        let out = run(&mut delay, &[(0.0, 0.0); 10]);
        // The impulse written while bypassed echoes on schedule
        assert!((out[5].0 - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_shrinking_wait_drops_oldest_immediately() {
        let mut delay = Delay::new(SAMPLE_RATE).with_wait(0.02);
        run(&mut delay, &[(0.1, 0.1); 20]);
        assert_eq!(delay.buffered(), 20);

        delay.params().set_wait(0.005);
        run(&mut delay, &[]);
        assert_eq!(delay.buffered(), 5);
    }

    #[test]
    fn test_parameter_clamping() {
        let delay = Delay::new(SAMPLE_RATE)
            .with_wait(-1.0)
            .with_strength(-0.5)
            .with_feedback(3.0);
        assert_eq!(delay.params().wait(), 0.0);
        assert_eq!(delay.params().strength(), 0.0);
        assert_eq!(delay.params().feedback(), 1.0);
    }

    #[test]
    fn test_clone_starts_with_empty_line() {
        let mut delay = Delay::new(SAMPLE_RATE);
        run(&mut delay, &[(0.5, 0.5); 10]);
        let copy = delay.clone();
        assert_eq!(copy.buffered(), 0);
        assert_eq!(copy.params().wait(), delay.params().wait());
    }
}
