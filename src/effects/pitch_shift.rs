//! Real-time pitch shifting with a dual-tap circular buffer.
//!
//! Input frames are written into a ring at one frame per frame, while a
//! fractional read head moves at `pitch` frames per frame. Reading faster
//! raises the pitch, slower lowers it. A naive single read head clicks
//! whenever it crosses the write head, so a second tap is read from the
//! opposite side of the ring and the two are crossfaded by how far the read
//! head is from the write head: as the heads approach, the output hands over
//! smoothly to the far tap.

use std::sync::Arc;

use crate::core::{ActiveFlag, AtomicParam, AudioBuffer, mix};
use crate::effects::Algorithm;

/// Smallest usable ring: the two taps need distinct slots.
pub const MIN_BUFFER_FRAMES: usize = 2;

/// Fixed-capacity ring of stereo frames with an integral write cursor and a
/// fractional read cursor.
#[derive(Debug, Clone)]
pub(crate) struct CircularBuffer {
    frames: Vec<(f64, f64)>,
    read: f64,
    write: usize,
    written: usize,
}

impl CircularBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_BUFFER_FRAMES);
        Self {
            frames: vec![(0.0, 0.0); capacity],
            read: 0.0,
            write: 0,
            written: 0,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.frames.len()
    }

    /// True once every slot has been written at least once.
    pub(crate) fn is_full(&self) -> bool {
        self.written == self.capacity()
    }

    pub(crate) fn write(&mut self, l: f64, r: f64) {
        self.frames[self.write] = (l, r);
        self.write = (self.write + 1) % self.capacity();
        if self.written < self.capacity() {
            self.written += 1;
        }
    }

    /// Frame at the read cursor plus `offset` slots, or silence until full.
    pub(crate) fn read(&self, offset: usize) -> (f64, f64) {
        if !self.is_full() {
            return (0.0, 0.0);
        }
        let index = (self.read as usize + offset) % self.capacity();
        self.frames[index]
    }

    /// Shortest distance around the ring between the two cursors, in
    /// `[0, capacity / 2]`.
    pub(crate) fn read_write_distance(&self) -> f64 {
        let size = self.capacity() as f64;
        let direct = (self.read - self.write as f64).abs();
        direct.min(size - direct)
    }

    pub(crate) fn advance_read(&mut self, step: f64) {
        self.read = (self.read + step).rem_euclid(self.capacity() as f64);
    }

    pub(crate) fn clear(&mut self) {
        self.frames.fill((0.0, 0.0));
        self.read = 0.0;
        self.write = 0;
        self.written = 0;
    }
}

/// Shared, lock-free parameters of a [`PitchShift`] effect.
#[derive(Debug, Clone)]
pub struct PitchShiftParams {
    active: ActiveFlag,
    pitch: AtomicParam,
    strength: AtomicParam,
}

impl PitchShiftParams {
    /// Sets the pitch factor: 1.0 is unchanged, 2.0 an octave up, 0.5 an
    /// octave down. Negative values clamp to 0.
    pub fn set_pitch(&self, pitch: f64) {
        self.pitch.set_clamped(pitch, 0.0, f64::MAX);
    }

    pub fn pitch(&self) -> f64 {
        self.pitch.get()
    }

    /// Sets the dry/wet mix in [0, 1].
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
}

/// Shifts the pitch of a stream without changing its length.
///
/// Larger buffers sound smoother but add latency and a faint echo as the
/// read head sweeps through older audio; 1024, 2048 or 4096 frames are good
/// starting points. The wet signal is silent until the buffer has filled
/// once. The ring keeps recording while the effect is bypassed.
pub struct PitchShift {
    params: Arc<PitchShiftParams>,
    ring: CircularBuffer,
}

impl PitchShift {
    /// Creates an identity pitch shift (pitch 1, full strength).
    ///
    /// # Arguments
    ///
    /// * `buffer_frames` - Ring capacity in frames, at least 2
    pub fn new(buffer_frames: usize) -> Self {
        Self {
            params: Arc::new(PitchShiftParams {
                active: ActiveFlag::default(),
                pitch: AtomicParam::new(1.0),
                strength: AtomicParam::new(1.0),
            }),
            ring: CircularBuffer::new(buffer_frames),
        }
    }

    pub fn with_pitch(self, pitch: f64) -> Self {
        self.params.set_pitch(pitch);
        self
    }

    pub fn with_strength(self, strength: f64) -> Self {
        self.params.set_strength(strength);
        self
    }

    pub fn params(&self) -> &PitchShiftParams {
        &self.params
    }

    pub fn buffer_frames(&self) -> usize {
        self.ring.capacity()
    }
}

impl Clone for PitchShift {
    fn clone(&self) -> Self {
        Self {
            params: Arc::new(PitchShiftParams::clone(&self.params)),
            ring: CircularBuffer::new(self.ring.capacity()),
        }
    }
}

impl Algorithm for PitchShift {
    type Controls = Arc<PitchShiftParams>;

    fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        let active = self.params.is_active();
        let pitch = self.params.pitch();
        let strength = self.params.strength();
        let half = self.ring.capacity() / 2;
        let span = self.ring.capacity() as f64 / 2.0;

        for i in 0..audio.len() {
            let (l, r) = audio.get(i);
            self.ring.write(l, r);

            if active {
                let (near_l, near_r) = self.ring.read(0);
                let (far_l, far_r) = self.ring.read(half);
                let cross = (self.ring.read_write_distance() / span).clamp(0.0, 1.0);

                let wet_l = near_l * cross + far_l * (1.0 - cross);
                let wet_r = near_r * cross + far_r * (1.0 - cross);
                audio.set(i, mix(l, wet_l, strength), mix(r, wet_r, strength));
            }

            self.ring.advance_read(pitch);
        }
    }

    fn reset(&mut self) {
        self.ring.clear();
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
