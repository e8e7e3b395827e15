//! Sample codec for interleaved 16-bit stereo PCM.
//!
//! Every effect touches audio exclusively through [`AudioBuffer::get`] and
//! [`AudioBuffer::set`]; nothing else in the crate reads or writes raw bytes.

use std::fmt;

/// Bytes per stereo frame: two little-endian `i16` samples.
pub const BYTES_PER_FRAME: usize = 4;

const SCALE: f64 = i16::MAX as f64;

/// A mutable view over a chunk of interleaved `[L0, R0, L1, R1, ...]` PCM.
///
/// The view only exposes whole frames: trailing bytes that do not make up a
/// complete frame are never read or written.
///
/// # Examples
///
/// ```
/// use soundstack::AudioBuffer;
///
/// let mut bytes = [0u8; 8];
/// let mut audio = AudioBuffer::new(&mut bytes);
/// audio.set(1, 0.5, -0.5);
///
/// let (l, r) = audio.get(1);
/// assert!((l - 0.5).abs() < 1.0 / 32767.0);
/// assert!((r + 0.5).abs() < 1.0 / 32767.0);
/// ```
pub struct AudioBuffer<'a> {
    bytes: &'a mut [u8],
}

impl<'a> AudioBuffer<'a> {
    /// Wraps a byte chunk. Only `bytes.len() / 4` frames are addressable.
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    /// Number of complete frames in the chunk.
    pub fn len(&self) -> usize {
        self.bytes.len() / BYTES_PER_FRAME
    }

    /// Returns true if the chunk holds no complete frame.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads frame `i` as normalized `(left, right)` samples in roughly [-1, 1].
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn get(&self, i: usize) -> (f64, f64) {
        let at = i * BYTES_PER_FRAME;
        let l = i16::from_le_bytes([self.bytes[at], self.bytes[at + 1]]);
        let r = i16::from_le_bytes([self.bytes[at + 2], self.bytes[at + 3]]);
        (l as f64 / SCALE, r as f64 / SCALE)
    }

    /// Writes frame `i` from normalized samples.
    ///
    /// Values are scaled, rounded and clamped to `[-32767, 32767]` before
    /// narrowing, so out-of-range input saturates instead of wrapping.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    pub fn set(&mut self, i: usize, left: f64, right: f64) {
        let at = i * BYTES_PER_FRAME;
        self.bytes[at..at + 2].copy_from_slice(&quantize(left).to_le_bytes());
        self.bytes[at + 2..at + 4].copy_from_slice(&quantize(right).to_le_bytes());
    }

    /// Zeroes every byte of the chunk, including any partial trailing frame.
    pub fn fill_silence(&mut self) {
        self.bytes.fill(0);
    }
}

fn quantize(sample: f64) -> i16 {
    // NaN maps to 0 through the saturating cast.
    (sample * SCALE).round().clamp(-SCALE, SCALE) as i16
}

impl fmt::Display for AudioBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for i in 0..self.len() {
            let (l, r) = self.get(i);
            write!(f, "( {l:.6}, {r:.6} ) ")?;
        }
        write!(f, "}}")
    }
}

/// Encodes normalized frames into a freshly allocated PCM byte vector.
pub fn encode_frames(frames: &[(f64, f64)]) -> Vec<u8> {
    let mut bytes = vec![0u8; frames.len() * BYTES_PER_FRAME];
    let mut audio = AudioBuffer::new(&mut bytes);
    for (i, &(l, r)) in frames.iter().enumerate() {
        audio.set(i, l, r);
    }
    bytes
}

/// Decodes every complete frame of a PCM byte slice.
pub fn decode_frames(bytes: &[u8]) -> Vec<(f64, f64)> {
    bytes
        .chunks_exact(BYTES_PER_FRAME)
        .map(|frame| {
            let l = i16::from_le_bytes([frame[0], frame[1]]);
            let r = i16::from_le_bytes([frame[2], frame[3]]);
            (l as f64 / SCALE, r as f64 / SCALE)
        })
        .collect()
}
