//! Built-in PCM sources.
//!
//! Decoding compressed formats is left to the caller; these sources cover
//! in-memory PCM, test tones, noise and endless looping of another source.

use std::f64::consts::TAU;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::{AudioBuffer, BYTES_PER_FRAME, Source, aligned, encode_frames};

fn unsupported_end_seek(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Unsupported, format!("{what} has no end to seek from"))
}

/// Resolves a start/current seek against `position`, clamped to `[0, max]`.
fn resolve(position: u64, pos: SeekFrom, max: u64, what: &str) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(n) => n,
        SeekFrom::Current(delta) => position.checked_add_signed(delta).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before the start of the stream")
        })?,
        SeekFrom::End(_) => return Err(unsupported_end_seek(what)),
    };
    Ok(target.min(max))
}

/// Decoded PCM held in memory.
///
/// # Examples
///
/// ```
/// use std::io::Read;
/// use soundstack::PcmSource;
///
/// let mut pcm = PcmSource::from_frames(&[(0.5, -0.5); 4]);
/// assert_eq!(pcm.frames(), 4);
///
/// let mut chunk = [0u8; 32];
/// assert_eq!(pcm.read(&mut chunk).unwrap(), 16);
/// ```
#[derive(Debug, Clone)]
pub struct PcmSource {
    cursor: Cursor<Vec<u8>>,
}

impl PcmSource {
    /// Wraps raw interleaved 16-bit little-endian stereo bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        if bytes.len() % BYTES_PER_FRAME != 0 {
            log::warn!("pcm: {} bytes is not a whole number of frames", bytes.len());
        }
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    pub fn from_frames(frames: &[(f64, f64)]) -> Self {
        Self::from_bytes(encode_frames(frames))
    }

    /// Length in whole frames.
    pub fn frames(&self) -> usize {
        self.cursor.get_ref().len() / BYTES_PER_FRAME
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Read for PcmSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for PcmSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

/// An endless sine tone on both channels.
#[derive(Debug, Clone)]
pub struct SineSource {
    sample_rate: u32,
    frequency: f64,
    amplitude: f64,
    frame: u64,
}

impl SineSource {
    /// Creates a full-scale tone.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Output rate in Hz
    /// * `frequency` - Tone frequency in Hz
    pub fn new(sample_rate: u32, frequency: f64) -> Self {
        Self {
            sample_rate,
            frequency,
            amplitude: 1.0,
            frame: 0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl Read for SineSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = aligned(buf.len());
        let mut audio = AudioBuffer::new(&mut buf[..n]);
        let step = self.frequency / f64::from(self.sample_rate);
        for i in 0..audio.len() {
            // Phase from the absolute frame keeps seeks exact
            let phase = (self.frame as f64 * step).fract();
            let sample = self.amplitude * (TAU * phase).sin();
            audio.set(i, sample, sample);
            self.frame += 1;
        }
        Ok(n)
    }
}

impl Seek for SineSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.frame * BYTES_PER_FRAME as u64;
        let target = resolve(position, pos, u64::MAX, "sine tone")?;
        self.frame = target / BYTES_PER_FRAME as u64;
        Ok(self.frame * BYTES_PER_FRAME as u64)
    }
}

/// Endless uniform white noise, independent per channel.
///
/// Every seek reseeds the generator from the seed and the target frame, so
/// seeking to the same position twice yields the same noise. Noise reached
/// by reading forward differs from noise reached by seeking there.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    seed: u64,
    amplitude: f64,
    rng: StdRng,
    frame: u64,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            amplitude: 1.0,
            rng: StdRng::seed_from_u64(seed),
            frame: 0,
        }
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude.clamp(0.0, 1.0);
        self
    }
}

impl Read for NoiseSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = aligned(buf.len());
        let mut audio = AudioBuffer::new(&mut buf[..n]);
        for i in 0..audio.len() {
            let l = self.amplitude * self.rng.gen_range(-1.0..=1.0);
            let r = self.amplitude * self.rng.gen_range(-1.0..=1.0);
            audio.set(i, l, r);
        }
        self.frame += audio.len() as u64;
        Ok(n)
    }
}

impl Seek for NoiseSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let position = self.frame * BYTES_PER_FRAME as u64;
        let target = resolve(position, pos, u64::MAX, "noise")?;
        self.frame = target / BYTES_PER_FRAME as u64;
        self.rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.frame));
        Ok(self.frame * BYTES_PER_FRAME as u64)
    }
}

/// Repeats another source forever.
///
/// Positions live within one pass of the inner source: seeking past its
/// length stops at the end of the pass, and the next read starts over from
/// the beginning. Seeking from the end is unsupported, since a loop has
/// none.
pub struct LoopSource<S> {
    inner: S,
    len: u64,
    position: u64,
    passes: u64,
}

impl<S: Source> LoopSource<S> {
    /// Loops the whole of `inner`, measured with an end seek.
    pub fn new(mut inner: S) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self::with_len(inner, len))
    }

    /// Loops the first `len` bytes of `inner`, which must be positioned at 0.
    pub fn with_len(inner: S, len: u64) -> Self {
        let len = len - len % BYTES_PER_FRAME as u64;
        Self {
            inner,
            len,
            position: 0,
            passes: 0,
        }
    }

    /// Bytes in one pass.
    pub fn pass_len(&self) -> u64 {
        self.len
    }

    /// Completed passes so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn restart(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.position = 0;
        self.passes += 1;
        log::trace!("loop: pass {} begins", self.passes + 1);
        Ok(())
    }
}

impl<S: Source> Read for LoopSource<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() || self.len == 0 {
            return Ok(0);
        }
        if self.position >= self.len {
            self.restart()?;
        }

        let remaining = usize::try_from(self.len - self.position).unwrap_or(usize::MAX);
        let want = buf.len().min(remaining);
        let mut n = self.inner.read(&mut buf[..want])?;
        if n == 0 {
            // Inner stream ended early; start the next pass now
            self.restart()?;
            n = self.inner.read(&mut buf[..want])?;
        }
        self.position += n as u64;
        Ok(n)
    }
}

impl<S: Source> Seek for LoopSource<S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = resolve(self.position, pos, self.len, "loop")?;
        self.inner.seek(SeekFrom::Start(target))?;
        self.position = target;
        Ok(target)
    }
}
