//! Audio effects for stream processing.
//!
//! An effect is two things at once:
//! - an [`Algorithm`] that transforms a chunk of PCM in place, and
//! - a pull source ([`Effect`]) that reads from an optional upstream source,
//!   applies its algorithm to exactly the frames that were read, and hands
//!   the chunk on.
//!
//! [`EffectKind`] is the closed set of algorithms; callers recover a concrete
//! algorithm by pattern matching or through the typed `as_*` accessors.

mod bitcrush;
mod delay;
mod distortion;
mod pan;
mod pitch_shift;
mod volume;

pub use bitcrush::{Bitcrush, BitcrushParams, MAX_HOLD_FRAMES};
pub use delay::{Delay, DelayParams};
pub use distortion::{Distortion, DistortionParams};
pub use pan::{Pan, PanParams};
pub use pitch_shift::{MIN_BUFFER_FRAMES, PitchShift, PitchShiftParams};
pub use volume::{Volume, VolumeParams};

use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};

use crate::core::{AudioBuffer, Source, aligned};
use crate::filters::{FilterParams, Highpass, Lowpass};

/// Common interface of every effect algorithm.
///
/// `process` runs on the audio thread and may mutate history state. All
/// user-facing parameters live in a shared, lock-free parameter block
/// reachable through [`Algorithm::controls`], so they can be changed from
/// another thread while audio is flowing.
///
/// `Clone` on an algorithm copies its parameter values into a new,
/// independent block and starts with empty history.
pub trait Algorithm: Clone + Send {
    /// Thread-safe handle to this algorithm's parameters.
    type Controls: Clone + Send + Sync;

    /// Transforms every frame of `audio` in place.
    ///
    /// Parameters are read once at the start of the call, so a concurrent
    /// setter takes effect on the next chunk as a whole.
    fn process(&mut self, audio: &mut AudioBuffer<'_>);

    /// Clears history (filter memory, delay lines, rings) without touching
    /// parameters.
    fn reset(&mut self);

    /// Returns a handle to the shared parameter block.
    fn controls(&self) -> Self::Controls;

    fn is_active(&self) -> bool;

    /// Enables or bypasses the effect. A bypassed effect passes audio
    /// through unchanged.
    fn set_active(&self, active: bool);
}

/// The closed set of effect algorithms.
#[derive(Clone)]
pub enum EffectKind {
    Volume(Volume),
    Pan(Pan),
    Delay(Delay),
    Distortion(Distortion),
    Lowpass(Lowpass),
    Highpass(Highpass),
    Bitcrush(Bitcrush),
    PitchShift(PitchShift),
}

macro_rules! dispatch {
    ($kind:expr, $algo:ident => $body:expr) => {
        match $kind {
            EffectKind::Volume($algo) => $body,
            EffectKind::Pan($algo) => $body,
            EffectKind::Delay($algo) => $body,
            EffectKind::Distortion($algo) => $body,
            EffectKind::Lowpass($algo) => $body,
            EffectKind::Highpass($algo) => $body,
            EffectKind::Bitcrush($algo) => $body,
            EffectKind::PitchShift($algo) => $body,
        }
    };
}

impl EffectKind {
    /// Short lowercase name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Volume(_) => "volume",
            EffectKind::Pan(_) => "pan",
            EffectKind::Delay(_) => "delay",
            EffectKind::Distortion(_) => "distortion",
            EffectKind::Lowpass(_) => "lowpass",
            EffectKind::Highpass(_) => "highpass",
            EffectKind::Bitcrush(_) => "bitcrush",
            EffectKind::PitchShift(_) => "pitch_shift",
        }
    }

    pub fn process(&mut self, audio: &mut AudioBuffer<'_>) {
        dispatch!(self, algo => algo.process(audio))
    }

    pub fn reset(&mut self) {
        dispatch!(self, algo => algo.reset())
    }

    pub fn is_active(&self) -> bool {
        dispatch!(self, algo => algo.is_active())
    }

    pub fn set_active(&self, active: bool) {
        dispatch!(self, algo => algo.set_active(active))
    }

    /// Type-erased parameter handle.
    pub fn controls(&self) -> EffectControls {
        match self {
            EffectKind::Volume(a) => EffectControls::Volume(a.controls()),
            EffectKind::Pan(a) => EffectControls::Pan(a.controls()),
            EffectKind::Delay(a) => EffectControls::Delay(a.controls()),
            EffectKind::Distortion(a) => EffectControls::Distortion(a.controls()),
            EffectKind::Lowpass(a) => EffectControls::Lowpass(a.controls()),
            EffectKind::Highpass(a) => EffectControls::Highpass(a.controls()),
            EffectKind::Bitcrush(a) => EffectControls::Bitcrush(a.controls()),
            EffectKind::PitchShift(a) => EffectControls::PitchShift(a.controls()),
        }
    }
}

macro_rules! impl_from_algorithm {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for EffectKind {
                fn from(algo: $variant) -> Self {
                    EffectKind::$variant(algo)
                }
            }

            impl From<$variant> for Effect {
                fn from(algo: $variant) -> Self {
                    Effect::new(algo)
                }
            }
        )*
    };
}

impl_from_algorithm!(Volume, Pan, Delay, Distortion, Lowpass, Highpass, Bitcrush, PitchShift);

/// Parameter handle of an effect whose concrete type is only known at
/// runtime, e.g. one looked up by id on a [`Channel`](crate::Channel).
#[derive(Clone)]
pub enum EffectControls {
    Volume(std::sync::Arc<VolumeParams>),
    Pan(std::sync::Arc<PanParams>),
    Delay(std::sync::Arc<DelayParams>),
    Distortion(std::sync::Arc<DistortionParams>),
    Lowpass(std::sync::Arc<FilterParams>),
    Highpass(std::sync::Arc<FilterParams>),
    Bitcrush(std::sync::Arc<BitcrushParams>),
    PitchShift(std::sync::Arc<PitchShiftParams>),
}

impl EffectControls {
    pub fn is_active(&self) -> bool {
        match self {
            EffectControls::Volume(p) => p.is_active(),
            EffectControls::Pan(p) => p.is_active(),
            EffectControls::Delay(p) => p.is_active(),
            EffectControls::Distortion(p) => p.is_active(),
            EffectControls::Lowpass(p) | EffectControls::Highpass(p) => p.is_active(),
            EffectControls::Bitcrush(p) => p.is_active(),
            EffectControls::PitchShift(p) => p.is_active(),
        }
    }

    pub fn set_active(&self, active: bool) {
        match self {
            EffectControls::Volume(p) => p.set_active(active),
            EffectControls::Pan(p) => p.set_active(active),
            EffectControls::Delay(p) => p.set_active(active),
            EffectControls::Distortion(p) => p.set_active(active),
            EffectControls::Lowpass(p) | EffectControls::Highpass(p) => p.set_active(active),
            EffectControls::Bitcrush(p) => p.set_active(active),
            EffectControls::PitchShift(p) => p.set_active(active),
        }
    }
}

/// A pull-source node applying one algorithm to its upstream.
///
/// An effect built without a source can still transform chunks handed to
/// [`Effect::apply`], which is how players and channels drive their effect
/// stacks. Reading from a sourceless effect fails with
/// [`io::ErrorKind::NotConnected`]; seeking it is a no-op returning 0.
///
/// `Clone` yields a fresh-state copy with the same parameter values, no
/// shared parameter block and no upstream.
///
/// # Examples
///
/// ```
/// use std::io::{Cursor, Read};
/// use soundstack::{Effect, Pan, encode_frames, decode_frames};
///
/// let pcm = encode_frames(&[(1.0, 1.0); 4]);
/// let mut hard_right = Effect::with_source(Pan::new().with_pan(1.0), Cursor::new(pcm));
///
/// let mut chunk = [0u8; 16];
/// let n = hard_right.read(&mut chunk).unwrap();
/// assert_eq!(n, 16);
/// assert!(decode_frames(&chunk).iter().all(|&(l, r)| l == 0.0 && r == 1.0));
/// ```
pub struct Effect {
    kind: EffectKind,
    source: Option<Box<dyn Source>>,
}

impl Effect {
    /// Creates an effect with no upstream, ready for a channel, player or
    /// chain.
    pub fn new(kind: impl Into<EffectKind>) -> Self {
        Self {
            kind: kind.into(),
            source: None,
        }
    }

    /// Creates an effect reading from `source`.
    pub fn with_source(kind: impl Into<EffectKind>, source: impl Source + 'static) -> Self {
        Self {
            kind: kind.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Rebinds the upstream, returning the previous one.
    pub fn set_source(&mut self, source: Box<dyn Source>) -> Option<Box<dyn Source>> {
        self.source.replace(source)
    }

    /// Detaches and returns the upstream.
    pub fn take_source(&mut self) -> Option<Box<dyn Source>> {
        self.source.take()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut EffectKind {
        &mut self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn controls(&self) -> EffectControls {
        self.kind.controls()
    }

    pub fn is_active(&self) -> bool {
        self.kind.is_active()
    }

    pub fn set_active(&self, active: bool) {
        self.kind.set_active(active);
    }

    pub fn reset(&mut self) {
        self.kind.reset();
    }

    /// Transforms the whole frames in `chunk` in place. A trailing partial
    /// frame is left untouched.
    pub fn apply(&mut self, chunk: &mut [u8]) {
        self.kind.process(&mut AudioBuffer::new(chunk));
    }

    pub fn as_volume(&self) -> Option<&Volume> {
        match &self.kind {
            EffectKind::Volume(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pan(&self) -> Option<&Pan> {
        match &self.kind {
            EffectKind::Pan(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_delay(&self) -> Option<&Delay> {
        match &self.kind {
            EffectKind::Delay(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_distortion(&self) -> Option<&Distortion> {
        match &self.kind {
            EffectKind::Distortion(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_lowpass(&self) -> Option<&Lowpass> {
        match &self.kind {
            EffectKind::Lowpass(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_highpass(&self) -> Option<&Highpass> {
        match &self.kind {
            EffectKind::Highpass(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_bitcrush(&self) -> Option<&Bitcrush> {
        match &self.kind {
            EffectKind::Bitcrush(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_pitch_shift(&self) -> Option<&PitchShift> {
        match &self.kind {
            EffectKind::PitchShift(p) => Some(p),
            _ => None,
        }
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            source: None,
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("kind", &self.name())
            .field("active", &self.is_active())
            .field("has_source", &self.has_source())
            .finish()
    }
}

impl Read for Effect {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(source) = self.source.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                format!("{} effect has no source", self.kind.name()),
            ));
        };

        let n = source.read(buf)?;
        if n % crate::core::BYTES_PER_FRAME != 0 {
            log::warn!("{}: upstream returned {n} bytes, not frame aligned", self.kind.name());
        }
        self.kind.process(&mut AudioBuffer::new(&mut buf[..aligned(n)]));
        Ok(n)
    }
}

impl Seek for Effect {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self.source.as_mut() {
            Some(source) => source.seek(pos),
            None => Ok(0),
        }
    }
}
