//! Core streaming types shared by every effect.
//!
//! This module provides:
//! - `AudioBuffer`, the sample codec over interleaved 16-bit stereo PCM
//! - `Source`, the pull-stream trait every effect, player and decoder satisfies
//! - `AtomicParam` and `ActiveFlag`, lock-free parameter cells
//! - `Curve` and `mix` for parameter shaping and dry/wet blending

mod buffer;
mod curve;
mod param;
mod source;

pub use buffer::{AudioBuffer, BYTES_PER_FRAME, decode_frames, encode_frames};
pub use curve::{Curve, mix};
pub use param::{ActiveFlag, AtomicParam};
pub use source::Source;

pub(crate) use source::aligned;
