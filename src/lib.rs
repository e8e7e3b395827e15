//! Soundstack - composable real-time stereo effects for pull-based PCM streams
//!
//! Audio flows as interleaved 16-bit little-endian stereo PCM pulled through
//! `std::io::Read`. Every effect is itself a readable, seekable source, so
//! effects chain by wrapping one another, and a [`Player`] can route its
//! sound through a shared [`Channel`] bus on top of its own private effects.
//!
//! ```
//! use std::io::Read;
//! use soundstack::{Channel, Lowpass, Pan, PcmSource, Player, Volume};
//!
//! let bus = Channel::new();
//! bus.add_effect("warmth", Lowpass::new().with_strength(0.3));
//!
//! let mut player = Player::new(PcmSource::from_frames(&[(0.5, 0.5); 256]));
//! player.add_effect("gain", Volume::new().with_strength(0.8));
//! player.add_effect("pan", Pan::new().with_pan(-0.25));
//! player.set_channel(bus);
//! player.play();
//!
//! let mut chunk = vec![0u8; 1024];
//! assert_eq!(player.read(&mut chunk).unwrap(), 1024);
//! ```
//!
//! Parameters are lock-free atomics. Grab a handle with
//! [`Algorithm::controls`] or [`Channel::controls`] and adjust effects from
//! any thread while audio is flowing; each chunk sees a consistent snapshot.

pub mod analysis;
pub mod channel;
pub mod combinators;
#[cfg(feature = "presets")]
pub mod config;
pub mod core;
pub mod effects;
pub mod error;
pub mod filters;
pub mod player;
pub mod sources;

mod stack;

// Re-export commonly used types at the crate root
pub use analysis::{AnalysisResult, AudioProperties, AudioProperty};
pub use channel::Channel;
pub use combinators::{SourceExt, chain, chain_from};
#[cfg(feature = "presets")]
pub use config::{EffectConfig, EffectEntry, KindConfig, StackConfig};
pub use self::core::{
    ActiveFlag, AtomicParam, AudioBuffer, BYTES_PER_FRAME, Curve, Source, decode_frames,
    encode_frames, mix,
};
pub use effects::{
    Algorithm, Bitcrush, BitcrushParams, Delay, DelayParams, Distortion, DistortionParams, Effect,
    EffectControls, EffectKind, Pan, PanParams, PitchShift, PitchShiftParams, Volume, VolumeParams,
};
pub use error::{Error, Result};
pub use filters::{FilterParams, Highpass, Lowpass};
pub use player::{Player, PlayerHandle};
pub use sources::{LoopSource, NoiseSource, PcmSource, SineSource};
