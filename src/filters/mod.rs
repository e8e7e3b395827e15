//! Audio filters for shaping the spectrum of a stream.
//!
//! The filters here are deliberately simple single-pole designs driven by a
//! single normalized strength, which makes them cheap enough to share on a
//! bus and easy to sweep from a control thread.

mod one_pole;

pub use self::one_pole::{FilterParams, Highpass, Lowpass};
