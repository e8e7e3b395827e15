//! Error types for pipeline construction, analysis and presets.
//!
//! Streaming itself stays on `std::io`: effects and players implement
//! `Read + Seek`, so errors raised while audio flows are `io::Error`s.

use thiserror::Error;

/// Errors raised outside the streaming hot path.
#[derive(Error, Debug)]
pub enum Error {
    /// A chain was requested from an empty list of effects
    #[error("cannot chain an empty list of effects")]
    EmptyChain,

    /// Reading, seeking or file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A preset could not be parsed or serialized
    #[cfg(feature = "presets")]
    #[error("invalid preset: {0}")]
    Preset(#[from] serde_yaml::Error),
}

/// Result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;
