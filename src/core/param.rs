//! Lock-free parameter cells shared between control and audio threads.
//!
//! Setters run on a control thread while the audio thread pulls chunks.
//! Each value is a single atomic word, so a reader can never observe a torn
//! update; algorithms read every cell once per chunk, so a change lands
//! between chunks and never in the middle of one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// An `f64` stored as its bit pattern in an [`AtomicU64`].
///
/// # Examples
///
/// ```
/// use soundstack::AtomicParam;
///
/// let gain = AtomicParam::new(1.0);
/// gain.set(0.25);
/// assert_eq!(gain.get(), 0.25);
/// ```
#[derive(Debug)]
pub struct AtomicParam(AtomicU64);

impl AtomicParam {
    /// Creates a cell holding `value`.
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    /// Loads the current value.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Stores a new value.
    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    /// Stores `value` clamped to `[min, max]`. NaN is stored as `min`.
    pub fn set_clamped(&self, value: f64, min: f64, max: f64) {
        let value = if value.is_nan() { min } else { value.clamp(min, max) };
        self.set(value);
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicParam {
    /// Copies the current value into an independent cell.
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

/// The on/off switch every effect carries.
#[derive(Debug)]
pub struct ActiveFlag(AtomicBool);

impl ActiveFlag {
    pub fn new(active: bool) -> Self {
        Self(AtomicBool::new(active))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Release);
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Clone for ActiveFlag {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}
