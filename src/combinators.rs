//! Composition of effects into linear pull chains.
//!
//! A chain is a singly linked list of owned nodes: each effect owns its
//! upstream, so reading the last effect pulls through every earlier one in
//! declared order. Nothing is reordered or deduplicated.

use crate::core::Source;
use crate::effects::Effect;
use crate::error::{Error, Result};

/// Wires `effects` into `first -> second -> ... -> last` and returns the last
/// effect as the composite source.
///
/// The first effect keeps whatever upstream it was built with. Every later
/// effect has its upstream replaced by the previous effect; a source it held
/// before is dropped.
///
/// # Examples
///
/// ```
/// use std::io::{Cursor, Read};
/// use soundstack::{Effect, Lowpass, Pan, Volume, chain, encode_frames};
///
/// let silence = Cursor::new(encode_frames(&[(0.0, 0.0); 441]));
/// let mut out = chain(vec![
///     Effect::with_source(Volume::new().with_strength(0.5), silence),
///     Effect::new(Pan::new()),
///     Effect::new(Lowpass::new()),
/// ])
/// .unwrap();
///
/// let mut chunk = vec![0u8; 441 * 4];
/// out.read_exact(&mut chunk).unwrap();
/// assert!(chunk.iter().all(|&b| b == 0));
/// ```
pub fn chain(effects: impl IntoIterator<Item = Effect>) -> Result<Effect> {
    let mut effects = effects.into_iter();
    let first = effects.next().ok_or(Error::EmptyChain)?;

    let mut len = 1;
    let last = effects.fold(first, |upstream, mut effect| {
        if effect.set_source(Box::new(upstream)).is_some() {
            log::warn!("chain: dropped the existing source of a {} effect", effect.name());
        }
        len += 1;
        effect
    });

    log::debug!("chain: wired {len} effects ending in {}", last.name());
    Ok(last)
}

/// Binds `source` to the first effect and chains the rest behind it.
pub fn chain_from(
    source: impl Source + 'static,
    effects: impl IntoIterator<Item = Effect>,
) -> Result<Effect> {
    let mut effects = effects.into_iter();
    let mut first = effects.next().ok_or(Error::EmptyChain)?;
    first.set_source(Box::new(source));
    chain(std::iter::once(first).chain(effects))
}

/// Fluent chaining for any source.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use soundstack::{Delay, SourceExt, Volume};
///
/// let pcm = Cursor::new(vec![0u8; 64]);
/// let out = pcm.through(Volume::new()).through(Delay::new(44_100));
/// assert_eq!(out.name(), "delay");
/// ```
pub trait SourceExt: Source + Sized + 'static {
    /// Feeds this source into `effect`, rebinding its upstream.
    fn through(self, effect: impl Into<Effect>) -> Effect {
        let mut effect = effect.into();
        effect.set_source(Box::new(self));
        effect
    }
}

impl<T: Source + 'static> SourceExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode_frames, encode_frames};
    use crate::effects::{Pan, Volume};
    use std::io::{Cursor, Read, Seek, SeekFrom};

    #[test]
    fn test_empty_chain_is_an_error() {
        assert!(matches!(chain(Vec::<Effect>::new()), Err(Error::EmptyChain)));
        assert!(matches!(
            chain_from(Cursor::new(Vec::<u8>::new()), Vec::<Effect>::new()),
            Err(Error::EmptyChain)
        ));
    }

    #[test]
    fn test_single_effect_chain_is_itself() {
        let effect = Effect::with_source(Pan::new(), Cursor::new(vec![0u8; 8]));
        let chained = chain(vec![effect]).unwrap();
        assert!(chained.has_source());
        assert_eq!(chained.name(), "pan");
    }

    #[test]
    fn test_chain_applies_in_declared_order() {
        // 2x clips 0.75 to 1.0, then the eased half volume scales by
        // 1 - cos(pi/4). The reverse order would give about 0.44.
        let pcm = encode_frames(&[(0.75, 0.75); 4]);
        let mut out = chain_from(
            Cursor::new(pcm),
            vec![
                Effect::new(Volume::new().with_strength(2.0)),
                Effect::new(Volume::new().with_strength(0.5)),
            ],
        )
        .unwrap();

        let mut chunk = [0u8; 16];
        out.read_exact(&mut chunk).unwrap();
        let gain = 1.0 - std::f64::consts::FRAC_1_SQRT_2;
        for (l, r) in decode_frames(&chunk) {
            assert!((l - gain).abs() < 1e-4);
            assert!((r - gain).abs() < 1e-4);
        }
    }

    #[test]
    fn test_chain_from_replaces_first_source() {
        let stale = Cursor::new(encode_frames(&[(0.9, 0.9); 2]));
        let fresh = Cursor::new(encode_frames(&[(0.1, 0.1); 2]));
        let mut out = chain_from(fresh, vec![Effect::with_source(Pan::new(), stale)]).unwrap();

        let mut chunk = [0u8; 8];
        out.read_exact(&mut chunk).unwrap();
        assert!((decode_frames(&chunk)[0].0 - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_seek_reaches_the_source() {
        let mut out = Cursor::new(vec![0u8; 40])
            .through(Pan::new())
            .through(Volume::new());
        assert_eq!(out.seek(SeekFrom::End(-8)).unwrap(), 32);
    }
}
