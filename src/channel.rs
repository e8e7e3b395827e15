//! Shared effect buses.
//!
//! A [`Channel`] is an ordered, named effect stack with no source of its own.
//! Any number of [`Player`](crate::Player)s can be routed through it; each
//! player applies the channel's stack to its own chunk after its private
//! effects. The effect instances are shared, so stateful effects on a bus
//! (filters, delay lines) carry history across every routed player.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::effects::{Effect, EffectControls};
use crate::player::{PlayerHandle, PlayerState};
use crate::stack::EffectStack;

#[derive(Debug)]
struct ChannelInner {
    active: AtomicBool,
    closed: AtomicBool,
    effects: Mutex<EffectStack>,
    players: Mutex<Vec<Weak<PlayerState>>>,
}

/// A shared effect bus.
///
/// `Channel` is a cheap handle: clones refer to the same bus. The effect
/// stack is locked for exactly one application per routed player read, so
/// control-thread edits never interleave with a chunk in flight.
///
/// # Examples
///
/// ```
/// use std::io::{Cursor, Read};
/// use soundstack::{Channel, Pan, Player, encode_frames, decode_frames};
///
/// let bus = Channel::new();
/// bus.add_effect("pan", Pan::new().with_pan(-1.0));
///
/// let mut player = Player::new(Cursor::new(encode_frames(&[(1.0, 1.0); 8])));
/// player.set_channel(bus.clone());
///
/// let mut chunk = [0u8; 32];
/// player.read(&mut chunk).unwrap();
/// assert!(decode_frames(&chunk).iter().all(|&(l, r)| l == 1.0 && r == 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

impl Channel {
    /// Creates an empty, active bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                active: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                effects: Mutex::new(EffectStack::default()),
                players: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Appends `effect` under `id`, or replaces the effect already stored
    /// under `id` without changing its position. Any upstream the effect was
    /// built with is dropped; the bus drives it directly.
    pub fn add_effect(&self, id: impl Into<String>, effect: impl Into<Effect>) -> Option<Effect> {
        self.inner.effects.lock().insert(id.into(), effect.into())
    }

    pub fn remove_effect(&self, id: &str) -> Option<Effect> {
        self.inner.effects.lock().remove(id)
    }

    /// Effect ids in apply order.
    pub fn effect_ids(&self) -> Vec<String> {
        self.inner.effects.lock().ids()
    }

    pub fn len(&self) -> usize {
        self.inner.effects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parameter handle of the effect stored under `id`.
    ///
    /// The handle stays valid after the lock is released, so parameters can
    /// be tweaked from any thread while players keep pulling.
    pub fn controls(&self, id: &str) -> Option<EffectControls> {
        self.inner.effects.lock().get(id).map(Effect::controls)
    }

    /// Runs `f` on the effect stored under `id` while holding the bus lock.
    pub fn with_effect<R>(&self, id: &str, f: impl FnOnce(&mut Effect) -> R) -> Option<R> {
        self.inner.effects.lock().get_mut(id).map(f)
    }

    /// Calls `f` with each id and effect in apply order.
    pub fn for_each_effect(&self, mut f: impl FnMut(&str, &Effect)) {
        for (id, effect) in self.inner.effects.lock().iter() {
            f(id, effect);
        }
    }

    /// Applies the whole stack to `chunk` in declared order.
    pub fn apply(&self, chunk: &mut [u8]) {
        self.inner.effects.lock().apply(chunk);
    }

    /// Clears the history of every effect on the bus.
    pub fn reset(&self) {
        self.inner.effects.lock().reset();
    }

    /// Pauses or resumes every player routed through the bus.
    pub fn set_active(&self, active: bool) {
        self.inner.active.store(active, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::Acquire)
    }

    /// Closes the bus. Every routed player closes itself on its next read.
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            log::debug!("channel closed with {} playing players", self.playing_players().len());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Handles of the players currently playing through this bus.
    pub fn playing_players(&self) -> Vec<PlayerHandle> {
        let mut players = self.inner.players.lock();
        players.retain(|weak| weak.upgrade().is_some_and(|state| !state.is_closed()));
        players
            .iter()
            .filter_map(Weak::upgrade)
            .filter(|state| state.is_playing())
            .map(PlayerHandle::from_state)
            .collect()
    }

    pub fn player_by_id(&self, id: &str) -> Option<PlayerHandle> {
        self.playing_players().into_iter().find(|player| player.id() == id)
    }

    pub fn is_playing_player(&self, id: &str) -> bool {
        self.player_by_id(id).is_some()
    }

    pub(crate) fn register(&self, state: &Arc<PlayerState>) {
        let mut players = self.inner.players.lock();
        players.retain(|weak| weak.upgrade().is_some_and(|s| !s.is_closed()));
        if !players.iter().any(|weak| weak.as_ptr() == Arc::as_ptr(state)) {
            players.push(Arc::downgrade(state));
        }
    }

    /// True when both handles refer to the same bus.
    pub fn same_bus(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}
