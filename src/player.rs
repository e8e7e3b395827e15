//! Playback handles.
//!
//! A [`Player`] wraps one source, an optional private effect stack and an
//! optional [`Channel`]. Each read pulls from the source, applies the
//! private stack, then the channel's stack, and hands the chunk back to the
//! scheduler. Playing, pausing and closing are flags the scheduler consults;
//! the player performs no device I/O itself.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::channel::Channel;
use crate::core::{Source, aligned};
use crate::effects::Effect;
use crate::stack::EffectStack;

static NEXT_PLAYER: AtomicU64 = AtomicU64::new(0);

/// Status shared between a player, its handles and its channel.
#[derive(Debug)]
pub(crate) struct PlayerState {
    id: String,
    playing: AtomicBool,
    closed: AtomicBool,
}

impl PlayerState {
    fn new(id: String) -> Self {
        Self {
            id,
            playing: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Thread-safe view of a [`Player`]'s status.
///
/// Handles can be held by a control thread or returned from
/// [`Channel::playing_players`] while the player itself is owned by the
/// audio callback.
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    state: Arc<PlayerState>,
}

impl PlayerHandle {
    pub(crate) fn from_state(state: Arc<PlayerState>) -> Self {
        Self { state }
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// Asks the scheduler to stop pulling. The player keeps its position.
    pub fn pause(&self) {
        self.state.playing.store(false, Ordering::Release);
    }

    /// Closes the player; its next read releases the source and returns
    /// end-of-stream.
    pub fn close(&self) {
        self.state.closed.store(true, Ordering::Release);
        self.state.playing.store(false, Ordering::Release);
    }
}

/// A playing sound: source, private effects and an optional bus.
pub struct Player {
    state: Arc<PlayerState>,
    source: Option<Box<dyn Source>>,
    effects: EffectStack,
    channel: Option<Channel>,
}

impl Player {
    /// Wraps `source` with an automatically assigned id.
    pub fn new(source: impl Source + 'static) -> Self {
        let id = format!("player-{}", NEXT_PLAYER.fetch_add(1, Ordering::Relaxed));
        Self {
            state: Arc::new(PlayerState::new(id)),
            source: Some(Box::new(source)),
            effects: EffectStack::default(),
            channel: None,
        }
    }

    /// Replaces the automatically assigned id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let state = PlayerState::new(id.into());
        state.playing.store(self.state.is_playing(), Ordering::Release);
        state.closed.store(self.state.is_closed(), Ordering::Release);
        self.state = Arc::new(state);
        self
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle::from_state(Arc::clone(&self.state))
    }

    /// Appends a private effect, or replaces the one already under `id` in
    /// place.
    pub fn add_effect(
        &mut self,
        id: impl Into<String>,
        effect: impl Into<Effect>,
    ) -> Option<Effect> {
        self.effects.insert(id.into(), effect.into())
    }

    pub fn effect(&self, id: &str) -> Option<&Effect> {
        self.effects.get(id)
    }

    pub fn effect_mut(&mut self, id: &str) -> Option<&mut Effect> {
        self.effects.get_mut(id)
    }

    pub fn remove_effect(&mut self, id: &str) -> Option<Effect> {
        self.effects.remove(id)
    }

    /// Private effect ids in apply order.
    pub fn effect_ids(&self) -> Vec<String> {
        self.effects.ids()
    }

    /// Routes the player through `channel`, replacing any previous one.
    pub fn set_channel(&mut self, channel: Channel) {
        if self.is_playing() {
            channel.register(&self.state);
        }
        self.channel = Some(channel);
    }

    /// Detaches the player from its channel.
    pub fn take_channel(&mut self) -> Option<Channel> {
        self.channel.take()
    }

    pub fn channel(&self) -> Option<&Channel> {
        self.channel.as_ref()
    }

    /// Adopts `other`'s channel and fresh copies of its private effects.
    pub fn copy_properties(&mut self, other: &Player) {
        self.effects = other.effects.clone();
        match other.channel.clone() {
            Some(channel) => self.set_channel(channel),
            None => self.channel = None,
        }
    }

    /// Marks the player as playing and registers it with its channel.
    pub fn play(&mut self) {
        if self.is_closed() {
            log::warn!("{}: play called on a closed player", self.id());
            return;
        }
        self.state.playing.store(true, Ordering::Release);
        if let Some(channel) = &self.channel {
            channel.register(&self.state);
        }
    }

    pub fn pause(&self) {
        self.handle().pause();
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    /// Stops playback for good and releases the source.
    pub fn close(&mut self) {
        self.handle().close();
        if self.source.take().is_some() {
            log::debug!("{}: closed, source released", self.id());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id())
            .field("playing", &self.is_playing())
            .field("closed", &self.is_closed())
            .field("effects", &self.effects)
            .field("routed", &self.channel.is_some())
            .finish()
    }
}

impl Read for Player {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (bus_closed, bus_active) = match &self.channel {
            Some(channel) => (channel.is_closed(), channel.is_active()),
            None => (false, true),
        };
        if bus_closed {
            if !self.is_closed() {
                log::debug!("{}: channel closed, closing player", self.id());
            }
            self.close();
            return Ok(0);
        }
        if self.is_closed() {
            self.source = None;
            return Ok(0);
        }
        if !bus_active {
            // Silence without consuming the source; Ok(0) would end the stream
            buf.fill(0);
            return Ok(buf.len());
        }

        let Some(source) = self.source.as_mut() else {
            return Ok(0);
        };

        let n = source.read(buf)?;
        if n == 0 && !buf.is_empty() {
            log::trace!("{}: end of stream", self.id());
            self.state.playing.store(false, Ordering::Release);
            return Ok(0);
        }

        let frames = &mut buf[..aligned(n)];
        self.effects.apply(frames);
        if let Some(channel) = &self.channel {
            channel.apply(frames);
        }
        Ok(n)
    }
}

impl Seek for Player {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self.source.as_mut() {
            Some(source) => source.seek(pos),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode_frames, encode_frames};
    use crate::effects::{Pan, Volume};
    use std::io::Cursor;

    fn tone(frames: usize) -> Cursor<Vec<u8>> {
        Cursor::new(encode_frames(&vec![(1.0, 1.0); frames]))
    }

    #[test]
    fn test_private_then_bus_order() {
        let bus = Channel::new();
        bus.add_effect("quiet", Volume::new().with_strength(0.5));

        let mut player = Player::new(Cursor::new(encode_frames(&[(0.75, 0.75); 4])));
        player.add_effect("loud", Volume::new().with_strength(2.0));
        player.set_channel(bus);

        let mut chunk = [0u8; 16];
        assert_eq!(player.read(&mut chunk).unwrap(), 16);
        let expected = 1.0 - std::f64::consts::FRAC_1_SQRT_2;
        for (l, _) in decode_frames(&chunk) {
            assert!((l - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_inactive_channel_yields_silence_without_consuming() {
        let bus = Channel::new();
        let mut player = Player::new(tone(4));
        player.set_channel(bus.clone());

        bus.set_active(false);
        let mut chunk = [0xAAu8; 16];
        assert_eq!(player.read(&mut chunk).unwrap(), 16);
        assert!(chunk.iter().all(|&b| b == 0));

        bus.set_active(true);
        assert_eq!(player.read(&mut chunk).unwrap(), 16);
        assert_eq!(decode_frames(&chunk)[0], (1.0, 1.0));
    }

    #[test]
    fn test_closed_channel_closes_player() {
        let bus = Channel::new();
        let mut player = Player::new(tone(16));
        player.set_channel(bus.clone());
        player.play();

        bus.close();
        let mut chunk = [0u8; 16];
        assert_eq!(player.read(&mut chunk).unwrap(), 0);
        assert!(player.is_closed());
        assert!(!player.is_playing());
        assert_eq!(player.seek(SeekFrom::Start(0)).unwrap(), 0);
    }

    #[test]
    fn test_end_of_stream_stops_playing() {
        let mut player = Player::new(tone(1));
        player.play();
        let mut chunk = [0u8; 16];
        assert_eq!(player.read(&mut chunk).unwrap(), 4);
        assert!(player.is_playing());
        assert_eq!(player.read(&mut chunk).unwrap(), 0);
        assert!(!player.is_playing());
        assert!(!player.is_closed());
    }

    #[test]
    fn test_handle_close_takes_effect_on_next_read() {
        let mut player = Player::new(tone(8));
        let handle = player.handle();
        handle.close();
        assert_eq!(player.read(&mut [0u8; 16]).unwrap(), 0);
        assert!(player.is_closed());
    }

    #[test]
    fn test_play_registers_with_channel() {
        let bus = Channel::new();
        let mut player = Player::new(tone(8)).with_id("lead");
        player.set_channel(bus.clone());
        assert!(!bus.is_playing_player("lead"));

        player.play();
        assert!(bus.is_playing_player("lead"));
        assert_eq!(bus.player_by_id("lead").map(|p| p.id().to_owned()), Some("lead".into()));

        player.pause();
        assert!(bus.playing_players().is_empty());

        player.play();
        drop(player);
        assert!(bus.playing_players().is_empty());
    }

    #[test]
    fn test_closed_player_cannot_play() {
        let mut player = Player::new(tone(8));
        player.close();
        player.play();
        assert!(!player.is_playing());
    }

    #[test]
    fn test_copy_properties_clones_fresh_effects() {
        let bus = Channel::new();
        let mut original = Player::new(tone(4));
        original.add_effect("pan", Pan::new().with_pan(0.5));
        original.set_channel(bus.clone());

        let mut copy = Player::new(tone(4));
        copy.copy_properties(&original);
        assert!(copy.channel().is_some_and(|c| c.same_bus(&bus)));

        let pan = copy.effect("pan").and_then(Effect::as_pan).unwrap();
        assert_eq!(pan.params().pan(), 0.5);
        pan.params().set_pan(-0.5);
        let original_pan = original.effect("pan").and_then(Effect::as_pan).unwrap();
        assert_eq!(original_pan.params().pan(), 0.5);
    }

    #[test]
    fn test_effect_lookup_and_removal() {
        let mut player = Player::new(tone(4));
        player.add_effect("a", Pan::new());
        player.add_effect("b", Volume::new());
        player.add_effect("a", Volume::new());
        assert_eq!(player.effect_ids(), vec!["a", "b"]);
        assert_eq!(player.effect("a").map(Effect::name), Some("volume"));
        if let Some(effect) = player.effect_mut("b") {
            effect.set_active(false);
        }
        assert_eq!(player.effect("b").map(Effect::is_active), Some(false));
        assert!(player.remove_effect("a").is_some());
        assert_eq!(player.effect_ids(), vec!["b"]);
    }

    #[test]
    fn test_seek_forwards() {
        let mut player = Player::new(tone(8));
        assert_eq!(player.seek(SeekFrom::Start(12)).unwrap(), 12);
        let mut chunk = [0u8; 32];
        assert_eq!(player.read(&mut chunk).unwrap(), 20);
    }
}
