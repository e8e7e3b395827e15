//! Players routed through shared channel buses.

use std::io::{Read, Seek, SeekFrom};
use std::thread;

use soundstack::{
    Channel, Delay, EffectControls, Lowpass, Pan, PcmSource, Player, SineSource, Volume,
    decode_frames,
};

fn constant(level: f64, frames: usize) -> PcmSource {
    PcmSource::from_frames(&vec![(level, level); frames])
}

#[test]
fn test_closing_a_channel_ends_every_routed_player() {
    let bus = Channel::new();
    bus.add_effect("gain", Volume::new());

    let mut first = Player::new(SineSource::new(44_100, 220.0)).with_id("first");
    let mut second = Player::new(SineSource::new(44_100, 330.0)).with_id("second");
    for player in [&mut first, &mut second] {
        player.set_channel(bus.clone());
        player.play();
    }
    assert_eq!(bus.playing_players().len(), 2);

    let mut chunk = [0u8; 256];
    assert_eq!(first.read(&mut chunk).unwrap(), 256);
    assert_eq!(second.read(&mut chunk).unwrap(), 256);

    bus.close();
    assert_eq!(first.read(&mut chunk).unwrap(), 0);
    assert_eq!(second.read(&mut chunk).unwrap(), 0);
    assert!(first.is_closed() && second.is_closed());
    assert!(bus.playing_players().is_empty());

    // Stays closed
    assert_eq!(first.read(&mut chunk).unwrap(), 0);
}

#[test]
fn test_bus_effects_are_shared_between_players() {
    let bus = Channel::new();
    bus.add_effect("smooth", Lowpass::new().with_strength(0.5));

    let mut loud = Player::new(constant(0.8, 1));
    let mut silent = Player::new(constant(0.0, 1));
    loud.set_channel(bus.clone());
    silent.set_channel(bus.clone());

    let alpha = std::f64::consts::FRAC_1_SQRT_2;
    let mut chunk = [0u8; 4];
    loud.read(&mut chunk).unwrap();
    let first = decode_frames(&chunk)[0].0;
    assert!((first - 0.8 * (1.0 - alpha)).abs() < 1e-3);

    // The silent player inherits the filter memory left by the loud one
    silent.read(&mut chunk).unwrap();
    assert!((decode_frames(&chunk)[0].0 - alpha * first).abs() < 1e-3);
}

#[test]
fn test_bus_history_carries_across_players() {
    let bus = Channel::new();
    // 2-frame delay line shared by both players
    bus.add_effect("echo", Delay::new(1000).with_wait(0.002).with_feedback(0.0));

    let mut first = Player::new(constant(0.5, 2));
    let mut second = Player::new(constant(0.0, 2));
    first.set_channel(bus.clone());
    second.set_channel(bus.clone());

    let mut chunk = [0u8; 8];
    first.read(&mut chunk).unwrap();
    second.read(&mut chunk).unwrap();
    // The second player hears the first player's audio echoed
    for (l, _) in decode_frames(&chunk) {
        assert!((l - 0.5).abs() < 1e-4);
    }
}

#[test]
fn test_pausing_the_bus_silences_without_losing_position() {
    let bus = Channel::new();
    let mut player = Player::new(PcmSource::from_frames(&[(0.1, 0.1), (0.2, 0.2), (0.3, 0.3)]));
    player.set_channel(bus.clone());

    let mut chunk = [0u8; 4];
    player.read(&mut chunk).unwrap();
    bus.set_active(false);
    assert_eq!(player.read(&mut chunk).unwrap(), 4);
    assert_eq!(chunk, [0u8; 4]);

    bus.set_active(true);
    player.read(&mut chunk).unwrap();
    assert!((decode_frames(&chunk)[0].0 - 0.2).abs() < 1e-4);
    assert_eq!(player.seek(SeekFrom::Current(0)).unwrap(), 8);
}

#[test]
fn test_parameters_change_from_another_thread() {
    let bus = Channel::new();
    bus.add_effect("pan", Pan::new());
    let Some(EffectControls::Pan(pan)) = bus.controls("pan") else {
        panic!("pan controls missing");
    };

    let mut player = Player::new(constant(1.0, 16));
    player.set_channel(bus.clone());

    thread::spawn(move || pan.set_pan(-1.0)).join().unwrap();

    let mut chunk = [0u8; 64];
    player.read(&mut chunk).unwrap();
    assert!(decode_frames(&chunk).iter().all(|&f| f == (1.0, 0.0)));
}

#[test]
fn test_players_can_be_pulled_on_another_thread() {
    let bus = Channel::new();
    bus.add_effect("gain", Volume::new().with_strength(2.0));

    let mut player = Player::new(constant(0.25, 64)).with_id("worker");
    player.set_channel(bus.clone());
    player.play();
    let handle = player.handle();

    let rendered = thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 64];
        loop {
            let n = player.read(&mut chunk)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&chunk[..n]);
        }
    })
    .join()
    .unwrap()
    .unwrap();

    assert_eq!(rendered.len(), 256);
    assert!(decode_frames(&rendered).iter().all(|&(l, _)| (l - 0.5).abs() < 1e-4));
    // Finished players drop off the bus
    assert!(!handle.is_playing());
    assert!(!bus.is_playing_player("worker"));
}
