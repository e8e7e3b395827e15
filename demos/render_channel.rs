//! Renders two players routed through a preset bus into a WAV file.
//!
//! Usage: cargo run --example render_channel [preset.yaml] [out.wav]
//!
//! Without a preset path a built-in stack is used and written next to the
//! output so it can be edited and fed back in.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use soundstack::{
    AudioProperties, BYTES_PER_FRAME, NoiseSource, Player, SineSource, StackConfig, Volume,
    decode_frames,
};

const SAMPLE_RATE: u32 = 44_100;
const SECONDS: usize = 3;
const CHUNK_FRAMES: usize = 512;

const DEFAULT_PRESET: &str = r#"
effects:
  - id: crush
    type: bitcrush
    strength: 0.35
  - id: warmth
    type: lowpass
    strength: 0.4
  - id: echo
    type: delay
    wait: 0.25
    strength: 0.5
    feedback: 0.45
"#;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let preset_path = args.next().map(PathBuf::from);
    let out_path = PathBuf::from(args.next().unwrap_or_else(|| "render_channel.wav".into()));

    let preset = match &preset_path {
        Some(path) => StackConfig::load(path)?,
        None => {
            let preset = StackConfig::from_yaml(DEFAULT_PRESET)?;
            let saved = out_path.with_extension("yaml");
            preset.save(&saved)?;
            println!("Wrote default preset to {}", saved.display());
            preset
        }
    };
    let bus = preset.build_channel(SAMPLE_RATE);

    // Normalize the noise bed against its own peak before mixing
    let mut noise = NoiseSource::new(7).with_amplitude(0.3);
    let mut properties = AudioProperties::new();
    let analysis = properties.analyze("noise", &mut noise, 0)?;
    println!("Noise peak {:.3}, normalization {:.3}", analysis.peak, analysis.normalization);

    let mut lead =
        Player::new(SineSource::new(SAMPLE_RATE, 330.0).with_amplitude(0.5)).with_id("lead");
    let mut bed = Player::new(noise).with_id("bed");
    bed.add_effect(
        "level",
        Volume::new()
            .with_strength(0.15)
            .with_normalization(analysis.normalization),
    );

    for player in [&mut lead, &mut bed] {
        player.set_channel(bus.clone());
        player.play();
    }
    println!("Playing through the bus: {:?}", bus.effect_ids());

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&out_path, spec)?;

    let mut lead_chunk = vec![0u8; CHUNK_FRAMES * BYTES_PER_FRAME];
    let mut bed_chunk = vec![0u8; CHUNK_FRAMES * BYTES_PER_FRAME];
    let total_chunks = SECONDS * SAMPLE_RATE as usize / CHUNK_FRAMES;

    for _ in 0..total_chunks {
        let lead_read = lead.read(&mut lead_chunk)?;
        let bed_read = bed.read(&mut bed_chunk)?;
        if lead_read == 0 && bed_read == 0 {
            break;
        }

        let lead_frames = decode_frames(&lead_chunk[..lead_read]);
        let bed_frames = decode_frames(&bed_chunk[..bed_read]);
        for i in 0..lead_frames.len().max(bed_frames.len()) {
            let (ll, lr) = lead_frames.get(i).copied().unwrap_or_default();
            let (bl, br) = bed_frames.get(i).copied().unwrap_or_default();
            writer.write_sample(to_i16(ll + bl))?;
            writer.write_sample(to_i16(lr + br))?;
        }
    }

    bus.close();
    writer.finalize()?;
    println!("Rendered {} seconds to {}", SECONDS, out_path.display());
    Ok(())
}

fn to_i16(sample: f64) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f64).round() as i16
}
