//! Plays a tone through an effect chain and sweeps its parameters live.
//!
//! The audio callback pulls PCM from the last effect of the chain while the
//! main thread moves the pan and filter through their controls.
//! Run with `RUST_LOG=debug` to see pipeline events.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, StreamConfig};
use soundstack::{
    Algorithm, AudioBuffer, BYTES_PER_FRAME, Delay, Effect, Lowpass, Pan, SineSource, Volume,
    chain_from,
};

fn main() -> Result<()> {
    env_logger::init();

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;
    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0;

    let volume = Volume::new().with_strength(0.4);
    let pan = Pan::new();
    let lowpass = Lowpass::new().with_strength(0.0);
    let (pan_controls, lowpass_controls) = (pan.controls(), lowpass.controls());

    let output = chain_from(
        SineSource::new(sample_rate, 220.0),
        vec![
            Effect::new(volume),
            Effect::new(
                Delay::new(sample_rate)
                    .with_wait(0.3)
                    .with_strength(0.6)
                    .with_feedback(0.4),
            ),
            Effect::new(lowpass),
            Effect::new(pan),
        ],
    )?;
    let output = Arc::new(Mutex::new(output));

    let _stream = match config.sample_format() {
        SampleFormat::F32 => create_audio_stream::<f32>(&device, &config.into(), output)?,
        SampleFormat::I16 => create_audio_stream::<i16>(&device, &config.into(), output)?,
        SampleFormat::U16 => create_audio_stream::<u16>(&device, &config.into(), output)?,
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    println!("Sweeping pan and lowpass for 8 seconds...");
    for step in 0..=160 {
        let t = step as f64 / 160.0;
        pan_controls.set_pan((t * std::f64::consts::TAU * 2.0).sin());
        lowpass_controls.set_strength(t);
        thread::sleep(Duration::from_millis(50));
    }

    println!("Done!");
    Ok(())
}

fn create_audio_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    output: Arc<Mutex<Effect>>,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f64> + cpal::SizedSample,
{
    let channels = config.channels as usize;
    let mut bytes = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels;
            bytes.resize(frames * BYTES_PER_FRAME, 0);

            let read = match output.lock() {
                Ok(mut effect) => effect.read(&mut bytes).unwrap_or(0),
                Err(_) => 0,
            };
            bytes[read..].fill(0);

            let audio = AudioBuffer::new(&mut bytes);
            for (i, frame) in data.chunks_mut(channels).enumerate() {
                let (l, r) = audio.get(i);
                for (c, s) in frame.iter_mut().enumerate() {
                    let value = match c {
                        0 => l,
                        1 => r,
                        _ => (l + r) * 0.5,
                    };
                    *s = T::from_sample(value);
                }
            }
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}
