//! Record microphone audio, denoise it through sourdine, and write WAV files.
//!
//! Writes both raw (unfiltered) and filtered audio to separate files so you
//! can compare them. Toggling with `--toggle-every` exercises enabling and
//! disabling the filter mid-stream.
//!
//! ```sh
//! cargo run -p sourdine-rnnoise --features examples --example recording -- --duration 5
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use hound::WavWriter;
use ringbuf::HeapRb;
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use tracing_subscriber::EnvFilter;

use sourdine::{AudioBuffer, AudioProcessor, NoiseFilter};
use sourdine_rnnoise::{FRAME_SIZE, RnnoiseEngine, SAMPLE_RATE_HZ};

#[allow(dead_code, reason = "shared helpers for multi-channel examples")]
mod common;

use common::S16_SCALE;

const NUM_CHANNELS: u16 = 1;

#[derive(Parser, Debug)]
#[command(about = "Record and denoise microphone audio through sourdine")]
struct Args {
    /// Recording duration in seconds.
    #[arg(short, long, default_value_t = 5)]
    duration: u64,

    /// Path for the raw (unfiltered) recording.
    #[arg(long, default_value = "raw.wav")]
    raw_output: String,

    /// Path for the filtered recording.
    #[arg(long, default_value = "filtered.wav")]
    filtered_output: String,

    /// Flip the filter on and off every N seconds (0 keeps it on).
    #[arg(long, default_value_t = 0)]
    toggle_every: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let running = Arc::new(AtomicBool::new(true));

    ctrlc::set_handler({
        let running = running.clone();
        move || running.store(false, Ordering::SeqCst)
    })?;

    let host = cpal::default_host();
    let input_device = host
        .default_input_device()
        .context("no input device available")?;
    println!("Recording from: {}", input_device.name()?);

    let cpal_config = cpal::StreamConfig {
        channels: NUM_CHANNELS,
        sample_rate: cpal::SampleRate(SAMPLE_RATE_HZ),
        buffer_size: cpal::BufferSize::Default,
    };

    let ring_size = FRAME_SIZE * 8;
    let (mut prod, mut cons) = HeapRb::<f32>::new(ring_size).split();

    let input_stream = input_device.build_input_stream(
        &cpal_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            prod.push_slice(data);
        },
        |err| eprintln!("input error: {err}"),
        None,
    )?;

    input_stream.play()?;

    let filter = Arc::new(NoiseFilter::new(RnnoiseEngine::new()));
    let processor: Arc<dyn AudioProcessor> = filter.clone();
    processor.initialize(SAMPLE_RATE_HZ, usize::from(NUM_CHANNELS));

    // Control thread flipping the filter while the capture loop runs.
    let toggler = (args.toggle_every > 0).then(|| {
        let filter = filter.clone();
        let running = running.clone();
        let period = Duration::from_secs(args.toggle_every);
        thread::spawn(move || {
            let mut next = Instant::now() + period;
            while running.load(Ordering::SeqCst) {
                if Instant::now() >= next {
                    let enabled = !filter.is_enabled();
                    filter.set_enabled(enabled);
                    println!("filter {}", if enabled { "on" } else { "off" });
                    next += period;
                }
                thread::sleep(Duration::from_millis(10));
            }
        })
    });

    let spec = hound::WavSpec {
        channels: NUM_CHANNELS,
        sample_rate: SAMPLE_RATE_HZ,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut raw_writer = WavWriter::create(&args.raw_output, spec)?;
    let mut filtered_writer = WavWriter::create(&args.filtered_output, spec)?;

    println!(
        "Recording for {} seconds (Ctrl+C to stop early)...",
        args.duration
    );

    let deadline = Instant::now() + Duration::from_secs(args.duration);
    let mut block = vec![0.0f32; FRAME_SIZE];

    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        if cons.occupied_len() < FRAME_SIZE {
            thread::sleep(Duration::from_millis(1));
            continue;
        }

        cons.pop_slice(&mut block);

        for &s in &block {
            raw_writer.write_sample(s)?;
        }

        for s in block.iter_mut() {
            *s *= S16_SCALE;
        }
        let mut buffer = AudioBuffer::with_default_bands(&mut block, usize::from(NUM_CHANNELS))?;
        processor.process(&mut buffer);

        for &s in &block {
            filtered_writer.write_sample(s / S16_SCALE)?;
        }
    }

    running.store(false, Ordering::SeqCst);
    if let Some(toggler) = toggler {
        let _ = toggler.join();
    }

    raw_writer.finalize()?;
    filtered_writer.finalize()?;
    processor.release();

    println!("Wrote {} and {}", args.raw_output, args.filtered_output);
    println!("Filter status: {:?}", filter.status());

    Ok(())
}
