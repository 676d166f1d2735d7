//! Denoise a WAV file through the noise filter and RNNoise.
//!
//! The input is processed in 10 ms blocks. RNNoise only runs at 48 kHz, so
//! files at any other rate pass through unchanged and every channel shows up
//! in the failure report.
//!
//! ```sh
//! cargo run -p sourdine-rnnoise --features examples --example denoise -- noisy.wav clean.wav
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing_subscriber::EnvFilter;

use sourdine::{AudioBuffer, Config, NoiseFilter};
use sourdine_rnnoise::RnnoiseEngine;

#[allow(dead_code, reason = "shared helpers for multi-channel examples")]
mod common;

use common::{S16_SCALE, to_channel_major, to_interleaved};

#[derive(Parser, Debug)]
#[command(about = "Denoise a WAV file with RNNoise through sourdine")]
struct Args {
    /// Input WAV file.
    input: PathBuf,

    /// Output WAV file (32-bit float).
    output: PathBuf,

    /// Copy the input through without filtering.
    #[arg(long)]
    bypass: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut reader = WavReader::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let spec = reader.spec();
    let num_channels = usize::from(spec.channels);
    ensure!(num_channels > 0, "input has no channels");

    // Everything is converted to floats in the S16 range.
    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|s| s * S16_SCALE))
            .collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = S16_SCALE / (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    println!(
        "{}: {} Hz, {} channel(s), {:.2} s",
        args.input.display(),
        spec.sample_rate,
        num_channels,
        samples.len() as f64 / num_channels as f64 / f64::from(spec.sample_rate)
    );

    let filter = NoiseFilter::builder(RnnoiseEngine::new())
        .config(Config {
            enabled: !args.bypass,
            ..Default::default()
        })
        .build();
    filter.initialize(spec.sample_rate, num_channels);

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&args.output, out_spec)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let block_len = (spec.sample_rate / 100) as usize * num_channels;
    let mut block = vec![0.0f32; block_len];
    let mut interleaved = vec![0.0f32; block_len];

    for chunk in samples.chunks(block_len) {
        // Zero-pad the trailing partial block.
        interleaved[..chunk.len()].copy_from_slice(chunk);
        interleaved[chunk.len()..].fill(0.0);

        to_channel_major(&interleaved, num_channels, &mut block);
        let mut buffer = AudioBuffer::with_default_bands(&mut block, num_channels)?;
        filter.process(&mut buffer);
        to_interleaved(&block, num_channels, &mut interleaved);

        for &s in &interleaved[..chunk.len()] {
            writer.write_sample(s / S16_SCALE)?;
        }
    }

    writer.finalize()?;
    filter.release();

    let status = filter.status();
    println!("Wrote {}", args.output.display());
    if status.failed_channels.is_empty() {
        println!("All channels filtered");
    } else {
        println!("Failed channels: {:?}", status.failed_channels);
    }

    Ok(())
}
