//! Minimal noise filter demo.
//!
//! Wraps a toy engine that attenuates everything below a fixed threshold,
//! drives it the way a host pipeline would (initialize, per-block process,
//! device change, connection events, teardown), and prints the filter status.
//!
//! ```sh
//! cargo run -p sourdine --example simple
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use sourdine::{
    AudioBuffer, AudioProcessor, ConnectionObserver, ConnectionState, FilterEngine, NoiseFilter,
    ProcessInit, RoomContext, Session,
};
use tracing_subscriber::EnvFilter;

static GATE_LIBRARY: ProcessInit = ProcessInit::new();

/// A crude noise gate: samples quieter than the threshold are muted.
/// Channels longer than one 10 ms block at 48 kHz are rejected.
#[derive(Debug)]
struct NoiseGate {
    threshold: f32,
    sample_rate_hz: AtomicU32,
}

impl FilterEngine for NoiseGate {
    fn global_init(&self) -> bool {
        GATE_LIBRARY.get_or_init(|| true)
    }

    fn initialize(&self, sample_rate_hz: u32, _num_channels: usize) {
        self.sample_rate_hz.store(sample_rate_hz, Ordering::Relaxed);
    }

    fn reset(&self, sample_rate_hz: u32) {
        self.sample_rate_hz.store(sample_rate_hz, Ordering::Relaxed);
    }

    fn process(
        &self,
        _num_bands: usize,
        num_frames: usize,
        _num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool {
        if num_frames > 480 {
            return false;
        }
        for s in buffer.iter_mut() {
            if s.abs() < self.threshold {
                *s = 0.0;
            }
        }
        true
    }

    fn update(&self, context: &RoomContext) {
        println!("engine saw connection state {:?}", context.connection_state);
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let filter = Arc::new(NoiseFilter::new(NoiseGate {
        threshold: 200.0,
        sample_rate_hz: AtomicU32::new(0),
    }));

    // The host registers the same filter under both capabilities.
    let processor: Arc<dyn AudioProcessor> = filter.clone();
    let observer: Arc<dyn ConnectionObserver> = filter.clone();

    let session = Session {
        sid: Some("RM_demo".into()),
        name: Some("demo room".into()),
        ..Default::default()
    };
    observer.on_connection_state_changed(
        &session,
        ConnectionState::Connected,
        ConnectionState::Connecting,
    );

    // 48 kHz stereo: a quiet hiss with a louder tone on the left channel.
    processor.initialize(48_000, 2);
    let num_frames = 480;
    let mut block = vec![0.0f32; num_frames * 2];
    for (i, frame) in block[..num_frames].iter_mut().enumerate() {
        *frame = (i as f32 / 20.0).sin() * 4000.0 + 50.0;
    }
    for (i, frame) in block[num_frames..].iter_mut().enumerate() {
        *frame = if i % 2 == 0 { 50.0 } else { -50.0 };
    }

    let mut buffer = AudioBuffer::with_default_bands(&mut block, 2).expect("valid stereo block");
    processor.process(&mut buffer);
    assert!(
        buffer.channel(1).iter().all(|&s| s == 0.0),
        "hiss-only channel should be gated to silence"
    );

    // Switching to a 96 kHz device resets the engine; its 960-frame blocks
    // are more than the gate accepts, so both channels get recorded as failed.
    processor.initialize(96_000, 2);
    let mut block = vec![0.0f32; 960 * 2];
    let mut buffer = AudioBuffer::with_default_bands(&mut block, 2).expect("valid stereo block");
    processor.process(&mut buffer);

    processor.release();

    let status = filter.status();
    println!("{} status: {status:?}", processor.name());
    println!("degraded: {}", status.is_degraded());
}
