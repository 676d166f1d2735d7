#![no_main]

use std::sync::atomic::{AtomicUsize, Ordering};

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sourdine::{
    AudioBuffer, ConnectionState, FilterEngine, MAX_CHANNELS, NoiseFilter, RoomContext, Session,
};

/// Fails a channel when its first sample is negative.
#[derive(Debug, Default)]
struct SignEngine {
    global_init_ok: bool,
    setups: AtomicUsize,
    resets: AtomicUsize,
    calls: AtomicUsize,
}

impl FilterEngine for SignEngine {
    fn global_init(&self) -> bool {
        self.global_init_ok
    }

    fn initialize(&self, _sample_rate_hz: u32, _num_channels: usize) {
        self.setups.fetch_add(1, Ordering::Relaxed);
    }

    fn reset(&self, _sample_rate_hz: u32) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    fn process(
        &self,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool {
        self.calls.fetch_add(1, Ordering::Relaxed);
        assert_eq!(num_bands * num_frames_per_band, num_frames);
        assert_eq!(buffer.len(), num_frames);
        buffer.first().is_some_and(|&s| s >= 0.0)
    }

    fn update(&self, _context: &RoomContext) {}
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    global_init_ok: bool,
    operations: Vec<FuzzOp>,
}

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    Initialize { rate: u32, channels: u8 },
    Process { channels: u8, bands: u8, samples: Vec<f32> },
    SetEnabled(bool),
    Connection { new: u8, old: u8, sid: Option<String> },
    Status,
}

fuzz_target!(|input: FuzzInput| {
    let filter = NoiseFilter::new(SignEngine {
        global_init_ok: input.global_init_ok,
        ..Default::default()
    });
    assert_eq!(filter.failed_to_initialize(), !input.global_init_ok);

    let mut initialize_calls = 0;
    let mut failed = Vec::new();

    for op in input.operations {
        match op {
            FuzzOp::Initialize { rate, channels } => {
                filter.initialize(rate, usize::from(channels));
                initialize_calls += 1;
            }
            FuzzOp::Process {
                channels,
                bands,
                mut samples,
            } => {
                let calls_before = filter.engine().calls.load(Ordering::Relaxed);
                let enabled = filter.is_enabled();
                let Ok(mut buffer) =
                    AudioBuffer::new(&mut samples, usize::from(channels), usize::from(bands))
                else {
                    continue;
                };
                filter.process(&mut buffer);

                let calls = filter.engine().calls.load(Ordering::Relaxed) - calls_before;
                if enabled {
                    assert_eq!(calls, buffer.num_channels());
                } else {
                    assert_eq!(calls, 0);
                }
            }
            FuzzOp::SetEnabled(enabled) => {
                filter.set_enabled(enabled);
                assert_eq!(filter.is_enabled(), enabled);
            }
            FuzzOp::Connection { new, old, sid } => {
                let session = Session {
                    sid,
                    ..Default::default()
                };
                filter.on_connection_state_changed(
                    &session,
                    ConnectionState::from_raw(new),
                    ConnectionState::from_raw(old),
                );
            }
            FuzzOp::Status => {
                let status = filter.status();
                assert!(status.failed_channels.windows(2).all(|w| w[0] < w[1]));
                assert!(status.failed_channels.iter().all(|&c| c < MAX_CHANNELS));
            }
        }

        // Failures only accumulate.
        let now = filter.failed_channels();
        assert!(failed.iter().all(|c| now.contains(c)));
        failed = now;
    }

    let engine = filter.engine();
    let setups = engine.setups.load(Ordering::Relaxed);
    let resets = engine.resets.load(Ordering::Relaxed);
    assert_eq!(setups, usize::from(initialize_calls > 0));
    assert_eq!(setups + resets, initialize_calls);
});
