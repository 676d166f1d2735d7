//! RNNoise filter engine for [`sourdine`].
//!
//! [`RnnoiseEngine`] runs one RNNoise denoiser per channel on 10 ms blocks of
//! 48 kHz audio (480 frames) with samples in the float S16 range. Any other
//! rate or block size is reported as a per-channel failure, which the
//! adapter records in its failed-channel set.
//!
//! ```ignore
//! use sourdine::{AudioBuffer, NoiseFilter};
//! use sourdine_rnnoise::RnnoiseEngine;
//!
//! let filter = NoiseFilter::new(RnnoiseEngine::new());
//! filter.initialize(48_000, 1);
//!
//! let mut block = vec![0.0f32; 480];
//! let mut buffer = AudioBuffer::with_default_bands(&mut block, 1)?;
//! filter.process(&mut buffer);
//! assert!(filter.failed_channels().is_empty());
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use nnnoiseless::DenoiseState;
use sourdine::{ConnectionState, FilterEngine, ProcessInit, RoomContext};

/// The only sample rate RNNoise operates at.
pub const SAMPLE_RATE_HZ: u32 = 48_000;

/// Frames per channel in one RNNoise block (10 ms at 48 kHz).
pub const FRAME_SIZE: usize = DenoiseState::FRAME_SIZE;

static LIBRARY: ProcessInit = ProcessInit::new();

/// Denoiser state and input scratch for one channel.
#[derive(derive_more::Debug)]
struct ChannelDenoiser {
    #[debug(skip)]
    state: Box<DenoiseState<'static>>,
    #[debug(skip)]
    scratch: Box<[f32; FRAME_SIZE]>,
}

impl ChannelDenoiser {
    fn new() -> Self {
        Self {
            state: DenoiseState::new(),
            scratch: Box::new([0.0; FRAME_SIZE]),
        }
    }

    /// Denoises the first [`FRAME_SIZE`] samples of `buffer` in place.
    fn run(&mut self, buffer: &mut [f32]) {
        let frame = &mut buffer[..FRAME_SIZE];
        self.scratch.copy_from_slice(frame);
        self.state.process_frame(frame, &self.scratch[..]);
    }
}

#[derive(Debug, Default)]
struct Channels {
    sample_rate_hz: Option<u32>,
    denoisers: Vec<ChannelDenoiser>,
    /// Index of the channel the next `process` call belongs to.
    cursor: usize,
}

impl Channels {
    fn rebuild(&mut self, sample_rate_hz: u32, num_channels: usize) {
        self.sample_rate_hz = Some(sample_rate_hz);
        self.denoisers.clear();
        self.denoisers.resize_with(num_channels, ChannelDenoiser::new);
        self.cursor = 0;
    }
}

/// A [`FilterEngine`] backed by the pure-Rust RNNoise port.
///
/// The adapter hands over one channel per `process` call, in ascending
/// channel order for every block. The engine keeps a cursor over its
/// per-channel denoisers that follows that order and wraps after the last
/// channel; `initialize` and `reset` put it back to channel 0.
///
/// # Limitations
///
/// The engine never learns the channel count of a block, only the count
/// passed to the first `initialize`; `reset` keeps that many denoisers. If a
/// route change shrinks the stream (stereo set up, mono after a reset), the
/// cursor keeps cycling over all the original denoisers, so a mono stream
/// alternates between two RNNoise states from block to block. No failure is
/// recorded for this. Hosts that change the channel count should build a new
/// filter.
#[derive(Debug, Default)]
pub struct RnnoiseEngine {
    channels: Mutex<Channels>,
    connection_state: AtomicU8,
}

impl RnnoiseEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate passed to the last `initialize` or `reset`, if any.
    pub fn sample_rate_hz(&self) -> Option<u32> {
        self.lock().sample_rate_hz
    }

    /// Number of per-channel denoisers currently allocated.
    pub fn num_channels(&self) -> usize {
        self.lock().denoisers.len()
    }

    /// Connection state from the most recent context update.
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from_raw(self.connection_state.load(Ordering::Relaxed))
    }

    fn lock(&self) -> MutexGuard<'_, Channels> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FilterEngine for RnnoiseEngine {
    fn global_init(&self) -> bool {
        // nnnoiseless embeds its model weights; there is nothing to load.
        LIBRARY.get_or_init(|| true)
    }

    fn initialize(&self, sample_rate_hz: u32, num_channels: usize) {
        tracing::debug!(sample_rate_hz, num_channels, "allocating rnnoise states");
        self.lock().rebuild(sample_rate_hz, num_channels);
    }

    fn reset(&self, sample_rate_hz: u32) {
        let mut channels = self.lock();
        let num_channels = channels.denoisers.len();
        tracing::debug!(sample_rate_hz, num_channels, "resetting rnnoise states");
        channels.rebuild(sample_rate_hz, num_channels);
    }

    fn process(
        &self,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool {
        let mut channels = self.lock();
        if channels.denoisers.is_empty() {
            return false;
        }

        let index = channels.cursor;
        channels.cursor = (index + 1) % channels.denoisers.len();

        if channels.sample_rate_hz != Some(SAMPLE_RATE_HZ)
            || num_frames != FRAME_SIZE
            || num_bands.checked_mul(num_frames_per_band) != Some(num_frames)
            || buffer.len() < FRAME_SIZE
        {
            return false;
        }

        channels.denoisers[index].run(buffer);
        true
    }

    fn update(&self, context: &RoomContext) {
        tracing::debug!(
            room = ?context.sid,
            state = ?context.connection_state,
            "rnnoise engine context update"
        );
        self.connection_state
            .store(context.connection_state.as_raw(), Ordering::Relaxed);
    }
}
