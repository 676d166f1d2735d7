//! Audio block and operation generators for property-based testing.
//!
//! Provides both strategy functions (for use with `#[strategy(...)]`) and
//! `Arbitrary`-deriving types for common filter test inputs.

use proptest::collection::vec as pvec;
use proptest::prelude::*;
use test_strategy::Arbitrary;

/// Largest channel count the generators produce.
pub const MAX_TEST_CHANNELS: usize = 8;

/// A sample rate a host audio device may run at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum SampleRate {
    #[weight(1)]
    Hz8000,
    #[weight(1)]
    Hz16000,
    #[weight(1)]
    Hz32000,
    #[weight(1)]
    Hz44100,
    #[weight(2)]
    Hz48000,
}

impl SampleRate {
    pub fn hz(self) -> u32 {
        match self {
            Self::Hz8000 => 8000,
            Self::Hz16000 => 16000,
            Self::Hz32000 => 32000,
            Self::Hz44100 => 44100,
            Self::Hz48000 => 48000,
        }
    }

    /// Number of frames per channel in a 10 ms block at this rate.
    pub fn frame_size(self) -> usize {
        (self.hz() / 100) as usize
    }
}

/// Number of channels in a generated block.
pub fn channel_count() -> impl Strategy<Value = usize> {
    1..=MAX_TEST_CHANNELS
}

/// A channel-major 10 ms block in the float S16 range.
pub fn audio_block_f32(sample_rate: u32, channels: usize) -> impl Strategy<Value = Vec<f32>> {
    let len = (sample_rate / 100) as usize * channels;
    pvec(-32768.0f32..=32767.0f32, len..=len)
}

/// Which channels an engine should fail on, one flag per channel.
pub fn failure_mask(channels: usize) -> impl Strategy<Value = Vec<bool>> {
    pvec(any::<bool>(), channels..=channels)
}

/// A channel-major 10 ms block with its layout.
#[derive(Debug, Clone, Arbitrary)]
pub struct AudioBlock {
    pub sample_rate: SampleRate,
    #[strategy(channel_count())]
    pub channels: usize,
    #[strategy(audio_block_f32(#sample_rate.hz(), #channels))]
    pub samples: Vec<f32>,
}

/// One call a host makes on a filter.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum FilterOp {
    /// Submit a block; `failing[ch]` asks the engine to fail channel `ch`.
    #[weight(4)]
    Process {
        #[strategy(pvec(any::<bool>(), 1..=MAX_TEST_CHANNELS))]
        failing: Vec<bool>,
    },
    /// Toggle filtering.
    #[weight(1)]
    SetEnabled(bool),
    /// Device (re)initialization at a new rate.
    #[weight(1)]
    Initialize(SampleRate),
}

/// A sequence of up to `max_len` host operations.
pub fn filter_ops(max_len: usize) -> impl Strategy<Value = Vec<FilterOp>> {
    pvec(any::<FilterOp>(), 0..=max_len)
}
