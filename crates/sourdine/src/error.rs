//! Errors raised while wrapping host audio for the filter stage.

use std::error;
use std::fmt;

use crate::channel_set::MAX_CHANNELS;

/// Error returned when host audio cannot be viewed as an [`AudioBuffer`].
///
/// These are construction-time errors only. Nothing on the processing path
/// returns an error; failures there are recorded in the filter state.
///
/// [`AudioBuffer`]: crate::AudioBuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The buffer claims to carry no channels.
    ZeroChannels,
    /// More channels than a [`ChannelSet`](crate::ChannelSet) can track.
    TooManyChannels { num_channels: usize },
    /// The buffer claims to carry no frequency bands.
    ZeroBands,
    /// The per-channel frame count is not a multiple of the band count.
    BandsDoNotDivideFrames { num_frames: usize, num_bands: usize },
    /// The sample slice is empty or not a whole number of channels long.
    DataLengthMismatch { len: usize, num_channels: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ZeroChannels => f.write_str("audio buffer must have at least one channel"),
            Self::TooManyChannels { num_channels } => write!(
                f,
                "audio buffer has {num_channels} channels; at most {MAX_CHANNELS} are supported",
            ),
            Self::ZeroBands => f.write_str("audio buffer must have at least one band"),
            Self::BandsDoNotDivideFrames {
                num_frames,
                num_bands,
            } => write!(
                f,
                "{num_frames} frames per channel cannot be split into {num_bands} equal bands",
            ),
            Self::DataLengthMismatch { len, num_channels } => write!(
                f,
                "{len} samples cannot be split into {num_channels} non-empty channels",
            ),
        }
    }
}

impl error::Error for Error {}
