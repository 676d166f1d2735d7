//! Mutable view over one block of host audio.
//!
//! The host hands the filter stage one 10 ms block at a time, laid out
//! channel-major with each channel contiguous:
//!
//! ```text
//! [ ch0: f0 f1 .. fN | ch1: f0 f1 .. fN | ... ]
//! ```
//!
//! Within a channel the frames may be split into equally sized frequency
//! bands (`num_frames_per_band = num_frames / num_bands`). The filter engine
//! receives the band layout together with the raw channel samples.

use derive_more::Debug;

use crate::channel_set::MAX_CHANNELS;
use crate::error::Error;

/// Number of bands the host splits a channel into for a given 10 ms frame
/// count: 32 kHz audio carries two bands, 48 kHz audio carries three, and
/// everything else is processed as a single full band.
pub fn num_bands_for_frames(num_frames: usize) -> usize {
    match num_frames {
        320 => 2,
        480 => 3,
        _ => 1,
    }
}

/// A borrowed, validated, multi-channel audio block.
///
/// Invariants:
/// - `1 <= num_channels <= MAX_CHANNELS`
/// - `num_frames >= 1` and `num_frames % num_bands == 0`
/// - `data.len() == num_channels * num_frames`
#[derive(Debug)]
pub struct AudioBuffer<'a> {
    #[debug(skip)]
    data: &'a mut [f32],
    num_channels: usize,
    num_frames: usize,
    num_bands: usize,
}

impl<'a> AudioBuffer<'a> {
    /// Wraps `data` as `num_channels` contiguous channels split into
    /// `num_bands` bands each.
    pub fn new(data: &'a mut [f32], num_channels: usize, num_bands: usize) -> Result<Self, Error> {
        if num_channels == 0 {
            return Err(Error::ZeroChannels);
        }
        if num_channels > MAX_CHANNELS {
            return Err(Error::TooManyChannels { num_channels });
        }
        if num_bands == 0 {
            return Err(Error::ZeroBands);
        }
        let len = data.len();
        if len == 0 || len % num_channels != 0 {
            return Err(Error::DataLengthMismatch { len, num_channels });
        }
        let num_frames = len / num_channels;
        if num_frames % num_bands != 0 {
            return Err(Error::BandsDoNotDivideFrames {
                num_frames,
                num_bands,
            });
        }
        Ok(Self {
            data,
            num_channels,
            num_frames,
            num_bands,
        })
    }

    /// Wraps `data` as `num_channels` channels, picking the band count the
    /// host uses for the resulting frame count (see [`num_bands_for_frames`]).
    pub fn with_default_bands(data: &'a mut [f32], num_channels: usize) -> Result<Self, Error> {
        let num_frames = match num_channels {
            0 => 0,
            n => data.len() / n,
        };
        Self::new(data, num_channels, num_bands_for_frames(num_frames))
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of frames (samples) per channel.
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Number of frequency bands per channel.
    #[inline]
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Number of frames in each band.
    #[inline]
    pub fn num_frames_per_band(&self) -> usize {
        self.num_frames / self.num_bands
    }

    /// Samples of channel `ch`.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.num_frames;
        &self.data[start..start + self.num_frames]
    }

    /// Mutable samples of channel `ch`.
    ///
    /// # Panics
    ///
    /// Panics if `ch >= num_channels()`.
    #[inline]
    pub fn channel_mut(&mut self, ch: usize) -> &mut [f32] {
        let start = ch * self.num_frames;
        &mut self.data[start..start + self.num_frames]
    }

    /// All samples, channel-major.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data[..]
    }
}
