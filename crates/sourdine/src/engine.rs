//! The opaque noise-filter engine capability.
//!
//! The adapter never looks inside the engine: it forwards rate changes,
//! per-channel audio and connection context, and folds the boolean results
//! into its own state.

use std::sync::{Arc, OnceLock};

use crate::room_context::RoomContext;

/// A per-instance noise-filter engine.
///
/// Methods take `&self` because the host may call
/// [`process`](Self::process) from the audio thread while
/// [`reset`](Self::reset) arrives from a control thread. Engines own
/// whatever interior synchronization they need.
pub trait FilterEngine: Send + Sync {
    /// Process-wide library initialization. Must be idempotent; returns
    /// `false` if the library is unusable.
    fn global_init(&self) -> bool;

    /// Full setup for the first stream the engine sees.
    fn initialize(&self, sample_rate_hz: u32, num_channels: usize);

    /// Lightweight re-initialization after a sample-rate change.
    ///
    /// Only the rate is passed; the channel count from
    /// [`initialize`](Self::initialize) stays in effect.
    fn reset(&self, sample_rate_hz: u32);

    /// Filters one channel of one audio block in place.
    ///
    /// Called on the real-time audio thread. Returns `false` if the channel
    /// could not be processed.
    fn process(
        &self,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool;

    /// Out-of-band context update. Never called on the audio thread.
    fn update(&self, context: &RoomContext);
}

impl<E: FilterEngine + ?Sized> FilterEngine for Box<E> {
    fn global_init(&self) -> bool {
        (**self).global_init()
    }

    fn initialize(&self, sample_rate_hz: u32, num_channels: usize) {
        (**self).initialize(sample_rate_hz, num_channels);
    }

    fn reset(&self, sample_rate_hz: u32) {
        (**self).reset(sample_rate_hz);
    }

    fn process(
        &self,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool {
        (**self).process(num_bands, num_frames, num_frames_per_band, buffer)
    }

    fn update(&self, context: &RoomContext) {
        (**self).update(context);
    }
}

impl<E: FilterEngine + ?Sized> FilterEngine for Arc<E> {
    fn global_init(&self) -> bool {
        (**self).global_init()
    }

    fn initialize(&self, sample_rate_hz: u32, num_channels: usize) {
        (**self).initialize(sample_rate_hz, num_channels);
    }

    fn reset(&self, sample_rate_hz: u32) {
        (**self).reset(sample_rate_hz);
    }

    fn process(
        &self,
        num_bands: usize,
        num_frames: usize,
        num_frames_per_band: usize,
        buffer: &mut [f32],
    ) -> bool {
        (**self).process(num_bands, num_frames, num_frames_per_band, buffer)
    }

    fn update(&self, context: &RoomContext) {
        (**self).update(context);
    }
}

/// Once-per-process initialization result for an engine library.
///
/// Engine implementations keep one of these in a `static` and route
/// [`FilterEngine::global_init`] through it, so the library's setup runs at
/// most once no matter how many filters are created.
///
/// ```
/// use sourdine::ProcessInit;
///
/// static LIBRARY: ProcessInit = ProcessInit::new();
///
/// assert!(LIBRARY.get_or_init(|| true));
/// // Later calls reuse the first result.
/// assert!(LIBRARY.get_or_init(|| false));
/// ```
#[derive(Debug, Default)]
pub struct ProcessInit {
    result: OnceLock<bool>,
}

impl ProcessInit {
    pub const fn new() -> Self {
        Self {
            result: OnceLock::new(),
        }
    }

    /// Runs `init` the first time this is called and returns its cached
    /// result on every call.
    pub fn get_or_init(&self, init: impl FnOnce() -> bool) -> bool {
        *self.result.get_or_init(init)
    }

    /// The cached result, or `None` if initialization has not run.
    pub fn get(&self) -> Option<bool> {
        self.result.get().copied()
    }
}
