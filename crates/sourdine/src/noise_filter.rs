//! Streaming noise-filter adapter.
//!
//! [`NoiseFilter`] wraps one [`FilterEngine`] instance and exposes it to a
//! host pipeline. Nothing on the processing path raises: engine failures are
//! folded into the filter state for the host to poll.

use std::panic;
use std::panic::AssertUnwindSafe;

use derive_more::Debug;

use crate::audio_buffer::AudioBuffer;
use crate::config::Config;
use crate::engine::FilterEngine;
use crate::host::{AudioProcessor, ConnectionObserver};
use crate::room_context::{ConnectionState, RoomContext, Session};
use crate::state::{FilterState, StateSync};
use crate::status::FilterStatus;

/// Per-session adapter between a host audio pipeline and a noise-filter
/// engine.
///
/// Share it between the audio thread and control threads with an `Arc`:
/// every method takes `&self`, engine calls happen outside the state lock,
/// and the lock is only held for a handful of field updates.
#[derive(Debug)]
pub struct NoiseFilter<E> {
    name: String,
    #[debug(skip)]
    engine: E,
    state: StateSync<FilterState>,
}

/// Builder for [`NoiseFilter`].
#[derive(Debug)]
pub struct NoiseFilterBuilder<E> {
    #[debug(skip)]
    engine: E,
    config: Config,
}

impl<E: FilterEngine> NoiseFilterBuilder<E> {
    /// Replaces the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Runs the engine's process-wide initialization and builds the filter.
    ///
    /// Never fails: if the engine library cannot initialize, the failure is
    /// logged and recorded (see [`NoiseFilter::failed_to_initialize`]) and the
    /// filter is still returned.
    pub fn build(self) -> NoiseFilter<E> {
        let Self { engine, config } = self;
        let global_init_failed = !engine.global_init();
        if global_init_failed {
            tracing::error!(
                name = %config.name,
                "noise filter engine failed global initialization; audio will pass through unfiltered"
            );
        }
        NoiseFilter {
            name: config.name,
            engine,
            state: StateSync::new(FilterState::new(config.enabled, global_init_failed)),
        }
    }
}

impl<E: FilterEngine> NoiseFilter<E> {
    /// Creates a filter with the default [`Config`].
    pub fn new(engine: E) -> Self {
        Self::builder(engine).build()
    }

    /// Starts building a filter around `engine`.
    pub fn builder(engine: E) -> NoiseFilterBuilder<E> {
        NoiseFilterBuilder {
            engine,
            config: Config::default(),
        }
    }

    /// Stable identifier of this processing stage.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Whether buffers are currently filtered.
    pub fn is_enabled(&self) -> bool {
        self.state.read(|s| s.enabled)
    }

    /// Turns filtering on or off. Takes effect no later than the next
    /// [`process`](Self::process) call after this returns.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.mutate(|s| s.enabled = enabled);
    }

    /// Sets up the engine for a stream, or resets it to a new rate.
    ///
    /// The very first call on a filter runs the engine's full setup. Every
    /// later call resets the engine to `sample_rate_hz` instead, even if the
    /// rate did not change; `num_channels` is only used for the setup.
    pub fn initialize(&self, sample_rate_hz: u32, num_channels: usize) {
        let is_first = self
            .state
            .mutate(|s| s.initialized_sample_rate.replace(sample_rate_hz).is_none());

        if is_first {
            tracing::debug!(
                name = %self.name,
                sample_rate_hz,
                num_channels,
                "initializing noise filter engine"
            );
            self.engine.initialize(sample_rate_hz, num_channels);
        } else {
            tracing::debug!(
                name = %self.name,
                sample_rate_hz,
                "resetting noise filter engine to new sample rate"
            );
            self.engine.reset(sample_rate_hz);
        }
    }

    /// Filters every channel of `buffer` in place.
    ///
    /// Does nothing while disabled. Channels are handed to the engine in
    /// ascending order; a channel the engine fails on is recorded and the
    /// remaining channels are still processed. This runs on the audio thread
    /// and neither allocates nor logs.
    pub fn process(&self, buffer: &mut AudioBuffer<'_>) {
        if !self.is_enabled() {
            return;
        }

        let num_bands = buffer.num_bands();
        let num_frames = buffer.num_frames();
        let num_frames_per_band = buffer.num_frames_per_band();

        for channel in 0..buffer.num_channels() {
            let ok = self.engine.process(
                num_bands,
                num_frames,
                num_frames_per_band,
                buffer.channel_mut(channel),
            );
            if !ok {
                self.state.mutate(|s| {
                    s.failed_channels.insert(channel);
                });
            }
        }
    }

    /// Lifecycle hook for pipeline teardown. Only logs.
    pub fn release(&self) {
        tracing::info!(name = %self.name, "noise filter released");
    }

    /// Forwards the session's new connection state to the engine.
    ///
    /// Fire-and-forget: a panic inside the engine is caught and logged here
    /// and never reaches the caller.
    pub fn on_connection_state_changed(
        &self,
        session: &Session,
        new_state: ConnectionState,
        old_state: ConnectionState,
    ) {
        tracing::debug!(
            name = %self.name,
            ?old_state,
            ?new_state,
            "forwarding connection state to noise filter engine"
        );
        let context = RoomContext::from_session(session, new_state);
        let engine = &self.engine;
        if panic::catch_unwind(AssertUnwindSafe(|| engine.update(&context))).is_err() {
            tracing::warn!(
                name = %self.name,
                ?new_state,
                "noise filter engine panicked while applying connection context"
            );
        }
    }

    /// Whether the engine's process-wide initialization failed at
    /// construction.
    pub fn failed_to_initialize(&self) -> bool {
        self.state.read(|s| s.global_init_failed)
    }

    /// Channels that have failed at least once, in ascending order.
    pub fn failed_channels(&self) -> Vec<usize> {
        // Copy out under the lock, collect outside it.
        let failed = self.state.read(|s| s.failed_channels);
        failed.iter().collect()
    }

    /// Sample rate of the most recent [`initialize`](Self::initialize), if
    /// any.
    pub fn initialized_sample_rate(&self) -> Option<u32> {
        self.state.read(|s| s.initialized_sample_rate)
    }

    /// Consistent snapshot of the whole filter state.
    pub fn status(&self) -> FilterStatus {
        let state = self.state.read(|s| *s);
        state.snapshot()
    }
}

impl<E: FilterEngine> AudioProcessor for NoiseFilter<E> {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn initialize(&self, sample_rate_hz: u32, num_channels: usize) {
        Self::initialize(self, sample_rate_hz, num_channels);
    }

    fn process(&self, buffer: &mut AudioBuffer<'_>) {
        Self::process(self, buffer);
    }

    fn release(&self) {
        Self::release(self);
    }
}

impl<E: FilterEngine> ConnectionObserver for NoiseFilter<E> {
    fn on_connection_state_changed(
        &self,
        session: &Session,
        new_state: ConnectionState,
        old_state: ConnectionState,
    ) {
        Self::on_connection_state_changed(self, session, new_state, old_state);
    }
}
