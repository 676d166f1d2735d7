//! Point-in-time view of a filter's health.

/// Snapshot of a [`NoiseFilter`](crate::NoiseFilter)'s state.
///
/// All fields are captured under a single critical section, so a snapshot is
/// always one the filter actually passed through. Hosts poll this (or the
/// individual queries) out of band to decide whether to surface a
/// degraded-audio warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStatus {
    /// Whether incoming buffers are currently handed to the engine.
    pub enabled: bool,
    /// Sample rate of the most recent `initialize` call, or `None` if the
    /// filter was never initialized.
    pub initialized_sample_rate: Option<u32>,
    /// Whether the engine's process-wide initialization failed when the
    /// filter was constructed.
    pub failed_to_initialize: bool,
    /// Channels that have failed at least once, ascending and without
    /// duplicates.
    pub failed_channels: Vec<usize>,
}

impl FilterStatus {
    /// Returns `true` if the filter is running with degraded audio: either
    /// the engine never initialized or at least one channel failed.
    pub fn is_degraded(&self) -> bool {
        self.failed_to_initialize || !self.failed_channels.is_empty()
    }
}
