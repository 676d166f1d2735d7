//! Serialized access to the adapter's mutable state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::channel_set::ChannelSet;
use crate::status::FilterStatus;

/// Everything the adapter mutates after construction.
///
/// Always read and written as a whole under one [`StateSync`] lock so that
/// observers never see a partial update.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FilterState {
    pub(crate) enabled: bool,
    /// `None` until the first `initialize` call; never goes back to `None`.
    pub(crate) initialized_sample_rate: Option<u32>,
    /// Sticky: set at construction only.
    pub(crate) global_init_failed: bool,
    /// Grows only.
    pub(crate) failed_channels: ChannelSet,
}

impl FilterState {
    pub(crate) fn new(enabled: bool, global_init_failed: bool) -> Self {
        Self {
            enabled,
            initialized_sample_rate: None,
            global_init_failed,
            failed_channels: ChannelSet::new(),
        }
    }

    pub(crate) fn snapshot(&self) -> FilterStatus {
        FilterStatus {
            enabled: self.enabled,
            initialized_sample_rate: self.initialized_sample_rate,
            failed_to_initialize: self.global_init_failed,
            failed_channels: self.failed_channels.iter().collect(),
        }
    }
}

/// A value guarded by a mutex with short, non-blocking critical sections.
///
/// Closures passed to [`read`](Self::read) and [`mutate`](Self::mutate) run
/// with the lock held and must not call into the filter engine, log, or
/// allocate when used from the audio thread.
///
/// A poisoned lock is recovered rather than propagated: every closure leaves
/// the state valid, so a panic elsewhere cannot leave it torn.
#[derive(Debug, Default)]
pub(crate) struct StateSync<T> {
    inner: Mutex<T>,
}

impl<T> StateSync<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Runs `f` with shared access to the state.
    #[inline]
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    /// Runs `f` with exclusive access to the state and returns its result.
    #[inline]
    pub(crate) fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
