//! Capabilities a host pipeline drives.
//!
//! The two traits are independent: a host registers a filter once as an
//! audio processing stage and, separately, as a connection observer.

use crate::audio_buffer::AudioBuffer;
use crate::room_context::{ConnectionState, Session};

/// A custom stage in the host's audio processing pipeline.
pub trait AudioProcessor: Send + Sync {
    /// Stable identifier of this stage.
    fn name(&self) -> &str;

    /// Called before the first buffer and again whenever the device's sample
    /// rate changes (for example when switching output routes).
    fn initialize(&self, sample_rate_hz: u32, num_channels: usize);

    /// Called for every audio block on the real-time audio thread.
    fn process(&self, buffer: &mut AudioBuffer<'_>);

    /// Called once when the host tears the stage down.
    fn release(&self);
}

/// Receives session connection-state transitions.
///
/// Called on the host's event-dispatch path; implementations must not panic
/// back into it.
pub trait ConnectionObserver: Send + Sync {
    fn on_connection_state_changed(
        &self,
        session: &Session,
        new_state: ConnectionState,
        old_state: ConnectionState,
    );
}
