//! C API for the sourdine noise-filter adapter.
//!
//! A C host supplies its engine as an [`SdnEngineVTable`] of callbacks and
//! gets back an opaque [`SdnNoiseFilter`] handle that behaves like
//! `sourdine::NoiseFilter`: enable/disable, initialize-on-rate-change,
//! per-block processing with failed-channel tracking, and connection-state
//! forwarding. The header is generated into `include/sourdine.h`.
//!
//! ```c
//! SdnEngineVTable vtable = { .user_data = engine, .process = my_process };
//! SdnNoiseFilter *filter = sdn_filter_create(&vtable);
//! sdn_filter_initialize(filter, 48000, 1);
//! sdn_filter_process(filter, samples, 480, 1, 0);
//! size_t failed = sdn_filter_failed_channels(filter, NULL, 0);
//! sdn_filter_destroy(filter);
//! ```

pub mod functions;
mod panic_guard;
pub mod types;

pub use functions::*;
pub use types::{
    SdnConnectionState, SdnEngineVTable, SdnError, SdnNoiseFilter, SdnRoomContext, SdnSession,
};
