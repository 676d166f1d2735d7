//! Streaming noise-filter adapter for real-time communication pipelines.
//!
//! Plugs an opaque noise-suppression engine into a host's audio pipeline:
//! per-channel processing with fail-safe degradation, setup-or-reset on
//! sample-rate changes, an enable switch, and out-of-band connection context
//! forwarding.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use sourdine::{AudioBuffer, AudioProcessor, ConnectionObserver, NoiseFilter};
//!
//! let filter = Arc::new(NoiseFilter::new(my_engine));
//! host.register_audio_processor(filter.clone() as Arc<dyn AudioProcessor>);
//! host.register_connection_observer(filter.clone() as Arc<dyn ConnectionObserver>);
//!
//! // On the audio thread, for every 10 ms block:
//! // let mut buffer = AudioBuffer::with_default_bands(&mut samples, num_channels)?;
//! // filter.process(&mut buffer);
//!
//! // Out of band:
//! // if filter.status().is_degraded() { warn_user(); }
//! ```

mod audio_buffer;
mod channel_set;
mod config;
mod engine;
mod error;
mod host;
mod noise_filter;
mod room_context;
mod state;
mod status;

// Public re-exports.
pub use audio_buffer::{AudioBuffer, num_bands_for_frames};
pub use channel_set::{ChannelSet, ChannelSetIter, MAX_CHANNELS};
pub use config::{Config, DEFAULT_PROCESSOR_NAME};
pub use engine::{FilterEngine, ProcessInit};
pub use error::Error;
pub use host::{AudioProcessor, ConnectionObserver};
pub use noise_filter::{NoiseFilter, NoiseFilterBuilder};
pub use room_context::{ConnectionState, RoomContext, Session};
pub use status::FilterStatus;
