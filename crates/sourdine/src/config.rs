//! Filter stage configuration.

/// Processing-stage name used when none is configured.
pub const DEFAULT_PROCESSOR_NAME: &str = "sourdine_noise_filter";

/// Setup-time configuration for a [`NoiseFilter`](crate::NoiseFilter).
///
/// # Example
///
/// ```
/// use sourdine::Config;
///
/// let config = Config {
///     name: "meeting_denoise".into(),
///     ..Default::default()
/// };
/// assert!(config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Stable identifier the host uses to register the processing stage
    /// (default: [`DEFAULT_PROCESSOR_NAME`]).
    pub name: String,
    /// Whether buffers are filtered right after construction (default: true).
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROCESSOR_NAME.to_owned(),
            enabled: true,
        }
    }
}
