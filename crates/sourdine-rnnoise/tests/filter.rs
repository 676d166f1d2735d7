//! RNNoise engine driven through the noise-filter adapter.

use sourdine::{AudioBuffer, ConnectionState, NoiseFilter, Session};
use sourdine_rnnoise::{FRAME_SIZE, RnnoiseEngine, SAMPLE_RATE_HZ};

fn noisy_block(num_channels: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    (0..FRAME_SIZE * num_channels)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32 - 0.5) * 2000.0
        })
        .collect()
}

#[test]
fn stereo_48k_stream_has_no_failures() {
    let filter = NoiseFilter::new(RnnoiseEngine::new());
    assert!(!filter.failed_to_initialize());

    filter.initialize(SAMPLE_RATE_HZ, 2);
    for i in 0..20 {
        let mut data = noisy_block(2, i);
        let mut buffer = AudioBuffer::with_default_bands(&mut data, 2).unwrap();
        filter.process(&mut buffer);
        assert!(buffer.as_slice().iter().all(|s| s.is_finite()));
    }

    assert!(filter.failed_channels().is_empty());
    assert!(!filter.status().is_degraded());
}

#[test]
fn suppresses_stationary_noise() {
    let filter = NoiseFilter::new(RnnoiseEngine::new());
    filter.initialize(SAMPLE_RATE_HZ, 1);

    let energy = |s: &[f32]| s.iter().map(|x| x * x).sum::<f32>();
    let mut input_energy = 0.0;
    let mut output_energy = 0.0;
    for i in 0..100 {
        let mut data = noisy_block(1, i);
        let before = energy(&data);
        let mut buffer = AudioBuffer::with_default_bands(&mut data, 1).unwrap();
        filter.process(&mut buffer);
        // Let the model settle before measuring.
        if i >= 50 {
            input_energy += before;
            output_energy += energy(buffer.as_slice());
        }
    }

    assert!(filter.failed_channels().is_empty());
    assert!(
        output_energy < input_energy,
        "white noise should be attenuated: {output_energy} >= {input_energy}"
    );
}

#[test]
fn unsupported_rate_marks_every_channel_failed() {
    let filter = NoiseFilter::new(RnnoiseEngine::new());
    filter.initialize(16_000, 3);

    let mut data = vec![0.0; 160 * 3];
    let mut buffer = AudioBuffer::with_default_bands(&mut data, 3).unwrap();
    filter.process(&mut buffer);

    assert_eq!(filter.failed_channels(), vec![0, 1, 2]);
    assert!(filter.status().is_degraded());
}

#[test]
fn device_change_to_48k_recovers_processing_but_keeps_history() {
    let filter = NoiseFilter::new(RnnoiseEngine::new());
    filter.initialize(44_100, 1);

    let mut data = vec![0.0; 441];
    let mut buffer = AudioBuffer::with_default_bands(&mut data, 1).unwrap();
    filter.process(&mut buffer);
    assert_eq!(filter.failed_channels(), vec![0]);

    filter.initialize(SAMPLE_RATE_HZ, 1);
    assert_eq!(filter.engine().sample_rate_hz(), Some(SAMPLE_RATE_HZ));
    assert_eq!(filter.engine().num_channels(), 1);

    let mut data = noisy_block(1, 7);
    let mut buffer = AudioBuffer::with_default_bands(&mut data, 1).unwrap();
    filter.process(&mut buffer);
    // Failures are never cleared.
    assert_eq!(filter.failed_channels(), vec![0]);
}

#[test]
fn disabled_filter_leaves_audio_untouched() {
    let filter = NoiseFilter::new(RnnoiseEngine::new());
    filter.initialize(SAMPLE_RATE_HZ, 1);
    filter.set_enabled(false);

    let mut data = noisy_block(1, 3);
    let original = data.clone();
    let mut buffer = AudioBuffer::with_default_bands(&mut data, 1).unwrap();
    filter.process(&mut buffer);

    assert_eq!(data, original);
}

#[test]
fn connection_changes_reach_engine() {
    let filter = NoiseFilter::new(RnnoiseEngine::new());
    let session = Session {
        sid: Some("RM_rnnoise".into()),
        ..Default::default()
    };

    filter.on_connection_state_changed(
        &session,
        ConnectionState::Connected,
        ConnectionState::Connecting,
    );
    assert_eq!(filter.engine().connection_state(), ConnectionState::Connected);
}
