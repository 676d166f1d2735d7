//! Helpers shared by multiple examples.

/// Convert an interleaved block into the channel-major layout `AudioBuffer`
/// expects.
///
/// ```text
/// Interleaved (stereo, 3 frames):
/// [L0, R0, L1, R1, L2, R2]
///
/// Channel-major:
/// [L0, L1, L2, R0, R1, R2]
/// ```
pub(crate) fn to_channel_major(src: &[f32], num_channels: usize, dst: &mut [f32]) {
    assert_eq!(src.len(), dst.len());
    let num_frames = src.len() / num_channels;
    for (i, &sample) in src.iter().enumerate() {
        dst[(i % num_channels) * num_frames + i / num_channels] = sample;
    }
}

/// Convert a channel-major block back to interleaved order.
pub(crate) fn to_interleaved(src: &[f32], num_channels: usize, dst: &mut [f32]) {
    assert_eq!(src.len(), dst.len());
    let num_frames = src.len() / num_channels;
    for ch in 0..num_channels {
        for frame in 0..num_frames {
            dst[frame * num_channels + ch] = src[ch * num_frames + frame];
        }
    }
}

/// Scale factor between normalized float samples and the S16 range RNNoise
/// works in.
pub(crate) const S16_SCALE: f32 = 32768.0;
