//! Per-channel signal and noise statistics of one layer block

use immersive_core::{SampleBuffer, MAX_LAYER_CHANNELS};

use super::input::RoleBuffers;
use crate::math::power_to_db;

/// Signal and noise energy per channel
///
/// The field order and the 12-entry arrays are part of the metadata layout
/// read by the packaging stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RmsStatistics {
    /// Sum of squared signal samples
    pub sum_sig: [f32; MAX_LAYER_CHANNELS],
    /// RMS of the signal
    pub rms_sig: [f32; MAX_LAYER_CHANNELS],
    /// Sum of squared noise samples
    pub sum_nse: [f32; MAX_LAYER_CHANNELS],
    /// RMS of the noise
    pub rms_nse: [f32; MAX_LAYER_CHANNELS],
}

impl RmsStatistics {
    /// Size of [`RmsStatistics::to_le_bytes`]
    pub const PACKED_LEN: usize = 4 * MAX_LAYER_CHANNELS * 4;

    /// Little-endian packing: `sum_sig`, `rms_sig`, `sum_nse`, `rms_nse`
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::PACKED_LEN);
        for field in [&self.sum_sig, &self.rms_sig, &self.sum_nse, &self.rms_nse] {
            for value in field {
                bytes.extend_from_slice(&value.to_le_bytes());
            }
        }
        bytes
    }

    /// Signal RMS level of a channel in dBFS
    pub fn signal_db(&self, channel: usize) -> f32 {
        power_to_db(self.rms_sig[channel] * self.rms_sig[channel])
    }

    /// Noise RMS level of a channel in dBFS
    pub fn noise_db(&self, channel: usize) -> f32 {
        power_to_db(self.rms_nse[channel] * self.rms_nse[channel])
    }
}

/// Statistics plus the peak magnitudes the peak policy needs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerAnalysis {
    pub channels: usize,
    pub stats: RmsStatistics,
    pub peak_sig: [f32; MAX_LAYER_CHANNELS],
    pub peak_nse: [f32; MAX_LAYER_CHANNELS],
}

impl LayerAnalysis {
    /// Measure `channels` planar channels of `frame_size` samples
    ///
    /// Noise is the codec error `mixed - reconstructed`, plus for gained-down
    /// channels the down-mix residual of the surround, alpha/beta and top
    /// groups. Groups with no samples contribute nothing. Samples are read in
    /// place from their int16 or float32 buffers.
    pub(crate) fn measure(
        groups: &RoleBuffers<'_>,
        channels: usize,
        frame_size: usize,
        gained_down: impl Fn(usize) -> bool,
    ) -> Self {
        let mut analysis = Self {
            channels,
            ..Self::default()
        };

        for ch in 0..channels {
            let residual = gained_down(ch);
            let mut sum_sig = 0.0_f32;
            let mut sum_nse = 0.0_f32;
            let mut peak_sig = 0.0_f32;
            let mut peak_nse = 0.0_f32;

            for k in 0..frame_size {
                let i = ch * frame_size + k;
                let signal = at(groups.mixed, i);
                let codec_error = match groups.reconstructed {
                    Some(reconstructed) => signal - at(Some(reconstructed), i),
                    None => 0.0,
                };

                let mut noise_energy = codec_error * codec_error;
                if residual {
                    for group in [groups.surround, groups.alpha_beta, groups.top] {
                        let value = at(group, i);
                        noise_energy += value * value;
                    }
                }

                sum_sig += signal * signal;
                sum_nse += noise_energy;
                peak_sig = peak_sig.max(signal.abs());
                peak_nse = peak_nse.max(noise_energy.sqrt());
            }

            let frames = frame_size.max(1) as f32;
            analysis.stats.sum_sig[ch] = sum_sig;
            analysis.stats.rms_sig[ch] = (sum_sig / frames).sqrt();
            analysis.stats.sum_nse[ch] = sum_nse;
            analysis.stats.rms_nse[ch] = (sum_nse / frames).sqrt();
            analysis.peak_sig[ch] = peak_sig;
            analysis.peak_nse[ch] = peak_nse;
        }

        analysis
    }
}

#[inline]
fn at(buffer: Option<&SampleBuffer<'_>>, index: usize) -> f32 {
    match buffer {
        Some(samples) if index < samples.len() => samples.sample(index),
        _ => 0.0,
    }
}
