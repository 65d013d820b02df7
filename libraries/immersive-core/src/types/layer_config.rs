/// Per-layer configuration handed over by the encoder session
use serde::{Deserialize, Serialize};

use super::ChannelLayer;

/// Channel audio layer configuration as carried in the static metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAudioLayerConfig {
    /// Loudspeaker layout of this layer
    pub loudspeaker_layout: ChannelLayer,
    /// An output gain is signalled for this layer
    pub output_gain_is_present_flag: bool,
    /// Recon gain (demixing correction) is signalled for this layer
    pub recon_gain_is_present_flag: bool,
    pub substream_count: u32,
    pub coupled_substream_count: u32,
    /// Loudness in Q7.8 LKFS
    pub loudness: i16,
    pub output_gain_flags: u8,
    /// Output gain in Q7.8 dB
    pub output_gain: i16,
}

impl ChannelAudioLayerConfig {
    /// Plain configuration without gain or recon metadata
    pub fn new(loudspeaker_layout: ChannelLayer) -> Self {
        Self {
            loudspeaker_layout,
            output_gain_is_present_flag: false,
            recon_gain_is_present_flag: false,
            substream_count: 0,
            coupled_substream_count: 0,
            loudness: 0,
            output_gain_flags: 0,
            output_gain: 0,
        }
    }

    /// Output gain in dB
    pub fn output_gain_db(&self) -> f32 {
        f32::from(self.output_gain) / 256.0
    }

    /// Loudness in LKFS
    pub fn loudness_lkfs(&self) -> f32 {
        f32::from(self.loudness) / 256.0
    }

    /// The layer's PCM must go through the peak limiter
    ///
    /// A signalled output gain can push the rendered layer above full scale.
    pub fn needs_peak_limiting(&self) -> bool {
        self.output_gain_is_present_flag
    }

    /// Scale factors must be computed for the layer
    pub fn needs_scale_factors(&self) -> bool {
        self.recon_gain_is_present_flag
    }
}
