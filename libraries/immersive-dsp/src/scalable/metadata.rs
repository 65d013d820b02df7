//! Demixing metadata filled by the scalable-factor engine

use immersive_core::{
    ChannelLayer, ImmersiveError, Result, CHANNEL_LAYER_COUNT, MAX_LAYER_CHANNELS,
};

use super::stats::RmsStatistics;

/// Per-channel scale factors of one layer
///
/// Slots past the layer's channel count stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaleFactorResult {
    /// Quantised index in `0..SF_LEN`
    pub scalefactor_index: [i32; MAX_LAYER_CHANNELS],
    /// Continuous linear scale factor
    pub scalefactor_data: [f32; MAX_LAYER_CHANNELS],
}

impl ScaleFactorResult {
    /// Size of [`ScaleFactorResult::to_le_bytes`]
    pub const PACKED_LEN: usize = 2 * MAX_LAYER_CHANNELS * 4;

    /// Little-endian packing: 12 `i32` indices followed by 12 `f32` values
    pub fn to_le_bytes(&self) -> [u8; Self::PACKED_LEN] {
        let mut bytes = [0_u8; Self::PACKED_LEN];
        let (indices, values) = bytes.split_at_mut(MAX_LAYER_CHANNELS * 4);
        for (chunk, index) in indices.chunks_exact_mut(4).zip(&self.scalefactor_index) {
            chunk.copy_from_slice(&index.to_le_bytes());
        }
        for (chunk, value) in values.chunks_exact_mut(4).zip(&self.scalefactor_data) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    /// Parse the packing produced by [`ScaleFactorResult::to_le_bytes`]
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::PACKED_LEN {
            return Err(ImmersiveError::buffer_mismatch(format!(
                "scale factor record is {} bytes, expected {}",
                bytes.len(),
                Self::PACKED_LEN
            )));
        }

        let mut result = Self::default();
        let (indices, values) = bytes.split_at(MAX_LAYER_CHANNELS * 4);
        for (slot, chunk) in result.scalefactor_index.iter_mut().zip(indices.chunks_exact(4)) {
            *slot = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        for (slot, chunk) in result.scalefactor_data.iter_mut().zip(values.chunks_exact(4)) {
            *slot = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(result)
    }
}

/// Scale factors of one layer with the statistics they were derived from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerRecord {
    /// Channels of the layer
    pub channels: usize,
    pub scale_factors: ScaleFactorResult,
    pub statistics: RmsStatistics,
}

/// Caller-owned output of the scalable-factor engine, one slot per layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemixingMetadata {
    layers: [Option<LayerRecord>; CHANNEL_LAYER_COUNT],
}

impl DemixingMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record of a layer, if it has been computed
    pub fn layer(&self, layer: ChannelLayer) -> Option<&LayerRecord> {
        self.layers[layer.index()].as_ref()
    }

    /// Scale factors of a layer, if it has been computed
    pub fn scale_factors(&self, layer: ChannelLayer) -> Option<&ScaleFactorResult> {
        self.layer(layer).map(|record| &record.scale_factors)
    }

    pub fn set_layer(&mut self, layer: ChannelLayer, record: LayerRecord) {
        self.layers[layer.index()] = Some(record);
    }

    /// Layers holding a record, in metadata position order
    pub fn computed_layers(&self) -> impl Iterator<Item = ChannelLayer> + '_ {
        ChannelLayer::ALL
            .iter()
            .copied()
            .filter(|layer| self.layers[layer.index()].is_some())
    }

    /// Forget every record
    pub fn clear(&mut self) {
        self.layers = Default::default();
    }
}
