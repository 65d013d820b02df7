mod layer_config;
mod layout;
mod modes;
mod samples;

pub use layer_config::ChannelAudioLayerConfig;
pub use layout::{
    ChannelLayer, ChannelRole, LayerComposition, LayoutMap, CHANNEL_LAYER_COUNT,
    MAX_LAYER_CHANNELS,
};
pub use modes::{PeakMode, PeakSearch, ScaleFactorMode};
pub use samples::{SampleBuffer, SampleFormat, INT16_SCALE};
