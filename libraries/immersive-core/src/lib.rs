//! Immersive Audio Core
//!
//! Platform-agnostic types, error handling and configuration shared by the
//! DSP stages of the immersive audio encoder front-end.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Channel layers**: the nine canonical layouts (`1.0.0` … `7.1.4`, `3.1.2`),
//!   their surround/subwoofer/height composition and the nested-hierarchy rule
//! - **Sample buffers**: a tagged int16/float32 buffer instead of raw pointers
//!   with a side-channel type field
//! - **Error handling**: unified `ImmersiveError` with negative result codes
//! - **Configuration**: serde settings loaded from TOML and the environment
//!
//! # Example
//!
//! ```rust
//! use immersive_core::{ChannelLayer, LayoutMap};
//!
//! let map = LayoutMap::from_layers(&[
//!     ChannelLayer::Stereo200,
//!     ChannelLayer::Surround312,
//!     ChannelLayer::Surround512,
//! ]);
//!
//! let order = map.hierarchy().unwrap();
//! assert_eq!(order[1], ChannelLayer::Surround312);
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{DspConfig, LimiterSettings, ScalableSettings, MAX_CHANNELS, MAX_DELAY_SIZE};
pub use error::{ImmersiveError, Result};
pub use types::{
    ChannelAudioLayerConfig, ChannelLayer, ChannelRole, LayerComposition, LayoutMap, PeakMode,
    PeakSearch, SampleBuffer, SampleFormat, ScaleFactorMode, CHANNEL_LAYER_COUNT,
    MAX_LAYER_CHANNELS,
};
