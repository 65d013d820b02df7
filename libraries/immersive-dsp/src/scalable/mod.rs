//! Scalable-factor analysis over a hierarchy of channel layers
//!
//! For every layer of a scalable stream the encoder measures how much louder a
//! down-mixed channel is than its clean signal and turns that into per-channel
//! scale factors the decoder uses while demixing.
//!
//! ```text
//! ScalableInputView ──► LayerAnalysis ──► ScaleFactorPolicy ──► quantize ──► DemixingMetadata
//!                                                │
//!                                      ScalableFactorEngine
//!                                   (running mean per layer)
//! ```

mod engine;
mod input;
mod metadata;
mod policy;
mod stats;

pub use engine::{compute_layer, compute_layer_accumulating, LayerHistory, ScalableFactorEngine};
pub use input::{ChannelGroup, ScalableInputView};
pub use metadata::{DemixingMetadata, LayerRecord, ScaleFactorResult};
pub use policy::{
    policy_for, quantize, PeakPolicy, RmsPolicy, ScaleFactorPolicy, SF_LEN, SF_MAX_DB, SF_STEP_DB,
};
pub use stats::{LayerAnalysis, RmsStatistics};
