//! DSP stages of the immersive audio encoder front-end
//!
//! This crate provides:
//! - A look-ahead peak limiter with a two-phase (attack/release) gain envelope
//! - Sample-peak and 4x true-peak (ITU-R BS.1770) detectors
//! - Naive and monotonic-queue sliding-window maxima for the look-ahead
//! - The scalable-factor engine deriving per-channel demixing scale factors
//!   over a hierarchy of channel layers
//!
//! # Architecture
//!
//! ```text
//! Per block:
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ Planar PCM  │ ──► │ PeakLimiter  │ ──► │ Limited PCM    │
//! └─────────────┘     └──────────────┘     └────────────────┘
//!
//! Per block and active layer (base first):
//! ┌───────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │ ScalableInputView │ ──► │ ScalableFactorEngine │ ──► │ DemixingMetadata │
//! └───────────────────┘     └──────────────────────┘     └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use immersive_core::{ChannelLayer, LayoutMap, SampleBuffer};
//! use immersive_dsp::{
//!     compute_layer_accumulating, ChannelGroup, DemixingMetadata, ScalableFactorEngine,
//!     ScalableInputView,
//! };
//!
//! let layout = LayoutMap::from_layers(&[ChannelLayer::Stereo200]);
//! let mut engine = ScalableFactorEngine::new(layout)?;
//! let mut metadata = DemixingMetadata::new();
//!
//! let mixed = vec![0.25_f32; 2 * 960];
//! let view = ScalableInputView::new(
//!     ChannelGroup::new(2, SampleBuffer::float32(&mixed)),
//!     ChannelGroup::empty(),
//!     960,
//!     layout,
//! );
//!
//! compute_layer_accumulating(&mut engine, &mut metadata, &view, ChannelLayer::Stereo200)?;
//! assert!(metadata.layer(ChannelLayer::Stereo200).is_some());
//! # Ok::<(), immersive_core::ImmersiveError>(())
//! ```

#![forbid(unsafe_code)]

pub mod envelope;
pub mod limiter;
pub mod math;
pub mod peak;
pub mod scalable;
pub mod true_peak;
pub mod window;

pub use envelope::GainEnvelope;
pub use immersive_core::{ImmersiveError, Result};
pub use limiter::{LimiterSnapshot, PeakLimiter};
pub use math::{curve_accel, db_to_linear, linear_to_db, power_to_db, SILENCE_DB};
pub use peak::{create_estimator, EstimatorState, PeakEstimator, SamplePeak, TruePeakEstimator};
pub use scalable::{
    compute_layer, compute_layer_accumulating, quantize, ChannelGroup, DemixingMetadata,
    LayerAnalysis, LayerHistory, LayerRecord, RmsStatistics, ScalableFactorEngine,
    ScalableInputView, ScaleFactorPolicy, ScaleFactorResult, SF_LEN,
};
pub use true_peak::TruePeakMeter;
pub use window::{create_window, LookaheadWindow, MonotonicWindow, NaiveWindow, WindowState};
