/// Core error types for the immersive audio encoder front-end
use thiserror::Error;

use crate::types::ChannelLayer;

/// Result type alias using `ImmersiveError`
pub type Result<T> = std::result::Result<T, ImmersiveError>;

/// Errors reported by the peak limiter and the scalable-factor engine
///
/// Every variant maps onto a negative integer result code (see [`ImmersiveError::code`])
/// so an encoder session can forward it unchanged through its own C-style API.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImmersiveError {
    /// Channel count outside the supported range
    #[error("Invalid channel count: {count} (must be 1-{max})")]
    InvalidChannelCount { count: usize, max: usize },

    /// Look-ahead depth over the supported maximum
    #[error("Invalid delay size: {size} samples (maximum {max})")]
    InvalidDelaySize { size: usize, max: usize },

    /// Zero sample rate
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Negative or non-finite attack/release/threshold
    #[error("Invalid timing parameter: {0}")]
    InvalidTiming(String),

    /// Sample representation tag that is neither int16 nor float32
    #[error("Unsupported sample format tag: {0}")]
    UnsupportedSampleFormat(i32),

    /// Scale-factor policy code not known to this build
    #[error("Unknown scale factor mode: {0}")]
    UnknownScaleFactorMode(i32),

    /// A channel group declares channels but carries no samples
    #[error("Missing sample buffer for the {0} channel group")]
    MissingBuffer(&'static str),

    /// Buffer shape does not match the declared channels and frame size
    #[error("Buffer mismatch: {0}")]
    BufferMismatch(String),

    /// Layer is not part of the session layout map
    #[error("Channel layer {0} is not enabled for this session")]
    LayerNotEnabled(ChannelLayer),

    /// Layer is not marked active in the input view
    #[error("Channel layer {0} is not active in this block")]
    LayerNotActive(ChannelLayer),

    /// Enabled layers do not form a nested S/W/H hierarchy
    #[error("Invalid layer hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Layer computed before its predecessor in the hierarchy
    #[error("Channel layer {layer} computed before its predecessor {predecessor}")]
    LayerOutOfOrder {
        layer: ChannelLayer,
        predecessor: ChannelLayer,
    },
}

impl ImmersiveError {
    /// Negative result code for this error
    ///
    /// Configuration and data errors use `-1..=-12`; sequencing errors use a
    /// separate range starting at `-20` so callers can tell them apart.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidChannelCount { .. } => -1,
            Self::InvalidDelaySize { .. } => -2,
            Self::InvalidSampleRate(_) => -3,
            Self::InvalidTiming(_) => -4,
            Self::UnsupportedSampleFormat(_) => -5,
            Self::UnknownScaleFactorMode(_) => -6,
            Self::MissingBuffer(_) => -7,
            Self::BufferMismatch(_) => -8,
            Self::LayerNotEnabled(_) => -9,
            Self::LayerNotActive(_) => -10,
            Self::InvalidHierarchy(_) => -11,
            Self::Config(_) => -12,
            Self::LayerOutOfOrder { .. } => -20,
        }
    }

    /// Whether this error is a call-ordering violation rather than a data or configuration problem
    pub fn is_sequencing(&self) -> bool {
        matches!(self, Self::LayerOutOfOrder { .. })
    }

    /// Create a buffer mismatch error
    pub fn buffer_mismatch(msg: impl Into<String>) -> Self {
        Self::BufferMismatch(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<config::ConfigError> for ImmersiveError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
