/// Processing configuration for the limiter and the scalable-factor engine
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ImmersiveError, Result};
use crate::types::{ChannelLayer, LayoutMap, PeakMode, PeakSearch, ScaleFactorMode};

/// Maximum number of channels the peak limiter accepts
pub const MAX_CHANNELS: usize = 16;

/// Maximum look-ahead depth in samples (100 ms at 48 kHz)
pub const MAX_DELAY_SIZE: usize = 4800;

/// Prefix of environment variables overriding file settings
pub const ENV_PREFIX: &str = "IMMERSIVE";

/// Complete DSP configuration of an encoding session
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DspConfig {
    #[serde(default = "default_limiter")]
    pub limiter: LimiterSettings,

    #[serde(default = "default_scalable")]
    pub scalable: ScalableSettings,
}

/// Peak limiter settings
///
/// Mirrors the limiter initialisation parameters: threshold, sample rate,
/// channel count, attack, release and look-ahead depth.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LimiterSettings {
    /// Peak threshold in dB
    #[serde(default = "default_threshold_db")]
    pub threshold_db: f32,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_channels")]
    pub channels: usize,

    /// Attack duration in seconds
    #[serde(default = "default_attack_seconds")]
    pub attack_seconds: f32,

    /// Release duration in seconds
    #[serde(default = "default_release_seconds")]
    pub release_seconds: f32,

    /// Look-ahead depth in samples (0 disables look-ahead)
    #[serde(default = "default_delay_size")]
    pub delay_size: usize,

    #[serde(default)]
    pub peak_mode: PeakMode,

    #[serde(default)]
    pub peak_search: PeakSearch,
}

impl LimiterSettings {
    /// Settings from the classic initialisation parameters
    pub fn new(
        threshold_db: f32,
        sample_rate: u32,
        channels: usize,
        attack_seconds: f32,
        release_seconds: f32,
        delay_size: usize,
    ) -> Self {
        Self {
            threshold_db,
            sample_rate,
            channels,
            attack_seconds,
            release_seconds,
            delay_size,
            peak_mode: PeakMode::default(),
            peak_search: PeakSearch::default(),
        }
    }

    /// Use a different peak estimation mode
    pub fn with_peak_mode(mut self, peak_mode: PeakMode) -> Self {
        self.peak_mode = peak_mode;
        self
    }

    /// Use a different look-ahead search strategy
    pub fn with_peak_search(mut self, peak_search: PeakSearch) -> Self {
        self.peak_search = peak_search;
        self
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(ImmersiveError::InvalidChannelCount {
                count: self.channels,
                max: MAX_CHANNELS,
            });
        }
        if self.delay_size > MAX_DELAY_SIZE {
            return Err(ImmersiveError::InvalidDelaySize {
                size: self.delay_size,
                max: MAX_DELAY_SIZE,
            });
        }
        if self.sample_rate == 0 {
            return Err(ImmersiveError::InvalidSampleRate(self.sample_rate));
        }
        if !self.threshold_db.is_finite() {
            return Err(ImmersiveError::InvalidTiming(format!(
                "threshold must be finite, got {}",
                self.threshold_db
            )));
        }
        if !(self.attack_seconds.is_finite() && self.attack_seconds >= 0.0) {
            return Err(ImmersiveError::InvalidTiming(format!(
                "attack must be a non-negative duration, got {}",
                self.attack_seconds
            )));
        }
        if !(self.release_seconds.is_finite() && self.release_seconds >= 0.0) {
            return Err(ImmersiveError::InvalidTiming(format!(
                "release must be a non-negative duration, got {}",
                self.release_seconds
            )));
        }
        Ok(())
    }
}

impl Default for LimiterSettings {
    fn default() -> Self {
        default_limiter()
    }
}

/// Scalable-factor engine settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScalableSettings {
    /// Channel layers enabled for the session
    #[serde(default = "default_layers")]
    pub layers: Vec<ChannelLayer>,

    #[serde(default)]
    pub mode: ScaleFactorMode,
}

impl ScalableSettings {
    /// Enabled layers as a layout map
    pub fn layout_map(&self) -> LayoutMap {
        LayoutMap::from_layers(&self.layers)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        self.layout_map().hierarchy().map(|_| ())
    }
}

impl Default for ScalableSettings {
    fn default() -> Self {
        default_scalable()
    }
}

impl DspConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables use the `IMMERSIVE_` prefix and `__` between
    /// nested keys, e.g. `IMMERSIVE_LIMITER__THRESHOLD_DB=-2`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ImmersiveError::config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            settings = settings.add_source(config::File::from(path.to_path_buf()));
        }

        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            threshold_db = config.limiter.threshold_db,
            delay_size = config.limiter.delay_size,
            layers = config.scalable.layers.len(),
            "Loaded DSP configuration"
        );

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.limiter.validate()?;
        self.scalable.validate()
    }
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            limiter: default_limiter(),
            scalable: default_scalable(),
        }
    }
}

// Default values
fn default_limiter() -> LimiterSettings {
    LimiterSettings::new(
        default_threshold_db(),
        default_sample_rate(),
        default_channels(),
        default_attack_seconds(),
        default_release_seconds(),
        default_delay_size(),
    )
}

fn default_threshold_db() -> f32 {
    -1.0
}

fn default_sample_rate() -> u32 {
    48_000
}

fn default_channels() -> usize {
    2
}

fn default_attack_seconds() -> f32 {
    0.005
}

fn default_release_seconds() -> f32 {
    0.050
}

fn default_delay_size() -> usize {
    240
}

fn default_scalable() -> ScalableSettings {
    ScalableSettings {
        layers: default_layers(),
        mode: ScaleFactorMode::default(),
    }
}

fn default_layers() -> Vec<ChannelLayer> {
    vec![ChannelLayer::Stereo200]
}
