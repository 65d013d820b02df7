/// Runtime-selected processing strategies
use serde::{Deserialize, Serialize};

use crate::error::{ImmersiveError, Result};

/// How the limiter estimates the peak of each written sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakMode {
    /// Absolute sample value
    #[default]
    Sample,
    /// 4x oversampled inter-sample peak (ITU-R BS.1770)
    TruePeak,
}

/// How the limiter finds the maximum over its look-ahead window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeakSearch {
    /// Rescan the whole window for every sample
    Naive,
    /// Monotonic queue of candidates, amortised O(1) per sample
    #[default]
    Tracked,
}

/// Policy used to derive scale factors from per-channel statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFactorMode {
    /// Energy (RMS) ratio of signal and noise
    #[default]
    Rms,
    /// Peak magnitude ratio of signal and noise
    Peak,
}

impl ScaleFactorMode {
    /// Parse the integer policy code used by the encoder session
    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Self::Rms),
            1 => Ok(Self::Peak),
            other => Err(ImmersiveError::UnknownScaleFactorMode(other)),
        }
    }

    /// Integer policy code
    pub fn code(self) -> i32 {
        match self {
            Self::Rms => 0,
            Self::Peak => 1,
        }
    }
}
