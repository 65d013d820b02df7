//! Scale-factor derivation policies and quantisation

use immersive_core::ScaleFactorMode;

use super::stats::LayerAnalysis;

/// Number of quantisation steps of a scale-factor index
pub const SF_LEN: usize = 16;

/// Width of one quantisation step in dB
pub const SF_STEP_DB: f32 = 1.5;

/// Largest gain-down the index range can express
pub const SF_MAX_DB: f32 = SF_STEP_DB * (SF_LEN - 1) as f32;

/// How much a channel's loudness drops when its down-mix noise is removed
pub trait ScaleFactorPolicy: Send + Sync {
    fn mode(&self) -> ScaleFactorMode;

    /// Loudness delta of `channel` in dB (`>= 0`, 0 for silent signal)
    fn delta_db(&self, analysis: &LayerAnalysis, channel: usize) -> f32;
}

/// Energy ratio: `10 log10((E_sig + E_nse) / E_sig)`
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsPolicy;

impl ScaleFactorPolicy for RmsPolicy {
    fn mode(&self) -> ScaleFactorMode {
        ScaleFactorMode::Rms
    }

    fn delta_db(&self, analysis: &LayerAnalysis, channel: usize) -> f32 {
        let signal = analysis.stats.sum_sig[channel];
        let noise = analysis.stats.sum_nse[channel];
        if signal <= 0.0 {
            return 0.0;
        }
        10.0 * ((signal + noise) / signal).log10()
    }
}

/// Magnitude ratio: `20 log10((P_sig + P_nse) / P_sig)`
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakPolicy;

impl ScaleFactorPolicy for PeakPolicy {
    fn mode(&self) -> ScaleFactorMode {
        ScaleFactorMode::Peak
    }

    fn delta_db(&self, analysis: &LayerAnalysis, channel: usize) -> f32 {
        let signal = analysis.peak_sig[channel];
        let noise = analysis.peak_nse[channel];
        if signal <= 0.0 {
            return 0.0;
        }
        20.0 * ((signal + noise) / signal).log10()
    }
}

/// Policy implementing a mode
pub fn policy_for(mode: ScaleFactorMode) -> &'static dyn ScaleFactorPolicy {
    match mode {
        ScaleFactorMode::Rms => &RmsPolicy,
        ScaleFactorMode::Peak => &PeakPolicy,
    }
}

/// Quantise a loudness delta into an index in `0..SF_LEN` and a linear value
///
/// The value is the continuous gain `10^(-delta/20)` with the delta clamped
/// to the range the index can express.
pub fn quantize(delta_db: f32) -> (i32, f32) {
    let clamped = if delta_db.is_nan() {
        0.0
    } else {
        delta_db.clamp(0.0, SF_MAX_DB)
    };
    let index = (clamped / SF_STEP_DB).round() as i32;
    let value = 10.0_f32.powf(-clamped / 20.0);
    (index, value)
}
