//! Per-sample peak estimation for the limiter's detector path

use immersive_core::PeakMode;

use crate::true_peak::TruePeakMeter;

/// Magnitude of a sample as seen by the limiter detector
pub trait PeakEstimator: Send {
    /// Estimate the peak around `sample` of `channel`
    fn measure(&mut self, channel: usize, sample: f32) -> f32;

    /// Drop any filter history
    fn reset(&mut self);

    /// Copy of the complete internal state
    fn state(&self) -> EstimatorState;
}

/// Internal state of a [`PeakEstimator`], comparable with `==`
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorState {
    /// Stateless
    Sample,
    /// One interpolation filter per channel
    TruePeak(Vec<TruePeakMeter>),
}

/// Build the estimator for a peak mode
pub fn create_estimator(mode: PeakMode, channels: usize) -> Box<dyn PeakEstimator> {
    match mode {
        PeakMode::Sample => Box::new(SamplePeak),
        PeakMode::TruePeak => Box::new(TruePeakEstimator::new(channels)),
    }
}

/// Absolute sample value
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplePeak;

impl PeakEstimator for SamplePeak {
    #[inline]
    fn measure(&mut self, _channel: usize, sample: f32) -> f32 {
        sample.abs()
    }

    fn reset(&mut self) {}

    fn state(&self) -> EstimatorState {
        EstimatorState::Sample
    }
}

/// 4x oversampled inter-sample peak, one meter per channel
#[derive(Debug, Clone)]
pub struct TruePeakEstimator {
    meters: Vec<TruePeakMeter>,
}

impl TruePeakEstimator {
    pub fn new(channels: usize) -> Self {
        Self {
            meters: vec![TruePeakMeter::new(); channels],
        }
    }
}

impl PeakEstimator for TruePeakEstimator {
    fn measure(&mut self, channel: usize, sample: f32) -> f32 {
        self.meters[channel].next_true_peak(sample)
    }

    fn reset(&mut self) {
        for meter in &mut self.meters {
            meter.reset();
        }
    }

    fn state(&self) -> EstimatorState {
        EstimatorState::TruePeak(self.meters.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_peak_is_magnitude() {
        let mut estimator = create_estimator(PeakMode::Sample, 2);
        assert_eq!(estimator.measure(0, -0.75), 0.75);
        assert_eq!(estimator.measure(1, 0.25), 0.25);
    }

    #[test]
    fn true_peak_channels_are_independent() {
        let mut estimator = TruePeakEstimator::new(2);
        for _ in 0..64 {
            estimator.measure(0, 0.5);
            estimator.measure(1, 0.0);
        }
        assert!(estimator.measure(0, 0.5) > 0.45);
        assert_eq!(estimator.measure(1, 0.0), 0.0);
    }

    #[test]
    fn true_peak_reset_forgets_history() {
        let fresh = create_estimator(PeakMode::TruePeak, 1).state();
        let mut estimator = create_estimator(PeakMode::TruePeak, 1);
        for _ in 0..16 {
            estimator.measure(0, 0.9);
        }
        assert_ne!(estimator.state(), fresh);

        estimator.reset();
        assert_eq!(estimator.state(), fresh);
        assert_eq!(estimator.measure(0, 0.0), 0.0);
    }
}
