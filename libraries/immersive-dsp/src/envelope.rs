//! Two-phase gain envelope driving the peak limiter
//!
//! An overshoot starts an *attack* that eases the gain from where it was down
//! to `threshold / peak`, followed by a *release* that eases it back to unity.
//! A new overshoot restarts the attack from the current gain, even mid-release.

use crate::math::curve_accel;

/// Gain envelope follower
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainEnvelope {
    linear_threshold: f32,
    attack_seconds: f32,
    release_seconds: f32,
    /// Seconds advanced per sample
    increment: f32,
    current_gain: f32,
    start_gain: f32,
    end_gain: f32,
    /// Time since the last trigger, `None` while no envelope is running
    time: Option<f32>,
}

impl GainEnvelope {
    pub fn new(linear_threshold: f32, attack_seconds: f32, release_seconds: f32, sample_rate: u32) -> Self {
        Self {
            linear_threshold,
            attack_seconds,
            release_seconds,
            increment: 1.0 / sample_rate as f32,
            current_gain: 1.0,
            start_gain: 1.0,
            end_gain: 1.0,
            time: None,
        }
    }

    /// Advance one sample and return the gain to apply to it
    ///
    /// `peak` is the look-ahead maximum for this sample. The returned gain is
    /// the one computed before a possible re-trigger, so a new overshoot only
    /// starts pulling the gain down from the next sample on.
    pub fn next_gain(&mut self, peak: f32) -> f32 {
        self.current_gain = match self.time {
            Some(t) if t < self.attack_seconds => {
                let t = t + self.increment;
                self.time = Some(t);
                let ratio = curve_accel(t / self.attack_seconds);
                self.start_gain - ratio * (self.start_gain - self.end_gain)
            }
            Some(t) if t < self.attack_seconds + self.release_seconds => {
                let t = t + self.increment;
                self.time = Some(t);
                let ratio = curve_accel((t - self.attack_seconds) / self.release_seconds);
                self.end_gain + ratio * (1.0 - self.end_gain)
            }
            _ => {
                self.time = None;
                1.0
            }
        };

        let gain = self.current_gain;
        if peak * gain > self.linear_threshold {
            self.start_gain = gain;
            self.end_gain = self.linear_threshold / peak;
            self.time = Some(0.0);
        }
        gain
    }

    /// Back to unity gain with no envelope running
    pub fn reset(&mut self) {
        self.current_gain = 1.0;
        self.start_gain = 1.0;
        self.end_gain = 1.0;
        self.time = None;
    }

    pub fn current_gain(&self) -> f32 {
        self.current_gain
    }

    /// Gain the running attack converges to
    pub fn end_gain(&self) -> f32 {
        self.end_gain
    }

    pub fn start_gain(&self) -> f32 {
        self.start_gain
    }

    /// Seconds since the last trigger, `None` when inactive
    pub fn time(&self) -> Option<f32> {
        self.time
    }

    /// Whether an attack or release is in progress
    pub fn is_active(&self) -> bool {
        self.time.is_some()
    }
}
