//! Inter-sample (true) peak estimation per ITU-R BS.1770
//!
//! Each input sample is interpolated to four output phases with a polyphase
//! FIR filter (48 taps windowed sinc, Kaiser beta = 8, 12 taps per phase).
//! The largest interpolated magnitude is the true-peak estimate for that
//! sample.

use std::f32::consts::PI;

/// Oversampling factor
const PHASES: usize = 4;

/// Taps per polyphase branch
const TAPS_PER_PHASE: usize = 12;

const TOTAL_TAPS: usize = PHASES * TAPS_PER_PHASE;

/// Streaming 4x true-peak meter for one channel
#[derive(Debug, Clone, PartialEq)]
pub struct TruePeakMeter {
    /// Polyphase coefficients `[phase][tap]`
    coeffs: [[f32; TAPS_PER_PHASE]; PHASES],
    /// Recent input samples
    history: [f32; TAPS_PER_PHASE],
    write_pos: usize,
    /// Highest estimate since the last reset
    peak_hold: f32,
}

impl Default for TruePeakMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl TruePeakMeter {
    pub fn new() -> Self {
        Self {
            coeffs: interpolation_filter(),
            history: [0.0; TAPS_PER_PHASE],
            write_pos: 0,
            peak_hold: 0.0,
        }
    }

    /// Feed one sample and return the true-peak magnitude around it
    pub fn next_true_peak(&mut self, sample: f32) -> f32 {
        self.history[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % TAPS_PER_PHASE;

        let mut peak = 0.0_f32;
        for phase in &self.coeffs {
            let mut acc = 0.0_f32;
            for (tap, coeff) in phase.iter().enumerate() {
                let idx = (self.write_pos + TAPS_PER_PHASE - 1 - tap) % TAPS_PER_PHASE;
                acc += coeff * self.history[idx];
            }
            peak = peak.max(acc.abs());
        }

        self.peak_hold = self.peak_hold.max(peak);
        peak
    }

    /// Feed a block of samples, updating the held peak
    pub fn process(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.next_true_peak(sample);
        }
    }

    /// Highest true-peak magnitude since construction or the last reset
    pub fn peak(&self) -> f32 {
        self.peak_hold
    }

    /// Clear filter history and held peak
    pub fn reset(&mut self) {
        self.history = [0.0; TAPS_PER_PHASE];
        self.write_pos = 0;
        self.peak_hold = 0.0;
    }
}

/// Windowed-sinc interpolator split into polyphase branches, each normalised to unity DC gain
fn interpolation_filter() -> [[f32; TAPS_PER_PHASE]; PHASES] {
    let mut coeffs = [[0.0_f32; TAPS_PER_PHASE]; PHASES];
    let center = (TOTAL_TAPS as f32 - 1.0) / 2.0;

    for i in 0..TOTAL_TAPS {
        let n = i as f32 - center;
        let x = n * PI / PHASES as f32;
        let sinc = if x.abs() < 1e-9 { 1.0 } else { x.sin() / x };
        coeffs[i % PHASES][i / PHASES] = sinc * kaiser(i, TOTAL_TAPS, 8.0);
    }

    for phase in &mut coeffs {
        let sum: f32 = phase.iter().sum();
        if sum.abs() > 1e-10 {
            for c in phase.iter_mut() {
                *c /= sum;
            }
        }
    }

    coeffs
}

fn kaiser(n: usize, length: usize, beta: f64) -> f32 {
    let m = length as f64 - 1.0;
    let x = 2.0 * n as f64 / m - 1.0;
    let arg = beta * (1.0 - x * x).max(0.0).sqrt();
    (bessel_i0(arg) / bessel_i0(beta)) as f32
}

/// Zeroth-order modified Bessel function of the first kind (power series)
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0_f64;
    let mut term = 1.0_f64;
    for k in 1..=25 {
        let ratio = half / k as f64;
        term *= ratio * ratio;
        sum += term;
        if term < 1e-20 * sum {
            break;
        }
    }
    sum
}
