//! Look-ahead peak limiter
//!
//! Delays the signal by `delay_size` samples so that a peak is detected before
//! the corresponding sample leaves the delay line, then eases the gain down
//! with a [`GainEnvelope`] so the peak comes out near the threshold without
//! hard clipping.

use std::fmt;

use immersive_core::{ImmersiveError, LimiterSettings, Result};
use tracing::{debug, trace};

use crate::envelope::GainEnvelope;
use crate::math::{db_to_linear, linear_to_db};
use crate::peak::{create_estimator, EstimatorState, PeakEstimator};
use crate::window::{create_window, LookaheadWindow, WindowState};

/// Look-ahead peak limiter for planar multichannel blocks
///
/// # Example
///
/// ```rust
/// use immersive_core::LimiterSettings;
/// use immersive_dsp::PeakLimiter;
///
/// let settings = LimiterSettings::new(-1.0, 48_000, 2, 0.005, 0.050, 240);
/// let mut limiter = PeakLimiter::new(settings)?;
///
/// // Planar: 480 samples of channel 0 followed by 480 samples of channel 1
/// let input = vec![0.25_f32; 2 * 480];
/// let mut output = vec![0.0_f32; 2 * 480];
/// let frames = limiter.process_block(Some(&input), &mut output, 480)?;
/// assert_eq!(frames, 480);
/// # Ok::<(), immersive_core::ImmersiveError>(())
/// ```
pub struct PeakLimiter {
    settings: LimiterSettings,
    linear_threshold: f32,
    envelope: GainEnvelope,
    /// Raw samples per channel, `delay_size` long
    delay_lines: Vec<Vec<f32>>,
    /// Peak of each sample position still inside the delay line
    window: Box<dyn LookaheadWindow>,
    estimator: Box<dyn PeakEstimator>,
    /// Delay-line position of the first sample of the next block
    write_index: usize,
    /// One sample per channel, reused across calls
    frame: Vec<f32>,
}

/// Complete mutable state of a [`PeakLimiter`], comparable with `==`
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterSnapshot {
    pub envelope: GainEnvelope,
    pub write_index: usize,
    pub delay_lines: Vec<Vec<f32>>,
    /// Look-ahead peaks including ring cursor or queue position
    pub window: WindowState,
    /// Detector filter history (true-peak mode)
    pub estimator: EstimatorState,
}

impl PeakLimiter {
    /// Create a limiter with all state at its defaults
    ///
    /// # Errors
    /// Fails when the settings do not pass [`LimiterSettings::validate`].
    pub fn new(settings: LimiterSettings) -> Result<Self> {
        settings.validate()?;

        let linear_threshold = db_to_linear(settings.threshold_db);

        debug!(
            threshold_db = settings.threshold_db,
            sample_rate = settings.sample_rate,
            channels = settings.channels,
            delay_size = settings.delay_size,
            peak_mode = ?settings.peak_mode,
            peak_search = ?settings.peak_search,
            "Creating peak limiter"
        );

        Ok(Self {
            settings,
            linear_threshold,
            envelope: GainEnvelope::new(
                linear_threshold,
                settings.attack_seconds,
                settings.release_seconds,
                settings.sample_rate,
            ),
            delay_lines: vec![vec![0.0; settings.delay_size]; settings.channels],
            window: create_window(settings.peak_search, settings.delay_size),
            estimator: create_estimator(settings.peak_mode, settings.channels),
            write_index: 0,
            frame: vec![0.0; settings.channels],
        })
    }

    /// Return to the freshly created state with the same settings
    pub fn reset(&mut self) {
        self.envelope.reset();
        for line in &mut self.delay_lines {
            line.fill(0.0);
        }
        self.window.clear();
        self.estimator.reset();
        self.write_index = 0;
        debug!("Peak limiter reset");
    }

    /// Limit one planar block
    ///
    /// `input` and `output` hold `frame_size` samples per channel, channel
    /// after channel. Absent input is a no-op returning `Ok(0)` with the state
    /// untouched; otherwise returns `frame_size`.
    ///
    /// # Errors
    /// [`ImmersiveError::BufferMismatch`] when either slice is shorter than
    /// `channels * frame_size`.
    pub fn process_block(
        &mut self,
        input: Option<&[f32]>,
        output: &mut [f32],
        frame_size: usize,
    ) -> Result<usize> {
        let Some(input) = input else {
            return Ok(0);
        };

        let needed = self.settings.channels * frame_size;
        if input.len() < needed || output.len() < needed {
            return Err(ImmersiveError::buffer_mismatch(format!(
                "block needs {} samples ({} channels x {} frames), got input {} / output {}",
                needed,
                self.settings.channels,
                frame_size,
                input.len(),
                output.len()
            )));
        }

        for k in 0..frame_size {
            for (ch, sample) in self.frame.iter_mut().enumerate() {
                *sample = input[ch * frame_size + k];
            }
            self.limit_frame(k);
            for (ch, sample) in self.frame.iter().enumerate() {
                output[ch * frame_size + k] = *sample;
            }
        }

        self.finish_block(frame_size);
        Ok(frame_size)
    }

    /// Limit one planar block in place
    pub fn process_in_place(&mut self, samples: &mut [f32], frame_size: usize) -> Result<usize> {
        let needed = self.settings.channels * frame_size;
        if samples.len() < needed {
            return Err(ImmersiveError::buffer_mismatch(format!(
                "block needs {} samples, got {}",
                needed,
                samples.len()
            )));
        }

        for k in 0..frame_size {
            for (ch, sample) in self.frame.iter_mut().enumerate() {
                *sample = samples[ch * frame_size + k];
            }
            self.limit_frame(k);
            for (ch, sample) in self.frame.iter().enumerate() {
                samples[ch * frame_size + k] = *sample;
            }
        }

        self.finish_block(frame_size);
        Ok(frame_size)
    }

    /// Limit a single frame (one sample per channel)
    pub fn process_frame(&mut self, samples: &mut [f32]) -> Result<()> {
        if samples.len() != self.settings.channels {
            return Err(ImmersiveError::buffer_mismatch(format!(
                "frame has {} samples for {} channels",
                samples.len(),
                self.settings.channels
            )));
        }

        self.frame.copy_from_slice(samples);
        self.limit_frame(0);
        samples.copy_from_slice(&self.frame);
        self.finish_block(1);
        Ok(())
    }

    /// Limit `self.frame` in place; `offset` is the sample index within the block
    fn limit_frame(&mut self, offset: usize) {
        let delay = self.settings.delay_size;

        if delay == 0 {
            let mut peak = 0.0_f32;
            for (ch, sample) in self.frame.iter().enumerate() {
                peak = peak.max(self.estimator.measure(ch, *sample));
            }
            let gain = self.envelope.next_gain(peak);
            for sample in &mut self.frame {
                *sample *= gain;
            }
            return;
        }

        let slot = (self.write_index + offset) % delay;
        let gain = self.envelope.next_gain(self.window.max());

        let mut peak = 0.0_f32;
        for (ch, sample) in self.frame.iter_mut().enumerate() {
            let line = &mut self.delay_lines[ch];
            let incoming = *sample;
            *sample = line[slot] * gain;
            line[slot] = incoming;
            peak = peak.max(self.estimator.measure(ch, incoming));
        }
        self.window.push(peak);
    }

    fn finish_block(&mut self, frame_size: usize) {
        let delay = self.settings.delay_size;
        if delay > 0 {
            self.write_index = (self.write_index + frame_size) % delay;
        }

        trace!(
            frames = frame_size,
            gain = self.envelope.current_gain(),
            write_index = self.write_index,
            "Limited block"
        );
    }

    /// Gain applied to the most recent sample
    pub fn current_gain(&self) -> f32 {
        self.envelope.current_gain()
    }

    /// Current gain reduction in dB (0 when not limiting)
    pub fn gain_reduction_db(&self) -> f32 {
        linear_to_db(self.envelope.current_gain())
    }

    /// Latency introduced by the delay line, in samples
    pub fn latency_samples(&self) -> usize {
        self.settings.delay_size
    }

    /// Latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        self.settings.delay_size as f32 / self.settings.sample_rate as f32 * 1000.0
    }

    /// Delay-line position where the next block starts
    pub fn write_index(&self) -> usize {
        self.write_index
    }

    pub fn linear_threshold(&self) -> f32 {
        self.linear_threshold
    }

    pub fn settings(&self) -> &LimiterSettings {
        &self.settings
    }

    pub fn envelope(&self) -> &GainEnvelope {
        &self.envelope
    }

    /// Capture the complete mutable state
    pub fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            envelope: self.envelope,
            write_index: self.write_index,
            delay_lines: self.delay_lines.clone(),
            window: self.window.state(),
            estimator: self.estimator.state(),
        }
    }
}

impl fmt::Debug for PeakLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeakLimiter")
            .field("settings", &self.settings)
            .field("linear_threshold", &self.linear_threshold)
            .field("envelope", &self.envelope)
            .field("write_index", &self.write_index)
            .finish_non_exhaustive()
    }
}
