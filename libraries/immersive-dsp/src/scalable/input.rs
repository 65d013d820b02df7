//! Per-call input view of the scalable-factor engine

use immersive_core::{
    ChannelLayer, ImmersiveError, LayoutMap, Result, SampleBuffer, MAX_LAYER_CHANNELS,
};

/// Planar samples of one channel group together with its declared channel count
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup<'a> {
    pub channels: usize,
    pub samples: Option<SampleBuffer<'a>>,
}

impl<'a> ChannelGroup<'a> {
    pub fn new(channels: usize, samples: SampleBuffer<'a>) -> Self {
        Self {
            channels,
            samples: Some(samples),
        }
    }

    /// Group not involved in this block (no channels, no samples)
    pub fn empty() -> Self {
        Self {
            channels: 0,
            samples: None,
        }
    }

    /// Decode a group from little-endian bytes and an integer format tag
    pub fn from_le_bytes(channels: usize, tag: i32, bytes: &[u8]) -> Result<ChannelGroup<'static>> {
        Ok(ChannelGroup {
            channels,
            samples: Some(SampleBuffer::from_le_bytes(tag, bytes)?),
        })
    }

    fn is_involved(&self) -> bool {
        self.channels > 0
    }

    /// Samples of a group taking part in this block
    fn involved_samples(&self) -> Option<&SampleBuffer<'a>> {
        self.samples.as_ref().filter(|_| self.is_involved())
    }
}

impl Default for ChannelGroup<'_> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Buffers handed to the scalable-factor engine for one layer and one block
///
/// | field | content |
/// |-------|---------|
/// | `mixed` | the layer's channels as handed to the codec |
/// | `reconstructed` | the same channels after the codec round trip |
/// | `surround` | residual of the surround down-mix stage |
/// | `alpha_beta` | residual of the rear (alpha/beta) down-mix stage |
/// | `top` | residual of the height (T/P/Q) down-mix stage |
///
/// `mixed` defines the channel count N; every other group carries either 0 or
/// N channels. Channels are planar in the layer's canonical order: surrounds
/// (L, R, C, side pair, rear pair), then the LFE, then the heights (see
/// [`LayerComposition::role`]).
///
/// [`LayerComposition::role`]: immersive_core::LayerComposition::role
#[derive(Debug, Clone, PartialEq)]
pub struct ScalableInputView<'a> {
    pub mixed: ChannelGroup<'a>,
    pub reconstructed: ChannelGroup<'a>,
    pub surround: ChannelGroup<'a>,
    pub alpha_beta: ChannelGroup<'a>,
    pub top: ChannelGroup<'a>,
    /// Samples per channel
    pub frame_size: usize,
    /// Channels that were gained down while folding into this layer
    pub gain_down: &'a [bool],
    /// Layers present in the current block
    pub active_layers: LayoutMap,
}

impl<'a> ScalableInputView<'a> {
    /// View with only the mixed and reconstructed groups
    pub fn new(
        mixed: ChannelGroup<'a>,
        reconstructed: ChannelGroup<'a>,
        frame_size: usize,
        active_layers: LayoutMap,
    ) -> Self {
        Self {
            mixed,
            reconstructed,
            surround: ChannelGroup::empty(),
            alpha_beta: ChannelGroup::empty(),
            top: ChannelGroup::empty(),
            frame_size,
            gain_down: &[],
            active_layers,
        }
    }

    pub fn with_surround(mut self, group: ChannelGroup<'a>) -> Self {
        self.surround = group;
        self
    }

    pub fn with_alpha_beta(mut self, group: ChannelGroup<'a>) -> Self {
        self.alpha_beta = group;
        self
    }

    pub fn with_top(mut self, group: ChannelGroup<'a>) -> Self {
        self.top = group;
        self
    }

    pub fn with_gain_down(mut self, gain_down: &'a [bool]) -> Self {
        self.gain_down = gain_down;
        self
    }

    /// Whether channel `channel` takes part in gain-down
    pub fn is_gained_down(&self, channel: usize) -> bool {
        self.gain_down.get(channel).copied().unwrap_or(false)
    }

    fn groups(&self) -> [(&'static str, &ChannelGroup<'a>); 5] {
        [
            ("mixed", &self.mixed),
            ("reconstructed", &self.reconstructed),
            ("surround", &self.surround),
            ("alpha/beta", &self.alpha_beta),
            ("top", &self.top),
        ]
    }

    /// Check the view against `layer` and return its channel count
    pub(crate) fn validate(&self, layer: ChannelLayer) -> Result<usize> {
        if !self.active_layers.contains(layer) {
            return Err(ImmersiveError::LayerNotActive(layer));
        }

        let channels = self.mixed.channels;
        if channels == 0 || channels > MAX_LAYER_CHANNELS {
            return Err(ImmersiveError::InvalidChannelCount {
                count: channels,
                max: MAX_LAYER_CHANNELS,
            });
        }
        if channels != layer.channel_count() {
            return Err(ImmersiveError::buffer_mismatch(format!(
                "layer {} has {} channels, mixed group declares {}",
                layer,
                layer.channel_count(),
                channels
            )));
        }

        for (role, group) in self.groups() {
            if !group.is_involved() {
                continue;
            }
            if group.channels != channels {
                return Err(ImmersiveError::buffer_mismatch(format!(
                    "{} group declares {} channels, expected 0 or {}",
                    role, group.channels, channels
                )));
            }
            let Some(samples) = &group.samples else {
                return Err(ImmersiveError::MissingBuffer(role));
            };
            let needed = channels * self.frame_size;
            if samples.len() < needed {
                return Err(ImmersiveError::buffer_mismatch(format!(
                    "{} group holds {} samples, needs {}",
                    role,
                    samples.len(),
                    needed
                )));
            }
        }

        Ok(channels)
    }

    /// Borrow the sample buffers of every involved group
    pub(crate) fn buffers(&self) -> RoleBuffers<'_> {
        RoleBuffers {
            mixed: self.mixed.involved_samples(),
            reconstructed: self.reconstructed.involved_samples(),
            surround: self.surround.involved_samples(),
            alpha_beta: self.alpha_beta.involved_samples(),
            top: self.top.involved_samples(),
        }
    }
}

/// Sample buffers of the five groups, `None` for groups not involved
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RoleBuffers<'v> {
    pub mixed: Option<&'v SampleBuffer<'v>>,
    pub reconstructed: Option<&'v SampleBuffer<'v>>,
    pub surround: Option<&'v SampleBuffer<'v>>,
    pub alpha_beta: Option<&'v SampleBuffer<'v>>,
    pub top: Option<&'v SampleBuffer<'v>>,
}
