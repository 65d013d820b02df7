/// Channel layers of a scalable channel-based stream
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ImmersiveError, Result};

/// Number of canonical channel layers
pub const CHANNEL_LAYER_COUNT: usize = 9;

/// Maximum number of channels in any channel layer (7.1.4)
pub const MAX_LAYER_CHANNELS: usize = 12;

/// One of the nine canonical loudspeaker layouts a scalable stream can carry
///
/// The discriminants are the fixed layer positions used by the demixing metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChannelLayer {
    #[serde(rename = "1.0.0")]
    Mono100 = 0,
    #[serde(rename = "2.0.0")]
    Stereo200 = 1,
    #[serde(rename = "5.1.0")]
    Surround510 = 2,
    #[serde(rename = "5.1.2")]
    Surround512 = 3,
    #[serde(rename = "5.1.4")]
    Surround514 = 4,
    #[serde(rename = "7.1.0")]
    Surround710 = 5,
    #[serde(rename = "7.1.2")]
    Surround712 = 6,
    #[serde(rename = "7.1.4")]
    Surround714 = 7,
    #[serde(rename = "3.1.2")]
    Surround312 = 8,
}

impl ChannelLayer {
    /// All layers in metadata position order
    pub const ALL: [Self; CHANNEL_LAYER_COUNT] = [
        Self::Mono100,
        Self::Stereo200,
        Self::Surround510,
        Self::Surround512,
        Self::Surround514,
        Self::Surround710,
        Self::Surround712,
        Self::Surround714,
        Self::Surround312,
    ];

    /// Metadata position of this layer
    pub fn index(self) -> usize {
        self as usize
    }

    /// Layer at a metadata position
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Surround / subwoofer / height channel counts
    pub fn composition(self) -> LayerComposition {
        let (surround, subwoofer, height) = match self {
            Self::Mono100 => (1, 0, 0),
            Self::Stereo200 => (2, 0, 0),
            Self::Surround510 => (5, 1, 0),
            Self::Surround512 => (5, 1, 2),
            Self::Surround514 => (5, 1, 4),
            Self::Surround710 => (7, 1, 0),
            Self::Surround712 => (7, 1, 2),
            Self::Surround714 => (7, 1, 4),
            Self::Surround312 => (3, 1, 2),
        };
        LayerComposition {
            surround,
            subwoofer,
            height,
        }
    }

    /// Total channel count of the layer
    pub fn channel_count(self) -> usize {
        self.composition().total()
    }

    /// Conventional "S.W.H" name, e.g. `5.1.2`
    pub fn name(self) -> &'static str {
        match self {
            Self::Mono100 => "1.0.0",
            Self::Stereo200 => "2.0.0",
            Self::Surround510 => "5.1.0",
            Self::Surround512 => "5.1.2",
            Self::Surround514 => "5.1.4",
            Self::Surround710 => "7.1.0",
            Self::Surround712 => "7.1.2",
            Self::Surround714 => "7.1.4",
            Self::Surround312 => "3.1.2",
        }
    }
}

impl fmt::Display for ChannelLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChannelLayer {
    type Err = ImmersiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|layer| layer.name() == s.trim())
            .ok_or_else(|| ImmersiveError::config(format!("unknown channel layer '{}'", s)))
    }
}

/// Loudspeaker role of one channel within a layer
///
/// Surround channels are numbered L, R, C, then the side pair and the rear
/// pair; heights are numbered front pair first. The n-th surround or height
/// of a layer is the same loudspeaker as the n-th of any layer below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelRole {
    /// Ear-level channel
    Surround(usize),
    Lfe,
    /// Elevated channel
    Height(usize),
}

/// Channel composition of a layer: S(urround), W (subwoofer/LFE) and H(eight) counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerComposition {
    pub surround: usize,
    pub subwoofer: usize,
    pub height: usize,
}

impl LayerComposition {
    /// Total number of channels
    pub fn total(&self) -> usize {
        self.surround + self.subwoofer + self.height
    }

    /// Role of the channel at `channel` in the layer's canonical order
    ///
    /// Channels are ordered surround first, then the LFE, then the heights.
    pub fn role(&self, channel: usize) -> Option<ChannelRole> {
        let lfe_end = self.surround + self.subwoofer;
        if channel < self.surround {
            Some(ChannelRole::Surround(channel))
        } else if channel < lfe_end {
            Some(ChannelRole::Lfe)
        } else if channel < self.total() {
            Some(ChannelRole::Height(channel - lfe_end))
        } else {
            None
        }
    }

    /// Position of `role` in the layer's canonical order, if the layer has it
    pub fn position(&self, role: ChannelRole) -> Option<usize> {
        match role {
            ChannelRole::Surround(n) if n < self.surround => Some(n),
            ChannelRole::Lfe if self.subwoofer > 0 => Some(self.surround),
            ChannelRole::Height(n) if n < self.height => Some(self.surround + self.subwoofer + n),
            _ => None,
        }
    }

    /// Whether `self` may follow `previous` in a scalable hierarchy
    ///
    /// All three counts must be non-decreasing and at least one must grow.
    pub fn extends(&self, previous: &Self) -> bool {
        self.surround >= previous.surround
            && self.subwoofer >= previous.subwoofer
            && self.height >= previous.height
            && self != previous
    }
}

/// Set of channel layers enabled for an encoding session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct LayoutMap {
    enabled: [bool; CHANNEL_LAYER_COUNT],
}

impl LayoutMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Map with exactly the given layers enabled
    pub fn from_layers(layers: &[ChannelLayer]) -> Self {
        let mut map = Self::new();
        for layer in layers {
            map.enable(*layer);
        }
        map
    }

    /// Map from a byte-per-layer flag array (non-zero = enabled)
    ///
    /// Entries past the ninth layer are ignored.
    pub fn from_flags(flags: &[u8]) -> Self {
        let mut map = Self::new();
        for (layer, flag) in ChannelLayer::ALL.iter().zip(flags) {
            if *flag != 0 {
                map.enable(*layer);
            }
        }
        map
    }

    /// Enable a layer
    pub fn enable(&mut self, layer: ChannelLayer) {
        self.enabled[layer.index()] = true;
    }

    /// Whether a layer is enabled
    pub fn contains(&self, layer: ChannelLayer) -> bool {
        self.enabled[layer.index()]
    }

    /// Enabled layers in metadata position order
    pub fn layers(&self) -> impl Iterator<Item = ChannelLayer> + '_ {
        ChannelLayer::ALL
            .iter()
            .copied()
            .filter(|layer| self.contains(*layer))
    }

    /// Number of enabled layers
    pub fn len(&self) -> usize {
        self.enabled.iter().filter(|e| **e).count()
    }

    /// Whether no layer is enabled
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enabled layers ordered from base to top, validated as a nested hierarchy
    ///
    /// # Errors
    /// Returns [`ImmersiveError::InvalidHierarchy`] if the map is empty or two
    /// consecutive layers do not satisfy [`LayerComposition::extends`].
    pub fn hierarchy(&self) -> Result<Vec<ChannelLayer>> {
        let mut layers: Vec<ChannelLayer> = self.layers().collect();
        if layers.is_empty() {
            return Err(ImmersiveError::InvalidHierarchy(
                "no channel layer enabled".to_string(),
            ));
        }

        layers.sort_by_key(|layer| (layer.channel_count(), layer.index()));

        for pair in layers.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if !next.composition().extends(&previous.composition()) {
                return Err(ImmersiveError::InvalidHierarchy(format!(
                    "{} does not extend {}",
                    next, previous
                )));
            }
        }

        Ok(layers)
    }
}
