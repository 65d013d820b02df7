//! Scalable-factor engine and the per-layer compute operations

use immersive_core::{
    ChannelLayer, ImmersiveError, LayoutMap, Result, ScalableSettings, ScaleFactorMode,
    CHANNEL_LAYER_COUNT, MAX_LAYER_CHANNELS,
};
use tracing::{debug, trace, warn};

use super::input::ScalableInputView;
use super::metadata::{DemixingMetadata, LayerRecord, ScaleFactorResult};
use super::policy::{policy_for, quantize};
use super::stats::LayerAnalysis;

/// Running loudness delta of one layer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LayerHistory {
    /// Cumulative mean of the per-block delta, per channel (dB)
    pub average_db: [f32; MAX_LAYER_CHANNELS],
    /// Blocks folded into each channel's mean
    pub blocks: [u32; MAX_LAYER_CHANNELS],
    /// Times the layer has been computed this session
    pub computed: u32,
}

/// Accumulated scale-factor state of one encoding session
#[derive(Debug, Clone, PartialEq)]
pub struct ScalableFactorEngine {
    layout: LayoutMap,
    hierarchy: Vec<ChannelLayer>,
    mode: ScaleFactorMode,
    history: [LayerHistory; CHANNEL_LAYER_COUNT],
}

impl ScalableFactorEngine {
    /// Create an engine for the enabled layers
    ///
    /// # Errors
    /// [`ImmersiveError::InvalidHierarchy`] when the enabled layers do not
    /// form a nested hierarchy.
    pub fn new(layout: LayoutMap) -> Result<Self> {
        Self::with_mode(layout, ScaleFactorMode::default())
    }

    pub fn with_mode(layout: LayoutMap, mode: ScaleFactorMode) -> Result<Self> {
        let hierarchy = layout.hierarchy()?;
        let names: Vec<&str> = hierarchy.iter().map(|l| l.name()).collect();

        debug!(
            layers = ?names,
            mode = ?mode,
            "Creating scalable factor engine"
        );

        Ok(Self {
            layout,
            hierarchy,
            mode,
            history: [LayerHistory::default(); CHANNEL_LAYER_COUNT],
        })
    }

    /// Create an engine from loaded settings
    pub fn from_settings(settings: &ScalableSettings) -> Result<Self> {
        Self::with_mode(settings.layout_map(), settings.mode)
    }

    pub fn mode(&self) -> ScaleFactorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ScaleFactorMode) {
        self.mode = mode;
    }

    /// Select the policy by its integer code
    pub fn set_mode_code(&mut self, code: i32) -> Result<()> {
        self.mode = ScaleFactorMode::from_code(code)?;
        Ok(())
    }

    pub fn layout(&self) -> &LayoutMap {
        &self.layout
    }

    /// Enabled layers from base to top
    pub fn hierarchy(&self) -> &[ChannelLayer] {
        &self.hierarchy
    }

    /// Layer directly below `layer` in the hierarchy
    pub fn predecessor(&self, layer: ChannelLayer) -> Option<ChannelLayer> {
        let position = self.hierarchy.iter().position(|l| *l == layer)?;
        position.checked_sub(1).map(|p| self.hierarchy[p])
    }

    pub fn history(&self, layer: ChannelLayer) -> &LayerHistory {
        &self.history[layer.index()]
    }

    /// Forget all accumulated loudness, keeping layers and mode
    pub fn reset(&mut self) {
        self.history = [LayerHistory::default(); CHANNEL_LAYER_COUNT];
        debug!("Scalable factor engine reset");
    }

    fn check_order(&self, layer: ChannelLayer) -> Result<()> {
        if !self.layout.contains(layer) {
            return Err(ImmersiveError::LayerNotEnabled(layer));
        }

        if let Some(predecessor) = self.predecessor(layer) {
            let done = self.history(predecessor).computed;
            if done <= self.history(layer).computed {
                warn!(
                    layer = layer.name(),
                    predecessor = predecessor.name(),
                    "Layer computed before its predecessor"
                );
                return Err(ImmersiveError::LayerOutOfOrder { layer, predecessor });
            }
        }
        Ok(())
    }

    /// Fold per-channel deltas into the layer history and return the smoothed deltas
    ///
    /// On the layer's first fold every channel whose [`ChannelRole`] also
    /// exists in the predecessor starts from that channel's history.
    ///
    /// [`ChannelRole`]: immersive_core::ChannelRole
    fn accumulate(
        &mut self,
        layer: ChannelLayer,
        deltas: &[f32],
        gained_down: impl Fn(usize) -> bool,
    ) -> [f32; MAX_LAYER_CHANNELS] {
        if self.history(layer).computed == 0 {
            if let Some(predecessor) = self.predecessor(layer) {
                let inherited = self.history[predecessor.index()];
                let below = predecessor.composition();
                let above = layer.composition();
                let shared = (0..deltas.len()).filter_map(|ch| {
                    let source = below.position(above.role(ch)?)?;
                    Some((ch, source))
                });

                let entry = &mut self.history[layer.index()];
                for (ch, source) in shared {
                    entry.average_db[ch] = inherited.average_db[source];
                    entry.blocks[ch] = inherited.blocks[source];
                }
            }
        }

        let entry = &mut self.history[layer.index()];
        for (ch, delta) in deltas.iter().enumerate() {
            if !gained_down(ch) {
                continue;
            }
            entry.blocks[ch] += 1;
            entry.average_db[ch] += (delta - entry.average_db[ch]) / entry.blocks[ch] as f32;
        }
        entry.computed += 1;
        entry.average_db
    }
}

/// Compute one layer's scale factors from this block alone
///
/// # Errors
/// Fails when the layer is not active in `view` or the view's buffers do not
/// match the layer. Nothing is written on failure.
pub fn compute_layer(
    metadata: &mut DemixingMetadata,
    view: &ScalableInputView<'_>,
    layer: ChannelLayer,
    mode: ScaleFactorMode,
) -> Result<()> {
    let channels = view.validate(layer)?;
    let analysis = analyze(view, channels);
    let deltas = channel_deltas(&analysis, mode);

    let record = build_record(&analysis, &deltas, |ch| view.is_gained_down(ch));
    metadata.set_layer(layer, record);

    trace!(layer = layer.name(), mode = ?mode, "Computed layer scale factors");
    Ok(())
}

/// Compute one layer's scale factors, smoothed over the session
///
/// Layers must be computed base first: `layer` is accepted only if its
/// predecessor in the hierarchy has been computed more often than `layer`.
///
/// # Errors
/// [`ImmersiveError::LayerNotEnabled`] for layers outside the engine's map,
/// [`ImmersiveError::LayerOutOfOrder`] for ordering violations, and the view
/// errors of [`compute_layer`]. Neither the engine nor `metadata` change on
/// failure.
pub fn compute_layer_accumulating(
    engine: &mut ScalableFactorEngine,
    metadata: &mut DemixingMetadata,
    view: &ScalableInputView<'_>,
    layer: ChannelLayer,
) -> Result<()> {
    engine.check_order(layer)?;
    let channels = view.validate(layer)?;
    let analysis = analyze(view, channels);
    let deltas = channel_deltas(&analysis, engine.mode);

    let smoothed = engine.accumulate(layer, &deltas, |ch| view.is_gained_down(ch));
    let record = build_record(&analysis, &smoothed[..channels], |ch| {
        view.is_gained_down(ch)
    });
    metadata.set_layer(layer, record);

    trace!(
        layer = layer.name(),
        computed = engine.history(layer).computed,
        "Accumulated layer scale factors"
    );
    Ok(())
}

fn analyze(view: &ScalableInputView<'_>, channels: usize) -> LayerAnalysis {
    let groups = view.buffers();
    LayerAnalysis::measure(&groups, channels, view.frame_size, |ch| {
        view.is_gained_down(ch)
    })
}

fn channel_deltas(analysis: &LayerAnalysis, mode: ScaleFactorMode) -> Vec<f32> {
    let policy = policy_for(mode);
    (0..analysis.channels)
        .map(|ch| policy.delta_db(analysis, ch))
        .collect()
}

fn build_record(
    analysis: &LayerAnalysis,
    deltas: &[f32],
    gained_down: impl Fn(usize) -> bool,
) -> LayerRecord {
    let mut scale_factors = ScaleFactorResult::default();
    for (ch, delta) in deltas.iter().enumerate() {
        let (index, value) = if gained_down(ch) {
            quantize(*delta)
        } else {
            (0, 1.0)
        };
        scale_factors.scalefactor_index[ch] = index;
        scale_factors.scalefactor_data[ch] = value;
    }

    LayerRecord {
        channels: analysis.channels,
        scale_factors,
        statistics: analysis.stats,
    }
}
